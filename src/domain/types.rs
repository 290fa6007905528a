// ==========================================
// 社員名簿同期システム - 共通型定義
// ==========================================
// 責務: 変更種別・階層レベル・エンティティ種別の列挙型
// 鉄則: DB 格納は文字列表現（as_str / from_str で往復）
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ChangeType - 変更種別
// ==========================================
// 用途: change_log.change_type 列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    Create,     // 新規登録
    Update,     // 項目更新
    Delete,     // 削除（論理削除を含む）
    Transfer,   // 異動
    Promotion,  // 昇格
    Retirement, // 退職
    Rejoining,  // 再入社
    Import,     // 名簿取込
    BulkUpdate, // 一括更新
    Export,     // 出力
}

impl ChangeType {
    /// DB 格納用の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Create => "CREATE",
            ChangeType::Update => "UPDATE",
            ChangeType::Delete => "DELETE",
            ChangeType::Transfer => "TRANSFER",
            ChangeType::Promotion => "PROMOTION",
            ChangeType::Retirement => "RETIREMENT",
            ChangeType::Rejoining => "REJOINING",
            ChangeType::Import => "IMPORT",
            ChangeType::BulkUpdate => "BULK_UPDATE",
            ChangeType::Export => "EXPORT",
        }
    }

    /// 文字列表現からの復元
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(ChangeType::Create),
            "UPDATE" => Some(ChangeType::Update),
            "DELETE" => Some(ChangeType::Delete),
            "TRANSFER" => Some(ChangeType::Transfer),
            "PROMOTION" => Some(ChangeType::Promotion),
            "RETIREMENT" => Some(ChangeType::Retirement),
            "REJOINING" => Some(ChangeType::Rejoining),
            "IMPORT" => Some(ChangeType::Import),
            "BULK_UPDATE" => Some(ChangeType::BulkUpdate),
            "EXPORT" => Some(ChangeType::Export),
            _ => None,
        }
    }
}

// ==========================================
// OrgLevel - 組織階層レベル
// ==========================================
// 不変条件: 階層は 部 → 課 → 係 の3層まで
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrgLevel {
    Department, // 部
    Section,    // 課
    Course,     // 係
}

impl OrgLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgLevel::Department => "department",
            OrgLevel::Section => "section",
            OrgLevel::Course => "course",
        }
    }

    /// 画面・ログ表示用のラベル
    pub fn label(&self) -> &'static str {
        match self {
            OrgLevel::Department => "部",
            OrgLevel::Section => "課",
            OrgLevel::Course => "係",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "department" => Some(OrgLevel::Department),
            "section" => Some(OrgLevel::Section),
            "course" => Some(OrgLevel::Course),
            _ => None,
        }
    }
}

// ==========================================
// EntityType - 監査対象エンティティ種別
// ==========================================
// 用途: change_log.entity_type 列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Employee,
    Department,
    Section,
    Course,
    Organization,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Employee => "employee",
            EntityType::Department => "department",
            EntityType::Section => "section",
            EntityType::Course => "course",
            EntityType::Organization => "organization",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "employee" => Some(EntityType::Employee),
            "department" => Some(EntityType::Department),
            "section" => Some(EntityType::Section),
            "course" => Some(EntityType::Course),
            "organization" => Some(EntityType::Organization),
            _ => None,
        }
    }
}
