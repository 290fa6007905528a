// ==========================================
// 社員名簿同期システム - 組織領域モデル
// ==========================================
// 不変条件: 組織 → 部 → 課 → 係 の深さ3までの厳密な木構造
// 不変条件: name の一意性は親スコープ内（別の部に同名の課があってよい）
// ==========================================

use crate::domain::types::OrgLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Organization - 組織ルート
// ==========================================
// 鉄則: 取込トランザクション内で暗黙生成しない（呼出側が明示的に解決する）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub organization_id: String, // UUID
    pub name: String,            // 組織名（全体で一意）
    pub created_at: DateTime<Utc>,
}

// ==========================================
// OrgUnit - 組織単位（部 / 課 / 係 共通ビュー）
// ==========================================
// parent_id: 部→organization_id、課→department_id、係→section_id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgUnit {
    pub unit_id: String,
    pub level: OrgLevel,
    pub parent_id: String,
    pub name: String,
    pub code: Option<String>,                // 短縮コード（所属コードの接頭辞）
    pub manager_employee_id: Option<String>, // 管理者（役職名から推定）
    pub created_at: DateTime<Utc>,
}

impl OrgUnit {
    pub fn new(level: OrgLevel, unit_id: String, parent_id: String, name: String, code: Option<String>) -> Self {
        Self {
            unit_id,
            level,
            parent_id,
            name,
            code,
            manager_employee_id: None,
            created_at: Utc::now(),
        }
    }
}
