// ==========================================
// 社員名簿同期システム - 変更履歴領域モデル
// ==========================================
// 鉄則: change_log は追記専用。書き込まれた行は更新も削除もしない
// 用途: 監査証跡、取込バッチ単位の変更追跡
// ==========================================

use crate::domain::types::{ChangeType, EntityType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ChangeLogEntry - 変更履歴エントリ
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    // ===== 主キー =====
    pub change_log_id: String,        // UUID

    // ===== 対象 =====
    pub entity_type: EntityType,      // 対象エンティティ種別
    pub entity_id: String,            // 対象エンティティ ID
    pub change_type: ChangeType,      // 変更種別

    // ===== 項目レベル変更（任意）=====
    pub field_name: Option<String>,   // 変更項目名
    pub old_value: Option<String>,    // 旧値
    pub new_value: Option<String>,    // 新値

    // ===== 補足 =====
    pub description: Option<String>,  // 人間可読の説明
    pub batch_id: Option<String>,     // 取込バッチ相関トークン

    // ===== 監査 =====
    pub actor: String,                // 操作者（呼出層から受領）
    pub changed_at: DateTime<Utc>,    // 記録時刻
}

impl ChangeLogEntry {
    /// 新しい変更履歴エントリを作成する
    ///
    /// # 引数
    /// - `entity_type`: 対象エンティティ種別
    /// - `entity_id`: 対象エンティティ ID
    /// - `change_type`: 変更種別
    /// - `actor`: 操作者
    pub fn new(
        entity_type: EntityType,
        entity_id: String,
        change_type: ChangeType,
        actor: String,
    ) -> Self {
        Self {
            change_log_id: uuid::Uuid::new_v4().to_string(),
            entity_type,
            entity_id,
            change_type,
            field_name: None,
            old_value: None,
            new_value: None,
            description: None,
            batch_id: None,
            actor,
            changed_at: Utc::now(),
        }
    }

    /// 項目レベルの変更内容を設定する
    pub fn with_field_change(
        mut self,
        field_name: String,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        self.field_name = Some(field_name);
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }

    /// 説明文を設定する
    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    /// バッチ ID を設定する
    pub fn with_batch_id(mut self, batch_id: String) -> Self {
        self.batch_id = Some(batch_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let entry = ChangeLogEntry::new(
            EntityType::Employee,
            "emp-1".to_string(),
            ChangeType::Update,
            "admin".to_string(),
        )
        .with_field_change("役職".to_string(), Some("主任".to_string()), Some("課長".to_string()))
        .with_description("役職: 主任 → 課長".to_string())
        .with_batch_id("IMP-20250101000000-abc123".to_string());

        assert_eq!(entry.change_type, ChangeType::Update);
        assert_eq!(entry.field_name.as_deref(), Some("役職"));
        assert_eq!(entry.old_value.as_deref(), Some("主任"));
        assert_eq!(entry.new_value.as_deref(), Some("課長"));
        assert!(entry.batch_id.is_some());
        assert!(!entry.change_log_id.is_empty());
    }
}
