// ==========================================
// 社員名簿同期システム - 監査証跡
// ==========================================
// 責務:
// - 変更履歴の追記と参照（追記専用の台帳）
// - 取込バッチ相関トークンの発行
// - 組織スナップショットの作成と純粋な差分比較
// 鉄則: スナップショット比較は読み取り側のドリフト報告専用。
//       Committer の駆動には使わない
// ==========================================

use crate::domain::change_log::ChangeLogEntry;
use crate::domain::preview::FieldChange;
use crate::domain::snapshot::{OrganizationSnapshot, SnapshotDiff};
use crate::domain::types::{ChangeType, EntityType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{
    ChangeLogRepository, EmployeeRepository, OrganizationRepository, SnapshotRepository,
};
use chrono::Utc;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

/// 取込バッチ相関トークンを発行する（時刻 + ランダム接尾辞）
///
/// 同一取込のすべての監査エントリをまとめて引くためのトークン。
pub fn generate_batch_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix: String = Uuid::new_v4().simple().to_string()[..6].to_string();
    format!("IMP-{timestamp}-{suffix}")
}

/// 項目レベル変更を変更履歴エントリへ機械的に変換する
///
/// 1変更項目につき1エントリ。説明は "<ラベル>: <旧> → <新>" 形式
pub fn entries_from_field_changes(
    employee_id: &str,
    changes: &[FieldChange],
    actor: &str,
    batch_id: &str,
) -> Vec<ChangeLogEntry> {
    changes
        .iter()
        .map(|change| {
            ChangeLogEntry::new(
                EntityType::Employee,
                employee_id.to_string(),
                ChangeType::Update,
                actor.to_string(),
            )
            .with_field_change(
                change.label.clone(),
                change.old_value.clone(),
                change.new_value.clone(),
            )
            .with_description(change.describe())
            .with_batch_id(batch_id.to_string())
        })
        .collect()
}

/// 2時点のスナップショットを比較する（純粋な集合差分）
///
/// # 戻り値
/// - 各レベルの追加・削除 ID と在籍社員数の符号付き増減
pub fn compare_snapshots(old: &OrganizationSnapshot, new: &OrganizationSnapshot) -> SnapshotDiff {
    let old_departments = old.department_ids();
    let new_departments = new.department_ids();
    let old_sections = old.section_ids();
    let new_sections = new.section_ids();
    let old_courses = old.course_ids();
    let new_courses = new.course_ids();

    SnapshotDiff {
        added_departments: new_departments.difference(&old_departments).cloned().collect(),
        removed_departments: old_departments.difference(&new_departments).cloned().collect(),
        added_sections: new_sections.difference(&old_sections).cloned().collect(),
        removed_sections: old_sections.difference(&new_sections).cloned().collect(),
        added_courses: new_courses.difference(&old_courses).cloned().collect(),
        removed_courses: old_courses.difference(&new_courses).cloned().collect(),
        employee_count_delta: new.active_employee_count - old.active_employee_count,
    }
}

// ==========================================
// AuditTrail - 監査証跡ファサード
// ==========================================
pub struct AuditTrail {
    change_log_repo: ChangeLogRepository,
    snapshot_repo: SnapshotRepository,
    org_repo: OrganizationRepository,
    employee_repo: EmployeeRepository,
}

impl AuditTrail {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            change_log_repo: ChangeLogRepository::new(Arc::clone(&conn)),
            snapshot_repo: SnapshotRepository::new(Arc::clone(&conn)),
            org_repo: OrganizationRepository::new(Arc::clone(&conn)),
            employee_repo: EmployeeRepository::new(conn),
        }
    }

    /// 変更履歴1件を追記する
    pub fn record_change_log(&self, entry: &ChangeLogEntry) -> RepositoryResult<String> {
        self.change_log_repo.insert(entry)
    }

    /// 変更履歴を一括追記する
    pub fn record_change_logs(&self, entries: &[ChangeLogEntry]) -> RepositoryResult<usize> {
        self.change_log_repo.batch_insert(entries)
    }

    /// バッチ ID で監査エントリを取得する
    pub fn list_batch_entries(&self, batch_id: &str) -> RepositoryResult<Vec<ChangeLogEntry>> {
        self.change_log_repo.list_by_batch(batch_id)
    }

    /// エンティティ単位で監査エントリを取得する（新しい順）
    pub fn list_entity_entries(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> RepositoryResult<Vec<ChangeLogEntry>> {
        self.change_log_repo.list_by_entity(entity_type, entity_id)
    }

    /// 直近の監査エントリを取得する
    pub fn list_recent_entries(&self, limit: usize) -> RepositoryResult<Vec<ChangeLogEntry>> {
        self.change_log_repo.list_recent(limit)
    }

    /// 現時点の組織階層スナップショットを作成して保存する
    ///
    /// 取込実行とは独立に、任意の時点で取得できる
    pub fn create_organization_snapshot(
        &self,
        organization_id: &str,
    ) -> RepositoryResult<OrganizationSnapshot> {
        let organization = self
            .org_repo
            .get(organization_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "organization".to_string(),
                id: organization_id.to_string(),
            })?;

        let departments = self.org_repo.load_department_tree(organization_id)?;
        let active_employee_count = self.employee_repo.count_active(organization_id)?;

        let snapshot = OrganizationSnapshot {
            snapshot_id: Uuid::new_v4().to_string(),
            organization_id: organization.organization_id,
            active_employee_count,
            departments,
            created_at: Utc::now(),
        };

        self.snapshot_repo.insert(&snapshot)?;
        info!(
            snapshot_id = %snapshot.snapshot_id,
            departments = snapshot.departments.len(),
            active = snapshot.active_employee_count,
            "組織スナップショット作成"
        );

        Ok(snapshot)
    }

    /// ID でスナップショットを取得する
    pub fn get_snapshot(&self, snapshot_id: &str) -> RepositoryResult<Option<OrganizationSnapshot>> {
        self.snapshot_repo.get(snapshot_id)
    }

    /// 組織の直近スナップショットを列挙する
    pub fn list_snapshots(
        &self,
        organization_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<OrganizationSnapshot>> {
        self.snapshot_repo.list_recent(organization_id, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::DepartmentSnapshot;

    fn snapshot_with(departments: Vec<(&str, &str)>, count: i64) -> OrganizationSnapshot {
        OrganizationSnapshot {
            snapshot_id: Uuid::new_v4().to_string(),
            organization_id: "org-1".to_string(),
            active_employee_count: count,
            departments: departments
                .into_iter()
                .map(|(id, name)| DepartmentSnapshot {
                    department_id: id.to_string(),
                    name: name.to_string(),
                    code: None,
                    manager_employee_id: None,
                    sections: vec![],
                })
                .collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_batch_id_format() {
        let id = generate_batch_id();
        assert!(id.starts_with("IMP-"));
        // IMP- + 14桁時刻 + - + 6文字接尾辞
        assert_eq!(id.len(), 4 + 14 + 1 + 6);
    }

    #[test]
    fn test_generate_batch_id_unique() {
        assert_ne!(generate_batch_id(), generate_batch_id());
    }

    #[test]
    fn test_entries_from_field_changes() {
        let changes = vec![FieldChange {
            field: "position_name".to_string(),
            label: "役職".to_string(),
            old_value: Some("主任".to_string()),
            new_value: Some("課長".to_string()),
        }];

        let entries = entries_from_field_changes("emp-1", &changes, "admin", "B1");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description.as_deref(), Some("役職: 主任 → 課長"));
        assert_eq!(entries[0].batch_id.as_deref(), Some("B1"));
        assert_eq!(entries[0].change_type, ChangeType::Update);
    }

    #[test]
    fn test_compare_snapshots_detects_added_and_removed() {
        let old = snapshot_with(vec![("d1", "営業部"), ("d2", "総務部")], 10);
        let new = snapshot_with(vec![("d2", "総務部"), ("d3", "開発部")], 13);

        let diff = compare_snapshots(&old, &new);
        assert_eq!(diff.added_departments, vec!["d3".to_string()]);
        assert_eq!(diff.removed_departments, vec!["d1".to_string()]);
        assert_eq!(diff.employee_count_delta, 3);
        assert!(diff.has_drift());
    }

    #[test]
    fn test_compare_identical_snapshots() {
        let old = snapshot_with(vec![("d1", "営業部")], 5);
        let new = snapshot_with(vec![("d1", "営業部")], 5);

        let diff = compare_snapshots(&old, &new);
        assert!(!diff.has_drift());
        assert_eq!(diff.summary_text(), "ドリフトなし");
    }
}
