// ==========================================
// 社員名簿同期システム - 組織スナップショットリポジトリ
// ==========================================
// 鉄則: スナップショットは作成後不変。INSERT と SELECT のみ発行する
// 格納: 階層ツリーは tree_json 列に JSON で非正規化保存
// ==========================================

use crate::domain::snapshot::{DepartmentSnapshot, OrganizationSnapshot};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct SnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SnapshotRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// スナップショットを保存する
    pub fn insert(&self, snapshot: &OrganizationSnapshot) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let tree_json = serde_json::to_string(&snapshot.departments)?;

        conn.execute(
            r#"
            INSERT INTO organization_snapshot (
                snapshot_id, organization_id, active_employee_count, tree_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                snapshot.snapshot_id,
                snapshot.organization_id,
                snapshot.active_employee_count,
                tree_json,
                snapshot.created_at,
            ],
        )?;

        Ok(snapshot.snapshot_id.clone())
    }

    /// ID でスナップショットを取得する
    pub fn get(&self, snapshot_id: &str) -> RepositoryResult<Option<OrganizationSnapshot>> {
        let conn = self.get_conn()?;

        let row = conn
            .query_row(
                "SELECT snapshot_id, organization_id, active_employee_count, tree_json, created_at \
                 FROM organization_snapshot WHERE snapshot_id = ?1",
                params![snapshot_id],
                map_snapshot_row,
            )
            .optional()?;

        row.transpose()
    }

    /// 組織の直近スナップショットを列挙する（新しい順）
    pub fn list_recent(
        &self,
        organization_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<OrganizationSnapshot>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT snapshot_id, organization_id, active_employee_count, tree_json, created_at \
             FROM organization_snapshot WHERE organization_id = ?1 \
             ORDER BY created_at DESC LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![organization_id, limit as i64], map_snapshot_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().collect()
    }
}

/// スナップショット行の写像（tree_json の復元を含む）
fn map_snapshot_row(
    row: &rusqlite::Row,
) -> rusqlite::Result<RepositoryResult<OrganizationSnapshot>> {
    let tree_json: String = row.get(3)?;
    let snapshot_id: String = row.get(0)?;
    let organization_id: String = row.get(1)?;
    let active_employee_count: i64 = row.get(2)?;
    let created_at = row.get(4)?;

    Ok(serde_json::from_str::<Vec<DepartmentSnapshot>>(&tree_json)
        .map_err(RepositoryError::from)
        .map(|departments| OrganizationSnapshot {
            snapshot_id,
            organization_id,
            active_employee_count,
            departments,
            created_at,
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domain::snapshot::SectionSnapshot;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_repo_with_org() -> (SnapshotRepository, String) {
        let conn = db::open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO organization (organization_id, name, created_at) VALUES ('org-1', 'テスト株式会社', ?1)",
            params![Utc::now()],
        )
        .unwrap();
        (SnapshotRepository::new(Arc::new(Mutex::new(conn))), "org-1".to_string())
    }

    fn sample_snapshot(organization_id: &str) -> OrganizationSnapshot {
        OrganizationSnapshot {
            snapshot_id: Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            active_employee_count: 42,
            departments: vec![DepartmentSnapshot {
                department_id: "dept-1".to_string(),
                name: "営業部".to_string(),
                code: Some("101".to_string()),
                manager_employee_id: None,
                sections: vec![SectionSnapshot {
                    section_id: "sec-1".to_string(),
                    name: "第一課".to_string(),
                    code: None,
                    manager_employee_id: None,
                    courses: vec![],
                }],
            }],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let (repo, org_id) = make_repo_with_org();
        let snapshot = sample_snapshot(&org_id);
        let id = repo.insert(&snapshot).unwrap();

        let loaded = repo.get(&id).unwrap().expect("snapshot should exist");
        assert_eq!(loaded.active_employee_count, 42);
        assert_eq!(loaded.departments.len(), 1);
        assert_eq!(loaded.departments[0].name, "営業部");
        assert_eq!(loaded.departments[0].sections[0].name, "第一課");
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (repo, _) = make_repo_with_org();
        assert!(repo.get("no-such-id").unwrap().is_none());
    }

    #[test]
    fn test_list_recent() {
        let (repo, org_id) = make_repo_with_org();
        repo.insert(&sample_snapshot(&org_id)).unwrap();
        repo.insert(&sample_snapshot(&org_id)).unwrap();

        let snapshots = repo.list_recent(&org_id, 10).unwrap();
        assert_eq!(snapshots.len(), 2);
    }
}
