// ==========================================
// 社員名簿同期システム - 組織リポジトリ
// ==========================================
// 責務: 組織ルートと 部 / 課 / 係 のデータアクセス
// 鉄則: Repository は業務ロジックを含まない（データ写像のみ）
// 鉄則: find-or-create は必ず (name, 親) での検索を先行させる
//       （同一バッチ再実行で重複ノードを作らない）
// ==========================================

use crate::domain::org_unit::{OrgUnit, Organization};
use crate::domain::snapshot::{CourseSnapshot, DepartmentSnapshot, SectionSnapshot};
use crate::domain::types::OrgLevel;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// トランザクション共有クエリ関数
// ==========================================
// SqliteUnitOfWork と OrganizationRepository の両方から使う。
// &Connection を受けるため Transaction 内でもそのまま動く

pub(crate) fn query_organization(
    conn: &Connection,
    organization_id: &str,
) -> RepositoryResult<Option<Organization>> {
    let org = conn
        .query_row(
            "SELECT organization_id, name, created_at FROM organization WHERE organization_id = ?1",
            params![organization_id],
            map_organization_row,
        )
        .optional()?;
    Ok(org)
}

pub(crate) fn query_organization_by_name(
    conn: &Connection,
    name: &str,
) -> RepositoryResult<Option<Organization>> {
    let org = conn
        .query_row(
            "SELECT organization_id, name, created_at FROM organization WHERE name = ?1",
            params![name],
            map_organization_row,
        )
        .optional()?;
    Ok(org)
}

fn map_organization_row(row: &rusqlite::Row) -> rusqlite::Result<Organization> {
    Ok(Organization {
        organization_id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

/// レベルごとのテーブル定義（テーブル名, 主キー列, 親参照列）
fn level_table(level: OrgLevel) -> (&'static str, &'static str, &'static str) {
    match level {
        OrgLevel::Department => ("department", "department_id", "organization_id"),
        OrgLevel::Section => ("section", "section_id", "department_id"),
        OrgLevel::Course => ("course", "course_id", "section_id"),
    }
}

/// (name, 親) で検索し、なければ作成する
///
/// # 戻り値
/// - (OrgUnit, true): 新規作成
/// - (OrgUnit, false): 既存ノード
pub(crate) fn find_or_create_unit(
    conn: &Connection,
    level: OrgLevel,
    parent_id: &str,
    name: &str,
    code: Option<&str>,
) -> RepositoryResult<(OrgUnit, bool)> {
    let (table, pk, parent_col) = level_table(level);

    // 検索を必ず先行させる
    let existing = conn
        .query_row(
            &format!(
                "SELECT {pk}, {parent_col}, name, code, manager_employee_id, created_at \
                 FROM {table} WHERE {parent_col} = ?1 AND name = ?2"
            ),
            params![parent_id, name],
            |row| map_unit_row(row, level),
        )
        .optional()?;

    if let Some(unit) = existing {
        return Ok((unit, false));
    }

    let unit = OrgUnit::new(
        level,
        Uuid::new_v4().to_string(),
        parent_id.to_string(),
        name.to_string(),
        code.map(|c| c.to_string()),
    );

    conn.execute(
        &format!(
            "INSERT INTO {table} ({pk}, {parent_col}, name, code, manager_employee_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, NULL, ?5)"
        ),
        params![unit.unit_id, unit.parent_id, unit.name, unit.code, unit.created_at],
    )?;

    Ok((unit, true))
}

fn map_unit_row(row: &rusqlite::Row, level: OrgLevel) -> rusqlite::Result<OrgUnit> {
    Ok(OrgUnit {
        unit_id: row.get(0)?,
        level,
        parent_id: row.get(1)?,
        name: row.get(2)?,
        code: row.get(3)?,
        manager_employee_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// 組織配下の全組織単位（3レベル横断）を列挙する
pub(crate) fn query_all_units(
    conn: &Connection,
    organization_id: &str,
) -> RepositoryResult<Vec<OrgUnit>> {
    let mut units = Vec::new();

    let mut stmt = conn.prepare(
        "SELECT department_id, organization_id, name, code, manager_employee_id, created_at \
         FROM department WHERE organization_id = ?1 ORDER BY name",
    )?;
    let departments = stmt
        .query_map(params![organization_id], |row| {
            map_unit_row(row, OrgLevel::Department)
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT s.section_id, s.department_id, s.name, s.code, s.manager_employee_id, s.created_at \
         FROM section s JOIN department d ON d.department_id = s.department_id \
         WHERE d.organization_id = ?1 ORDER BY s.name",
    )?;
    let sections = stmt
        .query_map(params![organization_id], |row| {
            map_unit_row(row, OrgLevel::Section)
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT c.course_id, c.section_id, c.name, c.code, c.manager_employee_id, c.created_at \
         FROM course c \
         JOIN section s ON s.section_id = c.section_id \
         JOIN department d ON d.department_id = s.department_id \
         WHERE d.organization_id = ?1 ORDER BY c.name",
    )?;
    let courses = stmt
        .query_map(params![organization_id], |row| {
            map_unit_row(row, OrgLevel::Course)
        })?
        .collect::<Result<Vec<_>, _>>()?;

    units.extend(departments);
    units.extend(sections);
    units.extend(courses);
    Ok(units)
}

/// 組織単位の管理者参照を設定する
pub(crate) fn update_unit_manager(
    conn: &Connection,
    level: OrgLevel,
    unit_id: &str,
    employee_id: Option<&str>,
) -> RepositoryResult<()> {
    let (table, pk, _) = level_table(level);
    let rows = conn.execute(
        &format!("UPDATE {table} SET manager_employee_id = ?2 WHERE {pk} = ?1"),
        params![unit_id, employee_id],
    )?;
    if rows == 0 {
        return Err(RepositoryError::NotFound {
            entity: table.to_string(),
            id: unit_id.to_string(),
        });
    }
    Ok(())
}

/// 組織階層ツリーを非正規化形式で読み出す（スナップショット用）
pub(crate) fn query_department_tree(
    conn: &Connection,
    organization_id: &str,
) -> RepositoryResult<Vec<DepartmentSnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT department_id, name, code, manager_employee_id \
         FROM department WHERE organization_id = ?1 ORDER BY name",
    )?;
    let departments: Vec<(String, String, Option<String>, Option<String>)> = stmt
        .query_map(params![organization_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut tree = Vec::with_capacity(departments.len());
    for (department_id, name, code, manager) in departments {
        let mut stmt = conn.prepare(
            "SELECT section_id, name, code, manager_employee_id \
             FROM section WHERE department_id = ?1 ORDER BY name",
        )?;
        let sections: Vec<(String, String, Option<String>, Option<String>)> = stmt
            .query_map(params![department_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut section_snapshots = Vec::with_capacity(sections.len());
        for (section_id, s_name, s_code, s_manager) in sections {
            let mut stmt = conn.prepare(
                "SELECT course_id, name, code, manager_employee_id \
                 FROM course WHERE section_id = ?1 ORDER BY name",
            )?;
            let courses = stmt
                .query_map(params![section_id], |row| {
                    Ok(CourseSnapshot {
                        course_id: row.get(0)?,
                        name: row.get(1)?,
                        code: row.get(2)?,
                        manager_employee_id: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            section_snapshots.push(SectionSnapshot {
                section_id,
                name: s_name,
                code: s_code,
                manager_employee_id: s_manager,
                courses,
            });
        }

        tree.push(DepartmentSnapshot {
            department_id,
            name,
            code,
            manager_employee_id: manager,
            sections: section_snapshots,
        });
    }

    Ok(tree)
}

// ==========================================
// OrganizationRepository - 組織ルートリポジトリ
// ==========================================
pub struct OrganizationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrganizationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 組織名で検索し、なければ作成する
    ///
    /// 鉄則: 確定トランザクションの内側からは呼ばない。
    ///       組織解決は取込の前に呼出側が明示的に行う
    pub fn ensure(&self, name: &str) -> RepositoryResult<Organization> {
        let conn = self.get_conn()?;

        if let Some(org) = query_organization_by_name(&conn, name)? {
            return Ok(org);
        }

        let org = Organization {
            organization_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        conn.execute(
            "INSERT INTO organization (organization_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![org.organization_id, org.name, org.created_at],
        )?;

        Ok(org)
    }

    /// ID で組織を取得する
    pub fn get(&self, organization_id: &str) -> RepositoryResult<Option<Organization>> {
        let conn = self.get_conn()?;
        query_organization(&conn, organization_id)
    }

    /// 組織名で取得する（作成はしない）
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Organization>> {
        let conn = self.get_conn()?;
        query_organization_by_name(&conn, name)
    }

    /// 組織配下の全組織単位を列挙する
    pub fn list_units(&self, organization_id: &str) -> RepositoryResult<Vec<OrgUnit>> {
        let conn = self.get_conn()?;
        query_all_units(&conn, organization_id)
    }

    /// 組織階層ツリーを読み出す（スナップショット作成用）
    pub fn load_department_tree(
        &self,
        organization_id: &str,
    ) -> RepositoryResult<Vec<DepartmentSnapshot>> {
        let conn = self.get_conn()?;
        query_department_tree(&conn, organization_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn make_repo() -> OrganizationRepository {
        let conn = db::open_in_memory().unwrap();
        OrganizationRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let repo = make_repo();
        let first = repo.ensure("テスト株式会社").unwrap();
        let second = repo.ensure("テスト株式会社").unwrap();
        assert_eq!(first.organization_id, second.organization_id);
    }

    #[test]
    fn test_find_or_create_unit_idempotent() {
        let repo = make_repo();
        let org = repo.ensure("テスト株式会社").unwrap();

        let conn = repo.get_conn().unwrap();
        let (dept, created) =
            find_or_create_unit(&conn, OrgLevel::Department, &org.organization_id, "営業部", Some("101")).unwrap();
        assert!(created);

        let (dept2, created2) =
            find_or_create_unit(&conn, OrgLevel::Department, &org.organization_id, "営業部", Some("101")).unwrap();
        assert!(!created2);
        assert_eq!(dept.unit_id, dept2.unit_id);
    }

    #[test]
    fn test_same_section_name_in_different_departments() {
        let repo = make_repo();
        let org = repo.ensure("テスト株式会社").unwrap();

        let conn = repo.get_conn().unwrap();
        let (sales, _) =
            find_or_create_unit(&conn, OrgLevel::Department, &org.organization_id, "営業部", None).unwrap();
        let (admin, _) =
            find_or_create_unit(&conn, OrgLevel::Department, &org.organization_id, "総務部", None).unwrap();

        // 一意性は親スコープ内。別の部に同名の課を作れる
        let (s1, c1) = find_or_create_unit(&conn, OrgLevel::Section, &sales.unit_id, "企画課", None).unwrap();
        let (s2, c2) = find_or_create_unit(&conn, OrgLevel::Section, &admin.unit_id, "企画課", None).unwrap();
        assert!(c1 && c2);
        assert_ne!(s1.unit_id, s2.unit_id);
    }
}
