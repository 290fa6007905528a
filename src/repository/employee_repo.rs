// ==========================================
// 社員名簿同期システム - 社員リポジトリ
// ==========================================
// 責務: 社員行のデータアクセスと EmployeeView の組み立て
// 鉄則: 読み取りは常に所属名を解決済みの EmployeeView で返す
//       （呼出側にリレーション辿りをさせない）
// 鉄則: 物理 DELETE は発行しない
// ==========================================

use crate::domain::employee::{Employee, EmployeeView};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// トランザクション共有クエリ関数
// ==========================================

const VIEW_SELECT: &str = "\
    SELECT e.employee_id, e.employee_number, e.name, e.name_kana, e.email, e.phone, \
           e.position_name, e.position_code, e.grade_name, e.grade_code, \
           e.employment_type_name, e.employment_type_code, e.active, \
           e.department_id, d.name, e.section_id, s.name, e.course_id, c.name \
    FROM employee e \
    JOIN department d ON d.department_id = e.department_id \
    LEFT JOIN section s ON s.section_id = e.section_id \
    LEFT JOIN course c ON c.course_id = e.course_id";

fn map_view_row(row: &rusqlite::Row) -> rusqlite::Result<EmployeeView> {
    Ok(EmployeeView {
        employee_id: row.get(0)?,
        employee_number: row.get(1)?,
        name: row.get(2)?,
        name_kana: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        position_name: row.get(6)?,
        position_code: row.get(7)?,
        grade_name: row.get(8)?,
        grade_code: row.get(9)?,
        employment_type_name: row.get(10)?,
        employment_type_code: row.get(11)?,
        active: row.get::<_, i64>(12)? != 0,
        department_id: row.get(13)?,
        department_name: row.get(14)?,
        section_id: row.get(15)?,
        section_name: row.get(16)?,
        course_id: row.get(17)?,
        course_name: row.get(18)?,
    })
}

/// 組織配下の全社員ビュー（退職者含む）を列挙する
pub(crate) fn query_employee_views(
    conn: &Connection,
    organization_id: &str,
) -> RepositoryResult<Vec<EmployeeView>> {
    let sql = format!("{VIEW_SELECT} WHERE e.organization_id = ?1 ORDER BY e.employee_number");
    let mut stmt = conn.prepare(&sql)?;
    let views = stmt
        .query_map(params![organization_id], map_view_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(views)
}

/// 社員番号で1件取得する
pub(crate) fn query_view_by_number(
    conn: &Connection,
    organization_id: &str,
    employee_number: &str,
) -> RepositoryResult<Option<EmployeeView>> {
    let sql = format!("{VIEW_SELECT} WHERE e.organization_id = ?1 AND e.employee_number = ?2");
    let view = conn
        .query_row(&sql, params![organization_id, employee_number], map_view_row)
        .optional()?;
    Ok(view)
}

/// 在籍社員数を数える
pub(crate) fn count_active(conn: &Connection, organization_id: &str) -> RepositoryResult<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM employee WHERE organization_id = ?1 AND active = 1",
        params![organization_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// 社員行を挿入する
pub(crate) fn insert_employee(conn: &Connection, employee: &Employee) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO employee (
            employee_id, organization_id, employee_number, name, name_kana,
            email, phone, position_name, position_code, grade_name, grade_code,
            employment_type_name, employment_type_code, joined_on, birth_date,
            active, department_id, section_id, course_id, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21
        )
        "#,
        params![
            employee.employee_id,
            employee.organization_id,
            employee.employee_number,
            employee.name,
            employee.name_kana,
            employee.email,
            employee.phone,
            employee.position_name,
            employee.position_code,
            employee.grade_name,
            employee.grade_code,
            employee.employment_type_name,
            employee.employment_type_code,
            employee.joined_on,
            employee.birth_date,
            employee.active as i64,
            employee.department_id,
            employee.section_id,
            employee.course_id,
            employee.created_at,
            employee.updated_at,
        ],
    )?;
    Ok(())
}

/// 社員行の可変項目を更新する（created_at は不変。
/// employee_number はメールアドレス照合での番号付替に備えて更新対象）
pub(crate) fn update_employee(conn: &Connection, employee: &Employee) -> RepositoryResult<()> {
    let rows = conn.execute(
        r#"
        UPDATE employee SET
            name = ?2, name_kana = ?3, email = ?4, phone = ?5,
            position_name = ?6, position_code = ?7, grade_name = ?8, grade_code = ?9,
            employment_type_name = ?10, employment_type_code = ?11,
            joined_on = ?12, birth_date = ?13, active = ?14,
            department_id = ?15, section_id = ?16, course_id = ?17,
            updated_at = ?18, employee_number = ?19
        WHERE employee_id = ?1
        "#,
        params![
            employee.employee_id,
            employee.name,
            employee.name_kana,
            employee.email,
            employee.phone,
            employee.position_name,
            employee.position_code,
            employee.grade_name,
            employee.grade_code,
            employee.employment_type_name,
            employee.employment_type_code,
            employee.joined_on,
            employee.birth_date,
            employee.active as i64,
            employee.department_id,
            employee.section_id,
            employee.course_id,
            employee.updated_at,
            employee.employee_number,
        ],
    )?;
    if rows == 0 {
        return Err(RepositoryError::NotFound {
            entity: "employee".to_string(),
            id: employee.employee_id.clone(),
        });
    }
    Ok(())
}

/// 取込バッチに現れなかった在籍社員を一括で退職化する
///
/// # 引数
/// - `incoming_numbers`: 取込バッチに含まれる社員番号の集合
///
/// # 戻り値
/// - 退職化した行数
///
/// # 説明
/// 行ループではなく単一の集合ベース UPDATE で実行する
pub(crate) fn bulk_deactivate_missing(
    conn: &Connection,
    organization_id: &str,
    incoming_numbers: &[String],
    now: DateTime<Utc>,
) -> RepositoryResult<usize> {
    if incoming_numbers.is_empty() {
        // バッチが空なら全在籍社員が対象
        let rows = conn.execute(
            "UPDATE employee SET active = 0, updated_at = ?2 \
             WHERE organization_id = ?1 AND active = 1",
            params![organization_id, now],
        )?;
        return Ok(rows);
    }

    // IN 句のプレースホルダを組み立てる
    let placeholders = incoming_numbers
        .iter()
        .enumerate()
        .map(|(i, _)| format!("?{}", i + 3))
        .collect::<Vec<_>>()
        .join(",");

    let sql = format!(
        "UPDATE employee SET active = 0, updated_at = ?2 \
         WHERE organization_id = ?1 AND active = 1 AND employee_number NOT IN ({placeholders})"
    );

    let mut sql_params: Vec<&dyn rusqlite::ToSql> = vec![&organization_id, &now];
    for number in incoming_numbers {
        sql_params.push(number);
    }

    let rows = conn.execute(&sql, sql_params.as_slice())?;
    Ok(rows)
}

// ==========================================
// EmployeeRepository - 社員読み取りリポジトリ
// ==========================================
// 用途: プレビュー（Reconciler 入力）と監査の読み取り側。
//       書き込みは UnitOfWork 経由のみ
pub struct EmployeeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EmployeeRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 組織配下の全社員ビュー（退職者含む）
    pub fn list_views(&self, organization_id: &str) -> RepositoryResult<Vec<EmployeeView>> {
        let conn = self.get_conn()?;
        query_employee_views(&conn, organization_id)
    }

    /// 社員番号で1件取得
    pub fn find_view_by_number(
        &self,
        organization_id: &str,
        employee_number: &str,
    ) -> RepositoryResult<Option<EmployeeView>> {
        let conn = self.get_conn()?;
        query_view_by_number(&conn, organization_id, employee_number)
    }

    /// 在籍社員数
    pub fn count_active(&self, organization_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        count_active(&conn, organization_id)
    }
}
