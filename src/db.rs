// ==========================================
// 社員名簿同期システム - SQLite 接続初期化
// ==========================================
// 目的:
// - すべての Connection::open に対して PRAGMA 設定を統一する
// - busy_timeout を統一し、並行書込時の busy エラーを減らす
// - スキーマ初期化を一箇所に集約する
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 既定 busy_timeout（ミリ秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// スキーマ定義
///
/// 方針:
/// - 組織階層は 部 / 課 / 係 の3テーブル（親スコープ内で name 一意）
/// - 社員は物理削除しない（active フラグで退職化）
/// - change_log は追記専用（UPDATE/DELETE しない）
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS organization (
    organization_id TEXT PRIMARY KEY,
    name            TEXT NOT NULL UNIQUE,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS department (
    department_id       TEXT PRIMARY KEY,
    organization_id     TEXT NOT NULL REFERENCES organization(organization_id),
    name                TEXT NOT NULL,
    code                TEXT,
    manager_employee_id TEXT,
    created_at          TEXT NOT NULL,
    UNIQUE (organization_id, name)
);

CREATE TABLE IF NOT EXISTS section (
    section_id          TEXT PRIMARY KEY,
    department_id       TEXT NOT NULL REFERENCES department(department_id),
    name                TEXT NOT NULL,
    code                TEXT,
    manager_employee_id TEXT,
    created_at          TEXT NOT NULL,
    UNIQUE (department_id, name)
);

CREATE TABLE IF NOT EXISTS course (
    course_id           TEXT PRIMARY KEY,
    section_id          TEXT NOT NULL REFERENCES section(section_id),
    name                TEXT NOT NULL,
    code                TEXT,
    manager_employee_id TEXT,
    created_at          TEXT NOT NULL,
    UNIQUE (section_id, name)
);

CREATE TABLE IF NOT EXISTS employee (
    employee_id          TEXT PRIMARY KEY,
    organization_id      TEXT NOT NULL REFERENCES organization(organization_id),
    employee_number      TEXT NOT NULL,
    name                 TEXT NOT NULL,
    name_kana            TEXT,
    email                TEXT,
    phone                TEXT,
    position_name        TEXT,
    position_code        TEXT,
    grade_name           TEXT,
    grade_code           TEXT,
    employment_type_name TEXT,
    employment_type_code TEXT,
    joined_on            TEXT,
    birth_date           TEXT,
    active               INTEGER NOT NULL DEFAULT 1,
    department_id        TEXT NOT NULL REFERENCES department(department_id),
    section_id           TEXT REFERENCES section(section_id),
    course_id            TEXT REFERENCES course(course_id),
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL,
    UNIQUE (organization_id, employee_number)
);

CREATE INDEX IF NOT EXISTS idx_employee_active
    ON employee(organization_id, active);
CREATE INDEX IF NOT EXISTS idx_employee_email
    ON employee(organization_id, email);

CREATE TABLE IF NOT EXISTS change_log (
    change_log_id TEXT PRIMARY KEY,
    entity_type   TEXT NOT NULL,
    entity_id     TEXT NOT NULL,
    change_type   TEXT NOT NULL,
    field_name    TEXT,
    old_value     TEXT,
    new_value     TEXT,
    description   TEXT,
    batch_id      TEXT,
    actor         TEXT NOT NULL,
    changed_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_change_log_batch
    ON change_log(batch_id);
CREATE INDEX IF NOT EXISTS idx_change_log_entity
    ON change_log(entity_type, entity_id);

CREATE TABLE IF NOT EXISTS organization_snapshot (
    snapshot_id           TEXT PRIMARY KEY,
    organization_id       TEXT NOT NULL REFERENCES organization(organization_id),
    active_employee_count INTEGER NOT NULL,
    tree_json             TEXT NOT NULL,
    created_at            TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_snapshot_org
    ON organization_snapshot(organization_id, created_at);
"#;

/// SQLite 接続の統一 PRAGMA 設定
///
/// 説明:
/// - foreign_keys は「接続ごと」に有効化が必要
/// - busy_timeout も「接続ごと」に設定が必要
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// SQLite 接続を開き、統一設定を適用する
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// スキーマを初期化する（存在しないテーブルのみ作成）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

/// インメモリ接続を開く（テスト用途）
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_initializes() {
        let conn = open_in_memory().unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN \
                 ('organization','department','section','course','employee','change_log','organization_snapshot')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(count, 7);
    }

    #[test]
    fn test_schema_init_is_idempotent() {
        let conn = open_in_memory().unwrap();
        // 二度目の初期化でもエラーにならない
        init_schema(&conn).unwrap();
    }
}
