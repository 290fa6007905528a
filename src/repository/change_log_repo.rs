// ==========================================
// 社員名簿同期システム - 変更履歴リポジトリ
// ==========================================
// 鉄則: change_log は追記専用。INSERT 以外の書き込みを発行しない
// 責務: データ写像のみ（業務ロジックを含まない）
// ==========================================

use crate::domain::change_log::ChangeLogEntry;
use crate::domain::types::{ChangeType, EntityType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// トランザクション共有クエリ関数
// ==========================================

/// 変更履歴1件を挿入する（&Connection を受けるため Transaction 内でも使える）
pub(crate) fn insert_change_log(conn: &Connection, entry: &ChangeLogEntry) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO change_log (
            change_log_id, entity_type, entity_id, change_type,
            field_name, old_value, new_value, description,
            batch_id, actor, changed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            entry.change_log_id,
            entry.entity_type.as_str(),
            entry.entity_id,
            entry.change_type.as_str(),
            entry.field_name,
            entry.old_value,
            entry.new_value,
            entry.description,
            entry.batch_id,
            entry.actor,
            entry.changed_at,
        ],
    )?;
    Ok(())
}

fn map_entry_row(row: &rusqlite::Row) -> rusqlite::Result<ChangeLogEntry> {
    let entity_type_raw: String = row.get(1)?;
    let change_type_raw: String = row.get(3)?;
    Ok(ChangeLogEntry {
        change_log_id: row.get(0)?,
        entity_type: EntityType::from_str(&entity_type_raw).unwrap_or(EntityType::Employee),
        entity_id: row.get(2)?,
        change_type: ChangeType::from_str(&change_type_raw).unwrap_or(ChangeType::Update),
        field_name: row.get(4)?,
        old_value: row.get(5)?,
        new_value: row.get(6)?,
        description: row.get(7)?,
        batch_id: row.get(8)?,
        actor: row.get(9)?,
        changed_at: row.get(10)?,
    })
}

const ENTRY_SELECT: &str = "\
    SELECT change_log_id, entity_type, entity_id, change_type, \
           field_name, old_value, new_value, description, \
           batch_id, actor, changed_at \
    FROM change_log";

// ==========================================
// ChangeLogRepository - 変更履歴リポジトリ
// ==========================================
pub struct ChangeLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ChangeLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 変更履歴1件を追記する
    pub fn insert(&self, entry: &ChangeLogEntry) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_change_log(&conn, entry)?;
        Ok(entry.change_log_id.clone())
    }

    /// 変更履歴を一括追記する（トランザクション化）
    pub fn batch_insert(&self, entries: &[ChangeLogEntry]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for entry in entries {
            insert_change_log(&tx, entry)?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// バッチ ID で変更履歴を取得する
    pub fn list_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<ChangeLogEntry>> {
        let conn = self.get_conn()?;
        let sql = format!("{ENTRY_SELECT} WHERE batch_id = ?1 ORDER BY changed_at, change_log_id");
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![batch_id], map_entry_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// エンティティで変更履歴を取得する（新しい順）
    pub fn list_by_entity(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> RepositoryResult<Vec<ChangeLogEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{ENTRY_SELECT} WHERE entity_type = ?1 AND entity_id = ?2 \
             ORDER BY changed_at DESC, change_log_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![entity_type.as_str(), entity_id], map_entry_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// 直近の変更履歴を取得する
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<ChangeLogEntry>> {
        let conn = self.get_conn()?;
        let sql = format!("{ENTRY_SELECT} ORDER BY changed_at DESC, change_log_id LIMIT ?1");
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![limit as i64], map_entry_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// 総件数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM change_log", [], |row| row.get(0))?;
        Ok(count)
    }
}
