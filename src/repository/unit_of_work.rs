// ==========================================
// 社員名簿同期システム - UnitOfWork（確定トランザクション境界）
// ==========================================
// 責務: 確定処理が必要とする型付きリポジトリ操作を1つの
//       トランザクションスコープとして提供する
// 鉄則: Committer はこの trait のみに依存する（具象ストアを知らない）
// 鉄則: クロージャが Err を返したら全書込をロールバックする
//       （部分状態を残さない）
// ==========================================

use crate::db;
use crate::domain::change_log::ChangeLogEntry;
use crate::domain::employee::{Employee, EmployeeView};
use crate::domain::org_unit::{OrgUnit, Organization};
use crate::domain::types::OrgLevel;
use crate::repository::change_log_repo;
use crate::repository::employee_repo;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::org_repo;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// UnitOfWork Trait
// ==========================================
// 実装者: SqliteUnitOfWork（本番）、テスト用の失敗注入ラッパ
pub trait UnitOfWork {
    /// 組織ルートを取得する（確定前の存在検証用）
    fn get_organization(&self, organization_id: &str) -> RepositoryResult<Option<Organization>>;

    /// 部を (組織, name) で検索し、なければ作成する
    ///
    /// # 戻り値
    /// - (OrgUnit, true): 新規作成 / (OrgUnit, false): 既存
    fn find_or_create_department(
        &self,
        organization_id: &str,
        name: &str,
        code: Option<&str>,
    ) -> RepositoryResult<(OrgUnit, bool)>;

    /// 課を (部, name) で検索し、なければ作成する
    fn find_or_create_section(
        &self,
        department_id: &str,
        name: &str,
        code: Option<&str>,
    ) -> RepositoryResult<(OrgUnit, bool)>;

    /// 係を (課, name) で検索し、なければ作成する
    fn find_or_create_course(
        &self,
        section_id: &str,
        name: &str,
        code: Option<&str>,
    ) -> RepositoryResult<(OrgUnit, bool)>;

    /// 組織配下の全社員ビュー（退職者含む・トランザクション内の最新状態）
    fn list_employee_views(&self, organization_id: &str) -> RepositoryResult<Vec<EmployeeView>>;

    /// 社員行を挿入する
    fn insert_employee(&self, employee: &Employee) -> RepositoryResult<()>;

    /// 社員行の可変項目を更新する
    fn update_employee(&self, employee: &Employee) -> RepositoryResult<()>;

    /// バッチに現れなかった在籍社員を集合ベースの単一 UPDATE で退職化する
    fn bulk_deactivate_missing(
        &self,
        organization_id: &str,
        incoming_numbers: &[String],
        now: DateTime<Utc>,
    ) -> RepositoryResult<usize>;

    /// 組織配下の全組織単位（3レベル横断）
    fn list_units(&self, organization_id: &str) -> RepositoryResult<Vec<OrgUnit>>;

    /// 組織単位の管理者参照を設定する
    fn set_unit_manager(
        &self,
        level: OrgLevel,
        unit_id: &str,
        employee_id: Option<&str>,
    ) -> RepositoryResult<()>;

    /// 変更履歴を追記する（同一トランザクション内）
    fn insert_change_logs(&self, entries: &[ChangeLogEntry]) -> RepositoryResult<usize>;
}

// ==========================================
// SqliteUnitOfWork - rusqlite Transaction 上の実装
// ==========================================
pub struct SqliteUnitOfWork<'a> {
    tx: &'a Transaction<'a>,
}

impl<'a> SqliteUnitOfWork<'a> {
    pub fn new(tx: &'a Transaction<'a>) -> Self {
        Self { tx }
    }
}

impl UnitOfWork for SqliteUnitOfWork<'_> {
    fn get_organization(&self, organization_id: &str) -> RepositoryResult<Option<Organization>> {
        org_repo::query_organization(self.tx, organization_id)
    }

    fn find_or_create_department(
        &self,
        organization_id: &str,
        name: &str,
        code: Option<&str>,
    ) -> RepositoryResult<(OrgUnit, bool)> {
        org_repo::find_or_create_unit(self.tx, OrgLevel::Department, organization_id, name, code)
    }

    fn find_or_create_section(
        &self,
        department_id: &str,
        name: &str,
        code: Option<&str>,
    ) -> RepositoryResult<(OrgUnit, bool)> {
        org_repo::find_or_create_unit(self.tx, OrgLevel::Section, department_id, name, code)
    }

    fn find_or_create_course(
        &self,
        section_id: &str,
        name: &str,
        code: Option<&str>,
    ) -> RepositoryResult<(OrgUnit, bool)> {
        org_repo::find_or_create_unit(self.tx, OrgLevel::Course, section_id, name, code)
    }

    fn list_employee_views(&self, organization_id: &str) -> RepositoryResult<Vec<EmployeeView>> {
        employee_repo::query_employee_views(self.tx, organization_id)
    }

    fn insert_employee(&self, employee: &Employee) -> RepositoryResult<()> {
        employee_repo::insert_employee(self.tx, employee)
    }

    fn update_employee(&self, employee: &Employee) -> RepositoryResult<()> {
        employee_repo::update_employee(self.tx, employee)
    }

    fn bulk_deactivate_missing(
        &self,
        organization_id: &str,
        incoming_numbers: &[String],
        now: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        employee_repo::bulk_deactivate_missing(self.tx, organization_id, incoming_numbers, now)
    }

    fn list_units(&self, organization_id: &str) -> RepositoryResult<Vec<OrgUnit>> {
        org_repo::query_all_units(self.tx, organization_id)
    }

    fn set_unit_manager(
        &self,
        level: OrgLevel,
        unit_id: &str,
        employee_id: Option<&str>,
    ) -> RepositoryResult<()> {
        org_repo::update_unit_manager(self.tx, level, unit_id, employee_id)
    }

    fn insert_change_logs(&self, entries: &[ChangeLogEntry]) -> RepositoryResult<usize> {
        let mut count = 0;
        for entry in entries {
            change_log_repo::insert_change_log(self.tx, entry)?;
            count += 1;
        }
        Ok(count)
    }
}

// ==========================================
// SqliteStore - 接続保持とトランザクション実行
// ==========================================
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// データベースファイルを開く（PRAGMA 設定 + スキーマ初期化込み）
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        db::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// インメモリストアを開く（テスト用途）
    pub fn in_memory() -> RepositoryResult<Self> {
        let conn = db::open_in_memory()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 接続の共有ハンドル（読み取りリポジトリ構築用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// 1つの UnitOfWork スコープを実行する
    ///
    /// # 失敗時の挙動
    /// クロージャが Err を返した場合、トランザクション全体を
    /// ロールバックし、書込は一切可視化されない
    pub fn with_unit_of_work<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&dyn UnitOfWork) -> RepositoryResult<T>,
    {
        let mut guard = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = guard
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let result = {
            let uow = SqliteUnitOfWork::new(&tx);
            f(&uow)
        };

        match result {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
                Ok(value)
            }
            Err(e) => {
                // Drop でもロールバックされるが、明示しておく
                let _ = tx.rollback();
                Err(e)
            }
        }
    }
}
