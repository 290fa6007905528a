// ==========================================
// リコンサイル E2E シナリオテスト
// ==========================================
// 検証対象: 異動優先・退職集合則・原子性（全体ロールバック）
// ==========================================

mod test_helpers;

use chrono::{DateTime, Utc};
use roster_sync::domain::change_log::ChangeLogEntry;
use roster_sync::domain::employee::{Employee, EmployeeView};
use roster_sync::domain::org_unit::{OrgUnit, Organization};
use roster_sync::domain::types::OrgLevel;
use roster_sync::engine::Committer;
use roster_sync::importer::{RosterImporter, RosterImporterImpl};
use roster_sync::logging;
use roster_sync::repository::{RepositoryError, RepositoryResult, UnitOfWork};
use test_helpers::{
    create_test_store, make_record, seed_organization, test_config, write_roster_csv,
    STANDARD_HEADER,
};

#[tokio::test]
async fn test_transfer_scenario_dept_a_to_b() {
    // E1 を部 A で登録 → 同役職のまま部 B の名簿を取込
    // → transferred のみに現れる（updated には現れない）
    logging::init_test();

    let store = create_test_store();
    let org_id = seed_organization(&store, "テスト株式会社");
    let importer = RosterImporterImpl::new(store, test_config());

    let initial = write_roster_csv(STANDARD_HEADER, &["E1,山田 太郎,,,A,,一般社員,"]);
    importer
        .import_files(&org_id, vec![initial.path().to_path_buf()], "tester")
        .await
        .unwrap();

    let moved = write_roster_csv(STANDARD_HEADER, &["E1,山田 太郎,,,B,,一般社員,"]);
    let result = importer
        .preview_files(&org_id, vec![moved.path().to_path_buf()])
        .await
        .unwrap();

    assert!(result.preview.updated.is_empty());
    assert_eq!(result.preview.transferred.len(), 1);
    let transfer = &result.preview.transferred[0];
    assert_eq!(transfer.old_unit, "A");
    assert_eq!(transfer.new_unit, "B");
}

#[tokio::test]
async fn test_retirement_scenario_absent_employee_deactivated() {
    // 在籍 {E1,E2,E3} に対して {E1,E2} を取込 → E3 が退職化、retired==1
    logging::init_test();

    let store = create_test_store();
    let conn = store.connection();
    let org_id = seed_organization(&store, "テスト株式会社");
    let importer = RosterImporterImpl::new(store, test_config());

    let initial = write_roster_csv(
        STANDARD_HEADER,
        &[
            "E1,山田 太郎,,,営業部,,,",
            "E2,佐藤 花子,,,営業部,,,",
            "E3,鈴木 次郎,,,営業部,,,",
        ],
    );
    importer
        .import_files(&org_id, vec![initial.path().to_path_buf()], "tester")
        .await
        .unwrap();

    let reduced = write_roster_csv(
        STANDARD_HEADER,
        &["E1,山田 太郎,,,営業部,,,", "E2,佐藤 花子,,,営業部,,,"],
    );
    let (_, summary) = importer
        .import_files(&org_id, vec![reduced.path().to_path_buf()], "tester")
        .await
        .unwrap();

    assert_eq!(summary.statistics.retired, 1);

    let guard = conn.lock().unwrap();
    let active: Vec<String> = {
        let mut stmt = guard
            .prepare("SELECT employee_number FROM employee WHERE active = 1 ORDER BY employee_number")
            .unwrap();
        stmt.query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    };
    assert_eq!(active, vec!["E1".to_string(), "E2".to_string()]);

    // E3 は物理削除されず退職化されている
    let e3_active: i64 = guard
        .query_row(
            "SELECT active FROM employee WHERE employee_number = 'E3'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(e3_active, 0);

    // RETIREMENT の監査エントリが残っている
    let retirement_logs: i64 = guard
        .query_row(
            "SELECT COUNT(*) FROM change_log WHERE change_type = 'RETIREMENT'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(retirement_logs, 1);
}

#[tokio::test]
async fn test_rejoining_reactivates_and_logs() {
    // 退職化された社員が名簿に再出現 → 在籍化 + REJOINING エントリ
    logging::init_test();

    let store = create_test_store();
    let conn = store.connection();
    let org_id = seed_organization(&store, "テスト株式会社");
    let importer = RosterImporterImpl::new(store, test_config());

    let initial = write_roster_csv(STANDARD_HEADER, &["E1,山田 太郎,,,営業部,,,", "E2,佐藤 花子,,,営業部,,,"]);
    importer
        .import_files(&org_id, vec![initial.path().to_path_buf()], "tester")
        .await
        .unwrap();

    // E1 が一旦退職
    let without_e1 = write_roster_csv(STANDARD_HEADER, &["E2,佐藤 花子,,,営業部,,,"]);
    importer
        .import_files(&org_id, vec![without_e1.path().to_path_buf()], "tester")
        .await
        .unwrap();

    // E1 が再出現
    let rejoined = write_roster_csv(STANDARD_HEADER, &["E1,山田 太郎,,,営業部,,,", "E2,佐藤 花子,,,営業部,,,"]);
    let (_, summary) = importer
        .import_files(&org_id, vec![rejoined.path().to_path_buf()], "tester")
        .await
        .unwrap();

    assert_eq!(summary.statistics.updated, 1);

    let guard = conn.lock().unwrap();
    let e1_active: i64 = guard
        .query_row(
            "SELECT active FROM employee WHERE employee_number = 'E1'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(e1_active, 1);

    let rejoining_logs: i64 = guard
        .query_row(
            "SELECT COUNT(*) FROM change_log WHERE change_type = 'REJOINING'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(rejoining_logs, 1);
}

#[tokio::test]
async fn test_email_fallback_matches_renumbered_employee() {
    // 社員番号が変わってもメールアドレスで既存行に照合され、新規行を作らない
    logging::init_test();

    let store = create_test_store();
    let conn = store.connection();
    let org_id = seed_organization(&store, "テスト株式会社");
    let importer = RosterImporterImpl::new(store, test_config());

    let initial = write_roster_csv(STANDARD_HEADER, &["OLD1,山田 太郎,,taro@example.co.jp,営業部,,,"]);
    importer
        .import_files(&org_id, vec![initial.path().to_path_buf()], "tester")
        .await
        .unwrap();

    let renumbered = write_roster_csv(STANDARD_HEADER, &["NEW1,山田 太郎,,taro@example.co.jp,営業部,,,"]);
    let (_, summary) = importer
        .import_files(&org_id, vec![renumbered.path().to_path_buf()], "tester")
        .await
        .unwrap();

    assert_eq!(summary.statistics.created, 0);
    assert_eq!(summary.statistics.updated, 1);

    let guard = conn.lock().unwrap();
    let total: i64 = guard
        .query_row("SELECT COUNT(*) FROM employee", [], |r| r.get(0))
        .unwrap();
    assert_eq!(total, 1);
    let number: String = guard
        .query_row("SELECT employee_number FROM employee", [], |r| r.get(0))
        .unwrap();
    assert_eq!(number, "NEW1");
}

// ==========================================
// 原子性: 途中失敗で部分状態を残さない
// ==========================================

/// 変更履歴の追記だけ失敗させる UnitOfWork ラッパ（模擬ストア障害）
struct FailingUow<'a> {
    inner: &'a dyn UnitOfWork,
}

impl UnitOfWork for FailingUow<'_> {
    fn get_organization(&self, organization_id: &str) -> RepositoryResult<Option<Organization>> {
        self.inner.get_organization(organization_id)
    }

    fn find_or_create_department(
        &self,
        organization_id: &str,
        name: &str,
        code: Option<&str>,
    ) -> RepositoryResult<(OrgUnit, bool)> {
        self.inner.find_or_create_department(organization_id, name, code)
    }

    fn find_or_create_section(
        &self,
        department_id: &str,
        name: &str,
        code: Option<&str>,
    ) -> RepositoryResult<(OrgUnit, bool)> {
        self.inner.find_or_create_section(department_id, name, code)
    }

    fn find_or_create_course(
        &self,
        section_id: &str,
        name: &str,
        code: Option<&str>,
    ) -> RepositoryResult<(OrgUnit, bool)> {
        self.inner.find_or_create_course(section_id, name, code)
    }

    fn list_employee_views(&self, organization_id: &str) -> RepositoryResult<Vec<EmployeeView>> {
        self.inner.list_employee_views(organization_id)
    }

    fn insert_employee(&self, employee: &Employee) -> RepositoryResult<()> {
        self.inner.insert_employee(employee)
    }

    fn update_employee(&self, employee: &Employee) -> RepositoryResult<()> {
        self.inner.update_employee(employee)
    }

    fn bulk_deactivate_missing(
        &self,
        organization_id: &str,
        incoming_numbers: &[String],
        now: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        self.inner
            .bulk_deactivate_missing(organization_id, incoming_numbers, now)
    }

    fn list_units(&self, organization_id: &str) -> RepositoryResult<Vec<OrgUnit>> {
        self.inner.list_units(organization_id)
    }

    fn set_unit_manager(
        &self,
        level: OrgLevel,
        unit_id: &str,
        employee_id: Option<&str>,
    ) -> RepositoryResult<()> {
        self.inner.set_unit_manager(level, unit_id, employee_id)
    }

    fn insert_change_logs(&self, _entries: &[ChangeLogEntry]) -> RepositoryResult<usize> {
        Err(RepositoryError::InternalError("模擬ストア障害".to_string()))
    }
}

#[test]
fn test_mid_transaction_failure_leaves_nothing_behind() {
    logging::init_test();

    let store = create_test_store();
    let org_id = seed_organization(&store, "テスト株式会社");
    let committer = Committer::new(test_config());

    let batch = vec![
        make_record("E1", "山田 太郎", "営業部", "課長"),
        make_record("E2", "佐藤 花子", "総務部", "一般社員"),
    ];

    // 確定の最終手順（変更履歴追記）で失敗 → 全体ロールバック
    let result = store.with_unit_of_work(|uow| {
        let failing = FailingUow { inner: uow };
        committer.commit(&failing, &org_id, &batch, "tester", "B-FAIL")
    });
    assert!(result.is_err());

    // 階層ノードも社員も監査エントリも一切残っていない
    let conn = store.connection();
    let guard = conn.lock().unwrap();
    for (table, expected) in [("department", 0i64), ("employee", 0), ("change_log", 0)] {
        let count: i64 = guard
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, expected, "{table} に部分状態が残っている");
    }
}

#[test]
fn test_commit_requires_existing_organization() {
    // 組織の暗黙生成は行わない（明示解決が必須）
    let store = create_test_store();
    let committer = Committer::new(test_config());

    let batch = vec![make_record("E1", "山田 太郎", "営業部", "一般社員")];
    let result = store.with_unit_of_work(|uow| {
        committer.commit(uow, "no-such-org", &batch, "tester", "B-NOORG")
    });

    assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
}
