// ==========================================
// テスト共通ヘルパ
// ==========================================

use roster_sync::config::ReconcileConfig;
use roster_sync::domain::employee::ProcessedEmployee;
use roster_sync::repository::{OrganizationRepository, SqliteStore};
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

/// インメモリのテストストアを作成する
pub fn create_test_store() -> SqliteStore {
    SqliteStore::in_memory().expect("テストストアの作成に失敗")
}

/// テスト組織を登録して ID を返す
pub fn seed_organization(store: &SqliteStore, name: &str) -> String {
    OrganizationRepository::new(store.connection())
        .ensure(name)
        .expect("テスト組織の作成に失敗")
        .organization_id
}

/// 既定の設定
pub fn test_config() -> ReconcileConfig {
    ReconcileConfig::default()
}

/// ヘッダ付きの名簿 CSV 一時ファイルを作成する
pub fn write_roster_csv(header: &str, rows: &[&str]) -> NamedTempFile {
    let mut file = Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("一時ファイルの作成に失敗");
    writeln!(file, "{header}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}

/// 標準的なヘッダ
pub const STANDARD_HEADER: &str = "社員番号,氏名,フリガナ,メールアドレス,所属,所属コード,役職,入社日";

/// ProcessedEmployee をテスト用に直接組み立てる
pub fn make_record(number: &str, name: &str, dept: &str, position: &str) -> ProcessedEmployee {
    ProcessedEmployee {
        employee_number: number.to_string(),
        name: name.to_string(),
        department_name: dept.to_string(),
        section_name: None,
        course_name: None,
        affiliation_code: None,
        name_kana: None,
        email: None,
        phone: None,
        position_name: position.to_string(),
        position_code: None,
        grade_name: None,
        grade_code: None,
        employment_type_name: None,
        employment_type_code: None,
        joined_on: None,
        birth_date: None,
        row_number: 1,
    }
}
