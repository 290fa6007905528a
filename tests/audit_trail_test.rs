// ==========================================
// 監査証跡 統合テスト
// ==========================================
// 検証対象: バッチ相関・項目レベル監査・スナップショット差分
// ==========================================

mod test_helpers;

use roster_sync::audit::{compare_snapshots, AuditTrail};
use roster_sync::domain::types::EntityType;
use roster_sync::importer::{RosterImporter, RosterImporterImpl};
use roster_sync::logging;
use test_helpers::{create_test_store, seed_organization, test_config, write_roster_csv, STANDARD_HEADER};

#[tokio::test]
async fn test_batch_entries_are_retrievable_together() {
    logging::init_test();

    let store = create_test_store();
    let audit = AuditTrail::new(store.connection());
    let org_id = seed_organization(&store, "テスト株式会社");
    let importer = RosterImporterImpl::new(store, test_config());

    let csv = write_roster_csv(
        STANDARD_HEADER,
        &["E1,山田 太郎,,,営業部,,,", "E2,佐藤 花子,,,総務部,,,"],
    );
    let (preview, summary) = importer
        .import_files(&org_id, vec![csv.path().to_path_buf()], "tester")
        .await
        .unwrap();
    assert_eq!(preview.batch_id, summary.batch_id);

    // 1バッチの全エントリがバッチ ID で引ける（CREATE 2件 + IMPORT 1件）
    let entries = audit.list_batch_entries(&summary.batch_id).unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries
        .iter()
        .all(|e| e.batch_id.as_deref() == Some(summary.batch_id.as_str())));
    assert!(entries.iter().all(|e| e.actor == "tester"));
}

#[tokio::test]
async fn test_field_change_entries_have_readable_description() {
    logging::init_test();

    let store = create_test_store();
    let conn = store.connection();
    let audit = AuditTrail::new(store.connection());
    let org_id = seed_organization(&store, "テスト株式会社");
    let importer = RosterImporterImpl::new(store, test_config());

    let initial = write_roster_csv(STANDARD_HEADER, &["E1,山田 太郎,,,営業部,,主任,"]);
    importer
        .import_files(&org_id, vec![initial.path().to_path_buf()], "tester")
        .await
        .unwrap();

    // 役職を昇格させて再取込
    let promoted = write_roster_csv(STANDARD_HEADER, &["E1,山田 太郎,,,営業部,,課長,"]);
    importer
        .import_files(&org_id, vec![promoted.path().to_path_buf()], "tester")
        .await
        .unwrap();

    let guard = conn.lock().unwrap();
    let employee_id: String = guard
        .query_row(
            "SELECT employee_id FROM employee WHERE employee_number = 'E1'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    drop(guard);

    // 項目レベルの UPDATE エントリに "<ラベル>: <旧> → <新>" の説明が付く
    let entries = audit
        .list_entity_entries(EntityType::Employee, &employee_id)
        .unwrap();
    let descriptions: Vec<String> = entries
        .iter()
        .filter_map(|e| e.description.clone())
        .collect();
    assert!(
        descriptions.iter().any(|d| d == "役職: 主任 → 課長"),
        "説明が見つからない: {descriptions:?}"
    );
}

#[tokio::test]
async fn test_snapshot_drift_across_imports() {
    logging::init_test();

    let store = create_test_store();
    let audit = AuditTrail::new(store.connection());
    let org_id = seed_organization(&store, "テスト株式会社");
    let importer = RosterImporterImpl::new(store, test_config());

    let first = write_roster_csv(
        STANDARD_HEADER,
        &["E1,山田 太郎,,,営業部,,,", "E2,佐藤 花子,,,営業部,,,"],
    );
    importer
        .import_files(&org_id, vec![first.path().to_path_buf()], "tester")
        .await
        .unwrap();
    let before = audit.create_organization_snapshot(&org_id).unwrap();
    assert_eq!(before.active_employee_count, 2);
    assert_eq!(before.departments.len(), 1);

    // 開発部が増え、E2 が退職
    let second = write_roster_csv(
        STANDARD_HEADER,
        &["E1,山田 太郎,,,営業部,,,", "E3,鈴木 次郎,,,開発部,,,"],
    );
    importer
        .import_files(&org_id, vec![second.path().to_path_buf()], "tester")
        .await
        .unwrap();
    let after = audit.create_organization_snapshot(&org_id).unwrap();

    let diff = compare_snapshots(&before, &after);
    assert_eq!(diff.added_departments.len(), 1);
    assert!(diff.removed_departments.is_empty());
    // 在籍数は 2 → 2（E2 退職・E3 入社）
    assert_eq!(diff.employee_count_delta, 0);
    assert!(diff.has_drift());

    // スナップショットは保存されており一覧で引ける
    let snapshots = audit.list_snapshots(&org_id, 10).unwrap();
    assert_eq!(snapshots.len(), 2);
}

#[tokio::test]
async fn test_snapshot_is_immutable_copy() {
    logging::init_test();

    let store = create_test_store();
    let audit = AuditTrail::new(store.connection());
    let org_id = seed_organization(&store, "テスト株式会社");
    let importer = RosterImporterImpl::new(store, test_config());

    let first = write_roster_csv(STANDARD_HEADER, &["E1,山田 太郎,,,営業部,,,"]);
    importer
        .import_files(&org_id, vec![first.path().to_path_buf()], "tester")
        .await
        .unwrap();
    let snapshot = audit.create_organization_snapshot(&org_id).unwrap();

    // その後の取込はスナップショットに影響しない
    let second = write_roster_csv(STANDARD_HEADER, &["E1,山田 太郎,,,営業部,,,", "E9,新人 一郎,,,開発部,,,"]);
    importer
        .import_files(&org_id, vec![second.path().to_path_buf()], "tester")
        .await
        .unwrap();

    let reloaded = audit.get_snapshot(&snapshot.snapshot_id).unwrap().unwrap();
    assert_eq!(reloaded.active_employee_count, 1);
    assert_eq!(reloaded.departments.len(), 1);
}
