// ==========================================
// 社員名簿同期システム - リコンサイルエンジン
// ==========================================
// 責務: 取込バッチと永続状態の分類（純粋・副作用ゼロ）
// 鉄則: 書込を一切行わない。同じ入力に対して常に同じ結果を返す
// 分類: 取込行 → {新規, 更新, 異動, 変更なし}
//       在籍既存社員 → {更新, 異動, 変更なし, 退職}
// 鉄則: 所属変更（異動）は項目更新に優先する
// ==========================================

use crate::domain::employee::{EmployeeView, ProcessedEmployee};
use crate::domain::preview::{
    DuplicateExclusion, FieldChange, PreviewResult, RowError, TransferredEmployee, UpdatedEmployee,
};
use std::collections::{HashMap, HashSet};

pub struct Reconciler;

/// 正規化比較: 空文字列・空白のみ・None をすべて「欠損」に畳んでから比較する
fn norm(value: Option<&str>) -> Option<&str> {
    match value {
        Some(v) => {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        None => None,
    }
}

fn differs(old: Option<&str>, new: Option<&str>) -> bool {
    norm(old) != norm(new)
}

/// 変更項目を FieldChange として積む（正規化後の値で記録）
fn push_change(
    changes: &mut Vec<FieldChange>,
    field: &str,
    label: &str,
    old: Option<&str>,
    new: Option<&str>,
) {
    if differs(old, new) {
        changes.push(FieldChange {
            field: field.to_string(),
            label: label.to_string(),
            old_value: norm(old).map(|v| v.to_string()),
            new_value: norm(new).map(|v| v.to_string()),
        });
    }
}

impl Reconciler {
    /// 比較対象の固定項目集合で項目レベル差分を計算する
    ///
    /// 順序は固定（基本情報 → 役職等級 → 所属 → 在籍状態）で安定
    pub fn field_changes(existing: &EmployeeView, incoming: &ProcessedEmployee) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        push_change(&mut changes, "name", "氏名", Some(&existing.name), Some(&incoming.name));
        push_change(
            &mut changes,
            "name_kana",
            "フリガナ",
            existing.name_kana.as_deref(),
            incoming.name_kana.as_deref(),
        );
        push_change(
            &mut changes,
            "email",
            "メールアドレス",
            existing.email.as_deref(),
            incoming.email.as_deref(),
        );
        push_change(
            &mut changes,
            "phone",
            "電話番号",
            existing.phone.as_deref(),
            incoming.phone.as_deref(),
        );
        push_change(
            &mut changes,
            "position_name",
            "役職",
            existing.position_name.as_deref(),
            Some(&incoming.position_name),
        );
        push_change(
            &mut changes,
            "position_code",
            "役職コード",
            existing.position_code.as_deref(),
            incoming.position_code.as_deref(),
        );
        push_change(
            &mut changes,
            "grade_name",
            "資格等級",
            existing.grade_name.as_deref(),
            incoming.grade_name.as_deref(),
        );
        push_change(
            &mut changes,
            "grade_code",
            "等級コード",
            existing.grade_code.as_deref(),
            incoming.grade_code.as_deref(),
        );
        push_change(
            &mut changes,
            "employment_type_name",
            "雇用区分",
            existing.employment_type_name.as_deref(),
            incoming.employment_type_name.as_deref(),
        );
        push_change(
            &mut changes,
            "employment_type_code",
            "雇用区分コード",
            existing.employment_type_code.as_deref(),
            incoming.employment_type_code.as_deref(),
        );

        // ===== 所属参照（異動判定にも使う）=====
        push_change(
            &mut changes,
            "department",
            "部",
            Some(&existing.department_name),
            Some(&incoming.department_name),
        );
        push_change(
            &mut changes,
            "section",
            "課",
            existing.section_name.as_deref(),
            incoming.section_name.as_deref(),
        );
        push_change(
            &mut changes,
            "course",
            "係",
            existing.course_name.as_deref(),
            incoming.course_name.as_deref(),
        );

        // ===== 在籍状態（退職者が名簿に再出現した場合）=====
        if !existing.active {
            changes.push(FieldChange {
                field: "active".to_string(),
                label: "在籍状態".to_string(),
                old_value: Some("退職".to_string()),
                new_value: Some("在籍".to_string()),
            });
        }

        changes
    }

    /// 所属参照（部・課・係のいずれか）が変わったか
    pub fn hierarchy_changed(existing: &EmployeeView, incoming: &ProcessedEmployee) -> bool {
        differs(Some(&existing.department_name), Some(&incoming.department_name))
            || differs(existing.section_name.as_deref(), incoming.section_name.as_deref())
            || differs(existing.course_name.as_deref(), incoming.course_name.as_deref())
    }

    /// バッチ内重複を検出し、有効レコードと除外一覧に分離する
    ///
    /// # 規則
    /// - 同一社員番号の2行目以降は除外（先着採用）
    /// - 社員番号が異なるのに先行行とメールアドレスが一致する行は除外
    ///   （識別子の衝突とみなす）
    pub fn dedup(batch: Vec<ProcessedEmployee>) -> (Vec<ProcessedEmployee>, Vec<DuplicateExclusion>) {
        let mut retained = Vec::with_capacity(batch.len());
        let mut exclusions = Vec::new();

        let mut seen_numbers: HashSet<String> = HashSet::new();
        // 正規化メールアドレス → 先行行の社員番号
        let mut seen_emails: HashMap<String, String> = HashMap::new();

        for record in batch {
            if seen_numbers.contains(&record.employee_number) {
                exclusions.push(DuplicateExclusion {
                    row_number: record.row_number,
                    employee_number: Some(record.employee_number.clone()),
                    retained_number: record.employee_number.clone(),
                    reason: format!("同一社員番号の重複行: {}", record.employee_number),
                });
                continue;
            }

            let email_key = record.email.as_deref().map(|e| e.trim().to_lowercase());
            if let Some(key) = &email_key {
                if let Some(first_number) = seen_emails.get(key) {
                    if first_number != &record.employee_number {
                        exclusions.push(DuplicateExclusion {
                            row_number: record.row_number,
                            employee_number: Some(record.employee_number.clone()),
                            retained_number: first_number.clone(),
                            reason: format!(
                                "メールアドレスが社員番号 {} の行と衝突（社員番号が異なる）",
                                first_number
                            ),
                        });
                        continue;
                    }
                }
            }

            seen_numbers.insert(record.employee_number.clone());
            if let Some(key) = email_key {
                seen_emails.entry(key).or_insert_with(|| record.employee_number.clone());
            }
            retained.push(record);
        }

        (retained, exclusions)
    }

    /// 重複除外済みレコードを永続状態に対して分類する
    ///
    /// # 引数
    /// - `records`: 重複除外済みの取込レコード
    /// - `existing`: 永続社員ビュー（退職者含む・所属名解決済み）
    ///
    /// # 戻り値
    /// - PreviewResult（errors / excluded_duplicates は空。呼出側で合成する）
    pub fn classify(records: &[ProcessedEmployee], existing: &[EmployeeView]) -> PreviewResult {
        let existing_by_number: HashMap<&str, &EmployeeView> = existing
            .iter()
            .map(|v| (v.employee_number.as_str(), v))
            .collect();
        let incoming_numbers: HashSet<&str> =
            records.iter().map(|r| r.employee_number.as_str()).collect();

        let mut new_employees = Vec::new();
        let mut updated = Vec::new();
        let mut transferred = Vec::new();
        let mut unchanged = 0usize;

        for record in records {
            match existing_by_number.get(record.employee_number.as_str()) {
                None => new_employees.push(record.clone()),
                Some(view) => {
                    let changes = Self::field_changes(view, record);
                    if Self::hierarchy_changed(view, record) {
                        // 異動は項目更新に優先（他項目の変更は changes に併記）
                        transferred.push(TransferredEmployee {
                            employee: record.clone(),
                            old_unit: view.unit_label(),
                            new_unit: record.unit_label(),
                            changes,
                        });
                    } else if !changes.is_empty() {
                        updated.push(UpdatedEmployee {
                            employee: record.clone(),
                            changes,
                        });
                    } else {
                        unchanged += 1;
                    }
                }
            }
        }

        // 退職者 = 在籍中の社員番号集合 − 取込番号集合（項目比較はしない）
        let retired: Vec<EmployeeView> = existing
            .iter()
            .filter(|v| v.active && !incoming_numbers.contains(v.employee_number.as_str()))
            .cloned()
            .collect();

        PreviewResult {
            new_employees,
            updated,
            transferred,
            retired,
            excluded_duplicates: vec![],
            errors: vec![],
            unchanged,
        }
    }

    /// 重複除外 → 分類を一括実行し、有効レコードと完全なプレビューを返す
    pub fn reconcile(
        batch: Vec<ProcessedEmployee>,
        existing: &[EmployeeView],
        errors: Vec<RowError>,
    ) -> (Vec<ProcessedEmployee>, PreviewResult) {
        let (records, exclusions) = Self::dedup(batch);
        let mut preview = Self::classify(&records, existing);
        preview.excluded_duplicates = exclusions;
        preview.errors = errors;
        (records, preview)
    }
}
