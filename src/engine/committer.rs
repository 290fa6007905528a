// ==========================================
// 社員名簿同期システム - 確定エンジン
// ==========================================
// 責務: 受理済みバッチを1つのトランザクションとして適用する
// - 階層ノードの冪等な find-or-create
// - 社員の upsert（社員番号、なければメールアドレスで照合）
// - 不在社員の一括退職化（集合ベース UPDATE）
// - 役職名キーワードによる管理者推定
// - 変更履歴の同一トランザクション内追記
// 鉄則: UnitOfWork trait のみに依存する（具象ストアを知らない）
// 鉄則: 途中失敗は全体ロールバック。部分状態を残さない
// ==========================================

use crate::config::ReconcileConfig;
use crate::domain::change_log::ChangeLogEntry;
use crate::domain::employee::{Employee, EmployeeView, ProcessedEmployee};
use crate::domain::preview::{CommitSummary, FieldChange, HierarchyCreated, ImportStatistics};
use crate::domain::types::{ChangeType, EntityType, OrgLevel};
use crate::engine::manager_inference::infer_manager;
use crate::engine::reconciler::Reconciler;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::unit_of_work::UnitOfWork;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

// 階層ノード ID の解決表
struct HierarchyIds {
    departments: HashMap<String, String>,
    sections: HashMap<(String, String), String>,
    courses: HashMap<(String, String, String), String>,
}

pub struct Committer {
    config: ReconcileConfig,
}

impl Committer {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    /// 受理済みバッチを適用する（呼出側が開いたトランザクション内で実行）
    ///
    /// # 引数
    /// - `uow`: トランザクションスコープの型付きリポジトリ操作
    /// - `organization_id`: 対象組織（明示必須。暗黙生成しない）
    /// - `batch`: 重複除外済みの取込レコード
    /// - `actor`: 操作者（監査帰属）
    /// - `batch_id`: 取込バッチ相関トークン
    ///
    /// # 戻り値
    /// - Ok(CommitSummary): 統計付きの確定結果
    /// - Err: 失敗（呼出側でトランザクション全体がロールバックされる）
    pub fn commit(
        &self,
        uow: &dyn UnitOfWork,
        organization_id: &str,
        batch: &[ProcessedEmployee],
        actor: &str,
        batch_id: &str,
    ) -> RepositoryResult<CommitSummary> {
        let now = Utc::now();

        // === 手順 1: 組織の存在検証（暗黙生成はしない）===
        let organization = uow
            .get_organization(organization_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "organization".to_string(),
                id: organization_id.to_string(),
            })?;
        debug!(organization = %organization.name, "組織を解決");

        // === 手順 2-4: 階層ノードの冪等な find-or-create ===
        let (ids, hierarchy_created) = self.ensure_hierarchy(uow, organization_id, batch)?;
        info!(
            departments = hierarchy_created.departments,
            sections = hierarchy_created.sections,
            courses = hierarchy_created.courses,
            "階層ノード作成完了"
        );

        // === 手順 5: トランザクション内の最新状態に対して再分類 ===
        let views = uow.list_employee_views(organization_id)?;
        let preview = Reconciler::classify(batch, &views);

        let views_by_number: HashMap<&str, &EmployeeView> = views
            .iter()
            .map(|v| (v.employee_number.as_str(), v))
            .collect();
        let incoming_numbers: HashSet<&str> =
            batch.iter().map(|r| r.employee_number.as_str()).collect();
        // メールアドレス予備照合: 取込バッチに番号が現れないビューのみ対象
        let views_by_email: HashMap<String, &EmployeeView> = views
            .iter()
            .filter(|v| !incoming_numbers.contains(v.employee_number.as_str()))
            .filter_map(|v| {
                v.email
                    .as_deref()
                    .map(|e| (e.trim().to_lowercase(), v))
            })
            .collect();

        let mut stats = ImportStatistics {
            total_records: batch.len(),
            ..Default::default()
        };
        let mut logs: Vec<ChangeLogEntry> = Vec::new();
        // メールアドレス照合で番号を付け替えた既存行（退職記録の対象外）
        let mut renumbered_ids: HashSet<String> = HashSet::new();

        // === 手順 5a: 新規（メールアドレス一致時は既存行の更新に切替）===
        for record in &preview.new_employees {
            let Some((dept_id, section_id, course_id)) = self.resolve_ids(&ids, record) else {
                // 整形済み入力では起こり得ないが、バッチを中断させない
                warn!(row = record.row_number, "部を解決できないためスキップ");
                stats.skipped += 1;
                continue;
            };

            let email_key = record.email.as_deref().map(|e| e.trim().to_lowercase());
            let fallback = email_key.as_deref().and_then(|k| views_by_email.get(k));

            if let Some(view) = fallback {
                // 社員番号は未知だがメールアドレスが一致 → 既存行を更新
                let employee =
                    self.build_employee(view.employee_id.clone(), organization_id, record, dept_id, section_id, course_id, now, now);
                uow.update_employee(&employee)?;
                stats.updated += 1;
                renumbered_ids.insert(view.employee_id.clone());

                let mut changes = Reconciler::field_changes(view, record);
                changes.insert(
                    0,
                    FieldChange {
                        field: "employee_number".to_string(),
                        label: "社員番号".to_string(),
                        old_value: Some(view.employee_number.clone()),
                        new_value: Some(record.employee_number.clone()),
                    },
                );
                self.push_field_logs(&mut logs, &view.employee_id, &changes, actor, batch_id);
            } else {
                let employee_id = Uuid::new_v4().to_string();
                let employee =
                    self.build_employee(employee_id.clone(), organization_id, record, dept_id, section_id, course_id, now, now);
                uow.insert_employee(&employee)?;
                stats.created += 1;

                logs.push(
                    ChangeLogEntry::new(EntityType::Employee, employee_id, ChangeType::Create, actor.to_string())
                        .with_description(format!(
                            "新規登録: {}（{}） {}",
                            record.name,
                            record.employee_number,
                            record.unit_label()
                        ))
                        .with_batch_id(batch_id.to_string()),
                );
            }
        }

        // === 手順 5b: 項目更新 ===
        for entry in &preview.updated {
            let record = &entry.employee;
            let Some((dept_id, section_id, course_id)) = self.resolve_ids(&ids, record) else {
                warn!(row = record.row_number, "部を解決できないためスキップ");
                stats.skipped += 1;
                continue;
            };
            let view = views_by_number[record.employee_number.as_str()];

            let employee =
                self.build_employee(view.employee_id.clone(), organization_id, record, dept_id, section_id, course_id, now, now);
            uow.update_employee(&employee)?;
            stats.updated += 1;

            self.push_field_logs(&mut logs, &view.employee_id, &entry.changes, actor, batch_id);
        }

        // === 手順 5c: 異動（項目更新に優先して分類済み）===
        for entry in &preview.transferred {
            let record = &entry.employee;
            let Some((dept_id, section_id, course_id)) = self.resolve_ids(&ids, record) else {
                warn!(row = record.row_number, "部を解決できないためスキップ");
                stats.skipped += 1;
                continue;
            };
            let view = views_by_number[record.employee_number.as_str()];

            let employee =
                self.build_employee(view.employee_id.clone(), organization_id, record, dept_id, section_id, course_id, now, now);
            uow.update_employee(&employee)?;
            stats.updated += 1;

            logs.push(
                ChangeLogEntry::new(
                    EntityType::Employee,
                    view.employee_id.clone(),
                    ChangeType::Transfer,
                    actor.to_string(),
                )
                .with_description(format!("異動: {} → {}", entry.old_unit, entry.new_unit))
                .with_batch_id(batch_id.to_string()),
            );
            // 異動でも変更項目の全量を監査に残す
            self.push_field_logs(&mut logs, &view.employee_id, &entry.changes, actor, batch_id);
        }

        // === 手順 6: 不在社員の一括退職化 ===
        let batch_numbers: Vec<String> = batch.iter().map(|r| r.employee_number.clone()).collect();
        let retired_count = uow.bulk_deactivate_missing(organization_id, &batch_numbers, now)?;
        stats.retired = retired_count;

        for view in &preview.retired {
            if renumbered_ids.contains(&view.employee_id) {
                // 番号付替で在籍継続した行は退職扱いにしない
                continue;
            }
            logs.push(
                ChangeLogEntry::new(
                    EntityType::Employee,
                    view.employee_id.clone(),
                    ChangeType::Retirement,
                    actor.to_string(),
                )
                .with_description(format!("退職処理: {}（{}）", view.name, view.employee_number))
                .with_batch_id(batch_id.to_string()),
            );
        }

        // === 手順 7: 管理者推定（書込後の最新状態で実施）===
        self.assign_managers(uow, organization_id)?;

        // === 手順 8: 取込サマリの記録と統計 ===
        let message = format!(
            "名簿取込を確定しました: 新規{} 更新{} 退職{} スキップ{}",
            stats.created, stats.updated, stats.retired, stats.skipped
        );
        logs.push(
            ChangeLogEntry::new(
                EntityType::Organization,
                organization_id.to_string(),
                ChangeType::Import,
                actor.to_string(),
            )
            .with_description(message.clone())
            .with_batch_id(batch_id.to_string()),
        );

        uow.insert_change_logs(&logs)?;

        info!(
            batch_id = %batch_id,
            created = stats.created,
            updated = stats.updated,
            retired = stats.retired,
            skipped = stats.skipped,
            "確定処理完了"
        );

        Ok(CommitSummary {
            batch_id: batch_id.to_string(),
            message,
            statistics: stats,
            hierarchy_created,
        })
    }

    /// バッチに現れる 部 / 課 / 係 を冪等に find-or-create し、ID 解決表を作る
    fn ensure_hierarchy(
        &self,
        uow: &dyn UnitOfWork,
        organization_id: &str,
        batch: &[ProcessedEmployee],
    ) -> RepositoryResult<(HierarchyIds, HierarchyCreated)> {
        let mut ids = HierarchyIds {
            departments: HashMap::new(),
            sections: HashMap::new(),
            courses: HashMap::new(),
        };
        let mut created = HierarchyCreated::default();

        for record in batch {
            let dept_name = record.department_name.clone();

            if !ids.departments.contains_key(&dept_name) {
                let code = self
                    .config
                    .derive_unit_code(OrgLevel::Department, record.affiliation_code.as_deref());
                let (unit, was_created) =
                    uow.find_or_create_department(organization_id, &dept_name, code.as_deref())?;
                if was_created {
                    created.departments += 1;
                }
                ids.departments.insert(dept_name.clone(), unit.unit_id);
            }

            let Some(section_name) = record.section_name.clone() else {
                continue;
            };
            let section_key = (dept_name.clone(), section_name.clone());
            if !ids.sections.contains_key(&section_key) {
                let dept_id = &ids.departments[&dept_name];
                let code = self
                    .config
                    .derive_unit_code(OrgLevel::Section, record.affiliation_code.as_deref());
                let (unit, was_created) =
                    uow.find_or_create_section(dept_id, &section_name, code.as_deref())?;
                if was_created {
                    created.sections += 1;
                }
                ids.sections.insert(section_key.clone(), unit.unit_id);
            }

            let Some(course_name) = record.course_name.clone() else {
                continue;
            };
            let course_key = (dept_name, section_name, course_name.clone());
            if !ids.courses.contains_key(&course_key) {
                let section_id = &ids.sections[&(course_key.0.clone(), course_key.1.clone())];
                let code = self
                    .config
                    .derive_unit_code(OrgLevel::Course, record.affiliation_code.as_deref());
                let (unit, was_created) =
                    uow.find_or_create_course(section_id, &course_name, code.as_deref())?;
                if was_created {
                    created.courses += 1;
                }
                ids.courses.insert(course_key, unit.unit_id);
            }
        }

        Ok((ids, created))
    }

    /// レコードの所属 ID を解決表から引く
    fn resolve_ids(
        &self,
        ids: &HierarchyIds,
        record: &ProcessedEmployee,
    ) -> Option<(String, Option<String>, Option<String>)> {
        let dept_id = ids.departments.get(&record.department_name)?.clone();

        let section_id = record.section_name.as_ref().and_then(|s| {
            ids.sections
                .get(&(record.department_name.clone(), s.clone()))
                .cloned()
        });

        let course_id = match (&record.section_name, &record.course_name) {
            (Some(s), Some(c)) => ids
                .courses
                .get(&(record.department_name.clone(), s.clone(), c.clone()))
                .cloned(),
            _ => None,
        };

        Some((dept_id, section_id, course_id))
    }

    /// ProcessedEmployee から永続行を組み立てる（常に在籍化）
    #[allow(clippy::too_many_arguments)]
    fn build_employee(
        &self,
        employee_id: String,
        organization_id: &str,
        record: &ProcessedEmployee,
        department_id: String,
        section_id: Option<String>,
        course_id: Option<String>,
        created_at: chrono::DateTime<Utc>,
        updated_at: chrono::DateTime<Utc>,
    ) -> Employee {
        Employee {
            employee_id,
            organization_id: organization_id.to_string(),
            employee_number: record.employee_number.clone(),
            name: record.name.clone(),
            name_kana: record.name_kana.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            position_name: Some(record.position_name.clone()),
            position_code: record.position_code.clone(),
            grade_name: record.grade_name.clone(),
            grade_code: record.grade_code.clone(),
            employment_type_name: record.employment_type_name.clone(),
            employment_type_code: record.employment_type_code.clone(),
            joined_on: record.joined_on,
            birth_date: record.birth_date,
            active: true,
            department_id,
            section_id,
            course_id,
            created_at,
            updated_at,
        }
    }

    /// 項目レベル変更を監査エントリへ変換して積む
    ///
    /// 在籍状態の変化（退職者の再出現）は REJOINING、それ以外は
    /// 項目ごとの UPDATE として1件ずつ記録する
    fn push_field_logs(
        &self,
        logs: &mut Vec<ChangeLogEntry>,
        employee_id: &str,
        changes: &[FieldChange],
        actor: &str,
        batch_id: &str,
    ) {
        for change in changes {
            let change_type = if change.field == "active" {
                ChangeType::Rejoining
            } else {
                ChangeType::Update
            };
            logs.push(
                ChangeLogEntry::new(
                    EntityType::Employee,
                    employee_id.to_string(),
                    change_type,
                    actor.to_string(),
                )
                .with_field_change(
                    change.label.clone(),
                    change.old_value.clone(),
                    change.new_value.clone(),
                )
                .with_description(change.describe())
                .with_batch_id(batch_id.to_string()),
            );
        }
    }

    /// 全組織単位の管理者を推定して設定する
    ///
    /// 一致なしの場合は None を設定する（退職した管理者の参照を残さない）
    fn assign_managers(&self, uow: &dyn UnitOfWork, organization_id: &str) -> RepositoryResult<()> {
        let units = uow.list_units(organization_id)?;
        let views = uow.list_employee_views(organization_id)?;

        for unit in &units {
            let members: Vec<&EmployeeView> = views
                .iter()
                .filter(|v| v.active)
                .filter(|v| match unit.level {
                    OrgLevel::Department => v.department_id == unit.unit_id,
                    OrgLevel::Section => v.section_id.as_deref() == Some(unit.unit_id.as_str()),
                    OrgLevel::Course => v.course_id.as_deref() == Some(unit.unit_id.as_str()),
                })
                .collect();

            let manager = infer_manager(&self.config.manager_keywords, unit.level, &members);
            uow.set_unit_manager(unit.level, &unit.unit_id, manager.as_deref())?;
        }

        Ok(())
    }
}
