// ==========================================
// 社員名簿同期システム - 名簿取込実装
// ==========================================
// 責務: 取込パイプラインの統合
// 流れ: 解析 → 行解釈・正規化 → 重複除外 → 分類（プレビュー）
//       → 確認後に確定（単一トランザクション）
// ==========================================

use crate::audit;
use crate::config::ReconcileConfig;
use crate::domain::employee::ProcessedEmployee;
use crate::domain::preview::{CommitSummary, RosterPreview, RowError};
use crate::engine::committer::Committer;
use crate::engine::reconciler::Reconciler;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::row_parser::RowParser;
use crate::importer::roster_importer_trait::RosterImporter;
use crate::repository::{EmployeeRepository, OrganizationRepository, SqliteStore};
use futures::future::join_all;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

// ==========================================
// RosterImporterImpl - 名簿取込実装
// ==========================================
pub struct RosterImporterImpl {
    store: SqliteStore,
    employee_repo: EmployeeRepository,
    org_repo: OrganizationRepository,
    row_parser: RowParser,
    committer: Committer,
}

impl RosterImporterImpl {
    /// 新しい RosterImporter インスタンスを作成する
    ///
    /// # 引数
    /// - `store`: 永続ストア（読み取りリポジトリもここから構築する）
    /// - `config`: リコンサイル設定
    pub fn new(store: SqliteStore, config: ReconcileConfig) -> Self {
        let employee_repo = EmployeeRepository::new(store.connection());
        let org_repo = OrganizationRepository::new(store.connection());
        let row_parser = RowParser::new(&config);
        let committer = Committer::new(config);

        Self {
            store,
            employee_repo,
            org_repo,
            row_parser,
            committer,
        }
    }

    /// 原始行群を ProcessedEmployee へ変換する（行エラーは収集して継続）
    fn process_rows(
        &self,
        file_label: Option<&str>,
        raw_rows: Vec<HashMap<String, String>>,
        records: &mut Vec<ProcessedEmployee>,
        errors: &mut Vec<RowError>,
    ) {
        for (idx, row) in raw_rows.into_iter().enumerate() {
            let row_number = idx + 1;
            match self.row_parser.process_row(&row, row_number) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(row_number, error = %e, "行の解釈に失敗");
                    let message = match file_label {
                        Some(name) => format!("ファイル {name}: {e}"),
                        None => e.to_string(),
                    };
                    errors.push(RowError {
                        row_number,
                        message,
                    });
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl RosterImporter for RosterImporterImpl {
    #[instrument(skip(self, file_paths))]
    async fn preview_files<P: AsRef<Path> + Send + Sync>(
        &self,
        organization_id: &str,
        file_paths: Vec<P>,
    ) -> ImportResult<RosterPreview> {
        // === 段階 0: 組織の存在検証 ===
        if self.org_repo.get(organization_id)?.is_none() {
            return Err(ImportError::OrganizationNotFound(organization_id.to_string()));
        }

        let multi_file = file_paths.len() > 1;
        info!(files = file_paths.len(), "名簿プレビュー開始");

        // === 段階 1: ファイル解析（並行読込）===
        debug!("段階 1: ファイル解析");
        let parse_tasks = file_paths.into_iter().map(|path| async move {
            let label = path
                .as_ref()
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();
            let parsed = UniversalFileParser.parse(path.as_ref());
            (label, parsed)
        });
        let parsed_files = join_all(parse_tasks).await;

        // === 段階 2: 行解釈・正規化 ===
        debug!("段階 2: 行解釈");
        let mut records = Vec::new();
        let mut errors = Vec::new();
        for (label, parsed) in parsed_files {
            let raw_rows = parsed.map_err(|e| {
                error!(file = %label, error = %e, "ファイル解析に失敗");
                e
            })?;
            let file_label = multi_file.then_some(label.as_str());
            self.process_rows(file_label, raw_rows, &mut records, &mut errors);
        }
        info!(
            parsed = records.len(),
            row_errors = errors.len(),
            "行解釈完了"
        );

        // === 段階 3-4: 重複除外と分類 ===
        debug!("段階 3-4: 重複除外と分類");
        let existing = self.employee_repo.list_views(organization_id)?;
        let (retained, preview) = Reconciler::reconcile(records, &existing, errors);

        let batch_id = audit::generate_batch_id();
        info!(
            batch_id = %batch_id,
            summary = %preview.summary_text(),
            "名簿プレビュー完了"
        );

        Ok(RosterPreview {
            batch_id,
            organization_id: organization_id.to_string(),
            records: retained,
            preview,
        })
    }

    #[instrument(skip(self, records))]
    async fn commit(
        &self,
        organization_id: &str,
        records: &[ProcessedEmployee],
        actor: &str,
        batch_id: &str,
    ) -> ImportResult<CommitSummary> {
        info!(records = records.len(), "名簿確定開始");

        let summary = self
            .store
            .with_unit_of_work(|uow| {
                self.committer
                    .commit(uow, organization_id, records, actor, batch_id)
            })
            .map_err(|e| {
                error!(error = %e, "確定トランザクションが失敗（全体ロールバック）");
                ImportError::Repository(e)
            })?;

        info!(message = %summary.message, "名簿確定完了");
        Ok(summary)
    }

    async fn import_files<P: AsRef<Path> + Send + Sync>(
        &self,
        organization_id: &str,
        file_paths: Vec<P>,
        actor: &str,
    ) -> ImportResult<(RosterPreview, CommitSummary)> {
        let roster_preview = self.preview_files(organization_id, file_paths).await?;
        let summary = self
            .commit(
                organization_id,
                &roster_preview.records,
                actor,
                &roster_preview.batch_id,
            )
            .await?;
        Ok((roster_preview, summary))
    }
}
