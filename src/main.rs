// ==========================================
// 社員名簿同期システム - CLI 主入口
// ==========================================
// 用途: ローカル SQLite に対する プレビュー / 確定 / スナップショット /
//       差分 / 監査履歴 の実行
// ==========================================

use clap::{Parser, Subcommand};
use roster_sync::audit::{compare_snapshots, AuditTrail};
use roster_sync::config::ReconcileConfig;
use roster_sync::domain::preview::PreviewResult;
use roster_sync::importer::{ImportError, ImportResult, RosterImporter, RosterImporterImpl};
use roster_sync::repository::{OrganizationRepository, SqliteStore};
use roster_sync::logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "roster-sync", version, about = "社員名簿同期システム - 名簿取込と組織階層リコンサイル")]
struct Cli {
    /// データベースファイルパス（既定: データディレクトリ配下）
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// 設定ファイルパス（JSON。欠損時は既定値で動作）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 名簿ファイルを読み込み、変更プレビューを表示する（書込なし）
    Preview {
        /// 対象組織名
        #[arg(long)]
        org: String,
        /// 名簿ファイル（.csv / .xlsx / .xls、複数可）
        files: Vec<PathBuf>,
    },
    /// 名簿ファイルを取り込み、変更を確定する
    Commit {
        /// 対象組織名（未登録なら作成する）
        #[arg(long)]
        org: String,
        /// 操作者（監査帰属）
        #[arg(long, default_value = "cli")]
        actor: String,
        /// 名簿ファイル（.csv / .xlsx / .xls、複数可）
        files: Vec<PathBuf>,
    },
    /// 現時点の組織スナップショットを作成する
    Snapshot {
        #[arg(long)]
        org: String,
    },
    /// 2つのスナップショットを比較する（ドリフト報告）
    Diff {
        old_id: String,
        new_id: String,
    },
    /// 監査履歴を表示する
    Log {
        /// バッチ ID で絞り込む
        #[arg(long)]
        batch: Option<String>,
        /// 表示件数（--batch 未指定時）
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

/// 既定のデータベースパスを解決する
fn default_db_path() -> PathBuf {
    let mut dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.push("roster-sync");
    let _ = std::fs::create_dir_all(&dir);
    dir.push("roster.db");
    dir
}

/// プレビュー内容を表示する
fn print_preview(preview: &PreviewResult) {
    println!("---- 新規 ({}名) ----", preview.new_employees.len());
    for e in &preview.new_employees {
        println!("  {} {} [{}]", e.employee_number, e.name, e.unit_label());
    }

    println!("---- 更新 ({}名) ----", preview.updated.len());
    for u in &preview.updated {
        println!("  {} {}", u.employee.employee_number, u.employee.name);
        for c in &u.changes {
            println!("      {}", c.describe());
        }
    }

    println!("---- 異動 ({}名) ----", preview.transferred.len());
    for t in &preview.transferred {
        println!(
            "  {} {}: {} → {}",
            t.employee.employee_number, t.employee.name, t.old_unit, t.new_unit
        );
    }

    println!("---- 退職 ({}名) ----", preview.retired.len());
    for r in &preview.retired {
        println!("  {} {}", r.employee_number, r.name);
    }

    if !preview.excluded_duplicates.is_empty() {
        println!("---- 重複除外 ({}件) ----", preview.excluded_duplicates.len());
        for d in &preview.excluded_duplicates {
            println!("  行{}: {}", d.row_number, d.reason);
        }
    }

    if !preview.errors.is_empty() {
        println!("---- 行エラー ({}件) ----", preview.errors.len());
        for e in &preview.errors {
            println!("  行{}: {}", e.row_number, e.message);
        }
    }

    println!("変更なし: {}名", preview.unchanged);
}

async fn run(cli: Cli) -> ImportResult<()> {
    let db_path = cli.db.unwrap_or_else(default_db_path);
    let store = SqliteStore::open(&db_path.display().to_string())?;

    let config = match &cli.config {
        Some(path) => ReconcileConfig::load_or_default(path)
            .map_err(|e| ImportError::InternalError(format!("設定読込に失敗: {e}")))?,
        None => ReconcileConfig::default(),
    };

    let org_repo = OrganizationRepository::new(store.connection());
    let audit = AuditTrail::new(store.connection());

    match cli.command {
        Command::Preview { org, files } => {
            let organization = org_repo
                .find_by_name(&org)?
                .ok_or_else(|| ImportError::OrganizationNotFound(org.clone()))?;

            let importer = RosterImporterImpl::new(store, config);
            let result = importer
                .preview_files(&organization.organization_id, files)
                .await?;

            println!("バッチID: {}", result.batch_id);
            println!("サマリ: {}", result.preview.summary_text());
            print_preview(&result.preview);
            println!();
            println!("確定するには commit サブコマンドを実行してください");
        }

        Command::Commit { org, actor, files } => {
            // 組織解決は確定トランザクションの外で明示的に行う
            let organization = org_repo.ensure(&org)?;

            let importer = RosterImporterImpl::new(store, config);
            let (result, summary) = importer
                .import_files(&organization.organization_id, files, &actor)
                .await?;

            println!("バッチID: {}", summary.batch_id);
            print_preview(&result.preview);
            println!();
            println!("{}", summary.message);
            println!(
                "統計: 対象{} 新規{} 更新{} スキップ{} 退職{}",
                summary.statistics.total_records,
                summary.statistics.created,
                summary.statistics.updated,
                summary.statistics.skipped,
                summary.statistics.retired,
            );
            println!(
                "階層作成: 部{} 課{} 係{}",
                summary.hierarchy_created.departments,
                summary.hierarchy_created.sections,
                summary.hierarchy_created.courses,
            );
        }

        Command::Snapshot { org } => {
            let organization = org_repo
                .find_by_name(&org)?
                .ok_or_else(|| ImportError::OrganizationNotFound(org.clone()))?;

            let snapshot = audit.create_organization_snapshot(&organization.organization_id)?;
            println!("スナップショットID: {}", snapshot.snapshot_id);
            println!("部: {}件 在籍: {}名", snapshot.departments.len(), snapshot.active_employee_count);
        }

        Command::Diff { old_id, new_id } => {
            let old = audit
                .get_snapshot(&old_id)?
                .ok_or_else(|| ImportError::InternalError(format!("スナップショットが見つかりません: {old_id}")))?;
            let new = audit
                .get_snapshot(&new_id)?
                .ok_or_else(|| ImportError::InternalError(format!("スナップショットが見つかりません: {new_id}")))?;

            let diff = compare_snapshots(&old, &new);
            println!("ドリフト: {}", diff.summary_text());
        }

        Command::Log { batch, limit } => {
            let entries = match batch {
                Some(batch_id) => audit.list_batch_entries(&batch_id)?,
                None => audit.list_recent_entries(limit)?,
            };
            for entry in entries {
                println!(
                    "{} [{}] {} {} {}",
                    entry.changed_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.change_type.as_str(),
                    entry.actor,
                    entry.entity_id,
                    entry.description.unwrap_or_default(),
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", roster_sync::APP_NAME);
    tracing::info!("システムバージョン: {}", roster_sync::VERSION);
    tracing::info!("==================================================");

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("エラー: {e}");
        std::process::exit(1);
    }
}
