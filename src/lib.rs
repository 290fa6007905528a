// ==========================================
// 社員名簿同期システム - コアライブラリ
// ==========================================
// 技術スタック: Rust + SQLite
// 役割: 名簿取込 → 差分プレビュー → 確定 → 監査証跡
// ==========================================

// ==========================================
// モジュール宣言
// ==========================================

// 領域層 - エンティティと型
pub mod domain;

// 永続層 - データアクセス
pub mod repository;

// エンジン層 - 業務ルール（分類・確定・管理者推定）
pub mod engine;

// 取込層 - 外部名簿ファイル
pub mod importer;

// 監査層 - 変更履歴とスナップショット
pub mod audit;

// 設定層 - リコンサイル設定
pub mod config;

// データベース基盤（接続初期化 / PRAGMA / スキーマ統一）
pub mod db;

// ログシステム
pub mod logging;

// ==========================================
// コア型の再エクスポート
// ==========================================

// 領域型
pub use domain::{
    ChangeLogEntry, ChangeType, CommitSummary, Employee, EmployeeView, EntityType, FieldChange,
    ImportStatistics, OrgLevel, OrgUnit, Organization, OrganizationSnapshot, PreviewResult,
    ProcessedEmployee, RosterPreview, SnapshotDiff,
};

// エンジン
pub use engine::{Committer, Reconciler};

// 取込
pub use importer::{ImportError, RosterImporter, RosterImporterImpl};

// 監査
pub use audit::AuditTrail;

// 永続層
pub use repository::{
    ChangeLogRepository, EmployeeRepository, OrganizationRepository, RepositoryError,
    SnapshotRepository, SqliteStore, UnitOfWork,
};

// 設定
pub use config::ReconcileConfig;

// ==========================================
// 定数定義
// ==========================================

// システムバージョン
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// システム名称
pub const APP_NAME: &str = "社員名簿同期システム";
