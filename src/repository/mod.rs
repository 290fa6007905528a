// ==========================================
// 社員名簿同期システム - 永続層
// ==========================================
// 責務: データアクセスの提供（データベース詳細の遮蔽）
// 鉄則: Repository は業務ロジックを含まない
// 鉄則: すべてのクエリはパラメータ化する（SQL 注入防止）
// ==========================================

pub mod change_log_repo;
pub mod employee_repo;
pub mod error;
pub mod org_repo;
pub mod snapshot_repo;
pub mod unit_of_work;

// 再エクスポート
pub use change_log_repo::ChangeLogRepository;
pub use employee_repo::EmployeeRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use org_repo::OrganizationRepository;
pub use snapshot_repo::SnapshotRepository;
pub use unit_of_work::{SqliteStore, SqliteUnitOfWork, UnitOfWork};
