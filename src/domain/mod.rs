// ==========================================
// 社員名簿同期システム - 領域モデル層
// ==========================================
// 責務: 領域エンティティ・型の定義
// 鉄則: データアクセスロジックを含まない、エンジンロジックを含まない
// ==========================================

pub mod change_log;
pub mod employee;
pub mod org_unit;
pub mod preview;
pub mod snapshot;
pub mod types;

// 再エクスポート
pub use change_log::ChangeLogEntry;
pub use employee::{Employee, EmployeeView, ProcessedEmployee};
pub use org_unit::{OrgUnit, Organization};
pub use preview::{
    CommitSummary, DuplicateExclusion, FieldChange, HierarchyCreated, ImportStatistics,
    PreviewResult, RosterPreview, RowError, TransferredEmployee, UpdatedEmployee,
};
pub use snapshot::{
    CourseSnapshot, DepartmentSnapshot, OrganizationSnapshot, SectionSnapshot, SnapshotDiff,
};
pub use types::{ChangeType, EntityType, OrgLevel};
