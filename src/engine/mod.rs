// ==========================================
// 社員名簿同期システム - エンジン層
// ==========================================
// 責務: 業務ルール（分類・確定・管理者推定）
// 鉄則: Reconciler は純粋（書込禁止）、Committer は UnitOfWork 経由でのみ書込
// ==========================================

pub mod committer;
pub mod manager_inference;
pub mod reconciler;

// 再エクスポート
pub use committer::Committer;
pub use manager_inference::infer_manager;
pub use reconciler::Reconciler;
