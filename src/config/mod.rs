// ==========================================
// 社員名簿同期システム - 設定層
// ==========================================
// 責務: リコンサイル方針の可変パラメータを一箇所に集約する
// 鉄則: 設定の読み取りのみ。業務ロジックを含まない
// ==========================================

pub mod reconcile_config;

pub use reconcile_config::{ManagerKeywordTable, ReconcileConfig};
