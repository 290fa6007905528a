// ==========================================
// 社員名簿同期システム - 取込モジュールエラー型
// ==========================================
// 工具: thiserror 派生マクロ
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 取込モジュールエラー型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== ファイル関連 =====
    #[error("ファイルが存在しません: {0}")]
    FileNotFound(String),

    #[error("未対応のファイル形式: {0}（.xlsx/.xls/.csv のみ対応）")]
    UnsupportedFormat(String),

    #[error("ファイル読込に失敗: {0}")]
    FileReadError(String),

    #[error("Excel 解析に失敗: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析に失敗: {0}")]
    CsvParseError(String),

    // ===== 行レベル =====
    #[error("必須項目が未入力 (行 {row}): {field}")]
    MissingRequiredField { row: usize, field: String },

    #[error("行の解釈に失敗 (行 {row}): {message}")]
    RowParseError { row: usize, message: String },

    // ===== 確定処理 =====
    #[error("組織が見つかりません: {0}")]
    OrganizationNotFound(String),

    #[error("確定トランザクションに失敗: {0}")]
    CommitFailed(String),

    // ===== 永続層 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 汎用 =====
    #[error("内部エラー: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 型エイリアス
pub type ImportResult<T> = Result<T, ImportError>;
