// ==========================================
// 社員名簿同期システム - 永続層エラー型
// ==========================================
// 工具: thiserror 派生マクロ
// ==========================================

use thiserror::Error;

/// 永続層エラー型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== データベース =====
    #[error("レコードが見つかりません: {entity} (id={id})")]
    NotFound { entity: String, id: String },

    #[error("データベース接続に失敗: {0}")]
    DatabaseConnectionError(String),

    #[error("データベースロック取得に失敗: {0}")]
    LockError(String),

    #[error("データベーストランザクションに失敗: {0}")]
    DatabaseTransactionError(String),

    #[error("データベースクエリに失敗: {0}")]
    DatabaseQueryError(String),

    #[error("一意制約違反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外部キー制約違反: {0}")]
    ForeignKeyViolation(String),

    // ===== データ品質 =====
    #[error("データ検証に失敗: {0}")]
    ValidationError(String),

    // ===== 汎用 =====
    #[error("内部エラー: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

// From<serde_json::Error>
impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::ValidationError(format!("JSON 変換に失敗: {}", err))
    }
}

/// Result 型エイリアス
pub type RepositoryResult<T> = Result<T, RepositoryError>;
