use platerank_core::RankError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: malformed row: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: {reason}")]
    Row { line: usize, reason: String },
    #[error("feature column {0:?} appears more than once")]
    ColumnCollision(String),
    #[error(transparent)]
    Rank(#[from] RankError),
}

pub type Result<T> = std::result::Result<T, StorageError>;
