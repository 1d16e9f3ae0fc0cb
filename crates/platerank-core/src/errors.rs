use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankError {
    #[error("invalid record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },
    #[error("corpus is empty")]
    EmptyCorpus,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl RankError {
    pub fn invalid_record(row: usize, reason: impl Into<String>) -> Self {
        RankError::InvalidRecord {
            row,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RankError>;
