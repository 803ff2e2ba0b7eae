use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum LogError {
    #[error("unknown session: {0}")]
    UnknownSession(String),
    #[error("append rejected: {0}")]
    AppendRejected(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type LogResult<T> = Result<T, LogError>;
