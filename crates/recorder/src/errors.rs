use thiserror::Error;
use transcript_log::LogError;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("no recording session is active")]
    NotRecording,
    #[error("a recording session is already active")]
    AlreadyRecording,
    #[error(transparent)]
    Log(#[from] LogError),
}

pub type RecorderResult<T> = Result<T, RecorderError>;
