use std::num::ParseIntError;

use thiserror::Error;

use mtrak_audio::SubmitError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid {what}: {value}")]
    InvalidValue { what: &'static str, value: i64 },
    #[error("not a number: {0}")]
    ParseInt(#[from] ParseIntError),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("no filename")]
    NoFilename,
    #[error("malformed song: {0}")]
    Malformed(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("playback is not keeping up, edit dropped")]
    QueueFull,
    #[error("playback has stopped, edit dropped")]
    Disconnected,
}

impl From<SubmitError> for CoreError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Full => CoreError::QueueFull,
            SubmitError::Disconnected => CoreError::Disconnected,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
