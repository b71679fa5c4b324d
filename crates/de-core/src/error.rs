use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unknown vertical coordinate: {raw}")]
    UnknownLevel { raw: String },

    #[error("Level {level} is not supported here: {reason}")]
    UnsupportedLevel { level: String, reason: &'static str },

    #[error("Invalid timestamp '{raw}': {message}")]
    InvalidTimestamp { raw: String, message: String },
}
