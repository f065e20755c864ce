use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid locator '{0}': expected s3://bucket/key")]
    InvalidLocator(String),

    #[error("No objects found under s3://{bucket}/{prefix}")]
    EmptyResult { bucket: String, prefix: String },

    #[error("Malformed restore state for {locator}: missing expiry-date in '{raw}'")]
    MalformedRestoreState { locator: String, raw: String },

    #[error("{locator}: remote error {code}: {message}")]
    Remote {
        locator: String,
        code: String,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RestoreError>;
