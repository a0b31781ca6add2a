use anyhow::Error;
use thiserror::Error;

/// Application-level error types for s3redirect-rs.
///
/// ## Exit Codes
///
/// Each variant maps to an exit code (via `exit_code()`):
/// - 1: AWS SDK failures outside the S3 API (network, timeout, dispatch)
/// - 2: Configuration errors (InvalidConfig, InvalidRedirects)
/// - 3: Partial failure (some objects written, some failed)
#[derive(Error, Debug, PartialEq)]
pub enum S3RedirectError {
    /// AWS SDK failure that is not an S3 API response, such as a timeout or a
    /// dropped connection.
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    /// Configuration error.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The redirect source could not be read or does not hold valid rules.
    #[error("Invalid redirects: {0}")]
    InvalidRedirects(String),

    /// Some operations reported store errors.
    #[error("Partial failure: {succeeded} succeeded, {failed} failed")]
    PartialFailure { succeeded: u64, failed: u64 },
}

impl S3RedirectError {
    /// Get the appropriate process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            S3RedirectError::InvalidConfig(_) | S3RedirectError::InvalidRedirects(_) => 2,
            S3RedirectError::PartialFailure { .. } => 3,
            S3RedirectError::AwsSdk(_) => 1,
        }
    }
}

/// Structured failure reported by the object store service.
///
/// A `StoreError` is local to one operation: it is recorded in the
/// operation's outcome and never stops the rest of the batch. Storage
/// implementations return it wrapped in an `anyhow::Error`; anything that does
/// not downcast to `StoreError` is fatal for the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub code: String,
    pub message: String,
}

impl StoreError {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}

/// Extract a structured store error from an `anyhow::Error`, if it wraps one.
pub fn as_store_error(e: &Error) -> Option<&StoreError> {
    e.downcast_ref::<StoreError>()
}

/// Extract the exit code from an anyhow::Error, defaulting to 1.
pub fn exit_code_from_error(e: &Error) -> i32 {
    if let Some(err) = e.downcast_ref::<S3RedirectError>() {
        return err.exit_code();
    }
    1
}
