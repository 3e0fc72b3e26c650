use thiserror::Error;

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid reference time '{input}', expected YYYY-MM-DD HH:MM:SS: {source}")]
    InvalidReferenceTime {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Reference time '{0}' is out of range")]
    ReferenceTimeOutOfRange(String),
}
