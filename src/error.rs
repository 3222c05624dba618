use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Configuration ─────────────────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing API key")]
    MissingApiKey,

    #[error("Service '{service}' does not support input format '{format}'")]
    UnsupportedService { service: String, format: String },

    // ── Input ─────────────────────────────────────────────────────────────────
    #[error("Line {line_no}: expected input with format '{expected}', got: {line}")]
    MalformedLine {
        line_no: u64,
        expected: String,
        line: String,
    },

    #[error("Input I/O error: {0}")]
    InputIo(#[source] std::io::Error),

    // ── Oracle ────────────────────────────────────────────────────────────────
    #[error("Onoma API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    // ── Output ────────────────────────────────────────────────────────────────
    #[error("Output I/O error: {0}")]
    OutputIo(#[source] std::io::Error),

    // ── Generic fallback ──────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}
