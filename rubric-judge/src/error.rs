//! Error types for judge calls

use thiserror::Error;

/// Errors raised while talking to the remote judge.
///
/// Any of these fails the one request that triggered the call; there is no
/// automatic retry.
#[derive(Error, Debug)]
pub enum JudgeError {
    /// The HTTP request itself failed (connect, TLS, timeout at the socket).
    #[error("judge request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The judge answered with a non-success status.
    #[error("judge returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The judge answered 200 but the body was not a verdict.
    #[error("judge response could not be decoded: {0}")]
    Decode(String),

    /// The client was constructed with unusable settings.
    #[error("invalid judge configuration: {0}")]
    Config(String),
}
