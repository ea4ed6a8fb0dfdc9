//! Error taxonomy for the evaluation pipeline.
//!
//! Every pipeline stage failure maps onto exactly one of these variants and
//! short-circuits the remaining stages. Errors are local to one request; a
//! failed request corrupts no shared state.

use thiserror::Error;

use crate::schema::ValidationError;
use rubric_judge::JudgeError;

/// Top-level error type for the correctness engine.
#[derive(Error, Debug)]
pub enum CorrectnessError {
    /// The answer key named a type no handler is registered for.
    #[error("The assessmentType '{0}' can not be processed by this Correctness Engine")]
    UnknownAssessmentType(String),

    /// The answer key or submission failed its schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A semantic precondition was violated; the message is surfaced to the
    /// caller verbatim.
    #[error("{0}")]
    Preprocessing(String),

    /// The answer key passed (or skipped) schema validation but could not be
    /// read as the typed answers this handler needs.
    #[error("invalid {assessment_type} answer key: {message}")]
    InvalidAnswerKey {
        assessment_type: &'static str,
        message: String,
    },

    /// The remote judge call failed.
    #[error("remote judge error: {0}")]
    RemoteJudge(#[from] JudgeError),

    /// A stage contract was broken. Indicates a handler bug, not a
    /// recognized pipeline outcome.
    #[error("internal pipeline error: {0}")]
    Internal(String),
}
