//! The assessment handler contract and the closed set of question types.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CorrectnessError;
use crate::payload::AnswerKey;
use crate::result::ReturnData;
use crate::schema::{self, Schema};

/// The closed set of question types this engine can grade.
///
/// Adding a type means adding a variant here, a handler module under
/// `types/`, and an arm in [`crate::registry::HandlerRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssessmentType {
    AlwaysCorrect,
    MultipleChoice,
    Numeric,
    MultiValue,
    Discussions,
    ProgrammingExercise,
}

impl AssessmentType {
    pub const ALL: [AssessmentType; 6] = [
        AssessmentType::AlwaysCorrect,
        AssessmentType::MultipleChoice,
        AssessmentType::Numeric,
        AssessmentType::MultiValue,
        AssessmentType::Discussions,
        AssessmentType::ProgrammingExercise,
    ];

    /// Parse the wire tag carried in `AnswerKey.assessmentType`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "alwayscorrect" => Some(Self::AlwaysCorrect),
            "multiplechoice" => Some(Self::MultipleChoice),
            "numeric" => Some(Self::Numeric),
            "multivalue" => Some(Self::MultiValue),
            "discussions" => Some(Self::Discussions),
            "programmingexercise" => Some(Self::ProgrammingExercise),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlwaysCorrect => "alwayscorrect",
            Self::MultipleChoice => "multiplechoice",
            Self::Numeric => "numeric",
            Self::MultiValue => "multivalue",
            Self::Discussions => "discussions",
            Self::ProgrammingExercise => "programmingexercise",
        }
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform multi-stage evaluation contract implemented by every question
/// type.
///
/// The engines call these operations in a fixed order and await each one
/// fully before the next; no stage runs concurrently with another for the
/// same request. Instances are created fresh per request by the registry and
/// carry no data across requests.
#[async_trait]
pub trait AssessmentHandler: Send + Sync {
    /// Schema for `AnswerKey`, or `None` when this type is unchecked.
    fn answer_schema(&self) -> Option<Schema>;

    /// Schema for the student submission, or `None` when unchecked.
    fn submission_schema(&self) -> Option<Schema>;

    /// Check `obj` against `schema`, reporting every violated rule.
    async fn validate_obj(&self, obj: &Value, schema: &Schema) -> Result<(), CorrectnessError> {
        schema::validate(obj, schema)?;
        Ok(())
    }

    /// Type-specific sanity checks ahead of scoring. The default is a
    /// pass-through; a failure here aborts the pipeline with a message
    /// surfaced verbatim.
    async fn preprocess(
        &self,
        data: ReturnData,
        _answer_key: &AnswerKey,
        _submission: &Value,
    ) -> Result<ReturnData, CorrectnessError> {
        Ok(data)
    }

    /// Grade the submission: sets correctness (0 or 1) and feedback, and may
    /// attach type-specific side-channel state.
    async fn calculate_score_and_feedback(
        &self,
        data: ReturnData,
        answer_key: &AnswerKey,
        submission: &Value,
    ) -> Result<ReturnData, CorrectnessError>;

    /// Attach the analytics payload. Infallible by contract: stats
    /// derivation must never block returning correctness.
    async fn calculate_stats(&self, data: ReturnData, submission: &Value) -> ReturnData;

    /// Apply this type's disclosure policy, populating the correct answer
    /// only when policy allows.
    async fn add_correct_answer(
        &self,
        data: ReturnData,
        answer_key: &AnswerKey,
        is_last_attempt: bool,
    ) -> Result<ReturnData, CorrectnessError>;

    /// Unconditionally populate the correct answer from the answer key.
    /// Used by the answer-retrieval pipeline; no submission or attempt
    /// context exists here.
    async fn retrieve_correct_answer(
        &self,
        data: ReturnData,
        answer_key: &AnswerKey,
    ) -> Result<ReturnData, CorrectnessError>;
}
