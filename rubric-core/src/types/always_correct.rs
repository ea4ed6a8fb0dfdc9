//! The always-correct type: every submission is graded correct.
//!
//! Used for participation-style questions where the act of answering is the
//! point. Submissions arrive in whatever shape the authoring tool produced,
//! so neither payload is schema-checked.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CorrectnessError;
use crate::handler::AssessmentHandler;
use crate::payload::AnswerKey;
use crate::result::{ReturnData, SubmissionStats};
use crate::schema::Schema;

const QUESTION_TYPE: &str = "AlwaysCorrect";
const NOT_A_STRING: &str = "student submission is not a string value";

pub struct AlwaysCorrectHandler;

/// Best-effort text rendition of an arbitrarily shaped submission: the raw
/// string, or the first string-valued field of an object, or a diagnostic.
fn response_text(submission: &Value) -> String {
    match submission {
        Value::String(text) => text.clone(),
        Value::Object(map) => map
            .values()
            .find_map(Value::as_str)
            .map_or_else(|| NOT_A_STRING.to_string(), str::to_string),
        _ => NOT_A_STRING.to_string(),
    }
}

#[async_trait]
impl AssessmentHandler for AlwaysCorrectHandler {
    fn answer_schema(&self) -> Option<Schema> {
        None
    }

    fn submission_schema(&self) -> Option<Schema> {
        None
    }

    async fn calculate_score_and_feedback(
        &self,
        mut data: ReturnData,
        _answer_key: &AnswerKey,
        _submission: &Value,
    ) -> Result<ReturnData, CorrectnessError> {
        data.correctness = Some(1);
        data.feedback = Some("You are correct.".to_string());
        Ok(data)
    }

    async fn calculate_stats(&self, mut data: ReturnData, submission: &Value) -> ReturnData {
        let mut stats = SubmissionStats::for_question_type(QUESTION_TYPE);
        stats.response = Some(response_text(submission));
        data.stats = Some(stats);
        data
    }

    async fn add_correct_answer(
        &self,
        mut data: ReturnData,
        _answer_key: &AnswerKey,
        _is_last_attempt: bool,
    ) -> Result<ReturnData, CorrectnessError> {
        data.correct_answer = None;
        Ok(data)
    }

    async fn retrieve_correct_answer(
        &self,
        mut data: ReturnData,
        _answer_key: &AnswerKey,
    ) -> Result<ReturnData, CorrectnessError> {
        data.correct_answer = None;
        Ok(data)
    }
}
