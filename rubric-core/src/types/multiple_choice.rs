//! The fixed-choice (multiple choice) type.
//!
//! The answer key maps option keys to `{score, response}` entries; the
//! submission names one option key. Scoring is a straight lookup, and the
//! canonical answer is the first option (in answer-key document order)
//! scoring 1.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::CorrectnessError;
use crate::handler::AssessmentHandler;
use crate::payload::AnswerKey;
use crate::result::{CorrectAnswer, ReturnData, SubmissionStats};
use crate::schema::{Additional, Kind, ObjectSchema, Schema};

const QUESTION_TYPE: &str = "MultipleChoice";
const TYPE_TAG: &str = "multiplechoice";

pub struct MultipleChoiceHandler;

#[derive(Debug, Deserialize)]
struct ChoiceEntry {
    score: u8,
    response: String,
}

/// The option map inside the answer key.
fn options(answer_key: &AnswerKey) -> Result<&Map<String, Value>, CorrectnessError> {
    answer_key
        .answers
        .as_object()
        .ok_or_else(|| CorrectnessError::InvalidAnswerKey {
            assessment_type: TYPE_TAG,
            message: "answers must be an object of options".to_string(),
        })
}

/// The submitted option key. Accepts both wrapper spellings.
fn submitted_key(submission: &Value) -> Option<&str> {
    submission
        .get("key")
        .or_else(|| submission.get("submission"))
        .and_then(Value::as_str)
}

/// First option (document order) scoring 1, as `{key, feedback}`.
fn winning_option(options: &Map<String, Value>) -> Option<CorrectAnswer> {
    options
        .iter()
        .find(|(_, entry)| entry.get("score").and_then(Value::as_u64) == Some(1))
        .map(|(key, entry)| CorrectAnswer::Choice {
            key: key.clone(),
            feedback: entry
                .get("response")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
}

#[async_trait]
impl AssessmentHandler for MultipleChoiceHandler {
    fn answer_schema(&self) -> Option<Schema> {
        Some(Schema {
            title: "multiple choice answer key",
            kind: Kind::Object(ObjectSchema {
                required: vec!["assessmentType", "answers"],
                properties: vec![
                    ("assessmentType", Kind::StringConst(TYPE_TAG)),
                    (
                        "answers",
                        Kind::Object(ObjectSchema {
                            additional: Additional::Schema(Box::new(Kind::Object(ObjectSchema {
                                required: vec!["score", "response"],
                                properties: vec![
                                    ("score", Kind::Number),
                                    ("response", Kind::String),
                                ],
                                ..Default::default()
                            }))),
                            ..Default::default()
                        }),
                    ),
                    ("nonRecordable", Kind::Boolean),
                    ("description", Kind::String),
                ],
                ..Default::default()
            }),
        })
    }

    fn submission_schema(&self) -> Option<Schema> {
        Some(Schema {
            title: "multiple choice submission",
            kind: Kind::Object(ObjectSchema {
                properties: vec![("key", Kind::String), ("submission", Kind::String)],
                additional: Additional::Deny,
                ..Default::default()
            }),
        })
    }

    async fn preprocess(
        &self,
        data: ReturnData,
        answer_key: &AnswerKey,
        submission: &Value,
    ) -> Result<ReturnData, CorrectnessError> {
        let options = options(answer_key)?;
        match submitted_key(submission) {
            Some(key) if options.contains_key(key) => Ok(data),
            _ => Err(CorrectnessError::Preprocessing(
                "Submission Key not in answer key".to_string(),
            )),
        }
    }

    async fn calculate_score_and_feedback(
        &self,
        mut data: ReturnData,
        answer_key: &AnswerKey,
        submission: &Value,
    ) -> Result<ReturnData, CorrectnessError> {
        let options = options(answer_key)?;
        // preprocess guarantees the key exists
        let key = submitted_key(submission).ok_or_else(|| {
            CorrectnessError::Preprocessing("Submission Key not in answer key".to_string())
        })?;
        let entry = options.get(key).ok_or_else(|| {
            CorrectnessError::Preprocessing("Submission Key not in answer key".to_string())
        })?;
        let entry: ChoiceEntry =
            serde_json::from_value(entry.clone()).map_err(|e| CorrectnessError::InvalidAnswerKey {
                assessment_type: TYPE_TAG,
                message: format!("option '{key}' is malformed: {e}"),
            })?;

        data.correctness = Some(if entry.score == 1 { 1 } else { 0 });
        data.feedback = Some(entry.response);
        Ok(data)
    }

    async fn calculate_stats(&self, mut data: ReturnData, submission: &Value) -> ReturnData {
        let mut stats = SubmissionStats::for_question_type(QUESTION_TYPE);
        stats.answer_id = submitted_key(submission).map(str::to_string);
        data.stats = Some(stats);
        data
    }

    async fn add_correct_answer(
        &self,
        mut data: ReturnData,
        answer_key: &AnswerKey,
        is_last_attempt: bool,
    ) -> Result<ReturnData, CorrectnessError> {
        data.correct_answer = None;
        if is_last_attempt && data.correctness != Some(1) {
            data.correct_answer = winning_option(options(answer_key)?);
        }
        Ok(data)
    }

    async fn retrieve_correct_answer(
        &self,
        mut data: ReturnData,
        answer_key: &AnswerKey,
    ) -> Result<ReturnData, CorrectnessError> {
        data.correct_answer = winning_option(options(answer_key)?);
        Ok(data)
    }
}
