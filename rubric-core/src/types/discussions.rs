//! The discussions type (journals, shared writing).
//!
//! Writing prompts are always correct; the interesting output is the
//! routing data. The result carries a `discussions` flag plus the topic and
//! author ids from the answer key so the caller can perform the
//! out-of-band discussion-system write.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::CorrectnessError;
use crate::handler::AssessmentHandler;
use crate::payload::AnswerKey;
use crate::result::{ReturnData, SubmissionStats};
use crate::schema::{Kind, ObjectSchema, Schema};

const QUESTION_TYPE: &str = "SimpleWriting";
const TYPE_TAG: &str = "discussions";

pub struct DiscussionsHandler;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscussionAnswers {
    topic_id: String,
    author_id: String,
}

#[async_trait]
impl AssessmentHandler for DiscussionsHandler {
    fn answer_schema(&self) -> Option<Schema> {
        Some(Schema {
            title: "discussions answer key",
            kind: Kind::Object(ObjectSchema {
                required: vec!["assessmentType", "answers"],
                properties: vec![
                    ("assessmentType", Kind::StringConst(TYPE_TAG)),
                    (
                        "answers",
                        Kind::Object(ObjectSchema {
                            required: vec!["topicId", "authorId"],
                            properties: vec![
                                ("topicId", Kind::String),
                                ("authorId", Kind::String),
                            ],
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
            title: "discussions submission",
            kind: Kind::Object(ObjectSchema {
                required: vec!["entry"],
                properties: vec![("entry", Kind::String)],
                ..Default::default()
            }),
        })
    }

    async fn calculate_score_and_feedback(
        &self,
        mut data: ReturnData,
        answer_key: &AnswerKey,
        _submission: &Value,
    ) -> Result<ReturnData, CorrectnessError> {
        let answers: DiscussionAnswers = serde_json::from_value(answer_key.answers.clone())
            .map_err(|e| CorrectnessError::InvalidAnswerKey {
                assessment_type: TYPE_TAG,
                message: e.to_string(),
            })?;

        data.correctness = Some(1);
        data.feedback = Some("You are correct.".to_string());
        data.discussions = true;
        data.topic_id = Some(answers.topic_id);
        data.author_id = Some(answers.author_id);
        Ok(data)
    }

    async fn calculate_stats(&self, mut data: ReturnData, submission: &Value) -> ReturnData {
        let mut stats = SubmissionStats::for_question_type(QUESTION_TYPE);
        stats.item_response_text = submission
            .get("entry")
            .and_then(Value::as_str)
            .map(str::to_string);
        data.stats = Some(stats);
        data
    }

    async fn add_correct_answer(
        &self,
        data: ReturnData,
        _answer_key: &AnswerKey,
        _is_last_attempt: bool,
    ) -> Result<ReturnData, CorrectnessError> {
        // Nothing to disclose for writing prompts.
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
