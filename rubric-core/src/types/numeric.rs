//! The numeric-range type.
//!
//! The answer key names a correct value with an optional tolerance (a single
//! symmetric error or a `[low, high]` pair); incorrect submissions select
//! feedback from the first matching wrong-range bucket.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::CorrectnessError;
use crate::handler::AssessmentHandler;
use crate::payload::AnswerKey;
use crate::result::{CorrectAnswer, NumericAnswer, ReturnData, SubmissionStats};
use crate::schema::{Additional, ArraySchema, Kind, ObjectSchema, Schema};

const QUESTION_TYPE: &str = "Numeric";
const TYPE_TAG: &str = "numeric";

/// Prefixed to the correct-response feedback when the submission was inside
/// tolerance but not exact.
const TOLERANCE_NOTICE: &str =
    "Your answer is close enough to be correct, but check for tolerance or other errors. ";

pub struct NumericHandler;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NumericAnswers {
    correct_value: f64,
    #[serde(default)]
    acceptable_error: Option<AcceptableError>,
    #[serde(default)]
    notify_on_correct_not_exact: Option<bool>,
    correct_response: String,
    incorrect_responses: Vec<IncorrectResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AcceptableError {
    Symmetric(f64),
    Asymmetric([f64; 2]),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncorrectResponse {
    wrong_range: [f64; 2],
    feedback: String,
}

impl NumericAnswers {
    fn parse(answer_key: &AnswerKey) -> Result<Self, CorrectnessError> {
        serde_json::from_value(answer_key.answers.clone()).map_err(|e| {
            CorrectnessError::InvalidAnswerKey {
                assessment_type: TYPE_TAG,
                message: e.to_string(),
            }
        })
    }

    /// Inclusive bounds of the accepted interval. Default tolerance is zero.
    fn accepted_bounds(&self) -> (f64, f64) {
        match self.acceptable_error {
            None => (self.correct_value, self.correct_value),
            Some(AcceptableError::Symmetric(error)) => {
                (self.correct_value - error, self.correct_value + error)
            }
            Some(AcceptableError::Asymmetric([low, high])) => {
                (self.correct_value - low, self.correct_value + high)
            }
        }
    }
}

fn submitted_value(submission: &Value) -> Result<f64, CorrectnessError> {
    submission
        .get("value")
        .and_then(Value::as_f64)
        .ok_or_else(|| CorrectnessError::Preprocessing("Submission value is not a number".to_string()))
}

#[async_trait]
impl AssessmentHandler for NumericHandler {
    fn answer_schema(&self) -> Option<Schema> {
        Some(Schema {
            title: "numeric answer key",
            kind: Kind::Object(ObjectSchema {
                required: vec!["assessmentType", "answers"],
                properties: vec![
                    ("assessmentType", Kind::StringConst(TYPE_TAG)),
                    (
                        "answers",
                        Kind::Object(ObjectSchema {
                            required: vec!["correctValue", "correctResponse", "incorrectResponses"],
                            properties: vec![
                                ("correctValue", Kind::Number),
                                (
                                    "acceptableError",
                                    Kind::AnyOf(vec![
                                        Kind::Number,
                                        Kind::Array(ArraySchema {
                                            items: Box::new(Kind::Number),
                                            min_items: Some(2),
                                            max_items: Some(2),
                                        }),
                                    ]),
                                ),
                                ("notifyOnCorrectNotExact", Kind::Boolean),
                                ("correctResponse", Kind::String),
                                (
                                    "incorrectResponses",
                                    Kind::Array(ArraySchema {
                                        items: Box::new(Kind::Object(ObjectSchema {
                                            required: vec!["wrongRange", "feedback"],
                                            properties: vec![
                                                (
                                                    "wrongRange",
                                                    Kind::Array(ArraySchema {
                                                        items: Box::new(Kind::Number),
                                                        min_items: Some(2),
                                                        max_items: Some(2),
                                                    }),
                                                ),
                                                ("feedback", Kind::String),
                                            ],
                                            ..Default::default()
                                        })),
                                        min_items: None,
                                        max_items: None,
                                    }),
                                ),
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
            title: "numeric submission",
            kind: Kind::Object(ObjectSchema {
                required: vec!["value"],
                properties: vec![("value", Kind::Number)],
                additional: Additional::Deny,
            }),
        })
    }

    async fn calculate_score_and_feedback(
        &self,
        mut data: ReturnData,
        answer_key: &AnswerKey,
        submission: &Value,
    ) -> Result<ReturnData, CorrectnessError> {
        let answers = NumericAnswers::parse(answer_key)?;
        let value = submitted_value(submission)?;

        // Assume incorrect until the interval check says otherwise.
        data.correctness = Some(0);
        data.feedback = Some(String::new());

        let (low, high) = answers.accepted_bounds();
        if value >= low && value <= high {
            data.correctness = Some(1);
            let notify = answers.notify_on_correct_not_exact.unwrap_or(true);
            data.feedback = Some(if notify && value != answers.correct_value {
                format!("{TOLERANCE_NOTICE}{}", answers.correct_response)
            } else {
                answers.correct_response
            });
        } else if let Some(matched) = answers
            .incorrect_responses
            .iter()
            .find(|bucket| value >= bucket.wrong_range[0] && value <= bucket.wrong_range[1])
        {
            data.feedback = Some(matched.feedback.clone());
        }

        Ok(data)
    }

    async fn calculate_stats(&self, mut data: ReturnData, _submission: &Value) -> ReturnData {
        data.stats = Some(SubmissionStats::for_question_type(QUESTION_TYPE));
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
            let answers = NumericAnswers::parse(answer_key)?;
            data.correct_answer = Some(CorrectAnswer::Numeric {
                answer: NumericAnswer {
                    value: answers.correct_value,
                },
                feedback: Some(answers.correct_response),
            });
        }
        Ok(data)
    }

    async fn retrieve_correct_answer(
        &self,
        mut data: ReturnData,
        answer_key: &AnswerKey,
    ) -> Result<ReturnData, CorrectnessError> {
        let answers = NumericAnswers::parse(answer_key)?;
        data.correct_answer = Some(CorrectAnswer::Numeric {
            answer: NumericAnswer {
                value: answers.correct_value,
            },
            feedback: None,
        });
        Ok(data)
    }
}
