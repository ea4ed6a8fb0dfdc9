//! The multi-key-value type (multi-select, drag-and-drop, binning).
//!
//! The answer key carries an ordered list of acceptable value sets; a
//! submission is correct when its key set exactly matches any one of them.
//! Incorrect submissions get a per-key correctness map against the first
//! value set so the client can highlight partial credit.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::CorrectnessError;
use crate::handler::AssessmentHandler;
use crate::payload::AnswerKey;
use crate::result::{
    CorrectAnswer, ResponseCode, ReturnData, StatsExtensions, SubmissionStats, TargetResponse,
};
use crate::schema::{Additional, ArraySchema, Kind, ObjectSchema, Schema};

const QUESTION_TYPE: &str = "MultiValue";
const TYPE_TAG: &str = "multivalue";
const TYPE_CODE: &str = "Multi_Value_Question_User_Answered";

pub struct MultiValueHandler;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MultiValueAnswers {
    correct_values: Vec<Map<String, Value>>,
    #[serde(default)]
    correct_response: Option<String>,
    #[serde(default)]
    incorrect_response: Option<String>,
}

impl MultiValueAnswers {
    fn parse(answer_key: &AnswerKey) -> Result<Self, CorrectnessError> {
        let answers: Self = serde_json::from_value(answer_key.answers.clone()).map_err(|e| {
            CorrectnessError::InvalidAnswerKey {
                assessment_type: TYPE_TAG,
                message: e.to_string(),
            }
        })?;
        if answers.correct_values.is_empty() {
            return Err(CorrectnessError::InvalidAnswerKey {
                assessment_type: TYPE_TAG,
                message: "correctValues must not be empty".to_string(),
            });
        }
        Ok(answers)
    }
}

fn submission_map(submission: &Value) -> Result<&Map<String, Value>, CorrectnessError> {
    submission.as_object().ok_or_else(|| {
        CorrectnessError::Preprocessing("Submission must be a map of keys to values".to_string())
    })
}

/// Render a submitted value the way analytics wants target ids: bare
/// strings stay bare, everything else uses its JSON rendition.
fn target_id(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl AssessmentHandler for MultiValueHandler {
    fn answer_schema(&self) -> Option<Schema> {
        Some(Schema {
            title: "multivalue answer key",
            kind: Kind::Object(ObjectSchema {
                required: vec!["assessmentType", "answers"],
                properties: vec![
                    ("assessmentType", Kind::StringConst(TYPE_TAG)),
                    (
                        "answers",
                        Kind::Object(ObjectSchema {
                            required: vec!["correctValues"],
                            properties: vec![
                                (
                                    "correctValues",
                                    Kind::Array(ArraySchema {
                                        items: Box::new(Kind::Object(ObjectSchema {
                                            additional: Additional::Schema(Box::new(Kind::Scalar)),
                                            ..Default::default()
                                        })),
                                        min_items: Some(1),
                                        max_items: None,
                                    }),
                                ),
                                ("correctResponse", Kind::String),
                                ("incorrectResponse", Kind::String),
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
        // The key portion is authoring-defined, so only the outer shape and
        // the primitive-valued entries are checked.
        Some(Schema {
            title: "multivalue submission",
            kind: Kind::Object(ObjectSchema {
                additional: Additional::Schema(Box::new(Kind::Scalar)),
                ..Default::default()
            }),
        })
    }

    async fn calculate_score_and_feedback(
        &self,
        mut data: ReturnData,
        answer_key: &AnswerKey,
        submission: &Value,
    ) -> Result<ReturnData, CorrectnessError> {
        let answers = MultiValueAnswers::parse(answer_key)?;
        let submitted = submission_map(submission)?;

        // Assume incorrect until a value set matches.
        data.correctness = Some(0);
        data.feedback = answers.incorrect_response.clone();

        // Correct means the key set size-matches one value set and every key
        // in that set has an identical submitted value.
        let is_correct = answers.correct_values.iter().any(|value_set| {
            value_set.len() == submitted.len()
                && value_set
                    .iter()
                    .all(|(key, expected)| submitted.get(key) == Some(expected))
        });

        if is_correct {
            data.correctness = Some(1);
            data.feedback = answers.correct_response.clone();
        } else {
            // Per-key feedback is judged against the first value set only.
            let first_set = &answers.correct_values[0];
            let mut key_value_feedback = Map::new();
            for (key, value) in submitted {
                key_value_feedback.insert(
                    key.clone(),
                    Value::Bool(first_set.get(key) == Some(value)),
                );
            }
            data.key_value_feedback = Some(key_value_feedback);
        }

        Ok(data)
    }

    async fn calculate_stats(&self, mut data: ReturnData, submission: &Value) -> ReturnData {
        let correct_overall = data.correctness == Some(1);

        let student_response = submission
            .as_object()
            .map(|submitted| {
                submitted
                    .iter()
                    .map(|(key, value)| {
                        // No per-key map means the submission as a whole was
                        // correct, so every target is correct.
                        let key_correct = match &data.key_value_feedback {
                            Some(feedback) => {
                                feedback.get(key).and_then(Value::as_bool).unwrap_or(false)
                            }
                            None => correct_overall,
                        };
                        TargetResponse {
                            target_id: target_id(value),
                            answer_id: Some(key.clone()),
                            response_code: ResponseCode::from_correct(key_correct),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut stats = SubmissionStats::for_question_type(QUESTION_TYPE);
        stats.type_code = Some(TYPE_CODE.to_string());
        stats.extensions = Some(StatsExtensions {
            assessment_item_question_type: QUESTION_TYPE.to_string(),
            assessment_item_response_code: ResponseCode::from_correct(correct_overall),
            student_response,
        });
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
            let answers = MultiValueAnswers::parse(answer_key)?;
            data.correct_answer = Some(CorrectAnswer::KeyValues {
                key_values: answers.correct_values.into_iter().next().unwrap_or_default(),
            });
        }
        Ok(data)
    }

    async fn retrieve_correct_answer(
        &self,
        mut data: ReturnData,
        answer_key: &AnswerKey,
    ) -> Result<ReturnData, CorrectnessError> {
        let answers = MultiValueAnswers::parse(answer_key)?;
        data.correct_answer = Some(CorrectAnswer::KeyValues {
            key_values: answers.correct_values.into_iter().next().unwrap_or_default(),
        });
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Answers 1 and 3 are the correct selections.
    fn answer_key() -> AnswerKey {
        AnswerKey {
            assessment_type: TYPE_TAG.to_string(),
            answers: json!({
                "correctValues": [
                    {"answer1": true, "answer3": true}
                ],
                "correctResponse": "We need more food but it isn't going to quadruple by 2050.",
                "incorrectResponse": "Nope, sorry try again"
            }),
            non_recordable: None,
            description: None,
        }
    }

    async fn score(submission: Value) -> ReturnData {
        MultiValueHandler
            .calculate_score_and_feedback(ReturnData::default(), &answer_key(), &submission)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn matching_value_set_is_correct() {
        let data = score(json!({"answer1": true, "answer3": true})).await;
        assert_eq!(data.correctness, Some(1));
        assert!(data.feedback.unwrap().contains("quadruple"));
        assert!(data.key_value_feedback.is_none());
    }

    #[tokio::test]
    async fn wrong_selection_gets_per_key_feedback_map() {
        let data = score(json!({"answer1": true, "answer2": true})).await;
        assert_eq!(data.correctness, Some(0));
        assert_eq!(data.feedback.as_deref(), Some("Nope, sorry try again"));

        let feedback = data.key_value_feedback.unwrap();
        assert_eq!(feedback.get("answer1"), Some(&json!(true)));
        assert_eq!(feedback.get("answer2"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn size_mismatch_is_incorrect_even_when_values_match() {
        let data = score(json!({"answer1": true, "answer2": true, "answer3": true})).await;
        assert_eq!(data.correctness, Some(0));
    }

    #[tokio::test]
    async fn subset_of_a_value_set_is_incorrect() {
        let data = score(json!({"answer1": true})).await;
        assert_eq!(data.correctness, Some(0));
    }

    #[tokio::test]
    async fn any_value_set_may_match() {
        let key = AnswerKey {
            assessment_type: TYPE_TAG.to_string(),
            answers: json!({
                "correctValues": [
                    {"bin1": "apple", "bin2": "pear"},
                    {"bin1": "pear", "bin2": "apple"}
                ]
            }),
            non_recordable: None,
            description: None,
        };
        let data = MultiValueHandler
            .calculate_score_and_feedback(
                ReturnData::default(),
                &key,
                &json!({"bin1": "pear", "bin2": "apple"}),
            )
            .await
            .unwrap();
        assert_eq!(data.correctness, Some(1));
    }

    #[tokio::test]
    async fn string_submission_fails_scoring() {
        let err = MultiValueHandler
            .calculate_score_and_feedback(ReturnData::default(), &answer_key(), &json!("stringy"))
            .await
            .unwrap_err();
        assert!(matches!(err, CorrectnessError::Preprocessing(_)));
    }

    #[tokio::test]
    async fn stats_mark_each_target_from_the_feedback_map() {
        let data = ReturnData {
            correctness: Some(0),
            key_value_feedback: Some(
                [
                    ("answer1".to_string(), json!(true)),
                    ("answer2".to_string(), json!(false)),
                ]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        };
        let data = MultiValueHandler
            .calculate_stats(data, &json!({"answer1": true, "answer2": true}))
            .await;

        let stats = data.stats.unwrap();
        assert_eq!(stats.type_code.as_deref(), Some(TYPE_CODE));

        let extensions = stats.extensions.unwrap();
        assert_eq!(
            extensions.assessment_item_response_code,
            ResponseCode::Incorrect
        );
        assert_eq!(extensions.student_response.len(), 2);
        assert_eq!(extensions.student_response[0].target_id, "true");
        assert_eq!(
            extensions.student_response[0].answer_id.as_deref(),
            Some("answer1")
        );
        assert_eq!(
            extensions.student_response[0].response_code,
            ResponseCode::Correct
        );
        assert_eq!(
            extensions.student_response[1].response_code,
            ResponseCode::Incorrect
        );
    }

    #[tokio::test]
    async fn stats_default_every_target_correct_without_a_feedback_map() {
        let data = ReturnData {
            correctness: Some(1),
            ..Default::default()
        };
        let data = MultiValueHandler
            .calculate_stats(data, &json!({"answer1": true, "answer3": true}))
            .await;

        let extensions = data.stats.unwrap().extensions.unwrap();
        assert_eq!(
            extensions.assessment_item_response_code,
            ResponseCode::Correct
        );
        assert!(
            extensions
                .student_response
                .iter()
                .all(|target| target.response_code == ResponseCode::Correct)
        );
    }

    #[tokio::test]
    async fn stats_render_string_targets_bare() {
        let data = ReturnData {
            correctness: Some(0),
            key_value_feedback: Some(
                [("answer1".to_string(), json!(false))].into_iter().collect(),
            ),
            ..Default::default()
        };
        let data = MultiValueHandler
            .calculate_stats(data, &json!({"answer1": "the_wronganswer"}))
            .await;

        let extensions = data.stats.unwrap().extensions.unwrap();
        assert_eq!(extensions.student_response[0].target_id, "the_wronganswer");
        assert_eq!(
            extensions.student_response[0].response_code,
            ResponseCode::Incorrect
        );
    }

    #[tokio::test]
    async fn empty_submission_yields_empty_breakdown() {
        let data = ReturnData {
            correctness: Some(0),
            key_value_feedback: Some(Map::new()),
            ..Default::default()
        };
        let data = MultiValueHandler.calculate_stats(data, &json!({})).await;
        let extensions = data.stats.unwrap().extensions.unwrap();
        assert!(extensions.student_response.is_empty());
        assert_eq!(
            extensions.assessment_item_response_code,
            ResponseCode::Incorrect
        );
    }

    #[tokio::test]
    async fn discloses_first_value_set_on_exhausted_incorrect() {
        let data = ReturnData {
            correctness: Some(0),
            ..Default::default()
        };
        let data = MultiValueHandler
            .add_correct_answer(data, &answer_key(), true)
            .await
            .unwrap();
        match data.correct_answer {
            Some(CorrectAnswer::KeyValues { key_values }) => {
                assert_eq!(key_values.get("answer1"), Some(&json!(true)));
                assert_eq!(key_values.get("answer3"), Some(&json!(true)));
                assert_eq!(key_values.len(), 2);
            }
            other => panic!("expected a key-values answer, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn withholds_answer_from_correct_students() {
        let data = ReturnData {
            correctness: Some(1),
            ..Default::default()
        };
        let data = MultiValueHandler
            .add_correct_answer(data, &answer_key(), true)
            .await
            .unwrap();
        assert!(data.correct_answer.is_none());
    }

    #[tokio::test]
    async fn retrieval_returns_first_value_set_unconditionally() {
        let data = MultiValueHandler
            .retrieve_correct_answer(ReturnData::default(), &answer_key())
            .await
            .unwrap();
        match data.correct_answer {
            Some(CorrectAnswer::KeyValues { key_values }) => {
                assert_eq!(key_values.get("answer1"), Some(&json!(true)));
            }
            other => panic!("expected a key-values answer, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_correct_values_is_a_malformed_key() {
        let key = AnswerKey {
            assessment_type: TYPE_TAG.to_string(),
            answers: json!({"correctValues": []}),
            non_recordable: None,
            description: None,
        };
        let err = MultiValueHandler
            .calculate_score_and_feedback(ReturnData::default(), &key, &json!({"answer1": true}))
            .await
            .unwrap_err();
        assert!(matches!(err, CorrectnessError::InvalidAnswerKey { .. }));
    }
}
