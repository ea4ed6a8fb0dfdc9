//! The externally judged programming-exercise type.
//!
//! Correctness is delegated to the remote judge; its verdict is ground
//! truth. The handler forwards the verdict's feedback and error fields into
//! side-channel state unmodified.
//!
//! Disclosure policy differs deliberately from the other types: reference
//! solutions are returned on the last attempt OR on success, so students who
//! solved the exercise can compare style.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::CorrectnessError;
use crate::handler::AssessmentHandler;
use crate::payload::{AnswerKey, EvalContext};
use crate::result::{CodeEvaluation, CorrectAnswer, ReturnData, SubmissionStats};
use crate::schema::{Kind, ObjectSchema, Schema};
use rubric_judge::{CodeJudge, JudgeSubmission, JudgeVerdict};

const QUESTION_TYPE: &str = "ProgrammingExercise";
const TYPE_TAG: &str = "programmingexercise";

pub struct ProgrammingExerciseHandler {
    judge: Arc<dyn CodeJudge>,
    context: Option<EvalContext>,
}

impl ProgrammingExerciseHandler {
    pub fn new(judge: Arc<dyn CodeJudge>, context: Option<EvalContext>) -> Self {
        Self { judge, context }
    }
}

fn exercise_id(answer_key: &AnswerKey) -> Result<&str, CorrectnessError> {
    answer_key
        .answers
        .get("exerciseId")
        .and_then(Value::as_str)
        .ok_or_else(|| CorrectnessError::InvalidAnswerKey {
            assessment_type: TYPE_TAG,
            message: "answers.exerciseId is missing".to_string(),
        })
}

fn entry(submission: &Value) -> Result<&str, CorrectnessError> {
    submission
        .get("entry")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CorrectnessError::Preprocessing("Submission entry is not a string".to_string())
        })
}

/// Reference solutions from the answer key, when the author provided any.
fn code_examples(answer_key: &AnswerKey) -> Option<CorrectAnswer> {
    answer_key
        .answers
        .get("codeExamples")
        .map(|examples| CorrectAnswer::CodeExamples {
            code_examples: examples.clone(),
        })
}

fn code_evaluation(verdict: &JudgeVerdict) -> CodeEvaluation {
    let mut evaluation = CodeEvaluation {
        code_feedback: verdict.feedback.clone(),
        ..Default::default()
    };
    // Correct submissions only get the feedback strings; everything else
    // accompanies a failed verdict.
    if !verdict.correct {
        evaluation.error_type = verdict.error_type.clone();
        evaluation.compiler_error = verdict.compiler_error.clone();
        evaluation.submission = verdict.submission.clone();
        evaluation.highlighting = verdict.highlighting.clone();
        evaluation.highlighting_error_count = verdict.highlighting_error_count;
        evaluation.test_case = verdict.test_case.clone();
        evaluation.api_version = verdict.api_version.clone();
    }
    evaluation
}

#[async_trait]
impl AssessmentHandler for ProgrammingExerciseHandler {
    fn answer_schema(&self) -> Option<Schema> {
        Some(Schema {
            title: "programming exercise answer key",
            kind: Kind::Object(ObjectSchema {
                required: vec!["assessmentType", "answers"],
                properties: vec![
                    ("assessmentType", Kind::StringConst(TYPE_TAG)),
                    (
                        "answers",
                        Kind::Object(ObjectSchema {
                            required: vec!["exerciseId"],
                            properties: vec![("exerciseId", Kind::String)],
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
            title: "programming exercise submission",
            kind: Kind::Object(ObjectSchema {
                required: vec!["entry"],
                properties: vec![("entry", Kind::String)],
                ..Default::default()
            }),
        })
    }

    async fn preprocess(
        &self,
        data: ReturnData,
        _answer_key: &AnswerKey,
        _submission: &Value,
    ) -> Result<ReturnData, CorrectnessError> {
        if self.context.is_none() {
            return Err(CorrectnessError::Preprocessing(
                "Judged submissions require user and course context".to_string(),
            ));
        }
        Ok(data)
    }

    async fn calculate_score_and_feedback(
        &self,
        mut data: ReturnData,
        answer_key: &AnswerKey,
        submission: &Value,
    ) -> Result<ReturnData, CorrectnessError> {
        let context = self.context.as_ref().ok_or_else(|| {
            CorrectnessError::Preprocessing(
                "Judged submissions require user and course context".to_string(),
            )
        })?;
        let request = JudgeSubmission {
            exercise_id: exercise_id(answer_key)?.to_string(),
            submission: entry(submission)?.to_string(),
            user_id: context.user_id.clone(),
            course_id: context.course_id.clone(),
        };

        debug!(exercise_id = %request.exercise_id, "Delegating submission to the remote judge");
        let verdict = self.judge.check_submission(&request).await?;

        data.correctness = Some(if verdict.correct { 1 } else { 0 });
        // The judge's stock feedback string is not surfaced; clients render
        // the structured code evaluation instead.
        data.feedback = None;
        data.code_evaluation = Some(code_evaluation(&verdict));
        Ok(data)
    }

    async fn calculate_stats(&self, mut data: ReturnData, submission: &Value) -> ReturnData {
        let mut stats = SubmissionStats::for_question_type(QUESTION_TYPE);
        stats.response = submission
            .get("entry")
            .and_then(Value::as_str)
            .map(str::to_string);
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
        if is_last_attempt || data.correctness == Some(1) {
            data.correct_answer = code_examples(answer_key);
        }
        Ok(data)
    }

    async fn retrieve_correct_answer(
        &self,
        mut data: ReturnData,
        answer_key: &AnswerKey,
    ) -> Result<ReturnData, CorrectnessError> {
        data.correct_answer = code_examples(answer_key);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubric_judge::JudgeError;
    use serde_json::json;

    /// Judge double returning a canned verdict (or a canned failure).
    struct StaticJudge(Result<JudgeVerdict, fn() -> JudgeError>);

    #[async_trait]
    impl CodeJudge for StaticJudge {
        async fn check_submission(
            &self,
            _request: &JudgeSubmission,
        ) -> Result<JudgeVerdict, JudgeError> {
            match &self.0 {
                Ok(verdict) => Ok(verdict.clone()),
                Err(make_error) => Err(make_error()),
            }
        }
    }

    fn handler_with(verdict: JudgeVerdict) -> ProgrammingExerciseHandler {
        ProgrammingExerciseHandler::new(
            Arc::new(StaticJudge(Ok(verdict))),
            Some(EvalContext {
                user_id: "ffffffff54950ba0e4b0feb658a6dbc6".to_string(),
                course_id: "54950cd1e4b0f74ecb09c358".to_string(),
            }),
        )
    }

    fn answer_key() -> AnswerKey {
        AnswerKey {
            assessment_type: TYPE_TAG.to_string(),
            answers: json!({
                "exerciseId": "00000-10629",
                "codeExamples": [
                    {"code": ["for (total = 0.0, k = 0; k < n; k++)"]}
                ]
            }),
            non_recordable: None,
            description: None,
        }
    }

    fn incorrect_verdict() -> JudgeVerdict {
        JudgeVerdict {
            correct: false,
            feedback: vec!["Remember to accumulate into total.".to_string()],
            error_type: Some("logic".to_string()),
            compiler_error: None,
            submission: Some("total += 0.0;".to_string()),
            highlighting: Some(json!({"line": 1})),
            highlighting_error_count: Some(1),
            test_case: Some(json!({"input": "3 4 5"})),
            api_version: Some("2.1".to_string()),
        }
    }

    #[tokio::test]
    async fn preprocess_requires_context() {
        let handler = ProgrammingExerciseHandler::new(
            Arc::new(StaticJudge(Ok(JudgeVerdict::default()))),
            None,
        );
        let err = handler
            .preprocess(ReturnData::default(), &answer_key(), &json!({"entry": "x;"}))
            .await
            .unwrap_err();
        assert!(matches!(err, CorrectnessError::Preprocessing(_)));
    }

    #[tokio::test]
    async fn correct_verdict_maps_to_one_with_feedback_only() {
        let handler = handler_with(JudgeVerdict {
            correct: true,
            feedback: vec!["Nice solution.".to_string()],
            ..Default::default()
        });
        let data = handler
            .calculate_score_and_feedback(
                ReturnData::default(),
                &answer_key(),
                &json!({"entry": "total = 0.0;"}),
            )
            .await
            .unwrap();

        assert_eq!(data.correctness, Some(1));
        assert_eq!(data.feedback, None);
        let evaluation = data.code_evaluation.unwrap();
        assert_eq!(evaluation.code_feedback, vec!["Nice solution."]);
        assert_eq!(evaluation.error_type, None);
        assert_eq!(evaluation.test_case, None);
    }

    #[tokio::test]
    async fn incorrect_verdict_forwards_error_fields() {
        let handler = handler_with(incorrect_verdict());
        let data = handler
            .calculate_score_and_feedback(
                ReturnData::default(),
                &answer_key(),
                &json!({"entry": "total += 0.0;"}),
            )
            .await
            .unwrap();

        assert_eq!(data.correctness, Some(0));
        let evaluation = data.code_evaluation.unwrap();
        assert_eq!(evaluation.error_type.as_deref(), Some("logic"));
        assert_eq!(evaluation.highlighting_error_count, Some(1));
        assert_eq!(evaluation.api_version.as_deref(), Some("2.1"));
        assert_eq!(evaluation.test_case, Some(json!({"input": "3 4 5"})));
    }

    #[tokio::test]
    async fn judge_failure_fails_the_request() {
        let handler = ProgrammingExerciseHandler::new(
            Arc::new(StaticJudge(Err(|| JudgeError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            }))),
            Some(EvalContext {
                user_id: "user".to_string(),
                course_id: "course".to_string(),
            }),
        );
        let err = handler
            .calculate_score_and_feedback(
                ReturnData::default(),
                &answer_key(),
                &json!({"entry": "x;"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CorrectnessError::RemoteJudge(_)));
    }

    #[tokio::test]
    async fn missing_exercise_id_is_a_malformed_key() {
        let handler = handler_with(JudgeVerdict::default());
        let key = AnswerKey {
            assessment_type: TYPE_TAG.to_string(),
            answers: json!({}),
            non_recordable: None,
            description: None,
        };
        let err = handler
            .calculate_score_and_feedback(ReturnData::default(), &key, &json!({"entry": "x;"}))
            .await
            .unwrap_err();
        assert!(matches!(err, CorrectnessError::InvalidAnswerKey { .. }));
    }

    #[tokio::test]
    async fn stats_carry_the_submitted_code() {
        let handler = handler_with(JudgeVerdict::default());
        let data = handler
            .calculate_stats(ReturnData::default(), &json!({"entry": "total += 0.0;"}))
            .await;
        let stats = data.stats.unwrap();
        assert_eq!(stats.assessment_item_question_type, "ProgrammingExercise");
        assert_eq!(stats.answer_id, None);
        assert_eq!(stats.response.as_deref(), Some("total += 0.0;"));
    }

    #[tokio::test]
    async fn discloses_examples_to_correct_students_with_attempts_left() {
        let handler = handler_with(JudgeVerdict::default());
        let data = ReturnData {
            correctness: Some(1),
            ..Default::default()
        };
        let data = handler
            .add_correct_answer(data, &answer_key(), false)
            .await
            .unwrap();
        assert!(matches!(
            data.correct_answer,
            Some(CorrectAnswer::CodeExamples { .. })
        ));
    }

    #[tokio::test]
    async fn discloses_examples_on_exhausted_incorrect() {
        let handler = handler_with(JudgeVerdict::default());
        let data = ReturnData {
            correctness: Some(0),
            ..Default::default()
        };
        let data = handler
            .add_correct_answer(data, &answer_key(), true)
            .await
            .unwrap();
        assert!(data.correct_answer.is_some());
    }

    #[tokio::test]
    async fn withholds_examples_from_incorrect_students_with_attempts_left() {
        let handler = handler_with(JudgeVerdict::default());
        let data = ReturnData {
            correctness: Some(0),
            ..Default::default()
        };
        let data = handler
            .add_correct_answer(data, &answer_key(), false)
            .await
            .unwrap();
        assert!(data.correct_answer.is_none());
    }

    #[tokio::test]
    async fn disclosure_is_null_without_code_examples() {
        let handler = handler_with(JudgeVerdict::default());
        let key = AnswerKey {
            assessment_type: TYPE_TAG.to_string(),
            answers: json!({"exerciseId": "00000-10001"}),
            non_recordable: None,
            description: None,
        };
        let data = ReturnData {
            correctness: Some(1),
            ..Default::default()
        };
        let data = handler.add_correct_answer(data, &key, true).await.unwrap();
        assert!(data.correct_answer.is_none());
    }

    #[tokio::test]
    async fn retrieval_returns_examples_unconditionally() {
        let handler = handler_with(JudgeVerdict::default());
        let data = handler
            .retrieve_correct_answer(ReturnData::default(), &answer_key())
            .await
            .unwrap();
        match data.correct_answer {
            Some(CorrectAnswer::CodeExamples { code_examples }) => {
                assert!(code_examples.is_array());
            }
            other => panic!("expected code examples, got {other:?}"),
        }
    }
}
