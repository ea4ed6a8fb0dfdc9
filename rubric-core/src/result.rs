//! Result accumulator and outbound result payloads.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CorrectnessError;

/// Per-request result accumulator.
///
/// Starts empty, is threaded through every pipeline stage by value, and is
/// converted into an [`EvaluationResult`] (or [`RetrievedAnswer`]) once the
/// pipeline reaches its final state. Never shared across requests.
#[derive(Debug, Clone, Default)]
pub struct ReturnData {
    /// Binary grading outcome: 0 or 1.
    pub correctness: Option<u8>,
    pub feedback: Option<String>,
    /// Per-submitted-key correctness map (multi-value, incorrect answers).
    pub key_value_feedback: Option<Map<String, Value>>,
    /// Remote judge output (programming exercises).
    pub code_evaluation: Option<CodeEvaluation>,
    /// Signals the caller to perform an out-of-band discussion-system write.
    pub discussions: bool,
    pub topic_id: Option<String>,
    pub author_id: Option<String>,
    pub stats: Option<SubmissionStats>,
    pub correct_answer: Option<CorrectAnswer>,
}

impl ReturnData {
    /// Finish the evaluation pipeline.
    ///
    /// Correctness and stats are set by every handler's scoring and stats
    /// stages; their absence here means a handler broke its contract.
    pub fn into_result(self) -> Result<EvaluationResult, CorrectnessError> {
        let correctness = self.correctness.ok_or_else(|| {
            CorrectnessError::Internal("pipeline finished without a correctness outcome".to_string())
        })?;
        let stats = self.stats.ok_or_else(|| {
            CorrectnessError::Internal("pipeline finished without submission stats".to_string())
        })?;
        Ok(EvaluationResult {
            correctness,
            feedback: self.feedback,
            key_value_feedback: self.key_value_feedback,
            code_evaluation: self.code_evaluation,
            discussions: self.discussions,
            topic_id: self.topic_id,
            author_id: self.author_id,
            stats,
            correct_answer: self.correct_answer,
        })
    }

    /// Finish the answer-retrieval pipeline.
    pub fn into_retrieved(self) -> RetrievedAnswer {
        RetrievedAnswer {
            correct_answer: self.correct_answer,
        }
    }
}

/// The normalized success payload handed back to the caller.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub correctness: u8,
    /// Always present on the wire; null for types without stock feedback.
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_value_feedback: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_evaluation: Option<CodeEvaluation>,
    #[serde(skip_serializing_if = "is_false")]
    pub discussions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    pub stats: SubmissionStats,
    /// Always present on the wire; null unless disclosure policy applies.
    pub correct_answer: Option<CorrectAnswer>,
}

/// The answer-retrieval payload: exactly `{ "correctAnswer": ... }`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedAnswer {
    pub correct_answer: Option<CorrectAnswer>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Type-specific canonical-answer shapes disclosed to the caller.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CorrectAnswer {
    /// Fixed-choice: the winning option key and its feedback.
    Choice { key: String, feedback: String },
    /// Numeric: the correct value, with feedback on evaluation disclosure
    /// but not on plain retrieval.
    Numeric {
        answer: NumericAnswer,
        #[serde(skip_serializing_if = "Option::is_none")]
        feedback: Option<String>,
    },
    /// Multi-value: the first acceptable value set, verbatim.
    KeyValues {
        #[serde(rename = "keyValues")]
        key_values: Map<String, Value>,
    },
    /// Programming exercise: reference solutions from the answer key.
    CodeExamples {
        #[serde(rename = "codeExamples")]
        code_examples: Value,
    },
}

/// Wrapper for the numeric correct value: `{"value": 42.0}`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct NumericAnswer {
    pub value: f64,
}

/// Remote judge output forwarded to the caller unmodified.
///
/// `code_feedback` is always present; the remaining fields only accompany
/// incorrect submissions.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CodeEvaluation {
    pub code_feedback: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighting: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighting_error_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_case: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Analytics payload describing what the student submitted, in the shape
/// downstream ingestion expects.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStats {
    /// Question-type tag, e.g. `"MultipleChoice"`.
    pub assessment_item_question_type: String,
    /// Submitted key, for types where the answer is a key.
    pub answer_id: Option<String>,
    /// Free-text rendition of the submission, for types where it is text.
    pub response: Option<String>,
    /// The student's written entry (discussion types).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_response_text: Option<String>,
    /// Analytics event type code, for types that emit one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_code: Option<String>,
    /// Per-target response-code breakdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<StatsExtensions>,
}

impl SubmissionStats {
    /// Stats with both identifiers null, the baseline most types start from.
    pub fn for_question_type(question_type: &str) -> Self {
        Self {
            assessment_item_question_type: question_type.to_string(),
            answer_id: None,
            response: None,
            item_response_text: None,
            type_code: None,
            extensions: None,
        }
    }
}

/// Structured per-target breakdown attached to stats.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsExtensions {
    #[serde(rename = "Assessment_Item_Question_Type")]
    pub assessment_item_question_type: String,
    #[serde(rename = "Assessment_Item_Response_Code")]
    pub assessment_item_response_code: ResponseCode,
    #[serde(rename = "Student_Response")]
    pub student_response: Vec<TargetResponse>,
}

/// One submitted target in the analytics breakdown.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TargetResponse {
    #[serde(rename = "Target_Id")]
    pub target_id: String,
    #[serde(rename = "Answer_Id")]
    pub answer_id: Option<String>,
    #[serde(rename = "Target_Sub_Question_Response_Code")]
    pub response_code: ResponseCode,
}

/// Correct/Incorrect marker used throughout the analytics breakdown.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ResponseCode {
    Correct,
    Incorrect,
}

impl ResponseCode {
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Self::Correct
        } else {
            Self::Incorrect
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn into_result_requires_correctness() {
        let data = ReturnData {
            stats: Some(SubmissionStats::for_question_type("Numeric")),
            ..Default::default()
        };
        assert!(matches!(
            data.into_result(),
            Err(CorrectnessError::Internal(_))
        ));
    }

    #[test]
    fn into_result_requires_stats() {
        let data = ReturnData {
            correctness: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            data.into_result(),
            Err(CorrectnessError::Internal(_))
        ));
    }

    #[test]
    fn evaluation_result_serializes_nulls_for_feedback_and_answer() {
        let result = ReturnData {
            correctness: Some(1),
            stats: Some(SubmissionStats::for_question_type("AlwaysCorrect")),
            ..Default::default()
        }
        .into_result()
        .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["correctness"], 1);
        assert_eq!(json["feedback"], Value::Null);
        assert_eq!(json["correctAnswer"], Value::Null);
        // side-channel fields absent unless a handler set them
        assert!(json.get("keyValueFeedback").is_none());
        assert!(json.get("codeEvaluation").is_none());
        assert!(json.get("discussions").is_none());
    }

    #[test]
    fn retrieved_answer_serializes_only_correct_answer() {
        let retrieved = ReturnData {
            correct_answer: Some(CorrectAnswer::Numeric {
                answer: NumericAnswer { value: 42.0 },
                feedback: None,
            }),
            ..Default::default()
        }
        .into_retrieved();

        let json = serde_json::to_value(&retrieved).unwrap();
        assert_eq!(json, json!({"correctAnswer": {"answer": {"value": 42.0}}}));
    }

    #[test]
    fn choice_answer_serializes_key_and_feedback() {
        let answer = CorrectAnswer::Choice {
            key: "option000".to_string(),
            feedback: "R0".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&answer).unwrap(),
            json!({"key": "option000", "feedback": "R0"})
        );
    }

    #[test]
    fn key_values_answer_uses_wire_name() {
        let mut set = Map::new();
        set.insert("answer1".to_string(), json!(true));
        set.insert("answer3".to_string(), json!(true));
        let answer = CorrectAnswer::KeyValues { key_values: set };
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["keyValues"]["answer1"], true);
        assert_eq!(json["keyValues"]["answer3"], true);
    }

    #[test]
    fn stats_extensions_use_exact_wire_casing() {
        let extensions = StatsExtensions {
            assessment_item_question_type: "MultiValue".to_string(),
            assessment_item_response_code: ResponseCode::Incorrect,
            student_response: vec![TargetResponse {
                target_id: "true".to_string(),
                answer_id: Some("answer1".to_string()),
                response_code: ResponseCode::Correct,
            }],
        };
        let json = serde_json::to_value(&extensions).unwrap();
        assert_eq!(json["Assessment_Item_Question_Type"], "MultiValue");
        assert_eq!(json["Assessment_Item_Response_Code"], "Incorrect");
        assert_eq!(json["Student_Response"][0]["Target_Id"], "true");
        assert_eq!(json["Student_Response"][0]["Answer_Id"], "answer1");
        assert_eq!(
            json["Student_Response"][0]["Target_Sub_Question_Response_Code"],
            "Correct"
        );
    }

    #[test]
    fn discussion_fields_serialize_when_set() {
        let result = ReturnData {
            correctness: Some(1),
            feedback: Some("You are correct.".to_string()),
            discussions: true,
            topic_id: Some("topic-1".to_string()),
            author_id: Some("author-9".to_string()),
            stats: Some(SubmissionStats::for_question_type("SimpleWriting")),
            ..Default::default()
        }
        .into_result()
        .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["discussions"], true);
        assert_eq!(json["topicId"], "topic-1");
        assert_eq!(json["authorId"], "author-9");
    }
}
