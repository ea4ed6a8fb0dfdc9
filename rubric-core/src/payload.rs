//! Inbound payload types: answer keys, submissions, and request context.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The grading rubric for one question instance.
///
/// Read-only input. The shape of `answers` is defined per handler; it is
/// checked against that handler's schema when validation is enabled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKey {
    /// Type tag selecting the handler, e.g. `"multiplechoice"`.
    pub assessment_type: String,
    /// Type-specific grading data.
    pub answers: Value,
    /// Whether the attempt should be kept out of recorded analytics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_recordable: Option<bool>,
    /// Free-form authoring note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Who is submitting, and in which course. Required by handlers that call
/// an external judge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvalContext {
    pub user_id: String,
    pub course_id: String,
}

/// Identity headers the transport layer forwards alongside a payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestHeaders {
    #[serde(rename = "pi-id")]
    pub pi_id: String,
    #[serde(rename = "course-id")]
    pub course_id: String,
}

impl From<RequestHeaders> for EvalContext {
    fn from(headers: RequestHeaders) -> Self {
        Self {
            user_id: headers.pi_id,
            course_id: headers.course_id,
        }
    }
}

/// A payload optionally wrapped with identity headers.
///
/// Callers that need per-request context send
/// `{ "headers": {...}, "payload": {...} }`; others send the payload bare.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<RequestHeaders>,
    pub payload: T,
}

/// One evaluation request. Created per call, owned by one pipeline
/// invocation, discarded afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub answer_key: AnswerKey,
    /// Type-specific submission: a bare string, a wrapper object, or a
    /// key-to-value map. Handlers define and validate their own shape.
    pub student_submission: Value,
    /// Whether the student has exhausted retries; gates answer disclosure.
    pub is_last_attempt: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EvalContext>,
}

impl EvaluationRequest {
    /// Unwrap an envelope, promoting its headers into the request context
    /// unless the payload already carries one.
    pub fn from_envelope(envelope: Envelope<EvaluationRequest>) -> Self {
        let mut request = envelope.payload;
        if request.context.is_none() {
            request.context = envelope.headers.map(EvalContext::from);
        }
        request
    }
}
