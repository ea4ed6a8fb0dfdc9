//! HTTP client for the remote judge, plus the trait seam used by the engine.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::JudgeError;
use crate::signature::sign_request;

/// Operation name for submission checking, as the judge API spells it.
pub const CHECK_SUBMISSION_OP: &str = "checkSubmission";

/// Connection settings for the judge service.
///
/// Usually loaded from the `[judge]` section of the engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JudgeConfig {
    /// Full endpoint URL of the judge API.
    pub base_url: String,
    /// Caller identity, sent as the `api_key` parameter.
    pub api_key: String,
    /// Shared secret used for request signing. Never sent on the wire.
    pub api_secret: String,
}

/// One submission to be checked by the judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeSubmission {
    /// Identifier of the exercise being attempted.
    pub exercise_id: String,
    /// The student's code, verbatim.
    pub submission: String,
    /// Identity of the submitting student.
    pub user_id: String,
    /// Course the exercise belongs to.
    pub course_id: String,
}

/// Verdict returned by the judge. Treated as ground truth for correctness.
///
/// Everything beyond `correct` and `feedback` is only populated for
/// incorrect submissions, and is forwarded to the caller unmodified.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JudgeVerdict {
    pub correct: bool,
    #[serde(default)]
    pub feedback: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighting: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighting_error_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_case: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Trait for judge implementations.
///
/// The engine programs against this seam so tests can inject a canned
/// verdict instead of a network call.
#[async_trait]
pub trait CodeJudge: Send + Sync {
    /// Check one submission and return the judge's verdict.
    async fn check_submission(&self, request: &JudgeSubmission) -> Result<JudgeVerdict, JudgeError>;
}

/// HTTP implementation of [`CodeJudge`].
///
/// Each call is timestamped and signed; there is no client-side replay
/// window and no retry. A hung judge hangs that one request only.
pub struct JudgeClient {
    http: reqwest::Client,
    config: JudgeConfig,
}

impl JudgeClient {
    /// Build a client from connection settings.
    pub fn new(config: JudgeConfig) -> Result<Self, JudgeError> {
        if config.base_url.is_empty() {
            return Err(JudgeError::Config("base_url is empty".to_string()));
        }
        if config.api_key.is_empty() || config.api_secret.is_empty() {
            return Err(JudgeError::Config(
                "api_key and api_secret are required".to_string(),
            ));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            config,
        })
    }
}

#[async_trait]
impl CodeJudge for JudgeClient {
    async fn check_submission(&self, request: &JudgeSubmission) -> Result<JudgeVerdict, JudgeError> {
        let timestamp = Utc::now().timestamp_millis().to_string();

        // Canonical parameter order for signing: alphabetical by key.
        let signed_params = [
            ("api_key", self.config.api_key.as_str()),
            ("course_id", request.course_id.as_str()),
            ("exercise_id", request.exercise_id.as_str()),
            ("op", CHECK_SUBMISSION_OP),
            ("submission", request.submission.as_str()),
            ("timestamp", timestamp.as_str()),
            ("user_id", request.user_id.as_str()),
        ];
        let api_sig = sign_request(&self.config.api_secret, &signed_params);

        debug!(
            exercise_id = %request.exercise_id,
            user_id = %request.user_id,
            "Sending submission to judge"
        );

        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("op", CHECK_SUBMISSION_OP),
                ("api_key", self.config.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("api_sig", api_sig.as_str()),
                ("exercise_id", request.exercise_id.as_str()),
                ("user_id", request.user_id.as_str()),
                ("course_id", request.course_id.as_str()),
                ("submission", request.submission.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Judge rejected the request");
            return Err(JudgeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let verdict: JudgeVerdict =
            serde_json::from_str(&body).map_err(|e| JudgeError::Decode(e.to_string()))?;

        debug!(correct = verdict.correct, "Judge verdict received");
        Ok(verdict)
    }
}
