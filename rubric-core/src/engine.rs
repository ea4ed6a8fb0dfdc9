//! The evaluation and answer-retrieval pipelines.
//!
//! Both engines drive a dispatched handler through a fixed stage sequence,
//! awaiting each stage fully before the next. Any stage failure
//! short-circuits the rest and surfaces as the request's single error; no
//! stage is retried. Requests share nothing, so independent submissions may
//! be processed concurrently.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::config::EngineConfig;
use crate::error::CorrectnessError;
use crate::handler::AssessmentHandler;
use crate::payload::{AnswerKey, EvaluationRequest};
use crate::registry::HandlerRegistry;
use crate::result::{EvaluationResult, RetrievedAnswer, ReturnData};
use rubric_judge::{JudgeClient, JudgeError};

/// Pipeline switches, passed to an engine explicitly at construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Whether the Validating stage runs. Schema validation catches
    /// malformed requests early at the cost of a full payload walk.
    pub validate_schema: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validate_schema: true,
        }
    }
}

/// Drives the full five-stage evaluation pipeline:
/// dispatch, validate, preprocess, score, stats, disclose.
pub struct EvaluationEngine {
    registry: HandlerRegistry,
    config: PipelineConfig,
}

impl EvaluationEngine {
    pub fn new(registry: HandlerRegistry, config: PipelineConfig) -> Self {
        Self { registry, config }
    }

    /// Wire up an engine from loaded configuration, building the HTTP judge
    /// client from its `[judge]` section.
    pub fn from_config(config: &EngineConfig) -> Result<Self, JudgeError> {
        let judge = JudgeClient::new(config.judge.clone())?;
        Ok(Self::new(
            HandlerRegistry::new(Arc::new(judge)),
            config.pipeline(),
        ))
    }

    /// Grade one submission against its answer key.
    ///
    /// Returns the normalized result, or the single error that aborted the
    /// pipeline. There is no partial result on failure.
    pub async fn process_submission(
        &self,
        request: EvaluationRequest,
    ) -> Result<EvaluationResult, CorrectnessError> {
        let assessment_type = request.answer_key.assessment_type.clone();
        debug!(%assessment_type, is_last_attempt = request.is_last_attempt, "Processing submission");

        // Dispatch
        let handler = self
            .registry
            .create_handler(&assessment_type, request.context.clone())?;

        // Validating: answer key and submission are independent, so both
        // checks run concurrently within the stage.
        if self.config.validate_schema {
            validate_payloads(
                handler.as_ref(),
                &request.answer_key,
                Some(&request.student_submission),
            )
            .await
            .inspect_err(|e| error!(%assessment_type, error = %e, "Schema validation failed"))?;
        }

        // Preprocessing
        let data = handler
            .preprocess(
                ReturnData::default(),
                &request.answer_key,
                &request.student_submission,
            )
            .await?;

        // Scoring: for judged types this is where the remote call happens.
        let data = handler
            .calculate_score_and_feedback(data, &request.answer_key, &request.student_submission)
            .await?;

        // Stats: must not fail the pipeline by contract.
        let data = handler
            .calculate_stats(data, &request.student_submission)
            .await;

        // Disclosing
        let data = handler
            .add_correct_answer(data, &request.answer_key, request.is_last_attempt)
            .await?;

        debug!(%assessment_type, correctness = ?data.correctness, "Submission processed");
        data.into_result()
    }
}

/// Drives the reduced dispatch, validate, retrieve pipeline used to fetch
/// the canonical correct answer without a submission.
pub struct AnswerRetrievalEngine {
    registry: HandlerRegistry,
    config: PipelineConfig,
}

impl AnswerRetrievalEngine {
    pub fn new(registry: HandlerRegistry, config: PipelineConfig) -> Self {
        Self { registry, config }
    }

    /// Fetch the canonical correct answer for an answer key.
    pub async fn retrieve_answer(
        &self,
        answer_key: &AnswerKey,
    ) -> Result<RetrievedAnswer, CorrectnessError> {
        let assessment_type = answer_key.assessment_type.clone();
        debug!(%assessment_type, "Retrieving correct answer");

        let handler = self.registry.create_handler(&assessment_type, None)?;

        if self.config.validate_schema {
            validate_payloads(handler.as_ref(), answer_key, None).await?;
        }

        let data = handler
            .retrieve_correct_answer(ReturnData::default(), answer_key)
            .await?;
        Ok(data.into_retrieved())
    }
}

/// Run the Validating stage: the answer key always, the submission when one
/// exists, concurrently. Types without a schema are unchecked.
async fn validate_payloads(
    handler: &dyn AssessmentHandler,
    answer_key: &AnswerKey,
    submission: Option<&Value>,
) -> Result<(), CorrectnessError> {
    let answer_key_value = serde_json::to_value(answer_key)
        .map_err(|e| CorrectnessError::Internal(format!("answer key is not serializable: {e}")))?;

    let validate_answer_key = async {
        match handler.answer_schema() {
            Some(schema) => handler.validate_obj(&answer_key_value, &schema).await,
            None => Ok(()),
        }
    };
    let validate_submission = async {
        match (submission, handler.submission_schema()) {
            (Some(obj), Some(schema)) => handler.validate_obj(obj, &schema).await,
            _ => Ok(()),
        }
    };

    tokio::try_join!(validate_answer_key, validate_submission)?;
    Ok(())
}
