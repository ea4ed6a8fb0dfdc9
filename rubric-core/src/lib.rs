//! rubric-core: assessment dispatch and evaluation pipeline.
//!
//! This crate grades student submissions against answer keys and returns a
//! normalized correctness/feedback/analytics payload. The moving parts:
//!
//! - **Handlers** - one [`AssessmentHandler`] implementation per question
//!   type (always-correct, multiple choice, numeric, multi-value,
//!   discussions, judged programming exercises), all speaking the same
//!   multi-stage contract
//! - **Registry** - [`HandlerRegistry`] turns the answer key's type tag into
//!   a fresh handler instance for one request
//! - **Engines** - [`EvaluationEngine`] drives the full validate →
//!   preprocess → score → stats → disclose pipeline;
//!   [`AnswerRetrievalEngine`] runs the reduced validate → retrieve pipeline
//!   used to fetch a canonical answer without a submission
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use rubric_core::{EvaluationEngine, EvaluationRequest, HandlerRegistry, PipelineConfig};
//! use rubric_judge::{JudgeClient, JudgeConfig};
//!
//! async fn example(request: EvaluationRequest) -> Result<(), Box<dyn std::error::Error>> {
//!     let judge = JudgeClient::new(JudgeConfig::default())?;
//!     let registry = HandlerRegistry::new(Arc::new(judge));
//!     let engine = EvaluationEngine::new(registry, PipelineConfig::default());
//!
//!     let result = engine.process_submission(request).await?;
//!     println!("correctness: {}", result.correctness);
//!     Ok(())
//! }
//! ```
//!
//! Each request owns its accumulator and handler instance; independent
//! requests can run concurrently with no shared mutable state.

pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod payload;
pub mod registry;
pub mod result;
pub mod schema;
pub mod types;

// Re-export key types for convenience
pub use config::{ConfigError, EngineConfig, ValidateSchema};
pub use engine::{AnswerRetrievalEngine, EvaluationEngine, PipelineConfig};
pub use error::CorrectnessError;
pub use handler::{AssessmentHandler, AssessmentType};
pub use payload::{AnswerKey, Envelope, EvalContext, EvaluationRequest, RequestHeaders};
pub use registry::HandlerRegistry;
pub use result::{
    CodeEvaluation, CorrectAnswer, EvaluationResult, NumericAnswer, ResponseCode, RetrievedAnswer,
    ReturnData, StatsExtensions, SubmissionStats, TargetResponse,
};
pub use schema::{Schema, ValidationError, Violation};
