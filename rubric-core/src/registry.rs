//! Handler registry: type tag in, fresh handler instance out.

use std::sync::Arc;

use crate::error::CorrectnessError;
use crate::handler::{AssessmentHandler, AssessmentType};
use crate::payload::EvalContext;
use crate::types::{
    AlwaysCorrectHandler, DiscussionsHandler, MultiValueHandler, MultipleChoiceHandler,
    NumericHandler, ProgrammingExerciseHandler,
};
use rubric_judge::CodeJudge;

/// Creates handlers for registered assessment types.
///
/// Registration is static: the set of types is the closed
/// [`AssessmentType`] enum, dispatched in one place. Handlers are
/// constructed fresh per request and never pooled; the registry itself only
/// owns the judge shared by judged exercise handlers.
#[derive(Clone)]
pub struct HandlerRegistry {
    judge: Arc<dyn CodeJudge>,
}

impl HandlerRegistry {
    pub fn new(judge: Arc<dyn CodeJudge>) -> Self {
        Self { judge }
    }

    /// Instantiate the handler for `assessment_type`, optionally
    /// parameterized by per-request context.
    ///
    /// Fails with [`CorrectnessError::UnknownAssessmentType`] before any
    /// pipeline stage runs when the tag is not registered.
    pub fn create_handler(
        &self,
        assessment_type: &str,
        context: Option<EvalContext>,
    ) -> Result<Box<dyn AssessmentHandler>, CorrectnessError> {
        let parsed = AssessmentType::parse(assessment_type).ok_or_else(|| {
            CorrectnessError::UnknownAssessmentType(assessment_type.to_string())
        })?;

        Ok(match parsed {
            AssessmentType::AlwaysCorrect => Box::new(AlwaysCorrectHandler),
            AssessmentType::MultipleChoice => Box::new(MultipleChoiceHandler),
            AssessmentType::Numeric => Box::new(NumericHandler),
            AssessmentType::MultiValue => Box::new(MultiValueHandler),
            AssessmentType::Discussions => Box::new(DiscussionsHandler),
            AssessmentType::ProgrammingExercise => Box::new(ProgrammingExerciseHandler::new(
                Arc::clone(&self.judge),
                context,
            )),
        })
    }
}
