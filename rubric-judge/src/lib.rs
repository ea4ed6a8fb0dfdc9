//! rubric-judge: client library for the remote code-judging service.
//!
//! Programming-exercise submissions are not graded locally; they are farmed
//! out to an external judge that compiles/runs the student's code and returns
//! a verdict. This crate provides:
//!
//! - **[`CodeJudge`]** - the trait the correctness engine programs against,
//!   so tests can substitute a canned judge
//! - **[`JudgeClient`]** - the HTTP implementation with keyed-hash request
//!   signing
//! - **[`JudgeVerdict`]** - the verdict payload forwarded into evaluation
//!   results

mod client;
mod error;
mod signature;

pub use client::{
    CHECK_SUBMISSION_OP, CodeJudge, JudgeClient, JudgeConfig, JudgeSubmission, JudgeVerdict,
};
pub use error::JudgeError;
pub use signature::sign_request;
