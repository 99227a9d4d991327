//! crates/tutor_core/src/error.rs
//!
//! Errors that escape the tutor pipeline. Anything recoverable is handled
//! inside its own stage and never shows up here.

use crate::classifier::ClassifierError;
use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    /// The question was missing or only whitespace.
    #[error("Question is required")]
    EmptyQuestion,

    /// A collaborator the pipeline cannot proceed without failed.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
}
