pub mod classifier;
pub mod composer;
pub mod context;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod ports;

pub use classifier::{ClassifierError, IntentClassifier, IntentRule, Tier};
pub use domain::{
    AbuseLogEntry, AbuseType, Intent, IntentClassification, Lesson, LessonContext,
    ModerationResult, TutorRequest, TutorResponse, TutorSessionLogEntry,
};
pub use error::TutorError;
pub use pipeline::{TutorOutcome, TutorPipeline, TutorPorts, TutorSettings};
pub use ports::{
    AbuseLogSink, AuthSessionStore, CompletionRequest, GenerativeTextService, LessonStore,
    ModerationService, PortError, PortResult, SessionLogSink, UserLockStore,
};
