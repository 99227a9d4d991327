//! crates/tutor_core/src/pipeline.rs
//!
//! The tutor request pipeline: abuse gate, intent classification, lesson
//! context, moderation and response composition, in that order.

use crate::classifier::IntentClassifier;
use crate::composer::{compose_guided_response, Generation};
use crate::context::load_lesson_context;
use crate::domain::{
    AbuseLogEntry, AbuseType, Intent, IntentClassification, ModerationResult, TutorRequest,
    TutorResponse, TutorSessionLogEntry,
};
use crate::error::TutorError;
use crate::ports::{
    fail_open, with_timeout, AbuseLogSink, GenerativeTextService, LessonStore, ModerationService,
    SessionLogSink, UserLockStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Time limits for the outbound calls that are allowed to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TutorSettings {
    pub moderation_timeout: Duration,
    pub generation_timeout: Duration,
}

impl Default for TutorSettings {
    fn default() -> Self {
        Self {
            moderation_timeout: Duration::from_secs(3),
            generation_timeout: Duration::from_secs(20),
        }
    }
}

/// The external collaborators the pipeline talks to.
#[derive(Clone)]
pub struct TutorPorts {
    pub lock_store: Arc<dyn UserLockStore>,
    pub abuse_log: Arc<dyn AbuseLogSink>,
    pub lessons: Arc<dyn LessonStore>,
    pub moderation: Arc<dyn ModerationService>,
    pub generator: Arc<dyn GenerativeTextService>,
    pub session_log: Arc<dyn SessionLogSink>,
}

/// How a request was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum TutorOutcome {
    /// The user is locked out of AI features.
    Locked(TutorResponse),
    Handled(TutorResponse),
}

impl TutorOutcome {
    pub fn response(&self) -> &TutorResponse {
        match self {
            TutorOutcome::Locked(response) | TutorOutcome::Handled(response) => response,
        }
    }

    pub fn into_response(self) -> TutorResponse {
        match self {
            TutorOutcome::Locked(response) | TutorOutcome::Handled(response) => response,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, TutorOutcome::Locked(_))
    }
}

pub struct TutorPipeline {
    ports: TutorPorts,
    classifier: IntentClassifier,
    settings: TutorSettings,
}

impl TutorPipeline {
    pub fn new(ports: TutorPorts, classifier: IntentClassifier, settings: TutorSettings) -> Self {
        Self {
            ports,
            classifier,
            settings,
        }
    }

    /// Pipeline with the built-in rule table.
    pub fn standard(ports: TutorPorts, settings: TutorSettings) -> Result<Self, TutorError> {
        Ok(Self::new(ports, IntentClassifier::standard()?, settings))
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// Runs one validated request to completion.
    ///
    /// Only a failing lock store surfaces as an error; every later stage
    /// recovers on its own.
    pub async fn handle(
        &self,
        user_id: Uuid,
        request: &TutorRequest,
    ) -> Result<TutorOutcome, TutorError> {
        // --- 1. Abuse Gate ---
        if self.ports.lock_store.is_user_locked(user_id).await? {
            info!(%user_id, outcome = "locked", "AI tutor request refused");
            return Ok(TutorOutcome::Locked(TutorResponse::locked()));
        }

        // --- 2. Intent Classification ---
        let classification = self
            .classifier
            .classify(request.question(), request.quiz_context());
        debug!(
            %user_id,
            question = request.question(),
            intent = %classification.intent,
            confidence = classification.confidence,
            "Question classified"
        );

        // --- 3. Lesson Context ---
        let context =
            load_lesson_context(self.ports.lessons.as_ref(), request.lesson_id()).await;

        // --- 4. Moderation ---
        let moderation = fail_open(
            "moderation",
            ModerationResult::clear(),
            with_timeout(
                self.settings.moderation_timeout,
                self.ports.moderation.moderate(request.question()),
            ),
        )
        .await;

        if moderation.flagged || classification.intent == Intent::Inappropriate {
            self.record_abuse(user_id, AbuseType::InappropriateContent).await;
            info!(
                %user_id,
                outcome = "deflected",
                categories = ?moderation.categories,
                "Inappropriate content blocked"
            );
            return Ok(TutorOutcome::Handled(TutorResponse::moderation_deflection()));
        }

        // --- 5. Response Composition ---
        let response = match classification.intent {
            Intent::CheatAttempt => {
                self.record_abuse(user_id, AbuseType::CheatAttempt).await;
                info!(
                    %user_id,
                    outcome = "redirected",
                    confidence = classification.confidence,
                    "Cheat attempt redirected"
                );
                TutorResponse::cheat_redirect()
            }
            Intent::Learn | Intent::General | Intent::Inappropriate => {
                let (response, generation) = compose_guided_response(
                    self.ports.generator.as_ref(),
                    request.question(),
                    classification.intent,
                    context.as_ref(),
                    self.settings.generation_timeout,
                )
                .await;
                let outcome = match generation {
                    Generation::Generated => "answered",
                    Generation::Degraded => "degraded",
                };
                info!(
                    %user_id,
                    outcome,
                    generation = ?generation,
                    intent = %classification.intent,
                    confidence = classification.confidence,
                    "AI tutor request handled"
                );
                response
            }
        };

        let logged_text = response
            .explanation
            .clone()
            .or_else(|| response.message.clone())
            .unwrap_or_default();
        self.record_session(user_id, request, classification, logged_text, &moderation)
            .await;

        Ok(TutorOutcome::Handled(response))
    }

    async fn record_abuse(&self, user_id: Uuid, abuse_type: AbuseType) {
        let entry = AbuseLogEntry::new(user_id, abuse_type);
        if let Err(e) = self.ports.abuse_log.log_abuse(entry).await {
            error!(%user_id, abuse_type = abuse_type.as_str(), error = %e, "Failed to write abuse log");
        }
    }

    async fn record_session(
        &self,
        user_id: Uuid,
        request: &TutorRequest,
        intent_classification: IntentClassification,
        response: String,
        moderation: &ModerationResult,
    ) {
        let entry = TutorSessionLogEntry {
            user_id,
            lesson_id: request.lesson_id().map(str::to_string),
            question: request.question().to_string(),
            intent_classification,
            response,
            quiz_context: request.quiz_context(),
            moderation_flags: moderation.flags(),
        };
        if let Err(e) = self.ports.session_log.log_session(entry).await {
            error!(%user_id, error = %e, "Failed to write tutor session log");
        }
    }
}
