//! crates/tutor_core/src/context.rs
//!
//! Best-effort lesson lookup for grounding the tutor's prompt.

use crate::domain::LessonContext;
use crate::ports::{fail_open, LessonStore};
use tracing::debug;

/// Loads the lesson behind `lesson_id`, if any.
///
/// A missing id, a missing row and a failing store all produce `None`.
pub async fn load_lesson_context(
    store: &dyn LessonStore,
    lesson_id: Option<&str>,
) -> Option<LessonContext> {
    let lesson_id = lesson_id?;
    let lesson = fail_open("lesson_store", None, store.get_lesson(lesson_id)).await;
    if lesson.is_none() {
        debug!(lesson_id, "No lesson context available");
    }
    lesson.map(LessonContext::from)
}
