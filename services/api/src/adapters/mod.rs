pub mod db;
pub mod moderation;
pub mod tutor_llm;

pub use db::DbAdapter;
pub use moderation::OpenAiModerationAdapter;
pub use tutor_llm::OpenAiTutorAdapter;
