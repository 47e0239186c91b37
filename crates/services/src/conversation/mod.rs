mod engine;
mod progress;
mod workflow;

// Public API of the conversation subsystem.
pub use crate::error::ConversationError;
pub use engine::ConversationEngine;
pub use progress::QuizProgress;
pub use workflow::{ConversationService, TurnResult};
