#![forbid(unsafe_code)]

pub mod config;
pub mod conversation;
pub mod error;

pub use quiz_core::Clock;

pub use config::{DEFAULT_WELCOME_MESSAGE, QuizConfig};
pub use conversation::{ConversationEngine, ConversationService, QuizProgress, TurnResult};
pub use error::{ConfigError, ConversationError, ErrorKind};
