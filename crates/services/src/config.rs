//! Quiz configuration: the welcome text and the question bank.
//!
//! Loaded from a TOML file shaped like:
//!
//! ```toml
//! welcome_message = "Hi! Let's start."
//!
//! [[questions]]
//! prompt = "What is Python?"
//! answer = "Python"
//! ```

use std::path::Path;

use quiz_core::model::{QuestionBank, QuizQuestion};
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Hello! I'm your Python quiz bot. Answer each question and I'll tell you your score at the end.";

#[derive(Debug, Deserialize)]
struct QuizConfigFile {
    welcome_message: Option<String>,
    questions: Vec<QuizQuestion>,
}

/// Everything the conversation engine needs to run a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    welcome_message: String,
    bank: QuestionBank,
}

impl QuizConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyWelcome` if the welcome text is blank.
    pub fn new(welcome_message: impl Into<String>, bank: QuestionBank) -> Result<Self, ConfigError> {
        let welcome_message = welcome_message.into().trim().to_string();
        if welcome_message.is_empty() {
            return Err(ConfigError::EmptyWelcome);
        }
        Ok(Self {
            welcome_message,
            bank,
        })
    }

    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and `ConfigError::Bank`
    /// when the question list is empty or has blank entries.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: QuizConfigFile = toml::from_str(raw)?;
        let bank = QuestionBank::new(file.questions)?;
        let welcome = file
            .welcome_message
            .unwrap_or_else(|| DEFAULT_WELCOME_MESSAGE.to_string());
        Self::new(welcome, bank)
    }

    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the
    /// errors of [`QuizConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(
            path = %path.display(),
            questions = config.bank.len(),
            "loaded quiz config"
        );
        Ok(config)
    }

    #[must_use]
    pub fn welcome_message(&self) -> &str {
        &self.welcome_message
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            bank: QuestionBank::python_default(),
        }
    }
}
