use std::sync::Arc;

use quiz_core::model::{QuizSession, SessionId};
use storage::repository::{SessionStore, StorageError};

use super::engine::ConversationEngine;
use super::progress::QuizProgress;
use crate::Clock;
use crate::config::QuizConfig;
use crate::error::ConversationError;

/// Replies for one message plus where the session ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    pub replies: Vec<String>,
    pub progress: QuizProgress,
}

/// Loads sessions by id and runs them through the engine.
#[derive(Clone)]
pub struct ConversationService {
    engine: ConversationEngine,
    store: Arc<dyn SessionStore>,
}

impl ConversationService {
    #[must_use]
    pub fn new(clock: Clock, config: Arc<QuizConfig>, store: Arc<dyn SessionStore>) -> Self {
        let engine = ConversationEngine::new(config, Arc::clone(&store)).with_clock(clock);
        Self { engine, store }
    }

    #[must_use]
    pub fn engine(&self) -> &ConversationEngine {
        &self.engine
    }

    /// Handle a message for the given session, starting a new one if needed.
    ///
    /// # Errors
    ///
    /// Returns `ConversationError::Storage` only if the session cannot be
    /// loaded; everything after that is reported through the replies.
    pub async fn handle_message(
        &self,
        session_id: SessionId,
        message: &str,
    ) -> Result<TurnResult, ConversationError> {
        let mut session = self
            .store
            .load_session(session_id)
            .await?
            .unwrap_or_else(|| QuizSession::new(session_id));

        let replies = self.engine.generate_responses(message, &mut session).await;
        Ok(TurnResult {
            replies,
            progress: self.engine.progress(&session),
        })
    }

    /// Current progress for a session; a session never seen counts as not started.
    ///
    /// # Errors
    ///
    /// Returns `ConversationError::Storage` if the session cannot be loaded.
    pub async fn progress(&self, session_id: SessionId) -> Result<QuizProgress, ConversationError> {
        let session = self
            .store
            .load_session(session_id)
            .await?
            .unwrap_or_else(|| QuizSession::new(session_id));
        Ok(self.engine.progress(&session))
    }

    /// Forget a session so the next message starts the quiz over.
    ///
    /// Returns `false` if there was no stored session.
    ///
    /// # Errors
    ///
    /// Returns `ConversationError::Storage` for backend failures.
    pub async fn reset(&self, session_id: SessionId) -> Result<bool, ConversationError> {
        match self.store.delete_session(session_id).await {
            Ok(()) => {
                tracing::info!(%session_id, "session reset");
                Ok(true)
            }
            Err(StorageError::NotFound) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
