use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{QuizSession, SessionId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{question_id_from_i64, ser, session_id_to_i64};
use crate::repository::{SessionStore, StorageError};

#[async_trait]
impl SessionStore for SqliteRepository {
    async fn load_session(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError> {
        let session_id = session_id_to_i64(id)?;

        let row = sqlx::query(
            r"
                SELECT current_question_id, updated_at
                FROM quiz_sessions
                WHERE id = ?1
            ",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let current_question_id: Option<i64> = row.try_get("current_question_id").map_err(ser)?;
        let updated_at: Option<DateTime<Utc>> = row.try_get("updated_at").map_err(ser)?;

        let answer_rows = sqlx::query(
            r"
                SELECT question_id, answer
                FROM quiz_answers
                WHERE session_id = ?1
                ORDER BY question_id ASC
            ",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut answers = BTreeMap::new();
        for row in answer_rows {
            let question_id = question_id_from_i64(row.try_get("question_id").map_err(ser)?)?;
            let answer: String = row.try_get("answer").map_err(ser)?;
            answers.insert(question_id, answer);
        }

        QuizSession::from_persisted(id, current_question_id, answers, updated_at)
            .map(Some)
            .map_err(ser)
    }

    async fn save_session(&self, session: &QuizSession) -> Result<(), StorageError> {
        let session_id = session_id_to_i64(session.id())?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
                INSERT INTO quiz_sessions (id, current_question_id, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET
                    current_question_id = excluded.current_question_id,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(session_id)
        .bind(session.current_question_id())
        .bind(session.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Answers are rewritten wholesale so the table always mirrors the snapshot.
        sqlx::query("DELETE FROM quiz_answers WHERE session_id = ?1")
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (question_id, answer) in session.answers() {
            sqlx::query(
                r"
                    INSERT INTO quiz_answers (session_id, question_id, answer)
                    VALUES (?1, ?2, ?3)
                ",
            )
            .bind(session_id)
            .bind(i64::from(question_id.value()))
            .bind(answer.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM quiz_sessions WHERE id = ?1")
            .bind(session_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
