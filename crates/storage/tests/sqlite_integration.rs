use quiz_core::model::{COMPLETED_CURSOR, QuestionId, QuizSession, SessionId, SessionState};
use quiz_core::time::fixed_now;
use storage::repository::{SessionStore, StorageError};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_persists_cursor_and_answers() {
    let repo = connect("memdb_session_roundtrip").await;

    let mut session = QuizSession::new(SessionId::new(1));
    session.record_answer(0, "Python").unwrap();
    session.record_answer(1, "list").unwrap();
    session.set_current_question_id(2).unwrap();
    session.touch(fixed_now());
    repo.save_session(&session).await.unwrap();

    let fetched = repo
        .load_session(SessionId::new(1))
        .await
        .expect("load")
        .expect("session exists");
    assert_eq!(fetched.current_question_id(), Some(2));
    assert_eq!(fetched.answer(QuestionId::new(1)), Some("list"));
    assert_eq!(fetched.updated_at(), Some(fixed_now()));
    assert_eq!(fetched, session);
}

#[tokio::test]
async fn sqlite_save_overwrites_previous_snapshot() {
    let repo = connect("memdb_session_overwrite").await;

    let mut session = QuizSession::new(SessionId::new(5));
    session.record_answer(0, "first").unwrap();
    session.set_current_question_id(1).unwrap();
    repo.save_session(&session).await.unwrap();

    session.record_answer(0, "changed").unwrap();
    session.set_current_question_id(COMPLETED_CURSOR).unwrap();
    repo.save_session(&session).await.unwrap();

    let fetched = repo.load_session(SessionId::new(5)).await.unwrap().unwrap();
    assert_eq!(fetched.state(), SessionState::Completed);
    assert_eq!(fetched.answers().len(), 1);
    assert_eq!(fetched.answer(QuestionId::new(0)), Some("changed"));
}

#[tokio::test]
async fn sqlite_missing_and_deleted_sessions() {
    let repo = connect("memdb_session_delete").await;

    assert!(repo.load_session(SessionId::new(9)).await.unwrap().is_none());
    let err = repo.delete_session(SessionId::new(9)).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    let mut session = QuizSession::new(SessionId::new(9));
    session.record_answer(0, "x").unwrap();
    repo.save_session(&session).await.unwrap();
    repo.delete_session(SessionId::new(9)).await.unwrap();

    assert!(repo.load_session(SessionId::new(9)).await.unwrap().is_none());
}
