mod ids;
mod question;
mod score;
mod session;

pub use ids::{ParseIdError, QuestionId, SessionId};
pub use question::{QuestionBank, QuestionBankError, QuizQuestion};
pub use score::{QuizScore, ScoreError};
pub use session::{COMPLETED_CURSOR, QuizSession, SessionError, SessionState};
