mod ids;
mod progress;
mod question;
mod quiz;

pub use ids::{ParseIdError, QuestionId};
pub use progress::{PASSING_SCORE, QuizAttempt, StudyProgress};
pub use question::{Category, Question, QuestionError};
pub use quiz::{QUIZ_SIZE, QuizQuestion};
