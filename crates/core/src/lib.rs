#![forbid(unsafe_code)]

//! Domain types for a study app covering the 2008 USCIS naturalization
//! civics test: the question catalog plus a learner's progress and the
//! statistics derived from it.

pub mod catalog;
pub mod model;
pub mod stats;
pub mod time;

pub use catalog::{Catalog, CatalogError};
pub use model::{
    Category, PASSING_SCORE, ParseIdError, QUIZ_SIZE, Question, QuestionError, QuestionId,
    QuizAttempt, QuizQuestion, StudyProgress,
};
pub use stats::{ProgressSummary, RECENT_QUIZ_WINDOW};
pub use time::Clock;
