#![forbid(unsafe_code)]

//! Application services: the persisted study-progress store and the
//! practice-quiz generator.

pub mod progress;
pub mod quiz;

pub use civics_core::Clock;

pub use progress::{PROGRESS_KEY, StudyProgressStore, SyncStatus};
pub use quiz::{generate_quiz, generate_quiz_with_rng, score_quiz};
