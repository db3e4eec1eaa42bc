use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use civics_core::model::{QuestionId, QuizAttempt, StudyProgress};

use crate::kv::StorageError;

/// Persisted shape of a learner's progress.
///
/// This mirrors the domain `StudyProgress` so adapters store plain JSON
/// without leaking wire concerns into `civics-core`. Field names are
/// camelCase and timestamps are Unix milliseconds; records written by
/// earlier releases of the app keep loading unchanged.
///
/// Both fields tolerate being absent and default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRecord {
    pub mastered_questions: Vec<u32>,
    pub quiz_history: Vec<QuizAttemptRecord>,
}

/// One quiz attempt as stored inside [`ProgressRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttemptRecord {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    pub score: u32,
    pub total_questions: u32,
}

impl QuizAttemptRecord {
    #[must_use]
    pub fn from_attempt(attempt: &QuizAttempt) -> Self {
        Self {
            date: attempt.taken_at(),
            score: attempt.score(),
            total_questions: attempt.total_questions(),
        }
    }

    #[must_use]
    pub fn into_attempt(self) -> QuizAttempt {
        QuizAttempt::new(self.date, self.score, self.total_questions)
    }
}

impl ProgressRecord {
    #[must_use]
    pub fn from_progress(progress: &StudyProgress) -> Self {
        Self {
            mastered_questions: progress.mastered().iter().map(QuestionId::value).collect(),
            quiz_history: progress
                .quiz_history()
                .iter()
                .map(QuizAttemptRecord::from_attempt)
                .collect(),
        }
    }

    /// Convert the record back into domain progress.
    ///
    /// Duplicate mastered ids collapse into the set; history order is kept.
    #[must_use]
    pub fn into_progress(self) -> StudyProgress {
        let mastered: BTreeSet<QuestionId> = self
            .mastered_questions
            .into_iter()
            .map(QuestionId::new)
            .collect();
        let history = self
            .quiz_history
            .into_iter()
            .map(QuizAttemptRecord::into_attempt)
            .collect();
        StudyProgress::from_persisted(mastered, history)
    }

    /// Serialize to the JSON document an adapter stores.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn encode(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|err| StorageError::Serialization(err.to_string()))
    }

    /// Parse a stored JSON document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the document is not a valid
    /// record.
    pub fn decode(raw: &str) -> Result<Self, StorageError> {
        serde_json::from_str(raw).map_err(|err| StorageError::Serialization(err.to_string()))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
