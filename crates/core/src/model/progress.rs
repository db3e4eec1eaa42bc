use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::model::ids::QuestionId;

/// Minimum correct answers (out of [`crate::model::QUIZ_SIZE`]) to pass a
/// practice quiz. Mirrors the real interview, where 6 of 10 passes.
pub const PASSING_SCORE: u32 = 6;

/// One completed practice quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    taken_at: DateTime<Utc>,
    score: u32,
    total_questions: u32,
}

impl QuizAttempt {
    #[must_use]
    pub fn new(taken_at: DateTime<Utc>, score: u32, total_questions: u32) -> Self {
        Self {
            taken_at,
            score,
            total_questions,
        }
    }

    #[must_use]
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    /// Score as a percentage of the questions asked.
    ///
    /// Callers ensure `total_questions` is never zero; a quiz always asks at
    /// least one question.
    #[must_use]
    pub fn percent(&self) -> f64 {
        f64::from(self.score) / f64::from(self.total_questions) * 100.0
    }

    /// True when the attempt meets [`PASSING_SCORE`].
    #[must_use]
    pub fn is_passing(&self) -> bool {
        self.score >= PASSING_SCORE
    }
}

/// Everything the app remembers about a learner.
///
/// Mastered questions form a set (toggling twice restores the original
/// state); quiz attempts form an append-only history in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudyProgress {
    mastered: BTreeSet<QuestionId>,
    quiz_history: Vec<QuizAttempt>,
}

impl StudyProgress {
    /// Creates empty progress, the state of a brand-new learner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds progress from persisted parts.
    #[must_use]
    pub fn from_persisted(
        mastered: BTreeSet<QuestionId>,
        quiz_history: Vec<QuizAttempt>,
    ) -> Self {
        Self {
            mastered,
            quiz_history,
        }
    }

    #[must_use]
    pub fn mastered(&self) -> &BTreeSet<QuestionId> {
        &self.mastered
    }

    #[must_use]
    pub fn quiz_history(&self) -> &[QuizAttempt] {
        &self.quiz_history
    }

    #[must_use]
    pub fn is_mastered(&self, id: QuestionId) -> bool {
        self.mastered.contains(&id)
    }

    /// Flips mastery for one question and returns the new membership:
    /// `true` when the question is now mastered.
    pub fn toggle_mastered(&mut self, id: QuestionId) -> bool {
        if self.mastered.remove(&id) {
            false
        } else {
            self.mastered.insert(id);
            true
        }
    }

    /// Appends a finished quiz to the history.
    pub fn record_attempt(&mut self, attempt: QuizAttempt) {
        self.quiz_history.push(attempt);
    }

    /// The most recent `limit` attempts, oldest of the window first.
    #[must_use]
    pub fn recent_attempts(&self, limit: usize) -> &[QuizAttempt] {
        let start = self.quiz_history.len().saturating_sub(limit);
        &self.quiz_history[start..]
    }

    /// Clears mastery and history back to the brand-new state.
    pub fn reset(&mut self) {
        self.mastered.clear();
        self.quiz_history.clear();
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{fixed_clock, fixed_now};
    use chrono::Duration;

    fn build_attempt(score: u32) -> QuizAttempt {
        QuizAttempt::new(fixed_now(), score, 10)
    }

    #[test]
    fn test_toggle_mastered_adds_then_removes() {
        let mut progress = StudyProgress::new();
        let id = QuestionId::new(27);

        assert!(progress.toggle_mastered(id));
        assert!(progress.is_mastered(id));

        assert!(!progress.toggle_mastered(id));
        assert!(!progress.is_mastered(id));
        assert!(progress.mastered().is_empty());
    }

    #[test]
    fn test_toggle_twice_restores_original_state() {
        let mut progress = StudyProgress::new();
        progress.toggle_mastered(QuestionId::new(5));
        let before = progress.clone();

        progress.toggle_mastered(QuestionId::new(9));
        progress.toggle_mastered(QuestionId::new(9));
        assert_eq!(progress, before);
    }

    #[test]
    fn test_toggle_walk_over_two_ids() {
        let mut progress = StudyProgress::new();

        progress.toggle_mastered(QuestionId::new(7));
        assert_eq!(progress.mastered().len(), 1);

        progress.toggle_mastered(QuestionId::new(12));
        assert!(progress.is_mastered(QuestionId::new(7)));
        assert!(progress.is_mastered(QuestionId::new(12)));

        progress.toggle_mastered(QuestionId::new(7));
        assert!(!progress.is_mastered(QuestionId::new(7)));
        assert!(progress.is_mastered(QuestionId::new(12)));
    }

    #[test]
    fn test_record_attempt_appends_in_order() {
        let mut progress = StudyProgress::new();
        progress.record_attempt(build_attempt(4));
        progress.record_attempt(build_attempt(8));

        let scores: Vec<u32> = progress.quiz_history().iter().map(QuizAttempt::score).collect();
        assert_eq!(scores, vec![4, 8]);
    }

    #[test]
    fn test_recent_attempts_returns_tail() {
        let mut progress = StudyProgress::new();
        for score in 0..7 {
            progress.record_attempt(build_attempt(score));
        }

        let recent: Vec<u32> = progress
            .recent_attempts(5)
            .iter()
            .map(QuizAttempt::score)
            .collect();
        assert_eq!(recent, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_recent_attempts_with_short_history() {
        let mut progress = StudyProgress::new();
        progress.record_attempt(build_attempt(3));
        assert_eq!(progress.recent_attempts(5).len(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut progress = StudyProgress::new();
        progress.toggle_mastered(QuestionId::new(1));
        progress.record_attempt(build_attempt(10));

        progress.reset();
        assert_eq!(progress, StudyProgress::new());
    }

    #[test]
    fn test_attempt_percent() {
        let attempt = QuizAttempt::new(fixed_now(), 7, 10);
        assert!((attempt.percent() - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_attempt_passing_boundary() {
        assert!(build_attempt(6).is_passing());
        assert!(!build_attempt(5).is_passing());
    }

    #[test]
    fn test_attempt_taken_at_preserved() {
        let mut clock = fixed_clock();
        clock.advance(Duration::minutes(90));

        let attempt = QuizAttempt::new(clock.now(), 9, 10);
        assert_eq!(attempt.taken_at(), fixed_now() + Duration::minutes(90));
    }
}
