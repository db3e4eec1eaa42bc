use crate::model::{QuizAttempt, StudyProgress};

/// Minutes of study credited for each completed quiz.
const MINUTES_PER_QUIZ: u64 = 10;

/// How many attempts the recent-quizzes view shows.
pub const RECENT_QUIZ_WINDOW: usize = 5;

/// Aggregated progress for the dashboard and progress screens.
///
/// Percentages are whole numbers, rounded half away from zero. The average
/// rounds once over the un-rounded per-attempt percentages; the best score
/// rounds each attempt first and takes the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSummary {
    pub total_questions: usize,
    pub mastered_count: usize,
    pub mastered_percent: u32,
    pub quizzes_taken: usize,
    pub average_score_percent: u32,
    pub best_score_percent: u32,
    pub study_minutes: u64,
}

impl ProgressSummary {
    #[must_use]
    pub fn from_progress(progress: &StudyProgress, total_questions: usize) -> Self {
        let mastered_count = progress.mastered().len();
        let attempts = progress.quiz_history();
        let quizzes_taken = attempts.len();

        let average_score_percent = if attempts.is_empty() {
            0
        } else {
            let sum: f64 = attempts.iter().map(QuizAttempt::percent).sum();
            #[allow(clippy::cast_precision_loss)]
            let count = attempts.len() as f64;
            round_percent(sum / count)
        };
        let best_score_percent = attempts
            .iter()
            .map(|attempt| round_percent(attempt.percent()))
            .max()
            .unwrap_or(0);

        Self {
            total_questions,
            mastered_count,
            mastered_percent: percent_of(mastered_count, total_questions),
            quizzes_taken,
            average_score_percent,
            best_score_percent,
            study_minutes: quizzes_taken as u64 * MINUTES_PER_QUIZ,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent_of(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    round_percent(part as f64 / whole as f64 * 100.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_percent(value: f64) -> u32 {
    value.round() as u32
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, QuizAttempt};
    use crate::time::fixed_now;
    use std::collections::BTreeSet;

    fn build_progress(scores: &[(u32, u32)], mastered: &[u32]) -> StudyProgress {
        let mastered: BTreeSet<QuestionId> =
            mastered.iter().map(|&id| QuestionId::new(id)).collect();
        let attempts = scores
            .iter()
            .map(|&(score, total)| QuizAttempt::new(fixed_now(), score, total))
            .collect();
        StudyProgress::from_persisted(mastered, attempts)
    }

    #[test]
    fn test_summary_of_empty_progress_is_all_zeros() {
        let summary = ProgressSummary::from_progress(&StudyProgress::new(), 100);
        assert_eq!(summary.mastered_count, 0);
        assert_eq!(summary.mastered_percent, 0);
        assert_eq!(summary.quizzes_taken, 0);
        assert_eq!(summary.average_score_percent, 0);
        assert_eq!(summary.best_score_percent, 0);
        assert_eq!(summary.study_minutes, 0);
    }

    #[test]
    fn test_summary_averages_unrounded_percentages() {
        let progress = build_progress(&[(8, 10), (6, 10)], &[]);
        let summary = ProgressSummary::from_progress(&progress, 100);
        assert_eq!(summary.average_score_percent, 70);
        assert_eq!(summary.best_score_percent, 80);
        assert_eq!(summary.quizzes_taken, 2);
        assert_eq!(summary.study_minutes, 20);
    }

    #[test]
    fn test_best_score_rounds_each_attempt_first() {
        // 2/3 is 66.67, which rounds to 67 before the max is taken.
        let progress = build_progress(&[(2, 3), (6, 10)], &[]);
        let summary = ProgressSummary::from_progress(&progress, 100);
        assert_eq!(summary.best_score_percent, 67);
        // Average rounds once: (66.67 + 60) / 2 = 63.33 -> 63.
        assert_eq!(summary.average_score_percent, 63);
    }

    #[test]
    fn test_mastered_percent_rounds() {
        let mastered: Vec<u32> = (1..=33).collect();
        let progress = build_progress(&[], &mastered);
        let summary = ProgressSummary::from_progress(&progress, 100);
        assert_eq!(summary.mastered_count, 33);
        assert_eq!(summary.mastered_percent, 33);

        let one_of_three = build_progress(&[], &[1]);
        let summary = ProgressSummary::from_progress(&one_of_three, 3);
        assert_eq!(summary.mastered_percent, 33);
    }

    #[test]
    fn test_empty_catalog_yields_zero_percent() {
        let progress = build_progress(&[], &[1]);
        let summary = ProgressSummary::from_progress(&progress, 0);
        assert_eq!(summary.mastered_percent, 0);
    }
}
