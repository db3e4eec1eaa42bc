use crate::model::question::Question;

/// Number of questions drawn for one practice quiz.
pub const QUIZ_SIZE: usize = 10;

/// A catalog question dressed up for multiple choice: the shuffled options
/// to show, and which of them is correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    question: Question,
    options: Vec<String>,
    correct_answer: String,
}

impl QuizQuestion {
    #[must_use]
    pub fn new(question: Question, options: Vec<String>, correct_answer: String) -> Self {
        Self {
            question,
            options,
            correct_answer,
        }
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    /// Options in presentation order. The correct answer is among them.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Grades a selected option by exact string comparison.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
