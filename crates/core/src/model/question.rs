use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Errors produced when validating a question.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id must be positive")]
    ZeroId,
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },
    #[error("question {id} has no accepted answers")]
    NoAnswers { id: QuestionId },
    #[error("question {id} has a blank answer entry")]
    BlankAnswer { id: QuestionId },
}

/// Section headings from the official USCIS study guide for the 2008 test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Principles of American Democracy")]
    PrinciplesOfDemocracy,
    #[serde(rename = "System of Government")]
    SystemOfGovernment,
    #[serde(rename = "Rights and Responsibilities")]
    RightsAndResponsibilities,
    #[serde(rename = "Colonial Period and Independence")]
    ColonialPeriod,
    #[serde(rename = "1800s")]
    Eighteenhundreds,
    #[serde(rename = "Recent American History and Other Important Historical Information")]
    RecentHistory,
    #[serde(rename = "Geography")]
    Geography,
    #[serde(rename = "Symbols")]
    Symbols,
    #[serde(rename = "Holidays")]
    Holidays,
}

impl Category {
    /// Every section in study-guide order.
    pub const ALL: [Category; 9] = [
        Category::PrinciplesOfDemocracy,
        Category::SystemOfGovernment,
        Category::RightsAndResponsibilities,
        Category::ColonialPeriod,
        Category::Eighteenhundreds,
        Category::RecentHistory,
        Category::Geography,
        Category::Symbols,
        Category::Holidays,
    ];

    /// Returns the section heading as printed in the study guide.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Category::PrinciplesOfDemocracy => "Principles of American Democracy",
            Category::SystemOfGovernment => "System of Government",
            Category::RightsAndResponsibilities => "Rights and Responsibilities",
            Category::ColonialPeriod => "Colonial Period and Independence",
            Category::Eighteenhundreds => "1800s",
            Category::RecentHistory => {
                "Recent American History and Other Important Historical Information"
            }
            Category::Geography => "Geography",
            Category::Symbols => "Symbols",
            Category::Holidays => "Holidays",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One question from the 2008 USCIS naturalization civics test.
///
/// `answers` lists every response USCIS accepts. The first entry is the
/// canonical one: it is the answer shown on flashcards and the one a quiz
/// treats as correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    #[serde(rename = "question")]
    prompt: String,
    answers: Vec<String>,
    category: Category,
    is_for_65_plus: bool,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns a `QuestionError` when the id is zero, the prompt is empty,
    /// or the answer list is empty or contains a blank entry.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        answers: Vec<String>,
        category: Category,
        is_for_65_plus: bool,
    ) -> Result<Self, QuestionError> {
        let question = Self {
            id,
            prompt: prompt.into(),
            answers,
            category,
            is_for_65_plus,
        };
        question.validate()?;
        Ok(question)
    }

    pub(crate) fn validate(&self) -> Result<(), QuestionError> {
        if self.id.value() == 0 {
            return Err(QuestionError::ZeroId);
        }
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id: self.id });
        }
        if self.answers.is_empty() {
            return Err(QuestionError::NoAnswers { id: self.id });
        }
        if self.answers.iter().any(|a| a.trim().is_empty()) {
            return Err(QuestionError::BlankAnswer { id: self.id });
        }
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    /// Returns the question text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns every accepted answer, canonical answer first.
    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Returns the canonical answer.
    #[must_use]
    pub fn canonical_answer(&self) -> &str {
        self.answers.first().map(String::as_str).unwrap_or_default()
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// True when USCIS marks this question for applicants 65 or older with
    /// 20+ years of permanent residence.
    #[must_use]
    pub fn is_for_65_plus(&self) -> bool {
        self.is_for_65_plus
    }

    /// Case-insensitive match against the prompt, any accepted answer, or
    /// the category heading. A blank query matches everything.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.prompt.to_lowercase().contains(&needle)
            || self
                .answers
                .iter()
                .any(|answer| answer.to_lowercase().contains(&needle))
            || self.category.name().to_lowercase().contains(&needle)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
