use std::collections::HashSet;
use thiserror::Error;

use crate::model::{Category, Question, QuestionError, QuestionId};

const EMBEDDED_QUESTIONS: &str = include_str!("../data/civics_questions.json");

/// Errors raised while loading or validating the question catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error("duplicate question id {id}")]
    DuplicateId { id: QuestionId },
    #[error("catalog has no questions")]
    Empty,
}

/// The read-only set of study questions.
///
/// Loaded once at startup and shared by every surface; nothing in the app
/// ever edits it.
#[derive(Debug, Clone)]
pub struct Catalog {
    questions: Vec<Question>,
}

impl Catalog {
    /// Loads the catalog bundled with the crate: all 100 questions of the
    /// 2008 naturalization test.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` if the bundled asset fails to parse or
    /// validate. With an intact build this does not happen.
    pub fn load_embedded() -> Result<Self, CatalogError> {
        let questions: Vec<Question> = serde_json::from_str(EMBEDDED_QUESTIONS)?;
        Self::from_questions(questions)
    }

    /// Builds a catalog from explicit questions.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` when the list is empty, a question fails
    /// validation, or two questions share an id.
    pub fn from_questions(questions: Vec<Question>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for question in &questions {
            question.validate()?;
            if !seen.insert(question.id()) {
                return Err(CatalogError::DuplicateId { id: question.id() });
            }
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Questions in catalog order (ascending official numbering for the
    /// bundled asset).
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }

    /// Looks up a question by its official number.
    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// Questions under one study-guide section.
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(move |q| q.category() == category)
    }

    /// Case-insensitive search over prompts, answers, and section headings.
    /// A blank query returns the whole catalog.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.matches_query(query))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn build_question(id: u32, prompt: &str, answer: &str, category: Category) -> Question {
        Question::new(
            QuestionId::new(id),
            prompt,
            vec![answer.to_string()],
            category,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_embedded_catalog_has_all_100_questions() {
        let catalog = Catalog::load_embedded().unwrap();
        assert_eq!(catalog.len(), 100);

        let ids: HashSet<u32> = catalog.iter().map(|q| q.id().value()).collect();
        assert_eq!(ids.len(), 100);
        assert!((1..=100).all(|id| ids.contains(&id)));
    }

    #[test]
    fn test_embedded_catalog_marks_20_senior_questions() {
        let catalog = Catalog::load_embedded().unwrap();
        let senior = catalog.iter().filter(|q| q.is_for_65_plus()).count();
        assert_eq!(senior, 20);
    }

    #[test]
    fn test_embedded_catalog_section_sizes() {
        let catalog = Catalog::load_embedded().unwrap();
        assert_eq!(catalog.by_category(Category::SystemOfGovernment).count(), 35);
        assert_eq!(catalog.by_category(Category::Symbols).count(), 3);
        assert_eq!(catalog.by_category(Category::Holidays).count(), 2);

        let across_sections: usize = Category::ALL
            .iter()
            .map(|&category| catalog.by_category(category).count())
            .sum();
        assert_eq!(across_sections, 100);
    }

    #[test]
    fn test_get_by_official_number() {
        let catalog = Catalog::load_embedded().unwrap();
        let question = catalog.get(QuestionId::new(94)).unwrap();
        assert_eq!(question.canonical_answer(), "Washington, D.C.");
        assert!(catalog.get(QuestionId::new(101)).is_none());
    }

    #[test]
    fn test_search_blank_query_returns_everything() {
        let catalog = Catalog::load_embedded().unwrap();
        assert_eq!(catalog.search("  ").len(), 100);
    }

    #[test]
    fn test_search_finds_flag_questions() {
        let catalog = Catalog::load_embedded().unwrap();
        let hits = catalog.search("flag");
        assert!(hits.iter().any(|q| q.id() == QuestionId::new(96)));
        assert!(hits.iter().any(|q| q.id() == QuestionId::new(97)));
    }

    #[test]
    fn test_from_questions_rejects_duplicates() {
        let questions = vec![
            build_question(1, "first", "a", Category::Geography),
            build_question(1, "second", "b", Category::Geography),
        ];
        let result = Catalog::from_questions(questions);
        assert!(matches!(
            result,
            Err(CatalogError::DuplicateId { id }) if id == QuestionId::new(1)
        ));
    }

    #[test]
    fn test_from_questions_rejects_empty_list() {
        assert!(matches!(
            Catalog::from_questions(vec![]),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_from_questions_rejects_invalid_question() {
        let mut questions = vec![build_question(1, "first", "a", Category::Geography)];
        questions.push(
            // Bypass `Question::new` validation via serde to simulate a bad asset.
            serde_json::from_str(
                r#"{"id":2,"question":"second","answers":[],"category":"Geography","isFor65Plus":false}"#,
            )
            .unwrap(),
        );
        let result = Catalog::from_questions(questions);
        assert!(matches!(
            result,
            Err(CatalogError::Question(QuestionError::NoAnswers { .. }))
        ));
    }
}
