use rand::Rng;
use rand::rng;
use rand::seq::SliceRandom;

use civics_core::catalog::Catalog;
use civics_core::model::{QUIZ_SIZE, Question, QuizQuestion};

/// Wrong options shown beside the correct answer.
const DISTRACTORS_PER_QUESTION: usize = 3;

/// Builds a practice quiz of up to [`QUIZ_SIZE`] randomly drawn questions.
///
/// A catalog always holds at least one question, so the quiz is never
/// empty; it is only shorter than [`QUIZ_SIZE`] when the catalog is.
#[must_use]
pub fn generate_quiz(catalog: &Catalog) -> Vec<QuizQuestion> {
    generate_quiz_with_rng(catalog, &mut rng())
}

/// [`generate_quiz`] with a caller-supplied source of randomness.
#[must_use]
pub fn generate_quiz_with_rng<R: Rng + ?Sized>(
    catalog: &Catalog,
    rng: &mut R,
) -> Vec<QuizQuestion> {
    let mut pool: Vec<&Question> = catalog.iter().collect();
    pool.shuffle(rng);
    pool.truncate(QUIZ_SIZE);

    pool.into_iter()
        .map(|question| build_quiz_question(catalog, question, rng))
        .collect()
}

/// Dresses one catalog question up for multiple choice.
///
/// Distractors are accepted answers of other questions in the same
/// category, excluding anything this question itself accepts. Small
/// categories can yield fewer than [`DISTRACTORS_PER_QUESTION`].
fn build_quiz_question<R: Rng + ?Sized>(
    catalog: &Catalog,
    source: &Question,
    rng: &mut R,
) -> QuizQuestion {
    let correct = source.canonical_answer().to_string();

    let mut distractors: Vec<String> = catalog
        .by_category(source.category())
        .filter(|other| other.id() != source.id())
        .flat_map(|other| other.answers().iter())
        .filter(|answer| !source.answers().contains(*answer))
        .cloned()
        .collect();
    distractors.shuffle(rng);
    distractors.truncate(DISTRACTORS_PER_QUESTION);

    let mut options = Vec::with_capacity(distractors.len() + 1);
    options.push(correct.clone());
    options.extend(distractors);
    options.shuffle(rng);

    QuizQuestion::new(source.clone(), options, correct)
}

/// Counts correct selections by exact string comparison.
///
/// `answers[i]` is the learner's pick for `questions[i]`; `None` and any
/// missing tail entries count as wrong.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn score_quiz(questions: &[QuizQuestion], answers: &[Option<String>]) -> u32 {
    questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| answer.as_deref() == Some(question.correct_answer()))
        .count() as u32
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
