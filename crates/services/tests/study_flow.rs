use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use civics_core::catalog::Catalog;
use civics_core::model::{PASSING_SCORE, QuestionId};
use civics_core::stats::ProgressSummary;
use civics_core::time::fixed_clock;
use services::progress::StudyProgressStore;
use services::quiz::{generate_quiz, generate_quiz_with_rng, score_quiz};
use storage::{InMemoryStore, KeyValueStore};

#[tokio::test]
async fn full_study_session_smoke() {
    let catalog = Catalog::load_embedded().expect("embedded catalog");
    let adapter: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
    let store = StudyProgressStore::new(Arc::clone(&adapter)).with_clock(fixed_clock());
    store.initialize().await;

    // Master a couple of questions from the browse screen.
    store.toggle_mastered(QuestionId::new(94));
    store.toggle_mastered(QuestionId::new(99));

    // Take a quiz and answer everything correctly.
    let mut rng = StdRng::seed_from_u64(42);
    let quiz = generate_quiz_with_rng(&catalog, &mut rng);
    let answers: Vec<Option<String>> = quiz
        .iter()
        .map(|question| Some(question.correct_answer().to_string()))
        .collect();
    let score = score_quiz(&quiz, &answers);
    assert_eq!(score, 10);
    assert!(score >= PASSING_SCORE);

    let attempt = store.add_quiz_result(score, quiz.len() as u32);
    assert!(attempt.is_passing());

    // A second, failing attempt.
    store.add_quiz_result(3, 10);

    store.flush().await;

    let summary = ProgressSummary::from_progress(&store.progress(), catalog.len());
    assert_eq!(summary.mastered_count, 2);
    assert_eq!(summary.mastered_percent, 2);
    assert_eq!(summary.quizzes_taken, 2);
    assert_eq!(summary.average_score_percent, 65);
    assert_eq!(summary.best_score_percent, 100);
    assert_eq!(summary.study_minutes, 20);

    // Fresh store over the same backend sees the same state.
    store.close().await;
    let reloaded = StudyProgressStore::new(Arc::clone(&adapter)).with_clock(fixed_clock());
    reloaded.initialize().await;
    assert_eq!(reloaded.progress(), store.progress());

    // Start over wipes both memory and the backend.
    reloaded.reset_progress();
    reloaded.flush().await;
    let summary = ProgressSummary::from_progress(&reloaded.progress(), catalog.len());
    assert_eq!(summary.mastered_count, 0);
    assert_eq!(summary.quizzes_taken, 0);

    // The default generator draws a full-size quiz as well.
    assert_eq!(generate_quiz(&catalog).len(), 10);
}
