use std::fmt;
use std::io::{self, BufRead, Write as _};
use std::sync::Arc;

use civics_core::catalog::Catalog;
use civics_core::model::{Category, PASSING_SCORE, QUIZ_SIZE, Question, QuestionId, QuizAttempt};
use civics_core::stats::{ProgressSummary, RECENT_QUIZ_WINDOW};
use services::progress::{StudyProgressStore, SyncStatus};
use services::quiz::{generate_quiz, score_quiz};
use storage::SqliteStore;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidQuestionId { raw: String },
    InvalidCategory { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidQuestionId { raw } => {
                write!(f, "invalid question id: {raw} (expected 1-100)")
            }
            ArgsError::InvalidCategory { raw } => write!(f, "unknown category: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  civics questions  [--db <sqlite_url>] [--search <text>] [--category <name>] [--sixty-five-plus]");
    eprintln!("  civics flashcards [--db <sqlite_url>] [--category <name>]");
    eprintln!("  civics quiz       [--db <sqlite_url>]");
    eprintln!("  civics progress   [--db <sqlite_url>]");
    eprintln!("  civics master     [--db <sqlite_url>] <question-id> [<question-id>...]");
    eprintln!("  civics reset      [--db <sqlite_url>] [--yes]");
    eprintln!();
    eprintln!("Without a subcommand, `civics` shows the progress overview.");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://civics.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CIVICS_DB_URL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Questions,
    Flashcards,
    Quiz,
    Progress,
    Master,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "questions" => Some(Self::Questions),
            "flashcards" => Some(Self::Flashcards),
            "quiz" => Some(Self::Quiz),
            "progress" => Some(Self::Progress),
            "master" => Some(Self::Master),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    search: Option<String>,
    category: Option<Category>,
    sixty_five_plus_only: bool,
    ids: Vec<QuestionId>,
    assume_yes: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("CIVICS_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://civics.sqlite3".into(), normalize_sqlite_url),
            search: None,
            category: None,
            sixty_five_plus_only: false,
            ids: Vec::new(),
            assume_yes: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--search" => {
                    parsed.search = Some(require_value(args, "--search")?);
                }
                "--category" => {
                    let value = require_value(args, "--category")?;
                    parsed.category = Some(parse_category(&value)?);
                }
                "--sixty-five-plus" => {
                    parsed.sixty_five_plus_only = true;
                }
                "--yes" => {
                    parsed.assume_yes = true;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => {
                    let id = arg
                        .parse::<QuestionId>()
                        .map_err(|_| ArgsError::InvalidQuestionId { raw: arg.clone() })?;
                    parsed.ids.push(id);
                }
            }
        }

        Ok(parsed)
    }
}

fn parse_category(raw: &str) -> Result<Category, ArgsError> {
    let needle = raw.trim().to_lowercase();
    Category::ALL
        .into_iter()
        .find(|category| category.name().to_lowercase() == needle)
        .ok_or_else(|| ArgsError::InvalidCategory {
            raw: raw.to_string(),
        })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

// ─── Interactive helpers ───────────────────────────────────────────────────────

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn next_index(current: usize, len: usize) -> usize {
    (current + 1) % len
}

fn previous_index(current: usize, len: usize) -> usize {
    (current + len - 1) % len
}

fn mastered_marker(mastered: bool) -> &'static str {
    if mastered { "[x]" } else { "[ ]" }
}

fn sync_status_label(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Idle => "idle",
        SyncStatus::Pending => "pending",
        SyncStatus::Synced => "synced",
        SyncStatus::Failed => "failed",
    }
}

fn format_attempt(attempt: &QuizAttempt) -> String {
    let verdict = if attempt.is_passing() { "passed" } else { "failed" };
    format!(
        "{}  {}/{} ({:.0}%)  {}",
        attempt.taken_at().format("%Y-%m-%d %H:%M"),
        attempt.score(),
        attempt.total_questions(),
        attempt.percent(),
        verdict
    )
}

// ─── Commands ──────────────────────────────────────────────────────────────────

fn run_questions(catalog: &Catalog, store: &StudyProgressStore, args: &Args) {
    let mut rows: Vec<&Question> = catalog.search(args.search.as_deref().unwrap_or(""));
    if let Some(category) = args.category {
        rows.retain(|q| q.category() == category);
    }
    if args.sixty_five_plus_only {
        rows.retain(|q| q.is_for_65_plus());
    }

    if rows.is_empty() {
        println!("No questions match.");
        return;
    }

    for question in &rows {
        let senior = if question.is_for_65_plus() { " [65+]" } else { "" };
        println!(
            "{:>4}. {} {}",
            question.id(),
            mastered_marker(store.is_mastered(question.id())),
            question.prompt()
        );
        println!(
            "        {}  [{}]{}",
            question.canonical_answer(),
            question.category(),
            senior
        );
    }

    let mastered = rows
        .iter()
        .filter(|q| store.is_mastered(q.id()))
        .count();
    println!();
    println!("{mastered} of {} mastered.", rows.len());
}

fn run_flashcards(
    catalog: &Catalog,
    store: &StudyProgressStore,
    args: &Args,
) -> io::Result<()> {
    let deck: Vec<&Question> = match args.category {
        Some(category) => catalog.by_category(category).collect(),
        None => catalog.iter().collect(),
    };
    if deck.is_empty() {
        println!("No cards in that section.");
        return Ok(());
    }

    println!("Enter flips the card; n = next, p = previous, m = toggle mastered, q = quit.");
    let mut index = 0;
    let mut revealed = false;
    loop {
        let question = deck[index];
        if revealed {
            println!("\nAnswer: {}", question.canonical_answer());
            for also in &question.answers()[1..] {
                println!("Also accepted: {also}");
            }
        } else {
            println!(
                "\nCard {}/{} [{}] {}",
                index + 1,
                deck.len(),
                question.category(),
                mastered_marker(store.is_mastered(question.id()))
            );
            println!("{}", question.prompt());
        }

        match read_line("> ")?.as_str() {
            "" => revealed = !revealed,
            "n" => {
                index = next_index(index, deck.len());
                revealed = false;
            }
            "p" => {
                index = previous_index(index, deck.len());
                revealed = false;
            }
            "m" => {
                let now_mastered = store.toggle_mastered(question.id());
                println!(
                    "Question {} is {}.",
                    question.id(),
                    if now_mastered { "mastered" } else { "no longer mastered" }
                );
            }
            "q" => return Ok(()),
            other => println!("Unrecognized input: {other:?}"),
        }
    }
}

fn run_quiz(catalog: &Catalog, store: &StudyProgressStore) -> io::Result<()> {
    let quiz = generate_quiz(catalog);
    let mut answers: Vec<Option<String>> = Vec::with_capacity(quiz.len());

    for (number, quiz_question) in quiz.iter().enumerate() {
        println!(
            "\nQuestion {}/{}: {}",
            number + 1,
            quiz.len(),
            quiz_question.question().prompt()
        );
        for (option_number, option) in quiz_question.options().iter().enumerate() {
            println!("  {}) {}", option_number + 1, option);
        }

        loop {
            let input = read_line("Your answer (number, Enter to skip): ")?;
            if input.is_empty() {
                answers.push(None);
                break;
            }
            match input.parse::<usize>() {
                Ok(choice) if (1..=quiz_question.options().len()).contains(&choice) => {
                    answers.push(Some(quiz_question.options()[choice - 1].clone()));
                    break;
                }
                _ => println!(
                    "Pick a number between 1 and {}.",
                    quiz_question.options().len()
                ),
            }
        }
    }

    let score = score_quiz(&quiz, &answers);
    let attempt = store.add_quiz_result(score, quiz.len() as u32);

    println!();
    println!(
        "Score: {}/{} ({:.0}%)",
        attempt.score(),
        attempt.total_questions(),
        attempt.percent()
    );
    if attempt.is_passing() {
        println!("You passed! The interview asks up to {QUIZ_SIZE} questions and {PASSING_SCORE} correct answers pass.");
    } else {
        println!("Keep studying: {PASSING_SCORE} of {QUIZ_SIZE} passes.");
    }

    let missed: Vec<(&str, &str)> = quiz
        .iter()
        .zip(&answers)
        .filter(|(question, answer)| answer.as_deref() != Some(question.correct_answer()))
        .map(|(question, _)| (question.question().prompt(), question.correct_answer()))
        .collect();
    if !missed.is_empty() {
        println!("\nWorth another look:");
        for (prompt, correct) in missed {
            println!("  {prompt}");
            println!("    correct: {correct}");
        }
    }

    Ok(())
}

fn run_progress(catalog: &Catalog, store: &StudyProgressStore) {
    let progress = store.progress();
    let summary = ProgressSummary::from_progress(&progress, catalog.len());

    println!(
        "Questions mastered: {}/{} ({}%)",
        summary.mastered_count, summary.total_questions, summary.mastered_percent
    );
    println!("Quizzes taken:      {}", summary.quizzes_taken);
    println!("Average score:      {}%", summary.average_score_percent);
    println!("Best score:         {}%", summary.best_score_percent);
    println!("Study time:         about {} minutes", summary.study_minutes);
    println!("Sync status:        {}", sync_status_label(store.sync_status()));

    let recent = progress.recent_attempts(RECENT_QUIZ_WINDOW);
    if !recent.is_empty() {
        println!("\nRecent quizzes (newest first):");
        for attempt in recent.iter().rev() {
            println!("  {}", format_attempt(attempt));
        }
    }
}

fn run_master(catalog: &Catalog, store: &StudyProgressStore, ids: &[QuestionId]) {
    if ids.is_empty() {
        println!("Pass one or more question ids, e.g. `civics master 94 99`.");
        return;
    }
    for &id in ids {
        match catalog.get(id) {
            Some(question) => {
                let now_mastered = store.toggle_mastered(id);
                println!(
                    "Question {} is {}: {}",
                    id,
                    if now_mastered { "mastered" } else { "no longer mastered" },
                    question.prompt()
                );
            }
            None => println!("Question {id} does not exist; ids run 1-100."),
        }
    }
}

fn run_reset(store: &StudyProgressStore, assume_yes: bool) -> io::Result<()> {
    if !assume_yes {
        let confirmation = read_line("This deletes all saved progress. Type 'yes' to continue: ")?;
        if confirmation != "yes" {
            println!("Nothing deleted.");
            return Ok(());
        }
    }
    store.reset_progress();
    println!("Progress cleared.");
    Ok(())
}

// ─── Entry point ───────────────────────────────────────────────────────────────

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: show the progress overview when no subcommand is given.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Progress,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Progress,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let catalog = Catalog::load_embedded()?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay free of file handling.
    prepare_sqlite_file(&args.db_url)?;
    let adapter = Arc::new(SqliteStore::open(&args.db_url).await?);
    let store = StudyProgressStore::new(adapter);
    store.initialize().await;

    match cmd {
        Command::Questions => run_questions(&catalog, &store, &args),
        Command::Flashcards => run_flashcards(&catalog, &store, &args)?,
        Command::Quiz => run_quiz(&catalog, &store)?,
        Command::Progress => run_progress(&catalog, &store),
        Command::Master => run_master(&catalog, &store, &args.ids),
        Command::Reset => run_reset(&store, args.assume_yes)?,
    }

    store.close().await;
    if store.sync_status() == SyncStatus::Failed {
        eprintln!("warning: some progress could not be saved");
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_string());
        Args::parse(&mut iter)
    }

    #[test]
    fn test_parse_defaults() {
        let args = parse(&[]).unwrap();
        assert!(args.search.is_none());
        assert!(args.category.is_none());
        assert!(!args.sixty_five_plus_only);
        assert!(args.ids.is_empty());
        assert!(!args.assume_yes);
    }

    #[test]
    fn test_parse_reads_flags_and_ids() {
        let args = parse(&[
            "--db",
            "sqlite::memory:",
            "--search",
            "flag",
            "--sixty-five-plus",
            "94",
            "99",
        ])
        .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.search.as_deref(), Some("flag"));
        assert!(args.sixty_five_plus_only);
        assert_eq!(args.ids, vec![QuestionId::new(94), QuestionId::new(99)]);
    }

    #[test]
    fn test_parse_rejects_unknown_flag() {
        assert!(matches!(
            parse(&["--bogus"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_question_id() {
        assert!(matches!(
            parse(&["ninety-four"]),
            Err(ArgsError::InvalidQuestionId { .. })
        ));
    }

    #[test]
    fn test_parse_category_is_case_insensitive() {
        assert_eq!(parse_category("geography").unwrap(), Category::Geography);
        assert_eq!(parse_category("1800s").unwrap(), Category::Eighteenhundreds);
        assert!(parse_category("astronomy").is_err());
    }

    #[test]
    fn test_card_navigation_wraps_around() {
        assert_eq!(next_index(99, 100), 0);
        assert_eq!(previous_index(0, 100), 99);
        assert_eq!(next_index(0, 100), 1);
        assert_eq!(previous_index(50, 100), 49);
    }

    #[test]
    fn test_normalize_sqlite_url_passes_through_full_urls() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/x.sqlite3".into()),
            "sqlite:///tmp/x.sqlite3"
        );
    }

    #[test]
    fn test_normalize_sqlite_url_makes_paths_absolute() {
        let normalized = normalize_sqlite_url("sqlite:progress.sqlite3".into());
        assert!(normalized.starts_with("sqlite://"));
        assert!(normalized.ends_with("/progress.sqlite3"));
    }
}
