use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{error, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use civics_core::model::{QuestionId, QuizAttempt, StudyProgress};
use civics_core::time::Clock;
use storage::{KeyValueStore, ProgressRecord};

/// Storage key the progress record lives under.
pub const PROGRESS_KEY: &str = "civics_study_progress";

/// Durability of the newest change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// Nothing has needed persisting yet.
    #[default]
    Idle,
    /// A change is waiting on the writer.
    Pending,
    /// The newest change reached the adapter.
    Synced,
    /// The newest change could not be persisted; memory still has it.
    Failed,
}

enum PersistAction {
    Write(String),
    Delete,
}

struct PersistJob {
    seq: u64,
    action: PersistAction,
}

struct State {
    progress: StudyProgress,
    loading: bool,
    initialized: bool,
    sync_status: SyncStatus,
    issued_seq: u64,
    jobs: Option<mpsc::UnboundedSender<PersistJob>>,
}

struct Shared {
    adapter: Arc<dyn KeyValueStore>,
    state: Mutex<State>,
    applied_tx: watch::Sender<u64>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The app's study-progress store.
///
/// The in-memory state is authoritative: every mutation applies under the
/// lock and returns before any I/O happens. Each mutation snapshots the
/// full record and queues it for a single writer task, which persists jobs
/// in issue order and coalesces bursts to the newest snapshot. The stored
/// record can briefly lag memory but never mixes two states, and it always
/// converges on the newest one.
///
/// Persistence failures are logged and reflected in [`SyncStatus`]; they
/// are never surfaced as errors and never roll back memory.
pub struct StudyProgressStore {
    clock: Clock,
    shared: Arc<Shared>,
    queue: Mutex<Option<mpsc::UnboundedReceiver<PersistJob>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
    applied_rx: watch::Receiver<u64>,
}

impl StudyProgressStore {
    /// Creates a store over `adapter` with empty in-memory progress.
    ///
    /// Call [`initialize`](Self::initialize) next; `is_loading()` stays
    /// `true` until the stored record has been loaded.
    #[must_use]
    pub fn new(adapter: Arc<dyn KeyValueStore>) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let (applied_tx, applied_rx) = watch::channel(0);
        let shared = Arc::new(Shared {
            adapter,
            state: Mutex::new(State {
                progress: StudyProgress::new(),
                loading: true,
                initialized: false,
                sync_status: SyncStatus::Idle,
                issued_seq: 0,
                jobs: Some(jobs_tx),
            }),
            applied_tx,
        });
        Self {
            clock: Clock::default_clock(),
            shared,
            queue: Mutex::new(Some(jobs_rx)),
            writer: Mutex::new(None),
            applied_rx,
        }
    }

    /// Replaces the clock used to date quiz attempts.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Loads the stored record into memory and starts the persist writer.
    ///
    /// Runs once; later calls return immediately. A missing record, an
    /// unreadable record, and a failed read all leave the store empty and
    /// usable. Mutations issued before the load settles win over the
    /// stored record.
    pub async fn initialize(&self) {
        {
            let mut state = self.shared.lock_state();
            if state.initialized {
                return;
            }
            state.initialized = true;
        }

        let loaded = match self.shared.adapter.read(PROGRESS_KEY).await {
            Ok(Some(raw)) => match ProgressRecord::decode(&raw) {
                Ok(record) => Some(record.into_progress()),
                Err(err) => {
                    warn!("stored progress record is unreadable, starting empty: {err}");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!("failed to load study progress, starting empty: {err}");
                None
            }
        };

        {
            let mut state = self.shared.lock_state();
            if state.issued_seq == 0 {
                if let Some(progress) = loaded {
                    state.progress = progress;
                }
            } else if loaded.is_some() {
                warn!("changes were made before the stored record loaded; keeping the changes");
            }
            state.loading = false;
        }

        let receiver = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(receiver) = receiver {
            let shared = Arc::clone(&self.shared);
            let handle = tokio::spawn(run_writer(shared, receiver));
            *self.writer.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        }
    }

    // ─── Mutations ─────────────────────────────────────────────────────────────

    /// Flips mastery for one question and returns the new membership:
    /// `true` when the question is now mastered.
    pub fn toggle_mastered(&self, id: QuestionId) -> bool {
        let mut state = self.shared.lock_state();
        let now_mastered = state.progress.toggle_mastered(id);
        self.queue_write(&mut state);
        now_mastered
    }

    /// Records a finished quiz, dated with the store's clock, and returns
    /// the attempt as recorded.
    pub fn add_quiz_result(&self, score: u32, total_questions: u32) -> QuizAttempt {
        let attempt = QuizAttempt::new(self.clock.now(), score, total_questions);
        let mut state = self.shared.lock_state();
        state.progress.record_attempt(attempt.clone());
        self.queue_write(&mut state);
        attempt
    }

    /// Clears all progress and deletes the stored record.
    ///
    /// The delete rides the same writer queue as writes, so a reset always
    /// lands after every mutation issued before it.
    pub fn reset_progress(&self) {
        let mut state = self.shared.lock_state();
        state.progress.reset();
        self.queue_job(&mut state, PersistAction::Delete);
    }

    fn queue_write(&self, state: &mut State) {
        match ProgressRecord::from_progress(&state.progress).encode() {
            Ok(payload) => self.queue_job(state, PersistAction::Write(payload)),
            Err(err) => {
                state.sync_status = SyncStatus::Failed;
                error!("failed to encode study progress: {err}");
            }
        }
    }

    fn queue_job(&self, state: &mut State, action: PersistAction) {
        let Some(sender) = &state.jobs else {
            state.sync_status = SyncStatus::Failed;
            warn!("store is closed; change kept in memory only");
            return;
        };
        let seq = state.issued_seq + 1;
        if sender.send(PersistJob { seq, action }).is_ok() {
            state.issued_seq = seq;
            state.sync_status = SyncStatus::Pending;
        } else {
            state.sync_status = SyncStatus::Failed;
            error!("persist writer is gone; change kept in memory only");
        }
    }

    // ─── Readers ───────────────────────────────────────────────────────────────

    /// True until the initial load has completed.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.shared.lock_state().loading
    }

    /// Ids the learner has marked mastered.
    #[must_use]
    pub fn mastered_questions(&self) -> BTreeSet<QuestionId> {
        self.shared.lock_state().progress.mastered().clone()
    }

    #[must_use]
    pub fn is_mastered(&self, id: QuestionId) -> bool {
        self.shared.lock_state().progress.is_mastered(id)
    }

    /// Completed quizzes in completion order.
    #[must_use]
    pub fn quiz_history(&self) -> Vec<QuizAttempt> {
        self.shared.lock_state().progress.quiz_history().to_vec()
    }

    /// Snapshot of the whole progress aggregate.
    #[must_use]
    pub fn progress(&self) -> StudyProgress {
        self.shared.lock_state().progress.clone()
    }

    /// Durability of the newest change.
    #[must_use]
    pub fn sync_status(&self) -> SyncStatus {
        self.shared.lock_state().sync_status
    }

    // ─── Lifecycle ─────────────────────────────────────────────────────────────

    /// Waits until every change issued so far has been handed to the
    /// adapter, successfully or not. Call after [`initialize`](Self::initialize);
    /// before it there is no writer to drain the queue.
    pub async fn flush(&self) {
        let target = self.shared.lock_state().issued_seq;
        if target == 0 {
            return;
        }
        if self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
        {
            return;
        }
        let mut applied = self.applied_rx.clone();
        let _ = applied.wait_for(|seq| *seq >= target).await;
    }

    /// Stops accepting changes and waits for queued persists to finish.
    ///
    /// Changes made after `close()` stay in memory and mark the store
    /// [`SyncStatus::Failed`].
    pub async fn close(&self) {
        {
            let mut state = self.shared.lock_state();
            state.jobs = None;
        }
        let handle = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!("persist writer task failed: {err}");
            }
        }
    }
}

/// Drains persist jobs one at a time in issue order.
///
/// A burst of queued jobs coalesces to the newest one; every job carries
/// the complete record, so superseded snapshots can be skipped without
/// losing anything. [`SyncStatus`] only settles when the finished job is
/// still the newest issued.
async fn run_writer(shared: Arc<Shared>, mut jobs: mpsc::UnboundedReceiver<PersistJob>) {
    while let Some(mut job) = jobs.recv().await {
        while let Ok(newer) = jobs.try_recv() {
            job = newer;
        }

        let result = match &job.action {
            PersistAction::Write(payload) => shared.adapter.write(PROGRESS_KEY, payload).await,
            PersistAction::Delete => shared.adapter.delete(PROGRESS_KEY).await,
        };

        {
            let mut state = shared.lock_state();
            if job.seq >= state.issued_seq {
                state.sync_status = match &result {
                    Ok(()) => SyncStatus::Synced,
                    Err(_) => SyncStatus::Failed,
                };
            }
        }
        if let Err(err) = result {
            error!("failed to persist study progress: {err}");
        }
        let _ = shared.applied_tx.send(job.seq);
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
