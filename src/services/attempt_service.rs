//! Server-side quiz attempts.
//!
//! Each session owns an [`AttemptRuntime`] and, for timed quizzes, a countdown
//! task. The countdown is aborted when its [`Countdown`] handle is dropped, which
//! happens on completion by advance, on retry, on exit, and when the session
//! itself goes away. Persisting an expired run happens on a separate task so
//! that aborting the countdown never cuts a write short.
//!
//! Sessions left alone for longer than the idle limit are evicted by
//! [`IdleSessions::evict_idle`], usually driven by a sweeper task. The runtime
//! lock is always taken before the countdown lock.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use async_trait::async_trait;

use rand::{rngs::StdRng, SeedableRng};
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::{interval_at, Instant},
};
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::QuizAttempt,
        dto::response::{AttemptHistoryResponse, AttemptView, ResultsView},
    },
    repositories::AttemptRepository,
    services::{
        attempt_runtime::{AdvanceOutcome, AttemptRuntime, CompletedAttempt, TickOutcome},
        db_helpers::with_timeout,
        notifier::{Notice, Notifier},
        quiz_service::QuizService,
        results::percentage,
        session_sweeper::IdleSessions,
    },
};

const TICK: Duration = Duration::from_secs(1);

/// Owns a running countdown task.
struct Countdown {
    handle: JoinHandle<()>,
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct AttemptSession {
    user_id: String,
    runtime: Arc<Mutex<AttemptRuntime>>,
    countdown: Mutex<Option<Countdown>>,
    last_touched: StdMutex<Instant>,
}

impl AttemptSession {
    fn touch(&self) {
        if let Ok(mut last) = self.last_touched.lock() {
            *last = Instant::now();
        }
    }

    fn idle_for(&self) -> Duration {
        self.last_touched
            .lock()
            .map(|last| last.elapsed())
            .unwrap_or_default()
    }
}

/// Writes finished runs to the store and reports the outcome back to the run.
#[derive(Clone)]
struct Recorder {
    attempts: Arc<dyn AttemptRepository>,
    notifier: Arc<dyn Notifier>,
    store_timeout: Duration,
}

impl Recorder {
    async fn persist(&self, runtime: &Mutex<AttemptRuntime>, user_id: &str, completed: CompletedAttempt) {
        let attempt_id = completed.attempt.id.clone();
        let result = self.store(completed).await;

        match &result {
            Ok(_) => self
                .notifier
                .notify(user_id, Notice::Success("Quiz results saved".to_string())),
            Err(e) => {
                log::error!("Failed to save attempt {}: {}", attempt_id, e);
                self.notifier.notify(
                    user_id,
                    Notice::Error(format!("Your results could not be saved: {}", e)),
                );
            }
        }

        runtime.lock().await.record_persistence(&attempt_id, &result);
    }

    async fn store(&self, completed: CompletedAttempt) -> AppResult<String> {
        let CompletedAttempt { attempt, answers } = completed;

        let attempt_id = with_timeout(self.store_timeout, self.attempts.create_attempt(attempt)).await?;

        let stored = with_timeout(
            self.store_timeout,
            self.attempts.create_answers(&attempt_id, answers),
        )
        .await;

        if let Err(e) = stored {
            let cleanup = with_timeout(self.store_timeout, self.attempts.delete_attempt(&attempt_id));
            if let Err(cleanup) = cleanup.await {
                log::error!("Orphaned attempt {} could not be removed: {}", attempt_id, cleanup);
            }
            return Err(e);
        }

        Ok(attempt_id)
    }
}

pub struct AttemptService {
    quizzes: Arc<QuizService>,
    recorder: Recorder,
    sessions: RwLock<HashMap<String, Arc<AttemptSession>>>,
    seed: Option<u64>,
}

impl AttemptService {
    pub fn new(
        quizzes: Arc<QuizService>,
        attempts: Arc<dyn AttemptRepository>,
        notifier: Arc<dyn Notifier>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            quizzes,
            recorder: Recorder {
                attempts,
                notifier,
                store_timeout,
            },
            sessions: RwLock::new(HashMap::new()),
            seed: None,
        }
    }

    /// Makes shuffling reproducible. Every session started afterwards uses the same seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Loads the quiz and begins a run. Timed quizzes start counting down at once.
    pub async fn start(&self, user_id: &str, quiz_id: &str) -> AppResult<AttemptView> {
        let data = self.quizzes.get_quiz_with_questions(quiz_id).await?;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let runtime = AttemptRuntime::new(data, user_id, rng)?;
        let timed = runtime.remaining_seconds().is_some();

        let session_id = Uuid::new_v4().to_string();
        let view = AttemptView::from_runtime(&session_id, &runtime);
        let runtime = Arc::new(Mutex::new(runtime));

        let countdown = timed.then(|| self.spawn_countdown(runtime.clone(), user_id));
        let session = Arc::new(AttemptSession {
            user_id: user_id.to_string(),
            runtime,
            countdown: Mutex::new(countdown),
            last_touched: StdMutex::new(Instant::now()),
        });

        self.sessions
            .write()
            .await
            .insert(session_id.clone(), session);

        log::info!("User {} started quiz {} (session {})", user_id, quiz_id, session_id);
        Ok(view)
    }

    pub async fn view(&self, session_id: &str, user_id: &str) -> AppResult<AttemptView> {
        let session = self.session(session_id, user_id).await?;
        let runtime = session.runtime.lock().await;
        Ok(AttemptView::from_runtime(session_id, &runtime))
    }

    pub async fn select_answer(
        &self,
        session_id: &str,
        user_id: &str,
        question_id: &str,
        value: &str,
    ) -> AppResult<AttemptView> {
        let session = self.session(session_id, user_id).await?;
        let mut runtime = session.runtime.lock().await;
        runtime.select_answer(question_id, value)?;
        Ok(AttemptView::from_runtime(session_id, &runtime))
    }

    pub async fn toggle_answer(
        &self,
        session_id: &str,
        user_id: &str,
        question_id: &str,
        value: &str,
    ) -> AppResult<AttemptView> {
        let session = self.session(session_id, user_id).await?;
        let mut runtime = session.runtime.lock().await;
        runtime.toggle_answer(question_id, value)?;
        Ok(AttemptView::from_runtime(session_id, &runtime))
    }

    /// Moves on, or on the last question finishes the run and stores it.
    pub async fn advance(&self, session_id: &str, user_id: &str) -> AppResult<AttemptView> {
        let session = self.session(session_id, user_id).await?;

        let outcome = {
            let mut runtime = session.runtime.lock().await;
            let outcome = runtime.advance()?;
            if matches!(outcome, AdvanceOutcome::Completed(_)) {
                session.countdown.lock().await.take();
            }
            outcome
        };
        if let AdvanceOutcome::Completed(completed) = outcome {
            self.recorder
                .persist(&session.runtime, &session.user_id, completed)
                .await;
        }

        let runtime = session.runtime.lock().await;
        Ok(AttemptView::from_runtime(session_id, &runtime))
    }

    pub async fn results(&self, session_id: &str, user_id: &str) -> AppResult<ResultsView> {
        let session = self.session(session_id, user_id).await?;
        let runtime = session.runtime.lock().await;
        runtime
            .completion()
            .map(|c| ResultsView {
                report: c.report.clone(),
                persistence: c.persistence.clone(),
            })
            .ok_or_else(|| AppError::ValidationError("the quiz is not finished yet".to_string()))
    }

    /// Runs the same quiz again from the first question.
    pub async fn retry(&self, session_id: &str, user_id: &str) -> AppResult<AttemptView> {
        let session = self.session(session_id, user_id).await?;

        let mut runtime = session.runtime.lock().await;
        runtime.retry()?;
        let view = AttemptView::from_runtime(session_id, &runtime);

        let countdown = view
            .remaining_seconds
            .map(|_| self.spawn_countdown(session.runtime.clone(), user_id));
        *session.countdown.lock().await = countdown;
        drop(runtime);

        log::info!("User {} retried session {}", user_id, session_id);
        Ok(view)
    }

    /// Leaves the session. An unfinished run is discarded without being recorded.
    pub async fn exit(&self, session_id: &str, user_id: &str) -> AppResult<()> {
        let session = self.session(session_id, user_id).await?;
        session.countdown.lock().await.take();
        self.sessions.write().await.remove(session_id);
        log::debug!("Session {} closed by {}", session_id, user_id);
        Ok(())
    }

    pub async fn history(&self, user_id: &str, quiz_id: &str) -> AppResult<AttemptHistoryResponse> {
        let attempts: Vec<QuizAttempt> = with_timeout(
            self.recorder.store_timeout,
            self.recorder.attempts.list_attempts_for_user(user_id, quiz_id),
        )
        .await?;

        let best_percentage = attempts
            .iter()
            .map(|a| percentage(a.score, a.total_questions))
            .max();

        Ok(AttemptHistoryResponse {
            quiz_id: quiz_id.to_string(),
            attempts,
            best_percentage,
        })
    }

    async fn session(&self, session_id: &str, user_id: &str) -> AppResult<Arc<AttemptSession>> {
        let session = self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Attempt session '{}' not found", session_id)))?;

        if session.user_id != user_id {
            return Err(AppError::Unauthorized(
                "attempt session belongs to another user".to_string(),
            ));
        }
        session.touch();
        Ok(session)
    }

    fn spawn_countdown(&self, runtime: Arc<Mutex<AttemptRuntime>>, user_id: &str) -> Countdown {
        let recorder = self.recorder.clone();
        let user_id = user_id.to_string();

        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK, TICK);
            loop {
                ticks.tick().await;
                let outcome = runtime.lock().await.tick();
                match outcome {
                    TickOutcome::Running(_) => {}
                    TickOutcome::Expired(completed) => {
                        log::info!("Time ran out for attempt {}", completed.attempt.id);
                        tokio::spawn(async move {
                            recorder.persist(&runtime, &user_id, completed).await;
                        });
                        return;
                    }
                    TickOutcome::Untimed | TickOutcome::Idle => return,
                }
            }
        });

        Countdown { handle }
    }
}

#[async_trait]
impl IdleSessions for AttemptService {
    async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = session.idle_for() <= max_idle;
            if !keep {
                log::debug!("Attempt session {} of {} went idle", id, session.user_id);
            }
            keep
        });
        before - sessions.len()
    }

    fn kind(&self) -> &'static str {
        "attempt"
    }
}
