use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use prep_core::model::{
    Category, CategoryKind, ChatReply, Evaluation, PersonalizedReport, QuestionId,
};

use crate::credentials::Credentials;
use crate::remote::{
    AttemptRecord, BackendError, FinishRequest, GeneratedSet, InterviewEvaluator, QuestionGenerator,
    QuizGrader, RecordedAnswer, ReportSource, StudyChat, ValidationBatch, Verdict, Verdicts,
};

/// Backend operations, used to count calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Generate,
    Validate,
    RecordAttempt,
    SubmitAnswer,
    FinishInterview,
    Chat,
    Report,
}

#[derive(Default)]
struct State {
    banks: HashMap<(CategoryKind, String), GeneratedSet>,
    answer_key: HashMap<QuestionId, String>,
    attempted: HashSet<QuestionId>,
    attempts: Vec<AttemptRecord>,
    batches: Vec<ValidationBatch>,
    submissions: Vec<RecordedAnswer>,
    evaluations: VecDeque<Evaluation>,
    finish_requests: Vec<FinishRequest>,
    finish_total: Option<f64>,
    chat_replies: VecDeque<ChatReply>,
    report: PersonalizedReport,
    failures: HashMap<Operation, VecDeque<BackendError>>,
    calls: HashMap<Operation, usize>,
}

/// Scriptable in-memory backend for tests and offline runs.
///
/// Behaves like the real service where it matters: every call requires a
/// token, a second attempt on the same question is a conflict, and the
/// interview total is computed server-side.
#[derive(Clone)]
pub struct InMemoryBackend {
    credentials: Credentials,
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    // ─── scripting ──────────────────────────────────────────────────────────

    pub fn add_question_bank(&self, category: &Category, set: GeneratedSet) {
        self.inspect()
            .banks
            .insert(bank_key(category), set);
    }

    pub fn set_correct_answer(&self, question_id: QuestionId, option: impl Into<String>) {
        self.inspect().answer_key.insert(question_id, option.into());
    }

    pub fn mark_attempted(&self, question_id: QuestionId) {
        self.inspect().attempted.insert(question_id);
    }

    pub fn push_evaluation(&self, evaluation: Evaluation) {
        self.inspect().evaluations.push_back(evaluation);
    }

    pub fn set_finish_total(&self, total: f64) {
        self.inspect().finish_total = Some(total);
    }

    pub fn push_chat_reply(&self, reply: ChatReply) {
        self.inspect().chat_replies.push_back(reply);
    }

    pub fn set_report(&self, report: PersonalizedReport) {
        self.inspect().report = report;
    }

    /// Make the next call of `operation` fail with `error`. Calls queue up.
    pub fn fail_next(&self, operation: Operation, error: BackendError) {
        self.inspect()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    // ─── inspection ─────────────────────────────────────────────────────────

    /// Number of calls that reached the backend (authenticated ones only).
    #[must_use]
    pub fn calls(&self, operation: Operation) -> usize {
        self.inspect().calls.get(&operation).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn attempts(&self) -> Vec<AttemptRecord> {
        self.inspect().attempts.clone()
    }

    #[must_use]
    pub fn batches(&self) -> Vec<ValidationBatch> {
        self.inspect().batches.clone()
    }

    #[must_use]
    pub fn submissions(&self) -> Vec<RecordedAnswer> {
        self.inspect().submissions.clone()
    }

    #[must_use]
    pub fn finish_requests(&self) -> Vec<FinishRequest> {
        self.inspect().finish_requests.clone()
    }

    fn inspect(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Authenticate, count the call and pop any injected failure.
    fn enter(&self, operation: Operation) -> Result<MutexGuard<'_, State>, BackendError> {
        self.credentials.require()?;
        let mut guard = self
            .state
            .lock()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        *guard.calls.entry(operation).or_insert(0) += 1;
        if let Some(error) = guard
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        Ok(guard)
    }
}

fn bank_key(category: &Category) -> (CategoryKind, String) {
    (category.kind, category.name.to_lowercase())
}

#[async_trait]
impl QuestionGenerator for InMemoryBackend {
    async fn generate(&self, category: &Category) -> Result<GeneratedSet, BackendError> {
        let state = self.enter(Operation::Generate)?;
        Ok(state
            .banks
            .get(&bank_key(category))
            .cloned()
            .unwrap_or(GeneratedSet {
                title: None,
                questions: Vec::new(),
            }))
    }
}

#[async_trait]
impl QuizGrader for InMemoryBackend {
    async fn validate_answers(&self, batch: &ValidationBatch) -> Result<Verdicts, BackendError> {
        let mut state = self.enter(Operation::Validate)?;
        state.batches.push(batch.clone());

        let mut verdicts = Verdicts::with_capacity(batch.answers.len());
        for (question_id, selected) in &batch.answers {
            let Some(key) = state.answer_key.get(question_id) else {
                continue;
            };
            verdicts.insert(
                question_id.clone(),
                Verdict {
                    correct: selected.as_deref() == Some(key.as_str()),
                    correct_answer: Some(key.clone()),
                },
            );
        }
        Ok(verdicts)
    }

    async fn record_attempt(&self, attempt: &AttemptRecord) -> Result<(), BackendError> {
        let mut state = self.enter(Operation::RecordAttempt)?;
        if !state.attempted.insert(attempt.question_id.clone()) {
            return Err(BackendError::Conflict);
        }
        state.attempts.push(attempt.clone());
        Ok(())
    }
}

#[async_trait]
impl InterviewEvaluator for InMemoryBackend {
    async fn submit_answer(&self, answer: &RecordedAnswer) -> Result<Evaluation, BackendError> {
        let mut state = self.enter(Operation::SubmitAnswer)?;
        state.submissions.push(answer.clone());
        Ok(state.evaluations.pop_front().unwrap_or_else(|| Evaluation {
            transcript: format!("{} bytes transcribed", answer.clip.len()),
            score: 5.0,
            feedback: "Answer received.".to_owned(),
        }))
    }

    async fn finish_interview(&self, request: &FinishRequest) -> Result<f64, BackendError> {
        let mut state = self.enter(Operation::FinishInterview)?;
        state.finish_requests.push(request.clone());
        Ok(state
            .finish_total
            .unwrap_or_else(|| request.scores.iter().sum()))
    }
}

#[async_trait]
impl StudyChat for InMemoryBackend {
    async fn ask(&self, query: &str) -> Result<ChatReply, BackendError> {
        let mut state = self.enter(Operation::Chat)?;
        Ok(state.chat_replies.pop_front().unwrap_or_else(|| ChatReply {
            answer: format!("No study history matches \"{query}\" yet."),
            sources: Vec::new(),
        }))
    }
}

#[async_trait]
impl ReportSource for InMemoryBackend {
    async fn personalized_report(&self) -> Result<PersonalizedReport, BackendError> {
        let state = self.enter(Operation::Report)?;
        Ok(state.report.clone())
    }
}
