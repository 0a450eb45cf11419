use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use prep_core::model::{
    AudioClip, Category, ChatReply, Evaluation, PersonalizedReport, Question, QuestionId,
    SessionId,
};
use thiserror::Error;

use crate::credentials::Credentials;
use crate::memory::InMemoryBackend;

/// Errors surfaced by backend adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("conflict")]
    Conflict,

    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, BackendError::Conflict)
    }

    /// Text suitable for showing to a user: the server's own message when it sent one.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Status { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

//
// ─── REQUEST / RESPONSE SHAPES ─────────────────────────────────────────────────
//

/// Questions produced by the generator for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSet {
    /// Title echoed by the backend (the role name for interviews).
    pub title: Option<String>,
    pub questions: Vec<Question>,
}

/// The whole ledger sent for validation in one batch; skipped questions carry `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationBatch {
    pub category: Category,
    pub answers: Vec<(QuestionId, Option<String>)>,
}

/// Validator decision for a single question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub correct: bool,
    pub correct_answer: Option<String>,
}

pub type Verdicts = HashMap<QuestionId, Verdict>;

/// Anti-repetition bookkeeping for a single answered question.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub question_id: QuestionId,
    pub selected: String,
    pub category: Category,
}

/// A recorded interview answer awaiting evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAnswer {
    pub clip: AudioClip,
    pub question_text: String,
    pub index: usize,
    pub role: String,
    pub session_id: SessionId,
}

/// Ordered per-question scores sent to close an interview.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishRequest {
    pub role: String,
    pub scores: Vec<f64>,
    pub session_id: SessionId,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// One parameterized generation operation for subjects, companies and roles.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Generate questions for the given category.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on authentication, transport or decode failures.
    async fn generate(&self, category: &Category) -> Result<GeneratedSet, BackendError>;
}

#[async_trait]
pub trait QuizGrader: Send + Sync {
    /// Validate a batch of answers.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the validator cannot be reached or rejects the batch.
    async fn validate_answers(&self, batch: &ValidationBatch) -> Result<Verdicts, BackendError>;

    /// Record an attempt for anti-repetition tracking.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Conflict` when the question was already attempted.
    async fn record_attempt(&self, attempt: &AttemptRecord) -> Result<(), BackendError>;
}

#[async_trait]
pub trait InterviewEvaluator: Send + Sync {
    /// Upload a recorded answer and return its evaluation.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on authentication, transport or decode failures.
    async fn submit_answer(&self, answer: &RecordedAnswer) -> Result<Evaluation, BackendError>;

    /// Close an interview and return the authoritative total.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on authentication, transport or decode failures.
    async fn finish_interview(&self, request: &FinishRequest) -> Result<f64, BackendError>;
}

#[async_trait]
pub trait StudyChat: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` on authentication, transport or decode failures.
    async fn ask(&self, query: &str) -> Result<ChatReply, BackendError>;
}

#[async_trait]
pub trait ReportSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` on authentication, transport or decode failures.
    async fn personalized_report(&self) -> Result<PersonalizedReport, BackendError>;
}

/// Aggregates the backend contracts behind trait objects for easy swapping.
#[derive(Clone)]
pub struct Backend {
    pub generator: Arc<dyn QuestionGenerator>,
    pub grader: Arc<dyn QuizGrader>,
    pub evaluator: Arc<dyn InterviewEvaluator>,
    pub chat: Arc<dyn StudyChat>,
    pub reports: Arc<dyn ReportSource>,
}

impl Backend {
    /// Wire every contract to the same adapter.
    #[must_use]
    pub fn from_adapter<T>(adapter: T) -> Self
    where
        T: QuestionGenerator
            + QuizGrader
            + InterviewEvaluator
            + StudyChat
            + ReportSource
            + Clone
            + 'static,
    {
        Self {
            generator: Arc::new(adapter.clone()),
            grader: Arc::new(adapter.clone()),
            evaluator: Arc::new(adapter.clone()),
            chat: Arc::new(adapter.clone()),
            reports: Arc::new(adapter),
        }
    }

    #[must_use]
    pub fn in_memory(credentials: Credentials) -> (Self, InMemoryBackend) {
        let backend = InMemoryBackend::new(credentials);
        (Self::from_adapter(backend.clone()), backend)
    }
}
