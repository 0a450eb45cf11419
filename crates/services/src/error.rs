//! Shared error types for the services crate.

use thiserror::Error;

use backend::{BackendError, ConfigError};
use prep_core::LedgerError;
use prep_core::model::{QuestionError, QuestionId, SummaryError};

use crate::recording::CaptureError;

/// Errors emitted by `QuestionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("enter a subject, company or role first")]
    EmptyInput,
    #[error("No questions found")]
    NoQuestions,
    #[error("not signed in")]
    Unauthenticated,
    #[error(transparent)]
    Backend(BackendError),
}

impl From<BackendError> for GenerationError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::Unauthenticated => Self::Unauthenticated,
            other => Self::Backend(other),
        }
    }
}

/// Errors emitted by `StudyAssistant`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatError {
    #[error("type a question first")]
    EmptyQuery,
    #[error("Authentication required. Please log in.")]
    Unauthenticated,
    #[error("{}", .0.user_message())]
    Backend(BackendError),
}

impl From<BackendError> for ChatError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::Unauthenticated => Self::Unauthenticated,
            other => Self::Backend(other),
        }
    }
}

/// Errors emitted by quiz and interview sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("interview needs {required} questions, only {available} available")]
    TooFewQuestions { available: usize, required: usize },
    #[error("question {0} is not part of this session")]
    InvalidQuestion(QuestionId),
    #[error("{option:?} is not an option of question {question_id}")]
    InvalidOption {
        question_id: QuestionId,
        option: String,
    },
    #[error("session incomplete: {answered} of {required} questions answered")]
    IncompleteSession { answered: usize, required: usize },
    #[error("question {0} must be answered before moving on")]
    UnansweredQuestion(QuestionId),
    #[error("interview questions can only be answered in order")]
    BackwardNavigation,
    #[error("session has not started")]
    NotStarted,
    #[error("session already completed")]
    Completed,
    #[error("session is being finalized")]
    Busy,
    #[error("question {0} has already been evaluated")]
    AlreadyEvaluated(QuestionId),
    #[error("no recording in progress")]
    NotRecording,
    #[error("a recording is already in progress")]
    RecordingInProgress,
    #[error("not signed in")]
    Unauthenticated,
    #[error("answer validation failed: {}", .0.user_message())]
    ValidationFailed(#[source] BackendError),
    #[error("answer evaluation failed: {}", .0.user_message())]
    EvaluationFailed(#[source] BackendError),
    #[error("could not finalize session: {}", .0.user_message())]
    FinalizationFailed(#[source] BackendError),
    #[error("recording device unavailable: {0}")]
    DeviceUnavailable(#[from] CaptureError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Ledger(LedgerError),
}

impl SessionError {
    pub(crate) fn validation(error: BackendError) -> Self {
        Self::remote(error, Self::ValidationFailed)
    }

    pub(crate) fn evaluation(error: BackendError) -> Self {
        Self::remote(error, Self::EvaluationFailed)
    }

    pub(crate) fn finalization(error: BackendError) -> Self {
        Self::remote(error, Self::FinalizationFailed)
    }

    fn remote(error: BackendError, wrap: fn(BackendError) -> Self) -> Self {
        match error {
            BackendError::Unauthenticated => Self::Unauthenticated,
            other => wrap(other),
        }
    }

    /// Whether retrying the same operation can succeed without changing input.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed(_)
                | Self::EvaluationFailed(_)
                | Self::FinalizationFailed(_)
                | Self::DeviceUnavailable(_)
        )
    }
}

impl From<LedgerError> for SessionError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::UnknownQuestion(id) => Self::InvalidQuestion(id),
            LedgerError::Sealed => Self::Completed,
            other => Self::Ledger(other),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_maps_to_unauthenticated_for_every_remote_step() {
        assert!(matches!(
            SessionError::validation(BackendError::Unauthenticated),
            SessionError::Unauthenticated
        ));
        assert!(matches!(
            SessionError::finalization(BackendError::Unauthenticated),
            SessionError::Unauthenticated
        ));
    }

    #[test]
    fn remote_failures_carry_the_backend_message() {
        let err = SessionError::finalization(BackendError::Status {
            status: 503,
            message: "evaluator offline".into(),
        });
        assert_eq!(err.to_string(), "could not finalize session: evaluator offline");
        assert!(err.is_retryable());
    }

    #[test]
    fn ledger_errors_keep_their_meaning() {
        let unknown = prep_core::model::QuestionId::new("q9").unwrap();
        assert!(matches!(
            SessionError::from(LedgerError::UnknownQuestion(unknown)),
            SessionError::InvalidQuestion(_)
        ));
        assert!(matches!(
            SessionError::from(LedgerError::Sealed),
            SessionError::Completed
        ));
        // Anything else is reported as the ledger's own error.
        let wrapped = SessionError::Ledger(LedgerError::Sealed);
        assert_eq!(wrapped.to_string(), LedgerError::Sealed.to_string());
    }

    #[test]
    fn chat_errors_read_like_the_assistant_notice() {
        assert_eq!(
            ChatError::from(BackendError::Unauthenticated).to_string(),
            "Authentication required. Please log in."
        );
    }
}
