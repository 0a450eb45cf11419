use std::sync::Arc;

use backend::{Backend, BackendConfig, Credentials, HttpBackend, InMemoryBackend};
use tracing::info;

use crate::Clock;
use crate::assistant_service::StudyAssistant;
use crate::error::AppServicesError;
use crate::question_service::QuestionService;
use crate::report_service::ReportService;
use crate::sessions::{InterviewConfig, QuizConfig, SessionLoopService};

/// Assembles app-facing services around one backend and one credential slot.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    credentials: Credentials,
    backend: Backend,
    session_loop: Arc<SessionLoopService>,
    questions: Arc<QuestionService>,
    reports: Arc<ReportService>,
}

impl AppServices {
    #[must_use]
    pub fn new(clock: Clock, credentials: Credentials, backend: Backend) -> Self {
        let session_loop = Arc::new(SessionLoopService::new(clock, &backend));
        let questions = Arc::new(QuestionService::new(Arc::clone(&backend.generator)));
        let reports = Arc::new(ReportService::new(Arc::clone(&backend.reports)));
        Self {
            clock,
            credentials,
            backend,
            session_loop,
            questions,
            reports,
        }
    }

    /// Build services against the HTTP backend configured by `PREP_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` for invalid configuration or an unusable HTTP client.
    pub fn http_from_env(clock: Clock) -> Result<Self, AppServicesError> {
        let config = BackendConfig::from_env()?;
        let credentials = Credentials::from_env();
        info!(
            base_url = %config.base_url,
            signed_in = credentials.is_signed_in(),
            "using http backend"
        );
        let http = HttpBackend::new(config, credentials.clone())?;
        Ok(Self::new(clock, credentials, Backend::from_adapter(http)))
    }

    /// Build services against a fresh in-memory backend, returned for scripting.
    #[must_use]
    pub fn in_memory(clock: Clock, credentials: Credentials) -> (Self, InMemoryBackend) {
        let (backend, memory) = Backend::in_memory(credentials.clone());
        (Self::new(clock, credentials, backend), memory)
    }

    /// Replace the session tunables.
    #[must_use]
    pub fn with_session_configs(mut self, quiz: QuizConfig, interview: InterviewConfig) -> Self {
        let session_loop = SessionLoopService::new(self.clock, &self.backend)
            .with_quiz_config(quiz)
            .with_interview_config(interview);
        self.session_loop = Arc::new(session_loop);
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn questions(&self) -> Arc<QuestionService> {
        Arc::clone(&self.questions)
    }

    #[must_use]
    pub fn reports(&self) -> Arc<ReportService> {
        Arc::clone(&self.reports)
    }

    /// A fresh study assistant conversation.
    #[must_use]
    pub fn new_assistant(&self) -> StudyAssistant {
        StudyAssistant::new(self.clock, Arc::clone(&self.backend.chat))
    }
}
