//! reqwest adapter for the placement-prep backend.

mod config;
mod wire;

use async_trait::async_trait;
use prep_core::model::{Category, ChatReply, Evaluation, PersonalizedReport};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub use config::{BackendConfig, CategoryEndpoint, ConfigError, Endpoints};

use crate::credentials::Credentials;
use crate::remote::{
    AttemptRecord, BackendError, FinishRequest, GeneratedSet, InterviewEvaluator, QuestionGenerator,
    QuizGrader, RecordedAnswer, ReportSource, StudyChat, ValidationBatch, Verdicts,
};
use wire::{
    AttemptRequest, ChatRequest, ErrorBody, FinishBody, FinishResponse, GenerateRequest,
    GenerateResponse, ValidateRequest, ValidateResponse,
};

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            BackendError::Decode(error.to_string())
        } else {
            BackendError::Transport(error.to_string())
        }
    }
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
    credentials: Credentials,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns `BackendError::Transport` if the HTTP client cannot be built.
    pub fn new(config: BackendConfig, credentials: Credentials) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Attach the auth header, or fail before anything is sent.
    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, BackendError> {
        let token = self.credentials.require()?;
        Ok(builder.header(self.config.auth_header.as_str(), token))
    }

    fn post(&self, path: &str) -> Result<RequestBuilder, BackendError> {
        let url = self.config.url(path);
        debug!(%url, "POST");
        self.authorized(self.client.post(url))
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, BackendError> {
        let url = self.config.url(path);
        debug!(%url, "GET");
        self.authorized(self.client.get(url))
    }

    async fn send(builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::CONFLICT {
            return Err(BackendError::Conflict);
        }

        let body = response.text().await.unwrap_or_default();
        let message = ErrorBody::message(&body);
        warn!(status = status.as_u16(), %message, "backend request failed");
        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthenticated);
        }
        Err(BackendError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, BackendError> {
        let response = Self::send(builder).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl QuestionGenerator for HttpBackend {
    async fn generate(&self, category: &Category) -> Result<GeneratedSet, BackendError> {
        let path = self
            .config
            .endpoints
            .generate_path(category.kind)
            .ok_or_else(|| {
                BackendError::InvalidResponse(format!("no endpoint configured for {}", category.kind))
            })?;
        let body = GenerateRequest {
            input: &category.name,
            kind: category.kind,
        };
        let response: GenerateResponse = Self::send_json(self.post(path)?.json(&body)).await?;
        let set = response.into_set()?;
        debug!(category = %category, count = set.questions.len(), "generated questions");
        Ok(set)
    }
}

#[async_trait]
impl QuizGrader for HttpBackend {
    async fn validate_answers(&self, batch: &ValidationBatch) -> Result<Verdicts, BackendError> {
        let body = ValidateRequest::from(batch);
        let response: ValidateResponse =
            Self::send_json(self.post(&self.config.endpoints.validate)?.json(&body)).await?;
        response.into_verdicts()
    }

    async fn record_attempt(&self, attempt: &AttemptRecord) -> Result<(), BackendError> {
        let body = AttemptRequest {
            question_id: attempt.question_id.as_str(),
            selected_option: &attempt.selected,
            subject: &attempt.category.name,
        };
        Self::send(self.post(&self.config.endpoints.attempt)?.json(&body)).await?;
        Ok(())
    }
}

#[async_trait]
impl InterviewEvaluator for HttpBackend {
    async fn submit_answer(&self, answer: &RecordedAnswer) -> Result<Evaluation, BackendError> {
        let audio = Part::bytes(answer.clip.bytes().to_vec())
            .file_name(answer.clip.file_name())
            .mime_str(answer.clip.mime_type())?;
        let form = Form::new()
            .part("audio", audio)
            .text("question", answer.question_text.clone())
            .text("index", answer.index.to_string())
            .text("role", answer.role.clone())
            .text("sessionId", answer.session_id.to_string());

        let evaluation: Evaluation = Self::send_json(
            self.post(&self.config.endpoints.interview_answer)?
                .multipart(form),
        )
        .await?;
        if !evaluation.score.is_finite() {
            return Err(BackendError::InvalidResponse(format!(
                "non-finite score {}",
                evaluation.score
            )));
        }
        Ok(evaluation)
    }

    async fn finish_interview(&self, request: &FinishRequest) -> Result<f64, BackendError> {
        let body = FinishBody {
            role: &request.role,
            scores: &request.scores,
            session_id: request.session_id.as_str(),
        };
        let response: FinishResponse =
            Self::send_json(self.post(&self.config.endpoints.interview_finish)?.json(&body))
                .await?;
        Ok(response.total)
    }
}

#[async_trait]
impl StudyChat for HttpBackend {
    async fn ask(&self, query: &str) -> Result<ChatReply, BackendError> {
        let body = ChatRequest { query };
        Self::send_json(self.post(&self.config.endpoints.chat)?.json(&body)).await
    }
}

#[async_trait]
impl ReportSource for HttpBackend {
    async fn personalized_report(&self) -> Result<PersonalizedReport, BackendError> {
        Self::send_json(self.get(&self.config.endpoints.report)?).await
    }
}
