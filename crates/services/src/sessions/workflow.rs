use backend::Backend;
use prep_core::model::{Category, CategoryKind, Evaluation, Question, ResultSummary};
use tracing::{info, warn};

use super::ids::new_session_id;
use super::interview::{InterviewConfig, InterviewSession};
use super::quiz::{QuizConfig, QuizSession};
use super::scoring::{AttemptReport, InterviewReconciler, QuizReconciler};
use super::state::Advance;
use crate::Clock;
use crate::error::SessionError;
use crate::question_service::QuestionService;
use crate::recording::{CaptureError, RecordingDevice};

/// Result of finishing a quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizOutcome {
    pub summary: ResultSummary,
    pub attempts: AttemptReport,
    /// The session was already completed; nothing was sent.
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizStep {
    Moved(usize),
    Finished(QuizOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterviewStep {
    Moved(usize),
    Finished(ResultSummary),
}

/// Orchestrates session start, device capture and the remote scoring round-trips.
///
/// Every operation takes the session by `&mut`, so at most one remote call is in
/// flight per session. Dropping a returned future mid-call leaves the session in
/// its last good state.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    questions: QuestionService,
    quiz: QuizReconciler,
    interview: InterviewReconciler,
    quiz_config: QuizConfig,
    interview_config: InterviewConfig,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(clock: Clock, backend: &Backend) -> Self {
        Self {
            clock,
            questions: QuestionService::new(backend.generator.clone()),
            quiz: QuizReconciler::new(backend.grader.clone()),
            interview: InterviewReconciler::new(backend.evaluator.clone()),
            quiz_config: QuizConfig::default(),
            interview_config: InterviewConfig::default(),
        }
    }

    #[must_use]
    pub fn with_quiz_config(mut self, config: QuizConfig) -> Self {
        self.quiz_config = config;
        self
    }

    #[must_use]
    pub fn with_interview_config(mut self, config: InterviewConfig) -> Self {
        self.interview_config = config;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    // ─── quiz ───────────────────────────────────────────────────────────────

    /// Generate questions for a subject or company and start a quiz on them.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Generation` when no questions can be generated.
    pub async fn start_quiz(
        &self,
        kind: CategoryKind,
        input: &str,
    ) -> Result<QuizSession, SessionError> {
        let generated = self.questions.generate(kind, input).await?;
        self.quiz_from_questions(generated.category, generated.questions)
    }

    /// Start a quiz on questions the caller already holds.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` or `SessionError::Question` for unusable questions.
    pub fn quiz_from_questions(
        &self,
        category: Category,
        questions: Vec<Question>,
    ) -> Result<QuizSession, SessionError> {
        let mut session = QuizSession::new(
            new_session_id(&self.clock),
            category,
            questions,
            self.clock.now(),
            self.quiz_config.clone(),
        )?;
        session.start()?;
        info!(
            session_id = %session.id(),
            category = %session.category(),
            questions = session.questions().len(),
            "quiz started"
        );
        Ok(session)
    }

    /// Select `option` for the current question.
    ///
    /// # Errors
    ///
    /// Same as `QuizSession::select_current`.
    pub fn select_option(&self, session: &mut QuizSession, option: &str) -> Result<(), SessionError> {
        session.select_current(option, self.clock.now())
    }

    /// Move forward; on the last question this finishes the quiz.
    ///
    /// # Errors
    ///
    /// Same as `finish_quiz` when the quiz is finished.
    pub async fn advance_quiz(&self, session: &mut QuizSession) -> Result<QuizStep, SessionError> {
        match session.advance()? {
            Advance::Moved(index) => Ok(QuizStep::Moved(index)),
            Advance::Finish => Ok(QuizStep::Finished(self.finish_quiz(session).await?)),
        }
    }

    /// Validate every answer in one batch, then record attempts best-effort.
    ///
    /// Finishing a completed quiz returns the stored summary without any call.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ValidationFailed` or `SessionError::Unauthenticated`
    /// when validation fails; the quiz is then back in progress on its last question.
    pub async fn finish_quiz(&self, session: &mut QuizSession) -> Result<QuizOutcome, SessionError> {
        if let Some(summary) = session.summary() {
            return Ok(QuizOutcome {
                summary: summary.clone(),
                attempts: AttemptReport::default(),
                cached: true,
            });
        }

        let pending = session.begin_finalize()?;
        let verdicts = self.quiz.validate(pending.batch()).await?;
        let summary = pending.commit(&verdicts, self.clock.now())?.clone();
        info!(
            session_id = %summary.session_id(),
            score = %summary.score(),
            percentage = summary.percentage(),
            "quiz completed"
        );

        let attempts = self.quiz.record_attempts(session.category(), &summary).await;
        if attempts.failed > 0 {
            warn!(
                session_id = %summary.session_id(),
                failed = attempts.failed,
                "some attempts were not recorded"
            );
        }
        Ok(QuizOutcome {
            summary,
            attempts,
            cached: false,
        })
    }

    // ─── interview ──────────────────────────────────────────────────────────

    /// Generate prompts for a role and start an interview on them.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Generation` when no prompts can be generated.
    pub async fn start_interview(&self, role: &str) -> Result<InterviewSession, SessionError> {
        let generated = self.questions.generate(CategoryKind::Role, role).await?;
        let role = generated.display_title().to_owned();
        self.interview_from_questions(&role, generated.questions)
    }

    /// Start an interview on prompts the caller already holds.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` or `SessionError::Question` for unusable prompts.
    pub fn interview_from_questions(
        &self,
        role: &str,
        questions: Vec<Question>,
    ) -> Result<InterviewSession, SessionError> {
        let mut session = InterviewSession::new(
            new_session_id(&self.clock),
            role,
            questions,
            self.clock.now(),
            self.interview_config.clone(),
        )?;
        session.start()?;
        info!(
            session_id = %session.id(),
            role = session.role(),
            questions = session.questions().len(),
            "interview started"
        );
        Ok(session)
    }

    /// Start capturing an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DeviceUnavailable` when the device is denied, fails or
    /// does not start in time; the recorder is then `Idle` again.
    pub async fn start_recording(
        &self,
        session: &mut InterviewSession,
        device: &mut dyn RecordingDevice,
    ) -> Result<(), SessionError> {
        let limit = session.config().start_timeout;
        let pending = session.begin_recording()?;
        match tokio::time::timeout(limit, device.start()).await {
            Ok(Ok(())) => {
                pending.commit();
                info!(device = device.name(), "recording started");
                Ok(())
            }
            Ok(Err(err)) => {
                warn!(device = device.name(), error = %err, "recording device failed to start");
                Err(err.into())
            }
            Err(_) => {
                device.discard().await;
                warn!(device = device.name(), ?limit, "recording device did not start in time");
                Err(CaptureError::TimedOut(limit).into())
            }
        }
    }

    /// Stop capturing and submit the clip for evaluation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRecording` unless recording, and
    /// `SessionError::EvaluationFailed` when the upload fails; the question can
    /// then be recorded again.
    pub async fn stop_and_submit(
        &self,
        session: &mut InterviewSession,
        device: &mut dyn RecordingDevice,
    ) -> Result<Evaluation, SessionError> {
        session.ensure_recording()?;
        let clip = match device.stop().await {
            Ok(clip) => clip,
            Err(err) => {
                device.rewind().await;
                session.cancel_recording()?;
                return Err(err.into());
            }
        };

        let pending = match session.begin_submission(clip) {
            Ok(pending) => pending,
            Err(err) => {
                device.rewind().await;
                return Err(err);
            }
        };
        let evaluation = match self.interview.evaluate(pending.answer()).await {
            Ok(evaluation) => evaluation,
            Err(err) => {
                warn!(error = %err, "answer evaluation failed");
                drop(pending);
                device.rewind().await;
                return Err(err);
            }
        };
        pending.commit(evaluation.clone(), self.clock.now())?;
        info!(
            session_id = %session.id(),
            index = session.current_index(),
            score = evaluation.score,
            "answer evaluated"
        );
        Ok(evaluation)
    }

    /// Stop capturing and drop the clip.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRecording` unless recording.
    pub async fn cancel_recording(
        &self,
        session: &mut InterviewSession,
        device: &mut dyn RecordingDevice,
    ) -> Result<(), SessionError> {
        session.ensure_recording()?;
        device.discard().await;
        session.cancel_recording()
    }

    /// Move forward; on the last question this finishes the interview.
    ///
    /// # Errors
    ///
    /// Same as `InterviewSession::advance` and `finish_interview`.
    pub async fn advance_interview(
        &self,
        session: &mut InterviewSession,
    ) -> Result<InterviewStep, SessionError> {
        match session.advance()? {
            Advance::Moved(index) => Ok(InterviewStep::Moved(index)),
            Advance::Finish => Ok(InterviewStep::Finished(
                self.finish_interview(session).await?,
            )),
        }
    }

    /// Send the ordered scores and store the evaluator's total.
    ///
    /// Finishing a completed interview returns the stored summary without any call.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IncompleteSession` before every question is scored,
    /// and `SessionError::FinalizationFailed` when the call fails; the interview is
    /// then back in progress and finishing again re-sends the same scores.
    pub async fn finish_interview(
        &self,
        session: &mut InterviewSession,
    ) -> Result<ResultSummary, SessionError> {
        if let Some(summary) = session.summary() {
            return Ok(summary.clone());
        }

        let pending = session.begin_finish()?;
        let total = self.interview.finish(pending.request()).await?;
        let summary = pending.commit(total, self.clock.now())?.clone();
        info!(
            session_id = %summary.session_id(),
            score = %summary.score(),
            percentage = summary.percentage(),
            "interview completed"
        );
        Ok(summary)
    }
}
