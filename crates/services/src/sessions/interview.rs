use std::fmt;
use std::time::Duration;

use backend::{FinishRequest, RecordedAnswer};
use chrono::{DateTime, Utc};
use prep_core::AnswerLedger;
use prep_core::model::{
    AnswerRecord, AudioClip, Category, Evaluation, InterviewItem, Question, QuestionError,
    QuestionId, QuestionSet, ResultSummary, SessionId,
};

use super::base::SessionBase;
use super::progress::SessionProgress;
use super::state::{Advance, RecordingState, SessionState};
use crate::error::SessionError;

const DEFAULT_QUESTION_COUNT: usize = 3;
const DEFAULT_MAX_TOTAL: f64 = 50.0;
const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for voice interview sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewConfig {
    /// Questions asked per interview; all of them must be scored to finish.
    pub question_count: usize,
    /// Maximum total the evaluator can award.
    pub max_total: f64,
    /// How long to wait for the capture device to start.
    pub start_timeout: Duration,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            max_total: DEFAULT_MAX_TOTAL,
            start_timeout: DEFAULT_START_TIMEOUT,
        }
    }
}

impl InterviewConfig {
    #[must_use]
    pub fn with_question_count(mut self, count: usize) -> Self {
        self.question_count = count;
        self
    }

    #[must_use]
    pub fn with_max_total(mut self, max_total: f64) -> Self {
        self.max_total = max_total;
        self
    }

    #[must_use]
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Voice interview: forward-only, one recorded and evaluated answer per question.
///
/// Pure state machine. Device and remote calls are made by `SessionLoopService`.
#[derive(Clone)]
pub struct InterviewSession {
    base: SessionBase,
    config: InterviewConfig,
    recording: RecordingState,
}

impl InterviewSession {
    /// Create an interview for `role`, keeping the first `question_count` questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when no question is left,
    /// `SessionError::TooFewQuestions` when fewer than `question_count` remain, and
    /// `SessionError::Question` for duplicate ids.
    pub fn new(
        id: SessionId,
        role: impl Into<String>,
        questions: Vec<Question>,
        created_at: DateTime<Utc>,
        config: InterviewConfig,
    ) -> Result<Self, SessionError> {
        let set = QuestionSet::new(questions)
            .and_then(|set| set.truncated(config.question_count))
            .map_err(|err| match err {
                QuestionError::EmptySet => SessionError::Empty,
                other => SessionError::Question(other),
            })?;
        if set.len() < config.question_count {
            return Err(SessionError::TooFewQuestions {
                available: set.len(),
                required: config.question_count,
            });
        }

        Ok(Self {
            base: SessionBase::new(id, Category::role(role), set, created_at),
            config,
            recording: RecordingState::Idle,
        })
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.base.id
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.base.category.name
    }

    #[must_use]
    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.base.state
    }

    #[must_use]
    pub fn recording_state(&self) -> RecordingState {
        self.recording
    }

    #[must_use]
    pub fn questions(&self) -> &QuestionSet {
        &self.base.questions
    }

    #[must_use]
    pub fn ledger(&self) -> &AnswerLedger {
        &self.base.ledger
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.base.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.base.current_question()
    }

    #[must_use]
    pub fn evaluation(&self, question_id: &QuestionId) -> Option<&Evaluation> {
        self.base
            .ledger
            .get(question_id)
            .and_then(AnswerRecord::evaluation)
    }

    /// Scores received so far, in question order. Display only; the total
    /// always comes from the evaluator.
    #[must_use]
    pub fn running_scores(&self) -> Vec<f64> {
        self.base
            .ledger
            .all_records()
            .into_iter()
            .filter_map(|(_, entry)| entry.record().and_then(AnswerRecord::score))
            .collect()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.base.created_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.base.completed_at
    }

    #[must_use]
    pub fn summary(&self) -> Option<&ResultSummary> {
        self.base.summary.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        self.base.progress()
    }

    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session has been finalized.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.base.start()
    }

    /// Move to the next question once the current one has been evaluated.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnansweredQuestion` for an unevaluated question,
    /// `SessionError::RecordingInProgress` while recording, and lifecycle errors.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        self.base.ensure_in_progress()?;
        self.ensure_idle()?;
        let question_id = self.current_id()?;
        if self.evaluation(&question_id).is_none() {
            return Err(SessionError::UnansweredQuestion(question_id));
        }
        Ok(self.base.move_forward())
    }

    /// Interviews never go back.
    ///
    /// # Errors
    ///
    /// Always fails: `SessionError::BackwardNavigation` while in progress,
    /// lifecycle errors otherwise.
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        self.base.ensure_in_progress()?;
        Err(SessionError::BackwardNavigation)
    }

    /// Enter `Starting` for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::RecordingInProgress` unless idle,
    /// `SessionError::AlreadyEvaluated` for an answered question, and lifecycle errors.
    pub fn begin_recording(&mut self) -> Result<PendingStart<'_>, SessionError> {
        self.base.ensure_in_progress()?;
        self.ensure_idle()?;
        let question_id = self.current_id()?;
        if self.evaluation(&question_id).is_some() {
            return Err(SessionError::AlreadyEvaluated(question_id));
        }
        self.recording = RecordingState::Starting;
        Ok(PendingStart {
            session: Some(self),
        })
    }

    /// Check that a capture is running before the device is stopped.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRecording` unless recording, and lifecycle errors.
    pub fn ensure_recording(&self) -> Result<(), SessionError> {
        self.base.ensure_in_progress()?;
        if self.recording == RecordingState::Recording {
            Ok(())
        } else {
            Err(SessionError::NotRecording)
        }
    }

    /// Drop the running capture and go back to `Idle`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRecording` unless recording.
    pub fn cancel_recording(&mut self) -> Result<(), SessionError> {
        self.ensure_recording()?;
        self.recording = RecordingState::Idle;
        Ok(())
    }

    /// Enter `Submitting` with the clip captured for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRecording` unless recording, and lifecycle errors.
    pub fn begin_submission(
        &mut self,
        clip: AudioClip,
    ) -> Result<PendingSubmission<'_>, SessionError> {
        self.ensure_recording()?;
        let question = self.base.current_question().ok_or(SessionError::Empty)?;
        let answer = RecordedAnswer {
            clip,
            question_text: question.prompt().to_owned(),
            index: self.base.current,
            role: self.role().to_owned(),
            session_id: self.base.id.clone(),
        };
        let question_id = question.id().clone();
        self.recording = RecordingState::Submitting;
        Ok(PendingSubmission {
            session: Some(self),
            question_id,
            answer,
        })
    }

    /// Enter `Finalizing` with the ordered score list.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IncompleteSession` until every question is scored,
    /// `SessionError::RecordingInProgress` while recording, and lifecycle errors.
    pub fn begin_finish(&mut self) -> Result<PendingFinish<'_>, SessionError> {
        self.base.ensure_in_progress()?;
        self.ensure_idle()?;
        let scores = self.running_scores();
        let required = self.config.question_count.max(self.base.questions.len());
        if scores.len() < required {
            return Err(SessionError::IncompleteSession {
                answered: scores.len(),
                required,
            });
        }

        let request = FinishRequest {
            role: self.role().to_owned(),
            scores,
            session_id: self.base.id.clone(),
        };
        self.base.begin_finalizing();
        Ok(PendingFinish {
            session: Some(self),
            request,
        })
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.recording == RecordingState::Idle {
            Ok(())
        } else {
            Err(SessionError::RecordingInProgress)
        }
    }

    fn current_id(&self) -> Result<QuestionId, SessionError> {
        self.base
            .current_question()
            .map(|question| question.id().clone())
            .ok_or(SessionError::Empty)
    }

    fn interview_items(&self) -> Vec<InterviewItem> {
        self.base
            .questions
            .iter()
            .filter_map(|question| {
                let evaluation = self.evaluation(question.id())?;
                Some(InterviewItem {
                    question_id: question.id().clone(),
                    prompt: question.prompt().to_owned(),
                    transcript: evaluation.transcript.clone(),
                    score: evaluation.score,
                    feedback: evaluation.feedback.clone(),
                })
            })
            .collect()
    }
}

impl fmt::Debug for InterviewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterviewSession")
            .field("id", &self.base.id)
            .field("role", &self.base.category.name)
            .field("questions_len", &self.base.questions.len())
            .field("current", &self.base.current)
            .field("state", &self.base.state)
            .field("recording", &self.recording)
            .finish_non_exhaustive()
    }
}

//
// ─── IN-FLIGHT GUARDS ──────────────────────────────────────────────────────────
//

/// Capture device start in flight. Dropping it returns to `Idle`.
#[must_use = "dropping the guard returns the recorder to Idle"]
pub struct PendingStart<'a> {
    session: Option<&'a mut InterviewSession>,
}

impl PendingStart<'_> {
    /// The device is capturing.
    pub fn commit(mut self) {
        if let Some(session) = self.session.take() {
            session.recording = RecordingState::Recording;
        }
    }
}

impl Drop for PendingStart<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.recording = RecordingState::Idle;
        }
    }
}

/// Answer upload in flight. Dropping it returns to `Idle` on the same question.
#[must_use = "dropping the guard discards the submission"]
pub struct PendingSubmission<'a> {
    session: Option<&'a mut InterviewSession>,
    question_id: QuestionId,
    answer: RecordedAnswer,
}

impl PendingSubmission<'_> {
    #[must_use]
    pub fn answer(&self) -> &RecordedAnswer {
        &self.answer
    }

    /// Merge the evaluation into the ledger.
    ///
    /// # Errors
    ///
    /// Returns ledger errors; the recorder is back in `Idle` either way.
    pub fn commit(mut self, evaluation: Evaluation, at: DateTime<Utc>) -> Result<(), SessionError> {
        let Some(session) = self.session.take() else {
            return Err(SessionError::NotRecording);
        };
        session.recording = RecordingState::Idle;
        session
            .base
            .ledger
            .put(&self.question_id, AnswerRecord::Evaluated(evaluation), at)?;
        Ok(())
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.recording = RecordingState::Idle;
        }
    }
}

/// Finish-interview call in flight. Dropping it reverts to `InProgress`.
#[must_use = "dropping the guard reverts the session to InProgress"]
pub struct PendingFinish<'a> {
    session: Option<&'a mut InterviewSession>,
    request: FinishRequest,
}

impl<'a> PendingFinish<'a> {
    #[must_use]
    pub fn request(&self) -> &FinishRequest {
        &self.request
    }

    /// Attach the summary around the evaluator's `total`, seal the ledger and complete.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Summary` for an invalid total; the session is
    /// then back in `InProgress`.
    pub fn commit(
        mut self,
        total: f64,
        completed_at: DateTime<Utc>,
    ) -> Result<&'a ResultSummary, SessionError> {
        let Some(session) = self.session.take() else {
            return Err(SessionError::Busy);
        };
        let items = session.interview_items();
        let summary = ResultSummary::from_interview(
            session.base.id.clone(),
            completed_at,
            items,
            total,
            session.config.max_total,
        );
        match summary {
            Ok(summary) => Ok(session.base.complete(summary, completed_at)),
            Err(err) => {
                session.base.revert_finalizing();
                Err(err.into())
            }
        }
    }
}

impl Drop for PendingFinish<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.base.revert_finalizing();
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::Score;
    use prep_core::time::fixed_now;

    fn prompts(count: usize) -> Vec<Question> {
        (0..count)
            .map(|idx| {
                Question::open_ended(QuestionId::positional(idx), format!("Question {}", idx + 1))
                    .unwrap()
            })
            .collect()
    }

    fn build_session() -> InterviewSession {
        let mut session = InterviewSession::new(
            SessionId::from_parts(1, "abcdef"),
            "Backend Engineer",
            prompts(5),
            fixed_now(),
            InterviewConfig::default(),
        )
        .unwrap();
        session.start().unwrap();
        session
    }

    fn evaluation(score: f64) -> Evaluation {
        Evaluation {
            transcript: "answer".into(),
            score,
            feedback: "ok".into(),
        }
    }

    fn answer_current(session: &mut InterviewSession, score: f64) {
        session.begin_recording().unwrap().commit();
        let pending = session.begin_submission(AudioClip::webm(vec![1, 2, 3])).unwrap();
        pending.commit(evaluation(score), fixed_now()).unwrap();
    }

    #[test]
    fn keeps_configured_question_count() {
        let session = build_session();
        assert_eq!(session.questions().len(), 3);
    }

    #[test]
    fn short_prompt_list_is_rejected() {
        let result = InterviewSession::new(
            SessionId::from_parts(1, "abcdef"),
            "Backend Engineer",
            prompts(2),
            fixed_now(),
            InterviewConfig::default(),
        );
        assert!(matches!(
            result,
            Err(SessionError::TooFewQuestions {
                available: 2,
                required: 3
            })
        ));
    }

    #[test]
    fn previous_is_rejected() {
        let mut session = build_session();
        assert!(matches!(
            session.previous(),
            Err(SessionError::BackwardNavigation)
        ));
    }

    #[test]
    fn advance_requires_an_evaluation() {
        let mut session = build_session();
        assert!(matches!(
            session.advance(),
            Err(SessionError::UnansweredQuestion(_))
        ));
        answer_current(&mut session, 7.0);
        assert_eq!(session.advance().unwrap(), Advance::Moved(1));
    }

    #[test]
    fn recording_walks_through_sub_states() {
        let mut session = build_session();
        let pending = session.begin_recording().unwrap();
        pending.commit();
        assert_eq!(session.recording_state(), RecordingState::Recording);
        assert!(matches!(
            session.begin_recording(),
            Err(SessionError::RecordingInProgress)
        ));

        let pending = session.begin_submission(AudioClip::webm(vec![9])).unwrap();
        assert_eq!(pending.answer().index, 0);
        assert_eq!(pending.answer().role, "Backend Engineer");
        assert_eq!(pending.answer().question_text, "Question 1");
        pending.commit(evaluation(6.5), fixed_now()).unwrap();

        assert_eq!(session.recording_state(), RecordingState::Idle);
        assert_eq!(session.running_scores(), vec![6.5]);
    }

    #[test]
    fn dropped_start_and_submission_return_to_idle() {
        let mut session = build_session();
        drop(session.begin_recording().unwrap());
        assert_eq!(session.recording_state(), RecordingState::Idle);

        session.begin_recording().unwrap().commit();
        drop(session.begin_submission(AudioClip::webm(vec![1])).unwrap());
        assert_eq!(session.recording_state(), RecordingState::Idle);
        assert_eq!(session.ledger().answered_count(), 0);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn evaluated_question_cannot_be_recorded_again() {
        let mut session = build_session();
        answer_current(&mut session, 5.0);
        assert!(matches!(
            session.begin_recording(),
            Err(SessionError::AlreadyEvaluated(_))
        ));
    }

    #[test]
    fn submit_without_recording_fails() {
        let mut session = build_session();
        assert!(matches!(
            session.begin_submission(AudioClip::webm(vec![1])),
            Err(SessionError::NotRecording)
        ));
        assert!(matches!(
            session.cancel_recording(),
            Err(SessionError::NotRecording)
        ));
    }

    #[test]
    fn finish_requires_every_score() {
        let mut session = build_session();
        answer_current(&mut session, 5.0);
        session.advance().unwrap();
        answer_current(&mut session, 6.0);
        assert!(matches!(
            session.begin_finish(),
            Err(SessionError::IncompleteSession {
                answered: 2,
                required: 3
            })
        ));
    }

    #[test]
    fn finish_uses_the_evaluator_total() {
        let mut session = build_session();
        for score in [6.0, 7.0, 8.0] {
            answer_current(&mut session, score);
            let _ = session.advance().unwrap();
        }
        let pending = session.begin_finish().unwrap();
        assert_eq!(pending.request().scores, vec![6.0, 7.0, 8.0]);
        let summary = pending.commit(42.0, fixed_now()).unwrap().clone();

        assert_eq!(
            summary.score(),
            Score::Points {
                total: 42.0,
                out_of: 50.0
            }
        );
        assert_eq!(summary.percentage(), 84);
        assert_eq!(summary.interview_items().len(), 3);
        assert_eq!(session.state(), SessionState::Completed);
        assert!(matches!(
            session.begin_recording(),
            Err(SessionError::Completed)
        ));
    }

    #[test]
    fn dropped_finish_reverts_to_in_progress() {
        let mut session = build_session();
        for score in [6.0, 7.0, 8.0] {
            answer_current(&mut session, score);
            let _ = session.advance().unwrap();
        }
        drop(session.begin_finish().unwrap());
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.current_index(), 2);
        assert!(session.summary().is_none());
    }
}
