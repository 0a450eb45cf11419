use chrono::{DateTime, Utc};
use prep_core::AnswerLedger;
use prep_core::model::{Category, Question, QuestionId, QuestionSet, ResultSummary, SessionId};

use super::progress::SessionProgress;
use super::state::{Advance, SessionState};
use crate::error::SessionError;

/// State shared by quiz and interview sessions: questions, index, ledger, lifecycle.
#[derive(Debug, Clone)]
pub(crate) struct SessionBase {
    pub(crate) id: SessionId,
    pub(crate) category: Category,
    pub(crate) questions: QuestionSet,
    pub(crate) ledger: AnswerLedger,
    pub(crate) current: usize,
    pub(crate) state: SessionState,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) completed_at: Option<DateTime<Utc>>,
    pub(crate) summary: Option<ResultSummary>,
}

impl SessionBase {
    pub(crate) fn new(
        id: SessionId,
        category: Category,
        questions: QuestionSet,
        created_at: DateTime<Utc>,
    ) -> Self {
        let ledger = AnswerLedger::new(&questions);
        Self {
            id,
            category,
            questions,
            ledger,
            current: 0,
            state: SessionState::Created,
            created_at,
            completed_at: None,
            summary: None,
        }
    }

    pub(crate) fn start(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Created => {
                self.state = SessionState::InProgress;
                Ok(())
            }
            SessionState::InProgress => Ok(()),
            SessionState::Finalizing => Err(SessionError::Busy),
            SessionState::Completed => Err(SessionError::Completed),
        }
    }

    pub(crate) fn ensure_in_progress(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::InProgress => Ok(()),
            SessionState::Created => Err(SessionError::NotStarted),
            SessionState::Finalizing => Err(SessionError::Busy),
            SessionState::Completed => Err(SessionError::Completed),
        }
    }

    pub(crate) fn question(&self, question_id: &QuestionId) -> Result<&Question, SessionError> {
        self.questions
            .find(question_id)
            .ok_or_else(|| SessionError::InvalidQuestion(question_id.clone()))
    }

    pub(crate) fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub(crate) fn is_last(&self) -> bool {
        self.current + 1 >= self.questions.len()
    }

    pub(crate) fn move_forward(&mut self) -> Advance {
        if self.is_last() {
            Advance::Finish
        } else {
            self.current += 1;
            Advance::Moved(self.current)
        }
    }

    pub(crate) fn move_back(&mut self) -> usize {
        self.current = self.current.saturating_sub(1);
        self.current
    }

    pub(crate) fn begin_finalizing(&mut self) {
        self.state = SessionState::Finalizing;
    }

    /// Back to the last good state: in progress, pinned on the last question.
    pub(crate) fn revert_finalizing(&mut self) {
        if self.state == SessionState::Finalizing {
            self.state = SessionState::InProgress;
            self.current = self.questions.len().saturating_sub(1);
        }
    }

    pub(crate) fn complete(
        &mut self,
        summary: ResultSummary,
        completed_at: DateTime<Utc>,
    ) -> &ResultSummary {
        self.ledger.seal();
        self.state = SessionState::Completed;
        self.completed_at = Some(completed_at);
        self.summary.insert(summary)
    }

    pub(crate) fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self.ledger.answered_count();
        SessionProgress {
            total,
            answered,
            current_index: self.current,
            remaining: total.saturating_sub(answered),
            is_complete: self.state == SessionState::Completed,
        }
    }
}
