use std::fmt;

use backend::{ValidationBatch, Verdicts};
use chrono::{DateTime, Utc};
use prep_core::AnswerLedger;
use prep_core::model::{
    AnswerRecord, Category, Question, QuestionError, QuestionId, QuestionSet, QuizItem,
    ResultSummary, SessionId,
};

use super::base::SessionBase;
use super::progress::SessionProgress;
use super::state::{Advance, SessionState};
use crate::error::SessionError;

/// Tunables for quiz sessions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuizConfig {
    /// Refuse to finish while any question is unanswered.
    pub require_all_answers: bool,
    /// Keep at most this many of the generated questions.
    pub question_limit: Option<usize>,
}

impl QuizConfig {
    #[must_use]
    pub fn with_require_all_answers(mut self, require: bool) -> Self {
        self.require_all_answers = require;
        self
    }

    #[must_use]
    pub fn with_question_limit(mut self, limit: usize) -> Self {
        self.question_limit = Some(limit);
        self
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Multiple-choice quiz: free navigation, reselection, one validation round-trip.
///
/// Pure state machine. Remote calls are made by `SessionLoopService`.
#[derive(Clone)]
pub struct QuizSession {
    base: SessionBase,
    config: QuizConfig,
}

impl QuizSession {
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for an empty list, and
    /// `SessionError::Question` for duplicate ids or questions without options.
    pub fn new(
        id: SessionId,
        category: Category,
        questions: Vec<Question>,
        created_at: DateTime<Utc>,
        config: QuizConfig,
    ) -> Result<Self, SessionError> {
        let mut set = QuestionSet::new(questions).map_err(empty_as_session_error)?;
        if let Some(limit) = config.question_limit {
            set = set.truncated(limit).map_err(empty_as_session_error)?;
        }
        if let Some(question) = set.iter().find(|question| question.is_open_ended()) {
            return Err(QuestionError::NoOptions(question.id().clone()).into());
        }

        Ok(Self {
            base: SessionBase::new(id, category, set, created_at),
            config,
        })
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.base.id
    }

    #[must_use]
    pub fn category(&self) -> &Category {
        &self.base.category
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.base.state
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
    pub fn is_last_question(&self) -> bool {
        self.base.is_last()
    }

    /// The option currently stored for `question_id`.
    #[must_use]
    pub fn selected(&self, question_id: &QuestionId) -> Option<&str> {
        self.base
            .ledger
            .get(question_id)
            .and_then(AnswerRecord::option)
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

    /// Store `option` for any question of the session, replacing the previous choice.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidQuestion` / `SessionError::InvalidOption` for
    /// values outside the session, and lifecycle errors outside `InProgress`.
    pub fn select_answer(
        &mut self,
        question_id: &QuestionId,
        option: &str,
        at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.base.ensure_in_progress()?;
        let question = self.base.question(question_id)?;
        if !question.has_option(option) {
            return Err(SessionError::InvalidOption {
                question_id: question_id.clone(),
                option: option.to_owned(),
            });
        }
        self.base
            .ledger
            .put(question_id, AnswerRecord::selected(option), at)?;
        Ok(())
    }

    /// `select_answer` for the question on screen.
    ///
    /// # Errors
    ///
    /// Same as `select_answer`.
    pub fn select_current(&mut self, option: &str, at: DateTime<Utc>) -> Result<(), SessionError> {
        let question_id = self
            .current_question()
            .map(|question| question.id().clone())
            .ok_or(SessionError::Empty)?;
        self.select_answer(&question_id, option, at)
    }

    /// Move to the next question, or report that the last one was reached.
    ///
    /// # Errors
    ///
    /// Returns lifecycle errors outside `InProgress`.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        self.base.ensure_in_progress()?;
        Ok(self.base.move_forward())
    }

    /// Step back one question; stays at 0 on the first question.
    ///
    /// # Errors
    ///
    /// Returns lifecycle errors outside `InProgress`.
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        self.base.ensure_in_progress()?;
        Ok(self.base.move_back())
    }

    /// Enter `Finalizing` and hand out the batch to validate.
    ///
    /// The returned guard reverts to `InProgress` on the last question unless
    /// committed, so a failed or cancelled round-trip loses nothing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IncompleteSession` when every answer is required
    /// and some are missing, and lifecycle errors outside `InProgress`.
    pub fn begin_finalize(&mut self) -> Result<PendingFinalize<'_>, SessionError> {
        self.base.ensure_in_progress()?;
        let answered = self.base.ledger.answered_count();
        let required = self.base.questions.len();
        if self.config.require_all_answers && answered < required {
            return Err(SessionError::IncompleteSession { answered, required });
        }

        let batch = ValidationBatch {
            category: self.base.category.clone(),
            answers: self
                .base
                .ledger
                .all_records()
                .into_iter()
                .map(|(id, entry)| {
                    let selected = entry.record().and_then(AnswerRecord::option);
                    (id.clone(), selected.map(str::to_owned))
                })
                .collect(),
        };
        self.base.begin_finalizing();
        Ok(PendingFinalize {
            session: Some(self),
            batch,
        })
    }

    fn quiz_items(&self, verdicts: &Verdicts) -> Vec<QuizItem> {
        self.base
            .questions
            .iter()
            .map(|question| {
                let selected = self.selected(question.id()).map(str::to_owned);
                let verdict = verdicts.get(question.id());
                QuizItem {
                    question_id: question.id().clone(),
                    prompt: question.prompt().to_owned(),
                    correct: selected.is_some() && verdict.is_some_and(|v| v.correct),
                    selected,
                    correct_answer: verdict.and_then(|v| v.correct_answer.clone()),
                }
            })
            .collect()
    }
}

fn empty_as_session_error(error: QuestionError) -> SessionError {
    match error {
        QuestionError::EmptySet => SessionError::Empty,
        other => SessionError::Question(other),
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.base.id)
            .field("category", &self.base.category)
            .field("questions_len", &self.base.questions.len())
            .field("current", &self.base.current)
            .field("answered", &self.base.ledger.answered_count())
            .field("state", &self.base.state)
            .finish_non_exhaustive()
    }
}

//
// ─── FINALIZATION GUARD ────────────────────────────────────────────────────────
//

/// A quiz in `Finalizing`, waiting for the validator's verdicts.
#[must_use = "dropping the guard reverts the session to InProgress"]
pub struct PendingFinalize<'a> {
    session: Option<&'a mut QuizSession>,
    batch: ValidationBatch,
}

impl<'a> PendingFinalize<'a> {
    #[must_use]
    pub fn batch(&self) -> &ValidationBatch {
        &self.batch
    }

    /// Attach the summary built from `verdicts`, seal the ledger and complete.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Summary` if the summary cannot be built; the
    /// session is then back in `InProgress`.
    pub fn commit(
        mut self,
        verdicts: &Verdicts,
        completed_at: DateTime<Utc>,
    ) -> Result<&'a ResultSummary, SessionError> {
        let Some(session) = self.session.take() else {
            return Err(SessionError::Busy);
        };
        let items = session.quiz_items(verdicts);
        match ResultSummary::from_quiz(session.base.id.clone(), completed_at, items) {
            Ok(summary) => Ok(session.base.complete(summary, completed_at)),
            Err(err) => {
                session.base.revert_finalizing();
                Err(err.into())
            }
        }
    }
}

impl Drop for PendingFinalize<'_> {
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
    use backend::Verdict;
    use prep_core::model::Score;
    use prep_core::time::fixed_now;

    fn qid(raw: &str) -> QuestionId {
        QuestionId::new(raw).unwrap()
    }

    fn question(id: &str) -> Question {
        let options = ["A", "B", "C", "D"].map(String::from).to_vec();
        Question::multiple_choice(qid(id), format!("Prompt {id}"), options).unwrap()
    }

    fn build_session(config: QuizConfig) -> QuizSession {
        let mut session = QuizSession::new(
            SessionId::from_parts(1, "abcdef"),
            Category::subject("DBMS"),
            vec![question("q1"), question("q2"), question("q3")],
            fixed_now(),
            config,
        )
        .unwrap();
        session.start().unwrap();
        session
    }

    fn verdict(correct: bool, answer: &str) -> Verdict {
        Verdict {
            correct,
            correct_answer: Some(answer.into()),
        }
    }

    #[test]
    fn empty_question_list_is_rejected() {
        let err = QuizSession::new(
            SessionId::from_parts(1, "abcdef"),
            Category::subject("DBMS"),
            Vec::new(),
            fixed_now(),
            QuizConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }

    #[test]
    fn open_ended_questions_cannot_be_quizzed() {
        let err = QuizSession::new(
            SessionId::from_parts(1, "abcdef"),
            Category::subject("DBMS"),
            vec![Question::open_ended(qid("q1"), "Explain ACID.").unwrap()],
            fixed_now(),
            QuizConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Question(QuestionError::NoOptions(_))
        ));
    }

    #[test]
    fn question_limit_truncates() {
        let session = build_session(QuizConfig::default().with_question_limit(2));
        assert_eq!(session.questions().len(), 2);
    }

    #[test]
    fn intents_before_start_fail() {
        let mut session = QuizSession::new(
            SessionId::from_parts(1, "abcdef"),
            Category::subject("DBMS"),
            vec![question("q1")],
            fixed_now(),
            QuizConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            session.select_answer(&qid("q1"), "A", fixed_now()),
            Err(SessionError::NotStarted)
        ));
        assert!(matches!(session.advance(), Err(SessionError::NotStarted)));
    }

    #[test]
    fn reselection_overwrites_previous_choice() {
        let mut session = build_session(QuizConfig::default());
        session.select_answer(&qid("q1"), "A", fixed_now()).unwrap();
        session.select_answer(&qid("q1"), "C", fixed_now()).unwrap();
        assert_eq!(session.selected(&qid("q1")), Some("C"));
        assert_eq!(session.ledger().answered_count(), 1);
    }

    #[test]
    fn repeated_identical_selection_is_idempotent() {
        let mut session = build_session(QuizConfig::default());
        for _ in 0..3 {
            session.select_answer(&qid("q2"), "B", fixed_now()).unwrap();
        }
        assert_eq!(session.selected(&qid("q2")), Some("B"));
        assert_eq!(session.ledger().history().len(), 1);
    }

    #[test]
    fn unknown_question_and_option_are_rejected() {
        let mut session = build_session(QuizConfig::default());
        assert!(matches!(
            session.select_answer(&qid("q9"), "A", fixed_now()),
            Err(SessionError::InvalidQuestion(_))
        ));
        assert!(matches!(
            session.select_answer(&qid("q1"), "Z", fixed_now()),
            Err(SessionError::InvalidOption { .. })
        ));
        assert_eq!(session.ledger().answered_count(), 0);
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let mut session = build_session(QuizConfig::default());
        assert_eq!(session.previous().unwrap(), 0);
        assert_eq!(session.advance().unwrap(), Advance::Moved(1));
        assert_eq!(session.advance().unwrap(), Advance::Moved(2));
        assert_eq!(session.advance().unwrap(), Advance::Finish);
        assert_eq!(session.advance().unwrap(), Advance::Finish);
        assert_eq!(session.current_index(), 2);
        assert_eq!(session.previous().unwrap(), 1);
        assert_eq!(session.previous().unwrap(), 0);
        assert_eq!(session.previous().unwrap(), 0);
    }

    #[test]
    fn any_prior_question_can_be_reanswered() {
        let mut session = build_session(QuizConfig::default());
        session.advance().unwrap();
        session.advance().unwrap();
        session.select_answer(&qid("q1"), "D", fixed_now()).unwrap();
        assert_eq!(session.selected(&qid("q1")), Some("D"));
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn batch_carries_skipped_questions() {
        let mut session = build_session(QuizConfig::default());
        session.select_answer(&qid("q1"), "B", fixed_now()).unwrap();
        let pending = session.begin_finalize().unwrap();
        assert_eq!(
            pending.batch().answers,
            vec![
                (qid("q1"), Some("B".to_owned())),
                (qid("q2"), None),
                (qid("q3"), None),
            ]
        );
    }

    #[test]
    fn required_answers_block_finalize() {
        let mut session = build_session(QuizConfig::default().with_require_all_answers(true));
        session.select_answer(&qid("q1"), "B", fixed_now()).unwrap();
        assert!(matches!(
            session.begin_finalize(),
            Err(SessionError::IncompleteSession {
                answered: 1,
                required: 3
            })
        ));
        assert_eq!(session.state(), SessionState::InProgress);
    }

    #[test]
    fn dropped_finalize_reverts_to_last_question() {
        let mut session = build_session(QuizConfig::default());
        {
            let _pending = session.begin_finalize().unwrap();
        }
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.current_index(), 2);
        assert!(session.summary().is_none());
        session.select_answer(&qid("q3"), "A", fixed_now()).unwrap();
    }

    #[test]
    fn commit_scores_skipped_questions_as_incorrect() {
        let mut session = build_session(QuizConfig::default());
        session.select_answer(&qid("q1"), "B", fixed_now()).unwrap();
        session.select_answer(&qid("q2"), "A", fixed_now()).unwrap();

        let verdicts = Verdicts::from([
            (qid("q1"), verdict(true, "B")),
            (qid("q2"), verdict(false, "C")),
            // A validator claiming a skipped question is correct is ignored.
            (qid("q3"), verdict(true, "D")),
        ]);
        let pending = session.begin_finalize().unwrap();
        let summary = pending.commit(&verdicts, fixed_now()).unwrap().clone();

        assert_eq!(summary.score(), Score::Correct { correct: 1, out_of: 3 });
        assert_eq!(summary.percentage(), 33);
        let items = summary.quiz_items();
        assert_eq!(items[2].selected_label(), "Not answered");
        assert_eq!(items[1].correct_answer.as_deref(), Some("C"));

        assert_eq!(session.state(), SessionState::Completed);
        assert!(session.ledger().is_sealed());
        assert!(matches!(
            session.select_answer(&qid("q3"), "A", fixed_now()),
            Err(SessionError::Completed)
        ));
        assert!(matches!(session.previous(), Err(SessionError::Completed)));
    }
}
