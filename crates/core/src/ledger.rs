//! Per-session store of the user's current answers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{AnswerRecord, LedgerEntry, QuestionId, QuestionSet};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("question {0} is not part of this session")]
    UnknownQuestion(QuestionId),

    #[error("ledger is sealed; the session has been finalized")]
    Sealed,
}

/// Audit entry for an accepted change to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub question_id: QuestionId,
    pub record: AnswerRecord,
    pub recorded_at: DateTime<Utc>,
}

/// Current-value answer store, keyed by question id.
///
/// `put` overwrites in place so a user can reselect freely. Every change is
/// also appended to a separate history log, which is never consulted for
/// scoring.
#[derive(Debug, Clone)]
pub struct AnswerLedger {
    order: Vec<QuestionId>,
    records: HashMap<QuestionId, AnswerRecord>,
    history: Vec<HistoryEntry>,
    sealed: bool,
}

impl AnswerLedger {
    #[must_use]
    pub fn new(questions: &QuestionSet) -> Self {
        Self {
            order: questions.ids(),
            records: HashMap::with_capacity(questions.len()),
            history: Vec::new(),
            sealed: false,
        }
    }

    /// Store `record` for `question_id`, replacing any previous value.
    ///
    /// Writing the value already stored is a no-op and leaves no history entry.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::UnknownQuestion` if the id is not in the session and
    /// `LedgerError::Sealed` once the ledger has been sealed.
    pub fn put(
        &mut self,
        question_id: &QuestionId,
        record: AnswerRecord,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if self.sealed {
            return Err(LedgerError::Sealed);
        }
        if !self.order.contains(question_id) {
            return Err(LedgerError::UnknownQuestion(question_id.clone()));
        }
        if self.records.get(question_id) == Some(&record) {
            return Ok(());
        }

        self.history.push(HistoryEntry {
            question_id: question_id.clone(),
            record: record.clone(),
            recorded_at: at,
        });
        self.records.insert(question_id.clone(), record);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, question_id: &QuestionId) -> Option<&AnswerRecord> {
        self.records.get(question_id)
    }

    /// Every question in session order, with `Unanswered` for missing entries.
    #[must_use]
    pub fn all_records(&self) -> Vec<(&QuestionId, LedgerEntry<'_>)> {
        self.order
            .iter()
            .map(|id| {
                let entry = match self.records.get(id) {
                    Some(record) => LedgerEntry::Answered(record),
                    None => LedgerEntry::Unanswered,
                };
                (id, entry)
            })
            .collect()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.records.len() == self.order.len()
    }

    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Make the ledger read-only. Idempotent.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}
