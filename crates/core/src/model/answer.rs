use serde::{Deserialize, Serialize};

/// Server-side evaluation of a spoken answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub transcript: String,
    pub score: f64,
    pub feedback: String,
}

/// What the user submitted for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerRecord {
    /// Quiz mode: the option the user picked.
    Selected { option: String },
    /// Voice mode: transcript, score and feedback returned by the evaluator.
    Evaluated(Evaluation),
}

impl AnswerRecord {
    #[must_use]
    pub fn selected(option: impl Into<String>) -> Self {
        Self::Selected {
            option: option.into(),
        }
    }

    #[must_use]
    pub fn option(&self) -> Option<&str> {
        match self {
            AnswerRecord::Selected { option } => Some(option),
            AnswerRecord::Evaluated(_) => None,
        }
    }

    #[must_use]
    pub fn evaluation(&self) -> Option<&Evaluation> {
        match self {
            AnswerRecord::Selected { .. } => None,
            AnswerRecord::Evaluated(evaluation) => Some(evaluation),
        }
    }

    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.evaluation().map(|evaluation| evaluation.score)
    }
}

/// A ledger slot as seen in session order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LedgerEntry<'a> {
    Answered(&'a AnswerRecord),
    Unanswered,
}

impl<'a> LedgerEntry<'a> {
    #[must_use]
    pub fn record(self) -> Option<&'a AnswerRecord> {
        match self {
            LedgerEntry::Answered(record) => Some(record),
            LedgerEntry::Unanswered => None,
        }
    }

    #[must_use]
    pub fn is_answered(self) -> bool {
        matches!(self, LedgerEntry::Answered(_))
    }
}
