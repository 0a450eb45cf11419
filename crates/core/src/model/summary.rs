use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::{QuestionId, SessionId, SessionMode};

/// Label shown for questions the user skipped.
pub const NOT_ANSWERED: &str = "Not answered";

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SummaryError {
    #[error("invalid score total {total} (out of {out_of})")]
    InvalidTotal { total: f64, out_of: f64 },

    #[error("too many questions for a single session: {len}")]
    TooManyItems { len: usize },
}

//
// ─── ITEMS ─────────────────────────────────────────────────────────────────────
//

/// Per-question outcome of a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question_id: QuestionId,
    pub prompt: String,
    pub selected: Option<String>,
    pub correct: bool,
    pub correct_answer: Option<String>,
}

impl QuizItem {
    #[must_use]
    pub fn selected_label(&self) -> &str {
        self.selected.as_deref().unwrap_or(NOT_ANSWERED)
    }
}

/// Per-question outcome of a voice interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewItem {
    pub question_id: QuestionId,
    pub prompt: String,
    pub transcript: String,
    pub score: f64,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "items", rename_all = "lowercase")]
pub enum ResultItems {
    Quiz(Vec<QuizItem>),
    Interview(Vec<InterviewItem>),
}

/// Aggregate score; quiz scores are whole correct answers, interview totals
/// come from the remote evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Score {
    Correct { correct: u32, out_of: u32 },
    Points { total: f64, out_of: f64 },
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Correct { correct, out_of } => write!(f, "{correct}/{out_of}"),
            Score::Points { total, out_of } => write!(f, "{total}/{out_of}"),
        }
    }
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

/// Immutable result of a finalized session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    session_id: SessionId,
    completed_at: DateTime<Utc>,
    score: Score,
    percentage: u32,
    items: ResultItems,
}

impl ResultSummary {
    /// Build a quiz summary. A skipped question never counts as correct,
    /// whatever flag it carries.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::TooManyItems` if the item count cannot fit in `u32`.
    pub fn from_quiz(
        session_id: SessionId,
        completed_at: DateTime<Utc>,
        mut items: Vec<QuizItem>,
    ) -> Result<Self, SummaryError> {
        for item in &mut items {
            if item.selected.is_none() {
                item.correct = false;
            }
        }
        let out_of = u32::try_from(items.len())
            .map_err(|_| SummaryError::TooManyItems { len: items.len() })?;
        let correct = u32::try_from(items.iter().filter(|item| item.correct).count())
            .map_err(|_| SummaryError::TooManyItems { len: items.len() })?;
        let percentage = rounded_percent(u64::from(correct), u64::from(out_of));

        Ok(Self {
            session_id,
            completed_at,
            score: Score::Correct { correct, out_of },
            percentage,
            items: ResultItems::Quiz(items),
        })
    }

    /// Build an interview summary around the total returned by the evaluator.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::InvalidTotal` if `total` is negative or not finite,
    /// or `out_of` is not positive.
    pub fn from_interview(
        session_id: SessionId,
        completed_at: DateTime<Utc>,
        items: Vec<InterviewItem>,
        total: f64,
        out_of: f64,
    ) -> Result<Self, SummaryError> {
        if !total.is_finite() || total < 0.0 || !out_of.is_finite() || out_of <= 0.0 {
            return Err(SummaryError::InvalidTotal { total, out_of });
        }
        let ratio = (total / out_of).min(1.0);
        // ratio is within [0, 1], so the rounded value fits.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percentage = (ratio * 100.0).round() as u32;

        Ok(Self {
            session_id,
            completed_at,
            score: Score::Points { total, out_of },
            percentage,
            items: ResultItems::Interview(items),
        })
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        match self.items {
            ResultItems::Quiz(_) => SessionMode::Quiz,
            ResultItems::Interview(_) => SessionMode::Interview,
        }
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    #[must_use]
    pub fn items(&self) -> &ResultItems {
        &self.items
    }

    #[must_use]
    pub fn quiz_items(&self) -> &[QuizItem] {
        match &self.items {
            ResultItems::Quiz(items) => items,
            ResultItems::Interview(_) => &[],
        }
    }

    #[must_use]
    pub fn interview_items(&self) -> &[InterviewItem] {
        match &self.items {
            ResultItems::Quiz(_) => &[],
            ResultItems::Interview(items) => items,
        }
    }
}

/// Whole percentage of `part` in `whole`, rounded half up; 0 for an empty whole.
fn rounded_percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    let percent = (part.min(whole) * 100 + whole / 2) / whole;
    // part <= whole keeps this at most 100
    u32::try_from(percent).unwrap_or(100)
}
