use std::sync::Arc;

use backend::{
    AttemptRecord, BackendError, FinishRequest, InterviewEvaluator, QuizGrader, RecordedAnswer,
    ValidationBatch, Verdicts,
};
use prep_core::model::{Category, Evaluation, ResultSummary};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::SessionError;

/// Outcome of the best-effort attempt recording after a quiz.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttemptReport {
    pub recorded: usize,
    pub already_attempted: usize,
    pub failed: usize,
}

/// Remote side of quiz finalization.
#[derive(Clone)]
pub(crate) struct QuizReconciler {
    grader: Arc<dyn QuizGrader>,
}

impl QuizReconciler {
    pub(crate) fn new(grader: Arc<dyn QuizGrader>) -> Self {
        Self { grader }
    }

    pub(crate) async fn validate(&self, batch: &ValidationBatch) -> Result<Verdicts, SessionError> {
        debug!(
            category = %batch.category,
            answers = batch.answers.len(),
            "validating quiz answers"
        );
        self.grader
            .validate_answers(batch)
            .await
            .map_err(SessionError::validation)
    }

    /// Record every answered question, one at a time. Never fails.
    pub(crate) async fn record_attempts(
        &self,
        category: &Category,
        summary: &ResultSummary,
    ) -> AttemptReport {
        let mut report = AttemptReport::default();
        for item in summary.quiz_items() {
            let Some(selected) = &item.selected else {
                continue;
            };
            let attempt = AttemptRecord {
                question_id: item.question_id.clone(),
                selected: selected.clone(),
                category: category.clone(),
            };
            match self.grader.record_attempt(&attempt).await {
                Ok(()) => report.recorded += 1,
                // 409: attempted in an earlier session.
                Err(BackendError::Conflict) => {
                    debug!(question_id = %item.question_id, "attempt already recorded");
                    report.already_attempted += 1;
                }
                Err(err) => {
                    warn!(question_id = %item.question_id, error = %err, "failed to record attempt");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

/// Remote side of interview answering and finalization.
#[derive(Clone)]
pub(crate) struct InterviewReconciler {
    evaluator: Arc<dyn InterviewEvaluator>,
}

impl InterviewReconciler {
    pub(crate) fn new(evaluator: Arc<dyn InterviewEvaluator>) -> Self {
        Self { evaluator }
    }

    pub(crate) async fn evaluate(&self, answer: &RecordedAnswer) -> Result<Evaluation, SessionError> {
        debug!(
            session_id = %answer.session_id,
            index = answer.index,
            bytes = answer.clip.len(),
            "submitting recorded answer"
        );
        self.evaluator
            .submit_answer(answer)
            .await
            .map_err(SessionError::evaluation)
    }

    pub(crate) async fn finish(&self, request: &FinishRequest) -> Result<f64, SessionError> {
        debug!(
            session_id = %request.session_id,
            scores = ?request.scores,
            "finishing interview"
        );
        self.evaluator
            .finish_interview(request)
            .await
            .map_err(SessionError::finalization)
    }
}
