use std::sync::Arc;

use backend::{BackendError, ReportSource};
use prep_core::model::PersonalizedReport;
use tracing::{debug, warn};

pub const SIGN_IN_NOTICE: &str = "You need to sign in to view your personalized report.";

/// What the report screen shows: the report, or an empty one with a notice.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportView {
    pub report: PersonalizedReport,
    pub notice: Option<String>,
}

impl ReportView {
    fn notice(message: impl Into<String>) -> Self {
        Self {
            report: PersonalizedReport::default(),
            notice: Some(message.into()),
        }
    }
}

#[derive(Clone)]
pub struct ReportService {
    reports: Arc<dyn ReportSource>,
}

impl ReportService {
    #[must_use]
    pub fn new(reports: Arc<dyn ReportSource>) -> Self {
        Self { reports }
    }

    /// Fetch the personalized report.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on authentication, transport or decode failures.
    pub async fn fetch(&self) -> Result<PersonalizedReport, BackendError> {
        let report = self.reports.personalized_report().await?;
        debug!(
            scores = report.scores.len(),
            subjects = report.subject_bars.len(),
            "personalized report loaded"
        );
        Ok(report)
    }

    /// Fetch the report for display. Failures become an empty report with a notice.
    pub async fn load(&self) -> ReportView {
        match self.fetch().await {
            Ok(report) => ReportView {
                report,
                notice: None,
            },
            Err(BackendError::Unauthenticated) => ReportView::notice(SIGN_IN_NOTICE),
            Err(err) => {
                warn!(error = %err, "could not load personalized report");
                ReportView::notice(err.user_message())
            }
        }
    }
}
