use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::CategoryKind;

/// One finished quiz or interview as recorded by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub category: String,
    pub score: f64,
    #[serde(default)]
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectBar {
    pub subject: String,
    pub average_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub total: u32,
    pub correct: u32,
    pub accuracy: f64,
}

/// Point on the score timeline, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePoint {
    pub label: String,
    pub score: f64,
    pub date: NaiveDate,
}

/// Personalized analytics returned by the report endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedReport {
    #[serde(default)]
    pub scores: Vec<ScoreEntry>,
    #[serde(default)]
    pub subject_bars: Vec<SubjectBar>,
    #[serde(default)]
    pub attempts: AttemptSummary,
}

impl PersonalizedReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty() && self.subject_bars.is_empty() && self.attempts.total == 0
    }

    /// Scores ordered by creation time and labelled `"{n}. {category}"`.
    #[must_use]
    pub fn timeline(&self) -> Vec<TimelinePoint> {
        let mut entries: Vec<&ScoreEntry> = self.scores.iter().collect();
        entries.sort_by_key(|entry| entry.created_at);
        entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| TimelinePoint {
                label: format!("{}. {}", idx + 1, entry.category),
                score: entry.score,
                date: entry.created_at.date_naive(),
            })
            .collect()
    }

    /// Rounded average score for one category kind; zero when there are no entries.
    #[must_use]
    pub fn average_for(&self, kind: CategoryKind) -> u32 {
        let (sum, count) = self
            .scores
            .iter()
            .filter(|entry| entry.kind == kind)
            .fold((0.0_f64, 0_u32), |(sum, count), entry| {
                (sum + entry.score, count + 1)
            });
        if count == 0 {
            return 0;
        }
        let average = (sum / f64::from(count)).round().max(0.0);
        // scores are bounded percentages, so the average fits.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let average = average as u32;
        average
    }

    /// Averages per kind, omitting kinds that average to zero.
    #[must_use]
    pub fn kind_averages(&self) -> Vec<(CategoryKind, u32)> {
        CategoryKind::ALL
            .into_iter()
            .map(|kind| (kind, self.average_for(kind)))
            .filter(|(_, average)| *average > 0)
            .collect()
    }

    /// `(category, score)` pairs in response order, for bar charts.
    #[must_use]
    pub fn score_bars(&self) -> Vec<(&str, f64)> {
        self.scores
            .iter()
            .map(|entry| (entry.category.as_str(), entry.score))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::time::fixed_now;

    fn entry(category: &str, score: f64, kind: CategoryKind, offset_days: i64) -> ScoreEntry {
        ScoreEntry {
            category: category.into(),
            score,
            session_id: None,
            created_at: fixed_now() + Duration::days(offset_days),
            kind,
        }
    }

    #[test]
    fn timeline_is_sorted_and_labelled() {
        let report = PersonalizedReport {
            scores: vec![
                entry("Google", 60.0, CategoryKind::Company, 2),
                entry("DBMS", 80.0, CategoryKind::Subject, 0),
            ],
            ..PersonalizedReport::default()
        };
        let timeline = report.timeline();
        assert_eq!(timeline[0].label, "1. DBMS");
        assert_eq!(timeline[1].label, "2. Google");
        assert_eq!(timeline[1].date, (fixed_now() + Duration::days(2)).date_naive());
    }

    #[test]
    fn averages_skip_empty_kinds() {
        let report = PersonalizedReport {
            scores: vec![
                entry("DBMS", 80.0, CategoryKind::Subject, 0),
                entry("OS", 65.0, CategoryKind::Subject, 1),
                entry("Backend", 40.0, CategoryKind::Role, 1),
            ],
            ..PersonalizedReport::default()
        };
        assert_eq!(report.average_for(CategoryKind::Subject), 73);
        assert_eq!(report.average_for(CategoryKind::Company), 0);
        assert_eq!(
            report.kind_averages(),
            vec![(CategoryKind::Subject, 73), (CategoryKind::Role, 40)]
        );
    }

    #[test]
    fn decodes_backend_shape() {
        let raw = r#"{
            "scores": [{"category": "DBMS", "score": 70, "createdAt": "2024-01-02T10:00:00Z", "type": "subject"}],
            "subjectBars": [{"subject": "DBMS", "averageScore": 70}],
            "attempts": {"total": 10, "correct": 7, "accuracy": 70}
        }"#;
        let report: PersonalizedReport = serde_json::from_str(raw).unwrap();
        assert_eq!(report.scores[0].kind, CategoryKind::Subject);
        assert_eq!(report.subject_bars[0].average_score, 70.0);
        assert_eq!(report.attempts.correct, 7);
        assert!(!report.is_empty());
        assert!(PersonalizedReport::default().is_empty());
    }
}
