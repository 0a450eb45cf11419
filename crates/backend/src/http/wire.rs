//! JSON shapes exchanged with the backend.

use std::collections::{BTreeMap, HashMap};

use prep_core::model::{CategoryKind, Difficulty, Question, QuestionId};
use serde::{Deserialize, Serialize};

use crate::remote::{BackendError, GeneratedSet, ValidationBatch, Verdict, Verdicts};

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub input: &'a str,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
}

/// Subjects and companies return option questions; roles return bare prompts.
#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default, alias = "title")]
    role: Option<String>,
    #[serde(default)]
    questions: Vec<WireQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireQuestion {
    Prompt(String),
    Choice(WireChoice),
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    question: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
}

impl GenerateResponse {
    pub(crate) fn into_set(self) -> Result<GeneratedSet, BackendError> {
        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(idx, question)| question.into_question(idx))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GeneratedSet {
            title: self.role,
            questions,
        })
    }
}

impl WireQuestion {
    fn into_question(self, index: usize) -> Result<Question, BackendError> {
        match self {
            WireQuestion::Prompt(prompt) => {
                Question::open_ended(QuestionId::positional(index), prompt).map_err(invalid)
            }
            WireQuestion::Choice(choice) => {
                let id = QuestionId::new(choice.id).map_err(invalid)?;
                let mut question = if choice.options.is_empty() {
                    Question::open_ended(id, choice.question)
                } else {
                    Question::multiple_choice(id, choice.question, choice.options)
                }
                .map_err(invalid)?;
                if let Some(topic) = choice.topic {
                    question = question.with_topic(topic);
                }
                if let Some(difficulty) = choice.difficulty.as_deref().and_then(parse_difficulty) {
                    question = question.with_difficulty(difficulty);
                }
                Ok(question)
            }
        }
    }
}

fn invalid(error: impl std::fmt::Display) -> BackendError {
    BackendError::InvalidResponse(error.to_string())
}

fn parse_difficulty(raw: &str) -> Option<Difficulty> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "easy" => Some(Difficulty::Easy),
        "medium" => Some(Difficulty::Medium),
        "hard" => Some(Difficulty::Hard),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ValidateRequest<'a> {
    subject: &'a str,
    #[serde(rename = "type")]
    kind: CategoryKind,
    answers: BTreeMap<&'a str, Option<&'a str>>,
}

impl<'a> From<&'a ValidationBatch> for ValidateRequest<'a> {
    fn from(batch: &'a ValidationBatch) -> Self {
        Self {
            subject: &batch.category.name,
            kind: batch.category.kind,
            answers: batch
                .answers
                .iter()
                .map(|(id, selected)| (id.as_str(), selected.as_deref()))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidateResponse {
    results: HashMap<String, WireVerdict>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVerdict {
    correct: bool,
    #[serde(default)]
    correct_answer: Option<String>,
}

impl ValidateResponse {
    pub(crate) fn into_verdicts(self) -> Result<Verdicts, BackendError> {
        self.results
            .into_iter()
            .map(|(id, verdict)| {
                let id = QuestionId::new(id).map_err(invalid)?;
                Ok((
                    id,
                    Verdict {
                        correct: verdict.correct,
                        correct_answer: verdict.correct_answer,
                    },
                ))
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AttemptRequest<'a> {
    pub question_id: &'a str,
    pub selected_option: &'a str,
    pub subject: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FinishBody<'a> {
    pub role: &'a str,
    pub scores: &'a [f64],
    pub session_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FinishResponse {
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub query: &'a str,
}

/// Error payloads carry either `error` or `message`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    pub(crate) fn message(body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.error.or(parsed.message))
            .unwrap_or_else(|| body.trim().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::Category;

    #[test]
    fn decodes_role_prompts_with_positional_ids() {
        let raw = r#"{"role":"Backend Engineer","questions":["Explain CAP.","What is sharding?"]}"#;
        let set = serde_json::from_str::<GenerateResponse>(raw)
            .unwrap()
            .into_set()
            .unwrap();
        assert_eq!(set.title.as_deref(), Some("Backend Engineer"));
        assert_eq!(set.questions[1].id().as_str(), "q2");
        assert!(set.questions[0].is_open_ended());
    }

    #[test]
    fn decodes_choice_questions() {
        let raw = r#"{"questions":[{"_id":"65f1","question":"Which is ACID?","options":["A","B"],"difficulty":"Hard"}]}"#;
        let set = serde_json::from_str::<GenerateResponse>(raw)
            .unwrap()
            .into_set()
            .unwrap();
        let question = &set.questions[0];
        assert_eq!(question.id().as_str(), "65f1");
        assert_eq!(question.options(), ["A", "B"]);
        assert_eq!(question.difficulty(), Some(Difficulty::Hard));
    }

    #[test]
    fn validate_request_keeps_skipped_questions_as_null() {
        let batch = ValidationBatch {
            category: Category::subject("DBMS"),
            answers: vec![
                (QuestionId::new("q1").unwrap(), Some("B".into())),
                (QuestionId::new("q3").unwrap(), None),
            ],
        };
        let json = serde_json::to_value(ValidateRequest::from(&batch)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"subject": "DBMS", "type": "subject", "answers": {"q1": "B", "q3": null}})
        );
    }

    #[test]
    fn error_body_prefers_error_field() {
        assert_eq!(ErrorBody::message(r#"{"error":"Invalid token"}"#), "Invalid token");
        assert_eq!(ErrorBody::message(r#"{"message":"Busy"}"#), "Busy");
        assert_eq!(ErrorBody::message("Bad Gateway "), "Bad Gateway");
    }
}
