use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("multiple-choice question {0} has no options")]
    NoOptions(QuestionId),

    #[error("question {0} has a blank option")]
    BlankOption(QuestionId),

    #[error("a session needs at least one question")]
    EmptySet,

    #[error("duplicate question id in session: {0}")]
    DuplicateId(QuestionId),
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// Whether questions are answered by picking an option or by speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Quiz,
    Interview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A single question. Immutable once a session has been created from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    topic: Option<String>,
    difficulty: Option<Difficulty>,
}

impl Question {
    /// Builds a quiz question with an ordered list of selectable options.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, there are no options,
    /// or any option is blank.
    pub fn multiple_choice(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = normalize_prompt(prompt.into())?;
        if options.is_empty() {
            return Err(QuestionError::NoOptions(id));
        }
        if options.iter().any(|option| option.trim().is_empty()) {
            return Err(QuestionError::BlankOption(id));
        }
        Ok(Self {
            id,
            prompt,
            options,
            topic: None,
            difficulty: None,
        })
    }

    /// Builds an open-ended question answered by voice.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPrompt` if the prompt is blank.
    pub fn open_ended(id: QuestionId, prompt: impl Into<String>) -> Result<Self, QuestionError> {
        Ok(Self {
            id,
            prompt: normalize_prompt(prompt.into())?,
            options: Vec::new(),
            topic: None,
            difficulty: None,
        })
    }

    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    #[must_use]
    pub fn is_open_ended(&self) -> bool {
        self.options.is_empty()
    }

    #[must_use]
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|option| option == value)
    }
}

fn normalize_prompt(prompt: String) -> Result<String, QuestionError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(QuestionError::EmptyPrompt);
    }
    Ok(trimmed.to_owned())
}

//
// ─── QUESTION SET ─────────────────────────────────────────────────────────────
//

/// Ordered, non-empty list of questions with unique ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    /// # Errors
    ///
    /// Returns `QuestionError::EmptySet` for an empty list and
    /// `QuestionError::DuplicateId` when two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionError> {
        if questions.is_empty() {
            return Err(QuestionError::EmptySet);
        }
        for (idx, question) in questions.iter().enumerate() {
            if questions[..idx].iter().any(|prev| prev.id == question.id) {
                return Err(QuestionError::DuplicateId(question.id.clone()));
            }
        }
        Ok(Self { questions })
    }

    /// Keeps only the first `limit` questions.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptySet` if `limit` is zero.
    pub fn truncated(mut self, limit: usize) -> Result<Self, QuestionError> {
        if limit == 0 {
            return Err(QuestionError::EmptySet);
        }
        self.questions.truncate(limit);
        Ok(self)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn find(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| &question.id == id)
    }

    #[must_use]
    pub fn position(&self, id: &QuestionId) -> Option<usize> {
        self.questions.iter().position(|question| &question.id == id)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<QuestionId> {
        self.questions.iter().map(|q| q.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qid(raw: &str) -> QuestionId {
        QuestionId::new(raw).unwrap()
    }

    #[test]
    fn multiple_choice_requires_options() {
        let err = Question::multiple_choice(qid("q1"), "What is a mutex?", Vec::new()).unwrap_err();
        assert_eq!(err, QuestionError::NoOptions(qid("q1")));

        let err = Question::multiple_choice(qid("q1"), "What is a mutex?", vec!["A".into(), " ".into()])
            .unwrap_err();
        assert_eq!(err, QuestionError::BlankOption(qid("q1")));
    }

    #[test]
    fn open_ended_trims_prompt() {
        let question = Question::open_ended(qid("q1"), "  Tell me about yourself. ").unwrap();
        assert_eq!(question.prompt(), "Tell me about yourself.");
        assert!(question.is_open_ended());
        assert!(Question::open_ended(qid("q2"), "   ").is_err());
    }

    #[test]
    fn question_set_rejects_empty_and_duplicates() {
        assert_eq!(QuestionSet::new(Vec::new()).unwrap_err(), QuestionError::EmptySet);

        let a = Question::open_ended(qid("q1"), "One").unwrap();
        let b = Question::open_ended(qid("q1"), "Two").unwrap();
        assert_eq!(
            QuestionSet::new(vec![a, b]).unwrap_err(),
            QuestionError::DuplicateId(qid("q1"))
        );
    }

    #[test]
    fn truncation_keeps_order() {
        let questions = (0..5)
            .map(|i| Question::open_ended(QuestionId::positional(i), format!("Prompt {i}")).unwrap())
            .collect();
        let set = QuestionSet::new(questions).unwrap().truncated(3).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.position(&qid("q3")), Some(2));
        assert!(set.find(&qid("q4")).is_none());
    }
}
