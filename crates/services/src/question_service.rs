use std::sync::Arc;

use backend::QuestionGenerator;
use prep_core::model::{Category, CategoryKind, Question};
use tracing::{debug, info};

use crate::error::GenerationError;

/// Questions generated for one subject, company or role.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuestions {
    pub category: Category,
    /// Title echoed by the backend, e.g. the normalized role name.
    pub title: Option<String>,
    pub questions: Vec<Question>,
}

impl GeneratedQuestions {
    /// Title to show: the backend's when present, the user's input otherwise.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.category.name)
    }
}

/// One generation flow for every category kind.
#[derive(Clone)]
pub struct QuestionService {
    generator: Arc<dyn QuestionGenerator>,
}

impl QuestionService {
    #[must_use]
    pub fn new(generator: Arc<dyn QuestionGenerator>) -> Self {
        Self { generator }
    }

    /// Generate questions for `input` of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::EmptyInput` for blank input,
    /// `GenerationError::NoQuestions` for an empty result, and backend failures.
    pub async fn generate(
        &self,
        kind: CategoryKind,
        input: &str,
    ) -> Result<GeneratedQuestions, GenerationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(GenerationError::EmptyInput);
        }
        let category = Category::new(kind, input);
        debug!(%category, "generating questions");

        let set = self.generator.generate(&category).await?;
        if set.questions.is_empty() {
            return Err(GenerationError::NoQuestions);
        }
        info!(%category, count = set.questions.len(), "questions generated");
        Ok(GeneratedQuestions {
            category,
            title: set.title,
            questions: set.questions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{Credentials, GeneratedSet, InMemoryBackend, Operation};
    use prep_core::model::QuestionId;

    fn service(backend: &InMemoryBackend) -> QuestionService {
        QuestionService::new(Arc::new(backend.clone()))
    }

    #[tokio::test]
    async fn blank_input_is_rejected_without_a_call() {
        let backend = InMemoryBackend::new(Credentials::with_token("t"));
        let err = service(&backend)
            .generate(CategoryKind::Subject, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyInput));
        assert_eq!(backend.calls(Operation::Generate), 0);
    }

    #[tokio::test]
    async fn empty_bank_reports_no_questions() {
        let backend = InMemoryBackend::new(Credentials::with_token("t"));
        let err = service(&backend)
            .generate(CategoryKind::Company, "Acme")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No questions found");
    }

    #[tokio::test]
    async fn role_prompts_keep_backend_title() {
        let backend = InMemoryBackend::new(Credentials::with_token("t"));
        backend.add_question_bank(
            &Category::role("backend engineer"),
            GeneratedSet {
                title: Some("Backend Engineer".into()),
                questions: vec![
                    Question::open_ended(QuestionId::positional(0), "Explain CAP.").unwrap(),
                ],
            },
        );
        let generated = service(&backend)
            .generate(CategoryKind::Role, " Backend Engineer ")
            .await
            .unwrap();
        assert_eq!(generated.category, Category::role("Backend Engineer"));
        assert_eq!(generated.display_title(), "Backend Engineer");
        assert_eq!(generated.questions.len(), 1);
    }

    #[tokio::test]
    async fn missing_token_is_reported() {
        let backend = InMemoryBackend::new(Credentials::anonymous());
        let err = service(&backend)
            .generate(CategoryKind::Subject, "DBMS")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Unauthenticated));
    }
}
