use std::sync::Arc;

use backend::StudyChat;
use prep_core::model::{ChatMessage, ChatSource};
use tracing::{debug, warn};

use crate::Clock;
use crate::error::ChatError;

/// A conversation with the study assistant.
///
/// Keeps the transcript and the sources behind the latest answer.
pub struct StudyAssistant {
    clock: Clock,
    chat: Arc<dyn StudyChat>,
    messages: Vec<ChatMessage>,
    sources: Vec<ChatSource>,
}

impl StudyAssistant {
    #[must_use]
    pub fn new(clock: Clock, chat: Arc<dyn StudyChat>) -> Self {
        Self {
            clock,
            chat,
            messages: Vec::new(),
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Sources of the latest successful answer.
    #[must_use]
    pub fn sources(&self) -> &[ChatSource] {
        &self.sources
    }

    /// Ask `query` and append the answer to the conversation.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyQuery` for blank input, `ChatError::Unauthenticated`
    /// without a token, and `ChatError::Backend` when the call fails; in that last
    /// case an `Error: ...` reply is appended too.
    pub async fn ask(&mut self, query: &str) -> Result<&ChatMessage, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyQuery);
        }
        self.messages.push(ChatMessage::user(query, self.clock.now()));
        debug!(chars = query.len(), "asking study assistant");

        match self.chat.ask(query).await.map_err(ChatError::from) {
            Ok(reply) => {
                self.sources = reply.sources;
                Ok(self.push_reply(reply.answer))
            }
            Err(ChatError::Unauthenticated) => Err(ChatError::Unauthenticated),
            Err(err) => {
                warn!(error = %err, "study assistant request failed");
                self.push_reply(format!("Error: {err}"));
                Err(err)
            }
        }
    }

    /// Forget the conversation.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.sources.clear();
    }

    fn push_reply(&mut self, content: String) -> &ChatMessage {
        let message = ChatMessage::assistant(content, self.clock.now());
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{BackendError, Credentials, InMemoryBackend, Operation};
    use prep_core::model::{ChatReply, ChatRole};
    use prep_core::time::fixed_clock;

    fn assistant(backend: &InMemoryBackend) -> StudyAssistant {
        StudyAssistant::new(fixed_clock(), Arc::new(backend.clone()))
    }

    #[tokio::test]
    async fn answer_and_sources_are_kept() {
        let backend = InMemoryBackend::new(Credentials::with_token("t"));
        backend.push_chat_reply(ChatReply {
            answer: "Review normalization.".into(),
            sources: vec![ChatSource {
                subject: "DBMS".into(),
                topic: "Normal forms".into(),
                accuracy: 40.0,
                similarity: 0.87,
            }],
        });
        let mut chat = assistant(&backend);

        let reply = chat.ask("what should I study?").await.unwrap();
        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(reply.content, "Review normalization.");
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[0].role, ChatRole::User);
        assert_eq!(chat.sources().len(), 1);
    }

    #[tokio::test]
    async fn blank_query_sends_nothing() {
        let backend = InMemoryBackend::new(Credentials::with_token("t"));
        let mut chat = assistant(&backend);
        assert!(matches!(chat.ask("  ").await, Err(ChatError::EmptyQuery)));
        assert!(chat.messages().is_empty());
        assert_eq!(backend.calls(Operation::Chat), 0);
    }

    #[tokio::test]
    async fn failure_appends_error_reply() {
        let backend = InMemoryBackend::new(Credentials::with_token("t"));
        backend.fail_next(
            Operation::Chat,
            BackendError::Status {
                status: 500,
                message: "vector store offline".into(),
            },
        );
        let mut chat = assistant(&backend);

        assert!(chat.ask("deadlocks?").await.is_err());
        let last = chat.messages().last().unwrap();
        assert_eq!(last.content, "Error: vector store offline");
    }

    #[tokio::test]
    async fn missing_token_asks_to_log_in() {
        let backend = InMemoryBackend::new(Credentials::anonymous());
        let mut chat = assistant(&backend);
        let err = chat.ask("deadlocks?").await.unwrap_err();
        assert_eq!(err.to_string(), "Authentication required. Please log in.");
        assert_eq!(chat.messages().len(), 1);
    }
}
