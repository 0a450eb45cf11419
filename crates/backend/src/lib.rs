#![forbid(unsafe_code)]

pub mod credentials;
pub mod http;
pub mod memory;
pub mod remote;

pub use credentials::Credentials;
pub use http::{BackendConfig, ConfigError, HttpBackend};
pub use memory::{InMemoryBackend, Operation};
pub use remote::{
    AttemptRecord, Backend, BackendError, FinishRequest, GeneratedSet, InterviewEvaluator,
    QuestionGenerator, QuizGrader, RecordedAnswer, ReportSource, StudyChat, ValidationBatch,
    Verdict, Verdicts,
};
