#![forbid(unsafe_code)]

pub mod app_services;
pub mod assistant_service;
pub mod error;
pub mod question_service;
pub mod recording;
pub mod report_service;
pub mod sessions;

pub use prep_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use assistant_service::StudyAssistant;
pub use error::{AppServicesError, ChatError, GenerationError, SessionError};
pub use question_service::{GeneratedQuestions, QuestionService};
pub use recording::{CaptureError, ClipFileDevice, MemoryDevice, RecordingDevice, StartBehavior};
pub use report_service::{ReportService, ReportView};

pub use sessions::{
    Advance, AttemptReport, InterviewConfig, InterviewSession, InterviewStep, QuizConfig,
    QuizOutcome, QuizSession, QuizStep, RecordingState, SessionLoopService, SessionProgress,
    SessionState,
};
