mod base;
mod ids;
mod interview;
mod progress;
mod quiz;
mod scoring;
mod state;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use interview::{
    InterviewConfig, InterviewSession, PendingFinish, PendingStart, PendingSubmission,
};
pub use progress::SessionProgress;
pub use quiz::{PendingFinalize, QuizConfig, QuizSession};
pub use scoring::AttemptReport;
pub use state::{Advance, RecordingState, SessionState};
pub use workflow::{InterviewStep, QuizOutcome, QuizStep, SessionLoopService};
