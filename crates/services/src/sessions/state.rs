use serde::Serialize;

/// Lifecycle of a quiz or interview session. Abandoning is dropping the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Created,
    InProgress,
    Finalizing,
    Completed,
}

/// Recording sub-state of an interview session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RecordingState {
    #[default]
    Idle,
    Starting,
    Recording,
    Submitting,
}

/// Outcome of moving forward in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Now on the question at this index.
    Moved(usize),
    /// Already on the last question; the session should be finalized.
    Finish,
}
