mod answer;
mod audio;
mod category;
mod chat;
mod ids;
mod question;
mod report;
mod summary;

pub use answer::{AnswerRecord, Evaluation, LedgerEntry};
pub use audio::AudioClip;
pub use category::{Category, CategoryKind};
pub use chat::{ChatMessage, ChatReply, ChatRole, ChatSource};
pub use ids::{IdError, QuestionId, SessionId};
pub use question::{Difficulty, Question, QuestionError, QuestionSet, SessionMode};
pub use report::{AttemptSummary, PersonalizedReport, ScoreEntry, SubjectBar, TimelinePoint};
pub use summary::{
    InterviewItem, NOT_ANSWERED, QuizItem, ResultItems, ResultSummary, Score, SummaryError,
};
