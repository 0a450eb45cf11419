#![forbid(unsafe_code)]

pub mod ledger;
pub mod model;
pub mod time;

pub use ledger::{AnswerLedger, HistoryEntry, LedgerError};
pub use time::Clock;
