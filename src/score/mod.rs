pub mod completion;
pub mod leaderboard;
pub mod ledger;
pub mod milestones;
pub mod statistics;

pub use completion::*;
pub use ledger::{LedgerEntry, LedgerError, ScoreLedger};
