pub mod args;
pub mod error;
pub mod lookup;
pub mod model;
pub mod prefill;
pub mod score;
pub mod storage;

pub use error::EngineError;
pub use score::{CompletionOutcome, EngineConfig, RoundEngine, StatsPolicy};
pub use storage::{MemoryStorage, SqliteStorage, Storage};
