pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use crate::model::{
    GameType, Golfer, Hole, LeaderboardEntry, Milestone, NewRound, Round, Score, Statistic,
    StrokeDetails, Tee,
};
use crate::score::leaderboard::{LeaderboardUpdate, RoundTotal};
use crate::score::statistics::RoundSummary;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("round {round_id} already has a score for hole {hole_number} (golfer {golfer_id})")]
    DuplicateHole {
        round_id: i64,
        hole_number: u8,
        golfer_id: i64,
    },
    #[error("round {0} was already completed")]
    RoundAlreadyCompleted(i64),
    #[error("{0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound("row".to_string()),
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<String> for StorageError {
    fn from(value: String) -> Self {
        Self::Backend(value)
    }
}

impl From<&str> for StorageError {
    fn from(value: &str) -> Self {
        Self::Backend(value.to_string())
    }
}

/// Everything one round completion writes. Stores apply it atomically: the
/// round is marked complete, milestones appended, leaderboard entries
/// changed and statistics folded in, or none of it happens.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RoundCompletion {
    pub round_id: i64,
    pub milestones: Vec<Milestone>,
    pub leaderboard: Vec<LeaderboardUpdate>,
    pub statistics: Vec<RoundSummary>,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn insert_golfer(&self, golfer: &Golfer) -> Result<(), StorageError>;
    async fn get_golfer(&self, golfer_id: i64) -> Result<Golfer, StorageError>;
    async fn insert_tee(&self, tee: &Tee, holes: &[Hole]) -> Result<(), StorageError>;
    async fn get_holes_for_tee(&self, tee_id: i64) -> Result<Vec<Hole>, StorageError>;
    async fn create_round(&self, round: &NewRound) -> Result<Round, StorageError>;
    async fn get_round(&self, round_id: i64) -> Result<Round, StorageError>;
    async fn get_scores(&self, round_id: i64) -> Result<Vec<Score>, StorageError>;

    /// Attach a score to an open round. One score per (round, hole, golfer).
    async fn record_score(
        &self,
        round_id: i64,
        hole_number: u8,
        golfer_id: i64,
        details: StrokeDetails,
    ) -> Result<Score, StorageError>;

    /// Completed rounds of `game_type` the golfer has scores in, most recent
    /// first, with the golfer's stroke total for each.
    async fn recent_rounds(
        &self,
        golfer_id: i64,
        game_type: GameType,
        limit: usize,
    ) -> Result<Vec<RoundTotal>, StorageError>;

    /// Rounds the golfer started between `start` and `end` inclusive, most
    /// recent first.
    async fn rounds_between(
        &self,
        golfer_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Round>, StorageError>;

    async fn get_leaderboard(
        &self,
        game_type: GameType,
    ) -> Result<Vec<LeaderboardEntry>, StorageError>;
    async fn get_statistic(&self, golfer_id: i64) -> Result<Option<Statistic>, StorageError>;
    async fn get_milestones(&self, golfer_id: i64) -> Result<Vec<Milestone>, StorageError>;

    /// Append one milestone outside a completion. `Ok(None)` when its key
    /// (golfer, kind, round, hole) is already stored.
    async fn append_milestone(
        &self,
        milestone: &Milestone,
    ) -> Result<Option<Milestone>, StorageError>;

    /// Apply a completion in one transaction. Returns the milestones actually
    /// appended; ones whose key already exists are skipped.
    async fn commit_round_completion(
        &self,
        completion: &RoundCompletion,
    ) -> Result<Vec<Milestone>, StorageError>;
}
