use ahash::RandomState;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use super::{RoundCompletion, Storage, StorageError};
use crate::model::{
    GameType, Golfer, Hole, LeaderboardEntry, Milestone, MilestoneKey, NewRound, Round, Score,
    Statistic, StrokeDetails, Tee,
};
use crate::score::leaderboard::{RoundTotal, ScoreChange};
use crate::score::statistics;

type Map<K, V> = HashMap<K, V, RandomState>;

#[derive(Default)]
struct MemoryState {
    golfers: Map<i64, Golfer>,
    tees: Map<i64, Tee>,
    holes: Map<i64, Vec<Hole>>,
    rounds: Map<i64, Round>,
    scores: Vec<Score>,
    leaderboard: Map<(i64, GameType), i64>,
    statistics: Map<i64, Statistic>,
    milestones: Vec<Milestone>,
    milestone_keys: HashSet<MilestoneKey, RandomState>,
    next_round_id: i64,
    next_score_id: i64,
    next_milestone_id: i64,
}

impl MemoryState {
    fn round(&self, round_id: i64) -> Result<&Round, StorageError> {
        self.rounds
            .get(&round_id)
            .ok_or_else(|| StorageError::NotFound(format!("round {round_id}")))
    }

    fn round_total(&self, round_id: i64, golfer_id: i64) -> u32 {
        self.scores
            .iter()
            .filter(|s| s.round_id == round_id && s.golfer_id == golfer_id)
            .map(Score::strokes)
            .fold(0, u32::saturating_add)
    }

    fn recent_rounds(&self, golfer_id: i64, game_type: GameType, limit: usize) -> Vec<RoundTotal> {
        let mut totals: Vec<RoundTotal> = self
            .rounds
            .values()
            .filter(|r| r.completed && r.game_type.parse::<GameType>().ok() == Some(game_type))
            .filter(|r| {
                self.scores
                    .iter()
                    .any(|s| s.round_id == r.id && s.golfer_id == golfer_id)
            })
            .map(|r| RoundTotal {
                round_id: r.id,
                date_played: r.date_played,
                total_strokes: self.round_total(r.id, golfer_id),
            })
            .collect();
        totals.sort_by(|a, b| {
            b.date_played
                .cmp(&a.date_played)
                .then_with(|| b.round_id.cmp(&a.round_id))
        });
        totals.truncate(limit);
        totals
    }

    /// `None` when a milestone with the same key is already stored.
    fn append_milestone(&mut self, milestone: &Milestone) -> Option<Milestone> {
        if !self.milestone_keys.insert(milestone.key()) {
            return None;
        }
        self.next_milestone_id += 1;
        let mut stored = milestone.clone();
        stored.id = self.next_milestone_id;
        self.milestones.push(stored.clone());
        Some(stored)
    }
}

/// Process-local store behind one write lock; every trait call is atomic.
#[derive(Default)]
pub struct MemoryStorage {
    state: RwLock<MemoryState>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn insert_golfer(&self, golfer: &Golfer) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        state.golfers.insert(golfer.id, golfer.clone());
        Ok(())
    }

    async fn get_golfer(&self, golfer_id: i64) -> Result<Golfer, StorageError> {
        let state = self.state.read().await;
        state
            .golfers
            .get(&golfer_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("golfer {golfer_id}")))
    }

    async fn insert_tee(&self, tee: &Tee, holes: &[Hole]) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        state.tees.insert(tee.id, tee.clone());
        let mut sorted = holes.to_vec();
        sorted.sort_by_key(|h| h.number);
        state.holes.insert(tee.id, sorted);
        Ok(())
    }

    async fn get_holes_for_tee(&self, tee_id: i64) -> Result<Vec<Hole>, StorageError> {
        let state = self.state.read().await;
        if !state.tees.contains_key(&tee_id) {
            return Err(StorageError::NotFound(format!("tee {tee_id}")));
        }
        Ok(state.holes.get(&tee_id).cloned().unwrap_or_default())
    }

    async fn create_round(&self, round: &NewRound) -> Result<Round, StorageError> {
        let mut state = self.state.write().await;
        if !state.golfers.contains_key(&round.golfer_id) {
            return Err(StorageError::NotFound(format!("golfer {}", round.golfer_id)));
        }
        if !state.tees.contains_key(&round.tee_id) {
            return Err(StorageError::NotFound(format!("tee {}", round.tee_id)));
        }
        state.next_round_id += 1;
        let created = Round {
            id: state.next_round_id,
            golfer_id: round.golfer_id,
            tee_id: round.tee_id,
            game_type: round.game_type.clone(),
            date_played: round.date_played,
            completed: false,
        };
        state.rounds.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_round(&self, round_id: i64) -> Result<Round, StorageError> {
        let state = self.state.read().await;
        state.round(round_id).cloned()
    }

    async fn get_scores(&self, round_id: i64) -> Result<Vec<Score>, StorageError> {
        let state = self.state.read().await;
        state.round(round_id)?;
        Ok(state
            .scores
            .iter()
            .filter(|s| s.round_id == round_id)
            .cloned()
            .collect())
    }

    async fn record_score(
        &self,
        round_id: i64,
        hole_number: u8,
        golfer_id: i64,
        details: StrokeDetails,
    ) -> Result<Score, StorageError> {
        let mut state = self.state.write().await;
        let round = state.round(round_id)?;
        if round.completed {
            return Err(StorageError::RoundAlreadyCompleted(round_id));
        }
        let hole_id = state
            .holes
            .get(&round.tee_id)
            .and_then(|holes| holes.iter().find(|h| h.number == hole_number))
            .map(|h| h.id)
            .ok_or_else(|| StorageError::NotFound(format!("hole {hole_number}")))?;
        if state
            .scores
            .iter()
            .any(|s| s.round_id == round_id && s.hole_id == hole_id && s.golfer_id == golfer_id)
        {
            return Err(StorageError::DuplicateHole {
                round_id,
                hole_number,
                golfer_id,
            });
        }
        state.next_score_id += 1;
        let score = Score {
            id: state.next_score_id,
            round_id,
            hole_id,
            golfer_id,
            details,
        };
        state.scores.push(score.clone());
        Ok(score)
    }

    async fn recent_rounds(
        &self,
        golfer_id: i64,
        game_type: GameType,
        limit: usize,
    ) -> Result<Vec<RoundTotal>, StorageError> {
        let state = self.state.read().await;
        Ok(state.recent_rounds(golfer_id, game_type, limit))
    }

    async fn rounds_between(
        &self,
        golfer_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Round>, StorageError> {
        let state = self.state.read().await;
        let mut rounds: Vec<Round> = state
            .rounds
            .values()
            .filter(|r| r.golfer_id == golfer_id && r.date_played >= start && r.date_played <= end)
            .cloned()
            .collect();
        rounds.sort_by(|a, b| {
            b.date_played
                .cmp(&a.date_played)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(rounds)
    }

    async fn get_leaderboard(
        &self,
        game_type: GameType,
    ) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let state = self.state.read().await;
        let mut entries: Vec<LeaderboardEntry> = state
            .leaderboard
            .iter()
            .filter(|((_, gt), _)| *gt == game_type)
            .map(|(&(golfer_id, game_type), &score)| LeaderboardEntry {
                golfer_id,
                game_type,
                score,
                position: None,
            })
            .collect();
        entries.sort_by_key(|e| e.golfer_id);
        Ok(entries)
    }

    async fn get_statistic(&self, golfer_id: i64) -> Result<Option<Statistic>, StorageError> {
        let state = self.state.read().await;
        Ok(state.statistics.get(&golfer_id).cloned())
    }

    async fn get_milestones(&self, golfer_id: i64) -> Result<Vec<Milestone>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .milestones
            .iter()
            .filter(|m| m.golfer_id == golfer_id)
            .cloned()
            .collect())
    }

    async fn append_milestone(
        &self,
        milestone: &Milestone,
    ) -> Result<Option<Milestone>, StorageError> {
        let mut state = self.state.write().await;
        if !state.golfers.contains_key(&milestone.golfer_id) {
            return Err(StorageError::NotFound(format!("golfer {}", milestone.golfer_id)));
        }
        Ok(state.append_milestone(milestone))
    }

    async fn commit_round_completion(
        &self,
        completion: &RoundCompletion,
    ) -> Result<Vec<Milestone>, StorageError> {
        let mut state = self.state.write().await;
        if state.round(completion.round_id)?.completed {
            return Err(StorageError::RoundAlreadyCompleted(completion.round_id));
        }

        let appended: Vec<Milestone> = completion
            .milestones
            .iter()
            .filter_map(|milestone| state.append_milestone(milestone))
            .collect();

        for update in &completion.leaderboard {
            let key = (update.golfer_id, update.game_type);
            let prior = state.leaderboard.get(&key).copied();
            let history = match update.change {
                ScoreChange::Window { window, .. } => {
                    state.recent_rounds(update.golfer_id, update.game_type, window)
                }
                _ => Vec::new(),
            };
            let score = update.change.apply(prior, &history);
            state.leaderboard.insert(key, score);
        }

        for summary in &completion.statistics {
            let existing = state.statistics.remove(&summary.golfer_id);
            let updated = statistics::accumulate(existing, summary);
            state.statistics.insert(summary.golfer_id, updated);
        }

        if let Some(round) = state.rounds.get_mut(&completion.round_id) {
            round.completed = true;
        }
        Ok(appended)
    }
}
