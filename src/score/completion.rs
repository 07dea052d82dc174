use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::model::{
    GameType, HoleView, LeaderboardEntry, Milestone, MilestoneType, Round, Score, Statistic,
    StrokeDetails,
};
use crate::score::leaderboard;
use crate::score::ledger::ScoreLedger;
use crate::score::milestones;
use crate::score::statistics::RoundSummary;
use crate::storage::{RoundCompletion, Storage};

/// Which completions feed the per-golfer statistics profile.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StatsPolicy {
    #[default]
    AllGameTypes,
    SoloOnly,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub stats_policy: StatsPolicy,
    pub tournament_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stats_policy: StatsPolicy::AllGameTypes,
            tournament_window: 4,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CompletionOutcome {
    pub round_id: i64,
    pub milestones: Vec<Milestone>,
    pub leaderboard_updated: bool,
    pub statistics_updated: bool,
}

/// Numbers shown for a single round; `None` where an empty round has none.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RoundReport {
    pub round: Round,
    pub holes_played: usize,
    pub total_strokes: u32,
    pub front_nine: u32,
    pub back_nine: u32,
    pub average_per_hole: Option<f64>,
    pub best_score: Option<u32>,
    pub worst_score: Option<u32>,
    /// Views every golfer on the card has finished.
    pub complete_views: Vec<HoleView>,
}

pub struct RoundEngine<S: Storage> {
    storage: S,
    config: EngineConfig,
}

impl<S: Storage> RoundEngine<S> {
    pub fn new(storage: S, config: EngineConfig) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    async fn load_ledger(&self, round_id: i64) -> Result<ScoreLedger, EngineError> {
        let round = self.storage.get_round(round_id).await?;
        let holes = self.storage.get_holes_for_tee(round.tee_id).await?;
        let scores = self.storage.get_scores(round_id).await?;
        ScoreLedger::from_scores(round, holes, scores)
    }

    /// Record one hole for a golfer on an open round. Milestones are not
    /// detected here; that happens once, at completion.
    ///
    /// # Errors
    /// `NotFound` for an unknown round or hole, `DuplicateHole` if the golfer
    /// already scored the hole, `RoundAlreadyCompleted` once the round closed.
    pub async fn record_score(
        &self,
        round_id: i64,
        hole_number: u8,
        golfer_id: i64,
        details: StrokeDetails,
    ) -> Result<Score, EngineError> {
        for warning in details.data_quality_warnings() {
            warn!(round_id, hole_number, golfer_id, "{warning}");
        }
        Ok(self
            .storage
            .record_score(round_id, hole_number, golfer_id, details)
            .await?)
    }

    /// # Errors
    /// See [`Self::on_round_completed_at`].
    pub async fn on_round_completed(&self, round_id: i64) -> Result<CompletionOutcome, EngineError> {
        self.on_round_completed_at(round_id, Utc::now()).await
    }

    /// Run milestone detection, the game type's leaderboard strategy and the
    /// statistics accumulator for a round, then commit all of it at once.
    ///
    /// # Errors
    /// `NotFound` if the round or one of its holes is missing,
    /// `RoundAlreadyCompleted` on a second completion, `Storage` if the
    /// commit fails (in which case nothing was written).
    pub async fn on_round_completed_at(
        &self,
        round_id: i64,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, EngineError> {
        let ledger = self.load_ledger(round_id).await?;
        let round = ledger.round();
        if round.completed {
            return Err(EngineError::RoundAlreadyCompleted(round_id));
        }
        debug!(round_id, scores = ledger.hole_count(), "completing round");

        let mut found = milestones::detect_round(&ledger, now);

        let game_type = match round.game_type.parse::<GameType>() {
            Ok(game_type) => Some(game_type),
            Err(err) => {
                warn!(round_id, game_type = %round.game_type, "skipping leaderboard: {err}");
                None
            }
        };

        let plan = game_type.map(|game_type| {
            leaderboard::plan(game_type, &ledger, self.config.tournament_window, now)
        });

        let update_stats = match self.config.stats_policy {
            StatsPolicy::AllGameTypes => true,
            StatsPolicy::SoloOnly => game_type == Some(GameType::SoloPlay),
        };
        let statistics: Vec<RoundSummary> = if update_stats {
            ledger
                .golfers()
                .into_iter()
                .map(|golfer_id| {
                    let outcome = plan
                        .as_ref()
                        .and_then(|p| p.outcomes.get(&golfer_id).copied());
                    RoundSummary::from_ledger(&ledger, golfer_id, outcome)
                })
                .collect()
        } else {
            Vec::new()
        };

        let leaderboard_updates = match plan {
            Some(plan) => {
                found.extend(plan.milestones);
                plan.updates
            }
            None => Vec::new(),
        };

        let completion = RoundCompletion {
            round_id,
            milestones: found,
            leaderboard: leaderboard_updates,
            statistics,
        };
        let appended = self.storage.commit_round_completion(&completion).await?;

        let outcome = CompletionOutcome {
            round_id,
            milestones: appended,
            leaderboard_updated: !completion.leaderboard.is_empty(),
            statistics_updated: !completion.statistics.is_empty(),
        };
        info!(
            round_id,
            milestones = outcome.milestones.len(),
            leaderboard_updated = outcome.leaderboard_updated,
            statistics_updated = outcome.statistics_updated,
            "round completed"
        );
        Ok(outcome)
    }

    /// Ranked standings for a game type.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub async fn leaderboard(
        &self,
        game_type: GameType,
    ) -> Result<Vec<LeaderboardEntry>, EngineError> {
        let entries = self.storage.get_leaderboard(game_type).await?;
        Ok(leaderboard::rank_entries(entries, game_type))
    }

    /// # Errors
    /// `NotFound` for an unknown golfer.
    pub async fn statistics(&self, golfer_id: i64) -> Result<Option<Statistic>, EngineError> {
        self.storage.get_golfer(golfer_id).await?;
        Ok(self.storage.get_statistic(golfer_id).await?)
    }

    /// Every milestone a golfer has earned, oldest first.
    ///
    /// # Errors
    /// `NotFound` for an unknown golfer.
    pub async fn milestones(&self, golfer_id: i64) -> Result<Vec<Milestone>, EngineError> {
        self.storage.get_golfer(golfer_id).await?;
        Ok(self.storage.get_milestones(golfer_id).await?)
    }

    /// Record a milestone by hand, outside any round completion. A second
    /// milestone with the same (golfer, kind, round, hole) key is ignored and
    /// `Ok(None)` comes back.
    ///
    /// # Errors
    /// `NotFound` for an unknown golfer.
    pub async fn add_milestone(
        &self,
        golfer_id: i64,
        kind: MilestoneType,
        details: &str,
        date: DateTime<Utc>,
        round_id: Option<i64>,
        hole_number: Option<u8>,
    ) -> Result<Option<Milestone>, EngineError> {
        let milestone = Milestone {
            id: 0,
            golfer_id,
            kind,
            details: details.to_string(),
            date,
            round_id,
            hole_number,
        };
        let stored = self.storage.append_milestone(&milestone).await?;
        match &stored {
            Some(m) => info!(golfer_id, id = m.id, kind = kind.name(), "milestone added"),
            None => debug!(golfer_id, kind = kind.name(), "milestone already recorded"),
        }
        Ok(stored)
    }

    /// # Errors
    /// `NotFound` if the round or one of its holes is missing.
    pub async fn round_report(&self, round_id: i64) -> Result<RoundReport, EngineError> {
        let ledger = self.load_ledger(round_id).await?;
        Ok(RoundReport {
            round: ledger.round().clone(),
            holes_played: ledger.hole_count(),
            total_strokes: ledger.total_strokes(),
            front_nine: ledger.front_nine_total(),
            back_nine: ledger.back_nine_total(),
            average_per_hole: ledger.average_per_hole(),
            best_score: ledger.best_score(),
            worst_score: ledger.worst_score(),
            complete_views: ledger.complete_views(),
        })
    }

    /// # Errors
    /// Propagates storage failures.
    pub async fn rounds_between(
        &self,
        golfer_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Round>, EngineError> {
        Ok(self.storage.rounds_between(golfer_id, start, end).await?)
    }
}
