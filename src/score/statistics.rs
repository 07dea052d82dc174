use serde::Serialize;

use crate::model::{CategoryCounts, Statistic};
use crate::score::leaderboard::RoundOutcome;
use crate::score::ledger::ScoreLedger;

/// What one golfer did in one round, reduced to the values the running
/// profile folds in.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct RoundSummary {
    pub golfer_id: i64,
    pub total_strokes: u32,
    pub total_putts: u32,
    pub fairways_hit: u32,
    pub fairway_opportunities: u32,
    pub greens_hit: u32,
    pub holes_played: u32,
    pub categories: CategoryCounts,
    pub outcome: Option<RoundOutcome>,
}

impl RoundSummary {
    /// Summarise `golfer_id`'s card in `ledger`.
    #[must_use]
    pub fn from_ledger(ledger: &ScoreLedger, golfer_id: i64, outcome: Option<RoundOutcome>) -> Self {
        let card = ledger.for_golfer(golfer_id);
        let mut summary = Self {
            golfer_id,
            total_strokes: card.total_strokes(),
            total_putts: 0,
            fairways_hit: 0,
            fairway_opportunities: 0,
            greens_hit: 0,
            holes_played: 0,
            categories: card.category_counts(),
            outcome,
        };
        for entry in card.entries() {
            let details = &entry.score.details;
            summary.holes_played = summary.holes_played.saturating_add(1);
            summary.total_putts = summary.total_putts.saturating_add(details.putts);
            if details.green_in_regulation {
                summary.greens_hit = summary.greens_hit.saturating_add(1);
            }
            // fairways only count off non-par-3 tees
            if entry.hole.has_fairway() {
                summary.fairway_opportunities = summary.fairway_opportunities.saturating_add(1);
                if details.fairway_hit {
                    summary.fairways_hit = summary.fairways_hit.saturating_add(1);
                }
            }
        }
        summary
    }

    #[must_use]
    pub fn fairway_percentage(&self) -> Option<f64> {
        percentage(self.fairways_hit, self.fairway_opportunities)
    }

    #[must_use]
    pub fn green_percentage(&self) -> Option<f64> {
        percentage(self.greens_hit, self.holes_played)
    }
}

fn percentage(hit: u32, out_of: u32) -> Option<f64> {
    if out_of == 0 {
        None
    } else {
        Some(f64::from(hit) * 100.0 / f64::from(out_of))
    }
}

/// `(old_avg * old_count + value) / (old_count + 1)`.
#[must_use]
pub fn incremental_mean(old_avg: f64, old_count: u32, value: f64) -> f64 {
    let old_count = f64::from(old_count);
    (old_avg * old_count + value) / (old_count + 1.0)
}

/// A fresh profile seeded from a golfer's first round. The fairway mean
/// stays at 0 with `fairway_rounds` 0 until a round has a fairway to hit.
#[must_use]
pub fn first_round(summary: &RoundSummary) -> Statistic {
    let fairway = summary.fairway_percentage();
    let mut stat = Statistic {
        golfer_id: summary.golfer_id,
        average_score: f64::from(summary.total_strokes),
        fairway_hit_percentage: fairway.unwrap_or(0.0),
        fairway_rounds: u32::from(fairway.is_some()),
        green_in_regulation_percentage: summary.green_percentage().unwrap_or(0.0),
        putts_per_round: f64::from(summary.total_putts),
        total_rounds_played: 1,
        birdies: 0,
        pars: 0,
        bogeys: 0,
        double_bogeys: 0,
        total_wins: 0,
        total_losses: 0,
    };
    add_counters(&mut stat, summary);
    stat
}

/// Fold one round into an existing profile in O(1). A round with no
/// observation for a percentage leaves that mean where it was.
pub fn absorb(stat: &mut Statistic, summary: &RoundSummary) {
    let n = stat.total_rounds_played;
    stat.average_score = incremental_mean(stat.average_score, n, f64::from(summary.total_strokes));
    stat.putts_per_round =
        incremental_mean(stat.putts_per_round, n, f64::from(summary.total_putts));
    // the fairway mean runs over its own count of rounds that had fairways
    if let Some(fairway) = summary.fairway_percentage() {
        stat.fairway_hit_percentage =
            incremental_mean(stat.fairway_hit_percentage, stat.fairway_rounds, fairway);
        stat.fairway_rounds = stat.fairway_rounds.saturating_add(1);
    }
    stat.green_in_regulation_percentage = incremental_mean(
        stat.green_in_regulation_percentage,
        n,
        summary
            .green_percentage()
            .unwrap_or(stat.green_in_regulation_percentage),
    );
    stat.total_rounds_played = n.saturating_add(1);
    add_counters(stat, summary);
}

fn add_counters(stat: &mut Statistic, summary: &RoundSummary) {
    stat.birdies = stat.birdies.saturating_add(summary.categories.birdies);
    stat.pars = stat.pars.saturating_add(summary.categories.pars);
    stat.bogeys = stat.bogeys.saturating_add(summary.categories.bogeys);
    stat.double_bogeys = stat
        .double_bogeys
        .saturating_add(summary.categories.double_bogeys);
    match summary.outcome {
        Some(RoundOutcome::Win) => stat.total_wins = stat.total_wins.saturating_add(1),
        Some(RoundOutcome::Loss) => stat.total_losses = stat.total_losses.saturating_add(1),
        None => {}
    }
}

/// Create or update a golfer's profile with one round.
#[must_use]
pub fn accumulate(existing: Option<Statistic>, summary: &RoundSummary) -> Statistic {
    match existing {
        Some(mut stat) => {
            absorb(&mut stat, summary);
            stat
        }
        None => first_round(summary),
    }
}
