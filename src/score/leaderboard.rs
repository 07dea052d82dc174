use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::model::{GameType, LeaderboardEntry, Milestone};
use crate::score::ledger::ScoreLedger;
use crate::score::milestones;

/// How an entry's stored score changes. Stroke Play snapshots (`Set`),
/// Match Play keeps a running total (`Add`) and Tournament Play sums a
/// window of recent rounds (`Window`). The store resolves every change
/// inside its commit, so the prior entry and the round history it reads are
/// the ones the write lands on.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreChange {
    Set(i64),
    Add(i64),
    Window { current: RoundTotal, window: usize },
}

impl ScoreChange {
    /// `history` is the golfer's completed rounds of the entry's game type,
    /// most recent first. Only `Window` reads it.
    #[must_use]
    pub fn apply(self, prior: Option<i64>, history: &[RoundTotal]) -> i64 {
        match self {
            ScoreChange::Set(value) => value,
            ScoreChange::Add(points) => prior.unwrap_or(0) + points,
            ScoreChange::Window { current, window } => windowed_total(current, history, window),
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeaderboardUpdate {
    pub golfer_id: i64,
    pub game_type: GameType,
    pub change: ScoreChange,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    Win,
    Loss,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardPlan {
    pub game_type: GameType,
    pub updates: Vec<LeaderboardUpdate>,
    pub outcomes: BTreeMap<i64, RoundOutcome>,
    pub milestones: Vec<Milestone>,
}

impl LeaderboardPlan {
    fn empty(game_type: GameType) -> Self {
        Self {
            game_type,
            updates: Vec::new(),
            outcomes: BTreeMap::new(),
            milestones: Vec::new(),
        }
    }
}

/// One finished round's stroke total for a golfer.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundTotal {
    pub round_id: i64,
    pub date_played: NaiveDateTime,
    pub total_strokes: u32,
}

/// Pick the strategy for `game_type`. The match is exhaustive, so a new game
/// type cannot be added without deciding how it scores.
#[must_use]
pub fn plan(
    game_type: GameType,
    ledger: &ScoreLedger,
    tournament_window: usize,
    now: DateTime<Utc>,
) -> LeaderboardPlan {
    match game_type {
        GameType::StrokePlay => stroke_play(ledger),
        GameType::MatchPlay => match_play(ledger),
        GameType::TournamentPlay => tournament_play(ledger, tournament_window, now),
        GameType::SoloPlay => LeaderboardPlan::empty(GameType::SoloPlay),
    }
}

fn strokes_by_golfer(ledger: &ScoreLedger) -> BTreeMap<i64, i64> {
    let mut totals: BTreeMap<i64, i64> = BTreeMap::new();
    for entry in ledger.entries() {
        *totals.entry(entry.score.golfer_id).or_insert(0) += i64::from(entry.score.strokes());
    }
    totals
}

/// The one golfer strictly ahead of everyone else, if there are at least two.
fn single_best(totals: &BTreeMap<i64, i64>, lower_is_better: bool) -> Option<i64> {
    if totals.len() < 2 {
        return None;
    }
    let best = if lower_is_better {
        totals.values().min()
    } else {
        totals.values().max()
    }?;
    let mut leaders = totals.iter().filter(|(_, v)| *v == best);
    let (golfer_id, _) = leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }
    Some(*golfer_id)
}

fn outcomes(totals: &BTreeMap<i64, i64>, lower_is_better: bool) -> BTreeMap<i64, RoundOutcome> {
    match single_best(totals, lower_is_better) {
        Some(winner) => totals
            .keys()
            .map(|&golfer_id| {
                let outcome = if golfer_id == winner {
                    RoundOutcome::Win
                } else {
                    RoundOutcome::Loss
                };
                (golfer_id, outcome)
            })
            .collect(),
        None => BTreeMap::new(),
    }
}

/// This round's stroke total per golfer, overwriting the prior value.
#[must_use]
pub fn stroke_play(ledger: &ScoreLedger) -> LeaderboardPlan {
    let totals = strokes_by_golfer(ledger);
    LeaderboardPlan {
        game_type: GameType::StrokePlay,
        updates: totals
            .iter()
            .map(|(&golfer_id, &total)| LeaderboardUpdate {
                golfer_id,
                game_type: GameType::StrokePlay,
                change: ScoreChange::Set(total),
            })
            .collect(),
        outcomes: outcomes(&totals, true),
        milestones: Vec::new(),
    }
}

/// Holes won outright per golfer. A hole where the low score is shared
/// awards nobody.
#[must_use]
pub fn holes_won(ledger: &ScoreLedger) -> BTreeMap<i64, i64> {
    let mut points: BTreeMap<i64, i64> = ledger.golfers().into_iter().map(|g| (g, 0)).collect();
    for hole_number in 1..=18u8 {
        let scores = ledger.hole_scores(hole_number);
        let Some(low) = scores.iter().map(|e| e.score.strokes()).min() else {
            continue;
        };
        let mut at_low = scores.iter().filter(|e| e.score.strokes() == low);
        if let (Some(winner), None) = (at_low.next(), at_low.next()) {
            *points.entry(winner.score.golfer_id).or_insert(0) += 1;
        }
    }
    points
}

/// Points for holes won, added to each golfer's running total.
#[must_use]
pub fn match_play(ledger: &ScoreLedger) -> LeaderboardPlan {
    let points = holes_won(ledger);
    LeaderboardPlan {
        game_type: GameType::MatchPlay,
        updates: points
            .iter()
            .map(|(&golfer_id, &won)| LeaderboardUpdate {
                golfer_id,
                game_type: GameType::MatchPlay,
                change: ScoreChange::Add(won),
            })
            .collect(),
        outcomes: outcomes(&points, false),
        milestones: Vec::new(),
    }
}

/// Sum of the most recent `window` round totals, this round included.
#[must_use]
pub fn windowed_total(current: RoundTotal, prior: &[RoundTotal], window: usize) -> i64 {
    let mut cards: Vec<RoundTotal> = prior
        .iter()
        .copied()
        .filter(|card| card.round_id != current.round_id)
        .collect();
    cards.push(current);
    cards.sort_by(|a, b| {
        b.date_played
            .cmp(&a.date_played)
            .then_with(|| b.round_id.cmp(&a.round_id))
    });
    cards
        .iter()
        .take(window)
        .map(|card| i64::from(card.total_strokes))
        .sum()
}

/// Overwrites each golfer's entry with their last-`window`-rounds total. The
/// outright low round of a multi-golfer tournament round earns a
/// Tournament-Win milestone.
#[must_use]
pub fn tournament_play(
    ledger: &ScoreLedger,
    window: usize,
    now: DateTime<Utc>,
) -> LeaderboardPlan {
    let round = ledger.round();
    let totals = strokes_by_golfer(ledger);
    let updates = totals
        .iter()
        .map(|(&golfer_id, &total)| {
            let current = RoundTotal {
                round_id: round.id,
                date_played: round.date_played,
                total_strokes: u32::try_from(total).unwrap_or(u32::MAX),
            };
            LeaderboardUpdate {
                golfer_id,
                game_type: GameType::TournamentPlay,
                change: ScoreChange::Window { current, window },
            }
        })
        .collect();
    let milestones = single_best(&totals, true)
        .map(|winner| vec![milestones::tournament_win(winner, round.id, now)])
        .unwrap_or_default();
    LeaderboardPlan {
        game_type: GameType::TournamentPlay,
        updates,
        outcomes: outcomes(&totals, true),
        milestones,
    }
}

/// Assign read-time positions: ascending for stroke-based games, descending
/// for Match Play. Equal scores share a position (1, 1, 3).
#[must_use]
pub fn rank_entries(mut entries: Vec<LeaderboardEntry>, game_type: GameType) -> Vec<LeaderboardEntry> {
    entries.retain(|e| e.game_type == game_type);
    entries.sort_by(|a, b| {
        let by_score = if game_type.is_point_based() {
            b.score.cmp(&a.score)
        } else {
            a.score.cmp(&b.score)
        };
        by_score.then_with(|| a.golfer_id.cmp(&b.golfer_id))
    });
    let mut previous: Option<(i64, usize)> = None;
    for (idx, entry) in entries.iter_mut().enumerate() {
        let position = match previous {
            Some((score, position)) if score == entry.score => position,
            _ => idx + 1,
        };
        entry.position = Some(position);
        previous = Some((entry.score, position));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Hole, Round, StrokeDetails};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, d)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap_or_default()
    }

    fn ledger(game_type: GameType, cards: &[(i64, Vec<u32>)]) -> ScoreLedger {
        let holes = (1..=18u8)
            .map(|number| Hole {
                id: i64::from(number),
                tee_id: 1,
                number,
                par: 4,
                yardage: 380,
                handicap: number,
            })
            .collect();
        let round = Round {
            id: 50,
            golfer_id: cards.first().map_or(1, |c| c.0),
            tee_id: 1,
            game_type: game_type.name().to_string(),
            date_played: day(20),
            completed: false,
        };
        let mut ledger = ScoreLedger::new(round, holes);
        for (golfer_id, strokes) in cards {
            for (idx, &s) in strokes.iter().enumerate() {
                ledger
                    .record(idx as u8 + 1, *golfer_id, StrokeDetails::strokes(s))
                    .expect("record");
            }
        }
        ledger
    }

    #[test]
    fn stroke_play_sets_the_round_total() {
        let plan = stroke_play(&ledger(GameType::StrokePlay, &[(1, vec![4, 5, 3, 4])]));
        assert_eq!(
            plan.updates,
            vec![LeaderboardUpdate {
                golfer_id: 1,
                game_type: GameType::StrokePlay,
                change: ScoreChange::Set(16),
            }]
        );
        assert_eq!(ScoreChange::Set(16).apply(Some(99), &[]), 16);
        assert!(plan.outcomes.is_empty());
    }

    #[test]
    fn match_play_ties_award_nobody() {
        let card = ledger(GameType::MatchPlay, &[(1, vec![4, 3, 5]), (2, vec![4, 4, 4])]);
        let points = holes_won(&card);
        assert_eq!(points.get(&1), Some(&1));
        assert_eq!(points.get(&2), Some(&1));
        let plan = match_play(&card);
        assert!(plan.outcomes.is_empty());
        assert!(plan
            .updates
            .iter()
            .all(|u| u.change == ScoreChange::Add(1)));
    }

    #[test]
    fn match_play_counts_outright_holes_and_accumulates() {
        let plan = match_play(&ledger(
            GameType::MatchPlay,
            &[(1, vec![3; 18]), (2, vec![4; 18])],
        ));
        let change_for = |golfer_id| {
            plan.updates
                .iter()
                .find(|u| u.golfer_id == golfer_id)
                .map(|u| u.change)
        };
        assert_eq!(change_for(1), Some(ScoreChange::Add(18)));
        assert_eq!(change_for(2), Some(ScoreChange::Add(0)));
        assert_eq!(ScoreChange::Add(18).apply(Some(5), &[]), 23);
        assert_eq!(plan.outcomes.get(&1), Some(&RoundOutcome::Win));
        assert_eq!(plan.outcomes.get(&2), Some(&RoundOutcome::Loss));
    }

    #[test]
    fn tournament_window_keeps_the_most_recent_rounds() {
        let prior: Vec<RoundTotal> = [(1, 70), (2, 72), (3, 68), (4, 75)]
            .iter()
            .map(|&(d, total)| RoundTotal {
                round_id: i64::from(d),
                date_played: day(d),
                total_strokes: total,
            })
            .collect();
        let current = RoundTotal {
            round_id: 5,
            date_played: day(5),
            total_strokes: 71,
        };
        assert_eq!(windowed_total(current, &prior, 4), 72 + 68 + 75 + 71);
        assert_eq!(windowed_total(current, &prior[..1], 4), 70 + 71);

        let change = ScoreChange::Window { current, window: 4 };
        // the stored entry plays no part in a windowed total
        assert_eq!(change.apply(Some(1_000), &prior), 72 + 68 + 75 + 71);
        assert_eq!(change.apply(None, &[]), 71);
    }

    #[test]
    fn tournament_low_round_earns_a_win_milestone() {
        let card = ledger(GameType::TournamentPlay, &[(1, vec![4, 4]), (2, vec![5, 4])]);
        let plan = tournament_play(&card, 4, Utc::now());
        assert!(plan
            .updates
            .iter()
            .all(|u| matches!(u.change, ScoreChange::Window { window: 4, .. })));
        assert_eq!(plan.milestones.len(), 1);
        assert_eq!(plan.milestones[0].golfer_id, 1);
        assert_eq!(plan.milestones[0].hole_number, None);
        assert_eq!(plan.outcomes.get(&2), Some(&RoundOutcome::Loss));
    }

    #[test]
    fn solo_play_leaves_the_leaderboard_alone() {
        let card = ledger(GameType::SoloPlay, &[(1, vec![4, 4])]);
        let plan = plan(GameType::SoloPlay, &card, 4, Utc::now());
        assert!(plan.updates.is_empty());
        assert!(plan.milestones.is_empty());
    }

    #[test]
    fn ranking_direction_follows_game_type() {
        let entry = |golfer_id, game_type, score| LeaderboardEntry {
            golfer_id,
            game_type,
            score,
            position: None,
        };
        let strokes = rank_entries(
            vec![
                entry(1, GameType::StrokePlay, 80),
                entry(2, GameType::StrokePlay, 72),
                entry(3, GameType::StrokePlay, 72),
                entry(4, GameType::MatchPlay, 1),
            ],
            GameType::StrokePlay,
        );
        let order: Vec<_> = strokes.iter().map(|e| (e.golfer_id, e.position)).collect();
        assert_eq!(order, vec![(2, Some(1)), (3, Some(1)), (1, Some(3))]);

        let points = rank_entries(
            vec![entry(1, GameType::MatchPlay, 3), entry(2, GameType::MatchPlay, 9)],
            GameType::MatchPlay,
        );
        assert_eq!(points[0].golfer_id, 2);
        assert_eq!(points[1].position, Some(2));
    }
}
