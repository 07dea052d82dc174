use chrono::{DateTime, Utc};

use crate::model::{Hole, Milestone, MilestoneType, Score};
use crate::score::ledger::ScoreLedger;

/// Achievements a single score earns on its hole. Each rule is independent,
/// so one score can match more than one.
#[must_use]
pub fn achievements(score: &Score, hole: &Hole) -> Vec<MilestoneType> {
    let strokes = score.strokes();
    let par = hole.par;
    let mut found = Vec::new();

    if strokes == 1 {
        found.push(MilestoneType::HoleInOne);
    }
    let albatross = par == 5 && strokes == 2;
    if !albatross && ((par == 4 && strokes == 2) || (par == 5 && strokes == 3)) {
        found.push(MilestoneType::Eagle);
    }
    if albatross {
        found.push(MilestoneType::Albatross);
    }
    if par == 4 && strokes == 4 && score.details.bunker_shots >= 2 {
        found.push(MilestoneType::DoubleSandy);
    }
    found
}

fn details(kind: MilestoneType, hole_number: u8) -> String {
    format!("Achieved {} on hole {hole_number}", kind.name().to_lowercase())
}

/// Milestones for one score, keyed by (golfer, type, round, hole).
#[must_use]
pub fn detect(score: &Score, hole: &Hole, now: DateTime<Utc>) -> Vec<Milestone> {
    achievements(score, hole)
        .into_iter()
        .map(|kind| Milestone {
            id: 0,
            golfer_id: score.golfer_id,
            kind,
            details: details(kind, hole.number),
            date: now,
            round_id: Some(score.round_id),
            hole_number: Some(hole.number),
        })
        .collect()
}

#[must_use]
pub fn detect_round(ledger: &ScoreLedger, now: DateTime<Utc>) -> Vec<Milestone> {
    ledger
        .entries()
        .iter()
        .flat_map(|entry| detect(&entry.score, &entry.hole, now))
        .collect()
}

#[must_use]
pub fn tournament_win(golfer_id: i64, round_id: i64, now: DateTime<Utc>) -> Milestone {
    Milestone {
        id: 0,
        golfer_id,
        kind: MilestoneType::TournamentWin,
        details: format!("Won tournament round {round_id}"),
        date: now,
        round_id: Some(round_id),
        hole_number: None,
    }
}
