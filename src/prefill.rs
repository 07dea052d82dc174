use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineError;
use crate::model::{Golfer, Hole, NewRound, StrokeDetails, Tee};
use crate::score::{CompletionOutcome, RoundEngine};
use crate::storage::sqlite::DATE_FORMAT;
use crate::storage::Storage;

/// format we expect is this:
/// { "golfers": [{"id": <int>, "name": "..", "handicap_eligible": <bool>}, ...]
/// , "tees": [{"id": <int>, "course_name": "..", "name": "..", "holes": [{"id": <int>, "number": <int>, "par": <int>}, ...]}]
/// , "rounds": [{"golfer_id": <int>, "tee_id": <int>, "game_type": "Stroke Play", "date_played": "2024-04-20 08:00:00"
///     , "complete": <bool>, "scores": [{"hole": <int>, "strokes": <int>, "golfer_id": <optional int>, ...}]}]
/// }
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Fixture {
    #[serde(default)]
    pub golfers: Vec<Golfer>,
    #[serde(default)]
    pub tees: Vec<TeeFixture>,
    #[serde(default)]
    pub rounds: Vec<RoundFixture>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TeeFixture {
    pub id: i64,
    pub course_name: String,
    pub name: String,
    pub holes: Vec<HoleFixture>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HoleFixture {
    pub id: i64,
    pub number: u8,
    pub par: u8,
    #[serde(default)]
    pub yardage: u32,
    #[serde(default)]
    pub handicap: u8,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RoundFixture {
    pub golfer_id: i64,
    pub tee_id: i64,
    pub game_type: String,
    pub date_played: String,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub scores: Vec<ScoreFixture>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ScoreFixture {
    pub hole: u8,
    /// Defaults to the round's golfer.
    #[serde(default)]
    pub golfer_id: Option<i64>,
    #[serde(flatten)]
    pub details: StrokeDetails,
}

#[derive(Serialize, Clone, Debug)]
pub struct PrefilledRound {
    pub round_id: i64,
    pub completion: Option<CompletionOutcome>,
}

impl Fixture {
    /// # Errors
    /// Returns `Parse` if the text is not a fixture, or a hole is outside 1..=18
    /// or has a par other than 3, 4 or 5.
    pub fn from_json_str(text: &str) -> Result<Self, EngineError> {
        let fixture: Self = serde_json::from_str(text)?;
        for tee in &fixture.tees {
            for hole in &tee.holes {
                if !(1..=18).contains(&hole.number) {
                    return Err(EngineError::Parse(format!(
                        "tee {} hole number {} outside 1..=18",
                        tee.id, hole.number
                    )));
                }
                if !(3..=5).contains(&hole.par) {
                    return Err(EngineError::Parse(format!(
                        "tee {} hole {} has par {}",
                        tee.id, hole.number, hole.par
                    )));
                }
            }
        }
        for round in &fixture.rounds {
            parse_played_at(&round.date_played)?;
        }
        Ok(fixture)
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS` or a bare date (midnight).
///
/// # Errors
/// Returns `Parse` for anything else.
pub fn parse_played_at(raw: &str) -> Result<NaiveDateTime, EngineError> {
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, DATE_FORMAT) {
        return Ok(at);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| EngineError::Parse(format!("bad date_played {raw}")))
}

/// Load reference data and rounds, completing the rounds marked complete in
/// file order.
///
/// # Errors
/// Stops at the first storage or engine error.
pub async fn db_prefill<S: Storage>(
    fixture: &Fixture,
    engine: &RoundEngine<S>,
) -> Result<Vec<PrefilledRound>, EngineError> {
    let storage = engine.storage();
    for golfer in &fixture.golfers {
        storage.insert_golfer(golfer).await?;
    }
    for tee in &fixture.tees {
        let holes: Vec<Hole> = tee
            .holes
            .iter()
            .map(|h| Hole {
                id: h.id,
                tee_id: tee.id,
                number: h.number,
                par: h.par,
                yardage: h.yardage,
                handicap: h.handicap,
            })
            .collect();
        let record = Tee {
            id: tee.id,
            course_name: tee.course_name.clone(),
            name: tee.name.clone(),
        };
        storage.insert_tee(&record, &holes).await?;
    }

    let mut prefilled = Vec::with_capacity(fixture.rounds.len());
    for round in &fixture.rounds {
        let created = storage
            .create_round(&NewRound {
                golfer_id: round.golfer_id,
                tee_id: round.tee_id,
                game_type: round.game_type.clone(),
                date_played: parse_played_at(&round.date_played)?,
            })
            .await?;
        for score in &round.scores {
            engine
                .record_score(
                    created.id,
                    score.hole,
                    score.golfer_id.unwrap_or(round.golfer_id),
                    score.details,
                )
                .await?;
        }
        let completion = if round.complete {
            Some(engine.on_round_completed(created.id).await?)
        } else {
            None
        };
        prefilled.push(PrefilledRound {
            round_id: created.id,
            completion,
        });
    }
    info!(
        golfers = fixture.golfers.len(),
        tees = fixture.tees.len(),
        rounds = prefilled.len(),
        "prefill done"
    );
    Ok(prefilled)
}
