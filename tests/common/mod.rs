#![allow(dead_code)]

use rusty_scorecard::model::{Golfer, Hole, NewRound, StrokeDetails, Tee};
use rusty_scorecard::prefill::parse_played_at;
use rusty_scorecard::{
    EngineConfig, EngineError, MemoryStorage, RoundEngine, SqliteStorage, Storage,
};

pub const TEE_ID: i64 = 1;

/// Par for holes 1..=18; 72 in total.
pub const PARS: [u8; 18] = [4, 4, 3, 5, 4, 4, 3, 4, 5, 4, 3, 4, 5, 4, 4, 3, 4, 5];

pub fn memory_engine(config: EngineConfig) -> RoundEngine<MemoryStorage> {
    RoundEngine::new(MemoryStorage::new(), config)
}

pub fn sqlite_engine(config: EngineConfig) -> RoundEngine<SqliteStorage> {
    let storage = SqliteStorage::open_in_memory().expect("in-memory sqlite");
    RoundEngine::new(storage, config)
}

pub fn golfer(id: i64) -> Golfer {
    Golfer {
        id,
        name: format!("Golfer {id}"),
        handicap_eligible: true,
        ghin_id: None,
        last_name: None,
        state: None,
    }
}

/// One eighteen-hole tee plus the given golfers.
pub async fn seed_course<S: Storage>(
    engine: &RoundEngine<S>,
    golfer_ids: &[i64],
) -> Result<(), EngineError> {
    let storage = engine.storage();
    for id in golfer_ids {
        storage.insert_golfer(&golfer(*id)).await?;
    }
    let holes: Vec<Hole> = PARS
        .iter()
        .zip(1u8..)
        .map(|(&par, number)| Hole {
            id: TEE_ID * 100 + i64::from(number),
            tee_id: TEE_ID,
            number,
            par,
            yardage: 150 + 100 * u32::from(par - 3),
            handicap: number,
        })
        .collect();
    let tee = Tee {
        id: TEE_ID,
        course_name: "Cedar Ridge".to_string(),
        name: "Blue".to_string(),
    };
    storage.insert_tee(&tee, &holes).await?;
    Ok(())
}

pub async fn start_round<S: Storage>(
    engine: &RoundEngine<S>,
    golfer_id: i64,
    game_type: &str,
    date: &str,
) -> Result<i64, EngineError> {
    let round = engine
        .storage()
        .create_round(&NewRound {
            golfer_id,
            tee_id: TEE_ID,
            game_type: game_type.to_string(),
            date_played: parse_played_at(date)?,
        })
        .await?;
    Ok(round.id)
}

/// Record `strokes[i]` on hole `i + 1`.
pub async fn record_card<S: Storage>(
    engine: &RoundEngine<S>,
    round_id: i64,
    golfer_id: i64,
    strokes: &[u32],
) -> Result<(), EngineError> {
    for (&count, hole) in strokes.iter().zip(1u8..) {
        engine
            .record_score(round_id, hole, golfer_id, StrokeDetails::strokes(count))
            .await?;
    }
    Ok(())
}

/// Start a round owned by the first card's golfer and record every card.
pub async fn play_round<S: Storage>(
    engine: &RoundEngine<S>,
    game_type: &str,
    date: &str,
    cards: &[(i64, Vec<u32>)],
) -> Result<i64, EngineError> {
    let owner = cards.first().map_or(1, |card| card.0);
    let round_id = start_round(engine, owner, game_type, date).await?;
    for (golfer_id, strokes) in cards {
        record_card(engine, round_id, *golfer_id, strokes).await?;
    }
    Ok(round_id)
}

pub fn par_card() -> Vec<u32> {
    PARS.iter().map(|&p| u32::from(p)).collect()
}

/// An eighteen-hole card adding up to `total`, built by nudging holes one
/// stroke at a time away from par.
pub fn card_with_total(total: u32) -> Vec<u32> {
    let mut card = par_card();
    let mut diff = i64::from(total) - 72;
    let mut idx = 0;
    while diff != 0 {
        if diff > 0 {
            card[idx] += 1;
            diff -= 1;
        } else {
            card[idx] -= 1;
            diff += 1;
        }
        idx = (idx + 1) % card.len();
    }
    card
}
