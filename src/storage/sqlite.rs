use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{
    Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior, params,
};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{RoundCompletion, Storage, StorageError};
use crate::model::{
    GameType, Golfer, Hole, LeaderboardEntry, Milestone, MilestoneType, NewRound, Round, Score,
    Statistic, StrokeDetails, Tee,
};
use crate::score::leaderboard::{RoundTotal, ScoreChange};
use crate::score::statistics;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: [&str; 7] = [
    include_str!("../sql/schema/sqlite/01_golfer.sql"),
    include_str!("../sql/schema/sqlite/02_tee.sql"),
    include_str!("../sql/schema/sqlite/03_round.sql"),
    include_str!("../sql/schema/sqlite/04_score.sql"),
    include_str!("../sql/schema/sqlite/05_milestone.sql"),
    include_str!("../sql/schema/sqlite/06_leaderboard_entry.sql"),
    include_str!("../sql/schema/sqlite/07_statistic.sql"),
];

const TABLE_DROP: &str = include_str!("../sql/schema/sqlite/00_table_drop.sql");

const ROUND_COLUMNS: &str = "round_id, golfer_id, tee_id, game_type, date_played, completed";
const SCORE_COLUMNS: &str = "score_id, round_id, hole_id, golfer_id, strokes, putts, \
     fairway_hit, green_in_regulation, bunker_shots, penalties";

/// SQLite-backed store. The connection sits behind a mutex and every call
/// runs on the blocking pool; completions run in an immediate transaction.
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) a database file and make sure the schema exists.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or the DDL fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// # Errors
    /// Returns an error if the DDL fails.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(&SCHEMA.join("\n"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a batch of SQL in one transaction, e.g. a startup script.
    ///
    /// # Errors
    /// Returns an error if any statement fails; nothing is applied then.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), StorageError> {
        let sql = sql.to_owned();
        self.interact(move |conn| {
            let tx = conn.transaction()?;
            tx.execute_batch(&sql)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Drop and recreate every table.
    ///
    /// # Errors
    /// Returns an error if the DDL fails.
    pub async fn reset(&self) -> Result<(), StorageError> {
        let script = format!("{TABLE_DROP}\n{}", SCHEMA.join("\n"));
        self.execute_batch(&script).await
    }

    async fn interact<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StorageError::from("sqlite connection lock poisoned"))?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?
    }
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn round_from_row(row: &Row<'_>) -> rusqlite::Result<Round> {
    let date: String = row.get(4)?;
    Ok(Round {
        id: row.get(0)?,
        golfer_id: row.get(1)?,
        tee_id: row.get(2)?,
        game_type: row.get(3)?,
        date_played: parse_date(4, &date)?,
        completed: row.get(5)?,
    })
}

fn score_from_row(row: &Row<'_>) -> rusqlite::Result<Score> {
    Ok(Score {
        id: row.get(0)?,
        round_id: row.get(1)?,
        hole_id: row.get(2)?,
        golfer_id: row.get(3)?,
        details: StrokeDetails {
            strokes: row.get(4)?,
            putts: row.get(5)?,
            fairway_hit: row.get(6)?,
            green_in_regulation: row.get(7)?,
            bunker_shots: row.get(8)?,
            penalties: row.get(9)?,
        },
    })
}

fn hole_from_row(row: &Row<'_>) -> rusqlite::Result<Hole> {
    Ok(Hole {
        id: row.get(0)?,
        tee_id: row.get(1)?,
        number: row.get(2)?,
        par: row.get(3)?,
        yardage: row.get(4)?,
        handicap: row.get(5)?,
    })
}

fn milestone_from_row(row: &Row<'_>) -> rusqlite::Result<Milestone> {
    let kind: String = row.get(2)?;
    let date: String = row.get(4)?;
    Ok(Milestone {
        id: row.get(0)?,
        golfer_id: row.get(1)?,
        kind: kind
            .parse::<MilestoneType>()
            .map_err(|e| conversion_error(2, e))?,
        details: row.get(3)?,
        date: DateTime::parse_from_rfc3339(&date)
            .map_err(|e| conversion_error(4, e))?
            .with_timezone(&Utc),
        round_id: row.get(5)?,
        hole_number: row.get(6)?,
    })
}

fn statistic_from_row(row: &Row<'_>) -> rusqlite::Result<Statistic> {
    Ok(Statistic {
        golfer_id: row.get(0)?,
        average_score: row.get(1)?,
        fairway_hit_percentage: row.get(2)?,
        green_in_regulation_percentage: row.get(3)?,
        putts_per_round: row.get(4)?,
        total_rounds_played: row.get(5)?,
        birdies: row.get(6)?,
        pars: row.get(7)?,
        bogeys: row.get(8)?,
        double_bogeys: row.get(9)?,
        total_wins: row.get(10)?,
        total_losses: row.get(11)?,
        fairway_rounds: row.get(12)?,
    })
}

fn load_round(conn: &Connection, round_id: i64) -> Result<Round, StorageError> {
    conn.query_row(
        &format!("SELECT {ROUND_COLUMNS} FROM round WHERE round_id = ?1;"),
        params![round_id],
        round_from_row,
    )
    .optional()?
    .ok_or_else(|| StorageError::NotFound(format!("round {round_id}")))
}

fn exists(conn: &Connection, sql: &str, id: i64) -> Result<bool, StorageError> {
    Ok(conn
        .query_row(sql, params![id], |_| Ok(()))
        .optional()?
        .is_some())
}

fn load_statistic(conn: &Connection, golfer_id: i64) -> Result<Option<Statistic>, StorageError> {
    Ok(conn
        .query_row(
            "SELECT golfer_id, average_score, fairway_hit_percentage, \
             green_in_regulation_percentage, putts_per_round, total_rounds_played, \
             birdies, pars, bogeys, double_bogeys, total_wins, total_losses, fairway_rounds \
             FROM statistic WHERE golfer_id = ?1;",
            params![golfer_id],
            statistic_from_row,
        )
        .optional()?)
}

fn store_statistic(tx: &Transaction<'_>, stat: &Statistic) -> Result<(), StorageError> {
    tx.execute(
        "INSERT OR REPLACE INTO statistic (golfer_id, average_score, fairway_hit_percentage, \
         green_in_regulation_percentage, putts_per_round, total_rounds_played, birdies, pars, \
         bogeys, double_bogeys, total_wins, total_losses, fairway_rounds) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
        params![
            stat.golfer_id,
            stat.average_score,
            stat.fairway_hit_percentage,
            stat.green_in_regulation_percentage,
            stat.putts_per_round,
            stat.total_rounds_played,
            stat.birdies,
            stat.pars,
            stat.bogeys,
            stat.double_bogeys,
            stat.total_wins,
            stat.total_losses,
            stat.fairway_rounds,
        ],
    )?;
    Ok(())
}

/// Completed rounds of `game_type` the golfer has scores in, most recent first.
fn load_recent_rounds(
    conn: &Connection,
    golfer_id: i64,
    game_type: GameType,
    limit: usize,
) -> Result<Vec<RoundTotal>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT r.round_id, r.game_type, r.date_played, SUM(s.strokes) AS total_strokes \
         FROM round r JOIN score s ON s.round_id = r.round_id \
         WHERE s.golfer_id = ?1 AND r.completed = 1 \
         GROUP BY r.round_id, r.game_type, r.date_played \
         ORDER BY r.date_played DESC, r.round_id DESC;",
    )?;
    let rows = stmt
        .query_map(params![golfer_id], |row| {
            let name: String = row.get(1)?;
            let date: String = row.get(2)?;
            Ok((
                name,
                RoundTotal {
                    round_id: row.get(0)?,
                    date_played: parse_date(2, &date)?,
                    total_strokes: row.get(3)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    // names are stored loosely, so filter after parsing
    Ok(rows
        .into_iter()
        .filter(|(name, _)| name.parse::<GameType>().ok() == Some(game_type))
        .map(|(_, total)| total)
        .take(limit)
        .collect())
}

/// `None` when the milestone's key is already taken.
fn insert_milestone(
    conn: &Connection,
    milestone: &Milestone,
) -> Result<Option<Milestone>, StorageError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO milestone (golfer_id, kind, details, date, round_id, hole_number) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            milestone.golfer_id,
            milestone.kind.name(),
            milestone.details,
            milestone.date.to_rfc3339(),
            milestone.round_id,
            milestone.hole_number,
        ],
    )?;
    if inserted == 0 {
        return Ok(None);
    }
    let mut stored = milestone.clone();
    stored.id = conn.last_insert_rowid();
    Ok(Some(stored))
}

fn apply_completion(
    conn: &mut Connection,
    completion: &RoundCompletion,
) -> Result<Vec<Milestone>, StorageError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if load_round(&tx, completion.round_id)?.completed {
        return Err(StorageError::RoundAlreadyCompleted(completion.round_id));
    }

    let mut appended = Vec::new();
    for milestone in &completion.milestones {
        if let Some(stored) = insert_milestone(&tx, milestone)? {
            appended.push(stored);
        }
    }

    for update in &completion.leaderboard {
        let game_type = update.game_type.name();
        let prior: Option<i64> = tx
            .query_row(
                "SELECT score FROM leaderboard_entry WHERE golfer_id = ?1 AND game_type = ?2;",
                params![update.golfer_id, game_type],
                |row| row.get(0),
            )
            .optional()?;
        let history = match update.change {
            ScoreChange::Window { window, .. } => {
                load_recent_rounds(&tx, update.golfer_id, update.game_type, window)?
            }
            _ => Vec::new(),
        };
        tx.execute(
            "INSERT INTO leaderboard_entry (golfer_id, game_type, score) VALUES (?1, ?2, ?3) \
             ON CONFLICT (golfer_id, game_type) DO UPDATE SET score = excluded.score;",
            params![update.golfer_id, game_type, update.change.apply(prior, &history)],
        )?;
    }

    for summary in &completion.statistics {
        let existing = load_statistic(&tx, summary.golfer_id)?;
        store_statistic(&tx, &statistics::accumulate(existing, summary))?;
    }

    tx.execute(
        "UPDATE round SET completed = 1 WHERE round_id = ?1;",
        params![completion.round_id],
    )?;
    tx.commit()?;
    Ok(appended)
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn insert_golfer(&self, golfer: &Golfer) -> Result<(), StorageError> {
        let golfer = golfer.clone();
        self.interact(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO golfer (golfer_id, name, handicap_eligible, ghin_id, last_name, state) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    golfer.id,
                    golfer.name,
                    golfer.handicap_eligible,
                    golfer.ghin_id,
                    golfer.last_name,
                    golfer.state,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_golfer(&self, golfer_id: i64) -> Result<Golfer, StorageError> {
        self.interact(move |conn| {
            conn.query_row(
                "SELECT golfer_id, name, handicap_eligible, ghin_id, last_name, state \
                 FROM golfer WHERE golfer_id = ?1;",
                params![golfer_id],
                |row| {
                    Ok(Golfer {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        handicap_eligible: row.get(2)?,
                        ghin_id: row.get(3)?,
                        last_name: row.get(4)?,
                        state: row.get(5)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("golfer {golfer_id}")))
        })
        .await
    }

    async fn insert_tee(&self, tee: &Tee, holes: &[Hole]) -> Result<(), StorageError> {
        let tee = tee.clone();
        let holes = holes.to_vec();
        self.interact(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR REPLACE INTO tee (tee_id, course_name, name) VALUES (?1, ?2, ?3);",
                params![tee.id, tee.course_name, tee.name],
            )?;
            for hole in &holes {
                tx.execute(
                    "INSERT OR REPLACE INTO hole (hole_id, tee_id, number, par, yardage, handicap) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                    params![hole.id, tee.id, hole.number, hole.par, hole.yardage, hole.handicap],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_holes_for_tee(&self, tee_id: i64) -> Result<Vec<Hole>, StorageError> {
        self.interact(move |conn| {
            if !exists(conn, "SELECT 1 FROM tee WHERE tee_id = ?1;", tee_id)? {
                return Err(StorageError::NotFound(format!("tee {tee_id}")));
            }
            let mut stmt = conn.prepare(
                "SELECT hole_id, tee_id, number, par, yardage, handicap \
                 FROM hole WHERE tee_id = ?1 ORDER BY number;",
            )?;
            let holes = stmt
                .query_map(params![tee_id], hole_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(holes)
        })
        .await
    }

    async fn create_round(&self, round: &NewRound) -> Result<Round, StorageError> {
        let round = round.clone();
        self.interact(move |conn| {
            let tx = conn.transaction()?;
            if !exists(&tx, "SELECT 1 FROM golfer WHERE golfer_id = ?1;", round.golfer_id)? {
                return Err(StorageError::NotFound(format!("golfer {}", round.golfer_id)));
            }
            if !exists(&tx, "SELECT 1 FROM tee WHERE tee_id = ?1;", round.tee_id)? {
                return Err(StorageError::NotFound(format!("tee {}", round.tee_id)));
            }
            tx.execute(
                "INSERT INTO round (golfer_id, tee_id, game_type, date_played, completed) \
                 VALUES (?1, ?2, ?3, ?4, 0);",
                params![
                    round.golfer_id,
                    round.tee_id,
                    round.game_type,
                    round.date_played.format(DATE_FORMAT).to_string(),
                ],
            )?;
            let created = Round {
                id: tx.last_insert_rowid(),
                golfer_id: round.golfer_id,
                tee_id: round.tee_id,
                game_type: round.game_type,
                date_played: round.date_played,
                completed: false,
            };
            tx.commit()?;
            Ok(created)
        })
        .await
    }

    async fn get_round(&self, round_id: i64) -> Result<Round, StorageError> {
        self.interact(move |conn| load_round(conn, round_id)).await
    }

    async fn get_scores(&self, round_id: i64) -> Result<Vec<Score>, StorageError> {
        self.interact(move |conn| {
            load_round(conn, round_id)?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {SCORE_COLUMNS} FROM score WHERE round_id = ?1 ORDER BY score_id;"
            ))?;
            let scores = stmt
                .query_map(params![round_id], score_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(scores)
        })
        .await
    }

    async fn record_score(
        &self,
        round_id: i64,
        hole_number: u8,
        golfer_id: i64,
        details: StrokeDetails,
    ) -> Result<Score, StorageError> {
        self.interact(move |conn| {
            let tx = conn.transaction()?;
            let round = load_round(&tx, round_id)?;
            if round.completed {
                return Err(StorageError::RoundAlreadyCompleted(round_id));
            }
            let hole_id: i64 = tx
                .query_row(
                    "SELECT hole_id FROM hole WHERE tee_id = ?1 AND number = ?2;",
                    params![round.tee_id, hole_number],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| StorageError::NotFound(format!("hole {hole_number}")))?;
            let inserted = tx.execute(
                "INSERT INTO score (round_id, hole_id, golfer_id, strokes, putts, fairway_hit, \
                 green_in_regulation, bunker_shots, penalties) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    round_id,
                    hole_id,
                    golfer_id,
                    details.strokes,
                    details.putts,
                    details.fairway_hit,
                    details.green_in_regulation,
                    details.bunker_shots,
                    details.penalties,
                ],
            );
            match inserted {
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    return Err(StorageError::DuplicateHole {
                        round_id,
                        hole_number,
                        golfer_id,
                    });
                }
                other => {
                    other?;
                }
            }
            let score = Score {
                id: tx.last_insert_rowid(),
                round_id,
                hole_id,
                golfer_id,
                details,
            };
            tx.commit()?;
            Ok(score)
        })
        .await
    }

    async fn recent_rounds(
        &self,
        golfer_id: i64,
        game_type: GameType,
        limit: usize,
    ) -> Result<Vec<RoundTotal>, StorageError> {
        self.interact(move |conn| load_recent_rounds(conn, golfer_id, game_type, limit))
            .await
    }

    async fn rounds_between(
        &self,
        golfer_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Round>, StorageError> {
        self.interact(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ROUND_COLUMNS} FROM round \
                 WHERE golfer_id = ?1 AND date_played >= ?2 AND date_played <= ?3 \
                 ORDER BY date_played DESC, round_id DESC;"
            ))?;
            let rounds = stmt
                .query_map(
                    params![
                        golfer_id,
                        start.format(DATE_FORMAT).to_string(),
                        end.format(DATE_FORMAT).to_string(),
                    ],
                    round_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rounds)
        })
        .await
    }

    async fn get_leaderboard(
        &self,
        game_type: GameType,
    ) -> Result<Vec<LeaderboardEntry>, StorageError> {
        self.interact(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT golfer_id, score FROM leaderboard_entry \
                 WHERE game_type = ?1 ORDER BY golfer_id;",
            )?;
            let entries = stmt
                .query_map(params![game_type.name()], |row| {
                    Ok(LeaderboardEntry {
                        golfer_id: row.get(0)?,
                        game_type,
                        score: row.get(1)?,
                        position: None,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
        .await
    }

    async fn get_statistic(&self, golfer_id: i64) -> Result<Option<Statistic>, StorageError> {
        self.interact(move |conn| load_statistic(conn, golfer_id))
            .await
    }

    async fn get_milestones(&self, golfer_id: i64) -> Result<Vec<Milestone>, StorageError> {
        self.interact(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT milestone_id, golfer_id, kind, details, date, round_id, hole_number \
                 FROM milestone WHERE golfer_id = ?1 ORDER BY milestone_id;",
            )?;
            let milestones = stmt
                .query_map(params![golfer_id], milestone_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(milestones)
        })
        .await
    }

    async fn append_milestone(
        &self,
        milestone: &Milestone,
    ) -> Result<Option<Milestone>, StorageError> {
        let milestone = milestone.clone();
        self.interact(move |conn| {
            let golfer_sql = "SELECT 1 FROM golfer WHERE golfer_id = ?1;";
            if !exists(conn, golfer_sql, milestone.golfer_id)? {
                return Err(StorageError::NotFound(format!("golfer {}", milestone.golfer_id)));
            }
            insert_milestone(conn, &milestone)
        })
        .await
    }

    async fn commit_round_completion(
        &self,
        completion: &RoundCompletion,
    ) -> Result<Vec<Milestone>, StorageError> {
        let completion = completion.clone();
        self.interact(move |conn| apply_completion(conn, &completion))
            .await
    }
}
