use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Golfer {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub handicap_eligible: bool,
    #[serde(default)]
    pub ghin_id: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Tee {
    pub id: i64,
    pub course_name: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Hole {
    pub id: i64,
    pub tee_id: i64,
    pub number: u8,
    pub par: u8,
    pub yardage: u32,
    pub handicap: u8,
}

impl Hole {
    #[must_use]
    pub fn is_front_nine(&self) -> bool {
        (1..=9).contains(&self.number)
    }

    #[must_use]
    pub fn has_fairway(&self) -> bool {
        self.par > 3
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Round {
    pub id: i64,
    pub golfer_id: i64,
    pub tee_id: i64,
    /// Raw game type name as persisted; see [`GameType::from_str`].
    pub game_type: String,
    pub date_played: NaiveDateTime,
    pub completed: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewRound {
    pub golfer_id: i64,
    pub tee_id: i64,
    pub game_type: String,
    pub date_played: NaiveDateTime,
}

/// What a golfer reports for one hole.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StrokeDetails {
    pub strokes: u32,
    #[serde(default)]
    pub putts: u32,
    #[serde(default)]
    pub fairway_hit: bool,
    #[serde(default)]
    pub green_in_regulation: bool,
    #[serde(default)]
    pub bunker_shots: u32,
    #[serde(default)]
    pub penalties: u32,
}

impl StrokeDetails {
    #[must_use]
    pub fn strokes(strokes: u32) -> Self {
        Self {
            strokes,
            ..Self::default()
        }
    }

    /// Suspicious but accepted input. Nothing here is rejected.
    #[must_use]
    pub fn data_quality_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.strokes == 0 {
            warnings.push("strokes recorded as 0".to_string());
        }
        if self.putts > self.strokes {
            warnings.push(format!(
                "putts ({}) exceed strokes ({})",
                self.putts, self.strokes
            ));
        }
        warnings
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Score {
    pub id: i64,
    pub round_id: i64,
    pub hole_id: i64,
    pub golfer_id: i64,
    #[serde(flatten)]
    pub details: StrokeDetails,
}

impl Score {
    #[must_use]
    pub fn strokes(&self) -> u32 {
        self.details.strokes
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GameType {
    MatchPlay,
    StrokePlay,
    TournamentPlay,
    SoloPlay,
}

impl GameType {
    pub const ALL: [GameType; 4] = [
        GameType::MatchPlay,
        GameType::StrokePlay,
        GameType::TournamentPlay,
        GameType::SoloPlay,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            GameType::MatchPlay => "Match Play",
            GameType::StrokePlay => "Stroke Play",
            GameType::TournamentPlay => "Tournament Play",
            GameType::SoloPlay => "Solo Play",
        }
    }

    /// Higher leaderboard scores are better only for point-based games.
    #[must_use]
    pub fn is_point_based(self) -> bool {
        matches!(self, GameType::MatchPlay)
    }

    #[must_use]
    pub fn has_leaderboard(self) -> bool {
        !matches!(self, GameType::SoloPlay)
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for GameType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "matchplay" => Ok(GameType::MatchPlay),
            "strokeplay" => Ok(GameType::StrokePlay),
            "tournamentplay" => Ok(GameType::TournamentPlay),
            "soloplay" => Ok(GameType::SoloPlay),
            _ => Err(EngineError::UnknownGameType(s.to_string())),
        }
    }
}

/// Which holes a scorecard view needs before the round counts as complete.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoleView {
    Front,
    Back,
    Full,
}

impl HoleView {
    pub const ALL: [HoleView; 3] = [HoleView::Front, HoleView::Back, HoleView::Full];

    #[must_use]
    pub fn hole_numbers(self) -> std::ops::RangeInclusive<u8> {
        match self {
            HoleView::Front => 1..=9,
            HoleView::Back => 10..=18,
            HoleView::Full => 1..=18,
        }
    }
}
