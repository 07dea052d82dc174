use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;
use crate::model::GameType;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MilestoneType {
    HoleInOne,
    Eagle,
    Albatross,
    DoubleSandy,
    TournamentWin,
}

impl MilestoneType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            MilestoneType::HoleInOne => "Hole-in-One",
            MilestoneType::Eagle => "Eagle",
            MilestoneType::Albatross => "Albatross",
            MilestoneType::DoubleSandy => "Double-Sandy",
            MilestoneType::TournamentWin => "Tournament-Win",
        }
    }
}

impl fmt::Display for MilestoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MilestoneType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Hole-in-One" => Ok(MilestoneType::HoleInOne),
            "Eagle" => Ok(MilestoneType::Eagle),
            "Albatross" => Ok(MilestoneType::Albatross),
            "Double-Sandy" => Ok(MilestoneType::DoubleSandy),
            "Tournament-Win" => Ok(MilestoneType::TournamentWin),
            other => Err(EngineError::Parse(format!("unknown milestone type {other}"))),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Milestone {
    pub id: i64,
    pub golfer_id: i64,
    pub kind: MilestoneType,
    pub details: String,
    pub date: DateTime<Utc>,
    pub round_id: Option<i64>,
    pub hole_number: Option<u8>,
}

/// Two milestones with the same key describe the same achievement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MilestoneKey {
    pub golfer_id: i64,
    pub kind: MilestoneType,
    pub round_id: Option<i64>,
    pub hole_number: Option<u8>,
}

impl Milestone {
    #[must_use]
    pub fn key(&self) -> MilestoneKey {
        MilestoneKey {
            golfer_id: self.golfer_id,
            kind: self.kind,
            round_id: self.round_id,
            hole_number: self.hole_number,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub golfer_id: i64,
    pub game_type: GameType,
    pub score: i64,
    pub position: Option<usize>,
}

/// Running per-golfer profile. Averages are incremental means over
/// `total_rounds_played`, except the fairway mean, which only counts the
/// `fairway_rounds` that had a fairway to hit.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Statistic {
    pub golfer_id: i64,
    pub average_score: f64,
    pub fairway_hit_percentage: f64,
    #[serde(default)]
    pub fairway_rounds: u32,
    pub green_in_regulation_percentage: f64,
    pub putts_per_round: f64,
    pub total_rounds_played: u32,
    pub birdies: u32,
    pub pars: u32,
    pub bogeys: u32,
    pub double_bogeys: u32,
    pub total_wins: u32,
    pub total_losses: u32,
}

/// Strokes relative to par, for the buckets the statistics profile counts.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreCategory {
    Birdie,
    Par,
    Bogey,
    DoubleBogey,
}

impl ScoreCategory {
    /// Anything outside birdie..=double bogey is uncounted.
    #[must_use]
    pub fn classify(strokes: u32, par: u8) -> Option<Self> {
        match i64::from(strokes) - i64::from(par) {
            -1 => Some(Self::Birdie),
            0 => Some(Self::Par),
            1 => Some(Self::Bogey),
            2 => Some(Self::DoubleBogey),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CategoryCounts {
    pub birdies: u32,
    pub pars: u32,
    pub bogeys: u32,
    pub double_bogeys: u32,
}

impl CategoryCounts {
    pub fn add(&mut self, category: ScoreCategory) {
        match category {
            ScoreCategory::Birdie => self.birdies += 1,
            ScoreCategory::Par => self.pars += 1,
            ScoreCategory::Bogey => self.bogeys += 1,
            ScoreCategory::DoubleBogey => self.double_bogeys += 1,
        }
    }
}
