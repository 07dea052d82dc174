use clap::{Parser, ValueEnum};

use crate::model::GameType;
use crate::prefill::Fixture;
use crate::score::{EngineConfig, StatsPolicy};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatsPolicyArg {
    /// Every completed round feeds the golfer's statistics.
    All,
    /// Only Solo Play rounds feed statistics.
    SoloOnly,
}

impl From<StatsPolicyArg> for StatsPolicy {
    fn from(value: StatsPolicyArg) -> Self {
        match value {
            StatsPolicyArg::All => StatsPolicy::AllGameTypes,
            StatsPolicyArg::SoloOnly => StatsPolicy::SoloOnly,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The sqlite filename, or :memory: for a throwaway database.
    #[arg(short = 'n', long, value_name = "DATABASE_NAME")]
    pub db_name: String,
    /// If specified, this sql is run on program startup. Separate several files with ';'.
    #[arg(long, value_name = "DATABASE_STARTUP_SCRIPT", value_parser = crate::args::validation::check_readable_file)]
    pub db_startup_script: Option<String>,
    /// Golfers, tees and rounds to load before anything else.
    #[arg(
        long,
        value_name = "FIXTURE_JSON",
        value_parser = crate::args::validation::check_readable_file_and_json
    )]
    pub db_populate_json: Option<Fixture>,
    /// Complete these rounds, in order.
    #[arg(short = 'c', long = "complete-round", value_name = "ROUND_ID")]
    pub complete_rounds: Vec<i64>,
    /// Print the ranked leaderboard for these game types.
    #[arg(short = 'l', long = "leaderboard", value_name = "GAME_TYPE", value_parser = crate::args::validation::check_game_type)]
    pub leaderboards: Vec<GameType>,
    /// Print the statistics profile and milestones for these golfers.
    #[arg(short = 's', long = "statistics", value_name = "GOLFER_ID")]
    pub statistics: Vec<i64>,
    /// Look up the current handicap index for these golfers. Needs
    /// GHIN_ADMIN_USER and GHIN_ADMIN_PASSWORD in the environment.
    #[arg(long = "lookup-handicap", value_name = "GOLFER_ID")]
    pub lookup_handicap: Vec<i64>,
    /// Search the course directory by name. Same credentials as above.
    #[arg(long = "search-courses", value_name = "NAME")]
    pub search_courses: Vec<String>,
    /// Fetch tee sets and facility details for these courses.
    #[arg(long = "course-details", value_name = "COURSE_ID")]
    pub course_details: Vec<i64>,
    #[arg(long, value_enum, default_value = "all")]
    pub stats_policy: StatsPolicyArg,
    /// How many recent rounds a tournament leaderboard score covers.
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub tournament_window: u16,
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct CleanArgs {
    pub db_name: String,
    pub db_startup_script: Option<String>,
    pub db_populate_json: Option<Fixture>,
    pub combined_sql_script: String,
    pub complete_rounds: Vec<i64>,
    pub leaderboards: Vec<GameType>,
    pub statistics: Vec<i64>,
    pub lookup_handicap: Vec<i64>,
    pub search_courses: Vec<String>,
    pub course_details: Vec<i64>,
    pub engine: EngineConfig,
    pub log_level: String,
}
