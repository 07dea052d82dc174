pub mod types;
pub mod validation;

use clap::Parser;

use crate::score::EngineConfig;
pub use types::{Args, CleanArgs, StatsPolicyArg};

/// Parse the command line and resolve it into [`CleanArgs`].
///
/// # Errors
///
/// Will return `Err` if a startup script cannot be read
pub fn args_checks() -> Result<CleanArgs, String> {
    clean(Args::parse())
}

/// # Errors
///
/// Will return `Err` if a startup script cannot be read
pub fn clean(args: Args) -> Result<CleanArgs, String> {
    let combined_sql_script = match &args.db_startup_script {
        Some(files) => validation::combine_sql_scripts(files)?,
        None => String::new(),
    };
    Ok(CleanArgs {
        db_name: args.db_name,
        db_startup_script: args.db_startup_script,
        db_populate_json: args.db_populate_json,
        combined_sql_script,
        complete_rounds: args.complete_rounds,
        leaderboards: args.leaderboards,
        statistics: args.statistics,
        lookup_handicap: args.lookup_handicap,
        search_courses: args.search_courses,
        course_details: args.course_details,
        engine: EngineConfig {
            stats_policy: args.stats_policy.into(),
            tournament_window: usize::from(args.tournament_window),
        },
        log_level: args.log_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GameType;
    use crate::score::StatsPolicy;

    #[test]
    fn defaults_resolve_to_engine_defaults() {
        let args = Args::parse_from(["rusty-scorecard", "--db-name", ":memory:"]);
        let clean = clean(args).expect("clean");
        assert_eq!(clean.engine, EngineConfig::default());
        assert_eq!(clean.log_level, "warn");
        assert!(clean.combined_sql_script.is_empty());
    }

    #[test]
    fn repeatable_flags_collect() {
        let args = Args::parse_from([
            "rusty-scorecard",
            "-n",
            ":memory:",
            "-c",
            "3",
            "-c",
            "4",
            "-l",
            "Match Play",
            "--stats-policy",
            "solo-only",
            "--tournament-window",
            "2",
            "--search-courses",
            "Pine Valley",
            "--course-details",
            "77",
        ]);
        let clean = clean(args).expect("clean");
        assert_eq!(clean.complete_rounds, vec![3, 4]);
        assert_eq!(clean.leaderboards, vec![GameType::MatchPlay]);
        assert_eq!(clean.engine.stats_policy, StatsPolicy::SoloOnly);
        assert_eq!(clean.engine.tournament_window, 2);
        assert_eq!(clean.search_courses, vec!["Pine Valley".to_string()]);
        assert_eq!(clean.course_details, vec![77]);
    }

    #[test]
    fn zero_tournament_window_is_rejected() {
        let parsed = Args::try_parse_from([
            "rusty-scorecard",
            "-n",
            ":memory:",
            "--tournament-window",
            "0",
        ]);
        assert!(parsed.is_err());
    }
}
