use std::sync::Arc;

use anyhow::{Context, anyhow};
use rusty_scorecard::args::{self, CleanArgs};
use rusty_scorecard::lookup::{
    CredentialCache, GhinClient, GhinLogin, course_details_report, course_search_report, ghin,
    handicap_report,
};
use rusty_scorecard::prefill::db_prefill;
use rusty_scorecard::{RoundEngine, SqliteStorage, Storage};
use serde_json::{Value, json};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = args::args_checks().map_err(|e| anyhow!(e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let storage = SqliteStorage::open(&args.db_name)
        .with_context(|| format!("opening database {}", args.db_name))?;

    if args.db_startup_script.is_some() {
        storage
            .execute_batch(&args.combined_sql_script)
            .await
            .context("running startup script")?;
    }

    let engine = RoundEngine::new(storage, args.engine);
    let report = run(&args, &engine).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run<S: Storage>(args: &CleanArgs, engine: &RoundEngine<S>) -> anyhow::Result<Value> {
    let prefilled = match &args.db_populate_json {
        Some(fixture) => db_prefill(fixture, engine).await?,
        None => Vec::new(),
    };

    let mut completed = Vec::with_capacity(args.complete_rounds.len());
    for round_id in &args.complete_rounds {
        completed.push(engine.on_round_completed(*round_id).await?);
    }

    let mut leaderboards = serde_json::Map::new();
    for game_type in &args.leaderboards {
        if !game_type.has_leaderboard() {
            warn!(%game_type, "game type keeps no leaderboard");
            continue;
        }
        let entries = engine.leaderboard(*game_type).await?;
        leaderboards.insert(game_type.name().to_string(), serde_json::to_value(entries)?);
    }

    let mut statistics = Vec::with_capacity(args.statistics.len());
    for golfer_id in &args.statistics {
        let statistic = engine.statistics(*golfer_id).await?;
        let milestones = engine.milestones(*golfer_id).await?;
        statistics.push(json!({
            "golfer_id": golfer_id,
            "statistic": statistic,
            "milestones": milestones,
        }));
    }

    let client = ghin_client(args);
    let handicaps = handicap_report(engine.storage(), client.as_ref(), &args.lookup_handicap).await;
    let mut courses = Vec::with_capacity(args.search_courses.len());
    for name in &args.search_courses {
        courses.push(course_search_report(client.as_ref(), name).await);
    }
    let mut course_details = Vec::with_capacity(args.course_details.len());
    for course_id in &args.course_details {
        course_details.push(course_details_report(client.as_ref(), *course_id).await);
    }

    Ok(json!({
        "prefilled": prefilled,
        "completed": completed,
        "leaderboards": leaderboards,
        "statistics": statistics,
        "handicaps": handicaps,
        "courses": courses,
        "course_details": course_details,
    }))
}

/// `None` when no lookup was asked for or the credentials are missing; the
/// report then carries nulls for those entries.
fn ghin_client(args: &CleanArgs) -> Option<GhinClient> {
    if args.lookup_handicap.is_empty()
        && args.search_courses.is_empty()
        && args.course_details.is_empty()
    {
        return None;
    }
    let (Ok(user), Ok(password)) = (
        std::env::var("GHIN_ADMIN_USER"),
        std::env::var("GHIN_ADMIN_PASSWORD"),
    ) else {
        warn!("GHIN_ADMIN_USER and GHIN_ADMIN_PASSWORD must be set for lookups");
        return None;
    };
    let http = reqwest::Client::new();
    let login = GhinLogin::new(http.clone(), ghin::DEFAULT_BASE_URL, user, password);
    Some(GhinClient::new(
        http,
        ghin::DEFAULT_BASE_URL,
        Arc::new(CredentialCache::new(login)),
    ))
}
