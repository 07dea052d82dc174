mod common;

use common::{
    card_with_total, memory_engine, play_round, record_card, seed_course, sqlite_engine,
    start_round, PARS,
};
use rusty_scorecard::model::{HoleView, StrokeDetails};
use rusty_scorecard::{EngineConfig, EngineError, RoundEngine, StatsPolicy, Storage};

/// Records `strokes` with every fairway hit, or none of them.
async fn record_fairways<S: Storage>(
    engine: &RoundEngine<S>,
    round_id: i64,
    strokes: &[u32],
    fairway_hit: bool,
) -> Result<(), EngineError> {
    for (&count, hole) in strokes.iter().zip(1u8..) {
        let details = StrokeDetails {
            strokes: count,
            putts: 2,
            fairway_hit,
            ..StrokeDetails::default()
        };
        engine.record_score(round_id, hole, 1, details).await?;
    }
    Ok(())
}

async fn check_running_means<S: Storage>(engine: RoundEngine<S>) -> Result<(), EngineError> {
    seed_course(&engine, &[1]).await?;
    assert_eq!(engine.statistics(1).await?, None);

    let first = start_round(&engine, 1, "Solo Play", "2024-09-01").await?;
    record_fairways(&engine, first, &card_with_total(80), true).await?;
    engine.on_round_completed(first).await?;

    let stat = engine.statistics(1).await?.expect("statistics");
    assert_eq!(stat.total_rounds_played, 1);
    assert!((stat.average_score - 80.0).abs() < 1e-9);
    assert!((stat.fairway_hit_percentage - 100.0).abs() < 1e-9);
    assert!((stat.putts_per_round - 36.0).abs() < 1e-9);

    let second = start_round(&engine, 1, "Solo Play", "2024-09-02").await?;
    record_fairways(&engine, second, &card_with_total(90), false).await?;
    engine.on_round_completed(second).await?;

    let stat = engine.statistics(1).await?.expect("statistics");
    assert_eq!(stat.total_rounds_played, 2);
    assert!((stat.average_score - 85.0).abs() < 1e-9);
    assert!((stat.fairway_hit_percentage - 50.0).abs() < 1e-9);
    assert!(stat.green_in_regulation_percentage.abs() < 1e-9);
    // 80 is eight bogeys on a par card, 90 is eighteen
    assert_eq!(stat.bogeys, 26);
    assert_eq!(stat.pars, 10);
    assert_eq!(stat.birdies, 0);
    assert_eq!(stat.double_bogeys, 0);
    Ok(())
}

#[tokio::test]
async fn test3_running_means_memory() -> Result<(), Box<dyn std::error::Error>> {
    check_running_means(memory_engine(EngineConfig::default())).await?;
    Ok(())
}

#[tokio::test]
async fn test3_running_means_sqlite() -> Result<(), Box<dyn std::error::Error>> {
    check_running_means(sqlite_engine(EngineConfig::default())).await?;
    Ok(())
}

async fn check_par_three_round_keeps_fairway_mean<S: Storage>(
    engine: RoundEngine<S>,
) -> Result<(), EngineError> {
    seed_course(&engine, &[1]).await?;
    let first = start_round(&engine, 1, "Solo Play", "2024-09-03").await?;
    record_fairways(&engine, first, &[4, 4], true).await?;
    engine.on_round_completed(first).await?;

    // hole 3 is the only hole played and it is a par 3
    assert_eq!(PARS[2], 3);
    let second = start_round(&engine, 1, "Solo Play", "2024-09-04").await?;
    engine
        .record_score(second, 3, 1, StrokeDetails::strokes(3))
        .await?;
    engine.on_round_completed(second).await?;

    let stat = engine.statistics(1).await?.expect("statistics");
    assert!((stat.fairway_hit_percentage - 100.0).abs() < 1e-9);
    assert!((stat.average_score - 5.5).abs() < 1e-9);
    Ok(())
}

async fn check_par_three_first_round_does_not_seed_fairways<S: Storage>(
    engine: RoundEngine<S>,
) -> Result<(), EngineError> {
    seed_course(&engine, &[1]).await?;
    let first = start_round(&engine, 1, "Solo Play", "2024-09-05").await?;
    engine
        .record_score(first, 3, 1, StrokeDetails::strokes(3))
        .await?;
    engine.on_round_completed(first).await?;
    let stat = engine.statistics(1).await?.expect("statistics");
    assert_eq!(stat.fairway_rounds, 0);

    // holes 1 and 2 are par 4s; one fairway of two
    let second = start_round(&engine, 1, "Solo Play", "2024-09-06").await?;
    let hit = StrokeDetails {
        strokes: 4,
        fairway_hit: true,
        ..StrokeDetails::default()
    };
    engine.record_score(second, 1, 1, hit).await?;
    engine
        .record_score(second, 2, 1, StrokeDetails::strokes(5))
        .await?;
    engine.on_round_completed(second).await?;

    let stat = engine.statistics(1).await?.expect("statistics");
    assert!((stat.fairway_hit_percentage - 50.0).abs() < 1e-9);
    assert_eq!(stat.fairway_rounds, 1);
    assert_eq!(stat.total_rounds_played, 2);
    Ok(())
}

#[tokio::test]
async fn test3_par_three_first_round_does_not_seed_fairways_memory()
-> Result<(), Box<dyn std::error::Error>> {
    check_par_three_first_round_does_not_seed_fairways(memory_engine(EngineConfig::default()))
        .await?;
    Ok(())
}

#[tokio::test]
async fn test3_par_three_first_round_does_not_seed_fairways_sqlite()
-> Result<(), Box<dyn std::error::Error>> {
    check_par_three_first_round_does_not_seed_fairways(sqlite_engine(EngineConfig::default()))
        .await?;
    Ok(())
}

#[tokio::test]
async fn test3_par_three_round_keeps_fairway_mean_memory() -> Result<(), Box<dyn std::error::Error>>
{
    check_par_three_round_keeps_fairway_mean(memory_engine(EngineConfig::default())).await?;
    Ok(())
}

#[tokio::test]
async fn test3_par_three_round_keeps_fairway_mean_sqlite() -> Result<(), Box<dyn std::error::Error>>
{
    check_par_three_round_keeps_fairway_mean(sqlite_engine(EngineConfig::default())).await?;
    Ok(())
}

async fn check_wins_and_losses<S: Storage>(engine: RoundEngine<S>) -> Result<(), EngineError> {
    seed_course(&engine, &[1, 2]).await?;
    let round_id = play_round(
        &engine,
        "Stroke Play",
        "2024-09-05",
        &[(1, card_with_total(72)), (2, card_with_total(75))],
    )
    .await?;
    engine.on_round_completed(round_id).await?;

    let winner = engine.statistics(1).await?.expect("winner statistics");
    let loser = engine.statistics(2).await?.expect("loser statistics");
    assert_eq!((winner.total_wins, winner.total_losses), (1, 0));
    assert_eq!((loser.total_wins, loser.total_losses), (0, 1));

    // a tie is neither a win nor a loss
    let tied = play_round(
        &engine,
        "Stroke Play",
        "2024-09-06",
        &[(1, vec![4, 4]), (2, vec![4, 4])],
    )
    .await?;
    engine.on_round_completed(tied).await?;
    let winner = engine.statistics(1).await?.expect("winner statistics");
    assert_eq!(winner.total_rounds_played, 2);
    assert_eq!((winner.total_wins, winner.total_losses), (1, 0));
    Ok(())
}

#[tokio::test]
async fn test3_wins_and_losses_memory() -> Result<(), Box<dyn std::error::Error>> {
    check_wins_and_losses(memory_engine(EngineConfig::default())).await?;
    Ok(())
}

#[tokio::test]
async fn test3_wins_and_losses_sqlite() -> Result<(), Box<dyn std::error::Error>> {
    check_wins_and_losses(sqlite_engine(EngineConfig::default())).await?;
    Ok(())
}

#[tokio::test]
async fn test3_solo_only_policy() -> Result<(), Box<dyn std::error::Error>> {
    let engine = memory_engine(EngineConfig {
        stats_policy: StatsPolicy::SoloOnly,
        ..EngineConfig::default()
    });
    seed_course(&engine, &[1]).await?;

    let stroke = play_round(&engine, "Stroke Play", "2024-09-07", &[(1, vec![5, 5])]).await?;
    let outcome = engine.on_round_completed(stroke).await?;
    assert!(outcome.leaderboard_updated);
    assert!(!outcome.statistics_updated);
    assert_eq!(engine.statistics(1).await?, None);

    let solo = start_round(&engine, 1, "Solo Play", "2024-09-08").await?;
    record_card(&engine, solo, 1, &[4, 4]).await?;
    let outcome = engine.on_round_completed(solo).await?;
    assert!(outcome.statistics_updated);
    let stat = engine.statistics(1).await?.expect("statistics");
    assert_eq!(stat.total_rounds_played, 1);
    assert!((stat.average_score - 8.0).abs() < 1e-9);
    Ok(())
}

async fn check_round_report<S: Storage>(engine: RoundEngine<S>) -> Result<(), EngineError> {
    seed_course(&engine, &[1]).await?;
    let empty = start_round(&engine, 1, "Solo Play", "2024-09-09").await?;
    let report = engine.round_report(empty).await?;
    assert_eq!(report.holes_played, 0);
    assert_eq!(report.total_strokes, 0);
    assert_eq!(report.average_per_hole, None);
    assert_eq!(report.best_score, None);
    assert_eq!(report.worst_score, None);
    assert!(report.complete_views.is_empty());

    // completing an empty round touches no profile
    let outcome = engine.on_round_completed(empty).await?;
    assert!(!outcome.statistics_updated);
    assert_eq!(engine.statistics(1).await?, None);

    let played = start_round(&engine, 1, "Solo Play", "2024-09-10").await?;
    let mut card = vec![4; 9];
    card.extend(vec![5; 9]);
    card[0] = 3;
    record_card(&engine, played, 1, &card).await?;
    let report = engine.round_report(played).await?;
    assert_eq!(report.holes_played, 18);
    assert_eq!(report.front_nine, 35);
    assert_eq!(report.back_nine, 45);
    assert_eq!(report.total_strokes, 80);
    assert_eq!(report.best_score, Some(3));
    assert_eq!(report.worst_score, Some(5));
    let average = report.average_per_hole.expect("average");
    assert!((average - 80.0 / 18.0).abs() < 1e-9);
    assert_eq!(
        report.complete_views,
        vec![HoleView::Front, HoleView::Back, HoleView::Full]
    );
    Ok(())
}

#[tokio::test]
async fn test3_round_report_memory() -> Result<(), Box<dyn std::error::Error>> {
    check_round_report(memory_engine(EngineConfig::default())).await?;
    Ok(())
}

#[tokio::test]
async fn test3_round_report_sqlite() -> Result<(), Box<dyn std::error::Error>> {
    check_round_report(sqlite_engine(EngineConfig::default())).await?;
    Ok(())
}
