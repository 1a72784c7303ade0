//! Runs one quest against the simulated location source and logs the result.
//!
//! ```text
//! QUEST_ID=easy_jogger1 SIM_SPEED_MPS=2.6 RUN_SECONDS=480 cargo run -p journey
//! ```

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use journey::prelude::*;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Fallback cap for quests with neither a time limit nor a distance.
const UNTIMED_RUN_SECS: u64 = 30 * 60;

/// The quest's time limit, or for untimed quests the time needed to cover
/// the distance at `speed_mps` with half again as slack.
fn default_run_secs(quest: &Quest, speed_mps: f64) -> u64 {
    let targets = &quest.targets;
    if targets.time_min > 0 {
        return targets.time_min.saturating_mul(60);
    }
    if targets.distance_km > 0.0 && speed_mps > 0.0 {
        return (targets.distance_km * 1000.0 / speed_mps * 1.5).ceil() as u64;
    }
    UNTIMED_RUN_SECS
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = match env::var("JOURNEY_CONFIG") {
        Ok(path) => TrackerConfig::from_path(&path)
            .with_context(|| format!("loading config from {path}"))?,
        Err(_) => TrackerConfig::default(),
    };
    let catalog = match env::var("QUEST_CATALOG") {
        Ok(path) => StaticCatalog::from_path(&path)
            .with_context(|| format!("loading quest catalog from {path}"))?,
        Err(_) => StaticCatalog::builtin(),
    };

    let quest_id = env::var("QUEST_ID").unwrap_or_else(|_| "easy_jogger1".to_string());
    let quest = catalog
        .get(&quest_id)
        .with_context(|| format!("unknown quest {quest_id}"))?;
    let speed = env_parse("SIM_SPEED_MPS", quest.targets.required_speed_mps.max(1.0) * 1.1);
    let run_for = Duration::from_secs(env_parse("RUN_SECONDS", default_run_secs(&quest, speed)));

    tracing::info!(
        "Quest {} ({}): {} in {} min at {} or faster",
        quest.id,
        quest.category.difficulty(),
        format_distance(quest.targets.distance_km),
        quest.targets.time_min,
        format_speed(quest.targets.required_speed_mps)
    );

    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let tracker = SessionTracker::with_clock(config.clone(), Arc::new(LoggingCueSink), clock.clone());
    let simulator = SimulatedLocationSource::with_clock(config.simulation.clone(), clock);
    simulator.start(speed);

    if !tracker.start(&quest).is_started() {
        anyhow::bail!("could not start quest {}", quest.id);
    }
    tracker.follow(simulator.fix_stream());

    let mut updates = tracker.subscribe();
    let deadline = tokio::time::sleep(run_for);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let Some(session) = updates.borrow_and_update().clone() else { break };
                if quest.targets.distance_km > 0.0 && session.distance_km >= quest.targets.distance_km {
                    break;
                }
            }
        }
    }

    simulator.stop();
    let result = tracker.complete(&quest);

    tracing::info!("Result: {}", if result.completed { "success" } else { "failed" });
    tracing::info!("  Time: {}", format_elapsed(result.time_taken_ms));
    tracing::info!("  Distance: {}", format_distance(result.distance_km));
    tracing::info!("  Average speed: {}", format_speed(result.average_speed_mps));
    tracing::info!("  Rewards: {} gold, {} xp", result.gold_earned, result.xp_earned);
    if !result.npc_message.is_empty() {
        tracing::info!("  {}: {}", quest.npc_name, result.npc_message);
    }

    Ok(())
}
