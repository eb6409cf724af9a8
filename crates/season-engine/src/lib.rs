//! # season-engine
//!
//! Deterministic season scheduling for youth leagues split into two pools.
//!
//! Given a YAML configuration of leagues, teams, recurring field slots and
//! blackout dates, the engine generates intra-pool and crossover round robins,
//! binds rounds to weekly calendar slots, assigns every matchup a concrete
//! field, date and time, and rebalances home/away counts. A single seeded
//! `ChaCha8Rng` drives every random choice, so the same configuration and
//! seed always produce the same schedule.
//!
//! ## Modules
//!
//! - [`model`]: teams, leagues, rounds, calendar slots, fixtures
//! - [`config`]: YAML loading and structural validation
//! - [`roundrobin`]: circle-method and crossover round generation
//! - [`calendar`]: weekday/weekend slot construction
//! - [`placement`]: rounds to slots, bye repair and equalization
//! - [`assignment`]: joint field/date/time/home-away assignment
//! - [`balance`]: home/away flip optimizer
//! - [`validate`]: constraint checking of a finished schedule
//! - [`stats`]: per-team and per-field statistics
//! - [`export`]: JSON fixture I/O
//! - [`error`]: Error types

pub mod assignment;
pub mod balance;
pub mod calendar;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod placement;
pub mod roundrobin;
pub mod stats;
pub mod validate;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

pub use assignment::AssignmentReport;
pub use balance::BalanceReport;
pub use config::Config;
pub use error::{ConfigError, Result};
pub use model::{Fixture, Game, Unplaced};
pub use placement::PlacementReport;
pub use stats::{compute_stats, ScheduleStats};
pub use validate::{validate_schedule, ValidationReport};

/// A finished schedule plus the phase reports that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleOutcome {
    pub fixtures: Vec<Fixture>,
    pub placement: PlacementReport,
    pub assignment: AssignmentReport,
    pub balance: BalanceReport,
}

/// Schedule a full season. Unplaced fixtures sort first, then by date and
/// start time.
pub fn schedule(config: &Config, seed: u64) -> Result<Vec<Fixture>> {
    schedule_with_report(config, seed).map(|o| o.fixtures)
}

/// [`schedule`], keeping the placement, assignment and balance reports.
pub fn schedule_with_report(config: &Config, seed: u64) -> Result<ScheduleOutcome> {
    config.validate()?;
    let roster = config.roster();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let north = &config.pools.north;
    let south = &config.pools.south;
    let north_rounds = roundrobin::generate_round_robin(north, &mut rng);
    let south_rounds = roundrobin::generate_round_robin(south, &mut rng);
    let crossover_north: Vec<String> = north
        .iter()
        .filter(|t| !config.teams.get(*t).is_some_and(|team| team.weekday_only))
        .cloned()
        .collect();
    let crossover_rounds = roundrobin::generate_crossover(&crossover_north, south, &mut rng);
    info!(
        "Generated {} north, {} south and {} crossover rounds (seed {})",
        north_rounds.len(),
        south_rounds.len(),
        crossover_rounds.len(),
        seed
    );

    let mut slots = calendar::build_calendar(
        config.season.start_date,
        config.season.end_date,
        &config.teams,
        &config.leagues,
    );
    info!("Calendar has {} slots", slots.len());

    let placement = placement::assign_rounds_to_slots(
        &mut slots,
        &north_rounds,
        &south_rounds,
        &crossover_rounds,
        roster,
    );
    let game_length = config.season.game_length_minutes;
    let assignment = assignment::assign_games(
        &mut slots,
        roster,
        game_length,
        &config.avoid_same_time_groups,
        &mut rng,
    );
    let balance = balance::balance_home_away(
        &mut slots,
        roster,
        game_length,
        &config.avoid_same_time_groups,
        &mut rng,
    );

    let mut fixtures: Vec<Fixture> = assignment::processing_order(&slots)
        .into_iter()
        .flat_map(|si| std::mem::take(&mut slots[si].games))
        .collect();
    fixtures.sort_by_key(Fixture::sort_key);

    let unplaced = fixtures.iter().filter(|f| f.is_unplaced()).count();
    info!(
        "Scheduled {} games ({} unplaced)",
        fixtures.len() - unplaced,
        unplaced
    );

    Ok(ScheduleOutcome {
        fixtures,
        placement,
        assignment,
        balance,
    })
}
