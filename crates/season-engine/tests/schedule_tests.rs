//! End-to-end pipeline tests over the fixture configurations.

use std::collections::BTreeSet;

use chrono::Datelike;
use season_engine::export::{fixtures_from_json, fixtures_to_json};
use season_engine::model::{Fixture, Game, SlotType};
use season_engine::validate::slot_block_key;
use season_engine::{schedule, schedule_with_report, validate_schedule, Config, ConfigError};

fn load(name: &str) -> Config {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    Config::load(path).unwrap()
}

fn games(fixtures: &[Fixture]) -> Vec<&Game> {
    fixtures.iter().filter_map(Fixture::as_game).collect()
}

/// Every per-game rule that must hold no matter how the heuristics fare.
fn assert_hard_constraints(fixtures: &[Fixture], config: &Config) {
    let roster = config.roster();
    let mut booked = BTreeSet::new();
    let mut blocks = BTreeSet::new();

    for g in games(fixtures) {
        assert!(
            g.date >= config.season.start_date && g.date <= config.season.end_date,
            "{:?} outside season",
            g
        );
        assert_eq!(g.slot_type, SlotType::of(g.date));

        for t in [&g.home_team, &g.away_team] {
            let team = roster.team(t);
            let league = roster.league_of(t);
            assert!(!league.is_blacked_out(g.date), "{} plays on blackout {}", t, g.date);
            assert!(!team.excludes_day(g.date.weekday()), "{} plays on no-play {}", t, g.date);
            if team.weekday_only && g.slot_type == SlotType::Weekend {
                assert!(team.available_weekends.contains(&g.date), "{} on weekend {}", t, g.date);
            }
            assert!(blocks.insert((t.clone(), slot_block_key(g.date))), "{} twice near {}", t, g.date);
        }

        assert!(g.host_team == g.home_team || g.host_team == g.away_team);
        let host_fields = roster.league_of(&g.host_team).fields(g.slot_type);
        assert!(
            host_fields.iter().any(|f| f.field_name == g.field_name
                && f.day == g.date.weekday()
                && f.start_time == g.start_time
                && !f.exclude_dates.contains(&g.date)),
            "{:?} not on a field slot of its host",
            g
        );
        assert!(
            booked.insert((g.field_name.clone(), g.date, g.start_time)),
            "{} double-booked on {}",
            g.field_name,
            g.date
        );
    }
}

// ── Full season ─────────────────────────────────────────────────────────────

#[test]
fn full_league_schedules_every_game() {
    let config = load("league.yaml");
    let fixtures = schedule(&config, 42).unwrap();

    assert!(!fixtures.is_empty());
    assert!(fixtures.iter().all(|f| !f.is_unplaced()), "unplaced fixtures left");
    assert_hard_constraints(&fixtures, &config);
}

#[test]
fn full_league_passes_validation() {
    let config = load("league.yaml");
    let fixtures = schedule(&config, 42).unwrap();
    let report = validate_schedule(&fixtures, &config);

    assert!(report.valid, "{}", report);
    assert!(fixtures.iter().all(|f| !matches!(f, Fixture::Unplaced(_))));
}

#[test]
fn weekday_only_team_never_plays_weekends() {
    let config = load("league.yaml");
    let fixtures = schedule(&config, 7).unwrap();
    assert!(games(&fixtures)
        .iter()
        .filter(|g| g.involves("CED2"))
        .all(|g| g.slot_type == SlotType::Weekday));
}

#[test]
fn fieldless_team_never_hosts() {
    let config = load("league.yaml");
    let fixtures = schedule(&config, 42).unwrap();
    let rav: Vec<&Game> = games(&fixtures).into_iter().filter(|g| g.involves("RAV1")).collect();
    assert!(!rav.is_empty());
    assert!(rav.iter().all(|g| g.host_team != "RAV1"));
}

#[test]
fn outcome_carries_phase_reports() {
    let config = load("league.yaml");
    let outcome = schedule_with_report(&config, 42).unwrap();

    assert!(outcome.balance.never_host_teams.contains("RAV1"));
    assert_eq!(outcome.fixtures, schedule(&config, 42).unwrap());
}

// ── Blackouts and restrictions ──────────────────────────────────────────────

#[test]
fn blackout_season_respects_every_restriction() {
    let config = load("blackouts.yaml");
    for seed in [1, 2, 3] {
        let fixtures = schedule(&config, seed).unwrap();
        assert_hard_constraints(&fixtures, &config);
    }
}

#[test]
fn blackout_season_has_clean_seeds() {
    let config = load("blackouts.yaml");
    let clean: Vec<u64> = (0..20)
        .filter(|&seed| {
            let fixtures = schedule(&config, seed).unwrap();
            validate_schedule(&fixtures, &config).valid
        })
        .collect();
    assert!(!clean.is_empty(), "no seed in 0..20 validates");
}

#[test]
fn blackout_season_weekday_only_rule_holds_for_every_seed() {
    let config = load("blackouts.yaml");
    for seed in 0..8 {
        let fixtures = schedule(&config, seed).unwrap();
        let report = validate_schedule(&fixtures, &config);
        assert!(
            report.errors.iter().all(|e| !e.contains("weekday-only")),
            "seed {}: {:?}",
            seed,
            report.errors
        );
    }
}

#[test]
fn available_weekend_is_the_only_weekend() {
    let config = load("blackouts.yaml");
    let fixtures = schedule(&config, 5).unwrap();
    let weekend_dates: BTreeSet<_> = games(&fixtures)
        .iter()
        .filter(|g| g.involves("BRS2") && g.slot_type == SlotType::Weekend)
        .map(|g| g.date)
        .collect();
    assert!(weekend_dates.iter().all(|d| d.to_string() == "2026-03-28"), "{:?}", weekend_dates);
}

// ── Ordering and determinism ────────────────────────────────────────────────

#[test]
fn unplaced_first_then_chronological() {
    let config = load("blackouts.yaml");
    let fixtures = schedule(&config, 11).unwrap();

    let first_placed = fixtures.iter().position(|f| !f.is_unplaced()).unwrap_or(fixtures.len());
    assert!(fixtures[first_placed..].iter().all(|f| !f.is_unplaced()));
    let keys: Vec<_> = games(&fixtures).iter().map(|g| (g.date, g.start_time)).collect();
    assert!(keys.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn same_seed_same_schedule() {
    let config = load("league.yaml");
    assert_eq!(schedule(&config, 99).unwrap(), schedule(&config, 99).unwrap());
}

#[test]
fn different_seeds_differ() {
    let config = load("league.yaml");
    assert_ne!(schedule(&config, 1).unwrap(), schedule(&config, 2).unwrap());
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = load("blackouts.yaml");
    config.season.game_length_minutes = 0;
    assert!(matches!(schedule(&config, 1), Err(ConfigError::Invalid(_))));
}

// ── Export ──────────────────────────────────────────────────────────────────

#[test]
fn json_export_round_trips_and_numbers_games() {
    let config = load("league.yaml");
    let fixtures = schedule(&config, 42).unwrap();
    let json = fixtures_to_json(&fixtures, &config.season.game_code_prefix).unwrap();

    assert!(json.contains("\"game_code\": \"S001\""));
    assert!(json.contains("\"status\": \"placed\""));
    assert_eq!(fixtures_from_json(&json).unwrap(), fixtures);
}
