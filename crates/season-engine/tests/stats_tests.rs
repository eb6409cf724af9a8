//! Tests for schedule statistics.

use chrono::{NaiveDate, NaiveTime};
use season_engine::config::Config;
use season_engine::model::{end_time, Fixture, Game, GameType, Provenance, SlotType, Unplaced};
use season_engine::stats::compute_stats;

const CONFIG: &str = r#"
season:
  start_date: 2026-03-09
  end_date: 2026-03-22
pools:
  north: [A1, A2]
  south: [B1, B2]
leagues:
  A:
    teams: 2
    weekday_fields:
      - { field: Park, day: Tue }
    weekend_fields:
      - { field: Park, day: Sat }
      - { field: Park, day: Sun }
  B:
    teams: 2
    weekday_fields:
      - { field: Bowl, day: Wed }
    weekend_fields:
      - { field: Bowl, day: Sat }
      - { field: Bowl, day: Sun }
"#;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn placed(home: &str, away: &str, host: &str, on: NaiveDate, field: &str, week: u32) -> Fixture {
    let start = if SlotType::of(on) == SlotType::Weekday {
        NaiveTime::from_hms_opt(17, 30, 0).unwrap()
    } else {
        NaiveTime::from_hms_opt(10, 0, 0).unwrap()
    };
    Fixture::Placed(Game {
        home_team: home.to_string(),
        away_team: away.to_string(),
        host_team: host.to_string(),
        date: on,
        start_time: start,
        end_time: end_time(start, 150),
        field_name: field.to_string(),
        round_number: week,
        game_type: GameType::Intra,
        week_number: week,
        slot_type: SlotType::of(on),
        source: Provenance::Round,
    })
}

fn schedule() -> Vec<Fixture> {
    vec![
        placed("A1", "A2", "A1", date(2026, 3, 10), "Park", 1),
        placed("B1", "B2", "B1", date(2026, 3, 11), "Bowl", 1),
        placed("A1", "B2", "A1", date(2026, 3, 14), "Park", 1),
        placed("A2", "B1", "A2", date(2026, 3, 15), "Park", 1),
        placed("A2", "A1", "A2", date(2026, 3, 17), "Park", 2),
        placed("B2", "B1", "B2", date(2026, 3, 18), "Bowl", 2),
        placed("B2", "A2", "B2", date(2026, 3, 21), "Bowl", 2),
        placed("B1", "A1", "B1", date(2026, 3, 22), "Bowl", 2),
    ]
}

// ── Per-team counters ───────────────────────────────────────────────────────

#[test]
fn counts_home_away_by_block() {
    let config = Config::from_yaml_str(CONFIG).unwrap();
    let stats = compute_stats(&schedule(), &config);
    let a1 = &stats.teams["A1"];

    assert_eq!((a1.home, a1.away, a1.total), (2, 2, 4));
    assert_eq!((a1.weekday_home, a1.weekday_away), (1, 1));
    assert_eq!((a1.weekend_home, a1.weekend_away), (1, 1));
    assert_eq!(a1.hosted, 2);
    assert_eq!(a1.home_not_hosting, 0);
    assert_eq!(a1.diff(), 0);
    assert_eq!((a1.byes, a1.blackouts, a1.unscheduled), (0, 0, 0));
    assert_eq!(stats.unscheduled_count, 0);
}

#[test]
fn home_game_on_opponent_field_is_tracked() {
    let config = Config::from_yaml_str(CONFIG).unwrap();
    let mut fixtures = schedule();
    fixtures[7] = placed("B1", "A1", "A1", date(2026, 3, 22), "Park", 2);
    let stats = compute_stats(&fixtures, &config);

    assert_eq!(stats.teams["B1"].home_not_hosting, 1);
    assert_eq!(stats.teams["B1"].hosted, 1);
    assert_eq!(stats.teams["A1"].hosted, 3);
    assert_eq!(stats.teams["A1"].home, 2);
}

#[test]
fn every_configured_team_has_an_entry() {
    let config = Config::from_yaml_str(CONFIG).unwrap();
    let stats = compute_stats(&[], &config);
    assert_eq!(stats.teams.len(), 4);
    assert!(stats.teams.values().all(|t| t.total == 0));
}

// ── Breakdowns ──────────────────────────────────────────────────────────────

#[test]
fn day_and_opponent_breakdowns() {
    let config = Config::from_yaml_str(CONFIG).unwrap();
    let stats = compute_stats(&schedule(), &config);

    let days = &stats.day_counts["A1"];
    assert_eq!(days["Tue"], 2);
    assert_eq!(days["Sat"], 1);
    assert_eq!(days["Sun"], 1);

    let opponents = &stats.matchup_counts["A1"];
    assert_eq!(opponents["A2"], 2);
    assert_eq!(opponents["B1"], 1);
    assert_eq!(opponents["B2"], 1);
    assert_eq!(stats.matchup_counts["B2"]["A1"], 1);

    assert_eq!(stats.games_per_week["A1"][&1], 2);
    assert_eq!(stats.games_per_week["A1"][&2], 2);
}

#[test]
fn field_slot_usage_is_keyed_by_field_day_and_time() {
    let config = Config::from_yaml_str(CONFIG).unwrap();
    let stats = compute_stats(&schedule(), &config);

    let park_tue = &stats.field_slot_usage["Park|Tue|17:30"];
    assert_eq!(park_tue["W1-weekday"], 1);
    assert_eq!(park_tue["W2-weekday"], 1);
    assert_eq!(stats.field_slot_usage["Bowl|Sun|10:00"]["W2-weekend"], 1);
}

// ── Byes, blackouts, unscheduled ────────────────────────────────────────────

#[test]
fn missing_game_is_a_bye() {
    let config = Config::from_yaml_str(CONFIG).unwrap();
    let mut fixtures = schedule();
    fixtures.remove(3);
    let stats = compute_stats(&fixtures, &config);

    assert_eq!(stats.teams["A2"].byes, 1);
    assert_eq!(stats.teams["B1"].byes, 1);
    assert_eq!(stats.teams["A1"].byes, 0);
}

#[test]
fn blacked_out_slot_is_not_a_bye() {
    let yaml = CONFIG.replace(
        "  B:\n",
        "    blackout_dates: [\"2026-03-14:2026-03-15\"]\n  B:\n",
    );
    let config = Config::from_yaml_str(&yaml).unwrap();
    let fixtures: Vec<Fixture> = schedule()
        .into_iter()
        .filter(|f| f.week_number() != 1 || f.slot_type() == SlotType::Weekday)
        .chain([
            placed("B1", "B2", "B1", date(2026, 3, 14), "Bowl", 1),
        ])
        .collect();
    let stats = compute_stats(&fixtures, &config);

    assert_eq!(stats.teams["A1"].blackouts, 1);
    assert_eq!(stats.teams["A1"].byes, 0);
    assert_eq!(stats.teams["B1"].blackouts, 0);
}

#[test]
fn unplaced_fixtures_are_counted_and_not_byes() {
    let config = Config::from_yaml_str(CONFIG).unwrap();
    let mut fixtures = schedule();
    fixtures[3] = Fixture::Unplaced(Unplaced {
        home_team: "A2".to_string(),
        away_team: "B1".to_string(),
        round_number: 1,
        game_type: GameType::Crossover,
        week_number: 1,
        slot_type: SlotType::Weekend,
        source: Provenance::Round,
        reason: "A2: no weekend fields".to_string(),
    });
    let stats = compute_stats(&fixtures, &config);

    assert_eq!(stats.unscheduled_count, 1);
    assert_eq!(stats.teams["A2"].unscheduled, 1);
    assert_eq!(stats.teams["B1"].unscheduled, 1);
    assert_eq!(stats.teams["A2"].byes, 0);
}

#[test]
fn stats_serialize_to_json() {
    let config = Config::from_yaml_str(CONFIG).unwrap();
    let stats = compute_stats(&schedule(), &config);
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["teams"]["A1"]["home"], 2);
    assert_eq!(json["field_slot_usage"]["Park|Tue|17:30"]["W1-weekday"], 1);
}

// ── Text report ─────────────────────────────────────────────────────────────

fn row<'a>(text: &'a str, team: &str) -> Vec<&'a str> {
    text.lines()
        .find(|l| l.split_whitespace().next() == Some(team))
        .map(|l| l.split_whitespace().collect())
        .unwrap_or_default()
}

#[test]
fn text_report_lays_out_balance_and_matrix() {
    let config = Config::from_yaml_str(CONFIG).unwrap();
    let text = compute_stats(&schedule(), &config).to_string();

    assert!(text.contains("SCHEDULE STATISTICS"));
    for section in ["SEASON BALANCE", "MATCHUP MATRIX", "GAMES PER DAY OF WEEK", "GAMES PER WEEK"] {
        assert!(text.contains(&format!("--- {} ---", section)), "missing {}", section);
    }
    // Balance row first: zeros are blank.
    assert_eq!(row(&text, "A1"), vec!["A1", "2", "2", "2", "4", "1", "1", "1", "1"]);

    let matrix = &text[text.find("MATCHUP MATRIX").unwrap()..];
    // Skip the header row of team codes.
    let matrix = &matrix[matrix.find("\n-").unwrap()..];
    assert_eq!(row(matrix, "A1"), vec!["A1", "-", "2", "1", "1"]);
    let days = &text[text.find("GAMES PER DAY OF WEEK").unwrap()..];
    assert_eq!(row(days, "A1"), vec!["A1", "0", "2", "0", "0", "0", "1", "1"]);
    let weeks = &text[text.find("--- GAMES PER WEEK").unwrap()..];
    assert_eq!(row(weeks, "A1"), vec!["A1", "2", "2"]);
}

#[test]
fn text_report_flags_imbalance() {
    let config = Config::from_yaml_str(CONFIG).unwrap();
    let mut fixtures = schedule();
    fixtures[7] = placed("A1", "B1", "A1", date(2026, 3, 22), "Park", 2);
    let text = compute_stats(&fixtures, &config).to_string();

    let a1 = row(&text, "A1");
    assert_eq!(a1[..7], ["A1", "3", "1", "3", "4", "+2", "1"]);
    assert_eq!(a1.last(), Some(&"***"));
    assert_eq!(row(&text, "B1").last(), Some(&"***"));
    assert_ne!(row(&text, "A2").last(), Some(&"***"));
}
