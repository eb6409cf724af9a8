//! Schedule validation.
//!
//! Re-derives every hard and soft constraint from a finished fixture list
//! and the configuration alone, so it can judge schedules produced
//! elsewhere as well as the engine's own output.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::calendar::build_calendar;
use crate::config::Config;
use crate::model::{pair_key, Fixture, Game, GameType, PairKey, SlotType, Team};

/// Result of validating a schedule. `valid` is true iff `errors` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "SCHEDULE VALIDATION REPORT")?;
        writeln!(f, "{}", rule)?;
        if self.valid {
            writeln!(f, "\nRESULT: VALID (no hard constraint violations)")?;
        } else {
            writeln!(f, "\nRESULT: INVALID ({} violations)", self.errors.len())?;
        }
        if !self.errors.is_empty() {
            writeln!(f, "\n--- ERRORS ({}) ---", self.errors.len())?;
            for e in &self.errors {
                writeln!(f, "  ERROR: {}", e)?;
            }
        }
        if !self.warnings.is_empty() {
            writeln!(f, "\n--- WARNINGS ({}) ---", self.warnings.len())?;
            for w in &self.warnings {
                writeln!(f, "  WARN: {}", w)?;
            }
        }
        Ok(())
    }
}

/// `(ISO week, block)` a date belongs to. A team plays at most once per key.
pub fn slot_block_key(date: NaiveDate) -> (u32, SlotType) {
    (date.iso_week().week(), SlotType::of(date))
}

/// Validate `fixtures` against `config`.
pub fn validate_schedule(fixtures: &[Fixture], config: &Config) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let teams = &config.teams;
    let roster = config.roster();

    let mut placed: Vec<&Game> = Vec::new();
    for f in fixtures {
        match f {
            Fixture::Placed(g) => placed.push(g),
            Fixture::Unplaced(u) => {
                let block = match u.slot_type {
                    SlotType::Weekday => "WD",
                    SlotType::Weekend => "WE",
                };
                errors.push(format!(
                    "UNSCHEDULED: {} vs {} (week {} {})",
                    u.home_team, u.away_team, u.week_number, block
                ));
            }
        }
    }

    let mut home: BTreeMap<&str, i64> = BTreeMap::new();
    let mut away: BTreeMap<&str, i64> = BTreeMap::new();
    let mut per_block: BTreeMap<(&str, (u32, SlotType)), usize> = BTreeMap::new();
    let mut pairs: BTreeMap<PairKey, usize> = BTreeMap::new();
    let mut day_fields: BTreeMap<(&str, NaiveDate), BTreeSet<&str>> = BTreeMap::new();
    let mut known: Vec<&Game> = Vec::new();

    for &g in &placed {
        let (h, a) = (g.home_team.as_str(), g.away_team.as_str());
        if !teams.contains_key(h) {
            errors.push(format!("Unknown home team: {}", h));
            continue;
        }
        if !teams.contains_key(a) {
            errors.push(format!("Unknown away team: {}", a));
            continue;
        }
        known.push(g);

        *home.entry(h).or_insert(0) += 1;
        *away.entry(a).or_insert(0) += 1;
        let block = slot_block_key(g.date);
        *per_block.entry((h, block)).or_insert(0) += 1;
        *per_block.entry((a, block)).or_insert(0) += 1;
        *pairs.entry(pair_key(h, a)).or_insert(0) += 1;

        for t in [h, a] {
            let team = &teams[t];
            let league = roster.league_of(t);
            if league.is_blacked_out(g.date) {
                errors.push(format!(
                    "{} plays on blackout date {} (league {})",
                    t, g.date, league.code
                ));
            }
            let day = g.date.weekday();
            if team.excludes_day(day) {
                errors.push(format!("{} plays on {} ({}), a no-play day", t, day, g.date));
            }
            if !team.can_play_on(g.date) {
                errors.push(format!(
                    "{} (weekday-only) plays on weekend {} without it being an available weekend",
                    t, g.date
                ));
            }
        }

        let same_pool = roster.same_pool(h, a);
        match g.game_type {
            GameType::Intra if !same_pool => warnings.push(format!(
                "Intra-pool game {} vs {} has teams from different pools",
                h, a
            )),
            GameType::Crossover if same_pool => warnings.push(format!(
                "Crossover game {} vs {} has teams from same pool",
                h, a
            )),
            _ => {}
        }

        let field = g.field_name.as_str();
        if !roster.league_of(h).field_names().contains(field)
            && !roster.league_of(a).field_names().contains(field)
        {
            errors.push(format!(
                "Game {} vs {} on {} uses field {} which belongs to neither team's league",
                h, a, g.date, field
            ));
        }

        for t in [h, a] {
            day_fields.entry((t, g.date)).or_default().insert(field);
        }
    }

    for ((team, (week, block)), count) in &per_block {
        if *count > 1 {
            errors.push(format!("{} plays {} games in week {} {}", team, count, week, block));
        }
    }

    let never_host = roster.never_host_teams();
    for t in teams.keys() {
        let h = home.get(t.as_str()).copied().unwrap_or(0);
        let a = away.get(t.as_str()).copied().unwrap_or(0);
        if (h - a).abs() > 1 {
            let msg = format!("{} home/away imbalance: {}H/{}A (diff={:+})", t, h, a, h - a);
            if never_host.contains(t) {
                warnings.push(format!("{} (no home fields)", msg));
            } else {
                errors.push(msg);
            }
        }
    }

    check_avoid_groups(config, &day_fields, &mut warnings);
    check_byes(fixtures, &known, teams, config, &mut errors);

    for ((t1, t2), count) in &pairs {
        if *count > 1 {
            let label = if roster.same_pool(t1, t2) {
                "Intra-pool pair"
            } else {
                "Cross-pool pair"
            };
            warnings.push(format!("{} {} vs {} played {} times", label, t1, t2, count));
        }
    }

    check_game_count_spread(&known, config, &mut errors, &mut warnings);

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn check_avoid_groups(
    config: &Config,
    day_fields: &BTreeMap<(&str, NaiveDate), BTreeSet<&str>>,
    warnings: &mut Vec<String>,
) {
    for group in &config.avoid_same_time_groups {
        let members: Vec<&String> = group.iter().collect();
        for (i, t1) in members.iter().enumerate() {
            for t2 in &members[i + 1..] {
                let first = day_fields.iter().filter(|((t, _), _)| *t == t1.as_str());
                for ((_, date), f1) in first {
                    let Some(f2) = day_fields.get(&(t2.as_str(), *date)) else {
                        continue;
                    };
                    let all: BTreeSet<&str> = f1.union(f2).copied().collect();
                    if all.len() > 1 {
                        warnings.push(format!(
                            "Teams {{{}, {}}} play same day {} at different fields {:?} (avoid_same_time group)",
                            t1, t2, date, all
                        ));
                    }
                }
            }
        }
    }
}

/// A bye is a slot where a team could play but has neither a placed nor an
/// unplaced fixture. Slots are keyed by `(week number, block)`.
fn check_byes(
    fixtures: &[Fixture],
    placed: &[&Game],
    teams: &BTreeMap<String, Team>,
    config: &Config,
    errors: &mut Vec<String>,
) {
    let mut playing: BTreeMap<(u32, SlotType), BTreeSet<&str>> = BTreeMap::new();
    let mut dates: BTreeMap<(u32, SlotType), BTreeSet<NaiveDate>> = BTreeMap::new();
    for g in placed {
        let key = (g.week_number, SlotType::of(g.date));
        let p = playing.entry(key).or_default();
        p.insert(g.home_team.as_str());
        p.insert(g.away_team.as_str());
        dates.entry(key).or_default().insert(g.date);
    }
    let mut unplaced: BTreeMap<(u32, SlotType), BTreeSet<&str>> = BTreeMap::new();
    for f in fixtures.iter().filter(|f| f.is_unplaced()) {
        let u = unplaced.entry((f.week_number(), f.slot_type())).or_default();
        u.insert(f.home_team());
        u.insert(f.away_team());
    }

    let mut bye_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (key, slot_dates) in &dates {
        let (week, block) = *key;
        let none = BTreeSet::new();
        let in_slot = playing.get(key).unwrap_or(&none);
        let unplaced_here = unplaced.get(key).unwrap_or(&none);

        let byes: Vec<&str> = teams
            .values()
            .filter(|team| {
                let code = team.code.as_str();
                !in_slot.contains(code)
                    && !unplaced_here.contains(code)
                    && could_play(team, block, slot_dates, config)
            })
            .map(|team| team.code.as_str())
            .collect();

        for t in &byes {
            *bye_counts.entry(*t).or_insert(0) += 1;
        }
        if byes.len() > 1 {
            errors.push(format!(
                "Week {} {}: {} teams have byes ({}), max is 1",
                week,
                block,
                byes.len(),
                byes.join(", ")
            ));
        }
    }

    if bye_counts.is_empty() {
        return;
    }
    let count = |t: &str| bye_counts.get(t).copied().unwrap_or(0);
    let min = teams.keys().map(|t| count(t)).min().unwrap_or(0);
    let max = teams.keys().map(|t| count(t)).max().unwrap_or(0);
    if max - min > 1 {
        let over: Vec<String> = teams
            .keys()
            .filter(|t| count(t) > min + 1)
            .map(|t| format!("{}({})", t, count(t)))
            .collect();
        errors.push(format!(
            "Bye spread {} exceeds limit of 1: min={}, max={}. Over limit: {}",
            max - min,
            min,
            max,
            over.join(", ")
        ));
    }
}

/// Whether a team was structurally able to play on any of `dates`.
fn could_play(team: &Team, block: SlotType, dates: &BTreeSet<NaiveDate>, config: &Config) -> bool {
    if block == SlotType::Weekend
        && team.weekday_only
        && !dates.iter().any(|d| team.available_weekends.contains(d))
    {
        return false;
    }
    match config.leagues.get(&team.league_code) {
        Some(league) => !dates.iter().all(|d| league.is_blacked_out(*d)),
        None => false,
    }
}

/// Weekday spread is a warning for every team; weekend spread is an error
/// among the teams that play weekends.
///
/// A weekend slot a team cannot play at all (league blackout) counts as a
/// game for that team, so blackout-heavy leagues are not flagged for games
/// they could never have played.
fn check_game_count_spread(
    placed: &[&Game],
    config: &Config,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let teams = &config.teams;
    let mut weekday: BTreeMap<&str, usize> = teams.keys().map(|t| (t.as_str(), 0)).collect();
    let mut weekend: BTreeMap<&str, usize> = teams
        .values()
        .filter(|t| !t.weekday_only)
        .map(|t| (t.code.as_str(), 0))
        .collect();
    for g in placed {
        let counts = match SlotType::of(g.date) {
            SlotType::Weekday => &mut weekday,
            SlotType::Weekend => &mut weekend,
        };
        for t in [g.home_team.as_str(), g.away_team.as_str()] {
            if let Some(c) = counts.get_mut(t) {
                *c += 1;
            }
        }
    }

    let slots = build_calendar(
        config.season.start_date,
        config.season.end_date,
        teams,
        &config.leagues,
    );
    for slot in slots.iter().filter(|s| s.slot_type == SlotType::Weekend) {
        for (team, count) in weekend.iter_mut() {
            if !slot.is_available(team) {
                *count += 1;
            }
        }
    }

    if let Some((min, max)) = spread(&weekday) {
        warnings.push(format!("Weekday game count spread: {}-{}", min, max));
    }
    if let Some((min, max)) = spread(&weekend) {
        errors.push(format!(
            "Weekend game count spread: {}-{} among teams that play weekends",
            min, max
        ));
    }
}

/// `(min, max)` when they differ by more than one.
fn spread(counts: &BTreeMap<&str, usize>) -> Option<(usize, usize)> {
    let min = counts.values().min()?;
    let max = counts.values().max()?;
    (max - min > 1).then_some((*min, *max))
}
