//! Per-team and per-field statistics over a finished schedule.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::config::Config;
use crate::model::{Fixture, Game, SlotType};

/// Counters for one team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamStats {
    pub home: usize,
    pub away: usize,
    /// Games played on this team's field, whoever was listed as home.
    pub hosted: usize,
    /// Home games played on the opponent's field.
    pub home_not_hosting: usize,
    pub weekday_home: usize,
    pub weekday_away: usize,
    pub weekend_home: usize,
    pub weekend_away: usize,
    pub total: usize,
    /// Slots in which the team could not play at all.
    pub blackouts: usize,
    /// Slots in which the team could play but had no fixture.
    pub byes: usize,
    pub unscheduled: usize,
}

impl TeamStats {
    pub fn diff(&self) -> i64 {
        self.home as i64 - self.away as i64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleStats {
    pub teams: BTreeMap<String, TeamStats>,
    /// team -> weekday abbreviation -> games.
    pub day_counts: BTreeMap<String, BTreeMap<String, usize>>,
    /// team -> opponent -> games, symmetric.
    pub matchup_counts: BTreeMap<String, BTreeMap<String, usize>>,
    /// team -> week number -> games.
    pub games_per_week: BTreeMap<String, BTreeMap<u32, usize>>,
    /// `field|Day|HH:MM` -> slot label (`W3-weekday`) -> games.
    pub field_slot_usage: BTreeMap<String, BTreeMap<String, usize>>,
    pub unscheduled_count: usize,
}

const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Plain-text tables: season balance, matchup matrix, games per weekday
/// and games per week. Zero counts in the balance table are left blank and
/// rows with a home/away difference above one are flagged `***`.
impl fmt::Display for ScheduleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(70);
        writeln!(f, "{}", rule)?;
        writeln!(f, "SCHEDULE STATISTICS")?;
        writeln!(f, "{}", rule)?;
        self.fmt_balance(f)?;
        self.fmt_matchups(f)?;
        self.fmt_days(f)?;
        self.fmt_weeks(f)
    }
}

impl ScheduleStats {
    fn fmt_balance(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n--- SEASON BALANCE ---")?;
        writeln!(
            f,
            "{:<8} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5}  {:>5} {:>5} {:>5} {:>5}  {:>3} {:>3} {:>3}",
            "Team", "Home", "Vis", "Host", "H-Aw", "Total", "Diff", "WD-H", "WD-V", "WE-H", "WE-V",
            "BO", "BYE", "UNS"
        )?;
        writeln!(f, "{}", "-".repeat(92))?;
        for (t, ts) in &self.teams {
            let diff = ts.diff();
            writeln!(
                f,
                "{:<8} {} {} {} {} {} {}  {} {} {} {}  {} {} {}{}",
                t,
                cell(ts.home, 5),
                cell(ts.away, 5),
                cell(ts.hosted, 5),
                cell(ts.home_not_hosting, 5),
                cell(ts.total, 5),
                signed_cell(diff, 5),
                cell(ts.weekday_home, 5),
                cell(ts.weekday_away, 5),
                cell(ts.weekend_home, 5),
                cell(ts.weekend_away, 5),
                cell(ts.blackouts, 3),
                cell(ts.byes, 3),
                cell(ts.unscheduled, 3),
                if diff.abs() > 1 { " ***" } else { "" }
            )?;
        }
        Ok(())
    }

    fn fmt_matchups(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n--- MATCHUP MATRIX ---")?;
        write!(f, "{:>8}", "")?;
        for t in self.teams.keys() {
            write!(f, " {:>5}", t)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", "-".repeat(8 + 6 * self.teams.len()))?;
        for t1 in self.teams.keys() {
            write!(f, "{:>8}", t1)?;
            for t2 in self.teams.keys() {
                if t1 == t2 {
                    write!(f, "     -")?;
                } else {
                    write!(f, " {:>5}", lookup(&self.matchup_counts, t1, t2))?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }

    fn fmt_days(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n--- GAMES PER DAY OF WEEK ---")?;
        write!(f, "{:<8}", "Team")?;
        for d in DAYS {
            write!(f, " {:>4}", d)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", "-".repeat(8 + 5 * DAYS.len()))?;
        for t in self.teams.keys() {
            write!(f, "{:<8}", t)?;
            for d in DAYS {
                write!(f, " {:>4}", lookup(&self.day_counts, t, d))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }

    fn fmt_weeks(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n--- GAMES PER WEEK ---")?;
        let max_week = self
            .games_per_week
            .values()
            .filter_map(|weeks| weeks.keys().max())
            .max()
            .copied()
            .unwrap_or(0);
        if max_week == 0 {
            return Ok(());
        }
        write!(f, "{:<8}", "Team")?;
        for w in 1..=max_week {
            write!(f, " W{:>2}", w)?;
        }
        writeln!(f)?;
        for t in self.teams.keys() {
            write!(f, "{:<8}", t)?;
            for w in 1..=max_week {
                let c = self.games_per_week.get(t).and_then(|m| m.get(&w)).copied().unwrap_or(0);
                write!(f, " {:>3}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn lookup(table: &BTreeMap<String, BTreeMap<String, usize>>, row: &str, col: &str) -> usize {
    table.get(row).and_then(|m| m.get(col)).copied().unwrap_or(0)
}

fn cell(v: usize, width: usize) -> String {
    if v == 0 {
        " ".repeat(width)
    } else {
        format!("{:>width$}", v)
    }
}

fn signed_cell(v: i64, width: usize) -> String {
    if v == 0 {
        " ".repeat(width)
    } else {
        format!("{:>+width$}", v)
    }
}

/// Tally `fixtures` against the teams and leagues of `config`.
pub fn compute_stats(fixtures: &[Fixture], config: &Config) -> ScheduleStats {
    let mut stats = ScheduleStats {
        teams: config
            .teams
            .keys()
            .map(|t| (t.clone(), TeamStats::default()))
            .collect(),
        ..ScheduleStats::default()
    };

    let games: Vec<&Game> = fixtures.iter().filter_map(Fixture::as_game).collect();
    for g in &games {
        tally_game(&mut stats, g);
    }

    let mut unplaced_slots: BTreeMap<&str, BTreeSet<(u32, SlotType)>> = BTreeMap::new();
    for f in fixtures.iter().filter(|f| f.is_unplaced()) {
        stats.unscheduled_count += 1;
        for t in [f.home_team(), f.away_team()] {
            if let Some(ts) = stats.teams.get_mut(t) {
                ts.unscheduled += 1;
            }
            unplaced_slots.entry(t).or_default().insert((f.week_number(), f.slot_type()));
        }
    }

    count_blackouts_and_byes(&mut stats, &games, &unplaced_slots, config);
    stats
}

fn tally_game(stats: &mut ScheduleStats, g: &Game) {
    let (h, a) = (g.home_team.as_str(), g.away_team.as_str());
    let weekend = SlotType::of(g.date) == SlotType::Weekend;

    if let Some(ts) = stats.teams.get_mut(h) {
        ts.home += 1;
        ts.total += 1;
        if weekend {
            ts.weekend_home += 1;
        } else {
            ts.weekday_home += 1;
        }
        if g.host_team != g.home_team {
            ts.home_not_hosting += 1;
        }
    }
    if let Some(ts) = stats.teams.get_mut(a) {
        ts.away += 1;
        ts.total += 1;
        if weekend {
            ts.weekend_away += 1;
        } else {
            ts.weekday_away += 1;
        }
    }
    if let Some(ts) = stats.teams.get_mut(g.host_team.as_str()) {
        ts.hosted += 1;
    }

    let day = g.date.weekday().to_string();
    for (t, opp) in [(h, a), (a, h)] {
        *stats
            .day_counts
            .entry(t.to_string())
            .or_default()
            .entry(day.clone())
            .or_insert(0) += 1;
        *stats
            .matchup_counts
            .entry(t.to_string())
            .or_default()
            .entry(opp.to_string())
            .or_insert(0) += 1;
        *stats
            .games_per_week
            .entry(t.to_string())
            .or_default()
            .entry(g.week_number)
            .or_insert(0) += 1;
    }

    let field_slot = format!("{}|{}|{}", g.field_name, day, g.start_time.format("%H:%M"));
    let week_slot = format!("W{}-{}", g.week_number, SlotType::of(g.date));
    *stats
        .field_slot_usage
        .entry(field_slot)
        .or_default()
        .entry(week_slot)
        .or_insert(0) += 1;
}

/// A slot counts as a blackout for a team when every date in it is blacked
/// out for the team's league, or it is a weekend slot a weekday-only team
/// cannot attend. Otherwise an absent team with no unplaced fixture there
/// has a bye.
fn count_blackouts_and_byes(
    stats: &mut ScheduleStats,
    games: &[&Game],
    unplaced_slots: &BTreeMap<&str, BTreeSet<(u32, SlotType)>>,
    config: &Config,
) {
    let mut slot_dates: BTreeMap<(u32, SlotType), BTreeSet<NaiveDate>> = BTreeMap::new();
    let mut played: BTreeMap<&str, BTreeSet<(u32, SlotType)>> = BTreeMap::new();
    for g in games {
        let key = (g.week_number, SlotType::of(g.date));
        slot_dates.entry(key).or_default().insert(g.date);
        played.entry(g.home_team.as_str()).or_default().insert(key);
        played.entry(g.away_team.as_str()).or_default().insert(key);
    }

    for (code, ts) in stats.teams.iter_mut() {
        let Some(team) = config.teams.get(code) else {
            continue;
        };
        let Some(league) = config.leagues.get(&team.league_code) else {
            continue;
        };
        for (key, dates) in &slot_dates {
            let weekend_excluded = key.1 == SlotType::Weekend
                && team.weekday_only
                && !dates.iter().any(|d| team.available_weekends.contains(d));
            if weekend_excluded || dates.iter().all(|d| league.is_blacked_out(*d)) {
                ts.blackouts += 1;
                continue;
            }
            let has = |m: &BTreeMap<&str, BTreeSet<(u32, SlotType)>>| {
                m.get(code.as_str()).is_some_and(|s| s.contains(key))
            };
            if !has(&played) && !has(unplaced_slots) {
                ts.byes += 1;
            }
        }
    }
}
