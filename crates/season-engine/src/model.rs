//! Core data model: teams, leagues, field slots, matchups, rounds, calendar
//! slots and the fixtures the scheduler produces.
//!
//! Teams and leagues are read once from configuration and never mutated by
//! the scheduler. Games are value types: every relocation or home/away flip
//! builds a fresh [`Game`] through [`Game::relocated`] or [`Game::flipped`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// One of the two top-level groupings of teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pool {
    North,
    South,
}

/// Weekday block (Mon–Fri) or weekend block (Sat–Sun) of a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    Weekday,
    Weekend,
}

impl SlotType {
    /// The block a calendar date falls into.
    pub fn of(date: NaiveDate) -> Self {
        if is_weekend(date.weekday()) {
            SlotType::Weekend
        } else {
            SlotType::Weekday
        }
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotType::Weekday => f.write_str("weekday"),
            SlotType::Weekend => f.write_str("weekend"),
        }
    }
}

/// Same-pool (`Intra`) or cross-pool (`Crossover`) pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Intra,
    Crossover,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::Intra => f.write_str("intra"),
            GameType::Crossover => f.write_str("crossover"),
        }
    }
}

/// Where a pending matchup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Placed with its generated round.
    Round,
    /// Deferred by a blackout, then repaired into another slot.
    Deferred,
    /// A real generated pairing pulled from the deferred/overflow pool.
    SafeAdhoc,
    /// A pairing invented to fill idle teams.
    Adhoc,
}

pub(crate) fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Inclusive closed date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A single-day range.
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A recurring field/day/time usable for one league's home games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSlot {
    pub field_name: String,
    pub day: Weekday,
    pub start_time: NaiveTime,
    /// Specific dates this slot is unavailable (holidays, field maintenance).
    #[serde(default)]
    pub exclude_dates: BTreeSet<NaiveDate>,
}

impl FieldSlot {
    pub fn new(field_name: impl Into<String>, day: Weekday, start_time: NaiveTime) -> Self {
        Self {
            field_name: field_name.into(),
            day,
            start_time,
            exclude_dates: BTreeSet::new(),
        }
    }

    pub fn excluding(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.exclude_dates.extend(dates);
        self
    }
}

/// An administrative group of teams sharing home fields and blackout dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub code: String,
    pub full_name: String,
    pub teams: Vec<String>,
    #[serde(default)]
    pub weekday_fields: Vec<FieldSlot>,
    #[serde(default)]
    pub weekend_fields: Vec<FieldSlot>,
    #[serde(default)]
    pub blackouts: Vec<DateRange>,
}

impl League {
    pub fn new(code: impl Into<String>, teams: &[&str]) -> Self {
        let code = code.into();
        Self {
            full_name: code.clone(),
            code,
            teams: teams.iter().map(|t| t.to_string()).collect(),
            weekday_fields: Vec::new(),
            weekend_fields: Vec::new(),
            blackouts: Vec::new(),
        }
    }

    pub fn with_weekday_field(mut self, field: FieldSlot) -> Self {
        self.weekday_fields.push(field);
        self
    }

    pub fn with_weekend_field(mut self, field: FieldSlot) -> Self {
        self.weekend_fields.push(field);
        self
    }

    pub fn with_blackout(mut self, range: DateRange) -> Self {
        self.blackouts.push(range);
        self
    }

    /// A league without any field slot can never host.
    pub fn has_fields(&self) -> bool {
        !self.weekday_fields.is_empty() || !self.weekend_fields.is_empty()
    }

    pub fn fields(&self, slot_type: SlotType) -> &[FieldSlot] {
        match slot_type {
            SlotType::Weekday => &self.weekday_fields,
            SlotType::Weekend => &self.weekend_fields,
        }
    }

    /// Field slots of one type with duplicate (field, day, time) entries removed,
    /// keeping first-seen order.
    pub fn distinct_fields(&self, slot_type: SlotType) -> Vec<&FieldSlot> {
        let mut seen = BTreeSet::new();
        self.fields(slot_type)
            .iter()
            .filter(|f| seen.insert((f.field_name.as_str(), f.day.num_days_from_monday(), f.start_time)))
            .collect()
    }

    /// Max home games this league can host per slot of the given type.
    /// Zero means no cap is enforced.
    pub fn home_cap(&self, slot_type: SlotType) -> usize {
        self.distinct_fields(slot_type).len()
    }

    pub fn is_blacked_out(&self, date: NaiveDate) -> bool {
        self.blackouts.iter().any(|r| r.contains(date))
    }

    /// Every field name this league owns, weekday and weekend.
    pub fn field_names(&self) -> BTreeSet<&str> {
        self.weekday_fields
            .iter()
            .chain(&self.weekend_fields)
            .map(|f| f.field_name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub code: String,
    pub league_code: String,
    pub pool: Pool,
    #[serde(default)]
    pub weekday_only: bool,
    /// Weekend dates a weekday-only team can still play.
    #[serde(default)]
    pub available_weekends: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub no_play_days: Vec<Weekday>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Team {
    pub fn new(code: impl Into<String>, league_code: impl Into<String>, pool: Pool) -> Self {
        Self {
            code: code.into(),
            league_code: league_code.into(),
            pool,
            weekday_only: false,
            available_weekends: BTreeSet::new(),
            no_play_days: Vec::new(),
            display_name: None,
        }
    }

    pub fn weekday_only(mut self, available_weekends: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.weekday_only = true;
        self.available_weekends.extend(available_weekends);
        self
    }

    pub fn with_no_play_days(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.no_play_days.extend(days);
        self
    }

    pub fn excludes_day(&self, day: Weekday) -> bool {
        self.no_play_days.contains(&day)
    }

    /// False for a weekday-only team on a weekend date it has not opened up.
    pub fn can_play_on(&self, date: NaiveDate) -> bool {
        !self.weekday_only
            || SlotType::of(date) == SlotType::Weekday
            || self.available_weekends.contains(&date)
    }
}

/// Normalized (sorted) team pair used as a key in matchup-count tables.
pub type PairKey = (String, String);

pub fn pair_key(a: &str, b: &str) -> PairKey {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// An unordered pairing of two teams. `team_a` is the tentative home side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchup {
    pub team_a: String,
    pub team_b: String,
}

impl Matchup {
    pub fn new(team_a: impl Into<String>, team_b: impl Into<String>) -> Self {
        Self {
            team_a: team_a.into(),
            team_b: team_b.into(),
        }
    }

    pub fn involves(&self, team: &str) -> bool {
        self.team_a == team || self.team_b == team
    }

    pub fn opponent(&self, team: &str) -> &str {
        if self.team_a == team {
            &self.team_b
        } else {
            &self.team_a
        }
    }

    pub fn key(&self) -> PairKey {
        pair_key(&self.team_a, &self.team_b)
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.team_a, &mut self.team_b);
    }
}

/// A set of matchups where each team plays at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub matchups: Vec<Matchup>,
    pub round_type: GameType,
    pub bye_teams: Vec<String>,
}

/// A matchup bound to a calendar slot, waiting for field assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMatchup {
    pub matchup: Matchup,
    /// Source round number; 0 for invented pairings.
    pub round_number: u32,
    pub source: Provenance,
}

/// One weekday block or weekend block within one week.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarSlot {
    pub week_number: u32,
    pub slot_type: SlotType,
    pub dates: Vec<NaiveDate>,
    /// Teams structurally able to play somewhere in this slot.
    pub available_teams: BTreeSet<String>,
    pub pending: Vec<PendingMatchup>,
    pub games: Vec<Fixture>,
}

impl CalendarSlot {
    pub fn new(
        week_number: u32,
        slot_type: SlotType,
        dates: Vec<NaiveDate>,
        available_teams: BTreeSet<String>,
    ) -> Self {
        Self {
            week_number,
            slot_type,
            dates,
            available_teams,
            pending: Vec::new(),
            games: Vec::new(),
        }
    }

    pub fn is_available(&self, team: &str) -> bool {
        self.available_teams.contains(team)
    }

    pub fn label(&self) -> String {
        format!("W{}-{}", self.week_number, self.slot_type)
    }
}

/// A fully placed fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub home_team: String,
    pub away_team: String,
    /// Whose field is used; usually the home team.
    pub host_team: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub field_name: String,
    pub round_number: u32,
    pub game_type: GameType,
    pub week_number: u32,
    pub slot_type: SlotType,
    pub source: Provenance,
}

impl Game {
    /// The same fixture moved to another field/date/time.
    pub fn relocated(
        &self,
        host_team: &str,
        date: NaiveDate,
        start_time: NaiveTime,
        field_name: &str,
        game_length_minutes: u32,
    ) -> Game {
        Game {
            host_team: host_team.to_string(),
            date,
            start_time,
            end_time: end_time(start_time, game_length_minutes),
            field_name: field_name.to_string(),
            ..self.clone()
        }
    }

    /// The same fixture with home and away swapped, hosted as given.
    pub fn flipped(
        &self,
        host_team: &str,
        date: NaiveDate,
        start_time: NaiveTime,
        field_name: &str,
        game_length_minutes: u32,
    ) -> Game {
        Game {
            home_team: self.away_team.clone(),
            away_team: self.home_team.clone(),
            ..self.relocated(host_team, date, start_time, field_name, game_length_minutes)
        }
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }
}

/// End time of a game, clamped to 23:59 when it would run past midnight.
pub fn end_time(start: NaiveTime, game_length_minutes: u32) -> NaiveTime {
    let end_min = start.hour() * 60 + start.minute() + game_length_minutes;
    if end_min / 60 >= 24 {
        NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(start)
    } else {
        NaiveTime::from_hms_opt(end_min / 60, end_min % 60, 0).unwrap_or(start)
    }
}

/// A matchup the scheduler could not put on any field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unplaced {
    pub home_team: String,
    pub away_team: String,
    pub round_number: u32,
    pub game_type: GameType,
    pub week_number: u32,
    pub slot_type: SlotType,
    pub source: Provenance,
    pub reason: String,
}

/// Terminal state of one matchup after the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Fixture {
    Placed(Game),
    Unplaced(Unplaced),
}

impl Fixture {
    pub fn home_team(&self) -> &str {
        match self {
            Fixture::Placed(g) => &g.home_team,
            Fixture::Unplaced(u) => &u.home_team,
        }
    }

    pub fn away_team(&self) -> &str {
        match self {
            Fixture::Placed(g) => &g.away_team,
            Fixture::Unplaced(u) => &u.away_team,
        }
    }

    pub fn week_number(&self) -> u32 {
        match self {
            Fixture::Placed(g) => g.week_number,
            Fixture::Unplaced(u) => u.week_number,
        }
    }

    pub fn slot_type(&self) -> SlotType {
        match self {
            Fixture::Placed(g) => g.slot_type,
            Fixture::Unplaced(u) => u.slot_type,
        }
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team() == team || self.away_team() == team
    }

    pub fn is_unplaced(&self) -> bool {
        matches!(self, Fixture::Unplaced(_))
    }

    pub fn as_game(&self) -> Option<&Game> {
        match self {
            Fixture::Placed(g) => Some(g),
            Fixture::Unplaced(_) => None,
        }
    }

    /// Sort key: unplaced fixtures first, then by date and start time.
    pub(crate) fn sort_key(&self) -> Option<(NaiveDate, NaiveTime)> {
        self.as_game().map(|g| (g.date, g.start_time))
    }
}

/// Read-only lookup over a configuration's teams and leagues.
///
/// Built only from a validated [`crate::config::Config`], so every team's
/// league is guaranteed to exist.
#[derive(Debug, Clone, Copy)]
pub struct Roster<'a> {
    pub teams: &'a BTreeMap<String, Team>,
    pub leagues: &'a BTreeMap<String, League>,
}

impl<'a> Roster<'a> {
    pub fn new(teams: &'a BTreeMap<String, Team>, leagues: &'a BTreeMap<String, League>) -> Self {
        Self { teams, leagues }
    }

    pub fn team(&self, code: &str) -> &'a Team {
        &self.teams[code]
    }

    pub fn league_of(&self, code: &str) -> &'a League {
        &self.leagues[&self.teams[code].league_code]
    }

    pub fn same_league(&self, a: &str, b: &str) -> bool {
        self.teams[a].league_code == self.teams[b].league_code
    }

    pub fn same_pool(&self, a: &str, b: &str) -> bool {
        self.teams[a].pool == self.teams[b].pool
    }

    pub fn game_type(&self, a: &str, b: &str) -> GameType {
        if self.same_pool(a, b) {
            GameType::Intra
        } else {
            GameType::Crossover
        }
    }

    /// Teams whose league owns no field at all.
    pub fn never_host_teams(&self) -> BTreeSet<String> {
        self.teams
            .keys()
            .filter(|code| !self.league_of(code).has_fields())
            .cloned()
            .collect()
    }
}
