//! YAML configuration loading and structural validation.
//!
//! The raw YAML shape is deserialized into private `Raw*` structs, then every
//! date, time and day string is parsed into typed values. Anything malformed
//! is rejected here so the scheduler never sees a half-valid configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::model::{DateRange, FieldSlot, League, Pool, Roster, Team};

const DEFAULT_GAME_LENGTH: u32 = 150;
const DEFAULT_WEEKDAY_TIME: &str = "5:30pm";
const DEFAULT_WEEKEND_TIME: &str = "10am";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub game_length_minutes: u32,
    /// Prefix for exported game codes (G001, G002, ...).
    pub game_code_prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pools {
    pub north: Vec<String>,
    pub south: Vec<String>,
}

impl Pools {
    pub fn get(&self, pool: Pool) -> &[String] {
        match pool {
            Pool::North => &self.north,
            Pool::South => &self.south,
        }
    }
}

/// Everything the scheduling core consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub season: Season,
    pub teams: BTreeMap<String, Team>,
    pub leagues: BTreeMap<String, League>,
    pub pools: Pools,
    /// Groups of teams (typically sharing coaches) that should not play on the
    /// same day at different fields.
    pub avoid_same_time_groups: Vec<BTreeSet<String>>,
}

impl Config {
    /// Load and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parse and validate a YAML config document.
    pub fn from_yaml_str(yaml: &str) -> Result<Config> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;
        let config = raw.into_config()?;
        config.validate()?;
        Ok(config)
    }

    pub fn roster(&self) -> Roster<'_> {
        Roster::new(&self.teams, &self.leagues)
    }

    /// Structural checks. Collects every problem before failing.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.season.end_date < self.season.start_date {
            errors.push(format!(
                "Season end {} is before start {}",
                self.season.end_date, self.season.start_date
            ));
        }
        if self.season.game_length_minutes == 0 {
            errors.push("Game length must be positive".to_string());
        }

        let north: BTreeSet<&str> = self.pools.north.iter().map(String::as_str).collect();
        let south: BTreeSet<&str> = self.pools.south.iter().map(String::as_str).collect();
        for code in north.intersection(&south) {
            errors.push(format!("Team {} is in both pools", code));
        }

        let league_members: BTreeSet<&str> = self
            .leagues
            .values()
            .flat_map(|l| l.teams.iter().map(String::as_str))
            .collect();

        for code in north.union(&south) {
            if !self.teams.contains_key(*code) {
                errors.push(format!("Team {} in pools but not constructed", code));
            }
            if !league_members.contains(code) {
                errors.push(format!("Team {} in pools but not in any league", code));
            }
        }

        for (code, team) in &self.teams {
            if !north.contains(code.as_str()) && !south.contains(code.as_str()) {
                errors.push(format!("Team {} is not in any pool", code));
            }
            if !self.leagues.contains_key(&team.league_code) {
                errors.push(format!(
                    "Team {} references unknown league {}",
                    code, team.league_code
                ));
            }
        }

        for league in self.leagues.values() {
            for t in &league.teams {
                if !north.contains(t.as_str()) && !south.contains(t.as_str()) {
                    warn!(team = %t, league = %league.code, "team in league not found in any pool");
                }
            }
        }

        for group in &self.avoid_same_time_groups {
            for t in group {
                if !north.contains(t.as_str()) && !south.contains(t.as_str()) {
                    errors.push(format!(
                        "Team {} in avoid_same_time_groups but not in any pool",
                        t
                    ));
                }
            }
        }

        errors.dedup();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

// ── Raw YAML shape ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawConfig {
    season: RawSeason,
    pools: RawPools,
    leagues: BTreeMap<String, RawLeague>,
    #[serde(default)]
    team_overrides: BTreeMap<String, RawOverride>,
    #[serde(default)]
    avoid_same_time_groups: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct RawSeason {
    start_date: YamlScalar,
    end_date: YamlScalar,
    #[serde(default)]
    game_length_minutes: Option<u32>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    game_code_prefix: Option<String>,
}

#[derive(Deserialize)]
struct RawPools {
    north: Vec<String>,
    south: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTeams {
    Count(u32),
    Codes(Vec<String>),
}

impl Default for RawTeams {
    fn default() -> Self {
        RawTeams::Codes(Vec::new())
    }
}

#[derive(Deserialize)]
struct RawLeague {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    teams: RawTeams,
    #[serde(default)]
    weekday_fields: Vec<RawField>,
    #[serde(default)]
    weekend_fields: Vec<RawField>,
    #[serde(default)]
    blackout_dates: Vec<YamlScalar>,
}

#[derive(Deserialize)]
struct RawField {
    field: String,
    day: String,
    #[serde(default)]
    time: Option<YamlScalar>,
    #[serde(default)]
    exclude_dates: Vec<YamlScalar>,
}

#[derive(Deserialize, Default)]
struct RawOverride {
    #[serde(default)]
    weekday_only: bool,
    #[serde(default)]
    available_weekends: Vec<YamlScalar>,
    #[serde(default)]
    no_play_days: Vec<String>,
    #[serde(default)]
    gamechanger_name: Option<String>,
}

/// Dates and times may come through YAML as strings or bare numbers
/// (`time: 17` is an integer to YAML).
#[derive(Deserialize)]
#[serde(untagged)]
enum YamlScalar {
    Text(String),
    Int(i64),
}

impl YamlScalar {
    fn text(&self) -> String {
        match self {
            YamlScalar::Text(s) => s.clone(),
            YamlScalar::Int(n) => n.to_string(),
        }
    }
}

impl RawConfig {
    fn into_config(self) -> Result<Config> {
        let season = Season {
            name: self.season.name.unwrap_or_default(),
            start_date: parse_date(&self.season.start_date.text())?,
            end_date: parse_date(&self.season.end_date.text())?,
            game_length_minutes: self.season.game_length_minutes.unwrap_or(DEFAULT_GAME_LENGTH),
            game_code_prefix: self.season.game_code_prefix.unwrap_or_else(|| "G".to_string()),
        };

        let mut leagues = BTreeMap::new();
        let mut team_to_league: BTreeMap<String, String> = BTreeMap::new();

        for (code, raw) in self.leagues {
            let teams: Vec<String> = match raw.teams {
                RawTeams::Count(n) => (1..=n).map(|i| format!("{}{}", code, i)).collect(),
                RawTeams::Codes(codes) => codes,
            };
            for t in &teams {
                team_to_league.insert(t.clone(), code.clone());
            }

            let weekday_fields = raw
                .weekday_fields
                .iter()
                .map(|f| parse_field(f, DEFAULT_WEEKDAY_TIME))
                .collect::<Result<Vec<_>>>()?;
            let weekend_fields = raw
                .weekend_fields
                .iter()
                .map(|f| parse_field(f, DEFAULT_WEEKEND_TIME))
                .collect::<Result<Vec<_>>>()?;
            let blackouts = raw
                .blackout_dates
                .iter()
                .map(|b| parse_blackout(&b.text()))
                .collect::<Result<Vec<_>>>()?;

            leagues.insert(
                code.clone(),
                League {
                    full_name: raw.full_name.unwrap_or_else(|| code.clone()),
                    code,
                    teams,
                    weekday_fields,
                    weekend_fields,
                    blackouts,
                },
            );
        }

        let mut teams = BTreeMap::new();
        for (pool, codes) in [(Pool::North, &self.pools.north), (Pool::South, &self.pools.south)] {
            for code in codes {
                let ovr = self.team_overrides.get(code);
                let league_code = team_to_league
                    .get(code)
                    .cloned()
                    .unwrap_or_else(|| "UNKNOWN".to_string());
                let mut team = Team::new(code.clone(), league_code, pool);
                if let Some(ovr) = ovr {
                    team.weekday_only = ovr.weekday_only;
                    team.available_weekends = ovr
                        .available_weekends
                        .iter()
                        .map(|d| parse_date(&d.text()))
                        .collect::<Result<_>>()?;
                    team.no_play_days = ovr
                        .no_play_days
                        .iter()
                        .map(String::as_str)
                        .map(parse_day)
                        .collect::<Result<_>>()?;
                    team.display_name = ovr.gamechanger_name.clone().filter(|n| !n.is_empty());
                }
                teams.insert(code.clone(), team);
            }
        }

        Ok(Config {
            season,
            teams,
            leagues,
            pools: Pools {
                north: self.pools.north,
                south: self.pools.south,
            },
            avoid_same_time_groups: self
                .avoid_same_time_groups
                .into_iter()
                .map(|g| g.into_iter().collect())
                .collect(),
        })
    }
}

fn parse_field(raw: &RawField, default_time: &str) -> Result<FieldSlot> {
    let time = match &raw.time {
        Some(t) => parse_time(&t.text())?,
        None => parse_time(default_time)?,
    };
    let exclude_dates = raw
        .exclude_dates
        .iter()
        .map(|d| parse_date(&d.text()))
        .collect::<Result<BTreeSet<_>>>()?;
    Ok(FieldSlot {
        field_name: raw.field.clone(),
        day: parse_day(&raw.day)?,
        start_time: time,
        exclude_dates,
    })
}

// ── Scalar parsers ──────────────────────────────────────────────────────────

/// Parse `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ConfigError::InvalidDate(s.to_string()))
}

/// Parse `YYYY-MM-DD:YYYY-MM-DD` or a single `YYYY-MM-DD` as a one-day range.
pub fn parse_blackout(s: &str) -> Result<DateRange> {
    match s.split_once(':') {
        Some((start, end)) => {
            let range = DateRange::new(parse_date(start)?, parse_date(end)?);
            if range.end < range.start {
                return Err(ConfigError::InvalidDateRange(s.to_string()));
            }
            Ok(range)
        }
        None => Ok(DateRange::day(parse_date(s)?)),
    }
}

/// Parse clock times like `5:30pm`, `10am`, `12pm` or `17:00`.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    let invalid = || ConfigError::InvalidTime(s.to_string());
    let lower = s.trim().to_ascii_lowercase();

    let (clock, meridiem) = if let Some(rest) = lower.strip_suffix("pm") {
        (rest.trim(), Some(true))
    } else if let Some(rest) = lower.strip_suffix("am") {
        (rest.trim(), Some(false))
    } else {
        (lower.as_str(), None)
    };

    let (h, m) = match clock.split_once(':') {
        Some((h, m)) => (
            h.parse::<u32>().map_err(|_| invalid())?,
            m.parse::<u32>().map_err(|_| invalid())?,
        ),
        None => (clock.parse::<u32>().map_err(|_| invalid())?, 0),
    };

    let hour = match meridiem {
        Some(_) if h == 0 || h > 12 => return Err(invalid()),
        Some(true) if h < 12 => h + 12,
        Some(false) if h == 12 => 0,
        _ => h,
    };

    NaiveTime::from_hms_opt(hour, m, 0).ok_or_else(invalid)
}

/// Parse a day of week from any case and any prefix of at least three letters.
pub fn parse_day(s: &str) -> Result<Weekday> {
    let lower = s.trim().to_ascii_lowercase();
    if lower.len() < 3 {
        return Err(ConfigError::InvalidDay(s.to_string()));
    }
    let day = match lower.get(..3).unwrap_or_default() {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return Err(ConfigError::InvalidDay(s.to_string())),
    };
    Ok(day)
}
