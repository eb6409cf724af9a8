//! Joint home/away, host, field, date and time assignment.
//!
//! Each slot's pending matchups are turned into [`Fixture`]s. Candidates are
//! built from the host league's field slots, scored, and the cheapest one is
//! committed. When a matchup has no free field, another game in the slot may
//! be moved to make room; when even that fails the matchup becomes an
//! [`Unplaced`] fixture with a diagnosed reason. A final rescue pass retries
//! every unplaced matchup in the other slots.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, NaiveTime};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::model::{
    end_time, CalendarSlot, Fixture, Game, PendingMatchup, Provenance, Roster, SlotType, Unplaced,
};

/// A physical field booking: field name, date and start time.
pub type FieldKey = (String, NaiveDate, NaiveTime);

/// A usable `(date, start time, field)` for one host.
pub type FieldCandidate = (NaiveDate, NaiveTime, String);

const HOST_MISMATCH_PENALTY: f64 = 1000.0;
const HOME_CAP_PENALTY: f64 = 50.0;
pub(crate) const SAME_LEAGUE_PENALTY: u32 = 5;
pub(crate) const AVOID_GROUP_PENALTY: u32 = 10_000;

/// Outcome counts of the assignment phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentReport {
    pub placed: usize,
    pub rescued: usize,
    pub unplaced: usize,
}

/// Field bookings `host` could use against `other` in `slot`, ignoring
/// bookings already in `used`.
///
/// Field slots are deduplicated per `(field, day, time)` and visited in
/// league order, each against the slot's dates in calendar order.
pub fn field_candidates(
    host: &str,
    other: &str,
    slot: &CalendarSlot,
    roster: Roster<'_>,
    used: &BTreeSet<FieldKey>,
) -> Vec<FieldCandidate> {
    usable_keys(host, other, slot, roster)
        .into_iter()
        .filter(|k| !used.contains(k))
        .map(|(field, date, time)| (date, time, field))
        .collect()
}

/// Every booking that would suit `host` against `other`, occupied or not.
fn usable_keys(host: &str, other: &str, slot: &CalendarSlot, roster: Roster<'_>) -> Vec<FieldKey> {
    let host_league = roster.league_of(host);
    let other_league = roster.league_of(other);
    let host_team = roster.team(host);
    let other_team = roster.team(other);

    let mut keys = Vec::new();
    for fs in host_league.distinct_fields(slot.slot_type) {
        for &d in &slot.dates {
            let day = d.weekday();
            if day != fs.day
                || fs.exclude_dates.contains(&d)
                || host_team.excludes_day(day)
                || other_team.excludes_day(day)
                || !host_team.can_play_on(d)
                || !other_team.can_play_on(d)
                || host_league.is_blacked_out(d)
                || other_league.is_blacked_out(d)
            {
                continue;
            }
            keys.push((fs.field_name.clone(), d, fs.start_time));
        }
    }
    keys
}

pub(crate) fn field_key(game: &Game) -> FieldKey {
    (game.field_name.clone(), game.date, game.start_time)
}

/// Avoid-same-time groups indexed by member.
pub(crate) struct AvoidGroups<'a> {
    by_team: BTreeMap<&'a str, Vec<&'a BTreeSet<String>>>,
}

impl<'a> AvoidGroups<'a> {
    pub(crate) fn new(groups: &'a [BTreeSet<String>]) -> Self {
        let mut by_team: BTreeMap<&str, Vec<&BTreeSet<String>>> = BTreeMap::new();
        for group in groups {
            for t in group {
                by_team.entry(t.as_str()).or_default().push(group);
            }
        }
        Self { by_team }
    }

    /// Group members of `team` already booked on `date` at a field other
    /// than `field`, counted once per group membership.
    fn violations(&self, team: &str, date: NaiveDate, field: &str, occ: &Occupancy) -> u32 {
        let mut n = 0;
        for group in self.by_team.get(team).into_iter().flatten() {
            for other in group.iter().filter(|o| o.as_str() != team) {
                if let Some(fields) = occ.day_fields.get(&(other.clone(), date)) {
                    if !fields.is_empty() && !fields.contains(field) {
                        n += 1;
                    }
                }
            }
        }
        n
    }
}

/// Bookings inside one slot: fields in use, who plays at each date/time,
/// and which fields each team uses per date.
#[derive(Debug, Default)]
pub(crate) struct Occupancy {
    pub(crate) used: BTreeSet<FieldKey>,
    time_teams: BTreeMap<(NaiveDate, NaiveTime), BTreeSet<String>>,
    day_fields: BTreeMap<(String, NaiveDate), BTreeSet<String>>,
}

impl Occupancy {
    /// Occupancy of every placed game in `games` except index `skip`.
    pub(crate) fn from_games(games: &[Fixture], skip: Option<usize>) -> Self {
        let mut occ = Occupancy::default();
        for (i, f) in games.iter().enumerate() {
            if Some(i) == skip {
                continue;
            }
            if let Some(g) = f.as_game() {
                occ.book(g);
            }
        }
        occ
    }

    pub(crate) fn book(&mut self, g: &Game) {
        self.used.insert(field_key(g));
        let at = self.time_teams.entry((g.date, g.start_time)).or_default();
        at.insert(g.home_team.clone());
        at.insert(g.away_team.clone());
        for t in [&g.home_team, &g.away_team] {
            self.day_fields
                .entry((t.clone(), g.date))
                .or_default()
                .insert(g.field_name.clone());
        }
    }

    /// Undo [`Occupancy::book`] for a game that is about to move.
    pub(crate) fn release(&mut self, g: &Game) {
        self.used.remove(&field_key(g));
        let at_key = (g.date, g.start_time);
        if let Some(at) = self.time_teams.get_mut(&at_key) {
            at.remove(&g.home_team);
            at.remove(&g.away_team);
            if at.is_empty() {
                self.time_teams.remove(&at_key);
            }
        }
        for t in [&g.home_team, &g.away_team] {
            let day_key = (t.clone(), g.date);
            if let Some(fields) = self.day_fields.get_mut(&day_key) {
                fields.remove(&g.field_name);
                if fields.is_empty() {
                    self.day_fields.remove(&day_key);
                }
            }
        }
    }

    /// Soft conflict cost of `home` vs `away` at the given booking:
    /// same-league teams already playing at that date/time, plus
    /// avoid-group members booked elsewhere that day.
    pub(crate) fn conflict_cost(
        &self,
        home: &str,
        away: &str,
        (date, time, field): (NaiveDate, NaiveTime, &str),
        roster: Roster<'_>,
        groups: &AvoidGroups<'_>,
    ) -> u32 {
        let mut cost = 0;
        if let Some(at) = self.time_teams.get(&(date, time)) {
            for et in at {
                if roster.same_league(home, et) {
                    cost += SAME_LEAGUE_PENALTY;
                }
                if roster.same_league(away, et) {
                    cost += SAME_LEAGUE_PENALTY;
                }
            }
        }
        for t in [home, away] {
            cost += AVOID_GROUP_PENALTY * groups.violations(t, date, field, self);
        }
        cost
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    home: String,
    away: String,
    host: String,
    date: NaiveDate,
    time: NaiveTime,
    field: String,
}

impl Candidate {
    fn new(home: &str, away: &str, host: &str, (date, time, field): FieldCandidate) -> Self {
        Self {
            home: home.to_string(),
            away: away.to_string(),
            host: host.to_string(),
            date,
            time,
            field,
        }
    }
}

/// Assign every pending matchup in `slots` to a concrete game.
///
/// Slots are processed weekday first, then weekend, each in calendar order.
/// One jitter value is drawn from `rng` per scored candidate.
pub fn assign_games<R: Rng + ?Sized>(
    slots: &mut [CalendarSlot],
    roster: Roster<'_>,
    game_length_minutes: u32,
    avoid_groups: &[BTreeSet<String>],
    rng: &mut R,
) -> AssignmentReport {
    let order = processing_order(slots);
    let mut engine = Assigner {
        roster,
        game_length_minutes,
        groups: AvoidGroups::new(avoid_groups),
        home_counts: BTreeMap::new(),
        away_counts: BTreeMap::new(),
    };

    for &si in &order {
        let games = engine.assign_slot(&slots[si], rng);
        slots[si].games = games;
    }

    let report = engine.rescue(slots, &order);
    info!(
        "Assigned {} games ({} rescued, {} unplaced)",
        report.placed, report.rescued, report.unplaced
    );
    report
}

/// Weekday slot indices followed by weekend slot indices.
pub(crate) fn processing_order(slots: &[CalendarSlot]) -> Vec<usize> {
    let weekday = (0..slots.len()).filter(|&i| slots[i].slot_type == SlotType::Weekday);
    let weekend = (0..slots.len()).filter(|&i| slots[i].slot_type == SlotType::Weekend);
    weekday.chain(weekend).collect()
}

struct Assigner<'r> {
    roster: Roster<'r>,
    game_length_minutes: u32,
    groups: AvoidGroups<'r>,
    home_counts: BTreeMap<String, i64>,
    away_counts: BTreeMap<String, i64>,
}

impl<'r> Assigner<'r> {
    fn home(&self, t: &str) -> i64 {
        self.home_counts.get(t).copied().unwrap_or(0)
    }

    fn away(&self, t: &str) -> i64 {
        self.away_counts.get(t).copied().unwrap_or(0)
    }

    fn flexibility(&self, p: &PendingMatchup, slot: &CalendarSlot) -> usize {
        let (a, b) = (&p.matchup.team_a, &p.matchup.team_b);
        let none = BTreeSet::new();
        field_candidates(a, b, slot, self.roster, &none).len()
            + field_candidates(b, a, slot, self.roster, &none).len()
    }

    /// Both orientations with the proposed home hosting; the visitor hosts
    /// only when the proposed home has nothing.
    fn candidates(&self, ta: &str, tb: &str, slot: &CalendarSlot, used: &BTreeSet<FieldKey>) -> Vec<Candidate> {
        let mut out = Vec::new();
        for (home, away) in [(ta, tb), (tb, ta)] {
            let own = field_candidates(home, away, slot, self.roster, used);
            if own.is_empty() {
                out.extend(
                    field_candidates(away, home, slot, self.roster, used)
                        .into_iter()
                        .map(|c| Candidate::new(home, away, away, c)),
                );
            } else {
                out.extend(own.into_iter().map(|c| Candidate::new(home, away, home, c)));
            }
        }
        out
    }

    fn assign_slot<R: Rng + ?Sized>(&mut self, slot: &CalendarSlot, rng: &mut R) -> Vec<Fixture> {
        let mut pending: Vec<&PendingMatchup> = slot.pending.iter().collect();
        pending.sort_by_key(|p| self.flexibility(p, slot));

        let mut games: Vec<Fixture> = Vec::with_capacity(pending.len());
        let mut occ = Occupancy::default();
        let mut league_homes: BTreeMap<&str, usize> = BTreeMap::new();

        for p in pending {
            let (ta, tb) = (p.matchup.team_a.as_str(), p.matchup.team_b.as_str());
            let mut candidates = self.candidates(ta, tb, slot, &occ.used);
            if candidates.is_empty() {
                candidates = self.try_rearrange(ta, tb, slot, &mut games, &mut occ);
            }
            if candidates.is_empty() {
                games.push(Fixture::Unplaced(self.unplaced(p, slot)));
                continue;
            }

            let mut best: Option<(f64, Candidate)> = None;
            for c in candidates {
                let score = self.score(&c, slot, &occ, &league_homes) + rng.gen::<f64>() * 0.1;
                if best.as_ref().is_none_or(|(s, _)| score.total_cmp(s).is_lt()) {
                    best = Some((score, c));
                }
            }
            let Some((_, c)) = best else { continue };

            *self.home_counts.entry(c.home.clone()).or_insert(0) += 1;
            *self.away_counts.entry(c.away.clone()).or_insert(0) += 1;
            *league_homes
                .entry(self.roster.team(&c.home).league_code.as_str())
                .or_insert(0) += 1;
            let game = self.game(&c, p.round_number, p.source, slot);
            occ.book(&game);
            games.push(Fixture::Placed(game));
        }
        games
    }

    fn score(
        &self,
        c: &Candidate,
        slot: &CalendarSlot,
        occ: &Occupancy,
        league_homes: &BTreeMap<&str, usize>,
    ) -> f64 {
        let home_diff = self.home(&c.home) + 1 - self.away(&c.home);
        let away_diff = self.home(&c.away) - (self.away(&c.away) + 1);
        let mut score = 10.0 * (home_diff.abs() + away_diff.abs()) as f64;

        if c.host != c.home {
            score += HOST_MISMATCH_PENALTY;
        }

        let league = self.roster.league_of(&c.home);
        let cap = league.home_cap(slot.slot_type);
        let hosted = league_homes.get(league.code.as_str()).copied().unwrap_or(0);
        if cap > 0 && hosted >= cap {
            score += HOME_CAP_PENALTY;
        }

        score += f64::from(occ.conflict_cost(
            &c.home,
            &c.away,
            (c.date, c.time, &c.field),
            self.roster,
            &self.groups,
        ));
        score
    }

    fn game(&self, c: &Candidate, round_number: u32, source: Provenance, slot: &CalendarSlot) -> Game {
        Game {
            home_team: c.home.clone(),
            away_team: c.away.clone(),
            host_team: c.host.clone(),
            date: c.date,
            start_time: c.time,
            end_time: end_time(c.time, self.game_length_minutes),
            field_name: c.field.clone(),
            round_number,
            game_type: self.roster.game_type(&c.home, &c.away),
            week_number: slot.week_number,
            slot_type: slot.slot_type,
            source,
        }
    }

    /// Free an occupied booking that would suit `ta`/`tb` by moving its
    /// game to another field owned by one of that game's teams.
    ///
    /// The blocker first tries its host's league, then the other team's
    /// league, in which case that team becomes the host. On success the
    /// freed booking is the single candidate.
    fn try_rearrange(
        &self,
        ta: &str,
        tb: &str,
        slot: &CalendarSlot,
        games: &mut [Fixture],
        occ: &mut Occupancy,
    ) -> Vec<Candidate> {
        let mut needed = Vec::new();
        for (home, away) in [(ta, tb), (tb, ta)] {
            for key in usable_keys(home, away, slot, self.roster) {
                if occ.used.contains(&key) {
                    needed.push((key, home, away));
                }
            }
        }

        for (key, home, away) in needed {
            let Some(bi) = games
                .iter()
                .position(|f| f.as_game().is_some_and(|g| field_key(g) == key))
            else {
                continue;
            };
            let Some(blocker) = games[bi].as_game().cloned() else {
                continue;
            };
            let other = if blocker.host_team == blocker.home_team {
                blocker.away_team.clone()
            } else {
                blocker.home_team.clone()
            };

            let mut host = blocker.host_team.clone();
            let mut alternates = field_candidates(&host, &other, slot, self.roster, &occ.used);
            if alternates.is_empty() {
                alternates =
                    field_candidates(&other, &blocker.host_team, slot, self.roster, &occ.used);
                host = other;
            }
            let Some((alt_date, alt_time, alt_field)) = alternates.into_iter().next() else {
                continue;
            };

            let moved = blocker.relocated(
                &host,
                alt_date,
                alt_time,
                &alt_field,
                self.game_length_minutes,
            );
            occ.release(&blocker);
            occ.book(&moved);
            games[bi] = Fixture::Placed(moved);

            let (field, date, time) = key;
            return vec![Candidate::new(home, away, home, (date, time, field))];
        }
        Vec::new()
    }

    fn unplaced(&self, p: &PendingMatchup, slot: &CalendarSlot) -> Unplaced {
        let (ta, tb) = (&p.matchup.team_a, &p.matchup.team_b);
        let reason = [ta, tb]
            .iter()
            .map(|t| self.diagnose(t, slot))
            .collect::<Vec<_>>()
            .join("; ");
        warn!(
            "UNSCHEDULED: {} vs {} (week {} {}): {}",
            ta, tb, slot.week_number, slot.slot_type, reason
        );
        Unplaced {
            home_team: ta.clone(),
            away_team: tb.clone(),
            round_number: p.round_number,
            game_type: self.roster.game_type(ta, tb),
            week_number: slot.week_number,
            slot_type: slot.slot_type,
            source: p.source,
            reason,
        }
    }

    fn diagnose(&self, team: &str, slot: &CalendarSlot) -> String {
        let league = self.roster.league_of(team);
        let fields = league.fields(slot.slot_type);
        if fields.is_empty() {
            return format!("{}: no {} fields", team, slot.slot_type);
        }
        let blacked_out: Vec<String> = slot
            .dates
            .iter()
            .filter(|d| fields.iter().any(|f| f.day == d.weekday()) && league.is_blacked_out(**d))
            .map(|d| d.to_string())
            .collect();
        if blacked_out.is_empty() {
            format!("{}: all fields occupied", team)
        } else {
            format!("{}: blacked out on {}", team, blacked_out.join(", "))
        }
    }

    /// Retry every unplaced fixture in the other slots, same slot type
    /// first. The first workable booking wins.
    fn rescue(&mut self, slots: &mut [CalendarSlot], order: &[usize]) -> AssignmentReport {
        let mut unplaced: Vec<(usize, Unplaced)> = Vec::new();
        for &si in order {
            let games = std::mem::take(&mut slots[si].games);
            for f in games {
                match f {
                    Fixture::Unplaced(u) => unplaced.push((si, u)),
                    placed => slots[si].games.push(placed),
                }
            }
        }

        let mut report = AssignmentReport::default();
        if !unplaced.is_empty() {
            let mut occ: Vec<Occupancy> = slots
                .iter()
                .map(|s| Occupancy::from_games(&s.games, None))
                .collect();
            let mut playing: Vec<BTreeSet<String>> = slots
                .iter()
                .map(|s| {
                    s.games
                        .iter()
                        .flat_map(|f| [f.home_team().to_string(), f.away_team().to_string()])
                        .collect()
                })
                .collect();

            for (orig, u) in unplaced {
                let orig_type = slots[orig].slot_type;
                let mut placed = false;
                'search: for same_type in [true, false] {
                    for &si in order {
                        if si == orig || (slots[si].slot_type == orig_type) != same_type {
                            continue;
                        }
                        let (ta, tb) = (u.home_team.as_str(), u.away_team.as_str());
                        let slot = &slots[si];
                        if !(slot.is_available(ta) && slot.is_available(tb))
                            || playing[si].contains(ta)
                            || playing[si].contains(tb)
                        {
                            continue;
                        }

                        let mut candidates = self.rescue_candidates(ta, tb, slot, &occ[si].used);
                        if candidates.is_empty() {
                            let slot = &mut slots[si];
                            let mut games = std::mem::take(&mut slot.games);
                            candidates = self.try_rearrange(ta, tb, slot, &mut games, &mut occ[si]);
                            slot.games = games;
                        }
                        let Some(c) = candidates.into_iter().next() else {
                            continue;
                        };

                        let game = self.game(&c, u.round_number, u.source, &slots[si]);
                        occ[si].book(&game);
                        playing[si].insert(ta.to_string());
                        playing[si].insert(tb.to_string());
                        *self.home_counts.entry(c.home.clone()).or_insert(0) += 1;
                        *self.away_counts.entry(c.away.clone()).or_insert(0) += 1;
                        slots[si].games.push(Fixture::Placed(game));
                        report.rescued += 1;
                        placed = true;
                        break 'search;
                    }
                }
                if !placed {
                    slots[orig].games.push(Fixture::Unplaced(u));
                    report.unplaced += 1;
                }
            }

            if report.rescued > 0 {
                info!("Rescued {} unplaced games by moving them to other slots", report.rescued);
            }
            if report.unplaced > 0 {
                warn!("{} games remain unplaced", report.unplaced);
            }
        }

        report.placed = slots
            .iter()
            .flat_map(|s| &s.games)
            .filter(|f| !f.is_unplaced())
            .count();
        report
    }

    /// Home-hosted candidates for both orientations. A visitor-hosted
    /// booking would only repeat one of these with the labels swapped.
    fn rescue_candidates(
        &self,
        ta: &str,
        tb: &str,
        slot: &CalendarSlot,
        used: &BTreeSet<FieldKey>,
    ) -> Vec<Candidate> {
        [(ta, tb), (tb, ta)]
            .into_iter()
            .flat_map(|(home, away)| {
                field_candidates(home, away, slot, self.roster, used)
                    .into_iter()
                    .map(move |c| Candidate::new(home, away, home, c))
            })
            .collect()
    }
}
