//! Calendar construction: the season window split into weekday and weekend
//! slots, each carrying the set of teams able to play in it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};

use crate::model::{CalendarSlot, League, Roster, SlotType, Team};

/// Partition `[start, end]` into weekly weekday (Mon–Fri) and weekend
/// (Sat–Sun) slots.
///
/// Weeks are anchored at the Monday on or before `start`; dates outside the
/// range are clipped and empty slots are omitted. Week numbers start at 1
/// and advance once per seven-day window, so a week whose weekday block is
/// entirely outside the range still consumes a number.
pub fn build_calendar(
    start: NaiveDate,
    end: NaiveDate,
    teams: &BTreeMap<String, Team>,
    leagues: &BTreeMap<String, League>,
) -> Vec<CalendarSlot> {
    let mut slots = Vec::new();
    let mut monday = start - Duration::days(i64::from(start.weekday().num_days_from_monday()));
    let mut week_number = 1;

    while monday <= end {
        for (slot_type, offsets) in [(SlotType::Weekday, 0..5), (SlotType::Weekend, 5..7)] {
            let dates: Vec<NaiveDate> = offsets
                .map(|o| monday + Duration::days(o))
                .filter(|d| start <= *d && *d <= end)
                .collect();
            if dates.is_empty() {
                continue;
            }
            let available = available_teams(slot_type, &dates, teams, leagues);
            slots.push(CalendarSlot::new(week_number, slot_type, dates, available));
        }
        monday += Duration::days(7);
        week_number += 1;
    }

    slots
}

/// Teams structurally able to play in a slot with the given dates.
///
/// Owning a field is never required: a team without fields can still play
/// at an opponent's.
fn available_teams(
    slot_type: SlotType,
    dates: &[NaiveDate],
    teams: &BTreeMap<String, Team>,
    leagues: &BTreeMap<String, League>,
) -> BTreeSet<String> {
    teams
        .iter()
        .filter(|(_, team)| {
            if slot_type == SlotType::Weekend
                && team.weekday_only
                && !dates.iter().any(|d| team.available_weekends.contains(d))
            {
                return false;
            }
            match leagues.get(&team.league_code) {
                Some(league) => dates.iter().any(|d| !league.is_blacked_out(*d)),
                None => false,
            }
        })
        .map(|(code, _)| code.clone())
        .collect()
}

/// Whether `team`'s league owns a field slot usable on some date of `slot`.
///
/// The matching date must fall on the field's weekday, must not be one of
/// the team's no-play days, and must not be blacked out for the league.
pub fn can_host_in_slot(team: &str, slot: &CalendarSlot, roster: Roster<'_>) -> bool {
    let league = roster.league_of(team);
    let fields = league.fields(slot.slot_type);
    if fields.is_empty() {
        return false;
    }
    let t = roster.team(team);
    slot.dates.iter().any(|d| {
        let day = d.weekday();
        fields.iter().any(|f| f.day == day) && !t.excludes_day(day) && !league.is_blacked_out(*d)
    })
}
