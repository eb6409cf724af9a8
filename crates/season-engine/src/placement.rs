//! Round placement: binds generated rounds to calendar slots.
//!
//! Every matchup moves through `round → deferred → safe_adhoc/overflow →
//! adhoc` and ends either pending in exactly one slot or dropped as a bye.
//! Weekday slots take one north and one south round-robin round; weekend
//! slots take crossover rounds. After the greedy matching, idle teams are
//! filled from the deferred and overflow pools, then from invented
//! pairings, and finally byes are evened out by swapping participants.
//!
//! No randomness is consumed here: every choice is ordered by counts and
//! team codes.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::model::{
    pair_key, CalendarSlot, Matchup, PairKey, PendingMatchup, Pool, Provenance, Roster, Round,
    SlotType,
};

/// Upper bound on slot-bye equalizer passes.
const MAX_EQUALIZE_PASSES: usize = 20;

/// Summary of the placement phase.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlacementReport {
    /// Byes handed out by the generated rounds, placed or not.
    pub round_bye_counts: BTreeMap<String, usize>,
    pub weekday_matchups_per_team: BTreeMap<String, usize>,
    pub weekend_matchups_per_team: BTreeMap<String, usize>,
}

type PoolEntry = (Matchup, u32);

/// Bind rounds to `slots` and fill every slot's pending matchups.
///
/// `slots` must be in calendar order. Weekday slots receive `north` and
/// `south` rounds, weekend slots receive `crossover` rounds.
pub fn assign_rounds_to_slots(
    slots: &mut [CalendarSlot],
    north: &[Round],
    south: &[Round],
    crossover: &[Round],
    roster: Roster<'_>,
) -> PlacementReport {
    let mut placer = Placer::new(slots, roster);

    // Round-to-slot matching, most constrained slots first.
    let mut deferred_weekday = Vec::new();
    let mut overflow_weekday = Vec::new();
    let mut unassigned_north: Vec<usize> = (0..north.len()).collect();
    let mut unassigned_south: Vec<usize> = (0..south.len()).collect();
    for si in placer.by_availability(SlotType::Weekday) {
        for (rounds, unassigned) in [(north, &mut unassigned_north), (south, &mut unassigned_south)] {
            if let Some((pos, _)) = placer.best_round(rounds, unassigned, si, false) {
                let ri = unassigned.remove(pos);
                placer.place_round(si, &rounds[ri], &mut deferred_weekday);
            }
        }
    }
    for (rounds, unassigned) in [(north, &unassigned_north), (south, &unassigned_south)] {
        for &ri in unassigned {
            placer.overflow(&rounds[ri], &mut overflow_weekday);
        }
    }

    let mut deferred_weekend = Vec::new();
    let mut overflow_weekend = Vec::new();
    let mut unassigned_cross: Vec<usize> = (0..crossover.len()).collect();
    for si in placer.by_availability(SlotType::Weekend) {
        if let Some((pos, score)) = placer.best_round(crossover, &unassigned_cross, si, true) {
            if score >= 1 {
                let ri = unassigned_cross.remove(pos);
                placer.place_round(si, &crossover[ri], &mut deferred_weekend);
            }
        }
    }
    for &ri in &unassigned_cross {
        placer.overflow(&crossover[ri], &mut overflow_weekend);
    }

    // Deferred repair.
    for (slot_type, deferred) in [
        (SlotType::Weekday, &mut deferred_weekday),
        (SlotType::Weekend, &mut deferred_weekend),
    ] {
        if deferred.is_empty() {
            continue;
        }
        let total = deferred.len();
        let ids = placer.ids(slot_type).to_vec();
        placer.fill_idle(&ids, deferred, Provenance::Deferred);
        if deferred.is_empty() {
            info!("All {} {} deferrals rescheduled", total, slot_type);
        } else {
            info!(
                "{} of {} {} deferrals could not be rescheduled",
                deferred.len(),
                total,
                slot_type
            );
        }
    }

    // Safe ad-hoc fill: leftover deferrals first, then overflow rounds.
    deferred_weekday.append(&mut overflow_weekday);
    deferred_weekend.append(&mut overflow_weekend);
    placer.safe_weekday = deferred_weekday;
    placer.safe_weekend = deferred_weekend;
    let wd_safe = placer.fill_safe(SlotType::Weekday);
    let we_safe = placer.fill_safe(SlotType::Weekend);
    if wd_safe + we_safe > 0 {
        info!("Safe ad-hoc (from deferred/overflow): {} weekday + {} weekend", wd_safe, we_safe);
    }

    let wd_invented = placer.invent_games(SlotType::Weekday);
    let we_invented = placer.invent_games(SlotType::Weekend);
    if wd_invented + we_invented > 0 {
        info!("Invented ad-hoc: {} weekday + {} weekend", wd_invented, we_invented);
    }

    let swaps = placer.fix_byes();
    if swaps > 0 {
        info!("Bye equalizer: {} swaps", swaps);
    }

    let wd_extra = placer.enforce_max_one_bye(SlotType::Weekday);
    let we_extra = placer.enforce_max_one_bye(SlotType::Weekend);
    if wd_extra + we_extra > 0 {
        info!(
            "Bye enforcement (max 1 per slot): {} weekday + {} weekend extra matchups",
            wd_extra, we_extra
        );
    }

    let eq_swaps = placer.equalize_slot_byes();
    if eq_swaps > 0 {
        let byes = placer.slot_byes();
        info!(
            "Slot-bye equalizer: {} swaps (byes {}-{})",
            eq_swaps,
            byes.values().min().copied().unwrap_or(0),
            byes.values().max().copied().unwrap_or(0)
        );
    }

    let we_swaps = placer.equalize_weekend_byes();
    if we_swaps > 0 {
        info!("Weekend bye equalizer: {} swaps", we_swaps);
    }

    placer.into_report()
}

struct Placer<'s, 'r> {
    slots: &'s mut [CalendarSlot],
    roster: Roster<'r>,
    weekday: Vec<usize>,
    weekend: Vec<usize>,
    /// Teams with a pending matchup, per slot.
    busy: Vec<BTreeSet<String>>,
    pair_counts: BTreeMap<PairKey, usize>,
    round_byes: BTreeMap<String, usize>,
    safe_weekday: Vec<PoolEntry>,
    safe_weekend: Vec<PoolEntry>,
}

impl<'s, 'r> Placer<'s, 'r> {
    fn new(slots: &'s mut [CalendarSlot], roster: Roster<'r>) -> Self {
        let mut weekday = Vec::new();
        let mut weekend = Vec::new();
        let mut busy = Vec::with_capacity(slots.len());
        for (i, slot) in slots.iter().enumerate() {
            match slot.slot_type {
                SlotType::Weekday => weekday.push(i),
                SlotType::Weekend => weekend.push(i),
            }
            busy.push(
                slot.pending
                    .iter()
                    .flat_map(|p| [p.matchup.team_a.clone(), p.matchup.team_b.clone()])
                    .collect(),
            );
        }
        Self {
            slots,
            roster,
            weekday,
            weekend,
            busy,
            pair_counts: BTreeMap::new(),
            round_byes: BTreeMap::new(),
            safe_weekday: Vec::new(),
            safe_weekend: Vec::new(),
        }
    }

    fn ids(&self, slot_type: SlotType) -> &[usize] {
        match slot_type {
            SlotType::Weekday => &self.weekday,
            SlotType::Weekend => &self.weekend,
        }
    }

    /// Weekday slots followed by weekend slots, each in calendar order.
    fn all_ids(&self) -> Vec<usize> {
        self.weekday.iter().chain(&self.weekend).copied().collect()
    }

    fn by_availability(&self, slot_type: SlotType) -> Vec<usize> {
        let mut ids = self.ids(slot_type).to_vec();
        ids.sort_by_key(|&i| self.slots[i].available_teams.len());
        ids
    }

    fn idle(&self, si: usize) -> Vec<String> {
        self.slots[si]
            .available_teams
            .iter()
            .filter(|t| !self.busy[si].contains(*t))
            .cloned()
            .collect()
    }

    fn pair_count(&self, a: &str, b: &str) -> usize {
        self.pair_counts.get(&pair_key(a, b)).copied().unwrap_or(0)
    }

    fn has_blackouts(&self, si: usize) -> bool {
        self.slots[si].available_teams.len() < self.roster.teams.len()
    }

    /// Position in `unassigned` of the round with the most fully available
    /// matchups, and its score. Ties go to the earliest round unless
    /// `prefer_later` is set.
    fn best_round(
        &self,
        rounds: &[Round],
        unassigned: &[usize],
        si: usize,
        prefer_later: bool,
    ) -> Option<(usize, usize)> {
        let slot = &self.slots[si];
        let mut best: Option<(usize, usize)> = None;
        for (pos, &ri) in unassigned.iter().enumerate() {
            let score = rounds[ri]
                .matchups
                .iter()
                .filter(|m| slot.is_available(&m.team_a) && slot.is_available(&m.team_b))
                .count();
            let better = match best {
                None => true,
                Some((_, s)) if prefer_later => score >= s,
                Some((_, s)) => score > s,
            };
            if better {
                best = Some((pos, score));
            }
        }
        best
    }

    fn place_round(&mut self, si: usize, round: &Round, deferred: &mut Vec<PoolEntry>) {
        let has_bo = self.has_blackouts(si);
        for m in &round.matchups {
            let slot = &self.slots[si];
            let busy = self.busy[si].contains(&m.team_a) || self.busy[si].contains(&m.team_b);
            let blocked = has_bo && !(slot.is_available(&m.team_a) && slot.is_available(&m.team_b));
            if busy || blocked {
                deferred.push((m.clone(), round.number));
            } else {
                self.push_pending(si, m.clone(), round.number, Provenance::Round);
            }
        }
        self.credit_byes(round);
    }

    fn overflow(&mut self, round: &Round, pool: &mut Vec<PoolEntry>) {
        pool.extend(round.matchups.iter().map(|m| (m.clone(), round.number)));
        self.credit_byes(round);
    }

    fn credit_byes(&mut self, round: &Round) {
        for t in &round.bye_teams {
            *self.round_byes.entry(t.clone()).or_insert(0) += 1;
        }
    }

    fn push_pending(&mut self, si: usize, matchup: Matchup, round_number: u32, source: Provenance) {
        self.busy[si].insert(matchup.team_a.clone());
        self.busy[si].insert(matchup.team_b.clone());
        *self.pair_counts.entry(matchup.key()).or_insert(0) += 1;
        self.slots[si].pending.push(PendingMatchup {
            matchup,
            round_number,
            source,
        });
    }

    /// Add an invented pairing, reusing a real pairing from the safe pools
    /// when one exists.
    fn push_adhoc(&mut self, si: usize, a: &str, b: &str) {
        let (round_number, source) = self.tag_adhoc(a, b);
        self.push_pending(si, Matchup::new(a, b), round_number, source);
    }

    fn tag_adhoc(&mut self, a: &str, b: &str) -> (u32, Provenance) {
        match self.take_from_safe_pool(a, b) {
            Some(round_number) => (round_number, Provenance::SafeAdhoc),
            None => (0, Provenance::Adhoc),
        }
    }

    /// Remove the first safe-pool entry pairing `a` with `b`, weekday pool
    /// first, and return its round number.
    fn take_from_safe_pool(&mut self, a: &str, b: &str) -> Option<u32> {
        let key = pair_key(a, b);
        for pool in [&mut self.safe_weekday, &mut self.safe_weekend] {
            if let Some(pos) = pool.iter().position(|(m, _)| m.key() == key) {
                return Some(pool.remove(pos).1);
            }
        }
        None
    }

    /// Replace pending entry `mi` of slot `si`: `outgoing` leaves the game
    /// and `incoming` takes its place against `keep`.
    fn swap_participant(&mut self, si: usize, mi: usize, incoming: &str, outgoing: &str, keep: &str) {
        let (round_number, source) = self.tag_adhoc(incoming, keep);
        let old = std::mem::replace(
            &mut self.slots[si].pending[mi],
            PendingMatchup {
                matchup: Matchup::new(incoming, keep),
                round_number,
                source,
            },
        );
        self.busy[si].remove(outgoing);
        self.busy[si].insert(incoming.to_string());
        if let Some(c) = self.pair_counts.get_mut(&old.matchup.key()) {
            *c = c.saturating_sub(1);
        }
        *self.pair_counts.entry(pair_key(incoming, keep)).or_insert(0) += 1;
        debug!(
            "Swap: {} replaces {} in {} (vs {})",
            incoming,
            outgoing,
            self.slots[si].label(),
            keep
        );
    }

    /// Place pool matchups into slots where both teams are available and
    /// idle, one per slot per sweep, until a sweep places nothing.
    fn fill_idle(&mut self, ids: &[usize], pool: &mut Vec<PoolEntry>, source: Provenance) -> usize {
        let mut filled = 0;
        loop {
            let mut any_placed = false;
            for &si in ids {
                let slot = &self.slots[si];
                let busy = &self.busy[si];
                let fits = |t: &String| slot.is_available(t) && !busy.contains(t);
                if let Some(pos) = pool.iter().position(|(m, _)| fits(&m.team_a) && fits(&m.team_b)) {
                    let (m, round_number) = pool.remove(pos);
                    self.push_pending(si, m, round_number, source);
                    filled += 1;
                    any_placed = true;
                }
            }
            if !any_placed {
                return filled;
            }
        }
    }

    fn fill_safe(&mut self, slot_type: SlotType) -> usize {
        let ids = self.ids(slot_type).to_vec();
        let mut pool = std::mem::take(match slot_type {
            SlotType::Weekday => &mut self.safe_weekday,
            SlotType::Weekend => &mut self.safe_weekend,
        });
        let filled = self.fill_idle(&ids, &mut pool, Provenance::SafeAdhoc);
        match slot_type {
            SlotType::Weekday => self.safe_weekday = pool,
            SlotType::Weekend => self.safe_weekend = pool,
        }
        filled
    }

    /// Pair up idle teams with the least-repeated pairings available.
    /// Weekend slots pair across pools first; weekday slots stay in-pool.
    fn invent_games(&mut self, slot_type: SlotType) -> usize {
        let roster = self.roster;
        let mut invented = 0;
        for si in self.ids(slot_type).to_vec() {
            let idle = self.idle(si);
            if idle.len() < 2 {
                continue;
            }

            let mut used = BTreeSet::new();
            let pairs = match slot_type {
                SlotType::Weekend => {
                    let mut cross = Vec::new();
                    for tn in idle.iter().filter(|t| roster.team(t).pool == Pool::North) {
                        for ts in idle.iter().filter(|t| roster.team(t).pool == Pool::South) {
                            cross.push((self.pair_count(tn, ts), tn.clone(), ts.clone()));
                        }
                    }
                    let mut pairs = greedy_pairs(cross, &mut used);
                    let rest: Vec<&String> = idle.iter().filter(|t| !used.contains(*t)).collect();
                    pairs.extend(greedy_pairs(self.candidates(&rest, |_, _| ()), &mut used));
                    pairs
                }
                SlotType::Weekday => {
                    let mut pairs = Vec::new();
                    for pool in [Pool::North, Pool::South] {
                        let members: Vec<&String> =
                            idle.iter().filter(|t| roster.team(t).pool == pool).collect();
                        pairs.extend(greedy_pairs(self.candidates(&members, |_, _| ()), &mut used));
                    }
                    pairs
                }
            };

            for (a, b) in pairs {
                self.push_adhoc(si, &a, &b);
                invented += 1;
            }
        }
        invented
    }

    /// All pairs of `teams` keyed by `(extra(a, b), pair count)`.
    fn candidates<K: Ord>(
        &self,
        teams: &[&String],
        extra: impl Fn(&str, &str) -> K,
    ) -> Vec<((K, usize), String, String)> {
        let mut out = Vec::new();
        for (i, a) in teams.iter().enumerate() {
            for b in &teams[i + 1..] {
                out.push(((extra(a.as_str(), b.as_str()), self.pair_count(a, b)), (*a).clone(), (*b).clone()));
            }
        }
        out
    }

    fn matchup_counts(&self, ids: &[usize]) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> =
            self.roster.teams.keys().map(|t| (t.clone(), 0)).collect();
        for &si in ids {
            for p in &self.slots[si].pending {
                *counts.entry(p.matchup.team_a.clone()).or_insert(0) += 1;
                *counts.entry(p.matchup.team_b.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Bring teams below the modal matchup count up to it by swapping them
    /// into games in slots where they sit idle.
    fn fix_byes(&mut self) -> usize {
        let roster = self.roster;
        let all = self.all_ids();
        let mut counts = self.matchup_counts(&all);
        let regular: Vec<&str> = roster
            .teams
            .values()
            .filter(|t| !t.weekday_only)
            .map(|t| t.code.as_str())
            .collect();
        if regular.is_empty() {
            return 0;
        }

        let count_of = |counts: &BTreeMap<String, usize>, t: &str| counts.get(t).copied().unwrap_or(0);
        let mut freq: BTreeMap<usize, usize> = BTreeMap::new();
        for t in &regular {
            *freq.entry(count_of(&counts, t)).or_insert(0) += 1;
        }
        // Most frequent count; ties go to the smaller count.
        let mut target = 0;
        let mut best_freq = 0;
        for (&count, &f) in &freq {
            if f > best_freq {
                target = count;
                best_freq = f;
            }
        }

        let mut high_bye: Vec<&str> = regular
            .iter()
            .copied()
            .filter(|t| count_of(&counts, t) < target)
            .collect();
        high_bye.sort_by_key(|t| count_of(&counts, t));

        let mut swaps = 0;
        for &bye_team in &high_bye {
            let needed = target.saturating_sub(count_of(&counts, bye_team));
            for _ in 0..needed {
                let mut best: Option<((usize, u8), usize, usize, String, String)> = None;
                for &si in &all {
                    let slot = &self.slots[si];
                    if !slot.is_available(bye_team) || self.busy[si].contains(bye_team) {
                        continue;
                    }
                    for (mi, entry) in slot.pending.iter().enumerate() {
                        let m = &entry.matchup;
                        for (out, keep) in [(&m.team_a, &m.team_b), (&m.team_b, &m.team_a)] {
                            if count_of(&counts, out) < target || high_bye.contains(&out.as_str()) {
                                continue;
                            }
                            let same_pool = roster.same_pool(bye_team, keep);
                            let penalty = match slot.slot_type {
                                SlotType::Weekend => u8::from(same_pool),
                                SlotType::Weekday if same_pool => 0,
                                SlotType::Weekday => continue,
                            };
                            let score = (self.pair_count(bye_team, keep), penalty);
                            if best.as_ref().is_none_or(|b| score < b.0) {
                                best = Some((score, si, mi, out.clone(), keep.clone()));
                            }
                        }
                    }
                }

                let Some((_, si, mi, out, keep)) = best else {
                    break;
                };
                self.swap_participant(si, mi, bye_team, &out, &keep);
                if let Some(c) = counts.get_mut(&out) {
                    *c = c.saturating_sub(1);
                }
                *counts.entry(bye_team.to_string()).or_insert(0) += 1;
                swaps += 1;
            }
        }
        swaps
    }

    /// Pair up idle teams in any slot that still has more than one,
    /// preferring same-pool pairs.
    fn enforce_max_one_bye(&mut self, slot_type: SlotType) -> usize {
        let roster = self.roster;
        let mut extra = 0;
        for si in self.ids(slot_type).to_vec() {
            let idle = self.idle(si);
            if idle.len() <= 1 {
                continue;
            }
            let members: Vec<&String> = idle.iter().collect();
            let candidates = self.candidates(&members, |a, b| u8::from(!roster.same_pool(a, b)));
            let mut used = BTreeSet::new();
            for (a, b) in greedy_pairs(candidates, &mut used) {
                self.push_adhoc(si, &a, &b);
                extra += 1;
            }
        }
        extra
    }

    /// Idle-slot byes per team over `ids`, every team included.
    fn byes_in(&self, ids: &[usize]) -> BTreeMap<String, usize> {
        let mut byes: BTreeMap<String, usize> =
            self.roster.teams.keys().map(|t| (t.clone(), 0)).collect();
        for &si in ids {
            for t in self.idle(si) {
                *byes.entry(t).or_insert(0) += 1;
            }
        }
        byes
    }

    fn slot_byes(&self) -> BTreeMap<String, usize> {
        self.byes_in(&self.all_ids())
    }

    /// Swap max-bye teams into games held by min-bye teams until the bye
    /// spread is at most one or no swap is possible.
    fn equalize_slot_byes(&mut self) -> usize {
        let mut swaps = 0;
        for _ in 0..MAX_EQUALIZE_PASSES {
            let byes = self.slot_byes();
            let (Some(&mn), Some(&mx)) = (byes.values().min(), byes.values().max()) else {
                break;
            };
            if mx - mn <= 1 {
                break;
            }
            let high: Vec<&String> = byes.iter().filter(|(_, c)| **c == mx).map(|(t, _)| t).collect();
            let low: BTreeSet<&String> = byes.iter().filter(|(_, c)| **c == mn).map(|(t, _)| t).collect();

            let all = self.all_ids();
            let Some((si, mi, incoming, out, keep)) =
                self.find_equalizing_swap(&all, &high, &low, |_, _| true)
            else {
                break;
            };
            self.swap_participant(si, mi, &incoming, &out, &keep);
            swaps += 1;
        }
        swaps
    }

    /// The same swap restricted to weekend slots and the teams that play
    /// them. A swap is only taken when the outgoing team has fewer byes
    /// overall than the incoming one, so the overall spread never widens.
    fn equalize_weekend_byes(&mut self) -> usize {
        let roster = self.roster;
        let weekend = self.weekend.clone();
        let mut swaps = 0;
        for _ in 0..MAX_EQUALIZE_PASSES {
            let total = self.slot_byes();
            let byes: BTreeMap<String, usize> = self
                .byes_in(&weekend)
                .into_iter()
                .filter(|(t, _)| !roster.team(t).weekday_only)
                .collect();
            let (Some(&mn), Some(&mx)) = (byes.values().min(), byes.values().max()) else {
                break;
            };
            if mx - mn <= 1 {
                break;
            }
            let high: Vec<&String> = byes.iter().filter(|(_, c)| **c == mx).map(|(t, _)| t).collect();
            let low: BTreeSet<&String> = byes.iter().filter(|(_, c)| **c == mn).map(|(t, _)| t).collect();

            let fewer_overall = |incoming: &str, out: &str| total.get(out) < total.get(incoming);
            let Some((si, mi, incoming, out, keep)) =
                self.find_equalizing_swap(&weekend, &high, &low, fewer_overall)
            else {
                break;
            };
            self.swap_participant(si, mi, &incoming, &out, &keep);
            swaps += 1;
        }
        swaps
    }

    fn find_equalizing_swap(
        &self,
        ids: &[usize],
        high: &[&String],
        low: &BTreeSet<&String>,
        allowed: impl Fn(&str, &str) -> bool,
    ) -> Option<(usize, usize, String, String, String)> {
        for &bye_team in high {
            for &si in ids {
                let slot = &self.slots[si];
                if !slot.is_available(bye_team) || self.busy[si].contains(bye_team) {
                    continue;
                }
                for (mi, entry) in slot.pending.iter().enumerate() {
                    let m = &entry.matchup;
                    for (out, keep) in [(&m.team_a, &m.team_b), (&m.team_b, &m.team_a)] {
                        if low.contains(out) && allowed(bye_team.as_str(), out.as_str()) {
                            return Some((si, mi, bye_team.clone(), out.clone(), keep.clone()));
                        }
                    }
                }
            }
        }
        None
    }

    fn into_report(self) -> PlacementReport {
        let weekday = self.matchup_counts(&self.weekday);
        let weekend = self.matchup_counts(&self.weekend);

        let wd_values: BTreeSet<usize> = weekday.values().copied().collect();
        let we_values: BTreeSet<usize> = self
            .roster
            .teams
            .values()
            .filter(|t| !t.weekday_only)
            .map(|t| weekend.get(&t.code).copied().unwrap_or(0))
            .collect();
        info!("Weekday matchups per team: {:?}", wd_values);
        info!("Weekend matchups per team: {:?}", we_values);

        PlacementReport {
            round_bye_counts: self.round_byes,
            weekday_matchups_per_team: weekday,
            weekend_matchups_per_team: weekend,
        }
    }
}

/// Greedily take pairs in sorted candidate order, skipping any that reuse
/// a team already in `used`.
fn greedy_pairs<K: Ord>(
    mut candidates: Vec<(K, String, String)>,
    used: &mut BTreeSet<String>,
) -> Vec<(String, String)> {
    candidates.sort();
    let mut pairs = Vec::new();
    for (_, a, b) in candidates {
        if !used.contains(&a) && !used.contains(&b) {
            used.insert(a.clone());
            used.insert(b.clone());
            pairs.push((a, b));
        }
    }
    pairs
}
