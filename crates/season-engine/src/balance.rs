//! Home/away balance optimizer.
//!
//! Flips the home/away designation of placed games until every team is
//! within one home game of its away count, or no further flip helps. The
//! first pass only accepts flips where the new home team can host on its
//! own field. The second pass also accepts visitor-hosts flips, which keep
//! the field and swap only the labels.

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::assignment::{field_candidates, processing_order, AvoidGroups, Occupancy};
use crate::calendar::can_host_in_slot;
use crate::model::{CalendarSlot, Fixture, Game, Roster};

/// Which flips a pass may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipMode {
    /// New home team must host on its own field.
    HostOnly,
    /// Fall back to keeping the field and swapping only the labels.
    VisitorHosts,
}

impl FlipMode {
    pub fn max_iterations(self) -> usize {
        match self {
            FlipMode::HostOnly => 2000,
            FlipMode::VisitorHosts => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamBalance {
    pub team: String,
    pub home: usize,
    pub away: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BalanceReport {
    pub pass_one_iterations: usize,
    pub visitor_host_flips: usize,
    /// Teams still more than one game off balance.
    pub imbalanced_teams: Vec<TeamBalance>,
    /// Teams whose league owns no field at all.
    pub never_host_teams: BTreeSet<String>,
    /// Games where home is not host for a reason other than missing fields.
    pub non_structural_visitor_hosts: usize,
}

/// (slot index, game index)
type GameRef = (usize, usize);

/// Rebalance home/away across all placed games in `slots`.
pub fn balance_home_away<R: Rng + ?Sized>(
    slots: &mut [CalendarSlot],
    roster: Roster<'_>,
    game_length_minutes: u32,
    avoid_groups: &[BTreeSet<String>],
    rng: &mut R,
) -> BalanceReport {
    let mut balancer = Balancer::new(slots, roster, game_length_minutes, avoid_groups);

    info!(
        "Pre-optimization imbalance: {} (excluding {} fieldless teams)",
        balancer.imbalance(FlipMode::HostOnly),
        balancer.never_host.len()
    );

    let (pass_one_iterations, _) = balancer.run_pass(FlipMode::HostOnly, rng);
    info!(
        "Post-optimization imbalance: {} (after {} iterations)",
        balancer.imbalance(FlipMode::HostOnly),
        pass_one_iterations
    );

    let (_, visitor_host_flips) = balancer.run_pass(FlipMode::VisitorHosts, rng);
    if visitor_host_flips > 0 {
        info!(
            "Visitor-hosts fallback: {} flips (imbalance now {})",
            visitor_host_flips,
            balancer.imbalance(FlipMode::VisitorHosts)
        );
    }

    balancer.report(pass_one_iterations, visitor_host_flips)
}

struct Balancer<'s, 'r> {
    slots: &'s mut [CalendarSlot],
    roster: Roster<'r>,
    groups: AvoidGroups<'r>,
    game_length_minutes: u32,
    home: BTreeMap<String, i64>,
    away: BTreeMap<String, i64>,
    never_host: BTreeSet<String>,
    team_games: BTreeMap<String, Vec<GameRef>>,
}

impl<'s, 'r> Balancer<'s, 'r> {
    fn new(
        slots: &'s mut [CalendarSlot],
        roster: Roster<'r>,
        game_length_minutes: u32,
        avoid_groups: &'r [BTreeSet<String>],
    ) -> Self {
        let mut home = BTreeMap::new();
        let mut away = BTreeMap::new();
        let mut team_games: BTreeMap<String, Vec<GameRef>> = BTreeMap::new();
        for si in processing_order(slots) {
            for (gi, f) in slots[si].games.iter().enumerate() {
                let Some(g) = f.as_game() else { continue };
                *home.entry(g.home_team.clone()).or_insert(0) += 1;
                *away.entry(g.away_team.clone()).or_insert(0) += 1;
                team_games.entry(g.home_team.clone()).or_default().push((si, gi));
                team_games.entry(g.away_team.clone()).or_default().push((si, gi));
            }
        }
        Self {
            slots,
            roster,
            groups: AvoidGroups::new(avoid_groups),
            game_length_minutes,
            home,
            away,
            never_host: roster.never_host_teams(),
            team_games,
        }
    }

    fn diff(&self, t: &str) -> i64 {
        self.home.get(t).copied().unwrap_or(0) - self.away.get(t).copied().unwrap_or(0)
    }

    fn considered(&self, mode: FlipMode, t: &str) -> bool {
        mode == FlipMode::VisitorHosts || !self.never_host.contains(t)
    }

    /// Sum of `max(0, |home - away| - 1)` over the teams a pass considers.
    fn imbalance(&self, mode: FlipMode) -> i64 {
        self.roster
            .teams
            .keys()
            .filter(|t| self.considered(mode, t))
            .map(|t| (self.diff(t).abs() - 1).max(0))
            .sum()
    }

    fn game(&self, (si, gi): GameRef) -> Option<&Game> {
        self.slots[si].games.get(gi).and_then(Fixture::as_game)
    }

    /// Whether flipping would push `t` past one game off balance when it
    /// is not already worse. `sign` is +1 when `t` would gain a home game.
    fn worsens(&self, t: &str, sign: i64) -> bool {
        let old = self.diff(t).abs();
        let new = (self.diff(t) + 2 * sign).abs();
        new > 1 && new > old
    }

    /// The opponent of `team` in `g` when `team` sits on its excess side:
    /// home when `sign > 0`, away when `sign < 0`.
    fn excess_opponent(g: &Game, team: &str, sign: i64) -> Option<String> {
        if sign > 0 && g.home_team == team {
            Some(g.away_team.clone())
        } else if sign < 0 && g.away_team == team {
            Some(g.home_team.clone())
        } else {
            None
        }
    }

    /// Returns `(iterations, flips)`.
    fn run_pass<R: Rng + ?Sized>(&mut self, mode: FlipMode, rng: &mut R) -> (usize, usize) {
        let roster = self.roster;
        let mut stuck: BTreeSet<&str> = BTreeSet::new();
        let mut iterations = 0;
        let mut flips = 0;

        for it in 0..mode.max_iterations() {
            iterations = it + 1;
            if self.imbalance(mode) == 0 {
                break;
            }

            let mut worst: Option<&str> = None;
            let mut worst_diff: i64 = 0;
            for t in roster.teams.keys() {
                if !self.considered(mode, t) || stuck.contains(t.as_str()) {
                    continue;
                }
                let d = self.diff(t);
                if d.abs() > worst_diff.abs() {
                    worst = Some(t);
                    worst_diff = d;
                }
            }
            let Some(worst) = worst.filter(|_| worst_diff.abs() > 1) else {
                break;
            };
            let sign = worst_diff.signum();

            let mut refs = self.team_games.get(worst).cloned().unwrap_or_default();
            refs.shuffle(rng);

            let mut n = self.single_flip(worst, sign, &refs, mode);
            if n == 0 {
                n = self.paired_flip(worst, sign, &refs, mode, rng);
            }
            if n > 0 {
                flips += n;
                stuck.remove(worst);
                continue;
            }

            stuck.insert(worst);
            let still_imbalanced = roster
                .teams
                .keys()
                .filter(|t| self.considered(mode, t) && self.diff(t).abs() > 1)
                .count();
            if stuck.len() >= still_imbalanced {
                break;
            }
        }
        (iterations, flips)
    }

    fn single_flip(&mut self, team: &str, sign: i64, refs: &[GameRef], mode: FlipMode) -> usize {
        for &r in refs {
            let Some(other) = self.game(r).and_then(|g| Self::excess_opponent(g, team, sign)) else {
                continue;
            };
            if self.never_host.contains(&other) {
                if mode == FlipMode::HostOnly {
                    continue;
                }
            } else if self.worsens(&other, sign) {
                continue;
            }
            if self.try_flip(r, mode) {
                return 1;
            }
        }
        0
    }

    /// Flip one of the opponent's excess-side games against a third team
    /// first, then the primary game. A failed primary flip restores the
    /// secondary game exactly.
    fn paired_flip<R: Rng + ?Sized>(
        &mut self,
        team: &str,
        sign: i64,
        refs: &[GameRef],
        mode: FlipMode,
        rng: &mut R,
    ) -> usize {
        for &r1 in refs {
            let Some(other) = self.game(r1).and_then(|g| Self::excess_opponent(g, team, sign)) else {
                continue;
            };
            let other_never_hosts = self.never_host.contains(&other);
            if other_never_hosts && mode == FlipMode::HostOnly {
                continue;
            }
            if (self.diff(&other) + 2 * sign).abs() <= 1 || other_never_hosts {
                if self.try_flip(r1, mode) {
                    return 1;
                }
                continue;
            }

            let mut other_refs = self.team_games.get(&other).cloned().unwrap_or_default();
            other_refs.shuffle(rng);
            for r2 in other_refs {
                if r2 == r1 {
                    continue;
                }
                let Some(third) = self.game(r2).and_then(|g| Self::excess_opponent(g, &other, sign)) else {
                    continue;
                };
                if self.never_host.contains(&third) {
                    if mode == FlipMode::HostOnly {
                        continue;
                    }
                } else if self.worsens(&third, sign) {
                    continue;
                }

                let Some(saved) = self.game(r2).cloned() else { continue };
                if self.try_flip(r2, mode) {
                    if self.try_flip(r1, mode) {
                        return 2;
                    }
                    self.set_game(r2, saved);
                }
            }
        }
        0
    }

    /// Replace a placed game, keeping the home/away counters in step.
    fn set_game(&mut self, (si, gi): GameRef, game: Game) {
        if let Some(Fixture::Placed(cur)) = self.slots[si].games.get(gi) {
            *self.home.entry(cur.home_team.clone()).or_insert(0) -= 1;
            *self.away.entry(cur.away_team.clone()).or_insert(0) -= 1;
        }
        *self.home.entry(game.home_team.clone()).or_insert(0) += 1;
        *self.away.entry(game.away_team.clone()).or_insert(0) += 1;
        self.slots[si].games[gi] = Fixture::Placed(game);
    }

    /// Swap home and away of one game.
    ///
    /// When the new home team can host in the slot, the game moves to its
    /// field with the fewest same-time conflicts, keeping the original date
    /// when tied. Otherwise the flip only succeeds in visitor-hosts mode
    /// and keeps the field, date and time.
    fn try_flip(&mut self, r: GameRef, mode: FlipMode) -> bool {
        let (si, gi) = r;
        let Some(game) = self.game(r).cloned() else {
            return false;
        };
        let new_home = game.away_team.as_str();
        let new_away = game.home_team.as_str();

        let slot = &self.slots[si];
        let fields = if can_host_in_slot(new_home, slot, self.roster) {
            let occ = Occupancy::from_games(&slot.games, Some(gi));
            field_candidates(new_home, new_away, slot, self.roster, &occ.used)
                .into_iter()
                .map(|(d, t, f)| {
                    let conflict = occ.conflict_cost(new_home, new_away, (d, t, &f), self.roster, &self.groups);
                    (conflict, u8::from(d != game.date), d, t, f)
                })
                .min()
        } else {
            None
        };

        let flipped = match fields {
            Some((_, _, d, t, f)) => game.flipped(new_home, d, t, &f, self.game_length_minutes),
            None if mode == FlipMode::VisitorHosts => game.flipped(
                &game.host_team,
                game.date,
                game.start_time,
                &game.field_name,
                self.game_length_minutes,
            ),
            None => return false,
        };
        self.set_game(r, flipped);
        true
    }

    fn report(self, pass_one_iterations: usize, visitor_host_flips: usize) -> BalanceReport {
        let roster = self.roster;
        let count = |m: &BTreeMap<String, i64>, t: &str| m.get(t).copied().unwrap_or(0).max(0) as usize;

        let imbalanced_teams: Vec<TeamBalance> = roster
            .teams
            .keys()
            .filter(|t| self.diff(t).abs() > 1)
            .map(|t| TeamBalance {
                team: t.clone(),
                home: count(&self.home, t),
                away: count(&self.away, t),
            })
            .collect();
        if imbalanced_teams.is_empty() {
            info!("All fixable teams balanced within 1");
        } else {
            info!("{} teams still imbalanced", imbalanced_teams.len());
            for b in &imbalanced_teams {
                info!("  {}: {}H / {}A", b.team, b.home, b.away);
            }
        }
        if !self.never_host.is_empty() {
            let names: Vec<&str> = self.never_host.iter().map(String::as_str).collect();
            info!("Structurally fieldless (always away): {}", names.join(", "));
        }

        let mut non_structural = 0;
        for g in self.slots.iter().flat_map(|s| &s.games).filter_map(Fixture::as_game) {
            if g.home_team == g.host_team {
                continue;
            }
            if !roster.league_of(&g.home_team).fields(g.slot_type).is_empty() {
                warn!(
                    "{} (home) plays at {}'s {} on {}",
                    g.home_team, g.host_team, g.field_name, g.date
                );
                non_structural += 1;
            }
        }

        BalanceReport {
            pass_one_iterations,
            visitor_host_flips,
            imbalanced_teams,
            never_host_teams: self.never_host,
            non_structural_visitor_hosts: non_structural,
        }
    }
}
