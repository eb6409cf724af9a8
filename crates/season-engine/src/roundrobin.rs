//! Round-robin and crossover matchup generation.
//!
//! Both generators shuffle inputs and outputs so schedules look random while
//! still covering every required pairing exactly once. All randomness comes
//! from the caller's RNG; the draw order is fixed so one seed always yields
//! the same rounds.

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::model::{pair_key, GameType, Matchup, PairKey, Round};

/// Generate a full single round robin using the circle method.
///
/// N-1 rounds for even N. For odd N a phantom opponent is added, giving N
/// rounds with exactly one real bye team each. Fewer than two teams yields
/// no rounds and consumes no randomness.
///
/// Draw order: team permutation, round permutation, then one orientation
/// draw per matchup in round order.
pub fn generate_round_robin<R: Rng + ?Sized>(teams: &[String], rng: &mut R) -> Vec<Round> {
    if teams.len() < 2 {
        return Vec::new();
    }

    let mut order: Vec<Option<&str>> = teams.iter().map(|t| Some(t.as_str())).collect();
    order.shuffle(rng);
    if order.len() % 2 == 1 {
        order.push(None);
    }
    let n = order.len();

    let mut rounds = Vec::with_capacity(n - 1);
    for r in 0..n - 1 {
        let mut matchups = Vec::new();
        let mut bye_teams = Vec::new();
        for i in 0..n / 2 {
            match (order[i], order[n - 1 - i]) {
                (Some(a), Some(b)) => matchups.push(Matchup::new(a, b)),
                (Some(t), None) | (None, Some(t)) => bye_teams.push(t.to_string()),
                (None, None) => {}
            }
        }
        rounds.push(Round {
            number: r as u32 + 1,
            matchups,
            round_type: GameType::Intra,
            bye_teams,
        });

        // Keep position 0 fixed; the last element moves to position 1.
        order[1..].rotate_right(1);
    }

    shuffle_rounds(&mut rounds, rng);
    rounds
}

/// Generate crossover rounds in which every north team meets every south team
/// exactly once.
///
/// North `i` plays south `j` in round `(i + j) mod R` with
/// `R = max(|north|, |south|)`, a Latin-square assignment that never puts a
/// team in the same round twice. Teams left over in a round are byes.
pub fn generate_crossover<R: Rng + ?Sized>(
    north: &[String],
    south: &[String],
    rng: &mut R,
) -> Vec<Round> {
    if north.is_empty() || south.is_empty() {
        return Vec::new();
    }

    let mut north: Vec<&str> = north.iter().map(String::as_str).collect();
    let mut south: Vec<&str> = south.iter().map(String::as_str).collect();
    north.shuffle(rng);
    south.shuffle(rng);

    let num_rounds = north.len().max(south.len());
    let mut round_matchups: Vec<Vec<Matchup>> = vec![Vec::new(); num_rounds];
    for (i, n) in north.iter().enumerate() {
        for (j, s) in south.iter().enumerate() {
            round_matchups[(i + j) % num_rounds].push(Matchup::new(*n, *s));
        }
    }

    let mut rounds: Vec<Round> = round_matchups
        .into_iter()
        .enumerate()
        .map(|(r, matchups)| {
            let bye_teams = north
                .iter()
                .chain(&south)
                .filter(|t| !matchups.iter().any(|m| m.involves(t)))
                .map(|t| t.to_string())
                .collect();
            Round {
                number: r as u32 + 1,
                matchups,
                round_type: GameType::Crossover,
                bye_teams,
            }
        })
        .collect();

    shuffle_rounds(&mut rounds, rng);
    rounds
}

/// Shuffle round order, renumber 1..R, then flip each matchup's orientation
/// with probability one half.
fn shuffle_rounds<R: Rng + ?Sized>(rounds: &mut [Round], rng: &mut R) {
    rounds.shuffle(rng);
    for (i, round) in rounds.iter_mut().enumerate() {
        round.number = i as u32 + 1;
    }
    for round in rounds.iter_mut() {
        for m in &mut round.matchups {
            if rng.gen::<f64>() < 0.5 {
                m.swap();
            }
        }
    }
}

/// Result of auditing a set of generated rounds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoundAudit {
    pub valid: bool,
    pub errors: Vec<String>,
    pub matchup_counts: BTreeMap<PairKey, usize>,
    pub games_per_team: BTreeMap<String, usize>,
}

/// Check that `rounds` form a complete single round robin over `teams`.
pub fn verify_round_robin(rounds: &[Round], teams: &[String]) -> RoundAudit {
    let mut audit = tally(rounds, teams.iter());
    for (i, t1) in teams.iter().enumerate() {
        for t2 in &teams[i + 1..] {
            expect_once(&mut audit, t1, t2);
        }
    }
    audit.valid = audit.errors.is_empty();
    audit
}

/// Check that every north team meets every south team exactly once.
pub fn verify_crossover(rounds: &[Round], north: &[String], south: &[String]) -> RoundAudit {
    let mut audit = tally(rounds, north.iter().chain(south));
    for n in north {
        for s in south {
            expect_once(&mut audit, n, s);
        }
    }
    audit.valid = audit.errors.is_empty();
    audit
}

fn tally<'a>(rounds: &[Round], teams: impl Iterator<Item = &'a String>) -> RoundAudit {
    let mut audit = RoundAudit {
        games_per_team: teams.map(|t| (t.clone(), 0)).collect(),
        ..RoundAudit::default()
    };

    for round in rounds {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for m in &round.matchups {
            for t in [&m.team_a, &m.team_b] {
                if !seen.insert(t) {
                    audit
                        .errors
                        .push(format!("Round {}: {} appears twice", round.number, t));
                }
                *audit.games_per_team.entry(t.clone()).or_insert(0) += 1;
            }
            *audit.matchup_counts.entry(m.key()).or_insert(0) += 1;
        }
    }
    audit
}

fn expect_once(audit: &mut RoundAudit, a: &str, b: &str) {
    let count = audit.matchup_counts.get(&pair_key(a, b)).copied().unwrap_or(0);
    if count != 1 {
        audit
            .errors
            .push(format!("{} vs {}: played {} times (expected 1)", a, b, count));
    }
}
