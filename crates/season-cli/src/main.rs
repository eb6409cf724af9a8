//! `season` CLI: generate, validate and seed-scan league season schedules.
//!
//! ## Usage
//!
//! ```sh
//! # Generate with a fixed seed, fixtures to a file, stats alongside
//! season generate league.yaml --seed 42 -o games.json --stats stats.json
//!
//! # Same, with the stats as plain-text tables
//! season generate league.yaml --seed 42 -o games.json --stats stats.txt --stats-format text
//!
//! # Generate with a random seed, fixtures to stdout
//! season generate league.yaml
//!
//! # Re-check an existing fixture list
//! season validate league.yaml -i games.json
//!
//! # Find seeds with no unplaced games and no repeated pairs
//! season scan league.yaml -n 50
//! ```
//!
//! The validation report goes to stderr. Every subcommand exits 1 when the
//! result fails its hard checks. Set `RUST_LOG=info` to follow the engine's
//! progress.

use std::collections::BTreeMap;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use season_engine::export::{fixtures_from_json, fixtures_to_json};
use season_engine::model::{pair_key, Fixture};
use season_engine::{compute_stats, schedule, validate_schedule, Config};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "season", version, about = "League season scheduler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatsFormat {
    /// Machine-readable JSON
    Json,
    /// Plain-text tables
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a schedule from a YAML config
    Generate {
        /// League configuration file
        config: String,
        /// Random seed (a random one is drawn and reported if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Output file for the fixture JSON (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Also write per-team statistics as JSON to this file
        #[arg(long)]
        stats: Option<String>,
        /// Format of the statistics file
        #[arg(long, value_enum, default_value = "json")]
        stats_format: StatsFormat,
    },
    /// Validate a JSON fixture list against a YAML config
    Validate {
        /// League configuration file
        config: String,
        /// Fixture JSON as written by `generate`
        #[arg(short, long)]
        input: String,
    },
    /// Try seeds 0..N and list those with no unplaced games and no repeated pairs
    Scan {
        /// League configuration file
        config: String,
        /// Number of seeds to try
        #[arg(short = 'n', long, default_value_t = 100)]
        max_seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let ok = match cli.command {
        Commands::Generate {
            config,
            seed,
            output,
            stats,
            stats_format,
        } => generate(&config, seed, output.as_deref(), stats.as_deref(), stats_format)?,
        Commands::Validate { config, input } => validate(&config, &input)?,
        Commands::Scan { config, max_seed } => scan(&config, max_seed)?,
    };

    if !ok {
        process::exit(1);
    }
    Ok(())
}

/// Logs go to stderr so stdout stays clean for fixture JSON.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: &str) -> Result<Config> {
    let config =
        Config::load(path).with_context(|| format!("Failed to load config: {}", path))?;
    info!(
        "Loaded {} teams in {} leagues from {}",
        config.teams.len(),
        config.leagues.len(),
        path
    );
    Ok(config)
}

fn generate(
    config_path: &str,
    seed: Option<u64>,
    output: Option<&str>,
    stats_path: Option<&str>,
    stats_format: StatsFormat,
) -> Result<bool> {
    let config = load_config(config_path)?;
    let seed = seed.unwrap_or_else(rand::random);
    eprintln!("Generating schedule (seed={})...", seed);

    let fixtures = schedule(&config, seed).context("Failed to generate schedule")?;
    if fixtures.is_empty() {
        anyhow::bail!("No games were scheduled");
    }

    let report = validate_schedule(&fixtures, &config);
    eprintln!("{}", report);

    let json = fixtures_to_json(&fixtures, &config.season.game_code_prefix)
        .context("Failed to serialize fixtures")?;
    write_output(output, &json)?;

    if let Some(path) = stats_path {
        let stats = compute_stats(&fixtures, &config);
        let text = match stats_format {
            StatsFormat::Json => {
                serde_json::to_string_pretty(&stats).context("Failed to serialize stats")?
            }
            StatsFormat::Text => stats.to_string(),
        };
        write_output(Some(path), &text)?;
    }

    Ok(report.valid)
}

fn validate(config_path: &str, input: &str) -> Result<bool> {
    let config = load_config(config_path)?;
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read file: {}", input))?;
    let fixtures = fixtures_from_json(&json)
        .with_context(|| format!("Failed to parse fixtures: {}", input))?;
    eprintln!("Loaded {} fixtures", fixtures.len());

    let report = validate_schedule(&fixtures, &config);
    eprintln!("{}", report);
    Ok(report.valid)
}

/// Placed games, unplaced fixtures and pairs met more than once.
fn seed_summary(fixtures: &[Fixture]) -> (usize, usize, usize) {
    let mut pairs: BTreeMap<_, usize> = BTreeMap::new();
    for g in fixtures.iter().filter_map(Fixture::as_game) {
        *pairs.entry(pair_key(&g.home_team, &g.away_team)).or_insert(0) += 1;
    }
    let unplaced = fixtures.iter().filter(|f| f.is_unplaced()).count();
    let duplicates = pairs.values().filter(|&&n| n > 1).count();
    (fixtures.len() - unplaced, unplaced, duplicates)
}

fn scan(config_path: &str, max_seed: u64) -> Result<bool> {
    let config = load_config(config_path)?;
    println!("Scanning seeds 0..{} using {}...", max_seed.saturating_sub(1), config_path);
    println!("{:>6}  {:>5}  {:>7}  {:>5}  Result", "Seed", "Games", "Unsched", "Dupes");
    println!("{}", "-".repeat(50));

    let mut good = Vec::new();
    for seed in 0..max_seed {
        let fixtures = schedule(&config, seed).context("Failed to generate schedule")?;
        let (games, unplaced, duplicates) = seed_summary(&fixtures);
        let ok = games > 0 && unplaced == 0 && duplicates == 0;
        println!(
            "{:>6}  {:>5}  {:>7}  {:>5}  {}",
            seed,
            games,
            unplaced,
            duplicates,
            if ok { "OK" } else { "FAIL" }
        );
        if ok {
            good.push(seed.to_string());
        }
    }

    println!("{}", "-".repeat(50));
    if good.is_empty() {
        println!("\nNo good seeds found in 0..{}", max_seed.saturating_sub(1));
    } else {
        println!("\nGood seeds ({}/{}): {}", good.len(), max_seed, good.join(", "));
    }
    Ok(!good.is_empty())
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
