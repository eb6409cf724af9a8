use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use season_engine::roundrobin::generate_round_robin;
use season_engine::{schedule, validate_schedule, Config};

const LEAGUE: &str = include_str!("../tests/fixtures/league.yaml");

fn bench_round_robin(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_robin");
    for n in [4usize, 12, 24] {
        let teams: Vec<String> = (1..=n).map(|i| format!("T{}", i)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &teams, |b, teams| {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            b.iter(|| generate_round_robin(black_box(teams), &mut rng));
        });
    }
    group.finish();
}

fn bench_full_season(c: &mut Criterion) {
    let config = Config::from_yaml_str(LEAGUE).unwrap();
    let mut group = c.benchmark_group("season");
    group.sample_size(10);
    group.bench_function("schedule_24_teams", |b| {
        b.iter(|| schedule(black_box(&config), black_box(42)).unwrap());
    });
    let fixtures = schedule(&config, 42).unwrap();
    group.bench_function("validate_24_teams", |b| {
        b.iter(|| validate_schedule(black_box(&fixtures), black_box(&config)));
    });
    group.finish();
}

criterion_group!(benches, bench_round_robin, bench_full_season);
criterion_main!(benches);
