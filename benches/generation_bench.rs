use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use track_racer::config::{TRACK_HEIGHT, TRACK_WIDTH};
use track_racer::evolve::FeedForwardPolicy;
use track_racer::{GenerationContext, SimConfig, Track, run_generation};

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    group.sample_size(10);
    // a ring road: walls along every edge plus a central island
    let track = Track::open(TRACK_WIDTH, TRACK_HEIGHT)
        .unwrap()
        .with_block(0, 0, TRACK_WIDTH, 40)
        .with_block(0, TRACK_HEIGHT - 40, TRACK_WIDTH, TRACK_HEIGHT)
        .with_block(0, 0, 40, TRACK_HEIGHT)
        .with_block(TRACK_WIDTH - 40, 0, TRACK_WIDTH, TRACK_HEIGHT)
        .with_block(400, 300, 1500, 800);

    for parallel in [false, true] {
        let config = SimConfig { population_size: 30, max_ticks: 300, parallel, ..SimConfig::default() };
        group.bench_function(format!("pop30_ticks300_parallel_{parallel}"), |b| {
            b.iter_batched(
                || {
                    let mut rng = SmallRng::seed_from_u64(0xBEEF);
                    let policies: Vec<FeedForwardPolicy> =
                        (0..30).map(|_| FeedForwardPolicy::random(&mut rng, 6)).collect();
                    (policies, vec![0.0; 30])
                },
                |(mut policies, mut fitness)| {
                    run_generation(&track, &config, GenerationContext::default(), &mut policies, &mut fitness)
                        .expect("generation runs")
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_generation);
criterion_main!(benches);
