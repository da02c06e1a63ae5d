use approx::assert_relative_eq;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use track_racer::config::{MIN_SPEED, TRACK_HEIGHT, TRACK_WIDTH};
use track_racer::evolve::FeedForwardPolicy;
use track_racer::kinematics::Point;
use track_racer::sensor::SensorReadings;
use track_racer::{
    Generation, GenerationContext, Policy, RunState, SimConfig, SimError, Termination, Track, Vehicle,
    run_generation,
};

/// Returns the same outputs every tick and counts how often it was asked.
#[derive(Clone)]
struct Fixed {
    outputs: Vec<f64>,
    calls: usize,
}

impl Fixed {
    fn new(outputs: &[f64]) -> Self {
        Self { outputs: outputs.to_vec(), calls: 0 }
    }
}

impl Policy for Fixed {
    fn activate(&mut self, _inputs: &SensorReadings) -> Vec<f64> {
        self.calls += 1;
        self.outputs.clone()
    }
}

const LEFT: [f64; 4] = [1.0, 0.0, 0.0, 0.0];
const BRAKE: [f64; 4] = [0.0, 0.0, 1.0, 0.0];
const GAS: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

fn config(population: usize, max_ticks: u32) -> SimConfig {
    SimConfig { population_size: population, max_ticks, ..SimConfig::default() }
}

fn open_track() -> Track {
    Track::open(TRACK_WIDTH, TRACK_HEIGHT).unwrap()
}

#[test]
fn test_everyone_crashing_on_tick_one_ends_after_one_tick() {
    let track = Track::from_mask(TRACK_WIDTH, TRACK_HEIGHT, vec![true; (TRACK_WIDTH * TRACK_HEIGHT) as usize]).unwrap();
    let cfg = config(3, 1200);
    let mut policies = vec![Fixed::new(&GAS); 3];
    let mut fitness = vec![0.0; 3];

    let report = run_generation(&track, &cfg, GenerationContext { number: 1 }, &mut policies, &mut fitness).unwrap();

    assert_eq!(report.ticks, 1);
    assert_eq!(report.termination, Termination::AllCrashed);
    assert_eq!(report.survivors, 0);
    // the crash tick still pays out the first 20 units
    for f in fitness {
        assert_relative_eq!(f, 20.0 / 30.0);
    }
}

#[test]
fn test_no_crashes_runs_to_tick_cap() {
    let track = open_track();
    let cfg = config(2, 1200);
    let mut policies = vec![Fixed::new(&LEFT); 2];
    let mut fitness = vec![0.0; 2];

    let report = run_generation(&track, &cfg, GenerationContext { number: 9 }, &mut policies, &mut fitness).unwrap();

    assert_eq!(report.generation, 9);
    assert_eq!(report.ticks, 1200);
    assert_eq!(report.termination, Termination::TickCap);
    assert_eq!(report.survivors, 2);
    assert!(policies.iter().all(|p| p.calls == 1200));
}

#[test]
fn test_fitness_re_adds_cumulative_reward_every_tick() {
    let track = open_track();
    let cfg = config(1, 3);
    let mut policies = vec![Fixed::new(&BRAKE)];
    let mut fitness = vec![0.0];

    run_generation(&track, &cfg, GenerationContext::default(), &mut policies, &mut fitness).unwrap();

    // speeds 20, 18, 16 -> cumulative distance 20, 38, 54, each re-added
    assert_relative_eq!(fitness[0], (20.0 + 38.0 + 54.0) / 30.0);
    // a single end-of-run reward would only be 54 / 30
    assert!(fitness[0] > 54.0 / 30.0);
}

#[test]
fn test_repeated_braking_never_drops_below_floor() {
    let track = open_track();
    let cfg = config(1, 40);
    let mut generation = Generation::new(GenerationContext::default(), &cfg);
    let mut policies = vec![Fixed::new(&BRAKE)];
    let mut fitness = vec![0.0];

    while generation.is_running() {
        generation.step(&track, &mut policies, &mut fitness).unwrap();
        assert!(generation.vehicles()[0].speed() >= MIN_SPEED);
    }
    assert_eq!(generation.vehicles()[0].speed(), MIN_SPEED);
}

#[test]
fn test_dead_vehicles_are_queried_but_frozen() {
    // wall only across the upper half; the lower vehicle drives under it
    let track = open_track().with_block(1000, 0, 1100, 500);
    let cfg = config(2, 20);
    let vehicles = vec![Vehicle::new(Point::new(830.0, 200.0)), Vehicle::new(Point::new(830.0, 920.0))];
    let mut generation = Generation::with_vehicles(GenerationContext::default(), &cfg, vehicles);
    let mut policies = vec![Fixed::new(&GAS); 2];
    let mut fitness = vec![0.0; 2];

    while generation.vehicles()[0].is_alive() {
        generation.step(&track, &mut policies, &mut fitness).unwrap();
    }
    let crashed = generation.vehicles()[0].clone();
    let frozen_fitness = fitness[0];

    // steer the wreck anyway; nothing about it may change
    policies[0].outputs = LEFT.to_vec();
    while generation.is_running() {
        generation.step(&track, &mut policies, &mut fitness).unwrap();
    }

    let wreck = &generation.vehicles()[0];
    assert_eq!(wreck.position(), crashed.position());
    assert_eq!(wreck.heading(), crashed.heading());
    assert_eq!(wreck.speed(), crashed.speed());
    assert_eq!(fitness[0], frozen_fitness);
    assert!(generation.vehicles()[1].is_alive());
    assert_eq!(generation.state(), RunState::Terminated(Termination::TickCap));
    assert_eq!(policies[0].calls, 20);
    assert_eq!(policies[1].calls, 20);
}

#[test]
fn test_short_policy_output_is_fatal() {
    let track = open_track();
    let cfg = config(2, 10);
    let mut policies = vec![Fixed::new(&GAS), Fixed::new(&[0.3, 0.1])];
    let mut fitness = vec![0.0; 2];

    let err = run_generation(&track, &cfg, GenerationContext::default(), &mut policies, &mut fitness).unwrap_err();
    assert!(matches!(err, SimError::PolicyOutput { agent: 1, len: 2, expected: 4 }));
}

#[test]
fn test_mismatched_population_is_rejected() {
    let track = open_track();
    let cfg = config(2, 10);
    let mut generation = Generation::new(GenerationContext::default(), &cfg);
    let mut policies = vec![Fixed::new(&GAS)];
    let mut fitness = vec![0.0; 2];
    let err = generation.step(&track, &mut policies, &mut fitness).unwrap_err();
    assert!(matches!(err, SimError::PopulationMismatch { vehicles: 2, policies: 1, fitness: 2 }));
}

#[test]
fn test_terminated_generation_does_not_advance() {
    let track = open_track();
    let cfg = config(1, 2);
    let mut generation = Generation::new(GenerationContext::default(), &cfg);
    let mut policies = vec![Fixed::new(&GAS)];
    let mut fitness = vec![0.0];
    generation.step(&track, &mut policies, &mut fitness).unwrap();
    generation.step(&track, &mut policies, &mut fitness).unwrap();
    assert!(generation.report(&fitness).is_some());

    let before = fitness[0];
    let state = generation.step(&track, &mut policies, &mut fitness).unwrap();
    assert_eq!(state, RunState::Terminated(Termination::TickCap));
    assert_eq!(generation.tick(), 2);
    assert_eq!(fitness[0], before);
    assert_eq!(policies[0].calls, 2);
}

#[test]
fn test_parallel_matches_sequential() {
    let track = open_track().with_block(1000, 0, 1100, 1080).with_block(0, 0, 1920, 300);
    let mut rng = SmallRng::seed_from_u64(42);
    let base: Vec<FeedForwardPolicy> = (0..16).map(|_| FeedForwardPolicy::random(&mut rng, 6)).collect();

    let run = |parallel: bool| {
        let cfg = SimConfig { parallel, ..config(16, 300) };
        let mut policies = base.clone();
        let mut fitness = vec![0.0; 16];
        let report = run_generation(&track, &cfg, GenerationContext::default(), &mut policies, &mut fitness).unwrap();
        (report, fitness)
    };

    let (seq_report, seq_fitness) = run(false);
    let (par_report, par_fitness) = run(true);
    assert_eq!(seq_report, par_report);
    assert_eq!(seq_fitness, par_fitness);
}

/// Drives forward until its nth query, where it returns nothing.
struct FailsOn {
    call: usize,
    calls: usize,
}

impl Policy for FailsOn {
    fn activate(&mut self, _inputs: &SensorReadings) -> Vec<f64> {
        self.calls += 1;
        if self.calls == self.call { Vec::new() } else { GAS.to_vec() }
    }
}

#[test]
fn test_failed_tick_leaves_every_vehicle_untouched() {
    for parallel in [false, true] {
        let track = open_track();
        let cfg = SimConfig { parallel, ..config(3, 100) };
        let mut generation = Generation::new(GenerationContext::default(), &cfg);
        let mut policies = vec![
            FailsOn { call: usize::MAX, calls: 0 },
            FailsOn { call: 3, calls: 0 },
            FailsOn { call: usize::MAX, calls: 0 },
        ];
        let mut fitness = vec![0.0; 3];

        generation.step(&track, &mut policies, &mut fitness).unwrap();
        generation.step(&track, &mut policies, &mut fitness).unwrap();
        let before = fitness.clone();
        let vehicles_before = generation.vehicles().to_vec();

        let err = generation.step(&track, &mut policies, &mut fitness).unwrap_err();
        assert!(matches!(err, SimError::PolicyOutput { agent: 1, len: 0, .. }));
        assert_eq!(generation.tick(), 2);
        assert!(generation.is_running());
        assert_eq!(fitness, before);
        for (now, then) in generation.vehicles().iter().zip(&vehicles_before) {
            assert_eq!(now.position(), then.position());
            assert_eq!(now.time_elapsed(), 2);
        }

        // the retried tick advances everyone together
        generation.step(&track, &mut policies, &mut fitness).unwrap();
        assert!(generation.vehicles().iter().all(|v| v.time_elapsed() == 3));
    }
}

#[test]
fn test_empty_population_reports_zero_best_fitness() {
    let track = open_track();
    let cfg = config(1, 10);
    let mut generation = Generation::with_vehicles(GenerationContext::default(), &cfg, Vec::new());
    let mut policies: Vec<Fixed> = Vec::new();
    let mut fitness: Vec<f64> = Vec::new();

    let state = generation.step(&track, &mut policies, &mut fitness).unwrap();
    assert_eq!(state, RunState::Terminated(Termination::AllCrashed));
    assert_eq!(generation.report(&fitness).unwrap().best_fitness, 0.0);
}
