//! Elitist evolutionary trainer and the feed-forward policy it evolves.

use crate::config::{SENSOR_COUNT, SimConfig};
use crate::error::{CheckpointError, SimError};
use crate::policy::{ACTION_COUNT, Policy};
use crate::sensor::SensorReadings;
use crate::sim::{self, Generation, GenerationContext, GenerationReport, RunState};
use crate::track::Track;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

// ============================
// Feed-forward policy
// ============================

/// 5 inputs, one tanh hidden layer, 4 linear outputs. Biases sit after each row's weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedForwardPolicy {
    hidden: usize,
    weights: Vec<f32>,
}

fn weight_count(hidden: usize) -> usize {
    hidden * (SENSOR_COUNT + 1) + ACTION_COUNT * (hidden + 1)
}

impl FeedForwardPolicy {
    pub fn random<R: Rng>(rng: &mut R, hidden: usize) -> Self {
        let weights = (0..weight_count(hidden)).map(|_| rng.gen_range(-1.0..1.0)).collect();
        Self { hidden, weights }
    }

    /// Returns `None` if `weights` does not fit `hidden` units.
    pub fn from_weights(hidden: usize, weights: Vec<f32>) -> Option<Self> {
        (weights.len() == weight_count(hidden)).then_some(Self { hidden, weights })
    }

    pub fn hidden(&self) -> usize {
        self.hidden
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn forward(&self, inputs: &SensorReadings) -> [f32; ACTION_COUNT] {
        let (hidden_w, out_w) = self.weights.split_at(self.hidden * (SENSOR_COUNT + 1));
        let hidden: Vec<f32> = hidden_w
            .chunks_exact(SENSOR_COUNT + 1)
            .map(|row| {
                let sum: f32 = row[..SENSOR_COUNT]
                    .iter()
                    .zip(inputs)
                    .map(|(w, &x)| w * x as f32)
                    .sum();
                (sum + row[SENSOR_COUNT]).tanh()
            })
            .collect();

        let mut out = [0.0f32; ACTION_COUNT];
        for (o, row) in out.iter_mut().zip(out_w.chunks_exact(self.hidden + 1)) {
            let sum: f32 = row[..self.hidden].iter().zip(&hidden).map(|(w, h)| w * h).sum();
            *o = sum + row[self.hidden];
        }
        out
    }

    pub fn mutate<R: Rng>(&mut self, rng: &mut R, rate: f32, sigma: f32) {
        if sigma <= 0.0 {
            return;
        }
        for w in self.weights.iter_mut() {
            if rng.r#gen::<f32>() < rate {
                *w += rng.gen_range(-sigma..sigma);
            }
        }
    }
}

impl Policy for FeedForwardPolicy {
    fn activate(&mut self, inputs: &SensorReadings) -> Vec<f64> {
        self.forward(inputs).iter().map(|&v| v as f64).collect()
    }
}

// ============================
// Checkpoints
// ============================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub generation: u64,
    pub fitness: f64,
    pub policy: FeedForwardPolicy,
}

pub fn save_checkpoint(path: impl AsRef<Path>, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
    let bytes = bincode::serde::encode_to_vec(checkpoint, bincode::config::standard())?;
    std::fs::write(path, bytes)?;
    Ok(())
}

pub fn load_checkpoint(path: impl AsRef<Path>) -> Result<Checkpoint, CheckpointError> {
    let bytes = std::fs::read(path)?;
    let (checkpoint, _): (Checkpoint, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
    let policy = &checkpoint.policy;
    if policy.weights.len() != weight_count(policy.hidden) {
        return Err(CheckpointError::Shape { hidden: policy.hidden, weights: policy.weights.len() });
    }
    Ok(checkpoint)
}

// ============================
// Evolutionary trainer (population of vehicles)
// ============================

pub struct EvoTrainer {
    config: SimConfig,
    rng: SmallRng,
    pop: Vec<FeedForwardPolicy>,
    fitness: Vec<f64>,
    generation: Generation,
    best_history: Vec<f64>,
    champion: Option<Checkpoint>,
}

impl EvoTrainer {
    pub fn new(config: SimConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let pop = (0..config.population_size)
            .map(|_| FeedForwardPolicy::random(&mut rng, config.hidden_neurons))
            .collect();
        Self::with_population(config, rng, pop)
    }

    /// Population of mutated copies around `seed`, which is kept unchanged at index 0.
    pub fn from_seed_policy(config: SimConfig, seed: FeedForwardPolicy) -> Self {
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let mut pop = Vec::with_capacity(config.population_size);
        pop.push(seed.clone());
        while pop.len() < config.population_size {
            let mut child = seed.clone();
            child.mutate(&mut rng, config.mutation_rate, config.mutation_sigma);
            pop.push(child);
        }
        Self::with_population(config, rng, pop)
    }

    fn with_population(config: SimConfig, rng: SmallRng, pop: Vec<FeedForwardPolicy>) -> Self {
        let fitness = vec![0.0; pop.len()];
        let generation = Generation::new(GenerationContext { number: 1 }, &config);
        Self { config, rng, pop, fitness, generation, best_history: Vec::new(), champion: None }
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    pub fn generation_number(&self) -> u64 {
        self.generation.context().number
    }

    pub fn policies(&self) -> &[FeedForwardPolicy] {
        &self.pop
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    /// Best fitness of every finished generation, oldest first.
    pub fn best_history(&self) -> &[f64] {
        &self.best_history
    }

    /// Best policy seen so far across all finished generations.
    pub fn champion(&self) -> Option<&Checkpoint> {
        self.champion.as_ref()
    }

    /// One tick. Returns the report when this tick finished the generation,
    /// after the next generation has been bred.
    pub fn step(&mut self, track: &Track) -> Result<Option<GenerationReport>, SimError> {
        let state = self.generation.step(track, &mut self.pop, &mut self.fitness)?;
        let RunState::Terminated(_) = state else {
            return Ok(None);
        };
        let Some(report) = self.generation.report(&self.fitness) else {
            return Ok(None);
        };
        sim::log_report(&report);
        self.reproduce();
        Ok(Some(report))
    }

    pub fn run_generation(&mut self, track: &Track) -> Result<GenerationReport, SimError> {
        loop {
            if let Some(report) = self.step(track)? {
                return Ok(report);
            }
        }
    }

    /// Keep the single best policy; fill the rest with its mutated copies.
    fn reproduce(&mut self) {
        if self.pop.is_empty() {
            return;
        }
        let mut idxs: Vec<usize> = (0..self.pop.len()).collect();
        idxs.sort_by(|&a, &b| self.fitness[b].total_cmp(&self.fitness[a]));
        let best_idx = *idxs.first().unwrap_or(&0);
        let best_fitness = self.fitness[best_idx];
        let number = self.generation_number();
        self.best_history.push(best_fitness);

        let parent = self.pop[best_idx].clone();
        if self.champion.as_ref().is_none_or(|c| best_fitness > c.fitness) {
            info!(generation = number, fitness = best_fitness, "New champion");
            self.champion = Some(Checkpoint { generation: number, fitness: best_fitness, policy: parent.clone() });
        }

        let mut new_pop = Vec::with_capacity(self.pop.len());
        new_pop.push(parent.clone());
        while new_pop.len() < self.pop.len() {
            let mut child = parent.clone();
            child.mutate(&mut self.rng, self.config.mutation_rate, self.config.mutation_sigma);
            new_pop.push(child);
        }
        self.pop = new_pop;
        self.fitness.fill(0.0);
        self.generation = Generation::new(GenerationContext { number: number + 1 }, &self.config);
    }
}
