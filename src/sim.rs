//! Lockstep simulation loop for one generation.
//!
//! Every tick each vehicle's policy is queried (dead ones included), the chosen
//! action is applied, live vehicles are updated against the track and their
//! reward is added to the caller's fitness slot. The generation ends when no
//! vehicle survives a tick or the tick cap is reached.

use crate::config::SimConfig;
use crate::error::SimError;
use crate::kinematics::Point;
use crate::policy::{Action, Policy, select_action};
use crate::track::Track;
use crate::vehicle::Vehicle;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Identifies the generation being run. Owned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationContext {
    pub number: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    AllCrashed,
    TickCap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Terminated(Termination),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub generation: u64,
    pub ticks: u32,
    pub termination: Termination,
    pub survivors: usize,
    pub best_fitness: f64,
}

pub struct Generation {
    context: GenerationContext,
    max_ticks: u32,
    parallel: bool,
    vehicles: Vec<Vehicle>,
    tick: u32,
    alive: usize,
    state: RunState,
}

impl Generation {
    pub fn new(context: GenerationContext, config: &SimConfig) -> Self {
        let (x, y) = config.start_position;
        let vehicles = (0..config.population_size)
            .map(|_| Vehicle::new(Point::new(x, y)))
            .collect();
        Self::with_vehicles(context, config, vehicles)
    }

    /// Starts a generation from explicit vehicles, e.g. with varied start poses.
    pub fn with_vehicles(context: GenerationContext, config: &SimConfig, vehicles: Vec<Vehicle>) -> Self {
        let alive = vehicles.iter().filter(|v| v.is_alive()).count();
        Self {
            context,
            max_ticks: config.max_ticks,
            parallel: config.parallel,
            vehicles,
            tick: 0,
            alive,
            state: RunState::Running,
        }
    }

    pub fn context(&self) -> GenerationContext {
        self.context
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn alive_count(&self) -> usize {
        self.alive
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Advance every vehicle by one tick. A terminated generation is left untouched.
    ///
    /// On a policy error nothing has moved: the tick can be retried or abandoned.
    pub fn step<P: Policy + Send>(
        &mut self,
        track: &Track,
        policies: &mut [P],
        fitness: &mut [f64],
    ) -> Result<RunState, SimError> {
        if !self.is_running() {
            return Ok(self.state);
        }
        if policies.len() != self.vehicles.len() || fitness.len() != self.vehicles.len() {
            return Err(SimError::PopulationMismatch {
                vehicles: self.vehicles.len(),
                policies: policies.len(),
                fitness: fitness.len(),
            });
        }

        // every decision is validated before any vehicle moves
        let actions = if self.parallel {
            self.vehicles
                .par_iter()
                .zip(policies.par_iter_mut())
                .enumerate()
                .map(|(i, (vehicle, policy))| decide(i, vehicle, policy))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            self.vehicles
                .iter()
                .zip(policies.iter_mut())
                .enumerate()
                .map(|(i, (vehicle, policy))| decide(i, vehicle, policy))
                .collect::<Result<Vec<_>, _>>()?
        };

        let tick = self.tick;
        if self.parallel {
            self.vehicles
                .par_iter_mut()
                .zip(actions.par_iter())
                .zip(fitness.par_iter_mut())
                .enumerate()
                .for_each(|(i, ((vehicle, &action), score))| advance(i, tick, track, vehicle, action, score));
        } else {
            for (i, ((vehicle, &action), score)) in
                self.vehicles.iter_mut().zip(actions.iter()).zip(fitness.iter_mut()).enumerate()
            {
                advance(i, tick, track, vehicle, action, score);
            }
        }

        self.alive = self.vehicles.iter().filter(|v| v.is_alive()).count();
        self.tick += 1;

        if self.alive == 0 {
            self.state = RunState::Terminated(Termination::AllCrashed);
        } else if self.tick >= self.max_ticks {
            self.state = RunState::Terminated(Termination::TickCap);
        }
        Ok(self.state)
    }

    /// Summary once terminated; `None` while still running.
    pub fn report(&self, fitness: &[f64]) -> Option<GenerationReport> {
        match self.state {
            RunState::Terminated(termination) => Some(self.summarize(termination, fitness)),
            RunState::Running => None,
        }
    }

    fn summarize(&self, termination: Termination, fitness: &[f64]) -> GenerationReport {
        GenerationReport {
            generation: self.context.number,
            ticks: self.tick,
            termination,
            survivors: self.alive,
            best_fitness: if fitness.is_empty() {
                0.0
            } else {
                fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            },
        }
    }
}

fn decide<P: Policy>(index: usize, vehicle: &Vehicle, policy: &mut P) -> Result<Action, SimError> {
    // queried even when dead so every agent sees the same tick cadence
    let outputs = policy.activate(vehicle.readings());
    select_action(index, &outputs)
}

fn advance(index: usize, tick: u32, track: &Track, vehicle: &mut Vehicle, action: Action, score: &mut f64) {
    // a dead vehicle's decision is discarded so its motion stays frozen
    if !vehicle.is_alive() {
        return;
    }
    action.apply(&mut vehicle.motion);
    vehicle.update(track);
    *score += vehicle.reward();
    if !vehicle.is_alive() {
        debug!(vehicle = index, tick, distance = vehicle.distance_traveled(), "Vehicle crashed");
    }
}

/// Runs one generation from a fresh population to termination.
pub fn run_generation<P: Policy + Send>(
    track: &Track,
    config: &SimConfig,
    context: GenerationContext,
    policies: &mut [P],
    fitness: &mut [f64],
) -> Result<GenerationReport, SimError> {
    let mut generation = Generation::new(context, config);
    let termination = loop {
        if let RunState::Terminated(t) = generation.step(track, policies, fitness)? {
            break t;
        }
    };
    let report = generation.summarize(termination, fitness);
    log_report(&report);
    Ok(report)
}

pub fn log_report(report: &GenerationReport) {
    if report.termination == Termination::AllCrashed && report.ticks == 1 {
        warn!(generation = report.generation, "Every vehicle crashed on its first tick");
    }
    info!(
        generation = report.generation,
        ticks = report.ticks,
        termination = ?report.termination,
        survivors = report.survivors,
        best_fitness = report.best_fitness,
        "Generation finished"
    );
}
