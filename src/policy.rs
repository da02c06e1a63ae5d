//! Decision interface between the simulation and whatever drives the vehicles.

use crate::config::{MIN_SPEED, SPEED_STEP, TURN_STEP};
use crate::error::SimError;
use crate::kinematics::Motion;
use crate::sensor::SensorReadings;

/// Number of outputs a policy must produce.
pub const ACTION_COUNT: usize = 4;

/// Maps quantized sensor readings to one score per action.
pub trait Policy {
    fn activate(&mut self, inputs: &SensorReadings) -> Vec<f64>;
}

impl<F> Policy for F
where
    F: FnMut(&SensorReadings) -> Vec<f64>,
{
    fn activate(&mut self, inputs: &SensorReadings) -> Vec<f64> {
        self(inputs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TurnLeft,
    TurnRight,
    Decelerate,
    Accelerate,
}

impl Action {
    /// Index 3 and anything past it accelerate.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Action::TurnLeft,
            1 => Action::TurnRight,
            2 => Action::Decelerate,
            _ => Action::Accelerate,
        }
    }

    pub fn apply(self, motion: &mut Motion) {
        match self {
            Action::TurnLeft => motion.heading += TURN_STEP,
            Action::TurnRight => motion.heading -= TURN_STEP,
            Action::Decelerate => {
                if motion.speed - SPEED_STEP >= MIN_SPEED {
                    motion.speed -= SPEED_STEP;
                }
            }
            Action::Accelerate => motion.speed += SPEED_STEP,
        }
    }
}

/// Index of the largest output; the first one wins a tie.
pub fn argmax(outputs: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in outputs.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Validates a policy's outputs for `agent` and picks the action.
pub fn select_action(agent: usize, outputs: &[f64]) -> Result<Action, SimError> {
    if outputs.len() < ACTION_COUNT {
        return Err(SimError::PolicyOutput { agent, len: outputs.len(), expected: ACTION_COUNT });
    }
    if outputs.iter().any(|v| v.is_nan()) {
        return Err(SimError::NonFiniteOutput { agent });
    }
    argmax(outputs)
        .map(Action::from_index)
        .ok_or(SimError::PolicyOutput { agent, len: 0, expected: ACTION_COUNT })
}
