//! Stochastic transitions between the hyperfine levels.
//!
//! Each entry of the transition table carries a base rate. The probability that an
//! atom in the `from` level makes the transition during one step is
//!
//! `p * exp(-|from - to| * T / k_B) * dt`
//!
//! where `T` is the temperature of the trapped ensemble in that step. This is a
//! first order approximation of the rate equations, valid while the probability per
//! step is small.
//!
//! The table is visited in order and an atom takes at most one transition per step:
//! the first entry that fires wins. When an atom is eligible for several transitions
//! in the same step, table order resolves the conflict instead of a combined rate.

use crate::atom::HyperfineLevel;
use crate::configuration::MotConfiguration;
use crate::constant::BOLTZCONST;
use crate::integrator::Timestep;
use crate::observables::StepObservables;
use crate::random::SimulationRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use specs::prelude::*;

/// An entry of the transition table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelTransition {
    pub from: HyperfineLevel,
    pub to: HyperfineLevel,
    /// Base transition rate, in SI units of 1/s.
    pub probability: f64,
}

impl LevelTransition {
    pub fn new(from: HyperfineLevel, to: HyperfineLevel, probability: f64) -> Self {
        LevelTransition {
            from,
            to,
            probability,
        }
    }

    /// Probability that the transition happens during a step of duration `dt`.
    pub fn step_probability(&self, temperature: f64, dt: f64) -> f64 {
        self.probability
            * (-(self.from.separation(self.to) as f64) * temperature / BOLTZCONST).exp()
            * dt
    }
}

/// Advances the level of a single atom by one step.
///
/// One uniform number is drawn for every table entry visited. Visiting stops at the
/// first transition that fires.
pub fn transition_level<R: Rng + ?Sized>(
    level: HyperfineLevel,
    transitions: &[LevelTransition],
    temperature: f64,
    dt: f64,
    rng: &mut R,
) -> HyperfineLevel {
    for transition in transitions.iter() {
        let roll: f64 = rng.gen();
        if roll < transition.step_probability(temperature, dt) && level == transition.from {
            return transition.to;
        }
    }
    level
}

/// Advances the levels of every atom by one step, in order.
pub fn advance_levels<R: Rng + ?Sized>(
    levels: &mut [HyperfineLevel],
    transitions: &[LevelTransition],
    temperature: f64,
    dt: f64,
    rng: &mut R,
) {
    for level in levels.iter_mut() {
        *level = transition_level(*level, transitions, temperature, dt, rng);
    }
}

/// This system applies the transition table to each atom.
///
/// Uses the trapped temperature of the current step.
pub struct LevelTransitionSystem;

impl<'a> System<'a> for LevelTransitionSystem {
    type SystemData = (
        ReadExpect<'a, MotConfiguration>,
        ReadExpect<'a, Timestep>,
        ReadExpect<'a, StepObservables>,
        WriteExpect<'a, SimulationRng>,
        WriteStorage<'a, HyperfineLevel>,
    );

    fn run(&mut self, (config, timestep, observables, mut rng, mut levels): Self::SystemData) {
        for level in (&mut levels).join() {
            *level = transition_level(
                *level,
                &config.transitions,
                observables.temperature,
                timestep.delta,
                &mut *rng,
            );
        }
    }
}
