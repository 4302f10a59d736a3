//! Per-step observables of the atomic ensemble.
//!
//! Three quantities are measured every step and stored in the [StepObservables] resource:
//! * the mean velocity of the atoms in each level, measured after the kinematics are integrated;
//! * the temperature of the trapped atoms, which also drives the repumper and level transitions;
//! * the fraction of atoms in each level, measured once the levels have been updated.

use crate::atom::{Atom, HyperfineLevel, Position, Velocity, LEVEL_COUNT};
use crate::configuration::MotConfiguration;
use crate::constant::BOLTZCONST;
use nalgebra::Vector4;
use serde::{Deserialize, Serialize};
use specs::prelude::*;

/// Fraction of the atoms in each level, indexed by [HyperfineLevel::index].
pub type LevelPopulations = Vector4<f64>;

/// Mean velocity of the atoms in each level, indexed by [HyperfineLevel::index].
///
/// An entry is `None` when the level holds no atoms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelVelocities(pub [Option<f64>; LEVEL_COUNT]);

impl LevelVelocities {
    pub fn get(&self, level: HyperfineLevel) -> Option<f64> {
        self.0[level.index()]
    }
}

/// Observables of the current step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepObservables {
    /// Temperature of the trapped atoms, in K.
    pub temperature: f64,
    pub level_velocities: LevelVelocities,
    pub level_populations: LevelPopulations,
}

impl Default for StepObservables {
    fn default() -> Self {
        StepObservables {
            temperature: 0.0,
            level_velocities: LevelVelocities::default(),
            level_populations: Vector4::zeros(),
        }
    }
}

/// Calculates the temperature of the atoms that lie inside the beam.
///
/// The temperature is `mean(m v^2) / k_B` over atoms with `|x| < beam_radius`.
/// It is exactly zero when no atom is trapped.
pub fn trapped_temperature<I>(atoms: I, beam_radius: f64, atom_mass: f64) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut count = 0usize;
    let mut sum = 0.0;
    for (position, velocity) in atoms {
        if position.abs() < beam_radius {
            count += 1;
            sum += atom_mass * velocity.powi(2);
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64 / BOLTZCONST
    }
}

/// Calculates the mean velocity of the atoms in each level.
pub fn level_mean_velocities<I>(atoms: I) -> LevelVelocities
where
    I: IntoIterator<Item = (HyperfineLevel, f64)>,
{
    let mut sums = [0.0; LEVEL_COUNT];
    let mut counts = [0usize; LEVEL_COUNT];
    for (level, velocity) in atoms {
        sums[level.index()] += velocity;
        counts[level.index()] += 1;
    }
    let mut means = [None; LEVEL_COUNT];
    for i in 0..LEVEL_COUNT {
        if counts[i] > 0 {
            means[i] = Some(sums[i] / counts[i] as f64);
        }
    }
    LevelVelocities(means)
}

/// Calculates the fraction of atoms in each level.
///
/// Returns all zeros for an empty ensemble.
pub fn level_populations<I>(levels: I) -> LevelPopulations
where
    I: IntoIterator<Item = HyperfineLevel>,
{
    let mut counts = Vector4::<f64>::zeros();
    let mut total = 0usize;
    for level in levels {
        counts[level.index()] += 1.0;
        total += 1;
    }
    if total == 0 {
        counts
    } else {
        counts / total as f64
    }
}

/// Measures the mean velocity of each level.
pub struct MeasureLevelVelocitiesSystem;

impl<'a> System<'a> for MeasureLevelVelocitiesSystem {
    type SystemData = (
        ReadStorage<'a, HyperfineLevel>,
        ReadStorage<'a, Velocity>,
        WriteExpect<'a, StepObservables>,
    );

    fn run(&mut self, (levels, velocities, mut observables): Self::SystemData) {
        observables.level_velocities =
            level_mean_velocities((&levels, &velocities).join().map(|(l, v)| (*l, v.vel)));
    }
}

/// Measures the temperature of the trapped atoms.
pub struct MeasureTrappedTemperatureSystem;

impl<'a> System<'a> for MeasureTrappedTemperatureSystem {
    type SystemData = (
        ReadExpect<'a, MotConfiguration>,
        ReadStorage<'a, Position>,
        ReadStorage<'a, Velocity>,
        WriteExpect<'a, StepObservables>,
    );

    fn run(&mut self, (config, positions, velocities, mut observables): Self::SystemData) {
        observables.temperature = trapped_temperature(
            (&positions, &velocities).join().map(|(p, v)| (p.pos, v.vel)),
            config.beam_radius(),
            config.atom_mass,
        );
    }
}

/// Measures the fraction of atoms in each level.
pub struct MeasureLevelPopulationsSystem;

impl<'a> System<'a> for MeasureLevelPopulationsSystem {
    type SystemData = (
        ReadStorage<'a, Atom>,
        ReadStorage<'a, HyperfineLevel>,
        WriteExpect<'a, StepObservables>,
    );

    fn run(&mut self, (atoms, levels, mut observables): Self::SystemData) {
        observables.level_populations =
            level_populations((&atoms, &levels).join().map(|(_, l)| *l));
    }
}
