//! Handling of dark states and repumping

use crate::atom::{HyperfineLevel, Velocity};
use crate::configuration::MotConfiguration;
use crate::constant::{BOLTZCONST, TEMPERATURE_FLOOR};
use crate::observables::StepObservables;
use crate::random::SimulationRng;
use rand::Rng;
use specs::prelude::*;

/// Parameters of the repumping light and of the leak into the uncoupled dark level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Repumper {
    /// Intensity of the repumping light, W/m^2.
    pub intensity: f64,
    /// Saturation intensity of the repumped transition, W/m^2.
    pub saturation_intensity: f64,
    /// Dimensionless repumping efficiency.
    pub effect: f64,
    /// Probability per step that a cycling atom leaks into the dark level.
    pub leak_probability: f64,
    /// Mass of the atom, kg.
    pub atom_mass: f64,
}

impl Repumper {
    pub fn from_config(config: &MotConfiguration) -> Self {
        Repumper {
            intensity: config.repumper_intensity,
            saturation_intensity: config.saturation_intensity,
            effect: config.repumper_effect,
            leak_probability: config.dark_leak_probability,
            atom_mass: config.atom_mass,
        }
    }

    /// Probability that an atom of the given velocity is returned from F=1 to F=2 in one step.
    ///
    /// Slow atoms are repumped more efficiently; the velocity acceptance scales with the
    /// thermal velocity of the ensemble. `temperature` is clamped to [TEMPERATURE_FLOOR].
    pub fn promotion_probability(&self, velocity: f64, temperature: f64) -> f64 {
        let temperature = temperature.max(TEMPERATURE_FLOOR);
        self.effect * self.intensity / self.saturation_intensity
            * (-velocity.powi(2) / (2.0 * BOLTZCONST * temperature / self.atom_mass)).exp()
    }

    /// Applies repumping and dark-state leakage to a single atom.
    ///
    /// Two uniform numbers are drawn for every atom: one for promotion, then one for leakage.
    /// Both are tested against the level the atom had before the call.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        level: HyperfineLevel,
        velocity: f64,
        temperature: f64,
        rng: &mut R,
    ) -> HyperfineLevel {
        let promote = rng.gen::<f64>() < self.promotion_probability(velocity, temperature);
        let leak = rng.gen::<f64>() < self.leak_probability;
        match level {
            HyperfineLevel::F1 if promote => HyperfineLevel::F2,
            l if l.is_cycling() && leak => HyperfineLevel::Dark,
            l => l,
        }
    }
}

/// Applies the repumper to a whole ensemble, in order.
///
/// `levels` and `velocities` must be index aligned.
pub fn apply_repumper<R: Rng + ?Sized>(
    repumper: &Repumper,
    levels: &mut [HyperfineLevel],
    velocities: &[f64],
    temperature: f64,
    rng: &mut R,
) {
    for (level, velocity) in levels.iter_mut().zip(velocities.iter()) {
        *level = repumper.apply(*level, *velocity, temperature, rng);
    }
}

/// Repumps atoms from F=1 and lets cycling atoms leak to the dark level.
///
/// Uses the trapped temperature of the current step.
pub struct RepumpSystem;

impl<'a> System<'a> for RepumpSystem {
    type SystemData = (
        ReadExpect<'a, MotConfiguration>,
        ReadExpect<'a, StepObservables>,
        WriteExpect<'a, SimulationRng>,
        ReadStorage<'a, Velocity>,
        WriteStorage<'a, HyperfineLevel>,
    );

    fn run(&mut self, (config, observables, mut rng, velocities, mut levels): Self::SystemData) {
        let repumper = Repumper::from_config(&config);
        for (vel, level) in (&velocities, &mut levels).join() {
            *level = repumper.apply(*level, vel.vel, observables.temperature, &mut *rng);
        }
    }
}
