//! Calculation of the radiation pressure exerted on the atoms by the cooling beam.

use crate::atom::{Force, Position, Velocity};
use crate::configuration::{require_non_negative, MotConfiguration};
use crate::constant::HBAR;
use crate::error::{MotError, Result};
use crate::random::SimulationRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use specs::prelude::*;

/// Distributions of the technical noise that perturbs the cooling light.
///
/// All three are relative perturbations with zero mean.
pub struct ScatteringNoise {
    /// Relative wavelength fluctuation, sampled for every force evaluation.
    pub wavelength: Normal<f64>,
    /// Relative fluctuation of the effective detuning due to magnetic field noise,
    /// sampled for every force evaluation.
    pub detuning: Normal<f64>,
    /// Relative fluctuation of the laser power, sampled once per step.
    pub power: Normal<f64>,
}

impl ScatteringNoise {
    pub fn new(config: &MotConfiguration) -> Result<Self> {
        let normal = |parameter: &'static str, std: f64| {
            require_non_negative(parameter, std)?;
            Normal::new(0.0, std).map_err(|err| MotError::invalid(parameter, err.to_string()))
        };
        Ok(ScatteringNoise {
            wavelength: normal("wavelength_fluctuation", config.wavelength_fluctuation)?,
            detuning: normal("magnetic_fluctuation", config.magnetic_fluctuation)?,
            power: normal("power_fluctuation", config.power_fluctuation)?,
        })
    }
}

/// Calculates the Doppler scattering force on a single atom.
///
/// The wavelength and the effective detuning are perturbed by fresh draws from `noise`,
/// wavelength first. The intensity seen by the atom follows the radial gaussian profile
/// of the beam, while the saturation parameter is taken from the peak intensity.
///
/// # Arguments
///
/// `velocity`: velocity of the atom along the beam, m/s.
///
/// `detuning`: nominal detuning of the cooling light, rad/s.
///
/// `intensity`: peak intensity of the beam, W/m^2.
///
/// `radial_position`: distance of the atom from the beam axis, m.
pub fn scattering_force<R: Rng + ?Sized>(
    config: &MotConfiguration,
    noise: &ScatteringNoise,
    rng: &mut R,
    velocity: f64,
    detuning: f64,
    intensity: f64,
    radial_position: f64,
) -> f64 {
    let wavenumber = config.wavenumber() / (1.0 + noise.wavelength.sample(rng));
    let s = intensity / config.saturation_intensity;
    let effective_detuning = detuning * (1.0 + noise.detuning.sample(rng));
    let local_intensity = intensity * (-(radial_position / config.beam_radius()).powi(2)).exp();

    let gamma = config.linewidth;
    let doppler_detuning = effective_detuning - wavenumber * velocity;
    HBAR * wavenumber * local_intensity * gamma
        / (2.0 * (1.0 + s + 4.0 * doppler_detuning.powi(2) / gamma.powi(2)))
}

/// The peak intensity of the cooling beam during the current step, in W/m^2.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoolingBeamIntensity {
    pub intensity: f64,
}

/// Samples the laser power for this step and stores the resulting beam intensity.
pub struct SampleLaserPowerSystem;

impl<'a> System<'a> for SampleLaserPowerSystem {
    type SystemData = (
        ReadExpect<'a, MotConfiguration>,
        ReadExpect<'a, ScatteringNoise>,
        WriteExpect<'a, SimulationRng>,
        WriteExpect<'a, CoolingBeamIntensity>,
    );

    fn run(&mut self, (config, noise, mut rng, mut beam): Self::SystemData) {
        let power = config.laser_power * (1.0 + noise.power.sample(&mut *rng));
        beam.intensity = config.beam_intensity(power);
    }
}

/// This system adds the scattering force of the cooling beam to each atom.
///
/// Atoms are visited in entity order, so that the noise draws are reproducible for a given seed.
pub struct CalculateScatteringForceSystem;

impl<'a> System<'a> for CalculateScatteringForceSystem {
    type SystemData = (
        ReadExpect<'a, MotConfiguration>,
        ReadExpect<'a, ScatteringNoise>,
        ReadExpect<'a, CoolingBeamIntensity>,
        WriteExpect<'a, SimulationRng>,
        ReadStorage<'a, Position>,
        ReadStorage<'a, Velocity>,
        WriteStorage<'a, Force>,
    );

    fn run(
        &mut self,
        (config, noise, beam, mut rng, positions, velocities, mut forces): Self::SystemData,
    ) {
        for (pos, vel, force) in (&positions, &velocities, &mut forces).join() {
            force.force += scattering_force(
                &config,
                &noise,
                &mut *rng,
                vel.vel,
                config.detuning,
                beam.intensity,
                pos.pos,
            );
        }
    }
}
