//! Configuration of the simulated apparatus and of the simulation batch.
//!
//! [MotConfiguration] holds the physical constants of the trap: the atom, the
//! cooling and repumping light, the beam geometry, the magnitude of technical
//! fluctuations and the table of hyperfine transitions. It is inserted into the
//! world of every run as a read-only resource.
//!
//! [SimulationOptions] holds the batch parameters: how many atoms, for how long,
//! with which timestep, and how many independent runs to average.
//!
//! Both can be loaded from a single YAML or JSON document, see [SimulationConfig].

use crate::constant::{AMU, BOLTZCONST, PI};
use crate::error::{MotError, Result};
use crate::laser_cooling::transition::LevelTransition;
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;

/// Physical parameters of the rubidium-87 MOT.
///
/// The defaults describe the reference apparatus: a 780 nm D2 cooling beam of
/// 9 mm diameter with 1.33 mW per beam, atoms loaded at 360 K.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotConfiguration {
    /// Mass of a single atom, in SI units of kg.
    pub atom_mass: f64,

    /// Wavelength of the cooling laser, in SI units of m.
    pub wavelength: f64,

    /// Natural linewidth of the cooling transition, in SI units of rad/s.
    pub linewidth: f64,

    /// Nominal power of one cooling beam, in SI units of W.
    pub laser_power: f64,

    /// Diameter of the cooling beam, in SI units of m.
    pub beam_diameter: f64,

    /// Saturation intensity of the cooling transition, in SI units of W/m^2.
    pub saturation_intensity: f64,

    /// Temperature of the atoms when they are loaded, in K.
    pub initial_temperature: f64,

    /// Detuning of the cooling light from resonance, in SI units of rad/s.
    pub detuning: f64,

    /// Standard deviation of the relative wavelength fluctuation, drawn per force evaluation.
    pub wavelength_fluctuation: f64,

    /// Standard deviation of the relative laser power fluctuation, drawn once per step.
    pub power_fluctuation: f64,

    /// Standard deviation of the relative fluctuation of the effective (Zeeman) detuning,
    /// drawn per force evaluation.
    pub magnetic_fluctuation: f64,

    /// Intensity of the repumping light, in SI units of W/m^2.
    pub repumper_intensity: f64,

    /// Wavelength of the repumping light, in SI units of m.
    ///
    /// Only recorded for reference; the repumping model depends on intensity and velocity.
    pub repumper_wavelength: f64,

    /// Dimensionless efficiency of the repumper in returning atoms to the cooling cycle.
    pub repumper_effect: f64,

    /// Probability per step that an atom in F=2 or F=3 leaks into the uncoupled dark level.
    pub dark_leak_probability: f64,

    /// Relative weights of the four levels when atoms are loaded,
    /// indexed by [crate::atom::HyperfineLevel::index].
    pub initial_level_weights: [f64; 4],

    /// Ordered table of spontaneous level transitions.
    ///
    /// The order matters: an atom takes the first transition that fires in a step.
    pub transitions: Vec<LevelTransition>,
}

impl Default for MotConfiguration {
    fn default() -> Self {
        MotConfiguration {
            atom_mass: 87.0 * AMU,
            wavelength: 780.241e-9,
            linewidth: 2.0 * PI * 6.07e6,
            laser_power: 8e-3 / 6.0,
            beam_diameter: 9e-3,
            saturation_intensity: 25.0,
            initial_temperature: 360.0,
            detuning: 0.0,
            wavelength_fluctuation: 5e-8,
            power_fluctuation: 0.1,
            magnetic_fluctuation: 0.075,
            repumper_intensity: 1e-3,
            repumper_wavelength: 780.244e-9,
            repumper_effect: 0.6,
            dark_leak_probability: 1e-21,
            initial_level_weights: [0.94, 0.05, 0.009, 0.001],
            transitions: default_transitions(),
        }
    }
}

/// The reference transition table for the four-level model.
pub fn default_transitions() -> Vec<LevelTransition> {
    use crate::atom::HyperfineLevel::*;
    vec![
        LevelTransition::new(F1, F2, 5e-21),
        LevelTransition::new(F2, F3, 0.6),
        LevelTransition::new(F3, Dark, 5e-21),
        LevelTransition::new(F2, F1, 0.2),
        LevelTransition::new(F3, F2, 0.8),
        LevelTransition::new(Dark, F3, 5e-21),
    ]
}

impl MotConfiguration {
    /// Radius of the cooling beam, in SI units of m.
    pub fn beam_radius(&self) -> f64 {
        self.beam_diameter / 2.0
    }

    /// Wavenumber of the unperturbed cooling light, in units of 2pi inverse metres.
    pub fn wavenumber(&self) -> f64 {
        2.0 * PI / self.wavelength
    }

    /// Mean intensity of a beam of the given power over the beam cross section, in W/m^2.
    pub fn beam_intensity(&self, power: f64) -> f64 {
        power / (PI * self.beam_radius().powi(2))
    }

    /// Standard deviation of one velocity component for a thermal ensemble at `temperature`,
    /// in m/s.
    pub fn thermal_velocity_std(&self, temperature: f64) -> f64 {
        (BOLTZCONST * temperature / self.atom_mass).sqrt()
    }

    /// Checks that every parameter is physically meaningful.
    pub fn validate(&self) -> Result<()> {
        require_positive("atom_mass", self.atom_mass)?;
        require_positive("wavelength", self.wavelength)?;
        require_positive("linewidth", self.linewidth)?;
        require_positive("beam_diameter", self.beam_diameter)?;
        require_positive("saturation_intensity", self.saturation_intensity)?;
        require_non_negative("laser_power", self.laser_power)?;
        require_non_negative("initial_temperature", self.initial_temperature)?;
        require_non_negative("wavelength_fluctuation", self.wavelength_fluctuation)?;
        require_non_negative("power_fluctuation", self.power_fluctuation)?;
        require_non_negative("magnetic_fluctuation", self.magnetic_fluctuation)?;
        require_non_negative("repumper_intensity", self.repumper_intensity)?;
        require_non_negative("repumper_effect", self.repumper_effect)?;
        if !self.detuning.is_finite() {
            return Err(MotError::invalid("detuning", "must be finite"));
        }
        if !(0.0..=1.0).contains(&self.dark_leak_probability) {
            return Err(MotError::invalid(
                "dark_leak_probability",
                format!("must lie in [0, 1], got {}", self.dark_leak_probability),
            ));
        }
        if self
            .initial_level_weights
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
            || self.initial_level_weights.iter().sum::<f64>() <= 0.0
        {
            return Err(MotError::invalid(
                "initial_level_weights",
                format!(
                    "must be non-negative with a positive sum, got {:?}",
                    self.initial_level_weights
                ),
            ));
        }
        for transition in self.transitions.iter() {
            if !transition.probability.is_finite() || transition.probability < 0.0 {
                return Err(MotError::invalid(
                    "transitions",
                    format!(
                        "probability of {:?} -> {:?} must be non-negative, got {}",
                        transition.from, transition.to, transition.probability
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn require_positive(parameter: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MotError::invalid(
            parameter,
            format!("must be positive and finite, got {}", value),
        ))
    }
}

pub(crate) fn require_non_negative(parameter: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(MotError::invalid(
            parameter,
            format!("must be non-negative and finite, got {}", value),
        ))
    }
}

/// Parameters of a simulation batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationOptions {
    /// Number of atoms in each run.
    pub n_atoms: usize,

    /// Simulated duration of each run, in SI units of s.
    pub time_max: f64,

    /// Duration of the integration timestep, in SI units of s.
    pub dt: f64,

    /// Number of independent runs that are averaged.
    pub n_simulations: usize,

    /// Number of steps between recorded position and velocity arrays.
    ///
    /// Scalar observables are recorded every step regardless.
    pub snapshot_interval: usize,

    /// Master seed from which the seed of every run is derived. Drawn from entropy if absent.
    pub seed: Option<u64>,
}

/// Largest number of integration steps a single run may take.
pub const MAX_STEPS: usize = 100_000_000;

impl Default for SimulationOptions {
    fn default() -> Self {
        SimulationOptions {
            n_atoms: 100,
            time_max: 1.0,
            dt: 1e-4,
            n_simulations: 3,
            snapshot_interval: 1,
            seed: None,
        }
    }
}

impl SimulationOptions {
    /// Checks the batch parameters before any run starts.
    pub fn validate(&self) -> Result<()> {
        if self.n_atoms == 0 {
            return Err(MotError::invalid("n_atoms", "must be at least 1"));
        }
        if self.n_simulations == 0 {
            return Err(MotError::invalid("n_simulations", "must be at least 1"));
        }
        if self.snapshot_interval == 0 {
            return Err(MotError::invalid("snapshot_interval", "must be at least 1"));
        }
        require_positive("time_max", self.time_max)?;
        require_positive("dt", self.dt)?;
        if self.time_max / self.dt > MAX_STEPS as f64 {
            return Err(MotError::invalid(
                "time_max",
                format!(
                    "spans {:e} steps of {} s, more than the limit of {}",
                    self.time_max / self.dt,
                    self.dt,
                    MAX_STEPS
                ),
            ));
        }
        Ok(())
    }

    /// Number of integration steps covering `[0, time_max)`.
    ///
    /// A ratio within rounding error of an integer counts as that integer.
    pub fn n_steps(&self) -> usize {
        let ratio = self.time_max / self.dt;
        let nearest = ratio.round();
        if (ratio - nearest).abs() <= 1e-9 * nearest.max(1.0) {
            nearest as usize
        } else {
            ratio.ceil() as usize
        }
    }

    /// Simulation time at the start of each step, in s.
    pub fn times(&self) -> Vec<f64> {
        (0..self.n_steps()).map(|i| i as f64 * self.dt).collect()
    }
}

/// A complete simulation configuration document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub options: SimulationOptions,
    pub physics: MotConfiguration,
}

impl SimulationConfig {
    /// Loads a configuration document from file.
    ///
    /// Files with a `.json` extension are parsed as JSON, anything else as YAML.
    /// Missing fields take their default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path).map_err(|source| MotError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            serde_json::from_str(&contents).map_err(|source| MotError::JsonParse {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_yaml::from_str(&contents).map_err(|source| MotError::YamlParse {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.options.validate()?;
        self.physics.validate()
    }
}
