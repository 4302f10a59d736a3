//! Loading of the atomic ensemble at the start of a run.
//!
//! Atoms are loaded from a thermal cloud at [MotConfiguration::initial_temperature]:
//! * velocities are gaussian with variance `k_B T0 / m`;
//! * positions are uniform across the beam diameter;
//! * levels are drawn from [MotConfiguration::initial_level_weights].
//!
//! The draws for one atom are taken together, in the order velocity, position, level.

use crate::atom::{Atom, Force, HyperfineLevel, Position, Velocity};
use crate::configuration::{require_non_negative, MotConfiguration};
use crate::error::{MotError, Result};
use crate::random::SimulationRng;
use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use specs::prelude::*;

/// Samples the initial state of single atoms.
pub struct AtomLoader {
    velocity: Normal<f64>,
    levels: WeightedIndex<f64>,
    beam_radius: f64,
}

impl AtomLoader {
    pub fn new(config: &MotConfiguration) -> Result<Self> {
        require_non_negative("initial_temperature", config.initial_temperature)?;
        let velocity = Normal::new(0.0, config.thermal_velocity_std(config.initial_temperature))
            .map_err(|err| MotError::invalid("initial_temperature", err.to_string()))?;
        let levels = WeightedIndex::new(config.initial_level_weights.iter().copied())
            .map_err(|err| MotError::invalid("initial_level_weights", err.to_string()))?;
        Ok(AtomLoader {
            velocity,
            levels,
            beam_radius: config.beam_radius(),
        })
    }

    /// Draws the velocity, position and level of one atom.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (Velocity, Position, HyperfineLevel) {
        let vel = self.velocity.sample(rng);
        let pos = rng.gen_range(-self.beam_radius..self.beam_radius);
        let level = HyperfineLevel::ALL[self.levels.sample(rng)];
        (Velocity { vel }, Position { pos }, level)
    }
}

/// Creates `n_atoms` atoms in the world, drawing from the world's [SimulationRng].
///
/// The world must hold a [MotConfiguration] and a [SimulationRng] resource.
pub fn create_atoms(world: &mut World, n_atoms: usize) -> Result<Vec<Entity>> {
    let loader = AtomLoader::new(&world.read_resource::<MotConfiguration>())?;
    let mut entities = Vec::with_capacity(n_atoms);
    for _ in 0..n_atoms {
        let (velocity, position, level) = {
            let mut rng = world.write_resource::<SimulationRng>();
            loader.sample(&mut *rng)
        };
        let entity = world
            .create_entity()
            .with(Atom)
            .with(position)
            .with(velocity)
            .with(level)
            .with(Force::default())
            .build();
        entities.push(entity);
    }
    Ok(entities)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::atom;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_initial_distributions() {
        let config = MotConfiguration::default();
        let loader = AtomLoader::new(&config).expect("invalid loader");
        let mut rng = SimulationRng::from_seed(41);

        let n = 20_000;
        let mut velocities = Vec::with_capacity(n);
        let mut counts = [0usize; 4];
        for _ in 0..n {
            let (vel, pos, level) = loader.sample(&mut rng);
            assert!(pos.pos >= -config.beam_radius() && pos.pos < config.beam_radius());
            velocities.push(vel.vel);
            counts[level.index()] += 1;
        }

        let mean = velocities.iter().sum::<f64>() / n as f64;
        let variance = velocities.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        let expected_std = config.thermal_velocity_std(config.initial_temperature);
        assert_approx_eq!(mean, 0.0, 5.0 * expected_std / (n as f64).sqrt());
        assert_approx_eq!(variance.sqrt(), expected_std, 0.03 * expected_std);

        let f1_fraction = counts[0] as f64 / n as f64;
        assert_approx_eq!(f1_fraction, 0.94, 0.01);
        assert!(counts[1] > counts[2]);
    }

    #[test]
    fn test_create_atoms() {
        let mut test_world = World::new();
        atom::register_components(&mut test_world);
        test_world.insert(MotConfiguration::default());
        test_world.insert(SimulationRng::from_seed(43));

        let entities = create_atoms(&mut test_world, 10).expect("could not create atoms");
        assert_eq!(entities.len(), 10);
        let atoms = test_world.read_storage::<Atom>();
        let levels = test_world.read_storage::<HyperfineLevel>();
        let forces = test_world.read_storage::<Force>();
        assert_eq!((&atoms, &levels, &forces).join().count(), 10);
    }

    #[test]
    fn test_negative_temperature_rejected() {
        let config = MotConfiguration {
            initial_temperature: -1.0,
            ..Default::default()
        };
        match AtomLoader::new(&config) {
            Err(MotError::InvalidConfiguration { parameter, .. }) => {
                assert_eq!(parameter, "initial_temperature")
            }
            _ => panic!("expected invalid configuration"),
        }
    }

    #[test]
    fn test_single_level_loading() {
        let config = MotConfiguration {
            initial_level_weights: [0.0, 0.0, 1.0, 0.0],
            ..Default::default()
        };
        let loader = AtomLoader::new(&config).expect("invalid loader");
        let mut rng = SimulationRng::from_seed(47);
        for _ in 0..100 {
            assert_eq!(loader.sample(&mut rng).2, HyperfineLevel::F3);
        }
    }
}
