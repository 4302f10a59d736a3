//! Interaction of the atoms with the cooling and repumping light.
//!
//! The module is split in two groups of systems:
//! * the force systems sample the beam intensity for the step and calculate the
//!   scattering force on each atom, see [force];
//! * the level systems move atoms between hyperfine levels, first through the
//!   repumper ([repump]) and then through the transition table ([transition]).

pub mod force;
pub mod repump;
pub mod transition;

use crate::configuration::MotConfiguration;
use crate::error::Result;
use specs::prelude::*;

pub const SAMPLE_LASER_POWER_SYSTEM_NAME: &str = "sample_laser_power";
pub const SCATTERING_FORCE_SYSTEM_NAME: &str = "calculate_scattering_force";
pub const REPUMP_SYSTEM_NAME: &str = "repump";
pub const LEVEL_TRANSITION_SYSTEM_NAME: &str = "level_transitions";

/// Adds the systems that calculate the scattering force to the dispatcher.
///
/// #Arguments
///
/// `builder`: the dispatch builder to modify
///
/// `deps`: any dependencies that must be completed before the systems run.
pub fn add_force_systems_to_dispatch(
    builder: DispatcherBuilder<'static, 'static>,
    deps: &[&str],
) -> DispatcherBuilder<'static, 'static> {
    builder
        .with(
            force::SampleLaserPowerSystem,
            SAMPLE_LASER_POWER_SYSTEM_NAME,
            deps,
        )
        .with(
            force::CalculateScatteringForceSystem,
            SCATTERING_FORCE_SYSTEM_NAME,
            &[SAMPLE_LASER_POWER_SYSTEM_NAME],
        )
}

/// Adds the systems that update the hyperfine levels to the dispatcher.
///
/// The repumper always runs before the transition table.
pub fn add_level_systems_to_dispatch(
    builder: DispatcherBuilder<'static, 'static>,
    deps: &[&str],
) -> DispatcherBuilder<'static, 'static> {
    builder
        .with(repump::RepumpSystem, REPUMP_SYSTEM_NAME, deps)
        .with(
            transition::LevelTransitionSystem,
            LEVEL_TRANSITION_SYSTEM_NAME,
            &[REPUMP_SYSTEM_NAME],
        )
}

/// Inserts the resources required by the laser cooling systems.
pub fn register_resources(world: &mut World, config: &MotConfiguration) -> Result<()> {
    world.insert(force::ScatteringNoise::new(config)?);
    world.insert(force::CoolingBeamIntensity::default());
    Ok(())
}
