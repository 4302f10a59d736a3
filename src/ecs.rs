//! Assembly of the simulation world and of the per-step dispatcher.

use crate::atom::{self, ClearForceSystem};
use crate::configuration::MotConfiguration;
use crate::error::Result;
use crate::integrator::{SemiImplicitEulerSystem, Step, Timestep};
use crate::laser_cooling;
use crate::observables::{
    MeasureLevelPopulationsSystem, MeasureLevelVelocitiesSystem, MeasureTrappedTemperatureSystem,
    StepObservables,
};
use crate::random::SimulationRng;
use specs::prelude::*;

pub const CLEAR_FORCE_SYSTEM_NAME: &str = "clear_force";
pub const INTEGRATE_SYSTEM_NAME: &str = "semi_implicit_euler";
pub const MEASURE_LEVEL_VELOCITIES_SYSTEM_NAME: &str = "measure_level_velocities";
pub const MEASURE_TEMPERATURE_SYSTEM_NAME: &str = "measure_trapped_temperature";
pub const MEASURE_LEVEL_POPULATIONS_SYSTEM_NAME: &str = "measure_level_populations";

/// Registers all components used by the modules of the program.
pub fn register_components(world: &mut World) {
    atom::register_components(world);
}

/// Add resources to the world
pub fn register_resources(
    world: &mut World,
    config: &MotConfiguration,
    dt: f64,
    rng: SimulationRng,
) -> Result<()> {
    world.insert(config.clone());
    world.insert(Timestep { delta: dt });
    world.insert(Step::default());
    world.insert(StepObservables::default());
    world.insert(rng);
    laser_cooling::register_resources(world, config)
}

/// Creates a `DispatcherBuilder` for one simulation step.
///
/// Every step runs, in order: force clearing, laser power sampling, scattering force,
/// semi-implicit Euler integration, level velocity and trapped temperature measurement,
/// repumping, level transitions and level population measurement.
pub fn create_simulation_dispatcher_builder() -> DispatcherBuilder<'static, 'static> {
    let mut builder = DispatcherBuilder::new();
    builder = builder.with(ClearForceSystem, CLEAR_FORCE_SYSTEM_NAME, &[]);
    builder = laser_cooling::add_force_systems_to_dispatch(builder, &[CLEAR_FORCE_SYSTEM_NAME]);
    builder = builder.with(
        SemiImplicitEulerSystem,
        INTEGRATE_SYSTEM_NAME,
        &[laser_cooling::SCATTERING_FORCE_SYSTEM_NAME],
    );
    builder = builder.with(
        MeasureLevelVelocitiesSystem,
        MEASURE_LEVEL_VELOCITIES_SYSTEM_NAME,
        &[INTEGRATE_SYSTEM_NAME],
    );
    builder = builder.with(
        MeasureTrappedTemperatureSystem,
        MEASURE_TEMPERATURE_SYSTEM_NAME,
        &[MEASURE_LEVEL_VELOCITIES_SYSTEM_NAME],
    );
    builder = laser_cooling::add_level_systems_to_dispatch(
        builder,
        &[MEASURE_TEMPERATURE_SYSTEM_NAME],
    );
    builder.with(
        MeasureLevelPopulationsSystem,
        MEASURE_LEVEL_POPULATIONS_SYSTEM_NAME,
        &[laser_cooling::LEVEL_TRANSITION_SYSTEM_NAME],
    )
}

/// Creates a `Dispatcher` that can be used to calculate each simulation step.
pub fn create_simulation_dispatcher() -> Dispatcher<'static, 'static> {
    create_simulation_dispatcher_builder().build()
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::atom::HyperfineLevel::*;
    use crate::atom::{Atom, Force, HyperfineLevel, Position, Velocity};
    use crate::laser_cooling::transition::LevelTransition;
    use nalgebra::Vector4;

    #[test]
    fn test_level_systems_run_in_order() {
        // the repumper moves the atom F1 -> F2, then the table moves it F2 -> F3
        let config = MotConfiguration {
            laser_power: 0.0,
            repumper_intensity: 25.0,
            saturation_intensity: 25.0,
            repumper_effect: 1.0,
            dark_leak_probability: 0.0,
            transitions: vec![LevelTransition::new(F2, F3, 1.0)],
            ..Default::default()
        };
        let mut test_world = World::new();
        register_components(&mut test_world);
        register_resources(&mut test_world, &config, 1.0, SimulationRng::from_seed(3))
            .expect("invalid configuration");
        let mut dispatcher = create_simulation_dispatcher();
        dispatcher.setup(&mut test_world);

        let atom = test_world
            .create_entity()
            .with(Atom)
            .with(Position { pos: 0.0 })
            .with(Velocity { vel: 0.0 })
            .with(F1)
            .with(Force::default())
            .build();

        dispatcher.dispatch_seq(&test_world);
        test_world.maintain();

        let levels = test_world.read_storage::<HyperfineLevel>();
        assert_eq!(*levels.get(atom).expect("entity not found"), F3);

        let observables = test_world.read_resource::<StepObservables>();
        assert_eq!(observables.temperature, 0.0);
        assert_eq!(observables.level_velocities.get(F1), Some(0.0));
        assert_eq!(observables.level_velocities.get(F3), None);
        assert_eq!(
            observables.level_populations,
            Vector4::new(0.0, 0.0, 1.0, 0.0)
        );
        assert_eq!(test_world.read_resource::<Step>().n, 1);
    }
}
