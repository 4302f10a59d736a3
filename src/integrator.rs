//! Implements systems to integrate trajectories.

use crate::atom::{Force, Position, Velocity};
use crate::configuration::MotConfiguration;
use specs::prelude::*;

/// Tracks the number of the current integration step.
#[derive(Clone, Copy, Debug, Default)]
pub struct Step {
    pub n: u64,
}

/// The timestep used for the integration.
///
/// The atoms cross the beam in a few hundred microseconds at loading temperature,
/// so the timestep should be well below that to resolve their motion through the
/// gaussian intensity profile.
#[derive(Clone, Copy, Debug)]
pub struct Timestep {
    /// Duration of the simulation timestep, in SI units of seconds.
    pub delta: f64,
}
impl Default for Timestep {
    fn default() -> Self {
        Timestep { delta: 1.0e-4 }
    }
}

/// Integrates velocity and then position with a semi-implicit Euler scheme.
///
/// The velocity is updated first from the force of this step, and the position is then
/// advanced with the new velocity:
///
/// `v += F / m * dt`
///
/// `x += v * dt`
pub struct SemiImplicitEulerSystem;

impl<'a> System<'a> for SemiImplicitEulerSystem {
    type SystemData = (
        ReadExpect<'a, MotConfiguration>,
        ReadExpect<'a, Timestep>,
        WriteExpect<'a, Step>,
        WriteStorage<'a, Position>,
        WriteStorage<'a, Velocity>,
        ReadStorage<'a, Force>,
    );

    fn run(
        &mut self,
        (config, timestep, mut step, mut positions, mut velocities, forces): Self::SystemData,
    ) {
        step.n += 1;
        let dt = timestep.delta;
        let mass = config.atom_mass;
        for (pos, vel, force) in (&mut positions, &mut velocities, &forces).join() {
            vel.vel += force.force / mass * dt;
            pos.pos += vel.vel * dt;
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::atom;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_semi_implicit_euler_step() {
        let mut test_world = World::new();
        atom::register_components(&mut test_world);
        let config = MotConfiguration {
            atom_mass: 2.0,
            ..Default::default()
        };
        test_world.insert(config);
        test_world.insert(Timestep { delta: 0.5 });
        test_world.insert(Step::default());

        let atom1 = test_world
            .create_entity()
            .with(Position { pos: 1.0 })
            .with(Velocity { vel: 1.0 })
            .with(Force { force: 4.0 })
            .build();

        SemiImplicitEulerSystem.run_now(&test_world);

        // v = 1 + 4 / 2 * 0.5 = 2, then x = 1 + 2 * 0.5 = 2
        let velocities = test_world.read_storage::<Velocity>();
        let positions = test_world.read_storage::<Position>();
        assert_eq!(velocities.get(atom1).expect("entity not found").vel, 2.0);
        assert_eq!(positions.get(atom1).expect("entity not found").pos, 2.0);
        assert_eq!(test_world.read_resource::<Step>().n, 1);
    }

    #[test]
    fn test_constant_force_integration() {
        let mut test_world = World::new();
        atom::register_components(&mut test_world);
        test_world.insert(MotConfiguration {
            atom_mass: 1.0,
            ..Default::default()
        });
        let dt = 1.0e-3;
        test_world.insert(Timestep { delta: dt });
        test_world.insert(Step::default());

        let force = 1.0;
        let test_entity = test_world
            .create_entity()
            .with(Position { pos: 0.0 })
            .with(Velocity { vel: 0.0 })
            .with(Force { force })
            .build();

        let n_steps = 1_000;
        let mut system = SemiImplicitEulerSystem;
        for _ in 0..n_steps {
            system.run_now(&test_world);
        }

        let t = n_steps as f64 * dt;
        let velocities = test_world.read_storage::<Velocity>();
        let positions = test_world.read_storage::<Position>();
        assert_approx_eq!(
            velocities.get(test_entity).expect("entity not found").vel,
            force * t,
            1e-9
        );
        assert_approx_eq!(
            positions.get(test_entity).expect("entity not found").pos,
            force * t * t / 2.0,
            force * t * t / 2.0 * 0.01
        );
    }
}
