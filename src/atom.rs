//! Components that describe the state of each atom.

use serde::{Deserialize, Serialize};
use specs::prelude::*;
use std::fmt;

/// Radial offset of an atom from the beam axis.
///
/// SI units (metres)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, Component)]
#[storage(VecStorage)]
pub struct Position {
    pub pos: f64,
}

/// Radial velocity of an atom.
///
/// SI units (metres/second)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, Component)]
#[storage(VecStorage)]
pub struct Velocity {
    pub vel: f64,
}

/// Radial force acting on an atom during the current step.
///
/// SI units (Newtons)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, Component)]
#[storage(VecStorage)]
pub struct Force {
    pub force: f64,
}

/// A marker component that indicates an entity is an atom.
#[derive(Clone, Copy, Debug, Default, Component)]
#[storage(NullStorage)]
pub struct Atom;

/// Number of internal levels in the model.
pub const LEVEL_COUNT: usize = 4;

/// The internal hyperfine level occupied by an atom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Component)]
#[storage(VecStorage)]
pub enum HyperfineLevel {
    /// Ground state F=1, dark to the cooling light until repumped.
    F1,
    /// Ground state F=2, the lower level of the cooling cycle.
    F2,
    /// Excited state F'=3, the upper level of the cooling cycle.
    F3,
    /// Fully uncoupled level reached by off-resonant scattering.
    Dark,
}

impl HyperfineLevel {
    pub const ALL: [HyperfineLevel; LEVEL_COUNT] = [
        HyperfineLevel::F1,
        HyperfineLevel::F2,
        HyperfineLevel::F3,
        HyperfineLevel::Dark,
    ];

    /// Position of the level in the ladder, from 0 (F=1) to 3 (dark).
    pub fn index(self) -> usize {
        match self {
            HyperfineLevel::F1 => 0,
            HyperfineLevel::F2 => 1,
            HyperfineLevel::F3 => 2,
            HyperfineLevel::Dark => 3,
        }
    }

    /// Number of rungs separating two levels in the ladder.
    pub fn separation(self, other: HyperfineLevel) -> usize {
        (self.index() as isize - other.index() as isize).abs() as usize
    }

    /// True for the two levels that take part in the cooling cycle.
    pub fn is_cycling(self) -> bool {
        matches!(self, HyperfineLevel::F2 | HyperfineLevel::F3)
    }
}

impl fmt::Display for HyperfineLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HyperfineLevel::F1 => "F=1",
            HyperfineLevel::F2 => "F=2",
            HyperfineLevel::F3 => "F'=3",
            HyperfineLevel::Dark => "dark",
        };
        f.write_str(name)
    }
}

/// This system resets the force on every atom at the start of each step.
pub struct ClearForceSystem;

impl<'a> System<'a> for ClearForceSystem {
    type SystemData = WriteStorage<'a, Force>;

    fn run(&mut self, mut forces: Self::SystemData) {
        for force in (&mut forces).join() {
            force.force = 0.0;
        }
    }
}

pub fn register_components(world: &mut World) {
    world.register::<Atom>();
    world.register::<Position>();
    world.register::<Velocity>();
    world.register::<Force>();
    world.register::<HyperfineLevel>();
}
