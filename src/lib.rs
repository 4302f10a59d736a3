#[macro_use]
extern crate specs_derive;
pub mod atom;
pub mod averager;
pub mod configuration;
pub mod constant;
pub mod ecs;
pub mod ensemble;
pub mod error;
pub mod initiate;
pub mod integrator;
pub mod laser_cooling;
pub mod observables;
pub mod output;
pub mod random;

#[cfg(test)]
pub mod integration_tests;
