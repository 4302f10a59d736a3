//! Physical and mathematical constants, in SI units.

/// Reduced plank constant in SI units
pub const HBAR: f64 = 1.054_571_817e-34;

/// Mathematica constant pi
pub const PI: f64 = std::f64::consts::PI;

/// Boltzmann constant in SI units
pub const BOLTZCONST: f64 = 1.380_649e-23;

/// The value of 1 Atomic Mass Unit (amu) in SI units of kg, as used for the trapped species.
pub const AMU: f64 = 1.66e-27;

/// Lower bound applied to ensemble temperatures before they are used as a denominator, in K.
pub const TEMPERATURE_FLOOR: f64 = 1e-12;
