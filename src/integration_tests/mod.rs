//! Scenario tests exercising the full simulation pipeline.

pub mod mot_cooling;
