//! Reporting of the simulation, to the console and to files.

pub mod console_output;
pub mod file_output;
