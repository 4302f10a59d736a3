//! The explicit random source used by a simulation run.
//!
//! Every run owns one [SimulationRng] resource, and every stochastic system draws
//! from it in a fixed order. Two runs created from the same seed therefore produce
//! identical results, and independent runs can execute on different threads.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Seedable random number generator owned by a single simulation run.
pub struct SimulationRng {
    rng: StdRng,
}

impl SimulationRng {
    pub fn from_seed(seed: u64) -> Self {
        SimulationRng {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RngCore for SimulationRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

/// Derives the seed of each run in a batch from a single master seed.
pub fn derive_run_seeds(master_seed: u64, n_runs: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(master_seed);
    (0..n_runs).map(|_| rng.gen()).collect()
}
