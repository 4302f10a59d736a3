//! Repeats the integration and averages the recorded time series.
//!
//! Each run is seeded from [derive_run_seeds], so the averaged result depends only on the
//! master seed and not on whether the runs were executed in parallel.

use crate::configuration::{MotConfiguration, SimulationOptions};
use crate::ensemble::{EnsembleIntegrator, TimeSeries};
use crate::error::{MotError, Result};
use crate::observables::LevelVelocities;
use crate::output::console_output::{NoProgress, ProgressObserver};
use crate::random::{derive_run_seeds, SimulationRng};
use log::info;
use rayon::prelude::*;
use std::time::Instant;

/// The elementwise mean of the time series of several runs.
#[derive(Clone, Debug, PartialEq)]
pub struct EnsembleAverageResult {
    /// Number of runs that were averaged.
    pub n_simulations: usize,
    pub series: TimeSeries,
}

impl EnsembleAverageResult {
    pub fn times(&self) -> &[f64] {
        &self.series.times
    }

    /// Averaged trapped temperature at the end of the runs.
    pub fn final_temperature(&self) -> Option<f64> {
        self.series.final_temperature()
    }
}

/// Runs the [EnsembleIntegrator] `n_simulations` times and averages the results.
pub struct MultiRunAverager {
    integrator: EnsembleIntegrator,
    n_simulations: usize,
    /// Whether runs are distributed over the rayon thread pool.
    pub parallel: bool,
}

impl MultiRunAverager {
    pub fn new(config: MotConfiguration, options: SimulationOptions) -> Result<Self> {
        let n_simulations = options.n_simulations;
        let integrator = EnsembleIntegrator::new(config, options)?;
        Ok(MultiRunAverager {
            integrator,
            n_simulations,
            parallel: true,
        })
    }

    pub fn integrator(&self) -> &EnsembleIntegrator {
        &self.integrator
    }

    /// Performs all runs from `master_seed` and averages them.
    pub fn run(&self, master_seed: u64) -> Result<EnsembleAverageResult> {
        self.run_with_progress(master_seed, &NoProgress)
    }

    /// As [MultiRunAverager::run], reporting the progress of every run to `progress`.
    ///
    /// The first failing run aborts the average.
    pub fn run_with_progress(
        &self,
        master_seed: u64,
        progress: &dyn ProgressObserver,
    ) -> Result<EnsembleAverageResult> {
        let n = self.n_simulations;
        let seeds = derive_run_seeds(master_seed, n);
        info!(
            "Starting {} runs of {} atoms from seed {}.",
            n,
            self.integrator.options().n_atoms,
            master_seed
        );
        let start = Instant::now();

        let run = |(index, seed): (usize, &u64)| {
            self.integrator
                .run_with(SimulationRng::from_seed(*seed), index, n, progress)
        };
        let runs: Vec<TimeSeries> = if self.parallel {
            seeds.par_iter().enumerate().map(run).collect::<Result<_>>()?
        } else {
            seeds.iter().enumerate().map(run).collect::<Result<_>>()?
        };

        let series = average(&runs)?;
        info!(
            "Completed {} runs in {:.2} s.",
            n,
            start.elapsed().as_secs_f64()
        );
        Ok(EnsembleAverageResult {
            n_simulations: n,
            series,
        })
    }
}

fn check_len(run: usize, what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(MotError::ShapeMismatch {
            run,
            what,
            expected,
            found,
        })
    }
}

fn check_shape(run: usize, reference: &TimeSeries, series: &TimeSeries) -> Result<()> {
    check_len(run, "times", reference.times.len(), series.times.len())?;
    check_len(run, "temperatures", reference.times.len(), series.temperatures.len())?;
    check_len(
        run,
        "level_populations",
        reference.times.len(),
        series.level_populations.len(),
    )?;
    check_len(
        run,
        "level_velocities",
        reference.times.len(),
        series.level_velocities.len(),
    )?;
    check_len(
        run,
        "snapshots",
        reference.snapshot_steps.len(),
        series.snapshot_steps.len(),
    )?;
    check_len(
        run,
        "position snapshots",
        reference.snapshot_steps.len(),
        series.positions.len(),
    )?;
    check_len(
        run,
        "velocity snapshots",
        reference.snapshot_steps.len(),
        series.velocities.len(),
    )?;
    for (expected, found) in reference.positions.iter().zip(series.positions.iter()) {
        check_len(run, "atoms in position snapshot", expected.len(), found.len())?;
    }
    for (expected, found) in reference.velocities.iter().zip(series.velocities.iter()) {
        check_len(run, "atoms in velocity snapshot", expected.len(), found.len())?;
    }
    Ok(())
}

fn add_assign(total: &mut [f64], other: &[f64]) {
    for (t, o) in total.iter_mut().zip(other.iter()) {
        *t += o;
    }
}

/// Sums level velocities. A level unpopulated in any run stays unpopulated.
fn add_level_velocities(total: &mut LevelVelocities, other: &LevelVelocities) {
    for (t, o) in total.0.iter_mut().zip(other.0.iter()) {
        *t = match (*t, *o) {
            (Some(t), Some(o)) => Some(t + o),
            _ => None,
        };
    }
}

/// Elementwise mean of the time series of several runs.
///
/// Every quantity is averaged across runs at each step, and the snapshot arrays are
/// averaged atom-index-wise. Runs are summed in the order given, so averaging a single
/// run returns it unchanged.
pub fn average(runs: &[TimeSeries]) -> Result<TimeSeries> {
    let (first, rest) = match runs.split_first() {
        Some(split) => split,
        None => {
            return Err(MotError::invalid("n_simulations", "must be at least 1"));
        }
    };
    let mut total = first.clone();
    for (index, series) in rest.iter().enumerate() {
        check_shape(index + 1, first, series)?;
        if series.snapshot_steps != first.snapshot_steps {
            return Err(MotError::ShapeMismatch {
                run: index + 1,
                what: "snapshot steps",
                expected: first.snapshot_steps.len(),
                found: series.snapshot_steps.len(),
            });
        }
        add_assign(&mut total.temperatures, &series.temperatures);
        for (t, p) in total
            .level_populations
            .iter_mut()
            .zip(series.level_populations.iter())
        {
            *t += p;
        }
        for (t, v) in total
            .level_velocities
            .iter_mut()
            .zip(series.level_velocities.iter())
        {
            add_level_velocities(t, v);
        }
        for (t, p) in total.positions.iter_mut().zip(series.positions.iter()) {
            add_assign(t, p);
        }
        for (t, v) in total.velocities.iter_mut().zip(series.velocities.iter()) {
            add_assign(t, v);
        }
    }

    let n = runs.len() as f64;
    total.temperatures.iter_mut().for_each(|t| *t /= n);
    total.level_populations.iter_mut().for_each(|p| *p /= n);
    for velocities in total.level_velocities.iter_mut() {
        for v in velocities.0.iter_mut().flatten() {
            *v /= n;
        }
    }
    for snapshot in total.positions.iter_mut().chain(total.velocities.iter_mut()) {
        snapshot.iter_mut().for_each(|x| *x /= n);
    }
    Ok(total)
}
