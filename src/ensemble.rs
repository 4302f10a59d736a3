//! A single simulation run of the atomic ensemble.
//!
//! [EnsembleIntegrator] validates the configuration once and can then perform any
//! number of independent runs. Each run goes through three phases:
//! * initialisation builds a fresh world, loads the atoms and assembles the dispatcher;
//! * stepping dispatches the systems once per timestep and appends the observables of
//!   the step to the [TimeSeries];
//! * finalisation hands the [TimeSeries] back and drops the world.

use crate::atom::{Atom, Position, Velocity};
use crate::configuration::{MotConfiguration, SimulationOptions};
use crate::ecs;
use crate::error::Result;
use crate::initiate;
use crate::integrator::Step;
use crate::observables::{LevelPopulations, LevelVelocities, StepObservables};
use crate::output::console_output::{NoProgress, Progress, ProgressObserver};
use crate::random::SimulationRng;
use log::debug;
use specs::prelude::*;
use std::time::Instant;

/// Observables recorded over the course of a run, one entry per step.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries {
    /// Simulation time at the start of each step, in s.
    pub times: Vec<f64>,
    /// Temperature of the trapped atoms, in K.
    pub temperatures: Vec<f64>,
    pub level_populations: Vec<LevelPopulations>,
    pub level_velocities: Vec<LevelVelocities>,
    /// Indices of the steps at which `positions` and `velocities` were recorded.
    pub snapshot_steps: Vec<usize>,
    /// Position of every atom at each snapshot step, in m.
    pub positions: Vec<Vec<f64>>,
    /// Velocity of every atom at each snapshot step, in m/s.
    pub velocities: Vec<Vec<f64>>,
}

impl TimeSeries {
    fn with_capacity(n_steps: usize, n_snapshots: usize) -> Self {
        TimeSeries {
            times: Vec::with_capacity(n_steps),
            temperatures: Vec::with_capacity(n_steps),
            level_populations: Vec::with_capacity(n_steps),
            level_velocities: Vec::with_capacity(n_steps),
            snapshot_steps: Vec::with_capacity(n_snapshots),
            positions: Vec::with_capacity(n_snapshots),
            velocities: Vec::with_capacity(n_snapshots),
        }
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Trapped temperature at the last recorded step.
    pub fn final_temperature(&self) -> Option<f64> {
        self.temperatures.last().copied()
    }
}

/// Drives the time loop of independent simulation runs.
#[derive(Clone, Debug)]
pub struct EnsembleIntegrator {
    config: MotConfiguration,
    options: SimulationOptions,
}

impl EnsembleIntegrator {
    /// Creates an integrator, failing if either configuration is invalid.
    pub fn new(config: MotConfiguration, options: SimulationOptions) -> Result<Self> {
        options.validate()?;
        config.validate()?;
        Ok(EnsembleIntegrator { config, options })
    }

    pub fn config(&self) -> &MotConfiguration {
        &self.config
    }

    pub fn options(&self) -> &SimulationOptions {
        &self.options
    }

    /// Performs one run seeded with `seed`.
    pub fn run(&self, seed: u64) -> Result<TimeSeries> {
        self.run_with(SimulationRng::from_seed(seed), 0, 1, &NoProgress)
    }

    /// Performs one run with the given random source, reporting each step to `progress`.
    ///
    /// `run_index` and `n_runs` are only passed through to the progress observer.
    pub fn run_with(
        &self,
        rng: SimulationRng,
        run_index: usize,
        n_runs: usize,
        progress: &dyn ProgressObserver,
    ) -> Result<TimeSeries> {
        let mut run = EnsembleRun::initialise(&self.config, &self.options, rng)?;
        let total_steps = self.options.n_steps();
        let start = Instant::now();
        debug!(
            "Run {}: {} atoms, {} steps of {} s.",
            run_index, self.options.n_atoms, total_steps, self.options.dt
        );
        for step in 0..total_steps {
            run.step();
            progress.on_step(&Progress {
                run_index,
                n_runs,
                step,
                total_steps,
                elapsed: start.elapsed(),
            });
        }
        Ok(run.finish())
    }
}

/// The world, dispatcher and recorded observables of a run in progress.
struct EnsembleRun {
    world: World,
    dispatcher: Dispatcher<'static, 'static>,
    series: TimeSeries,
    dt: f64,
    snapshot_interval: usize,
}

impl EnsembleRun {
    fn initialise(
        config: &MotConfiguration,
        options: &SimulationOptions,
        rng: SimulationRng,
    ) -> Result<Self> {
        let mut world = World::new();
        ecs::register_components(&mut world);
        ecs::register_resources(&mut world, config, options.dt, rng)?;
        let mut dispatcher = ecs::create_simulation_dispatcher();
        dispatcher.setup(&mut world);
        initiate::create_atoms(&mut world, options.n_atoms)?;

        let n_steps = options.n_steps();
        let n_snapshots = (n_steps + options.snapshot_interval - 1) / options.snapshot_interval;
        Ok(EnsembleRun {
            world,
            dispatcher,
            series: TimeSeries::with_capacity(n_steps, n_snapshots),
            dt: options.dt,
            snapshot_interval: options.snapshot_interval,
        })
    }

    fn step(&mut self) {
        self.dispatcher.dispatch_seq(&self.world);
        self.world.maintain();
        self.record();
    }

    /// Index of the step that has just been dispatched.
    fn current_step(&self) -> usize {
        (self.world.read_resource::<Step>().n as usize).saturating_sub(1)
    }

    fn record(&mut self) {
        let step = self.current_step();
        let observables = self.world.read_resource::<StepObservables>();
        self.series.times.push(step as f64 * self.dt);
        self.series.temperatures.push(observables.temperature);
        self.series
            .level_populations
            .push(observables.level_populations);
        self.series.level_velocities.push(observables.level_velocities);

        if step % self.snapshot_interval == 0 {
            let atoms = self.world.read_storage::<Atom>();
            let positions = self.world.read_storage::<Position>();
            let velocities = self.world.read_storage::<Velocity>();
            self.series.snapshot_steps.push(step);
            self.series
                .positions
                .push((&atoms, &positions).join().map(|(_, p)| p.pos).collect());
            self.series
                .velocities
                .push((&atoms, &velocities).join().map(|(_, v)| v.vel).collect());
        }
    }

    fn finish(self) -> TimeSeries {
        self.series
    }
}
