extern crate rb87_mot as lib;

use clap::Parser;
use lib::averager::MultiRunAverager;
use lib::configuration::SimulationConfig;
use lib::error::Result;
use lib::output::console_output::ConsoleProgress;
use lib::output::file_output;
use log::{error, info};
use std::path::PathBuf;
use std::process;

/// Monte-Carlo simulation of the 1-D laser cooling of a rubidium-87 cloud.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// YAML or JSON configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the CSV results are written to.
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Master seed of the runs. Overrides the configuration file.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of atoms per run. Overrides the configuration file.
    #[arg(long)]
    n_atoms: Option<usize>,

    /// Number of runs to average. Overrides the configuration file.
    #[arg(long)]
    n_simulations: Option<usize>,
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(n_atoms) = args.n_atoms {
        config.options.n_atoms = n_atoms;
    }
    if let Some(n_simulations) = args.n_simulations {
        config.options.n_simulations = n_simulations;
    }
    if let Some(seed) = args.seed {
        config.options.seed = Some(seed);
    }
    config.validate()?;

    let seed = config.options.seed.unwrap_or_else(rand::random);
    info!("Using master seed {}.", seed);

    let averager = MultiRunAverager::new(config.physics, config.options)?;
    let result = averager.run_with_progress(seed, &ConsoleProgress::default())?;
    match result.final_temperature() {
        Some(temperature) => info!("Final temperature of the trapped cloud: {:e} K", temperature),
        None => info!("No steps were simulated."),
    }
    file_output::write_results(&args.output, &result)?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run(Args::parse()) {
        error!("{}", err);
        process::exit(1);
    }
}
