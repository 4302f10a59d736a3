//! Integration tests of complete runs of the cooling simulation.
//!
//! These check the properties every run must satisfy, and that the cloud cools from its
//! loading temperature.

#[cfg(test)]
pub mod tests {
    use crate::atom::HyperfineLevel;
    use crate::averager::MultiRunAverager;
    use crate::configuration::{MotConfiguration, SimulationOptions};
    use crate::ensemble::EnsembleIntegrator;
    use crate::random::derive_run_seeds;

    fn small_options() -> SimulationOptions {
        SimulationOptions {
            n_atoms: 40,
            time_max: 3e-3,
            dt: 1e-4,
            n_simulations: 2,
            snapshot_interval: 5,
            seed: None,
        }
    }

    #[test]
    fn same_seed_gives_identical_averages() {
        let a = MultiRunAverager::new(MotConfiguration::default(), small_options())
            .expect("invalid configuration")
            .run(11)
            .expect("run failed");
        let b = MultiRunAverager::new(MotConfiguration::default(), small_options())
            .expect("invalid configuration")
            .run(11)
            .expect("run failed");
        assert_eq!(a, b);
    }

    #[test]
    fn averaging_one_run_returns_that_run() {
        let options = SimulationOptions {
            n_simulations: 1,
            ..small_options()
        };
        let seed = 31;
        let averaged = MultiRunAverager::new(MotConfiguration::default(), options.clone())
            .expect("invalid configuration")
            .run(seed)
            .expect("run failed");
        let single = EnsembleIntegrator::new(MotConfiguration::default(), options)
            .expect("invalid configuration")
            .run(derive_run_seeds(seed, 1)[0])
            .expect("run failed");
        assert_eq!(averaged.n_simulations, 1);
        assert_eq!(averaged.series, single);
    }

    #[test]
    fn averaged_observables_are_well_formed() {
        let options = small_options();
        let result = MultiRunAverager::new(MotConfiguration::default(), options.clone())
            .expect("invalid configuration")
            .run(3)
            .expect("run failed");
        let series = &result.series;
        assert_eq!(result.times(), options.times().as_slice());
        assert_eq!(series.snapshot_steps, vec![0, 5, 10, 15, 20, 25]);
        for populations in series.level_populations.iter() {
            assert!((populations.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!(populations.iter().all(|p| *p >= 0.0));
        }
        assert!(series.temperatures.iter().all(|t| *t >= 0.0));
        for snapshot in series.positions.iter() {
            assert_eq!(snapshot.len(), options.n_atoms);
        }
    }

    #[test]
    fn unpopulated_levels_have_no_mean_velocity() {
        let config = MotConfiguration {
            initial_level_weights: [1.0, 0.0, 0.0, 0.0],
            transitions: vec![],
            repumper_intensity: 0.0,
            ..Default::default()
        };
        let integrator =
            EnsembleIntegrator::new(config, small_options()).expect("invalid configuration");
        let series = integrator.run(17).expect("run failed");
        for (velocities, populations) in series
            .level_velocities
            .iter()
            .zip(series.level_populations.iter())
        {
            assert_eq!(populations[HyperfineLevel::F1.index()], 1.0);
            assert!(velocities.get(HyperfineLevel::F1).is_some());
            assert_eq!(velocities.get(HyperfineLevel::F2), None);
            assert_eq!(velocities.get(HyperfineLevel::F3), None);
            assert_eq!(velocities.get(HyperfineLevel::Dark), None);
        }
    }

    #[test]
    fn cloud_cools_from_loading_temperature() {
        let options = SimulationOptions {
            n_atoms: 200,
            time_max: 0.05,
            dt: 1e-4,
            n_simulations: 2,
            snapshot_interval: 100,
            seed: None,
        };
        let config = MotConfiguration::default();
        let loading_temperature = config.initial_temperature;
        let result = MultiRunAverager::new(config, options)
            .expect("invalid configuration")
            .run(7)
            .expect("run failed");
        let initial = result.series.temperatures[0];
        let last = result.final_temperature().expect("no steps recorded");
        assert!(initial > 0.0);
        assert!(last < initial);
        assert!(last < loading_temperature);
    }

    /// Full-size run at the default loading conditions.
    #[test]
    #[ignore]
    fn full_size_cloud_cools() {
        let options = SimulationOptions {
            n_atoms: 1000,
            time_max: 1.0,
            dt: 1e-4,
            n_simulations: 3,
            snapshot_interval: 2000,
            seed: None,
        };
        let config = MotConfiguration {
            initial_temperature: 360.0,
            ..Default::default()
        };
        let result = MultiRunAverager::new(config, options)
            .expect("invalid configuration")
            .run(2023)
            .expect("run failed");
        let last = result.final_temperature().expect("no steps recorded");
        assert!(last < 360.0);
    }
}
