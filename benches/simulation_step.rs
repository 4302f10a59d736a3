use criterion::{criterion_group, criterion_main, Criterion};
extern crate rb87_mot as lib;
extern crate specs;

use lib::configuration::MotConfiguration;
use lib::ecs;
use lib::initiate;
use lib::random::SimulationRng;
use specs::prelude::*;

fn criterion_benchmark(c: &mut Criterion) {
    // Mock up a simulation world and dispatcher
    let config = MotConfiguration::default();
    let mut world = World::new();
    ecs::register_components(&mut world);
    ecs::register_resources(&mut world, &config, 1e-6, SimulationRng::from_seed(1))
        .expect("invalid configuration");
    let mut dispatcher = ecs::create_simulation_dispatcher();
    dispatcher.setup(&mut world);
    initiate::create_atoms(&mut world, 10_000).expect("could not create atoms");

    // Run a few times to settle the storages.
    for _ in 0..5 {
        dispatcher.dispatch_seq(&world);
        world.maintain();
    }

    c.bench_function("simulation_step", |b| {
        b.iter(|| {
            dispatcher.dispatch_seq(&world);
            world.maintain();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
