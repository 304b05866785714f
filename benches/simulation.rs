//! Performance benchmarks for CANDIED

use candied::day::DayScheduler;
use candied::evolution::EvolutionEngine;
use candied::food::FoodField;
use candied::grid::Position;
use candied::{Config, World};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn bench_config(population: usize) -> Config {
    let mut config = Config::default();
    config.population.size = population;
    config.safety.max_population = config.safety.max_population.max(population);
    config
}

fn benchmark_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    group.sample_size(20);

    for population in [100, 500, 1000].iter() {
        let world = World::new_with_seed(bench_config(*population), 42).unwrap();
        let checkpoint = world.create_checkpoint();

        group.bench_with_input(
            BenchmarkId::new("population", population),
            population,
            |b, _| {
                b.iter_batched(
                    || World::from_checkpoint(checkpoint.clone()),
                    |mut world| world.step(),
                    BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

fn benchmark_day(c: &mut Criterion) {
    let config = bench_config(500);
    let world = World::new_with_seed(config.clone(), 42).unwrap();
    let scheduler = DayScheduler::from_config(&config);
    let mut field = FoodField::new(config.torus(), config.world.index_cell_size);
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    c.bench_function("day_500", |b| {
        b.iter_batched(
            || world.creatures.clone(),
            |mut creatures| scheduler.run_day(&mut creatures, &mut field, &mut rng),
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_field_queries(c: &mut Criterion) {
    let config = Config::default();
    let torus = config.torus();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut field = FoodField::new(torus, config.world.index_cell_size);
    field.spawn(2000, &mut rng);
    let origin = Position::new(100.0, 100.0);

    let mut group = c.benchmark_group("field_nearest");
    for radius in [2.0, 10.0, 50.0].iter() {
        group.bench_with_input(BenchmarkId::new("radius", radius), radius, |b, &r| {
            b.iter(|| field.nearest(black_box(origin), black_box(r)));
        });
    }
    group.finish();
}

fn benchmark_reproduction(c: &mut Criterion) {
    let config = bench_config(1000);
    let engine = EvolutionEngine::from_config(&config);
    let mut world = World::new_with_seed(config, 42).unwrap();
    for creature in world.creatures.iter_mut() {
        creature.candies_eaten = 2;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut next_id = world.creatures.len() as u64;

    c.bench_function("reproduce_1000", |b| {
        b.iter(|| engine.reproduce(black_box(&world.creatures), &mut next_id, &mut rng));
    });
}

fn benchmark_checkpoint(c: &mut Criterion) {
    let mut world = World::new_with_seed(bench_config(1000), 42).unwrap();
    world.run(5);

    let checkpoint = world.create_checkpoint();

    c.bench_function("checkpoint_serialize", |b| {
        b.iter(|| bincode::serialize(black_box(&checkpoint)).unwrap());
    });

    let serialized = bincode::serialize(&checkpoint).unwrap();

    c.bench_function("checkpoint_deserialize", |b| {
        b.iter(|| {
            let _: candied::checkpoint::Checkpoint =
                bincode::deserialize(black_box(&serialized)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    benchmark_generation,
    benchmark_day,
    benchmark_field_queries,
    benchmark_reproduction,
    benchmark_checkpoint,
);

criterion_main!(benches);
