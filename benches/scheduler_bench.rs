//! Benchmarks for the timetabling genetic algorithm.

#[cfg(feature = "bench")]
extern crate criterion;

#[cfg(feature = "bench")]
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ga_timetable::activity::Activity;
use ga_timetable::config::Config;
use ga_timetable::constraint::ConstraintConfig;
use ga_timetable::evaluator::FitnessEvaluator;
use ga_timetable::scheduler::Scheduler;
use ga_timetable::time_grid::{Day, TimeGrid, TimeSlot};
use ga_timetable::GeneticAlgorithm;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Create `size` activities, every third one blocked on Monday mornings.
fn create_benchmark_activities(size: usize) -> Vec<Activity> {
    (0..size)
        .map(|i| {
            let activity = Activity::new(format!("A{}", i), format!("Class {}", i));
            if i % 3 == 0 {
                activity.with_conflicts(vec![
                    TimeSlot::new(Day::Monday, 1),
                    TimeSlot::new(Day::Monday, 2),
                ])
            } else {
                activity
            }
        })
        .collect()
}

fn create_benchmark_constraints(size: usize) -> ConstraintConfig {
    ConstraintConfig::new()
        .with_max_per_day(size / 5 + 1)
        .with_balanced_workload(1.0)
}

#[cfg(feature = "bench")]
fn benchmark_initialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("initialization");

    for size in [10, 20, 35].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let activities = create_benchmark_activities(size);
            let grid = TimeGrid::default();
            let evaluator = FitnessEvaluator::new(
                &activities,
                create_benchmark_constraints(size).translate(),
                grid.clone(),
            );
            let algorithm = GeneticAlgorithm::new(Config::new(), grid);
            let mut rng = ChaCha8Rng::seed_from_u64(42);

            b.iter(|| algorithm.initialize(&activities, &evaluator, &mut rng));
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
fn benchmark_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation");

    for parallel in [false, true].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(parallel),
            parallel,
            |b, &parallel| {
                let activities = create_benchmark_activities(30);
                let grid = TimeGrid::default();
                let evaluator = FitnessEvaluator::new(
                    &activities,
                    create_benchmark_constraints(30).translate(),
                    grid.clone(),
                );
                let algorithm =
                    GeneticAlgorithm::new(Config::new().with_population_size(200), grid);
                let mut rng = ChaCha8Rng::seed_from_u64(42);
                let mut population = algorithm.initialize(&activities, &evaluator, &mut rng);

                b.iter(|| population.evaluate(&evaluator, parallel));
            },
        );
    }

    group.finish();
}

#[cfg(feature = "bench")]
fn benchmark_generate_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_schedule");
    group.measurement_time(Duration::from_secs(20));

    for size in [10, 20].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let config = Config::new()
                .with_population_size(40)
                .with_generations(50)
                .with_seed(7);
            let mut scheduler = Scheduler::new(config);
            scheduler
                .set_activities(create_benchmark_activities(size))
                .unwrap();
            scheduler.set_constraints(create_benchmark_constraints(size));

            b.iter(|| scheduler.generate_schedule().unwrap());
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
criterion_group!(
    benches,
    benchmark_initialization,
    benchmark_evaluation,
    benchmark_generate_schedule
);

#[cfg(feature = "bench")]
criterion_main!(benches);
