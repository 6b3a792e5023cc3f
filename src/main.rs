//! Command-line runner: generate a weekly timetable from JSON inputs.

use chrono::NaiveDate;
use clap::Parser;
use ga_timetable::config::Config;
use ga_timetable::scheduler::Scheduler;
use ga_timetable::utils::{
    format_duration, load_activities, load_constraints, print_schedule_grid, save_schedule,
};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ga-timetable", about = "Genetic-algorithm weekly timetabling")]
struct Args {
    /// JSON file with the list of activities
    #[arg(short, long)]
    activities: PathBuf,

    /// JSON file with the constraint configuration
    #[arg(short, long)]
    constraints: Option<PathBuf>,

    /// Where to write the resulting schedule as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, default_value_t = 50)]
    population_size: usize,

    #[arg(long, default_value_t = 100)]
    generations: usize,

    #[arg(long, default_value_t = 3)]
    tournament_size: usize,

    #[arg(long, default_value_t = 0.8)]
    crossover_rate: f64,

    #[arg(long, default_value_t = 0.1)]
    mutation_rate: f64,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// First day of the rotation (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Evaluate the population in parallel
    #[arg(long)]
    parallel: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let activities = load_activities(&args.activities)?;
    info!(
        "Loaded {} activities from {}",
        activities.len(),
        args.activities.display()
    );

    let mut config = Config::new()
        .with_population_size(args.population_size)
        .with_generations(args.generations)
        .with_tournament_size(args.tournament_size)
        .with_crossover_rate(args.crossover_rate)
        .with_mutation_rate(args.mutation_rate)
        .with_parallel(args.parallel);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(date) = args.start_date {
        config = config.with_rotation_start(date);
    }

    let mut scheduler = Scheduler::default();
    scheduler.set_config(config)?;
    scheduler.set_activities(activities)?;
    if let Some(path) = &args.constraints {
        scheduler.set_constraints(load_constraints(path)?);
    }

    let schedule = scheduler.generate_schedule()?;

    print_schedule_grid(&schedule, scheduler.grid());
    if let Some(stats) = scheduler.last_stats() {
        println!("{}", stats.format());
        println!("Completed in {}", format_duration(stats.runtime));
    }

    let report = scheduler.validate_schedule(&schedule.assignments);
    for violation in report.violations.iter() {
        println!(
            "[{:?}] {}: {}",
            violation.kind, violation.constraint_id, violation.description
        );
    }

    if let Some(path) = &args.output {
        save_schedule(&schedule, path)?;
        println!("Schedule saved to: {}", path.display());
    }

    Ok(())
}
