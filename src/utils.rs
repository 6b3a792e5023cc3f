//! Utility functions and structures for the timetabling engine.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::constraint::ConstraintConfig;
use crate::schedule::Schedule;
use crate::time_grid::{TimeGrid, TimeSlot, FIRST_PERIOD};

/// Random source used by the scheduler.
pub type ScheduleRng = ChaCha8Rng;

/// Build the random source, seeded when `seed` is given.
pub fn rng_from_seed(seed: Option<u64>) -> ScheduleRng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Load a list of activities from a JSON file.
pub fn load_activities<P: AsRef<Path>>(path: P) -> io::Result<Vec<Activity>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Load a constraint configuration from a JSON file.
pub fn load_constraints<P: AsRef<Path>>(path: P) -> io::Result<ConstraintConfig> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Save a schedule as pretty-printed JSON.
pub fn save_schedule<P: AsRef<Path>>(schedule: &Schedule, path: P) -> io::Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, schedule)?;
    Ok(())
}

/// Statistics of one evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Index of the last generation produced
    pub generation: usize,
    pub best_fitness: f64,
    pub average_fitness: f64,
    pub worst_fitness: f64,
    pub population_size: usize,
    /// Hard violations of the best chromosome
    pub best_hard_violations: usize,
    /// Best fitness of every generation, starting with generation 0
    pub best_history: Vec<f64>,
    pub runtime: Duration,
    /// Whether the run stopped on the cancellation flag
    pub cancelled: bool,
}

impl EvolutionStats {
    /// Format the statistics as a string.
    pub fn format(&self) -> String {
        format!(
            "Evolution Statistics:
- Generations: {}
- Runtime: {}
- Best Fitness: {:.2}
- Average Fitness: {:.2}
- Worst Fitness: {:.2}
- Population Size: {}
- Best Hard Violations: {}
- Cancelled: {}",
            self.generation,
            format_duration(self.runtime),
            self.best_fitness,
            self.average_fitness,
            self.worst_fitness,
            self.population_size,
            self.best_hard_violations,
            self.cancelled
        )
    }
}

/// Print the schedule as a period-by-day grid to the console.
pub fn print_schedule_grid(schedule: &Schedule, grid: &TimeGrid) {
    const CELL: usize = 12;

    println!(
        "Schedule: {} assignments, fitness {:.2}, {} hard violations",
        schedule.assignments.len(),
        schedule.fitness,
        schedule.hard_violations
    );
    if let (Some(start), Some(end)) = (schedule.start_date, schedule.end_date) {
        println!("Week: {} to {}", start, end);
    }
    println!();

    print!("{:>4}", "");
    for day in &grid.days {
        print!(" {:<width$}", day.short_name(), width = CELL);
    }
    println!();

    for period in FIRST_PERIOD..FIRST_PERIOD + grid.periods_per_day {
        print!("{:>4}", format!("P{}", period));
        for &day in &grid.days {
            let slot = TimeSlot::new(day, period);
            let cell = schedule
                .assignments
                .iter()
                .filter(|assignment| assignment.slot.weekly() == slot)
                .map(|assignment| assignment.activity_id.as_str())
                .collect::<Vec<_>>()
                .join("/");
            let cell: String = if cell.is_empty() {
                ".".to_string()
            } else {
                cell.chars().take(CELL).collect()
            };
            print!(" {:<width$}", cell, width = CELL);
        }
        println!();
    }
    println!();
}
