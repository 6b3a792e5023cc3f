//! # GA Timetable
//!
//! A genetic-algorithm engine that assigns recurring classes to a weekly grid
//! of time slots (5 days x 8 periods) so that hard rules hold and soft
//! preferences are rewarded.
//!
//! The search evolves a population of chromosomes (one slot per activity)
//! through tournament selection, uniform crossover, swap/reassign mutation and
//! elitism. The [`scheduler::Scheduler`] service wraps the loop with constraint
//! translation, schedule generation and re-optimization around locked
//! assignments.

pub mod activity;
pub mod chromosome;
pub mod config;
pub mod constraint;
pub mod error;
pub mod evaluator;
pub mod genetic;
pub mod population;
pub mod schedule;
pub mod scheduler;
pub mod time_grid;
pub mod utils;

use crate::activity::Activity;
use crate::chromosome::Chromosome;
use crate::config::Config;
use crate::evaluator::{Evaluation, FitnessEvaluator};
use crate::genetic::Genetic;
use crate::population::Population;
use crate::time_grid::TimeGrid;
use crate::utils::EvolutionStats;

use log::{debug, info, warn};
use rand::Rng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of an evolution run.
#[derive(Debug, Clone)]
pub struct Evolution {
    /// Fittest chromosome of the final generation
    pub best: Chromosome,
    /// Full evaluation of `best`
    pub evaluation: Evaluation,
    pub stats: EvolutionStats,
}

/// The evolution loop: selection, crossover, mutation, elitism, replacement.
pub struct GeneticAlgorithm {
    pub config: Config,
    pub grid: TimeGrid,
    pub genetic: Genetic,
    cancel: Option<Arc<AtomicBool>>,
}

impl GeneticAlgorithm {
    /// Create a GA over the given grid.
    pub fn new(config: Config, grid: TimeGrid) -> Self {
        GeneticAlgorithm {
            config,
            grid,
            genetic: Genetic::new(),
            cancel: None,
        }
    }

    /// Keep the genes of these activities fixed during the run.
    pub fn with_locked(mut self, locked: HashSet<String>) -> Self {
        self.genetic = Genetic::with_locked(locked);
        self
    }

    /// Stop between generations once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Build and evaluate a random initial population.
    pub fn initialize<R: Rng>(
        &self,
        activities: &[Activity],
        evaluator: &FitnessEvaluator,
        rng: &mut R,
    ) -> Population {
        let mut population =
            Population::random(self.config.population_size, activities, &self.grid, rng);
        population.evaluate(evaluator, self.config.parallel);
        population
    }

    /// Run the full loop from a random population.
    pub fn evolve<R: Rng>(
        &self,
        activities: &[Activity],
        evaluator: &FitnessEvaluator,
        rng: &mut R,
    ) -> Evolution {
        let population = self.initialize(activities, evaluator, rng);
        self.run(population, activities, evaluator, rng)
    }

    /// Run the full loop with `population` as generation 0.
    pub fn evolve_with_initial_population<R: Rng>(
        &self,
        population: Population,
        activities: &[Activity],
        evaluator: &FitnessEvaluator,
        rng: &mut R,
    ) -> Evolution {
        if population.is_empty() {
            warn!("Seed population is empty, starting from a random one");
            return self.evolve(activities, evaluator, rng);
        }

        let mut population = population;
        population.evaluate(evaluator, self.config.parallel);
        self.run(population, activities, evaluator, rng)
    }

    fn run<R: Rng>(
        &self,
        mut population: Population,
        activities: &[Activity],
        evaluator: &FitnessEvaluator,
        rng: &mut R,
    ) -> Evolution {
        let start_time = Instant::now();

        info!(
            "Evolving {} activities: population {}, {} generations",
            activities.len(),
            population.size(),
            self.config.generations
        );

        let mut best_fitness = population.best().map_or(0.0, Chromosome::fitness);
        let mut best_history = vec![best_fitness];
        let mut generation = 0;
        let mut stagnant = 0;
        let mut cancelled = false;

        while generation < self.config.generations {
            if self.is_cancelled() {
                warn!("Evolution cancelled after {} generations", generation);
                cancelled = true;
                break;
            }

            // Breed the next generation and score it
            let next = self.next_generation(&population, activities, rng);
            population.replace_with(next);
            population.evaluate(evaluator, self.config.parallel);
            generation += 1;

            let current = population.best().map_or(0.0, Chromosome::fitness);
            debug!(
                "Generation {}: best {:.2}, average {:.2}",
                generation,
                current,
                population.average_fitness()
            );

            if current > best_fitness {
                best_fitness = current;
                stagnant = 0;
            } else {
                stagnant += 1;
            }
            best_history.push(current);

            if let Some(limit) = self.config.stagnation_limit {
                if stagnant >= limit {
                    info!(
                        "No improvement for {} generations, stopping at generation {}",
                        stagnant, generation
                    );
                    break;
                }
            }
        }

        let best = population.best().cloned().unwrap_or_default();
        let evaluation = evaluator.evaluate(best.genes());

        let stats = EvolutionStats {
            generation,
            best_fitness: best.fitness(),
            average_fitness: population.average_fitness(),
            worst_fitness: population.worst_fitness(),
            population_size: population.len(),
            best_hard_violations: evaluation.hard_violations,
            best_history,
            runtime: start_time.elapsed(),
            cancelled,
        };

        info!(
            "Evolution finished: best fitness {:.2}, {} hard violations",
            stats.best_fitness, stats.best_hard_violations
        );

        Evolution {
            best,
            evaluation,
            stats,
        }
    }

    /// Elites first, then offspring of tournament-selected parents.
    fn next_generation<R: Rng>(
        &self,
        population: &Population,
        activities: &[Activity],
        rng: &mut R,
    ) -> Vec<Chromosome> {
        let size = population.size();
        let crossover_rate = probability(self.config.crossover_rate);
        let mutation_rate = probability(self.config.mutation_rate);

        let mut next: Vec<Chromosome> = population
            .top(self.config.elite_count.max(1).min(size))
            .into_iter()
            .cloned()
            .collect();

        while next.len() < size {
            let (parent1, parent2) = match (
                population.tournament_select(self.config.tournament_size, rng),
                population.tournament_select(self.config.tournament_size, rng),
            ) {
                (Some(p1), Some(p2)) => (p1, p2),
                _ => break,
            };

            let (mut child1, mut child2) = if rng.gen_bool(crossover_rate) {
                self.genetic
                    .crossover(parent1, parent2, activities, &self.grid, rng)
            } else {
                (parent1.clone(), parent2.clone())
            };

            if rng.gen_bool(mutation_rate) {
                self.genetic.mutate(&mut child1, activities, &self.grid, rng);
            }
            if rng.gen_bool(mutation_rate) {
                self.genetic.mutate(&mut child2, activities, &self.grid, rng);
            }

            next.push(child1);
            if next.len() < size {
                next.push(child2);
            }
        }

        next
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }
}

/// Clamp a rate into `[0, 1]`; NaN counts as zero.
fn probability(rate: f64) -> f64 {
    if rate.is_nan() {
        0.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}
