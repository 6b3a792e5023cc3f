//! Configuration parameters for the timetabling genetic algorithm.

use crate::error::ConfigError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Configuration settings for the genetic algorithm and scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of chromosomes kept in every generation
    pub population_size: usize,
    /// Number of generations to evolve
    pub generations: usize,
    /// Number of chromosomes drawn per tournament
    pub tournament_size: usize,
    /// Probability that two parents are recombined
    pub crossover_rate: f64,
    /// Probability that an offspring receives one elementary mutation
    pub mutation_rate: f64,
    /// Number of fittest chromosomes copied unchanged into the next generation
    pub elite_count: usize,
    /// Stop after this many generations without improvement of the best fitness
    pub stagnation_limit: Option<usize>,
    /// Evaluate the population on the rayon thread pool
    pub parallel: bool,
    /// Seed for the random source; entropy is used when absent
    pub seed: Option<u64>,
    /// Multiplier applied to the mutation rate during re-optimization
    pub reoptimize_mutation_boost: f64,
    /// Upper bound for the boosted re-optimization mutation rate
    pub max_reoptimize_mutation_rate: f64,
    /// First day of the calendar rotation used to date schedules
    pub rotation_start: Option<NaiveDate>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            population_size: 50,
            generations: 100,
            tournament_size: 3,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            elite_count: 1,
            stagnation_limit: None,
            parallel: false,
            seed: None,
            reoptimize_mutation_boost: 2.0,
            max_reoptimize_mutation_rate: 0.5,
            rotation_start: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Set the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Set the number of generations.
    pub fn with_generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    /// Set the tournament size.
    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size;
        self
    }

    /// Set the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    /// Set the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Set the number of elite chromosomes.
    pub fn with_elite_count(mut self, count: usize) -> Self {
        self.elite_count = count;
        self
    }

    /// Set the stagnation limit.
    pub fn with_stagnation_limit(mut self, generations: usize) -> Self {
        self.stagnation_limit = Some(generations);
        self
    }

    /// Enable or disable parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the rotation start date.
    pub fn with_rotation_start(mut self, date: NaiveDate) -> Self {
        self.rotation_start = Some(date);
        self
    }

    /// Mutation rate used while re-optimizing around locked assignments.
    pub fn reoptimize_mutation_rate(&self) -> f64 {
        (self.mutation_rate * self.reoptimize_mutation_boost)
            .min(self.max_reoptimize_mutation_rate)
            .max(self.mutation_rate.min(1.0))
    }

    /// Check that all parameters are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::Zero {
                name: "population_size",
            });
        }
        if self.generations == 0 {
            return Err(ConfigError::Zero {
                name: "generations",
            });
        }
        if self.tournament_size == 0 {
            return Err(ConfigError::Zero {
                name: "tournament_size",
            });
        }

        let rates = [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
            ("max_reoptimize_mutation_rate", self.max_reoptimize_mutation_rate),
        ];
        for (name, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }

        let boost = self.reoptimize_mutation_boost;
        if !boost.is_finite() || boost < 0.0 {
            return Err(ConfigError::InvalidFactor {
                name: "reoptimize_mutation_boost",
                value: boost,
            });
        }

        Ok(())
    }
}
