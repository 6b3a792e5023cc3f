//! Population management for the genetic algorithm.

use crate::activity::Activity;
use crate::chromosome::Chromosome;
use crate::evaluator::FitnessEvaluator;
use crate::time_grid::TimeGrid;
use rand::seq::index;
use rand::Rng;
use rayon::prelude::*;
use std::cmp::Ordering;

fn by_fitness_desc(a: &Chromosome, b: &Chromosome) -> Ordering {
    b.fitness()
        .partial_cmp(&a.fitness())
        .unwrap_or(Ordering::Equal)
}

/// A fixed-size collection of chromosomes.
#[derive(Debug, Clone)]
pub struct Population {
    /// Members of the current generation
    chromosomes: Vec<Chromosome>,
    /// Declared size the population is kept at
    size: usize,
}

impl Population {
    /// Create an empty population that will hold `size` chromosomes.
    pub fn new(size: usize) -> Self {
        Population {
            chromosomes: Vec::with_capacity(size),
            size,
        }
    }

    /// Fill a population with independently random chromosomes.
    pub fn random<R: Rng>(
        size: usize,
        activities: &[Activity],
        grid: &TimeGrid,
        rng: &mut R,
    ) -> Self {
        let chromosomes = (0..size)
            .map(|_| Chromosome::random(activities, grid, rng))
            .collect();

        Population { chromosomes, size }
    }

    /// Population made of caller-supplied chromosomes. Its declared size is
    /// the number supplied.
    pub fn from_chromosomes(chromosomes: Vec<Chromosome>) -> Self {
        let size = chromosomes.len();
        Population { chromosomes, size }
    }

    /// Score every member, optionally on the rayon thread pool, then sort.
    pub fn evaluate(&mut self, evaluator: &FitnessEvaluator, parallel: bool) {
        if parallel {
            self.chromosomes.par_iter_mut().for_each(|chromosome| {
                evaluator.evaluate_chromosome(chromosome);
            });
        } else {
            for chromosome in self.chromosomes.iter_mut() {
                evaluator.evaluate_chromosome(chromosome);
            }
        }

        self.sort_by_fitness();
    }

    /// Sort members by cached fitness, fittest first.
    pub fn sort_by_fitness(&mut self) {
        self.chromosomes.sort_by(by_fitness_desc);
    }

    /// The fittest member.
    pub fn best(&self) -> Option<&Chromosome> {
        self.chromosomes.iter().min_by(|a, b| by_fitness_desc(a, b))
    }

    /// The `k` fittest members, fittest first.
    pub fn top(&self, k: usize) -> Vec<&Chromosome> {
        let mut ranked: Vec<&Chromosome> = self.chromosomes.iter().collect();
        ranked.sort_by(|a, b| by_fitness_desc(a, b));
        ranked.truncate(k);
        ranked
    }

    /// Tournament selection: draw `tournament_size` distinct members at random
    /// and return the fittest. The tournament is clamped to the population size.
    pub fn tournament_select<R: Rng>(
        &self,
        tournament_size: usize,
        rng: &mut R,
    ) -> Option<&Chromosome> {
        if self.chromosomes.is_empty() {
            return None;
        }

        let amount = tournament_size.clamp(1, self.chromosomes.len());

        index::sample(rng, self.chromosomes.len(), amount)
            .into_iter()
            .map(|i| &self.chromosomes[i])
            .min_by(|a, b| by_fitness_desc(a, b))
    }

    /// Install the next generation while keeping the declared size.
    ///
    /// Extra chromosomes are dropped. A short generation is topped up with the
    /// fittest survivors of the current one; when there are not enough of
    /// those either, the supplied chromosomes are repeated.
    pub fn replace_with(&mut self, mut next: Vec<Chromosome>) {
        next.truncate(self.size);

        if next.len() < self.size {
            self.sort_by_fitness();
            let missing = self.size - next.len();
            let survivors: Vec<Chromosome> =
                self.chromosomes.iter().take(missing).cloned().collect();
            next.extend(survivors);
        }

        let supplied = next.len();
        if supplied > 0 {
            let mut i = 0;
            while next.len() < self.size {
                let copy = next[i % supplied].clone();
                next.push(copy);
                i += 1;
            }
        }

        self.chromosomes = next;
    }

    /// Mean cached fitness.
    pub fn average_fitness(&self) -> f64 {
        if self.chromosomes.is_empty() {
            return 0.0;
        }
        self.chromosomes.iter().map(Chromosome::fitness).sum::<f64>()
            / self.chromosomes.len() as f64
    }

    /// Lowest cached fitness.
    pub fn worst_fitness(&self) -> f64 {
        self.chromosomes
            .iter()
            .map(Chromosome::fitness)
            .fold(None, |worst: Option<f64>, f| Some(worst.map_or(f, |w| w.min(f))))
            .unwrap_or(0.0)
    }

    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    /// Declared population size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of chromosomes currently held.
    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }
}
