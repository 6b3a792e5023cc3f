//! Genetic operators (crossover, mutation) for timetable chromosomes.

use crate::activity::{find_activity, Activity};
use crate::chromosome::{Assignment, Chromosome};
use crate::time_grid::{TimeGrid, TimeSlot};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// Elementary mutation applied to a chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Two activities exchanged their slots
    Swap,
    /// One activity moved to a free, non-conflicting slot
    Reassign,
}

/// Implements the genetic operators. Genes of locked activities are never moved.
#[derive(Debug, Clone, Default)]
pub struct Genetic {
    locked: HashSet<String>,
}

impl Genetic {
    pub fn new() -> Self {
        Genetic::default()
    }

    /// Operators that keep the given activities in place.
    pub fn with_locked(locked: HashSet<String>) -> Self {
        Genetic { locked }
    }

    pub fn locked(&self) -> &HashSet<String> {
        &self.locked
    }

    /// Uniform crossover: for each activity a coin flip decides which parent
    /// the first child inherits the gene from; the second child takes the
    /// other one. Both children are repaired afterwards.
    pub fn crossover<R: Rng>(
        &self,
        parent1: &Chromosome,
        parent2: &Chromosome,
        activities: &[Activity],
        grid: &TimeGrid,
        rng: &mut R,
    ) -> (Chromosome, Chromosome) {
        let p1: HashMap<&str, &Assignment> = parent1
            .genes()
            .iter()
            .map(|gene| (gene.activity_id.as_str(), gene))
            .collect();
        let p2: HashMap<&str, &Assignment> = parent2
            .genes()
            .iter()
            .map(|gene| (gene.activity_id.as_str(), gene))
            .collect();

        let mut genes1 = Vec::with_capacity(activities.len());
        let mut genes2 = Vec::with_capacity(activities.len());

        for activity in activities {
            let from1 = p1.get(activity.id.as_str()).copied();
            let from2 = p2.get(activity.id.as_str()).copied();

            // A gene missing in one parent is taken from the other
            let (a, b) = match (from1, from2) {
                (Some(g1), Some(g2)) => {
                    if rng.gen_bool(0.5) {
                        (g1, g2)
                    } else {
                        (g2, g1)
                    }
                }
                (Some(g), None) | (None, Some(g)) => (g, g),
                (None, None) => continue,
            };

            genes1.push(a.clone());
            genes2.push(b.clone());
        }

        let mut child1 = Chromosome::from_genes(activities, grid, genes1, rng);
        let mut child2 = Chromosome::from_genes(activities, grid, genes2, rng);

        child1.resolve_collisions(activities, grid, &self.locked, rng);
        child2.resolve_collisions(activities, grid, &self.locked, rng);

        (child1, child2)
    }

    /// Apply one elementary mutation: a swap of two activities' slots or a
    /// move of one activity to another free, non-conflicting slot.
    ///
    /// Falls back to the other kind when the chosen one is impossible and
    /// returns `None` when neither applies.
    pub fn mutate<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        activities: &[Activity],
        grid: &TimeGrid,
        rng: &mut R,
    ) -> Option<Mutation> {
        let movable: Vec<String> = chromosome
            .genes()
            .iter()
            .map(|gene| gene.activity_id.clone())
            .filter(|id| !self.locked.contains(id))
            .collect();

        if movable.is_empty() {
            return None;
        }

        if rng.gen_bool(0.5) {
            self.swap(chromosome, &movable, rng)
                .or_else(|| self.reassign(chromosome, &movable, activities, grid, rng))
        } else {
            self.reassign(chromosome, &movable, activities, grid, rng)
                .or_else(|| self.swap(chromosome, &movable, rng))
        }
    }

    fn swap<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        movable: &[String],
        rng: &mut R,
    ) -> Option<Mutation> {
        if movable.len() < 2 {
            return None;
        }

        let picked: Vec<&String> = movable.choose_multiple(rng, 2).collect();
        chromosome
            .swap_assignments(picked[0], picked[1])
            .ok()
            .map(|_| Mutation::Swap)
    }

    fn reassign<R: Rng>(
        &self,
        chromosome: &mut Chromosome,
        movable: &[String],
        activities: &[Activity],
        grid: &TimeGrid,
        rng: &mut R,
    ) -> Option<Mutation> {
        let activity_id = movable.choose(rng)?;
        let activity = find_activity(activities, activity_id)?;
        let occupied = chromosome.occupied_slots();

        let candidates: Vec<TimeSlot> = grid
            .slots()
            .into_iter()
            .filter(|slot| !slot.is_in(&occupied) && !activity.conflicts_with(slot))
            .collect();

        let slot = candidates.choose(rng)?;
        chromosome
            .update_assignment(activity_id, *slot)
            .ok()
            .map(|_| Mutation::Reassign)
    }
}
