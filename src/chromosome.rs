//! Chromosome representation: one slot assignment (gene) per activity.

use crate::activity::Activity;
use crate::error::ChromosomeError;
use crate::time_grid::{Day, TimeGrid, TimeSlot, FIRST_PERIOD};
use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single gene: the slot an activity is held in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub activity_id: String,
    pub slot: TimeSlot,
}

impl Assignment {
    pub fn new(activity_id: impl Into<String>, slot: TimeSlot) -> Self {
        Assignment {
            activity_id: activity_id.into(),
            slot,
        }
    }
}

/// How far down the preference order a placement had to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementTier {
    /// Unused slot outside the activity's conflict list
    Clean,
    /// Unused slot, but one the activity declared unavailable
    Conflicting,
    /// No unused slot left; a random slot from the whole grid was taken
    Saturated,
}

/// Choose a slot for `activity` given the slots already taken.
///
/// Preference order: an unused slot the activity does not conflict with,
/// then any unused slot, then a uniformly random slot of the grid. The last
/// tier accepts a double booking so the chromosome stays complete; the
/// evaluator reports it as a hard violation.
pub fn place_gene<R: Rng>(
    activity: &Activity,
    occupied: &[TimeSlot],
    grid: &TimeGrid,
    rng: &mut R,
) -> (TimeSlot, PlacementTier) {
    let unused: Vec<TimeSlot> = grid
        .slots()
        .into_iter()
        .filter(|slot| !slot.is_in(occupied))
        .collect();

    let clean: Vec<TimeSlot> = unused
        .iter()
        .filter(|slot| !activity.conflicts_with(slot))
        .copied()
        .collect();

    if let Some(slot) = clean.choose(rng) {
        return (*slot, PlacementTier::Clean);
    }

    if let Some(slot) = unused.choose(rng) {
        return (*slot, PlacementTier::Conflicting);
    }

    let slot = grid
        .random_slot(rng)
        .unwrap_or_else(|| TimeSlot::new(Day::Monday, FIRST_PERIOD));
    (slot, PlacementTier::Saturated)
}

/// A complete candidate schedule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chromosome {
    genes: Vec<Assignment>,
    fitness: f64,
}

impl Chromosome {
    /// Build a chromosome for `activities`, starting from `genes` when given.
    ///
    /// Supplied genes are repaired so that every activity ends up with
    /// exactly one gene; without genes every activity is placed at random.
    pub fn new<R: Rng>(
        activities: &[Activity],
        grid: &TimeGrid,
        genes: Option<Vec<Assignment>>,
        rng: &mut R,
    ) -> Self {
        Self::from_genes(activities, grid, genes.unwrap_or_default(), rng)
    }

    /// Fully random chromosome.
    pub fn random<R: Rng>(activities: &[Activity], grid: &TimeGrid, rng: &mut R) -> Self {
        Self::from_genes(activities, grid, Vec::new(), rng)
    }

    /// Chromosome seeded with `genes`, repaired to cover every activity.
    pub fn from_genes<R: Rng>(
        activities: &[Activity],
        grid: &TimeGrid,
        genes: Vec<Assignment>,
        rng: &mut R,
    ) -> Self {
        let mut chromosome = Chromosome {
            genes,
            fitness: 0.0,
        };
        chromosome.repair(activities, grid, rng);
        chromosome
    }

    /// Restore the one-gene-per-activity invariant.
    ///
    /// Genes for unknown activities and duplicate genes are dropped; every
    /// activity without a gene is then placed, in random order, through
    /// [`place_gene`].
    pub fn repair<R: Rng>(&mut self, activities: &[Activity], grid: &TimeGrid, rng: &mut R) {
        let known: HashSet<&str> = activities.iter().map(|a| a.id.as_str()).collect();
        let mut seen: HashSet<String> = HashSet::new();

        self.genes.retain(|gene| {
            known.contains(gene.activity_id.as_str()) && seen.insert(gene.activity_id.clone())
        });

        let mut missing: Vec<&Activity> = activities
            .iter()
            .filter(|activity| !seen.contains(&activity.id))
            .collect();
        missing.shuffle(rng);

        for activity in missing {
            let occupied = self.occupied_slots();
            let (slot, tier) = place_gene(activity, &occupied, grid, rng);
            if tier != PlacementTier::Clean {
                trace!("placed {} at {} with tier {:?}", activity.id, slot, tier);
            }
            self.genes.push(Assignment::new(activity.id.clone(), slot));
        }
    }

    /// Move genes off slots held by more than one activity.
    ///
    /// Genes of `locked` activities claim their slots first and never move.
    /// The remaining genes claim slots in random order; losers are removed
    /// and re-placed by [`Chromosome::repair`]. Returns the number of genes moved.
    pub fn resolve_collisions<R: Rng>(
        &mut self,
        activities: &[Activity],
        grid: &TimeGrid,
        locked: &HashSet<String>,
        rng: &mut R,
    ) -> usize {
        let mut order: Vec<usize> = (0..self.genes.len()).collect();
        order.shuffle(rng);
        order.sort_by_key(|&i| !locked.contains(&self.genes[i].activity_id));

        let mut claimed: Vec<TimeSlot> = Vec::with_capacity(self.genes.len());
        let mut colliding = HashSet::new();

        for i in order {
            let slot = self.genes[i].slot;
            if slot.is_in(&claimed) {
                colliding.insert(i);
            } else {
                claimed.push(slot);
            }
        }

        if colliding.is_empty() {
            return 0;
        }

        let mut index = 0;
        self.genes.retain(|_| {
            let keep = !colliding.contains(&index);
            index += 1;
            keep
        });

        self.repair(activities, grid, rng);
        colliding.len()
    }

    /// All genes.
    pub fn genes(&self) -> &[Assignment] {
        &self.genes
    }

    /// Consume the chromosome and return its genes.
    pub fn into_genes(self) -> Vec<Assignment> {
        self.genes
    }

    /// Replace the genes and repair the result.
    pub fn set_genes<R: Rng>(
        &mut self,
        genes: Vec<Assignment>,
        activities: &[Activity],
        grid: &TimeGrid,
        rng: &mut R,
    ) {
        self.genes = genes;
        self.repair(activities, grid, rng);
    }

    /// The gene of the given activity.
    pub fn assignment_for(&self, activity_id: &str) -> Option<&Assignment> {
        self.genes.iter().find(|gene| gene.activity_id == activity_id)
    }

    /// The activity held in `slot`.
    pub fn activity_for_slot(&self, slot: &TimeSlot) -> Option<&str> {
        self.genes
            .iter()
            .find(|gene| gene.slot == *slot)
            .map(|gene| gene.activity_id.as_str())
    }

    /// Whether no gene occupies `slot`.
    pub fn is_slot_available(&self, slot: &TimeSlot) -> bool {
        self.activity_for_slot(slot).is_none()
    }

    /// Slots held by the current genes.
    pub fn occupied_slots(&self) -> Vec<TimeSlot> {
        self.genes.iter().map(|gene| gene.slot).collect()
    }

    /// Put `activity_id` into `slot`, inserting a gene if it has none.
    ///
    /// Fails without touching the chromosome when another activity already
    /// holds the slot.
    pub fn update_assignment(
        &mut self,
        activity_id: &str,
        slot: TimeSlot,
    ) -> Result<(), ChromosomeError> {
        if let Some(holder) = self
            .genes
            .iter()
            .find(|gene| gene.slot == slot && gene.activity_id != activity_id)
        {
            return Err(ChromosomeError::SlotOccupied {
                slot,
                holder: holder.activity_id.clone(),
            });
        }

        match self
            .genes
            .iter_mut()
            .find(|gene| gene.activity_id == activity_id)
        {
            Some(gene) => gene.slot = slot,
            None => self.genes.push(Assignment::new(activity_id, slot)),
        }

        Ok(())
    }

    /// Exchange the slots of two activities. Conflicts are not re-checked.
    pub fn swap_assignments(&mut self, first: &str, second: &str) -> Result<(), ChromosomeError> {
        let a = self.position(first)?;
        let b = self.position(second)?;

        let slot = self.genes[a].slot;
        self.genes[a].slot = self.genes[b].slot;
        self.genes[b].slot = slot;

        Ok(())
    }

    fn position(&self, activity_id: &str) -> Result<usize, ChromosomeError> {
        self.genes
            .iter()
            .position(|gene| gene.activity_id == activity_id)
            .ok_or_else(|| ChromosomeError::UnknownActivity(activity_id.to_string()))
    }

    /// Cached fitness. Only the evaluator writes the true value.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// Number of genes.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}
