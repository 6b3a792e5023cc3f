//! Scheduler service: owns activities, constraints and the current schedule,
//! and drives the genetic algorithm to generate or re-optimize timetables.

use crate::activity::Activity;
use crate::chromosome::{Assignment, Chromosome};
use crate::config::Config;
use crate::constraint::{activity_preferences, Constraint, ConstraintConfig};
use crate::error::SchedulerError;
use crate::evaluator::FitnessEvaluator;
use crate::population::Population;
use crate::schedule::{default_rotation_start, Schedule, ValidationReport};
use crate::time_grid::TimeGrid;
use crate::utils::{rng_from_seed, EvolutionStats, ScheduleRng};
use crate::{Evolution, GeneticAlgorithm};

use itertools::Itertools;
use log::{info, warn};
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Timetabling service. Each instance owns its state exclusively.
pub struct Scheduler {
    activities: Vec<Activity>,
    constraint_config: ConstraintConfig,
    constraints: Vec<Constraint>,
    evaluator: FitnessEvaluator,
    config: Config,
    grid: TimeGrid,
    rng: ScheduleRng,
    current: Option<Schedule>,
    last_stats: Option<EvolutionStats>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new(Config::default())
    }
}

impl Scheduler {
    /// Create a scheduler over the default 5 x 8 grid.
    ///
    /// `config` is checked when a run starts, so an invalid one surfaces as
    /// [`SchedulerError::InvalidConfig`] from the run.
    pub fn new(config: Config) -> Self {
        Self::with_grid(config, TimeGrid::default())
    }

    /// Create a scheduler over a custom grid.
    pub fn with_grid(config: Config, grid: TimeGrid) -> Self {
        Scheduler {
            activities: Vec::new(),
            constraint_config: ConstraintConfig::default(),
            constraints: Vec::new(),
            evaluator: FitnessEvaluator::new(&[], Vec::new(), grid.clone()),
            rng: rng_from_seed(config.seed),
            config,
            grid,
            current: None,
            last_stats: None,
            cancel: None,
        }
    }

    // ------------------------------------------------------------------
    // Activities
    // ------------------------------------------------------------------

    /// Replace the working set of activities.
    pub fn set_activities(&mut self, activities: Vec<Activity>) -> Result<(), SchedulerError> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = activities.iter().find(|a| !seen.insert(a.id.as_str())) {
            return Err(SchedulerError::DuplicateActivity(duplicate.id.clone()));
        }

        self.activities = activities;
        self.rebuild_evaluator();
        Ok(())
    }

    /// Add one activity.
    pub fn add_activity(&mut self, activity: Activity) -> Result<(), SchedulerError> {
        if self.activity(&activity.id).is_some() {
            return Err(SchedulerError::DuplicateActivity(activity.id));
        }

        self.activities.push(activity);
        self.rebuild_evaluator();
        Ok(())
    }

    /// Replace the activity with the same id.
    pub fn update_activity(&mut self, activity: Activity) -> Result<(), SchedulerError> {
        let existing = self
            .activities
            .iter_mut()
            .find(|a| a.id == activity.id)
            .ok_or_else(|| SchedulerError::UnknownActivity(activity.id.clone()))?;

        *existing = activity;
        self.rebuild_evaluator();
        Ok(())
    }

    /// Remove an activity and return it.
    pub fn remove_activity(&mut self, activity_id: &str) -> Result<Activity, SchedulerError> {
        let index = self
            .activities
            .iter()
            .position(|a| a.id == activity_id)
            .ok_or_else(|| SchedulerError::UnknownActivity(activity_id.to_string()))?;

        let removed = self.activities.remove(index);
        self.rebuild_evaluator();
        Ok(removed)
    }

    pub fn activity(&self, activity_id: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == activity_id)
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Replace the declarative constraint configuration.
    pub fn set_constraints(&mut self, config: ConstraintConfig) {
        self.constraint_config = config;
        self.rebuild_evaluator();
    }

    pub fn constraint_config(&self) -> &ConstraintConfig {
        &self.constraint_config
    }

    /// Constraints currently consumed by the evaluator.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Replace the GA parameters. A configured seed resets the random source.
    pub fn set_config(&mut self, config: Config) -> Result<(), SchedulerError> {
        config.validate()?;

        if config.seed.is_some() {
            self.rng = rng_from_seed(config.seed);
        }
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Checked between generations; setting it stops the running search.
    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel = Some(flag);
    }

    // ------------------------------------------------------------------
    // Schedule lifecycle
    // ------------------------------------------------------------------

    /// Evolve a new schedule for the working set.
    ///
    /// When a weekly maximum is configured below the number of activities, a
    /// random subset of that size is scheduled and the rest are left out.
    pub fn generate_schedule(&mut self) -> Result<Schedule, SchedulerError> {
        if self.activities.is_empty() {
            return Err(SchedulerError::NoActivities);
        }
        self.config.validate()?;

        let selected = self.select_activities();
        info!(
            "Generating schedule for {} of {} activities",
            selected.len(),
            self.activities.len()
        );

        let algorithm = self.algorithm(self.config.clone());
        let evolution = algorithm.evolve(&selected, &self.evaluator, &mut self.rng);

        Ok(self.finish(evolution))
    }

    /// Re-solve a schedule while keeping `locked_ids` in their current slots.
    ///
    /// Uses `current` when given, otherwise the schedule held by the scheduler.
    /// Only activities present in that schedule take part, so the number of
    /// assignments is preserved.
    pub fn reoptimize_schedule(
        &mut self,
        current: Option<&Schedule>,
        locked_ids: &HashSet<String>,
    ) -> Result<Schedule, SchedulerError> {
        if self.activities.is_empty() {
            return Err(SchedulerError::NoActivities);
        }
        self.config.validate()?;

        let current = current
            .or(self.current.as_ref())
            .cloned()
            .ok_or(SchedulerError::NoSchedule)?;

        for id in locked_ids.iter().sorted() {
            if self.activity(id).is_none() || current.assignment_for(id).is_none() {
                return Err(SchedulerError::UnknownActivity(id.clone()));
            }
        }

        // Activities of the schedule that still exist in the working set
        let mut run_activities: Vec<Activity> = Vec::with_capacity(current.assignments.len());
        for assignment in &current.assignments {
            match self.activity(&assignment.activity_id) {
                Some(activity) if !run_activities.iter().any(|a| a.id == activity.id) => {
                    run_activities.push(activity.clone())
                }
                Some(_) => {}
                None => warn!(
                    "Dropping assignment of unknown activity {}",
                    assignment.activity_id
                ),
            }
        }

        let locked_genes: Vec<Assignment> = current
            .assignments
            .iter()
            .filter(|assignment| locked_ids.contains(&assignment.activity_id))
            .unique_by(|assignment| assignment.activity_id.clone())
            .map(|assignment| Assignment::new(assignment.activity_id.clone(), assignment.slot.weekly()))
            .collect();

        self.validate_locked(&locked_genes)?;

        let mut config = self.config.clone();
        config.mutation_rate = self.config.reoptimize_mutation_rate();

        info!(
            "Re-optimizing {} activities around {} locked assignments (mutation rate {:.2})",
            run_activities.len(),
            locked_genes.len(),
            config.mutation_rate
        );

        // Every seed starts from the locked genes; repair fills in the rest
        let seeds: Vec<Chromosome> = (0..config.population_size)
            .map(|_| {
                Chromosome::from_genes(
                    &run_activities,
                    &self.grid,
                    locked_genes.clone(),
                    &mut self.rng,
                )
            })
            .collect();

        let algorithm = self.algorithm(config).with_locked(locked_ids.clone());
        let evolution = algorithm.evolve_with_initial_population(
            Population::from_chromosomes(seeds),
            &run_activities,
            &self.evaluator,
            &mut self.rng,
        );

        Ok(self.finish(evolution))
    }

    /// Check an arbitrary assignment list against the current activities
    /// and constraints.
    pub fn validate_schedule(&self, assignments: &[Assignment]) -> ValidationReport {
        self.evaluator.evaluate(assignments).into()
    }

    /// The schedule produced by the last run, or installed by a caller.
    pub fn current_schedule(&self) -> Option<&Schedule> {
        self.current.as_ref()
    }

    /// Install a schedule, e.g. one loaded from storage.
    pub fn set_current_schedule(&mut self, schedule: Schedule) {
        self.current = Some(schedule);
    }

    /// Statistics of the last run.
    pub fn last_stats(&self) -> Option<&EvolutionStats> {
        self.last_stats.as_ref()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn rebuild_evaluator(&mut self) {
        self.constraints = self
            .constraint_config
            .translate()
            .into_iter()
            .chain(activity_preferences(&self.activities))
            .unique_by(|constraint| constraint.id.clone())
            .collect();

        self.evaluator =
            FitnessEvaluator::new(&self.activities, self.constraints.clone(), self.grid.clone());
    }

    fn algorithm(&self, config: Config) -> GeneticAlgorithm {
        let algorithm = GeneticAlgorithm::new(config, self.grid.clone());
        match &self.cancel {
            Some(flag) => algorithm.with_cancel_flag(Arc::clone(flag)),
            None => algorithm,
        }
    }

    /// Activities taking part in a generation run.
    fn select_activities(&mut self) -> Vec<Activity> {
        match self.constraint_config.hard.max_per_week {
            Some(max) if max < self.activities.len() => {
                warn!(
                    "Weekly maximum of {} leaves {} activities unscheduled",
                    max,
                    self.activities.len() - max
                );
                let chosen: HashSet<&str> = self
                    .activities
                    .choose_multiple(&mut self.rng, max)
                    .map(|a| a.id.as_str())
                    .collect();
                self.activities
                    .iter()
                    .filter(|a| chosen.contains(a.id.as_str()))
                    .cloned()
                    .collect()
            }
            _ => self.activities.clone(),
        }
    }

    /// Locked genes must not share a slot or sit in their own conflict slots.
    fn validate_locked(&self, locked: &[Assignment]) -> Result<(), SchedulerError> {
        for (i, gene) in locked.iter().enumerate() {
            if let Some(other) = locked[..i].iter().find(|other| other.slot == gene.slot) {
                return Err(SchedulerError::LockedConflict {
                    activity_ids: vec![other.activity_id.clone(), gene.activity_id.clone()],
                    slot: gene.slot,
                    reason: "both are locked into the same slot".to_string(),
                });
            }

            let declared = self
                .activity(&gene.activity_id)
                .map_or(false, |activity| activity.conflicts_with(&gene.slot));
            if declared {
                return Err(SchedulerError::LockedConflict {
                    activity_ids: vec![gene.activity_id.clone()],
                    slot: gene.slot,
                    reason: "the slot is in the activity's conflict list".to_string(),
                });
            }
        }

        Ok(())
    }

    fn finish(&mut self, evolution: Evolution) -> Schedule {
        let Evolution {
            best,
            evaluation,
            stats,
        } = evolution;

        let rotation_start = self
            .config
            .rotation_start
            .unwrap_or_else(default_rotation_start);
        let schedule =
            Schedule::from_evaluation(best.into_genes(), &evaluation).with_calendar(rotation_start);

        info!(
            "Schedule ready: {} assignments, fitness {:.2}, {} hard violations",
            schedule.assignments.len(),
            schedule.fitness,
            schedule.hard_violations
        );

        self.current = Some(schedule.clone());
        self.last_stats = Some(stats);
        schedule
    }
}
