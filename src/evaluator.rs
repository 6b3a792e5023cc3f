//! Fitness evaluation of candidate schedules against hard and soft constraints.

use crate::activity::Activity;
use crate::chromosome::{Assignment, Chromosome};
use crate::constraint::{Constraint, ConstraintKind, ConstraintRule};
use crate::time_grid::{Day, TimeGrid, TimeSlot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Score every evaluation starts from.
pub const BASE_SCORE: f64 = 1000.0;
/// Subtracted once per hard violation.
pub const HARD_PENALTY: f64 = 100.0;
/// Added per satisfied soft constraint, scaled by its weight.
pub const SOFT_REWARD: f64 = 10.0;

/// Constraint id reported when an activity sits in one of its own conflict slots.
pub const ACTIVITY_CONFLICT_ID: &str = "activity-conflict";
/// Constraint id reported when two activities share a slot.
pub const DOUBLE_BOOKING_ID: &str = "double-booking";

/// A single broken rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub constraint_id: String,
    pub kind: ConstraintKind,
    pub activity_id: Option<String>,
    pub slot: Option<TimeSlot>,
    pub day: Option<Day>,
    pub description: String,
}

impl Violation {
    fn new(constraint_id: &str, kind: ConstraintKind, description: String) -> Self {
        Violation {
            constraint_id: constraint_id.to_string(),
            kind,
            activity_id: None,
            slot: None,
            day: None,
            description,
        }
    }

    fn at(mut self, gene: &Assignment) -> Self {
        self.activity_id = Some(gene.activity_id.clone());
        self.slot = Some(gene.slot);
        self.day = Some(gene.slot.day);
        self
    }

    fn on_day(mut self, day: Day) -> Self {
        self.day = Some(day);
        self
    }
}

/// Result of scoring one gene list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub fitness: f64,
    pub hard_violations: usize,
    pub soft_satisfied: usize,
    pub soft_total: usize,
    pub violations: Vec<Violation>,
}

impl Evaluation {
    /// Share of configured soft constraints that hold; 1.0 when there are none.
    pub fn soft_ratio(&self) -> f64 {
        if self.soft_total == 0 {
            1.0
        } else {
            self.soft_satisfied as f64 / self.soft_total as f64
        }
    }

    /// A schedule is valid when no hard rule is broken.
    pub fn is_valid(&self) -> bool {
        self.hard_violations == 0
    }

    /// Hard violations only.
    pub fn hard_details(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|violation| violation.kind == ConstraintKind::Hard)
    }
}

/// Scores gene lists against the working activities and constraint set.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    activities: HashMap<String, Activity>,
    constraints: Vec<Constraint>,
    grid: TimeGrid,
}

impl FitnessEvaluator {
    pub fn new(activities: &[Activity], constraints: Vec<Constraint>, grid: TimeGrid) -> Self {
        FitnessEvaluator {
            activities: index_activities(activities),
            constraints,
            grid,
        }
    }

    /// Replace the activity lookup.
    pub fn set_activities(&mut self, activities: &[Activity]) {
        self.activities = index_activities(activities);
    }

    /// Replace the constraint list.
    pub fn set_constraints(&mut self, constraints: Vec<Constraint>) {
        self.constraints = constraints;
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Score a chromosome and store the result in its fitness cache.
    pub fn evaluate_chromosome(&self, chromosome: &mut Chromosome) -> Evaluation {
        let evaluation = self.evaluate(chromosome.genes());
        chromosome.set_fitness(evaluation.fitness);
        evaluation
    }

    /// Score an arbitrary assignment list.
    pub fn evaluate(&self, genes: &[Assignment]) -> Evaluation {
        let mut violations = self.intrinsic_violations(genes);
        let mut soft_satisfied = 0;
        let mut soft_total = 0;
        let mut reward = 0.0;

        for constraint in &self.constraints {
            let found = self.check(constraint, genes);

            if constraint.kind == ConstraintKind::Soft {
                soft_total += 1;
                if found.is_empty() {
                    soft_satisfied += 1;
                    reward += SOFT_REWARD * constraint.weight;
                }
            }

            violations.extend(found);
        }

        let hard_violations = violations
            .iter()
            .filter(|violation| violation.kind == ConstraintKind::Hard)
            .count();

        let fitness = (BASE_SCORE - HARD_PENALTY * hard_violations as f64 + reward).max(0.0);

        Evaluation {
            fitness,
            hard_violations,
            soft_satisfied,
            soft_total,
            violations,
        }
    }

    /// Violations that hold regardless of the configured constraints: an
    /// activity in its own conflict slot, or two activities in one slot.
    fn intrinsic_violations(&self, genes: &[Assignment]) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (i, gene) in genes.iter().enumerate() {
            if let Some(activity) = self.activities.get(&gene.activity_id) {
                if activity.conflicts_with(&gene.slot) {
                    violations.push(
                        Violation::new(
                            ACTIVITY_CONFLICT_ID,
                            ConstraintKind::Hard,
                            format!("{} is unavailable at {}", activity.name, gene.slot),
                        )
                        .at(gene),
                    );
                }
            }

            if let Some(holder) = genes[..i].iter().find(|other| other.slot == gene.slot) {
                violations.push(
                    Violation::new(
                        DOUBLE_BOOKING_ID,
                        ConstraintKind::Hard,
                        format!(
                            "{} and {} are both scheduled at {}",
                            holder.activity_id, gene.activity_id, gene.slot
                        ),
                    )
                    .at(gene),
                );
            }
        }

        violations
    }

    fn check(&self, constraint: &Constraint, genes: &[Assignment]) -> Vec<Violation> {
        let id = constraint.id.as_str();
        let kind = constraint.kind;

        match &constraint.rule {
            ConstraintRule::FixedSlot { activity_id, slot } => genes
                .iter()
                .filter(|gene| gene.activity_id == *activity_id && gene.slot != *slot)
                .map(|gene| {
                    Violation::new(
                        id,
                        kind,
                        format!("{} must be held at {}, found at {}", activity_id, slot, gene.slot),
                    )
                    .at(gene)
                })
                .collect(),

            ConstraintRule::Unavailable { activity_id, slots } => genes
                .iter()
                .filter(|gene| applies_to(activity_id, gene) && gene.slot.is_in(slots))
                .map(|gene| {
                    Violation::new(
                        id,
                        kind,
                        format!("{} is scheduled in unavailable slot {}", gene.activity_id, gene.slot),
                    )
                    .at(gene)
                })
                .collect(),

            ConstraintRule::DailyCapacity { min, max } => self
                .daily_counts(genes)
                .into_iter()
                .filter(|(_, count)| out_of_bounds(*count, *min, *max))
                .map(|(day, count)| {
                    Violation::new(
                        id,
                        kind,
                        format!(
                            "{} holds {} activities, allowed {}",
                            day,
                            count,
                            describe_bounds(*min, *max)
                        ),
                    )
                    .on_day(day)
                })
                .collect(),

            ConstraintRule::WeeklyCapacity { min, max } => {
                if out_of_bounds(genes.len(), *min, *max) {
                    vec![Violation::new(
                        id,
                        kind,
                        format!(
                            "week holds {} activities, allowed {}",
                            genes.len(),
                            describe_bounds(*min, *max)
                        ),
                    )]
                } else {
                    Vec::new()
                }
            }

            ConstraintRule::Preference {
                activity_id,
                preferred,
                avoided,
            } => genes
                .iter()
                .filter(|gene| applies_to(activity_id, gene))
                .filter_map(|gene| {
                    let description = if gene.slot.is_in(avoided) {
                        Some(format!("{} is in avoided slot {}", gene.activity_id, gene.slot))
                    } else if !preferred.is_empty() && !gene.slot.is_in(preferred) {
                        Some(format!("{} is outside its preferred slots", gene.activity_id))
                    } else {
                        None
                    };
                    description
                        .map(|description| Violation::new(id, kind, description).at(gene))
                })
                .collect(),

            ConstraintRule::WorkloadBalance => {
                let counts = self.daily_counts(genes);
                let busiest = counts.iter().max_by_key(|(_, count)| *count);
                let quietest = counts.iter().min_by_key(|(_, count)| *count);

                match (busiest, quietest) {
                    (Some(&(busy_day, high)), Some(&(quiet_day, low))) if high - low > 1 => {
                        vec![Violation::new(
                            id,
                            kind,
                            format!(
                                "{} holds {} activities while {} holds {}",
                                busy_day, high, quiet_day, low
                            ),
                        )
                        .on_day(busy_day)]
                    }
                    _ => Vec::new(),
                }
            }

            ConstraintRule::Custom { .. } => Vec::new(),
        }
    }

    /// Activity count for every day of the grid, empty days included.
    fn daily_counts(&self, genes: &[Assignment]) -> Vec<(Day, usize)> {
        self.grid
            .days
            .iter()
            .map(|&day| {
                let count = genes.iter().filter(|gene| gene.slot.day == day).count();
                (day, count)
            })
            .collect()
    }
}

fn index_activities(activities: &[Activity]) -> HashMap<String, Activity> {
    activities
        .iter()
        .map(|activity| (activity.id.clone(), activity.clone()))
        .collect()
}

fn applies_to(activity_id: &Option<String>, gene: &Assignment) -> bool {
    activity_id
        .as_ref()
        .map_or(true, |id| *id == gene.activity_id)
}

fn out_of_bounds(count: usize, min: Option<usize>, max: Option<usize>) -> bool {
    min.map_or(false, |min| count < min) || max.map_or(false, |max| count > max)
}

fn describe_bounds(min: Option<usize>, max: Option<usize>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{}..={}", min, max),
        (Some(min), None) => format!("at least {}", min),
        (None, Some(max)) => format!("at most {}", max),
        (None, None) => "any number".to_string(),
    }
}
