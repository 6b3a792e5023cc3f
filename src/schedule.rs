//! Schedule representation returned to callers.

use crate::chromosome::Assignment;
use crate::evaluator::{Evaluation, Violation};
use crate::time_grid::Day;
use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.weekday().num_days_from_monday() as u64)
}

/// Rotation start used when none is configured: this week's Monday.
pub fn default_rotation_start() -> NaiveDate {
    week_start(Local::now().date_naive())
}

/// A finished timetable with its score.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// One assignment per scheduled activity, ordered by day and period
    pub assignments: Vec<Assignment>,
    /// Fitness score of the assignments
    pub fitness: f64,
    /// Number of broken hard rules
    pub hard_violations: usize,
    /// Number of satisfied soft constraints
    pub soft_satisfied: usize,
    /// Number of configured soft constraints
    pub soft_total: usize,
    /// First day of the dated rotation week
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Last school day of the dated rotation week
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Assignments grouped by day, ordered by period
    #[serde(default)]
    pub weekly_breakdown: BTreeMap<Day, Vec<Assignment>>,
}

impl Schedule {
    /// Wrap evaluated genes into a schedule.
    pub fn from_evaluation(assignments: Vec<Assignment>, evaluation: &Evaluation) -> Self {
        let mut schedule = Schedule {
            assignments,
            fitness: evaluation.fitness,
            hard_violations: evaluation.hard_violations,
            soft_satisfied: evaluation.soft_satisfied,
            soft_total: evaluation.soft_total,
            start_date: None,
            end_date: None,
            weekly_breakdown: BTreeMap::new(),
        };
        schedule.normalize();
        schedule
    }

    /// Date every assignment within the rotation week starting at `rotation_start`.
    ///
    /// The start is moved back to the Monday of its week.
    pub fn with_calendar(mut self, rotation_start: NaiveDate) -> Self {
        let monday = week_start(rotation_start);

        for assignment in self.assignments.iter_mut() {
            let date = monday + Days::new(assignment.slot.day.index() as u64);
            assignment.slot = assignment.slot.weekly().with_date(date);
        }

        self.start_date = Some(monday);
        self.end_date = Some(monday + Days::new(4));
        self.normalize();
        self
    }

    /// Sort assignments and rebuild the weekly breakdown.
    fn normalize(&mut self) {
        self.assignments
            .sort_by_key(|assignment| (assignment.slot.day, assignment.slot.period));

        self.weekly_breakdown.clear();
        for assignment in &self.assignments {
            self.weekly_breakdown
                .entry(assignment.slot.day)
                .or_default()
                .push(assignment.clone());
        }
    }

    /// The assignment of the given activity.
    pub fn assignment_for(&self, activity_id: &str) -> Option<&Assignment> {
        self.assignments
            .iter()
            .find(|assignment| assignment.activity_id == activity_id)
    }

    /// Number of activities held on `day`.
    pub fn count_on(&self, day: Day) -> usize {
        self.weekly_breakdown.get(&day).map_or(0, Vec::len)
    }

    /// Share of soft constraints satisfied; 1.0 when there are none.
    pub fn soft_ratio(&self) -> f64 {
        if self.soft_total == 0 {
            1.0
        } else {
            self.soft_satisfied as f64 / self.soft_total as f64
        }
    }

    pub fn is_valid(&self) -> bool {
        self.hard_violations == 0
    }
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Schedule:")?;
        writeln!(f, "  Fitness: {:.2}", self.fitness)?;
        writeln!(f, "  Hard Violations: {}", self.hard_violations)?;
        writeln!(
            f,
            "  Soft Satisfied: {}/{}",
            self.soft_satisfied, self.soft_total
        )?;

        for (day, assignments) in &self.weekly_breakdown {
            let entries: Vec<String> = assignments
                .iter()
                .map(|a| format!("P{}={}", a.slot.period, a.activity_id))
                .collect();
            writeln!(f, "  {}: {}", day, entries.join(", "))?;
        }

        Ok(())
    }
}

/// Outcome of checking an arbitrary assignment list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub fitness: f64,
    pub hard_violations: usize,
    pub soft_satisfied: usize,
    pub soft_total: usize,
    pub violations: Vec<Violation>,
}

impl From<Evaluation> for ValidationReport {
    fn from(evaluation: Evaluation) -> Self {
        ValidationReport {
            is_valid: evaluation.is_valid(),
            fitness: evaluation.fitness,
            hard_violations: evaluation.hard_violations,
            soft_satisfied: evaluation.soft_satisfied,
            soft_total: evaluation.soft_total,
            violations: evaluation.violations,
        }
    }
}
