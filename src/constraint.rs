//! Constraints and the declarative configuration they are translated from.

use crate::activity::Activity;
use crate::time_grid::TimeSlot;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Whether a constraint must hold or only shapes the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    Hard,
    Soft,
}

/// The rule a constraint enforces, with its typed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintRule {
    /// The activity must be held exactly in `slot`.
    FixedSlot { activity_id: String, slot: TimeSlot },
    /// Nothing may be held in `slots`; restricted to one activity when
    /// `activity_id` is set, otherwise applying to the whole timetable.
    Unavailable {
        activity_id: Option<String>,
        slots: Vec<TimeSlot>,
    },
    /// Every grid day must hold between `min` and `max` activities.
    DailyCapacity {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// The week must hold between `min` and `max` activities.
    WeeklyCapacity {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Preferred and avoided slots, for one activity or for all of them.
    Preference {
        activity_id: Option<String>,
        preferred: Vec<TimeSlot>,
        avoided: Vec<TimeSlot>,
    },
    /// Spread activities evenly across the days of the grid.
    WorkloadBalance,
    /// A constraint kind the evaluator does not know. Always satisfied.
    Custom { name: String },
}

fn slot_key(slot: &TimeSlot) -> String {
    match slot.date {
        Some(date) => format!("{}{}@{}", slot.day.short_name(), slot.period, date),
        None => format!("{}{}", slot.day.short_name(), slot.period),
    }
}

fn bound_key(bound: Option<usize>) -> String {
    bound.map_or_else(|| "none".to_string(), |b| b.to_string())
}

impl ConstraintRule {
    /// Stable id derived from the rule's parameters.
    pub fn derive_id(&self) -> String {
        match self {
            ConstraintRule::FixedSlot { activity_id, slot } => {
                format!("fixed-{}-{}", activity_id, slot_key(slot))
            }
            ConstraintRule::Unavailable { activity_id, slots } => format!(
                "unavailable-{}-{}",
                activity_id.as_deref().unwrap_or("all"),
                slots.iter().map(slot_key).join("-")
            ),
            ConstraintRule::DailyCapacity { min, max } => {
                format!("daily-capacity-{}-{}", bound_key(*min), bound_key(*max))
            }
            ConstraintRule::WeeklyCapacity { min, max } => {
                format!("weekly-capacity-{}-{}", bound_key(*min), bound_key(*max))
            }
            ConstraintRule::Preference { activity_id, .. } => {
                format!("preference-{}", activity_id.as_deref().unwrap_or("all"))
            }
            ConstraintRule::WorkloadBalance => "workload-balance".to_string(),
            ConstraintRule::Custom { name } => format!("custom-{}", name),
        }
    }
}

/// A constraint as consumed by the fitness evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub kind: ConstraintKind,
    pub weight: f64,
    pub rule: ConstraintRule,
}

impl Constraint {
    /// Hard constraint with a derived id.
    pub fn hard(rule: ConstraintRule) -> Self {
        Constraint {
            id: rule.derive_id(),
            kind: ConstraintKind::Hard,
            weight: 1.0,
            rule,
        }
    }

    /// Soft constraint with a derived id.
    pub fn soft(rule: ConstraintRule, weight: f64) -> Self {
        Constraint {
            id: rule.derive_id(),
            kind: ConstraintKind::Soft,
            weight,
            rule,
        }
    }

    pub fn is_hard(&self) -> bool {
        self.kind == ConstraintKind::Hard
    }
}

fn default_weight() -> f64 {
    1.0
}

/// An activity pinned to a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedSlot {
    pub activity_id: String,
    pub slot: TimeSlot,
}

/// Slots that are off limits, for one activity or for the whole timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalConflict {
    #[serde(default)]
    pub activity_id: Option<String>,
    pub slots: Vec<TimeSlot>,
}

/// Preferred and avoided slots, for one activity or for the whole timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotPreference {
    #[serde(default)]
    pub activity_id: Option<String>,
    #[serde(default)]
    pub preferred: Vec<TimeSlot>,
    #[serde(default)]
    pub avoided: Vec<TimeSlot>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardConstraints {
    pub max_per_day: Option<usize>,
    pub min_per_day: Option<usize>,
    pub max_per_week: Option<usize>,
    pub min_per_week: Option<usize>,
    pub fixed_slots: Vec<FixedSlot>,
    pub personal_conflicts: Vec<PersonalConflict>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftConstraints {
    pub preferences: Vec<SlotPreference>,
    pub balance_workload: bool,
    pub workload_weight: f64,
}

impl Default for SoftConstraints {
    fn default() -> Self {
        SoftConstraints {
            preferences: Vec::new(),
            balance_workload: false,
            workload_weight: default_weight(),
        }
    }
}

/// Declarative hard/soft constraint settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintConfig {
    pub hard: HardConstraints,
    pub soft: SoftConstraints,
}

impl ConstraintConfig {
    pub fn new() -> Self {
        ConstraintConfig::default()
    }

    /// Set the daily maximum.
    pub fn with_max_per_day(mut self, max: usize) -> Self {
        self.hard.max_per_day = Some(max);
        self
    }

    /// Set the daily minimum.
    pub fn with_min_per_day(mut self, min: usize) -> Self {
        self.hard.min_per_day = Some(min);
        self
    }

    /// Set the weekly maximum.
    pub fn with_max_per_week(mut self, max: usize) -> Self {
        self.hard.max_per_week = Some(max);
        self
    }

    /// Set the weekly minimum.
    pub fn with_min_per_week(mut self, min: usize) -> Self {
        self.hard.min_per_week = Some(min);
        self
    }

    /// Pin an activity to a slot.
    pub fn with_fixed_slot(mut self, activity_id: impl Into<String>, slot: TimeSlot) -> Self {
        self.hard.fixed_slots.push(FixedSlot {
            activity_id: activity_id.into(),
            slot,
        });
        self
    }

    /// Add off-limit slots.
    pub fn with_personal_conflict(
        mut self,
        activity_id: Option<String>,
        slots: Vec<TimeSlot>,
    ) -> Self {
        self.hard
            .personal_conflicts
            .push(PersonalConflict { activity_id, slots });
        self
    }

    /// Add a slot preference.
    pub fn with_preference(mut self, preference: SlotPreference) -> Self {
        self.soft.preferences.push(preference);
        self
    }

    /// Enable the workload-balance preference.
    pub fn with_balanced_workload(mut self, weight: f64) -> Self {
        self.soft.balance_workload = true;
        self.soft.workload_weight = weight;
        self
    }

    /// Translate into evaluator constraints. Translation is pure, so the
    /// same configuration always yields the same ids.
    pub fn translate(&self) -> Vec<Constraint> {
        let hard = &self.hard;
        let soft = &self.soft;
        let mut constraints = Vec::new();

        if hard.min_per_day.is_some() || hard.max_per_day.is_some() {
            constraints.push(Constraint::hard(ConstraintRule::DailyCapacity {
                min: hard.min_per_day,
                max: hard.max_per_day,
            }));
        }

        if hard.min_per_week.is_some() || hard.max_per_week.is_some() {
            constraints.push(Constraint::hard(ConstraintRule::WeeklyCapacity {
                min: hard.min_per_week,
                max: hard.max_per_week,
            }));
        }

        for fixed in &hard.fixed_slots {
            constraints.push(Constraint::hard(ConstraintRule::FixedSlot {
                activity_id: fixed.activity_id.clone(),
                slot: fixed.slot,
            }));
        }

        for conflict in hard.personal_conflicts.iter().filter(|c| !c.slots.is_empty()) {
            constraints.push(Constraint::hard(ConstraintRule::Unavailable {
                activity_id: conflict.activity_id.clone(),
                slots: conflict.slots.clone(),
            }));
        }

        for preference in &soft.preferences {
            constraints.push(Constraint::soft(
                ConstraintRule::Preference {
                    activity_id: preference.activity_id.clone(),
                    preferred: preference.preferred.clone(),
                    avoided: preference.avoided.clone(),
                },
                preference.weight,
            ));
        }

        if soft.balance_workload {
            constraints.push(Constraint::soft(
                ConstraintRule::WorkloadBalance,
                soft.workload_weight,
            ));
        }

        constraints
            .into_iter()
            .unique_by(|constraint| constraint.id.clone())
            .collect()
    }
}

/// Soft preference constraints declared on the activities themselves.
pub fn activity_preferences(activities: &[Activity]) -> Vec<Constraint> {
    activities
        .iter()
        .filter(|activity| activity.has_preferences())
        .map(|activity| {
            Constraint::soft(
                ConstraintRule::Preference {
                    activity_id: Some(activity.id.clone()),
                    preferred: activity.preferred_slots.clone(),
                    avoided: activity.avoided_slots.clone(),
                },
                default_weight(),
            )
        })
        .collect()
}
