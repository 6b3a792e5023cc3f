//! Activities ("classes") that need one weekly slot each.

use crate::time_grid::TimeSlot;
use serde::{Deserialize, Serialize};

/// A recurring class to be placed on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier within the working set
    pub id: String,
    /// Display name
    pub name: String,
    /// Slots this activity declared itself unavailable for
    #[serde(default)]
    pub conflicts: Vec<TimeSlot>,
    /// Slots this activity would like to be held in
    #[serde(default)]
    pub preferred_slots: Vec<TimeSlot>,
    /// Slots this activity would rather avoid
    #[serde(default)]
    pub avoided_slots: Vec<TimeSlot>,
}

impl Activity {
    /// Create an activity with no conflicts or preferences.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Activity {
            id: id.into(),
            name: name.into(),
            conflicts: Vec::new(),
            preferred_slots: Vec::new(),
            avoided_slots: Vec::new(),
        }
    }

    /// Set the declared conflict slots.
    pub fn with_conflicts(mut self, conflicts: Vec<TimeSlot>) -> Self {
        self.conflicts = conflicts;
        self
    }

    /// Set the preferred slots.
    pub fn with_preferred_slots(mut self, slots: Vec<TimeSlot>) -> Self {
        self.preferred_slots = slots;
        self
    }

    /// Set the avoided slots.
    pub fn with_avoided_slots(mut self, slots: Vec<TimeSlot>) -> Self {
        self.avoided_slots = slots;
        self
    }

    /// Whether the activity declared `slot` unavailable.
    pub fn conflicts_with(&self, slot: &TimeSlot) -> bool {
        slot.is_in(&self.conflicts)
    }

    /// Whether the activity carries any slot preference.
    pub fn has_preferences(&self) -> bool {
        !self.preferred_slots.is_empty() || !self.avoided_slots.is_empty()
    }
}

/// Find an activity by id.
pub fn find_activity<'a>(activities: &'a [Activity], id: &str) -> Option<&'a Activity> {
    activities.iter().find(|activity| activity.id == id)
}
