//! Error types for the timetabling engine.

use crate::time_grid::TimeSlot;

/// Errors raised by the [`Scheduler`](crate::scheduler::Scheduler) before any
/// evolutionary work begins.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("no activities to schedule")]
    NoActivities,
    #[error("no schedule available to re-optimize")]
    NoSchedule,
    #[error("locked activities {} conflict at {slot}: {reason}", .activity_ids.join(", "))]
    LockedConflict {
        activity_ids: Vec<String>,
        slot: TimeSlot,
        reason: String,
    },
    #[error("unknown activity: {0}")]
    UnknownActivity(String),
    #[error("duplicate activity id: {0}")]
    DuplicateActivity(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Rejected chromosome edits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChromosomeError {
    #[error("slot {slot} is already held by activity {holder}")]
    SlotOccupied { slot: TimeSlot, holder: String },
    #[error("activity {0} has no gene in this chromosome")]
    UnknownActivity(String),
}

/// Invalid GA parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
    #[error("{name} must be between 0.0 and 1.0, got: {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[error("{name} must be a finite, non-negative number, got: {value}")]
    InvalidFactor { name: &'static str, value: f64 },
}
