//! Integration tests for the scheduler service.

use chrono::{Datelike, NaiveDate, Weekday};
use ga_timetable::activity::Activity;
use ga_timetable::chromosome::Assignment;
use ga_timetable::config::Config;
use ga_timetable::constraint::ConstraintConfig;
use ga_timetable::error::{ConfigError, SchedulerError};
use ga_timetable::evaluator::FitnessEvaluator;
use ga_timetable::schedule::Schedule;
use ga_timetable::scheduler::Scheduler;
use ga_timetable::time_grid::{Day, TimeGrid, TimeSlot};
use std::collections::HashSet;

fn create_activities(n: usize) -> Vec<Activity> {
    (0..n)
        .map(|i| Activity::new(format!("A{}", i), format!("Class {}", i)))
        .collect()
}

fn create_test_scheduler(activities: Vec<Activity>, config: Config) -> Scheduler {
    let mut scheduler = Scheduler::new(config);
    scheduler.set_activities(activities).unwrap();
    scheduler
}

fn small_config() -> Config {
    Config::new()
        .with_population_size(30)
        .with_generations(50)
        .with_seed(42)
}

/// An undated schedule built directly from assignments.
fn schedule_from(genes: Vec<Assignment>) -> Schedule {
    let evaluation = FitnessEvaluator::new(&[], Vec::new(), TimeGrid::default()).evaluate(&genes);
    Schedule::from_evaluation(genes, &evaluation)
}

fn locked(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[test]
fn test_generate_without_activities_fails() {
    let mut scheduler = Scheduler::new(small_config());

    let result = scheduler.generate_schedule();

    assert!(matches!(result, Err(SchedulerError::NoActivities)));
    assert!(scheduler.current_schedule().is_none());
}

#[test]
fn test_generate_schedules_every_activity() {
    let activities = create_activities(8);
    let mut scheduler = create_test_scheduler(activities.clone(), small_config());

    let schedule = scheduler.generate_schedule().unwrap();

    assert_eq!(schedule.assignments.len(), 8);
    for activity in &activities {
        assert!(schedule.assignment_for(&activity.id).is_some());
    }
    assert!(schedule.is_valid());
    assert_eq!(scheduler.current_schedule(), Some(&schedule));
    assert!(scheduler.last_stats().is_some());
}

#[test]
fn test_daily_maximum_is_respected() {
    // Ten activities, at most two per day: exactly two every day
    let config = small_config()
        .with_population_size(60)
        .with_generations(200)
        .with_mutation_rate(0.3);
    let mut scheduler = create_test_scheduler(create_activities(10), config);
    scheduler.set_constraints(ConstraintConfig::new().with_max_per_day(2));

    let schedule = scheduler.generate_schedule().unwrap();

    assert_eq!(schedule.assignments.len(), 10);
    for day in Day::ALL {
        assert!(
            schedule.count_on(day) <= 2,
            "{} holds {} activities",
            day,
            schedule.count_on(day)
        );
    }
    assert_eq!(schedule.hard_violations, 0);
}

#[test]
fn test_weekly_maximum_limits_assignments() {
    let mut scheduler = create_test_scheduler(create_activities(10), small_config());
    scheduler.set_constraints(ConstraintConfig::new().with_max_per_week(5));

    let schedule = scheduler.generate_schedule().unwrap();

    assert!(schedule.assignments.len() <= 5);
    assert_eq!(schedule.hard_violations, 0);
}

#[test]
fn test_single_legal_slot_is_found() {
    let grid = TimeGrid::default();
    let only = TimeSlot::new(Day::Monday, 1);
    let blocked: Vec<TimeSlot> = grid.slots().into_iter().filter(|s| *s != only).collect();

    let mut activities = create_activities(5);
    activities.push(Activity::new("C", "Choir").with_conflicts(blocked));
    let mut scheduler = create_test_scheduler(activities, small_config());

    let schedule = scheduler.generate_schedule().unwrap();

    assert_eq!(schedule.hard_violations, 0);
    let slot = schedule.assignment_for("C").unwrap().slot;
    assert_eq!((slot.day, slot.period), (Day::Monday, 1));
}

#[test]
fn test_fixed_slot_constraint() {
    let config = small_config()
        .with_population_size(50)
        .with_generations(150)
        .with_mutation_rate(0.5);
    let mut scheduler = create_test_scheduler(create_activities(6), config);
    scheduler.set_constraints(
        ConstraintConfig::new().with_fixed_slot("A2", TimeSlot::new(Day::Thursday, 5)),
    );

    let schedule = scheduler.generate_schedule().unwrap();

    assert_eq!(schedule.hard_violations, 0);
    let slot = schedule.assignment_for("A2").unwrap().slot;
    assert_eq!((slot.day, slot.period), (Day::Thursday, 5));
}

#[test]
fn test_reoptimize_keeps_locked_assignments() {
    let activities: Vec<Activity> = ["A", "B", "C", "D", "E", "F"]
        .iter()
        .map(|id| Activity::new(*id, format!("Class {}", id)))
        .collect();
    let mut scheduler = create_test_scheduler(activities, small_config());
    scheduler.set_constraints(ConstraintConfig::new().with_max_per_day(2));

    let original = scheduler.generate_schedule().unwrap();
    let reoptimized = scheduler
        .reoptimize_schedule(Some(&original), &locked(&["A", "C"]))
        .unwrap();

    assert_eq!(reoptimized.assignments.len(), original.assignments.len());
    for id in ["A", "C"] {
        let before = original.assignment_for(id).unwrap().slot;
        let after = reoptimized.assignment_for(id).unwrap().slot;
        assert_eq!((before.day, before.period), (after.day, after.period));
    }
}

#[test]
fn test_reoptimize_uses_current_schedule() {
    let mut scheduler = create_test_scheduler(create_activities(5), small_config());
    let original = scheduler.generate_schedule().unwrap();

    let reoptimized = scheduler
        .reoptimize_schedule(None, &locked(&["A1"]))
        .unwrap();

    let before = original.assignment_for("A1").unwrap().slot;
    let after = reoptimized.assignment_for("A1").unwrap().slot;
    assert_eq!((before.day, before.period), (after.day, after.period));
}

#[test]
fn test_reoptimize_without_schedule_fails() {
    let mut scheduler = create_test_scheduler(create_activities(3), small_config());

    let result = scheduler.reoptimize_schedule(None, &HashSet::new());

    assert!(matches!(result, Err(SchedulerError::NoSchedule)));
}

#[test]
fn test_reoptimize_without_activities_fails() {
    let mut scheduler = Scheduler::new(small_config());
    let schedule = schedule_from(vec![Assignment::new("A0", TimeSlot::new(Day::Monday, 1))]);

    let result = scheduler.reoptimize_schedule(Some(&schedule), &HashSet::new());

    assert!(matches!(result, Err(SchedulerError::NoActivities)));
}

#[test]
fn test_reoptimize_rejects_unknown_locked_id() {
    let mut scheduler = create_test_scheduler(create_activities(2), small_config());
    let schedule = schedule_from(vec![
        Assignment::new("A0", TimeSlot::new(Day::Monday, 1)),
        Assignment::new("A1", TimeSlot::new(Day::Monday, 2)),
    ]);

    let result = scheduler.reoptimize_schedule(Some(&schedule), &locked(&["ghost"]));

    assert!(matches!(result, Err(SchedulerError::UnknownActivity(id)) if id == "ghost"));
}

#[test]
fn test_reoptimize_rejects_locked_double_booking() {
    let mut scheduler = create_test_scheduler(create_activities(3), small_config());
    let schedule = schedule_from(vec![
        Assignment::new("A0", TimeSlot::new(Day::Monday, 1)),
        Assignment::new("A1", TimeSlot::new(Day::Monday, 1)),
        Assignment::new("A2", TimeSlot::new(Day::Monday, 2)),
    ]);

    let result = scheduler.reoptimize_schedule(Some(&schedule), &locked(&["A0", "A1"]));

    match result {
        Err(error @ SchedulerError::LockedConflict { .. }) => {
            let message = error.to_string();
            assert!(message.contains("A0"));
            assert!(message.contains("A1"));
        }
        other => panic!("expected a locked conflict, got {:?}", other),
    }
}

#[test]
fn test_reoptimize_rejects_locked_activity_in_conflict_slot() {
    let activities = vec![
        Activity::new("A", "Math").with_conflicts(vec![TimeSlot::new(Day::Monday, 1)]),
        Activity::new("B", "Art"),
    ];
    let mut scheduler = create_test_scheduler(activities, small_config());
    let schedule = schedule_from(vec![
        Assignment::new("A", TimeSlot::new(Day::Monday, 1)),
        Assignment::new("B", TimeSlot::new(Day::Monday, 2)),
    ]);

    let result = scheduler.reoptimize_schedule(Some(&schedule), &locked(&["A"]));

    assert!(matches!(
        result,
        Err(SchedulerError::LockedConflict { ref activity_ids, .. }) if activity_ids == &vec!["A".to_string()]
    ));
}

#[test]
fn test_schedule_is_dated_from_rotation_start() {
    // 2024-01-03 is a Wednesday; the week starts on Monday 2024-01-01
    let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let config = small_config().with_rotation_start(start);
    let mut scheduler = create_test_scheduler(create_activities(7), config);

    let schedule = scheduler.generate_schedule().unwrap();

    assert_eq!(schedule.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    assert_eq!(schedule.end_date, NaiveDate::from_ymd_opt(2024, 1, 5));
    for assignment in &schedule.assignments {
        let date = assignment.slot.date.unwrap();
        assert_eq!(Day::from_weekday(date.weekday()), Some(assignment.slot.day));
        assert_ne!(date.weekday(), Weekday::Sat);
    }

    let grouped: usize = schedule.weekly_breakdown.values().map(Vec::len).sum();
    assert_eq!(grouped, 7);
}

#[test]
fn test_same_seed_gives_same_schedule() {
    let config = small_config().with_rotation_start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    let mut first = create_test_scheduler(create_activities(9), config.clone());
    let mut second = create_test_scheduler(create_activities(9), config);
    first.set_constraints(ConstraintConfig::new().with_max_per_day(2));
    second.set_constraints(ConstraintConfig::new().with_max_per_day(2));

    assert_eq!(
        first.generate_schedule().unwrap(),
        second.generate_schedule().unwrap()
    );
}

#[test]
fn test_validate_schedule_reports_violations() {
    let activities = vec![
        Activity::new("A", "Math").with_conflicts(vec![TimeSlot::new(Day::Friday, 8)]),
        Activity::new("B", "Art"),
    ];
    let mut scheduler = create_test_scheduler(activities, small_config());
    scheduler.set_constraints(ConstraintConfig::new().with_max_per_day(1));

    let report = scheduler.validate_schedule(&[
        Assignment::new("A", TimeSlot::new(Day::Friday, 8)),
        Assignment::new("B", TimeSlot::new(Day::Friday, 7)),
    ]);

    // Conflict slot plus two activities on Friday
    assert!(!report.is_valid);
    assert_eq!(report.hard_violations, 2);
    assert_eq!(report.violations.len(), 2);
}

#[test]
fn test_activity_management() {
    let mut scheduler = create_test_scheduler(create_activities(2), small_config());

    assert!(matches!(
        scheduler.add_activity(Activity::new("A0", "Again")),
        Err(SchedulerError::DuplicateActivity(id)) if id == "A0"
    ));

    scheduler.add_activity(Activity::new("X", "Extra")).unwrap();
    assert_eq!(scheduler.activities().len(), 3);

    scheduler
        .update_activity(Activity::new("X", "Renamed"))
        .unwrap();
    assert_eq!(scheduler.activity("X").unwrap().name, "Renamed");

    let removed = scheduler.remove_activity("A1").unwrap();
    assert_eq!(removed.id, "A1");
    assert!(scheduler.activity("A1").is_none());

    assert!(matches!(
        scheduler.remove_activity("A1"),
        Err(SchedulerError::UnknownActivity(_))
    ));
    assert!(matches!(
        scheduler.update_activity(Activity::new("nope", "Missing")),
        Err(SchedulerError::UnknownActivity(_))
    ));

    let duplicates = vec![Activity::new("D", "One"), Activity::new("D", "Two")];
    assert!(matches!(
        scheduler.set_activities(duplicates),
        Err(SchedulerError::DuplicateActivity(_))
    ));
    assert_eq!(scheduler.activities().len(), 2);
}

#[test]
fn test_activity_preferences_become_soft_constraints() {
    let activities = vec![
        Activity::new("A", "Math").with_preferred_slots(vec![TimeSlot::new(Day::Monday, 1)]),
        Activity::new("B", "Art"),
    ];
    let mut scheduler = create_test_scheduler(activities, small_config());
    scheduler.set_constraints(ConstraintConfig::new().with_max_per_day(3));

    let ids: Vec<&str> = scheduler.constraints().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["daily-capacity-none-3", "preference-A"]);
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut scheduler = Scheduler::default();

    let result = scheduler.set_config(Config::new().with_population_size(0));
    assert!(matches!(
        result,
        Err(SchedulerError::InvalidConfig(ConfigError::Zero { name: "population_size" }))
    ));

    let result = scheduler.set_config(Config::new().with_mutation_rate(1.5));
    assert!(matches!(
        result,
        Err(SchedulerError::InvalidConfig(ConfigError::RateOutOfRange { .. }))
    ));

    // The previous configuration stays in place
    assert_eq!(scheduler.config().population_size, 50);
}

#[test]
fn test_constructor_config_is_checked_before_running() {
    // Empty population: nothing would be scheduled
    let mut scheduler =
        create_test_scheduler(create_activities(3), Config::new().with_population_size(0));
    assert!(matches!(
        scheduler.generate_schedule(),
        Err(SchedulerError::InvalidConfig(ConfigError::Zero { name: "population_size" }))
    ));
    assert!(scheduler.current_schedule().is_none());

    // NaN rate
    let mut scheduler = create_test_scheduler(
        create_activities(3),
        small_config().with_crossover_rate(f64::NAN),
    );
    assert!(matches!(
        scheduler.generate_schedule(),
        Err(SchedulerError::InvalidConfig(ConfigError::RateOutOfRange {
            name: "crossover_rate",
            ..
        }))
    ));

    // Re-optimization checks the configuration as well
    let schedule = schedule_from(vec![
        Assignment::new("A0", TimeSlot::new(Day::Monday, 1)),
        Assignment::new("A1", TimeSlot::new(Day::Monday, 2)),
        Assignment::new("A2", TimeSlot::new(Day::Monday, 3)),
    ]);
    assert!(matches!(
        scheduler.reoptimize_schedule(Some(&schedule), &locked(&["A0"])),
        Err(SchedulerError::InvalidConfig(_))
    ));
}

#[test]
fn test_invalid_mutation_boost_is_rejected() {
    for boost in [f64::NAN, f64::INFINITY, -1.0] {
        let mut config = small_config();
        config.reoptimize_mutation_boost = boost;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFactor {
                name: "reoptimize_mutation_boost",
                ..
            })
        ));

        let mut scheduler = create_test_scheduler(create_activities(2), config);
        assert!(matches!(
            scheduler.generate_schedule(),
            Err(SchedulerError::InvalidConfig(ConfigError::InvalidFactor { .. }))
        ));
    }
}

#[test]
fn test_reoptimize_mutation_rate_is_boosted_and_capped() {
    assert_eq!(Config::new().with_mutation_rate(0.1).reoptimize_mutation_rate(), 0.2);
    assert_eq!(Config::new().with_mutation_rate(0.4).reoptimize_mutation_rate(), 0.5);
    // Never lower than the base rate
    assert_eq!(Config::new().with_mutation_rate(0.8).reoptimize_mutation_rate(), 0.8);
}
