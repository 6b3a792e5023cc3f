//! Unit tests for utility functions.

use ga_timetable::chromosome::Assignment;
use ga_timetable::constraint::ConstraintRule;
use ga_timetable::evaluator::FitnessEvaluator;
use ga_timetable::schedule::Schedule;
use ga_timetable::time_grid::{Day, TimeGrid, TimeSlot};
use ga_timetable::utils::{
    format_duration, load_activities, load_constraints, rng_from_seed, save_schedule,
    EvolutionStats,
};
use rand::Rng;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// A file path under the system temp directory, unique per test.
fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ga_timetable_{}_{}", std::process::id(), name))
}

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(Duration::from_secs(0)), "0h 00m 00s");
    assert_eq!(format_duration(Duration::from_secs(59)), "0h 00m 59s");
    assert_eq!(format_duration(Duration::from_secs(3725)), "1h 02m 05s");
}

#[test]
fn test_seeded_rng_is_reproducible() {
    let mut first = rng_from_seed(Some(99));
    let mut second = rng_from_seed(Some(99));

    let a: Vec<u32> = (0..5).map(|_| first.gen()).collect();
    let b: Vec<u32> = (0..5).map(|_| second.gen()).collect();
    assert_eq!(a, b);
}

#[test]
fn test_stats_format() {
    let stats = EvolutionStats {
        generation: 12,
        best_fitness: 980.0,
        average_fitness: 812.5,
        worst_fitness: 400.0,
        population_size: 30,
        best_hard_violations: 0,
        best_history: vec![900.0, 980.0],
        runtime: Duration::from_secs(61),
        cancelled: false,
    };

    let text = stats.format();
    assert!(text.contains("Generations: 12"));
    assert!(text.contains("Best Fitness: 980.00"));
    assert!(text.contains("Runtime: 0h 01m 01s"));
}

#[test]
fn test_load_activities() {
    let path = temp_path("activities.json");
    fs::write(
        &path,
        r#"[
            {"id": "M1", "name": "Math", "conflicts": [{"day": "Monday", "period": 1}]},
            {"id": "A1", "name": "Art"}
        ]"#,
    )
    .unwrap();

    let activities = load_activities(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0].conflicts, vec![TimeSlot::new(Day::Monday, 1)]);
    assert!(activities[1].conflicts.is_empty());
    assert!(activities[1].preferred_slots.is_empty());
}

#[test]
fn test_load_constraints_with_defaults() {
    let path = temp_path("constraints.json");
    fs::write(&path, r#"{"hard": {"max_per_day": 2}}"#).unwrap();

    let config = load_constraints(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(config.hard.max_per_day, Some(2));
    assert!(!config.soft.balance_workload);
    let constraints = config.translate();
    assert_eq!(constraints.len(), 1);
    assert_eq!(
        constraints[0].rule,
        ConstraintRule::DailyCapacity {
            min: None,
            max: Some(2)
        }
    );
}

#[test]
fn test_load_missing_file_fails() {
    assert!(load_activities(temp_path("does_not_exist.json")).is_err());
}

#[test]
fn test_save_schedule_writes_json() {
    let genes = vec![Assignment::new("M1", TimeSlot::new(Day::Tuesday, 3))];
    let evaluation = FitnessEvaluator::new(&[], Vec::new(), TimeGrid::default()).evaluate(&genes);
    let schedule = Schedule::from_evaluation(genes, &evaluation);
    let path = temp_path("schedule.json");

    save_schedule(&schedule, &path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let restored: Schedule = serde_json::from_str(&text).unwrap();
    assert_eq!(restored, schedule);
}
