//! Unit tests for the weekly time grid.

use chrono::NaiveDate;
use ga_timetable::time_grid::{Day, TimeGrid, TimeSlot, PERIODS_PER_DAY};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_default_grid_has_forty_distinct_slots() {
    let grid = TimeGrid::default();
    let slots = grid.slots();

    assert_eq!(slots.len(), 40);
    assert_eq!(grid.len(), 40);

    // No slot appears twice
    for (i, a) in slots.iter().enumerate() {
        for b in &slots[i + 1..] {
            assert_ne!(a, b);
        }
    }

    // Day-major ordering starting at Monday period 1
    assert_eq!(slots[0], TimeSlot::new(Day::Monday, 1));
    assert_eq!(slots[39], TimeSlot::new(Day::Friday, PERIODS_PER_DAY));
}

#[test]
fn test_custom_grid_dimensions() {
    let grid = TimeGrid::new(vec![Day::Monday, Day::Wednesday], 3);

    assert_eq!(grid.slots().len(), 6);
    assert!(grid.contains(&TimeSlot::new(Day::Wednesday, 3)));
    assert!(!grid.contains(&TimeSlot::new(Day::Tuesday, 1)));
    assert!(!grid.contains(&TimeSlot::new(Day::Monday, 4)));
    assert!(!grid.contains(&TimeSlot::new(Day::Monday, 0)));
}

#[test]
fn test_weekly_slot_equality() {
    assert_eq!(TimeSlot::new(Day::Monday, 1), TimeSlot::new(Day::Monday, 1));
    assert_ne!(TimeSlot::new(Day::Monday, 1), TimeSlot::new(Day::Monday, 2));
    assert_ne!(TimeSlot::new(Day::Monday, 1), TimeSlot::new(Day::Tuesday, 1));
}

#[test]
fn test_dated_slot_equality() {
    // 2024-01-01 and 2024-01-08 are both Mondays
    let first = TimeSlot::on_date(date(2024, 1, 1), 2).unwrap();
    let second = TimeSlot::on_date(date(2024, 1, 8), 2).unwrap();
    let same = TimeSlot::on_date(date(2024, 1, 1), 2).unwrap();

    assert_eq!(first.day, Day::Monday);
    assert_eq!(first, same);

    // Two dated slots compare by date
    assert_ne!(first, second);

    // A dated slot still matches its recurring weekly slot
    let weekly = TimeSlot::new(Day::Monday, 2);
    assert_eq!(first, weekly);
    assert_eq!(weekly, second);
    assert!(first.overlaps(&weekly));
}

#[test]
fn test_weekend_dates_have_no_slot() {
    // 2024-01-06 is a Saturday
    assert!(TimeSlot::on_date(date(2024, 1, 6), 1).is_none());
    assert!(TimeSlot::on_date(date(2024, 1, 7), 1).is_none());
}

#[test]
fn test_weekly_strips_date() {
    let dated = TimeSlot::on_date(date(2024, 1, 3), 5).unwrap();
    let weekly = dated.weekly();

    assert!(weekly.date.is_none());
    assert_eq!(weekly.day, Day::Wednesday);
    assert_eq!(weekly.period, 5);
}

#[test]
fn test_is_in() {
    let conflicts = vec![TimeSlot::new(Day::Friday, 8), TimeSlot::new(Day::Monday, 1)];

    assert!(TimeSlot::new(Day::Monday, 1).is_in(&conflicts));
    assert!(!TimeSlot::new(Day::Monday, 2).is_in(&conflicts));
    assert!(!TimeSlot::new(Day::Monday, 2).is_in(&[]));
}
