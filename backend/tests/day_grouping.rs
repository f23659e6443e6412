mod support;

use std::sync::Arc;

use support::{at, closed_interval, date, seed_holiday, seed_user, state_with, test_config};
use timeclock_backend::{
    models::{attendance::AttendanceInterval, overtime::SubtractionModel},
    repositories::InMemoryStore,
    utils::time::FixedClock,
};

#[tokio::test]
async fn mixed_home_and_office_day_is_not_homeoffice() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = seed_user(&store, SubtractionModel::None, 0.0);
    store
        .seed_attendance(closed_interval(
            user_id,
            at(2024, 4, 9, 7, 0),
            at(2024, 4, 9, 11, 0),
            true,
        ))
        .expect("seed");
    store
        .seed_attendance(closed_interval(
            user_id,
            at(2024, 4, 9, 13, 0),
            at(2024, 4, 9, 17, 0),
            false,
        ))
        .expect("seed");
    store
        .seed_attendance(closed_interval(
            user_id,
            at(2024, 4, 10, 8, 0),
            at(2024, 4, 10, 12, 0),
            true,
        ))
        .expect("seed");

    let state = state_with(&store, test_config(), FixedClock::at(2024, 4, 30, 12, 0));
    let days = state
        .calculator
        .grouper()
        .group_month(user_id, 2024, 4)
        .await
        .expect("group month");

    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date, date(2024, 4, 9));
    assert!(!days[0].homeoffice);
    assert_eq!(days[0].worked_hours, 8.0);
    assert_eq!(days[0].overtime_hours, 0.0);
    assert_eq!(days[1].date, date(2024, 4, 10));
    assert!(days[1].homeoffice);
}

#[tokio::test]
async fn days_are_sorted_and_use_weekday_policy() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = seed_user(&store, SubtractionModel::None, 0.0);
    seed_holiday(&store, date(2024, 4, 1), "Easter Monday");

    // Friday, Monday holiday, Saturday; seeded out of order.
    for (day, from, till) in [(12, 8, 15), (1, 9, 12), (13, 10, 12)] {
        store
            .seed_attendance(closed_interval(
                user_id,
                at(2024, 4, day, from, 0),
                at(2024, 4, day, till, 0),
                false,
            ))
            .expect("seed");
    }

    let state = state_with(&store, test_config(), FixedClock::at(2024, 4, 30, 12, 0));
    let days = state
        .calculator
        .grouper()
        .group_month(user_id, 2024, 4)
        .await
        .expect("group month");

    let dates: Vec<_> = days.iter().map(|day| day.date).collect();
    assert_eq!(dates, vec![date(2024, 4, 1), date(2024, 4, 12), date(2024, 4, 13)]);
    // Holiday: everything is overtime.
    assert_eq!(days[0].overtime_hours, 3.0);
    // Friday expects six hours; 7h raw nets 6.5.
    assert_eq!(days[1].expected_hours, 6.0);
    assert_eq!(days[1].overtime_hours, 0.5);
    // Saturday expects nothing.
    assert_eq!(days[2].overtime_hours, 2.0);
}

#[tokio::test]
async fn other_months_and_users_are_ignored() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = seed_user(&store, SubtractionModel::None, 0.0);
    let other_id = seed_user(&store, SubtractionModel::None, 0.0);
    store
        .seed_attendance(closed_interval(
            user_id,
            at(2024, 3, 29, 8, 0),
            at(2024, 3, 29, 12, 0),
            false,
        ))
        .expect("seed");
    store
        .seed_attendance(closed_interval(
            other_id,
            at(2024, 4, 9, 8, 0),
            at(2024, 4, 9, 12, 0),
            false,
        ))
        .expect("seed");

    let state = state_with(&store, test_config(), FixedClock::at(2024, 4, 30, 12, 0));
    let days = state
        .calculator
        .grouper()
        .group_month(user_id, 2024, 4)
        .await
        .expect("group month");
    assert!(days.is_empty());
}

#[tokio::test]
async fn running_shift_is_counted_until_now() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = seed_user(&store, SubtractionModel::None, 0.0);
    let start = at(2024, 4, 9, 8, 0);
    store
        .seed_attendance(AttendanceInterval::check_in(user_id, start, false, start))
        .expect("seed");

    let state = state_with(&store, test_config(), FixedClock::at(2024, 4, 9, 12, 0));
    let days = state
        .calculator
        .grouper()
        .group_month(user_id, 2024, 4)
        .await
        .expect("group month");

    assert_eq!(days.len(), 1);
    assert_eq!(days[0].worked_hours, 4.0);
    assert_eq!(days[0].overtime_hours, -4.0);
}
