mod support;

use std::sync::Arc;

use support::{absence, date, seed_holiday, seed_user, state_with, test_config};
use timeclock_backend::{
    models::{absence::OvertimeImpact, holiday::CustomHoliday, overtime::SubtractionModel},
    repositories::InMemoryStore,
    utils::time::FixedClock,
};

fn clock() -> FixedClock {
    FixedClock::at(2024, 4, 30, 12, 0)
}

#[tokio::test]
async fn monday_to_friday_counts_five_days() {
    let store = Arc::new(InMemoryStore::new());
    let state = state_with(&store, test_config(), clock());

    let days = state
        .absences
        .count_absence_workdays(date(2024, 4, 8), date(2024, 4, 12))
        .await
        .expect("count workdays");
    assert_eq!(days, 5);
}

#[tokio::test]
async fn public_holiday_on_wednesday_is_not_counted() {
    let store = Arc::new(InMemoryStore::new());
    seed_holiday(&store, date(2024, 4, 10), "Public holiday");
    let state = state_with(&store, test_config(), clock());

    let days = state
        .absences
        .count_absence_workdays(date(2024, 4, 8), date(2024, 4, 12))
        .await
        .expect("count workdays");
    assert_eq!(days, 4);
}

#[tokio::test]
async fn custom_holidays_count_like_imported_ones() {
    let store = Arc::new(InMemoryStore::new());
    store
        .seed_custom_holiday(CustomHoliday::fixed("Office move", date(2024, 4, 11)))
        .expect("seed custom holiday");
    store
        .seed_custom_holiday(CustomHoliday::yearly("Founding day", 4, 9))
        .expect("seed custom holiday");
    let state = state_with(&store, test_config(), clock());

    let days = state
        .absences
        .count_absence_workdays(date(2024, 4, 8), date(2024, 4, 12))
        .await
        .expect("count workdays");
    assert_eq!(days, 3);
}

#[tokio::test]
async fn single_day_ranges() {
    let store = Arc::new(InMemoryStore::new());
    seed_holiday(&store, date(2024, 4, 10), "Public holiday");
    let state = state_with(&store, test_config(), clock());

    for (day, expected) in [
        (date(2024, 4, 9), 1),
        (date(2024, 4, 10), 0),
        (date(2024, 4, 13), 0),
        (date(2024, 4, 14), 0),
    ] {
        let first = state
            .absences
            .count_absence_workdays(day, day)
            .await
            .expect("count workdays");
        let second = state
            .absences
            .count_absence_workdays(day, day)
            .await
            .expect("count workdays");
        assert_eq!(first, expected, "{day}");
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn backfill_fills_missing_net_days() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = seed_user(&store, SubtractionModel::None, 0.0);
    seed_holiday(&store, date(2024, 4, 10), "Public holiday");

    let missing = absence(user_id, date(2024, 4, 8), date(2024, 4, 14), OvertimeImpact::None);
    let missing_id = missing.id;
    let mut known = absence(user_id, date(2024, 4, 22), date(2024, 4, 23), OvertimeImpact::None);
    known.net_days = Some(2);
    store.seed_absence(missing).expect("seed absence");
    store.seed_absence(known).expect("seed absence");

    let state = state_with(&store, test_config(), clock());
    let updated = state.absences.backfill_net_days().await.expect("backfill");

    assert_eq!(updated, 1);
    let stored = store.absence(missing_id).expect("read").expect("absence");
    assert_eq!(stored.net_days, Some(4));

    let again = state.absences.backfill_net_days().await.expect("backfill");
    assert_eq!(again, 0);
}

#[tokio::test]
async fn backfill_of_weekend_absence_runs_once() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = seed_user(&store, SubtractionModel::None, 0.0);
    let weekend = absence(user_id, date(2024, 4, 13), date(2024, 4, 14), OvertimeImpact::None);
    let weekend_id = weekend.id;
    store.seed_absence(weekend).expect("seed absence");

    let state = state_with(&store, test_config(), clock());
    let first = state.absences.backfill_net_days().await.expect("backfill");
    let second = state.absences.backfill_net_days().await.expect("backfill");
    let third = state.absences.backfill_net_days().await.expect("backfill");

    assert_eq!(first, 1);
    assert_eq!(second, 0);
    assert_eq!(third, 0);
    let stored = store.absence(weekend_id).expect("read").expect("absence");
    assert_eq!(stored.net_days, Some(0));
}
