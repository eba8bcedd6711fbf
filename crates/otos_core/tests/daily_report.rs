use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use otos_core::{
    open_db_in_memory, Engine, EngineConfig, EngineError, ExternalId, ManualClock, Store,
};
use std::sync::Arc;

const ALICE: ExternalId = ExternalId(1);

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn engine() -> (Engine, Arc<ManualClock>) {
    let store = Arc::new(Store::new(open_db_in_memory().unwrap()));
    // 06:00 UTC is 09:30 in the default +03:30 zone.
    let clock = Arc::new(ManualClock::new(at(6, 0)));
    let engine = Engine::new(store, clock.clone(), EngineConfig::default()).unwrap();
    engine.register(ALICE, "Alice").unwrap();
    (engine, clock)
}

#[test]
fn nothing_done_today_yields_empty_summary() {
    let (engine, _) = engine();
    engine.submit(ALICE, "still pending", "misc", 3).unwrap();

    let summary = engine.today_completed(ALICE).unwrap();
    assert_eq!(summary.date, date(1));
    assert!(summary.is_empty());
    assert_eq!(summary.total_points, 0);
}

#[test]
fn summary_lists_titles_in_completion_order_and_sums_priority() {
    let (engine, clock) = engine();
    let milk = engine.submit(ALICE, "Buy milk", "errands", 1).unwrap();
    let report = engine.submit(ALICE, "Write report", "work", 3).unwrap();
    let dropped = engine.submit(ALICE, "Dropped", "work", 2).unwrap();

    clock.set(at(7, 0));
    engine.complete(report).unwrap();
    clock.set(at(8, 0));
    engine.complete(milk).unwrap();
    engine.delete(dropped, ALICE).unwrap();

    let summary = engine.today_completed(ALICE).unwrap();
    assert_eq!(summary.titles, ["Write report", "Buy milk"]);
    assert_eq!(summary.total_points, 4);
}

#[test]
fn calendar_day_follows_configured_offset() {
    let (engine, clock) = engine();
    let late = engine.submit(ALICE, "late evening", "misc", 2).unwrap();
    let after_midnight = engine.submit(ALICE, "after midnight", "misc", 1).unwrap();

    // 20:00 UTC = 23:30 local on Mar 1.
    clock.set(at(20, 0));
    engine.complete(late).unwrap();
    // 20:40 UTC = 00:10 local on Mar 2.
    clock.set(at(20, 40));
    engine.complete(after_midnight).unwrap();

    assert_eq!(engine.today(), date(2));
    let today = engine.today_completed(ALICE).unwrap();
    assert_eq!(today.titles, ["after midnight"]);

    let yesterday = engine.completed_on(ALICE, date(1)).unwrap();
    assert_eq!(yesterday.titles, ["late evening"]);
    assert_eq!(yesterday.total_points, 2);
}

#[test]
fn day_bounds_cover_one_local_day() {
    let (engine, _) = engine();
    let (start, end) = engine.day_bounds(date(1)).unwrap();
    assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 29, 20, 30, 0).unwrap());
    assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 20, 30, 0).unwrap());
}

#[test]
fn dates_at_the_edge_of_the_calendar_are_rejected() {
    let (engine, _) = engine();

    let err = engine.completed_on(ALICE, NaiveDate::MIN).unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(day) if day == NaiveDate::MIN));
    assert!(err.is_expected());
    assert!(matches!(
        engine.day_bounds(NaiveDate::MAX),
        Err(EngineError::InvalidDate(_))
    ));

    assert!(engine.today_completed(ALICE).unwrap().is_empty());
}
