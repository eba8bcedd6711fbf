use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use otos_core::{
    open_db_in_memory, DeliveryError, DigestJob, Engine, EngineConfig, EngineError, ExternalId,
    ManualClock, Messenger, Store,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Notify};

#[derive(Default)]
struct RecordingMessenger {
    sent: Mutex<Vec<(ExternalId, String)>>,
    failing: HashSet<ExternalId>,
    delivered: Notify,
}

impl RecordingMessenger {
    fn failing_for(recipients: &[ExternalId]) -> Self {
        Self {
            failing: recipients.iter().copied().collect(),
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<(ExternalId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, recipient: ExternalId, text: &str) -> Result<(), DeliveryError> {
        if self.failing.contains(&recipient) {
            return Err(DeliveryError::new(recipient, "bot was blocked by the user"));
        }
        self.sent.lock().unwrap().push((recipient, text.to_string()));
        self.delivered.notify_one();
        Ok(())
    }
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

/// Engine at 06:00 UTC on Mar 1 with the given users registered.
fn engine(users: &[i64], config: EngineConfig) -> (Arc<Engine>, Arc<ManualClock>) {
    let store = Arc::new(Store::new(open_db_in_memory().unwrap()));
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap(),
    ));
    let engine = Engine::new(store, clock.clone(), config).unwrap();
    for id in users {
        engine.register(ExternalId(*id), "user").unwrap();
    }
    (Arc::new(engine), clock)
}

fn complete_one(engine: &Engine, clock: &ManualClock, user: i64, title: &str, priority: i64) {
    let id = engine.submit(ExternalId(user), title, "misc", priority).unwrap();
    clock.advance(Duration::minutes(31));
    engine.complete(id).unwrap();
}

#[tokio::test]
async fn digest_is_sent_only_to_users_with_completed_work() {
    let (engine, clock) = engine(&[1, 2], EngineConfig::default());
    complete_one(&engine, &clock, 1, "Buy milk", 2);
    engine.submit(ExternalId(2), "pending only", "misc", 1).unwrap();

    let messenger = Arc::new(RecordingMessenger::default());
    let job = DigestJob::new(engine.clone(), messenger.clone()).unwrap();
    let report = job.run_for(march(1)).await.unwrap();

    assert_eq!(report.sent, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    let sent = messenger.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, ExternalId(1));
    assert!(sent[0].1.contains("Buy milk"));
    assert!(sent[0].1.contains("Points earned: 2"));
}

#[tokio::test]
async fn delivery_failure_does_not_stop_fan_out() {
    let (engine, clock) = engine(&[1, 2, 3], EngineConfig::default());
    for user in [1, 2, 3] {
        complete_one(&engine, &clock, user, "task", 1);
    }

    let messenger = Arc::new(RecordingMessenger::failing_for(&[ExternalId(2)]));
    let job = DigestJob::new(engine, messenger.clone()).unwrap();
    let report = job.run_for(march(1)).await.unwrap();

    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 1);
    let recipients: Vec<_> = messenger.sent().into_iter().map(|(to, _)| to).collect();
    assert_eq!(recipients, [ExternalId(1), ExternalId(3)]);
}

#[tokio::test]
async fn other_days_are_not_reported() {
    let (engine, clock) = engine(&[1], EngineConfig::default());
    complete_one(&engine, &clock, 1, "Buy milk", 1);

    let messenger = Arc::new(RecordingMessenger::default());
    let job = DigestJob::new(engine, messenger.clone()).unwrap();
    let report = job.run_for(march(2)).await.unwrap();

    assert_eq!(report.sent, 0);
    assert!(messenger.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn scheduled_run_reports_the_day_that_just_ended() {
    let (engine, clock) = engine(&[1], EngineConfig::default());
    complete_one(&engine, &clock, 1, "Buy milk", 1);
    // One second before 00:25 local on Mar 2.
    clock.set(Utc.with_ymd_and_hms(2024, 3, 1, 20, 54, 59).unwrap());

    let messenger = Arc::new(RecordingMessenger::default());
    let job = DigestJob::new(engine, messenger.clone()).unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = job.spawn(shutdown_rx);

    messenger.delivered.notified().await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    let sent = messenger.sent();
    assert!(!sent.is_empty());
    assert!(sent[0].1.contains("2024-03-01"));
}

#[tokio::test(start_paused = true)]
async fn lagging_wall_clock_does_not_repeat_the_digest() {
    let (engine, clock) = engine(&[1], EngineConfig::default());
    complete_one(&engine, &clock, 1, "Buy milk", 1);
    // Five seconds before 00:25 local on Mar 2; the manual clock never
    // catches up with the timer.
    clock.set(Utc.with_ymd_and_hms(2024, 3, 1, 20, 54, 55).unwrap());

    let messenger = Arc::new(RecordingMessenger::default());
    let job = DigestJob::new(engine, messenger.clone()).unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = job.spawn(shutdown_rx);

    tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    let sent = messenger.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("2024-03-01"));
}

#[tokio::test(start_paused = true)]
async fn evening_schedule_reports_the_same_day() {
    let config = EngineConfig {
        digest_time: "21:00".to_string(),
        digest_reports_previous_day: false,
        ..EngineConfig::default()
    };
    let (engine, clock) = engine(&[1], config);
    complete_one(&engine, &clock, 1, "Buy milk", 1);

    let messenger = Arc::new(RecordingMessenger::default());
    let job = DigestJob::new(engine, messenger.clone()).unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = job.spawn(shutdown_rx);

    messenger.delivered.notified().await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    assert!(messenger.sent()[0].1.contains("Daily report for 2024-03-01"));
}

#[tokio::test(start_paused = true)]
async fn shutdown_before_first_run_sends_nothing() {
    let (engine, _) = engine(&[1], EngineConfig::default());
    let messenger = Arc::new(RecordingMessenger::default());
    let job = DigestJob::new(engine, messenger.clone()).unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = job.spawn(shutdown_rx);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
    assert!(messenger.sent().is_empty());
}

#[tokio::test]
async fn broadcast_is_admin_only_and_best_effort() {
    let config = EngineConfig {
        admin: Some(ExternalId(1)),
        ..EngineConfig::default()
    };
    let (engine, _) = engine(&[1, 2, 3], config);
    let messenger = RecordingMessenger::failing_for(&[ExternalId(3)]);

    assert!(matches!(
        engine.broadcast(ExternalId(2), "hello", &messenger).await,
        Err(EngineError::NotAdmin(ExternalId(2)))
    ));
    assert!(messenger.sent().is_empty());

    let report = engine
        .broadcast(ExternalId(1), "hello", &messenger)
        .await
        .unwrap();
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed, 1);
}
