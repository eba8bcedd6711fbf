//! Scheduled daily digest.
//!
//! # Responsibility
//! - Compute the next fire instant for a fixed local wall-clock time.
//! - Fan out one digest per registered user with completed work.
//!
//! # Invariants
//! - A failure for one recipient (query or delivery) never stops the others.
//! - Users with nothing completed on the reported day get no message.
//! - The job runs on its own tokio task; store queries go to the blocking pool.
//! - Each fire instant runs at most once.

use crate::config::ConfigError;
use crate::messenger::Messenger;
use crate::model::user::ExternalId;
use crate::service::{DailySummary, Engine, EngineResult};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use log::{error, info, warn};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Local wall-clock time of the daily run in a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestSchedule {
    pub at: NaiveTime,
    pub offset: FixedOffset,
    /// Report the local day before the fire instant instead of the same day.
    pub previous_day: bool,
}

impl DigestSchedule {
    /// First fire instant strictly after `now`, or `None` past the end of
    /// the calendar.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = now.with_timezone(&self.offset).date_naive();
        match self.fire_instant(today) {
            Some(candidate) if candidate > now => Some(candidate),
            _ => self.fire_instant(today.succ_opt()?),
        }
    }

    /// Calendar day a run at `fired_at` reports on.
    pub fn report_date(&self, fired_at: DateTime<Utc>) -> NaiveDate {
        let local_day = fired_at.with_timezone(&self.offset).date_naive();
        if self.previous_day {
            local_day.pred_opt().unwrap_or(local_day)
        } else {
            local_day
        }
    }

    fn fire_instant(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let shift = Duration::seconds(i64::from(self.offset.local_minus_utc()));
        date.and_time(self.at)
            .checked_sub_signed(shift)
            .map(|instant| instant.and_utc())
    }
}

/// Per-run delivery tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestReport {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Renders the digest body for one user.
pub fn format_digest(summary: &DailySummary) -> String {
    let mut body = format!("Daily report for {}\n", summary.date.format("%Y-%m-%d"));
    for title in &summary.titles {
        let _ = writeln!(body, "- {title}");
    }
    let _ = write!(
        body,
        "Completed: {} | Points earned: {}",
        summary.titles.len(),
        summary.total_points
    );
    body
}

/// Daily digest job bound to an engine and an outbound messenger.
pub struct DigestJob {
    engine: Arc<Engine>,
    messenger: Arc<dyn Messenger>,
    schedule: DigestSchedule,
}

impl DigestJob {
    pub fn new(engine: Arc<Engine>, messenger: Arc<dyn Messenger>) -> Result<Self, ConfigError> {
        let schedule = DigestSchedule {
            at: engine.config().digest_at()?,
            offset: engine.offset(),
            previous_day: engine.config().digest_reports_previous_day,
        };
        Ok(Self {
            engine,
            messenger,
            schedule,
        })
    }

    pub fn schedule(&self) -> DigestSchedule {
        self.schedule
    }

    /// Sends the digest for `date` to every user who completed something.
    ///
    /// Only a failure to enumerate users is returned; per-user failures are
    /// logged and counted.
    pub async fn run_for(&self, date: NaiveDate) -> EngineResult<DigestReport> {
        let users = self
            .engine
            .run_blocking(|engine| engine.all_registered_users())
            .await?;
        let mut report = DigestReport::default();

        for user in users {
            self.deliver_one(user, date, &mut report).await;
        }

        info!(
            "event=daily_digest module=digest status=ok date={date} sent={} skipped={} failed={}",
            report.sent, report.skipped, report.failed
        );
        Ok(report)
    }

    async fn deliver_one(&self, user: ExternalId, date: NaiveDate, report: &mut DigestReport) {
        let summary = match self
            .engine
            .run_blocking(move |engine| engine.completed_on(user, date))
            .await
        {
            Ok(summary) => summary,
            Err(err) => {
                warn!("event=daily_digest_user module=digest status=error external_id={user} error={err}");
                report.failed += 1;
                return;
            }
        };
        if summary.is_empty() {
            report.skipped += 1;
            return;
        }

        match self.messenger.send(user, &format_digest(&summary)).await {
            Ok(()) => report.sent += 1,
            Err(err) => {
                warn!("event=daily_digest_send module=digest status=error external_id={user} error={err}");
                report.failed += 1;
            }
        }
    }

    /// Runs the job every day at the scheduled time until `shutdown` flips to
    /// `true` or its sender is dropped.
    ///
    /// Each fire instant is used once: the next one is computed from the
    /// later of the wall clock and the previous fire, so a clock that lags
    /// the timer never reports the same day twice.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut last_fire: Option<DateTime<Utc>> = None;
            loop {
                let now = self.engine.now();
                let from = last_fire.map_or(now, |fired| fired.max(now));
                let Some(fire_at) = self.schedule.next_after(from) else {
                    error!("event=daily_digest_schedule module=digest status=error from={from}");
                    return;
                };
                let wait = (fire_at - now).to_std().unwrap_or_default();
                info!("event=daily_digest_schedule module=digest status=ok next_run={fire_at}");

                let signalled = tokio::select! {
                    _ = tokio::time::sleep(wait) => None,
                    changed = shutdown.changed() => Some(changed.is_ok()),
                };
                match signalled {
                    None => {}
                    Some(true) if !*shutdown.borrow() => continue,
                    Some(_) => {
                        info!("event=daily_digest_stop module=digest status=ok");
                        return;
                    }
                }

                last_fire = Some(fire_at);
                let date = self.schedule.report_date(fire_at);
                if let Err(err) = self.run_for(date).await {
                    error!("event=daily_digest module=digest status=error date={date} error={err}");
                }
            }
        })
    }
}
