//! Reminder scheduler.
//!
//! [`ReminderScheduler::run_once`] is the reminder pass: it asks the engine
//! which habits are due in the given minute and enqueues one notification per
//! habit on the [`Dispatcher`]. [`ReminderScheduler::run`] drives it from a
//! one-minute timer; an external trigger (cron, the admin CLI) can call
//! `run_once` directly instead.

use std::{future::Future, time::Duration};

use chrono::{NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::{Dispatcher, Engine, ResultEngine};

pub const REMINDER_PERIOD: Duration = Duration::from_secs(60);

/// Text sent for a due habit.
pub fn reminder_message(action: &str) -> String {
    format!("Reminder: time for habit '{action}'")
}

/// `time` with seconds and sub-seconds dropped.
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

pub struct ReminderScheduler {
    engine: Engine,
    dispatcher: Dispatcher,
    timezone: Tz,
}

impl ReminderScheduler {
    pub fn new(engine: Engine, dispatcher: Dispatcher) -> Self {
        Self {
            engine,
            dispatcher,
            timezone: Tz::UTC,
        }
    }

    /// Timezone stored habit times are expressed in.
    pub fn timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Wall-clock time of day in the configured timezone.
    pub fn local_now(&self) -> NaiveTime {
        Utc::now().with_timezone(&self.timezone).time()
    }

    /// One reminder pass for the minute of `now`.
    ///
    /// Returns how many notifications were queued. A notification that cannot
    /// be queued is logged and the pass moves on to the next habit. Calling
    /// this twice in the same minute queues the same reminders twice.
    pub async fn run_once(&self, now: NaiveTime) -> ResultEngine<usize> {
        let minute = truncate_to_minute(now);
        let due = self.engine.due_reminders(minute).await?;

        let mut queued = 0;
        for notification in due {
            let destination = notification.destination.clone();
            match self.dispatcher.enqueue(notification) {
                Ok(()) => queued += 1,
                Err(err) => tracing::error!("failed to queue reminder for {destination}: {err}"),
            }
        }
        Ok(queued)
    }

    /// Run a reminder pass at the start of every minute, forever.
    pub async fn run(self) {
        tracing::info!("Starting reminder scheduler ({})...", self.timezone.name());

        let scheduler = &self;
        every_minute(
            || scheduler.local_now(),
            |minute| async move {
                match scheduler.run_once(minute).await {
                    Ok(queued) => tracing::info!("reminder pass {minute}: {queued} queued"),
                    Err(err) => tracing::error!("reminder pass {minute} failed: {err}"),
                }
            },
        )
        .await;
    }
}

/// Remembers the last minute a pass ran for.
#[derive(Debug, Default)]
struct MinuteGate {
    last: Option<NaiveTime>,
}

impl MinuteGate {
    /// The minute to run a pass for, or `None` when `now` falls in the minute
    /// that already had one.
    fn admit(&mut self, now: NaiveTime) -> Option<NaiveTime> {
        let minute = truncate_to_minute(now);
        if self.last == Some(minute) {
            return None;
        }
        self.last = Some(minute);
        Some(minute)
    }
}

/// Call `pass` once per minute of `clock`, starting just after the next
/// minute boundary. Missed ticks are skipped, never replayed.
async fn every_minute<C, P, F>(clock: C, mut pass: P)
where
    C: Fn() -> NaiveTime,
    P: FnMut(NaiveTime) -> F,
    F: Future<Output = ()>,
{
    let mut interval = tokio::time::interval_at(
        tokio::time::Instant::now() + until_next_minute(clock()),
        REMINDER_PERIOD,
    );
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut gate = MinuteGate::default();
    loop {
        interval.tick().await;
        if let Some(minute) = gate.admit(clock()) {
            pass(minute).await;
        }
    }
}

/// Delay until one second past the next minute boundary.
fn until_next_minute(now: NaiveTime) -> Duration {
    Duration::from_secs(u64::from(60 - now.second()) + 1)
        .saturating_sub(Duration::from_nanos(u64::from(now.nanosecond() % 1_000_000_000)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_embeds_action() {
        assert_eq!(
            reminder_message("Read a book"),
            "Reminder: time for habit 'Read a book'"
        );
    }

    #[test]
    fn truncates_seconds() {
        let time = NaiveTime::from_hms_milli_opt(9, 15, 42, 500).unwrap();
        assert_eq!(
            truncate_to_minute(time),
            NaiveTime::from_hms_opt(9, 15, 0).unwrap()
        );
    }

    fn at(hour: u32, minute: u32, second: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, second).unwrap()
    }

    #[test]
    fn gate_admits_each_minute_once() {
        let mut gate = MinuteGate::default();
        assert_eq!(gate.admit(at(9, 0, 1)), Some(at(9, 0, 0)));
        assert_eq!(gate.admit(at(9, 0, 59)), None);
        assert_eq!(gate.admit(at(9, 1, 0)), Some(at(9, 1, 0)));
    }

    #[tokio::test(start_paused = true)]
    async fn one_pass_per_minute() {
        let start = tokio::time::Instant::now();
        let clock = move || at(8, 59, 30) + chrono::Duration::from_std(start.elapsed()).unwrap();

        let mut passes = Vec::new();
        let _ = tokio::time::timeout(
            Duration::from_secs(150),
            every_minute(clock, |minute| {
                passes.push(minute);
                std::future::ready(())
            }),
        )
        .await;

        assert_eq!(passes, vec![at(9, 0, 0), at(9, 1, 0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn same_minute_runs_once() {
        let mut passes = Vec::new();
        let _ = tokio::time::timeout(
            Duration::from_secs(200),
            every_minute(
                || at(9, 0, 10),
                |minute| {
                    passes.push(minute);
                    std::future::ready(())
                },
            ),
        )
        .await;

        assert_eq!(passes, vec![at(9, 0, 0)]);
    }

    #[test]
    fn waits_for_next_minute() {
        let now = NaiveTime::from_hms_opt(9, 15, 0).unwrap();
        assert_eq!(until_next_minute(now), Duration::from_secs(61));
        let now = NaiveTime::from_hms_milli_opt(9, 15, 59, 500).unwrap();
        assert_eq!(until_next_minute(now), Duration::from_millis(1_500));
    }
}
