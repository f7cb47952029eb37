// A once-a-day wall-clock trigger.
//
// Fires at a fixed local time in a configured zone. Firings missed while the
// bot was offline are not replayed; the loop always waits for the next
// upcoming occurrence.

use chrono::{DateTime, Duration as ChronoDuration, LocalResult, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
    tz: Tz,
}

impl DailySchedule {
    pub fn new(at: NaiveTime, tz: Tz) -> Self {
        Self { at, tz }
    }

    /// The first firing strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = now.with_timezone(&self.tz).date_naive();
        // At most three iterations: today, tomorrow, and the day after when
        // tomorrow's local time falls into a DST gap we can't shift out of.
        for _ in 0..3 {
            if let Some(candidate) = self.fire_time_on(date) {
                if candidate > now {
                    return candidate;
                }
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        now + ChronoDuration::days(1)
    }

    /// How long to sleep from `now` until `next`.
    pub fn wait_until(next: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        (next - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// e.g. "Updated daily at 8AM".
    pub fn footer_label(&self) -> String {
        let time = if self.at.minute() == 0 {
            self.at.format("%-I%p").to_string()
        } else {
            self.at.format("%-I:%M%p").to_string()
        };
        format!("Updated daily at {}", time)
    }

    fn fire_time_on(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let local = date.and_time(self.at);
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
            // Spring-forward gap: the wall-clock time doesn't exist today.
            LocalResult::None => self
                .tz
                .from_local_datetime(&(local + ChronoDuration::hours(1)))
                .earliest()
                .map(|t| t.with_timezone(&Utc)),
        }
    }
}

/// Run `job` at every firing of `schedule` until `cancel` is triggered.
pub async fn run_daily<F, Fut>(schedule: DailySchedule, cancel: CancellationToken, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut after = Utc::now();
    loop {
        let next = schedule.next_after(after);
        let wait = DailySchedule::wait_until(next, Utc::now());
        tracing::info!(next_run = %next, "Daily leaderboard scheduled");

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Daily schedule stopped");
                break;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        job().await;
        // Never fire the same occurrence twice, even if the clock lags the timer.
        after = Utc::now().max(next);
    }
}
