//! Recurring backup timer
//!
//! The timer is a tokio task that sleeps until the first fire, then repeats
//! every period. Its handle aborts the task on drop, so replacing or clearing
//! the stored handle is all it takes to cancel it.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Delays beyond this many days are clamped so the deadline stays representable
const MAX_DELAY_DAYS: u64 = 100 * 366;

/// Owned handle to a running timer task; dropping it cancels the task
#[derive(Debug)]
pub(crate) struct TimerHandle {
    task: JoinHandle<()>,
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// How long to wait before the first automatic backup
///
/// `max(0, freq_days - days_since(last_backup))` days, or immediately when no
/// backup has ever been recorded.
pub fn first_fire_delay(freq_days: u32, last_backup: Option<NaiveDate>, today: NaiveDate) -> Duration {
    let Some(last_backup) = last_backup else {
        return Duration::ZERO;
    };

    let since = today.signed_duration_since(last_backup).num_days();
    let remaining = (i64::from(freq_days) - since).max(0);
    days(remaining as u64)
}

/// Interval between automatic backups after the first one
pub fn period(freq_days: u32) -> Duration {
    days(u64::from(freq_days).max(1))
}

fn days(count: u64) -> Duration {
    Duration::from_secs(count.min(MAX_DELAY_DAYS) * SECS_PER_DAY)
}

/// Spawn a task calling `on_fire` after `first`, then every `period`
///
/// The loop ends when `on_fire` returns `ControlFlow::Break`.
pub(crate) fn spawn_recurring<F, Fut>(
    runtime: &Handle,
    first: Duration,
    period: Duration,
    mut on_fire: F,
) -> TimerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ControlFlow<()>> + Send + 'static,
{
    let task = runtime.spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + first, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if on_fire().await.is_break() {
                break;
            }
        }
    });

    TimerHandle { task }
}
