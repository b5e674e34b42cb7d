//! Cancellable timers on the Tokio runtime.
//!
//! Three shapes of deferred work exist in the piano:
//!
//! | Shape                  | Used for                                   |
//! |------------------------|--------------------------------------------|
//! | [`after`]              | reverting a key's pressed effect (150 ms)  |
//! | [`every`]              | blinking the recording indicator (500 ms)  |
//! | [`run_plan`]           | replaying a recording                      |
//!
//! Each returns a [`TimerHandle`].  Dropping the handle detaches the timer;
//! calling [`TimerHandle::cancel`] stops it, and for a plan that means every
//! step that has not fired yet is discarded in one go.
//!
//! # Plan ordering
//!
//! A plan's deadlines are all measured from the instant [`run_plan`] is called,
//! so a late step does not push back the steps after it.  Steps are fired in
//! deadline order; steps with equal deadlines fire in the order they were
//! submitted.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Smallest period accepted by [`every`]; `tokio::time::interval` rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// One step of a plan: run `action` once `delay` has elapsed since submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedStep<A> {
    pub delay: Duration,
    pub action: A,
}

impl<A> TimedStep<A> {
    pub fn new(delay: Duration, action: A) -> Self {
        Self { delay, action }
    }
}

/// Handle to a scheduled timer task.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Stops the timer.  Work that has not started yet never runs.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Returns `true` once the timer has run to completion or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Runs `work` once after `delay`.
pub fn after<F>(delay: Duration, work: F) -> TimerHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let deadline = Instant::now() + delay;
    TimerHandle {
        task: tokio::spawn(async move {
            time::sleep_until(deadline).await;
            work.await;
        }),
    }
}

/// Calls `tick` every `period`, starting one period from now, until cancelled.
pub fn every<F, Fut>(period: Duration, mut tick: F) -> TimerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let period = period.max(MIN_PERIOD);
    let start = Instant::now() + period;
    TimerHandle {
        task: tokio::spawn(async move {
            let mut interval = time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                tick().await;
            }
        }),
    }
}

/// Submits a list of timed steps and fires each through `fire` at its deadline.
///
/// `fire` is awaited step by step, so it should hand long-running work off to
/// its own task rather than block the plan.
pub fn run_plan<A, F, Fut>(mut steps: Vec<TimedStep<A>>, mut fire: F) -> TimerHandle
where
    A: Send + 'static,
    F: FnMut(A) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let origin = Instant::now();
    // Stable sort: equal delays keep submission order.
    steps.sort_by_key(|step| step.delay);
    TimerHandle {
        task: tokio::spawn(async move {
            for step in steps {
                time::sleep_until(origin + step.delay).await;
                fire(step.action).await;
            }
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
