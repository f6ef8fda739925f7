//! Timing primitives the viewer is written against.
//!
//! The viewer never sleeps or spawns on its own. It awaits
//! [`Scheduler::yield_once`] and [`Scheduler::delay`] and asks for timers that
//! fire later; the host delivers fired [`TimerHandle`]s back to
//! [`DualViewer::on_timer`](crate::dual_viewer::DualViewer::on_timer).

use log::debug;
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    future::Future,
    time::Duration,
};
use tokio::{sync::mpsc, task::JoinHandle};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

pub trait Scheduler {
    /// Give the host one turn of its event loop.
    fn yield_once(&self) -> impl Future<Output = ()>;

    fn delay(&self, duration: Duration) -> impl Future<Output = ()>;

    /// Fire `handle` once after `delay`.
    fn schedule_once(&self, delay: Duration) -> TimerHandle;

    /// Fire `handle` every `period` until cancelled.
    fn schedule_interval(&self, period: Duration) -> TimerHandle;

    /// Cancelling an unknown or already fired handle is a no-op.
    fn cancel(&self, handle: TimerHandle);
}

/// [`Scheduler`] backed by the tokio runtime. Fired handles arrive on the
/// receiver returned by [`TokioScheduler::new`].
pub struct TokioScheduler {
    sender: mpsc::UnboundedSender<TimerHandle>,
    next_id: Cell<u64>,
    tasks: RefCell<HashMap<TimerHandle, JoinHandle<()>>>,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerHandle>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            sender,
            next_id: Cell::new(0),
            tasks: RefCell::new(HashMap::new()),
        };
        (scheduler, receiver)
    }

    fn next_handle(&self) -> TimerHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        TimerHandle(id)
    }

    fn track(&self, handle: TimerHandle, task: JoinHandle<()>) -> TimerHandle {
        self.tasks.borrow_mut().insert(handle, task);
        handle
    }

    pub fn active_timers(&self) -> usize {
        self.tasks
            .borrow()
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }
}

impl Scheduler for TokioScheduler {
    fn yield_once(&self) -> impl Future<Output = ()> {
        tokio::task::yield_now()
    }

    fn delay(&self, duration: Duration) -> impl Future<Output = ()> {
        tokio::time::sleep(duration)
    }

    fn schedule_once(&self, delay: Duration) -> TimerHandle {
        let handle = self.next_handle();
        let sender = self.sender.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(handle);
        });
        self.track(handle, task)
    }

    fn schedule_interval(&self, period: Duration) -> TimerHandle {
        // tokio rejects a zero period
        let period = period.max(MIN_INTERVAL);
        let handle = self.next_handle();
        let sender = self.sender.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if sender.send(handle).is_err() {
                    break;
                }
            }
        });
        self.track(handle, task)
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(task) = self.tasks.borrow_mut().remove(&handle) {
            debug!("cancelling timer {}", handle.0);
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.get_mut().drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn one_shot_fires_once() {
        let (scheduler, mut fired) = TokioScheduler::new();
        let handle = scheduler.schedule_once(Duration::from_millis(5));

        assert_eq!(fired.recv().await, Some(handle));
        scheduler.cancel(handle);
        assert_eq!(scheduler.active_timers(), 0);
    }

    #[tokio::test]
    async fn interval_repeats_until_cancelled() {
        let (scheduler, mut fired) = TokioScheduler::new();
        let handle = scheduler.schedule_interval(Duration::from_millis(5));

        assert_eq!(fired.recv().await, Some(handle));
        assert_eq!(fired.recv().await, Some(handle));
        scheduler.cancel(handle);
        tokio::task::yield_now().await;
        assert_eq!(scheduler.active_timers(), 0);
    }

    #[tokio::test]
    async fn zero_period_interval_still_ticks() {
        let (scheduler, mut fired) = TokioScheduler::new();
        let handle = scheduler.schedule_interval(Duration::ZERO);

        let tick = tokio::time::timeout(Duration::from_millis(500), fired.recv()).await;
        assert_eq!(tick.ok().flatten(), Some(handle));
        scheduler.cancel(handle);
    }

    #[tokio::test]
    async fn handles_are_unique() {
        let (scheduler, _fired) = TokioScheduler::new();
        let first = scheduler.schedule_once(Duration::from_secs(60));
        let second = scheduler.schedule_interval(Duration::from_secs(60));
        assert_ne!(first, second);
        scheduler.cancel(first);
        scheduler.cancel(second);
    }
}
