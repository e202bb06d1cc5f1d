//! TTL Reaper Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::{lock_store, CacheStore};
use crate::clock::Clock;

// == Reaper State ==
/// Lifecycle of the reaper: `Running` from construction until it stops for
/// good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaperState {
    Running,
    Stopped,
}

// == Reaper ==
/// Owned handle on the background sweep task.
///
/// Dropping the handle without calling [`Reaper::stop`] also ends the task,
/// at its next wake-up rather than synchronously.
#[derive(Debug)]
pub struct Reaper {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
    running: Arc<AtomicBool>,
}

impl Reaper {
    /// Spawns a task on `runtime` that purges expired entries from `store`
    /// every `interval`.
    ///
    /// The first sweep happens one full interval after spawning. The store
    /// lock is held only for the duration of a sweep, never across an await.
    pub fn spawn<K, V, C>(
        runtime: &Handle,
        store: Arc<Mutex<CacheStore<K, V>>>,
        clock: C,
        interval: Duration,
    ) -> Self
    where
        K: std::hash::Hash + Eq + Clone + Send + 'static,
        V: Send + 'static,
        C: Clock,
    {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let running = Arc::new(AtomicBool::new(true));
        // Moved into the task so the flag clears however the task ends
        let running_guard = RunningGuard(running.clone());

        let handle = runtime.spawn(async move {
            let _running_guard = running_guard;
            let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);

            let Some(first_tick) = time::Instant::now().checked_add(interval) else {
                warn!(interval_ms, "TTL reaper interval out of range, sweeps disabled");
                let _ = shutdown_rx.await;
                return;
            };

            info!(interval_ms, "starting TTL reaper");

            let mut ticker = time::interval_at(first_tick, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    // Fires on an explicit stop or when the sender is dropped
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let removed = {
                            let mut guard = lock_store(&store);
                            guard.purge_expired(clock.now())
                        };

                        if removed > 0 {
                            info!(removed, "TTL reaper: removed expired entries");
                        } else {
                            debug!("TTL reaper: no expired entries found");
                        }
                    }
                }
            }

            debug!("TTL reaper stopped");
        });

        Self {
            shutdown_tx,
            handle,
            running,
        }
    }

    /// Shared flag cleared once the task has exited.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Signals the task and waits for it to exit.
    ///
    /// Once this returns no further sweep can run.
    pub async fn stop(self) {
        // An Err means the task already exited and dropped its receiver
        let _ = self.shutdown_tx.send(());

        if let Err(err) = self.handle.await {
            if err.is_panic() {
                warn!("TTL reaper task panicked");
            }
        }
        self.running.store(false, Ordering::Release);
    }
}

/// Clears the shared running flag when dropped.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
