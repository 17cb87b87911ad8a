//! Expiry Sweeper Task
//!
//! Background thread that periodically removes expired cache entries.

use std::io;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

/// Stop flag the sweeper thread waits on between ticks.
#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }

    /// Waits for `interval` or a stop request. Returns false once stopped.
    fn wait(&self, interval: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        match Instant::now().checked_add(interval) {
            Some(deadline) => {
                while !*stopped {
                    if self.wake.wait_until(&mut stopped, deadline).timed_out() {
                        break;
                    }
                }
            }
            None => {
                while !*stopped {
                    self.wake.wait(&mut stopped);
                }
            }
        }
        !*stopped
    }
}

// == Sweeper ==
/// Handle to a running sweeper thread.
///
/// Every `interval` the thread upgrades its weak reference to the target and
/// runs the sweep function on it. It exits when asked to stop or when the
/// target has been dropped. Dropping the handle stops the thread and waits for
/// an in-flight sweep to finish.
#[derive(Debug)]
pub struct Sweeper {
    signal: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawns a sweeper thread.
    ///
    /// # Arguments
    /// * `target` - Weak reference to the state being swept
    /// * `interval` - Time between sweeps
    /// * `sweep` - Removes expired entries and returns how many it removed
    pub fn spawn<T, F>(target: Weak<T>, interval: Duration, sweep: F) -> io::Result<Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> usize + Send + 'static,
    {
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);

        let handle = thread::Builder::new()
            .name("cache-sweeper".to_string())
            .spawn(move || {
                info!("Starting cache sweeper with interval of {:?}", interval);

                while thread_signal.wait(interval) {
                    let Some(target) = target.upgrade() else {
                        debug!("Cache dropped, sweeper exiting");
                        break;
                    };

                    let removed = sweep(&target);
                    drop(target);

                    if removed > 0 {
                        info!("Sweep: removed {} expired entries", removed);
                    } else {
                        debug!("Sweep: no expired entries found");
                    }
                }

                info!("Cache sweeper stopped");
            })?;

        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Returns true while the sweeper thread is alive.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the sweeper and waits for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.signal.stop();
        let Some(handle) = self.handle.take() else {
            return;
        };
        // The last cache handle can be released by the sweep itself.
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            warn!("Cache sweeper thread panicked");
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.shutdown();
    }
}
