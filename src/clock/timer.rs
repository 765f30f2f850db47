//! Periodic tick sources.
//!
//! The clock never sleeps itself; it hands a handler to a [`Timer`] which
//! calls it once per interval. [`ThreadTimer`] does this on a background
//! thread. [`ManualTimer`] only fires when told to, for deterministic tests.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Called once per timer period.
pub type TickHandler = Arc<dyn Fn() + Send + Sync>;

/// A periodic timer.
pub trait Timer: Send {
    /// Begin calling `handler` every `interval`. Replaces any running handler.
    fn start(&mut self, interval: Duration, handler: TickHandler) -> io::Result<()>;

    /// Change the period of a running timer.
    fn set_interval(&mut self, interval: Duration);

    /// Stop firing. Idempotent.
    fn stop(&mut self);
}

enum Command {
    SetInterval(Duration),
    Stop,
}

/// A timer backed by a dedicated thread.
///
/// The thread waits on a command channel with the interval as timeout, so a
/// stop or interval change takes effect immediately rather than after the
/// current period.
#[derive(Default)]
pub struct ThreadTimer {
    commands: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl ThreadTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl Timer for ThreadTimer {
    fn start(&mut self, interval: Duration, handler: TickHandler) -> io::Result<()> {
        self.stop();

        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("vcomputer-clock".to_string())
            .spawn(move || {
                let mut interval = interval;
                loop {
                    match rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => handler(),
                        Ok(Command::SetInterval(next)) => interval = next,
                        Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        self.commands = Some(tx);
        self.worker = Some(worker);
        Ok(())
    }

    fn set_interval(&mut self, interval: Duration) {
        if let Some(tx) = &self.commands {
            // A send error means the thread already exited; nothing to update.
            let _ = tx.send(Command::SetInterval(interval));
        }
    }

    fn stop(&mut self) {
        if let Some(tx) = self.commands.take() {
            let _ = tx.send(Command::Stop);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("clock thread panicked");
            }
        }
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

type Slot = Arc<Mutex<Option<TickHandler>>>;

/// A timer that only fires through its [`ManualTrigger`].
#[derive(Default)]
pub struct ManualTimer {
    handler: Slot,
    interval: Arc<Mutex<Option<Duration>>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that can fire this timer from anywhere, including after the
    /// timer has been moved into a clock.
    pub fn trigger(&self) -> ManualTrigger {
        ManualTrigger {
            handler: Arc::clone(&self.handler),
            interval: Arc::clone(&self.interval),
        }
    }
}

impl Timer for ManualTimer {
    fn start(&mut self, interval: Duration, handler: TickHandler) -> io::Result<()> {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);
        self.set_interval(interval);
        Ok(())
    }

    fn set_interval(&mut self, interval: Duration) {
        *self.interval.lock().unwrap_or_else(PoisonError::into_inner) = Some(interval);
    }

    fn stop(&mut self) {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Fires a [`ManualTimer`].
#[derive(Clone)]
pub struct ManualTrigger {
    handler: Slot,
    interval: Arc<Mutex<Option<Duration>>>,
}

impl ManualTrigger {
    /// Call the handler once, as if one period had elapsed. Returns false if
    /// the timer is stopped.
    pub fn fire(&self) -> bool {
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    /// Interval last programmed into the timer.
    pub fn interval(&self) -> Option<Duration> {
        *self.interval.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn counter() -> (Arc<AtomicUsize>, TickHandler) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler: TickHandler = {
            let count = Arc::clone(&count);
            Arc::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        (count, handler)
    }

    #[test]
    fn test_manual_timer() {
        let (count, handler) = counter();
        let mut timer = ManualTimer::new();
        let trigger = timer.trigger();

        assert!(!trigger.fire());
        timer.start(Duration::from_millis(5), handler).unwrap();
        assert!(trigger.fire());
        assert!(trigger.fire());
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(trigger.interval(), Some(Duration::from_millis(5)));

        timer.set_interval(Duration::from_millis(9));
        assert_eq!(trigger.interval(), Some(Duration::from_millis(9)));

        timer.stop();
        assert!(!trigger.fire());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_thread_timer_fires_and_stops() {
        let (count, handler) = counter();
        let mut timer = ThreadTimer::new();
        timer.start(Duration::from_millis(1), handler).unwrap();
        assert!(timer.is_running());

        let deadline = Instant::now() + Duration::from_secs(5);
        while count.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        timer.stop();
        assert!(!timer.is_running());

        let stopped_at = count.load(Ordering::SeqCst);
        assert!(stopped_at >= 3);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), stopped_at);
    }

    #[test]
    fn test_thread_timer_stop_is_prompt() {
        let (_, handler) = counter();
        let mut timer = ThreadTimer::new();
        timer.start(Duration::from_secs(60), handler).unwrap();

        let started = Instant::now();
        timer.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
