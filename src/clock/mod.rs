//! Tick sequencing and the wall clock.
//!
//! [`Scheduler`] orders the work inside one tick. [`Clock`] decides when
//! ticks happen: periodically from a [`Timer`] while enabled, or one at a
//! time through [`Clock::step`] while paused.

pub mod scheduler;
pub mod timer;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Duration;

use crate::cpu::{ConfigError, Machine};

pub use scheduler::{Phase, Scheduler};
pub use timer::{ManualTimer, ManualTrigger, ThreadTimer, TickHandler, Timer};

/// Shortest tick interval.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);
/// Longest tick interval.
pub const MAX_INTERVAL: Duration = Duration::from_millis(10_000);
/// Interval used when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1_000);
/// Factor applied by [`Clock::increase_interval`] and
/// [`Clock::decrease_interval`].
pub const INTERVAL_STEP: f64 = 1.1;

/// Lock the machine, recovering it if a previous holder panicked.
pub(crate) fn lock(machine: &Mutex<Machine>) -> MutexGuard<'_, Machine> {
    machine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives a shared [`Machine`] from a timer.
pub struct Clock {
    machine: Arc<Mutex<Machine>>,
    enabled: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    interval: Duration,
    timer: Box<dyn Timer>,
}

impl Clock {
    /// Start `timer` against `machine`. Timer ticks are ignored until the
    /// clock is enabled. Fails if the timer cannot be started.
    pub fn new(
        machine: Arc<Mutex<Machine>>,
        mut timer: Box<dyn Timer>,
        interval: Duration,
        enabled: bool,
    ) -> Result<Self, ConfigError> {
        let interval = interval.clamp(MIN_INTERVAL, MAX_INTERVAL);
        let enabled = Arc::new(AtomicBool::new(enabled));
        let dropped = Arc::new(AtomicU64::new(0));

        let handler: TickHandler = {
            let machine = Arc::clone(&machine);
            let enabled = Arc::clone(&enabled);
            let dropped = Arc::clone(&dropped);
            Arc::new(move || {
                if !enabled.load(Ordering::Acquire) {
                    return;
                }
                // A tick still in progress owns the machine; this one is
                // dropped, never queued.
                match machine.try_lock() {
                    Ok(mut machine) => machine.tick(),
                    Err(TryLockError::WouldBlock) => {
                        let total = dropped.fetch_add(1, Ordering::Relaxed) + 1;
                        tracing::debug!(total, "timer tick dropped: machine busy");
                    }
                    Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().tick(),
                }
            })
        };

        timer
            .start(interval, handler)
            .map_err(|e| ConfigError::Timer(e.to_string()))?;
        tracing::debug!(?interval, enabled = enabled.load(Ordering::Relaxed), "clock started");

        Ok(Self {
            machine,
            enabled,
            dropped,
            interval,
            timer,
        })
    }

    pub fn machine(&self) -> &Arc<Mutex<Machine>> {
        &self.machine
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Enable or suppress timer ticks.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        tracing::debug!(enabled, "clock enabled changed");
    }

    /// Flip run/pause. Returns the new state.
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::AcqRel);
        tracing::debug!(enabled, "clock toggled");
        enabled
    }

    /// Run exactly one tick. Only honoured while paused; returns whether a
    /// tick was run.
    pub fn step(&self) -> bool {
        if self.is_enabled() {
            return false;
        }
        lock(&self.machine).tick();
        true
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Reprogram the timer. Out-of-range values are clamped.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.clamp(MIN_INTERVAL, MAX_INTERVAL);
        self.timer.set_interval(self.interval);
        tracing::debug!(interval = ?self.interval, "clock interval changed");
    }

    /// Slow down by [`INTERVAL_STEP`].
    pub fn increase_interval(&mut self) {
        self.set_interval(self.interval.mul_f64(INTERVAL_STEP));
    }

    /// Speed up by [`INTERVAL_STEP`].
    pub fn decrease_interval(&mut self) {
        self.set_interval(self.interval.div_f64(INTERVAL_STEP));
    }

    /// Timer ticks discarded because a previous tick still held the machine.
    pub fn dropped_ticks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop the timer. The machine stays readable.
    pub fn stop(&mut self) {
        self.enabled.store(false, Ordering::Release);
        self.timer.stop();
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("enabled", &self.is_enabled())
            .field("interval", &self.interval)
            .field("dropped", &self.dropped_ticks())
            .finish()
    }
}
