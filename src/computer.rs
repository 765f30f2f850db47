//! Composition root: wires a machine and puts a clock in front of it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::{self, Clock, ThreadTimer, Timer, DEFAULT_INTERVAL};
use crate::config::MachineConfig;
use crate::cpu::{
    ConfigError, Debugger, InstructionSet, Machine, MachineSnapshot, OutputRegister, OutputSink,
};
use crate::program::ProgramImage;

/// Everything needed to build a [`Computer`].
pub struct ComputerDefinition {
    pub bits: usize,
    pub instructions: InstructionSet,
    pub interval: Duration,
    /// Start ticking immediately.
    pub enabled: bool,
    pub output: Option<Box<dyn OutputSink>>,
    pub debugger: Option<Box<dyn Debugger>>,
    /// Defaults to a [`ThreadTimer`].
    pub timer: Option<Box<dyn Timer>>,
    pub image: ProgramImage,
}

impl Default for ComputerDefinition {
    fn default() -> Self {
        Self {
            bits: 8,
            instructions: InstructionSet::standard(),
            interval: DEFAULT_INTERVAL,
            enabled: false,
            output: None,
            debugger: None,
            timer: None,
            image: ProgramImage::new(),
        }
    }
}

impl ComputerDefinition {
    pub fn new(bits: usize, instructions: InstructionSet) -> Self {
        Self {
            bits,
            instructions,
            ..Self::default()
        }
    }

    /// Start from a loaded configuration file.
    pub fn from_config(config: &MachineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            bits: config.bits,
            instructions: config.instruction_set()?,
            interval: config.interval(),
            ..Self::default()
        })
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_output(mut self, sink: impl OutputSink + 'static) -> Self {
        self.output = Some(Box::new(sink));
        self
    }

    pub fn with_debugger(mut self, debugger: impl Debugger + 'static) -> Self {
        self.debugger = Some(Box::new(debugger));
        self
    }

    pub fn with_timer(mut self, timer: impl Timer + 'static) -> Self {
        self.timer = Some(Box::new(timer));
        self
    }

    pub fn with_image(mut self, image: ProgramImage) -> Self {
        self.image = image;
        self
    }
}

impl std::fmt::Debug for ComputerDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputerDefinition")
            .field("bits", &self.bits)
            .field("instructions", &self.instructions.len())
            .field("interval", &self.interval)
            .field("enabled", &self.enabled)
            .field("output", &self.output.is_some())
            .field("debugger", &self.debugger.is_some())
            .field("image", &self.image.len())
            .finish()
    }
}

/// A wired machine with a running clock.
#[derive(Debug)]
pub struct Computer {
    clock: Clock,
}

impl Computer {
    /// Wire the machine, load the image and start the timer. Any
    /// configuration error is returned before a single tick can run.
    pub fn new(definition: ComputerDefinition) -> Result<Self, ConfigError> {
        let ComputerDefinition {
            bits,
            instructions,
            interval,
            enabled,
            output,
            debugger,
            timer,
            image,
        } = definition;

        let output = output.map(|sink| OutputRegister::new(bits, sink));
        let mut machine = Machine::new(bits, instructions, output, debugger)?;
        machine.load_image(&image)?;

        let timer = timer.unwrap_or_else(|| Box::new(ThreadTimer::new()) as Box<dyn Timer>);
        let clock = Clock::new(Arc::new(Mutex::new(machine)), timer, interval, enabled)?;
        Ok(Self { clock })
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Read the machine under the same lock ticks take.
    pub fn with_machine<R>(&self, f: impl FnOnce(&Machine) -> R) -> R {
        f(&*clock::lock(self.clock.machine()))
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        self.with_machine(Machine::snapshot)
    }

    pub fn is_halted(&self) -> bool {
        self.with_machine(Machine::is_halted)
    }

    /// Stop the clock and release the timer.
    pub fn shutdown(mut self) -> MachineSnapshot {
        self.clock.stop();
        tracing::info!("computer shut down");
        self.snapshot()
    }
}
