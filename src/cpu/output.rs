//! One-way sinks: the output register and the debugger.

use crate::clock::Phase;
use crate::cpu::bus::Bus;
use crate::cpu::component::Component;

/// Receives every value latched by the output register.
pub trait OutputSink: Send {
    fn receive(&mut self, value: u64);
}

impl<F: FnMut(u64) + Send> OutputSink for F {
    fn receive(&mut self, value: u64) {
        self(value)
    }
}

/// Receives a textual state dump after every control word.
pub trait Debugger: Send {
    fn info(&mut self, dump: &str);
}

impl<F: FnMut(&str) + Send> Debugger for F {
    fn info(&mut self, dump: &str) {
        self(dump)
    }
}

/// Forwards dumps to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDebugger;

impl Debugger for TracingDebugger {
    fn info(&mut self, dump: &str) {
        tracing::debug!(target: "vcomputer::debugger", "\n{}", dump);
    }
}

/// Optional output register. Captures the bus in the read phase and hands the
/// value to its sink.
pub struct OutputRegister {
    width: usize,
    sink: Box<dyn OutputSink>,
    last: Option<u64>,
    /// Capture the bus this tick.
    pub input: bool,
}

impl OutputRegister {
    pub fn new(width: usize, sink: Box<dyn OutputSink>) -> Self {
        Self {
            width,
            sink,
            last: None,
            input: false,
        }
    }

    /// Most recent value sent to the sink.
    pub fn last(&self) -> Option<u64> {
        self.last
    }

    pub fn capture(&mut self, bus: &Bus) {
        if self.input {
            let value = bus.value();
            self.last = Some(value);
            self.sink.receive(value);
        }
    }
}

impl Component for OutputRegister {
    fn name(&self) -> &str {
        "output register"
    }

    fn width(&self) -> Option<usize> {
        Some(self.width)
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Read]
    }
}

impl std::fmt::Debug for OutputRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputRegister")
            .field("width", &self.width)
            .field("last", &self.last)
            .field("input", &self.input)
            .finish()
    }
}
