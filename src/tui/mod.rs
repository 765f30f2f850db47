//! Terminal monitor for the simulated computer.
//!
//! Provides an interactive terminal front-end with:
//! - Live register, bus and control-line view
//! - Memory view with disassembly
//! - Run/pause, single-step and clock speed controls
//! - The debugger dump from the last control word

mod app;
mod ui;

pub use app::{run_monitor, MonitorApp};
