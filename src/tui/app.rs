//! Monitor application state and input handling.

use std::sync::{Arc, Mutex, PoisonError};

use crate::computer::{Computer, ComputerDefinition};
use crate::cpu::{ConfigError, MachineSnapshot};
use crate::program::disassemble_word;

/// Values the output register has shown, newest last.
type OutputLog = Arc<Mutex<Vec<u64>>>;

/// Monitor application state.
pub struct MonitorApp {
    pub computer: Computer,
    outputs: OutputLog,
    debug_dump: Arc<Mutex<String>>,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
}

impl MonitorApp {
    /// Build the computer with output and debugger sinks feeding the UI.
    pub fn new(definition: ComputerDefinition) -> Result<Self, ConfigError> {
        let outputs: OutputLog = Arc::default();
        let debug_dump = Arc::new(Mutex::new(String::new()));

        let definition = definition
            .with_output({
                let outputs = Arc::clone(&outputs);
                move |value: u64| {
                    outputs
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(value)
                }
            })
            .with_debugger({
                let debug_dump = Arc::clone(&debug_dump);
                move |dump: &str| {
                    *debug_dump.lock().unwrap_or_else(PoisonError::into_inner) = dump.to_string()
                }
            });

        Ok(Self {
            computer: Computer::new(definition)?,
            outputs,
            debug_dump,
            should_quit: false,
            status: "Ready. Press 't' to run, 's' to step, 'q' to quit.".into(),
            mem_scroll: 0,
        })
    }

    pub fn toggle(&mut self) {
        let running = self.computer.clock().toggle();
        self.status = if running { "Running..." } else { "Paused." }.into();
    }

    pub fn step(&mut self) {
        if self.computer.clock().step() {
            let snapshot = self.computer.snapshot();
            self.status = format!("Tick {}: {}", snapshot.tick, snapshot.control);
        } else {
            self.status = "Pause the clock before stepping.".into();
        }
    }

    pub fn faster(&mut self) {
        self.computer.clock_mut().decrease_interval();
        self.status = format!("Interval {:?}", self.computer.clock().interval());
    }

    pub fn slower(&mut self) {
        self.computer.clock_mut().increase_interval();
        self.status = format!("Interval {:?}", self.computer.clock().interval());
    }

    pub fn scroll_up(&mut self) {
        self.mem_scroll = self.mem_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let capacity = self.computer.with_machine(|m| m.board().ram.capacity());
        if self.mem_scroll + 1 < capacity {
            self.mem_scroll += 1;
        }
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        self.computer.snapshot()
    }

    pub fn outputs(&self) -> Vec<u64> {
        self.outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn debug_dump(&self) -> String {
        self.debug_dump
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `count` RAM rows from the scroll offset: address, word, disassembly,
    /// and whether the RAM address register points at it.
    pub fn memory_rows(&self, count: usize) -> Vec<(usize, u64, String, bool)> {
        self.computer.with_machine(|machine| {
            let ram = &machine.board().ram;
            ram.dump(self.mem_scroll, count)
                .into_iter()
                .map(|(addr, word)| {
                    let text = disassemble_word(word, machine.bits(), machine.instructions());
                    (addr, word, text, addr == ram.address())
                })
                .collect()
        })
    }
}

/// Run the monitor until the user quits.
pub fn run_monitor(definition: ComputerDefinition) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    let mut app = MonitorApp::new(definition)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('t') | KeyCode::Char(' ') => app.toggle(),
                        KeyCode::Char('s') => app.step(),
                        KeyCode::Right => app.faster(),
                        KeyCode::Left => app.slower(),
                        KeyCode::Up => app.scroll_up(),
                        KeyCode::Down => app.scroll_down(),
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    app.computer.shutdown();
    Ok(())
}
