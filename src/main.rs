//! VComputer - CLI Entry Point
//!
//! Commands:
//! - `vcomputer run <image>` - Run a program image until it halts
//! - `vcomputer debug <image>` - Interactive terminal monitor
//! - `vcomputer isa` - Print the instruction table
//! - `vcomputer disasm <image>` - Disassemble a program image
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (e.g. `RUST_LOG=vcomputer=trace`).

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vcomputer::clock::DEFAULT_INTERVAL;
use vcomputer::config::MachineConfig;
use vcomputer::cpu::{InstructionSet, Machine, OutputRegister};
use vcomputer::program::{disassemble, ProgramImage};
use vcomputer::{Computer, ComputerDefinition};

#[derive(Parser)]
#[command(name = "vcomputer")]
#[command(version = "0.1.0")]
#[command(about = "A cycle-accurate simulator of a microcoded, bus-based computer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the program image (.vimg)
        program: String,
        /// JSON machine configuration (defaults to the standard 8-bit machine)
        #[arg(short, long)]
        config: Option<String>,
        /// Maximum number of ticks to run
        #[arg(short, long, default_value = "10000")]
        max_ticks: u64,
        /// Print the debugger dump after every control word
        #[arg(short, long)]
        trace: bool,
        /// Tick from the wall clock at this interval (ms) instead of flat out
        #[arg(short, long)]
        realtime: Option<u64>,
    },
    /// Interactive terminal monitor
    Debug {
        /// Path to the program image (.vimg)
        program: String,
        /// JSON machine configuration
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Print the instruction table
    Isa {
        /// JSON machine configuration
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Disassemble a program image
    Disasm {
        /// Path to the program image (.vimg)
        program: String,
        /// JSON machine configuration
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // The monitor owns the terminal; log lines would corrupt it.
    if !matches!(cli.command, Some(Commands::Debug { .. })) {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Some(Commands::Run { program, config, max_ticks, trace, realtime }) => {
            let config = load_config(config.as_deref());
            let image = load_image(&program);
            match realtime {
                Some(ms) => run_realtime(&config, image, Duration::from_millis(ms), max_ticks, trace),
                None => run_program(&config, image, max_ticks, trace),
            }
        }
        Some(Commands::Debug { program, config }) => {
            let config = load_config(config.as_deref());
            debug_program(&config, load_image(&program));
        }
        Some(Commands::Isa { config }) => {
            print_isa(&load_config(config.as_deref()));
        }
        Some(Commands::Disasm { program, config }) => {
            let config = load_config(config.as_deref());
            disassemble_file(&config, &load_image(&program));
        }
        None => {
            println!("VComputer v0.1.0");
            println!("A cycle-accurate microcoded computer simulator");
            println!();
            println!("Use --help for available commands");
            println!();
            demo();
        }
    }
}

fn load_config(path: Option<&str>) -> MachineConfig {
    let Some(path) = path else {
        return MachineConfig::default();
    };
    match MachineConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn load_image(path: &str) -> ProgramImage {
    match ProgramImage::load(path) {
        Ok(image) => {
            println!("📂 Loaded {} words from {}", image.len(), path);
            image
        }
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            std::process::exit(1);
        }
    }
}

fn instruction_set(config: &MachineConfig) -> InstructionSet {
    match config.instruction_set() {
        Ok(set) => set,
        Err(e) => {
            eprintln!("❌ Invalid instruction table: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_program(config: &MachineConfig, image: ProgramImage, max_ticks: u64, trace: bool) {
    let output = OutputRegister::new(
        config.bits,
        Box::new(|value: u64| println!("Output: {}", value)),
    );
    let debugger: Option<Box<dyn vcomputer::cpu::Debugger>> = if trace {
        Some(Box::new(|dump: &str| println!("{}\n", dump)))
    } else {
        None
    };

    let mut machine = match Machine::new(config.bits, instruction_set(config), Some(output), debugger) {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = machine.load_image(&image) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    println!();
    println!("━━━ Execution ━━━");
    let ticks = machine.run_until_halt(max_ticks);

    print_result(&machine, ticks, max_ticks);
}

fn run_realtime(
    config: &MachineConfig,
    image: ProgramImage,
    interval: Duration,
    max_ticks: u64,
    trace: bool,
) {
    let definition = match ComputerDefinition::from_config(config) {
        Ok(definition) if trace => definition.with_debugger(|dump: &str| println!("{}\n", dump)),
        Ok(definition) => definition,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    let computer = match Computer::new(
        definition
            .with_interval(interval)
            .with_output(|value: u64| println!("Output: {}", value))
            .with_image(image)
            .with_enabled(true),
    ) {
        Ok(computer) => computer,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    println!();
    println!("━━━ Execution ({:?} per tick) ━━━", computer.clock().interval());
    let started = Instant::now();
    loop {
        let (halted, ticks) = computer.with_machine(|m| (m.is_halted(), m.ticks()));
        if halted || ticks >= max_ticks {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    let dropped = computer.clock().dropped_ticks();
    let snapshot = computer.shutdown();

    println!();
    println!("━━━ Result ━━━");
    println!("Wall time: {:?}", started.elapsed());
    println!("Dropped ticks: {}", dropped);
    println!("{}", snapshot);
}

fn print_result(machine: &Machine, ticks: u64, max_ticks: u64) {
    let snapshot = machine.snapshot();
    println!();
    println!("━━━ Result ━━━");
    println!("Ticks: {}", ticks);
    println!("State: {}", if snapshot.halted { "Halted" } else { "Running" });
    println!("{}", snapshot);

    if !snapshot.halted && ticks >= max_ticks {
        println!();
        println!("⚠️  Reached max ticks limit ({}). Use --max-ticks to increase.", max_ticks);
    }
}

fn debug_program(config: &MachineConfig, image: ProgramImage) {
    #[cfg(feature = "tui")]
    {
        let definition = match ComputerDefinition::from_config(config) {
            Ok(definition) => definition.with_image(image),
            Err(e) => {
                eprintln!("❌ Configuration error: {}", e);
                std::process::exit(1);
            }
        };

        if let Err(e) = vcomputer::tui::run_monitor(definition) {
            eprintln!("❌ Monitor error: {}", e);
            std::process::exit(1);
        }
    }

    #[cfg(not(feature = "tui"))]
    {
        let _ = (config, image);
        eprintln!("❌ Built without the `tui` feature");
        std::process::exit(1);
    }
}

fn print_isa(config: &MachineConfig) {
    let set = instruction_set(config);
    println!("━━━ Instruction set ({} bits) ━━━", config.bits);
    for instruction in set.iter() {
        let name = instruction.mnemonic.as_deref().unwrap_or("-");
        let steps: Vec<String> = instruction.microcode.iter().map(|w| w.to_string()).collect();
        println!("  0x{:X}  {:<4} {}", instruction.opcode, name, steps.join(", "));
    }
}

fn disassemble_file(config: &MachineConfig, image: &ProgramImage) {
    let set = instruction_set(config);
    for segment in image.segments() {
        println!("{}", disassemble(&segment.words, segment.origin, config.bits, &set));
    }
}

/// LDA/ADD/OUT/HLT on the standard machine.
fn demo() {
    let mut image = ProgramImage::from_words(vec![0x1E, 0x6F, 0xE0, 0xF0]);
    image.push_segment(14, vec![28, 14]);

    println!("━━━ Demo: 28 + 14 ━━━");
    print!("{}", disassemble(&[0x1E, 0x6F, 0xE0, 0xF0], 0, 8, &InstructionSet::standard()));

    let outputs = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let outputs = Arc::clone(&outputs);
        move |value: u64| {
            if let Ok(mut outputs) = outputs.lock() {
                outputs.push(value);
            }
        }
    };
    let result = Machine::new(
        8,
        InstructionSet::standard(),
        Some(OutputRegister::new(8, Box::new(sink))),
        None,
    )
    .and_then(|mut machine| {
        machine.load_image(&image)?;
        Ok(machine)
    });

    match result {
        Ok(mut machine) => {
            let ticks = machine.run_until_halt(1_000);
            let outputs = outputs.lock().map(|o| o.clone()).unwrap_or_default();
            println!();
            println!("Output {:?} after {} ticks (default interval {:?})", outputs, ticks, DEFAULT_INTERVAL);
            println!("✓ Simulator core working!");
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}
