//! WebAssembly bindings for the simulator.
//!
//! The browser drives ticks itself (e.g. from `requestAnimationFrame`), so
//! this wraps a bare [`Machine`] with no clock thread.

use std::sync::{Arc, Mutex, PoisonError};

use wasm_bindgen::prelude::*;

use crate::config::MachineConfig;
use crate::cpu::{InstructionSet, Machine, OutputRegister};
use crate::program::{disassemble_word, ProgramImage};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmComputer {
    machine: Machine,
    bits: usize,
    instructions: InstructionSet,
    image: ProgramImage,
    outputs: Arc<Mutex<Vec<u64>>>,
}

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

fn build(
    bits: usize,
    instructions: InstructionSet,
    image: &ProgramImage,
    outputs: &Arc<Mutex<Vec<u64>>>,
) -> Result<Machine, JsError> {
    let sink = {
        let outputs = Arc::clone(outputs);
        move |value: u64| {
            outputs
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(value)
        }
    };
    let output = OutputRegister::new(bits, Box::new(sink));
    let mut machine = Machine::new(bits, instructions, Some(output), None).map_err(js_error)?;
    machine.load_image(image).map_err(js_error)?;
    Ok(machine)
}

#[wasm_bindgen]
impl WasmComputer {
    /// Create the standard 8-bit machine.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmComputer, JsError> {
        Self::with_config("{}")
    }

    /// Create a machine from a JSON configuration.
    #[wasm_bindgen]
    pub fn with_config(json: &str) -> Result<WasmComputer, JsError> {
        let config = MachineConfig::from_json(json).map_err(js_error)?;
        let instructions = config.instruction_set().map_err(js_error)?;
        let image = ProgramImage::new();
        let outputs = Arc::new(Mutex::new(Vec::new()));
        let machine = build(config.bits, instructions.clone(), &image, &outputs)?;

        Ok(Self {
            machine,
            bits: config.bits,
            instructions,
            image,
            outputs,
        })
    }

    /// Load a program image in text form and reset. Returns the word count.
    #[wasm_bindgen]
    pub fn load_image(&mut self, source: &str) -> Result<usize, JsError> {
        let image = ProgramImage::parse(source).map_err(js_error)?;
        let len = image.len();
        self.image = image;
        self.reset()?;
        Ok(len)
    }

    /// Rebuild the machine with the loaded image.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsError> {
        self.outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.machine = build(self.bits, self.instructions.clone(), &self.image, &self.outputs)?;
        Ok(())
    }

    /// Run one tick. Returns the asserted control word.
    #[wasm_bindgen]
    pub fn step(&mut self) -> String {
        self.machine.tick();
        self.machine.last_word().to_string()
    }

    /// Tick until halt or `max_ticks`. Returns the total tick count.
    #[wasm_bindgen]
    pub fn run(&mut self, max_ticks: u32) -> u64 {
        self.machine.run_until_halt(u64::from(max_ticks));
        self.machine.ticks()
    }

    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.machine.is_halted()
    }

    #[wasm_bindgen]
    pub fn ticks(&self) -> u64 {
        self.machine.ticks()
    }

    /// Full machine snapshot as a JS object.
    #[wasm_bindgen]
    pub fn state(&self) -> Result<JsValue, JsError> {
        let json = serde_json::to_string(&self.machine.snapshot()).map_err(js_error)?;
        js_sys::JSON::parse(&json).map_err(|_| JsError::new("snapshot is not valid JSON"))
    }

    /// The debugger dump for the current state.
    #[wasm_bindgen]
    pub fn dump(&self) -> String {
        self.machine.snapshot().to_string()
    }

    /// Every value the output register has received.
    #[wasm_bindgen]
    pub fn outputs(&self) -> Vec<u64> {
        self.outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get all memory as an array of words.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<u64> {
        let ram = &self.machine.board().ram;
        ram.dump(0, ram.capacity()).into_iter().map(|(_, word)| word).collect()
    }

    /// Disassemble the word at `address`.
    #[wasm_bindgen]
    pub fn disassemble_at(&self, address: usize) -> String {
        let ram = &self.machine.board().ram;
        if address < ram.capacity() {
            disassemble_word(ram.read(address), self.bits, self.machine.instructions())
        } else {
            String::new()
        }
    }
}

/// Disassemble a word against the standard instruction set.
#[wasm_bindgen]
pub fn wasm_disassemble(word: u32) -> String {
    disassemble_word(u64::from(word), 8, &InstructionSet::standard())
}
