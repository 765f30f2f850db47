//! The assembled machine: a board of components, the control logic and the
//! per-tick scheduler.
//!
//! One call to [`Machine::tick`] runs every registered action once, phase by
//! phase. Nothing here knows about wall-clock time; see [`crate::clock`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bits;
use crate::clock::{Phase, Scheduler};
use crate::cpu::alu::Alu;
use crate::cpu::bus::Bus;
use crate::cpu::component::{Component, ComponentId};
use crate::cpu::control::{ControlLogic, Stage};
use crate::cpu::error::ConfigError;
use crate::cpu::flags::ControlWord;
use crate::cpu::instruction::InstructionSet;
use crate::cpu::memory::{AddressController, Ram};
use crate::cpu::output::{Debugger, OutputRegister};
use crate::cpu::registers::{InstructionRegister, ProgramCounter, Register};
use crate::cpu::wiring::Wiring;
use crate::cpu::MAX_BITS;
use crate::program::ProgramImage;

/// The bus and every component connected to it.
#[derive(Debug)]
pub struct Board {
    pub bus: Bus,
    pub reg_a: Register,
    pub reg_b: Register,
    pub instruction: InstructionRegister,
    pub counter: ProgramCounter,
    pub ram: Ram,
    pub address: AddressController,
    pub alu: Alu,
    pub output: Option<OutputRegister>,
}

impl Board {
    pub fn new(bits: usize, output: Option<OutputRegister>) -> Self {
        Self {
            bus: Bus::new(bits),
            reg_a: Register::new("register A", bits),
            reg_b: Register::new("register B", bits),
            instruction: InstructionRegister::new(bits),
            counter: ProgramCounter::new(bits),
            ram: Ram::new(bits),
            address: AddressController::new(bits),
            alu: Alu::new(bits),
            output,
        }
    }

    /// Bus-connected components in registration order.
    pub fn components(&self) -> Vec<(ComponentId, &dyn Component)> {
        let fixed: [(ComponentId, &dyn Component); 7] = [
            (ComponentId::RegA, &self.reg_a),
            (ComponentId::RegB, &self.reg_b),
            (ComponentId::Instruction, &self.instruction),
            (ComponentId::Counter, &self.counter),
            (ComponentId::Address, &self.address),
            (ComponentId::Ram, &self.ram),
            (ComponentId::Alu, &self.alu),
        ];
        let mut list = fixed.to_vec();
        if let Some(out) = &self.output {
            list.push((ComponentId::Output, out));
        }
        list
    }
}

/// A wired machine, ready to tick.
pub struct Machine {
    board: Board,
    control: ControlLogic,
    scheduler: Scheduler,
    wiring: Wiring,
    debugger: Option<Box<dyn Debugger>>,
    ticks: u64,
    last_word: ControlWord,
    last_stage: Option<Stage>,
}

impl Machine {
    /// Build and wire a machine.
    ///
    /// Fails if `bits` is odd or out of range, if any component's width
    /// differs from the bus, or if the instruction set asserts a line whose
    /// component is missing.
    pub fn new(
        bits: usize,
        instructions: InstructionSet,
        output: Option<OutputRegister>,
        debugger: Option<Box<dyn Debugger>>,
    ) -> Result<Self, ConfigError> {
        if bits < 2 || bits > MAX_BITS || bits % 2 != 0 {
            return Err(ConfigError::InvalidWidth(bits));
        }
        instructions.validate(bits)?;

        let board = Board::new(bits, output);
        let control = ControlLogic::new(instructions);

        let mut scheduler = Scheduler::new();
        scheduler.register(ComponentId::Control, control.phases());
        for (id, component) in board.components() {
            component.attach(&board.bus)?;
            scheduler.register(id, component.phases());
        }

        let wiring = Wiring::new(&board);
        wiring.check(control.instructions())?;

        tracing::info!(
            bits,
            instructions = control.instructions().len(),
            output = board.output.is_some(),
            "machine wired"
        );

        Ok(Self {
            board,
            control,
            scheduler,
            wiring,
            debugger,
            ticks: 0,
            last_word: ControlWord::EMPTY,
            last_stage: None,
        })
    }

    /// Copy a program image into RAM.
    pub fn load_image(&mut self, image: &ProgramImage) -> Result<(), ConfigError> {
        self.board.ram.load_image(image)?;
        tracing::debug!(words = image.len(), "program image loaded");
        Ok(())
    }

    pub fn bits(&self) -> usize {
        self.board.bus.width()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Direct access for front-ends and tests. Mutating component flags here
    /// is overwritten by the next decode.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn control(&self) -> &ControlLogic {
        &self.control
    }

    pub fn instructions(&self) -> &InstructionSet {
        self.control.instructions()
    }

    pub fn is_halted(&self) -> bool {
        self.scheduler.is_halted()
    }

    /// Ticks executed so far, not counting ticks swallowed by halt.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_word(&self) -> ControlWord {
        self.last_word
    }

    /// Run one tick. A no-op once halted.
    pub fn tick(&mut self) {
        if self.scheduler.is_halted() {
            return;
        }
        self.ticks += 1;

        for phase in Phase::ALL {
            for i in 0..self.scheduler.bucket(phase).len() {
                let id = self.scheduler.bucket(phase)[i];
                self.run(phase, id);
            }
        }
    }

    /// Tick until halted or `limit` ticks have run. Returns ticks executed.
    pub fn run_until_halt(&mut self, limit: u64) -> u64 {
        let start = self.ticks;
        while !self.is_halted() && self.ticks - start < limit {
            self.tick();
        }
        self.ticks - start
    }

    fn run(&mut self, phase: Phase, id: ComponentId) {
        if (phase, id) == (Phase::Decode, ComponentId::Control) {
            self.decode();
            return;
        }

        let board = &mut self.board;
        match (phase, id) {
            (Phase::Write, ComponentId::RegA) => board.reg_a.drive(&mut board.bus),
            (Phase::Write, ComponentId::RegB) => board.reg_b.drive(&mut board.bus),
            (Phase::Write, ComponentId::Instruction) => board.instruction.drive(&mut board.bus),
            (Phase::Write, ComponentId::Counter) => board.counter.drive(&mut board.bus),
            (Phase::Write, ComponentId::Ram) => board.ram.drive(&mut board.bus),
            (Phase::Write, ComponentId::Alu) => {
                board.alu.drive(board.reg_a.bits(), board.reg_b.bits(), &mut board.bus)
            }

            (Phase::Latch, ComponentId::Counter) => board.counter.increment(),
            (Phase::Latch, ComponentId::Address) => {
                board.address.capture(&board.bus, &mut board.ram)
            }

            (Phase::Read, ComponentId::RegA) => board.reg_a.capture(&board.bus),
            (Phase::Read, ComponentId::RegB) => board.reg_b.capture(&board.bus),
            (Phase::Read, ComponentId::Instruction) => board.instruction.capture(&board.bus),
            (Phase::Read, ComponentId::Counter) => board.counter.capture(&board.bus),
            (Phase::Read, ComponentId::Ram) => board.ram.capture(&board.bus),
            (Phase::Read, ComponentId::Output) => {
                if let Some(out) = board.output.as_mut() {
                    out.capture(&board.bus);
                }
            }

            _ => {}
        }
    }

    fn decode(&mut self) {
        let (word, stage) = self.control.next_word(&self.board.instruction);
        self.wiring.apply(word, &mut self.board, &mut self.scheduler);
        self.last_word = word;
        self.last_stage = Some(stage);

        tracing::trace!(tick = self.ticks, ?stage, %word, "control word");

        if self.debugger.is_some() {
            let dump = self.snapshot().to_string();
            if let Some(debugger) = self.debugger.as_mut() {
                debugger.info(&dump);
            }
        }
    }

    /// Capture every observable value.
    pub fn snapshot(&self) -> MachineSnapshot {
        let board = &self.board;
        MachineSnapshot {
            bits: self.bits(),
            tick: self.ticks,
            halted: self.is_halted(),
            control: self.last_word,
            stage: self.last_stage,
            pointer: self.control.pointer(),
            bus: board.bus.value(),
            ram_address: board.ram.address(),
            ram: board.ram.current(),
            reg_a: board.reg_a.value(),
            reg_b: board.reg_b.value(),
            instruction: board.instruction.value(),
            counter: board.counter.value(),
            alu: board.alu.preview(board.reg_a.bits(), board.reg_b.bits()),
            output: board.output.as_ref().and_then(OutputRegister::last),
        }
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("board", &self.board)
            .field("control", &self.control)
            .field("wiring", &self.wiring)
            .field("ticks", &self.ticks)
            .field("halted", &self.is_halted())
            .finish()
    }
}

/// Point-in-time view of the machine, for dumps and front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub bits: usize,
    pub tick: u64,
    pub halted: bool,
    /// Control word asserted in the last tick.
    pub control: ControlWord,
    pub stage: Option<Stage>,
    /// Micro-step pointer for the next tick.
    pub pointer: usize,
    pub bus: u64,
    pub ram_address: usize,
    /// Word at `ram_address`.
    pub ram: u64,
    pub reg_a: u64,
    pub reg_b: u64,
    pub instruction: u64,
    pub counter: u64,
    /// What the ALU would drive given A and B and the current mode.
    pub alu: u64,
    pub output: Option<u64>,
}

impl MachineSnapshot {
    fn binary(&self, value: u64) -> String {
        bits::format_bits(&bits::to_bits(value, self.bits))
    }
}

impl fmt::Display for MachineSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Instructions:   {}", self.control)?;
        writeln!(f, "RAMAddress:     0x{:02X}", self.ram_address)?;
        writeln!(f, "RAM:            {}", self.binary(self.ram))?;
        writeln!(f, "RegA:           {}", self.binary(self.reg_a))?;
        writeln!(f, "RegB:           {}", self.binary(self.reg_b))?;
        writeln!(f, "InstructionReg: {}", self.binary(self.instruction))?;
        write!(f, "ProgramCounter: 0x{:02X}", self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::flags::ControlLine;
    use crate::cpu::instruction::Instruction;
    use std::sync::{Arc, Mutex};

    fn standard(image: &[u64]) -> Machine {
        let mut machine = Machine::new(8, InstructionSet::standard(), None, None).unwrap();
        machine
            .load_image(&ProgramImage::from_words(image.to_vec()))
            .unwrap();
        machine
    }

    #[test]
    fn test_invalid_widths() {
        for bits in [0, 1, 7, 18] {
            assert_eq!(
                Machine::new(bits, InstructionSet::default(), None, None).err(),
                Some(ConfigError::InvalidWidth(bits))
            );
        }
        assert!(Machine::new(2, InstructionSet::default(), None, None).is_ok());
    }

    #[test]
    fn test_narrow_output_register_rejected() {
        let out = OutputRegister::new(4, Box::new(|_: u64| {}));
        let err = Machine::new(8, InstructionSet::standard(), Some(out), None).unwrap_err();
        assert_eq!(
            err,
            ConfigError::WidthMismatch {
                component: "output register".to_string(),
                expected: 8,
                actual: 4,
            }
        );
    }

    #[test]
    fn test_write_before_read_in_one_tick() {
        // opcode 3: A drives, B captures, in a single micro-step
        let set = InstructionSet::new([Instruction::new(
            3,
            vec![ControlLine::RegAOut | ControlLine::RegBIn],
        )])
        .unwrap();
        let mut machine = Machine::new(8, set, None, None).unwrap();
        machine.load_image(&ProgramImage::from_words(vec![0x30])).unwrap();
        machine.board_mut().reg_a.load(0x5A);

        machine.tick();
        machine.tick();
        assert_eq!(machine.board().reg_b.value(), 0);
        machine.tick();
        assert_eq!(machine.last_word(), ControlLine::RegAOut | ControlLine::RegBIn);
        assert_eq!(machine.board().reg_b.value(), 0x5A);
    }

    #[test]
    fn test_counter_increments_once_per_fetch() {
        let mut machine = standard(&[0x00, 0x00]);

        machine.tick();
        assert_eq!(machine.board().counter.value(), 0);
        assert_eq!(machine.board().ram.address(), 0);

        machine.tick();
        assert_eq!(machine.last_word(), ControlWord::FETCH);
        assert_eq!(machine.board().counter.value(), 1);

        // NOP skips: lookup of address 1 runs in place of execute
        machine.tick();
        assert_eq!(machine.board().counter.value(), 1);
        assert_eq!(machine.board().ram.address(), 1);
    }

    fn single_step(opcode: u64, word: ControlWord, program: &[u64]) -> Machine {
        let set = InstructionSet::new([Instruction::new(opcode, vec![word])]).unwrap();
        let mut machine = Machine::new(8, set, None, None).unwrap();
        machine
            .load_image(&ProgramImage::from_words(program.to_vec()))
            .unwrap();
        machine
    }

    #[test]
    fn test_counter_increments_between_write_and_read() {
        // CO|CE|AI: A reads the count driven before this tick's increment
        let word = ControlLine::CounterOut | ControlLine::CounterEnable | ControlLine::RegAIn;
        let mut machine = single_step(3, word, &[0x30]);

        machine.tick();
        machine.tick();
        assert_eq!(machine.board().counter.value(), 1);

        machine.tick();
        assert_eq!(machine.last_word(), word);
        assert_eq!(machine.board().reg_a.value(), 1);
        assert_eq!(machine.board().counter.value(), 2);
    }

    #[test]
    fn test_jump_overrides_same_tick_increment() {
        let word = ControlLine::InstructionOut | ControlLine::CounterIn | ControlLine::CounterEnable;
        let mut machine = single_step(4, word, &[0x45]);

        for _ in 0..3 {
            machine.tick();
        }
        assert_eq!(machine.last_word(), word);
        assert_eq!(machine.board().counter.value(), 5);
    }

    #[test]
    fn test_fetch_decode_execute_trace_through_ticks() {
        // opcode 1 has two steps, opcode 2 none; program [1, 2, 1]
        let set = InstructionSet::new([
            Instruction::new(1, vec![ControlLine::RegAIn.into(), ControlLine::RegBIn.into()]),
            Instruction::new(2, vec![]),
        ])
        .unwrap();
        let mut machine = Machine::new(8, set, None, None).unwrap();
        machine
            .load_image(&ProgramImage::from_words(vec![0x10, 0x20, 0x10]))
            .unwrap();

        let trace: Vec<ControlWord> = (0..10)
            .map(|_| {
                machine.tick();
                machine.last_word()
            })
            .collect();

        let (lookup, fetch) = (ControlWord::LOOKUP, ControlWord::FETCH);
        let (a, b): (ControlWord, ControlWord) =
            (ControlLine::RegAIn.into(), ControlLine::RegBIn.into());
        assert_eq!(
            trace,
            vec![lookup, fetch, a, b, lookup, fetch, lookup, fetch, a, b]
        );
        assert_eq!(machine.board().counter.value(), 3);
    }

    #[test]
    fn test_lookup_sees_current_counter() {
        let mut machine = standard(&[0x00, 0x00, 0x00]);
        for _ in 0..4 {
            machine.tick();
        }
        // lookup, fetch, skip-lookup, fetch
        assert_eq!(machine.board().counter.value(), 2);
        machine.tick();
        assert_eq!(machine.board().ram.address(), 2);
    }

    #[test]
    fn test_load_add_store() {
        // LDA 14; ADD 15; STA 13; HLT
        let mut image = vec![0x1E, 0x6F, 0x2D, 0xF0];
        image.resize(16, 0);
        image[14] = 28;
        image[15] = 14;
        let mut machine = standard(&image);

        let ticks = machine.run_until_halt(100);
        assert!(machine.is_halted());
        assert_eq!(machine.board().reg_a.value(), 42);
        assert_eq!(machine.board().ram.read(13), 42);
        assert_eq!(ticks, 4 + 5 + 4 + 3);
    }

    #[test]
    fn test_subtract_wraps() {
        let mut image = vec![0x1E, 0x7F, 0xF0];
        image.resize(16, 0);
        image[14] = 0;
        image[15] = 1;
        let mut machine = standard(&image);
        machine.run_until_halt(100);
        assert_eq!(machine.board().reg_a.value(), 255);
    }

    #[test]
    fn test_jump() {
        // JMP 3; HLT; HLT; LDA 15; HLT
        let mut image = vec![0x93, 0xF0, 0xF0, 0x1F, 0xF0];
        image.resize(16, 0);
        image[15] = 7;
        let mut machine = standard(&image);
        machine.run_until_halt(100);
        assert_eq!(machine.board().reg_a.value(), 7);
        assert_eq!(machine.board().counter.value(), 5);
    }

    #[test]
    fn test_halt_freezes_state() {
        let mut machine = standard(&[0x1F, 0xF0]);
        machine.run_until_halt(100);
        assert!(machine.is_halted());

        let before = machine.snapshot();
        for _ in 0..50 {
            machine.tick();
        }
        assert_eq!(machine.snapshot(), before);
    }

    #[test]
    fn test_debugger_receives_dump_per_word() {
        let dumps = Arc::new(Mutex::new(Vec::<String>::new()));
        let debugger = {
            let dumps = Arc::clone(&dumps);
            move |dump: &str| dumps.lock().unwrap().push(dump.to_string())
        };
        let mut machine =
            Machine::new(8, InstructionSet::standard(), None, Some(Box::new(debugger))).unwrap();

        machine.tick();
        machine.tick();

        let dumps = dumps.lock().unwrap();
        assert_eq!(dumps.len(), 2);
        assert!(dumps[0].starts_with("Instructions:   MI|CO"));
        assert!(dumps[1].contains("RegA:           0000_0000"));
        assert!(dumps[1].ends_with("ProgramCounter: 0x00"));
    }

    #[test]
    fn test_snapshot_json() {
        let mut machine = standard(&[0x1F]);
        machine.tick();
        let json = serde_json::to_value(machine.snapshot()).unwrap();
        assert_eq!(json["control"], serde_json::json!(["MI", "CO"]));
        assert_eq!(json["tick"], 1);
    }
}
