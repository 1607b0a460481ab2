//! A tiny RV32I machine to drive the monitor with
//!
//! Only the handful of instructions the built-in image needs are implemented: `lui`, `auipc`,
//! `addi`, `lbu`, `sb` and `ebreak`, which halts the machine with `a0` as exit code.

use crate::consts::{DEFAULT_MEM_BASE, DEFAULT_MEM_SIZE};
use crate::machine::{Machine, MachineState};
use crate::typedef::*;
use byteorder::{ByteOrder, LittleEndian};
use std::{fs::File, io::Read, io::Write, path::Path};

/// ABI names of the general purpose registers, indexed by register number
pub const REGISTER_NAMES: [&str; 32] = [
    "$0", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5",
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4", "t5",
    "t6",
];

const EBREAK: Word = 0x0010_0073;

/// The program loaded when no image is given
pub const BUILTIN_IMAGE: [Word; 5] = [
    0x0000_0297, // auipc t0,0
    0x0002_8823, // sb  zero,16(t0)
    0x0102_c503, // lbu a0,16(t0)
    EBREAK,      // ebreak
    0xdead_beef, // some data
];

/// The state of the machine
#[derive(Debug, Clone)]
pub struct ToyMachine {
    gpr: [Word; 32],
    pc: Address,
    base: Address,
    mem: Vec<u8>,
    state: MachineState,
}

impl Default for ToyMachine {
    fn default() -> ToyMachine {
        ToyMachine {
            gpr: [0; 32],
            pc: DEFAULT_MEM_BASE,
            base: DEFAULT_MEM_BASE,
            mem: vec![0; DEFAULT_MEM_SIZE],
            state: MachineState::Stop,
        }
        .with_builtin_image()
    }
}

impl ToyMachine {
    /// Creates a machine with `size` bytes of memory mapped at `base`, holding the built-in image
    pub fn new(base: Address, size: usize) -> Result<ToyMachine> {
        let end = u64::from(base) + size as u64;

        ensure!(
            size >= BUILTIN_IMAGE.len() * 4 && end <= (1 << 32),
            SdbError::InvalidMemoryLayout { base, size }
        );

        let machine = ToyMachine {
            gpr: [0; 32],
            pc: base,
            base,
            mem: vec![0; size],
            state: MachineState::Stop,
        };

        Ok(machine.with_builtin_image())
    }

    fn with_builtin_image(mut self) -> ToyMachine {
        for (i, word) in BUILTIN_IMAGE.iter().enumerate() {
            LittleEndian::write_u32(&mut self.mem[i * 4..], *word);
        }

        self
    }

    /// Loads a raw binary image to the start of memory and returns its size in bytes
    pub fn load_image<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let mut file = File::open(path)?;

        let mut image = Vec::new();
        file.read_to_end(&mut image)?;

        ensure!(
            image.len() <= self.mem.len(),
            SdbError::ImageTooLarge {
                size: image.len(),
                capacity: self.mem.len()
            }
        );

        self.mem[..image.len()].copy_from_slice(&image);

        Ok(image.len())
    }

    /// The start of guest memory
    pub fn base(&self) -> Address {
        self.base
    }

    /// The amount of guest memory in bytes
    pub fn mem_size(&self) -> usize {
        self.mem.len()
    }

    /// Returns the value of a general purpose register
    pub fn gpr(&self, index: usize) -> Word {
        self.gpr[index]
    }

    fn set_gpr(&mut self, index: Word, value: Word) {
        if index != 0 {
            self.gpr[index as usize] = value;
        }
    }

    /// Translates a guest address into an index into `mem`, checking `len` bytes
    fn offset(&self, addr: Address, len: usize) -> Result<usize> {
        let offset = addr.wrapping_sub(self.base) as usize;

        ensure!(
            addr >= self.base && offset + len <= self.mem.len(),
            SdbError::InvalidMemoryAddress { addr }
        );

        Ok(offset)
    }

    fn write_byte(&mut self, addr: Address, value: u8) -> Result<()> {
        let offset = self.offset(addr, 1)?;
        self.mem[offset] = value;

        Ok(())
    }

    fn fetch(&self) -> Result<Word> {
        let offset = self.offset(self.pc, 4)?;

        Ok(LittleEndian::read_u32(&self.mem[offset..]))
    }

    fn register(&self, name: &str) -> Option<Word> {
        if name == "pc" || name == "$pc" {
            return Some(self.pc);
        }

        // Accept `$a0` as well as `a0`, but `$0` only with the dollar
        let index = REGISTER_NAMES
            .iter()
            .position(|reg| *reg == name)
            .or_else(|| {
                REGISTER_NAMES
                    .iter()
                    .position(|reg| name.starts_with('$') && *reg == &name[1..])
            })?;

        Some(self.gpr[index])
    }
}

fn rd(inst: Word) -> Word {
    (inst >> 7) & 0x1f
}

fn rs1(inst: Word) -> usize {
    ((inst >> 15) & 0x1f) as usize
}

fn rs2(inst: Word) -> usize {
    ((inst >> 20) & 0x1f) as usize
}

fn funct3(inst: Word) -> Word {
    (inst >> 12) & 0x7
}

fn imm_i(inst: Word) -> Word {
    ((inst as i32) >> 20) as Word
}

fn imm_s(inst: Word) -> Word {
    ((((inst as i32) >> 25) << 5) as Word) | ((inst >> 7) & 0x1f)
}

fn imm_u(inst: Word) -> Word {
    inst & 0xffff_f000
}

impl Machine for ToyMachine {
    fn exec_once(&mut self) -> Result<()> {
        let pc = self.pc;
        let inst = self.fetch()?;

        self.pc = pc.wrapping_add(4);

        match (inst & 0x7f, funct3(inst)) {
            (0x37, _) => self.set_gpr(rd(inst), imm_u(inst)),
            (0x17, _) => self.set_gpr(rd(inst), pc.wrapping_add(imm_u(inst))),
            (0x13, 0) => {
                let value = self.gpr[rs1(inst)].wrapping_add(imm_i(inst));
                self.set_gpr(rd(inst), value);
            }
            (0x03, 4) => {
                let addr = self.gpr[rs1(inst)].wrapping_add(imm_i(inst));
                let value = self.read_byte(addr)?;
                self.set_gpr(rd(inst), Word::from(value));
            }
            (0x23, 0) => {
                let addr = self.gpr[rs1(inst)].wrapping_add(imm_s(inst));
                let value = self.gpr[rs2(inst)] as u8;
                self.write_byte(addr, value)?;
            }
            (0x73, 0) if inst == EBREAK => {
                self.state = MachineState::End {
                    pc,
                    halt_ret: self.gpr[10],
                };
            }
            _ => {
                self.pc = pc;
                bail!(SdbError::InvalidInstruction { pc, inst });
            }
        }

        Ok(())
    }

    fn pc(&self) -> Address {
        self.pc
    }

    fn state(&self) -> MachineState {
        self.state
    }

    fn set_state(&mut self, state: MachineState) {
        self.state = state;
    }

    fn display_registers(&self, out: &mut dyn Write) -> Result<()> {
        for (name, value) in REGISTER_NAMES.iter().zip(self.gpr.iter()) {
            writeln!(out, "{:<4} 0x{:08x} {:>11}", name, value, value)?;
        }

        writeln!(out, "{:<4} 0x{:08x} {:>11}", "pc", self.pc, self.pc)?;

        Ok(())
    }

    fn eval(&self, expr: &str) -> Option<Word> {
        let expr = expr.trim();

        if let Some(value) = self.register(expr) {
            return Some(value);
        }

        if expr.starts_with("0x") || expr.starts_with("0X") {
            Word::from_str_radix(&expr[2..], 16).ok()
        } else {
            expr.parse().ok()
        }
    }

    fn read_byte(&self, addr: Address) -> Result<u8> {
        let offset = self.offset(addr, 1)?;

        Ok(self.mem[offset])
    }
}

#[cfg(test)]
mod tests {
    extern crate tempfile;

    use super::*;
    use crate::machine::Steps;
    use crate::watchpoint::WatchpointPool;

    fn small() -> ToyMachine {
        ToyMachine::new(0x1000, 0x100).unwrap()
    }

    fn run(machine: &mut ToyMachine, steps: Steps) -> String {
        colored::control::set_override(false);

        let mut out = Vec::new();
        machine
            .run(steps, &mut WatchpointPool::new(), &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn builtin_image_hits_good_trap() {
        let mut machine = small();

        let output = run(&mut machine, Steps::Unbounded);

        assert_eq!(
            machine.state(),
            MachineState::End {
                pc: 0x100c,
                halt_ret: 0
            }
        );
        assert_eq!(machine.gpr(5), 0x1000);
        assert_eq!(machine.read_byte(0x1010).unwrap(), 0);
        assert_eq!(output, "HIT GOOD TRAP at pc = 0x0000100c\n");
    }

    #[test]
    fn single_steps() {
        let mut machine = small();

        run(&mut machine, Steps::Count(1));
        assert_eq!(machine.pc(), 0x1004);
        assert_eq!(machine.eval("t0"), Some(0x1000));
        assert_eq!(machine.state(), MachineState::Stop);

        run(&mut machine, Steps::Count(2));
        assert_eq!(machine.pc(), 0x100c);
    }

    #[test]
    fn invalid_memory_layout() {
        ToyMachine::new(0xffff_ff00, 0x200).unwrap_err();
        ToyMachine::new(0x1000, 4).unwrap_err();
    }

    #[test]
    fn memory_bounds() {
        let machine = small();

        assert_eq!(machine.read_byte(0x1000).unwrap(), 0x97);
        assert_eq!(machine.read_byte(0x10ff).unwrap(), 0);
        machine.read_byte(0x0fff).unwrap_err();
        machine.read_byte(0x1100).unwrap_err();
    }

    #[test]
    fn eval_registers_and_literals() {
        let mut machine = small();
        machine.set_gpr(10, 42);

        assert_eq!(machine.eval("a0"), Some(42));
        assert_eq!(machine.eval("$a0"), Some(42));
        assert_eq!(machine.eval("$0"), Some(0));
        assert_eq!(machine.eval("$pc"), Some(0x1000));
        assert_eq!(machine.eval("pc"), Some(0x1000));
        assert_eq!(machine.eval("0x10"), Some(16));
        assert_eq!(machine.eval("17"), Some(17));
        assert_eq!(machine.eval("$bogus"), None);
    }

    #[test]
    fn zero_register_stays_zero() {
        let mut machine = small();
        machine.set_gpr(0, 5);

        assert_eq!(machine.gpr(0), 0);
    }

    #[test]
    fn lui_and_addi() {
        let mut machine = small();
        let program: [Word; 2] = [
            0x1234_5537, // lui a0,0x12345
            0xfff5_0513, // addi a0,a0,-1
        ];
        for (i, word) in program.iter().enumerate() {
            LittleEndian::write_u32(&mut machine.mem[i * 4..], *word);
        }

        run(&mut machine, Steps::Count(2));

        assert_eq!(machine.gpr(10), 0x1234_4fff);
    }

    #[test]
    fn unknown_instruction_aborts() {
        let mut machine = small();
        LittleEndian::write_u32(&mut machine.mem[..], 0xffff_ffff);

        let output = run(&mut machine, Steps::Unbounded);

        assert_eq!(machine.state(), MachineState::Abort { pc: 0x1000 });
        assert!(output.contains("invalid instruction 0xffffffff at pc = 0x00001000"));
        assert!(output.contains("ABORT at pc = 0x00001000"));
    }

    #[test]
    fn registers_are_listed() {
        let machine = small();
        let mut out = Vec::new();
        machine.display_registers(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(out.lines().count(), 33);
        assert!(out.starts_with("$0   0x00000000           0\n"));
        assert!(out.ends_with("pc   0x00001000        4096\n"));
    }

    #[test]
    fn load_image_from_file() {
        let dir = tempfile::tempdir().expect("unable to create temporary directory");
        let path = dir.path().join("image.bin");
        std::fs::write(&path, b"\x37\x05\x00\x00").unwrap();

        let mut machine = small();
        assert_eq!(machine.load_image(&path).unwrap(), 4);
        assert_eq!(machine.read_byte(0x1000).unwrap(), 0x37);
        assert_eq!(machine.read_byte(0x1004).unwrap(), 0x23);

        std::fs::write(&path, vec![0; 0x101]).unwrap();
        machine.load_image(&path).unwrap_err();
    }
}
