use crate::cpu;
use crate::typedef::*;
use crate::watchpoint::WatchpointPool;
use std::io::Write;

/// How far a call to [`Machine::run`] may execute
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Steps {
    /// Execute at most the given number of instructions
    Count(u64),
    /// Execute until something stops the machine
    Unbounded,
}

/// The execution state of a machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MachineState {
    /// Currently executing instructions
    Running,
    /// Paused, ready to continue
    Stop,
    /// The guest program finished through its trap instruction
    End {
        /// The address of the trap instruction
        pc: Address,
        /// The exit code handed to the trap
        halt_ret: Word,
    },
    /// Execution hit an error it can't recover from
    Abort {
        /// The address execution failed at
        pc: Address,
    },
    /// The user asked to leave
    Quit,
}

impl MachineState {
    /// Whether the machine can't execute any further
    pub fn is_finished(self) -> bool {
        match self {
            MachineState::End { .. } | MachineState::Abort { .. } | MachineState::Quit => true,
            MachineState::Running | MachineState::Stop => false,
        }
    }

    /// Whether a session ending in this state counts as successful
    pub fn is_good_exit(self) -> bool {
        match self {
            MachineState::End { halt_ret, .. } => halt_ret == 0,
            MachineState::Quit => true,
            _ => false,
        }
    }
}

impl Default for MachineState {
    fn default() -> MachineState {
        MachineState::Stop
    }
}

#[allow(unused_variables)]
/// The interface between the monitor and the simulated machine
///
/// The monitor only ever talks to the machine through this trait: it executes instructions,
/// inspects registers, evaluates expressions and reads memory. Everything about the instruction
/// set stays on the implementor's side.
///
/// # Example
///
/// ```
/// use sdb::typedef::*;
/// use sdb::{Machine, MachineState, SdbError};
/// use std::io::Write;
///
/// #[derive(Default)]
/// struct Counter {
///     acc: Word,
///     state: MachineState,
/// }
///
/// impl Machine for Counter {
///     fn exec_once(&mut self) -> Result<()> {
///         self.acc += 1;
///         Ok(())
///     }
///
///     fn pc(&self) -> Address {
///         self.acc
///     }
///
///     fn state(&self) -> MachineState {
///         self.state
///     }
///
///     fn set_state(&mut self, state: MachineState) {
///         self.state = state;
///     }
///
///     fn display_registers(&self, out: &mut dyn Write) -> Result<()> {
///         writeln!(out, "acc 0x{:08x}", self.acc)?;
///         Ok(())
///     }
///
///     fn eval(&self, expr: &str) -> Option<Word> {
///         match expr {
///             "$acc" => Some(self.acc),
///             _ => None,
///         }
///     }
///
///     fn read_byte(&self, addr: Address) -> Result<u8> {
///         Err(SdbError::InvalidMemoryAddress { addr }.into())
///     }
/// }
/// ```
pub trait Machine {
    /// Executes a single instruction
    fn exec_once(&mut self) -> Result<()>;

    /// The address of the next instruction
    fn pc(&self) -> Address;

    /// The current execution state
    fn state(&self) -> MachineState;

    /// Changes the execution state
    fn set_state(&mut self, state: MachineState);

    /// Prints the register file
    fn display_registers(&self, out: &mut dyn Write) -> Result<()>;

    /// Evaluates an expression against the current machine state, `None` if it can't be resolved
    fn eval(&self, expr: &str) -> Option<Word>;

    /// Reads a single byte of the virtual address space
    fn read_byte(&self, addr: Address) -> Result<u8>;

    /// Executes up to `steps` instructions, pausing as soon as a watchpoint changes
    fn run(
        &mut self,
        steps: Steps,
        watchpoints: &mut WatchpointPool,
        out: &mut dyn Write,
    ) -> Result<()> {
        cpu::execute(self, steps, watchpoints, out)
    }

    /// Throws away pending events of attached devices before the monitor waits for input
    fn drain_events(&mut self) {}
}
