//! The default execution driver behind [`Machine::run`](../trait.Machine.html#method.run)

use crate::machine::{Machine, MachineState, Steps};
use crate::typedef::*;
use crate::watchpoint::WatchpointPool;
use colored::*;
use std::io::Write;

/// Steps the machine, checking every watchpoint after each instruction
pub fn execute<M: Machine + ?Sized>(
    machine: &mut M,
    steps: Steps,
    watchpoints: &mut WatchpointPool,
    out: &mut dyn Write,
) -> Result<()> {
    if machine.state().is_finished() {
        writeln!(
            out,
            "Program execution has ended. To restart the program, exit sdb and run again."
        )?;
        return Ok(());
    }

    machine.set_state(MachineState::Running);

    let mut executed: u64 = 0;

    loop {
        if let Steps::Count(limit) = steps {
            if executed >= limit {
                break;
            }
        }

        let pc = machine.pc();

        if let Err(err) = machine.exec_once() {
            writeln!(out, "{}", err.to_string().red())?;
            machine.set_state(MachineState::Abort { pc });
            break;
        }

        executed += 1;

        for trigger in watchpoints.check(|expr| machine.eval(expr)) {
            let header = format!("Watchpoint {}: {}", trigger.id, trigger.expr);
            writeln!(out, "{}", header.yellow())?;
            writeln!(out, "Old value = {}", trigger.old)?;
            writeln!(out, "New value = {}", trigger.new)?;

            if machine.state() == MachineState::Running {
                machine.set_state(MachineState::Stop);
            }
        }

        if machine.state() != MachineState::Running {
            break;
        }
    }

    match machine.state() {
        MachineState::Running => machine.set_state(MachineState::Stop),
        MachineState::End { pc, halt_ret } => {
            if halt_ret == 0 {
                let line = format!("HIT GOOD TRAP at pc = 0x{:08x}", pc);
                writeln!(out, "{}", line.green())?;
            } else {
                let line = format!("HIT BAD TRAP at pc = 0x{:08x}", pc);
                writeln!(out, "{}", line.red())?;
            }
        }
        MachineState::Abort { pc } => {
            let line = format!("ABORT at pc = 0x{:08x}", pc);
            writeln!(out, "{}", line.red())?;
        }
        MachineState::Stop | MachineState::Quit => {}
    }

    Ok(())
}
