use crate::command::{self, Args, Verb, COMMANDS};
use crate::consts::{MAX_EXPR_LEN, PROMPT};
use crate::input::LineSource;
use crate::machine::{Machine, MachineState, Steps};
use crate::typedef::*;
use crate::watchpoint::WatchpointPool;
use std::io::Write;

/// Whether the monitor talks to a user or just runs the program
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Read commands from the line source until `q` or the end of input
    Interactive,
    /// Run the program to completion without reading any input
    Batch,
}

impl Default for Mode {
    fn default() -> Mode {
        Mode::Interactive
    }
}

/// What the monitor loop should do after a command was handled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Prompt for the next command
    Continue,
    /// Leave the loop
    Stop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoopState {
    Batch,
    Interactive,
    Terminated,
}

/// A simple interactive debugger session for a machine
pub struct Monitor<M, I, W> {
    machine: M,
    input: I,
    out: W,
    watchpoints: WatchpointPool,
    mode: Mode,
}

impl<M: Machine, I: LineSource, W: Write> Monitor<M, I, W> {
    /// Creates an interactive session reading from `input` and writing to `out`
    pub fn new(machine: M, input: I, out: W) -> Monitor<M, I, W> {
        Monitor {
            machine,
            input,
            out,
            watchpoints: WatchpointPool::new(),
            mode: Mode::default(),
        }
    }

    /// Selects the mode the session runs in
    pub fn with_mode(mut self, mode: Mode) -> Monitor<M, I, W> {
        self.mode = mode;
        self
    }

    /// The mode the session runs in
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The machine under control
    pub fn machine(&self) -> &M {
        &self.machine
    }

    /// The line source commands are read from
    pub fn input(&self) -> &I {
        &self.input
    }

    /// The output stream of the session
    pub fn output(&self) -> &W {
        &self.out
    }

    /// The live watchpoints
    pub fn watchpoints(&self) -> &WatchpointPool {
        &self.watchpoints
    }

    /// Ends the session and hands back the machine, line source and output stream
    pub fn into_parts(self) -> (M, I, W) {
        (self.machine, self.input, self.out)
    }

    /// Runs the session until the user quits, the input ends or, in batch mode, the program
    /// stops
    pub fn run(&mut self) -> Result<()> {
        let mut state = match self.mode {
            Mode::Batch => LoopState::Batch,
            Mode::Interactive => LoopState::Interactive,
        };

        while state != LoopState::Terminated {
            state = match state {
                LoopState::Batch => {
                    self.cmd_c()?;
                    LoopState::Terminated
                }
                LoopState::Interactive => {
                    self.machine.drain_events();

                    match self.input.read_line(PROMPT)? {
                        None => LoopState::Terminated,
                        Some(line) => match self.execute_line(&line)? {
                            Flow::Continue => LoopState::Interactive,
                            Flow::Stop => LoopState::Terminated,
                        },
                    }
                }
                LoopState::Terminated => LoopState::Terminated,
            };
        }

        self.out.flush()?;

        Ok(())
    }

    /// Dispatches a single input line
    pub fn execute_line(&mut self, line: &str) -> Result<Flow> {
        let (verb, rest) = match command::split_line(line) {
            Some(split) => split,
            None => return Ok(Flow::Continue),
        };

        let cmd = match command::lookup(verb) {
            Some(cmd) => cmd,
            None => {
                writeln!(self.out, "Unknown command '{}'", verb)?;
                return Ok(Flow::Continue);
            }
        };

        let args = Args::new(rest);

        match cmd.verb {
            Verb::Help => self.cmd_help(args),
            Verb::Continue => self.cmd_c(),
            Verb::Quit => self.cmd_q(),
            Verb::Step => self.cmd_si(args),
            Verb::Info => self.cmd_info(args),
            Verb::Examine => self.cmd_x(args),
            Verb::Print => self.cmd_p(args),
            Verb::Watch => self.cmd_w(args),
            Verb::Delete => self.cmd_d(args),
        }
    }

    fn cmd_help(&mut self, mut args: Args) -> Result<Flow> {
        match args.next() {
            None => {
                for cmd in COMMANDS {
                    writeln!(self.out, "{} - {}", cmd.name, cmd.description)?;
                }
            }
            Some(name) => match command::lookup(name) {
                Some(cmd) => writeln!(self.out, "{} - {}", cmd.name, cmd.description)?,
                None => writeln!(self.out, "Unknown command '{}'", name)?,
            },
        }

        Ok(Flow::Continue)
    }

    fn cmd_c(&mut self) -> Result<Flow> {
        self.machine
            .run(Steps::Unbounded, &mut self.watchpoints, &mut self.out)?;

        Ok(Flow::Continue)
    }

    fn cmd_q(&mut self) -> Result<Flow> {
        self.machine.set_state(MachineState::Quit);

        Ok(Flow::Stop)
    }

    fn cmd_si(&mut self, mut args: Args) -> Result<Flow> {
        let count = match args.next() {
            None => 1,
            Some(arg) => match arg.parse::<u64>() {
                Ok(count) => count,
                Err(_) => {
                    writeln!(self.out, "si [N]: step N instructions, N defaults to 1")?;
                    return Ok(Flow::Continue);
                }
            },
        };

        self.machine
            .run(Steps::Count(count), &mut self.watchpoints, &mut self.out)?;

        Ok(Flow::Continue)
    }

    fn cmd_info(&mut self, mut args: Args) -> Result<Flow> {
        match args.next() {
            Some("r") => {
                if let Err(err) = self.machine.display_registers(&mut self.out) {
                    writeln!(self.out, "{}", err)?;
                }
            }
            // Reserved for listing watchpoints
            Some("w") => writeln!(self.out, "info w - print the information of watchpoints")?,
            _ => {
                writeln!(self.out, "info r - print the information of registers")?;
                writeln!(self.out, "info w - print the information of watchpoints")?;
            }
        }

        Ok(Flow::Continue)
    }

    fn cmd_x(&mut self, mut args: Args) -> Result<Flow> {
        let count = args.next().and_then(|arg| arg.parse::<u32>().ok());
        let addr = args.next().and_then(command::parse_hex);

        let (count, mut addr) = match (count, addr) {
            (Some(count), Some(addr)) => (count, addr),
            _ => {
                writeln!(self.out, "x N ADDR: scan N groups of 4 bytes starting at hex ADDR")?;
                return Ok(Flow::Continue);
            }
        };

        for _ in 0..count {
            let mut line = format!("0x{:08x}:", addr);

            for _ in 0..4 {
                match self.machine.read_byte(addr) {
                    Ok(byte) => line.push_str(&format!(" 0x{:02x}", byte)),
                    Err(err) => {
                        writeln!(self.out, "{}", err)?;
                        return Ok(Flow::Continue);
                    }
                }

                addr = addr.wrapping_add(1);
            }

            writeln!(self.out, "{}", line)?;
        }

        Ok(Flow::Continue)
    }

    fn cmd_p(&mut self, args: Args) -> Result<Flow> {
        let expr = match args.rest() {
            Some(expr) => expr,
            None => {
                writeln!(self.out, "p EXPR: print the value of expression")?;
                return Ok(Flow::Continue);
            }
        };

        match self.machine.eval(expr) {
            Some(value) => writeln!(self.out, "{}", value)?,
            None => writeln!(self.out, "Invalid expression")?,
        }

        Ok(Flow::Continue)
    }

    fn cmd_w(&mut self, args: Args) -> Result<Flow> {
        let expr = match args.rest() {
            Some(expr) => expr,
            None => {
                writeln!(self.out, "w EXPR: set watchpoint")?;
                return Ok(Flow::Continue);
            }
        };

        if expr.len() > MAX_EXPR_LEN {
            writeln!(
                self.out,
                "Expression too long, at most {} bytes are allowed",
                MAX_EXPR_LEN
            )?;
            return Ok(Flow::Continue);
        }

        let value = self.machine.eval(expr);

        let wp = self.watchpoints.allocate();
        wp.expr = expr.to_string();
        let id = wp.id;

        match value {
            Some(value) => {
                wp.value = value;
                writeln!(self.out, "Watchpoint {}: {}", id, expr)?;
            }
            None => {
                self.watchpoints.release(id);
                writeln!(self.out, "Invalid expression")?;
            }
        }

        Ok(Flow::Continue)
    }

    fn cmd_d(&mut self, mut args: Args) -> Result<Flow> {
        let id = match args.next().map(str::parse::<u32>) {
            Some(Ok(id)) => id,
            _ => {
                writeln!(self.out, "d N: delete watchpoint")?;
                return Ok(Flow::Continue);
            }
        };

        if !self.watchpoints.release(id) {
            writeln!(self.out, "No watchpoint number {}.", id)?;
        }

        Ok(Flow::Continue)
    }
}
