#![deny(missing_docs)]

//! A simple interactive monitor for instruction-set simulators
//!
//! # Introduction
//! `sdb` is the command prompt sitting in front of a simulated CPU. It lets you continue or
//! single-step execution, look at registers and memory, evaluate expressions and set watchpoints
//! that pause execution as soon as the value of an expression changes.
//!
//! The simulator itself plugs in through the [Machine][machine] trait. The [Monitor][monitor]
//! drives a session against any implementation of it, reading commands from a
//! [LineSource][source] and writing everything it has to say to an output stream.
//! [ToyMachine][toy] is a minimal RV32I machine to try the monitor out with.
//!
//! [machine]: trait.Machine.html
//! [monitor]: struct.Monitor.html
//! [source]: trait.LineSource.html
//! [toy]: struct.ToyMachine.html

#[macro_use]
extern crate failure;
#[macro_use]
extern crate lazy_static;

pub mod command;
mod consts;
pub mod cpu;
mod input;
mod machine;
mod monitor;
mod toy;
pub mod typedef;
mod watchpoint;

pub use crate::consts::*;
pub use crate::input::*;
pub use crate::machine::*;
pub use crate::monitor::*;
pub use crate::toy::*;
pub use crate::typedef::SdbError;
pub use crate::watchpoint::*;
