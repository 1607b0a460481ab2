use crate::typedef::*;
use rustyline::error::ReadlineError;
use rustyline::Editor;
use std::collections::VecDeque;

/// Where the monitor gets its command lines from
pub trait LineSource {
    /// Shows the prompt and reads one line. `None` signals the end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

impl LineSource for Editor<()> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.add_history_entry(line.as_str());
                }

                Ok(Some(line))
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// A fixed list of lines, fed to the monitor one after another
#[derive(Clone, Debug, Default)]
pub struct Script {
    lines: VecDeque<String>,
    reads: usize,
}

impl Script {
    /// Creates a script from the given lines
    pub fn new<I, S>(lines: I) -> Script
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Script {
            lines: lines.into_iter().map(Into::into).collect(),
            reads: 0,
        }
    }

    /// How often the monitor asked for a line, the final end-of-input included
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// The lines that were never read
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for Script {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        self.reads += 1;

        Ok(self.lines.pop_front())
    }
}
