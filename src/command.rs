//! The command table and the helpers used to pick input lines apart

use std::str::SplitWhitespace;

/// Selects the handler a command is bound to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    /// `help [CMD]`
    Help,
    /// `c`
    Continue,
    /// `q`
    Quit,
    /// `si [N]`
    Step,
    /// `info SUBCMD`
    Info,
    /// `x N ADDR`
    Examine,
    /// `p EXPR`
    Print,
    /// `w EXPR`
    Watch,
    /// `d N`
    Delete,
}

/// An entry of the command table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    /// The word typed at the prompt
    pub name: &'static str,
    /// A one-line summary shown by `help`
    pub description: &'static str,
    /// The handler the command dispatches to
    pub verb: Verb,
}

/// Every command the monitor understands, in the order `help` lists them
pub const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        description: "Display information about all supported commands",
        verb: Verb::Help,
    },
    Command {
        name: "c",
        description: "Continue the execution of the program",
        verb: Verb::Continue,
    },
    Command {
        name: "q",
        description: "Exit sdb",
        verb: Verb::Quit,
    },
    Command {
        name: "si",
        description: "Step N instructions, one if N is omitted",
        verb: Verb::Step,
    },
    Command {
        name: "info",
        description: "Print program state ('info r' for registers)",
        verb: Verb::Info,
    },
    Command {
        name: "x",
        description: "Scan N groups of 4 bytes of memory starting at hex address ADDR",
        verb: Verb::Examine,
    },
    Command {
        name: "p",
        description: "Print the value of an expression",
        verb: Verb::Print,
    },
    Command {
        name: "w",
        description: "Set a watchpoint on an expression",
        verb: Verb::Watch,
    },
    Command {
        name: "d",
        description: "Delete the watchpoint with number N",
        verb: Verb::Delete,
    },
];

/// Looks up a command by its exact name. The first match in table order wins.
pub fn lookup(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|cmd| cmd.name == name)
}

/// Splits an input line into the verb and the raw remainder.
///
/// Returns `None` for empty or all-whitespace lines. The remainder starts right after the
/// whitespace character terminating the verb and is passed on untouched, or is `None` if
/// nothing follows.
pub fn split_line(line: &str) -> Option<(&str, Option<&str>)> {
    let line = line.trim_start();

    if line.is_empty() {
        return None;
    }

    match line.char_indices().find(|(_, c)| c.is_whitespace()) {
        Some((pos, sep)) => {
            let rest = &line[pos + sep.len_utf8()..];
            let rest = if rest.is_empty() { None } else { Some(rest) };

            Some((&line[..pos], rest))
        }
        None => Some((line, None)),
    }
}

/// A cursor over the arguments of a command
#[derive(Clone, Debug)]
pub struct Args<'a> {
    raw: &'a str,
    tokens: SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    /// Creates a cursor over the remainder returned by [`split_line`]
    pub fn new(raw: Option<&'a str>) -> Args<'a> {
        let raw = raw.unwrap_or("");

        Args {
            raw,
            tokens: raw.split_whitespace(),
        }
    }

    /// Whether the command got no arguments at all
    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// The whole argument string with surrounding whitespace removed, `None` if there is none
    pub fn rest(&self) -> Option<&'a str> {
        let rest = self.raw.trim();

        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

impl<'a> Iterator for Args<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.tokens.next()
    }
}

/// Parses a hexadecimal number with an optional `0x` prefix
pub fn parse_hex(text: &str) -> Option<u32> {
    let digits = if text.starts_with("0x") || text.starts_with("0X") {
        &text[2..]
    } else {
        text
    };

    u32::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_verb_and_rest() {
        assert_eq!(split_line("x 10 0x80000000"), Some(("x", Some("10 0x80000000"))));
        assert_eq!(split_line("  si"), Some(("si", None)));
        assert_eq!(split_line("si "), Some(("si", None)));
        assert_eq!(split_line("p  $a0 + 1"), Some(("p", Some(" $a0 + 1"))));
        assert_eq!(split_line("info\tr"), Some(("info", Some("r"))));
    }

    #[test]
    fn blank_lines_have_no_verb() {
        assert_eq!(split_line(""), None);
        assert_eq!(split_line("   \t "), None);
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        assert_eq!(lookup("si").map(|cmd| cmd.verb), Some(Verb::Step));
        assert_eq!(lookup("help").map(|cmd| cmd.verb), Some(Verb::Help));
        assert!(lookup("S").is_none());
        assert!(lookup("Help").is_none());
        assert!(lookup("s").is_none());
    }

    #[test]
    fn command_names_are_unique() {
        for (i, cmd) in COMMANDS.iter().enumerate() {
            assert!(COMMANDS[i + 1..].iter().all(|other| other.name != cmd.name));
        }
    }

    #[test]
    fn args_cursor() {
        let mut args = Args::new(Some(" 4   0x1000 "));
        assert!(!args.is_empty());
        assert_eq!(args.rest(), Some("4   0x1000"));
        assert_eq!(args.next(), Some("4"));
        assert_eq!(args.next(), Some("0x1000"));
        assert_eq!(args.next(), None);

        let args = Args::new(None);
        assert!(args.is_empty());
        assert_eq!(args.rest(), None);

        assert!(Args::new(Some("   ")).is_empty());
    }

    #[test]
    fn hex_numbers() {
        assert_eq!(parse_hex("0x80000000"), Some(0x8000_0000));
        assert_eq!(parse_hex("1000"), Some(0x1000));
        assert_eq!(parse_hex("0XfF"), Some(0xff));
        assert_eq!(parse_hex("0x"), None);
        assert_eq!(parse_hex("zz"), None);
        assert_eq!(parse_hex("100000000"), None);
    }
}
