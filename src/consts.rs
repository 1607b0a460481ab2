use crate::typedef::Address;
use semver::Version;

lazy_static! {
    /// The current version of the sdb crate
    pub static ref VERSION: Version = env!("CARGO_PKG_VERSION")
        .parse()
        .expect("unable to parse crate version");
}

/// The prompt shown in front of every interactive input line
pub const PROMPT: &str = "(sdb) ";

/// The maximum length of a watchpoint expression in bytes
pub const MAX_EXPR_LEN: usize = 64;

/// The default start of guest memory
pub const DEFAULT_MEM_BASE: Address = 0x8000_0000;

/// The default amount of guest memory in bytes
pub const DEFAULT_MEM_SIZE: usize = 0x800_0000;
