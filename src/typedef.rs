//! A couple of useful type aliases

/// A virtual address inside the simulated address space
pub type Address = u32;

/// A machine word, the width of registers and expression values
pub type Word = u32;

/// A handy alias for `Result` that carries a generic error type.
pub type Result<T> = ::std::result::Result<T, ::failure::Error>;

#[derive(Fail, Debug)]
#[allow(missing_docs)]
pub enum SdbError {
    #[fail(display = "address 0x{:08x} is out of bound of the physical memory", addr)]
    InvalidMemoryAddress { addr: Address },
    #[fail(display = "invalid instruction 0x{:08x} at pc = 0x{:08x}", inst, pc)]
    InvalidInstruction { pc: Address, inst: Word },
    #[fail(
        display = "image too large. Image size: {} bytes. Available memory: {} bytes",
        size,
        capacity
    )]
    ImageTooLarge { size: usize, capacity: usize },
    #[fail(
        display = "memory of {} bytes at base 0x{:08x} does not fit into the address space",
        size,
        base
    )]
    InvalidMemoryLayout { base: Address, size: usize },
}
