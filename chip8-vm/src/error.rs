//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::constants::*;

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug)]
pub enum Chip8Error {
    /// VM fault during interpreter loop. The VM is halted.
    Runtime(Fault),
    /// Attempt to load a bytecode program that can't fit in memory.
    LargeProgram { size: usize },
    Io(std::io::Error),
    Fmt(fmt::Error),
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime(fault) => write!(f, "runtime error: {}", fault),
            Self::LargeProgram { size } => write!(
                f,
                "program too large for VM memory: {size} bytes, maximum is {MAX_PROGRAM_SIZE}"
            ),
            Self::Io(err) => write!(f, "{}", err),
            Self::Fmt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Chip8Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Fmt(err) => Some(err),
            _ => None,
        }
    }
}

impl From<fmt::Error> for Chip8Error {
    fn from(err: fmt::Error) -> Self {
        Chip8Error::Fmt(err)
    }
}

impl From<std::io::Error> for Chip8Error {
    fn from(err: std::io::Error) -> Self {
        Chip8Error::Io(err)
    }
}

impl From<Fault> for Chip8Error {
    fn from(fault: Fault) -> Self {
        Chip8Error::Runtime(fault)
    }
}

/// Unrecoverable execution fault caused by the running program.
///
/// Each fault carries the address of the instruction that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `CALL` nested deeper than the call stack allows.
    StackOverflow { pc: Address },
    /// `RET` executed with an empty call stack.
    StackUnderflow { pc: Address },
    /// Program counter ran past the end of addressable memory.
    PcOutOfBounds { pc: Address },
    /// Memory access through the address register ran past the end of memory.
    AddressOutOfBounds { pc: Address, address: usize },
}

impl Display for Fault {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackOverflow { pc } => write!(f, "call stack overflow at {pc:04X}"),
            Self::StackUnderflow { pc } => write!(f, "call stack underflow at {pc:04X}"),
            Self::PcOutOfBounds { pc } => {
                write!(f, "program counter {pc:04X} is outside of memory")
            }
            Self::AddressOutOfBounds { pc, address } => {
                write!(f, "memory access at {address:04X} is out of bounds, at {pc:04X}")
            }
        }
    }
}

impl std::error::Error for Fault {}
