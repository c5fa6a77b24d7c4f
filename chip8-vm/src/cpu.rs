//! CPU register file.
use crate::constants::*;

/// Register state for a chip8 interpreter.
#[derive(Debug, Clone)]
pub struct Chip8Cpu {
    /// Program counter pointing to the next instruction to fetch.
    pub(crate) pc: Address,
    /// Instruction register holding the most recently fetched opcode.
    pub(crate) ir: u16,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag, borrow switch or
    /// collision flag depending on opcode.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// Pointer register used for temporarily storing an address.
    ///
    /// The full 16 bits are kept, even though memory is only 12 bits wide.
    pub(crate) address: Address,
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        Self {
            pc: MEM_START as Address,
            ir: 0,
            registers: [0; REGISTER_COUNT],
            address: 0,
        }
    }
}

impl Chip8Cpu {
    pub fn new() -> Self {
        Default::default()
    }

    /// Value of register `Vx`. Only the low nibble of `x` is used.
    #[inline(always)]
    pub fn v(&self, x: u8) -> u8 {
        self.registers[x as usize & 0xF]
    }

    #[inline(always)]
    pub fn set_v(&mut self, x: u8, value: u8) {
        self.registers[x as usize & 0xF] = value;
    }

    #[inline(always)]
    pub fn set_flag(&mut self, flag: bool) {
        self.registers[FLAG_REGISTER] = flag as u8;
    }

    /// Skip the next instruction.
    #[inline(always)]
    pub(crate) fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }
}
