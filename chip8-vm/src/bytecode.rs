//! Helpers for extracting operands from instruction words.
//!
//! Instructions are 16-bit words made up of four nibbles. The top nibble
//! identifies the opcode family, the rest are operands:
//!
//! ```text
//! ┌────┬────┬────┬────┐
//! │ op │ x  │ y  │ n  │
//! └────┴────┴────┴────┘
//!           └── nn ───┘
//!      └───── nnn ────┘
//! ```

/// Extract opcode family from the instruction.
#[inline(always)]
pub fn op_code(word: u16) -> u8 {
    ((word & 0xF000) >> 12) as u8
}

/// Extract operand NNN from the instruction.
#[inline(always)]
pub fn op_nnn(word: u16) -> u16 {
    word & 0x0FFF
}

/// Extract operand NN from the instruction.
#[inline(always)]
pub fn op_nn(word: u16) -> u8 {
    (word & 0x00FF) as u8
}

/// Extract operand VX from the instruction.
#[inline(always)]
pub fn op_x(word: u16) -> u8 {
    ((word & 0x0F00) >> 8) as u8
}

/// Extract operand VY from the instruction.
#[inline(always)]
pub fn op_y(word: u16) -> u8 {
    ((word & 0x00F0) >> 4) as u8
}

/// Extract operand N from the instruction.
#[inline(always)]
pub fn op_n(word: u16) -> u8 {
    (word & 0x000F) as u8
}

/// Extract operands VX and NN from the instruction.
#[inline(always)]
pub fn op_xnn(word: u16) -> (u8, u8) {
    (op_x(word), op_nn(word))
}

/// Extract operands VX and VY from the instruction.
#[inline(always)]
pub fn op_xy(word: u16) -> (u8, u8) {
    (op_x(word), op_y(word))
}

/// Extract operands VX, VY and N from the instruction.
#[inline(always)]
pub fn op_xyn(word: u16) -> (u8, u8, u8) {
    (op_x(word), op_y(word), op_n(word))
}
