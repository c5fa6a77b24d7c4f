//! Decoded instructions.
//!
//! Decoding is kept separate from execution so the instruction set can be
//! inspected, tested and disassembled without a running machine.
use std::fmt::{self, Formatter};

use crate::{bytecode::*, constants::Address};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Instr {
    /// 0nnn (SYS addr)
    ///
    /// Call machine code routine on the original hardware.
    /// Ignored by modern interpreters.
    Sys { address: Address },
    /// 00E0 (CLS)
    ///
    /// Clear the screen.
    ClearScreen,
    /// 00EE (RET)
    ///
    /// Return from the sub-routine.
    Return,
    /// 1nnn (JP addr)
    ///
    /// Jump to the address in `nnn`.
    Jump { address: Address },
    /// 2nnn (CALL addr)
    ///
    /// Call the sub-routine at address `nnn`.
    Call { address: Address },
    /// 3xnn (SE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` equals value `nn`
    Skip_Eq_Byte { vx: u8, nn: u8 },
    /// 4xnn (SNE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` does not equal value `nn`.
    Skip_NotEq_Byte { vx: u8, nn: u8 },
    /// 5xy0 (SE Vx, Vy)
    ///
    /// Skip the next instruction if register `Vx` equals register `Vy`.
    Skip_Eq { vx: u8, vy: u8 },
    /// 6xnn (LD Vx, byte)
    Load_Byte { vx: u8, nn: u8 },
    /// 7xnn (ADD Vx, byte)
    ///
    /// Add byte to the value in register `Vx`, store the result in `Vx`.
    /// Carry flag is not set.
    Add_Byte { vx: u8, nn: u8 },

    // ------------------------------------------------------------------------
    // Math
    /// 8xy0 (LD Vx, Vy)
    Load_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy1 (OR Vx, Vy)
    Or_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy2 (AND Vx, Vy)
    And_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy3 (XOR Vx, Vy)
    Xor_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy4 (ADD Vx, Vy)
    ///
    /// Overflow is wrapped. If overflowed, set VF to 1, else 0.
    Add_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy5 (SUB Vx, Vy)
    ///
    /// VF is set to 0 when there is a borrow, set to 1 when there isn't.
    Sub_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy6 (SHR Vx {, Vy})
    ///
    /// VF is set to the least-significant bit before shifting.
    ShiftRight { vx: u8, vy: u8 },
    /// 8xy7 (SUBN Vx, Vy)
    ///
    /// Subtracts VX from VY, and stores the result in VX.
    /// VF is set to 0 when there is a borrow, set to 1 when there isn't.
    SubReverse_Vx_Vy { vx: u8, vy: u8 },
    /// 8xyE (SHL Vx {, Vy})
    ///
    /// VF is set to the most-significant bit before shifting.
    ShiftLeft { vx: u8, vy: u8 },
    /// 9xy0 (SNE Vx, Vy)
    Skip_NotEq { vx: u8, vy: u8 },

    /// Annn (LD I, addr)
    ///
    /// Load address into register `I`.
    Load_Address { address: Address },
    /// Bnnn (JP V0, addr)
    ///
    /// Jump to location nnn + V0.
    Jump_V0 { address: Address },
    /// Cxnn (RND Vx, byte)
    Random { vx: u8, nn: u8 },
    /// Dxyn (DRW Vx, Vy, nibble)
    Draw { vx: u8, vy: u8, n: u8 },

    // ------------------------------------------------------------------------
    // Keyboard
    /// Ex9E (SKP Vx)
    Skip_Key { vx: u8 },
    /// ExA1 (SKNP Vx)
    Skip_NotKey { vx: u8 },

    // ------------------------------------------------------------------------
    // Timers and memory
    /// Fx07 (LD Vx, DT)
    Load_Delay { vx: u8 },
    /// Fx0A (LD Vx, K)
    Wait_Key { vx: u8 },
    /// Fx15 (LD DT, Vx)
    Set_Delay { vx: u8 },
    /// Fx18 (LD ST, Vx)
    Set_Sound { vx: u8 },
    /// Fx1E (ADD I, Vx)
    Add_Address { vx: u8 },
    /// Fx29 (LD F, Vx)
    Load_Glyph { vx: u8 },
    /// Fx33 (LD B, Vx)
    Store_Bcd { vx: u8 },
    /// Fx55 (LD [I], Vx)
    Store_Registers { vx: u8 },
    /// Fx65 (LD Vx, [I])
    Load_Registers { vx: u8 },

    /// Any word that isn't part of the instruction set.
    Unknown(u16),
}

impl Instr {
    /// Decode an instruction word.
    ///
    /// Every word decodes to something. Words outside of the instruction
    /// set become [`Instr::Unknown`].
    pub fn decode(word: u16) -> Self {
        let (vx, vy, n) = op_xyn(word);
        let nn = op_nn(word);
        let address = op_nnn(word);

        match op_code(word) {
            0x0 => match word {
                0x00E0 => Self::ClearScreen,
                0x00EE => Self::Return,
                _ => Self::Sys { address },
            },
            0x1 => Self::Jump { address },
            0x2 => Self::Call { address },
            0x3 => Self::Skip_Eq_Byte { vx, nn },
            0x4 => Self::Skip_NotEq_Byte { vx, nn },
            0x5 if n == 0 => Self::Skip_Eq { vx, vy },
            0x6 => Self::Load_Byte { vx, nn },
            0x7 => Self::Add_Byte { vx, nn },
            0x8 => match n {
                0x0 => Self::Load_Vx_Vy { vx, vy },
                0x1 => Self::Or_Vx_Vy { vx, vy },
                0x2 => Self::And_Vx_Vy { vx, vy },
                0x3 => Self::Xor_Vx_Vy { vx, vy },
                0x4 => Self::Add_Vx_Vy { vx, vy },
                0x5 => Self::Sub_Vx_Vy { vx, vy },
                0x6 => Self::ShiftRight { vx, vy },
                0x7 => Self::SubReverse_Vx_Vy { vx, vy },
                0xE => Self::ShiftLeft { vx, vy },
                _ => Self::Unknown(word),
            },
            0x9 if n == 0 => Self::Skip_NotEq { vx, vy },
            0xA => Self::Load_Address { address },
            0xB => Self::Jump_V0 { address },
            0xC => Self::Random { vx, nn },
            0xD => Self::Draw { vx, vy, n },
            0xE => match nn {
                0x9E => Self::Skip_Key { vx },
                0xA1 => Self::Skip_NotKey { vx },
                _ => Self::Unknown(word),
            },
            0xF => match nn {
                0x07 => Self::Load_Delay { vx },
                0x0A => Self::Wait_Key { vx },
                0x15 => Self::Set_Delay { vx },
                0x18 => Self::Set_Sound { vx },
                0x1E => Self::Add_Address { vx },
                0x29 => Self::Load_Glyph { vx },
                0x33 => Self::Store_Bcd { vx },
                0x55 => Self::Store_Registers { vx },
                0x65 => Self::Load_Registers { vx },
                _ => Self::Unknown(word),
            },
            _ => Self::Unknown(word),
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Sys { address } => write!(f, "SYS 0x{address:03X}"),
            Self::ClearScreen => write!(f, "CLS"),
            Self::Return => write!(f, "RET"),
            Self::Jump { address } => write!(f, "JP 0x{address:03X}"),
            Self::Call { address } => write!(f, "CALL 0x{address:03X}"),
            Self::Skip_Eq_Byte { vx, nn } => write!(f, "SE v{vx:X}, {nn}"),
            Self::Skip_NotEq_Byte { vx, nn } => write!(f, "SNE v{vx:X}, {nn}"),
            Self::Skip_Eq { vx, vy } => write!(f, "SE v{vx:X}, v{vy:X}"),
            Self::Load_Byte { vx, nn } => write!(f, "LD v{vx:X}, {nn}"),
            Self::Add_Byte { vx, nn } => write!(f, "ADD v{vx:X}, {nn}"),
            // ------
            Self::Load_Vx_Vy { vx, vy } => write!(f, "LD v{vx:X}, v{vy:X}"),
            Self::Or_Vx_Vy { vx, vy } => write!(f, "OR v{vx:X}, v{vy:X}"),
            Self::And_Vx_Vy { vx, vy } => write!(f, "AND v{vx:X}, v{vy:X}"),
            Self::Xor_Vx_Vy { vx, vy } => write!(f, "XOR v{vx:X}, v{vy:X}"),
            Self::Add_Vx_Vy { vx, vy } => write!(f, "ADD v{vx:X}, v{vy:X}"),
            Self::Sub_Vx_Vy { vx, vy } => write!(f, "SUB v{vx:X}, v{vy:X}"),
            Self::ShiftRight { vx, vy } => write!(f, "SHR v{vx:X}, v{vy:X}"),
            Self::SubReverse_Vx_Vy { vx, vy } => write!(f, "SUBN v{vx:X}, v{vy:X}"),
            Self::ShiftLeft { vx, vy } => write!(f, "SHL v{vx:X}, v{vy:X}"),
            Self::Skip_NotEq { vx, vy } => write!(f, "SNE v{vx:X}, v{vy:X}"),
            // ------
            Self::Load_Address { address } => write!(f, "LD I, 0x{address:03X}"),
            Self::Jump_V0 { address } => write!(f, "JP v0, 0x{address:03X}"),
            Self::Random { vx, nn } => write!(f, "RND v{vx:X}, {nn}"),
            Self::Draw { vx, vy, n } => write!(f, "DRW v{vx:X}, v{vy:X}, {n}"),
            // ------
            Self::Skip_Key { vx } => write!(f, "SKP v{vx:X}"),
            Self::Skip_NotKey { vx } => write!(f, "SKNP v{vx:X}"),
            // ------
            Self::Load_Delay { vx } => write!(f, "LD v{vx:X}, DT"),
            Self::Wait_Key { vx } => write!(f, "LD v{vx:X}, K"),
            Self::Set_Delay { vx } => write!(f, "LD DT, v{vx:X}"),
            Self::Set_Sound { vx } => write!(f, "LD ST, v{vx:X}"),
            Self::Add_Address { vx } => write!(f, "ADD I, v{vx:X}"),
            Self::Load_Glyph { vx } => write!(f, "LD F, v{vx:X}"),
            Self::Store_Bcd { vx } => write!(f, "LD B, v{vx:X}"),
            Self::Store_Registers { vx } => write!(f, "LD [I], v{vx:X}"),
            Self::Load_Registers { vx } => write!(f, "LD v{vx:X}, [I]"),
            // ------
            Self::Unknown(word) => write!(f, "0x{word:04X}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_families() {
        use Instr as I;

        assert_eq!(I::decode(0x00E0), I::ClearScreen);
        assert_eq!(I::decode(0x00EE), I::Return);
        assert_eq!(I::decode(0x0123), I::Sys { address: 0x123 });
        assert_eq!(I::decode(0x1ABC), I::Jump { address: 0xABC });
        assert_eq!(I::decode(0x2ABC), I::Call { address: 0xABC });
        assert_eq!(I::decode(0x3A42), I::Skip_Eq_Byte { vx: 0xA, nn: 0x42 });
        assert_eq!(I::decode(0x4A42), I::Skip_NotEq_Byte { vx: 0xA, nn: 0x42 });
        assert_eq!(I::decode(0x5AB0), I::Skip_Eq { vx: 0xA, vy: 0xB });
        assert_eq!(I::decode(0x6F01), I::Load_Byte { vx: 0xF, nn: 0x01 });
        assert_eq!(I::decode(0x7001), I::Add_Byte { vx: 0x0, nn: 0x01 });
        assert_eq!(I::decode(0x9AB0), I::Skip_NotEq { vx: 0xA, vy: 0xB });
        assert_eq!(I::decode(0xA123), I::Load_Address { address: 0x123 });
        assert_eq!(I::decode(0xB123), I::Jump_V0 { address: 0x123 });
        assert_eq!(I::decode(0xC30F), I::Random { vx: 0x3, nn: 0x0F });
        assert_eq!(I::decode(0xD125), I::Draw { vx: 1, vy: 2, n: 5 });
    }

    #[test]
    fn test_decode_math() {
        use Instr as I;

        let expected = [
            (0x8120, I::Load_Vx_Vy { vx: 1, vy: 2 }),
            (0x8121, I::Or_Vx_Vy { vx: 1, vy: 2 }),
            (0x8122, I::And_Vx_Vy { vx: 1, vy: 2 }),
            (0x8123, I::Xor_Vx_Vy { vx: 1, vy: 2 }),
            (0x8124, I::Add_Vx_Vy { vx: 1, vy: 2 }),
            (0x8125, I::Sub_Vx_Vy { vx: 1, vy: 2 }),
            (0x8126, I::ShiftRight { vx: 1, vy: 2 }),
            (0x8127, I::SubReverse_Vx_Vy { vx: 1, vy: 2 }),
            (0x812E, I::ShiftLeft { vx: 1, vy: 2 }),
        ];
        for (word, instr) in expected {
            assert_eq!(I::decode(word), instr, "{word:04X}");
        }
    }

    #[test]
    fn test_decode_misc() {
        use Instr as I;

        assert_eq!(I::decode(0xE39E), I::Skip_Key { vx: 3 });
        assert_eq!(I::decode(0xE3A1), I::Skip_NotKey { vx: 3 });
        assert_eq!(I::decode(0xF307), I::Load_Delay { vx: 3 });
        assert_eq!(I::decode(0xF30A), I::Wait_Key { vx: 3 });
        assert_eq!(I::decode(0xF315), I::Set_Delay { vx: 3 });
        assert_eq!(I::decode(0xF318), I::Set_Sound { vx: 3 });
        assert_eq!(I::decode(0xF31E), I::Add_Address { vx: 3 });
        assert_eq!(I::decode(0xF329), I::Load_Glyph { vx: 3 });
        assert_eq!(I::decode(0xF333), I::Store_Bcd { vx: 3 });
        assert_eq!(I::decode(0xF355), I::Store_Registers { vx: 3 });
        assert_eq!(I::decode(0xF365), I::Load_Registers { vx: 3 });
    }

    #[test]
    fn test_decode_unknown() {
        for word in [0x5AB1, 0x9AB7, 0x812F, 0xE100, 0xF1FF, 0xF000] {
            assert_eq!(Instr::decode(word), Instr::Unknown(word), "{word:04X}");
        }
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Instr::decode(0x00E0).to_string(), "CLS");
        assert_eq!(Instr::decode(0x12A0).to_string(), "JP 0x2A0");
        assert_eq!(Instr::decode(0x6142).to_string(), "LD v1, 66");
        assert_eq!(Instr::decode(0xD015).to_string(), "DRW v0, v1, 5");
        assert_eq!(Instr::decode(0xFF65).to_string(), "LD vF, [I]");
        assert_eq!(Instr::decode(0xF000).to_string(), "0xF000");
    }
}
