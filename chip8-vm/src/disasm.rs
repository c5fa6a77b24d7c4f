//! Disassembler.
use std::fmt::{self, Write as FmtWrite};

use crate::{
    constants::{Address, MEM_START},
    instr::Instr,
};

/// Linear disassembler.
///
/// Walks the program two bytes at a time from the load address. Data mixed
/// in with code, like sprites, is decoded as if it were instructions.
pub struct Disassembler<'a> {
    bytecode: &'a [u8],
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self { bytecode }
    }

    /// Decoded instructions paired with the address they would be loaded at.
    ///
    /// A trailing odd byte is not included.
    pub fn instructions(&self) -> impl Iterator<Item = (Address, Instr)> + 'a {
        self.bytecode
            .chunks_exact(2)
            .enumerate()
            .map(|(i, pair)| {
                let address = (MEM_START + i * 2) as Address;
                let word = u16::from_be_bytes([pair[0], pair[1]]);
                (address, Instr::decode(word))
            })
    }

    pub fn print_bytecode(&self) -> fmt::Result {
        let mut s = String::new();
        self.disassemble(&mut s)?;
        println!("{}", s);
        Ok(())
    }

    /// Write the program to the given writer, one instruction per line.
    pub fn disassemble<W: FmtWrite>(&self, w: &mut W) -> fmt::Result {
        let chunks = self.bytecode.chunks_exact(2);
        let remainder = chunks.remainder();

        for (i, pair) in chunks.enumerate() {
            let address = MEM_START + i * 2;
            let word = u16::from_be_bytes([pair[0], pair[1]]);
            writeln!(w, "{address:04X}: {word:04X}  {}", Instr::decode(word))?;
        }

        // Odd sized programs end in a data byte.
        if let [byte] = remainder {
            let address = MEM_START + self.bytecode.len() - 1;
            writeln!(w, "{address:04X}: {byte:02X}    DB 0x{byte:02X}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_disassemble() {
        let rom = [0x00, 0xE0, 0x12, 0x00];
        let mut buf = String::new();
        Disassembler::new(&rom).disassemble(&mut buf).unwrap();
        assert_eq!(buf, "0200: 00E0  CLS\n0202: 1200  JP 0x200\n");
    }

    #[test]
    fn test_trailing_byte() {
        let rom = [0x61, 0x2A, 0x80];
        let mut buf = String::new();
        Disassembler::new(&rom).disassemble(&mut buf).unwrap();

        let lines: Vec<&str> = buf.lines().collect();
        assert_eq!(lines, ["0200: 612A  LD v1, 42", "0202: 80    DB 0x80"]);
    }

    #[test]
    fn test_instructions() {
        let rom = [0xA2, 0x1E, 0xC2, 0x01, 0xFF];
        let instrs: Vec<_> = Disassembler::new(&rom).instructions().collect();
        assert_eq!(
            instrs,
            [
                (0x200, Instr::Load_Address { address: 0x21E }),
                (0x202, Instr::Random { vx: 2, nn: 1 }),
            ]
        );
    }
}
