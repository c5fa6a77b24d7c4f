//! Main memory.
use std::ops::Range;

use crate::constants::*;

/// Flat 4KB address space.
///
/// The font lives at the bottom of memory, programs are loaded at [`MEM_START`].
pub struct Memory {
    ram: Box<[u8; MEM_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        let mut memory = Self {
            ram: Box::new([0; MEM_SIZE]),
        };
        memory.load_font();
        memory
    }
}

impl Memory {
    pub fn new() -> Self {
        Default::default()
    }

    /// Erase all memory, then restore the built-in font.
    pub(crate) fn reset(&mut self) {
        self.ram.fill(0);
        self.load_font();
    }

    fn load_font(&mut self) {
        let start = FONTSET_START as usize;
        self.ram[start..start + FONTSET_DATA_LENGTH].copy_from_slice(&FONTSET);
    }

    /// Copy program bytecode into memory at [`MEM_START`].
    ///
    /// The caller is responsible for checking the program size.
    pub(crate) fn load_program(&mut self, bytecode: &[u8]) {
        debug_assert!(check_program_size(bytecode));
        self.ram[MEM_START..MEM_START + bytecode.len()].copy_from_slice(bytecode);
    }

    /// Read the big-endian instruction word at the given address.
    ///
    /// Returns `None` when the word does not fit in memory.
    #[inline]
    pub fn word(&self, addr: usize) -> Option<u16> {
        let bytes = self.ram.get(addr..addr + 2)?;
        Some(((bytes[0] as u16) << 8) | bytes[1] as u16)
    }

    #[inline]
    pub fn byte(&self, addr: usize) -> Option<u8> {
        self.ram.get(addr).copied()
    }

    /// Borrow `len` bytes starting at `addr`, or `None` if the range runs past the end of memory.
    #[inline]
    pub fn slice(&self, addr: usize, len: usize) -> Option<&[u8]> {
        self.ram.get(span(addr, len)?)
    }

    #[inline]
    pub fn slice_mut(&mut self, addr: usize, len: usize) -> Option<&mut [u8]> {
        self.ram.get_mut(span(addr, len)?)
    }

    pub fn as_slice(&self) -> &[u8] {
        &*self.ram
    }
}

fn span(addr: usize, len: usize) -> Option<Range<usize>> {
    let end = addr.checked_add(len)?;
    if end <= MEM_SIZE {
        Some(addr..end)
    } else {
        None
    }
}

/// Checks whether the program fits in the memory after the reserved space.
pub fn check_program_size(bytecode: &[u8]) -> bool {
    bytecode.len() <= MAX_PROGRAM_SIZE
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_font_loaded() {
        let memory = Memory::new();
        assert_eq!(memory.slice(0, FONTSET_DATA_LENGTH).unwrap(), &FONTSET[..]);
        // glyph F
        assert_eq!(
            memory.slice(0x4B, 5).unwrap(),
            &[0xF0, 0x80, 0xF0, 0x80, 0x80]
        );
    }

    #[test]
    fn test_word_big_endian() {
        let mut memory = Memory::new();
        memory.load_program(&[0x12, 0x34]);
        assert_eq!(memory.word(MEM_START), Some(0x1234));
        assert_eq!(memory.word(MEM_SIZE - 2), Some(0x0000));
        assert_eq!(memory.word(MEM_SIZE - 1), None);
    }

    #[test]
    fn test_slice_bounds() {
        let mut memory = Memory::new();
        assert!(memory.slice(MEM_SIZE - 3, 3).is_some());
        assert!(memory.slice(MEM_SIZE - 2, 3).is_none());
        assert!(memory.slice_mut(MEM_SIZE, 0).is_some());
        assert!(memory.slice_mut(usize::MAX, 2).is_none());
    }

    #[test]
    fn test_program_size() {
        assert!(check_program_size(&[0; MAX_PROGRAM_SIZE]));
        assert!(!check_program_size(&[0; MAX_PROGRAM_SIZE + 1]));
    }

    #[test]
    fn test_reset_restores_font() {
        let mut memory = Memory::new();
        memory.slice_mut(0, 4).unwrap().fill(0xAA);
        memory.load_program(&[0xFF; 4]);
        memory.reset();
        assert_eq!(memory.byte(0), Some(0xF0));
        assert_eq!(memory.byte(MEM_START), Some(0));
    }
}
