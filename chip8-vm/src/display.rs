//! Logical display buffer.
use std::fmt;

use crate::constants::*;

/// Monochrome 64x32 pixel grid, stored row-major.
///
/// This is the authoritative state of the screen. How and when it reaches
/// a window is up to the [`Devices`](crate::devices::Devices) implementation.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: Box<[bool; DISPLAY_BUFFER_SIZE]>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self {
            pixels: Box::new([false; DISPLAY_BUFFER_SIZE]),
        }
    }
}

impl Framebuffer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// State of the pixel at the given coordinate.
    ///
    /// Coordinates outside of the display wrap around.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.pixels[index(x, y)]
    }

    /// Raw pixel buffer, row-major.
    pub fn pixels(&self) -> &[bool; DISPLAY_BUFFER_SIZE] {
        &self.pixels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        self.pixels.chunks(DISPLAY_WIDTH)
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|px| !px)
    }

    /// Blit a sprite onto the display with XOR, wrapping at the edges.
    ///
    /// Each byte in `sprite` is a row of 8 pixels, most significant bit first.
    /// Returns `true` when any pixel that was on has been turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut is_erased = false;

        for (r, row) in sprite.iter().enumerate() {
            for c in 0..SPRITE_WIDTH {
                let new_px = (row >> (7 - c)) & 1 != 0;
                if !new_px {
                    continue;
                }

                let d = index(x + c, y + r);
                let old_px = self.pixels[d];

                // XOR erases a pixel when both the old and new values are 1.
                is_erased |= old_px;

                self.pixels[d] = !old_px;
            }
        }

        is_erased
    }
}

#[inline(always)]
fn index(x: usize, y: usize) -> usize {
    (x & DISPLAY_WIDTH_MASK) + (y & DISPLAY_HEIGHT_MASK) * DISPLAY_WIDTH
}

impl fmt::Display for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for px in row {
                f.write_str(if *px { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Framebuffer {DISPLAY_WIDTH}x{DISPLAY_HEIGHT}")?;
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const GLYPH_0: [u8; 5] = [0xF0, 0x90, 0x90, 0x90, 0xF0];

    #[test]
    fn test_draw_no_collision() {
        let mut fb = Framebuffer::new();
        assert!(!fb.draw_sprite(0, 0, &[0b1010_0000]));
        assert!(fb.get(0, 0));
        assert!(!fb.get(1, 0));
        assert!(fb.get(2, 0));
    }

    #[test]
    fn test_zero_bits_do_not_erase() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(4, 0, &[0b1111_0000]);
        assert!(!fb.draw_sprite(0, 0, &[0b1111_0000]));
        assert!((0..8).all(|x| fb.get(x, 0)));
    }

    #[test]
    fn test_draw_twice_restores() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(10, 3, &[0xFF]);
        let before = fb.clone();

        assert!(!fb.draw_sprite(20, 7, &GLYPH_0));
        assert_ne!(fb, before);

        assert!(fb.draw_sprite(20, 7, &GLYPH_0));
        assert_eq!(fb, before);
    }

    #[test]
    fn test_wrap_around() {
        let mut fb = Framebuffer::new();
        let sprite = [0xFF; 5];
        assert!(!fb.draw_sprite(60, 30, &sprite));

        let columns = [60, 61, 62, 63, 0, 1, 2, 3];
        let rows = [30, 31, 0, 1, 2];
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                let expected = columns.contains(&x) && rows.contains(&y);
                assert_eq!(fb.get(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_empty_sprite() {
        let mut fb = Framebuffer::new();
        assert!(!fb.draw_sprite(5, 5, &[]));
        assert!(fb.is_blank());
    }

    #[test]
    fn test_text_dump() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(0, 0, &[0b1100_0000]);
        let text = fb.to_string();
        let first = text.lines().next().unwrap();
        assert_eq!(first.len(), DISPLAY_WIDTH);
        assert!(first.starts_with("##..."));
        assert_eq!(text.lines().count(), DISPLAY_HEIGHT);
    }
}
