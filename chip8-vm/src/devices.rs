//! IO device interface
use std::collections::VecDeque;

use crate::{constants::*, display::Framebuffer};

/// Hooks to provide IO devices to the virtual machine.
///
/// The VM queries these during [`tick`](crate::vm::Chip8Vm::tick).
/// None of the calls may block.
pub trait Devices {
    /// Checks immediately whether the given key is currently pressed.
    fn is_key_pressed(&self, key: KeyCode) -> bool;

    /// Take the next key press, if one happened since the last poll.
    fn poll_next_key(&mut self) -> Option<KeyCode>;

    /// Forget key presses that have not been polled yet.
    ///
    /// Called when a program starts waiting on a key, so only presses
    /// after that point are delivered.
    fn discard_key_presses(&mut self);

    /// Blit the display buffer to screen output.
    ///
    /// Called after every draw and screen clear.
    fn present(&mut self, display: &Framebuffer);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(try_from = "u8")
)]
#[repr(u8)]
pub enum KeyCode {
    Key0 = 0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF = 0xF,
}

impl KeyCode {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Key selected by the low nibble of a register value.
    pub fn from_nibble(value: u8) -> Self {
        match Self::try_from(value & 0xF) {
            Ok(key) => key,
            Err(_) => unreachable!("nibble is always a valid keycode"),
        }
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let key_id = self.as_u8();
        write!(f, "k{key_id:x}")
    }
}

impl From<KeyCode> for u8 {
    fn from(keycode: KeyCode) -> Self {
        keycode.as_u8()
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = InvalidKeyCode;

    fn try_from(key_id: u8) -> Result<Self, Self::Error> {
        match key_id {
            0 => Ok(Self::Key0),
            1 => Ok(Self::Key1),
            2 => Ok(Self::Key2),
            3 => Ok(Self::Key3),
            4 => Ok(Self::Key4),
            5 => Ok(Self::Key5),
            6 => Ok(Self::Key6),
            7 => Ok(Self::Key7),
            8 => Ok(Self::Key8),
            9 => Ok(Self::Key9),
            10 => Ok(Self::KeyA),
            11 => Ok(Self::KeyB),
            12 => Ok(Self::KeyC),
            13 => Ok(Self::KeyD),
            14 => Ok(Self::KeyE),
            15 => Ok(Self::KeyF),
            _ => Err(InvalidKeyCode),
        }
    }
}

#[derive(Debug)]
pub struct InvalidKeyCode;

impl std::error::Error for InvalidKeyCode {}

impl std::fmt::Display for InvalidKeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "keycode must be in range 0 <= keycode < 16")
    }
}

/// Maximum number of unpolled key presses kept by a [`Keypad`].
///
/// When full, the oldest press is dropped.
pub const KEY_PRESS_CAPACITY: usize = KEY_COUNT as usize;

/// Keyboard input state for the 16 keys.
///
/// Tracks which keys are held down, and queues presses so a program waiting
/// on a key sees each press exactly once.
#[derive(Debug, Default, Clone)]
pub struct Keypad {
    /// Pressed is a 1 bit, released is a 0 bit.
    state: u16,
    presses: VecDeque<KeyCode>,
}

impl Keypad {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        let mask = 1 << key.as_u8();
        if pressed {
            if self.state & mask == 0 {
                if self.presses.len() == KEY_PRESS_CAPACITY {
                    self.presses.pop_front();
                }
                self.presses.push_back(key);
            }
            self.state |= mask;
        } else {
            self.state &= !mask;
        }
    }

    pub fn key_state(&self, key: KeyCode) -> bool {
        self.state & (1 << key.as_u8()) > 0
    }

    pub fn next_press(&mut self) -> Option<KeyCode> {
        self.presses.pop_front()
    }

    /// Drop queued presses, leaving the held keys as they are.
    pub fn clear_presses(&mut self) {
        self.presses.clear();
    }

    /// Clear the keyboard input state, setting all keys to up.
    pub fn clear_keys(&mut self) {
        self.state = 0;
        self.presses.clear();
    }
}

/// Devices without a screen, driven by a [`Keypad`].
///
/// Counts presented frames and keeps nothing else. Useful for benchmarks,
/// tests and batch runs.
#[derive(Debug, Default)]
pub struct Headless {
    pub keypad: Keypad,
    frames: usize,
}

impl Headless {
    pub fn new() -> Self {
        Default::default()
    }

    /// Number of times the VM presented the display.
    pub fn frame_count(&self) -> usize {
        self.frames
    }
}

impl Devices for Headless {
    fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keypad.key_state(key)
    }

    fn poll_next_key(&mut self) -> Option<KeyCode> {
        self.keypad.next_press()
    }

    fn discard_key_presses(&mut self) {
        self.keypad.clear_presses();
    }

    fn present(&mut self, _display: &Framebuffer) {
        self.frames += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut keypad = Keypad::default();

        keypad.set_key(KeyCode::Key0, true);
        assert_eq!(keypad.state, 0b00000000_00000001);
        assert!(keypad.key_state(KeyCode::Key0));
        assert!(!keypad.key_state(KeyCode::Key1));
        assert!(!keypad.key_state(KeyCode::Key7));

        keypad.set_key(KeyCode::Key7, true);
        assert_eq!(keypad.state, 0b00000000_10000001);
        assert!(keypad.key_state(KeyCode::Key0));
        assert!(!keypad.key_state(KeyCode::Key1));
        assert!(keypad.key_state(KeyCode::Key7));

        keypad.set_key(KeyCode::Key0, false);
        assert_eq!(keypad.state, 0b00000000_10000000);
        assert!(!keypad.key_state(KeyCode::Key0));
        assert!(keypad.key_state(KeyCode::Key7));

        keypad.set_key(KeyCode::KeyF, true);
        assert_eq!(keypad.state, 0b10000000_10000000);
        assert!(keypad.key_state(KeyCode::KeyF));
    }

    #[test]
    fn test_presses_queued_once() {
        let mut keypad = Keypad::new();

        keypad.set_key(KeyCode::Key5, true);
        // Holding the key down is not a new press.
        keypad.set_key(KeyCode::Key5, true);
        keypad.set_key(KeyCode::KeyA, true);

        assert_eq!(keypad.next_press(), Some(KeyCode::Key5));
        assert_eq!(keypad.next_press(), Some(KeyCode::KeyA));
        assert_eq!(keypad.next_press(), None);

        keypad.set_key(KeyCode::Key5, false);
        keypad.set_key(KeyCode::Key5, true);
        assert_eq!(keypad.next_press(), Some(KeyCode::Key5));

        keypad.set_key(KeyCode::Key1, true);
        keypad.clear_presses();
        assert!(keypad.key_state(KeyCode::Key1));
        assert_eq!(keypad.next_press(), None);

        keypad.clear_keys();
        assert!(!keypad.key_state(KeyCode::Key1));
    }

    #[test]
    fn test_press_queue_capacity() {
        let mut keypad = Keypad::new();

        for _ in 0..100_000 {
            keypad.set_key(KeyCode::Key1, true);
            keypad.set_key(KeyCode::Key1, false);
        }
        assert_eq!(keypad.presses.len(), KEY_PRESS_CAPACITY);

        // Oldest presses are dropped first.
        keypad.clear_presses();
        for id in 0..KEY_COUNT {
            keypad.set_key(KeyCode::try_from(id).unwrap(), true);
        }
        keypad.set_key(KeyCode::Key0, false);
        keypad.set_key(KeyCode::Key0, true);

        assert_eq!(keypad.next_press(), Some(KeyCode::Key1));
        let rest: Vec<_> = std::iter::from_fn(|| keypad.next_press()).collect();
        assert_eq!(rest.len(), KEY_PRESS_CAPACITY - 1);
        assert_eq!(rest.last(), Some(&KeyCode::Key0));
    }

    #[test]
    fn test_keycode_conversion() {
        for id in 0..KEY_COUNT {
            let key = KeyCode::try_from(id).unwrap();
            assert_eq!(u8::from(key), id);
        }
        assert!(KeyCode::try_from(KEY_COUNT).is_err());
        assert_eq!(KeyCode::from_nibble(0xFA), KeyCode::KeyA);
        assert_eq!(KeyCode::KeyC.to_string(), "kc");
    }
}
