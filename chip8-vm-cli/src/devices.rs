//! Headless devices driven by a key script.
use chip8_vm::{constants::KEY_COUNT, Devices, Framebuffer, KeyCode, Keypad};

use crate::config::ScriptedKey;

pub struct ScriptedDevices {
    keypad: Keypad,
    script: Vec<ScriptedKey>,
    /// Copy of the most recently presented frame.
    screen: Framebuffer,
    frames: usize,
}

impl ScriptedDevices {
    pub fn new(script: Vec<ScriptedKey>) -> Self {
        Self {
            keypad: Keypad::new(),
            script,
            screen: Framebuffer::new(),
            frames: 0,
        }
    }

    /// Update the keypad to the state the script describes at the given step.
    pub fn advance(&mut self, step: usize) {
        let held = self
            .script
            .iter()
            .filter(|key| key.is_held(step))
            .fold(0u16, |mask, key| mask | (1 << key.key.as_u8()));

        for key in (0..KEY_COUNT).filter_map(|k| KeyCode::try_from(k).ok()) {
            self.keypad.set_key(key, held & (1 << key.as_u8()) != 0);
        }
    }

    pub fn screen(&self) -> &Framebuffer {
        &self.screen
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }
}

impl Devices for ScriptedDevices {
    fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keypad.key_state(key)
    }

    fn poll_next_key(&mut self) -> Option<KeyCode> {
        self.keypad.next_press()
    }

    fn discard_key_presses(&mut self) {
        self.keypad.clear_presses();
    }

    fn present(&mut self, display: &Framebuffer) {
        self.screen.clone_from(display);
        self.frames += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn script() -> Vec<ScriptedKey> {
        vec![
            ScriptedKey {
                key: KeyCode::Key5,
                at: 2,
                release: Some(4),
            },
            ScriptedKey {
                key: KeyCode::KeyA,
                at: 3,
                release: None,
            },
        ]
    }

    #[test]
    fn test_script_timing() {
        let mut devices = ScriptedDevices::new(script());

        devices.advance(1);
        assert!(!devices.is_key_pressed(KeyCode::Key5));
        assert_eq!(devices.poll_next_key(), None);

        devices.advance(2);
        assert!(devices.is_key_pressed(KeyCode::Key5));

        devices.advance(3);
        assert!(devices.is_key_pressed(KeyCode::Key5));
        assert!(devices.is_key_pressed(KeyCode::KeyA));

        devices.advance(4);
        assert!(!devices.is_key_pressed(KeyCode::Key5));
        assert!(devices.is_key_pressed(KeyCode::KeyA));

        devices.advance(1_000);
        assert!(devices.is_key_pressed(KeyCode::KeyA));
    }

    #[test]
    fn test_press_delivered_once() {
        let mut devices = ScriptedDevices::new(script());

        for step in 0..10 {
            devices.advance(step);
        }

        assert_eq!(devices.poll_next_key(), Some(KeyCode::Key5));
        assert_eq!(devices.poll_next_key(), Some(KeyCode::KeyA));
        assert_eq!(devices.poll_next_key(), None);
    }

    #[test]
    fn test_discard_presses() {
        let mut devices = ScriptedDevices::new(script());
        devices.advance(3);

        devices.discard_key_presses();
        assert_eq!(devices.poll_next_key(), None);
        // Held keys stay held.
        assert!(devices.is_key_pressed(KeyCode::Key5));
        assert!(devices.is_key_pressed(KeyCode::KeyA));
    }

    #[test]
    fn test_overlapping_entries() {
        let mut devices = ScriptedDevices::new(vec![
            ScriptedKey {
                key: KeyCode::Key1,
                at: 0,
                release: Some(5),
            },
            ScriptedKey {
                key: KeyCode::Key1,
                at: 3,
                release: Some(8),
            },
        ]);

        devices.advance(6);
        assert!(devices.is_key_pressed(KeyCode::Key1));
        devices.advance(8);
        assert!(!devices.is_key_pressed(KeyCode::Key1));
    }

    #[test]
    fn test_present_snapshot() {
        let mut devices = ScriptedDevices::new(vec![]);
        let mut display = Framebuffer::new();
        display.draw_sprite(0, 0, &[0x80]);

        devices.present(&display);
        display.clear();

        assert!(devices.screen().get(0, 0));
        assert_eq!(devices.frame_count(), 1);
    }
}
