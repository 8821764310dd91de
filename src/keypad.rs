use std::fmt;
use std::thread;
use std::time::Duration;

use log::debug;

use crate::{
    cluster::{Byte, Frame},
    error::Result,
    tube::Tube,
};

pub const KEYS_PER_BYTE: usize = 4;

/// The emulator only polls four directions, so every byte goes out as four
/// 2-bit presses.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Key {
    Right,
    Left,
    Down,
    Up,
}

impl Key {
    pub const ALL: [Key; 4] = [Key::Right, Key::Left, Key::Down, Key::Up];

    pub fn from_bits(bits: u8) -> Key {
        Self::ALL[(bits & 3) as usize]
    }

    pub fn bits(self) -> u8 {
        match self {
            Key::Right => 0,
            Key::Left => 1,
            Key::Down => 2,
            Key::Up => 3,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Key::Right => 'd',
            Key::Left => 'a',
            Key::Down => 's',
            Key::Up => 'w',
        }
    }

    // only needed to read back captured key streams
    #[allow(dead_code)]
    pub fn from_char(c: char) -> Option<Key> {
        Self::ALL.iter().copied().find(|key| key.to_char() == c)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Low bit pair first.
pub fn encode(byte: Byte) -> [Key; KEYS_PER_BYTE] {
    [
        Key::from_bits(byte),
        Key::from_bits(byte >> 2),
        Key::from_bits(byte >> 4),
        Key::from_bits(byte >> 6),
    ]
}

pub fn decode(keys: [Key; KEYS_PER_BYTE]) -> Byte {
    keys.iter()
        .rev()
        .fold(0, |byte, key| (byte << 2) | key.bits())
}

#[derive(Debug, Clone, Copy)]
pub struct Keypad {
    pub delay: Duration,
}

impl Keypad {
    pub fn new(delay: Duration) -> Keypad {
        Keypad { delay }
    }

    pub fn press(&self, tube: &mut Tube, key: Key) -> Result<()> {
        tube.send(&[key.to_char() as u8])?;
        thread::sleep(self.delay);
        Ok(())
    }

    pub fn press_byte(&self, tube: &mut Tube, byte: Byte) -> Result<()> {
        let keys = encode(byte);
        debug_assert_eq!(decode(keys), byte);
        debug!("send: {:#04x} {}{}{}{}", byte, keys[0], keys[1], keys[2], keys[3]);
        for key in keys.iter() {
            self.press(tube, *key)?;
        }
        Ok(())
    }

    pub fn press_frame(&self, tube: &mut Tube, frame: Frame) -> Result<()> {
        for byte in frame.to_vec() {
            self.press_byte(tube, byte)?;
        }
        Ok(())
    }
}
