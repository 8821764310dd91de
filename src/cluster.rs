use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

pub type Byte = u8;

pub const FRAME_SIZE: usize = 8;

/// One little-endian machine word as it travels over the wire.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Frame(pub [Byte; FRAME_SIZE]);

impl Frame {
    pub fn from_u64(u: u64) -> Self {
        let mut array = [0; FRAME_SIZE];
        LittleEndian::write_u64(&mut array, u);
        Self(array)
    }

    pub fn to_u64(&self) -> u64 {
        LittleEndian::read_u64(&self.0)
    }

    /// Pointers printed by the target lose their high zero bytes, so a short
    /// leak is padded with `0x00` on the right before being read back.
    pub fn from_leak(leak: &[Byte]) -> Option<Self> {
        if leak.len() > FRAME_SIZE {
            return None;
        }
        let mut array = [0; FRAME_SIZE];
        array[..leak.len()].copy_from_slice(leak);
        Some(Self(array))
    }

    pub fn to_vec(&self) -> Vec<Byte> {
        self.0.to_vec()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.to_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;

    #[test]
    fn test_frame_init() {
        let frame = Frame::from_u64(0x40_0000);
        assert_eq!(frame, Frame([0, 0, 64, 0, 0, 0, 0, 0]));
        let frame = Frame::from_u64(0x400_0000);
        assert_eq!(frame, Frame([0, 0, 0, 4, 0, 0, 0, 0]));
    }

    #[test]
    fn test_frame_from_short_leak() {
        let frame = Frame::from_leak(&[0x0b, 0x0c]).unwrap();
        assert_eq!(frame.to_u64(), 0x0c0b);
        assert_eq!(frame.to_vec(), vec![0x0b, 0x0c, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_frame_from_empty_leak() {
        assert_eq!(Frame::from_leak(&[]).unwrap().to_u64(), 0);
    }

    #[test]
    fn test_frame_rejects_long_leak() {
        assert!(Frame::from_leak(&[0x41; 9]).is_none());
    }

    #[test]
    fn test_frame_display() {
        let frame = Frame::from_u64(0x5555_5555_5000);
        assert_eq!(frame.to_string(), "0x0000555555555000");
    }
}
