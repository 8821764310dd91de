use log::debug;

use crate::{
    cluster::Frame,
    error::{Error, Result},
    tube::Tube,
};

pub const MARKER: &[u8; 16] = b"AAAAAAAAAAAAAAAA";

/// Reads the pointer the target prints right after `marker`.
pub fn read_leak(tube: &mut Tube, marker: &[u8]) -> Result<Frame> {
    tube.recv_until(marker)?;
    let leak = tube.recv_line()?;
    debug!("leaked: {:02x?}", leak);
    Frame::from_leak(&leak).ok_or(Error::LeakTooLong(leak.len()))
}
