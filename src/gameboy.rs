use log::info;

use crate::{
    cluster::Frame,
    error::Result,
    keypad::Keypad,
    layout::{Layout, Targets},
    leak::{read_leak, MARKER},
    tube::Tube,
};

pub struct Gameboy {
    tube: Tube,
    keypad: Keypad,
    layout: Layout,
}

impl Gameboy {
    pub fn new(tube: Tube, keypad: Keypad, layout: Layout) -> Gameboy {
        Gameboy {
            tube,
            keypad,
            layout,
        }
    }

    pub fn upload(&mut self, image: &[u8]) -> Result<()> {
        info!("uploading {} byte image", image.len());
        self.tube.send(image)
    }

    pub fn leak(&mut self) -> Result<Frame> {
        read_leak(&mut self.tube, MARKER)
    }

    pub fn press_address(&mut self, address: Frame) -> Result<()> {
        self.keypad.press_frame(&mut self.tube, address)
    }

    /// Upload, leak, and key in both addresses. The tube is left open for
    /// the operator afterwards.
    pub fn run(&mut self, image: &[u8]) -> Result<Targets> {
        self.upload(image)?;

        let leak = self.leak()?;
        info!("leak: {}", leak);
        let targets = self.layout.resolve(leak)?;
        info!("program base: {}", targets.base);

        self.press_address(targets.first)?;
        info!("address 1 sent: {}", targets.first);
        self.press_address(targets.second)?;
        info!("address 2 sent: {}", targets.second);

        Ok(targets)
    }

    pub fn tube(&self) -> &Tube {
        &self.tube
    }

    pub fn into_tube(self) -> Tube {
        self.tube
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Gameboy;
    use crate::{
        cluster::Frame,
        error::Error,
        keypad::{decode, Key, Keypad, KEYS_PER_BYTE},
        layout::Layout,
        leak::MARKER,
        tube::tests::{setup, Recorder},
    };

    const IMAGE: &[u8] = b"\x00\xc3\x50\x01NINTENDO";

    fn setup_gameboy(script: &[u8]) -> (Gameboy, Recorder) {
        let (tube, recorder) = setup(script);
        let keypad = Keypad::new(Duration::from_millis(0));
        (Gameboy::new(tube, keypad, Layout::default()), recorder)
    }

    fn leak_script(leak: &[u8]) -> Vec<u8> {
        let mut script = b"loading rom\n".to_vec();
        script.extend_from_slice(MARKER);
        script.extend_from_slice(leak);
        script.push(b'\n');
        script
    }

    fn decode_keys(keys: &[u8]) -> Vec<u8> {
        keys.chunks(KEYS_PER_BYTE)
            .map(|chunk| {
                let mut group = [Key::Right; KEYS_PER_BYTE];
                for (slot, &c) in group.iter_mut().zip(chunk) {
                    *slot = Key::from_char(c as char).unwrap();
                }
                decode(group)
            })
            .collect()
    }

    #[test]
    fn test_gameboy_run() {
        let script = leak_script(b"\x0b\x5c\x55\x55\x55\x55");
        let (mut gameboy, recorder) = setup_gameboy(&script);
        let targets = gameboy.run(IMAGE).unwrap();

        let base = 0x0000_5555_5555_5000u64;
        assert_eq!(targets.base, Frame::from_u64(base));
        assert_eq!(targets.first, Frame::from_u64(base + 0x20_3d00));
        assert_eq!(targets.second, Frame::from_u64(base + 0x20_3d00 - 0xfd00));

        let sent = recorder.sent();
        assert_eq!(&sent[..IMAGE.len()], IMAGE);

        let keys = &sent[IMAGE.len()..];
        assert_eq!(keys.len(), 2 * 8 * KEYS_PER_BYTE);
        let (first, second) = keys.split_at(8 * KEYS_PER_BYTE);
        assert_eq!(decode_keys(first), targets.first.to_vec());
        assert_eq!(decode_keys(second), targets.second.to_vec());
        // lowest byte of base + 0x203d00 is 0x00, its next byte is 0x8d
        assert_eq!(&first[..8], b"ddddawds");
        assert!(gameboy.tube().is_open());
    }

    #[test]
    fn test_gameboy_stops_without_leak() {
        let (mut gameboy, recorder) = setup_gameboy(b"game over\n");
        assert!(matches!(gameboy.run(IMAGE), Err(Error::Eof(_))));
        assert_eq!(recorder.sent(), IMAGE.to_vec());
    }

    #[test]
    fn test_gameboy_stops_on_bad_leak() {
        let (mut gameboy, recorder) = setup_gameboy(&leak_script(b"\x01"));
        assert!(matches!(gameboy.run(IMAGE), Err(Error::Address(_))));
        assert_eq!(recorder.sent(), IMAGE.to_vec());
    }
}
