mod cluster;
mod config;
mod error;
mod gameboy;
mod keypad;
mod layout;
mod leak;
mod tube;

use std::fs;
use std::io::{self, BufRead, Write};

use clap::Parser;
use log::info;

use crate::{
    config::{Config, Opts, Target},
    error::{Error, Result},
    gameboy::Gameboy,
    keypad::Keypad,
    tube::Tube,
};

fn wait_for_debugger(pid: Option<u32>) -> Result<()> {
    match pid {
        Some(pid) => print!("attach {}>", pid),
        None => print!("attach>"),
    }
    io::stdout().flush()?;
    io::stdin().lock().read_line(&mut String::new())?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::from(Opts::parse());

    let tube = match &config.target {
        Target::Local(path) => Tube::process(path)?,
        Target::Remote(addr) => Tube::remote(addr.as_str())?,
    };
    let image = fs::read(&config.image).map_err(|source| Error::Image {
        path: config.image.clone(),
        source,
    })?;

    let mut gameboy = Gameboy::new(tube, Keypad::new(config.delay), config.layout);
    if config.attach {
        wait_for_debugger(gameboy.tube().pid())?;
    }

    let targets = gameboy.run(&image)?;
    info!("{}", targets);

    gameboy.into_tube().interactive()
}
