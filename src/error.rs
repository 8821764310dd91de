use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("cannot spawn {path:?}: {source}")]
    Spawn { path: PathBuf, source: io::Error },

    #[error("cannot read image {path:?}: {source}")]
    Image { path: PathBuf, source: io::Error },

    #[error("tube is closed")]
    Closed,

    #[error("eof while waiting for {0:?}")]
    Eof(String),

    #[error("leak is {0} bytes long, expected at most 8")]
    LeakTooLong(usize),

    #[error("address out of range: {0}")]
    Address(String),
}

pub type Result<T> = std::result::Result<T, Error>;
