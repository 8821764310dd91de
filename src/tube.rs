use std::cmp;
use std::io;
use std::io::{BufRead, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;

use log::{info, warn};

use crate::error::{Error, Result};

const BUFFER_CAPACITY: usize = 0x2000;

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Status {
    Open,
    Close,
}

pub struct Tube {
    pub status: Status,
    reader: Box<dyn Read + Send>,
    writer: Box<dyn Write + Send>,
    child: Option<Child>,
    buf: Box<[u8]>,
    pos: usize,
    cap: usize,
}

impl Tube {
    pub fn from_parts(
        reader: impl Read + Send + 'static,
        writer: impl Write + Send + 'static,
    ) -> Tube {
        Tube {
            status: Status::Open,
            reader: Box::new(reader),
            writer: Box::new(writer),
            child: None,
            buf: vec![0; BUFFER_CAPACITY].into_boxed_slice(),
            pos: 0,
            cap: 0,
        }
    }

    pub fn remote(addr: impl ToSocketAddrs + ToString) -> Result<Tube> {
        let connect_error = |source| Error::Connect {
            addr: addr.to_string(),
            source,
        };
        let stream = TcpStream::connect(&addr).map_err(connect_error)?;
        let reader = stream.try_clone().map_err(connect_error)?;
        info!("connected to {}", addr.to_string());
        Ok(Tube::from_parts(reader, stream))
    }

    pub fn process(path: impl AsRef<Path>) -> Result<Tube> {
        let path = path.as_ref();
        let spawn_error = |source| Error::Spawn {
            path: path.to_owned(),
            source,
        };
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_error)?;

        let pipe_error =
            || spawn_error(io::Error::new(io::ErrorKind::BrokenPipe, "missing stdio pipe"));
        let stdin = child.stdin.take().ok_or_else(pipe_error)?;
        let stdout = child.stdout.take().ok_or_else(pipe_error)?;
        info!("started {:?}: pid {}", path, child.id());

        let mut tube = Tube::from_parts(stdout, stdin);
        tube.child = Some(child);
        Ok(tube)
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    pub fn is_open(&self) -> bool {
        self.status == Status::Open
    }

    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.is_open() {
            return Err(Error::Closed);
        }
        self.write_all(data)?;
        self.flush()?;
        Ok(())
    }

    /// Blocks until `needle` shows up and returns everything read so far,
    /// needle included.
    pub fn recv_until(&mut self, needle: &[u8]) -> Result<Vec<u8>> {
        if !self.is_open() {
            return Err(Error::Closed);
        }
        let mut data = Vec::new();
        while !data.ends_with(needle) {
            let available = self.fill_buf()?;
            if available.is_empty() {
                return Err(Error::Eof(String::from_utf8_lossy(needle).into_owned()));
            }
            // never read past the needle, the rest stays buffered
            let want = needle.len() - overlap(&data, needle);
            let take = cmp::min(want, available.len());
            data.extend_from_slice(&available[..take]);
            self.consume(take);
        }
        Ok(data)
    }

    pub fn recv_line(&mut self) -> Result<Vec<u8>> {
        let mut line = self.recv_until(b"\n")?;
        line.pop();
        Ok(line)
    }

    /// Bridges the operator's terminal and the target until stdin runs dry
    /// or the target stops taking input.
    pub fn interactive(self) -> Result<()> {
        let Tube {
            mut reader,
            mut writer,
            child,
            buf,
            pos,
            cap,
            ..
        } = self;
        let pending = buf[pos..cap].to_vec();

        info!("switching to interactive mode");
        let pump = thread::spawn(move || -> io::Result<()> {
            let mut stdout = io::stdout();
            stdout.write_all(&pending)?;
            stdout.flush()?;
            let mut chunk = [0u8; BUFFER_CAPACITY];
            loop {
                let n = reader.read(&mut chunk)?;
                if n == 0 {
                    return Ok(());
                }
                stdout.write_all(&chunk[..n])?;
                stdout.flush()?;
            }
        });

        let stdin = io::stdin();
        let mut stdin = stdin.lock();
        let mut chunk = [0u8; BUFFER_CAPACITY];
        loop {
            let n = stdin.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            if let Err(e) = writer.write_all(&chunk[..n]).and_then(|_| writer.flush()) {
                warn!("target stopped accepting input: {}", e);
                break;
            }
        }
        drop(writer);

        if pump.is_finished() {
            if let Ok(Err(e)) = pump.join() {
                warn!("lost connection: {}", e);
            }
        }
        if let Some(mut child) = child {
            if let Ok(Some(status)) = child.try_wait() {
                info!("process exited: {}", status);
            }
        }
        Ok(())
    }
}

/// Length of the longest suffix of `data` that is a prefix of `needle`.
fn overlap(data: &[u8], needle: &[u8]) -> usize {
    (1..needle.len())
        .rev()
        .find(|&k| data.ends_with(&needle[..k]))
        .unwrap_or(0)
}

impl Read for Tube {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let nread = {
            let mut rem = self.fill_buf()?;
            rem.read(buf)?
        };
        self.consume(nread);
        Ok(nread)
    }
}

impl BufRead for Tube {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.cap {
            self.cap = match self.reader.read(&mut self.buf) {
                Ok(0) => {
                    self.status = Status::Close;
                    0
                }
                Ok(n) => n,
                Err(e) => {
                    self.status = Status::Close;
                    return Err(e);
                }
            };
            self.pos = 0;
        }
        Ok(&self.buf[self.pos..self.cap])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = cmp::min(self.pos + amt, self.cap);
    }
}

impl Write for Tube {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let write_wrapper = self.writer.write(buf);
        if write_wrapper.is_err() {
            self.status = Status::Close
        }
        write_wrapper
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
