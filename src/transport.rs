//! Byte-stream access to the controller.
//!
//! The protocol engine only needs a blocking write and a read that gives up
//! after a timeout. Serial ports provide both; tests substitute a scripted
//! controller.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{info, warn};

use crate::error::{LinkError, Result};

pub trait Transport: Send {
    /// Writes all of `bytes` and flushes them to the wire.
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Reads whatever is available, waiting at most `timeout` for the first
    /// byte. Returns an error of kind `TimedOut` when nothing arrived.
    fn read_with_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;
}

impl Transport for Box<dyn SerialPort> {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        Write::write_all(self, bytes)?;
        Write::flush(self)
    }

    fn read_with_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        self.set_timeout(timeout)?;
        Read::read(self, buf)
    }
}

/// Opens `port_name` at `baud_rate` with the controller's fixed 8N1 framing.
pub fn open_serial(port_name: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>> {
    let port = serialport::new(port_name, baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(Duration::from_millis(100))
        .open()
        .map_err(|source| {
            warn!(port = port_name, error = %source, "failed to open controller port");
            LinkError::OpenFailure {
                port: port_name.to_string(),
                source,
            }
        })?;

    info!(port = port_name, baud_rate, "opened controller port");
    Ok(port)
}

#[cfg(test)]
pub(crate) mod scripted {
    //! In-memory stand-in for the keypad controller.

    use super::Transport;
    use std::collections::VecDeque;
    use std::io;
    use std::time::Duration;

    // Longest a scripted read actually sleeps when it has nothing to deliver.
    const IDLE_SLEEP: Duration = Duration::from_millis(2);

    type Responder = fn(&str) -> Vec<String>;

    /// Replies the way the keypad firmware does.
    pub(crate) fn keypad_firmware(line: &str) -> Vec<String> {
        if line.is_empty() {
            return Vec::new();
        }
        if let Some(key) = line.strip_prefix("press ").or_else(|| line.strip_prefix("pulse ")) {
            return vec![format!("OK: pressing {}\r", key), "OK\r".to_string()];
        }
        if line == "status" {
            return vec!["Status: idle\r".to_string()];
        }
        vec![format!("OK: {}\r", line)]
    }

    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        // Each read hands out at most one chunk.
        inbound: VecDeque<Vec<u8>>,
        written: Vec<u8>,
        writes: usize,
        fail_write_at: Option<usize>,
        fail_reads: bool,
        end_of_stream: bool,
        // Handed out on every read once the queue is empty, like a board
        // that never stops printing.
        chatter: Option<Vec<u8>>,
        responder: Option<Responder>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// A controller that answers every command line like the firmware.
        pub(crate) fn keypad() -> Self {
            Self {
                responder: Some(keypad_firmware),
                ..Self::default()
            }
        }

        /// Queues raw bytes to be read as one chunk.
        pub(crate) fn push_chunk(&mut self, bytes: &[u8]) -> &mut Self {
            self.inbound.push_back(bytes.to_vec());
            self
        }

        /// Queues each entry as a `\n`-terminated line, one chunk per line.
        pub(crate) fn push_lines(&mut self, lines: &[&str]) -> &mut Self {
            for line in lines {
                self.push_chunk(format!("{}\n", line).as_bytes());
            }
            self
        }

        /// Makes the `n`th write (1-based) fail with a broken pipe.
        pub(crate) fn fail_write_at(&mut self, n: usize) -> &mut Self {
            self.fail_write_at = Some(n);
            self
        }

        pub(crate) fn fail_reads(&mut self) -> &mut Self {
            self.fail_reads = true;
            self
        }

        /// Once the queue is empty, reads report end of stream (`Ok(0)`).
        pub(crate) fn end_of_stream(&mut self) -> &mut Self {
            self.end_of_stream = true;
            self
        }

        /// Once the queue is empty, every read returns `bytes` after a short pause.
        pub(crate) fn chatter(&mut self, bytes: &[u8]) -> &mut Self {
            self.chatter = Some(bytes.to_vec());
            self
        }

        pub(crate) fn written(&self) -> &[u8] {
            &self.written
        }

        /// Non-empty lines written so far.
        pub(crate) fn commands(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.written)
                .split('\n')
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        }

        pub(crate) fn pending_chunks(&self) -> usize {
            self.inbound.len()
        }
    }

    impl Transport for ScriptedTransport {
        fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.writes += 1;
            if self.fail_write_at == Some(self.writes) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "port unplugged"));
            }
            self.written.extend_from_slice(bytes);

            if let Some(respond) = self.responder {
                let text = String::from_utf8_lossy(bytes).into_owned();
                for line in text.split('\n') {
                    for reply in respond(line) {
                        self.inbound.push_back(format!("{}\n", reply).into_bytes());
                    }
                }
            }
            Ok(())
        }

        fn read_with_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
            if self.fail_reads {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "port unplugged"));
            }
            match self.inbound.pop_front() {
                Some(mut chunk) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.inbound.push_front(chunk.split_off(n));
                    }
                    Ok(n)
                }
                None if self.end_of_stream => Ok(0),
                None if self.chatter.is_some() => {
                    std::thread::sleep(timeout.min(IDLE_SLEEP));
                    let bytes = self.chatter.as_deref().unwrap_or_default();
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                None => {
                    std::thread::sleep(timeout.min(IDLE_SLEEP));
                    Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
                }
            }
        }
    }
}
