//! Request/acknowledgment exchange with the keypad controller.
//!
//! A command is written as one `\n`-terminated line. The engine then reads
//! lines until the command's [`AckMode`] is satisfied, skipping blank lines
//! and ignoring informational ones. Lines that arrive after the terminator
//! stay buffered in the session for the next exchange.
//!
//! [`AckMode`]: crate::command::AckMode

use std::io;
use std::thread;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::command::{Command, ERR_PREFIX};
use crate::error::{LinkError, Result};
use crate::session::Session;
use crate::transport::Transport;

const READ_CHUNK: usize = 256;

/// Bytes received from the controller that have not been consumed as lines.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pops the next complete line without its `\n`.
    pub(crate) fn next_line(&mut self) -> Option<Vec<u8>> {
        let end = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=end).collect();
        line.pop();
        Some(line)
    }

    pub(crate) fn clear(&mut self) {
        self.buf.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Sends `command` and blocks until the controller acknowledges it.
///
/// On success the configured settle delay has also elapsed, giving the
/// microwave time to register the emulated key.
pub fn send_command<T: Transport>(session: &mut Session<T>, command: &Command) -> Result<()> {
    let config = session.config().clone();
    let (port, pending) = session.channel()?;

    let mut frame = Vec::with_capacity(command.text().len() + 1);
    frame.extend_from_slice(command.text().as_bytes());
    frame.push(b'\n');
    port.write_bytes(&frame)?;
    debug!(command = command.text(), "sent command");

    let deadline = Instant::now() + config.ack_timeout;
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        while let Some(raw) = pending.next_line() {
            // Line noise decodes to replacement characters and never matches an ack.
            let line = String::from_utf8_lossy(&raw);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if line.is_empty() {
                continue;
            }

            if line.starts_with(ERR_PREFIX) {
                warn!(command = command.text(), reply = line, "controller reported an error");
            }

            if command.ack_mode().is_terminator(line) {
                trace!(command = command.text(), reply = line, "command acknowledged");
                thread::sleep(config.settle_delay);
                return Ok(());
            }
            trace!(command = command.text(), reply = line, "intermediate reply");
        }

        let now = Instant::now();
        if now >= deadline {
            debug!(command = command.text(), "acknowledgment deadline passed");
            return Err(LinkError::Timeout {
                command: command.text().to_string(),
            });
        }

        match port.read_with_timeout(&mut chunk, deadline - now) {
            Ok(0) => {
                debug!(command = command.text(), "controller closed the line");
                return Err(LinkError::Transport(io::ErrorKind::UnexpectedEof.into()));
            }
            Ok(n) => pending.extend(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => return Err(LinkError::Transport(e)),
        }
    }
}

/// Sends `text` verbatim. The caller formats it, e.g. `"hold 1"`.
pub fn send_raw<T: Transport>(session: &mut Session<T>, text: &str) -> Result<()> {
    send_command(session, &Command::new(text))
}
