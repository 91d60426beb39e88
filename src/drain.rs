//! Startup drain.
//!
//! Opening the port resets the Arduino, which then prints a banner and may
//! leave a partial token in its line parser. Before the first command we wait
//! for the reset, throw away whatever the board prints, and send a bare
//! newline so the parser starts from a clean line.
//!
//! The drain is bounded by two deadlines: a hard cap measured from the start
//! of the drain and an idle window measured from the last received byte.
//! It never fails; a noisy or silent board only changes how long it takes.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::DrainConfig;
use crate::transport::Transport;

const DRAIN_CHUNK: usize = 256;

/// Why a drain stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DrainEnd {
    HardCap,
    Quiet,
    TransportError,
}

/// The two drain deadlines as a plain state machine over instants.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DrainWindow {
    hard_deadline: Instant,
    last_data: Instant,
    quiet_window: Duration,
}

impl DrainWindow {
    pub(crate) fn new(now: Instant, config: &DrainConfig) -> Self {
        Self {
            hard_deadline: now + config.max_total,
            last_data: now,
            quiet_window: config.quiet_window,
        }
    }

    pub(crate) fn record_data(&mut self, now: Instant) {
        self.last_data = now;
    }

    /// How long the next read may wait, or why the drain is over.
    pub(crate) fn poll(&self, now: Instant) -> Result<Duration, DrainEnd> {
        let idle_deadline = self.last_data + self.quiet_window;
        if now >= self.hard_deadline {
            return Err(DrainEnd::HardCap);
        }
        if now >= idle_deadline {
            return Err(DrainEnd::Quiet);
        }
        Ok((self.hard_deadline - now).min(idle_deadline - now))
    }
}

/// Summary of one drain, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DrainReport {
    pub(crate) bytes_discarded: usize,
    pub(crate) end: DrainEnd,
}

/// Waits out the board reset, discards boot output and writes a bare newline.
pub(crate) fn drain_startup<T: Transport>(port: &mut T, config: &DrainConfig) -> DrainReport {
    thread::sleep(config.reset_delay);

    let mut window = DrainWindow::new(Instant::now(), config);
    let mut buf = [0u8; DRAIN_CHUNK];
    let mut bytes_discarded = 0;

    let end = loop {
        let wait = match window.poll(Instant::now()) {
            Ok(wait) => wait,
            Err(end) => break end,
        };
        match port.read_with_timeout(&mut buf, wait) {
            Ok(0) => {
                debug!("startup drain stopped at end of stream");
                break DrainEnd::TransportError;
            }
            Ok(n) => {
                bytes_discarded += n;
                window.record_data(Instant::now());
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => {
                debug!(error = %e, "startup drain stopped on read error");
                break DrainEnd::TransportError;
            }
        }
    };

    // Finalizes any partial token in the board's parser.
    if let Err(e) = port.write_bytes(b"\n") {
        debug!(error = %e, "could not write drain newline");
    }

    DrainReport {
        bytes_discarded,
        end,
    }
}
