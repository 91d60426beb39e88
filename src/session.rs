//! An open link to one keypad controller.

use serialport::SerialPort;
use tracing::{debug, info};

use crate::command::STOP;
use crate::config::LinkConfig;
use crate::drain::drain_startup;
use crate::error::{LinkError, Result};
use crate::protocol::{self, LineBuffer};
use crate::sequence;
use crate::transport::{self, Transport};

/// Owns one transport for its lifetime.
///
/// A session is either open (it holds the transport) or closed. Every
/// operation on a closed session fails with [`LinkError::BadHandle`]. It is
/// not meant to be shared between threads without external serialization.
pub struct Session<T: Transport = Box<dyn SerialPort>> {
    port: Option<T>,
    // Replies read past the last acknowledgment.
    pending: LineBuffer,
    config: LinkConfig,
}

impl Session<Box<dyn SerialPort>> {
    /// Opens the serial port and clears the controller's boot banner.
    ///
    /// Blocks for the configured reset delay plus the startup drain.
    pub fn open(port_name: &str, config: LinkConfig) -> Result<Self> {
        let port = transport::open_serial(port_name, config.baud_rate)?;
        Ok(Self::start(port, config))
    }
}

impl<T: Transport> Session<T> {
    /// Wraps an already-open transport, running the startup drain first.
    pub fn start(mut port: T, config: LinkConfig) -> Self {
        let report = drain_startup(&mut port, &config.drain);
        debug!(
            bytes_discarded = report.bytes_discarded,
            end = ?report.end,
            "startup drain finished"
        );
        Self::attach(port, config)
    }

    /// Wraps an already-open transport whose line is known to be quiet.
    pub fn attach(port: T, config: LinkConfig) -> Self {
        Self {
            port: Some(port),
            pending: LineBuffer::default(),
            config,
        }
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn transport(&self) -> Option<&T> {
        self.port.as_ref()
    }

    /// Releases the transport. Closing twice is a `BadHandle`.
    pub fn close(&mut self) -> Result<()> {
        let port = self.port.take().ok_or(LinkError::BadHandle)?;
        if !self.pending.is_empty() {
            debug!("discarding unread controller output on close");
        }
        self.pending.clear();
        drop(port);
        info!("closed controller session");
        Ok(())
    }

    /// Sends one command line verbatim, e.g. `"press start"` or `"hold 1"`.
    pub fn send_raw(&mut self, command: &str) -> Result<()> {
        protocol::send_raw(self, command)
    }

    /// Keys in a cook time and power level. See [`sequence::run`].
    pub fn run(&mut self, time: &str, power_percent: u8) -> Result<()> {
        sequence::run(self, time, power_percent)
    }

    /// Presses the stop key.
    pub fn stop(&mut self) -> Result<()> {
        self.send_raw(STOP)
    }

    pub(crate) fn channel(&mut self) -> Result<(&mut T, &mut LineBuffer)> {
        match self.port.as_mut() {
            Some(port) => Ok((port, &mut self.pending)),
            None => Err(LinkError::BadHandle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::scripted::ScriptedTransport;
    use std::time::Duration;

    fn quick_config() -> LinkConfig {
        LinkConfig::builder()
            .ack_timeout(Duration::from_millis(100))
            .settle_delay(Duration::ZERO)
            .reset_delay(Duration::ZERO)
            .drain_max_total(Duration::from_millis(40))
            .drain_quiet_window(Duration::from_millis(10))
            .build()
    }

    #[test]
    fn start_drains_banner_before_first_command() {
        let mut port = ScriptedTransport::keypad();
        port.push_lines(&["Microwave keypad v1.2", "ready", "OK"]);
        let mut session = Session::start(port, quick_config());

        // A stray banner "OK" must not satisfy the first command.
        session.send_raw("press 1").unwrap();
        let written = session.transport().unwrap().written().to_vec();
        assert_eq!(written, b"\npress 1\n");
    }

    #[test]
    fn close_twice_is_bad_handle() {
        let mut session = Session::attach(ScriptedTransport::keypad(), quick_config());
        assert!(session.is_open());
        session.close().unwrap();
        assert!(!session.is_open());
        assert!(matches!(session.close(), Err(LinkError::BadHandle)));
    }

    #[test]
    fn operations_after_close_fail() {
        let mut session = Session::attach(ScriptedTransport::keypad(), quick_config());
        session.close().unwrap();
        assert!(matches!(session.stop(), Err(LinkError::BadHandle)));
        assert!(matches!(session.run("00:05", 100), Err(LinkError::BadHandle)));
    }

    #[test]
    fn repeated_stop_keeps_succeeding() {
        let mut session = Session::attach(ScriptedTransport::keypad(), quick_config());
        for _ in 0..3 {
            session.stop().unwrap();
        }
        assert_eq!(
            session.transport().unwrap().commands(),
            vec!["press stop", "press stop", "press stop"]
        );
    }

    #[test]
    fn open_missing_port_is_open_failure() {
        let err = Session::open("/dev/does-not-exist-mw", quick_config()).err().unwrap();
        assert!(matches!(err, LinkError::OpenFailure { ref port, .. } if port == "/dev/does-not-exist-mw"));
        assert_eq!(err.code(), crate::error::STATUS_OPEN_FAILURE);
    }
}
