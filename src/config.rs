//! Serial and timing parameters for a controller session.

use std::time::Duration;

/// Bounds for the startup drain run right after a port is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainConfig {
    // Pause while the board reboots after DTR toggles on open.
    pub reset_delay: Duration,
    // The drain never runs longer than this, however chatty the board is.
    pub max_total: Duration,
    // The drain ends once the line has been silent this long.
    pub quiet_window: Duration,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            reset_delay: Duration::from_secs(2),
            max_total: Duration::from_millis(400),
            quiet_window: Duration::from_millis(120),
        }
    }
}

/// Configuration for a link to the keypad controller.
///
/// Line parameters other than the baud rate are fixed at 8 data bits, no
/// parity and one stop bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub baud_rate: u32,
    // Longest wait for a command's terminating acknowledgment.
    pub ack_timeout: Duration,
    // Pause after each acknowledged command so the microwave registers the key.
    pub settle_delay: Duration,
    pub drain: DrainConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            ack_timeout: Duration::from_secs(5),
            settle_delay: Duration::from_millis(150),
            drain: DrainConfig::default(),
        }
    }
}

impl LinkConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> LinkConfigBuilder {
        LinkConfigBuilder::default()
    }
}

/// Builder for LinkConfig.
#[derive(Debug, Clone, Default)]
pub struct LinkConfigBuilder {
    config: LinkConfig,
}

impl LinkConfigBuilder {
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.config.baud_rate = baud_rate;
        self
    }

    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.config.ack_timeout = timeout;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    pub fn reset_delay(mut self, delay: Duration) -> Self {
        self.config.drain.reset_delay = delay;
        self
    }

    pub fn drain_max_total(mut self, max_total: Duration) -> Self {
        self.config.drain.max_total = max_total;
        self
    }

    pub fn drain_quiet_window(mut self, quiet_window: Duration) -> Self {
        self.config.drain.quiet_window = quiet_window;
        self
    }

    pub fn build(self) -> LinkConfig {
        self.config
    }
}
