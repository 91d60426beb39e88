//! # Microwave Link Library
//!
//! This library drives the Arduino keypad controller wired into a microwave.
//! It sends one command line at a time over the serial port, waits for the
//! controller to acknowledge each keypress, and turns a cook time and power
//! level into the exact keypress sequence the microwave expects.
//!
//! ```no_run
//! use mw_link::{LinkConfig, Session};
//!
//! let mut session = Session::open("/dev/ttyUSB0", LinkConfig::default())?;
//! session.run("01:30", 50)?;
//! session.stop()?;
//! session.close()?;
//! # Ok::<(), mw_link::LinkError>(())
//! ```

pub mod command;
pub mod config;
mod drain;
pub mod encode;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod sequence;
pub mod session;
pub mod transport;

pub use command::{AckMode, Command};
pub use config::{DrainConfig, LinkConfig, LinkConfigBuilder};
pub use encode::{encode_power, parse_time, PowerSpec, TimeSpec};
pub use error::{describe_status, status_code, LinkError, Result};
pub use registry::{Handle, SessionTable};
pub use sequence::cook_sequence;
pub use session::Session;
pub use transport::{open_serial, Transport};
