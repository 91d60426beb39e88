//! Command lines understood by the keypad controller and the acknowledgment
//! rule each one follows.

use std::fmt;

// Wire forms of the keys the sequencer presses.
pub const COOK_TIME: &str = "press cook_time";
pub const POWER: &str = "press power";
pub const STOP: &str = "press stop";
pub const STATUS: &str = "status";

/// Prefix of an error report from the controller. Reserved, never acted on.
pub const ERR_PREFIX: &str = "ERR:";

const OK: &str = "OK";
const STATUS_PREFIX: &str = "Status:";

/// How many acknowledgment lines a command waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    /// The first line starting with `OK` or `Status:` completes the command.
    Single,
    /// The controller answers `OK: pressing...` then a bare `OK` once the
    /// key is released. Only the bare `OK` completes the command.
    Double,
}

impl AckMode {
    /// Derives the mode from the command text alone.
    pub fn for_command(text: &str) -> Self {
        if text.starts_with("press") || text.starts_with("pulse") {
            AckMode::Double
        } else {
            AckMode::Single
        }
    }

    /// Whether `line` (already stripped of `\r`) ends the wait.
    pub fn is_terminator(self, line: &str) -> bool {
        match self {
            AckMode::Double => line == OK,
            AckMode::Single => line.starts_with(OK) || line.starts_with(STATUS_PREFIX),
        }
    }
}

/// One line of text sent to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    text: String,
    ack: AckMode,
}

impl Command {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let ack = AckMode::for_command(&text);
        Self { text, ack }
    }

    /// `press <token>`, e.g. a digit key.
    pub fn press(token: impl fmt::Display) -> Self {
        Self::new(format!("press {}", token))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn ack_mode(&self) -> AckMode {
        self.ack
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
