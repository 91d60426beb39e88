//! Encoders from user-facing cook settings to keypad input.

use crate::error::{LinkError, Result};

/// A validated `MM:SS` cook time.
///
/// Minutes keep the width the caller typed, so `"01:30"` is keyed as four
/// digits and `"1:30"` as three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSpec {
    minutes: String,
    seconds: String,
}

impl TimeSpec {
    pub fn parse(text: &str) -> Result<Self> {
        let (minutes, seconds) = match text.find(':') {
            Some(pos) if pos > 0 && pos + 1 < text.len() => (&text[..pos], &text[pos + 1..]),
            _ => return Err(LinkError::bad_time(text)),
        };

        if seconds.len() != 2 || !is_number(minutes) || !is_number(seconds) {
            return Err(LinkError::bad_time(text));
        }

        // Digits alone would accept an arbitrarily long minutes field.
        minutes
            .parse::<u32>()
            .map_err(|_| LinkError::bad_time(text))?;

        let secs: u8 = seconds.parse().map_err(|_| LinkError::bad_time(text))?;
        if secs > 59 {
            return Err(LinkError::bad_time(text));
        }

        Ok(Self {
            minutes: minutes.to_string(),
            seconds: seconds.to_string(),
        })
    }

    /// The digit keys to press, in order.
    pub fn digits(&self) -> String {
        format!("{}{}", self.minutes, self.seconds)
    }
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parses `MM:SS` into the digit string keyed on the microwave.
pub fn parse_time(text: &str) -> Result<String> {
    TimeSpec::parse(text).map(|spec| spec.digits())
}

/// A power level in tens of percent.
///
/// Anything other than 10, 20, ... 100 is treated as 100%. This is a silent
/// normalization, not an error: callers rely on "invalid means full power".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerSpec(u8);

impl PowerSpec {
    pub fn new(percent: u8) -> Self {
        if (10..=100).contains(&percent) && percent % 10 == 0 {
            PowerSpec(percent)
        } else {
            PowerSpec(100)
        }
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// Presses of the power key needed after the time is entered.
    ///
    /// Full power is the microwave's default and needs none. Below that the
    /// count is `(100 - percent) / 10 + 1`, so 90% takes two and 10% takes ten.
    pub fn presses(self) -> usize {
        match self.0 {
            100 => 0,
            p => usize::from((100 - p) / 10 + 1),
        }
    }
}

/// Number of `press power` commands for `percent`. Invalid input yields 0.
pub fn encode_power(percent: u8) -> usize {
    PowerSpec::new(percent).presses()
}
