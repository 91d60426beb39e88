//! Keypress sequences for a timed cook.

use tracing::{debug, info};

use crate::command::{Command, COOK_TIME, POWER};
use crate::encode::{PowerSpec, TimeSpec};
use crate::error::Result;
use crate::protocol::send_command;
use crate::session::Session;
use crate::transport::Transport;

/// The commands that key in `time` at `power_percent`, in order.
///
/// `press cook_time`, one `press <digit>` per time digit, then `press power`
/// once per step below full power. Fails only on a malformed time.
pub fn cook_sequence(time: &str, power_percent: u8) -> Result<Vec<Command>> {
    let time = TimeSpec::parse(time)?;
    let power = PowerSpec::new(power_percent);

    let mut commands = vec![Command::new(COOK_TIME)];
    commands.extend(time.digits().chars().map(Command::press));
    commands.extend((0..power.presses()).map(|_| Command::new(POWER)));
    Ok(commands)
}

/// Keys in a cook on the controller.
///
/// Stops at the first command that fails and returns its error; keys already
/// pressed are not undone. The microwave must be idle beforehand, since no
/// clearing keypress is sent.
pub fn run<T: Transport>(session: &mut Session<T>, time: &str, power_percent: u8) -> Result<()> {
    let commands = cook_sequence(time, power_percent)?;
    info!(time, power_percent, steps = commands.len(), "starting cook sequence");

    for (step, command) in commands.iter().enumerate() {
        send_command(session, command).map_err(|e| {
            debug!(step, command = command.text(), error = %e, "cook sequence aborted");
            e
        })?;
    }
    Ok(())
}
