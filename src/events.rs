//! Main-loop input channel.
//!
//! Manual selections arrive from outside the control task (a console
//! thread on the host, the slider's status handler on a device).  They are
//! queued in a static bounded channel and consumed by the input task, which
//! hands them to the service as [`AppCommand`]s.
//!
//! ```text
//! ┌─────────────┐  push_input  ┌──────────────┐  recv_input  ┌──────────────┐
//! │ stdin / UI  │─────────────▶│ INPUT_CHANNEL│─────────────▶│  input task  │
//! └─────────────┘              └──────────────┘              └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::app::commands::AppCommand;

/// Maximum number of pending inputs.
const INPUT_DEPTH: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(AppCommand),
    /// Stop the control tasks.
    Quit,
}

pub static INPUT_CHANNEL: Channel<CriticalSectionRawMutex, Input, INPUT_DEPTH> = Channel::new();

/// Queue an input.  Returns `false` if the channel is full (input dropped).
pub fn push_input(input: Input) -> bool {
    INPUT_CHANNEL.try_send(input).is_ok()
}

/// Wait for the next input.
pub async fn recv_input() -> Input {
    INPUT_CHANNEL.receive().await
}

/// Non-blocking receive.
pub fn try_recv_input() -> Option<Input> {
    INPUT_CHANNEL.try_receive().ok()
}

/// Parse one console line: a speed `0`–`4` or `q` to quit.
pub fn parse_line(line: &str) -> Option<Input> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Some(Input::Quit);
    }
    line.parse::<u8>()
        .ok()
        .map(|level| Input::Command(AppCommand::SelectSpeed(level)))
}
