//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one log
//! line.  A dashboard push or MQTT adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::{AppEvent, StateSummary};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { restored } => {
                info!("START | restored={}", restored);
            }
            AppEvent::SpeedChanged { from, to, reason } => {
                info!("SPEED | {} -> {} ({})", from.label(), to.label(), reason);
            }
            AppEvent::AlarmRaised(kind) => {
                warn!("ALARM | raised: {}", kind);
            }
            AppEvent::AlarmCleared(cause) => {
                info!("ALARM | cleared ({})", cause);
            }
            AppEvent::CooldownStarted(kind) => {
                info!("COOLDOWN | started ({})", kind);
            }
            AppEvent::CooldownInterrupted => {
                info!("COOLDOWN | interrupted by new activity");
            }
            AppEvent::OverrideExpired => {
                info!("MANUAL | override expired");
            }
            AppEvent::PollAborted(err) => {
                warn!("POLL | aborted: {}", err);
            }
            AppEvent::Summary(s) => {
                info!("{}", summary_line(s));
            }
        }
    }
}

/// `[STATE] Standby. Monitoring...` or
/// `[STATE] Spd: Med | CD: heavy (~270s) | MANUAL`
pub fn summary_line(s: &StateSummary) -> String {
    if s.is_standby() {
        return "[STATE] Standby. Monitoring...".to_string();
    }
    let mut line = format!("[STATE] Spd: {}", s.speed.label());
    if let Some((kind, rem)) = s.cooldown {
        line.push_str(&format!(" | CD: {kind}"));
        if rem > 0 {
            line.push_str(&format!(" (~{rem}s)"));
        }
    }
    if s.manual {
        line.push_str(" | MANUAL");
    }
    line
}
