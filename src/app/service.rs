//! Application service: the hexagonal core.
//!
//! [`AppService`] owns every piece of controller state: the sample history,
//! the speed machine, the cooldown ramp, the alarm detector, the manual
//! override and the deferred-action scheduler.  All I/O flows through port
//! traits injected at call sites, making the entire service testable with
//! mock adapters.
//!
//! ```text
//!  SensorPort ───▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                  │          AppService           │
//! ActuatorPort ◀── │  History · Fsm · Cooldown     │ ──▶ StoragePort
//!   HazardPort ◀── │  Alarm · Override · Scheduler │
//! DashboardPort ◀─ └──────────────────────────────┘
//! ```
//!
//! One poll runs the control cycle at most once, in this order:
//!
//! 1. manual override active: expiry check only
//! 2. alarm raise / clear (ends the cycle; an active alarm holds the fan)
//! 3. cooldown: interrupt check, then one ramp step
//! 4. lockout after the last change
//! 5. heat lost with the fan running: enter cooldown
//! 6. speed machine

use log::{debug, info, warn};

use crate::config::HoodConfig;
use crate::dashboard::{self, StatusInputs, StatusLabel, Trend};
use crate::drivers::relay::RelayDriver;
use crate::fsm::context::ControlContext;
use crate::fsm::cooldown::{Cooldown, CooldownState};
use crate::fsm::states::build_speed_table;
use crate::fsm::{FanSpeed, Fsm, Reason, SpeedChange, SpeedDecision, SpeedState};
use crate::manual::{ManualOverride, OverrideState};
use crate::persistence::{self, PersistedState, Restore};
use crate::safety::{AlarmDetector, AlarmState, AlarmTransition};
use crate::scheduler::{DeferredAction, Scheduler, TimerSlot};
use crate::sensors::acquisition::{Acquisition, ReadOutcome};
use crate::sensors::history::History;
use crate::sensors::signals::Signals;
use crate::sensors::RawReadings;

use super::commands::AppCommand;
use super::events::{AppEvent, StateSummary};
use super::ports::{ActuatorPort, DashboardPort, EventSink, HoodIo, SensorPort, StoragePort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: HoodConfig,
    history: History,
    acquisition: Acquisition,
    signals: Signals,
    fsm: Fsm,
    cooldown: Cooldown,
    alarm: AlarmDetector,
    manual: ManualOverride,
    scheduler: Scheduler,
    relay: RelayDriver,
    /// Completed polls, for the periodic summary.
    polls: u64,
}

impl AppService {
    /// Construct the service from configuration.  The fan starts Off.
    pub fn new(config: HoodConfig) -> Self {
        Self {
            history: History::new(config.timing.ema_alpha),
            acquisition: Acquisition::new(config.timing.poll_stuck_s),
            signals: Signals::default(),
            fsm: Fsm::new(build_speed_table()),
            cooldown: Cooldown::new(),
            alarm: AlarmDetector::new(),
            manual: ManualOverride::new(),
            scheduler: Scheduler::new(),
            relay: RelayDriver::new(config.devices.outputs),
            polls: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Reinstate override and cooldown from storage.  Returns `true` if a
    /// fresh blob was applied.
    pub fn restore(&mut self, storage: &impl StoragePort, now_ms: u64) -> bool {
        let max_age_s = self.config.persistence.max_restore_age_s;
        match persistence::load(storage, now_ms, max_age_s) {
            Restore::Fresh(saved) => {
                self.manual.restore(saved.override_state());
                if let Some(cd) = saved.cooldown_state() {
                    self.cooldown.restore(cd);
                }
                true
            }
            Restore::Stale | Restore::Corrupt | Restore::Missing => false,
        }
    }

    /// Publish the initial dashboard state.
    pub fn start(&self, restored: bool, io: &mut impl DashboardPort, sink: &mut impl EventSink) {
        io.set_speed(self.fsm.speed());
        io.set_status(self.status_label());
        sink.emit(&AppEvent::Started { restored });
        info!(
            "AppService started (override={}, cooldown={})",
            self.manual.is_active(),
            self.cooldown.is_active()
        );
    }

    // ── Acquisition ───────────────────────────────────────────

    /// Run one poll: read the four channels in order and, if all succeed,
    /// run the control cycle.  Returns `true` if the cycle ran.
    pub fn poll(&mut self, now_ms: u64, io: &mut impl HoodIo, sink: &mut impl EventSink) -> bool {
        let Some(mut ticket) = self.acquisition.begin(now_ms) else {
            return false;
        };
        loop {
            let reply = SensorPort::read(io, ticket.channel());
            match self.acquisition.complete(ticket, reply) {
                ReadOutcome::Next(next) => ticket = next,
                ReadOutcome::Complete(raw) => {
                    self.on_readings(&raw, now_ms, io, sink);
                    return true;
                }
                ReadOutcome::Aborted(err) => {
                    sink.emit(&AppEvent::PollAborted(err));
                    return false;
                }
                ReadOutcome::Stale => return false,
            }
        }
    }

    /// Feed one complete set of raw readings through the engine.
    pub fn on_readings(
        &mut self,
        raw: &RawReadings,
        now_ms: u64,
        io: &mut impl HoodIo,
        sink: &mut impl EventSink,
    ) {
        self.history.record(raw, now_ms);
        self.signals = Signals::compute(&self.history, &self.config);
        let s = &self.signals;
        debug!(
            "[POLL] Tdiff={:.2} RHdiff={:.2} Tslope={:.2} RHslope={:.2} long={:.2}/{:.2} n={}",
            s.temp_diff, s.rh_diff, s.temp_slope, s.rh_slope, s.temp_slope_long, s.rh_slope_long, s.samples
        );

        self.scheduler.schedule(
            DeferredAction::DashboardRefresh(Trend::from(&self.signals)),
            now_ms,
            self.config.timing.dashboard_delay_ms,
        );

        self.control_cycle(now_ms, io, sink);

        self.polls += 1;
        let every = u64::from(self.config.dashboard.summary_every_polls.max(1));
        if self.polls % every == 0 {
            sink.emit(&AppEvent::Summary(self.summary(now_ms)));
        }
    }

    // ── Control cycle ─────────────────────────────────────────

    fn control_cycle(&mut self, now_ms: u64, io: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        if self.manual.is_active() {
            if self.manual.check_expiry(now_ms, self.config.manual.timeout_min) {
                sink.emit(&AppEvent::OverrideExpired);
                self.schedule_save(now_ms);
                self.schedule_status(now_ms, false);
            }
            return;
        }

        let speed = *self.fsm.state();
        let hazard_delay = self.config.timing.hazard_delay_ms;
        match self.alarm.evaluate(now_ms, &speed, &self.signals, &self.config) {
            Some(AlarmTransition::Raised { kind, decision }) => {
                sink.emit(&AppEvent::AlarmRaised(kind));
                self.apply_decision(decision, now_ms, io, sink);
                self.scheduler
                    .schedule(DeferredAction::HazardSwitch(true), now_ms, hazard_delay);
                return;
            }
            Some(AlarmTransition::Cleared { cause, decision }) => {
                sink.emit(&AppEvent::AlarmCleared(cause));
                self.apply_decision(decision, now_ms, io, sink);
                self.scheduler
                    .schedule(DeferredAction::HazardSwitch(false), now_ms, hazard_delay);
                return;
            }
            None if self.alarm.is_active() => return,
            None => {}
        }

        if self.cooldown.is_active() {
            if self.cooldown.check_interrupt(&self.signals, &self.config) {
                sink.emit(&AppEvent::CooldownInterrupted);
                self.schedule_save(now_ms);
                return;
            }
            if let Some(decision) = self.cooldown.step(now_ms, &speed, &self.signals, &self.config) {
                self.apply_decision(decision, now_ms, io, sink);
            }
            if !self.cooldown.is_active() {
                self.schedule_save(now_ms);
            }
            return;
        }

        if self.fsm.in_lockout(now_ms, self.config.thresholds.lockout_s) {
            return;
        }

        let ctx = ControlContext::new(now_ms, self.signals, speed, &self.config);
        if speed.level.is_on() && !ctx.heat_present() {
            let decision = self.cooldown.begin(now_ms, &self.signals, &self.config);
            if let Some(cd) = self.cooldown.state() {
                sink.emit(&AppEvent::CooldownStarted(cd.kind));
            }
            self.apply_decision(decision, now_ms, io, sink);
            self.schedule_save(now_ms);
            return;
        }

        if let Some(decision) = self.fsm.tick(&ctx) {
            self.apply_decision(decision, now_ms, io, sink);
        }
    }

    /// Single path from a decision to the outside world: state change,
    /// relay sequence, dashboard sync.
    fn apply_decision(
        &mut self,
        decision: SpeedDecision,
        now_ms: u64,
        io: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Option<SpeedChange> {
        self.scheduler.cancel(TimerSlot::TurnOffSequence);
        let change = self.fsm.apply(decision, now_ms)?;

        if let Err(e) = self
            .relay
            .drive(&change, io, &mut self.scheduler, now_ms, &self.config.timing)
        {
            warn!("[RELAY] {e}");
        }
        self.schedule_status(now_ms, change.reason != Reason::ManualSlider);
        sink.emit(&AppEvent::SpeedChanged {
            from: change.from,
            to: change.to,
            reason: change.reason,
        });
        Some(change)
    }

    fn schedule_save(&mut self, now_ms: u64) {
        self.scheduler.schedule(
            DeferredAction::SaveState,
            now_ms,
            self.config.timing.save_debounce_ms,
        );
    }

    fn schedule_status(&mut self, now_ms: u64, sync_slider: bool) {
        self.scheduler.schedule(
            DeferredAction::StatusSync {
                speed: self.fsm.speed(),
                sync_slider,
            },
            now_ms,
            self.config.timing.status_delay_ms,
        );
    }

    // ── Commands ──────────────────────────────────────────────

    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        io: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::SelectSpeed(level) => {
                let Some(decision) = self.manual.select(level, self.fsm.speed(), now_ms) else {
                    return;
                };
                if self.cooldown.is_active() {
                    info!("[MANUAL] Cancelling cooldown");
                    self.cooldown.cancel();
                }
                self.apply_decision(decision, now_ms, io, sink);
                self.schedule_save(now_ms);
            }
            AppCommand::UpdateConfig(config) => {
                if let Err(e) = config.validate() {
                    warn!("Config update rejected: {e}");
                    return;
                }
                self.config = *config;
                self.history.set_alpha(self.config.timing.ema_alpha);
                if !self.acquisition.is_busy() {
                    self.acquisition = Acquisition::new(self.config.timing.poll_stuck_s);
                }
                self.relay.set_lines(self.config.devices.outputs);
                info!("Config updated");
            }
        }
    }

    // ── Deferred actions ──────────────────────────────────────

    /// Fire every scheduler action due at `now_ms`.
    pub fn run_timers(
        &mut self,
        now_ms: u64,
        io: &mut impl HoodIo,
        storage: &mut impl StoragePort,
    ) {
        for action in self.scheduler.take_due(now_ms) {
            match action {
                DeferredAction::SaveState => {
                    let state = self.persisted_state();
                    if let Err(e) = persistence::save(storage, &state) {
                        warn!("[PERSIST] Save failed: {e}");
                    }
                }
                DeferredAction::TurnOffPulse => {
                    if let Err(e) = self.relay.second_pulse(io) {
                        warn!("[RELAY] {e}");
                    }
                }
                DeferredAction::LightOn => {
                    if let Err(e) = self.relay.light_on(io) {
                        warn!("[RELAY] {e}");
                    }
                }
                DeferredAction::StatusSync { speed, sync_slider } => {
                    io.set_status(self.status_label());
                    if sync_slider {
                        io.set_speed(speed);
                    }
                }
                DeferredAction::DashboardRefresh(trend) => {
                    io.set_visual(&dashboard::visual_line(&trend));
                    io.set_verbose(&dashboard::verbose_line(&trend));
                    io.set_status(self.status_label());
                }
                DeferredAction::HazardSwitch(on) => {
                    if let Err(e) = io.set_switch(self.config.devices.spare_switch, on) {
                        warn!("[ALARM] Hazard switch: {e}");
                    }
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status_label(&self) -> StatusLabel {
        let inputs = StatusInputs {
            fan_on: self.fsm.speed().is_on(),
            alarm: self.alarm.is_active(),
            manual: self.manual.is_active(),
            cooldown: self.cooldown.is_active(),
            heating_slope: self.signals.heating_slope,
        };
        dashboard::status_label(&inputs, self.config.dashboard.heating_slope_c_pm)
    }

    pub fn summary(&self, now_ms: u64) -> StateSummary {
        StateSummary {
            speed: self.fsm.speed(),
            cooldown: self.cooldown.state().and_then(|cd| {
                self.cooldown
                    .remaining_estimate_s(now_ms, &self.config)
                    .map(|rem| (cd.kind, rem))
            }),
            manual: self.manual.is_active(),
        }
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState::capture(self.manual.state(), self.cooldown.state())
    }

    pub fn speed(&self) -> FanSpeed {
        self.fsm.speed()
    }

    pub fn speed_state(&self) -> &SpeedState {
        self.fsm.state()
    }

    pub fn transitions(&self) -> u32 {
        self.fsm.transitions()
    }

    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn alarm_state(&self) -> &AlarmState {
        self.alarm.state()
    }

    pub fn cooldown_state(&self) -> Option<CooldownState> {
        self.cooldown.state()
    }

    pub fn override_state(&self) -> OverrideState {
        self.manual.state()
    }

    pub fn is_pending(&self, slot: TimerSlot) -> bool {
        self.scheduler.is_pending(slot)
    }

    /// Earliest pending deferred action.
    pub fn next_due(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    pub fn config(&self) -> &HoodConfig {
        &self.config
    }
}
