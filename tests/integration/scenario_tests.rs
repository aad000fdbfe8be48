//! End-to-end cooking scenarios.
//!
//! Each test drives the service with a poll every 30 s of simulated time
//! and asserts on the speed changes, relay presses and events that come
//! out.  Smoothing is disabled (`ema_alpha = 1.0`) so the slopes follow
//! the raw readings exactly.

use super::mock_hw::{HoodCall, MockHood, RecordingSink};

use hoodfan::adapters::nvs::NvsAdapter;
use hoodfan::app::commands::AppCommand;
use hoodfan::app::events::AppEvent;
use hoodfan::app::ports::StoragePort;
use hoodfan::app::service::AppService;
use hoodfan::config::HoodConfig;
use hoodfan::dashboard::StatusLabel;
use hoodfan::fsm::cooldown::CooldownKind;
use hoodfan::fsm::{FanSpeed, Reason};
use hoodfan::persistence::{PersistedState, STATE_KEY, STATE_NAMESPACE};
use hoodfan::safety::{AlarmKind, ClearCause};
use hoodfan::scheduler::TimerSlot;

const T0: u64 = 1_718_000_000_000;
const SAMPLE_MS: u64 = 30_000;

struct Kitchen {
    app: AppService,
    hood: MockHood,
    nvs: NvsAdapter,
    sink: RecordingSink,
    now: u64,
}

impl Kitchen {
    fn new() -> Self {
        let mut cfg = HoodConfig::default();
        cfg.timing.ema_alpha = 1.0;
        Self {
            app: AppService::new(cfg),
            hood: MockHood::new(),
            nvs: NvsAdapter::new(),
            sink: RecordingSink::new(),
            now: T0,
        }
    }

    /// Poll number `k` (at `T0 + k × 30 s`) with the given hood readings.
    /// Deferred actions are left pending.
    fn poll_at(&mut self, k: u64, temp: f32, rh: f32) -> bool {
        self.now = T0 + k * SAMPLE_MS;
        self.hood.set_hood(temp, rh);
        self.app.poll(self.now, &mut self.hood, &mut self.sink)
    }

    /// Poll, then let every deferred action fire before the next poll.
    fn step(&mut self, k: u64, temp: f32, rh: f32) {
        assert!(self.poll_at(k, temp, rh), "poll {k} did not complete");
        self.run_timers(5_000);
    }

    fn run_timers(&mut self, after_ms: u64) {
        self.app
            .run_timers(self.now + after_ms, &mut self.hood, &mut self.nvs);
    }

    fn select(&mut self, level: u8) {
        self.app.handle_command(
            AppCommand::SelectSpeed(level),
            self.now,
            &mut self.hood,
            &mut self.sink,
        );
    }

    fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.sink.events.iter().filter(|e| pred(*e)).count()
    }

    fn saved_state(&self) -> PersistedState {
        let mut buf = [0u8; 256];
        let len = self.nvs.read(STATE_NAMESPACE, STATE_KEY, &mut buf).unwrap();
        PersistedState::decode(&buf[..len]).unwrap()
    }
}

fn changed(from: FanSpeed, to: FanSpeed, reason: Reason) -> AppEvent {
    AppEvent::SpeedChanged { from, to, reason }
}

// ── Cooking start & upshift ───────────────────────────────────

#[test]
fn rising_hood_starts_low_then_med_with_lockout() {
    let mut k = Kitchen::new();
    let temp = |i: u64| 22.3 + 0.4 * i as f32;

    k.step(0, temp(0), 46.0);
    assert_eq!(k.app.speed(), FanSpeed::Off);

    k.step(1, temp(1), 46.0);
    assert_eq!(k.app.speed(), FanSpeed::Low);
    assert_eq!(k.hood.presses(), vec![0]);
    assert!(k.hood.relay_calls().contains(&HoodCall::Light(true)));
    assert_eq!(k.hood.last_slider(), Some(FanSpeed::Low));
    assert_eq!(k.hood.last_status(), Some(StatusLabel::Heating));

    // Still rising fast, but inside the 90 s lockout.
    k.step(2, temp(2), 46.0);
    k.step(3, temp(3), 46.0);
    assert_eq!(k.app.speed(), FanSpeed::Low);
    assert_eq!(k.app.transitions(), 1);

    k.step(4, temp(4), 46.0);
    assert_eq!(k.app.speed(), FanSpeed::Med);

    k.step(5, temp(5), 46.0);
    k.step(6, temp(6), 46.0);
    assert_eq!(k.app.transitions(), 2, "no change inside the new lockout");

    let speed_events: Vec<AppEvent> = k.sink.speed_changes().into_iter().cloned().collect();
    assert_eq!(
        speed_events,
        vec![
            changed(FanSpeed::Off, FanSpeed::Low, Reason::OnTempSlope),
            changed(FanSpeed::Low, FanSpeed::Med, Reason::UpLowToMed),
        ]
    );
    assert_eq!(k.hood.presses(), vec![0, 1]);
}

// ── Hazard alarm ──────────────────────────────────────────────

#[test]
fn forgotten_boil_goes_turbo_and_flips_hazard_switch() {
    let mut k = Kitchen::new();
    let temp = |i: u64| 22.3 + 1.0 * i as f32;
    let rh = |i: u64| 46.0 - 0.5 * i as f32;

    for i in 0..8 {
        k.step(i, temp(i), rh(i));
    }
    assert_eq!(k.app.speed(), FanSpeed::Med);
    assert!(!k.app.alarm_state().is_active());

    assert!(k.poll_at(8, temp(8), rh(8)));
    assert!(k.sink.contains(&AppEvent::AlarmRaised(AlarmKind::ForgottenBoil)));
    assert!(k.sink.contains(&changed(
        FanSpeed::Med,
        FanSpeed::Turbo,
        Reason::AlarmForgottenBoil
    )));
    assert_eq!(k.hood.presses().last(), Some(&3));
    assert!(k.app.is_pending(TimerSlot::HazardNotify));

    k.run_timers(1_499);
    assert!(k.hood.switch_calls().is_empty());
    k.run_timers(1_500);
    assert_eq!(k.hood.switch_calls(), vec![(0, true)]);
    assert_eq!(k.hood.last_status(), Some(StatusLabel::Alarm));

    // Still drying out: the alarm holds the fan.
    k.step(9, temp(9), rh(9));
    assert_eq!(k.app.speed(), FanSpeed::Turbo);
    assert!(k.app.alarm_state().is_active());

    // Humidity back at the room level clears it.
    k.step(10, temp(10), 45.0);
    assert!(k.sink.contains(&AppEvent::AlarmCleared(ClearCause::HumidityRecovering)));
    assert_eq!(k.app.speed(), FanSpeed::High);
    assert_eq!(k.hood.switch_calls(), vec![(0, true), (0, false)]);
    assert!(k.app.alarm_state().last_cleared_ms.is_some());

    // Boil-like readings again, inside the re-arm delay.
    k.step(11, temp(11), 40.0);
    assert_eq!(
        k.count(|e| matches!(e, AppEvent::AlarmRaised(_))),
        1,
        "re-arm delay blocks a second alarm"
    );
}

// ── Manual override ───────────────────────────────────────────

#[test]
fn manual_override_ignores_alarm_until_expiry() {
    let mut k = Kitchen::new();
    let temp = |i: u64| 30.0 + 0.5 * i as f32;
    let rh = |i: u64| 45.0 - 0.5 * i as f32;

    k.select(3);
    assert_eq!(k.app.speed(), FanSpeed::High);
    assert_eq!(k.hood.presses(), vec![2]);

    for i in 1..10 {
        k.step(i, temp(i), rh(i));
    }
    assert_eq!(k.app.speed(), FanSpeed::High);
    assert_eq!(k.app.transitions(), 1);
    assert!(k.app.override_state().active);
    assert_eq!(k.count(|e| matches!(e, AppEvent::AlarmRaised(_))), 0);

    // Five minutes after the selection: the override ends, nothing else.
    k.step(10, temp(10), rh(10));
    assert!(k.sink.contains(&AppEvent::OverrideExpired));
    assert!(!k.app.override_state().active);
    assert_eq!(k.app.speed(), FanSpeed::High);

    // Automatic control is back, and the first thing it sees is a boil.
    k.step(11, temp(11), rh(11));
    assert!(k.sink.contains(&AppEvent::AlarmRaised(AlarmKind::ForgottenBoil)));
    assert_eq!(k.app.speed(), FanSpeed::Turbo);
}

#[test]
fn manual_selection_cancels_cooldown() {
    let mut k = Kitchen::new();
    k.step(0, 22.3, 50.0);
    for i in 1..=5 {
        k.step(i, 22.7, 50.0);
    }
    assert!(k.app.cooldown_state().is_some());

    k.select(4);
    assert_eq!(k.app.cooldown_state(), None);
    assert_eq!(k.app.speed(), FanSpeed::Turbo);
    assert!(k.app.override_state().active);
}

// ── Cooldown ──────────────────────────────────────────────────

/// Fan starts on a short rise; the hood then holds 0.7 °C / 5 % above
/// the room, which is too humid for the Low exit.
fn warm_humid_plateau(k: &mut Kitchen, polls: std::ops::RangeInclusive<u64>) {
    for i in polls {
        let temp = if i == 0 { 22.3 } else { 22.7 };
        k.step(i, temp, 50.0);
    }
}

#[test]
fn heat_loss_enters_heavy_cooldown_and_hits_hard_cap() {
    let mut k = Kitchen::new();

    warm_humid_plateau(&mut k, 0..=4);
    assert_eq!(k.app.speed(), FanSpeed::Low);
    assert_eq!(k.app.cooldown_state(), None);

    warm_humid_plateau(&mut k, 5..=5);
    assert!(k.sink.contains(&AppEvent::CooldownStarted(CooldownKind::Heavy)));
    assert_eq!(k.app.speed(), FanSpeed::Med);
    let saved = k.saved_state();
    assert!(saved.cooldown_active);
    assert_eq!(saved.cooldown_kind, Some(CooldownKind::Heavy));
    assert_eq!(saved.cooldown_start_s, Some(T0 / 1000 + 150));
    assert_eq!(k.hood.last_status(), Some(StatusLabel::Venting));

    // Med is held for med_hold_s (180 s), then Low.
    warm_humid_plateau(&mut k, 6..=10);
    assert_eq!(k.app.speed(), FanSpeed::Med);
    warm_humid_plateau(&mut k, 11..=11);
    assert_eq!(k.app.speed(), FanSpeed::Low);

    // Low never settles; the 20 minute cap ends it.
    warm_humid_plateau(&mut k, 12..=44);
    assert_eq!(k.app.speed(), FanSpeed::Low);
    assert!(k.app.cooldown_state().is_some());

    warm_humid_plateau(&mut k, 45..=45);
    assert_eq!(k.app.speed(), FanSpeed::Off);
    assert_eq!(k.app.cooldown_state(), None);
    assert!(!k.saved_state().cooldown_active);

    let speed_events: Vec<AppEvent> = k.sink.speed_changes().into_iter().cloned().collect();
    assert_eq!(
        speed_events,
        vec![
            changed(FanSpeed::Off, FanSpeed::Low, Reason::OnTempSlope),
            changed(FanSpeed::Low, FanSpeed::Med, Reason::CooldownHeavy),
            changed(FanSpeed::Med, FanSpeed::Low, Reason::CooldownDropLow),
            changed(FanSpeed::Low, FanSpeed::Off, Reason::CooldownHardCap),
        ]
    );
    assert_eq!(k.hood.presses(), vec![0, 1, 0, 0]);
    assert_eq!(k.hood.relay_calls().last(), Some(&HoodCall::Light(false)));
}

#[test]
fn renewed_cooking_interrupts_cooldown() {
    let mut k = Kitchen::new();
    warm_humid_plateau(&mut k, 0..=6);
    assert!(k.app.cooldown_state().is_some());

    k.step(7, 25.0, 50.0);
    assert!(k.sink.contains(&AppEvent::CooldownInterrupted));
    assert_eq!(k.app.cooldown_state(), None);
    assert_eq!(k.app.speed(), FanSpeed::Med);
    assert!(!k.saved_state().cooldown_active);
}
