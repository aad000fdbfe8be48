//! Integration tests for the AppService → relay / dashboard / storage
//! pipeline.
//!
//! These verify command dispatch, the deferred relay sequences, the poll
//! chain and state persistence against the mock hood.

use super::mock_hw::{Fault, HoodCall, MockHood, RecordingSink};

use hoodfan::adapters::nvs::NvsAdapter;
use hoodfan::app::commands::AppCommand;
use hoodfan::app::events::AppEvent;
use hoodfan::app::ports::StoragePort;
use hoodfan::app::service::AppService;
use hoodfan::config::{HoodConfig, OutputLines};
use hoodfan::dashboard::StatusLabel;
use hoodfan::error::SensorError;
use hoodfan::fsm::cooldown::{CooldownKind, CooldownState};
use hoodfan::fsm::{FanSpeed, Reason};
use hoodfan::manual::OverrideState;
use hoodfan::persistence::{self, PersistedState, STATE_KEY, STATE_NAMESPACE};
use hoodfan::scheduler::TimerSlot;
use hoodfan::sensors::Channel;

/// 2024-06-10 06:13:20 UTC, on a whole second.
const T0: u64 = 1_718_000_000_000;

fn make_app() -> (AppService, MockHood, RecordingSink) {
    let app = AppService::new(HoodConfig::default());
    let mut hood = MockHood::new();
    let mut sink = RecordingSink::new();
    app.start(false, &mut hood, &mut sink);
    hood.clear_calls();
    sink.events.clear();
    (app, hood, sink)
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_publishes_slider_and_status() {
    let app = AppService::new(HoodConfig::default());
    let mut hood = MockHood::new();
    let mut sink = RecordingSink::new();
    app.start(false, &mut hood, &mut sink);

    assert_eq!(
        hood.calls,
        vec![HoodCall::Slider(FanSpeed::Off), HoodCall::Status(StatusLabel::Ready)]
    );
    assert_eq!(sink.events, vec![AppEvent::Started { restored: false }]);
}

// ── Manual selection → relay ──────────────────────────────────

#[test]
fn select_speed_presses_line_and_lights_after_delay() {
    let (mut app, mut hood, mut sink) = make_app();
    let mut nvs = NvsAdapter::new();

    app.handle_command(AppCommand::SelectSpeed(3), T0, &mut hood, &mut sink);
    assert_eq!(app.speed(), FanSpeed::High);
    assert_eq!(hood.relay_calls(), vec![HoodCall::Press(2)]);
    assert!(app.override_state().active);
    assert!(sink.contains(&AppEvent::SpeedChanged {
        from: FanSpeed::Off,
        to: FanSpeed::High,
        reason: Reason::ManualSlider,
    }));

    app.run_timers(T0 + 599, &mut hood, &mut nvs);
    assert_eq!(hood.relay_calls(), vec![HoodCall::Press(2)]);

    app.run_timers(T0 + 600, &mut hood, &mut nvs);
    assert_eq!(
        hood.relay_calls(),
        vec![HoodCall::Press(2), HoodCall::Light(true)]
    );
}

#[test]
fn manual_change_does_not_echo_slider() {
    let (mut app, mut hood, mut sink) = make_app();
    let mut nvs = NvsAdapter::new();

    app.handle_command(AppCommand::SelectSpeed(2), T0, &mut hood, &mut sink);
    app.run_timers(T0 + 5_000, &mut hood, &mut nvs);

    assert_eq!(hood.last_status(), Some(StatusLabel::Manual));
    assert_eq!(hood.last_slider(), None, "slider already shows the user's choice");
}

#[test]
fn selecting_current_speed_is_ignored() {
    let (mut app, mut hood, mut sink) = make_app();
    app.handle_command(AppCommand::SelectSpeed(2), T0, &mut hood, &mut sink);
    let events = sink.events.len();

    app.handle_command(AppCommand::SelectSpeed(2), T0 + 1_000, &mut hood, &mut sink);
    assert_eq!(sink.events.len(), events);
    assert_eq!(hood.presses(), vec![1]);
    assert_eq!(app.transitions(), 1);
}

#[test]
fn stop_while_off_sends_nothing() {
    let (mut app, mut hood, mut sink) = make_app();
    app.handle_command(AppCommand::SelectSpeed(0), T0, &mut hood, &mut sink);
    assert!(sink.events.is_empty());
    assert!(hood.relay_calls().is_empty());
    assert_eq!(app.speed(), FanSpeed::Off);
    assert_eq!(app.transitions(), 0);
}

#[test]
fn out_of_range_selection_clamps_to_turbo() {
    let (mut app, mut hood, mut sink) = make_app();
    app.handle_command(AppCommand::SelectSpeed(9), T0, &mut hood, &mut sink);
    assert_eq!(app.speed(), FanSpeed::Turbo);
    assert_eq!(hood.presses(), vec![3]);
}

// ── Off sequences ─────────────────────────────────────────────

#[test]
fn off_from_high_double_pulses() {
    let (mut app, mut hood, mut sink) = make_app();
    let mut nvs = NvsAdapter::new();

    app.handle_command(AppCommand::SelectSpeed(3), T0, &mut hood, &mut sink);
    app.run_timers(T0 + 1_000, &mut hood, &mut nvs);

    let stop_at = T0 + 10_000;
    app.handle_command(AppCommand::SelectSpeed(0), stop_at, &mut hood, &mut sink);
    assert_eq!(app.speed(), FanSpeed::Off);
    assert!(!app.override_state().active);
    assert!(app.is_pending(TimerSlot::TurnOffSequence));

    app.run_timers(stop_at + 1_499, &mut hood, &mut nvs);
    assert_eq!(hood.presses(), vec![2, 0]);

    app.run_timers(stop_at + 1_500, &mut hood, &mut nvs);
    assert_eq!(
        hood.relay_calls(),
        vec![
            HoodCall::Press(2),
            HoodCall::Light(true),
            HoodCall::Press(0),
            HoodCall::Press(0),
            HoodCall::Light(false),
        ]
    );
    assert!(sink.contains(&AppEvent::SpeedChanged {
        from: FanSpeed::High,
        to: FanSpeed::Off,
        reason: Reason::ManualStop,
    }));
}

#[test]
fn off_from_low_single_pulse() {
    let (mut app, mut hood, mut sink) = make_app();
    let mut nvs = NvsAdapter::new();

    app.handle_command(AppCommand::SelectSpeed(1), T0, &mut hood, &mut sink);
    app.run_timers(T0 + 1_000, &mut hood, &mut nvs);
    app.handle_command(AppCommand::SelectSpeed(0), T0 + 5_000, &mut hood, &mut sink);

    assert!(!app.is_pending(TimerSlot::TurnOffSequence));
    assert_eq!(
        hood.relay_calls(),
        vec![
            HoodCall::Press(0),
            HoodCall::Light(true),
            HoodCall::Press(0),
            HoodCall::Light(false),
        ]
    );
}

#[test]
fn new_speed_cancels_pending_second_pulse() {
    let (mut app, mut hood, mut sink) = make_app();
    let mut nvs = NvsAdapter::new();

    app.handle_command(AppCommand::SelectSpeed(4), T0, &mut hood, &mut sink);
    app.handle_command(AppCommand::SelectSpeed(0), T0 + 2_000, &mut hood, &mut sink);
    app.handle_command(AppCommand::SelectSpeed(2), T0 + 2_500, &mut hood, &mut sink);
    app.run_timers(T0 + 10_000, &mut hood, &mut nvs);

    assert_eq!(hood.presses(), vec![3, 0, 1]);
    assert_eq!(app.speed(), FanSpeed::Med);
}

#[test]
fn stop_before_light_on_cancels_light() {
    let (mut app, mut hood, mut sink) = make_app();
    let mut nvs = NvsAdapter::new();

    app.handle_command(AppCommand::SelectSpeed(1), T0, &mut hood, &mut sink);
    app.handle_command(AppCommand::SelectSpeed(0), T0 + 200, &mut hood, &mut sink);
    app.run_timers(T0 + 5_000, &mut hood, &mut nvs);

    assert!(!hood.relay_calls().contains(&HoodCall::Light(true)));
}

// ── Config updates ────────────────────────────────────────────

#[test]
fn update_config_remaps_output_lines() {
    let (mut app, mut hood, mut sink) = make_app();
    let mut cfg = HoodConfig::default();
    cfg.devices.outputs = OutputLines {
        s1: 4,
        s2: 5,
        s3: 6,
        s4: 7,
    };
    app.handle_command(AppCommand::UpdateConfig(Box::new(cfg)), T0, &mut hood, &mut sink);
    app.handle_command(AppCommand::SelectSpeed(2), T0, &mut hood, &mut sink);

    assert_eq!(hood.presses(), vec![5]);
    assert_eq!(app.config().devices.outputs.s1, 4);
}

#[test]
fn invalid_config_update_is_rejected() {
    let (mut app, mut hood, mut sink) = make_app();
    let mut cfg = HoodConfig::default();
    cfg.timing.ema_alpha = 0.0;
    cfg.thresholds.lockout_s = 10;
    app.handle_command(AppCommand::UpdateConfig(Box::new(cfg)), T0, &mut hood, &mut sink);

    assert_eq!(app.config(), &HoodConfig::default());
    assert!(hood.calls.is_empty());
}

// ── Poll chain ────────────────────────────────────────────────

#[test]
fn poll_reads_channels_in_order() {
    let (mut app, mut hood, mut sink) = make_app();
    assert!(app.poll(T0, &mut hood, &mut sink));
    assert_eq!(hood.reads, Channel::ORDER.to_vec());
    assert_eq!(app.history().len(), 1);
}

#[test]
fn sensor_error_aborts_poll() {
    let (mut app, mut hood, mut sink) = make_app();
    hood.fault = Some((Channel::RoomTemp, Fault::Unreachable));

    assert!(!app.poll(T0, &mut hood, &mut sink));
    assert_eq!(
        hood.reads,
        vec![Channel::HoodTemp, Channel::HoodHumidity, Channel::RoomTemp]
    );
    assert_eq!(
        sink.events,
        vec![AppEvent::PollAborted(SensorError::Unreachable(Channel::RoomTemp))]
    );
    assert!(app.history().is_empty());
    assert!(hood.relay_calls().is_empty());

    hood.fault = None;
    assert!(app.poll(T0 + 30_000, &mut hood, &mut sink));
    assert_eq!(app.history().len(), 1);
}

#[test]
fn empty_and_nan_readings_abort_poll() {
    let (mut app, mut hood, mut sink) = make_app();

    hood.fault = Some((Channel::HoodHumidity, Fault::Empty));
    assert!(!app.poll(T0, &mut hood, &mut sink));
    hood.fault = Some((Channel::RoomHumidity, Fault::NotANumber));
    assert!(!app.poll(T0 + 30_000, &mut hood, &mut sink));

    assert_eq!(
        sink.events,
        vec![
            AppEvent::PollAborted(SensorError::Missing(Channel::HoodHumidity)),
            AppEvent::PollAborted(SensorError::NonFinite(Channel::RoomHumidity)),
        ]
    );
    assert!(app.history().is_empty());
}

#[test]
fn poll_schedules_dashboard_refresh() {
    let (mut app, mut hood, mut sink) = make_app();
    let mut nvs = NvsAdapter::new();
    hood.set_hood(26.26, 44.0);

    app.poll(T0, &mut hood, &mut sink);
    assert!(app.is_pending(TimerSlot::DashboardRefresh));
    app.run_timers(T0 + 100, &mut hood, &mut nvs);

    assert!(hood.calls.contains(&HoodCall::Verbose("T:4.3/0.0 H:-1.0/0.0".into())));
    assert!(hood.calls.contains(&HoodCall::Status(StatusLabel::Ready)));
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn manual_selection_is_saved_after_debounce() {
    let (mut app, mut hood, mut sink) = make_app();
    let mut nvs = NvsAdapter::new();

    app.handle_command(AppCommand::SelectSpeed(2), T0, &mut hood, &mut sink);
    app.run_timers(T0 + 1_999, &mut hood, &mut nvs);
    assert!(!nvs.exists(STATE_NAMESPACE, STATE_KEY));

    app.run_timers(T0 + 2_000, &mut hood, &mut nvs);
    let mut buf = [0u8; 256];
    let len = nvs.read(STATE_NAMESPACE, STATE_KEY, &mut buf).unwrap();
    let saved = PersistedState::decode(&buf[..len]).unwrap();
    assert!(saved.override_active);
    assert_eq!(saved.override_start_s, Some(T0 / 1000));
    assert!(!saved.cooldown_active);
}

#[test]
fn restart_restores_fresh_override() {
    let (mut app, mut hood, mut sink) = make_app();
    let mut nvs = NvsAdapter::new();
    app.handle_command(AppCommand::SelectSpeed(3), T0, &mut hood, &mut sink);
    app.run_timers(T0 + 5_000, &mut hood, &mut nvs);

    let mut rebooted = AppService::new(HoodConfig::default());
    assert!(rebooted.restore(&nvs, T0 + 600_000));
    assert_eq!(
        rebooted.override_state(),
        OverrideState {
            active: true,
            start_ms: Some(T0),
        }
    );

    let mut hood2 = MockHood::new();
    let mut sink2 = RecordingSink::new();
    rebooted.start(true, &mut hood2, &mut sink2);
    assert_eq!(sink2.events, vec![AppEvent::Started { restored: true }]);
}

#[test]
fn restart_ignores_stale_override() {
    let (mut app, mut hood, mut sink) = make_app();
    let mut nvs = NvsAdapter::new();
    app.handle_command(AppCommand::SelectSpeed(3), T0, &mut hood, &mut sink);
    app.run_timers(T0 + 5_000, &mut hood, &mut nvs);

    let mut rebooted = AppService::new(HoodConfig::default());
    assert!(!rebooted.restore(&nvs, T0 + 3_600_000));
    assert_eq!(rebooted.override_state(), OverrideState::default());
}

#[test]
fn restart_restores_cooldown() {
    let mut nvs = NvsAdapter::new();
    let stored = PersistedState {
        override_active: false,
        override_start_s: Some(T0 / 1000),
        cooldown_active: true,
        cooldown_start_s: Some(T0 / 1000 + 30),
        cooldown_kind: Some(CooldownKind::Heavy),
    };
    persistence::save(&mut nvs, &stored).unwrap();

    let mut app = AppService::new(HoodConfig::default());
    assert!(app.restore(&nvs, T0 + 60_000));
    assert_eq!(
        app.cooldown_state(),
        Some(CooldownState {
            start_ms: T0 + 30_000,
            kind: CooldownKind::Heavy,
        })
    );
    assert!(!app.override_state().active);
}

#[test]
fn corrupt_blob_starts_clean() {
    let mut nvs = NvsAdapter::new();
    nvs.write(STATE_NAMESPACE, STATE_KEY, b"{\"ovr\":tru").unwrap();

    let mut app = AppService::new(HoodConfig::default());
    assert!(!app.restore(&nvs, T0));
    assert_eq!(app.override_state(), OverrideState::default());
    assert_eq!(app.cooldown_state(), None);
}
