//! Online reporting: the full actuation table driven through the runtime.
//!
//! Every row of the response-code contract is exercised end to end:
//! temperature becomes ready, the report goes out, and the directive (or
//! failure) lands on the relay or tips the mode back to provisioning.

use crate::mock_hw::Bench;

use kosi::actuator::SwitchPort;
use kosi::report::TransportError;
use kosi::runtime::{Mode, Runtime};

/// Boot a bench straight into ONLINE mode.
fn start_online(bench: &mut Bench) -> Runtime {
    bench.seed_credentials("HomeNet", "password1");
    let runtime = Runtime::start(&mut bench.hw());
    assert_eq!(runtime.mode(), Mode::Online);
    runtime
}

/// Run one full temperature cycle: window opens, conversion completes,
/// report is sent.
fn run_report_cycle(bench: &mut Bench, runtime: &mut Runtime, window_start: u32) {
    bench.clock.set(window_start);
    runtime.tick(&mut bench.hw());
    bench.clock.set(window_start + 750);
    runtime.tick(&mut bench.hw());
}

#[test]
fn status_200_turns_relay_off_and_stays_online() {
    let mut bench = Bench::new();
    let mut runtime = start_online(&mut bench);

    bench.relay.set(true);
    bench.transport.respond(Ok(200));
    run_report_cycle(&mut bench, &mut runtime, 10_000);

    assert_eq!(runtime.mode(), Mode::Online);
    assert!(!bench.relay.on);
}

#[test]
fn status_201_turns_relay_on_and_stays_online() {
    let mut bench = Bench::new();
    bench.probe.temp_c = 16.5;
    let mut runtime = start_online(&mut bench);

    bench.transport.respond(Ok(201));
    run_report_cycle(&mut bench, &mut runtime, 10_000);

    assert_eq!(runtime.mode(), Mode::Online);
    assert!(bench.relay.on);
}

#[test]
fn status_205_disconnects_to_provisioning() {
    let mut bench = Bench::new();
    let mut runtime = start_online(&mut bench);

    bench.transport.respond(Ok(205));
    run_report_cycle(&mut bench, &mut runtime, 10_000);

    assert_eq!(runtime.mode(), Mode::Offline);
    assert!(bench.radio.ap_active);
    assert!(bench.portal.is_running());
}

#[test]
fn unrecognised_status_is_a_link_failure() {
    let mut bench = Bench::new();
    let mut runtime = start_online(&mut bench);

    bench.transport.respond(Ok(404));
    run_report_cycle(&mut bench, &mut runtime, 10_000);

    assert_eq!(runtime.mode(), Mode::Offline);
    assert!(bench.radio.ap_active);
}

#[test]
fn transport_failure_restarts_access_point() {
    let mut bench = Bench::new();
    let mut runtime = start_online(&mut bench);
    let ap_starts_before = bench.radio.enter_provisioning_calls;

    bench.transport.respond(Err(TransportError::Unreachable));
    run_report_cycle(&mut bench, &mut runtime, 10_000);

    assert_eq!(runtime.mode(), Mode::Offline);
    assert_eq!(bench.radio.enter_provisioning_calls, ap_starts_before + 1);
    assert!(bench.portal.is_running());
}

#[test]
fn report_posts_json_to_configured_endpoint() {
    let mut bench = Bench::new();
    bench.probe.temp_c = 18.5;
    let mut runtime = start_online(&mut bench);

    bench.transport.respond(Ok(200));
    run_report_cycle(&mut bench, &mut runtime, 10_000);

    assert_eq!(bench.transport.posts.len(), 1);
    let (url, body) = &bench.transport.posts[0];
    assert_eq!(url, kosi::config::DEFAULT_REPORT_URL);
    assert_eq!(body, r#"{"temp":18.5}"#);
}

#[test]
fn indicator_marks_the_exchange() {
    let mut bench = Bench::new();
    let mut runtime = start_online(&mut bench);

    bench.transport.respond(Ok(200));
    run_report_cycle(&mut bench, &mut runtime, 10_000);

    // Indicator went active for the call and inactive right after.
    let n = bench.indicator.history.len();
    assert!(n >= 2);
    assert_eq!(&bench.indicator.history[n - 2..], &[true, false]);
}

#[test]
fn no_report_without_a_ready_temperature() {
    let mut bench = Bench::new();
    let mut runtime = start_online(&mut bench);

    // Window opens but the conversion has not finished yet.
    bench.clock.set(10_000);
    runtime.tick(&mut bench.hw());
    bench.clock.set(10_400);
    runtime.tick(&mut bench.hw());

    assert!(bench.transport.posts.is_empty());
    assert_eq!(runtime.mode(), Mode::Online);
}

#[test]
fn reporting_continues_across_cycles() {
    let mut bench = Bench::new();
    let mut runtime = start_online(&mut bench);

    bench.transport.respond(Ok(200));
    bench.transport.respond(Ok(201));
    run_report_cycle(&mut bench, &mut runtime, 10_000);
    run_report_cycle(&mut bench, &mut runtime, 20_750);

    assert_eq!(bench.transport.posts.len(), 2);
    assert_eq!(runtime.mode(), Mode::Online);
    assert!(bench.relay.on);
}
