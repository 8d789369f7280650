use std::time::{Duration, Instant};

use executor_protocol::ClientMessage;
use pretty_assertions::assert_eq;
use session_transport::{ConnectionState, ReconnectPolicy, TransportError, TransportOutput};

mod support;

use support::{lock_unpoisoned, Harness};

fn pump(harness: &mut Harness, now: Instant) -> Vec<TransportOutput> {
    harness
        .take_events()
        .into_iter()
        .filter_map(|event| harness.transport.handle_event(event, now))
        .collect()
}

fn quiet_liveness() -> ReconnectPolicy {
    ReconnectPolicy {
        liveness_interval: Duration::from_secs(3600),
        ..ReconnectPolicy::default()
    }
}

#[test]
fn open_connects_once_with_connection_id_in_url() {
    let mut harness = Harness::new();
    harness.transport.open(Instant::now()).expect("open");

    assert_eq!(harness.connects(), 1);
    assert_eq!(harness.transport.state(), ConnectionState::Connecting);
    assert_eq!(
        lock_unpoisoned(&harness.connector).urls,
        vec!["ws://127.0.0.1:8000/ws/terminal?connectionId=1700000000000".to_string()]
    );
}

#[test]
fn opened_event_marks_transport_open() {
    let mut harness = Harness::new();
    let now = Instant::now();
    harness.transport.open(now).expect("open");

    harness.latest_sink().opened();
    let outputs = pump(&mut harness, now);

    assert_eq!(outputs, vec![TransportOutput::StateChanged(ConnectionState::Open)]);
    assert!(harness.transport.is_open());
}

#[test]
fn reconnects_at_most_five_times_then_gives_up() {
    let policy = quiet_liveness();
    let mut harness = Harness::with_policy(policy);
    let mut now = Instant::now();
    harness.transport.open(now).expect("open");

    for attempt in 1..=5u32 {
        harness.latest_sink().closed("server went away");
        pump(&mut harness, now);
        assert!(harness.transport.reconnect_pending());
        assert!(!harness.transport.gave_up());
        assert_eq!(harness.transport.attempts(), attempt);

        harness.transport.poll_timers(now + policy.delay - Duration::from_millis(1));
        assert_eq!(harness.connects(), attempt as usize, "reconnect fired early");

        now += policy.delay;
        harness.transport.poll_timers(now);
        assert_eq!(harness.connects(), attempt as usize + 1);
    }

    harness.latest_sink().closed("server went away");
    pump(&mut harness, now);
    assert!(!harness.transport.reconnect_pending());
    assert_eq!(harness.transport.state(), ConnectionState::Disconnected);
    assert!(harness.transport.gave_up());

    harness.transport.poll_timers(now + Duration::from_secs(10 * 3600));
    assert_eq!(harness.connects(), 6);
}

#[test]
fn successful_open_resets_attempts() {
    let policy = quiet_liveness();
    let mut harness = Harness::with_policy(policy);
    let mut now = Instant::now();
    harness.transport.open(now).expect("open");

    harness.latest_sink().failed("reset by peer");
    harness.latest_sink().closed("reset by peer");
    pump(&mut harness, now);
    assert_eq!(harness.transport.attempts(), 1);

    now += policy.delay;
    harness.transport.poll_timers(now);
    harness.latest_sink().opened();
    pump(&mut harness, now);

    assert_eq!(harness.transport.attempts(), 0);
    assert!(!harness.transport.reconnect_pending());
}

#[test]
fn error_then_close_schedules_a_single_reconnect() {
    let mut harness = Harness::new();
    let now = Instant::now();
    harness.transport.open(now).expect("open");

    let sink = harness.latest_sink();
    sink.failed("boom");
    sink.closed("boom");
    let outputs = pump(&mut harness, now);

    assert_eq!(
        outputs,
        vec![TransportOutput::StateChanged(ConnectionState::Disconnected)]
    );
    assert_eq!(harness.transport.attempts(), 1);
}

#[test]
fn send_fails_fast_when_not_open() {
    let mut harness = Harness::new();
    harness.transport.open(Instant::now()).expect("open");

    let error = harness
        .transport
        .send(&ClientMessage::execute("print(1)"))
        .expect_err("connecting transport rejects sends");

    assert!(matches!(
        error,
        TransportError::NotConnected {
            state: ConnectionState::Connecting
        }
    ));
    assert!(lock_unpoisoned(&harness.connector).sent[0].is_empty());
}

#[test]
fn send_writes_encoded_message_when_open() {
    let mut harness = Harness::new();
    let now = Instant::now();
    harness.transport.open(now).expect("open");
    harness.latest_sink().opened();
    pump(&mut harness, now);

    harness
        .transport
        .send(&ClientMessage::input("4\r"))
        .expect("send input");

    assert_eq!(
        lock_unpoisoned(&harness.connector).sent[0],
        vec![r#"{"type":"input","input":"4\r"}"#.to_string()]
    );
}

#[test]
fn inbound_messages_are_returned_in_order() {
    let mut harness = Harness::new();
    let now = Instant::now();
    harness.transport.open(now).expect("open");
    let sink = harness.latest_sink();
    sink.opened();
    sink.message("first");
    sink.message("second");

    let outputs = pump(&mut harness, now);

    assert_eq!(
        outputs,
        vec![
            TransportOutput::StateChanged(ConnectionState::Open),
            TransportOutput::Inbound("first".to_string()),
            TransportOutput::Inbound("second".to_string()),
        ]
    );
}

#[test]
fn events_from_superseded_connection_are_ignored() {
    let policy = quiet_liveness();
    let mut harness = Harness::with_policy(policy);
    let mut now = Instant::now();
    harness.transport.open(now).expect("open");
    let stale = harness.latest_sink();

    stale.closed("lost");
    pump(&mut harness, now);
    now += policy.delay;
    harness.transport.poll_timers(now);
    assert_eq!(harness.connects(), 2);
    assert!(lock_unpoisoned(&harness.connector).closed[0]);

    stale.opened();
    stale.message("late output");
    let outputs = pump(&mut harness, now);

    assert!(outputs.is_empty());
    assert_eq!(harness.transport.state(), ConnectionState::Connecting);
}

#[test]
fn synchronous_connect_failure_schedules_reconnect() {
    let mut harness = Harness::new();
    lock_unpoisoned(&harness.connector).fail_connects = true;

    harness.transport.open(Instant::now()).expect("open");

    assert_eq!(harness.transport.state(), ConnectionState::Disconnected);
    assert!(harness.transport.reconnect_pending());
    assert_eq!(harness.transport.attempts(), 1);
}

#[test]
fn liveness_check_retries_a_stuck_connection() {
    let mut harness = Harness::new();
    let start = Instant::now();
    harness.transport.open(start).expect("open");
    let liveness = harness.transport.policy().liveness_interval;

    harness.transport.poll_timers(start + liveness);

    assert_eq!(harness.connects(), 2);
    assert!(lock_unpoisoned(&harness.connector).closed[0]);
    assert_eq!(harness.transport.next_deadline(), Some(start + liveness * 2));
}

#[test]
fn liveness_check_leaves_open_connection_alone() {
    let mut harness = Harness::new();
    let start = Instant::now();
    harness.transport.open(start).expect("open");
    harness.latest_sink().opened();
    pump(&mut harness, start);

    let liveness = harness.transport.policy().liveness_interval;
    harness.transport.poll_timers(start + liveness);
    harness.transport.poll_timers(start + liveness * 2);

    assert_eq!(harness.connects(), 1);
    assert!(harness.transport.is_open());
}

#[test]
fn next_deadline_prefers_the_earlier_timer() {
    let mut harness = Harness::new();
    let start = Instant::now();
    harness.transport.open(start).expect("open");
    assert_eq!(
        harness.transport.next_deadline(),
        Some(start + harness.transport.policy().liveness_interval)
    );

    harness.latest_sink().closed("lost");
    pump(&mut harness, start);

    assert_eq!(
        harness.transport.next_deadline(),
        Some(start + harness.transport.policy().delay)
    );
}

#[test]
fn close_cancels_timers_and_blocks_reconnects() {
    let mut harness = Harness::new();
    let now = Instant::now();
    harness.transport.open(now).expect("open");
    let sink = harness.latest_sink();
    sink.closed("lost");
    pump(&mut harness, now);
    assert!(harness.transport.reconnect_pending());

    harness.transport.close();

    assert_eq!(harness.transport.state(), ConnectionState::Closed);
    assert_eq!(harness.transport.next_deadline(), None);
    assert!(lock_unpoisoned(&harness.connector).closed[0]);

    harness.transport.poll_timers(now + Duration::from_secs(3600));
    harness.transport.connect(now + Duration::from_secs(3600));
    sink.opened();
    assert!(pump(&mut harness, now).is_empty());
    assert_eq!(harness.connects(), 1);
    assert!(matches!(
        harness.transport.open(now),
        Err(TransportError::Closed)
    ));
}

#[test]
fn dropping_transport_closes_connection() {
    let harness = Harness::new();
    let Harness {
        mut transport,
        connector,
        ..
    } = harness;
    transport.open(Instant::now()).expect("open");

    drop(transport);

    assert_eq!(lock_unpoisoned(&connector).closed, vec![true]);
}
