/// END-TO-END SCENARIOS: a session driven frame by frame against a scripted
/// grid, from credential entry to READY and through every rollback path.

use std::time::Duration;

use grid_client::{
    Credentials, FetchFailedEvent, FetchKind, LoginError, LoginFailedEvent, ReadyEvent,
    SessionState, StateChangeEvent,
};
use grid_shared::ItemId;
use grid_test::{
    assert_path, run_until, states_visited, tick_and_exchange, Clock, TestGrid, FETCH_URL,
    LOGIN_URL,
};

use SessionState::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn credentials() -> Credentials {
    Credentials::new("Test Avatar", "correct horse")
}

#[test]
fn scenario_a_happy_path_reaches_ready() {
    init_logging();
    let mut grid = TestGrid::new();
    grid.install_defaults();
    let mut machine = grid.machine(grid.config());
    let mut clock = Clock::default();

    tick_and_exchange(&mut machine, &grid, &mut clock);
    assert_eq!(machine.current_state(), ShowCredentials);
    assert!(machine.submit_credentials(credentials()));

    assert!(run_until(&mut machine, &grid, &mut clock, 200, |m| {
        m.current_state() == Ready
    }));

    let mut events = machine.take_events();
    assert!(!events.has::<LoginFailedEvent>());
    assert!(!events.has::<FetchFailedEvent>());
    assert_eq!(events.read::<ReadyEvent>().count(), 1);
    assert_path(
        &states_visited(&mut events),
        &[
            Init,
            ShowCredentials,
            Authenticating,
            CircuitNegotiate,
            CircuitWait,
            CapabilityWait,
            BootstrapSend,
            BootstrapWait,
            Precache,
            Ready,
        ],
    );

    let grant = machine.grant().unwrap();
    assert_eq!(grant.agent_id(), grid.agent_id);
    assert_eq!(grant.circuit_code(), grid.circuit_code);
    assert_eq!(machine.status_text(), (1.0, String::new()));
    assert!(machine.last_error().is_none());
    assert_eq!(grid.circuit_claims().len(), 1);
    assert_eq!(machine.rejected_transitions(), 0);
}

#[test]
fn scenario_a_appearance_follows_skeleton_links() {
    init_logging();
    let mut grid = TestGrid::new();
    grid.install_defaults();
    let mut machine = grid.machine(grid.config());
    let mut clock = Clock::default();

    machine.tick(clock.now());
    machine.submit_credentials(credentials());
    assert!(run_until(&mut machine, &grid, &mut clock, 200, |m| {
        m.current_state() == Ready
    }));

    let fetches = grid.http.requests_to(FETCH_URL);
    assert_eq!(fetches.len(), 3);
    assert_eq!(TestGrid::fetched_keys(&fetches[0].body), grid.skeleton_keys());

    // Outfit seed 100 and the links from folder 1 (100, 101), deduplicated
    let appearance = TestGrid::fetched_keys(&fetches[2].body);
    assert_eq!(
        appearance,
        vec![
            grid.key(ItemId::from_u128(100)),
            grid.key(ItemId::from_u128(101))
        ]
    );
}

#[test]
fn scenario_b_rejected_credentials_roll_back_without_failover() {
    init_logging();
    let mut grid = TestGrid::new();
    grid.install_defaults();
    grid.http.route(LOGIN_URL, |_| {
        grid_client::transport::ResponseResult::Success(TestGrid::login_failure(
            "key",
            "Sorry! We couldn't log you in.",
        ))
    });
    let config =
        grid_client::ClientConfig::with_candidates([LOGIN_URL, grid_test::BACKUP_LOGIN_URL]);
    let remembered = credentials().with_remember(true);
    let mut machine = grid.machine_with_store(
        config,
        Box::new(grid_client::MemoryCredentialStore::with_credentials(remembered.clone())),
    );
    let mut clock = Clock::default();

    machine.tick(clock.now());
    machine.submit_credentials(remembered);
    assert!(run_until(&mut machine, &grid, &mut clock, 20, |m| {
        m.last_error().is_some()
    }));

    assert_eq!(machine.current_state(), ShowCredentials);
    assert_eq!(machine.last_error(), Some(&LoginError::CredentialsInvalid));
    assert_eq!(grid.http.count(LOGIN_URL), 1);
    assert_eq!(grid.http.count(grid_test::BACKUP_LOGIN_URL), 0);
    assert!(machine.grant().is_none());

    let stored = machine.credential_store().load().unwrap();
    assert_eq!(stored.username(), "Test Avatar");
    assert!(!stored.has_secret());

    let mut events = machine.take_events();
    assert_eq!(
        events.read::<LoginFailedEvent>().collect::<Vec<_>>(),
        vec![LoginError::CredentialsInvalid]
    );
    assert_path(
        &states_visited(&mut events),
        &[Init, ShowCredentials, Authenticating, ShowCredentials],
    );

    let (fraction, message) = machine.status_text();
    assert_eq!(fraction, 0.0);
    assert!(message.contains("password is incorrect"));
}

#[test]
fn scenario_c_unacknowledged_circuit_times_out() {
    init_logging();
    let mut grid = TestGrid::new();
    grid.ack_circuit = false;
    grid.install_defaults();
    let mut machine = grid.machine(grid.config());
    let mut clock = Clock::default();

    machine.tick(clock.now());
    machine.submit_credentials(credentials());

    let mut send_times = Vec::new();
    for _ in 0..400 {
        let now = clock.now();
        machine.tick(now);
        grid.serve_region();
        if grid.circuit_claims().len() > send_times.len() {
            send_times.push(now);
        }
        if machine.current_state() == ShowCredentials {
            break;
        }
        clock.step();
    }

    assert_eq!(machine.current_state(), ShowCredentials);
    assert_eq!(send_times.len(), 3);
    for pair in send_times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(5));
    }
    assert!(clock.now() - send_times[0] >= Duration::from_secs(15));

    match machine.last_error() {
        Some(LoginError::CircuitTimeout { address, attempts }) => {
            assert_eq!(*address, TestGrid::region_addr());
            assert_eq!(*attempts, 3);
        }
        other => panic!("expected circuit timeout, got {:?}", other),
    }
    assert!(machine.grant().is_none());
    assert!(machine.circuit().is_none());
}

#[test]
fn scenario_d_partial_skeleton_still_reaches_ready() {
    init_logging();
    let mut grid = TestGrid::new();
    grid.skeleton = (1..=10).map(ItemId::from_u128).collect();
    grid.install_defaults();
    let missing: Vec<_> = (8..=10).map(|id| grid.key(ItemId::from_u128(id))).collect();
    grid.withhold(missing.clone());

    let mut machine = grid.machine(grid.config());
    let mut clock = Clock::new(Duration::from_millis(500));

    machine.tick(clock.now());
    machine.submit_credentials(credentials());
    assert!(run_until(&mut machine, &grid, &mut clock, 400, |m| {
        m.current_state() == Ready
    }));

    let mut events = machine.take_events();
    let failures: Vec<_> = events.read::<FetchFailedEvent>().collect();
    assert_eq!(failures.len(), 1);
    let (kind, mut ids) = failures[0].clone();
    assert_eq!(kind, FetchKind::Skeleton);
    ids.sort();
    assert_eq!(ids, missing);

    assert_eq!(
        machine.bootstrap_failures(),
        &[LoginError::PartialBootstrapFailure {
            kind: FetchKind::Skeleton,
            count: 3
        }]
    );
    assert!(machine.last_error().is_none());

    let skeleton = machine
        .bootstrap()
        .and_then(|bootstrap| bootstrap.tracker(FetchKind::Skeleton))
        .unwrap();
    assert_eq!(skeleton.complete_count(), 7);
    assert_eq!(skeleton.failed_count(), 3);
    assert_eq!(skeleton.pending_count(), 0);
    assert!(clock.elapsed() >= Duration::from_secs(60));
    assert!(events.has::<ReadyEvent>());
}

#[test]
fn scenario_e_reset_during_circuit_wait_discards_session() {
    init_logging();
    let mut grid = TestGrid::new();
    grid.ack_circuit = false;
    grid.install_defaults();
    let mut machine = grid.machine(grid.config());
    let changes = machine.subscribe();
    let mut clock = Clock::default();

    machine.tick(clock.now());
    machine.submit_credentials(credentials());
    assert!(run_until(&mut machine, &grid, &mut clock, 20, |m| {
        m.current_state() == CircuitWait
    }));
    assert!(machine.grant().is_some());
    assert!(machine.circuit().is_some());

    machine.reset();

    assert_eq!(machine.current_state(), ShowCredentials);
    assert!(machine.grant().is_none());
    assert!(machine.circuit().is_none());
    assert!(machine.last_error().is_none());

    // Nothing happens until new credentials arrive
    grid.ack_circuit = true;
    for _ in 0..100 {
        tick_and_exchange(&mut machine, &grid, &mut clock);
    }
    assert_eq!(machine.current_state(), ShowCredentials);
    assert_eq!(grid.circuit_claims().len(), 1);

    let last = changes.try_iter().last().unwrap();
    assert_eq!(last.from, CircuitWait);
    assert_eq!(last.to, ShowCredentials);
    assert_eq!(machine.rejected_transitions(), 0);
}

#[test]
fn logout_sends_one_datagram_and_resets() {
    init_logging();
    let mut grid = TestGrid::new();
    grid.install_defaults();
    let mut machine = grid.machine(grid.config());
    let mut clock = Clock::default();

    machine.tick(clock.now());
    machine.submit_credentials(credentials());
    assert!(run_until(&mut machine, &grid, &mut clock, 200, |m| {
        m.current_state() == Ready
    }));
    assert_eq!(grid.logouts(), 0);

    machine.logout();

    assert_eq!(grid.logouts(), 1);
    assert_eq!(machine.current_state(), ShowCredentials);
    assert!(machine.grant().is_none());

    let mut events = machine.take_events();
    let last = events.read::<StateChangeEvent>().last().unwrap();
    assert_eq!((last.from, last.to), (Ready, ShowCredentials));
}

#[test]
fn logout_before_login_sends_nothing() {
    let mut grid = TestGrid::new();
    grid.install_defaults();
    let mut machine = grid.machine(grid.config());
    let mut clock = Clock::default();

    tick_and_exchange(&mut machine, &grid, &mut clock);
    machine.logout();

    assert_eq!(grid.logouts(), 0);
    assert_eq!(machine.current_state(), ShowCredentials);
}

#[test]
fn status_fraction_never_decreases_on_the_forward_path() {
    let mut grid = TestGrid::new();
    grid.install_defaults();
    let mut machine = grid.machine(grid.config());
    let mut clock = Clock::default();

    machine.tick(clock.now());
    machine.submit_credentials(credentials());

    let mut last = 0.0;
    for _ in 0..200 {
        tick_and_exchange(&mut machine, &grid, &mut clock);
        let (fraction, _) = machine.status_text();
        assert!(fraction >= last, "{} after {}", fraction, last);
        last = fraction;
        if machine.current_state() == Ready {
            break;
        }
    }
    assert_eq!(last, 1.0);
}
