/// CAPABILITY GRANT AND BOOTSTRAP: polling without a cap, fetch routing,
/// batching, and the skeleton-before-appearance ordering.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use grid_client::{
    transport::{HttpClient, ResponseReceiver, ResponseResult},
    BootstrapCoordinator, CapabilityWaiter, Credentials, FetchKind, GrantStatus, SessionState,
};
use grid_shared::{ItemId, ItemKey};
use grid_test::{run_until, Clock, LocalHttp, TestGrid, FETCH_URL, SEED_URL};

use SessionState::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn drive_to(grid: &mut TestGrid, state: SessionState) -> (grid_client::SessionStateMachine, Clock) {
    let config = grid.config();
    let mut machine = grid.machine(config);
    let mut clock = Clock::default();
    machine.tick(clock.now());
    machine.submit_credentials(Credentials::new("Test Avatar", "secret"));
    assert!(run_until(&mut machine, grid, &mut clock, 50, |m| {
        m.current_state() == state
    }));
    (machine, clock)
}

#[test]
fn capability_polls_every_interval_until_granted() {
    init_logging();
    let mut grid = TestGrid::new();
    grid.install_defaults();
    grid.http.script(
        SEED_URL,
        vec![
            ResponseResult::Waiting,
            ResponseResult::TransportFailure("timed out".to_string()),
            ResponseResult::Success(TestGrid::capability_grant()),
        ],
    );
    let (mut machine, mut clock) = drive_to(&mut grid, CapabilityWait);

    machine.tick(clock.now());
    assert_eq!(grid.http.count(SEED_URL), 1);
    assert_eq!(
        machine.status_text().1,
        "Requesting region capabilities".to_string()
    );

    // An unanswered request is not a failure, the waiter just asks again
    machine.tick(clock.advance(Duration::from_secs(9)));
    assert_eq!(grid.http.count(SEED_URL), 1);
    machine.tick(clock.advance(Duration::from_secs(1)));
    assert_eq!(grid.http.count(SEED_URL), 2);
    assert_eq!(
        machine.status_text().1,
        "Retrying region capability request (attempt 2)".to_string()
    );

    machine.tick(clock.advance(Duration::from_secs(10)));
    assert_eq!(grid.http.count(SEED_URL), 3);
    assert_eq!(machine.current_state(), CapabilityWait);

    machine.tick(clock.step());
    assert_eq!(machine.current_state(), BootstrapSend);
    assert_eq!(machine.capabilities().unwrap().fetch_url(), FETCH_URL);
}

#[test]
fn capability_polling_has_no_attempt_cap() {
    init_logging();
    let mut grid = TestGrid::new();
    grid.install_defaults();
    grid.http
        .route(SEED_URL, |_| ResponseResult::ErrorResponseCode(502));
    let (mut machine, mut clock) = drive_to(&mut grid, CapabilityWait);

    for _ in 0..40 {
        machine.tick(clock.now());
        clock.advance(Duration::from_secs(10));
    }

    assert_eq!(machine.current_state(), CapabilityWait);
    assert_eq!(grid.http.count(SEED_URL), 40);
    assert_eq!(machine.capabilities().unwrap().attempt(), 40);
    assert!(machine.last_error().is_none());
}

#[test]
fn fetches_fall_back_to_seed_url() {
    init_logging();
    let mut grid = TestGrid::new();
    grid.install_defaults();
    grid.http.route(SEED_URL, |body| {
        let request: serde_json::Value = serde_json::from_slice(body).unwrap();
        if request.get("items").is_some() {
            ResponseResult::Success(br#"{"records": []}"#.to_vec())
        } else {
            ResponseResult::Success(br#"{"EventQueueGet": "https://region.grid.test/eq"}"#.to_vec())
        }
    });
    let (machine, _) = drive_to(&mut grid, BootstrapWait);

    assert_eq!(machine.capabilities().unwrap().fetch_url(), SEED_URL);
    assert_eq!(grid.http.count(FETCH_URL), 0);
    let fetches = grid
        .http
        .requests_to(SEED_URL)
        .into_iter()
        .filter(|request| request.json().get("items").is_some())
        .count();
    assert_eq!(fetches, 2);
}

#[test]
fn fetches_are_batched() {
    init_logging();
    let mut grid = TestGrid::new();
    grid.skeleton = (1..=5).map(ItemId::from_u128).collect();
    grid.install_defaults();
    let mut config = grid.config();
    config.fetch_batch_size = 2;
    let mut machine = grid.machine(config);
    let mut clock = Clock::default();

    machine.tick(clock.now());
    machine.submit_credentials(Credentials::new("Test Avatar", "secret"));
    assert!(run_until(&mut machine, &grid, &mut clock, 200, |m| {
        m.current_state() == Ready
    }));

    let sizes: Vec<usize> = grid
        .http
        .requests_to(FETCH_URL)
        .iter()
        .map(|request| TestGrid::fetched_keys(&request.body).len())
        .collect();
    // Skeleton in three batches, contacts in one, appearance in one
    assert_eq!(sizes, vec![2, 2, 1, 2, 2]);
}

#[test]
fn appearance_is_never_fetched_before_skeleton_is_done() {
    init_logging();
    let grid = TestGrid::new();
    let manifest = grid.manifest();
    let skeleton = manifest.skeleton.clone();
    let appearance: Vec<ItemKey> = manifest.appearance.clone();

    // The skeleton service never answers
    let http = LocalHttp::new();
    http.route(FETCH_URL, move |body| {
        if TestGrid::fetched_keys(body).iter().any(|key| skeleton.contains(key)) {
            ResponseResult::Waiting
        } else {
            ResponseResult::Success(br#"{"records": []}"#.to_vec())
        }
    });

    let mut client = http.clone();
    let mut clock = Clock::new(Duration::from_secs(1));
    let mut coordinator = BootstrapCoordinator::start(
        &manifest,
        FETCH_URL,
        50,
        Duration::from_secs(60),
        &mut client,
        &clock.now(),
    );

    let mut dropped = Vec::new();
    for _ in 0..59 {
        dropped.extend(coordinator.poll(&mut client, &clock.step()));
        assert!(!coordinator.appearance_issued());
        let asked_for_appearance = http.requests().iter().any(|request| {
            TestGrid::fetched_keys(&request.body)
                .iter()
                .any(|key| appearance.contains(key))
        });
        assert!(!asked_for_appearance);
    }

    dropped.extend(coordinator.poll(&mut client, &clock.step()));
    assert!(coordinator.appearance_issued());
    assert!(dropped
        .iter()
        .any(|(kind, ids)| *kind == FetchKind::Skeleton && ids.len() == grid.skeleton.len()));
    // Contacts were answered with no records, so they time out too
    assert!(dropped.iter().any(|(kind, _)| *kind == FetchKind::Contacts));
}

#[test]
fn grant_status_is_display_only() {
    let http = LocalHttp::new();
    http.route(SEED_URL, |_| ResponseResult::Waiting);
    let mut client = http.clone();
    let mut clock = Clock::new(Duration::from_secs(10));
    let mut waiter = grid_client::CapabilityWaiter::new(
        SEED_URL,
        grid_shared::SessionId::from_u128(7),
        vec!["EventQueueGet".to_string()],
        Duration::from_secs(10),
        &clock.now(),
    );

    assert_eq!(waiter.poll_grant(&mut client, &clock.now()), GrantStatus::Pending);
    for attempt in 2..=20 {
        assert_eq!(
            waiter.poll_grant(&mut client, &clock.step()),
            GrantStatus::Retrying(attempt)
        );
    }
    assert_eq!(http.count(SEED_URL), 20);
}

/// A seed capability that answers every request a fixed time after it was
/// posted, read off a clock the test advances
struct SlowSeed {
    now: Arc<Mutex<Instant>>,
    delay: Duration,
    posts: usize,
}

struct DelayedGrant {
    now: Arc<Mutex<Instant>>,
    ready_at: Instant,
}

impl ResponseReceiver for DelayedGrant {
    fn receive(&mut self) -> ResponseResult {
        if *self.now.lock().unwrap() >= self.ready_at {
            ResponseResult::Success(TestGrid::capability_grant())
        } else {
            ResponseResult::Waiting
        }
    }
}

impl HttpClient for SlowSeed {
    fn post(&mut self, _: &str, _: Vec<u8>, _: &str) -> Box<dyn ResponseReceiver> {
        self.posts += 1;
        let posted = *self.now.lock().unwrap();
        Box::new(DelayedGrant {
            now: self.now.clone(),
            ready_at: posted + self.delay,
        })
    }
}

#[test]
fn replies_slower_than_the_poll_interval_are_still_granted() {
    init_logging();
    let start = Instant::now();
    let now = Arc::new(Mutex::new(start));
    let mut http = SlowSeed {
        now: now.clone(),
        delay: Duration::from_secs(12),
        posts: 0,
    };
    let mut waiter = CapabilityWaiter::new(
        SEED_URL,
        grid_shared::SessionId::from_u128(7),
        vec!["FetchInventoryDescendents2".to_string()],
        Duration::from_secs(10),
        &start,
    );

    let mut granted_at = None;
    for second in 0..600u64 {
        let tick = start + Duration::from_secs(second);
        *now.lock().unwrap() = tick;
        if waiter.poll_grant(&mut http, &tick) == GrantStatus::Granted {
            granted_at = Some(second);
            break;
        }
        if second == 11 {
            assert_eq!(waiter.in_flight(), 2);
        }
    }

    // The first request answers at 12 s even though a resend went out at 10 s
    assert_eq!(granted_at, Some(12));
    assert_eq!(http.posts, 2);
    assert_eq!(waiter.fetch_url(), FETCH_URL);
    assert_eq!(waiter.in_flight(), 0);
}
