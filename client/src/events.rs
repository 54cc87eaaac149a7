use std::vec::IntoIter;

use grid_shared::{ItemKey, NoticeKind};

use crate::{bootstrap::FetchKind, LoginError, SessionState};

/// A single edge taken by the session state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateChange {
    pub from: SessionState,
    pub to: SessionState,
}

pub struct SessionEvents {
    state_changes: Vec<StateChange>,
    login_failures: Vec<LoginError>,
    notices: Vec<(NoticeKind, String)>,
    fetch_failures: Vec<(FetchKind, Vec<ItemKey>)>,
    ready: bool,
    empty: bool,
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEvents {
    pub(crate) fn new() -> Self {
        Self {
            state_changes: Vec::new(),
            login_failures: Vec::new(),
            notices: Vec::new(),
            fetch_failures: Vec::new(),
            ready: false,
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: SessionEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: SessionEvent>(&self) -> bool {
        V::has(self)
    }

    pub(crate) fn push_state_change(&mut self, change: StateChange) {
        self.state_changes.push(change);
        self.empty = false;
    }

    pub(crate) fn push_login_failure(&mut self, error: LoginError) {
        self.login_failures.push(error);
        self.empty = false;
    }

    pub(crate) fn push_notice(&mut self, kind: NoticeKind, message: String) {
        self.notices.push((kind, message));
        self.empty = false;
    }

    pub(crate) fn push_fetch_failure(&mut self, kind: FetchKind, ids: Vec<ItemKey>) {
        self.fetch_failures.push((kind, ids));
        self.empty = false;
    }

    pub(crate) fn push_ready(&mut self) {
        self.ready = true;
        self.empty = false;
    }
}

// Event Trait
pub trait SessionEvent {
    type Iter;

    fn iter(events: &mut SessionEvents) -> Self::Iter;

    fn has(events: &SessionEvents) -> bool;
}

// StateChangeEvent
pub struct StateChangeEvent;
impl SessionEvent for StateChangeEvent {
    type Iter = IntoIter<StateChange>;

    fn iter(events: &mut SessionEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.state_changes);
        IntoIterator::into_iter(list)
    }

    fn has(events: &SessionEvents) -> bool {
        !events.state_changes.is_empty()
    }
}

// LoginFailedEvent
pub struct LoginFailedEvent;
impl SessionEvent for LoginFailedEvent {
    type Iter = IntoIter<LoginError>;

    fn iter(events: &mut SessionEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.login_failures);
        IntoIterator::into_iter(list)
    }

    fn has(events: &SessionEvents) -> bool {
        !events.login_failures.is_empty()
    }
}

// NoticeEvent
pub struct NoticeEvent;
impl SessionEvent for NoticeEvent {
    type Iter = IntoIter<(NoticeKind, String)>;

    fn iter(events: &mut SessionEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.notices);
        IntoIterator::into_iter(list)
    }

    fn has(events: &SessionEvents) -> bool {
        !events.notices.is_empty()
    }
}

// FetchFailedEvent
pub struct FetchFailedEvent;
impl SessionEvent for FetchFailedEvent {
    type Iter = IntoIter<(FetchKind, Vec<ItemKey>)>;

    fn iter(events: &mut SessionEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.fetch_failures);
        IntoIterator::into_iter(list)
    }

    fn has(events: &SessionEvents) -> bool {
        !events.fetch_failures.is_empty()
    }
}

// ReadyEvent
pub struct ReadyEvent;
impl SessionEvent for ReadyEvent {
    type Iter = IntoIter<()>;

    fn iter(events: &mut SessionEvents) -> Self::Iter {
        let list = if std::mem::take(&mut events.ready) {
            vec![()]
        } else {
            Vec::new()
        };
        IntoIterator::into_iter(list)
    }

    fn has(events: &SessionEvents) -> bool {
        events.ready
    }
}
