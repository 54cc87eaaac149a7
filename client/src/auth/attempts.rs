/// What a transport failure did to the endpoint cursor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptVerdict {
    /// Try the same endpoint again
    RetrySame { attempt: u32 },
    /// Give up on the endpoint and try the next one
    Advanced { cursor: usize },
    /// No endpoint left to try
    Exhausted,
}

/// Cursor over the endpoint candidates plus the counters that bound retries
#[derive(Clone, Debug)]
pub struct AuthAttempts {
    candidates: usize,
    per_candidate: u32,
    max_hops: u32,
    cursor: usize,
    consecutive_failures: u32,
    total_failures: usize,
    hops: u32,
}

impl AuthAttempts {
    pub fn new(candidates: usize, per_candidate: u32, max_hops: u32) -> Self {
        Self {
            candidates,
            per_candidate,
            max_hops,
            cursor: 0,
            consecutive_failures: 0,
            total_failures: 0,
            hops: 0,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.candidates
    }

    pub fn total_failures(&self) -> usize {
        self.total_failures
    }

    pub fn hops(&self) -> u32 {
        self.hops
    }

    /// Records a transport-level failure against the current endpoint
    pub fn record_failure(&mut self) -> AttemptVerdict {
        self.total_failures += 1;
        self.consecutive_failures += 1;

        if self.consecutive_failures < self.per_candidate {
            return AttemptVerdict::RetrySame {
                attempt: self.consecutive_failures + 1,
            };
        }

        self.cursor += 1;
        self.consecutive_failures = 0;
        self.hops = 0;
        if self.is_exhausted() {
            AttemptVerdict::Exhausted
        } else {
            AttemptVerdict::Advanced {
                cursor: self.cursor,
            }
        }
    }

    /// Records that the endpoint answered with a document, which ends the
    /// run of consecutive failures
    pub fn record_reply(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Records a server-directed continuation. Returns false once the hop
    /// limit is exceeded
    pub fn record_hop(&mut self) -> bool {
        self.hops += 1;
        self.hops <= self.max_hops
    }
}
