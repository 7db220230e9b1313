//! Scan sessions, the per-kind "active scan" marker and progress throttling.

use crate::error::{ReclaimError, Result};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanKind {
    LargeItems,
    Overview,
}

impl fmt::Display for ScanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanKind::LargeItems => f.write_str("large-item"),
            ScanKind::Overview => f.write_str("overview"),
        }
    }
}

/// State of one scan invocation. Other tasks reach it only through the token or its gate.
#[derive(Debug)]
pub struct ScanSession {
    kind: ScanKind,
    token: CancellationToken,
    started: Instant,
    guard: Option<ActiveGuard>,
}

impl ScanSession {
    /// A session that is not registered with any [`ScanGate`].
    pub fn new(kind: ScanKind) -> Self {
        Self {
            kind,
            token: CancellationToken::new(),
            started: Instant::now(),
            guard: None,
        }
    }

    pub fn kind(&self) -> ScanKind {
        self.kind
    }

    /// A handle that cancels this session when triggered from elsewhere.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.guard.as_ref().is_some_and(ActiveGuard::is_cancelled)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// The active-scan marker and cancel flag for one scan kind, both plain atomics.
#[derive(Debug, Default)]
struct Slot {
    /// Generation of the latest session times two, plus one while it runs.
    state: AtomicU64,
    /// Highest generation a cancel request has reached.
    cancelled: AtomicU64,
}

impl Slot {
    fn is_active(&self) -> bool {
        self.state.load(Ordering::Acquire) & 1 == 1
    }
}

#[derive(Debug)]
struct ActiveGuard {
    slot: Arc<Slot>,
    generation: u64,
}

impl ActiveGuard {
    fn is_cancelled(&self) -> bool {
        self.slot.cancelled.load(Ordering::Acquire) >= self.generation
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.slot.state.fetch_and(!1, Ordering::Release);
    }
}

/// Admits at most one running scan per [`ScanKind`] and routes cancel requests to it.
#[derive(Debug, Clone, Default)]
pub struct ScanGate {
    large_items: Arc<Slot>,
    overview: Arc<Slot>,
}

impl ScanGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: ScanKind) -> &Arc<Slot> {
        match kind {
            ScanKind::LargeItems => &self.large_items,
            ScanKind::Overview => &self.overview,
        }
    }

    /// Starts a session, failing if a scan of the same kind is still running.
    pub fn begin(&self, kind: ScanKind) -> Result<ScanSession> {
        let slot = self.slot(kind);
        let current = slot.state.load(Ordering::Acquire);
        let next = (current | 1) + 2;
        if current & 1 == 1
            || slot
                .state
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            return Err(ReclaimError::ScanInProgress(kind.to_string()));
        }

        let mut session = ScanSession::new(kind);
        session.guard = Some(ActiveGuard {
            slot: Arc::clone(slot),
            generation: next >> 1,
        });
        Ok(session)
    }

    /// Requests cancellation of the running scan of `kind`. Returns false if none is running.
    ///
    /// The request is bound to the generation that was running when it arrived, so a scan
    /// started afterwards never sees it.
    pub fn cancel(&self, kind: ScanKind) -> bool {
        let slot = self.slot(kind);
        let state = slot.state.load(Ordering::Acquire);
        if state & 1 == 0 {
            return false;
        }
        log::info!("Cancellation requested for {} scan", kind);
        slot.cancelled.fetch_max(state >> 1, Ordering::AcqRel);
        true
    }

    pub fn is_active(&self, kind: ScanKind) -> bool {
        self.slot(kind).is_active()
    }
}

/// Snapshot handed to progress callbacks.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub scanned_count: u64,
    pub found_count: usize,
    pub found_bytes: u64,
    pub current_path: PathBuf,
    pub elapsed: Duration,
}

/// Limits progress reports to one per interval of wall time.
#[derive(Debug)]
pub(crate) struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressThrottle {
    pub(crate) fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    pub(crate) fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
