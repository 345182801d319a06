//! Staleness guard for in-flight requests.
//!
//! A view owns a [`RequestScope`] and takes a [`RequestTicket`] for each load
//! it starts. Starting another load, or invalidating the scope when the view
//! goes away, cancels the previous ticket and retires its generation, so a
//! late response can be recognised and ignored.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

struct ScopeState {
    generation: u64,
    cancel: CancellationToken,
}

/// Issues tickets and tracks which one is current.
#[derive(Clone)]
pub struct RequestScope {
    state: Arc<Mutex<ScopeState>>,
}

/// Handle for a single request within a [`RequestScope`].
#[derive(Debug, Clone)]
pub struct RequestTicket {
    generation: u64,
    cancel: CancellationToken,
}

impl Default for RequestScope {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestScope {
    /// Scope with no request in flight.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ScopeState {
                generation: 0,
                cancel: CancellationToken::new(),
            })),
        }
    }

    /// Supersedes any outstanding ticket and returns a fresh one.
    pub fn begin(&self) -> RequestTicket {
        let mut state = self.state.lock();
        state.cancel.cancel();
        state.generation += 1;
        state.cancel = CancellationToken::new();
        RequestTicket {
            generation: state.generation,
            cancel: state.cancel.clone(),
        }
    }

    /// Cancels the outstanding ticket without issuing a new one.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.cancel.cancel();
        state.generation += 1;
        state.cancel = CancellationToken::new();
    }

    /// Whether `ticket` is the latest one issued and has not been invalidated.
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        let state = self.state.lock();
        state.generation == ticket.generation && !ticket.cancel.is_cancelled()
    }

    /// Generation of the most recent `begin` or `invalidate`.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }
}

impl RequestTicket {
    /// Generation this ticket was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the ticket has been superseded or invalidated.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drives `fut` to completion unless the ticket is cancelled first.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            output = fut => Some(output),
        }
    }
}
