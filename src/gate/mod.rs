//! Debounce and cancellation machinery shared by listings and form checks.
//!
//! A *channel* is one stream of logically related requests: the page fetches
//! of a listing, or the uniqueness checks of one form field. Each channel
//! owns a [`TokenLedger`] so that only the response to its most recently
//! issued request is ever applied, whatever order responses arrive in.
//!
//! The pieces here are plain state machines without I/O; the actors in
//! [`list`] and [`validation`] drive them from a single tokio task each.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::pagination::QueryError;

pub mod list;
pub mod validation;

/// Quiet window applied to free-text input before it reaches the network.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Errors reported synchronously by controller handles.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("controller is closed")]
    Closed,
}

/// Identifier minted for every outbound request of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl Display for RequestToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mints strictly increasing tokens and decides which response is current.
///
/// Only the latest minted token can settle, and only once. Cancelling
/// retires every token minted so far.
#[derive(Debug, Default)]
pub struct TokenLedger {
    minted: u64,
    retired: u64,
}

impl TokenLedger {
    pub fn mint(&mut self) -> RequestToken {
        self.minted += 1;
        RequestToken(self.minted)
    }

    /// Token still waiting for its response, if any.
    pub fn in_flight(&self) -> Option<RequestToken> {
        (self.minted > self.retired).then_some(RequestToken(self.minted))
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.minted && token.0 > self.retired
    }

    /// Marks `token` as settled. Returns `false` for superseded, cancelled or
    /// already settled tokens, whose responses must be ignored.
    pub fn settle(&mut self, token: RequestToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.retired = token.0;
        true
    }

    pub fn cancel(&mut self) {
        self.retired = self.minted;
    }
}

/// Holds back an intent until no newer one arrived for a full window.
#[derive(Debug)]
pub struct Debounce<I> {
    window: Duration,
    pending: Option<(I, Instant)>,
}

impl<I> Debounce<I> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Replaces any waiting intent and restarts the window.
    pub fn push(&mut self, intent: I, now: Instant) {
        self.pending = Some((intent, now + self.window));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Releases the waiting intent once its window has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<I> {
        match self.deadline() {
            Some(deadline) if deadline <= now => self.pending.take().map(|(intent, _)| intent),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DispatchState {
    InFlight,
    Settled,
    Failed,
}

#[derive(Debug)]
struct LastDispatch<Q> {
    query: Q,
    token: RequestToken,
    state: DispatchState,
}

/// Per-channel request bookkeeping: deduplication plus stale suppression.
#[derive(Debug)]
pub struct Channel<Q> {
    ledger: TokenLedger,
    last: Option<LastDispatch<Q>>,
}

impl<Q> Default for Channel<Q> {
    fn default() -> Self {
        Self {
            ledger: TokenLedger::default(),
            last: None,
        }
    }
}

impl<Q: Clone + PartialEq> Channel<Q> {
    /// Registers `query` for dispatch and returns its token, or `None` when
    /// it repeats the previous request. A failed request does not count, so
    /// repeating it retries.
    pub fn begin(&mut self, query: &Q) -> Option<RequestToken> {
        if let Some(last) = &self.last
            && last.query == *query
            && last.state != DispatchState::Failed
        {
            return None;
        }
        Some(self.force(query))
    }

    /// Registers `query` for dispatch even if it repeats the previous one.
    pub fn force(&mut self, query: &Q) -> RequestToken {
        let token = self.ledger.mint();
        self.last = Some(LastDispatch {
            query: query.clone(),
            token,
            state: DispatchState::InFlight,
        });
        token
    }

    /// Records the arrival of the response for `token`. Returns `true` only
    /// when it answers the latest request, i.e. when it may be applied.
    pub fn settle(&mut self, token: RequestToken, succeeded: bool) -> bool {
        if !self.ledger.settle(token) {
            return false;
        }
        if let Some(last) = self.last.as_mut()
            && last.token == token
        {
            last.state = if succeeded {
                DispatchState::Settled
            } else {
                DispatchState::Failed
            };
        }
        true
    }

    /// Whether the latest request settled successfully and nothing newer
    /// was issued since.
    pub fn is_settled(&self) -> bool {
        self.last
            .as_ref()
            .is_some_and(|last| last.state == DispatchState::Settled)
    }

    pub fn in_flight(&self) -> Option<RequestToken> {
        self.ledger.in_flight()
    }

    /// Retires the in-flight request; its response will be ignored.
    pub fn cancel(&mut self) {
        self.ledger.cancel();
        if self
            .last
            .as_ref()
            .is_some_and(|last| last.state == DispatchState::InFlight)
        {
            self.last = None;
        }
    }
}
