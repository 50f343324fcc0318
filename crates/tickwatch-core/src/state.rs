//! Single-valued request slots with generation tokens.
//!
//! A [`Slot`] holds exactly one [`RequestState`]. Every request issued against
//! it takes a [`Ticket`]; settling with a ticket that is no longer the latest
//! is a no-op, so a superseded request can never overwrite the state written
//! by a newer one.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::ClientError;

/// Lifecycle of the single logical request a component tracks.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(ClientError),
}

impl<T> RequestState<T> {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ClientError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Generation number handed out when a request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket(u64);

pub(crate) struct Slot<T> {
    state: watch::Sender<RequestState<T>>,
    // Only read or written while the watch value is locked.
    generation: AtomicU64,
}

impl<T: Clone> Slot<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RequestState::Idle);
        Self {
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Issues a new request: supersedes any outstanding ticket and moves the
    /// slot to `Loading`, dropping previous data and error.
    pub fn begin(&self) -> Ticket {
        let mut ticket = Ticket(0);
        self.state.send_modify(|state| {
            ticket = Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
            *state = RequestState::Loading;
        });
        ticket
    }

    /// Commits `next` if `ticket` is still the latest. Returns whether it did.
    pub fn settle(&self, ticket: Ticket, next: RequestState<T>) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != ticket.0 {
                return false;
            }
            *state = next;
            true
        })
    }

    /// Back to `Idle`, invalidating every outstanding ticket.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = RequestState::Idle;
        });
    }

    /// Ties `ticket` to a guard that settles the slot back to `Idle` if the
    /// request is dropped before it finishes.
    pub fn in_flight(&self, ticket: Ticket) -> InFlight<'_, T> {
        InFlight {
            slot: self,
            ticket,
            finished: false,
        }
    }

    pub fn get(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }
}

pub(crate) struct InFlight<'a, T: Clone> {
    slot: &'a Slot<T>,
    ticket: Ticket,
    finished: bool,
}

impl<T: Clone> InFlight<'_, T> {
    pub fn finish(mut self, next: RequestState<T>) -> bool {
        self.finished = true;
        self.slot.settle(self.ticket, next)
    }
}

impl<T: Clone> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            self.slot.settle(self.ticket, RequestState::Idle);
        }
    }
}
