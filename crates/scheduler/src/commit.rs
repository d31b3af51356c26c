//! Optimistic commit protocol
//!
//! A gesture commit is split in three steps so the host decides where the
//! await happens:
//!
//! 1. the controller applies the proposed range locally and yields a
//!    [`PendingCommit`] (synchronous, the UI shows the new position at once);
//! 2. [`PendingCommit::persist`] writes through the store, waiting its turn
//!    behind earlier writes to the same appointment, and on failure fetches
//!    the authoritative list for the window that was visible at release;
//! 3. the view applies the resulting [`CommitResolution`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use agenda_core::{Appointment, AppointmentId, AppointmentPatch, AppointmentStore, StoreError, TimeRange};
use tokio::sync::oneshot::{self, error::TryRecvError};

/// A time edit already applied to the local set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeChange {
    pub appointment_id: AppointmentId,
    /// Range before the gesture; rollbacks restore it
    pub previous: TimeRange,
    pub proposed: TimeRange,
}

/// Per-appointment FIFO lanes for store writes.
///
/// A place in the lane is taken synchronously by [`reserve`](Self::reserve),
/// so writes to one appointment are persisted in reservation order whichever
/// future the host polls first. Writes to different appointments do not wait
/// on each other.
#[derive(Debug, Clone, Default)]
pub struct CommitQueue {
    /// Completion signal of the last reservation per appointment
    tails: Arc<Mutex<HashMap<AppointmentId, oneshot::Receiver<()>>>>,
}

impl CommitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next place in `id`'s lane
    pub fn reserve(&self, id: AppointmentId) -> CommitTurn {
        let (done, next) = oneshot::channel();
        let mut tails = self.tails.lock().unwrap_or_else(PoisonError::into_inner);
        tails.retain(|_, tail| !finished(tail));
        let predecessor = tails.insert(id, next);
        CommitTurn {
            predecessor,
            _done: done,
        }
    }

    /// Whether a reservation for `id` is still waiting or writing
    pub fn is_busy(&self, id: AppointmentId) -> bool {
        let mut tails = self.tails.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tail) = tails.get_mut(&id) {
            if !finished(tail) {
                return true;
            }
            tails.remove(&id);
        }
        false
    }
}

/// A finished turn drops its sender without sending
fn finished(tail: &mut oneshot::Receiver<()>) -> bool {
    matches!(tail.try_recv(), Err(TryRecvError::Closed))
}

/// A reserved place in one appointment's write lane.
///
/// Dropping the turn, after the write or without one, lets the next
/// reservation proceed.
#[derive(Debug)]
pub struct CommitTurn {
    predecessor: Option<oneshot::Receiver<()>>,
    _done: oneshot::Sender<()>,
}

impl CommitTurn {
    /// Wait until every earlier reservation for the appointment is finished
    pub async fn ready(&mut self) {
        if let Some(predecessor) = self.predecessor.take() {
            predecessor.await.ok();
        }
    }
}

/// An optimistic edit waiting to be written to the store
#[derive(Debug)]
pub struct PendingCommit {
    change: TimeChange,
    ticket: u64,
    window: TimeRange,
    turn: CommitTurn,
}

impl PendingCommit {
    pub(crate) fn new(change: TimeChange, ticket: u64, window: TimeRange, turn: CommitTurn) -> Self {
        Self {
            change,
            ticket,
            window,
            turn,
        }
    }

    pub fn change(&self) -> &TimeChange {
        &self.change
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Window re-fetched when the write fails
    pub fn window(&self) -> TimeRange {
        self.window
    }

    /// Write the proposed range through `store`.
    ///
    /// Never fails: a rejected write is reported in the resolution together
    /// with the store's authoritative list (or the error fetching it).
    pub async fn persist<S>(mut self, store: &S) -> CommitResolution
    where
        S: AppointmentStore + ?Sized,
    {
        let id = self.change.appointment_id;
        self.turn.ready().await;

        tracing::debug!(appointment_id = %id, ticket = self.ticket, "Persisting time change");

        match store.update(id, AppointmentPatch::from_range(self.change.proposed)).await {
            Ok(appointment) => CommitResolution::Confirmed {
                ticket: self.ticket,
                appointment,
            },
            Err(error) => {
                tracing::warn!(appointment_id = %id, "Store rejected time change: {}", error);
                let resync = store.list(self.window).await;
                if let Err(e) = &resync {
                    tracing::error!("Failed to fetch appointments after rejected change: {}", e);
                }
                CommitResolution::Rejected {
                    ticket: self.ticket,
                    change: self.change,
                    error,
                    window: self.window,
                    resync,
                }
            }
        }
    }
}

/// Outcome of persisting one [`PendingCommit`]
#[derive(Debug, Clone, PartialEq)]
pub enum CommitResolution {
    Confirmed {
        ticket: u64,
        appointment: Appointment,
    },
    Rejected {
        ticket: u64,
        change: TimeChange,
        error: StoreError,
        /// Window `resync` was listed for
        window: TimeRange,
        resync: Result<Vec<Appointment>, StoreError>,
    },
}

impl CommitResolution {
    pub fn ticket(&self) -> u64 {
        match self {
            CommitResolution::Confirmed { ticket, .. } | CommitResolution::Rejected { ticket, .. } => *ticket,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, CommitResolution::Confirmed { .. })
    }
}

/// What applying a resolution did to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    Confirmed,
    RolledBack,
}
