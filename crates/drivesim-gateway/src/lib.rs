//! Persistence gateway — hands a finished session's payload to whatever
//! stores it.
//!
//! The simulation calls [`PersistenceGateway::submit`] exactly once per
//! session and never waits on it. The returned [`SubmitHandle`] lets the
//! presentation layer poll for the outcome (or give up after a timeout)
//! before it navigates away.

pub mod error;
pub mod file;
pub mod http;
pub mod payload;

pub use error::{GatewayError, Result};
pub use file::JsonFileGateway;
pub use http::HttpGateway;
pub use payload::{score_percentage, OutcomeRecord, SessionPayload};

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Where a payload ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted by the results endpoint
    Http { status: u16 },
    /// Written to disk
    File { path: PathBuf },
    /// Deliberately dropped (no sink configured)
    Discarded,
    /// Kept in memory
    Recorded,
}

/// A sink for finished sessions
pub trait PersistenceGateway {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Hand a payload off. Must return promptly; slow work continues in
    /// the background and reports through the handle.
    fn submit(&self, payload: SessionPayload) -> SubmitHandle;
}

/// Pending result of a [`PersistenceGateway::submit`] call
#[derive(Debug)]
pub struct SubmitHandle {
    rx: Receiver<Result<Delivery>>,
    settled: Option<std::result::Result<Delivery, String>>,
}

impl SubmitHandle {
    /// Handle plus the sender a background task completes it with
    pub fn pending() -> (Self, Sender<Result<Delivery>>) {
        let (tx, rx) = mpsc::channel();
        (Self { rx, settled: None }, tx)
    }

    /// Handle that is already settled
    pub fn ready(result: Result<Delivery>) -> Self {
        let (handle, tx) = Self::pending();
        // The receiver is alive in `handle`, so this cannot fail.
        let _ = tx.send(result);
        handle
    }

    /// Non-blocking check. `None` while still in flight.
    pub fn poll(&mut self) -> Option<std::result::Result<Delivery, String>> {
        if self.settled.is_none() {
            match self.rx.try_recv() {
                Ok(result) => self.settle(result),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => self.settle(Err(GatewayError::Cancelled)),
            }
        }
        self.settled.clone()
    }

    /// Block for at most `timeout`. `None` if it is still in flight.
    pub fn wait(&mut self, timeout: Duration) -> Option<std::result::Result<Delivery, String>> {
        if self.settled.is_none() {
            match self.rx.recv_timeout(timeout) {
                Ok(result) => self.settle(result),
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => self.settle(Err(GatewayError::Cancelled)),
            }
        }
        self.settled.clone()
    }

    fn settle(&mut self, result: Result<Delivery>) {
        self.settled = Some(result.map_err(|e| e.to_string()));
    }
}

/// Drops every payload. Used when neither an endpoint nor an offline
/// directory is configured.
#[derive(Debug, Default)]
pub struct NullGateway;

impl PersistenceGateway for NullGateway {
    fn name(&self) -> &'static str {
        "null"
    }

    fn submit(&self, payload: SessionPayload) -> SubmitHandle {
        tracing::debug!("Discarding result for session {}", payload.session_id);
        SubmitHandle::ready(Ok(Delivery::Discarded))
    }
}

/// Keeps payloads in memory. Clones share the same store, so a caller can
/// hand one clone to the simulation and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    payloads: Arc<Mutex<Vec<SessionPayload>>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything submitted so far
    pub fn payloads(&self) -> Vec<SessionPayload> {
        self.payloads
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.payloads.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PersistenceGateway for MemoryGateway {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn submit(&self, payload: SessionPayload) -> SubmitHandle {
        match self.payloads.lock() {
            Ok(mut store) => {
                store.push(payload);
                SubmitHandle::ready(Ok(Delivery::Recorded))
            }
            Err(_) => SubmitHandle::ready(Err(GatewayError::Cancelled)),
        }
    }
}
