//! Live connection sessions.
//!
//! A [`Session`] is one transport connection: its handle, lifecycle state,
//! the set of rooms it joined, and the sending half of its bounded outbound
//! queue. The [`SessionManager`] owns the session table and drives the
//! `Connecting -> Active -> Closing -> Closed` transitions.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use connectvit_types::event::ServerEvent;
use connectvit_types::room::RoomId;
use connectvit_types::session::{SessionId, SessionState};
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::registry::RoomRegistry;

/// Why an event could not be queued for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The outbound queue is at capacity.
    #[error("outbound queue full")]
    Full,

    /// The receiving half was dropped; the connection is gone.
    #[error("outbound queue closed")]
    Closed,
}

/// State guarded by the session lock.
#[derive(Debug)]
pub(crate) struct SessionInner {
    pub(crate) state: SessionState,
    pub(crate) rooms: HashSet<RoomId>,
}

/// One live connection.
pub struct Session {
    id: SessionId,
    connected_at: DateTime<Utc>,
    outbound: mpsc::Sender<Arc<ServerEvent>>,
    inner: Mutex<SessionInner>,
}

impl Session {
    /// Build a session in the `Connecting` state.
    pub fn new(id: SessionId, outbound: mpsc::Sender<Arc<ServerEvent>>) -> Self {
        Self {
            id,
            connected_at: Utc::now(),
            outbound,
            inner: Mutex::new(SessionInner {
                state: SessionState::Connecting,
                rooms: HashSet::new(),
            }),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Rooms this session currently belongs to.
    pub fn rooms(&self) -> Vec<RoomId> {
        self.lock().rooms.iter().cloned().collect()
    }

    /// Queue an event without waiting.
    pub fn deliver(&self, event: Arc<ServerEvent>) -> Result<(), DeliveryError> {
        self.outbound.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Handshake complete. Returns `false` if the session was not `Connecting`.
    pub(crate) fn activate(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != SessionState::Connecting {
            return false;
        }
        inner.state = SessionState::Active;
        true
    }

    /// Final transition once every room has been left.
    pub(crate) fn mark_closed(&self) {
        self.lock().state = SessionState::Closed;
    }

    /// Lock the session state. Never held across an `.await`.
    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &inner.state)
            .field("rooms", &inner.rooms.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Owns the table of live sessions.
///
/// Cloning is cheap; all clones share the same table and registry.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<DashMap<SessionId, Arc<Session>>>,
    registry: RoomRegistry,
    buffer: usize,
}

impl SessionManager {
    /// `buffer` is the capacity of each session's outbound queue.
    pub fn new(registry: RoomRegistry, buffer: usize) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            registry,
            buffer: buffer.max(1),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Register a new connection and move it to `Active`.
    ///
    /// Returns the session and the receiving half of its outbound queue; the
    /// transport task drains the receiver onto the wire.
    pub fn open(&self) -> (Arc<Session>, mpsc::Receiver<Arc<ServerEvent>>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let session = Arc::new(Session::new(SessionId::new(), tx));
        self.sessions.insert(session.id(), Arc::clone(&session));
        session.activate();
        info!(session_id = %session.id(), "session opened");
        (session, rx)
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of sessions currently in the table.
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Tear a session down: leave every room, mark it `Closed`, drop the record.
    ///
    /// Returns the rooms it was removed from, or `None` if the session was
    /// already gone. Safe to call more than once.
    pub fn close(&self, id: &SessionId) -> Option<Vec<RoomId>> {
        let session = self.get(id)?;
        let rooms = self.registry.leave_all(&session);
        session.mark_closed();
        self.sessions.remove(id);
        let connected_secs = (Utc::now() - session.connected_at()).num_seconds();
        info!(session_id = %id, rooms = rooms.len(), connected_secs, "session closed");
        Some(rooms)
    }

    /// Close every session. Used on graceful shutdown.
    pub fn close_all(&self) -> usize {
        let ids: Vec<SessionId> = self.sessions.iter().map(|entry| *entry.key()).collect();
        let mut closed = 0;
        for id in ids {
            if self.close(&id).is_some() {
                closed += 1;
            }
        }
        debug!(closed, "closed all sessions");
        closed
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("sessions", &self.sessions.len())
            .field("rooms", &self.registry.room_count())
            .field("buffer", &self.buffer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::realtime::addressing::{room_for_direct, room_for_group};

    fn manager() -> SessionManager {
        SessionManager::new(RoomRegistry::new(), 8)
    }

    #[test]
    fn new_session_starts_connecting() {
        let (tx, _rx) = mpsc::channel(1);
        let session = Session::new(SessionId::new(), tx);
        assert_eq!(session.state(), SessionState::Connecting);
        assert!(session.rooms().is_empty());
        assert!(session.activate());
        assert!(!session.activate());
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn open_registers_active_session() {
        let manager = manager();
        let (session, _rx) = manager.open();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(manager.active_count(), 1);
        assert!(manager.get(&session.id()).is_some());
    }

    #[test]
    fn deliver_reports_full_and_closed() {
        let (tx, rx) = mpsc::channel(1);
        let session = Session::new(SessionId::new(), tx);
        assert!(session.deliver(Arc::new(ServerEvent::Pong)).is_ok());
        assert_eq!(
            session.deliver(Arc::new(ServerEvent::Pong)),
            Err(DeliveryError::Full)
        );
        drop(rx);
        assert_eq!(
            session.deliver(Arc::new(ServerEvent::Pong)),
            Err(DeliveryError::Closed)
        );
    }

    #[test]
    fn close_leaves_rooms_and_removes_record() {
        let manager = manager();
        let (session, _rx) = manager.open();
        let dm = room_for_direct("alice", "bob").unwrap();
        let group = room_for_group(1);
        manager.registry().join(&dm, &session).unwrap();
        manager.registry().join(&group, &session).unwrap();

        let mut left = manager.close(&session.id()).unwrap();
        left.sort();
        assert_eq!(left, vec![dm.clone(), group.clone()]);
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(manager.active_count(), 0);
        assert_eq!(manager.registry().member_count(&dm), 0);
        assert_eq!(manager.registry().member_count(&group), 0);
    }

    #[test]
    fn close_is_idempotent() {
        let manager = manager();
        let (session, _rx) = manager.open();
        assert!(manager.close(&session.id()).is_some());
        assert!(manager.close(&session.id()).is_none());
    }

    #[test]
    fn closed_session_cannot_join() {
        let manager = manager();
        let (session, _rx) = manager.open();
        manager.close(&session.id());
        let err = manager
            .registry()
            .join(&room_for_group(1), &session)
            .unwrap_err();
        assert_eq!(err.code(), "SESSION_CLOSED");
    }

    #[test]
    fn close_all_empties_table() {
        let manager = manager();
        let mut receivers = Vec::new();
        for _ in 0..5 {
            let (session, rx) = manager.open();
            manager.registry().join(&room_for_group(7), &session).unwrap();
            receivers.push(rx);
        }
        assert_eq!(manager.registry().member_count(&room_for_group(7)), 5);
        assert_eq!(manager.close_all(), 5);
        assert_eq!(manager.active_count(), 0);
        assert_eq!(manager.registry().room_count(), 0);
    }
}
