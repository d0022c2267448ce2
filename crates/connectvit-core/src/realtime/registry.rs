//! Room registry: which live sessions are in which room.
//!
//! Rooms are keyed in a sharded `DashMap`, so joins and broadcasts on
//! unrelated rooms never contend on the same lock. Each session also keeps
//! its own room set behind its own lock; `join`, `leave` and `leave_all`
//! always take the session lock first and the room shard second.
//!
//! `broadcast` holds the room shard only long enough to snapshot membership.
//! Delivery happens afterwards with `try_send`, so a slow consumer can never
//! stall a sender or the other members of the room.

use std::collections::HashMap;
use std::sync::Arc;

use connectvit_types::error::MessagingError;
use connectvit_types::event::ServerEvent;
use connectvit_types::room::RoomId;
use connectvit_types::session::{SessionId, SessionState};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, warn};

use super::session::{DeliveryError, Session};

type Members = HashMap<SessionId, Arc<Session>>;

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Sessions the event was queued for.
    pub delivered: usize,
    /// Sessions skipped because their outbound queue was full.
    pub dropped: usize,
    /// Sessions found dead and scheduled for eviction.
    pub stale: Vec<SessionId>,
}

impl BroadcastReport {
    /// Members the event was attempted on.
    pub fn attempted(&self) -> usize {
        self.delivered + self.dropped + self.stale.len()
    }
}

/// Registry of room memberships. Cloning shares the same underlying map.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, Members>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `session` to `room`.
    ///
    /// Idempotent. Returns `true` if the session was not already a member.
    /// Rejected with [`MessagingError::SessionClosed`] once the session has
    /// left the `Active` state.
    pub fn join(&self, room: &RoomId, session: &Arc<Session>) -> Result<bool, MessagingError> {
        let mut inner = session.lock();
        if !inner.state.accepts_requests() {
            return Err(MessagingError::SessionClosed(session.id()));
        }
        let added = inner.rooms.insert(room.clone());
        self.rooms
            .entry(room.clone())
            .or_default()
            .insert(session.id(), Arc::clone(session));
        drop(inner);

        if added {
            debug!(%room, session_id = %session.id(), "joined room");
        }
        Ok(added)
    }

    /// Remove `session` from `room`. Returns `true` if it was a member.
    pub fn leave(&self, room: &RoomId, session: &Session) -> bool {
        let mut inner = session.lock();
        let removed = inner.rooms.remove(room);
        self.detach(room, &session.id());
        drop(inner);

        if removed {
            debug!(%room, session_id = %session.id(), "left room");
        }
        removed
    }

    /// Remove `session` from every room it belongs to.
    ///
    /// Moves an `Active` or `Connecting` session to `Closing` under its lock
    /// before releasing it, so no `join` can slip in afterwards. Returns the
    /// rooms it was removed from.
    pub fn leave_all(&self, session: &Session) -> Vec<RoomId> {
        let mut inner = session.lock();
        if matches!(
            inner.state,
            SessionState::Connecting | SessionState::Active
        ) {
            inner.state = SessionState::Closing;
        }
        let rooms: Vec<RoomId> = inner.rooms.drain().collect();
        for room in &rooms {
            self.detach(room, &session.id());
        }
        rooms
    }

    /// Deliver `event` to every session currently joined to `room`.
    ///
    /// A full queue drops the event for that session only. A closed queue
    /// marks the session stale; it is evicted from all of its rooms in the
    /// background (inline when no runtime is available). An absent room is
    /// an empty room.
    pub fn broadcast(&self, room: &RoomId, event: ServerEvent) -> BroadcastReport {
        let members: Vec<Arc<Session>> = match self.rooms.get(room) {
            Some(entry) => entry.values().cloned().collect(),
            None => return BroadcastReport::default(),
        };

        let event = Arc::new(event);
        let mut report = BroadcastReport::default();
        for session in members {
            match session.deliver(Arc::clone(&event)) {
                Ok(()) => report.delivered += 1,
                Err(DeliveryError::Full) => {
                    warn!(%room, session_id = %session.id(), "outbound queue full, event dropped");
                    report.dropped += 1;
                }
                Err(DeliveryError::Closed) => {
                    let stale = MessagingError::StaleSession(session.id());
                    debug!(%room, error = %stale, "evicting stale session");
                    report.stale.push(session.id());
                    self.evict(session);
                }
            }
        }
        report
    }

    /// Number of sessions joined to `room`.
    pub fn member_count(&self, room: &RoomId) -> usize {
        self.rooms.get(room).map(|entry| entry.len()).unwrap_or(0)
    }

    /// Number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Rooms `session` is joined to.
    pub fn rooms_of(&self, session: &Session) -> Vec<RoomId> {
        session.rooms()
    }

    pub fn is_member(&self, room: &RoomId, id: &SessionId) -> bool {
        self.rooms
            .get(room)
            .map(|entry| entry.contains_key(id))
            .unwrap_or(false)
    }

    /// Drop one membership entry and prune the room if it became empty.
    fn detach(&self, room: &RoomId, id: &SessionId) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(id);
        }
        self.rooms.remove_if(room, |_, members| members.is_empty());
    }

    fn evict(&self, session: Arc<Session>) {
        let registry = self.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    registry.leave_all(&session);
                });
            }
            Err(_) => {
                registry.leave_all(&session);
            }
        }
    }
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("rooms", &self.rooms.len())
            .finish()
    }
}
