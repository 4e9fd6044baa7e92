//! Connection registry: every live connection indexed by id and by user.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use hugmood_core::types::{ConnectionId, UserId};

use super::handle::ConnectionHandle;

/// Handshake progress of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No identity bound yet.
    Unauthenticated,
    /// A handshake is in flight.
    Authenticating,
    /// An identity is bound.
    Authenticated,
}

/// Point-in-time copy of a connection record.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Connection id.
    pub id: ConnectionId,
    /// Outbound queue of the transport.
    pub handle: ConnectionHandle,
    /// Whether an identity is bound.
    pub authenticated: bool,
    /// Bound identity.
    pub user_id: Option<UserId>,
    /// Access token issued at authentication.
    pub session_token: Option<String>,
    /// Whether a handshake is in flight.
    pub handshake_pending: bool,
    /// Last inbound message.
    pub last_activity: DateTime<Utc>,
}

impl Connection {
    fn new(id: ConnectionId, handle: ConnectionHandle, now: DateTime<Utc>) -> Self {
        Self {
            id,
            handle,
            authenticated: false,
            user_id: None,
            session_token: None,
            handshake_pending: false,
            last_activity: now,
        }
    }

    /// Derived handshake state.
    pub fn auth_state(&self) -> AuthState {
        if self.authenticated {
            AuthState::Authenticated
        } else if self.handshake_pending {
            AuthState::Authenticating
        } else {
            AuthState::Unauthenticated
        }
    }

    /// Time since the last inbound message.
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_activity
    }
}

/// A connection removed from the registry.
#[derive(Debug, Clone)]
pub struct Removal {
    /// The removed record.
    pub connection: Connection,
    /// The bound user has no connections left.
    pub user_offline: bool,
}

/// Concurrency-safe store of live connections.
///
/// Reads go straight to the maps. Mutations are serialized behind a write
/// gate and update the user index after inserting into the primary table
/// and before removing from it, so the index never names a missing id.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    by_id: DashMap<ConnectionId, Connection>,
    by_user: DashMap<UserId, HashSet<ConnectionId>>,
    write_gate: Mutex<()>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn gate(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a fresh unauthenticated connection.
    pub fn register(&self, handle: ConnectionHandle) -> ConnectionId {
        self.register_at(handle, Utc::now())
    }

    /// Insert a fresh connection with an explicit accept time.
    pub fn register_at(&self, handle: ConnectionHandle, now: DateTime<Utc>) -> ConnectionId {
        let _gate = self.gate();
        let mut id = ConnectionId::new();
        while self.by_id.contains_key(&id) {
            id = ConnectionId::new();
        }
        self.by_id.insert(id, Connection::new(id, handle, now));
        tracing::debug!(conn_id = %id, "Connection registered");
        id
    }

    /// Bind `user_id` to the connection.
    ///
    /// Re-authentication replaces the previous identity. Returns `false`
    /// if the connection is already gone.
    pub fn authenticate(
        &self,
        id: ConnectionId,
        user_id: UserId,
        session_token: Option<String>,
    ) -> bool {
        let _gate = self.gate();
        let previous = match self.by_id.get_mut(&id) {
            Some(mut conn) => {
                let previous = conn.user_id.replace(user_id.clone());
                conn.authenticated = true;
                conn.session_token = session_token;
                conn.handshake_pending = false;
                previous
            }
            None => return false,
        };

        if let Some(previous) = previous.filter(|p| *p != user_id) {
            self.unindex(&previous, id);
        }
        self.by_user.entry(user_id).or_default().insert(id);
        true
    }

    /// Mark a handshake as started. Returns `false` if the connection is gone.
    pub fn begin_handshake(&self, id: ConnectionId) -> bool {
        let _gate = self.gate();
        match self.by_id.get_mut(&id) {
            Some(mut conn) => {
                conn.handshake_pending = true;
                true
            }
            None => false,
        }
    }

    /// Clear the in-flight handshake flag.
    pub fn end_handshake(&self, id: ConnectionId) {
        let _gate = self.gate();
        if let Some(mut conn) = self.by_id.get_mut(&id) {
            conn.handshake_pending = false;
        }
    }

    /// Refresh the activity timestamp. Returns `false` if the connection is gone.
    pub fn touch(&self, id: ConnectionId) -> bool {
        self.touch_at(id, Utc::now())
    }

    /// Refresh the activity timestamp to `now`.
    pub fn touch_at(&self, id: ConnectionId, now: DateTime<Utc>) -> bool {
        match self.by_id.get_mut(&id) {
            Some(mut conn) => {
                conn.last_activity = now;
                true
            }
            None => false,
        }
    }

    /// Remove a connection from both indexes. Idempotent.
    pub fn remove(&self, id: ConnectionId) -> Option<Removal> {
        let _gate = self.gate();
        let user_id = self.by_id.get(&id)?.user_id.clone();

        let user_offline = match &user_id {
            Some(user) => self.unindex(user, id),
            None => false,
        };
        let (_, connection) = self.by_id.remove(&id)?;

        tracing::debug!(conn_id = %id, user_id = ?user_id, "Connection removed");
        Some(Removal {
            connection,
            user_offline,
        })
    }

    /// Drop `id` from the user's set. Returns `true` if the set became empty.
    fn unindex(&self, user_id: &UserId, id: ConnectionId) -> bool {
        let emptied = match self.by_user.get_mut(user_id) {
            Some(mut set) => {
                set.remove(&id);
                set.is_empty()
            }
            None => return false,
        };
        if emptied {
            self.by_user.remove(user_id);
        }
        emptied
    }

    /// Snapshot of one connection.
    pub fn find(&self, id: ConnectionId) -> Option<Connection> {
        self.by_id.get(&id).map(|entry| entry.value().clone())
    }

    /// Whether the connection is still registered.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Connection ids bound to a user.
    pub fn find_by_user(&self, user_id: &UserId) -> HashSet<ConnectionId> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Snapshot of every authenticated connection.
    pub fn all_authenticated(&self) -> Vec<Connection> {
        self.by_id
            .iter()
            .filter(|entry| entry.authenticated)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Snapshot of every connection.
    pub fn all(&self) -> Vec<Connection> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Ids of connections idle for longer than `threshold` at `now`.
    pub fn idle_connections(&self, now: DateTime<Utc>, threshold: Duration) -> Vec<ConnectionId> {
        self.by_id
            .iter()
            .filter(|entry| entry.idle_for(now) > threshold)
            .map(|entry| *entry.key())
            .collect()
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Number of authenticated connections.
    pub fn authenticated_count(&self) -> usize {
        self.by_id.iter().filter(|entry| entry.authenticated).count()
    }

    /// Number of distinct users online.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }
}
