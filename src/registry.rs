//! Connection registry and transport seam.
//!
//! This module tracks the outbound message sink of every participant in
//! every room and provides targeted, host-only, and room-wide delivery.
//! The actual transport hides behind the [`Tunnel`] trait so the crate
//! stays independent of the WebSocket layer; [`ChannelTunnel`] is the
//! stock implementation over a bounded tokio channel.
//!
//! All delivery is best-effort. A missing participant or a saturated or
//! closed sink is logged at debug level and never fails the game
//! transition that produced the message.

use std::{collections::HashMap, fmt::Display, str::FromStr, sync::RwLock};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;

use crate::{OutboundMessage, room_code::RoomCode};

/// A unique identifier for participants in a room
///
/// Each participant (the host or a player) gets a unique ID that
/// persists across reconnects for the lifetime of the room.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    /// Creates a new random participant ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParticipantId {
    /// Creates a new random participant ID (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ParticipantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The capacity in which a participant is connected to a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The session driver; connects on the host-scoped address
    Host,
    /// A contestant
    Player,
}

/// An outbound message sink for one connected participant.
///
/// Implementations must not block: delivery happens while room state is
/// locked, so a slow consumer has to be absorbed by buffering or
/// dropping, never by waiting.
pub trait Tunnel: Send + Sync + 'static {
    /// Attempts to deliver one message; `false` means the sink is
    /// closed or saturated and the message was dropped.
    fn send_message(&self, message: &OutboundMessage) -> bool;

    /// Consumes the tunnel, releasing its transport resources.
    fn close(self);
}

/// Per-room sinks: at most one host plus any number of players.
struct RoomSinks<T: Tunnel> {
    host: Option<(ParticipantId, T)>,
    players: HashMap<ParticipantId, T>,
}

impl<T: Tunnel> Default for RoomSinks<T> {
    fn default() -> Self {
        Self {
            host: None,
            players: HashMap::new(),
        }
    }
}

/// Tracks every connected participant's sink across all rooms.
///
/// Interior locking is a single [`RwLock`] independent of the per-room
/// game-logic mutexes, so delivery never contends with unrelated rooms'
/// transitions.
pub struct ConnectionRegistry<T: Tunnel> {
    rooms: RwLock<HashMap<RoomCode, RoomSinks<T>>>,
}

impl<T: Tunnel> Default for ConnectionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Tunnel> ConnectionRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Associates a participant with an outbound sink.
    ///
    /// Registering an id that already has a sink closes the old one and
    /// takes over silently; this is how reconnection works.
    pub fn register(&self, room: RoomCode, participant: ParticipantId, role: Role, tunnel: T) {
        let mut rooms = self.rooms.write().expect("registry lock poisoned");
        let sinks = rooms.entry(room).or_default();
        let replaced = match role {
            Role::Host => sinks.host.replace((participant, tunnel)).map(|(_, old)| old),
            Role::Player => sinks.players.insert(participant, tunnel),
        };
        if let Some(old) = replaced {
            tracing::debug!(room = %room, player_id = %participant, "replacing existing sink");
            old.close();
        }
    }

    /// Removes a participant's sink, reporting the role it held.
    pub fn unregister(&self, room: RoomCode, participant: ParticipantId) -> Option<Role> {
        let mut rooms = self.rooms.write().expect("registry lock poisoned");
        let sinks = rooms.get_mut(&room)?;
        if let Some((host_id, _)) = sinks.host
            && host_id == participant
        {
            if let Some((_, tunnel)) = sinks.host.take() {
                tunnel.close();
            }
            return Some(Role::Host);
        }
        let tunnel = sinks.players.remove(&participant)?;
        tunnel.close();
        Some(Role::Player)
    }

    /// Whether the participant currently has a registered sink.
    pub fn is_registered(&self, room: RoomCode, participant: ParticipantId) -> bool {
        let rooms = self.rooms.read().expect("registry lock poisoned");
        rooms.get(&room).is_some_and(|sinks| {
            sinks.players.contains_key(&participant)
                || sinks.host.as_ref().is_some_and(|(id, _)| *id == participant)
        })
    }

    /// Delivers a message to one participant, host or player.
    pub fn send_to(&self, room: RoomCode, participant: ParticipantId, message: &OutboundMessage) {
        let rooms = self.rooms.read().expect("registry lock poisoned");
        let Some(sinks) = rooms.get(&room) else {
            tracing::debug!(room = %room, "send to unknown room dropped");
            return;
        };
        let tunnel = match &sinks.host {
            Some((id, tunnel)) if *id == participant => Some(tunnel),
            _ => sinks.players.get(&participant),
        };
        match tunnel {
            Some(tunnel) => {
                if !tunnel.send_message(message) {
                    tracing::debug!(room = %room, player_id = %participant, "sink closed or full, message dropped");
                }
            }
            None => {
                tracing::debug!(room = %room, player_id = %participant, "send to unknown participant dropped");
            }
        }
    }

    /// Delivers a message to the room's host, if connected.
    pub fn send_to_host(&self, room: RoomCode, message: &OutboundMessage) {
        let rooms = self.rooms.read().expect("registry lock poisoned");
        let Some((_, tunnel)) = rooms.get(&room).and_then(|sinks| sinks.host.as_ref()) else {
            tracing::debug!(room = %room, "host not connected, message dropped");
            return;
        };
        if !tunnel.send_message(message) {
            tracing::debug!(room = %room, "host sink closed or full, message dropped");
        }
    }

    /// Delivers a message to everyone in the room, optionally skipping
    /// one role.
    pub fn broadcast(&self, room: RoomCode, message: &OutboundMessage, exclude: Option<Role>) {
        let rooms = self.rooms.read().expect("registry lock poisoned");
        let Some(sinks) = rooms.get(&room) else {
            return;
        };
        if exclude != Some(Role::Host)
            && let Some((_, tunnel)) = &sinks.host
            && !tunnel.send_message(message)
        {
            tracing::debug!(room = %room, "host sink closed or full, broadcast dropped");
        }
        if exclude != Some(Role::Player) {
            for (participant, tunnel) in &sinks.players {
                if !tunnel.send_message(message) {
                    tracing::debug!(room = %room, player_id = %participant, "sink closed or full, broadcast dropped");
                }
            }
        }
    }

    /// Closes every sink of a room and forgets the room.
    pub fn close_room(&self, room: RoomCode) {
        let mut rooms = self.rooms.write().expect("registry lock poisoned");
        if let Some(sinks) = rooms.remove(&room) {
            if let Some((_, tunnel)) = sinks.host {
                tunnel.close();
            }
            for (_, tunnel) in sinks.players {
                tunnel.close();
            }
        }
    }
}

/// Default channel capacity for [`ChannelTunnel`].
const CHANNEL_CAPACITY: usize = 256;

/// A [`Tunnel`] over a bounded tokio channel carrying JSON frames.
///
/// The transport layer owns the receiving half and forwards each string
/// to the socket. `try_send` keeps delivery non-blocking: if a consumer
/// falls [`CHANNEL_CAPACITY`] messages behind, further messages are
/// dropped until it catches up.
#[derive(Clone)]
pub struct ChannelTunnel {
    sender: tokio::sync::mpsc::Sender<String>,
}

impl ChannelTunnel {
    /// Creates a tunnel and the receiver the transport should drain.
    pub fn new() -> (Self, tokio::sync::mpsc::Receiver<String>) {
        let (sender, receiver) = tokio::sync::mpsc::channel(CHANNEL_CAPACITY);
        (Self { sender }, receiver)
    }
}

impl Tunnel for ChannelTunnel {
    fn send_message(&self, message: &OutboundMessage) -> bool {
        self.sender.try_send(message.to_message()).is_ok()
    }

    fn close(self) {
        // dropping the sender closes the channel once all clones are gone
        drop(self);
    }
}
