//! Session coordinator and event router.
//!
//! The coordinator owns every live room and is the single entry point
//! for the transport and HTTP layers: inbound frames are routed to the
//! right room operation, produced events fan out through the connection
//! registry, and question deadlines run as one cancellable timer task
//! per room.
//!
//! Locking model: each room sits behind its own mutex, so transitions
//! of one room serialize while rooms stay fully parallel. Events are
//! delivered while the room lock is held, which keeps per-room message
//! order identical to transition order. The room map and the registry
//! have their own independent locks and are never held across a room
//! transition's full critical section in a conflicting order.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
    time::{Duration, SystemTime},
};

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::{
    IncomingMessage, OutboundMessage,
    error::RoomError,
    leaderboard::LeaderboardEntry,
    quiz::{QuizSnapshot, QuizSource},
    registry::{ConnectionRegistry, ParticipantId, Role, Tunnel},
    room::{AlarmMessage, Event, Recipient, Room, Status},
    room_code::RoomCode,
    roster::Player,
};

/// Handle returned to the creator of a room.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CreatedRoom {
    /// The join code players type in
    pub code: RoomCode,
    /// The id the host must present on its connection
    pub host_id: ParticipantId,
}

/// One room plus its deadline timer slot.
struct RoomEntry {
    room: Mutex<Room>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// Owns all live rooms and routes traffic between them and the
/// transport layer.
pub struct SessionCoordinator<T: Tunnel> {
    rooms: RwLock<HashMap<RoomCode, Arc<RoomEntry>>>,
    registry: ConnectionRegistry<T>,
}

impl<T: Tunnel> SessionCoordinator<T> {
    /// Creates a coordinator with no rooms.
    ///
    /// Returned in an [`Arc`] because timer tasks keep their own
    /// handle to it.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rooms: RwLock::new(HashMap::new()),
            registry: ConnectionRegistry::new(),
        })
    }

    fn entry(&self, code: RoomCode) -> Option<Arc<RoomEntry>> {
        self.rooms
            .read()
            .expect("room map lock poisoned")
            .get(&code)
            .cloned()
    }

    /// Creates a room over a quiz snapshot and returns its join code
    /// and host credential.
    pub fn create_room(
        &self,
        quiz: Arc<QuizSnapshot>,
        host_name: &str,
        max_players: usize,
    ) -> Result<CreatedRoom, RoomError> {
        let mut rooms = self.rooms.write().expect("room map lock poisoned");
        let code = loop {
            let candidate = RoomCode::new();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let room = Room::new(code, quiz, host_name, max_players)?;
        let host_id = room.host_id();
        rooms.insert(
            code,
            Arc::new(RoomEntry {
                room: Mutex::new(room),
                timer: Mutex::new(None),
            }),
        );
        tracing::info!(room = %code, "room created");
        Ok(CreatedRoom { code, host_id })
    }

    /// Creates a room by resolving a quiz id through the storage layer.
    pub fn create_room_from_source(
        &self,
        source: &impl QuizSource,
        quiz_id: &str,
        host_name: &str,
        max_players: usize,
    ) -> Result<CreatedRoom, RoomError> {
        let quiz = source
            .quiz_by_id(quiz_id)
            .ok_or_else(|| RoomError::InvalidConfig(format!("unknown quiz: {quiz_id}")))?;
        self.create_room(quiz, host_name, max_players)
    }

    /// Admits a player into a waiting room, announcing them to everyone
    /// already connected.
    pub fn join_room(&self, code: RoomCode, nickname: &str) -> Result<ParticipantId, RoomError> {
        let entry = self.entry(code).ok_or(RoomError::RoomNotJoinable)?;
        let mut room = entry.room.lock().expect("room lock poisoned");
        let (player_id, events) = room.join(nickname)?;
        self.deliver(code, &events);
        Ok(player_id)
    }

    /// Attaches a participant's outbound sink.
    ///
    /// Returns `false` when the room does not exist or the id is not a
    /// known participant of it. Re-attaching an id that already has a
    /// sink replaces the old one silently (reconnect); no second
    /// `player_joined` is emitted.
    pub fn connect(
        &self,
        code: RoomCode,
        participant: ParticipantId,
        role: Role,
        tunnel: T,
    ) -> bool {
        let Some(entry) = self.entry(code) else {
            return false;
        };
        let mut room = entry.room.lock().expect("room lock poisoned");
        let known = match role {
            Role::Host => participant == room.host_id(),
            Role::Player => room.has_player(participant),
        };
        if !known {
            return false;
        }
        self.registry.register(code, participant, role, tunnel);
        room.reconnect(participant);
        true
    }

    /// Handles a dropped connection.
    ///
    /// Soft: the sink is removed, the participant is marked
    /// disconnected, and the room is told so it can announce the loss.
    /// Scores and records stay.
    pub fn disconnect(&self, code: RoomCode, participant: ParticipantId) {
        let Some(entry) = self.entry(code) else {
            return;
        };
        self.registry.unregister(code, participant);
        let mut room = entry.room.lock().expect("room lock poisoned");
        let events = room.disconnect(participant);
        self.deliver(code, &events);
    }

    /// Routes one raw inbound frame.
    ///
    /// Malformed JSON earns the sender an `error` message and touches
    /// no state.
    pub fn handle_inbound_text(
        self: &Arc<Self>,
        code: RoomCode,
        participant: ParticipantId,
        role: Role,
        text: &str,
    ) {
        match serde_json::from_str::<IncomingMessage>(text) {
            Ok(message) => self.handle_inbound(code, participant, role, message),
            Err(error) => {
                tracing::debug!(room = %code, player_id = %participant, %error, "malformed frame");
                self.send_error(code, participant, "malformed message");
            }
        }
    }

    /// Routes one inbound message to the room it targets.
    ///
    /// A message whose type does not fit the sender's role, or a host
    /// message from a connection that is not the room's host, is
    /// rejected with an `error` to the sender only and mutates nothing.
    pub fn handle_inbound(
        self: &Arc<Self>,
        code: RoomCode,
        participant: ParticipantId,
        role: Role,
        message: IncomingMessage,
    ) {
        let Some(entry) = self.entry(code) else {
            self.send_error(code, participant, "room not found");
            return;
        };
        if !message.follows(role) {
            self.send_error(code, participant, "message not allowed for this role");
            return;
        }
        let mut alarms: Vec<(AlarmMessage, Duration)> = vec![];
        let mut schedule = |alarm: AlarmMessage, after: Duration| alarms.push((alarm, after));
        let mut room = entry.room.lock().expect("room lock poisoned");
        if role == Role::Host && participant != room.host_id() {
            drop(room);
            self.send_error(code, participant, "not the host of this room");
            return;
        }
        let result = match message {
            IncomingMessage::StartGame {} => room.start(&mut schedule),
            IncomingMessage::NextQuestion {} => room.advance(&mut schedule),
            IncomingMessage::EndGame {} => room.end(),
            IncomingMessage::AnswerSubmitted {
                question_id,
                choice_id,
                time_taken,
            } => room.submit_answer(participant, question_id, choice_id, time_taken, &mut schedule),
        };
        match result {
            Ok(events) => self.apply(code, &entry, &room, &events, alarms),
            Err(error) => {
                drop(room);
                tracing::debug!(room = %code, player_id = %participant, %error, "message rejected");
                self.send_error(code, participant, &error.to_string());
            }
        }
    }

    /// Delivers a transition's events and re-arms the deadline timer,
    /// all under the room lock so per-room order is preserved.
    fn apply(
        self: &Arc<Self>,
        code: RoomCode,
        entry: &Arc<RoomEntry>,
        room: &Room,
        events: &[Event],
        alarms: Vec<(AlarmMessage, Duration)>,
    ) {
        self.deliver(code, events);
        if room.status().is_terminal() {
            self.clear_timer(entry);
        }
        for (alarm, after) in alarms {
            self.arm_timer(code, entry, alarm, after);
        }
    }

    fn deliver(&self, code: RoomCode, events: &[Event]) {
        for event in events {
            match event.to {
                Recipient::All => self.registry.broadcast(code, &event.message, None),
                Recipient::Players => {
                    self.registry.broadcast(code, &event.message, Some(Role::Host));
                }
                Recipient::Host => self.registry.send_to_host(code, &event.message),
                Recipient::Player(id) => self.registry.send_to(code, id, &event.message),
            }
        }
    }

    fn send_error(&self, code: RoomCode, participant: ParticipantId, message: &str) {
        self.registry.send_to(
            code,
            participant,
            &OutboundMessage::Error {
                message: message.to_owned(),
            },
        );
    }

    /// Arms the room's single timer slot, aborting whatever was armed
    /// before. Must run inside a tokio runtime.
    fn arm_timer(
        self: &Arc<Self>,
        code: RoomCode,
        entry: &Arc<RoomEntry>,
        alarm: AlarmMessage,
        after: Duration,
    ) {
        let coordinator = Arc::clone(self);
        let sleep = tokio::time::sleep(after);
        let handle = tokio::spawn(async move {
            sleep.await;
            coordinator.fire_alarm(code, alarm);
        });
        let mut timer = entry.timer.lock().expect("timer lock poisoned");
        if let Some(old) = timer.replace(handle) {
            old.abort();
        }
    }

    fn clear_timer(&self, entry: &RoomEntry) {
        let mut timer = entry.timer.lock().expect("timer lock poisoned");
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }

    /// Applies a fired deadline to its room.
    ///
    /// A stale alarm is a no-op inside the room; a failing advance
    /// cancels this room only.
    fn fire_alarm(self: &Arc<Self>, code: RoomCode, alarm: AlarmMessage) {
        let Some(entry) = self.entry(code) else {
            return;
        };
        let mut alarms: Vec<(AlarmMessage, Duration)> = vec![];
        let mut room = entry.room.lock().expect("room lock poisoned");
        match room.receive_alarm(alarm, &mut |alarm, after| alarms.push((alarm, after))) {
            Ok(events) => self.apply(code, &entry, &room, &events, alarms),
            Err(error) => {
                tracing::error!(room = %code, %error, "deadline advance failed, cancelling room");
                let events = room.cancel();
                self.deliver(code, &events);
                self.clear_timer(&entry);
            }
        }
    }

    /// All player records of a room, or `None` for an unknown code.
    pub fn room_players(&self, code: RoomCode) -> Option<Vec<Player>> {
        let entry = self.entry(code)?;
        let room = entry.room.lock().expect("room lock poisoned");
        Some(room.players())
    }

    /// Current standings of a room, or `None` for an unknown code.
    pub fn room_leaderboard(&self, code: RoomCode) -> Option<Vec<LeaderboardEntry>> {
        let entry = self.entry(code)?;
        let room = entry.room.lock().expect("room lock poisoned");
        Some(room.leaderboard())
    }

    /// Lifecycle phase of a room, or `None` for an unknown code.
    pub fn room_status(&self, code: RoomCode) -> Option<Status> {
        let entry = self.entry(code)?;
        let room = entry.room.lock().expect("room lock poisoned");
        Some(room.status())
    }

    /// Tears a room down immediately: timer aborted, sinks closed,
    /// entry forgotten.
    pub fn destroy_room(&self, code: RoomCode) {
        let removed = self
            .rooms
            .write()
            .expect("room map lock poisoned")
            .remove(&code);
        if let Some(entry) = removed {
            self.clear_timer(&entry);
            self.registry.close_room(code);
            tracing::info!(room = %code, "room destroyed");
        }
    }

    /// Evicts every terminal room that ended at least `retention` ago.
    ///
    /// Meant to run periodically; [`crate::constants::room::RETENTION`]
    /// is the stock window.
    pub fn evict_expired(&self, retention: Duration) -> usize {
        let expired: Vec<RoomCode> = {
            let rooms = self.rooms.read().expect("room map lock poisoned");
            rooms
                .iter()
                .filter(|(_, entry)| {
                    let room = entry.room.lock().expect("room lock poisoned");
                    room.status().is_terminal()
                        && room.ended_at().is_some_and(|ended| {
                            SystemTime::now()
                                .duration_since(ended)
                                .is_ok_and(|elapsed| elapsed >= retention)
                        })
                })
                .map(|(code, _)| *code)
                .collect()
        };
        let evicted = expired.len();
        for code in expired {
            self.destroy_room(code);
        }
        if evicted > 0 {
            tracing::info!(evicted, "expired rooms evicted");
        }
        evicted
    }
}
