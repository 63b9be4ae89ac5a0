//! Player records and the per-room nickname registry.
//!
//! A player record is created on a successful join and never deleted
//! for the lifetime of the room; connection loss only flips the
//! `connected` flag so the player keeps their identity and score across
//! reconnects. Nicknames are unique per room under case normalization
//! and are screened through a content filter.

use std::{collections::HashMap, time::SystemTime};

use rustrict::CensorStr;
use serde::Serialize;

use crate::{constants, error::RoomError, registry::ParticipantId};

/// One player of a room.
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    /// Stable identity, preserved across reconnects
    pub id: ParticipantId,
    /// Display name, unique within the room
    pub nickname: String,
    /// Whether the player currently has a live connection
    #[serde(rename = "is_connected")]
    pub connected: bool,
    /// When the player first joined
    #[serde(skip)]
    pub joined_at: SystemTime,
}

/// Outcome of a join: either a brand-new record or an existing
/// disconnected record reclaimed under the same nickname.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joined {
    /// A new player record was created
    New(ParticipantId),
    /// A disconnected player rejoined under their old nickname
    Rejoined(ParticipantId),
}

impl Joined {
    /// The id of the joined player, new or reclaimed.
    pub fn id(self) -> ParticipantId {
        match self {
            Joined::New(id) | Joined::Rejoined(id) => id,
        }
    }
}

/// Sanitizes and screens a prospective nickname.
///
/// Trims surrounding whitespace, rejects empty and over-long names, and
/// runs the content filter.
pub fn sanitize_nickname(nickname: &str) -> Result<String, RoomError> {
    let trimmed = nickname.trim();
    if trimmed.is_empty() {
        return Err(RoomError::EmptyNickname);
    }
    if trimmed.chars().count() > constants::nickname::MAX_LENGTH {
        return Err(RoomError::NicknameTooLong);
    }
    if trimmed.is_inappropriate() {
        return Err(RoomError::InappropriateNickname);
    }
    Ok(trimmed.to_owned())
}

/// All player records of one room, indexed by id and by normalized
/// nickname.
#[derive(Debug, Default)]
pub struct Roster {
    players: HashMap<ParticipantId, Player>,
    by_nickname: HashMap<String, ParticipantId>,
}

impl Roster {
    /// Adds a player under the given nickname.
    ///
    /// Fails with [`RoomError::DuplicateNickname`] when the normalized
    /// nickname is held by a *connected* player; a disconnected holder
    /// is reclaimed instead, restoring the old identity and score.
    pub fn join(&mut self, nickname: &str) -> Result<Joined, RoomError> {
        let nickname = sanitize_nickname(nickname)?;
        let normalized = nickname.to_lowercase();
        if let Some(&existing) = self.by_nickname.get(&normalized) {
            let player = self
                .players
                .get_mut(&existing)
                .ok_or(RoomError::DuplicateNickname)?;
            if player.connected {
                return Err(RoomError::DuplicateNickname);
            }
            player.connected = true;
            return Ok(Joined::Rejoined(existing));
        }
        let id = ParticipantId::new();
        self.players.insert(
            id,
            Player {
                id,
                nickname,
                connected: true,
                joined_at: SystemTime::now(),
            },
        );
        self.by_nickname.insert(normalized, id);
        Ok(Joined::New(id))
    }

    /// Looks up a player by id.
    pub fn get(&self, id: ParticipantId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Looks up the current holder of a nickname, if any.
    pub fn nickname_holder(&self, nickname: &str) -> Option<&Player> {
        let sanitized = sanitize_nickname(nickname).ok()?;
        let id = self.by_nickname.get(&sanitized.to_lowercase())?;
        self.players.get(id)
    }

    /// Whether the roster contains a record for this id.
    pub fn contains(&self, id: ParticipantId) -> bool {
        self.players.contains_key(&id)
    }

    /// Flips a player to disconnected, returning their record.
    pub fn mark_disconnected(&mut self, id: ParticipantId) -> Option<&Player> {
        let player = self.players.get_mut(&id)?;
        player.connected = false;
        Some(player)
    }

    /// Flips a player back to connected, returning their record.
    pub fn mark_connected(&mut self, id: ParticipantId) -> Option<&Player> {
        let player = self.players.get_mut(&id)?;
        player.connected = true;
        Some(player)
    }

    /// Number of player records, connected or not.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no player has ever joined.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Number of currently connected players.
    pub fn connected_count(&self) -> usize {
        self.players.values().filter(|p| p.connected).count()
    }

    /// Ids of currently connected players.
    pub fn connected_ids(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.players
            .values()
            .filter(|p| p.connected)
            .map(|p| p.id)
    }

    /// Iterates over all player records.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_creates_record() {
        let mut roster = Roster::default();
        let joined = roster.join("Alice").unwrap();
        assert!(matches!(joined, Joined::New(_)));
        let player = roster.get(joined.id()).unwrap();
        assert_eq!(player.nickname, "Alice");
        assert!(player.connected);
    }

    #[test]
    fn test_duplicate_nickname_case_normalized() {
        let mut roster = Roster::default();
        roster.join("Alice").unwrap();
        assert_eq!(roster.join("alice"), Err(RoomError::DuplicateNickname));
        assert_eq!(roster.join(" ALICE "), Err(RoomError::DuplicateNickname));
    }

    #[test]
    fn test_disconnected_nickname_is_reclaimed() {
        let mut roster = Roster::default();
        let first = roster.join("Alice").unwrap().id();
        roster.mark_disconnected(first);

        let rejoined = roster.join("alice").unwrap();
        assert_eq!(rejoined, Joined::Rejoined(first));
        assert!(roster.get(first).unwrap().connected);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_nickname_sanitization() {
        let mut roster = Roster::default();
        assert_eq!(roster.join("   "), Err(RoomError::EmptyNickname));
        assert_eq!(
            roster.join(&"x".repeat(constants::nickname::MAX_LENGTH + 1)),
            Err(RoomError::NicknameTooLong)
        );
        let joined = roster.join("  Bob  ").unwrap();
        assert_eq!(roster.get(joined.id()).unwrap().nickname, "Bob");
    }

    #[test]
    fn test_inappropriate_nickname_rejected() {
        let mut roster = Roster::default();
        assert_eq!(
            roster.join("fuck"),
            Err(RoomError::InappropriateNickname)
        );
    }

    #[test]
    fn test_connected_count_tracks_disconnects() {
        let mut roster = Roster::default();
        let a = roster.join("Alice").unwrap().id();
        roster.join("Bob").unwrap();
        assert_eq!(roster.connected_count(), 2);
        roster.mark_disconnected(a);
        assert_eq!(roster.connected_count(), 1);
        assert_eq!(roster.len(), 2);
        roster.mark_connected(a);
        assert_eq!(roster.connected_count(), 2);
    }
}
