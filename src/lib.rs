//! # Quizroom Session Coordinator
//!
//! Core session logic for a synchronous multiplayer quiz system: one
//! host drives a quiz through timed questions while players join via a
//! short room code and submit answers in real time. The crate owns the
//! room lifecycle state machine, the connection registry, the answer
//! ledger with exactly-once acceptance and time-based scoring, and
//! leaderboard aggregation for many concurrent rooms.
//!
//! Transport (WebSocket routes), quiz authoring, and durable
//! persistence live outside this crate; they interact with it through
//! the [`coordinator::SessionCoordinator`] entry points, the
//! [`registry::Tunnel`] trait, and the [`quiz::QuizSource`] trait.

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod constants;
pub mod coordinator;
pub mod error;
pub mod leaderboard;
pub mod ledger;
pub mod quiz;
pub mod registry;
pub mod room;
pub mod room_code;
pub mod roster;

use leaderboard::LeaderboardEntry;
use quiz::{ChoiceId, QuestionPayload};
use registry::ParticipantId;
use room::GameSummary;

/// Messages received from connected clients.
///
/// Every inbound transport frame is one JSON object of the shape
/// `{"type": ..., "data": ...}`; the adjacently-tagged representation
/// below matches that envelope exactly.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum IncomingMessage {
    /// Host starts the game from the waiting screen
    StartGame {},
    /// Host manually advances past the current question
    NextQuestion {},
    /// Host force-ends the game
    EndGame {},
    /// Player submits an answer for the currently open question
    AnswerSubmitted {
        /// Index of the question this answer is for
        question_id: usize,
        /// Chosen choice, or `null` for the "no answer" sentinel
        choice_id: Option<ChoiceId>,
        /// Seconds elapsed between question open and submission
        time_taken: f64,
    },
}

impl IncomingMessage {
    /// Checks that a message type is allowed for the sender's role.
    ///
    /// Host control messages are only accepted from the room's host
    /// connection, answer submissions only from player connections.
    pub fn follows(&self, role: registry::Role) -> bool {
        matches!(
            (self, role),
            (
                IncomingMessage::StartGame {}
                    | IncomingMessage::NextQuestion {}
                    | IncomingMessage::EndGame {},
                registry::Role::Host,
            ) | (
                IncomingMessage::AnswerSubmitted { .. },
                registry::Role::Player
            )
        )
    }
}

/// Messages sent to connected clients.
///
/// Serialized as the `{"type": ..., "data": ...}` envelope, one object
/// per transport frame.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// A new player joined the room
    PlayerJoined {
        /// The joining player's id
        player_id: ParticipantId,
        /// The joining player's nickname
        nickname: String,
    },
    /// A player's connection dropped (the player record is kept)
    PlayerLeft {
        /// The leaving player's id
        player_id: ParticipantId,
        /// The leaving player's nickname
        nickname: String,
    },
    /// The game transitioned from waiting to active
    GameStarted {
        /// Title of the quiz being played
        quiz_title: String,
        /// Total number of questions in the quiz
        question_count: usize,
    },
    /// A question opened for answering
    Question(QuestionPayload),
    /// The current question closed; reveals the correct choice
    QuestionEnded {
        /// Id of the correct choice for the question that just closed
        correct_choice_id: ChoiceId,
    },
    /// (Host only) number of answers received for the open question
    AnswerCount {
        /// Players who have answered so far
        count: usize,
    },
    /// Current standings after a question closed
    LeaderboardUpdate {
        /// Ranked entries for every player in the room
        players: Vec<LeaderboardEntry>,
    },
    /// The host's connection dropped; the game keeps running and the
    /// host may reconnect and resume control
    HostDisconnected {},
    /// The game reached a terminal state
    GameEnded {
        /// Final ranked standings
        final_leaderboard: Vec<LeaderboardEntry>,
        /// Aggregate statistics for the finished game
        summary: GameSummary,
    },
    /// An error caused by the recipient's own message; never broadcast
    Error {
        /// Human-readable description of what was rejected
        message: String,
    },
}

impl OutboundMessage {
    /// Converts the message to a JSON string for transmission.
    ///
    /// # Panics
    ///
    /// Panics if serialization fails, which cannot happen for these
    /// variants under the default JSON serializer.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Converts wire seconds (`time_taken`) into a [`Duration`].
///
/// Returns `None` for values that cannot represent an elapsed time
/// (negative, NaN, or infinite).
pub(crate) fn duration_from_wire_seconds(seconds: f64) -> Option<Duration> {
    if seconds.is_finite() && seconds >= 0.0 {
        Some(Duration::from_secs_f64(seconds))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry::Role;

    #[test]
    fn test_incoming_message_envelope() {
        let message: IncomingMessage =
            serde_json::from_str(r#"{"type":"start_game","data":{}}"#).unwrap();
        assert!(matches!(message, IncomingMessage::StartGame {}));

        let message: IncomingMessage = serde_json::from_str(
            r#"{"type":"answer_submitted","data":{"question_id":2,"choice_id":null,"time_taken":3.5}}"#,
        )
        .unwrap();
        match message {
            IncomingMessage::AnswerSubmitted {
                question_id,
                choice_id,
                time_taken,
            } => {
                assert_eq!(question_id, 2);
                assert!(choice_id.is_none());
                assert!((time_taken - 3.5).abs() < f64::EPSILON);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_incoming_message_follows_role() {
        let start: IncomingMessage =
            serde_json::from_str(r#"{"type":"start_game","data":{}}"#).unwrap();
        assert!(start.follows(Role::Host));
        assert!(!start.follows(Role::Player));

        let answer: IncomingMessage = serde_json::from_str(
            r#"{"type":"answer_submitted","data":{"question_id":0,"choice_id":null,"time_taken":1.0}}"#,
        )
        .unwrap();
        assert!(answer.follows(Role::Player));
        assert!(!answer.follows(Role::Host));
    }

    #[test]
    fn test_outbound_message_envelope() {
        let message = OutboundMessage::Error {
            message: "nope".to_owned(),
        };
        assert_eq!(
            message.to_message(),
            r#"{"type":"error","data":{"message":"nope"}}"#
        );
    }

    #[test]
    fn test_duration_from_wire_seconds() {
        assert_eq!(
            duration_from_wire_seconds(1.5),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(duration_from_wire_seconds(0.0), Some(Duration::ZERO));
        assert_eq!(duration_from_wire_seconds(-0.1), None);
        assert_eq!(duration_from_wire_seconds(f64::NAN), None);
        assert_eq!(duration_from_wire_seconds(f64::INFINITY), None);
    }
}
