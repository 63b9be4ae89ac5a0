//! Error taxonomy for room operations.
//!
//! Every fallible room, ledger, and coordinator operation surfaces one
//! of these variants. At the router boundary they become an `error`
//! outbound message addressed to the offending sender only; connection
//! loss is deliberately absent because it is handled softly (the player
//! is marked disconnected, nothing is surfaced as an error).

use serde::Serialize;
use thiserror::Error;

/// Rejection reasons for room and answer operations.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomError {
    /// Room creation parameters were unusable
    #[error("invalid room configuration: {0}")]
    InvalidConfig(String),
    /// The room does not exist or is past the waiting phase
    #[error("room is not accepting players")]
    RoomNotJoinable,
    /// The nickname is already held by a connected player in this room
    #[error("nickname is already taken")]
    DuplicateNickname,
    /// The nickname is empty after trimming
    #[error("nickname cannot be empty")]
    EmptyNickname,
    /// The nickname exceeds the maximum length
    #[error("nickname is too long")]
    NicknameTooLong,
    /// The nickname failed the content filter
    #[error("nickname is inappropriate")]
    InappropriateNickname,
    /// The room reached its player capacity
    #[error("room is full")]
    RoomFull,
    /// The operation is not allowed in the room's current state
    #[error("operation not allowed in the current game state")]
    GameStateError,
    /// The answer targets a question that is not the open one
    #[error("question is not open for answers")]
    StaleQuestion,
    /// The player already has a recorded answer for this question
    #[error("answer already submitted for this question")]
    DuplicateAnswer,
    /// The submission payload itself was malformed
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            RoomError::DuplicateAnswer.to_string(),
            "answer already submitted for this question"
        );
        assert_eq!(
            RoomError::InvalidConfig("quiz has no questions".to_owned()).to_string(),
            "invalid room configuration: quiz has no questions"
        );
    }
}
