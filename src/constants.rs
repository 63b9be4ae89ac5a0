//! Configuration constants for the quizroom session coordinator
//!
//! This module contains all the limits and constraints used throughout
//! the coordinator to ensure data integrity and provide consistent
//! boundaries for rooms, quizzes, and answer acceptance.

/// Room configuration constants
pub mod room {
    use std::time::Duration;

    /// Number of characters in a room join code
    pub const CODE_LENGTH: usize = 6;
    /// Default player capacity of a room
    pub const DEFAULT_MAX_PLAYERS: usize = 50;
    /// Hard upper bound on a room's configured player capacity
    pub const MAX_PLAYER_COUNT: usize = 1000;
    /// How long terminal rooms are kept queryable before eviction
    pub const RETENTION: Duration = Duration::from_secs(24 * 60 * 60);
}

/// Quiz snapshot configuration constants
pub mod quiz {
    /// Maximum length of a quiz title in characters
    pub const MAX_TITLE_LENGTH: usize = 200;
    /// Maximum number of questions in a single quiz
    pub const MAX_QUESTION_COUNT: usize = 50;
    /// Maximum length of question and choice text in characters
    pub const MAX_TEXT_LENGTH: usize = 200;
    /// Minimum time limit in seconds for answering a question
    pub const MIN_TIME_LIMIT: u64 = 5;
    /// Maximum time limit in seconds for answering a question
    pub const MAX_TIME_LIMIT: u64 = 240;
    /// Minimum number of choices for a question
    pub const MIN_CHOICE_COUNT: usize = 2;
    /// Maximum number of choices for a question
    pub const MAX_CHOICE_COUNT: usize = 8;
}

/// Nickname configuration constants
pub mod nickname {
    /// Maximum length of a player nickname in characters
    pub const MAX_LENGTH: usize = 100;
}

/// Answer acceptance configuration constants
pub mod answer {
    use std::time::Duration;

    /// Slack allowed past the question deadline before a reported
    /// latency is rejected outright instead of clamped
    pub const LATENCY_GRACE: Duration = Duration::from_secs(2);
}
