//! Short human-typed room codes.
//!
//! A room code is the join handle players type on their devices: six
//! characters drawn from `A-Z0-9`, e.g. `K7Q2ZD`. Codes are random and
//! uniqueness is enforced by the coordinator at creation time.

use std::{fmt::Display, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

use crate::constants::room::CODE_LENGTH;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A six-character room join code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct RoomCode([u8; CODE_LENGTH]);

impl RoomCode {
    /// Generates a fresh random code.
    ///
    /// Collisions are possible and must be retried by the caller that
    /// owns the room map.
    pub fn new() -> Self {
        let mut code = [0u8; CODE_LENGTH];
        for byte in &mut code {
            *byte = ALPHABET[fastrand::usize(..ALPHABET.len())];
        }
        Self(code)
    }
}

impl Default for RoomCode {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // the alphabet is ASCII, so the bytes are always valid UTF-8
        f.write_str(std::str::from_utf8(&self.0).map_err(|_| std::fmt::Error)?)
    }
}

/// Reason a string failed to parse as a [`RoomCode`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseRoomCodeError {
    /// The input is not exactly [`CODE_LENGTH`] characters
    #[error("room code must be {CODE_LENGTH} characters")]
    WrongLength,
    /// The input contains a character outside `A-Z0-9`
    #[error("room code may only contain A-Z and 0-9")]
    InvalidCharacter,
}

impl FromStr for RoomCode {
    type Err = ParseRoomCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bytes: [u8; CODE_LENGTH] = upper
            .as_bytes()
            .try_into()
            .map_err(|_| ParseRoomCodeError::WrongLength)?;
        if bytes.iter().all(|b| ALPHABET.contains(b)) {
            Ok(Self(bytes))
        } else {
            Err(ParseRoomCodeError::InvalidCharacter)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_code_format() {
        for _ in 0..100 {
            let code = RoomCode::new().to_string();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_roundtrip() {
        let code = RoomCode::new();
        let parsed = RoomCode::from_str(&code.to_string()).unwrap();
        assert_eq!(code, parsed);
    }

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let parsed = RoomCode::from_str(" k7q2zd ").unwrap();
        assert_eq!(parsed.to_string(), "K7Q2ZD");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            RoomCode::from_str("ABC"),
            Err(ParseRoomCodeError::WrongLength)
        );
        assert_eq!(
            RoomCode::from_str("AB-12D"),
            Err(ParseRoomCodeError::InvalidCharacter)
        );
    }

    #[test]
    fn test_serde_as_string() {
        let code = RoomCode::from_str("K7Q2ZD").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), r#""K7Q2ZD""#);
        let back: RoomCode = serde_json::from_str(r#""k7q2zd""#).unwrap();
        assert_eq!(back, code);
    }
}
