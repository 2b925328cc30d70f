use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::participant::Role;

/// Length of a canonical room code.
pub const ROOM_CODE_LEN: usize = 6;

const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("room codes are 6 letters or digits, got {0:?}")]
pub struct InvalidRoomCode(pub String);

/// Normalized six-character room identifier (`A`-`Z`, `0`-`9`).
///
/// Raw input is trimmed and case-folded once, on entry; everything past
/// this type only ever sees the canonical uppercase form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Validates raw user input and normalizes it into a canonical code.
    pub fn parse(input: &str) -> Result<Self, InvalidRoomCode> {
        let normalized = input.trim().to_ascii_uppercase();
        let valid = normalized.len() == ROOM_CODE_LEN
            && normalized
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if valid {
            Ok(Self(normalized))
        } else {
            Err(InvalidRoomCode(input.to_string()))
        }
    }

    /// Uppercases and strips characters that can never appear in a code,
    /// truncating to code length. Meant for live input fields.
    pub fn sanitize(input: &str) -> String {
        input
            .chars()
            .map(|c| c.to_ascii_uppercase())
            .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            .take(ROOM_CODE_LEN)
            .collect()
    }

    /// Mints a random code. The relay normally assigns codes; this exists
    /// for relays that accept client-proposed rooms, and for tests.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let code = (0..ROOM_CODE_LEN)
            .map(|_| {
                let idx = rand::Rng::gen_range(&mut rng, 0..ROOM_CODE_CHARSET.len());
                ROOM_CODE_CHARSET[idx] as char
            })
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = InvalidRoomCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

/// Snapshot of the room a session currently occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub role: Role,
    pub participant_count: u32,
}
