//! Game ID allocation and management
//!
//! Game IDs identify buzzer sessions. They are handed out in strictly
//! increasing order by a [`GameIdAllocator`] and never reused for the
//! lifetime of the allocator, so an id that belonged to a torn-down game
//! can never silently resolve to a newer one.

use std::{fmt::Display, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Serialize};

/// A unique identifier for a game session
///
/// Serialized as a plain number, which is what clients type in to join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(u64);

impl GameId {
    /// Wraps a raw identifier received from a client
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw numeric value
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GameId {
    type Err = ParseIntError;

    /// Parses a game ID from its decimal representation
    ///
    /// # Errors
    ///
    /// Returns a `ParseIntError` if the string is not a valid decimal number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Hands out monotonically increasing game IDs starting at 1
#[derive(Debug)]
pub struct GameIdAllocator {
    next: u64,
}

impl Default for GameIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl GameIdAllocator {
    /// Allocates the next unused game ID
    pub fn allocate(&mut self) -> GameId {
        let id = GameId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}
