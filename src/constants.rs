//! Configuration constants for the buzzer system
//!
//! These are the compile-time bounds that [`crate::config::Options`] is
//! validated against, along with the defaults it falls back to.

/// Game-level limits
pub mod game {
    /// Default and upper bound on the number of players in a single game
    pub const MAX_PLAYER_COUNT: usize = 1000;
    /// Default number of games a router will hold at once
    pub const DEFAULT_MAX_GAMES: usize = 4096;
    /// Upper bound on the number of games a router may be configured for
    pub const MAX_GAMES: usize = 65_535;
}

/// Player name limits
pub mod name {
    /// Default maximum length of a player name in bytes
    pub const DEFAULT_MAX_LENGTH: usize = 30;
    /// Upper bound on the configurable name length
    pub const MAX_LENGTH: usize = 100;
}

/// Buzz rank constants
pub mod buzz {
    /// Rank held by a player that has not buzzed this round
    pub const UNBUZZED: u32 = 0;
    /// Rank handed to the first player to buzz after a reset
    pub const FIRST_RANK: u32 = 1;
}
