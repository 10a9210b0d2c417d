//! Errors returned by buzzer operations
//!
//! Every rejected action maps to one of these. They are `Serialize` so the
//! router can hand them back to the caller inside a `{"error": …}`
//! acknowledgement instead of dropping the action silently.

use serde::Serialize;
use thiserror::Error;

use crate::names;

/// What a lookup failed to find
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Missing {
    /// No game with the requested id
    #[display("game")]
    Game,
    /// No player with the requested name in the game
    #[display("player")]
    Player,
    /// The connection was never registered, or has already disconnected
    #[display("connection")]
    Connection,
}

/// Errors that can occur while handling a connection event
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The caller lacks the role this action requires
    #[error("not authorized")]
    NotAuthorized,
    /// A referenced game, player or connection does not exist
    #[error("{0} not found")]
    NotFound(Missing),
    /// The connection already holds a conflicting binding, or the player is already claimed
    #[error("already bound")]
    AlreadyBound,
    /// The player has already buzzed this round
    #[error("already buzzed in")]
    AlreadyBuzzed,
    /// A player with this name already exists in the game
    #[error("name already in-use")]
    DuplicateName,
    /// The requested player name was refused
    #[error(transparent)]
    InvalidName(#[from] names::Error),
    /// The game has reached the maximum number of allowed players
    #[error("maximum number of players reached")]
    MaximumPlayers,
    /// The router has reached the maximum number of allowed games
    #[error("maximum number of games reached")]
    MaximumGames,
    /// Handling the event panicked before its change was applied
    #[error("internal error")]
    Internal,
}

impl Error {
    /// Whether this is a `NotFound`-class error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
