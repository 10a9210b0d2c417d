//! Connection identities and the connection binding table
//!
//! Every live transport connection is registered here together with the role
//! it currently plays: not yet scoped to a game, owning a game, watching a
//! game's room, or bound to a named player inside a game. This table is the
//! only place a connection's game is recovered from, so no scope has to be
//! inferred from room names or by scanning rosters.

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    str::FromStr,
};

use enum_map::{Enum, EnumMap};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;

use crate::game_id::GameId;

/// A unique identifier for a transport connection
///
/// This is the only identity primitive the router trusts. It never leaves the
/// router in roster payloads.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ConnectionId {
    type Err = uuid::Error;

    /// Parses a connection ID from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The role a connection currently plays
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Connected but not scoped to any game
    Unassigned,
    /// Created and owns the game
    Owner(GameId),
    /// Joined the game's room without claiming a player
    Spectator(GameId),
    /// Joined the game's room and claimed the named player
    Player {
        /// Game the player belongs to
        game_id: GameId,
        /// Name of the claimed player
        name: String,
    },
}

/// The kind of role without associated data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum ValueKind {
    /// Not scoped to any game
    Unassigned,
    /// Owns a game
    Owner,
    /// Watches a game
    Spectator,
    /// Bound to a player
    Player,
}

impl Value {
    /// Returns the kind of this value without the associated data
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Unassigned => ValueKind::Unassigned,
            Value::Owner(_) => ValueKind::Owner,
            Value::Spectator(_) => ValueKind::Spectator,
            Value::Player { .. } => ValueKind::Player,
        }
    }

    /// The game whose room this connection is scoped to, if any
    pub fn game_id(&self) -> Option<GameId> {
        match self {
            Value::Unassigned => None,
            Value::Owner(game_id) | Value::Spectator(game_id) | Value::Player { game_id, .. } => {
                Some(*game_id)
            }
        }
    }
}

/// Number of connections holding each kind of role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Census {
    /// Connected but not scoped to a game
    pub unassigned: usize,
    /// Owning a game
    pub owners: usize,
    /// Watching a game
    pub spectators: usize,
    /// Bound to a player
    pub players: usize,
}

impl Display for Census {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} unassigned, {} owners, {} spectators, {} players",
            self.unassigned, self.owners, self.spectators, self.players
        )
    }
}

/// The connection binding table
///
/// Maps each live connection to its [`Value`], with a reverse index by
/// [`ValueKind`] so the per-role [`Census`] stays cheap.
#[derive(Debug, Default)]
pub struct Connections {
    mapping: HashMap<ConnectionId, Value>,
    reverse_mapping: EnumMap<ValueKind, HashSet<ConnectionId>>,
}

impl Connections {
    /// Registers a new connection as [`Value::Unassigned`]
    ///
    /// Returns `false` if the connection was already registered, in which case
    /// its current role is left alone.
    pub fn add(&mut self, connection: ConnectionId) -> bool {
        if self.mapping.contains_key(&connection) {
            return false;
        }
        self.mapping.insert(connection, Value::Unassigned);
        self.reverse_mapping[ValueKind::Unassigned].insert(connection);
        true
    }

    /// Changes the role of a registered connection
    ///
    /// Unknown connections are ignored.
    pub fn update(&mut self, connection: ConnectionId, value: Value) {
        let old_kind = match self.mapping.get(&connection) {
            Some(v) => v.kind(),
            _ => return,
        };
        let new_kind = value.kind();
        if old_kind != new_kind {
            self.reverse_mapping[old_kind].remove(&connection);
            self.reverse_mapping[new_kind].insert(connection);
        }
        self.mapping.insert(connection, value);
    }

    /// Removes a connection, returning the role it had
    pub fn remove(&mut self, connection: ConnectionId) -> Option<Value> {
        let value = self.mapping.remove(&connection)?;
        self.reverse_mapping[value.kind()].remove(&connection);
        Some(value)
    }

    /// The role of a connection, if it is registered
    pub fn get(&self, connection: ConnectionId) -> Option<&Value> {
        self.mapping.get(&connection)
    }

    /// Whether the connection is registered
    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.mapping.contains_key(&connection)
    }

    /// The game and player name a connection is bound to, if any
    pub fn bound_player(&self, connection: ConnectionId) -> Option<(GameId, &str)> {
        match self.mapping.get(&connection)? {
            Value::Player { game_id, name } => Some((*game_id, name.as_str())),
            _ => None,
        }
    }

    /// Number of connections currently holding the given kind of role
    pub fn specific_count(&self, filter: ValueKind) -> usize {
        self.reverse_mapping[filter].len()
    }

    /// Connection counts for every kind of role
    pub fn census(&self) -> Census {
        Census {
            unassigned: self.specific_count(ValueKind::Unassigned),
            owners: self.specific_count(ValueKind::Owner),
            spectators: self.specific_count(ValueKind::Spectator),
            players: self.specific_count(ValueKind::Player),
        }
    }

    /// Total number of registered connections
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Whether no connections are registered
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}
