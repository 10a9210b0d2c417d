//! Player records and the per-game roster
//!
//! A player is a named slot inside a game. The owner creates slots, and a
//! connection claims one by selecting it. Claims are released when the
//! connection goes away, but the slot and its name stay on the roster.

use indexmap::{IndexMap, map::Entry};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    connection::ConnectionId,
    constants,
    error::{Error, Missing},
    names::{self, NameRules},
};

/// One named participant inside a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    name: String,
    connection: Option<ConnectionId>,
    buzz: u32,
}

impl Player {
    fn new(name: String) -> Self {
        Self {
            name,
            connection: None,
            buzz: constants::buzz::UNBUZZED,
        }
    }

    /// The player's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The connection that claimed this player, if any
    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    /// Whether a connection has claimed this player
    pub fn is_claimed(&self) -> bool {
        self.connection.is_some()
    }

    /// The player's rank this round, `0` if they have not buzzed
    pub fn buzz(&self) -> u32 {
        self.buzz
    }

    /// Whether the player has buzzed this round
    pub fn has_buzzed(&self) -> bool {
        self.buzz != constants::buzz::UNBUZZED
    }

    pub(crate) fn set_buzz(&mut self, rank: u32) {
        self.buzz = rank;
    }

    /// The public view of this player, without the connection identity
    pub fn message(&self) -> PlayerMessage {
        PlayerMessage {
            name: self.name.clone(),
            buzz: self.buzz,
            claimed: self.is_claimed(),
        }
    }
}

/// A player as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMessage {
    /// The player's name
    pub name: String,
    /// Buzz rank this round, `0` if not buzzed
    pub buzz: u32,
    /// Whether some connection has claimed the player
    pub claimed: bool,
}

/// The ordered set of players in a game
///
/// Iteration order is the order players were added, which is also the
/// order clients display them in.
#[derive(Debug, Default)]
pub struct Roster {
    players: IndexMap<String, Player>,
}

impl Roster {
    /// Adds a new, unclaimed player
    ///
    /// Returns the cleaned name that was stored.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidName` - The name failed validation
    /// * `Error::DuplicateName` - A player with this name already exists
    /// * `Error::MaximumPlayers` - The roster already holds `max_players`
    pub fn add(&mut self, name: &str, rules: NameRules, max_players: usize) -> Result<&str, Error> {
        let name = rules.clean(name)?;
        let full = self.players.len() >= max_players;
        match self.players.entry(name) {
            Entry::Occupied(_) => Err(Error::DuplicateName),
            Entry::Vacant(_) if full => Err(Error::MaximumPlayers),
            Entry::Vacant(v) => {
                let name = v.key().clone();
                Ok(v.insert(Player::new(name)).name())
            }
        }
    }

    /// Removes every player, returning the connections that had claimed one
    pub fn clear(&mut self) -> Vec<ConnectionId> {
        self.players
            .drain(..)
            .filter_map(|(_, player)| player.connection)
            .collect_vec()
    }

    /// Binds `connection` to the unclaimed player `name`
    ///
    /// Returns the stored name of the claimed player.
    ///
    /// # Errors
    ///
    /// * `Error::NotFound(Missing::Player)` - No player has this name
    /// * `Error::AlreadyBound` - Another connection holds the player
    pub fn claim(&mut self, name: &str, connection: ConnectionId) -> Result<&str, Error> {
        let player = self
            .players
            .get_mut(names::trim(name))
            .ok_or(Error::NotFound(Missing::Player))?;
        if player.is_claimed() {
            return Err(Error::AlreadyBound);
        }
        player.connection = Some(connection);
        Ok(player.name())
    }

    /// Clears the binding of `name` and resets their buzz
    ///
    /// Returns `false` if there is no such player.
    pub fn release(&mut self, name: &str) -> bool {
        let Some(player) = self.players.get_mut(name) else {
            return false;
        };
        player.connection = None;
        player.buzz = constants::buzz::UNBUZZED;
        true
    }

    /// Looks up a player by name
    pub fn get(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.get_mut(name)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    /// Iterates over players in join order
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// The public view of the whole roster, in join order
    pub fn messages(&self) -> Vec<PlayerMessage> {
        self.iter().map(Player::message).collect_vec()
    }

    /// Number of players
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the roster is empty
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
