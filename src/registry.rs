//! The registry of live games
//!
//! The registry exclusively owns every [`Game`]. Games are indexed both by
//! id and by owning connection, so ownership checks and id lookups are
//! constant time and a connection can never own two games.

use std::collections::HashMap;

use crate::{
    connection::ConnectionId,
    error::Error,
    game::Game,
    game_id::{GameId, GameIdAllocator},
};

/// Collection of all live games
#[derive(Debug, Default)]
pub struct GameRegistry {
    games: HashMap<GameId, Game>,
    owners: HashMap<ConnectionId, GameId>,
    ids: GameIdAllocator,
}

impl GameRegistry {
    /// Returns the game owned by `owner`, creating one if needed
    ///
    /// The boolean is `true` when a new game was created. Creation is keyed by
    /// owner, so calling this repeatedly for the same connection always yields
    /// the same id.
    ///
    /// # Errors
    ///
    /// Returns `Error::MaximumGames` if a new game is needed but `max_games`
    /// are already alive.
    pub fn get_or_create_game(
        &mut self,
        owner: ConnectionId,
        max_games: usize,
    ) -> Result<(GameId, bool), Error> {
        if let Some(id) = self.owners.get(&owner) {
            return Ok((*id, false));
        }
        if self.games.len() >= max_games {
            return Err(Error::MaximumGames);
        }

        let id = self.ids.allocate();
        self.games.insert(id, Game::new(id, owner));
        self.owners.insert(owner, id);
        Ok((id, true))
    }

    /// The id of the game owned by `connection`, if any
    pub fn find_game_by_owner(&self, connection: ConnectionId) -> Option<GameId> {
        self.owners.get(&connection).copied()
    }

    /// Looks up a game by id
    pub fn find_game_by_id(&self, id: GameId) -> Option<&Game> {
        self.games.get(&id)
    }

    /// Looks up a game by id for mutation
    pub fn find_game_by_id_mut(&mut self, id: GameId) -> Option<&mut Game> {
        self.games.get_mut(&id)
    }

    /// Removes a game, returning it so callers can notify its room
    pub fn destroy_game(&mut self, id: GameId) -> Option<Game> {
        let game = self.games.remove(&id)?;
        self.owners.remove(&game.owner());
        Some(game)
    }

    /// Number of live games
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether there are no live games
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
