//! Routing of connection events to games and players
//!
//! The router is the single entry point for everything a connection can do.
//! It resolves who the caller is from the connection binding table, checks
//! the caller is allowed to perform the action, applies it to the owning game,
//! and fans the resulting roster out to the game's room.
//!
//! Events are handled one at a time to completion. Every mutating operation
//! takes `&mut self`, so a transport that shares the router across tasks has
//! to serialize access, which is exactly the ordering guarantee buzz ranks
//! rely on.

use std::panic::{self, AssertUnwindSafe};

use garde::Validate;
use serde::Deserialize;

use crate::{
    Reply, SyncMessage,
    config::Options,
    connection::{ConnectionId, Connections, Value},
    dispatch,
    error::{Error, Missing},
    game_id::GameId,
    player::PlayerMessage,
    registry::GameRegistry,
    session::Tunnel,
};

/// Events a connection can send
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub enum IncomingMessage {
    /// Create a game owned by the caller, or look up the one it already owns
    RequestGameId,
    /// Subscribe to a game's broadcasts
    JoinGame(GameId),
    /// Read the roster of the caller's own game
    RequestPlayers,
    /// Remove every player from the caller's own game
    ClearPlayers,
    /// Add a named player slot to the caller's own game
    AddPlayer(String),
    /// Claim a player slot in a joined game
    SelectPlayer {
        /// The game the caller joined
        game_id: GameId,
        /// The player to claim
        name: String,
    },
    /// Buzz in as the caller's bound player
    BuzzIn,
    /// Reset every player's buzz in the caller's own game
    UnbuzzAll,
}

impl IncomingMessage {
    /// Whether the sender expects an acknowledgement for this event
    fn acknowledged(&self) -> bool {
        !matches!(self, Self::UnbuzzAll)
    }

    /// Short event name for log lines
    fn label(&self) -> &'static str {
        match self {
            Self::RequestGameId => "request_game_id",
            Self::JoinGame(_) => "join_game",
            Self::RequestPlayers => "request_players",
            Self::ClearPlayers => "clear_players",
            Self::AddPlayer(_) => "add_player",
            Self::SelectPlayer { .. } => "select_player",
            Self::BuzzIn => "buzz_in",
            Self::UnbuzzAll => "unbuzz_all",
        }
    }
}

/// Owns all games and connection bindings and handles every inbound event
#[derive(Debug, Default)]
pub struct Router {
    pub(crate) games: GameRegistry,
    pub(crate) connections: Connections,
    pub(crate) options: Options,
}

impl Router {
    /// Creates a router with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router with the given options
    ///
    /// # Errors
    ///
    /// Returns the validation report if any option is out of range.
    pub fn with_options(options: Options) -> Result<Self, garde::Report> {
        options.validate()?;
        Ok(Self {
            options,
            ..Self::default()
        })
    }

    /// The options this router was built with
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The registry of live games
    pub fn games(&self) -> &GameRegistry {
        &self.games
    }

    /// The connection binding table
    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// Registers a new connection and sends it the welcome message
    ///
    /// The welcome carries the roster of the game the connection is scoped
    /// to, which is empty for a fresh connection.
    pub fn connect<T: Tunnel, F: Fn(ConnectionId) -> Option<T>>(
        &mut self,
        connection: ConnectionId,
        tunnel_finder: F,
    ) {
        if self.connections.add(connection) {
            log::info!(
                "connection {connection} connected ({})",
                self.connections.census()
            );
        }

        let players = self
            .connections
            .get(connection)
            .and_then(Value::game_id)
            .and_then(|id| self.games.find_game_by_id(id))
            .map(crate::game::Game::players)
            .unwrap_or_default();

        dispatch::send_state(connection, &SyncMessage::Welcome(players), tunnel_finder);
    }

    /// Handles one event from `connection`
    ///
    /// This is the per-event boundary: rejected actions come back as an
    /// `{"error": …}` reply, and a panic while applying the event is caught,
    /// logged, and reported as [`Error::Internal`]. Broadcasts only start once
    /// the change is applied, and a transport panic during one is contained in
    /// [`dispatch`], so it never turns an applied change into an error reply.
    /// Returns `None` when the event does not expect an acknowledgement.
    pub fn receive_message<T: Tunnel, F: Fn(ConnectionId) -> Option<T>>(
        &mut self,
        connection: ConnectionId,
        message: IncomingMessage,
        tunnel_finder: F,
    ) -> Option<Reply> {
        let acknowledged = message.acknowledged();
        let label = message.label();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.handle(connection, message, &tunnel_finder)
        }))
        .unwrap_or_else(|_| {
            log::error!("{label} from {connection} panicked, event dropped");
            Err(Error::Internal)
        });

        match result {
            Ok(reply) => reply,
            Err(error) => {
                log::warn!("{label} from {connection} rejected: {error}");
                acknowledged.then(|| error.into())
            }
        }
    }

    fn handle<T: Tunnel, F: Fn(ConnectionId) -> Option<T>>(
        &mut self,
        connection: ConnectionId,
        message: IncomingMessage,
        tunnel_finder: F,
    ) -> Result<Option<Reply>, Error> {
        Ok(match message {
            IncomingMessage::RequestGameId => Some(self.request_game_id(connection)?.into()),
            IncomingMessage::JoinGame(game_id) => Some(self.join_game(connection, game_id)?.into()),
            IncomingMessage::RequestPlayers => Some(self.request_players(connection)?.into()),
            IncomingMessage::ClearPlayers => {
                Some(self.clear_players(connection, tunnel_finder)?.into())
            }
            IncomingMessage::AddPlayer(name) => {
                Some(self.add_player(connection, &name, tunnel_finder)?.into())
            }
            IncomingMessage::SelectPlayer { game_id, name } => Some(
                self.select_player(connection, game_id, &name, tunnel_finder)?
                    .into(),
            ),
            IncomingMessage::BuzzIn => Some(self.buzz_in(connection, tunnel_finder)?.into()),
            IncomingMessage::UnbuzzAll => {
                self.unbuzz_all(connection, tunnel_finder)?;
                None
            }
        })
    }

    fn role(&self, connection: ConnectionId) -> Result<&Value, Error> {
        self.connections
            .get(connection)
            .ok_or(Error::NotFound(Missing::Connection))
    }

    /// Resolves an owner-scoped action to the caller's game
    fn owned_game_id(&self, connection: ConnectionId) -> Result<GameId, Error> {
        self.role(connection)?;
        self.games
            .find_game_by_owner(connection)
            .ok_or(Error::NotAuthorized)
    }

    /// Returns the caller's game id, creating the game on first request
    ///
    /// A spectator that creates a game leaves the room it was watching.
    ///
    /// # Errors
    ///
    /// * `Error::NotFound(Missing::Connection)` - The connection is not registered
    /// * `Error::AlreadyBound` - The caller is bound to a player
    /// * `Error::MaximumGames` - No more games can be created
    pub fn request_game_id(&mut self, connection: ConnectionId) -> Result<GameId, Error> {
        let previous = match self.role(connection)? {
            Value::Owner(game_id) => return Ok(*game_id),
            Value::Player { .. } => return Err(Error::AlreadyBound),
            Value::Spectator(game_id) => Some(*game_id),
            Value::Unassigned => None,
        };

        let (game_id, created) = self
            .games
            .get_or_create_game(connection, self.options.max_games)?;

        if let Some(game) = previous.and_then(|id| self.games.find_game_by_id_mut(id)) {
            game.leave_room(connection);
        }
        self.connections.update(connection, Value::Owner(game_id));

        if created {
            log::info!("game {game_id} created by {connection}");
        }
        Ok(game_id)
    }

    /// Subscribes the caller to a game's room and returns its roster
    ///
    /// Joining the room the caller is already in just returns the roster. A
    /// spectator joining another game moves rooms.
    ///
    /// # Errors
    ///
    /// * `Error::NotFound(Missing::Game)` - No game has this id
    /// * `Error::AlreadyBound` - The caller owns or plays in a different game
    pub fn join_game(
        &mut self,
        connection: ConnectionId,
        game_id: GameId,
    ) -> Result<Vec<PlayerMessage>, Error> {
        let role = self.role(connection)?.clone();
        if self.games.find_game_by_id(game_id).is_none() {
            return Err(Error::NotFound(Missing::Game));
        }

        match role {
            Value::Owner(current) | Value::Spectator(current) | Value::Player {
                game_id: current, ..
            } if current == game_id => {}
            Value::Owner(_) | Value::Player { .. } => return Err(Error::AlreadyBound),
            Value::Spectator(previous) => {
                if let Some(game) = self.games.find_game_by_id_mut(previous) {
                    game.leave_room(connection);
                }
                self.enter_room(connection, game_id);
            }
            Value::Unassigned => self.enter_room(connection, game_id),
        }

        self.games
            .find_game_by_id(game_id)
            .map(crate::game::Game::players)
            .ok_or(Error::NotFound(Missing::Game))
    }

    fn enter_room(&mut self, connection: ConnectionId, game_id: GameId) {
        if let Some(game) = self.games.find_game_by_id_mut(game_id) {
            game.join_room(connection);
            self.connections
                .update(connection, Value::Spectator(game_id));
            log::info!("connection {connection} joined game {game_id}");
        }
    }

    /// Returns the roster of the caller's own game without broadcasting
    ///
    /// # Errors
    ///
    /// * `Error::NotAuthorized` - The caller owns no game
    pub fn request_players(&self, connection: ConnectionId) -> Result<Vec<PlayerMessage>, Error> {
        let game_id = self.owned_game_id(connection)?;
        self.games
            .find_game_by_id(game_id)
            .map(crate::game::Game::players)
            .ok_or(Error::NotFound(Missing::Game))
    }

    /// Removes every player from the caller's game and resets the buzz counter
    ///
    /// Connections that had claimed a player stay in the room as spectators.
    ///
    /// # Errors
    ///
    /// * `Error::NotAuthorized` - The caller owns no game
    pub fn clear_players<T: Tunnel, F: Fn(ConnectionId) -> Option<T>>(
        &mut self,
        connection: ConnectionId,
        tunnel_finder: F,
    ) -> Result<Vec<PlayerMessage>, Error> {
        let game_id = self.owned_game_id(connection)?;
        let game = self
            .games
            .find_game_by_id_mut(game_id)
            .ok_or(Error::NotFound(Missing::Game))?;

        for released in game.clear_players() {
            self.connections
                .update(released, Value::Spectator(game_id));
        }
        log::debug!("game {game_id} roster cleared");

        dispatch::announce_players(game, tunnel_finder);
        Ok(game.players())
    }

    /// Adds a named player slot to the caller's game
    ///
    /// A duplicate name leaves the roster untouched, but the current roster
    /// is still broadcast so every client converges on it.
    ///
    /// # Errors
    ///
    /// * `Error::NotAuthorized` - The caller owns no game
    /// * `Error::DuplicateName` - The name is already on the roster
    /// * `Error::InvalidName` - The name failed validation
    /// * `Error::MaximumPlayers` - The roster is full
    pub fn add_player<T: Tunnel, F: Fn(ConnectionId) -> Option<T>>(
        &mut self,
        connection: ConnectionId,
        name: &str,
        tunnel_finder: F,
    ) -> Result<Vec<PlayerMessage>, Error> {
        let game_id = self.owned_game_id(connection)?;
        let game = self
            .games
            .find_game_by_id_mut(game_id)
            .ok_or(Error::NotFound(Missing::Game))?;

        match game.add_player(name, &self.options) {
            Ok(()) => {
                log::debug!("game {game_id} added player {name:?}");
                dispatch::announce_players(game, tunnel_finder);
                Ok(game.players())
            }
            Err(Error::DuplicateName) => {
                dispatch::announce_players(game, tunnel_finder);
                Err(Error::DuplicateName)
            }
            Err(error) => Err(error),
        }
    }

    /// Binds the caller to an unclaimed player in the game it joined
    ///
    /// # Errors
    ///
    /// * `Error::AlreadyBound` - The caller already claimed a player, owns a
    ///   game, or the player is claimed by someone else
    /// * `Error::NotAuthorized` - The caller has not joined `game_id`
    /// * `Error::NotFound(Missing::Game)` - No game has this id
    /// * `Error::NotFound(Missing::Player)` - No player has this name
    pub fn select_player<T: Tunnel, F: Fn(ConnectionId) -> Option<T>>(
        &mut self,
        connection: ConnectionId,
        game_id: GameId,
        name: &str,
        tunnel_finder: F,
    ) -> Result<Vec<PlayerMessage>, Error> {
        match self.role(connection)? {
            Value::Player { .. } | Value::Owner(_) => return Err(Error::AlreadyBound),
            Value::Spectator(joined) if *joined == game_id => {}
            Value::Spectator(_) | Value::Unassigned => return Err(Error::NotAuthorized),
        }

        let game = self
            .games
            .find_game_by_id_mut(game_id)
            .ok_or(Error::NotFound(Missing::Game))?;
        let name = game.select_player(name, connection)?;

        log::info!("connection {connection} selected {name:?} in game {game_id}");
        self.connections
            .update(connection, Value::Player { game_id, name });

        dispatch::announce_players(game, tunnel_finder);
        Ok(game.players())
    }

    /// Buzzes in as the caller's bound player
    ///
    /// # Errors
    ///
    /// * `Error::NotAuthorized` - The caller is not bound to a player
    /// * `Error::AlreadyBuzzed` - The player already buzzed this round
    pub fn buzz_in<T: Tunnel, F: Fn(ConnectionId) -> Option<T>>(
        &mut self,
        connection: ConnectionId,
        tunnel_finder: F,
    ) -> Result<Vec<PlayerMessage>, Error> {
        self.role(connection)?;
        let (game_id, name) = self
            .connections
            .bound_player(connection)
            .ok_or(Error::NotAuthorized)?;
        let game = self
            .games
            .find_game_by_id_mut(game_id)
            .ok_or(Error::NotFound(Missing::Game))?;

        let rank = game.buzz_in(name)?;
        log::debug!("game {game_id}: {name:?} buzzed in at rank {rank}");

        dispatch::announce_players(game, tunnel_finder);
        Ok(game.players())
    }

    /// Starts a new round in the caller's game
    ///
    /// # Errors
    ///
    /// * `Error::NotAuthorized` - The caller owns no game
    pub fn unbuzz_all<T: Tunnel, F: Fn(ConnectionId) -> Option<T>>(
        &mut self,
        connection: ConnectionId,
        tunnel_finder: F,
    ) -> Result<(), Error> {
        let game_id = self.owned_game_id(connection)?;
        let game = self
            .games
            .find_game_by_id_mut(game_id)
            .ok_or(Error::NotFound(Missing::Game))?;

        game.unbuzz_all();
        log::debug!("game {game_id} unbuzzed");

        dispatch::announce_players(game, tunnel_finder);
        Ok(())
    }
}
