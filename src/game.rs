//! A single buzzer game
//!
//! A game ties together its owner, its roster of named players, the buzz
//! arbiter for the current round, and the room of connections that receive
//! its broadcasts. Authority checks happen in the router; the methods here
//! assume the caller is allowed to act and only enforce roster invariants.

use std::collections::HashSet;

use crate::{
    buzz::Arbiter,
    config::Options,
    connection::ConnectionId,
    error::Error,
    game_id::GameId,
    names::NameRules,
    player::{PlayerMessage, Roster},
};

/// One buzzer session
#[derive(Debug)]
pub struct Game {
    id: GameId,
    owner: ConnectionId,
    roster: Roster,
    arbiter: Arbiter,
    room: HashSet<ConnectionId>,
}

impl Game {
    /// Creates an empty game whose room holds only the owner
    pub fn new(id: GameId, owner: ConnectionId) -> Self {
        Self {
            id,
            owner,
            roster: Roster::default(),
            arbiter: Arbiter::default(),
            room: HashSet::from([owner]),
        }
    }

    /// The game's id
    pub fn id(&self) -> GameId {
        self.id
    }

    /// The connection that created the game
    pub fn owner(&self) -> ConnectionId {
        self.owner
    }

    /// The roster, in join order
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The rank the next buzz will receive
    pub fn next_rank(&self) -> u32 {
        self.arbiter.next_rank()
    }

    /// The public player list broadcast to the room
    pub fn players(&self) -> Vec<PlayerMessage> {
        self.roster.messages()
    }

    /// Adds an unclaimed player
    ///
    /// # Errors
    ///
    /// See [`Roster::add`].
    pub fn add_player(&mut self, name: &str, options: &Options) -> Result<(), Error> {
        let rules = NameRules {
            max_length: options.max_name_length,
            filter: options.filter_names,
        };
        self.roster.add(name, rules, options.max_players)?;
        Ok(())
    }

    /// Empties the roster and resets the buzz counter
    ///
    /// Returns the connections whose players were removed.
    pub fn clear_players(&mut self) -> Vec<ConnectionId> {
        self.arbiter.reset(&mut self.roster);
        self.roster.clear()
    }

    /// Binds `connection` to the player `name`, returning the stored name
    ///
    /// # Errors
    ///
    /// See [`Roster::claim`].
    pub fn select_player(&mut self, name: &str, connection: ConnectionId) -> Result<String, Error> {
        self.roster.claim(name, connection).map(str::to_owned)
    }

    /// Releases the player `name` and resets their buzz
    pub fn release_player(&mut self, name: &str) -> bool {
        self.roster.release(name)
    }

    /// Records a buzz from `name`, returning the rank assigned
    ///
    /// # Errors
    ///
    /// See [`Arbiter::buzz_in`].
    pub fn buzz_in(&mut self, name: &str) -> Result<u32, Error> {
        self.arbiter.buzz_in(&mut self.roster, name)
    }

    /// Resets every player's rank and the buzz counter
    pub fn unbuzz_all(&mut self) {
        self.arbiter.reset(&mut self.roster);
    }

    /// Subscribes a connection to this game's broadcasts
    pub fn join_room(&mut self, connection: ConnectionId) {
        self.room.insert(connection);
    }

    /// Unsubscribes a connection from this game's broadcasts
    pub fn leave_room(&mut self, connection: ConnectionId) {
        self.room.remove(&connection);
    }

    /// Whether the connection receives this game's broadcasts
    pub fn in_room(&self, connection: ConnectionId) -> bool {
        self.room.contains(&connection)
    }

    /// The connections that receive this game's broadcasts
    pub fn room(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.room.iter().copied()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn game() -> (Game, ConnectionId) {
        let owner = ConnectionId::new();
        (Game::new(GameId::new(1), owner), owner)
    }

    #[test]
    fn test_new_game_room_holds_owner() {
        let (game, owner) = game();
        assert_eq!(game.owner(), owner);
        assert!(game.in_room(owner));
        assert_eq!(game.room().count(), 1);
        assert!(game.players().is_empty());
        assert_eq!(game.next_rank(), 1);
    }

    #[test]
    fn test_clear_players_resets_counter() {
        let (mut game, _) = game();
        let options = Options::default();
        game.add_player("Al", &options).unwrap();
        game.add_player("Bo", &options).unwrap();
        let connection = ConnectionId::new();
        game.select_player("Al", connection).unwrap();
        game.buzz_in("Al").unwrap();

        assert_eq!(game.clear_players(), vec![connection]);
        assert!(game.players().is_empty());
        assert_eq!(game.next_rank(), 1);
    }

    #[test]
    fn test_add_player_uses_configured_limits() {
        let (mut game, _) = game();
        let options = Options {
            max_players: 1,
            max_name_length: 3,
            ..Options::default()
        };

        assert!(game.add_player("Alan", &options).is_err());
        game.add_player("Al", &options).unwrap();
        assert_eq!(game.add_player("Bo", &options), Err(Error::MaximumPlayers));
    }

    #[test]
    fn test_room_membership() {
        let (mut game, owner) = game();
        let watcher = ConnectionId::new();

        game.join_room(watcher);
        game.join_room(watcher);
        assert_eq!(game.room().count(), 2);

        game.leave_room(watcher);
        assert!(!game.in_room(watcher));
        assert!(game.in_room(owner));
    }

    #[test]
    fn test_release_player_keeps_slot() {
        let (mut game, _) = game();
        game.add_player("Bo", &Options::default()).unwrap();
        game.select_player("Bo", ConnectionId::new()).unwrap();
        game.buzz_in("Bo").unwrap();

        assert!(game.release_player("Bo"));
        let bo = game.roster().get("Bo").unwrap();
        assert!(!bo.is_claimed());
        assert_eq!(bo.buzz(), 0);
        assert_eq!(
            game.select_player("  Bo", ConnectionId::new()),
            Ok("Bo".to_string())
        );
    }
}
