//! Reconciliation of lost connections
//!
//! Ownership is checked before player binding: an owner leaving takes its
//! whole game with it, while a player leaving only frees the slot it had
//! claimed.

use std::panic::{self, AssertUnwindSafe};

use itertools::Itertools;

use crate::{
    UpdateMessage,
    connection::{ConnectionId, Value},
    dispatch,
    game_id::GameId,
    router::Router,
    session::Tunnel,
};

/// What a disconnect did to the session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnected {
    /// The connection owned a game, which was destroyed
    GameClosed(GameId),
    /// The connection was bound to a player, whose slot is free again
    PlayerReleased {
        /// Game the player belongs to
        game_id: GameId,
        /// The released player
        name: String,
    },
    /// The connection was watching a game and left its room
    LeftRoom(GameId),
    /// The connection was registered but scoped to no game
    Unscoped,
    /// The connection was never registered or already disconnected
    Unknown,
    /// Reconciling failed unexpectedly
    Aborted,
}

impl Router {
    /// Handles the loss of `connection`
    ///
    /// The connection is always removed from the binding table. The room is
    /// notified after the game has been reconciled, so a transport that panics
    /// while being notified does not change the outcome.
    pub fn disconnect<T: Tunnel, F: Fn(ConnectionId) -> Option<T>>(
        &mut self,
        connection: ConnectionId,
        tunnel_finder: F,
    ) -> Disconnected {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.reconcile(connection, &tunnel_finder)
        }))
        .unwrap_or_else(|_| {
            log::error!("disconnect of {connection} panicked");
            Disconnected::Aborted
        });

        log::info!(
            "connection {connection} disconnected: {outcome:?} ({})",
            self.connections.census()
        );
        outcome
    }

    fn reconcile<T: Tunnel, F: Fn(ConnectionId) -> Option<T>>(
        &mut self,
        connection: ConnectionId,
        tunnel_finder: F,
    ) -> Disconnected {
        let Some(value) = self.connections.remove(connection) else {
            return Disconnected::Unknown;
        };

        if let Some(game) = self
            .games
            .find_game_by_owner(connection)
            .and_then(|id| self.games.destroy_game(id))
        {
            let game_id = game.id();
            let remaining = game.room().filter(|c| *c != connection).collect_vec();
            for member in &remaining {
                self.connections.update(*member, Value::Unassigned);
            }
            if self.options.announce_game_closed {
                dispatch::announce(remaining, &UpdateMessage::GameClosed(game_id), tunnel_finder);
            }
            return Disconnected::GameClosed(game_id);
        }

        match value {
            Value::Player { game_id, name } => {
                if let Some(game) = self.games.find_game_by_id_mut(game_id) {
                    game.release_player(&name);
                    game.leave_room(connection);
                    dispatch::announce_players(game, tunnel_finder);
                }
                Disconnected::PlayerReleased { game_id, name }
            }
            Value::Spectator(game_id) => {
                if let Some(game) = self.games.find_game_by_id_mut(game_id) {
                    game.leave_room(connection);
                }
                Disconnected::LeftRoom(game_id)
            }
            Value::Owner(_) | Value::Unassigned => Disconnected::Unscoped,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        error::{Error, Missing},
        router::IncomingMessage,
        testing::Hub,
    };

    fn game_with_players(hub: &Hub, router: &mut Router, names: &[&str]) -> (ConnectionId, GameId) {
        crate::testing::init_logging();
        let owner = hub.connect();
        router.connect(owner, hub.finder());
        let game_id = router.request_game_id(owner).unwrap();
        for name in names {
            router.add_player(owner, name, hub.finder()).unwrap();
        }
        (owner, game_id)
    }

    fn claim(hub: &Hub, router: &mut Router, game_id: GameId, name: &str) -> ConnectionId {
        let connection = hub.connect();
        router.connect(connection, hub.finder());
        router.join_game(connection, game_id).unwrap();
        router
            .select_player(connection, game_id, name, hub.finder())
            .unwrap();
        connection
    }

    #[test]
    fn test_owner_disconnect_destroys_game() {
        let hub = Hub::default();
        let mut router = Router::new();
        let (owner, game_id) = game_with_players(&hub, &mut router, &["Al"]);
        let al = claim(&hub, &mut router, game_id, "Al");

        hub.drop_tunnel(owner);
        assert_eq!(
            router.disconnect(owner, hub.finder()),
            Disconnected::GameClosed(game_id)
        );
        assert!(router.games().find_game_by_id(game_id).is_none());
        assert_eq!(
            hub.updates(al).last(),
            Some(&UpdateMessage::GameClosed(game_id))
        );
        assert_eq!(router.connections().get(al), Some(&Value::Unassigned));

        let late = hub.connect();
        router.connect(late, hub.finder());
        let reply = router.receive_message(late, IncomingMessage::JoinGame(game_id), hub.finder());
        assert!(reply.and_then(|r| r.error()).is_some_and(|e| e.is_not_found()));
    }

    #[test]
    fn test_owner_disconnect_without_close_notice() {
        let hub = Hub::default();
        let mut router = Router::with_options(crate::config::Options {
            announce_game_closed: false,
            ..Default::default()
        })
        .unwrap();
        let (owner, game_id) = game_with_players(&hub, &mut router, &["Al"]);
        let al = claim(&hub, &mut router, game_id, "Al");
        hub.clear();

        router.disconnect(owner, hub.finder());
        assert!(hub.updates(al).is_empty());
    }

    #[test]
    fn test_game_ids_not_reused_after_teardown() {
        let hub = Hub::default();
        let mut router = Router::new();
        let (owner, first) = game_with_players(&hub, &mut router, &[]);
        router.disconnect(owner, hub.finder());

        let (_, second) = game_with_players(&hub, &mut router, &[]);
        assert!(second > first);
    }

    #[test]
    fn test_player_disconnect_releases_slot() {
        let hub = Hub::default();
        let mut router = Router::new();
        let (owner, game_id) = game_with_players(&hub, &mut router, &["Al", "Bo"]);
        let al = claim(&hub, &mut router, game_id, "Al");
        router.buzz_in(al, hub.finder()).unwrap();

        hub.drop_tunnel(al);
        assert_eq!(
            router.disconnect(al, hub.finder()),
            Disconnected::PlayerReleased {
                game_id,
                name: "Al".to_string()
            }
        );

        let players = hub.last_players(owner).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name, "Al");
        assert_eq!(players[0].buzz, 0);
        assert!(!players[0].claimed);
        assert!(!router.games().find_game_by_id(game_id).unwrap().in_room(al));

        let replacement = claim(&hub, &mut router, game_id, "Al");
        assert_eq!(
            router.connections().bound_player(replacement),
            Some((game_id, "Al"))
        );
    }

    #[test]
    fn test_player_disconnect_with_failing_transport() {
        let hub = Hub::default();
        let mut router = Router::new();
        let (owner, game_id) = game_with_players(&hub, &mut router, &["Al"]);
        let al = claim(&hub, &mut router, game_id, "Al");

        let outcome = router.disconnect(al, |_| -> Option<crate::testing::MockTunnel> {
            panic!("transport exploded")
        });
        assert_eq!(
            outcome,
            Disconnected::PlayerReleased {
                game_id,
                name: "Al".to_string()
            }
        );
        let players = router.request_players(owner).unwrap();
        assert!(!players[0].claimed);
    }

    #[test]
    fn test_player_disconnect_keeps_counter_running() {
        let hub = Hub::default();
        let mut router = Router::new();
        let (_, game_id) = game_with_players(&hub, &mut router, &["Al", "Bo"]);
        let al = claim(&hub, &mut router, game_id, "Al");
        let bo = claim(&hub, &mut router, game_id, "Bo");
        router.buzz_in(al, hub.finder()).unwrap();

        router.disconnect(al, hub.finder());
        let players = router.buzz_in(bo, hub.finder()).unwrap();
        assert_eq!(players[1].buzz, 2);
    }

    #[test]
    fn test_spectator_and_unscoped_disconnects() {
        let hub = Hub::default();
        let mut router = Router::new();
        let (owner, game_id) = game_with_players(&hub, &mut router, &[]);
        let watcher = hub.connect();
        router.connect(watcher, hub.finder());
        router.join_game(watcher, game_id).unwrap();
        let idle = hub.connect();
        router.connect(idle, hub.finder());
        hub.clear();

        assert_eq!(
            router.disconnect(watcher, hub.finder()),
            Disconnected::LeftRoom(game_id)
        );
        assert!(!router.games().find_game_by_id(game_id).unwrap().in_room(watcher));
        assert!(hub.updates(owner).is_empty());

        assert_eq!(router.disconnect(idle, hub.finder()), Disconnected::Unscoped);
        assert_eq!(router.disconnect(idle, hub.finder()), Disconnected::Unknown);
        assert_eq!(
            router.buzz_in(idle, hub.finder()),
            Err(Error::NotFound(Missing::Connection))
        );
    }
}
