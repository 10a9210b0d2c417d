//! Room-scoped broadcast
//!
//! Fans messages out to the connections scoped to a game. Delivery is fire
//! and forget: a connection without a live tunnel is skipped, and since every
//! roster broadcast is a full snapshot it catches up on the next one.
//!
//! Everything here runs after the state change it reports has been applied.
//! A tunnel that panics only cuts the fan-out short; the panic is logged and
//! never reaches the caller.

use std::panic::{self, AssertUnwindSafe};

use crate::{
    SyncMessage, UpdateMessage, connection::ConnectionId, game::Game, session::Tunnel,
};

/// Sends `message` to every connection in `room` that has a live tunnel
///
/// Returns how many connections the message was handed to. If a tunnel
/// panics, the connections after it are skipped.
pub fn announce<T, F, I>(room: I, message: &UpdateMessage, tunnel_finder: F) -> usize
where
    T: Tunnel,
    F: Fn(ConnectionId) -> Option<T>,
    I: IntoIterator<Item = ConnectionId>,
{
    let mut delivered = 0;
    let sent = panic::catch_unwind(AssertUnwindSafe(|| {
        for tunnel in room.into_iter().filter_map(&tunnel_finder) {
            tunnel.send_message(message);
            delivered += 1;
        }
    }));

    if sent.is_err() {
        log::error!("broadcast aborted by a panicking tunnel after {delivered} deliveries");
    }
    delivered
}

/// Broadcasts the game's current roster to its room
pub fn announce_players<T: Tunnel, F: Fn(ConnectionId) -> Option<T>>(
    game: &Game,
    tunnel_finder: F,
) -> usize {
    let count = announce(
        game.room(),
        &UpdateMessage::Players(game.players()),
        tunnel_finder,
    );
    log::debug!("game {} roster sent to {count} connections", game.id());
    count
}

/// Sends a state message to a single connection, if it has a live tunnel
pub fn send_state<T: Tunnel, F: Fn(ConnectionId) -> Option<T>>(
    connection: ConnectionId,
    state: &SyncMessage,
    tunnel_finder: F,
) {
    let sent = panic::catch_unwind(AssertUnwindSafe(|| {
        if let Some(tunnel) = tunnel_finder(connection) {
            tunnel.send_state(state);
        }
    }));

    if sent.is_err() {
        log::error!("state for {connection} dropped by a panicking tunnel");
    }
}
