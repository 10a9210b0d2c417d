//! Communication session management
//!
//! This module defines the trait for tunneling messages from the router to
//! connected clients. The embedding transport implements it once per
//! connection, whatever real-time channel it actually uses.

use super::{SyncMessage, UpdateMessage};

/// Trait for sending messages through a communication tunnel
///
/// Sends are fire-and-forget: implementations should drop a message rather
/// than block or retry, since the next broadcast carries a full snapshot.
pub trait Tunnel {
    /// Sends an update message to the client
    ///
    /// Update messages are room broadcasts that follow a state change.
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a state synchronization message to the client
    ///
    /// Sync messages bring a client up to date when it first connects.
    fn send_state(&self, state: &SyncMessage);
}
