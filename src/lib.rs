//! # Buzzer Game Library
//!
//! This library provides the core state machine for a live buzzer game.
//! One connection owns a game session, other connections join its room and
//! claim named player slots, and everyone sees the same ordered view of who
//! buzzed in first. The transport is left to the embedding application,
//! which feeds events into a [`router::Router`] and delivers what it emits
//! through the [`session::Tunnel`] trait.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
use serde::Serialize;

pub mod buzz;
pub mod config;
pub mod connection;
pub mod constants;
mod disconnect;
pub mod dispatch;
pub mod error;
pub mod game;
pub mod game_id;
pub mod names;
pub mod player;
pub mod registry;
pub mod router;
pub mod session;

#[cfg(test)]
mod testing;

pub use disconnect::Disconnected;
pub use error::Error;

use game_id::GameId;
use player::PlayerMessage;

/// Messages broadcast to a game's room after its state changes
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum UpdateMessage {
    /// Full snapshot of the roster, in join order
    Players(Vec<PlayerMessage>),
    /// The game was torn down because its owner disconnected
    GameClosed(GameId),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Messages sent to a single connection to synchronize its view
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// Greeting for a new connection carrying the roster it can currently see
    Welcome(Vec<PlayerMessage>),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Error payload of a failed acknowledgement, rendered as `{"error": …}`
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct ErrorMessage {
    /// Why the action was rejected
    pub error: Error,
}

/// Acknowledgement returned to the connection that sent an event
///
/// Serialized untagged so clients see a bare game id, a bare player list,
/// or an `{"error": …}` object.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, derive_more::From)]
#[serde(untagged)]
pub enum Reply {
    /// The caller's game id
    GameId(GameId),
    /// The roster after the action
    Players(Vec<PlayerMessage>),
    /// The action was rejected
    Error(ErrorMessage),
}

impl From<Error> for Reply {
    fn from(error: Error) -> Self {
        Self::Error(ErrorMessage { error })
    }
}

impl Reply {
    /// Converts the reply to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }

    /// The error carried by this reply, if it is one
    pub fn error(&self) -> Option<Error> {
        match self {
            Self::Error(ErrorMessage { error }) => Some(*error),
            _ => None,
        }
    }
}
