//! Runtime options for a [`Router`](crate::router::Router)

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Options controlling limits and optional behaviour of a router
///
/// Deserializing fills missing fields from [`Options::default`]. Values are
/// checked with [`garde`] before a router accepts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct Options {
    /// Maximum number of players per game
    #[garde(range(min = 1, max = constants::game::MAX_PLAYER_COUNT))]
    pub max_players: usize,
    /// Maximum number of games alive at once
    #[garde(range(min = 1, max = constants::game::MAX_GAMES))]
    pub max_games: usize,
    /// Maximum length of a player name in bytes, after trimming
    #[garde(range(min = 1, max = constants::name::MAX_LENGTH))]
    pub max_name_length: usize,
    /// Whether player names are run through the profanity filter
    #[garde(skip)]
    pub filter_names: bool,
    /// Whether remaining room members are told when a game is torn down
    #[garde(skip)]
    pub announce_game_closed: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_players: constants::game::MAX_PLAYER_COUNT,
            max_games: constants::game::DEFAULT_MAX_GAMES,
            max_name_length: constants::name::DEFAULT_MAX_LENGTH,
            filter_names: true,
            announce_game_closed: true,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_valid() {
        assert!(Options::default().validate().is_ok());
    }

    #[test]
    fn test_options_missing_fields_use_defaults() {
        let options: Options = serde_json::from_str(r#"{"max_players": 8}"#).unwrap();
        assert_eq!(options.max_players, 8);
        assert_eq!(options.max_name_length, 30);
        assert!(options.filter_names);
        assert!(options.announce_game_closed);
    }

    #[test]
    fn test_options_out_of_range_rejected() {
        let zero_players = Options {
            max_players: 0,
            ..Options::default()
        };
        assert!(zero_players.validate().is_err());

        let huge_names = Options {
            max_name_length: 1000,
            ..Options::default()
        };
        assert!(huge_names.validate().is_err());

        let too_many_players = Options {
            max_players: constants::game::MAX_PLAYER_COUNT + 1,
            ..Options::default()
        };
        assert!(too_many_players.validate().is_err());
    }
}
