//! Buzz ranking
//!
//! The arbiter hands out ranks 1, 2, 3, … to players in the order their buzz
//! events are processed. Each player can hold at most one rank per round, and
//! a reset puts every player back to unbuzzed and restarts the count.

use crate::{
    constants,
    error::{Error, Missing},
    player::Roster,
};

/// Per-game buzz counter
#[derive(Debug)]
pub struct Arbiter {
    next_rank: u32,
}

impl Default for Arbiter {
    fn default() -> Self {
        Self {
            next_rank: constants::buzz::FIRST_RANK,
        }
    }
}

impl Arbiter {
    /// The rank the next successful buzz will receive
    pub fn next_rank(&self) -> u32 {
        self.next_rank
    }

    /// Records a buzz from the player `name`, returning the rank assigned
    ///
    /// # Errors
    ///
    /// * `Error::NotFound(Missing::Player)` - No player has this name
    /// * `Error::AlreadyBuzzed` - The player already holds a rank this round
    pub fn buzz_in(&mut self, roster: &mut Roster, name: &str) -> Result<u32, Error> {
        let player = roster
            .get_mut(name)
            .ok_or(Error::NotFound(Missing::Player))?;
        if player.has_buzzed() {
            return Err(Error::AlreadyBuzzed);
        }

        let rank = self.next_rank;
        player.set_buzz(rank);
        self.next_rank = self.next_rank.saturating_add(1);
        Ok(rank)
    }

    /// Starts a new round: every player is unbuzzed and ranks restart at 1
    pub fn reset(&mut self, roster: &mut Roster) {
        for player in roster.iter_mut() {
            player.set_buzz(constants::buzz::UNBUZZED);
        }
        self.next_rank = constants::buzz::FIRST_RANK;
    }
}
