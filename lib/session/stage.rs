use crate::chess::{Outcome, Square};
use arrayvec::ArrayVec;

/// A friendly piece picked up by the player, along with where it may go.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Selection {
    whence: Square,
    destinations: ArrayVec<Square, 27>,
}

impl Selection {
    /// Collects the distinct destinations, in the order given.
    pub fn new<I: IntoIterator<Item = Square>>(whence: Square, destinations: I) -> Self {
        let mut set = ArrayVec::new();
        for s in destinations {
            if !set.contains(&s) && !set.is_full() {
                set.push(s);
            }
        }

        Selection {
            whence,
            destinations: set,
        }
    }

    /// The [`Square`] of the selected piece.
    #[inline]
    pub fn whence(&self) -> Square {
        self.whence
    }

    /// The [`Square`]s the selected piece may move to.
    #[inline]
    pub fn destinations(&self) -> &[Square] {
        &self.destinations
    }

    /// Whether the selected piece may move to `s`.
    #[inline]
    pub fn can_reach(&self, s: Square) -> bool {
        self.destinations.contains(&s)
    }
}

/// Where the session is at.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Stage {
    /// No game is running, the menu is shown.
    Menu,
    /// Waiting for the player to pick up a piece.
    Idle,
    /// A piece has been picked up.
    Selected(Selection),
    /// A pawn is about to reach its last rank, waiting for the player to choose a piece.
    Promoting(Square, Square),
    /// Waiting for the engine to move.
    Thinking,
    /// The game is over.
    Over(Outcome),
}

impl Stage {
    /// Whether a game is running.
    pub fn is_playing(&self) -> bool {
        !matches!(self, Stage::Menu)
    }
}
