use derive_more::{DebugCustom, Display, Error};
use shakmaty as sm;
use std::str::FromStr;
use vampirc_uci::UciSquare;

#[cfg(test)]
use proptest::prelude::*;

/// A square on the chess board.
#[derive(DebugCustom, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[debug(fmt = "{}", self)]
#[display(fmt = "{}", _0)]
pub struct Square(#[cfg_attr(test, strategy((0u32..64).prop_map(sm::Square::new)))] sm::Square);

impl Square {
    /// Constructs [`Square`] from a pair of file and rank indices.
    ///
    /// # Panics
    ///
    /// Panics if either `file` or `rank` is not in the range (0..=7).
    #[inline]
    pub fn new(file: u8, rank: u8) -> Self {
        Square(sm::Square::from_coords(
            sm::File::new(file.into()),
            sm::Rank::new(rank.into()),
        ))
    }

    /// This square's file index in the range (0..=7), counting from the `a` file.
    #[inline]
    pub fn file(&self) -> u8 {
        self.0.file() as u8
    }

    /// This square's rank index in the range (0..=7), counting from the first rank.
    #[inline]
    pub fn rank(&self) -> u8 {
        self.0.rank() as u8
    }

    /// Returns an iterator over all [`Square`]s, from `a1` to `h8`.
    #[inline]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        sm::Square::ALL.into_iter().map(Square)
    }
}

/// The reason why parsing [`Square`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "failed to parse square")]
pub struct ParseSquareError;

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Square).map_err(|_| ParseSquareError)
    }
}

#[doc(hidden)]
impl From<sm::Square> for Square {
    #[inline]
    fn from(s: sm::Square) -> Self {
        Square(s)
    }
}

#[doc(hidden)]
impl From<Square> for sm::Square {
    #[inline]
    fn from(s: Square) -> Self {
        s.0
    }
}

#[doc(hidden)]
impl From<UciSquare> for Square {
    #[inline]
    fn from(s: UciSquare) -> Self {
        Square::new(s.file as u8 - b'a', s.rank - 1)
    }
}

#[doc(hidden)]
impl From<Square> for UciSquare {
    #[inline]
    fn from(s: Square) -> Self {
        UciSquare {
            file: (b'a' + s.file()) as char,
            rank: s.rank() + 1,
        }
    }
}
