use crate::chess::{Color, Role};
use shakmaty as sm;

/// A chess [piece][`Role`] of a certain [`Color`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct Piece(pub Color, pub Role);

impl Piece {
    /// This piece's [`Color`].
    #[inline]
    pub fn color(&self) -> Color {
        self.0
    }

    /// This piece's [`Role`].
    #[inline]
    pub fn role(&self) -> Role {
        self.1
    }

    /// This piece's index in the range (0..12).
    #[inline]
    pub fn index(&self) -> usize {
        self.color() as usize + self.role() as usize * 2
    }

    /// Returns an iterator over all twelve [`Piece`]s ordered by [index][`Piece::index`].
    #[inline]
    pub fn iter() -> impl Iterator<Item = Self> {
        Role::iter().flat_map(|r| [Piece(Color::White, r), Piece(Color::Black, r)])
    }
}

#[doc(hidden)]
impl From<sm::Piece> for Piece {
    #[inline]
    fn from(p: sm::Piece) -> Self {
        Piece(p.color.into(), p.role.into())
    }
}

#[doc(hidden)]
impl From<Piece> for sm::Piece {
    #[inline]
    fn from(p: Piece) -> Self {
        sm::Piece {
            color: p.color().into(),
            role: p.role().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn piece_has_a_color(c: Color, r: Role) {
        assert_eq!(Piece(c, r).color(), c);
    }

    #[proptest]
    fn piece_has_a_role(c: Color, r: Role) {
        assert_eq!(Piece(c, r).role(), r);
    }

    #[proptest]
    fn piece_has_a_unique_index(p: Piece, #[filter(#p != #q)] q: Piece) {
        assert_ne!(p.index(), q.index());
    }

    #[test]
    fn pieces_are_iterated_by_index() {
        assert!(Piece::iter().enumerate().all(|(i, p)| p.index() == i));
    }

    #[proptest]
    fn piece_has_an_equivalent_shakmaty_representation(p: Piece) {
        assert_eq!(Piece::from(sm::Piece::from(p)), p);
    }
}
