use crate::chess::{Color, Move, Outcome, Piece, Square};
use derive_more::{DebugCustom, Display, Error};
use shakmaty as sm;
use std::str::FromStr;

/// Represents an illegal [`Move`] in a given [`Position`].
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "move `{_0}` is illegal in this position")]
pub struct IllegalMove(#[error(not(source))] pub Move);

/// The current position on the chess board.
///
/// Chess rules are delegated to [shakmaty], this type merely adds the bookkeeping
/// necessary to detect repetitions.
///
/// [shakmaty]: https://docs.rs/shakmaty
#[derive(DebugCustom, Display, Clone, Eq, PartialEq)]
#[debug(fmt = "Position({self})")]
#[display(
    fmt = "{}",
    "sm::fen::Fen::from_position(self.chess.clone(), sm::EnPassantMode::Legal)"
)]
pub struct Position {
    chess: sm::Chess,
    history: Vec<u64>,
}

impl Default for Position {
    fn default() -> Self {
        Position::new(sm::Chess::default())
    }
}

impl Position {
    fn new(chess: sm::Chess) -> Self {
        let history = vec![Self::zobrist(&chess)];
        Position { chess, history }
    }

    fn zobrist(chess: &sm::Chess) -> u64 {
        let z: sm::zobrist::Zobrist64 =
            sm::zobrist::ZobristHash::zobrist_hash(chess, sm::EnPassantMode::Legal);
        z.0
    }

    /// The side to move.
    #[inline]
    pub fn turn(&self) -> Color {
        sm::Position::turn(&self.chess).into()
    }

    /// The number of halfmoves since the last capture or pawn advance.
    #[inline]
    pub fn halfmoves(&self) -> u32 {
        sm::Position::halfmoves(&self.chess)
    }

    /// The [`Piece`] on a given [`Square`], if any.
    #[inline]
    pub fn piece_at(&self, s: Square) -> Option<Piece> {
        sm::Position::board(&self.chess)
            .piece_at(s.into())
            .map(Piece::from)
    }

    /// An iterator over all pieces on the board.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Piece, Square)> + '_ {
        Square::iter().filter_map(|s| Some((self.piece_at(s)?, s)))
    }

    /// [`Square`] occupied by the king of the given color.
    #[inline]
    pub fn king(&self, side: Color) -> Option<Square> {
        sm::Position::board(&self.chess)
            .king_of(side.into())
            .map(Square::from)
    }

    /// Whether the side to move is in [check].
    ///
    /// [check]: https://www.chessprogramming.org/Check
    #[inline]
    pub fn is_check(&self) -> bool {
        sm::Position::is_check(&self.chess)
    }

    /// Whether this position is a [checkmate].
    ///
    /// [checkmate]: https://www.chessprogramming.org/Checkmate
    #[inline]
    pub fn is_checkmate(&self) -> bool {
        sm::Position::is_checkmate(&self.chess)
    }

    /// Whether this position is a [stalemate].
    ///
    /// [stalemate]: https://www.chessprogramming.org/Stalemate
    #[inline]
    pub fn is_stalemate(&self) -> bool {
        sm::Position::is_stalemate(&self.chess)
    }

    /// Whether neither side has enough material left to deliver checkmate.
    #[inline]
    pub fn is_material_insufficient(&self) -> bool {
        sm::Position::is_insufficient_material(&self.chess)
    }

    /// Whether 75 moves went by without captures or pawn advances.
    #[inline]
    pub fn is_seventy_five_move_draw(&self) -> bool {
        self.halfmoves() >= 150
    }

    /// Whether this position occurred at least five times.
    pub fn is_fivefold_repetition(&self) -> bool {
        match self.history.last() {
            None => false,
            Some(current) => self.history.iter().filter(|h| *h == current).count() >= 5,
        }
    }

    /// The [`Outcome`] of the game in case this position is final.
    ///
    /// Terminal conditions are checked in a fixed order, the first one that holds wins:
    /// checkmate, stalemate, insufficient material, the 75-move rule, fivefold repetition.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.is_checkmate() {
            Some(Outcome::Checkmate(!self.turn()))
        } else if self.is_stalemate() {
            Some(Outcome::Stalemate)
        } else if self.is_material_insufficient() {
            Some(Outcome::DrawByInsufficientMaterial)
        } else if self.is_seventy_five_move_draw() {
            Some(Outcome::DrawBy75MoveRule)
        } else if self.is_fivefold_repetition() {
            Some(Outcome::DrawByRepetition)
        } else if sm::Position::is_game_over(&self.chess) {
            Some(Outcome::Draw)
        } else {
            None
        }
    }

    /// Whether the game is over.
    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// An iterator over the legal [`Move`]s that can be played in this position.
    pub fn moves(&self) -> impl Iterator<Item = Move> {
        sm::Position::legal_moves(&self.chess)
            .into_iter()
            .filter_map(|m| match sm::uci::Uci::from_standard(&m) {
                sm::uci::Uci::Normal {
                    from,
                    to,
                    promotion,
                } => Some(Move(from.into(), to.into(), promotion.into())),
                _ => None,
            })
    }

    /// An iterator over the legal [`Move`]s of the piece on a given [`Square`].
    pub fn moves_from(&self, whence: Square) -> impl Iterator<Item = Move> {
        self.moves().filter(move |m| m.whence() == whence)
    }

    /// Play a [`Move`] if legal in this position.
    pub fn play(&mut self, m: Move) -> Result<(), IllegalMove> {
        match sm::uci::Uci::from(m).to_move(&self.chess) {
            Ok(vm) if sm::Position::is_legal(&self.chess, &vm) => {
                sm::Position::play_unchecked(&mut self.chess, &vm);

                if self.halfmoves() == 0 {
                    self.history.clear();
                }

                self.history.push(Self::zobrist(&self.chess));
                Ok(())
            }

            _ => Err(IllegalMove(m)),
        }
    }
}

/// The reason why parsing [`Position`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum ParsePositionError {
    #[display(fmt = "failed to parse FEN")]
    InvalidFen,
    #[display(fmt = "the FEN describes an illegal position")]
    IllegalPosition,
}

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fen: sm::fen::Fen = s.parse().map_err(|_| ParsePositionError::InvalidFen)?;

        let chess: sm::Chess = fen
            .into_position(sm::CastlingMode::Standard)
            .map_err(|_| ParsePositionError::IllegalPosition)?;

        Ok(Position::new(chess))
    }
}

#[cfg(test)]
impl proptest::arbitrary::Arbitrary for Position {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        use proptest::{prelude::*, sample::Selector};

        (0..256usize, any::<Selector>())
            .prop_map(|(plies, selector)| {
                let mut pos = Position::default();
                for _ in 0..plies {
                    match selector.try_select(pos.moves()) {
                        Some(m) if !pos.is_game_over() => pos.play(m).unwrap(),
                        _ => break,
                    }
                }

                pos
            })
            .boxed()
    }
}
