use crate::chess::{Color, IllegalMove, Move, Position, Promotion, Role, Square};
use crate::engine::Play;
use derive_more::Display;
use std::{error::Error, ops::ControlFlow};
use tracing::{debug, info, instrument};

mod geometry;
mod stage;

pub use geometry::*;
pub use stage::*;

/// The reason why the engine could not complete its turn.
#[derive(Debug, Display, Clone, Eq, PartialEq)]
pub enum ThinkError<E> {
    #[display(fmt = "the engine failed to choose a move")]
    Engine(E),

    #[display(fmt = "the engine chose an illegal move")]
    Illegal(IllegalMove),
}

impl<E: Error + 'static> Error for ThinkError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ThinkError::Engine(e) => Some(e),
            ThinkError::Illegal(e) => Some(e),
        }
    }
}

/// An interactive chess game, from the menu to the final position.
///
/// The session owns the [`Position`] and turns pointer clicks into moves.
#[derive(Debug, Clone)]
pub struct Session {
    geometry: Geometry,
    human: Color,
    mode: Option<GameMode>,
    position: Position,
    last_move: Option<Move>,
    stage: Stage,
}

impl Session {
    /// Opens the menu.
    ///
    /// When playing against the engine the human plays with the pieces of color `human`.
    pub fn new(geometry: Geometry, human: Color) -> Self {
        Session {
            geometry,
            human,
            mode: None,
            position: Position::default(),
            last_move: None,
            stage: Stage::Menu,
        }
    }

    /// The layout of the screen.
    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The current position.
    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The last move played, if any.
    #[inline]
    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    /// The current [`Stage`].
    #[inline]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// The piece picked up by the player, if any.
    pub fn selection(&self) -> Option<&Selection> {
        match &self.stage {
            Stage::Selected(sel) => Some(sel),
            _ => None,
        }
    }

    /// The [`Square`] of the king in check, if any.
    pub fn checked_king(&self) -> Option<Square> {
        if self.position.is_check() {
            self.position.king(self.position.turn())
        } else {
            None
        }
    }

    /// Starts a new game from the initial position.
    pub fn start(&mut self, mode: GameMode) {
        self.start_from(mode, Position::default())
    }

    /// Starts a new game from an arbitrary position.
    #[instrument(level = "debug", skip(self, position), fields(%position))]
    pub fn start_from(&mut self, mode: GameMode, position: Position) {
        info!(?mode, "new game");

        let bottom = match mode {
            GameMode::TwoPlayer => Color::White,
            GameMode::VsEngine => self.human,
        };

        self.geometry.orient(bottom);
        self.mode = Some(mode);
        self.position = position;
        self.last_move = None;
        self.stage = self.settle();
    }

    /// Handles a primary pointer press.
    #[instrument(level = "trace", skip(self))]
    pub fn click(&mut self, p: Point) {
        match self.stage {
            Stage::Menu => {
                let buttons = self.geometry.menu_buttons();
                if let Some((mode, _)) = buttons.into_iter().find(|(_, r)| r.contains(p)) {
                    self.start(mode);
                }
            }

            Stage::Over(_) => {
                if self.geometry.dismiss_button().contains(p) {
                    self.dismiss();
                }
            }

            Stage::Promoting(..) => {
                let choices = self.geometry.promotion_choices();
                if let Some((promotion, _)) = choices.into_iter().find(|(_, r)| r.contains(p)) {
                    self.promote(promotion);
                }
            }

            Stage::Thinking => debug!("ignored click while the engine is thinking"),

            Stage::Idle | Stage::Selected(_) => self.click_square(self.geometry.square_at(p)),
        }
    }

    /// Handles a click on the board, `None` stands for a click outside the board.
    #[instrument(level = "trace", skip(self))]
    pub fn click_square(&mut self, s: Option<Square>) {
        match std::mem::replace(&mut self.stage, Stage::Idle) {
            Stage::Idle if self.is_human_turn() => {
                let turn = self.position.turn();
                if let Some(whence) = s {
                    if self.position.piece_at(whence).map(|p| p.color()) == Some(turn) {
                        let destinations = self.position.moves_from(whence).map(|m| m.whither());
                        self.stage = Stage::Selected(Selection::new(whence, destinations));
                    }
                }
            }

            Stage::Selected(sel) => match s {
                Some(whither) if sel.can_reach(whither) => {
                    let whence = sel.whence();
                    if self.is_promotion(whence, whither) {
                        self.stage = Stage::Promoting(whence, whither);
                    } else if let Err(e) = self.submit(Move(whence, whither, Promotion::None)) {
                        debug!("{}", e);
                    }
                }

                _ => debug!(whence = %sel.whence(), "selection cleared"),
            },

            stage => self.stage = stage,
        }
    }

    /// Completes a pending pawn promotion.
    #[instrument(level = "debug", skip(self))]
    pub fn promote(&mut self, promotion: Promotion) {
        match self.stage {
            Stage::Promoting(whence, whither) => {
                if let Err(e) = self.submit(Move(whence, whither, promotion)) {
                    debug!("{}", e);
                    self.stage = Stage::Idle;
                }
            }

            _ => debug!("no promotion pending"),
        }
    }

    /// Lets the engine move if it's its turn.
    ///
    /// Returns the move the engine played. The session keeps waiting on the engine if it fails
    /// or chooses an illegal move.
    #[instrument(level = "debug", skip(self, engine), fields(pos = %self.position))]
    pub fn think<P: Play>(
        &mut self,
        engine: &mut P,
    ) -> Result<Option<Move>, ThinkError<P::Error>> {
        if self.stage != Stage::Thinking {
            return Ok(None);
        }

        let m = engine.play(&self.position).map_err(ThinkError::Engine)?;
        self.submit(m).map_err(ThinkError::Illegal)?;
        Ok(Some(m))
    }

    /// Handles the escape key.
    ///
    /// Breaks if the application should quit, otherwise returns to the menu.
    #[instrument(level = "debug", skip(self))]
    pub fn escape(&mut self) -> ControlFlow<()> {
        match self.stage {
            Stage::Menu | Stage::Promoting(..) => ControlFlow::Break(()),
            _ => {
                self.mode = None;
                self.stage = Stage::Menu;
                ControlFlow::Continue(())
            }
        }
    }

    /// Dismisses a finished game and returns to the menu.
    #[instrument(level = "debug", skip(self))]
    pub fn dismiss(&mut self) {
        if let Stage::Over(_) = self.stage {
            self.mode = None;
            self.stage = Stage::Menu;
        }
    }

    fn is_promotion(&self, whence: Square, whither: Square) -> bool {
        let turn = self.position.turn();
        self.position.piece_at(whence).map(|p| p.role()) == Some(Role::Pawn)
            && whither.rank() == turn.last_rank()
    }

    fn is_human_turn(&self) -> bool {
        self.mode != Some(GameMode::VsEngine) || self.position.turn() == self.human
    }

    fn submit(&mut self, m: Move) -> Result<(), IllegalMove> {
        self.position.play(m)?;
        debug!(%m, "move played");
        self.last_move = Some(m);
        self.stage = self.settle();
        Ok(())
    }

    fn settle(&self) -> Stage {
        if let Some(outcome) = self.position.outcome() {
            info!(%outcome, "game over");
            Stage::Over(outcome)
        } else if !self.is_human_turn() {
            Stage::Thinking
        } else {
            Stage::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::{Outcome, Piece};
    use crate::engine::MockPlay;
    use proptest::{prop_assume, sample::Selector};
    use test_strategy::proptest;

    fn session(human: Color) -> Session {
        Session::new(Geometry::new(850., 850.), human)
    }

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn mv(s: &str) -> Move {
        s.parse().unwrap()
    }

    fn click(session: &mut Session, s: &str) {
        let p = session.geometry().square_rect(sq(s)).center();
        session.click(p);
    }

    fn play(session: &mut Session, m: &str) {
        let m = mv(m);
        click(session, &m.whence().to_string());
        click(session, &m.whither().to_string());
    }

    #[test]
    fn session_opens_the_menu() {
        let s = session(Color::White);
        assert_eq!(s.stage(), &Stage::Menu);
        assert_eq!(s.mode, None);
    }

    #[proptest]
    fn menu_buttons_start_a_game(mode: GameMode) {
        let mut s = session(Color::White);
        let [(_, a), (_, b)] = s.geometry().menu_buttons();

        match mode {
            GameMode::TwoPlayer => s.click(a.center()),
            GameMode::VsEngine => s.click(b.center()),
        }

        assert_eq!(s.mode, Some(mode));
        assert_eq!(s.stage(), &Stage::Idle);
        assert_eq!(s.position(), &Position::default());
        assert_eq!(s.last_move(), None);
    }

    #[proptest]
    fn clicks_elsewhere_on_the_menu_are_ignored(p: Point) {
        let mut s = session(Color::White);
        let buttons = s.geometry().menu_buttons();
        prop_assume!(!buttons.iter().any(|(_, r)| r.contains(p)));

        s.click(p);
        assert_eq!(s.stage(), &Stage::Menu);
    }

    #[test]
    fn escape_on_the_menu_quits() {
        let mut s = session(Color::White);
        assert_eq!(s.escape(), ControlFlow::Break(()));
    }

    #[proptest]
    fn escape_during_a_game_returns_to_the_menu(mode: GameMode) {
        let mut s = session(Color::White);
        s.start(mode);
        play(&mut s, "e2e4");
        assert_eq!(s.escape(), ControlFlow::Continue(()));
        assert_eq!(s.stage(), &Stage::Menu);
        assert_eq!(s.mode, None);
    }

    #[test]
    fn escape_during_a_promotion_quits() {
        let mut s = session(Color::White);
        s.start_from(GameMode::TwoPlayer, "8/4P3/8/8/8/8/k7/4K3 w - - 0 1".parse().unwrap());
        play(&mut s, "e7e8");
        assert_eq!(s.stage(), &Stage::Promoting(sq("e7"), sq("e8")));
        assert_eq!(s.escape(), ControlFlow::Break(()));
    }

    #[test]
    fn clicking_an_empty_square_while_idle_stays_idle() {
        let mut s = session(Color::White);
        s.start(GameMode::TwoPlayer);
        click(&mut s, "e4");
        assert_eq!(s.stage(), &Stage::Idle);
    }

    #[test]
    fn clicking_an_opponent_piece_while_idle_stays_idle() {
        let mut s = session(Color::White);
        s.start(GameMode::TwoPlayer);
        click(&mut s, "e7");
        assert_eq!(s.stage(), &Stage::Idle);
    }

    #[test]
    fn clicking_outside_the_board_while_idle_stays_idle() {
        let mut s = session(Color::White);
        s.start(GameMode::TwoPlayer);
        s.click(Point::new(5., 5.));
        assert_eq!(s.stage(), &Stage::Idle);
    }

    #[test]
    fn clicking_a_friendly_piece_selects_it() {
        let mut s = session(Color::White);
        s.start(GameMode::TwoPlayer);
        click(&mut s, "e2");

        let sel = s.selection().unwrap();
        let mut destinations = sel.destinations().to_vec();
        destinations.sort();

        assert_eq!(sel.whence(), sq("e2"));
        assert_eq!(destinations, [sq("e3"), sq("e4")]);
    }

    #[test]
    fn clicking_a_destination_plays_the_move() {
        let mut s = session(Color::White);
        s.start(GameMode::TwoPlayer);
        play(&mut s, "e2e4");

        assert_eq!(s.stage(), &Stage::Idle);
        assert_eq!(s.position().turn(), Color::Black);
        assert_eq!(s.last_move(), Some(mv("e2e4")));
        assert!(!s.position().is_game_over());
        assert_eq!(
            s.position().piece_at(sq("e4")),
            Some(Piece(Color::White, Role::Pawn))
        );
    }

    #[test]
    fn clicking_a_non_destination_clears_the_selection() {
        let mut s = session(Color::White);
        s.start(GameMode::TwoPlayer);
        play(&mut s, "e2e5");

        assert_eq!(s.stage(), &Stage::Idle);
        assert_eq!(s.position(), &Position::default());
        assert_eq!(s.last_move(), None);
    }

    #[test]
    fn clicking_another_friendly_piece_clears_the_selection() {
        let mut s = session(Color::White);
        s.start(GameMode::TwoPlayer);
        play(&mut s, "e2d2");

        assert_eq!(s.stage(), &Stage::Idle);
        assert_eq!(s.position(), &Position::default());
    }

    #[test]
    fn clicking_outside_the_board_clears_the_selection() {
        let mut s = session(Color::White);
        s.start(GameMode::TwoPlayer);
        click(&mut s, "e2");
        s.click(Point::new(5., 5.));

        assert_eq!(s.stage(), &Stage::Idle);
        assert_eq!(s.position(), &Position::default());
    }

    #[proptest]
    fn clicking_a_square_without_a_piece_of_the_side_to_move_does_nothing(
        #[filter(!#pos.is_game_over())] pos: Position,
        #[filter(#pos.piece_at(#s).map(|p| p.color()) != Some(#pos.turn()))] s: Square,
    ) {
        let mut session = session(Color::White);
        session.start_from(GameMode::TwoPlayer, pos.clone());
        session.click_square(Some(s));

        assert_eq!(session.stage(), &Stage::Idle);
        assert_eq!(session.position(), &pos);
        assert_eq!(session.last_move(), None);
    }

    #[proptest]
    fn clicking_a_destination_plays_exactly_one_move(
        #[filter(!#pos.is_game_over())] pos: Position,
        selector: Selector,
    ) {
        let m = selector.select(pos.moves());

        let mut session = session(Color::White);
        session.start_from(GameMode::TwoPlayer, pos.clone());
        session.click_square(Some(m.whence()));
        session.click_square(Some(m.whither()));

        if m.promotion() != Promotion::None {
            assert_eq!(session.stage(), &Stage::Promoting(m.whence(), m.whither()));
            assert_eq!(session.position(), &pos);
            session.promote(m.promotion());
        }

        let mut expected = pos.clone();
        assert_eq!(expected.play(m), Ok(()));

        assert_eq!(session.position(), &expected);
        assert_eq!(session.last_move(), Some(m));
        assert_ne!(session.stage(), &Stage::Thinking);
    }

    #[proptest]
    fn clicking_a_non_destination_plays_nothing(
        #[filter(!#pos.is_game_over())] pos: Position,
        selector: Selector,
        s: Square,
    ) {
        let whence = selector.select(pos.moves()).whence();
        prop_assume!(!pos.moves_from(whence).any(|m| m.whither() == s));

        let mut session = session(Color::White);
        session.start_from(GameMode::TwoPlayer, pos.clone());
        session.click_square(Some(whence));
        assert_eq!(session.selection().map(|sel| sel.whence()), Some(whence));

        session.click_square(Some(s));

        assert_eq!(session.stage(), &Stage::Idle);
        assert_eq!(session.position(), &pos);
        assert_eq!(session.last_move(), None);
    }

    #[proptest]
    fn pawns_reaching_the_last_rank_promote_to_the_piece_chosen(
        #[strategy(proptest::sample::select(Promotion::CHOICES.to_vec()))] p: Promotion,
    ) {
        let mut s = session(Color::White);
        s.start_from(GameMode::TwoPlayer, "8/4P3/8/8/8/8/k7/4K3 w - - 0 1".parse()?);
        play(&mut s, "e7e8");
        assert_eq!(s.stage(), &Stage::Promoting(sq("e7"), sq("e8")));

        s.promote(p);

        let m = Move(sq("e7"), sq("e8"), p);
        assert_eq!(s.last_move(), Some(m));
        assert_eq!(
            s.position().piece_at(sq("e8")),
            Some(Piece(Color::White, p.role().unwrap()))
        );
    }

    #[test]
    fn black_pawns_promote_on_the_first_rank() {
        let mut s = session(Color::White);
        s.start_from(GameMode::TwoPlayer, "4k3/8/8/8/8/8/3p4/K7 b - - 0 1".parse().unwrap());
        play(&mut s, "d2d1");
        assert_eq!(s.stage(), &Stage::Promoting(sq("d2"), sq("d1")));
    }

    #[test]
    fn board_clicks_are_ignored_while_promoting() {
        let mut s = session(Color::White);
        s.start_from(GameMode::TwoPlayer, "8/4P3/8/8/8/8/k7/4K3 w - - 0 1".parse().unwrap());
        play(&mut s, "e7e8");

        click(&mut s, "a1");
        click(&mut s, "e1");
        assert_eq!(s.stage(), &Stage::Promoting(sq("e7"), sq("e8")));
    }

    #[test]
    fn promotion_picker_offers_the_pieces_in_order() {
        let mut s = session(Color::White);
        s.start_from(GameMode::TwoPlayer, "8/4P3/8/8/8/8/k7/4K3 w - - 0 1".parse().unwrap());
        play(&mut s, "e7e8");

        let [_, (rook, r), ..] = s.geometry().promotion_choices();
        assert_eq!(rook, Promotion::Rook);

        s.click(r.center());
        assert_eq!(s.last_move(), Some(mv("e7e8r")));
        assert_eq!(s.stage(), &Stage::Idle);
    }

    #[test]
    fn engine_moves_after_the_human() {
        let mut s = session(Color::White);
        s.start(GameMode::VsEngine);
        play(&mut s, "e2e4");
        assert_eq!(s.stage(), &Stage::Thinking);

        let mut engine = MockPlay::new();
        engine
            .expect_play()
            .once()
            .returning(|_| Ok("e7e5".parse().unwrap()));

        assert_eq!(s.think(&mut engine), Ok(Some(mv("e7e5"))));
        assert_eq!(s.think(&mut engine), Ok(None));

        assert_eq!(s.stage(), &Stage::Idle);
        assert_eq!(s.last_move(), Some(mv("e7e5")));
        assert_eq!(s.position().turn(), Color::White);
    }

    #[test]
    fn clicks_are_ignored_while_the_engine_is_thinking() {
        let mut s = session(Color::White);
        s.start(GameMode::VsEngine);
        play(&mut s, "e2e4");
        play(&mut s, "e7e5");

        assert_eq!(s.stage(), &Stage::Thinking);
        assert_eq!(s.last_move(), Some(mv("e2e4")));
    }

    #[test]
    fn engine_moves_first_if_the_human_plays_black() {
        let mut s = session(Color::Black);
        s.start(GameMode::VsEngine);
        assert_eq!(s.stage(), &Stage::Thinking);
        assert_eq!(s.geometry().bottom(), Color::Black);

        let mut engine = MockPlay::new();
        engine
            .expect_play()
            .once()
            .returning(|_| Ok("d2d4".parse().unwrap()));

        assert_eq!(s.think(&mut engine), Ok(Some(mv("d2d4"))));
        assert_eq!(s.stage(), &Stage::Idle);

        play(&mut s, "d7d5");
        assert_eq!(s.stage(), &Stage::Thinking);
    }

    #[test]
    fn engine_failure_is_reported() {
        let mut s = session(Color::White);
        s.start(GameMode::VsEngine);
        play(&mut s, "e2e4");

        let mut engine = MockPlay::new();
        engine
            .expect_play()
            .once()
            .returning(|_| Err("broken pipe".into()));

        assert_eq!(
            s.think(&mut engine),
            Err(ThinkError::Engine("broken pipe".into()))
        );

        assert_eq!(s.stage(), &Stage::Thinking);
    }

    #[test]
    fn illegal_engine_move_is_rejected() {
        let mut s = session(Color::White);
        s.start(GameMode::VsEngine);
        play(&mut s, "e2e4");

        let mut engine = MockPlay::new();
        engine
            .expect_play()
            .once()
            .returning(|_| Ok("e2e4".parse().unwrap()));

        assert_eq!(
            s.think(&mut engine),
            Err(ThinkError::Illegal(IllegalMove(mv("e2e4"))))
        );

        assert_eq!(s.stage(), &Stage::Thinking);
        assert_eq!(s.last_move(), Some(mv("e2e4")));
        assert_eq!(s.position().turn(), Color::Black);
    }

    #[test]
    fn human_cannot_move_for_the_engine_after_an_illegal_reply() {
        let mut s = session(Color::White);
        s.start(GameMode::VsEngine);
        play(&mut s, "e2e4");

        let mut engine = MockPlay::new();
        engine
            .expect_play()
            .once()
            .returning(|_| Ok("e2e4".parse().unwrap()));

        assert!(s.think(&mut engine).is_err());

        let before = s.position().clone();
        play(&mut s, "e7e5");

        assert_eq!(s.stage(), &Stage::Thinking);
        assert_eq!(s.position(), &before);
        assert_eq!(s.last_move(), Some(mv("e2e4")));
    }

    #[test]
    fn engine_is_asked_again_after_an_illegal_reply() {
        let mut s = session(Color::White);
        s.start(GameMode::VsEngine);
        play(&mut s, "e2e4");

        let mut engine = MockPlay::new();
        let mut seq = mockall::Sequence::new();

        engine
            .expect_play()
            .once()
            .in_sequence(&mut seq)
            .returning(|_| Ok("e2e4".parse().unwrap()));

        engine
            .expect_play()
            .once()
            .in_sequence(&mut seq)
            .returning(|_| Ok("c7c5".parse().unwrap()));

        assert!(s.think(&mut engine).is_err());
        assert_eq!(s.think(&mut engine), Ok(Some(mv("c7c5"))));
        assert_eq!(s.stage(), &Stage::Idle);
    }

    #[test]
    fn engine_is_not_consulted_in_two_player_mode() {
        let mut s = session(Color::White);
        s.start(GameMode::TwoPlayer);
        play(&mut s, "e2e4");

        let mut engine = MockPlay::new();
        engine.expect_play().never();

        assert_eq!(s.think(&mut engine), Ok(None));
        assert_eq!(s.stage(), &Stage::Idle);
    }

    #[test]
    fn fools_mate_ends_the_game() {
        let mut s = session(Color::White);
        s.start(GameMode::TwoPlayer);

        for m in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            play(&mut s, m);
        }

        assert_eq!(s.stage(), &Stage::Over(Outcome::Checkmate(Color::Black)));
        assert_eq!(s.checked_king(), Some(sq("e1")));
    }

    #[test]
    fn only_the_dismiss_button_is_accepted_once_the_game_is_over() {
        let mut s = session(Color::White);
        s.start(GameMode::TwoPlayer);

        for m in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            play(&mut s, m);
        }

        let over = s.stage().clone();
        play(&mut s, "a2a3");
        assert_eq!(s.stage(), &over);

        s.click(s.geometry().dismiss_button().center());
        assert_eq!(s.stage(), &Stage::Menu);
        assert_eq!(s.mode, None);
    }

    #[test]
    fn engine_is_not_consulted_once_the_game_is_over() {
        let mut s = session(Color::White);
        s.start_from(
            GameMode::VsEngine,
            "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2"
                .parse()
                .unwrap(),
        );

        assert_eq!(s.stage(), &Stage::Thinking);

        let mut engine = MockPlay::new();
        engine
            .expect_play()
            .once()
            .returning(|_| Ok("d8h4".parse().unwrap()));

        assert_eq!(s.think(&mut engine), Ok(Some(mv("d8h4"))));
        assert_eq!(s.stage(), &Stage::Over(Outcome::Checkmate(Color::Black)));
        assert_eq!(s.think(&mut engine), Ok(None));
    }

    #[test]
    fn new_game_clears_the_last_move() {
        let mut s = session(Color::White);
        s.start(GameMode::TwoPlayer);
        play(&mut s, "e2e4");
        assert_eq!(s.escape(), ControlFlow::Continue(()));

        s.start(GameMode::TwoPlayer);
        assert_eq!(s.last_move(), None);
        assert_eq!(s.position(), &Position::default());
    }
}
