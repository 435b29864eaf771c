use crate::chess::{Color, Promotion, Square};

#[cfg(test)]
use proptest::prelude::*;

/// A point on the screen, in pixels.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct Point {
    #[cfg_attr(test, strategy(-100f32..4000f32))]
    pub x: f32,
    #[cfg_attr(test, strategy(-100f32..4000f32))]
    pub y: f32,
}

impl Point {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

/// An axis-aligned rectangle on the screen, in pixels.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    #[inline]
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    /// Whether the point lies within this rectangle.
    ///
    /// The left and top edges are inclusive, the right and bottom edges are exclusive.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        (self.x..self.x + self.w).contains(&p.x) && (self.y..self.y + self.h).contains(&p.y)
    }

    /// The center of this rectangle.
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2., self.y + self.h / 2.)
    }
}

/// The kinds of game that can be started from the menu.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum GameMode {
    /// Two humans share the board.
    TwoPlayer,
    /// A human plays against the engine.
    VsEngine,
}

impl GameMode {
    /// The label of the menu button that starts this mode.
    pub fn label(&self) -> &'static str {
        match self {
            GameMode::TwoPlayer => "Two Player",
            GameMode::VsEngine => "Bot vs Player",
        }
    }
}

/// The layout of the screen.
///
/// Fixed once from the size of the viewport.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Geometry {
    width: f32,
    height: f32,
    square: f32,
    origin: Point,
    bottom: Color,
}

impl Geometry {
    const MARGIN: f32 = 50.;
    const BUTTON: (f32, f32) = (300., 100.);
    const BUTTON_GAP: f32 = 20.;
    const DISMISS: (f32, f32) = (120., 40.);

    /// Lays out a screen of the given size with White at the bottom.
    pub fn new(width: f32, height: f32) -> Self {
        let board = (width.min(height) - Self::MARGIN).max(0.);

        Geometry {
            width,
            height,
            square: (board / 8.).floor(),
            origin: Point::new(((width - board) / 2.).floor(), ((height - board) / 2.).floor()),
            bottom: Color::White,
        }
    }

    /// The width of the screen.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// The height of the screen.
    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// The side of a board square.
    #[inline]
    pub fn square(&self) -> f32 {
        self.square
    }

    /// The side whose first rank is drawn at the bottom.
    #[inline]
    pub fn bottom(&self) -> Color {
        self.bottom
    }

    /// Turns the board so that `side` is at the bottom.
    #[inline]
    pub fn orient(&mut self, side: Color) {
        self.bottom = side;
    }

    /// The area covered by the board.
    pub fn board_rect(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y,
            self.square * 8.,
            self.square * 8.,
        )
    }

    /// The [`Square`] under a point, if any.
    pub fn square_at(&self, p: Point) -> Option<Square> {
        if !self.board_rect().contains(p) {
            return None;
        }

        let col = (((p.x - self.origin.x) / self.square) as u8).min(7);
        let row = (((p.y - self.origin.y) / self.square) as u8).min(7);

        Some(match self.bottom {
            Color::White => Square::new(col, 7 - row),
            Color::Black => Square::new(7 - col, row),
        })
    }

    /// The area covered by a [`Square`].
    pub fn square_rect(&self, s: Square) -> Rect {
        let (col, row) = match self.bottom {
            Color::White => (s.file(), 7 - s.rank()),
            Color::Black => (7 - s.file(), s.rank()),
        };

        Rect::new(
            self.origin.x + f32::from(col) * self.square,
            self.origin.y + f32::from(row) * self.square,
            self.square,
            self.square,
        )
    }

    /// The menu buttons, from top to bottom.
    pub fn menu_buttons(&self) -> [(GameMode, Rect); 2] {
        let (w, h) = Self::BUTTON;
        let x = ((self.width - w) / 2.).floor();
        let y = (self.height / 2.).floor() - h / 2.;

        [
            (GameMode::TwoPlayer, Rect::new(x, y, w, h)),
            (GameMode::VsEngine, Rect::new(x, y + h + Self::BUTTON_GAP, w, h)),
        ]
    }

    /// The button that dismisses a finished game, at the top right corner.
    pub fn dismiss_button(&self) -> Rect {
        let (w, h) = Self::DISMISS;
        Rect::new(self.width - w - 30., 20., w, h)
    }

    /// The promotion picker, four squares in a row centered on the board.
    pub fn promotion_choices(&self) -> [(Promotion, Rect); 4] {
        let y = self.origin.y + self.square * 3.5;
        std::array::from_fn(|i| {
            let x = self.origin.x + self.square * (2 + i) as f32;
            (Promotion::CHOICES[i], Rect::new(x, y, self.square, self.square))
        })
    }
}
