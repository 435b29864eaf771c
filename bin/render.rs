use crate::assets::PieceTextures;
use eframe::egui::{pos2, vec2, Align2, Color32, FontId, Painter, Rect, Stroke};
use lib::chess::{Color, Outcome, Piece, Square};
use lib::session::{self, Point, Session, Stage};

pub const BACKGROUND: Color32 = Color32::from_rgb(200, 200, 200);
const LIGHT: Color32 = Color32::from_rgb(235, 236, 208);
const DARK: Color32 = Color32::from_rgb(115, 149, 82);
const LAST_MOVE: Color32 = Color32::from_rgb(245, 246, 129);
const CHECK: Color32 = Color32::from_rgb(209, 72, 65);
const DESTINATION: Color32 = Color32::from_rgb(0, 255, 0);
const BUTTON: Color32 = Color32::from_rgb(100, 100, 255);
const BUTTON_HOVER: Color32 = Color32::from_rgb(150, 150, 255);
const TEXT: Color32 = Color32::WHITE;
const SHADE: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 150);

fn rect(r: session::Rect) -> Rect {
    Rect::from_min_size(pos2(r.x, r.y), vec2(r.w, r.h))
}

fn hovered(r: session::Rect, hover: Option<Point>) -> bool {
    hover.map_or(false, |p| r.contains(p))
}

/// Draws one frame.
pub fn draw(painter: &Painter, session: &Session, pieces: &PieceTextures, hover: Option<Point>) {
    match session.stage() {
        Stage::Menu => menu(painter, session, hover),
        stage => {
            board(painter, session);
            position(painter, session, pieces);

            if let Some(sel) = session.selection() {
                for &s in sel.destinations() {
                    let c = rect(session.geometry().square_rect(s)).center();
                    painter.circle_filled(c, 10., DESTINATION);
                }
            }

            match stage {
                Stage::Promoting(..) => picker(painter, session, pieces, hover),
                Stage::Over(outcome) => banner(painter, session, *outcome, hover),
                _ => {}
            }
        }
    }
}

fn menu(painter: &Painter, session: &Session, hover: Option<Point>) {
    let g = session.geometry();
    painter.rect_filled(painter.clip_rect(), 0., DARK);

    painter.text(
        pos2(g.width() / 2., g.height() / 4.),
        Align2::CENTER_CENTER,
        "Chess Game",
        FontId::proportional(50.),
        TEXT,
    );

    for (mode, r) in g.menu_buttons() {
        button(painter, r, mode.label(), hovered(r, hover));
    }
}

fn button(painter: &Painter, r: session::Rect, label: &str, hovered: bool) {
    let fill = if hovered { BUTTON_HOVER } else { BUTTON };
    painter.rect_filled(rect(r), 0., fill);
    painter.text(
        rect(r).center(),
        Align2::CENTER_CENTER,
        label,
        FontId::proportional(18.),
        TEXT,
    );
}

fn board(painter: &Painter, session: &Session) {
    let g = session.geometry();
    let last_move = session.last_move();
    let (bottom_rank, left_file) = match g.bottom() {
        Color::White => (0, 0),
        Color::Black => (7, 7),
    };

    for s in Square::iter() {
        let r = rect(g.square_rect(s));

        let mut fill = if (s.file() + s.rank()) % 2 == 0 {
            DARK
        } else {
            LIGHT
        };

        if last_move.map_or(false, |m| m.whence() == s || m.whither() == s) {
            fill = LAST_MOVE;
        }

        if session.checked_king() == Some(s) {
            fill = CHECK;
        }

        painter.rect_filled(r, 0., fill);

        let ink = if fill == LIGHT { DARK } else { LIGHT };
        let font = FontId::proportional(18.);

        if s.rank() == bottom_rank {
            let file = char::from(b'a' + s.file()).to_string();
            let at = r.right_bottom() - vec2(5., 5.);
            painter.text(at, Align2::RIGHT_BOTTOM, file, font.clone(), ink);
        }

        if s.file() == left_file {
            let rank = (s.rank() + 1).to_string();
            let at = r.left_top() + vec2(5., 5.);
            painter.text(at, Align2::LEFT_TOP, rank, font, ink);
        }
    }
}

fn piece(painter: &Painter, pieces: &PieceTextures, p: Piece, r: Rect) {
    let uv = Rect::from_min_max(pos2(0., 0.), pos2(1., 1.));
    painter.image(pieces.get(p).id(), r, uv, Color32::WHITE);
}

fn position(painter: &Painter, session: &Session, pieces: &PieceTextures) {
    let g = session.geometry();
    for (p, s) in session.position().iter() {
        piece(painter, pieces, p, rect(g.square_rect(s)));
    }
}

fn picker(painter: &Painter, session: &Session, pieces: &PieceTextures, hover: Option<Point>) {
    let g = session.geometry();
    let side = session.position().turn();

    painter.rect_filled(rect(g.board_rect()), 0., SHADE);

    for (promotion, r) in g.promotion_choices() {
        let fill = if hovered(r, hover) { BUTTON_HOVER } else { LIGHT };
        painter.rect_filled(rect(r), 0., fill);
        painter.rect_stroke(rect(r), 0., Stroke::new(2., DARK));

        if let Some(role) = promotion.role() {
            piece(painter, pieces, Piece(side, role), rect(r));
        }
    }
}

/// The message announcing the [`Outcome`].
fn headline(outcome: Outcome) -> String {
    let reason = match (outcome.winner(), outcome) {
        (Some(Color::White), _) => return "White won by checkmate!".into(),
        (Some(Color::Black), _) => return "Black won by checkmate!".into(),
        (None, Outcome::Stalemate) => "stalemate",
        (None, Outcome::DrawByInsufficientMaterial) => "insufficient material",
        (None, Outcome::DrawBy75MoveRule) => "the 75-move rule",
        (None, Outcome::DrawByRepetition) => "fivefold repetition",
        (None, _) => return "Draw".into(),
    };

    format!("Draw by {reason}")
}

fn banner(painter: &Painter, session: &Session, outcome: Outcome, hover: Option<Point>) {
    let g = session.geometry();
    let center = pos2(g.width() / 2., g.height() / 2.);

    let galley = painter.layout_no_wrap(headline(outcome), FontId::proportional(40.), TEXT);
    let frame = Rect::from_center_size(center, galley.size() + vec2(40., 40.));

    painter.rect_filled(frame, 0., SHADE);
    painter.rect_stroke(frame, 0., Stroke::new(5., Color32::WHITE));
    painter.galley(frame.min + vec2(20., 20.), galley, TEXT);

    let quit = g.dismiss_button();
    button(painter, quit, "Quit", hovered(quit, hover));
}
