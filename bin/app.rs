use crate::assets::{AssetError, PieceImages, PieceTextures};
use crate::render;
use anyhow::Error as Anyhow;
use derive_more::{Display, Error, From};
use eframe::egui;
use lib::chess::Color;
use lib::engine::{Engine, EngineConfig, EngineError};
use lib::session::{Geometry, Point, Session, Stage};
use std::path::Path;
use tracing::{error, info, instrument};

/// The reason why the application could not start.
#[derive(Debug, Display, Error, From)]
pub enum StartupError {
    #[display(fmt = "failed to start the engine")]
    Engine(EngineError),

    #[display(fmt = "failed to load the piece images")]
    Assets(AssetError),

    #[display(fmt = "failed to open the window: {_0}")]
    #[from(ignore)]
    Display(#[error(not(source))] String),
}

/// Loads the assets, launches the engine and runs the main loop until the window is closed.
#[instrument(level = "debug", skip(config), err, fields(engine = %config.path))]
pub fn run(
    config: &EngineConfig,
    assets: &Path,
    human: Color,
    windowed: bool,
) -> Result<(), StartupError> {
    let images = PieceImages::load(assets)?;
    let engine = Engine::spawn(config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Chess Game")
            .with_inner_size([1024., 768.])
            .with_fullscreen(!windowed),
        ..Default::default()
    };

    eframe::run_native(
        "Chess Game",
        options,
        Box::new(move |cc| {
            let pieces = images.upload(&cc.egui_ctx);
            Ok(Box::new(App::new(engine, pieces, human)))
        }),
    )
    .map_err(|e| StartupError::Display(e.to_string()))?;

    info!("bye");
    Ok(())
}

struct App {
    engine: Engine,
    pieces: PieceTextures,
    human: Color,
    session: Option<Session>,
}

impl App {
    fn new(engine: Engine, pieces: PieceTextures, human: Color) -> Self {
        App {
            engine,
            pieces,
            human,
            session: None,
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        let screen = ctx.screen_rect();

        // The layout is only ever redone while no game is running.
        let session = match &mut self.session {
            Some(s) if s.stage().is_playing() => s,
            Some(s)
                if (s.geometry().width(), s.geometry().height())
                    == (screen.width(), screen.height()) =>
            {
                s
            }
            slot => slot.insert(Session::new(
                Geometry::new(screen.width(), screen.height()),
                self.human,
            )),
        };

        if let Err(e) = session.think(&mut self.engine) {
            error!("{:?}", Anyhow::from(e).context("the game was interrupted"));
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        let (clicks, escape) = ctx.input(|i| {
            let clicks: Vec<_> = i
                .events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::PointerButton {
                        pos,
                        button: egui::PointerButton::Primary,
                        pressed: true,
                        ..
                    } => Some(Point::new(pos.x, pos.y)),
                    _ => None,
                })
                .collect();

            (clicks, i.key_pressed(egui::Key::Escape))
        });

        for p in clicks {
            session.click(p);
        }

        if escape && session.escape().is_break() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        let hover = ctx.pointer_hover_pos().map(|p| Point::new(p.x, p.y));

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(render::BACKGROUND))
            .show(ctx, |ui| render::draw(ui.painter(), session, &self.pieces, hover));

        if *session.stage() == Stage::Thinking {
            ctx.request_repaint();
        }
    }
}
