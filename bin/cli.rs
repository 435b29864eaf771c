use crate::app;
use anyhow::{Context, Error as Anyhow};
use clap::Parser;
use lib::{chess::Color, engine::EngineConfig};
use std::{cmp::min, io::stderr, path::PathBuf};
use tracing::{instrument, Level};
use tracing_subscriber::fmt::{format::FmtSpan, layer};
use tracing_subscriber::{filter::Targets, prelude::*, registry, util::SubscriberInitExt};

/// Command line interface.
#[derive(Parser)]
#[clap(author, version, about)]
pub struct Cli {
    /// Verbosity level.
    #[clap(short, long)]
    #[cfg_attr(not(debug_assertions), clap(default_value_t = Level::INFO))]
    #[cfg_attr(debug_assertions, clap(default_value_t = Level::DEBUG))]
    verbosity: Level,

    /// The engine configuration, for example `(path: "stockfish", limits: time("1s"))`.
    #[clap(short, long, default_value_t)]
    engine: EngineConfig,

    /// The directory containing the piece images.
    #[clap(short, long, default_value = "assets/pieces")]
    assets: PathBuf,

    /// The side played against the engine.
    #[clap(long, default_value_t = Color::White)]
    human: Color,

    /// Opens a window instead of going fullscreen.
    #[clap(long)]
    windowed: bool,
}

impl Cli {
    #[instrument(level = "trace", skip(self), err)]
    pub fn execute(self) -> Result<(), Anyhow> {
        let filter = Targets::new()
            .with_target("chessfront", self.verbosity)
            .with_target("lib", self.verbosity)
            .with_default(min(Level::WARN, self.verbosity));

        let writer = layer()
            .pretty()
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(stderr);

        registry().with(filter).with(writer).init();

        app::run(&self.engine, &self.assets, self.human, self.windowed)
            .context("failed to start the chess board")
    }
}
