use crate::chess::{Move, Position};
use crate::io::Process;
use anyhow::{Context, Error as Anyhow};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::{fmt, io, str::FromStr};
use tokio::runtime::{self, Runtime};
use tracing::{error, instrument};

mod limits;
mod uci;

pub use limits::*;
pub use uci::*;

/// Trait for types that choose moves.
#[cfg_attr(test, mockall::automock(type Error = String;))]
pub trait Play {
    /// The reason why a [`Move`] could not be chosen.
    type Error;

    /// Chooses a [`Move`] to play in this [`Position`].
    fn play(&mut self, pos: &Position) -> Result<Move, Self::Error>;
}

/// The reason why parsing [`EngineConfig`] failed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
#[display(fmt = "failed to parse engine configuration")]
pub struct ParseEngineConfigError(ron::de::SpannedError);

/// Runtime configuration for an [`Engine`].
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// The path to the engine executable.
    pub path: String,

    /// How long the engine may think.
    pub limits: Limits,

    /// Options sent to the engine during the handshake.
    pub options: UciOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            path: "stockfish".into(),
            limits: Limits::default(),
            options: UciOptions::default(),
        }
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ron::ser::to_string(self).map_err(|_| fmt::Error)?)
    }
}

impl FromStr for EngineConfig {
    type Err = ParseEngineConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::de::from_str(s)?)
    }
}

/// The reason why [`Engine`] failed.
#[derive(Debug, Display, Error, From)]
pub enum EngineError {
    #[display(fmt = "failed to launch the engine")]
    Io(io::Error),
    #[display(fmt = "failed to communicate with the engine")]
    Uci(UciError),
}

/// A UCI chess engine running as a subprocess.
///
/// The subprocess is driven synchronously by a single-threaded runtime owned by this handle.
#[derive(Debug)]
pub struct Engine {
    runtime: Runtime,
    uci: Uci<Process>,
}

impl Engine {
    /// Launches the engine and performs the UCI handshake.
    #[instrument(level = "debug", skip(config), err, fields(path = %config.path))]
    pub fn spawn(config: &EngineConfig) -> Result<Self, EngineError> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()?;

        let uci = runtime.block_on(async {
            let process = Process::spawn(&config.path)?;
            let uci = Uci::init(process, config.limits, config.options.clone()).await?;
            Ok::<_, EngineError>(uci)
        })?;

        Ok(Engine { runtime, uci })
    }
}

impl Play for Engine {
    type Error = EngineError;

    fn play(&mut self, pos: &Position) -> Result<Move, Self::Error> {
        let Engine { runtime, uci } = self;
        Ok(runtime.block_on(uci.play(pos))?)
    }
}

/// Stops the engine and waits for the subprocess to exit.
impl Drop for Engine {
    #[instrument(level = "debug", skip(self))]
    fn drop(&mut self) {
        let Engine { runtime, uci } = self;

        let result: Result<(), Anyhow> = runtime.block_on(async {
            uci.quit().await?;
            uci.io_mut().shutdown().await
        });

        if let Err(e) = result.context("failed to gracefully shutdown the engine") {
            error!("{:?}", e);
        }
    }
}
