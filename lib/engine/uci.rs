use super::Limits;
use crate::chess::{Move, Position};
use crate::io::Io;
use derive_more::{Display, Error, From};
use std::{collections::HashMap, io};
use tracing::{debug, info, instrument};
use vampirc_uci::{self as uci, UciFen, UciMessage, UciSearchControl};

/// Engine specific options, sent through `setoption` during the handshake.
pub type UciOptions = HashMap<String, Option<String>>;

/// The reason why the UCI server could not be communicated with.
#[derive(Debug, Display, Error, From)]
#[display(fmt = "the UCI server encountered an error")]
pub struct UciError(#[from(forward)] io::Error);

/// A Universal Chess Interface client for a chess engine.
#[derive(Debug)]
pub struct Uci<T: Io> {
    io: T,
    limits: Limits,
}

impl<T: Io + Send> Uci<T> {
    /// Performs the UCI handshake and configures the engine with the given [`UciOptions`].
    #[instrument(level = "debug", skip(io, options), err)]
    pub async fn init(mut io: T, limits: Limits, options: UciOptions) -> Result<Self, UciError> {
        io.send(&UciMessage::Uci.to_string()).await?;
        io.flush().await?;

        loop {
            match uci::parse_one(io.recv().await?.trim()) {
                UciMessage::UciOk => break,
                UciMessage::Id {
                    name: Some(name), ..
                } => info!(%name, "engine identified"),
                UciMessage::Id {
                    author: Some(author),
                    ..
                } => info!(%author, "engine identified"),
                msg => debug!(%msg, "ignored message"),
            }
        }

        for (name, value) in options {
            let set_option = UciMessage::SetOption { name, value };
            io.send(&set_option.to_string()).await?;
        }

        io.send(&UciMessage::UciNewGame.to_string()).await?;
        io.send(&UciMessage::IsReady.to_string()).await?;
        io.flush().await?;

        while !matches!(uci::parse_one(io.recv().await?.trim()), UciMessage::ReadyOk) {}

        Ok(Uci { io, limits })
    }

    /// Mutable access to the underlying [`Io`].
    pub fn io_mut(&mut self) -> &mut T {
        &mut self.io
    }

    async fn go(&mut self, pos: &Position) -> Result<(), UciError> {
        let position = UciMessage::Position {
            startpos: false,
            fen: Some(UciFen(pos.to_string())),
            moves: Vec::new(),
        };

        let go = match self.limits {
            Limits::None => UciMessage::go(),
            Limits::Depth(d) => UciMessage::Go {
                search_control: Some(UciSearchControl::depth(d)),
                time_control: None,
            },
            Limits::Time(t) => UciMessage::go_movetime(
                uci::Duration::from_std(t).unwrap_or_else(|_| uci::Duration::max_value()),
            ),
        };

        self.io.send(&position.to_string()).await?;
        self.io.send(&go.to_string()).await?;
        self.io.flush().await?;

        Ok(())
    }

    /// Asks the engine for the best [`Move`] in this [`Position`].
    #[instrument(level = "debug", skip(self, pos), ret(Display), err, fields(%pos))]
    pub async fn play(&mut self, pos: &Position) -> Result<Move, UciError> {
        self.go(pos).await?;

        loop {
            if let UciMessage::BestMove { best_move: m, .. } =
                uci::parse_one(self.io.recv().await?.trim())
            {
                break Ok(m.into());
            }
        }
    }

    /// Instructs the engine to stop searching and exit.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn quit(&mut self) -> Result<(), UciError> {
        self.io.send(&UciMessage::Stop.to_string()).await?;
        self.io.send(&UciMessage::Quit.to_string()).await?;
        self.io.flush().await?;
        Ok(())
    }
}
