/// Chess domain types.
pub mod chess;
/// Clients for external chess engines.
pub mod engine;
/// Message-passing interfaces.
pub mod io;
/// The state of an interactive game.
pub mod session;
