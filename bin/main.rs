use anyhow::Error as Anyhow;
use clap::Parser;

mod app;
mod assets;
mod cli;
mod render;

fn main() -> Result<(), Anyhow> {
    cli::Cli::parse().execute()
}
