use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{replay::ReplayArgs, round::RoundArgs};

mod parsers;
mod replay;
mod round;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replays a scripted drawing session against a GeoJSON feature collection
    #[command(visible_alias = "r")]
    Replay {
        #[command(flatten)]
        args: ReplayArgs,
    },
    /// Rounds a coordinate to the snapping precision
    Round {
        #[command(flatten)]
        args: RoundArgs,
    },
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Replay { args }) => replay::run(args)?,
        Some(Commands::Round { args }) => round::run(args)?,
        None => {}
    }

    Ok(())
}
