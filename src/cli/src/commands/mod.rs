//! CLI command definitions and dispatch.

mod copy;
mod push;
mod save;
mod show;
mod version;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use deckpack_core::deck::read_deck;
use deckpack_core::DeckpackConfig;
use deckpack_runtime::{BuiltDeck, CopyOptions, DeckBuilder, DirectoryAssets};

/// Deckpack: package playing-card decks as OCI artifacts.
#[derive(Parser)]
#[command(name = "deckpack", version, about)]
pub struct Cli {
    /// Config file (default: ~/.deckpack/config.yaml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Build a deck and push it to a registry
    Push(push::PushArgs),
    /// Build a deck and save it to an OCI layout directory
    Save(save::SaveArgs),
    /// Copy a tagged deck between layout directories and registries
    Copy(copy::CopyArgs),
    /// Load, verify and list a stored deck
    Show(show::ShowArgs),
    /// Show version information
    Version(version::VersionArgs),
}

/// Where a deck is built from.
#[derive(Args, Debug, Clone)]
pub struct DeckArgs {
    /// Deck definition: one card code per line, or a JSON array
    #[arg(long, default_value = "cards.txt")]
    pub deck: PathBuf,

    /// Directory holding the card images (overrides config)
    #[arg(long)]
    pub images: Option<PathBuf>,
}

/// Load configuration from `path`, the per-user file, and the environment.
pub fn load_config(path: Option<&Path>) -> Result<DeckpackConfig, Box<dyn std::error::Error>> {
    Ok(DeckpackConfig::load(path)?)
}

/// Read the deck file and build the artifact, tagged `tag` in a staging store.
pub(crate) async fn build_deck(
    args: &DeckArgs,
    config: &DeckpackConfig,
    tag: &str,
) -> Result<BuiltDeck, Box<dyn std::error::Error>> {
    let codes = read_deck(&args.deck)?;
    let images_dir = args.images.as_ref().unwrap_or(&config.images_dir);
    let assets = DirectoryAssets::new(images_dir);

    tracing::debug!(
        deck = %args.deck.display(),
        images = %images_dir.display(),
        cards = codes.len(),
        "Building deck"
    );

    Ok(DeckBuilder::new(&assets).build(&codes, tag).await?)
}

/// Transfer options from a command-line override or the config.
pub(crate) fn copy_options(concurrency: Option<usize>, config: &DeckpackConfig) -> CopyOptions {
    CopyOptions {
        concurrency: concurrency.unwrap_or(config.concurrency).max(1),
    }
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli, config: DeckpackConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Push(args) => push::execute(args, &config).await,
        Command::Save(args) => save::execute(args, &config).await,
        Command::Copy(args) => copy::execute(args, &config).await,
        Command::Show(args) => show::execute(args, &config).await,
        Command::Version(args) => version::execute(args).await,
    }
}
