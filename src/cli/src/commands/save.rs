//! `deckpack save` command: Build a deck into an OCI layout directory.

use std::path::PathBuf;

use clap::Args;
use deckpack_core::DeckpackConfig;
use deckpack_runtime::{copy, LayoutStore};

use super::DeckArgs;
use crate::output::{ProgressPrinter, ProgressStyle};

#[derive(Args)]
pub struct SaveArgs {
    /// Layout directory (created if missing)
    pub dir: PathBuf,

    /// Tag to bind in the layout
    #[arg(short, long, default_value = "latest")]
    pub tag: String,

    #[command(flatten)]
    pub deck: DeckArgs,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

pub async fn execute(
    args: SaveArgs,
    config: &DeckpackConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let built = super::build_deck(&args.deck, config, &args.tag).await?;
    let layout = LayoutStore::create(&args.dir).await?;

    let printer = ProgressPrinter::new(ProgressStyle::Write, args.quiet);
    let report = copy(
        &built.store,
        &built.tag,
        &layout,
        &args.tag,
        &super::copy_options(None, config),
        &printer,
    )
    .await?;

    if args.quiet {
        println!("{}", report.manifest.digest);
    } else {
        println!(
            "Saved: {}:{} ({} cards, {})",
            args.dir.display(),
            args.tag,
            built.cards.len(),
            report.manifest.digest
        );
    }

    Ok(())
}
