//! `deckpack push` command: Build a deck and push it to a registry.

use clap::Args;
use deckpack_core::{DeckError, DeckpackConfig};
use deckpack_runtime::{copy, RegistryAuth, RegistryReference, RegistryStore};

use super::DeckArgs;
use crate::output::{ProgressPrinter, ProgressStyle};

#[derive(Args)]
pub struct PushArgs {
    /// Target reference (e.g., "localhost:5000/deck:v1")
    pub reference: String,

    #[command(flatten)]
    pub deck: DeckArgs,

    /// Talk to the registry over plain HTTP
    #[arg(long)]
    pub plain_http: bool,

    /// Maximum number of blobs uploaded at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

pub async fn execute(
    args: PushArgs,
    config: &DeckpackConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let reference = RegistryReference::parse(&args.reference)?;
    if reference.digest.is_some() {
        return Err(DeckError::InvalidReference(format!(
            "Cannot push to a digest reference: {}",
            args.reference
        ))
        .into());
    }

    let built = super::build_deck(&args.deck, config, &reference.tag).await?;
    if !args.quiet {
        println!("Pushing {} ({} cards)...", reference, built.cards.len());
    }

    let store = RegistryStore::with_auth(
        reference.clone(),
        args.plain_http || config.plain_http,
        RegistryAuth::from_env(),
    )?;
    let printer = ProgressPrinter::new(ProgressStyle::Upload, args.quiet);
    let report = copy(
        &built.store,
        &built.tag,
        &store,
        &reference.tag,
        &super::copy_options(args.concurrency, config),
        &printer,
    )
    .await?;

    if args.quiet {
        println!("{}", report.manifest.digest);
    } else {
        println!("Pushed: {} ({})", reference, report.manifest.digest);
    }

    Ok(())
}
