//! `deckpack copy` command: Copy a tagged deck between stores.

use clap::Args;
use deckpack_core::DeckpackConfig;
use deckpack_runtime::{copy, StoreTarget};

use crate::output::{format_bytes, ProgressPrinter, ProgressStyle};

#[derive(Args)]
pub struct CopyArgs {
    /// Source: layout directory or registry reference
    pub source: String,

    /// Destination: layout directory (existing, or starting with ./ or /) or registry reference
    pub destination: String,

    /// Talk to registries over plain HTTP
    #[arg(long)]
    pub plain_http: bool,

    /// Maximum number of blobs copied at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

pub async fn execute(
    args: CopyArgs,
    config: &DeckpackConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let plain_http = args.plain_http || config.plain_http;
    let source = StoreTarget::parse(&args.source)?;
    let destination = StoreTarget::parse(&args.destination)?;

    let src = source.open(plain_http).await?;
    let dst = destination.open_for_write(plain_http).await?;

    let style = match destination {
        StoreTarget::Layout(_) => ProgressStyle::Write,
        StoreTarget::Registry(_) => ProgressStyle::Upload,
    };
    let printer = ProgressPrinter::new(style, args.quiet);

    let report = copy(
        src.as_ref(),
        &source.read_reference(),
        dst.as_ref(),
        destination.tag(),
        &super::copy_options(args.concurrency, config),
        &printer,
    )
    .await?;

    if !args.quiet {
        println!(
            "Copied {} -> {} ({} uploaded, {} skipped, {})",
            source,
            destination,
            report.uploaded.len(),
            report.skipped.len(),
            format_bytes(report.bytes_uploaded())
        );
    }

    Ok(())
}
