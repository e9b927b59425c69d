//! `deckpack show` command: Load, verify and list a stored deck.

use clap::Args;
use deckpack_core::{catalog, DeckpackConfig};
use deckpack_runtime::{load_deck, StoreTarget};

use crate::output::{format_bytes, new_table};

#[derive(Args)]
pub struct ShowArgs {
    /// Layout directory or registry reference
    pub source: String,

    /// Tag to load (default: the reference tag, or "latest" for a directory)
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Talk to the registry over plain HTTP
    #[arg(long)]
    pub plain_http: bool,

    /// Only print card codes, one per line
    #[arg(short, long)]
    pub quiet: bool,
}

pub async fn execute(
    args: ShowArgs,
    config: &DeckpackConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = StoreTarget::parse(&args.source)?;
    let store = target.open(args.plain_http || config.plain_http).await?;
    let tag = args.tag.clone().unwrap_or_else(|| target.read_reference());

    let deck = load_deck(store.as_ref(), &tag).await?;

    if args.quiet {
        for code in &deck.cards {
            println!("{code}");
        }
        return Ok(());
    }

    let mut table = new_table(&["CARD", "IMAGE", "SIZE"]);
    for code in &deck.cards {
        let filename = catalog::resolve(code).unwrap_or_else(|_| "-".to_string());
        let size = deck
            .image(&filename)
            .map(|data| format_bytes(data.len() as u64))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![code.clone(), filename, size]);
    }
    println!("{table}");
    println!("{} cards, {} images, verified", deck.len(), deck.images.len());

    Ok(())
}
