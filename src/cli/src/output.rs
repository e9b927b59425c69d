//! Terminal output helpers: tables and transfer progress lines.

use comfy_table::{ContentArrangement, Table};
use deckpack_runtime::{TransferEvent, TransferObserver};

/// Create a styled table with the given headers.
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header(headers);
    table
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// How a destination receives blobs, which decides the progress wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStyle {
    /// Remote registry: `uploading` / `skipped`.
    Upload,
    /// Local layout: `writing` / `skipped`.
    Write,
}

/// Prints one line per card image as a transfer progresses.
///
/// Blobs without a title (config, manifest) are not printed.
pub struct ProgressPrinter {
    style: ProgressStyle,
    quiet: bool,
}

impl ProgressPrinter {
    pub fn new(style: ProgressStyle, quiet: bool) -> Self {
        Self { style, quiet }
    }

    fn line(&self, event: &TransferEvent) -> Option<String> {
        let desc = event.descriptor();
        let title = desc.title()?;
        Some(match (self.style, event) {
            (_, TransferEvent::Skipped(_)) => format!("skipped {} (already exists)", title),
            (ProgressStyle::Upload, TransferEvent::Uploaded(_)) => {
                format!("uploading {} ({} bytes)", title, desc.size)
            }
            (ProgressStyle::Write, TransferEvent::Uploaded(_)) => {
                format!("writing {} ({} bytes)", title, desc.size)
            }
        })
    }
}

impl TransferObserver for ProgressPrinter {
    fn on_event(&self, event: &TransferEvent) {
        if self.quiet {
            return;
        }
        if let Some(line) = self.line(event) {
            println!("{line}");
        }
    }
}
