//! `.syt` serialization: the whitespace-token listing snapshot written to
//! `<tempDir>/<index>.syt` on every admission, and reparsed by the
//! hot-reload watcher when a user edits the file directly.

use std::fs;
use std::io;
use std::path::Path;

use synte_lang::Listing;

use crate::compiler::{CompileError, CompileEvent, Compiler};

/// Render a listing back to its whitespace-separated source tokens.
pub fn serialize(listing: &Listing) -> String {
    listing.source.clone()
}

/// Write a listing's `.syt` snapshot to `<temp_dir>/<index>.syt`.
pub fn write(temp_dir: &Path, index: usize, listing: &Listing) -> io::Result<()> {
    let path = temp_dir.join(format!("{index}.syt"));
    fs::write(path, serialize(listing))
}

/// Error produced while reparsing a `.syt` file.
#[derive(Debug, thiserror::Error)]
pub enum SytError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("`.syt` source did not compile to exactly one listing (got {0})")]
    NotASingleListing(usize),
}

/// Read and recompile a `.syt` file's tokens into a listing, using a
/// scratch compiler so in-progress editor state is unaffected.
pub fn read(temp_dir: &Path, index: usize, sample_rate: f64) -> Result<Listing, SytError> {
    let path = temp_dir.join(format!("{index}.syt"));
    let source = fs::read_to_string(path)?;
    reparse(&source, sample_rate)
}

/// Recompile raw `.syt` token text into a single listing.
pub fn reparse(source: &str, sample_rate: f64) -> Result<Listing, SytError> {
    let mut compiler = Compiler::new(sample_rate);
    let events = compiler.feed_line(source)?;
    let mut listings: Vec<Listing> = events
        .into_iter()
        .filter_map(|e| match e {
            CompileEvent::ListingEmitted(l) => Some(l),
            _ => None,
        })
        .collect();
    if listings.len() != 1 {
        return Err(SytError::NotASingleListing(listings.len()));
    }
    Ok(listings.remove(0))
}
