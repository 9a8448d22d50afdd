//! Bulk import of listing exports.
//!
//! Exports are delimited text with a header row, tab-separated by default,
//! optionally gzip-compressed. Legacy column names (`hp`, `traffic_date`,
//! `owners`) are accepted; unknown columns are ignored.

use std::io::Read;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::Result;
use crate::listing::RawListing;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Parses raw export bytes into listings.
///
/// # Errors
///
/// Fails on malformed gzip data or rows that don't match the header width.
pub fn parse_listings(bytes: &[u8], delimiter: u8) -> Result<Vec<RawListing>> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut decoded)?;
        debug!(compressed = bytes.len(), decoded = decoded.len(), "Export decompressed");
        return read_rows(&decoded, delimiter);
    }
    read_rows(bytes, delimiter)
}

fn read_rows(bytes: &[u8], delimiter: u8) -> Result<Vec<RawListing>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: RawListing = result?;
        rows.push(record);
    }
    Ok(rows)
}
