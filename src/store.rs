//! Listing persistence.
//!
//! [`ListingStore`] is what the prediction service reads from.
//! [`CsvListingStore`] keeps every listing in one CSV file;
//! [`MemoryListingStore`] holds them in a `Vec` for tests and one-off runs.
//! Both skip listings whose id or url is already stored.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::listing::RawListing;

/// Outcome of an insert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertSummary {
    pub inserted: usize,
    /// Already present (same id or url), or repeated within the batch.
    pub duplicates: usize,
    /// Missing the id or url that identifies a listing.
    pub rejected: usize,
}

pub trait ListingStore {
    /// All listings for one manufacturer/model pair, compared case-insensitively.
    fn load_scoped(&self, manufacturer: &str, model: &str) -> Result<Vec<RawListing>>;

    fn insert(&mut self, listings: &[RawListing]) -> Result<InsertSummary>;
}

/// Ids and urls already stored.
#[derive(Debug, Default)]
struct Identities {
    ids: HashSet<String>,
    urls: HashSet<String>,
}

impl Identities {
    fn from_listings<'a>(listings: impl IntoIterator<Item = &'a RawListing>) -> Self {
        let mut identities = Self::default();
        for listing in listings {
            if let (Some(id), Some(url)) = (identity(&listing.id), identity(&listing.url)) {
                identities.ids.insert(id);
                identities.urls.insert(url);
            }
        }
        identities
    }

    /// Splits `incoming` into listings to store, tallying the rest.
    fn admit<'a>(&mut self, incoming: &'a [RawListing]) -> (Vec<&'a RawListing>, InsertSummary) {
        let mut summary = InsertSummary::default();
        let mut admitted = Vec::new();

        for listing in incoming {
            let (Some(id), Some(url)) = (identity(&listing.id), identity(&listing.url)) else {
                summary.rejected += 1;
                continue;
            };
            if self.ids.contains(&id) || self.urls.contains(&url) {
                summary.duplicates += 1;
                continue;
            }
            self.ids.insert(id);
            self.urls.insert(url);
            admitted.push(listing);
        }

        summary.inserted = admitted.len();
        (admitted, summary)
    }
}

fn identity(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Listings stored as rows of a single CSV file with a header line.
pub struct CsvListingStore {
    path: PathBuf,
}

impl CsvListingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn has_rows(&self) -> Result<bool> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() > 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn load_all(&self) -> Result<Vec<RawListing>> {
        if !self.has_rows()? {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let mut rdr = csv::Reader::from_reader(file);

        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            let record: RawListing = result?;
            rows.push(record);
        }
        Ok(rows)
    }
}

impl ListingStore for CsvListingStore {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn load_scoped(&self, manufacturer: &str, model: &str) -> Result<Vec<RawListing>> {
        let scoped: Vec<RawListing> = self
            .load_all()?
            .into_iter()
            .filter(|l| l.matches(manufacturer, model))
            .collect();

        debug!(matched = scoped.len(), "Scoped listings loaded");
        Ok(scoped)
    }

    /// Appends new listings; the header is written only when the file is new.
    fn insert(&mut self, listings: &[RawListing]) -> Result<InsertSummary> {
        let file_has_rows = self.has_rows()?;
        let existing = self.load_all()?;
        let (admitted, summary) = Identities::from_listings(&existing).admit(listings);

        if !admitted.is_empty() {
            if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }

            let file = OpenOptions::new().append(true).create(true).open(&self.path)?;
            let mut writer = WriterBuilder::new()
                .has_headers(!file_has_rows)
                .from_writer(file);

            for listing in &admitted {
                writer.serialize(listing)?;
            }
            writer.flush()?;
        }

        info!(
            path = %self.path.display(),
            inserted = summary.inserted,
            duplicates = summary.duplicates,
            rejected = summary.rejected,
            "Listings stored"
        );
        Ok(summary)
    }
}

#[derive(Debug, Default)]
pub struct MemoryListingStore {
    listings: Vec<RawListing>,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

impl ListingStore for MemoryListingStore {
    fn load_scoped(&self, manufacturer: &str, model: &str) -> Result<Vec<RawListing>> {
        Ok(self
            .listings
            .iter()
            .filter(|l| l.matches(manufacturer, model))
            .cloned()
            .collect())
    }

    fn insert(&mut self, listings: &[RawListing]) -> Result<InsertSummary> {
        let (admitted, summary) = Identities::from_listings(&self.listings).admit(listings);
        let admitted: Vec<RawListing> = admitted.into_iter().cloned().collect();
        self.listings.extend(admitted);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn listing(id: u32, manufacturer: &str, model: &str) -> RawListing {
        RawListing {
            id: Some(id.to_string()),
            url: Some(format!("https://example.test/car-{id}")),
            manufacturer: Some(manufacturer.into()),
            model: Some(model.into()),
            price: Some("100000".into()),
            mileage: Some("9000".into()),
            horsepower: Some("150".into()),
            gearbox: Some("manual".into()),
            first_registration_date: Some("2018-05-01".into()),
            owner_count: Some("1".into()),
            fuel: Some("petrol".into()),
        }
    }

    #[test]
    fn test_csv_store_round_trip_and_scope() {
        let path = temp_path("car_valuation_test_store_scope.csv");
        let _ = fs::remove_file(&path);

        let mut store = CsvListingStore::new(&path);
        let summary = store
            .insert(&[
                listing(1, "Volvo", "XC60"),
                listing(2, "volvo", "xc60"),
                listing(3, "Volvo", "V70"),
            ])
            .unwrap();
        assert_eq!(summary.inserted, 3);

        let scoped = store.load_scoped("VOLVO", "Xc60").unwrap();
        assert_eq!(scoped.len(), 2);
        assert_eq!(scoped[0], listing(1, "Volvo", "XC60"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_csv_store_skips_duplicates_and_writes_header_once() {
        let path = temp_path("car_valuation_test_store_dupes.csv");
        let _ = fs::remove_file(&path);

        let mut store = CsvListingStore::new(&path);
        store.insert(&[listing(1, "Volvo", "XC60")]).unwrap();

        let mut same_url = listing(9, "Volvo", "XC60");
        same_url.url = Some("https://example.test/car-1".into());
        let mut no_id = listing(10, "Volvo", "XC60");
        no_id.id = None;

        let summary = store
            .insert(&[
                listing(1, "Volvo", "XC60"),
                same_url,
                no_id,
                listing(2, "Volvo", "XC60"),
                listing(2, "Volvo", "XC60"),
            ])
            .unwrap();
        assert_eq!(
            summary,
            InsertSummary {
                inserted: 1,
                duplicates: 3,
                rejected: 1
            }
        );

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.starts_with("id,")).count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_empty_scope() {
        let store = CsvListingStore::new(temp_path("car_valuation_test_store_missing.csv"));
        assert!(store.load_scoped("Volvo", "XC60").unwrap().is_empty());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryListingStore::new();
        let summary = store
            .insert(&[listing(1, "Audi", "A4"), listing(1, "Audi", "A4")])
            .unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.load_scoped("audi", "a4").unwrap().len(), 1);
        assert!(store.load_scoped("audi", "a6").unwrap().is_empty());
    }
}
