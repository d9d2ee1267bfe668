//! Catalog loading
//!
//! Reads the full book catalog from a CSV file with a header row (the
//! Book-Crossing `Books.csv`), a JSON array file or a JSON-lines file. Field
//! names follow either the plain form (`title`, `author`, ...) or the
//! Book-Crossing column names (`Book-Title`, `Book-Author`, ...).

use crate::{Error, Item, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info, warn};

/// One raw record as it appears in the dataset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogRecord {
    #[serde(default, alias = "Book-Title")]
    pub title: Option<String>,
    #[serde(default, alias = "Book-Author")]
    pub author: Option<String>,
    #[serde(default, alias = "Publisher")]
    pub publisher: Option<String>,
    #[serde(default, alias = "Year-Of-Publication")]
    pub year: Option<Value>,
    #[serde(default, alias = "Image-URL-M")]
    pub image_url: Option<String>,
}

impl CatalogRecord {
    /// Convert into an [`Item`]. `None` when `title` or `author` is missing.
    pub fn into_item(self) -> Option<Item> {
        let title = self.title?;
        let author = self.author?;
        let year = self.year.as_ref().and_then(coerce_year);
        Some(
            Item::new(title, author)
                .with_publisher(self.publisher)
                .with_year(year)
                .with_image_url(self.image_url),
        )
    }
}

/// Numbers and numeric strings become a year; anything else is unknown.
pub fn coerce_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i32))
        }
        _ => None,
    }
}

/// Convert raw records into items, dropping the ones without title or author
pub fn items_from_records(records: Vec<CatalogRecord>) -> Result<Vec<Item>> {
    let total = records.len();
    let items: Vec<Item> = records.into_iter().filter_map(CatalogRecord::into_item).collect();

    let dropped = total - items.len();
    if dropped > 0 {
        warn!("Dropped {} catalog records without title or author", dropped);
    }
    if items.is_empty() {
        return Err(Error::Catalog(format!("no usable records out of {}", total)));
    }
    Ok(items)
}

/// Load a catalog from `path`
///
/// `.csv` files are read by header name, skipping rows that do not parse.
/// `.jsonl` / `.ndjson` files are read one record per line; anything else is
/// parsed as a single JSON array.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<Item>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let records = match extension.as_deref() {
        Some("csv") => read_csv(path)?,
        Some("jsonl") | Some("ndjson") => read_json_lines(path)?,
        _ => serde_json::from_str(&fs::read_to_string(path)?)?,
    };

    let items = items_from_records(records)?;
    info!("Loaded {} books from {:?}", items.len(), path);
    Ok(items)
}

fn read_csv(path: &Path) -> Result<Vec<CatalogRecord>> {
    let mut reader = csv::Reader::from_reader(File::open(path)?);

    let mut records = Vec::new();
    let mut malformed = 0usize;
    for result in reader.deserialize::<CatalogRecord>() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                malformed += 1;
                debug!(error = %e, "Skipping malformed CSV row");
            }
        }
    }

    if malformed > 0 {
        warn!("Skipped {} malformed rows in {:?}", malformed, path);
    }
    Ok(records)
}

fn read_json_lines(path: &Path) -> Result<Vec<CatalogRecord>> {
    fs::read_to_string(path)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str::<CatalogRecord>(line).map_err(Error::from))
        .collect()
}
