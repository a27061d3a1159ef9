
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Columns every uploaded catalog must carry
pub const REQUIRED_COLUMNS: [&str; 4] = ["product_id", "product_name", "description", "image_url"];

/// One product row of an uploaded catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub product_id: String,
    pub product_name: String,
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to open catalog {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
    #[error("malformed catalog row {row}: {message}")]
    MalformedRow { row: u64, message: String },
    #[error("failed to read catalog header: {0}")]
    Header(String),
}

/// Read a catalog CSV from disk
#[inline]
pub fn read_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogRow>, CatalogError> {
    let path = path.as_ref();
    debug!("Reading catalog from {}", path.display());

    let file = File::open(path).map_err(|source| CatalogError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let rows = parse_catalog(file)?;

    info!("Read {} catalog rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parse catalog rows from any CSV source with a header row.
///
/// Extra columns are ignored. Rows shorter than the header are kept with
/// empty trailing fields. A missing required column or a row longer than the
/// header fails the whole catalog.
#[inline]
pub fn parse_catalog<R: Read>(reader: R) -> Result<Vec<CatalogRow>, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| CatalogError::Header(e.to_string()))?
        .clone();

    let missing: Vec<&'static str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(CatalogError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let row_number = |position: Option<&csv::Position>| {
            position.map_or(index as u64 + 1, |position| position.line().saturating_sub(1))
        };

        let mut record = record.map_err(|e| CatalogError::MalformedRow {
            row: row_number(e.position()),
            message: e.to_string(),
        })?;
        if record.len() > headers.len() {
            return Err(CatalogError::MalformedRow {
                row: row_number(record.position()),
                message: format!(
                    "found {} fields, but the header has {}",
                    record.len(),
                    headers.len()
                ),
            });
        }
        while record.len() < headers.len() {
            record.push_field("");
        }

        let row = record
            .deserialize::<CatalogRow>(Some(&headers))
            .map_err(|e| CatalogError::MalformedRow {
                row: row_number(record.position()),
                message: e.to_string(),
            })?;
        rows.push(row);
    }

    Ok(rows)
}
