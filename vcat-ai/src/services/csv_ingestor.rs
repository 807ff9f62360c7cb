//! CSV ingestor
//!
//! Turns an uploaded file into [`VendorRow`]s. Pure: no storage, no network.
//!
//! Accepted formats are `.csv` (comma separated) and `.tsv` (tab separated).
//! Header names are compared after trimming and ASCII lowercasing, so
//! `Vendor_Name` and ` vendor_name ` both satisfy the required column.

use crate::error::ValidationError;
use crate::models::VendorRow;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

/// Required column
pub const VENDOR_NAME_COLUMN: &str = "vendor_name";
/// Optional free-text column
pub const DESCRIPTION_COLUMN: &str = "description";
/// Optional category supplied by the uploader
pub const CATEGORY_COLUMN: &str = "category";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Tabular formats recognized by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularFormat {
    Csv,
    Tsv,
}

impl TabularFormat {
    /// Detect the format from a filename extension (case-insensitive)
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(TabularFormat::Csv),
            "tsv" => Some(TabularFormat::Tsv),
            _ => None,
        }
    }

    fn delimiter(self) -> u8 {
        match self {
            TabularFormat::Csv => b',',
            TabularFormat::Tsv => b'\t',
        }
    }
}

struct ColumnMap {
    vendor_name: usize,
    description: Option<usize>,
    category: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, ValidationError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let vendor_name = find(VENDOR_NAME_COLUMN).ok_or(ValidationError::MissingColumn {
            column: VENDOR_NAME_COLUMN,
        })?;

        Ok(Self {
            vendor_name,
            description: find(DESCRIPTION_COLUMN),
            category: find(CATEGORY_COLUMN),
        })
    }
}

/// Parse an uploaded file into vendor rows
///
/// Blank rows are skipped. A row whose vendor name is blank is skipped with
/// a warning. Duplicate vendor names are kept in file order. A file with a
/// header and no data rows yields an empty list; a file with no header at
/// all fails the `vendor_name` column check.
pub fn ingest(filename: &str, bytes: &[u8]) -> Result<Vec<VendorRow>, ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError::MissingFile);
    }

    let format =
        TabularFormat::from_filename(filename).ok_or_else(|| ValidationError::UnsupportedFormat {
            filename: filename.to_string(),
        })?;

    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = ReaderBuilder::new()
        .delimiter(format.delimiter())
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content);

    let headers = reader.headers().map_err(|e| malformed(1, &e))?.clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            malformed(line, &e)
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() > headers.len() {
            return Err(ValidationError::Malformed {
                line,
                reason: format!(
                    "found {} fields, header has {}",
                    record.len(),
                    headers.len()
                ),
            });
        }

        if record.iter().all(str::is_empty) {
            continue;
        }

        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let Some(vendor_name) = field(Some(columns.vendor_name)) else {
            warn!(line, "Skipping row with blank vendor_name");
            continue;
        };

        rows.push(VendorRow {
            line,
            vendor_name,
            description: field(columns.description),
            original_category: field(columns.category),
        });
    }

    debug!(filename, rows = rows.len(), "Parsed vendor file");
    Ok(rows)
}

fn malformed(line: u64, err: &csv::Error) -> ValidationError {
    let reason = match err.kind() {
        csv::ErrorKind::Utf8 { .. } => "file is not valid UTF-8".to_string(),
        _ => err.to_string(),
    };
    ValidationError::Malformed { line, reason }
}
