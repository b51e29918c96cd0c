//! Static snapshot documents served from the data directory
//!
//! - `wells.geojson`: precomputed well GeoJSON, returned verbatim
//! - `tr_json.json`: township/range grid snapshot, returned verbatim
//! - `rigs.csv`: rig listing, filtered on its `first_date` column

use crate::error::AtlasError;
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const WELLS_SNAPSHOT: &str = "wells.geojson";
pub const SECTION_SNAPSHOT: &str = "tr_json.json";
pub const RIG_LISTING: &str = "rigs.csv";

/// Column compared against the cutoff date.
pub const RIG_DATE_COLUMN: &str = "first_date";

/// Read-only view over the snapshot directory.
#[derive(Debug, Clone)]
pub struct StaticStore {
    data_dir: PathBuf,
}

impl StaticStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    async fn read(&self, name: &str) -> Result<(PathBuf, String), AtlasError> {
        let path = self.data_dir.join(name);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| AtlasError::StaticFile {
                path: path.display().to_string(),
                source,
            })?;
        Ok((path, text))
    }

    async fn read_json(&self, name: &str) -> Result<Value, AtlasError> {
        let (path, text) = self.read(name).await?;
        serde_json::from_str(&text).map_err(|e| AtlasError::MalformedData {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// The precomputed wells GeoJSON, unmodified.
    pub async fn wells_snapshot(&self) -> Result<Value, AtlasError> {
        self.read_json(WELLS_SNAPSHOT).await
    }

    /// The section grid snapshot, unmodified.
    pub async fn section_snapshot(&self) -> Result<Value, AtlasError> {
        self.read_json(SECTION_SNAPSHOT).await
    }

    /// Rig rows whose `first_date` sorts strictly after `cutoff`.
    pub async fn rigs_after(&self, cutoff: &str) -> Result<Vec<Map<String, Value>>, AtlasError> {
        let (path, text) = self.read(RIG_LISTING).await?;
        let rows = parse_rows(&text).map_err(|reason| AtlasError::MalformedData {
            path: path.display().to_string(),
            reason,
        })?;
        let total = rows.len();
        let rigs = filter_after(rows, RIG_DATE_COLUMN, cutoff).map_err(|reason| {
            AtlasError::MalformedData {
                path: path.display().to_string(),
                reason,
            }
        })?;
        debug!(total, kept = rigs.len(), cutoff, "rig listing filtered");
        Ok(rigs)
    }
}

/// Keep rows whose `column`, read as text, compares greater than `cutoff`.
///
/// This is a plain string comparison. It orders dates correctly only when
/// they are ISO-8601 (`YYYY-MM-DD...`).
pub fn filter_after(
    rows: Vec<Map<String, Value>>,
    column: &str,
    cutoff: &str,
) -> Result<Vec<Map<String, Value>>, String> {
    if let Some(first) = rows.first() {
        if !first.contains_key(column) {
            return Err(format!("missing '{column}' column"));
        }
    }

    Ok(rows
        .into_iter()
        .filter(|row| match row.get(column) {
            Some(Value::String(s)) => s.as_str() > cutoff,
            Some(Value::Number(n)) => n.to_string().as_str() > cutoff,
            _ => false,
        })
        .collect())
}

/// Parse CSV text into one JSON object per data row, keyed by header.
pub fn parse_rows(text: &str) -> Result<Vec<Map<String, Value>>, String> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    let columns: Vec<String> = csv_split(header.trim_start_matches('\u{feff}'))
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();

    lines
        .enumerate()
        .map(|(i, line)| {
            let fields = csv_split(line);
            if fields.len() != columns.len() {
                return Err(format!(
                    "row {} has {} fields, header has {}",
                    i + 2,
                    fields.len(),
                    columns.len()
                ));
            }
            Ok(columns
                .iter()
                .cloned()
                .zip(fields.iter().map(|f| typed_cell(f)))
                .collect())
        })
        .collect()
}

/// Integer, float, null for blanks, otherwise text.
fn typed_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}
