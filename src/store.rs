//! The row file shared by the two stages: `timestamp,text`, UTF-8 with BOM.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One comment: seconds into the video and the trimmed comment body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub timestamp: f64,
    pub text: String,
}

#[derive(Deserialize)]
struct RawRow {
    timestamp: Option<f64>,
    text: Option<String>,
}

/// Write `records` to `path`, overwriting it.
///
/// An empty slice writes nothing and returns `Ok(false)`; the file is not created.
pub fn save_comments(records: &[CommentRecord], path: &Path) -> Result<bool> {
    if records.is_empty() {
        warn!("Comment list is empty, not creating {}", path.display());
        return Ok(false);
    }

    info!("Saving {} comments to {}", records.len(), path.display());
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(true)
}

/// Read the row file back. Rows with an empty or missing text are dropped.
pub fn load_comments(path: &Path) -> Result<Vec<CommentRecord>> {
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

    let mut reader = csv::Reader::from_reader(body);
    let mut records = Vec::new();
    for row in reader.deserialize::<RawRow>() {
        let row = row?;
        let text = match row.text {
            Some(t) if !t.trim().is_empty() => t,
            _ => continue,
        };
        records.push(CommentRecord {
            timestamp: row.timestamp.unwrap_or(0.0),
            text,
        });
    }
    Ok(records)
}
