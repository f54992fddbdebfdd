//! Catalog builder — describes the immediate children of a catalog directory.
//!
//! Entries come back in directory iteration order, which the filesystem
//! defines; no sorting is applied. A `.bin` file whose first byte is the
//! firmware sentinel is reported as `bin` together with its size and
//! modification time. Per-entry failures only downgrade that entry to a
//! plain `file`; only a failure to enumerate the directory is an error.

use std::ffi::OsStr;
use std::fs::Metadata;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::io::AsyncReadExt;

/// First byte of every valid ESP8266/ESP32 firmware image.
pub const BIN_SENTINEL: u8 = 0xE9;

/// Compared case-sensitively: `firmware.BIN` is a plain file.
const BIN_EXTENSION: &str = "bin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(flatten)]
    pub kind: EntryKind,
}

/// Entry classification. `date`, `time` and `size` only exist on `bin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
    Bin {
        date: String,
        time: String,
        size: u64,
    },
}

impl CatalogEntry {
    fn new(name: String, kind: EntryKind) -> Self {
        Self { name, kind }
    }
}

/// List one directory, non-recursively.
pub async fn build_catalog(dir: &Path) -> std::io::Result<Vec<CatalogEntry>> {
    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let kind = classify_entry(&entry.path()).await;
        entries.push(CatalogEntry::new(name, kind));
    }
    Ok(entries)
}

async fn classify_entry(path: &Path) -> EntryKind {
    // Follows symlinks, so a link to a directory lists as a directory.
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::info!(entry = %path.display(), error = %e, "Cannot stat catalog entry");
            None
        }
    };

    if metadata.as_ref().is_some_and(Metadata::is_dir) {
        return EntryKind::Directory;
    }
    if !has_bin_extension(path) || read_sentinel(path).await != BIN_SENTINEL {
        return EntryKind::File;
    }

    match metadata.as_ref().and_then(bin_details) {
        Some(kind) => kind,
        None => {
            tracing::info!(entry = %path.display(), "No size or timestamp for firmware image");
            EntryKind::File
        }
    }
}

fn has_bin_extension(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(BIN_EXTENSION))
}

/// First byte of the file, or `0x00` when it cannot be read.
async fn read_sentinel(path: &Path) -> u8 {
    match read_first_byte(path).await {
        Ok(Some(byte)) => byte,
        Ok(None) => 0x00,
        Err(e) => {
            tracing::info!(entry = %path.display(), error = %e, "Cannot read firmware sentinel");
            0x00
        }
    }
}

async fn read_first_byte(path: &Path) -> std::io::Result<Option<u8>> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut buf = [0u8; 1];
    let n = file.read(&mut buf).await?;
    Ok((n == 1).then_some(buf[0]))
}

fn bin_details(metadata: &Metadata) -> Option<EntryKind> {
    let modified: DateTime<Local> = metadata.modified().ok()?.into();
    Some(EntryKind::Bin {
        date: format_date(&modified),
        time: format_time(&modified),
        size: metadata.len(),
    })
}

// C-locale renditions of strftime %x / %X.
fn format_date(t: &DateTime<Local>) -> String {
    t.format("%m/%d/%y").to_string()
}

fn format_time(t: &DateTime<Local>) -> String {
    t.format("%H:%M:%S").to_string()
}
