use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
use anyhow::Result;

use super::parser::ZipParser;
use super::stream::EntryStream;
use super::structures::ZipFileEntry;

/// Metadata of one archive entry, fixed for the lifetime of the index
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    /// Uncompressed size in bytes
    pub size: u64,
    /// Modification time, at the archive's native resolution
    pub modified_at: DateTime<Utc>,
    file: ZipFileEntry,
}

impl EntryMetadata {
    fn new(file: ZipFileEntry) -> Self {
        Self {
            size: file.uncompressed_size,
            modified_at: file.modified_at(),
            file,
        }
    }
}

/// Read-only index over an opened archive.
///
/// Built once from the Central Directory; every lookup afterwards is a plain
/// map read, so the index is shared between requests without locking.
/// Keys are entry names exactly as stored (case-sensitive, no leading `/`).
pub struct ArchiveIndex {
    parser: ZipParser<dyn ReadAt>,
    entries: HashMap<String, EntryMetadata>,
}

impl ArchiveIndex {
    /// Open an archive from a local path or an `http(s)://` URL.
    pub async fn open(location: &str) -> Result<Self> {
        let reader: Arc<dyn ReadAt> = if is_http_url(location) {
            Arc::new(HttpRangeReader::new(location.to_string()).await?)
        } else {
            Arc::new(LocalFileReader::new(Path::new(location))?)
        };
        Self::from_reader(reader).await
    }

    /// Open an archive held in memory.
    pub async fn from_bytes(data: impl Into<bytes::Bytes>) -> Result<Self> {
        Self::from_reader(Arc::new(MemoryReader::new(data))).await
    }

    /// Read the Central Directory of `reader` and index every entry by name.
    pub async fn from_reader(reader: Arc<dyn ReadAt>) -> Result<Self> {
        let parser = ZipParser::new(reader);
        let files = parser.list_files().await?;

        let mut entries = HashMap::with_capacity(files.len());
        for file in files {
            match entries.entry(file.file_name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(EntryMetadata::new(file));
                }
                Entry::Occupied(_) => {
                    warn!(name = %file.file_name, "duplicate archive entry ignored");
                }
            }
        }

        info!(
            entries = entries.len(),
            size = parser.reader().size(),
            "archive indexed"
        );

        Ok(Self { parser, entries })
    }

    /// Metadata for `key`, or `None` when the archive has no such entry.
    pub fn lookup(&self, key: &str) -> Option<&EntryMetadata> {
        self.entries.get(key)
    }

    /// Open an independent stream over the uncompressed bytes of `entry`.
    pub async fn open_entry(&self, entry: &EntryMetadata) -> Result<EntryStream> {
        let data_offset = self.parser.get_data_offset(&entry.file).await?;
        debug!(name = %entry.file.file_name, data_offset, "opening entry stream");
        EntryStream::new(self.parser.reader().clone(), &entry.file, data_offset)
    }

    /// Bytes the archive source fetched over the network, `None` for local sources
    pub fn transferred_bytes(&self) -> Option<u64> {
        self.parser.reader().transferred_bytes()
    }

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn is_http_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}
