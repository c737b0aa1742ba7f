use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::zip::ArchiveIndex;
use anyhow::Result;

/// Suffix of the companion entry holding an asset's digest
pub const DIGEST_SUFFIX: &str = ".md5";

/// Companion entries shorter than this hold no usable digest
pub const MIN_DIGEST_LEN: u64 = 32;

/// Strong validator of an asset, emitted verbatim as its `ETag`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator(Arc<str>);

impl Validator {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves validators from `<key>.md5` companion entries.
///
/// The companion holds `<hex digest><space><anything>`; the validator is
/// everything before the first space. Results, including the absence of a
/// validator, are cached per key for the life of the resolver since the
/// archive never changes underneath it.
pub struct ValidatorResolver {
    index: Arc<ArchiveIndex>,
    cache: DashMap<String, Option<Validator>>,
}

impl ValidatorResolver {
    pub fn new(index: Arc<ArchiveIndex>) -> Self {
        Self {
            index,
            cache: DashMap::new(),
        }
    }

    /// Validator for `key`, if its companion entry exists and is long enough.
    ///
    /// Read failures are returned and not cached.
    pub async fn resolve(&self, key: &str) -> Result<Option<Validator>> {
        if let Some(cached) = self.cache.get(key) {
            trace!(key, "validator cache hit");
            return Ok(cached.value().clone());
        }

        let validator = self.read_companion(key).await?;
        debug!(key, validator = ?validator.as_ref().map(Validator::as_str), "validator resolved");

        let cached = self
            .cache
            .entry(key.to_string())
            .or_insert(validator)
            .value()
            .clone();
        Ok(cached)
    }

    /// Number of keys resolved so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    async fn read_companion(&self, key: &str) -> Result<Option<Validator>> {
        let companion = format!("{key}{DIGEST_SUFFIX}");
        let Some(entry) = self.index.lookup(&companion) else {
            return Ok(None);
        };
        if entry.size < MIN_DIGEST_LEN {
            return Ok(None);
        }

        let mut stream = self.index.open_entry(entry).await?;
        let mut digest = Vec::with_capacity(MIN_DIGEST_LEN as usize);

        while let Some(chunk) = stream.next_chunk().await? {
            match chunk.iter().position(|&b| b == b' ') {
                Some(end) => {
                    digest.extend_from_slice(&chunk[..end]);
                    break;
                }
                None => digest.extend_from_slice(&chunk),
            }
        }

        Ok(Some(Validator::new(String::from_utf8_lossy(&digest))))
    }
}
