//! ZIP fixtures for integration tests.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::{DateTime, TimeZone, Utc};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;
use std::sync::Arc;

use zipstatic::{ArchiveIndex, AssetService, PathResolver};

/// 2021-03-14 15:09:26, the DOS timestamp every fixture entry carries
pub const DOS_DATE: u16 = (41 << 9) | (3 << 5) | 14;
pub const DOS_TIME: u16 = (15 << 11) | (9 << 5) | 13;
pub const DOS_HTTP_DATE: &str = "Sun, 14 Mar 2021 15:09:26 GMT";

pub const DIGEST: &str = "d41d8cd98f00b204e9800998ecf8427e";

pub fn dos_modified_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 14, 15, 9, 26).unwrap()
}

struct FixtureEntry {
    name: String,
    data: Vec<u8>,
    deflate: bool,
    unix_mtime: Option<u32>,
    crc_override: Option<u32>,
    method_override: Option<u16>,
}

/// Builds ZIP archives byte by byte
#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<FixtureEntry>,
    comment: Vec<u8>,
    zip64: bool,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(self, name: &str, data: impl AsRef<[u8]>) -> Self {
        self.push(name, data.as_ref(), false)
    }

    pub fn deflated(self, name: &str, data: impl AsRef<[u8]>) -> Self {
        self.push(name, data.as_ref(), true)
    }

    /// Add `name` plus its `name.md5` companion holding `"<digest> <name>\n"`
    pub fn with_digest(self, name: &str, data: impl AsRef<[u8]>, digest: &str) -> Self {
        let companion = format!("{digest} {name}\n");
        self.stored(name, data)
            .stored(&format!("{name}.md5"), companion)
    }

    /// Give the last added entry an extended timestamp
    pub fn unix_mtime(mut self, mtime: u32) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.unix_mtime = Some(mtime);
        }
        self
    }

    /// Record a wrong CRC-32 for the last added entry
    pub fn corrupt_crc(mut self) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.crc_override = Some(!crc32(&entry.data));
        }
        self
    }

    /// Record another compression method for the last added entry
    pub fn method(mut self, method: u16) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.method_override = Some(method);
        }
        self
    }

    /// End the archive with ZIP64 records and a saturated classic EOCD
    pub fn zip64(mut self) -> Self {
        self.zip64 = true;
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.as_bytes().to_vec();
        self
    }

    fn push(mut self, name: &str, data: &[u8], deflate: bool) -> Self {
        self.entries.push(FixtureEntry {
            name: name.to_string(),
            data: data.to_vec(),
            deflate,
            unix_mtime: None,
            crc_override: None,
            method_override: None,
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let payload = if entry.deflate {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&entry.data).unwrap();
                encoder.finish().unwrap()
            } else {
                entry.data.clone()
            };
            let method = entry
                .method_override
                .unwrap_or(if entry.deflate { 8 } else { 0 });
            let crc = entry.crc_override.unwrap_or_else(|| crc32(&entry.data));
            let extra = entry.unix_mtime.map(extended_timestamp).unwrap_or_default();
            let lfh_offset = out.len() as u32;

            // Local File Header
            out.extend_from_slice(b"PK\x03\x04");
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(method).unwrap();
            out.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            out.write_u32::<LittleEndian>(crc).unwrap();
            out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(entry.data.len() as u32).unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(extra.len() as u16).unwrap();
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(&extra);
            out.extend_from_slice(&payload);

            // Central Directory File Header
            central.extend_from_slice(b"PK\x01\x02");
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(method).unwrap();
            central.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            central.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            central.write_u32::<LittleEndian>(crc).unwrap();
            central.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            central.write_u32::<LittleEndian>(entry.data.len() as u32).unwrap();
            central.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(extra.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u32::<LittleEndian>(0).unwrap();
            central.write_u32::<LittleEndian>(lfh_offset).unwrap();
            central.extend_from_slice(entry.name.as_bytes());
            central.extend_from_slice(&extra);
        }

        let cd_offset = out.len() as u32;
        out.extend_from_slice(&central);

        let (entries, cd_size, cd_offset) = if self.zip64 {
            let eocd64_offset = out.len() as u64;

            // ZIP64 End of Central Directory
            out.extend_from_slice(b"PK\x06\x06");
            out.write_u64::<LittleEndian>(44).unwrap();
            out.write_u16::<LittleEndian>(45).unwrap();
            out.write_u16::<LittleEndian>(45).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u64::<LittleEndian>(self.entries.len() as u64).unwrap();
            out.write_u64::<LittleEndian>(self.entries.len() as u64).unwrap();
            out.write_u64::<LittleEndian>(central.len() as u64).unwrap();
            out.write_u64::<LittleEndian>(cd_offset as u64).unwrap();

            // ZIP64 End of Central Directory Locator
            out.extend_from_slice(b"PK\x06\x07");
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u64::<LittleEndian>(eocd64_offset).unwrap();
            out.write_u32::<LittleEndian>(1).unwrap();

            (0xFFFF, 0xFFFF_FFFF, 0xFFFF_FFFF)
        } else {
            (self.entries.len() as u16, central.len() as u32, cd_offset)
        };

        // End of Central Directory
        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(entries).unwrap();
        out.write_u16::<LittleEndian>(entries).unwrap();
        out.write_u32::<LittleEndian>(cd_size).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.extend_from_slice(&self.comment);

        out
    }

    pub async fn index(self) -> Arc<ArchiveIndex> {
        Arc::new(ArchiveIndex::from_bytes(self.build()).await.unwrap())
    }

    pub async fn service(self) -> AssetService {
        AssetService::new(self.index().await, PathResolver::default())
    }
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

fn extended_timestamp(mtime: u32) -> Vec<u8> {
    let mut extra = Vec::new();
    extra.write_u16::<LittleEndian>(0x5455).unwrap();
    extra.write_u16::<LittleEndian>(5).unwrap();
    extra.write_u8(0x01).unwrap();
    extra.write_u32::<LittleEndian>(mtime).unwrap();
    extra
}

/// Deterministic, poorly compressible payload
pub fn noise(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x9E37_79B9;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}
