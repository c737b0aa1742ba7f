use bytes::Bytes;
use flate2::{Crc, Decompress, FlushDecompress, Status};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::structures::{CompressionMethod, ZipFileEntry};

/// Size of each read from the archive and of each produced chunk
pub const CHUNK_SIZE: usize = 64 * 1024;

enum Decoder {
    Stored,
    Deflate(Inflater),
}

struct Inflater {
    decompress: Decompress,
    input: Vec<u8>,
    pos: usize,
    ended: bool,
}

/// Sequential reader over the uncompressed bytes of one entry.
///
/// Each stream owns its own cursor into the shared archive source, so any
/// number of streams may be open at once. Dropping the stream releases it.
/// The produced length and CRC-32 are checked against the Central Directory
/// once the entry is exhausted.
pub struct EntryStream {
    reader: Arc<dyn ReadAt>,
    name: String,
    offset: u64,
    compressed_remaining: u64,
    expected_size: u64,
    expected_crc: u32,
    produced: u64,
    crc: Crc,
    decoder: Decoder,
    finished: bool,
}

impl EntryStream {
    pub(crate) fn new(reader: Arc<dyn ReadAt>, entry: &ZipFileEntry, data_offset: u64) -> Result<Self> {
        let decoder = match entry.compression_method {
            CompressionMethod::Stored => {
                if entry.compressed_size != entry.uncompressed_size {
                    bail!(
                        "Stored entry {} has mismatched sizes ({} != {})",
                        entry.file_name,
                        entry.compressed_size,
                        entry.uncompressed_size
                    );
                }
                Decoder::Stored
            }
            CompressionMethod::Deflate => Decoder::Deflate(Inflater {
                decompress: Decompress::new(false),
                input: Vec::new(),
                pos: 0,
                ended: false,
            }),
            CompressionMethod::Unknown(method) => bail!(
                "Unsupported compression method {} for {} (only STORED and DEFLATE are supported)",
                method,
                entry.file_name
            ),
        };

        Ok(Self {
            reader,
            name: entry.file_name.clone(),
            offset: data_offset,
            compressed_remaining: entry.compressed_size,
            expected_size: entry.uncompressed_size,
            expected_crc: entry.crc32,
            produced: 0,
            crc: Crc::new(),
            decoder,
            finished: false,
        })
    }

    /// Entry name this stream reads
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Next chunk of uncompressed data, or `None` once the entry is complete.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.finished {
            return Ok(None);
        }

        let chunk = match self.decoder {
            Decoder::Stored => self.next_stored().await?,
            Decoder::Deflate(_) => self.next_inflated().await?,
        };

        match chunk {
            Some(chunk) => {
                self.crc.update(&chunk);
                self.produced += chunk.len() as u64;
                if self.produced > self.expected_size {
                    bail!(
                        "Entry {} is larger than its recorded size of {} bytes",
                        self.name,
                        self.expected_size
                    );
                }
                Ok(Some(chunk))
            }
            None => {
                self.finished = true;
                self.verify()?;
                Ok(None)
            }
        }
    }

    /// Read the remainder of the entry into memory.
    pub async fn read_to_end(mut self) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.expected_size.min(CHUNK_SIZE as u64) as usize);
        while let Some(chunk) = self.next_chunk().await? {
            data.extend_from_slice(&chunk);
        }
        Ok(data)
    }

    async fn next_stored(&mut self) -> Result<Option<Bytes>> {
        if self.compressed_remaining == 0 {
            return Ok(None);
        }

        let len = self.compressed_remaining.min(CHUNK_SIZE as u64) as usize;
        let mut buf = vec![0u8; len];
        let n = self.reader.read_at(self.offset, &mut buf).await?;
        if n == 0 {
            bail!("Unexpected end of archive while reading {}", self.name);
        }

        buf.truncate(n);
        self.offset += n as u64;
        self.compressed_remaining -= n as u64;
        Ok(Some(Bytes::from(buf)))
    }

    async fn next_inflated(&mut self) -> Result<Option<Bytes>> {
        let Decoder::Deflate(inflater) = &mut self.decoder else {
            return Ok(None);
        };

        loop {
            if inflater.ended {
                return Ok(None);
            }
            if inflater.pos == inflater.input.len() && self.compressed_remaining > 0 {
                let len = self.compressed_remaining.min(CHUNK_SIZE as u64) as usize;
                inflater.input.resize(len, 0);
                let n = self.reader.read_at(self.offset, &mut inflater.input).await?;
                if n == 0 {
                    bail!("Unexpected end of archive while reading {}", self.name);
                }
                inflater.input.truncate(n);
                inflater.pos = 0;
                self.offset += n as u64;
                self.compressed_remaining -= n as u64;
            }

            let mut out = Vec::with_capacity(CHUNK_SIZE);
            let before = inflater.decompress.total_in();
            let status = inflater.decompress.decompress_vec(
                &inflater.input[inflater.pos..],
                &mut out,
                FlushDecompress::None,
            )?;
            let consumed = (inflater.decompress.total_in() - before) as usize;
            inflater.pos += consumed;
            inflater.ended = status == Status::StreamEnd;

            if !out.is_empty() {
                return Ok(Some(Bytes::from(out)));
            }
            if inflater.ended {
                return Ok(None);
            }
            if consumed == 0
                && (inflater.pos < inflater.input.len() || self.compressed_remaining == 0)
            {
                bail!("Corrupt or truncated deflate data in {}", self.name);
            }
        }
    }

    fn verify(&self) -> Result<()> {
        if self.produced != self.expected_size {
            bail!(
                "Entry {} produced {} bytes, expected {}",
                self.name,
                self.produced,
                self.expected_size
            );
        }
        if self.crc.sum() != self.expected_crc {
            bail!(
                "CRC-32 mismatch for {}: expected {:08x}, got {:08x}",
                self.name,
                self.expected_crc,
                self.crc.sum()
            );
        }
        Ok(())
    }
}
