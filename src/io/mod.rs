mod http;
mod local;
mod memory;

pub use self::http::HttpRangeReader;
pub use local::LocalFileReader;
pub use memory::MemoryReader;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for random access reading from an archive source
///
/// Implementations must be safe to share between concurrent requests:
/// every call is independent and carries its own offset.
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    ///
    /// Returns the number of bytes read, which may be less than `buf.len()`.
    /// A return of `0` for a non-empty buffer means end of data.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Bytes fetched over the network so far, for sources that count them
    fn transferred_bytes(&self) -> Option<u64> {
        None
    }
}
