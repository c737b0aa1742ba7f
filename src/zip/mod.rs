//! ZIP archive access for serving.
//!
//! - [`structures`]: Central Directory records and entry metadata
//! - [`parser`]: reads the EOCD and Central Directory from a [`ReadAt`](crate::io::ReadAt) source
//! - [`index`]: the immutable name -> entry map requests are served from
//! - [`stream`]: sequential, verified reads of one entry's uncompressed bytes
//!
//! ## Supported Features
//!
//! - Standard ZIP format and ZIP64 extensions
//! - STORED and DEFLATE compression methods
//! - Extended timestamp extra field for modification times
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support

mod index;
mod parser;
mod stream;
mod structures;

pub use index::{ArchiveIndex, EntryMetadata, is_http_url};
pub use parser::ZipParser;
pub use stream::{CHUNK_SIZE, EntryStream};
pub use structures::*;
