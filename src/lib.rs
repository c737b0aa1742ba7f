//! # zipstatic
//!
//! Serve static assets straight out of a ZIP archive over HTTP.
//!
//! Hosting platforms that cap the number of deployed files can still serve
//! thousands of small assets when they ship as a single archive. Requests
//! are answered from the archive's Central Directory and entry data with
//! long-lived caching headers and conditional GET support.
//!
//! ## Features
//!
//! - Archives from the local filesystem, from memory, or from an HTTP URL
//!   read with Range requests
//! - STORED and DEFLATE entries, streamed and CRC-checked
//! - `If-Modified-Since` and `If-None-Match` evaluation with `304` answers
//! - Strong `ETag`s taken from `<asset>.md5` companion entries
//! - One-year `Cache-Control`/`Expires` on every asset
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zipstatic::{ArchiveIndex, AssetServer, AssetService, PathResolver};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let index = Arc::new(ArchiveIndex::open("site.zip").await?);
//!     let service = Arc::new(AssetService::new(index, PathResolver::default()));
//!
//!     let listener = AssetServer::bind("127.0.0.1:8080".parse()?).await?;
//!     AssetServer::new(service)
//!         .serve(listener, zipstatic::server::shutdown_signal())
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod serve;
pub mod server;
pub mod zip;

pub use cli::Cli;
pub use error::ServeError;
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use serve::{AssetService, PathResolver, Validator, ValidatorResolver};
pub use server::AssetServer;
pub use zip::{ArchiveIndex, EntryMetadata, EntryStream};
