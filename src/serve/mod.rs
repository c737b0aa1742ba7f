//! Request-serving pipeline.
//!
//! - [`path`]: request path -> archive key
//! - [`validator`]: strong validators from `.md5` companion entries
//! - [`conditional`]: `If-Modified-Since` / `If-None-Match` evaluation
//! - [`headers`]: caching and content headers
//! - [`service`]: the per-request sequence tying them together

mod conditional;
mod date;
pub mod headers;
mod path;
mod service;
mod validator;

pub use conditional::{ConditionalHeaders, Freshness};
pub use date::{format_http_date, parse_http_date};
pub use headers::MAX_AGE_SECONDS;
pub use path::{DEFAULT_DOCUMENT, PathResolver};
pub use service::{AssetBody, AssetService};
pub use validator::{DIGEST_SUFFIX, MIN_DIGEST_LEN, Validator, ValidatorResolver};
