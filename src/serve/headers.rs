//! Response headers for fresh and not-modified answers.

use chrono::{DateTime, Duration, Utc};
use http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG, EXPIRES, LAST_MODIFIED};
use http::{HeaderMap, HeaderValue};
use tracing::warn;

use super::date::format_http_date;
use super::validator::Validator;
use crate::zip::EntryMetadata;

/// Lifetime granted to every served asset: one year
pub const MAX_AGE_SECONDS: i64 = 365 * 86400;

/// Content type for an archive key, by extension.
///
/// Unknown extensions get `application/octet-stream`.
pub fn content_type_for(key: &str) -> HeaderValue {
    let mime = mime_guess::from_path(key).first_or_octet_stream();
    HeaderValue::from_str(mime.essence_str())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

/// Headers of a `200` answer for `key`.
///
/// `now` is the reference time for `Expires`.
pub fn fresh(
    key: &str,
    entry: &EntryMetadata,
    validator: Option<&Validator>,
    now: DateTime<Utc>,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(CONTENT_TYPE, content_type_for(key));
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_str(&format!("public; max-age={MAX_AGE_SECONDS}"))
            .unwrap_or_else(|_| HeaderValue::from_static("public")),
    );
    insert_date(&mut headers, EXPIRES, now + Duration::seconds(MAX_AGE_SECONDS));
    insert_date(&mut headers, LAST_MODIFIED, entry.modified_at);
    insert_etag(&mut headers, validator);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(entry.size));

    headers
}

/// Headers of a `304` answer: the `ETag` alone, when there is one.
pub fn not_modified(validator: Option<&Validator>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert_etag(&mut headers, validator);
    headers
}

fn insert_date(headers: &mut HeaderMap, name: http::HeaderName, time: DateTime<Utc>) {
    if let Ok(value) = HeaderValue::from_str(&format_http_date(time)) {
        headers.insert(name, value);
    }
}

/// The validator goes out unquoted, exactly as read from the archive.
fn insert_etag(headers: &mut HeaderMap, validator: Option<&Validator>) {
    let Some(validator) = validator.filter(|v| !v.is_empty()) else {
        return;
    };

    match HeaderValue::from_str(validator.as_str()) {
        Ok(value) => {
            headers.insert(ETAG, value);
        }
        Err(_) => warn!(%validator, "validator is not a valid header value, ETag omitted"),
    }
}
