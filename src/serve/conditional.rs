use chrono::{DateTime, Utc};
use http::HeaderMap;
use http::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
use tracing::debug;

use super::date::parse_http_date;
use super::validator::Validator;

/// Whether a located entry has to be sent again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The client's copy is current: answer 304 without a body
    NotModified,
    /// Send the full entry
    Fresh,
}

/// Conditional request headers of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalHeaders {
    /// `If-Modified-Since`, absent when missing or unparsable
    pub if_modified_since: Option<DateTime<Utc>>,
    /// `If-None-Match`, raw
    pub if_none_match: Option<String>,
}

impl ConditionalHeaders {
    /// Extract the conditional headers. Only the first value of each counts.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let if_modified_since = headers
            .get(IF_MODIFIED_SINCE)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| {
                let parsed = parse_http_date(raw);
                if parsed.is_none() {
                    debug!(value = raw, "ignoring unparsable If-Modified-Since");
                }
                parsed
            });

        let if_none_match = headers
            .get(IF_NONE_MATCH)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Self {
            if_modified_since,
            if_none_match,
        }
    }

    /// Decide freshness: the date check runs first, then the tag check.
    ///
    /// A header date equal to the entry time counts as not modified. For the
    /// tag, one leading `"` is stripped after trimming and the rest must
    /// equal the validator exactly; a trailing quote is left in place, so
    /// `"abc"` only matches a validator of `abc"`.
    pub fn evaluate(&self, modified_at: DateTime<Utc>, validator: Option<&Validator>) -> Freshness {
        if let Some(since) = self.if_modified_since {
            if since >= modified_at {
                return Freshness::NotModified;
            }
        }

        if let (Some(raw), Some(validator)) = (self.if_none_match.as_deref(), validator) {
            let tag = raw.trim();
            if !tag.is_empty() {
                let tag = tag.strip_prefix('"').unwrap_or(tag);
                if tag == validator.as_str() {
                    return Freshness::NotModified;
                }
            }
        }

        Freshness::Fresh
    }
}
