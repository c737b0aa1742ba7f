use bytes::Bytes;
use chrono::Utc;
use http::header::ALLOW;
use http::request::Parts;
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, StreamBody};
use hyper::body::Frame;
use std::sync::Arc;
use tracing::{debug, error};

use super::conditional::{ConditionalHeaders, Freshness};
use super::headers;
use super::path::PathResolver;
use super::validator::ValidatorResolver;
use crate::error::{Result, ServeError};
use crate::zip::{ArchiveIndex, EntryStream};

/// Body of every response: empty, or the streamed bytes of one entry
pub type AssetBody = UnsyncBoxBody<Bytes, ServeError>;

/// Answers asset requests from an archive.
///
/// Per request: resolve the key, look the entry up (404 when absent),
/// resolve its validator, evaluate the conditional headers (304 when the
/// client copy is current) and otherwise stream the entry with full
/// caching headers. Each request opens its own entry stream; the index and
/// the validator cache are the only shared state.
pub struct AssetService {
    index: Arc<ArchiveIndex>,
    paths: PathResolver,
    validators: ValidatorResolver,
}

impl AssetService {
    pub fn new(index: Arc<ArchiveIndex>, paths: PathResolver) -> Self {
        Self {
            validators: ValidatorResolver::new(index.clone()),
            index,
            paths,
        }
    }

    pub fn validators(&self) -> &ValidatorResolver {
        &self.validators
    }

    /// Answer one request. Archive failures become `500` responses.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<AssetBody> {
        let (parts, _body) = request.into_parts();

        let response = match self.respond(&parts).await {
            Ok(response) => response,
            Err(err) => {
                error!(path = %parts.uri.path(), error = %format!("{err:#}"), "request failed");
                status_only(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        debug!(
            method = %parts.method,
            path = %parts.uri.path(),
            status = response.status().as_u16(),
            "request served"
        );
        response
    }

    async fn respond(&self, request: &Parts) -> Result<Response<AssetBody>> {
        let head_only = match request.method {
            Method::GET => false,
            Method::HEAD => true,
            _ => return Ok(method_not_allowed()),
        };

        let Some(key) = self.paths.resolve(request.uri.path()) else {
            return Ok(status_only(StatusCode::NOT_FOUND));
        };
        let Some(entry) = self.index.lookup(&key) else {
            debug!(key, "no such archive entry");
            return Ok(status_only(StatusCode::NOT_FOUND));
        };

        let validator = self.validators.resolve(&key).await?;
        let conditions = ConditionalHeaders::from_headers(&request.headers);

        if conditions.evaluate(entry.modified_at, validator.as_ref()) == Freshness::NotModified {
            return Ok(build(
                StatusCode::NOT_MODIFIED,
                headers::not_modified(validator.as_ref()),
                empty(),
            ));
        }

        let headers = headers::fresh(&key, entry, validator.as_ref(), Utc::now());
        let body = if head_only {
            empty()
        } else {
            entry_body(self.index.open_entry(entry).await?)
        };

        Ok(build(StatusCode::OK, headers, body))
    }
}

fn entry_body(stream: EntryStream) -> AssetBody {
    let frames = futures_util::stream::try_unfold(stream, |mut stream| async move {
        let chunk = stream.next_chunk().await.map_err(|err| {
            error!(entry = stream.name(), error = %format!("{err:#}"), "entry stream failed");
            ServeError::from(err)
        })?;
        Ok::<_, ServeError>(chunk.map(|bytes| (Frame::data(bytes), stream)))
    });
    StreamBody::new(frames).boxed_unsync()
}

fn empty() -> AssetBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

fn build(status: StatusCode, headers: HeaderMap, body: AssetBody) -> Response<AssetBody> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn status_only(status: StatusCode) -> Response<AssetBody> {
    build(status, HeaderMap::new(), empty())
}

fn method_not_allowed() -> Response<AssetBody> {
    let mut headers = HeaderMap::new();
    headers.insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
    build(StatusCode::METHOD_NOT_ALLOWED, headers, empty())
}
