use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::ReadAt;
use anyhow::{Context, Result, anyhow, bail, ensure};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_ATTEMPTS: u32 = 10;
const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// Archive hosted on a remote HTTP server, read with Range requests.
///
/// Only connect and timeout failures are retried, with a linearly growing
/// pause between attempts. Any other failure, or a server that answers a
/// range with something other than `206` for the requested offset, is an
/// error for the read.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    attempts: u32,
    transferred_bytes: AtomicU64,
}

impl HttpRangeReader {
    /// Probe `url` with a `HEAD` request for its length and byte-range support.
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let probe = client
            .head(&url)
            .send()
            .await
            .with_context(|| format!("HEAD {url}"))?;
        ensure!(
            probe.status().is_success(),
            "HEAD {} answered {}",
            url,
            probe.status()
        );

        let headers = probe.headers();
        let ranges = headers
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");
        if !ranges.contains("bytes") {
            bail!("{url} does not accept byte ranges");
        }

        let size: u64 = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| anyhow!("{url} did not report a Content-Length"))?;

        debug!(%url, size, "remote archive accepts byte ranges");

        Ok(Self {
            client,
            url,
            size,
            attempts: DEFAULT_ATTEMPTS,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// One `bytes=start-end` request, retried on transient failures.
    async fn fetch(&self, start: u64, end: u64) -> Result<Bytes> {
        let range = format!("bytes={start}-{end}");
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match self.client.get(&self.url).header(RANGE, &range).send().await {
                Ok(resp) => {
                    if resp.status() != StatusCode::PARTIAL_CONTENT {
                        bail!("range {} of {} answered {}", range, self.url, resp.status());
                    }
                    let served_from = resp
                        .headers()
                        .get(CONTENT_RANGE)
                        .and_then(|v| v.to_str().ok())
                        .and_then(content_range_start);
                    if served_from.is_some_and(|from| from != start) {
                        bail!("range {} of {} was served from another offset", range, self.url);
                    }
                    return Ok(resp.bytes().await?);
                }
                Err(err) if err.is_timeout() || err.is_connect() => err,
                Err(err) => return Err(err.into()),
            };

            if attempt >= self.attempts {
                return Err(anyhow!(err).context(format!("range {range} failed after {attempt} attempts")));
            }
            warn!(attempt, attempts = self.attempts, error = %err, "retrying remote range read");
            tokio::time::sleep(BACKOFF_STEP * attempt).await;
        }
    }
}

/// First byte position of a `Content-Range: bytes <start>-<end>/<len>` value
fn content_range_start(value: &str) -> Option<u64> {
    let range = value.trim().strip_prefix("bytes")?.trim_start();
    let (start, _) = range.split_once('-')?;
    start.trim().parse().ok()
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let end = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let wanted = (end - offset + 1) as usize;
        let mut filled = 0;

        // Servers may answer a range with fewer bytes than asked for.
        while filled < wanted {
            let bytes = self.fetch(offset + filled as u64, end).await?;
            if bytes.is_empty() {
                bail!("empty range at offset {} of {}", offset + filled as u64, self.url);
            }
            let n = bytes.len().min(wanted - filled);
            buf[filled..filled + n].copy_from_slice(&bytes[..n]);
            filled += n;
            self.transferred_bytes.fetch_add(n as u64, Ordering::Relaxed);
        }

        Ok(filled)
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn transferred_bytes(&self) -> Option<u64> {
        Some(self.transferred_bytes.load(Ordering::Relaxed))
    }
}
