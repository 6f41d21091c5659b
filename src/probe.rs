//! Existence probing for candidate asset locators.
//!
//! A probe answers one question, "does this locator resolve to a media file?",
//! and always answers it: failures, rejections and timeouts all read as
//! `false`. The scanner relies on that liveness.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use reqwest::header::RANGE;
use tokio::io::AsyncReadExt;
use tracing::{debug, trace};
use url::Url;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Bytes read by the metadata fallback; enough for every container signature we sniff.
const SNIFF_LEN: usize = 64;

#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Resolve `true` iff `locator` exists, within `timeout`. Never fails.
    async fn probe(&self, locator: &str, timeout: Duration) -> bool;
}

#[async_trait::async_trait]
impl<P: Prober + ?Sized> Prober for Arc<P> {
    async fn probe(&self, locator: &str, timeout: Duration) -> bool {
        (**self).probe(locator, timeout).await
    }
}

#[derive(Debug, Clone)]
enum Source {
    Remote(Url),
    Local(PathBuf),
}

impl Source {
    fn parse(locator: &str) -> Self {
        match Url::parse(locator) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Source::Remote(url),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Source::Local)
                .unwrap_or_else(|_| Source::Local(PathBuf::from(locator))),
            _ => Source::Local(PathBuf::from(locator)),
        }
    }
}

/// Production prober: HEAD against HTTP origins, metadata sniffing otherwise
/// or when the HEAD request cannot be completed.
#[derive(Debug, Clone)]
pub struct ExistenceProber {
    client: reqwest::Client,
}

impl ExistenceProber {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("portfolio-viewer/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")?;
        Ok(Self { client })
    }

    async fn probe_untimed(&self, locator: &str) -> bool {
        match Source::parse(locator) {
            Source::Remote(url) => match self.client.head(url.clone()).send().await {
                Ok(resp) => {
                    trace!(locator, status = %resp.status(), "head probe");
                    resp.status().is_success()
                }
                Err(err) => {
                    debug!(locator, error = %err, "head probe failed; loading metadata instead");
                    self.sniff_remote(url).await
                }
            },
            Source::Local(path) => sniff_local(path).await,
        }
    }

    async fn sniff_remote(&self, url: Url) -> bool {
        let request = self
            .client
            .get(url)
            .header(RANGE, format!("bytes=0-{}", SNIFF_LEN - 1));
        let mut resp = match request.send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(_) | Err(_) => return false,
        };
        let mut head = Vec::with_capacity(SNIFF_LEN);
        while head.len() < SNIFF_LEN {
            match resp.chunk().await {
                Ok(Some(chunk)) => head.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(_) => return false,
            }
        }
        looks_like_media(&head)
    }
}

#[async_trait::async_trait]
impl Prober for ExistenceProber {
    async fn probe(&self, locator: &str, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.probe_untimed(locator)).await {
            Ok(found) => found,
            Err(_) => {
                debug!(locator, timeout_ms = timeout.as_millis() as u64, "probe timed out");
                false
            }
        }
    }
}

async fn sniff_local(path: PathBuf) -> bool {
    let Ok(file) = tokio::fs::File::open(&path).await else {
        trace!(path = %path.display(), "metadata load failed");
        return false;
    };
    let mut head = Vec::with_capacity(SNIFF_LEN);
    if file
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .await
        .is_err()
    {
        return false;
    }
    looks_like_media(&head)
}

/// Whether the leading bytes identify an image or video container.
fn looks_like_media(head: &[u8]) -> bool {
    if head.is_empty() {
        return false;
    }
    if image::guess_format(head).is_ok() {
        return true;
    }
    // ISO base media (mp4, mov, m4v) and EBML (webm, mkv)
    (head.len() >= 8 && &head[4..8] == b"ftyp") || head.starts_with(&[0x1A, 0x45, 0xDF, 0xA3])
}

type InFlight = Shared<BoxFuture<'static, bool>>;

/// Coalesces concurrent probes of the same locator into one underlying probe.
///
/// Entries are dropped once the probe settles, so nothing is cached across
/// scans; a later probe of the same locator checks again.
pub struct SharedProber<P> {
    inner: Arc<P>,
    in_flight: Mutex<HashMap<String, InFlight>>,
}

impl<P> SharedProber<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner: Arc::new(inner),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }
}

#[async_trait::async_trait]
impl<P: Prober + 'static> Prober for SharedProber<P> {
    async fn probe(&self, locator: &str, timeout: Duration) -> bool {
        let pending = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(locator) {
                Some(existing) => {
                    trace!(locator, "joining in-flight probe");
                    existing.clone()
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    let owned = locator.to_string();
                    let fut = async move { inner.probe(&owned, timeout).await }
                        .boxed()
                        .shared();
                    in_flight.insert(locator.to_string(), fut.clone());
                    fut
                }
            }
        };

        let found = pending.clone().await;

        let mut in_flight = self.in_flight.lock();
        if in_flight
            .get(locator)
            .is_some_and(|current| current.ptr_eq(&pending))
        {
            in_flight.remove(locator);
        }
        found
    }
}
