use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::config::{AssetKind, Configuration};
use crate::events::{Discovery, ScanOutcome, ScanRequest};
use crate::layout::AssetLayout;
use crate::probe::Prober;
use crate::session::{ScanAuthority, ScanToken};

/// Everything a background scan needs, detached from the session.
#[derive(Clone)]
pub struct ScanContext {
    pub prober: Arc<dyn Prober>,
    pub layout: AssetLayout,
    pub authority: ScanAuthority,
    pub probe_timeout: Duration,
    pub max_index: u32,
}

impl ScanContext {
    pub fn from_config(cfg: &Configuration, prober: Arc<dyn Prober>, authority: ScanAuthority) -> Self {
        Self {
            prober,
            layout: AssetLayout::from_config(cfg),
            authority,
            probe_timeout: cfg.probe_timeout,
            max_index: cfg.scan_max_index,
        }
    }
}

/// Probe `start_index`, `start_index + 1`, ... and collect the contiguous run
/// of existing assets.
///
/// Stops at the first index where no extension variant exists, after
/// `max_index`, or as soon as `token` is no longer authoritative (checked
/// before every probe). The caller must still check the token before using
/// the result.
#[instrument(skip(ctx), fields(max_index = ctx.max_index))]
pub async fn scan_sequential(
    ctx: &ScanContext,
    kind: AssetKind,
    folder: &str,
    start_index: u32,
    token: ScanToken,
) -> Vec<String> {
    let mut found = Vec::new();
    let mut index = start_index.max(1);
    while index <= ctx.max_index {
        match first_existing(ctx, kind, folder, index, token).await {
            Probed::Found(locator) => {
                debug!(index, %locator, "asset found");
                found.push(locator);
            }
            Probed::Gap => {
                debug!(index, collected = found.len(), "gap reached; scan complete");
                break;
            }
            Probed::Superseded => {
                debug!(index, collected = found.len(), "scan superseded; stopping");
                break;
            }
        }
        let Some(next) = index.checked_add(1) else {
            break;
        };
        index = next;
    }
    found
}

enum Probed {
    Found(String),
    Gap,
    Superseded,
}

async fn first_existing(
    ctx: &ScanContext,
    kind: AssetKind,
    folder: &str,
    index: u32,
    token: ScanToken,
) -> Probed {
    for candidate in ctx.layout.candidates(kind, folder, index) {
        if !ctx.authority.is_current(token) {
            return Probed::Superseded;
        }
        if ctx.prober.probe(&candidate, ctx.probe_timeout).await {
            return Probed::Found(candidate);
        }
    }
    Probed::Gap
}

/// Background job for a folder-backed album: confirm position 1, then scan on
/// from position 2.
pub async fn discover_album(ctx: ScanContext, request: ScanRequest) -> ScanOutcome {
    let discovery = match first_existing(&ctx, request.kind, &request.folder, 1, request.token).await {
        Probed::Found(first) => {
            let rest = scan_sequential(&ctx, request.kind, &request.folder, 2, request.token).await;
            Discovery::Found { first, rest }
        }
        Probed::Gap => Discovery::Missing,
        Probed::Superseded => Discovery::Superseded,
    };

    match &discovery {
        Discovery::Found { rest, .. } => info!(
            album = %request.album,
            token = %request.token,
            discovered = rest.len() + 1,
            "album scan finished"
        ),
        Discovery::Missing => info!(
            album = %request.album,
            token = %request.token,
            "album scan found nothing"
        ),
        Discovery::Superseded => debug!(
            album = %request.album,
            token = %request.token,
            "album scan superseded before position 1 was confirmed"
        ),
    }

    ScanOutcome {
        token: request.token,
        album: request.album,
        discovery,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Listing {
        present: HashSet<String>,
        calls: AtomicUsize,
    }

    impl Listing {
        fn new(present: &[&str]) -> Self {
            Self {
                present: present.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Prober for Listing {
        async fn probe(&self, locator: &str, _timeout: Duration) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.present.contains(locator)
        }
    }

    fn context(prober: Arc<dyn Prober>, max_index: u32) -> ScanContext {
        ScanContext {
            prober,
            layout: AssetLayout::new(
                "/site",
                "img",
                "vid",
                vec!["jpg".into(), "JPG".into(), "png".into()],
                "mp4",
            ),
            authority: ScanAuthority::new(),
            probe_timeout: Duration::from_millis(100),
            max_index,
        }
    }

    #[tokio::test]
    async fn first_gap_terminates() {
        let prober = Arc::new(Listing::new(&[
            "/site/vid/reel/1.mp4",
            "/site/vid/reel/2.mp4",
            "/site/vid/reel/3.mp4",
            "/site/vid/reel/5.mp4",
        ]));
        let ctx = context(prober.clone(), 20);
        let token = ctx.authority.bump();
        let found = scan_sequential(&ctx, AssetKind::Video, "reel", 1, token).await;
        assert_eq!(
            found,
            vec![
                "/site/vid/reel/1.mp4",
                "/site/vid/reel/2.mp4",
                "/site/vid/reel/3.mp4",
            ]
        );
        assert_eq!(prober.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn image_extension_variants_are_tried_in_order() {
        let prober = Arc::new(Listing::new(&[
            "/site/img/wedding/1.jpg",
            "/site/img/wedding/1.png",
            "/site/img/wedding/2.JPG",
            "/site/img/wedding/3.png",
        ]));
        let ctx = context(prober.clone(), 20);
        let token = ctx.authority.bump();
        let found = scan_sequential(&ctx, AssetKind::Image, "wedding", 1, token).await;
        assert_eq!(
            found,
            vec![
                "/site/img/wedding/1.jpg",
                "/site/img/wedding/2.JPG",
                "/site/img/wedding/3.png",
            ]
        );
        // 1 + 2 + 3 hits, then all three variants of index 4 miss
        assert_eq!(prober.calls.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn max_index_bounds_the_scan() {
        let present: Vec<String> = (1..=10).map(|n| format!("/site/vid/reel/{n}.mp4")).collect();
        let present: Vec<&str> = present.iter().map(String::as_str).collect();
        let ctx = context(Arc::new(Listing::new(&present)), 4);
        let token = ctx.authority.bump();
        let found = scan_sequential(&ctx, AssetKind::Video, "reel", 2, token).await;
        assert_eq!(found.len(), 3);
        assert_eq!(found.last().map(String::as_str), Some("/site/vid/reel/4.mp4"));
    }

    #[tokio::test]
    async fn stale_token_stops_before_probing() {
        let prober = Arc::new(Listing::new(&["/site/vid/reel/1.mp4"]));
        let ctx = context(prober.clone(), 20);
        let stale = ctx.authority.bump();
        ctx.authority.bump();
        let found = scan_sequential(&ctx, AssetKind::Video, "reel", 1, stale).await;
        assert!(found.is_empty());
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn discover_album_reports_missing_first_position() {
        let ctx = context(Arc::new(Listing::new(&["/site/vid/reel/2.mp4"])), 20);
        let token = ctx.authority.bump();
        let outcome = discover_album(
            ctx,
            ScanRequest {
                token,
                album: "reel".into(),
                kind: AssetKind::Video,
                folder: "reel".into(),
            },
        )
        .await;
        assert_eq!(outcome.token, token);
        assert_eq!(outcome.discovery, Discovery::Missing);
    }

    #[tokio::test]
    async fn discover_album_superseded_is_not_reported_missing() {
        let prober = Arc::new(Listing::new(&["/site/vid/reel/1.mp4"]));
        let ctx = context(prober.clone(), 20);
        let token = ctx.authority.bump();
        ctx.authority.bump();
        let outcome = discover_album(
            ctx,
            ScanRequest {
                token,
                album: "reel".into(),
                kind: AssetKind::Video,
                folder: "reel".into(),
            },
        )
        .await;
        assert_eq!(outcome.discovery, Discovery::Superseded);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn discover_album_returns_verified_first_and_rest() {
        let ctx = context(
            Arc::new(Listing::new(&[
                "/site/img/portrait/1.JPG",
                "/site/img/portrait/2.jpg",
            ])),
            20,
        );
        let token = ctx.authority.bump();
        let outcome = discover_album(
            ctx,
            ScanRequest {
                token,
                album: "portrait".into(),
                kind: AssetKind::Image,
                folder: "portrait".into(),
            },
        )
        .await;
        assert_eq!(
            outcome.discovery,
            Discovery::Found {
                first: "/site/img/portrait/1.JPG".into(),
                rest: vec!["/site/img/portrait/2.jpg".into()],
            }
        );
    }
}
