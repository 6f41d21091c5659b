//! Open-album state: the carousel, the authoritative scan token and the
//! per-album discovery results.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use crate::carousel::{Carousel, CarouselSnapshot, MediaControl, MediaEntry, MediaItem};
use crate::config::{AlbumEntry, AssetKind, Sourcing};
use crate::events::{CardCount, Discovery, ScanOutcome, ScanRequest};
use crate::layout::AssetLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanToken(pub u64);

impl fmt::Display for ScanToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues scan tokens; only the most recently issued one is authoritative.
///
/// Clones share the same counter so background scans can check staleness
/// without holding the session.
#[derive(Debug, Clone, Default)]
pub struct ScanAuthority {
    current: Arc<AtomicU64>,
}

impl ScanAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede every outstanding token and return the new authoritative one.
    pub fn bump(&self) -> ScanToken {
        ScanToken(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self) -> ScanToken {
        ScanToken(self.current.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, token: ScanToken) -> bool {
        self.current() == token
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanApplied {
    /// Token superseded or album no longer open; nothing changed.
    Stale,
    /// Discovery confirmed the seed and appended this many further items.
    Appended(usize),
    /// Position 1 does not exist; the optimistic seed was withdrawn.
    Withdrawn,
}

#[derive(Debug, Clone)]
struct OpenAlbum {
    key: String,
    kind: AssetKind,
    pending: Option<ScanToken>,
}

pub struct Session<C> {
    authority: ScanAuthority,
    carousel: Carousel<C>,
    open: Option<OpenAlbum>,
    discovered: HashMap<String, usize>,
}

impl<C: MediaControl> Session<C> {
    pub fn new(control: C) -> Self {
        Self::with_authority(control, ScanAuthority::new())
    }

    pub fn with_authority(control: C, authority: ScanAuthority) -> Self {
        Self {
            authority,
            carousel: Carousel::new(control),
            open: None,
            discovered: HashMap::new(),
        }
    }

    pub fn authority(&self) -> &ScanAuthority {
        &self.authority
    }

    pub fn carousel(&self) -> &Carousel<C> {
        &self.carousel
    }

    pub fn open_album(&self) -> Option<&str> {
        self.open.as_ref().map(|o| o.key.as_str())
    }

    pub fn open_kind(&self) -> Option<AssetKind> {
        self.open.as_ref().map(|o| o.kind)
    }

    pub fn is_scanning(&self) -> bool {
        self.open.as_ref().is_some_and(|o| o.pending.is_some())
    }

    /// Open `entry`, discarding whatever album was open before.
    ///
    /// Declared albums are seeded in full. Folder-backed albums are seeded
    /// with their first position and a [`ScanRequest`] is returned for the
    /// caller to run in the background.
    pub fn open(&mut self, entry: &AlbumEntry, layout: &AssetLayout) -> Option<ScanRequest> {
        self.close();
        let mut open = OpenAlbum {
            key: entry.key.clone(),
            kind: entry.kind,
            pending: None,
        };

        let request = match entry.sourcing() {
            Sourcing::Declared(items) => {
                let entries = items
                    .iter()
                    .map(|item| {
                        MediaEntry::new(MediaItem::from_locator(item.locator(), entry.kind))
                            .with_caption(item.caption().map(String::from))
                    })
                    .collect();
                self.carousel.load(&entry.key, entries);
                None
            }
            Sourcing::Scan(folder) => {
                let seed = layout
                    .candidates(entry.kind, folder, 1)
                    .into_iter()
                    .next()
                    .map(|locator| MediaEntry::new(MediaItem::from_locator(&locator, entry.kind)));
                self.carousel.load(&entry.key, seed.into_iter().collect());
                let token = self.authority.current();
                open.pending = Some(token);
                Some(ScanRequest {
                    token,
                    album: entry.key.clone(),
                    kind: entry.kind,
                    folder: folder.to_string(),
                })
            }
            Sourcing::Empty => {
                self.carousel.load(&entry.key, Vec::new());
                None
            }
        };

        info!(
            album = %entry.key,
            items = self.carousel.len(),
            scanning = request.is_some(),
            "album opened"
        );
        self.open = Some(open);
        request
    }

    /// Apply a finished background scan if it is still the authoritative one.
    pub fn apply_scan(&mut self, outcome: ScanOutcome) -> ScanApplied {
        let Some(open) = self.open.as_mut() else {
            debug!(album = %outcome.album, token = %outcome.token, "scan finished after close; discarded");
            return ScanApplied::Stale;
        };
        if !self.authority.is_current(outcome.token)
            || open.pending != Some(outcome.token)
            || open.key != outcome.album
        {
            debug!(album = %outcome.album, token = %outcome.token, "stale scan result discarded");
            return ScanApplied::Stale;
        }
        let kind = open.kind;

        match outcome.discovery {
            Discovery::Superseded => {
                debug!(album = %outcome.album, token = %outcome.token, "superseded scan discarded");
                ScanApplied::Stale
            }
            Discovery::Missing => {
                open.pending = None;
                self.carousel.clear();
                self.discovered.insert(outcome.album.clone(), 0);
                info!(album = %outcome.album, "no assets at position 1; album is empty");
                ScanApplied::Withdrawn
            }
            Discovery::Found { first, rest } => {
                open.pending = None;
                self.carousel
                    .replace(0, MediaEntry::new(MediaItem::from_locator(&first, kind)));
                let appended = rest.len();
                self.carousel.append(
                    rest.iter()
                        .map(|locator| MediaEntry::new(MediaItem::from_locator(locator, kind)))
                        .collect(),
                );
                self.discovered
                    .insert(outcome.album.clone(), self.carousel.len());
                info!(album = %outcome.album, total = self.carousel.len(), "scan applied");
                ScanApplied::Appended(appended)
            }
        }
    }

    pub fn next(&mut self) -> bool {
        self.carousel.next()
    }

    pub fn prev(&mut self) -> bool {
        self.carousel.prev()
    }

    pub fn select(&mut self, index: usize) -> bool {
        self.carousel.select(index)
    }

    /// Invalidate any in-flight scan and release the open album.
    pub fn close(&mut self) {
        self.authority.bump();
        self.carousel.close();
        if let Some(open) = self.open.take() {
            debug!(album = %open.key, "album closed");
        }
    }

    pub fn snapshot(&self) -> CarouselSnapshot {
        self.carousel.snapshot()
    }

    /// Item count shown on an album card.
    pub fn card_count(&self, entry: &AlbumEntry) -> CardCount {
        match entry.sourcing() {
            Sourcing::Declared(items) => CardCount::Items(items.len()),
            Sourcing::Scan(_) => match self.discovered.get(&entry.key) {
                Some(0) => CardCount::ComingSoon,
                Some(n) => CardCount::Items(*n),
                None => CardCount::Unscanned,
            },
            Sourcing::Empty => CardCount::ComingSoon,
        }
    }
}
