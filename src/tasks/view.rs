use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::carousel::{MediaControl, MediaItem};
use crate::config::{AlbumEntry, AssetKind, Configuration, ContainerId, Sourcing};
use crate::error::Error;
use crate::events::{AlbumCard, DetailView, Key, ScanOutcome, ScanRequest, UiEvent, ViewUpdate};
use crate::layout::AssetLayout;
use crate::probe::Prober;
use crate::session::{ScanApplied, Session};
use crate::tasks::scanner::{self, ScanContext};
use crate::theme::{ThemePreference, ThemeStore};

/// Elements the document-level click listener recognises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    AlbumCard(String),
    Back,
    Next,
    Prev,
    Item(usize),
    ThemeToggle,
}

impl ClickTarget {
    pub fn from_element(element: &str) -> Option<Self> {
        match element {
            "back" => Some(ClickTarget::Back),
            "next" => Some(ClickTarget::Next),
            "prev" => Some(ClickTarget::Prev),
            "theme-toggle" => Some(ClickTarget::ThemeToggle),
            _ => {
                if let Some(key) = element.strip_prefix("album-card:") {
                    (!key.is_empty()).then(|| ClickTarget::AlbumCard(key.to_string()))
                } else if let Some(index) = element.strip_prefix("item:") {
                    index.parse().ok().map(ClickTarget::Item)
                } else {
                    None
                }
            }
        }
    }
}

/// Result of handling one input event.
#[derive(Debug, Default)]
pub struct Handled {
    pub updates: Vec<ViewUpdate>,
    pub scan: Option<ScanRequest>,
}

impl Handled {
    fn updates(updates: Vec<ViewUpdate>) -> Self {
        Self {
            updates,
            scan: None,
        }
    }
}

fn required_containers(kind: AssetKind) -> [ContainerId; 2] {
    match kind {
        AssetKind::Image => [ContainerId::PhotoAlbums, ContainerId::PhotoGallery],
        AssetKind::Video => [ContainerId::VideoAlbums, ContainerId::VideoPlayer],
    }
}

/// Maps input to session operations and session state to [`ViewUpdate`]s.
pub struct ViewController<C> {
    cfg: Arc<Configuration>,
    layout: AssetLayout,
    session: Session<C>,
    themes: ThemeStore,
    theme: ThemePreference,
    containers: HashSet<ContainerId>,
    enabled: HashSet<AssetKind>,
}

impl<C: MediaControl> ViewController<C> {
    pub fn new(cfg: Arc<Configuration>, control: C) -> Self {
        let themes = ThemeStore::new(cfg.preferences_path.clone());
        let theme = themes.load();
        Self {
            layout: AssetLayout::from_config(&cfg),
            session: Session::new(control),
            containers: cfg.containers.iter().copied().collect(),
            themes,
            theme,
            enabled: HashSet::new(),
            cfg,
        }
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub fn theme(&self) -> ThemePreference {
        self.theme
    }

    /// Scan context sharing this controller's token authority.
    pub fn scan_context(&self, prober: Arc<dyn Prober>) -> ScanContext {
        ScanContext::from_config(&self.cfg, prober, self.session.authority().clone())
    }

    pub fn is_enabled(&self, kind: AssetKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Bring up both subsystems and render their album lists.
    ///
    /// A subsystem whose containers are missing stays inactive; the other is
    /// unaffected.
    pub fn init(&mut self) -> Vec<ViewUpdate> {
        let mut updates = vec![ViewUpdate::Theme(self.theme)];
        for kind in [AssetKind::Image, AssetKind::Video] {
            match self.init_subsystem(kind) {
                Ok(update) => {
                    info!(%kind, albums = self.cfg.albums_of(kind).count(), "subsystem ready");
                    updates.push(update);
                }
                Err(err) => error!(%kind, "{err}; subsystem disabled"),
            }
        }
        updates
    }

    fn init_subsystem(&mut self, kind: AssetKind) -> Result<ViewUpdate, Error> {
        if let Some(missing) = required_containers(kind)
            .into_iter()
            .find(|id| !self.containers.contains(id))
        {
            return Err(Error::MissingContainer(missing));
        }
        self.enabled.insert(kind);
        Ok(self.album_list(kind))
    }

    pub fn album_list(&self, kind: AssetKind) -> ViewUpdate {
        let cards = self
            .cfg
            .albums_of(kind)
            .map(|album| AlbumCard {
                key: album.key.clone(),
                title: album.title.clone(),
                subtitle: album.subtitle.clone(),
                cover: self.cover_for(album),
                count: self.session.card_count(album),
            })
            .collect();
        ViewUpdate::AlbumList { kind, cards }
    }

    fn cover_for(&self, album: &AlbumEntry) -> Option<String> {
        if let Some(poster) = &album.poster {
            return Some(poster.clone());
        }
        match album.sourcing() {
            Sourcing::Declared(items) => items
                .first()
                .and_then(|item| MediaItem::from_locator(item.locator(), album.kind).thumbnail()),
            Sourcing::Scan(folder) if album.kind == AssetKind::Image => {
                self.layout.candidates(album.kind, folder, 1).into_iter().next()
            }
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<DetailView> {
        let key = self.session.open_album()?;
        let album = self.cfg.album(key)?;
        let view = if self.session.carousel().is_empty() {
            DetailView::ComingSoon {
                album: album.key.clone(),
                kind: album.kind,
                title: album.title.clone(),
            }
        } else {
            DetailView::Gallery {
                album: album.key.clone(),
                kind: album.kind,
                title: album.title.clone(),
                subtitle: album.subtitle.clone(),
                carousel: self.session.snapshot(),
            }
        };
        Some(view)
    }

    fn detail_update(&self) -> Vec<ViewUpdate> {
        self.detail().map(ViewUpdate::Detail).into_iter().collect()
    }

    pub fn handle(&mut self, event: UiEvent) -> Handled {
        match event {
            UiEvent::Click { element } => match ClickTarget::from_element(&element) {
                Some(target) => self.click(target),
                None => {
                    debug!(%element, "click ignored");
                    Handled::default()
                }
            },
            UiEvent::Key(key) => self.key(key),
        }
    }

    fn click(&mut self, target: ClickTarget) -> Handled {
        match target {
            ClickTarget::AlbumCard(key) => self.open(&key),
            ClickTarget::Back => Handled::updates(self.close()),
            ClickTarget::Next => Handled::updates(self.navigate(Session::next)),
            ClickTarget::Prev => Handled::updates(self.navigate(Session::prev)),
            ClickTarget::Item(index) => {
                Handled::updates(self.navigate(|session| session.select(index)))
            }
            ClickTarget::ThemeToggle => Handled::updates(self.toggle_theme()),
        }
    }

    fn key(&mut self, key: Key) -> Handled {
        if self.session.open_album().is_none() {
            return Handled::default();
        }
        match key {
            Key::Escape => Handled::updates(self.close()),
            Key::ArrowRight => Handled::updates(self.navigate(Session::next)),
            Key::ArrowLeft => Handled::updates(self.navigate(Session::prev)),
            Key::Other(_) => Handled::default(),
        }
    }

    fn open(&mut self, key: &str) -> Handled {
        let cfg = Arc::clone(&self.cfg);
        let Some(album) = cfg.album(key) else {
            warn!("{}", Error::UnknownAlbum(key.to_string()));
            return Handled::default();
        };
        if !self.is_enabled(album.kind) {
            warn!(album = %key, kind = %album.kind, "subsystem inactive; ignoring album click");
            return Handled::default();
        }
        // One session serves both kinds; opening closes whatever album was open.
        let previous = self.session.open_kind();
        let scan = self.session.open(album, &self.layout);
        let mut updates = Vec::new();
        if let Some(prev) = previous {
            updates.push(ViewUpdate::Closed { kind: prev });
            updates.push(self.album_list(prev));
        }
        updates.extend(self.detail_update());
        Handled { updates, scan }
    }

    fn close(&mut self) -> Vec<ViewUpdate> {
        let Some(kind) = self.session.open_kind() else {
            return Vec::new();
        };
        self.session.close();
        vec![ViewUpdate::Closed { kind }, self.album_list(kind)]
    }

    fn navigate(&mut self, step: impl FnOnce(&mut Session<C>) -> bool) -> Vec<ViewUpdate> {
        if self.session.open_album().is_none() || !step(&mut self.session) {
            return Vec::new();
        }
        self.detail_update()
    }

    fn toggle_theme(&mut self) -> Vec<ViewUpdate> {
        self.theme = self.theme.toggled();
        if let Err(err) = self.themes.save(self.theme) {
            warn!(path = %self.themes.path().display(), error = %err, "failed to persist theme");
        }
        vec![ViewUpdate::Theme(self.theme)]
    }

    /// Fold a finished scan into the open album.
    pub fn apply_scan(&mut self, outcome: ScanOutcome) -> Vec<ViewUpdate> {
        match self.session.apply_scan(outcome) {
            ScanApplied::Stale => Vec::new(),
            ScanApplied::Appended(_) | ScanApplied::Withdrawn => self.detail_update(),
        }
    }
}

/// Drives the view controller:
/// - renders the album lists on start,
/// - handles input events in arrival order,
/// - runs album scans in the background and applies them as they finish.
///
/// Opening a new album supersedes the previous scan's token, so a late
/// result from an earlier album is dropped by the session.
pub async fn run<C>(
    mut controller: ViewController<C>,
    prober: Arc<dyn Prober>,
    mut input_rx: Receiver<UiEvent>,
    to_render: Sender<ViewUpdate>,
    cancel: CancellationToken,
) -> Result<()>
where
    C: MediaControl,
{
    let ctx = controller.scan_context(prober);
    let mut scans: JoinSet<ScanOutcome> = JoinSet::new();

    if !deliver(&to_render, controller.init()).await {
        warn!("render channel closed before start");
        return Ok(());
    }

    loop {
        let updates = select! {
            _ = cancel.cancelled() => break,

            maybe_event = input_rx.recv() => match maybe_event {
                Some(event) => {
                    debug!(?event, "input");
                    let handled = controller.handle(event);
                    if let Some(request) = handled.scan {
                        debug!(album = %request.album, token = %request.token, "scan started");
                        scans.spawn(scanner::discover_album(ctx.clone(), request));
                    }
                    handled.updates
                }
                None => {
                    info!("input closed; exiting view task");
                    break;
                }
            },

            Some(joined) = scans.join_next() => match joined {
                Ok(outcome) => controller.apply_scan(outcome),
                Err(err) => {
                    warn!("scan task failed: {err}");
                    Vec::new()
                }
            },
        };

        if !deliver(&to_render, updates).await {
            warn!("render channel closed");
            break;
        }
    }

    scans.shutdown().await;
    Ok(())
}

async fn deliver(to_render: &Sender<ViewUpdate>, updates: Vec<ViewUpdate>) -> bool {
    for update in updates {
        if to_render.send(update).await.is_err() {
            return false;
        }
    }
    true
}
