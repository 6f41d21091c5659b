use crate::carousel::CarouselSnapshot;
use crate::config::AssetKind;
use crate::session::ScanToken;
use crate::theme::ThemePreference;

/// Input delivered by the host surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A click anywhere in the document; `element` is the id of the clicked element.
    Click { element: String },
    Key(Key),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other(String),
}

impl Key {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            other => Key::Other(other.to_string()),
        }
    }
}

/// Background discovery requested when a folder-backed album is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub token: ScanToken,
    pub album: String,
    pub kind: AssetKind,
    pub folder: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// Nothing exists at position 1; the album is empty.
    Missing,
    /// `first` is the verified position-1 locator, `rest` the run discovered after it.
    Found { first: String, rest: Vec<String> },
    /// The token lost authority before position 1 was settled; nothing is known.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub token: ScanToken,
    pub album: String,
    pub discovery: Discovery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardCount {
    Items(usize),
    /// Folder-backed album that has not been scanned yet.
    Unscanned,
    ComingSoon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumCard {
    pub key: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub cover: Option<String>,
    pub count: CardCount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailView {
    Gallery {
        album: String,
        kind: AssetKind,
        title: String,
        subtitle: Option<String>,
        carousel: CarouselSnapshot,
    },
    ComingSoon {
        album: String,
        kind: AssetKind,
        title: String,
    },
}

impl DetailView {
    pub fn album(&self) -> &str {
        match self {
            DetailView::Gallery { album, .. } | DetailView::ComingSoon { album, .. } => album,
        }
    }
}

/// Emitted by the view controller on every visible state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    AlbumList {
        kind: AssetKind,
        cards: Vec<AlbumCard>,
    },
    Detail(DetailView),
    Closed {
        kind: AssetKind,
    },
    Theme(ThemePreference),
}
