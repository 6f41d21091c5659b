use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

use crate::probe::DEFAULT_PROBE_TIMEOUT;

pub const DEFAULT_PREFERENCES_PATH: &str = "preferences.json";
pub const DEFAULT_SCAN_MAX_INDEX: u32 = 20;

/// Rendering targets the host can provide to the view controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerId {
    PhotoAlbums,
    PhotoGallery,
    VideoAlbums,
    VideoPlayer,
}

impl ContainerId {
    pub const ALL: [ContainerId; 4] = [
        ContainerId::PhotoAlbums,
        ContainerId::PhotoGallery,
        ContainerId::VideoAlbums,
        ContainerId::VideoPlayer,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ContainerId::PhotoAlbums => "photo-albums",
            ContainerId::PhotoGallery => "photo-gallery",
            ContainerId::VideoAlbums => "video-albums",
            ContainerId::VideoPlayer => "video-player",
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    #[serde(alias = "photo")]
    Image,
    Video,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Image => f.write_str("image"),
            AssetKind::Video => f.write_str("video"),
        }
    }
}

/// One declared album item: either a bare locator or a locator with a caption.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DeclaredItem {
    Locator(String),
    Detailed {
        src: String,
        #[serde(default)]
        caption: Option<String>,
    },
}

impl DeclaredItem {
    pub fn locator(&self) -> &str {
        match self {
            DeclaredItem::Locator(src) => src,
            DeclaredItem::Detailed { src, .. } => src,
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            DeclaredItem::Locator(_) => None,
            DeclaredItem::Detailed { caption, .. } => caption.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AlbumEntry {
    /// Stable identifier used by album cards and click delegation.
    pub key: String,
    pub kind: AssetKind,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Cover image shown on the album card.
    #[serde(default, alias = "cover")]
    pub poster: Option<String>,
    /// Collection folder probed when no items are declared.
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub items: Vec<DeclaredItem>,
}

/// Where an album's media comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sourcing<'a> {
    Declared(&'a [DeclaredItem]),
    Scan(&'a str),
    Empty,
}

impl AlbumEntry {
    pub fn sourcing(&self) -> Sourcing<'_> {
        if !self.items.is_empty() {
            Sourcing::Declared(&self.items)
        } else if !self.folder.trim().is_empty() {
            Sourcing::Scan(self.folder.trim())
        } else {
            Sourcing::Empty
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Base of the asset hierarchy: an `http(s)://` origin or a local directory.
    pub asset_root: String,
    /// Directory (below the root) holding one folder per image collection.
    pub image_dir: String,
    /// Directory (below the root) holding one folder per video collection.
    pub video_dir: String,
    /// Extension spellings tried in order for each image index.
    pub image_extensions: Vec<String>,
    pub video_extension: String,
    /// Upper bound for a single existence probe.
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
    /// Highest collection index a scan will probe.
    pub scan_max_index: u32,
    /// JSON file holding the persisted theme preference.
    pub preferences_path: PathBuf,
    /// Rendering targets the host provides.
    pub containers: Vec<ContainerId>,
    pub albums: Vec<AlbumEntry>,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(mut self) -> Result<Self> {
        ensure!(
            !self.asset_root.trim().is_empty(),
            "asset-root must not be empty"
        );
        ensure!(
            !self.probe_timeout.is_zero(),
            "probe-timeout must be greater than zero"
        );
        ensure!(
            self.scan_max_index >= 1,
            "scan-max-index must be at least 1"
        );
        for ext in self
            .image_extensions
            .iter_mut()
            .chain(std::iter::once(&mut self.video_extension))
        {
            *ext = ext.trim().trim_start_matches('.').to_string();
        }
        ensure!(
            !self.image_extensions.is_empty(),
            "image-extensions must include at least one entry"
        );
        ensure!(
            self.image_extensions.iter().all(|e| !e.is_empty()),
            "image-extensions must not contain empty entries"
        );
        ensure!(
            !self.video_extension.is_empty(),
            "video-extension must not be empty"
        );

        let mut keys = HashSet::new();
        for album in &self.albums {
            ensure!(!album.key.trim().is_empty(), "album key must not be empty");
            ensure!(
                !album.key.contains(char::is_whitespace),
                "album key '{}' must not contain whitespace",
                album.key
            );
            ensure!(
                keys.insert(album.key.as_str()),
                "duplicate album key '{}'",
                album.key
            );
        }
        Ok(self)
    }

    pub fn album(&self, key: &str) -> Option<&AlbumEntry> {
        self.albums.iter().find(|a| a.key == key)
    }

    pub fn albums_of(&self, kind: AssetKind) -> impl Iterator<Item = &AlbumEntry> {
        self.albums.iter().filter(move |a| a.kind == kind)
    }

    fn default_image_extensions() -> Vec<String> {
        ["jpg", "JPG", "jpeg", "JPEG", "png", "PNG"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            asset_root: ".".to_string(),
            image_dir: "assets/images".to_string(),
            video_dir: "assets/videos".to_string(),
            image_extensions: Self::default_image_extensions(),
            video_extension: "mp4".to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            scan_max_index: DEFAULT_SCAN_MAX_INDEX,
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES_PATH),
            containers: ContainerId::ALL.to_vec(),
            albums: Vec::new(),
        }
    }
}
