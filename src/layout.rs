//! Asset layout convention: `<root>/<kind dir>/<folder>/<index>.<ext>`.

use crate::config::{AssetKind, Configuration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    root: String,
    image_dir: String,
    video_dir: String,
    image_extensions: Vec<String>,
    video_extension: String,
}

impl AssetLayout {
    pub fn new(
        root: impl Into<String>,
        image_dir: impl Into<String>,
        video_dir: impl Into<String>,
        image_extensions: Vec<String>,
        video_extension: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            image_dir: image_dir.into(),
            video_dir: video_dir.into(),
            image_extensions,
            video_extension: video_extension.into(),
        }
    }

    pub fn from_config(cfg: &Configuration) -> Self {
        Self::new(
            cfg.asset_root.clone(),
            cfg.image_dir.clone(),
            cfg.video_dir.clone(),
            cfg.image_extensions.clone(),
            cfg.video_extension.clone(),
        )
    }

    /// Whether locators from this layout address an HTTP origin.
    pub fn is_networked(&self) -> bool {
        let root = self.root.to_ascii_lowercase();
        root.starts_with("http://") || root.starts_with("https://")
    }

    /// Candidate locators for one 1-based `index`, in the order they must be probed.
    pub fn candidates(&self, kind: AssetKind, folder: &str, index: u32) -> Vec<String> {
        match kind {
            AssetKind::Image => self
                .image_extensions
                .iter()
                .map(|ext| self.locator(&self.image_dir, folder, index, ext))
                .collect(),
            AssetKind::Video => {
                vec![self.locator(&self.video_dir, folder, index, &self.video_extension)]
            }
        }
    }

    fn locator(&self, dir: &str, folder: &str, index: u32, ext: &str) -> String {
        let file = format!("{index}.{ext}");
        [self.root.as_str(), dir, folder, file.as_str()]
            .iter()
            .map(|part| part.trim_matches('/'))
            .filter(|part| !part.is_empty() && *part != ".")
            .fold(
                if self.root.starts_with('/') {
                    String::from("/")
                } else {
                    String::new()
                },
                |mut acc, part| {
                    if !acc.is_empty() && !acc.ends_with('/') {
                        acc.push('/');
                    }
                    acc.push_str(part);
                    acc
                },
            )
    }
}
