use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::Error;

/// Key under which the preference is stored.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    #[default]
    Dark,
}

impl ThemePreference {
    pub fn toggled(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

/// Persists the theme preference as one string entry of a JSON object file.
/// Other entries in the file are preserved.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored preference, or dark when absent or unreadable.
    pub fn load(&self) -> ThemePreference {
        match self.read_map() {
            Ok(map) => map
                .get(THEME_KEY)
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read preferences; using default theme");
                ThemePreference::default()
            }
        }
    }

    /// Write `theme`, keeping every other entry of the file.
    ///
    /// A file that exists but cannot be read or parsed is left untouched and
    /// the error is returned.
    pub fn save(&self, theme: ThemePreference) -> Result<(), Error> {
        let mut map = self.read_map()?;
        map.insert(THEME_KEY.to_string(), Value::String(theme.to_string()));
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(&map)?)?;
        debug!(path = %self.path.display(), %theme, "theme preference saved");
        Ok(())
    }

    fn read_map(&self) -> Result<Map<String, Value>, Error> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}
