use thiserror::Error;

use crate::config::ContainerId;

/// Library error type for portfolio viewer operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A rendering target the subsystem needs was not registered by the host.
    #[error("missing render container: {0}")]
    MissingContainer(ContainerId),

    /// An album key was requested that the configuration does not declare.
    #[error("unknown album: {0}")]
    UnknownAlbum(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),

    /// Preferences file could not be encoded or decoded.
    #[error(transparent)]
    Preferences(#[from] serde_json::Error),
}
