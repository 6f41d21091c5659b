//! Extraction of YouTube video identifiers from the link shapes people paste.

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix marking a locator that already carries a bare identifier.
pub const ID_PREFIX: &str = "youtube:";
pub const ID_LEN: usize = 11;

// The leading `.*` is greedy so the last recognised marker in the locator wins.
static LINK_SHAPES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.*(?:youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=|shorts/)([^#&?]*).*$")
        .expect("static link pattern compiles")
});

/// Resolve `locator` to an embeddable video identifier.
///
/// Returns `None` when the locator is not a recognised YouTube link or the
/// extracted token is not exactly [`ID_LEN`] characters; callers then treat
/// the locator as a direct file.
#[must_use]
pub fn resolve_embedded_id(locator: &str) -> Option<String> {
    if let Some(rest) = locator.strip_prefix(ID_PREFIX) {
        return Some(rest.split(':').next().unwrap_or_default().to_string());
    }
    let captures = LINK_SHAPES.captures(locator)?;
    let token = captures.get(1)?.as_str();
    (token.chars().count() == ID_LEN).then(|| token.to_string())
}

/// Embed player address; `autoplay` selects whether loading it starts playback.
#[must_use]
pub fn embed_url(id: &str, autoplay: bool) -> String {
    format!(
        "https://www.youtube.com/embed/{id}?autoplay={}&controls=1&rel=0&playsinline=1",
        u8::from(autoplay)
    )
}

#[must_use]
pub fn thumbnail_url(id: &str) -> String {
    format!("https://img.youtube.com/vi/{id}/hqdefault.jpg")
}

/// Shorts are portrait; everything else renders landscape.
#[must_use]
pub fn is_vertical(locator: &str) -> bool {
    locator.contains("/shorts/")
}
