//! Navigable media playlist with an active/adjacent/hidden slot window.
//!
//! Every mutation ends in [`Carousel::reconcile`], which moves each slot to
//! the state its position demands and drives the [`MediaControl`] capability
//! for the transitions. After reconciliation exactly one slot is
//! [`SlotState::Active`] whenever the playlist is non-empty.

use crate::config::AssetKind;
use crate::resolve::{embed_url, is_vertical, resolve_embedded_id, thumbnail_url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaItem {
    /// Third-party hosted video, played through the embed player.
    Embedded { id: String, vertical: bool },
    /// File served by the asset origin.
    Direct { locator: String, kind: AssetKind },
}

impl MediaItem {
    /// Embedded when the locator resolves to a video id, direct otherwise.
    pub fn from_locator(locator: &str, kind: AssetKind) -> Self {
        match resolve_embedded_id(locator) {
            Some(id) => MediaItem::Embedded {
                id,
                vertical: is_vertical(locator),
            },
            None => MediaItem::Direct {
                locator: locator.to_string(),
                kind,
            },
        }
    }

    pub fn thumbnail(&self) -> Option<String> {
        match self {
            MediaItem::Embedded { id, .. } => Some(thumbnail_url(id)),
            MediaItem::Direct {
                locator,
                kind: AssetKind::Image,
            } => Some(locator.clone()),
            MediaItem::Direct { .. } => None,
        }
    }

    pub fn locator(&self) -> Option<&str> {
        match self {
            MediaItem::Embedded { .. } => None,
            MediaItem::Direct { locator, .. } => Some(locator),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub item: MediaItem,
    pub caption: Option<String>,
}

impl MediaEntry {
    pub fn new(item: MediaItem) -> Self {
        Self {
            item,
            caption: None,
        }
    }

    pub fn with_caption(mut self, caption: Option<String>) -> Self {
        self.caption = caption;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Active,
    Adjacent,
    Hidden,
}

impl SlotState {
    fn for_position(index: usize, current: Option<usize>) -> Self {
        match current {
            Some(c) if index == c => SlotState::Active,
            Some(c) if index + 1 == c || index == c + 1 => SlotState::Adjacent,
            _ => SlotState::Hidden,
        }
    }
}

/// Render state of one playlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub entry: MediaEntry,
    pub state: SlotState,
    /// Source currently loaded into the rendered element, if it is rendered at all.
    pub source: Option<String>,
    pub playing: bool,
    pub muted: bool,
    /// Number of times an embedded source was reset to stop playback.
    pub reloads: u32,
}

impl Slot {
    fn new(entry: MediaEntry) -> Self {
        Self {
            entry,
            state: SlotState::Hidden,
            source: None,
            playing: false,
            muted: true,
            reloads: 0,
        }
    }

    pub fn item(&self) -> &MediaItem {
        &self.entry.item
    }
}

/// Playback capability applied to slots as they change state.
pub trait MediaControl {
    fn play(&mut self, slot: &mut Slot);
    fn pause(&mut self, slot: &mut Slot);
    /// Drop the rendered element and whatever it holds.
    fn release(&mut self, slot: &mut Slot);
}

/// Stops embedded players by reloading them without autoplay; direct media
/// is paused and muted in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceReset;

impl MediaControl for SourceReset {
    fn play(&mut self, slot: &mut Slot) {
        match &slot.entry.item {
            MediaItem::Embedded { id, .. } => {
                slot.source = Some(embed_url(id, true));
                slot.playing = true;
            }
            MediaItem::Direct { locator, kind } => {
                slot.source = Some(locator.clone());
                slot.playing = *kind == AssetKind::Video;
            }
        }
        slot.muted = false;
    }

    fn pause(&mut self, slot: &mut Slot) {
        match &slot.entry.item {
            MediaItem::Embedded { id, .. } => {
                if slot.playing {
                    slot.reloads += 1;
                }
                slot.source = Some(embed_url(id, false));
            }
            MediaItem::Direct { locator, .. } => {
                if slot.source.is_none() {
                    slot.source = Some(locator.clone());
                }
            }
        }
        slot.playing = false;
        slot.muted = true;
    }

    fn release(&mut self, slot: &mut Slot) {
        slot.source = None;
        slot.playing = false;
        slot.muted = true;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselSnapshot {
    pub album: Option<String>,
    pub current: Option<usize>,
    pub slots: Vec<Slot>,
}

impl CarouselSnapshot {
    pub fn active(&self) -> Option<&Slot> {
        self.current.and_then(|idx| self.slots.get(idx))
    }
}

#[derive(Debug)]
pub struct Carousel<C> {
    album: Option<String>,
    slots: Vec<Slot>,
    current: Option<usize>,
    control: C,
}

impl<C: MediaControl> Carousel<C> {
    pub fn new(control: C) -> Self {
        Self {
            album: None,
            slots: Vec::new(),
            current: None,
            control,
        }
    }

    pub fn album(&self) -> Option<&str> {
        self.album.as_deref()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn items(&self) -> impl Iterator<Item = &MediaItem> {
        self.slots.iter().map(Slot::item)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    /// Replace everything with `entries` for `album`, positioned at the first entry.
    pub fn load(&mut self, album: &str, entries: Vec<MediaEntry>) {
        self.close();
        self.album = Some(album.to_string());
        self.slots = entries.into_iter().map(Slot::new).collect();
        self.current = (!self.slots.is_empty()).then_some(0);
        self.reconcile();
    }

    /// Append in order; the current position and active slot are left alone.
    pub fn append(&mut self, entries: Vec<MediaEntry>) {
        if entries.is_empty() {
            return;
        }
        self.slots.extend(entries.into_iter().map(Slot::new));
        if self.current.is_none() {
            self.current = Some(0);
        }
        self.reconcile();
    }

    /// Swap the entry at `index` keeping its position; no-op when out of range.
    pub fn replace(&mut self, index: usize, entry: MediaEntry) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if slot.entry == entry {
            return;
        }
        if slot.state == SlotState::Active {
            self.control.pause(slot);
        }
        self.control.release(slot);
        *slot = Slot::new(entry);
        self.reconcile();
    }

    /// Remove every entry, keeping the album open.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.state == SlotState::Active {
                self.control.pause(slot);
            }
            if slot.state != SlotState::Hidden || slot.source.is_some() {
                self.control.release(slot);
            }
        }
        self.slots.clear();
        self.current = None;
    }

    pub fn close(&mut self) {
        self.clear();
        self.album = None;
    }

    pub fn next(&mut self) -> bool {
        match self.current {
            Some(c) if c + 1 < self.slots.len() => {
                self.current = Some(c + 1);
                self.reconcile();
                true
            }
            _ => false,
        }
    }

    pub fn prev(&mut self) -> bool {
        match self.current {
            Some(c) if c > 0 => {
                self.current = Some(c - 1);
                self.reconcile();
                true
            }
            _ => false,
        }
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.slots.len() || self.current == Some(index) {
            return false;
        }
        self.current = Some(index);
        self.reconcile();
        true
    }

    pub fn snapshot(&self) -> CarouselSnapshot {
        CarouselSnapshot {
            album: self.album.clone(),
            current: self.current,
            slots: self.slots.clone(),
        }
    }

    fn reconcile(&mut self) {
        // Demote first so the outgoing item is stopped before the incoming one starts.
        for idx in 0..self.slots.len() {
            let target = SlotState::for_position(idx, self.current);
            let slot = &mut self.slots[idx];
            if slot.state == target || target == SlotState::Active {
                continue;
            }
            if slot.state == SlotState::Active || target == SlotState::Adjacent {
                self.control.pause(slot);
            }
            if target == SlotState::Hidden {
                self.control.release(slot);
            }
            slot.state = target;
        }
        if let Some(slot) = self.current.and_then(|c| self.slots.get_mut(c))
            && slot.state != SlotState::Active
        {
            self.control.play(slot);
            slot.state = SlotState::Active;
        }
        debug_assert!(
            self.slots.is_empty()
                || self
                    .slots
                    .iter()
                    .filter(|s| s.state == SlotState::Active)
                    .count()
                    == 1
        );
    }
}
