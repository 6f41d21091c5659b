use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;

use crate::carousel::{MediaItem, Slot, SlotState};
use crate::events::{CardCount, DetailView, ViewUpdate};

/// Terminal render sink: prints each update as it arrives.
pub async fn run(mut from_view: Receiver<ViewUpdate>, cancel: CancellationToken) -> Result<()> {
    loop {
        select! {
            _ = cancel.cancelled() => break,
            maybe_update = from_view.recv() => match maybe_update {
                Some(update) => println!("{}", describe(&update)),
                None => break,
            }
        }
    }
    Ok(())
}

pub fn describe(update: &ViewUpdate) -> String {
    match update {
        ViewUpdate::Theme(theme) => format!("[theme] {theme}"),
        ViewUpdate::Closed { kind } => format!("[{kind}] detail closed"),
        ViewUpdate::AlbumList { kind, cards } => {
            let mut out = format!("[{kind}] albums:");
            for card in cards {
                let count = match card.count {
                    CardCount::Items(n) => format!("{n} items"),
                    CardCount::Unscanned => "? items".to_string(),
                    CardCount::ComingSoon => "coming soon".to_string(),
                };
                out.push_str(&format!("\n  album-card:{} {} ({count})", card.key, card.title));
            }
            out
        }
        ViewUpdate::Detail(DetailView::ComingSoon { kind, title, .. }) => {
            format!("[{kind}] {title}: coming soon")
        }
        ViewUpdate::Detail(DetailView::Gallery {
            kind,
            title,
            carousel,
            ..
        }) => {
            let position = carousel.current.map_or(0, |c| c + 1);
            let mut out = format!("[{kind}] {title} {position}/{}", carousel.slots.len());
            for (idx, slot) in carousel.slots.iter().enumerate() {
                if slot.state != SlotState::Hidden {
                    out.push_str(&format!("\n  item:{idx} {}", describe_slot(slot)));
                }
            }
            out
        }
    }
}

fn describe_slot(slot: &Slot) -> String {
    let marker = match slot.state {
        SlotState::Active if slot.playing => "playing",
        SlotState::Active => "showing",
        SlotState::Adjacent => "ready",
        SlotState::Hidden => "hidden",
    };
    let what = match slot.item() {
        MediaItem::Embedded { id, vertical: true } => format!("youtube {id} (vertical)"),
        MediaItem::Embedded { id, .. } => format!("youtube {id}"),
        MediaItem::Direct { locator, .. } => locator.clone(),
    };
    match &slot.entry.caption {
        Some(caption) => format!("{marker} {what} - {caption}"),
        None => format!("{marker} {what}"),
    }
}
