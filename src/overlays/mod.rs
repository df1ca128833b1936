// SPDX-License-Identifier: GPL-3.0-only

//! Overlay frame graphics: embedded catalog, selection state, async loading
//!
//! The catalog is a fixed, ordered set of decorative frame images compiled
//! into the binary. Selection is pure state; decoding happens off the event
//! loop and a capture never proceeds until the decode has completed.

use crate::errors::OverlayError;

use image::RgbaImage;
use rust_embed::RustEmbed;
use std::sync::Arc;

#[derive(RustEmbed)]
#[folder = "assets/overlays/"]
struct OverlayAssets;

/// One entry of the overlay catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayGraphic {
    /// Stable identity, used by config and the CLI
    pub id: &'static str,
    /// Display label for the UI
    pub label: &'static str,
    asset: &'static str,
}

/// The fixed overlay catalog, in display order
pub static CATALOG: [OverlayGraphic; 3] = [
    OverlayGraphic {
        id: "classic",
        label: "Classic border",
        asset: "classic.png",
    },
    OverlayGraphic {
        id: "filmstrip",
        label: "Filmstrip",
        asset: "filmstrip.png",
    },
    OverlayGraphic {
        id: "corners",
        label: "Photo corners",
        asset: "corners.png",
    },
];

/// Look up a catalog index by overlay id
pub fn find(id: &str) -> Option<usize> {
    CATALOG.iter().position(|g| g.id == id)
}

/// Holds the currently selected overlay.
///
/// Defaults to the first catalog entry; `None` means no overlay layer.
#[derive(Debug, Clone)]
pub struct OverlaySelector {
    selection: Option<usize>,
}

impl Default for OverlaySelector {
    fn default() -> Self {
        Self { selection: Some(0) }
    }
}

impl OverlaySelector {
    pub fn new(selection: Option<usize>) -> Self {
        if let Some(index) = selection {
            assert!(index < CATALOG.len(), "overlay index {} out of catalog", index);
        }
        Self { selection }
    }

    /// Select a catalog entry. An out-of-catalog index is a programming
    /// error, not a runtime condition.
    pub fn select(&mut self, index: usize) {
        assert!(index < CATALOG.len(), "overlay index {} out of catalog", index);
        self.selection = Some(index);
    }

    /// Deselect: the next capture carries no overlay layer
    pub fn clear(&mut self) {
        self.selection = None;
    }

    /// Advance through the catalog, then through "no overlay", then wrap
    pub fn cycle(&mut self) {
        self.selection = match self.selection {
            Some(index) if index + 1 < CATALOG.len() => Some(index + 1),
            Some(_) => None,
            None => Some(0),
        };
    }

    pub fn current(&self) -> Option<&'static OverlayGraphic> {
        self.selection.map(|index| &CATALOG[index])
    }

    pub fn current_index(&self) -> Option<usize> {
        self.selection
    }
}

/// Decode an overlay asset to RGBA off the event loop.
///
/// Completion of this future is the load signal the capture path joins on;
/// a failed decode is surfaced as `OverlayError::LoadFailed`, never as a
/// silently missing layer.
pub async fn load(graphic: &'static OverlayGraphic) -> Result<Arc<RgbaImage>, OverlayError> {
    let file = OverlayAssets::get(graphic.asset).ok_or_else(|| OverlayError::LoadFailed {
        name: graphic.id.to_string(),
        reason: "asset missing from catalog bundle".to_string(),
    })?;

    let id = graphic.id;
    tokio::task::spawn_blocking(move || {
        image::load_from_memory(&file.data)
            .map(|img| Arc::new(img.to_rgba8()))
            .map_err(|e| OverlayError::LoadFailed {
                name: id.to_string(),
                reason: e.to_string(),
            })
    })
    .await
    .map_err(|e| OverlayError::LoadFailed {
        name: graphic.id.to_string(),
        reason: format!("decode task failed: {}", e),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_fixed_and_ordered() {
        assert_eq!(CATALOG.len(), 3);
        assert_eq!(CATALOG[0].id, "classic");
        assert_eq!(find("filmstrip"), Some(1));
        assert_eq!(find("corners"), Some(2));
        assert_eq!(find("missing"), None);
    }

    #[test]
    fn default_selection_is_first_entry() {
        let selector = OverlaySelector::default();
        assert_eq!(selector.current().unwrap().id, "classic");
    }

    #[test]
    fn cycle_walks_catalog_then_none() {
        let mut selector = OverlaySelector::default();
        selector.cycle();
        assert_eq!(selector.current_index(), Some(1));
        selector.cycle();
        assert_eq!(selector.current_index(), Some(2));
        selector.cycle();
        assert_eq!(selector.current_index(), None);
        selector.cycle();
        assert_eq!(selector.current_index(), Some(0));
    }

    #[test]
    #[should_panic(expected = "out of catalog")]
    fn selecting_unknown_overlay_is_fatal() {
        let mut selector = OverlaySelector::default();
        selector.select(CATALOG.len());
    }

    #[tokio::test]
    async fn every_catalog_asset_decodes() {
        for graphic in &CATALOG {
            let image = load(graphic).await.expect("catalog asset must decode");
            assert!(image.width() > 0 && image.height() > 0);
        }
    }
}
