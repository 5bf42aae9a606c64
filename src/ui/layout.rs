// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Layout watching for the preview.
//!
//! The watcher is fed the container size and the photo's natural size every
//! frame and decides when the display geometry has to be recomputed: on
//! attach, when the photo finishes loading, and whenever the container is
//! resized. It does nothing once detached.

use crate::models::display::{DisplayMetadata, Size};
use crate::util::geometry::letterbox;

#[derive(Debug, Default)]
pub struct LayoutWatcher {
    session: Option<u64>,
    container: Option<Size>,
    natural: Option<Size>,
    metadata: Option<DisplayMetadata>,
}

impl LayoutWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.session.is_some()
    }

    /// Latest successfully computed geometry.
    pub fn metadata(&self) -> Option<DisplayMetadata> {
        self.metadata
    }

    /// Begin watching a preview session and compute immediately.
    ///
    /// Attaching to a different session discards the old geometry.
    pub fn attach(
        &mut self,
        session: u64,
        container: Size,
        natural: Option<Size>,
    ) -> Option<DisplayMetadata> {
        if self.session != Some(session) {
            self.metadata = None;
        }
        self.session = Some(session);
        self.container = Some(container);
        self.natural = natural;
        self.recompute()
    }

    /// Report current sizes. Returns new geometry when a recompute ran and
    /// produced a usable result.
    pub fn observe(&mut self, container: Size, natural: Option<Size>) -> Option<DisplayMetadata> {
        if !self.is_attached() {
            return None;
        }

        let resized = self.container != Some(container);
        let loaded = self.natural.is_none() && natural.is_some();
        let replaced = self.natural.is_some() && natural.is_some() && self.natural != natural;

        self.container = Some(container);
        self.natural = natural;

        if resized || loaded || replaced {
            self.recompute()
        } else {
            None
        }
    }

    /// Stop watching. Later observations are ignored until the next attach.
    pub fn detach(&mut self) {
        self.session = None;
        self.container = None;
        self.natural = None;
        self.metadata = None;
    }

    fn recompute(&mut self) -> Option<DisplayMetadata> {
        let (container, natural) = (self.container?, self.natural?);
        let Some(metadata) = letterbox(container, natural) else {
            log::debug!(
                "skipping layout for container {:.1}x{:.1}",
                container.width,
                container.height
            );
            return None;
        };
        log::debug!(
            "layout {:.1}x{:.1} at ({:.1}, {:.1}), aspect {:.4}",
            metadata.display_width,
            metadata.display_height,
            metadata.offset_x,
            metadata.offset_y,
            metadata.image_aspect_ratio
        );
        self.metadata = Some(metadata);
        Some(metadata)
    }
}
