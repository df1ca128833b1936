// SPDX-License-Identifier: GPL-3.0-only

//! Capture session orchestration
//!
//! Ties the enumerator, stream controller, overlay selector and compositor
//! together behind a two-state machine: `Live` (streaming preview) and
//! `Reviewing` (a captured image replaces the preview until reset).

use crate::backends::camera::types::{CameraDevice, CameraFacing, CameraFrame};
use crate::backends::camera::{StreamController, device_for_facing, enumerate_cameras};
use crate::compositor::{self, CapturedImage};
use crate::errors::{AppError, AppResult, CameraError, CaptureError, OverlayError};
use crate::overlays::{self, CATALOG, OverlaySelector};
use crate::storage;

use image::RgbaImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Session state machine
///
/// The captured image lives inside the `Reviewing` variant, so it exists
/// exactly when the session is reviewing and never otherwise.
#[derive(Debug, Default)]
pub enum SessionState {
    /// Streaming preview with the overlay shown live
    #[default]
    Live,
    /// A captured image is displayed instead of the stream
    Reviewing(CapturedImage),
}

impl SessionState {
    pub fn is_live(&self) -> bool {
        matches!(self, SessionState::Live)
    }

    pub fn is_reviewing(&self) -> bool {
        matches!(self, SessionState::Reviewing(_))
    }

    /// The captured image, present only while reviewing
    pub fn captured(&self) -> Option<&CapturedImage> {
        match self {
            SessionState::Live => None,
            SessionState::Reviewing(captured) => Some(captured),
        }
    }
}

/// Orchestrates one capture session: start, live preview, capture,
/// review (download/reset), flip, teardown
pub struct CaptureSession {
    devices: Vec<CameraDevice>,
    multi_camera: bool,
    facing: CameraFacing,
    stream: StreamController,
    selector: OverlaySelector,
    /// Decoded overlays by catalog index; filled on first use
    overlay_cache: HashMap<usize, Arc<RgbaImage>>,
    state: SessionState,
}

impl CaptureSession {
    /// Build a session from live device enumeration.
    ///
    /// An enumeration failure is downgraded: the session comes up with no
    /// devices (placeholder preview, no flip control) instead of failing.
    pub fn new(facing: CameraFacing, overlay: Option<usize>) -> Self {
        let devices = match enumerate_cameras() {
            Ok(devices) => devices,
            Err(err) => {
                warn!(error = %err, "Device enumeration failed");
                Vec::new()
            }
        };
        Self::with_devices(devices, facing, overlay)
    }

    /// Build a session over an explicit device list (tests, one-shot CLI)
    pub fn with_devices(
        devices: Vec<CameraDevice>,
        facing: CameraFacing,
        overlay: Option<usize>,
    ) -> Self {
        let multi_camera = devices.len() > 1;
        info!(cameras = devices.len(), multi_camera, %facing, "Creating capture session");

        Self {
            devices,
            multi_camera,
            facing,
            stream: StreamController::new(),
            selector: OverlaySelector::new(overlay),
            overlay_cache: HashMap::new(),
            state: SessionState::Live,
        }
    }

    /// Start (or restart) the stream for the current facing
    pub fn start(&mut self) -> Result<(), CameraError> {
        let device = device_for_facing(&self.devices, self.facing)
            .cloned()
            .ok_or_else(|| CameraError::DeviceUnavailable("no camera present".to_string()))?;
        self.stream.start(&device)
    }

    /// `Live -> Reviewing`: composite the current frame with the selected
    /// overlay and store the result.
    ///
    /// The overlay decode is awaited before compositing, so a capture can
    /// never emit a frame without its overlay layer. On any failure the
    /// session stays `Live` and the error is surfaced to the caller as a
    /// diagnostic.
    pub async fn capture(&mut self) -> AppResult<()> {
        if self.state.is_reviewing() {
            debug!("Capture ignored while reviewing");
            return Ok(());
        }

        let frame = self
            .stream
            .current_frame()
            .ok_or(AppError::Capture(CaptureError::NoFrameAvailable))?;

        let overlay = self.overlay_image().await?;
        let captured = compositor::capture(&frame, overlay.as_deref()).await?;

        info!(
            width = captured.width,
            height = captured.height,
            overlay = ?self.selector.current().map(|g| g.id),
            "Image captured"
        );
        self.state = SessionState::Reviewing(captured);
        Ok(())
    }

    /// `Reviewing -> Live`: discard the captured image and guarantee the
    /// stream is running again for the last-used facing
    pub fn reset(&mut self) -> Result<(), CameraError> {
        if !self.state.is_reviewing() {
            return Ok(());
        }

        self.state = SessionState::Live;
        if !self.stream.is_running() {
            self.start()?;
        }
        Ok(())
    }

    /// `Reviewing -> Reviewing`: write the exact PNG payload into `dir`
    pub fn download(&self, dir: &Path) -> AppResult<PathBuf> {
        let captured = self
            .state
            .captured()
            .ok_or_else(|| AppError::Other("nothing captured to download".to_string()))?;
        storage::save_captured(captured, dir).map_err(|e| AppError::Storage(e.to_string()))
    }

    /// `Live -> Live`: toggle the facing and restart the stream.
    ///
    /// A no-op unless multiple cameras are present. On failure the
    /// previous facing is restored (best effort) and the error surfaced.
    pub fn flip_camera(&mut self) -> Result<(), CameraError> {
        if !self.multi_camera {
            debug!("Flip ignored: single camera");
            return Ok(());
        }
        if !self.state.is_live() {
            return Ok(());
        }

        let previous = self.facing;
        self.facing = previous.toggled();
        info!(from = %previous, to = %self.facing, "Flipping camera");

        match self.start() {
            Ok(()) => Ok(()),
            Err(err) => {
                error!(error = %err, "Camera flip failed, reverting");
                self.facing = previous;
                if let Err(revert_err) = self.start() {
                    warn!(error = %revert_err, "Could not restart previous camera");
                }
                Err(err)
            }
        }
    }

    /// Release the stream. Also runs implicitly on drop.
    pub fn stop(&mut self) {
        self.stream.stop();
    }

    /// Drain pump frames; returns the newest if one arrived
    pub fn poll_frame(&mut self) -> Option<Arc<CameraFrame>> {
        self.stream.poll_frame()
    }

    /// Read-only snapshot of the latest frame
    pub fn current_frame(&self) -> Option<Arc<CameraFrame>> {
        self.stream.current_frame()
    }

    /// The decoded image for the current overlay selection, loading and
    /// caching it on first use
    pub async fn overlay_image(&mut self) -> Result<Option<Arc<RgbaImage>>, OverlayError> {
        let Some(index) = self.selector.current_index() else {
            return Ok(None);
        };
        if let Some(image) = self.overlay_cache.get(&index) {
            return Ok(Some(Arc::clone(image)));
        }

        let image = overlays::load(&CATALOG[index]).await?;
        self.overlay_cache.insert(index, Arc::clone(&image));
        Ok(Some(image))
    }

    /// Advance the overlay selection; only editable while live
    pub fn cycle_overlay(&mut self) {
        if self.state.is_live() {
            self.selector.cycle();
        }
    }

    /// Select an overlay by catalog index; only editable while live
    pub fn select_overlay(&mut self, index: usize) {
        if self.state.is_live() {
            self.selector.select(index);
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    /// Whether the flip control should be offered at all
    pub fn has_multiple_cameras(&self) -> bool {
        self.multi_camera
    }

    pub fn selector(&self) -> &OverlaySelector {
        &self.selector
    }

    pub fn is_stream_running(&self) -> bool {
        self.stream.is_running()
    }
}
