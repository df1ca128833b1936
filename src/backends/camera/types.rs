// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for the camera backend

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Scheme prefix selecting the synthetic frame source instead of a
/// real V4L2 device
pub const STUB_PREFIX: &str = "stub://";

/// Which physical camera a stream is requested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    /// User-facing (selfie) camera
    #[default]
    Front,
    /// Environment-facing camera
    Back,
}

impl CameraFacing {
    /// The other facing direction
    pub fn toggled(self) -> Self {
        match self {
            CameraFacing::Front => CameraFacing::Back,
            CameraFacing::Back => CameraFacing::Front,
        }
    }

    /// Platform constraint name for this facing (`facingMode` vocabulary)
    pub fn constraint_name(&self) -> &'static str {
        match self {
            CameraFacing::Front => "user",
            CameraFacing::Back => "environment",
        }
    }
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraFacing::Front => write!(f, "front"),
            CameraFacing::Back => write!(f, "back"),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone)]
pub struct CameraDevice {
    /// Human-readable device name (may be empty; only the device count
    /// matters for capability decisions)
    pub name: String,
    /// Device path (e.g., /dev/video0), or a `stub://` path for the
    /// synthetic source
    pub path: String,
    /// Physical mounting location when the platform reports one
    pub location: Option<CameraFacing>,
}

impl CameraDevice {
    /// Whether this device selects the synthetic frame source
    pub fn is_stub(&self) -> bool {
        self.path.starts_with(STUB_PREFIX)
    }

    /// Synthetic device handle for tests and demos.
    ///
    /// `spec` is the part after `stub://`: a name, optionally followed by
    /// `@WIDTHxHEIGHT` (e.g., `front@640x480`).
    pub fn stub(spec: &str, location: Option<CameraFacing>) -> Self {
        Self {
            name: format!("Synthetic camera ({})", spec),
            path: format!("{}{}", STUB_PREFIX, spec),
            location,
        }
    }
}

/// A single video frame as packed RGB24, row-major, no padding.
///
/// Frames are converted to this layout at the pump boundary regardless of
/// what the driver delivered, so every consumer samples the same format.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes
    pub data: Arc<[u8]>,
}

impl CameraFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height * 3) as usize);
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
        }
    }

    /// Sample a pixel, clamping out-of-range coordinates to the edge
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = ((y * self.width + x) * 3) as usize;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_toggles_both_ways() {
        assert_eq!(CameraFacing::Front.toggled(), CameraFacing::Back);
        assert_eq!(CameraFacing::Back.toggled(), CameraFacing::Front);
    }

    #[test]
    fn facing_constraint_names() {
        assert_eq!(CameraFacing::Front.constraint_name(), "user");
        assert_eq!(CameraFacing::Back.constraint_name(), "environment");
    }

    #[test]
    fn stub_device_is_stub() {
        let device = CameraDevice::stub("front", Some(CameraFacing::Front));
        assert!(device.is_stub());
        assert_eq!(device.path, "stub://front");
    }

    #[test]
    fn frame_pixel_clamps_to_edge() {
        let frame = CameraFrame::new(2, 1, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(frame.pixel(0, 0), (1, 2, 3));
        assert_eq!(frame.pixel(5, 5), (4, 5, 6));
    }
}
