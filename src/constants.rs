// SPDX-License-Identifier: GPL-3.0-only

//! Shared constants

use std::time::Duration;

/// File name used when downloading a captured image
pub const DOWNLOAD_FILE_NAME: &str = "captured-image.png";

/// Default folder name for saved captures (under the user's download
/// or picture directory)
pub const DEFAULT_SAVE_FOLDER: &str = "Framebooth";

/// Bounded capacity of the pump-to-consumer frame channel.
/// The pump drops frames when the consumer falls behind.
pub const FRAME_CHANNEL_CAPACITY: usize = 10;

/// Dimensions of frames produced by `stub://` synthetic sources
/// when the device path does not specify its own
pub const STUB_DEFAULT_WIDTH: u32 = 1280;
pub const STUB_DEFAULT_HEIGHT: u32 = 720;

/// Preferred capture resolution requested from real devices
pub const PREFERRED_WIDTH: u32 = 1280;
pub const PREFERRED_HEIGHT: u32 = 720;

/// UI event poll interval (~60Hz redraw)
pub const POLL_INTERVAL: Duration = Duration::from_millis(16);

/// One-shot CLI capture: how long to keep the camera running before
/// trusting its frames (auto-exposure settles)
pub const WARMUP: Duration = Duration::from_millis(500);

/// One-shot CLI capture: give up waiting for a frame after this long
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(5);
