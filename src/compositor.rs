// SPDX-License-Identifier: GPL-3.0-only

//! Compositing a captured frame with an overlay graphic
//!
//! The output is always the largest centered square that fits the source
//! frame, with the overlay (when one is selected) stretched over it as the
//! top layer. Layer order is fixed: frame first, overlay second.

use crate::backends::camera::types::CameraFrame;
use crate::errors::CaptureError;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use tracing::debug;

/// A finished capture: PNG payload plus the decoded pixels used for
/// on-screen review
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// PNG-encoded payload, exactly what a download writes out
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Composited pixels, kept so review rendering needs no re-decode
    pub image: RgbaImage,
}

/// The largest centered square that fits a `width x height` frame:
/// `(size, offset_x, offset_y)`
pub fn square_crop(width: u32, height: u32) -> (u32, u32, u32) {
    let size = width.min(height);
    (size, (width - size) / 2, (height - size) / 2)
}

/// Compose the center-cropped square of `frame` with an optional overlay.
///
/// Fails with `NoFrameAvailable` when the frame has no dimensions yet
/// (stream not ready). The overlay, when present, is stretched to the
/// square and drawn strictly after the frame layer.
pub fn compose(
    frame: &CameraFrame,
    overlay: Option<&RgbaImage>,
) -> Result<RgbaImage, CaptureError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(CaptureError::NoFrameAvailable);
    }

    let (size, offset_x, offset_y) = square_crop(frame.width, frame.height);
    debug!(
        width = frame.width,
        height = frame.height,
        size,
        offset_x,
        offset_y,
        "Compositing capture"
    );

    let mut canvas = RgbaImage::new(size, size);
    for y in 0..size {
        for x in 0..size {
            let (r, g, b) = frame.pixel(offset_x + x, offset_y + y);
            canvas.put_pixel(x, y, Rgba([r, g, b, 255]));
        }
    }

    if let Some(overlay) = overlay {
        if overlay.dimensions() == (size, size) {
            imageops::overlay(&mut canvas, overlay, 0, 0);
        } else {
            let stretched = imageops::resize(overlay, size, size, FilterType::Triangle);
            imageops::overlay(&mut canvas, &stretched, 0, 0);
        }
    }

    Ok(canvas)
}

/// Encode a composited canvas as PNG
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CaptureError> {
    let mut data = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
        .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;
    Ok(data)
}

/// Compose and encode, producing the capture artifact.
///
/// Encoding is CPU-bound and runs on a blocking worker; the returned
/// `CapturedImage` only exists once the full composite and encode have
/// completed (it is never partially valid).
pub async fn capture(
    frame: &CameraFrame,
    overlay: Option<&RgbaImage>,
) -> Result<CapturedImage, CaptureError> {
    let composed = compose(frame, overlay)?;
    let (width, height) = composed.dimensions();

    let (image, data) = tokio::task::spawn_blocking(move || {
        let data = encode_png(&composed)?;
        Ok::<_, CaptureError>((composed, data))
    })
    .await
    .map_err(|e| CaptureError::EncodingFailed(format!("encode task failed: {}", e)))??;

    Ok(CapturedImage {
        data,
        width,
        height,
        image,
    })
}
