// SPDX-License-Identifier: GPL-3.0-only

//! Pixel format conversion at the pump boundary
//!
//! Real devices rarely deliver RGB3 even when asked; the common webcam
//! formats are YUYV (packed 4:2:2) and MJPG. Everything is normalized to
//! packed RGB24 here so the rest of the pipeline deals with one layout.

/// Convert a packed YUYV 4:2:2 buffer to packed RGB24.
///
/// Two pixels share one chroma pair: Y0 U Y1 V per 4 bytes.
pub fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let row_bytes = (width * 2) as usize;

    for y in 0..height as usize {
        let row = &data[y * row_bytes..];
        for x in 0..width as usize {
            let base = (x & !1) * 2;
            if base + 3 >= row.len() {
                rgb.extend_from_slice(&[0, 0, 0]);
                continue;
            }
            let luma = if x & 1 == 0 { row[base] } else { row[base + 2] };
            let (r, g, b) = yuv_to_rgb(luma, row[base + 1], row[base + 3]);
            rgb.push(r);
            rgb.push(g);
            rgb.push(b);
        }
    }

    rgb
}

/// Decode an MJPG frame to packed RGB24, returning the decoded dimensions
pub fn mjpg_to_rgb(data: &[u8]) -> Result<(u32, u32, Vec<u8>), String> {
    let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| e.to_string())?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok((width, height, rgb.into_raw()))
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}
