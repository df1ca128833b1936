// SPDX-License-Identifier: GPL-3.0-only

//! Scenario tests for the compositing pipeline

use framebooth::backends::camera::types::CameraFrame;
use framebooth::compositor::{self, square_crop};
use framebooth::overlays;

fn gradient_frame(width: u32, height: u32) -> CameraFrame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push((x % 251) as u8);
            data.push((y % 241) as u8);
            data.push(((x + y) % 253) as u8);
        }
    }
    CameraFrame::new(width, height, data)
}

#[test]
fn output_is_square_across_aspect_ratios() {
    for (w, h) in [
        (1280, 720),
        (720, 1280),
        (1920, 1080),
        (640, 480),
        (480, 640),
        (333, 333),
        (1, 1000),
    ] {
        let out = compositor::compose(&gradient_frame(w, h), None).unwrap();
        let side = w.min(h);
        assert_eq!(out.dimensions(), (side, side), "for source {}x{}", w, h);
    }
}

#[tokio::test]
async fn landscape_capture_with_catalog_overlay() {
    // 1280x720 with the first catalog overlay: a 720 square, frame under
    // the overlay's opaque border, frame visible through its clear center
    let frame = gradient_frame(1280, 720);
    let overlay = overlays::load(&overlays::CATALOG[0]).await.unwrap();

    let captured = compositor::capture(&frame, Some(&*overlay)).await.unwrap();
    assert_eq!((captured.width, captured.height), (720, 720));

    // The classic overlay's border is fully opaque at the corner
    let corner = captured.image.get_pixel(0, 0).0;
    assert_eq!(corner[3], 255);
    let (fr, fg, fb) = frame.pixel(280, 0);
    assert_ne!(
        (corner[0], corner[1], corner[2]),
        (fr, fg, fb),
        "opaque overlay must win the z-order at the corner"
    );

    // Its center is fully transparent, so the cropped frame shows through
    let (size, offset_x, offset_y) = square_crop(1280, 720);
    let center = captured.image.get_pixel(size / 2, size / 2).0;
    let (r, g, b) = frame.pixel(offset_x + size / 2, offset_y + size / 2);
    assert_eq!(center, [r, g, b, 255]);
}

#[tokio::test]
async fn every_catalog_overlay_composites() {
    let frame = gradient_frame(800, 600);
    for graphic in &overlays::CATALOG {
        let overlay = overlays::load(graphic).await.unwrap();
        let captured = compositor::capture(&frame, Some(&*overlay)).await.unwrap();
        assert_eq!((captured.width, captured.height), (600, 600));
        assert_eq!(&captured.data[..8], b"\x89PNG\r\n\x1a\n");
    }
}

#[tokio::test]
async fn zero_dimension_frame_is_rejected() {
    let frame = CameraFrame::new(0, 0, Vec::new());
    assert!(compositor::capture(&frame, None).await.is_err());
}
