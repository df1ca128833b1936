// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands: listing cameras and one-shot captures

use framebooth::backends::camera::enumerate_cameras;
use framebooth::backends::camera::types::{CameraDevice, CameraFacing};
use framebooth::constants::{FRAME_TIMEOUT, WARMUP};
use framebooth::overlays;
use framebooth::session::CaptureSession;
use framebooth::storage;

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// List available cameras and the overlay catalog
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras().unwrap_or_default();

    if cameras.is_empty() {
        println!("No cameras found.");
    } else {
        println!("Available cameras:");
        for (index, camera) in cameras.iter().enumerate() {
            let name = if camera.name.is_empty() {
                "(unnamed)"
            } else {
                &camera.name
            };
            let location = camera
                .location
                .map(|l| format!(" [{}]", l))
                .unwrap_or_default();
            println!("  [{}] {} ({}){}", index, name, camera.path, location);
        }
    }

    println!();
    println!("Overlay frames:");
    for graphic in &overlays::CATALOG {
        println!("  {} - {}", graphic.id, graphic.label);
    }

    Ok(())
}

/// Capture a single overlaid photo and save it
pub fn capture_photo(
    facing: CameraFacing,
    overlay: Option<String>,
    no_overlay: bool,
    device: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let devices = match device {
        Some(path) => vec![CameraDevice {
            name: String::new(),
            path,
            location: None,
        }],
        None => enumerate_cameras().unwrap_or_default(),
    };
    if devices.is_empty() {
        return Err("No cameras found".into());
    }

    let selection = if no_overlay {
        None
    } else {
        match overlay {
            Some(id) => {
                Some(overlays::find(&id).ok_or_else(|| format!("Unknown overlay '{}'", id))?)
            }
            None => Some(0),
        }
    };

    let mut session = CaptureSession::with_devices(devices, facing, selection);
    session.start()?;

    // Let auto-exposure settle before trusting frames, then take the next
    // good one; give up if the camera never delivers.
    println!("Capturing...");
    let start = Instant::now();
    let mut have_frame = false;
    while start.elapsed() < FRAME_TIMEOUT {
        if session.poll_frame().is_some() {
            have_frame = true;
            if start.elapsed() > WARMUP {
                break;
            }
        } else {
            std::thread::sleep(Duration::from_millis(16));
        }
    }
    if !have_frame {
        return Err("Failed to capture frame from camera".into());
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(session.capture())?;

    let captured = session
        .state()
        .captured()
        .ok_or("Capture produced no image")?;
    println!("Composited {}x{}", captured.width, captured.height);

    let saved_path = match output {
        Some(path) if path.extension().is_some() => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &captured.data)?;
            path
        }
        Some(dir) => session.download(&dir)?,
        None => session.download(&storage::default_save_dir())?,
    };

    println!("Photo saved: {}", saved_path.display());
    session.stop();
    Ok(())
}
