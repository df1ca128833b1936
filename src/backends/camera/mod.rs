// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend: device enumeration and stream lifecycle
//!
//! Devices are discovered by scanning `/sys/class/video4linux` and probing
//! each node's V4L2 capabilities; only video-capture-capable nodes are
//! reported (many cameras expose sibling metadata-only nodes).

pub mod convert;
pub mod stream;
pub mod types;

pub use stream::StreamController;

use crate::errors::CameraError;
use types::{CameraDevice, CameraFacing};

use tracing::{debug, warn};

/// Enumerate video-capture devices, sorted by node number.
///
/// Device labels may be empty (e.g., before a permission grant); callers
/// must not rely on them. Only the count is contractual.
pub fn enumerate_cameras() -> Result<Vec<CameraDevice>, CameraError> {
    let entries = std::fs::read_dir("/sys/class/video4linux")
        .map_err(|e| CameraError::EnumerationFailed(e.to_string()))?;

    let mut devices: Vec<(u32, CameraDevice)> = Vec::new();

    for entry in entries.flatten() {
        let node = entry.file_name();
        let node = node.to_string_lossy();
        let Some(number) = node.strip_prefix("video").and_then(|n| n.parse::<u32>().ok()) else {
            continue;
        };

        let path = format!("/dev/{}", node);
        if !is_capture_device(&path) {
            continue;
        }

        let name = std::fs::read_to_string(format!("/sys/class/video4linux/{}/name", node))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let location = location_from_name(&name);
        debug!(path = %path, name = %name, ?location, "Found capture device");

        devices.push((number, CameraDevice { name, path, location }));
    }

    devices.sort_by_key(|(number, _)| *number);
    Ok(devices.into_iter().map(|(_, device)| device).collect())
}

/// Whether more than one camera is available.
///
/// An enumeration failure is not an error condition here: it is logged and
/// reported as "cannot determine", which callers treat as a single camera
/// (the flip control is simply not offered).
pub fn has_multiple_cameras() -> bool {
    match enumerate_cameras() {
        Ok(devices) => devices.len() > 1,
        Err(err) => {
            warn!(error = %err, "Device enumeration failed, assuming single camera");
            false
        }
    }
}

/// Resolve a facing direction to a device from the enumerated list.
///
/// Prefers a device whose reported location matches the facing. Without
/// location metadata the enumeration order decides: first device is the
/// front camera, last the back camera. With a single device both facings
/// resolve to it, which is unobservable since flip is only offered when
/// multiple cameras exist.
pub fn device_for_facing(devices: &[CameraDevice], facing: CameraFacing) -> Option<&CameraDevice> {
    if let Some(device) = devices.iter().find(|d| d.location == Some(facing)) {
        return Some(device);
    }
    match facing {
        CameraFacing::Front => devices.first(),
        CameraFacing::Back => devices.last(),
    }
}

/// Probe a device node for the video-capture capability
fn is_capture_device(path: &str) -> bool {
    let Ok(device) = v4l::Device::with_path(path) else {
        return false;
    };
    match device.query_caps() {
        Ok(caps) => caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE),
        Err(err) => {
            debug!(path = %path, error = %err, "Capability query failed");
            false
        }
    }
}

/// Guess the mounting location from the device label
fn location_from_name(name: &str) -> Option<CameraFacing> {
    let lower = name.to_ascii_lowercase();
    if lower.contains("front") || lower.contains("user") {
        Some(CameraFacing::Front)
    } else if lower.contains("back") || lower.contains("rear") || lower.contains("world") {
        Some(CameraFacing::Back)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(spec: &str, location: Option<CameraFacing>) -> CameraDevice {
        CameraDevice::stub(spec, location)
    }

    #[test]
    fn facing_prefers_reported_location() {
        let devices = vec![
            stub("a", Some(CameraFacing::Back)),
            stub("b", Some(CameraFacing::Front)),
        ];
        let front = device_for_facing(&devices, CameraFacing::Front).unwrap();
        assert_eq!(front.path, "stub://b");
        let back = device_for_facing(&devices, CameraFacing::Back).unwrap();
        assert_eq!(back.path, "stub://a");
    }

    #[test]
    fn facing_falls_back_to_enumeration_order() {
        let devices = vec![stub("a", None), stub("b", None)];
        assert_eq!(
            device_for_facing(&devices, CameraFacing::Front).unwrap().path,
            "stub://a"
        );
        assert_eq!(
            device_for_facing(&devices, CameraFacing::Back).unwrap().path,
            "stub://b"
        );
    }

    #[test]
    fn single_device_serves_both_facings() {
        let devices = vec![stub("only", None)];
        assert_eq!(
            device_for_facing(&devices, CameraFacing::Front).unwrap().path,
            "stub://only"
        );
        assert_eq!(
            device_for_facing(&devices, CameraFacing::Back).unwrap().path,
            "stub://only"
        );
    }

    #[test]
    fn no_devices_resolves_to_none() {
        assert!(device_for_facing(&[], CameraFacing::Front).is_none());
    }

    #[test]
    fn location_guessing() {
        assert_eq!(
            location_from_name("Front Camera: ov5675"),
            Some(CameraFacing::Front)
        );
        assert_eq!(
            location_from_name("USER facing cam"),
            Some(CameraFacing::Front)
        );
        assert_eq!(
            location_from_name("Rear camera"),
            Some(CameraFacing::Back)
        );
        assert_eq!(location_from_name("Integrated Webcam"), None);
    }
}
