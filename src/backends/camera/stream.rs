// SPDX-License-Identifier: GPL-3.0-only

//! Stream controller: lifecycle of the single active camera stream
//!
//! The controller exclusively owns the stream resources (device handle,
//! mmap buffers, pump thread). Exactly one stream may be active at a time;
//! `start` always releases the previous one first, so a facing switch can
//! never leave two streams open or hit a device-busy error. Consumers only
//! ever receive read-only frame snapshots.

use crate::backends::camera::convert;
use crate::backends::camera::types::{CameraDevice, CameraFrame, STUB_PREFIX};
use crate::constants::{
    FRAME_CHANNEL_CAPACITY, PREFERRED_HEIGHT, PREFERRED_WIDTH, STUB_DEFAULT_HEIGHT,
    STUB_DEFAULT_WIDTH,
};
use crate::errors::CameraError;

use futures::channel::mpsc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Owns the active camera stream and its frame pump
pub struct StreamController {
    active: Option<ActiveStream>,
}

struct ActiveStream {
    device_path: String,
    stop_signal: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    receiver: mpsc::Receiver<CameraFrame>,
    latest: Option<Arc<CameraFrame>>,
}

impl StreamController {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// Acquire a stream from the given device.
    ///
    /// Any previously held stream is stopped first. Fails with
    /// `DeviceUnavailable` when the device cannot be opened; the caller is
    /// expected to degrade (placeholder preview) rather than abort.
    pub fn start(&mut self, device: &CameraDevice) -> Result<(), CameraError> {
        self.stop();

        if !device.is_stub() {
            probe_device(&device.path)?;
        }

        info!(device = %device.path, name = %device.name, "Starting stream");

        let (sender, receiver) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let stop_signal = Arc::new(AtomicBool::new(false));

        let pump_device = device.clone();
        let pump_stop = Arc::clone(&stop_signal);
        let handle = thread::spawn(move || run_pump(pump_device, sender, pump_stop));

        self.active = Some(ActiveStream {
            device_path: device.path.clone(),
            stop_signal,
            handle: Some(handle),
            receiver,
            latest: None,
        });

        Ok(())
    }

    /// Release the held stream: signal the pump, join it, drop the channel.
    /// Safe to call when nothing is held.
    pub fn stop(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        active.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = active.handle.take() {
            if handle.join().is_err() {
                warn!(device = %active.device_path, "Stream pump thread panicked");
            }
        }
        info!(device = %active.device_path, "Stream stopped");
    }

    /// Whether a stream is held and its pump is still alive
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .and_then(|a| a.handle.as_ref())
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Path of the device the held stream came from
    pub fn device_path(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.device_path.as_str())
    }

    /// Drain pending frames from the pump and retain the newest.
    ///
    /// Returns the newly arrived frame, if any. Called from the consumer
    /// side of the single-producer/single-consumer pair.
    pub fn poll_frame(&mut self) -> Option<Arc<CameraFrame>> {
        let active = self.active.as_mut()?;

        let mut newest = None;
        while let Ok(Some(frame)) = active.receiver.try_next() {
            newest = Some(frame);
        }

        let frame = Arc::new(newest?);
        active.latest = Some(Arc::clone(&frame));
        Some(frame)
    }

    /// Read-only snapshot of the most recently polled frame
    pub fn current_frame(&self) -> Option<Arc<CameraFrame>> {
        self.active.as_ref().and_then(|a| a.latest.clone())
    }
}

impl Default for StreamController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        // Teardown must release the camera even if the owner forgot to
        self.stop();
    }
}

/// Fail fast if the device node cannot be opened for capture
fn probe_device(path: &str) -> Result<(), CameraError> {
    let device = v4l::Device::with_path(path)
        .map_err(|e| CameraError::DeviceUnavailable(format!("{}: {}", path, e)))?;
    device
        .query_caps()
        .map_err(|e| CameraError::DeviceUnavailable(format!("{}: {}", path, e)))?;
    Ok(())
}

fn run_pump(device: CameraDevice, sender: mpsc::Sender<CameraFrame>, stop: Arc<AtomicBool>) {
    debug!(device = %device.path, "Pump thread started");

    let result = if device.is_stub() {
        run_stub_pump(&device, sender, &stop)
    } else {
        run_v4l2_pump(&device, sender, &stop)
    };

    match result {
        Ok(()) => debug!(device = %device.path, "Pump thread exiting"),
        Err(err) => warn!(device = %device.path, error = %err, "Pump thread exiting with error"),
    }
}

fn run_v4l2_pump(
    device: &CameraDevice,
    mut sender: mpsc::Sender<CameraFrame>,
    stop: &AtomicBool,
) -> Result<(), CameraError> {
    use v4l::buffer::Type;
    use v4l::io::traits::CaptureStream;
    use v4l::video::Capture;

    let dev = v4l::Device::with_path(&device.path)
        .map_err(|e| CameraError::DeviceUnavailable(format!("{}: {}", device.path, e)))?;

    let mut format = dev
        .format()
        .map_err(|e| CameraError::InitializationFailed(e.to_string()))?;
    format.width = PREFERRED_WIDTH;
    format.height = PREFERRED_HEIGHT;
    format.fourcc = v4l::FourCC::new(b"RGB3");

    // Drivers are free to adjust or reject the request; capture whatever
    // the device actually settled on.
    let format = match dev.set_format(&format) {
        Ok(format) => format,
        Err(err) => {
            warn!(device = %device.path, error = %err, "Format request rejected");
            dev.format()
                .map_err(|e| CameraError::InitializationFailed(e.to_string()))?
        }
    };

    let rgb3 = v4l::FourCC::new(b"RGB3");
    let yuyv = v4l::FourCC::new(b"YUYV");
    let mjpg = v4l::FourCC::new(b"MJPG");
    if format.fourcc != rgb3 && format.fourcc != yuyv && format.fourcc != mjpg {
        return Err(CameraError::InitializationFailed(format!(
            "unsupported pixel format {}",
            format.fourcc
        )));
    }

    let (width, height) = (format.width, format.height);
    info!(
        device = %device.path,
        width,
        height,
        fourcc = %format.fourcc,
        "Stream format negotiated"
    );

    let mut stream = v4l::prelude::MmapStream::with_buffers(&dev, Type::VideoCapture, 4)
        .map_err(|e| CameraError::InitializationFailed(e.to_string()))?;

    while !stop.load(Ordering::SeqCst) {
        let (buf, meta) = stream
            .next()
            .map_err(|_| CameraError::Disconnected)?;
        let used = if meta.bytesused > 0 {
            (meta.bytesused as usize).min(buf.len())
        } else {
            buf.len()
        };
        let payload = &buf[..used];

        let frame = if format.fourcc == rgb3 {
            let expected = (width * height * 3) as usize;
            if payload.len() < expected {
                warn!(device = %device.path, len = payload.len(), expected, "Short RGB frame");
                continue;
            }
            CameraFrame::new(width, height, payload[..expected].to_vec())
        } else if format.fourcc == yuyv {
            if payload.len() < (width * height * 2) as usize {
                warn!(device = %device.path, len = payload.len(), "Short YUYV frame");
                continue;
            }
            CameraFrame::new(width, height, convert::yuyv_to_rgb(payload, width, height))
        } else {
            match convert::mjpg_to_rgb(payload) {
                Ok((w, h, rgb)) => CameraFrame::new(w, h, rgb),
                Err(err) => {
                    warn!(device = %device.path, error = %err, "Dropping undecodable MJPG frame");
                    continue;
                }
            }
        };

        if let Err(err) = sender.try_send(frame) {
            if err.is_disconnected() {
                // Consumer went away; nothing left to pump for
                break;
            }
            // Channel full: the consumer is behind, drop this frame
        }
    }

    Ok(())
}

/// Synthetic frame generator selected by `stub://` paths.
///
/// Produces a deterministic moving gradient at ~30fps so tests and demos
/// can exercise the full pipeline without camera hardware.
fn run_stub_pump(
    device: &CameraDevice,
    mut sender: mpsc::Sender<CameraFrame>,
    stop: &AtomicBool,
) -> Result<(), CameraError> {
    let (width, height) = parse_stub_dimensions(&device.path);
    let mut tick: u64 = 0;

    while !stop.load(Ordering::SeqCst) {
        let frame = CameraFrame::new(width, height, synthetic_pixels(width, height, tick));
        tick = tick.wrapping_add(1);

        if let Err(err) = sender.try_send(frame) {
            if err.is_disconnected() {
                break;
            }
        }
        thread::sleep(Duration::from_millis(33));
    }

    Ok(())
}

/// Dimensions encoded in a stub path (`stub://name@WxH`), or the defaults
fn parse_stub_dimensions(path: &str) -> (u32, u32) {
    let spec = path.strip_prefix(STUB_PREFIX).unwrap_or(path);
    if let Some((_, dims)) = spec.split_once('@')
        && let Some((w, h)) = dims.split_once('x')
        && let (Ok(w), Ok(h)) = (w.parse::<u32>(), h.parse::<u32>())
        && w > 0
        && h > 0
    {
        return (w, h);
    }
    (STUB_DEFAULT_WIDTH, STUB_DEFAULT_HEIGHT)
}

fn synthetic_pixels(width: u32, height: u32, tick: u64) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x as u64 + tick) as u8);
            pixels.push((y as u64 + tick / 2) as u8);
            pixels.push(((x + y) as u64 + tick) as u8);
        }
    }
    pixels
}
