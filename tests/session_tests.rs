// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture session state machine, run against
//! synthetic stub devices so no camera hardware is needed

use framebooth::backends::camera::types::{CameraDevice, CameraFacing};
use framebooth::compositor;
use framebooth::session::CaptureSession;

use std::time::{Duration, Instant};

fn front_stub() -> CameraDevice {
    // Default stub dimensions are 1280x720
    CameraDevice::stub("front", Some(CameraFacing::Front))
}

fn back_stub() -> CameraDevice {
    CameraDevice::stub("back@640x480", Some(CameraFacing::Back))
}

fn wait_for_frame(session: &mut CaptureSession) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while session.poll_frame().is_none() {
        assert!(Instant::now() < deadline, "no frame before deadline");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[tokio::test]
async fn capture_with_overlay_reaches_reviewing_with_square_image() {
    let mut session =
        CaptureSession::with_devices(vec![front_stub()], CameraFacing::Front, Some(0));
    session.start().unwrap();
    wait_for_frame(&mut session);

    session.capture().await.unwrap();

    assert!(session.state().is_reviewing());
    let captured = session.state().captured().unwrap();
    // 1280x720 source center-crops to a 720 square
    assert_eq!((captured.width, captured.height), (720, 720));
    assert_eq!(&captured.data[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn capture_before_first_frame_fails_and_stays_live() {
    let mut session =
        CaptureSession::with_devices(vec![front_stub()], CameraFacing::Front, Some(0));
    session.start().unwrap();

    // No frame polled yet: the stream has not delivered dimensions
    let result = session.capture().await;

    assert!(result.is_err());
    assert!(session.state().is_live());
    assert!(session.state().captured().is_none());
}

#[tokio::test]
async fn capture_without_overlay_is_the_bare_crop() {
    let mut session =
        CaptureSession::with_devices(vec![front_stub()], CameraFacing::Front, None);
    session.start().unwrap();
    wait_for_frame(&mut session);

    let frame = session.current_frame().unwrap();
    session.capture().await.unwrap();

    let captured = session.state().captured().unwrap();
    let expected = compositor::compose(&frame, None).unwrap();
    assert_eq!(captured.image.as_raw(), expected.as_raw());
}

#[tokio::test]
async fn reset_returns_to_live_with_running_stream() {
    let mut session =
        CaptureSession::with_devices(vec![front_stub()], CameraFacing::Front, Some(0));
    session.start().unwrap();
    wait_for_frame(&mut session);
    session.capture().await.unwrap();
    assert!(session.state().is_reviewing());

    session.reset().unwrap();

    assert!(session.state().is_live());
    assert!(session.state().captured().is_none());
    assert!(session.is_stream_running());
    // Preview keeps flowing after the reset
    wait_for_frame(&mut session);
}

#[tokio::test]
async fn download_writes_the_exact_payload_under_the_fixed_name() {
    let mut session =
        CaptureSession::with_devices(vec![front_stub()], CameraFacing::Front, Some(0));
    session.start().unwrap();
    wait_for_frame(&mut session);
    session.capture().await.unwrap();

    let payload = session.state().captured().unwrap().data.clone();
    let dir = tempfile::tempdir().unwrap();

    let path = session.download(dir.path()).unwrap();

    assert_eq!(path.file_name().unwrap(), "captured-image.png");
    assert_eq!(std::fs::read(&path).unwrap(), payload);
    // Downloading does not leave the review state
    assert!(session.state().is_reviewing());
}

#[tokio::test]
async fn download_is_rejected_outside_review() {
    let session = CaptureSession::with_devices(vec![front_stub()], CameraFacing::Front, Some(0));
    let dir = tempfile::tempdir().unwrap();
    assert!(session.download(dir.path()).is_err());
}

#[test]
fn flip_with_a_single_camera_is_a_noop() {
    let mut session =
        CaptureSession::with_devices(vec![front_stub()], CameraFacing::Front, Some(0));
    session.start().unwrap();
    assert!(!session.has_multiple_cameras());

    session.flip_camera().unwrap();

    assert_eq!(session.facing(), CameraFacing::Front);
    assert!(session.is_stream_running());
}

#[test]
fn flip_with_two_cameras_switches_the_stream() {
    let mut session = CaptureSession::with_devices(
        vec![front_stub(), back_stub()],
        CameraFacing::Front,
        Some(0),
    );
    session.start().unwrap();
    wait_for_frame(&mut session);
    assert!(session.has_multiple_cameras());

    session.flip_camera().unwrap();
    assert_eq!(session.facing(), CameraFacing::Back);

    // The superseding stream delivers the back camera's dimensions
    wait_for_frame(&mut session);
    let frame = session.current_frame().unwrap();
    assert_eq!((frame.width, frame.height), (640, 480));

    session.flip_camera().unwrap();
    assert_eq!(session.facing(), CameraFacing::Front);
}

#[tokio::test]
async fn overlay_selection_is_frozen_while_reviewing() {
    let mut session =
        CaptureSession::with_devices(vec![front_stub()], CameraFacing::Front, Some(0));
    session.start().unwrap();
    wait_for_frame(&mut session);
    session.capture().await.unwrap();

    let before = session.selector().current_index();
    session.cycle_overlay();
    assert_eq!(session.selector().current_index(), before);

    session.reset().unwrap();
    session.cycle_overlay();
    assert_ne!(session.selector().current_index(), before);
}

#[test]
fn session_without_devices_degrades_instead_of_crashing() {
    let mut session = CaptureSession::with_devices(Vec::new(), CameraFacing::Front, Some(0));
    assert!(!session.has_multiple_cameras());
    assert!(session.start().is_err());
    // Still a usable (if dormant) session
    assert!(session.state().is_live());
    assert!(session.current_frame().is_none());
}
