// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photo booth

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera/stream errors
    Camera(CameraError),
    /// Capture/composite errors
    Capture(CaptureError),
    /// Overlay asset errors
    Overlay(OverlayError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// No camera matches the requested facing, or the device refused to open
    DeviceUnavailable(String),
    /// Device listing query failed (downgraded to "assume single camera")
    EnumerationFailed(String),
    /// Stream initialization failed after the device was selected
    InitializationFailed(String),
    /// Camera stopped delivering frames during operation
    Disconnected,
}

/// Capture/composite errors
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// Capture attempted before the stream produced dimensions
    NoFrameAvailable,
    /// PNG encoding failed
    EncodingFailed(String),
}

/// Overlay asset errors
#[derive(Debug, Clone)]
pub enum OverlayError {
    /// Overlay asset failed to load or decode
    LoadFailed { name: String, reason: String },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Overlay(e) => write!(f, "Overlay error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::DeviceUnavailable(msg) => write!(f, "Device unavailable: {}", msg),
            CameraError::EnumerationFailed(msg) => write!(f, "Enumeration failed: {}", msg),
            CameraError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            CameraError::Disconnected => write!(f, "Camera disconnected"),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoFrameAvailable => write!(f, "No frame available for capture"),
            CaptureError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayError::LoadFailed { name, reason } => {
                write!(f, "Overlay '{}' failed to load: {}", name, reason)
            }
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for OverlayError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<OverlayError> for AppError {
    fn from(err: OverlayError) -> Self {
        AppError::Overlay(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}
