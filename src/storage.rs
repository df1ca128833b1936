// SPDX-License-Identifier: GPL-3.0-only

//! Saving captured images to disk

use crate::compositor::CapturedImage;
use crate::constants::{DEFAULT_SAVE_FOLDER, DOWNLOAD_FILE_NAME};

use std::path::{Path, PathBuf};
use tracing::info;

/// Default directory for downloads: the user's download directory,
/// falling back to pictures, falling back to the working directory
pub fn default_save_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::picture_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_SAVE_FOLDER)
}

/// Write the capture's PNG payload as `captured-image.png` under `dir`.
///
/// The payload is written byte-for-byte; an existing file is replaced.
pub fn save_captured(captured: &CapturedImage, dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(DOWNLOAD_FILE_NAME);
    std::fs::write(&path, &captured.data)?;

    info!(path = %path.display(), bytes = captured.data.len(), "Capture saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::CameraFrame;
    use crate::compositor;

    #[test]
    fn save_writes_exact_payload_under_fixed_name() {
        let frame = CameraFrame::new(8, 8, vec![7; 8 * 8 * 3]);
        let composed = compositor::compose(&frame, None).unwrap();
        let captured = CapturedImage {
            data: compositor::encode_png(&composed).unwrap(),
            width: 8,
            height: 8,
            image: composed,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = save_captured(&captured, dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), DOWNLOAD_FILE_NAME);
        assert_eq!(std::fs::read(&path).unwrap(), captured.data);
    }
}
