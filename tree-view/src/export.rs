//! Writing frames to disk.
//!
//! The composite is transparent outside the tree, so every export is first
//! flattened onto the viewer's background color.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage, imageops};

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Image(image::ImageError),
    /// Asked to save a frame sequence with no frames in it.
    NoFrames,
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "I/O error: {}", e),
            ExportError::Image(e) => write!(f, "Cannot encode image: {}", e),
            ExportError::NoFrames => write!(f, "No frames recorded"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::Image(err)
    }
}

/// `img` composited over an opaque `background`.
pub fn flatten(img: &RgbaImage, background: Rgba<u8>) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(img.width(), img.height(), background);
    imageops::overlay(&mut out, img, 0, 0);
    out
}

/// Saves one flattened frame as PNG, creating parent directories.
pub fn save_png(path: &Path, img: &RgbaImage, background: Rgba<u8>) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    flatten(img, background).save(path)?;
    log::info!("saved {}", path.display());
    Ok(())
}

/// Path of frame `index` inside `dir`.
pub fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("frame_{:05}.png", index))
}

/// Saves already-flattened frames as `frame_00000.png`, `frame_00001.png`, ...
/// Returns how many were written.
pub fn save_frames(dir: &Path, frames: &[RgbaImage]) -> Result<usize, ExportError> {
    if frames.is_empty() {
        return Err(ExportError::NoFrames);
    }
    fs::create_dir_all(dir)?;
    for (i, frame) in frames.iter().enumerate() {
        frame.save(frame_path(dir, i))?;
    }
    log::info!("saved {} frames to {}", frames.len(), dir.display());
    Ok(frames.len())
}
