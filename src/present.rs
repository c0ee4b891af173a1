use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::error::RenderError;
use crate::pipeline::buffer::{ColorSurface, DepthBuffer};

/// Receiver of finished frames: a window, a file or a test recorder.
pub trait Present {
    type Error;

    fn present(&mut self, surface: &ColorSurface) -> Result<(), Self::Error>;
}

/// Writes every presented frame to the same image file, so the last frame wins.
pub struct PngWriter {
    path: PathBuf,
    frames_written: usize,
}

impl PngWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        return Self { path: path.into(), frames_written: 0 };
    }

    pub fn frames_written(&self) -> usize {
        return self.frames_written;
    }
}

impl Present for PngWriter {
    type Error = RenderError;

    fn present(&mut self, surface: &ColorSurface) -> Result<(), RenderError> {
        save_rgb8(&self.path, surface.width, surface.height, surface.as_render_data().to_vec())?;
        self.frames_written += 1;
        return Ok(());
    }
}

/// Saves the normalized depth picture (near is bright).
pub fn save_depth(path: &Path, depth: &DepthBuffer) -> Result<(), RenderError> {
    return save_rgb8(path, depth.width, depth.height, depth.as_depth_data());
}

fn save_rgb8(path: &Path, width: u32, height: u32, data: Vec<u8>) -> Result<(), RenderError> {
    let len = data.len();
    let Some(image) = RgbImage::from_raw(width, height, data) else {
        return Err(RenderError::ImageSize { width, height, len });
    };
    image.save(path)?;
    log::debug!("wrote {}x{} image to {}", width, height, path.display());
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::buffer::Framebuffer;
    use crate::pipeline::rasterizer::Fragment;
    use crate::util::Color;

    #[test]
    fn png_round_trip_keeps_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut framebuffer = Framebuffer::new(4, 3, Color::new(0.0, 0.0, 0.0));
        framebuffer.point(&Fragment::point(2, 1, 0.5, Color::new(1.0, 0.0, 0.0)));

        let mut writer = PngWriter::new(&path);
        writer.present(&framebuffer.color).unwrap();
        assert_eq!(writer.frames_written(), 1);

        let image = image::open(&path).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(image.get_pixel(2, 1).0, [255, 0, 0]);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn depth_picture_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("depth.png");
        let mut framebuffer = Framebuffer::new(2, 2, Color::new(0.0, 0.0, 0.0));
        framebuffer.point(&Fragment::point(0, 0, 0.25, Color::new(1.0, 1.0, 1.0)));
        save_depth(&path, &framebuffer.depth).unwrap();
        let image = image::open(&path).unwrap().to_rgb8();
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(image.get_pixel(1, 1).0, [0, 0, 0]);
    }
}
