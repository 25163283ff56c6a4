//! Offline inspection: grayscale images of spectra and fields, GIF recordings.

use crate::error::{Error, Result};
use crate::field::FieldView;
use image::{GrayImage, Luma};
use num_complex::Complex64;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Two-entry palette: dead cells black, live cells white
const PALETTE: [u8; 6] = [0, 0, 0, 255, 255, 255];

fn image_dims(width: usize, height: usize) -> Result<(u32, u32)> {
    let w = u32::try_from(width).map_err(|_| Error::Export(format!("width {width} too large")))?;
    let h = u32::try_from(height).map_err(|_| Error::Export(format!("height {height} too large")))?;
    Ok((w, h))
}

/// Render magnitudes of a complex buffer, scaled so the largest is white.
pub fn spectrum_image(data: &[Complex64], width: usize, height: usize) -> Result<GrayImage> {
    if data.len() != width * height {
        return Err(Error::Export(format!(
            "buffer of {} values does not match {width}x{height}",
            data.len()
        )));
    }
    let (w, h) = image_dims(width, height)?;
    let max = data.iter().map(|c| c.norm()).fold(0.0_f64, f64::max);

    Ok(GrayImage::from_fn(w, h, |x, y| {
        let value = data[y as usize * width + x as usize].norm();
        let level = if max > 0.0 {
            (value / max * 255.0).round() as u8
        } else {
            0
        };
        Luma([level])
    }))
}

pub fn save_spectrum(data: &[Complex64], width: usize, height: usize, path: &Path) -> Result<()> {
    spectrum_image(data, width, height)?.save(path)?;
    Ok(())
}

/// Render a published generation, live cells white.
pub fn field_image(view: &FieldView) -> Result<GrayImage> {
    let width = view.width();
    let (w, h) = image_dims(width, view.height())?;
    Ok(GrayImage::from_fn(w, h, |x, y| {
        let alive = view.get(y as usize * width + x as usize);
        Luma([if alive { 255 } else { 0 }])
    }))
}

pub fn save_field(view: &FieldView, path: &Path) -> Result<()> {
    field_image(view)?.save(path)?;
    Ok(())
}

/// Appends successive generations to an animated GIF.
pub struct GifRecorder {
    encoder: gif::Encoder<BufWriter<File>>,
    width: u16,
    height: u16,
    /// Frame delay in hundredths of a second
    delay: u16,
    frames: usize,
}

impl GifRecorder {
    pub fn create(path: &Path, width: usize, height: usize, delay: u16) -> Result<Self> {
        let too_large = || Error::Export(format!("{width}x{height} exceeds the GIF frame limit"));
        let w = u16::try_from(width).map_err(|_| too_large())?;
        let h = u16::try_from(height).map_err(|_| too_large())?;

        let file = BufWriter::new(File::create(path)?);
        let mut encoder = gif::Encoder::new(file, w, h, &PALETTE)?;
        encoder.set_repeat(gif::Repeat::Infinite)?;
        Ok(Self {
            encoder,
            width: w,
            height: h,
            delay,
            frames: 0,
        })
    }

    pub fn push(&mut self, view: &FieldView) -> Result<()> {
        if view.width() != self.width as usize || view.height() != self.height as usize {
            return Err(Error::Export("frame size does not match recording".into()));
        }
        let indices: Vec<u8> = view.cells().iter().map(|&alive| u8::from(alive)).collect();
        let frame = gif::Frame {
            width: self.width,
            height: self.height,
            delay: self.delay,
            buffer: Cow::Owned(indices),
            ..gif::Frame::default()
        };
        self.encoder.write_frame(&frame)?;
        self.frames += 1;
        Ok(())
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Write the trailer and flush; returns the number of frames written.
    pub fn finish(self) -> Result<usize> {
        let frames = self.frames;
        let mut writer = self.encoder.into_inner()?;
        writer.flush()?;
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::patterns::Pattern;
    use tempfile::tempdir;

    #[test]
    fn test_spectrum_normalized_by_max_magnitude() {
        let data = vec![
            Complex64::new(0.0, 0.0),
            Complex64::new(3.0, 4.0),
            Complex64::new(-10.0, 0.0),
            Complex64::new(0.0, 5.0),
        ];
        let img = spectrum_image(&data, 2, 2).unwrap();
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(1, 0)[0], 128);
        assert_eq!(img.get_pixel(0, 1)[0], 255);
        assert_eq!(img.get_pixel(1, 1)[0], 128);
    }

    #[test]
    fn test_zero_spectrum_is_black() {
        let data = vec![Complex64::new(0.0, 0.0); 6];
        let img = spectrum_image(&data, 3, 2).unwrap();
        assert!(img.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_mismatched_buffer_rejected() {
        let data = vec![Complex64::new(1.0, 0.0); 5];
        assert!(matches!(spectrum_image(&data, 3, 2), Err(Error::Export(_))));
    }

    #[test]
    fn test_kernel_png_round_trip() {
        let engine = Engine::new(32, 24).unwrap();
        let kernel = engine.kernel().unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("kernel.png");

        save_spectrum(kernel.as_slice(), kernel.width(), kernel.height(), &path).unwrap();

        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (32, 24));
        // The DC term carries the full neighbour count and is the brightest.
        assert_eq!(img.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_field_image_marks_live_cells() {
        let mut engine = Engine::new(10, 10).unwrap();
        engine.seed(Pattern::Block).unwrap();
        let img = field_image(&engine.view()).unwrap();
        assert_eq!(img.get_pixel(5, 5)[0], 255);
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.pixels().filter(|p| p[0] == 255).count(), 4);
    }

    #[test]
    fn test_gif_recording() {
        let mut engine = Engine::new(16, 16).unwrap();
        engine.seed(Pattern::Glider).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("glider.gif");

        let mut recorder = GifRecorder::create(&path, 16, 16, 5).unwrap();
        for _ in 0..4 {
            recorder.push(&engine.view()).unwrap();
            engine.step().unwrap();
        }
        assert_eq!(recorder.frames(), 4);
        assert_eq!(recorder.finish().unwrap(), 4);

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
    }

    #[test]
    fn test_gif_rejects_wrong_frame_size() {
        let engine = Engine::new(8, 8).unwrap();
        let dir = tempdir().unwrap();
        let mut recorder = GifRecorder::create(&dir.path().join("x.gif"), 16, 16, 5).unwrap();
        assert!(recorder.push(&engine.view()).is_err());
    }
}
