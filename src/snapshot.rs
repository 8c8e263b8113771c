use std::path::Path;

use image::error::{ImageError, ParameterError, ParameterErrorKind};
use image::{ImageBuffer, Rgba};

use crate::error::TracerResult;
use crate::renderer::Frame;

pub fn frame_image(frame: &Frame) -> TracerResult<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    ImageBuffer::from_raw(frame.width, frame.height, frame.pixels.clone()).ok_or_else(|| {
        ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        ))
        .into()
    })
}

/// Writes the frame as an RGBA PNG, top row first.
pub fn save_png(frame: &Frame, path: &Path) -> TracerResult<()> {
    frame_image(frame)?.save_with_format(path, image::ImageFormat::Png)?;

    log::info!("saved {}x{} frame to {}", frame.width, frame.height, path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn gradient(width: u32, height: u32) -> Frame {
        let pixels = (0..width * height)
            .flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 7, 255])
            .collect();
        Frame {
            width,
            height,
            pixels,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn png_keeps_size_and_pixels() {
        let frame = gradient(20, 10);
        let path = std::env::temp_dir().join(format!("snapshot-{}.png", std::process::id()));

        save_png(&frame, &path).unwrap();
        let image = image::open(&path).unwrap().to_rgba8();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(image.dimensions(), (20, 10));
        assert_eq!(image.get_pixel(3, 2).0, frame.pixel(3, 2));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let mut frame = gradient(4, 4);
        frame.pixels.truncate(10);
        assert!(matches!(
            frame_image(&frame),
            Err(crate::error::TracerError::Snapshot(_))
        ));
    }
}
