use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::ImageEncoder;
use snip_core::CaptureBackend;
use snip_types::{CaptureError, RasterImage, Region};
use xcap::Monitor;

/// Screen capture through `xcap`
#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenCapture;

impl ScreenCapture {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CaptureBackend for ScreenCapture {
    async fn capture(&self, region: Region) -> Result<RasterImage, CaptureError> {
        tokio::task::spawn_blocking(move || capture_region(region))
            .await
            .map_err(|e| CaptureError::Backend(format!("capture task failed: {e}")))?
    }
}

fn frame_of(monitor: &Monitor) -> Region {
    Region::new(monitor.x(), monitor.y(), monitor.width(), monitor.height())
}

/// Frames of every attached monitor in screen coordinates
pub fn monitor_frames() -> Result<Vec<Region>> {
    let monitors = Monitor::all().context("Failed to get monitors")?;
    Ok(monitors.iter().map(frame_of).collect())
}

/// Frame of the primary monitor, or the first one if none is flagged primary
pub fn primary_frame() -> Option<Region> {
    let monitors = match Monitor::all() {
        Ok(monitors) => monitors,
        Err(e) => {
            tracing::error!("failed to enumerate monitors: {}", e);
            return None;
        }
    };
    monitors
        .iter()
        .find(|m| m.is_primary())
        .or(monitors.first())
        .map(frame_of)
}

/// Capture `region` (screen coordinates) from the monitor that encloses it
fn capture_region(region: Region) -> Result<RasterImage, CaptureError> {
    let start = Instant::now();
    let monitors = Monitor::all().map_err(|e| CaptureError::Backend(e.to_string()))?;
    if monitors.is_empty() {
        return Err(CaptureError::NoDisplay);
    }

    let monitor = monitors
        .iter()
        .find(|m| frame_of(m).encloses(&region))
        .ok_or(CaptureError::OutOfBounds(region))?;
    let frame = frame_of(monitor);

    let image = monitor
        .capture_image()
        .map_err(|e| CaptureError::Backend(format!("Failed to capture screen: {e}")))?;
    let captured_ms = start.elapsed().as_millis() as u64;

    // Captured pixels may be physical while monitor geometry is logical
    let crop = scale_to_image(region, frame, image.width(), image.height());
    let cropped = xcap::image::imageops::crop_imm(&image, crop.x as u32, crop.y as u32, crop.width, crop.height)
        .to_image();

    tracing::debug!(
        %region,
        captured_ms,
        total_ms = start.elapsed().as_millis() as u64,
        "region captured"
    );
    Ok(RasterImage::new(
        cropped.width(),
        cropped.height(),
        cropped.into_raw(),
    ))
}

/// Map `region` into the pixel space of an `image_width × image_height`
/// capture of `frame`, clamped to the image bounds
fn scale_to_image(region: Region, frame: Region, image_width: u32, image_height: u32) -> Region {
    let sx = image_width as f64 / frame.width.max(1) as f64;
    let sy = image_height as f64 / frame.height.max(1) as f64;

    let x = ((region.x - frame.x) as f64 * sx).round().max(0.0) as u32;
    let y = ((region.y - frame.y) as f64 * sy).round().max(0.0) as u32;
    let x = x.min(image_width);
    let y = y.min(image_height);
    let width = ((region.width as f64 * sx).round() as u32).min(image_width - x);
    let height = ((region.height as f64 * sy).round() as u32).min(image_height - y);

    Region::new(x as i32, y as i32, width, height)
}

/// Encode a raster as PNG, the format the OCR decoder expects
pub fn encode_png(raster: &RasterImage) -> Result<Vec<u8>> {
    let expected = raster.width as usize * raster.height as usize * 4;
    anyhow::ensure!(
        raster.data.len() == expected,
        "RGBA buffer holds {} bytes, expected {}",
        raster.data.len(),
        expected
    );

    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(
            &raster.data,
            raster.width,
            raster.height,
            image::ExtendedColorType::Rgba8,
        )
        .context("Failed to encode PNG")?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_is_identity_at_one_to_one() {
        let frame = Region::new(1920, 0, 1280, 1024);
        let region = Region::new(2000, 100, 300, 50);
        assert_eq!(
            scale_to_image(region, frame, 1280, 1024),
            Region::new(80, 100, 300, 50)
        );
    }

    #[test]
    fn scaling_follows_device_pixel_ratio() {
        let frame = Region::new(0, 0, 1440, 900);
        let region = Region::new(100, 50, 200, 40);
        assert_eq!(
            scale_to_image(region, frame, 2880, 1800),
            Region::new(200, 100, 400, 80)
        );
    }

    #[test]
    fn scaling_clamps_to_image() {
        let frame = Region::new(0, 0, 100, 100);
        let region = Region::new(90, 90, 50, 50);
        assert_eq!(
            scale_to_image(region, frame, 100, 100),
            Region::new(90, 90, 10, 10)
        );
    }

    #[test]
    fn png_has_signature() {
        let raster = RasterImage::new(2, 2, vec![255; 16]);
        let png = encode_png(&raster).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn png_rejects_short_buffer() {
        let raster = RasterImage::new(4, 4, vec![0; 3]);
        assert!(encode_png(&raster).is_err());
    }
}
