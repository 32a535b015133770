//! Encoders for captured rasters

use super::StillFormat;
use crate::{Error, Result};
use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{Delay, DynamicImage, ExtendedColorType, Frame, ImageEncoder, RgbaImage};

/// Palette quantization speed for GIF frames (1 = best, 30 = fastest).
const GIF_QUANTIZE_SPEED: i32 = 10;

pub fn encode_still(img: &RgbaImage, format: StillFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        StillFormat::Png => {
            PngEncoder::new(&mut buf).write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        StillFormat::Jpeg => {
            // JPEG has no alpha channel; the background is already opaque.
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, jpeg_quality).write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
    }
    if buf.is_empty() {
        return Err(Error::EncodingFailure(format!("{:?} encoder produced no output", format)));
    }
    Ok(buf)
}

/// Encode frames, in order, into a looping GIF.
pub fn encode_gif(frames: Vec<RgbaImage>, frame_duration_ms: u64) -> Result<Vec<u8>> {
    if frames.is_empty() {
        return Err(Error::EncodingFailure("no frames to encode".into()));
    }
    let delay_ms = u32::try_from(frame_duration_ms).unwrap_or(u32::MAX);
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut buf, GIF_QUANTIZE_SPEED);
        encoder.set_repeat(Repeat::Infinite)?;
        for frame in frames {
            encoder.encode_frame(Frame::from_parts(
                frame,
                0,
                0,
                Delay::from_numer_denom_ms(delay_ms, 1),
            ))?;
        }
    }
    if buf.is_empty() {
        return Err(Error::EncodingFailure("GIF encoder produced no output".into()));
    }
    Ok(buf)
}

/// Stack frames vertically into one PNG.
pub fn encode_contact_sheet(frames: Vec<RgbaImage>) -> Result<Vec<u8>> {
    let width = frames.iter().map(|f| f.width()).max().unwrap_or(0);
    let height: u32 = frames.iter().map(|f| f.height()).sum();
    if width == 0 || height == 0 {
        return Err(Error::EncodingFailure("no frames to encode".into()));
    }
    let mut sheet = RgbaImage::new(width, height);
    let mut y = 0i64;
    for frame in &frames {
        image::imageops::replace(&mut sheet, frame, 0, y);
        y += frame.height() as i64;
    }
    encode_still(&sheet, StillFormat::Png, 100)
}
