/// Rasterizer: executes paint commands onto an RGBA canvas

use super::layout::{CHAR_WIDTH, LINE_HEIGHT};
use super::paint::PaintCommand;
use crate::{Error, Result, Viewport};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Glyph boxes leave a one pixel gutter inside the character cell.
const GLYPH_WIDTH: u32 = CHAR_WIDTH - 2;
const GLYPH_HEIGHT: u32 = LINE_HEIGHT - 1;

/// Largest canvas side, in device pixels, the rasterizer will allocate.
pub const MAX_CANVAS_SIDE: i64 = 16_384;

/// Execute `commands` on a `viewport × scale` canvas filled with `background`.
pub fn rasterize(
    commands: &[PaintCommand],
    viewport: Viewport,
    scale: f32,
    background: [u8; 4],
    images: &HashMap<String, DynamicImage>,
) -> Result<RgbaImage> {
    let width = scaled(viewport.width as i64, scale);
    let height = scaled(viewport.height as i64, scale);
    if width <= 0 || height <= 0 {
        return Err(Error::EncodingFailure(format!(
            "empty raster ({}x{} at {}x)",
            viewport.width, viewport.height, scale
        )));
    }
    let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
        return Err(oversized(viewport, scale));
    };
    if i64::from(width) > MAX_CANVAS_SIDE || i64::from(height) > MAX_CANVAS_SIDE {
        return Err(oversized(viewport, scale));
    }
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba(background));

    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect {
                x,
                y,
                width,
                height,
                rgba,
            } => fill(&mut canvas, *x as i64, *y as i64, *width as i64, *height as i64, scale, *rgba),
            PaintCommand::Text {
                x,
                y,
                text,
                scale: text_scale,
                rgba,
            } => {
                let s = *text_scale as i64;
                for (row, line) in text.lines().enumerate() {
                    for (col, ch) in line.chars().enumerate() {
                        if ch.is_whitespace() {
                            continue;
                        }
                        let gx = *x as i64 + col as i64 * CHAR_WIDTH as i64 * s;
                        let gy = *y as i64 + row as i64 * LINE_HEIGHT as i64 * s;
                        fill(
                            &mut canvas,
                            gx,
                            gy,
                            GLYPH_WIDTH as i64 * s,
                            GLYPH_HEIGHT as i64 * s,
                            scale,
                            *rgba,
                        );
                    }
                }
            }
            PaintCommand::Image {
                x,
                y,
                width,
                height,
                src,
            } => {
                let Some(img) = images.get(src) else { continue };
                let w = scaled(*width as i64, scale).clamp(1, MAX_CANVAS_SIDE) as u32;
                let h = scaled(*height as i64, scale).clamp(1, MAX_CANVAS_SIDE) as u32;
                let resized = img.resize_exact(w, h, FilterType::Triangle).to_rgba8();
                imageops::overlay(
                    &mut canvas,
                    &resized,
                    scaled(*x as i64, scale),
                    scaled(*y as i64, scale),
                );
            }
        }
    }

    Ok(canvas)
}

/// Content-addressed fingerprint of a raster (SHA-256, hex).
pub fn fingerprint(img: &RgbaImage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(img.width().to_le_bytes());
    hasher.update(img.height().to_le_bytes());
    hasher.update(img.as_raw());
    hex::encode(hasher.finalize())
}

fn oversized(viewport: Viewport, scale: f32) -> Error {
    Error::EncodingFailure(format!(
        "raster too large ({}x{} at {}x, max side {})",
        viewport.width, viewport.height, scale, MAX_CANVAS_SIDE
    ))
}

fn scaled(v: i64, scale: f32) -> i64 {
    (v as f64 * scale as f64).round() as i64
}

fn fill(canvas: &mut RgbaImage, x: i64, y: i64, w: i64, h: i64, scale: f32, rgba: [u8; 4]) {
    let x0 = scaled(x, scale).max(0);
    let y0 = scaled(y, scale).max(0);
    let x1 = scaled(x + w, scale).min(canvas.width() as i64);
    let y1 = scaled(y + h, scale).min(canvas.height() as i64);
    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px as u32, py as u32, Rgba(rgba));
        }
    }
}
