//! Rendering pipeline behind the preview surface: layout → paint → raster.

pub mod layout;
pub mod paint;
pub mod raster;

use crate::{Result, Viewport};
use image::{DynamicImage, RgbaImage};
use scraper::Html;
use std::collections::HashMap;

pub use raster::fingerprint;

/// Parameters of one rasterization.
#[derive(Debug, Clone)]
pub struct RasterRequest {
    /// Device-pixel scale factor
    pub scale: f32,
    /// Opaque background fill
    pub background: [u8; 4],
    /// Images that settled as loaded, keyed by their `src`
    pub images: HashMap<String, DynamicImage>,
}

impl RasterRequest {
    pub fn new(scale: f32, background: [u8; 4]) -> Self {
        Self {
            scale,
            background,
            images: HashMap::new(),
        }
    }
}

/// Lay out, paint and rasterize `document`.
pub fn render(
    document: &Html,
    viewport: Viewport,
    is_hidden: &dyn Fn(usize) -> bool,
    request: &RasterRequest,
) -> Result<RgbaImage> {
    let image_size = |src: &str| request.images.get(src).map(|img| (img.width(), img.height()));
    let ctx = layout::LayoutContext {
        viewport,
        is_hidden,
        image_size: &image_size,
    };
    let nodes = layout::layout_document(document, &ctx);
    let commands = paint::paint_layout(&nodes);
    raster::rasterize(&commands, viewport, request.scale, request.background, &request.images)
}
