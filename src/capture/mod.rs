//! Frame capture and encoding.
//!
//! Still capture reads the current state of a [`RenderSurface`]; animated
//! capture walks a slide set, showing one slide at a time and capturing a
//! still after each toggle. The two suspension points of the pipeline are
//! explicit methods, [`Exporter::await_images_settled`] and
//! [`Exporter::await_layout_settle`], so each can be exercised on its own and
//! the settle delay can run against a fake [`Clock`].

mod animated;
pub mod encode;

pub use animated::SlideSet;

use crate::rendering::{self, RasterRequest};
use crate::{CaptureConfig, Download, Error, RenderSurface, ResourceLoader, Result};
use futures::future::join_all;
use image::{DynamicImage, RgbaImage};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Still image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StillFormat {
    /// Lossless
    Png,
    /// Lossy, encoded at the configured fixed quality
    Jpeg,
}

impl StillFormat {
    pub fn extension(self) -> &'static str {
        match self {
            StillFormat::Png => "png",
            StillFormat::Jpeg => "jpg",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            StillFormat::Png => "image/png",
            StillFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Output of the animated export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationFormat {
    /// Looping animated GIF
    #[default]
    Gif,
    /// Static fallback: all frames stacked vertically in one PNG
    ContactSheet,
}

impl AnimationFormat {
    pub fn extension(self) -> &'static str {
        match self {
            AnimationFormat::Gif => "gif",
            AnimationFormat::ContactSheet => "png",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            AnimationFormat::Gif => "image/gif",
            AnimationFormat::ContactSheet => "image/png",
        }
    }
}

/// Time source for the settle delay between slide toggles.
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// How one embedded image settled.
#[derive(Debug, Clone)]
pub enum Settlement {
    Loaded(DynamicImage),
    Errored(String),
}

/// Result of [`Exporter::await_images_settled`], keyed by `src`.
#[derive(Debug, Clone, Default)]
pub struct SettledImages {
    pub entries: Vec<(String, Settlement)>,
}

impl SettledImages {
    pub fn loaded(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, s)| matches!(s, Settlement::Loaded(_)))
            .count()
    }

    pub fn errored(&self) -> usize {
        self.entries.len() - self.loaded()
    }

    fn into_loaded(self) -> HashMap<String, DynamicImage> {
        self.entries
            .into_iter()
            .filter_map(|(src, s)| match s {
                Settlement::Loaded(img) => Some((src, img)),
                Settlement::Errored(_) => None,
            })
            .collect()
    }
}

/// Clears the busy flag when dropped, whatever path the capture took.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs captures against a surface. Only one capture may run at a time; a
/// second request while one is active fails with [`Error::Busy`].
pub struct Exporter<L, C = TokioClock> {
    config: CaptureConfig,
    loader: L,
    clock: C,
    busy: AtomicBool,
}

impl<L: ResourceLoader, C: Clock> Exporter<L, C> {
    pub fn new(config: CaptureConfig, loader: L, clock: C) -> Self {
        Self {
            config,
            loader,
            clock,
            busy: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<BusyGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::Busy);
        }
        Ok(BusyGuard(&self.busy))
    }

    /// Capture the surface as a single still image.
    pub async fn capture_still<S: RenderSurface>(&self, surface: &S, format: StillFormat) -> Result<Download> {
        let _guard = self.begin()?;
        let raster = self.still_raster(surface).await?;
        let bytes = encode::encode_still(&raster, format, self.config.jpeg_quality)?;
        let download = Download {
            filename: format!("{}.{}", self.config.still_file_stem, format.extension()),
            mime: format.mime(),
            bytes,
        };
        info!(
            "captured still {} ({}x{}, {} bytes)",
            download.filename,
            raster.width(),
            raster.height(),
            download.bytes.len()
        );
        Ok(download)
    }

    /// Capture every slide of the configured slide container as one frame of
    /// an animation. Slide visibility is restored before this returns, on
    /// success and on failure.
    pub async fn capture_animated<S: RenderSurface>(&self, surface: &mut S) -> Result<Download> {
        let _guard = self.begin()?;
        let frames = self.capture_frames(surface).await?;
        let count = frames.len();
        let format = self.config.animation_format;
        let bytes = self.finalize(frames).await?;
        let download = Download {
            filename: format!("{}.{}", self.config.animation_file_stem, format.extension()),
            mime: format.mime(),
            bytes,
        };
        info!(
            "captured animation {} ({} frames, {} bytes)",
            download.filename,
            count,
            download.bytes.len()
        );
        Ok(download)
    }

    /// Rasterize each slide in order without encoding. Visibility is restored
    /// before returning.
    pub async fn capture_frames<S: RenderSurface>(&self, surface: &mut S) -> Result<Vec<RgbaImage>> {
        let slides = SlideSet::locate(surface, &self.config.slide_container_selector)?;
        let result = animated::record(self, surface, &slides).await;
        slides.restore(surface);
        if let Err(e) = &result {
            warn!("animated capture failed, slides restored: {}", e);
        }
        result
    }

    /// Suspension point: wait until every embedded image has either loaded or
    /// errored. Errors are recorded, never propagated.
    pub async fn await_images_settled<S: RenderSurface>(&self, surface: &S) -> SettledImages {
        let sources = surface.image_sources();
        let allow = self.config.allow_cross_origin;
        let loads = sources.iter().map(|src| async move {
            let settlement = match self.loader.load(src, allow).await {
                Ok(bytes) => match image::load_from_memory(&bytes) {
                    Ok(img) => Settlement::Loaded(img),
                    Err(e) => Settlement::Errored(e.to_string()),
                },
                Err(e) => Settlement::Errored(e.to_string()),
            };
            if let Settlement::Errored(reason) = &settlement {
                warn!("image {} settled with error: {}", src, reason);
            }
            (src.clone(), settlement)
        });
        let entries = join_all(loads).await;
        let settled = SettledImages { entries };
        debug!(
            "images settled: {} loaded, {} errored",
            settled.loaded(),
            settled.errored()
        );
        settled
    }

    /// Suspension point: give layout and paint one settle interval.
    pub async fn await_layout_settle(&self) {
        self.clock
            .sleep(Duration::from_millis(self.config.settle_ms))
            .await
    }

    async fn still_raster<S: RenderSurface>(&self, surface: &S) -> Result<RgbaImage> {
        surface.content_root()?;
        let settled = self.await_images_settled(surface).await;
        let request = RasterRequest {
            scale: self.config.scale_factor,
            background: self.config.background,
            images: settled.into_loaded(),
        };
        let raster = surface.rasterize(&request)?;
        debug!("rasterized {}x{} ({})", raster.width(), raster.height(), rendering::fingerprint(&raster));
        Ok(raster)
    }

    async fn finalize(&self, frames: Vec<RgbaImage>) -> Result<Vec<u8>> {
        let format = self.config.animation_format;
        let frame_ms = self.config.frame_duration_ms;
        tokio::task::spawn_blocking(move || match format {
            AnimationFormat::Gif => encode::encode_gif(frames, frame_ms),
            AnimationFormat::ContactSheet => encode::encode_contact_sheet(frames),
        })
        .await
        .map_err(|e| Error::EncodingFailure(format!("encoder task failed: {}", e)))?
    }
}
