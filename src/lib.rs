//! Pagesmith
//!
//! The core of a live HTML/CSS editor: two text buffers are stitched into one
//! document, written into an isolated rendering surface for preview, and read
//! back out of that surface as a standalone `.html` file, a still image
//! (PNG/JPEG) or an animated GIF of a slide set.
//!
//! # Components
//!
//! - **Assembler** ([`assemble`]): substring-driven document assembly
//! - **Rendering surface** ([`surface`]): replace-entire-document preview target
//! - **Capture** ([`capture`]): still and animated capture with explicit
//!   suspension points (`await_images_settled`, `await_layout_settle`)
//! - **Workbench** ([`workbench`]): editor session + surface + exporter
//!
//! # Example
//!
//! ```
//! let doc = pagesmith::assemble("<div>Hi</div>", "body{color:red}");
//! assert!(doc.contains("<style data-pagesmith>body{color:red}</style>"));
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod error;
pub use error::{Error, Result};

pub mod assemble;
pub use assemble::{
    assemble, assemble_for_export, Assembler, InjectionPolicy, Target, STYLE_MARKER,
};

pub mod session;
pub use session::{BufferKind, EditorSession};

pub mod notice;
pub use notice::{Notice, NoticeLevel};

// Preview target and the raster pipeline behind it
pub mod surface;
pub use surface::{ElementId, HtmlSurface, RenderSurface, Visibility};

pub mod rendering;

pub mod resources;
pub use resources::{FsResourceLoader, ResourceLoader};

pub mod capture;
pub use capture::{AnimationFormat, Clock, Exporter, StillFormat, TokioClock};

// Async facade tying the pieces together
pub mod workbench;
pub use workbench::{export_notice, Workbench};

/// Viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Device presets offered by the preview panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMode {
    /// Uses the configured viewport as-is
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl DeviceMode {
    /// Viewport for this device; `desktop` is used for [`DeviceMode::Desktop`].
    pub fn viewport(self, desktop: Viewport) -> Viewport {
        match self {
            DeviceMode::Desktop => desktop,
            DeviceMode::Tablet => Viewport {
                width: 768,
                height: 1024,
            },
            DeviceMode::Mobile => Viewport {
                width: 375,
                height: 667,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeviceMode::Desktop => "desktop",
            DeviceMode::Tablet => "tablet",
            DeviceMode::Mobile => "mobile",
        }
    }
}

/// Upper bound accepted for [`CaptureConfig::scale_factor`]
pub const MAX_SCALE_FACTOR: f32 = 8.0;

/// Configuration for still and animated capture
///
/// The defaults mirror the editor's export buttons: 2× device pixels on an
/// opaque white background, a 300ms settle interval between slide toggles and
/// one second per animation frame.
///
/// # Examples
///
/// ```
/// let cfg = pagesmith::CaptureConfig::default();
/// assert_eq!(cfg.scale_factor, 2.0);
/// assert_eq!(cfg.slide_container_selector, "[data-slides]");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Viewport used for the desktop device
    pub viewport: Viewport,
    /// Device-pixel upscale factor applied when rasterizing
    pub scale_factor: f32,
    /// Opaque background fill (RGBA)
    pub background: [u8; 4],
    /// Delay after each slide toggle before the frame is captured
    pub settle_ms: u64,
    /// Display duration of each animation frame
    pub frame_duration_ms: u64,
    /// Quality used for lossy stills (1-100)
    pub jpeg_quality: u8,
    /// Selector of the element whose children are the animation frames
    pub slide_container_selector: String,
    /// Output format of the animated export
    pub animation_format: AnimationFormat,
    /// Whether images from other origins may be loaded while capturing
    pub allow_cross_origin: bool,
    /// Filename stem of still exports
    pub still_file_stem: String,
    /// Filename stem of animated exports
    pub animation_file_stem: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            scale_factor: 2.0,
            background: [255, 255, 255, 255],
            settle_ms: 300,
            frame_duration_ms: 1000,
            jpeg_quality: 95,
            slide_container_selector: "[data-slides]".to_string(),
            animation_format: AnimationFormat::Gif,
            allow_cross_origin: true,
            still_file_stem: "capture".to_string(),
            animation_file_stem: "carousel-animation".to_string(),
        }
    }
}

impl CaptureConfig {
    /// Reject settings the rasterizer or encoders cannot honor.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale_factor.is_finite()
            && self.scale_factor > 0.0
            && self.scale_factor <= MAX_SCALE_FACTOR)
        {
            return Err(Error::ConfigError(format!(
                "scale_factor must be within (0, {}], got {}",
                MAX_SCALE_FACTOR, self.scale_factor
            )));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError("viewport must not be empty".into()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::ConfigError(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if scraper::Selector::parse(&self.slide_container_selector).is_err() {
            return Err(Error::ConfigError(format!(
                "invalid slide container selector `{}`",
                self.slide_container_selector
            )));
        }
        Ok(())
    }
}

/// Configuration for the editor workbench
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// How pre-existing `<style>`/`<link>` tags affect injection
    pub injection_policy: InjectionPolicy,
    /// Filename of the standalone document download
    pub export_file_name: String,
    /// `<title>` used when a head has to be synthesized for export
    pub export_title: String,
    /// `<title>` used when a head has to be synthesized for preview
    pub preview_title: String,
    pub capture: CaptureConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            injection_policy: InjectionPolicy::default(),
            export_file_name: "my-webpage.html".to_string(),
            export_title: "My Webpage".to_string(),
            preview_title: "Preview".to_string(),
            capture: CaptureConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Load a (possibly partial) JSON configuration; missing fields keep
    /// their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let cfg: EditorConfig = serde_json::from_str(&raw)?;
        cfg.capture.validate()?;
        Ok(cfg)
    }

    pub fn assembler(&self) -> Assembler {
        Assembler {
            policy: self.injection_policy,
            preview_title: self.preview_title.clone(),
            export_title: self.export_title.clone(),
        }
    }
}

/// A downloadable blob produced by an export endpoint
#[derive(Debug, Clone)]
pub struct Download {
    /// Suggested filename, extension included
    pub filename: String,
    /// MIME type of `bytes`
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Download {
    /// Write the blob into `dir` under its suggested filename.
    pub fn save_to(&self, dir: impl AsRef<Path>) -> Result<std::path::PathBuf> {
        let path = dir.as_ref().join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}
