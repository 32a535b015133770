//! Workbench: the editor's preview surface and export endpoints.
//!
//! The workbench owns the rendering surface behind an async mutex. Preview
//! refreshes and captures both take that lock, so a document replacement
//! requested while a capture is running waits until the capture finishes
//! instead of racing it. A second export requested while a capture holds the
//! surface is refused with [`Error::Busy`] rather than queued. The editor
//! buffers live in an [`EditorSession`] owned by the caller and passed in by
//! reference.

use crate::capture::{Clock, Exporter, StillFormat, TokioClock};
use crate::surface::{HtmlSurface, RenderSurface};
use crate::{
    Assembler, DeviceMode, Download, EditorConfig, EditorSession, Error, FsResourceLoader, Notice,
    ResourceLoader, Result, Target,
};
use log::{info, warn};
use tokio::sync::Mutex;

struct Preview<S> {
    surface: S,
    /// Session revision the surface currently shows
    revision: Option<u64>,
}

pub struct Workbench<L = FsResourceLoader, C = TokioClock, S = HtmlSurface> {
    config: EditorConfig,
    assembler: Assembler,
    preview: Mutex<Preview<S>>,
    exporter: Exporter<L, C>,
}

impl<L: ResourceLoader> Workbench<L, TokioClock, HtmlSurface> {
    /// A workbench with an in-memory surface and the tokio clock.
    pub fn new(config: EditorConfig, loader: L) -> Result<Self> {
        let surface = HtmlSurface::new(config.capture.viewport);
        Self::with_parts(config, loader, TokioClock, surface)
    }
}

impl<L, C, S> Workbench<L, C, S>
where
    L: ResourceLoader,
    C: Clock,
    S: RenderSurface,
{
    pub fn with_parts(config: EditorConfig, loader: L, clock: C, surface: S) -> Result<Self> {
        config.capture.validate()?;
        let assembler = config.assembler();
        let exporter = Exporter::new(config.capture.clone(), loader, clock);
        Ok(Self {
            config,
            assembler,
            preview: Mutex::new(Preview {
                surface,
                revision: None,
            }),
            exporter,
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn exporter(&self) -> &Exporter<L, C> {
        &self.exporter
    }

    /// Write the session's preview document into the surface if the session
    /// changed since the last refresh. Returns whether the surface was
    /// rewritten.
    pub async fn refresh(&self, session: &EditorSession) -> bool {
        let doc = session.assemble(&self.assembler, Target::Preview);
        let mut preview = self.preview.lock().await;
        if preview.revision == Some(session.revision())
            && preview.surface.document() == Some(doc.as_str())
        {
            return false;
        }
        preview.surface.replace_document(doc);
        preview.revision = Some(session.revision());
        true
    }

    /// Re-apply the buffers to the preview unconditionally.
    pub async fn run(&self, session: &mut EditorSession) -> Notice {
        session.touch();
        self.refresh(session).await;
        Notice::success("Code executed", "Your changes have been applied to the preview.")
    }

    /// Switch the preview to a device preset.
    pub async fn set_device(&self, device: DeviceMode) -> Notice {
        let viewport = device.viewport(self.config.capture.viewport);
        self.preview.lock().await.surface.set_viewport(viewport);
        info!(
            "preview device set to {} ({}x{})",
            device.label(),
            viewport.width,
            viewport.height
        );
        Notice::success(
            "Device changed",
            format!(
                "Viewing in {} mode ({} × {})",
                device.label(),
                viewport.width,
                viewport.height
            ),
        )
    }

    /// The document currently shown by the preview.
    pub async fn preview_document(&self) -> Option<String> {
        self.preview.lock().await.surface.document().map(str::to_string)
    }

    /// Export endpoint 1: the assembled, self-contained `.html` document.
    pub fn export_document(&self, session: &EditorSession) -> Download {
        let doc = session.assemble(&self.assembler, Target::Export);
        info!("exported document {} ({} bytes)", self.config.export_file_name, doc.len());
        Download {
            filename: self.config.export_file_name.clone(),
            mime: "text/html",
            bytes: doc.into_bytes(),
        }
    }

    /// Export endpoint 2: a still image of the preview.
    pub async fn export_still(&self, format: StillFormat) -> Result<Download> {
        let preview = self.preview.try_lock().map_err(|_| Error::Busy)?;
        self.exporter.capture_still(&preview.surface, format).await
    }

    /// Export endpoint 3: an animation of the preview's slide set.
    pub async fn export_animation(&self) -> Result<Download> {
        let mut preview = self.preview.try_lock().map_err(|_| Error::Busy)?;
        self.exporter.capture_animated(&mut preview.surface).await
    }
}

/// Turn the outcome of an export into the notice shown to the user.
pub fn export_notice(result: &Result<Download>) -> Notice {
    match result {
        Ok(download) => Notice::success(
            "Download successful!",
            format!("{} is ready.", download.filename),
        ),
        Err(err) => {
            warn!("export failed: {}", err);
            Notice::from(err)
        }
    }
}
