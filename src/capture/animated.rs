use super::{Clock, Exporter};
use crate::surface::{ElementId, RenderSurface, Visibility};
use crate::{Error, ResourceLoader, Result};
use image::RgbaImage;
use log::debug;

/// The ordered children of a slide container, with the visibility each had
/// before capture started.
#[derive(Debug, Clone)]
pub struct SlideSet {
    pub container: ElementId,
    slides: Vec<(ElementId, Visibility)>,
}

impl SlideSet {
    /// Find the container and snapshot its slides. Fails when the container
    /// is missing or holds fewer than two slides.
    pub fn locate<S: RenderSurface>(surface: &S, selector: &str) -> Result<Self> {
        surface.content_root()?;
        let container = surface
            .query(selector)?
            .ok_or_else(|| Error::ContainerNotFound(selector.to_string()))?;
        let slides: Vec<(ElementId, Visibility)> = surface
            .children(container)
            .into_iter()
            .map(|id| (id, surface.visibility(id)))
            .collect();
        if slides.len() < 2 {
            return Err(Error::InsufficientFrames { found: slides.len() });
        }
        Ok(Self { container, slides })
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.slides.iter().map(|(id, _)| *id)
    }

    /// Show only `current`, hide every other slide.
    pub fn show_only<S: RenderSurface>(&self, surface: &mut S, current: ElementId) {
        for id in self.ids() {
            let v = if id == current {
                Visibility::Visible
            } else {
                Visibility::Hidden
            };
            surface.set_visibility(id, v);
        }
    }

    /// Put every slide back to the visibility it had when located.
    pub fn restore<S: RenderSurface>(&self, surface: &mut S) {
        for (id, original) in &self.slides {
            surface.set_visibility(*id, *original);
        }
    }
}

pub(super) async fn record<S, L, C>(
    exporter: &Exporter<L, C>,
    surface: &mut S,
    slides: &SlideSet,
) -> Result<Vec<RgbaImage>>
where
    S: RenderSurface,
    L: ResourceLoader,
    C: Clock,
{
    let mut frames = Vec::with_capacity(slides.len());
    for (i, id) in slides.ids().enumerate() {
        slides.show_only(surface, id);
        exporter.await_layout_settle().await;
        let frame = exporter.still_raster(surface).await?;
        debug!("frame {}/{} captured", i + 1, slides.len());
        frames.push(frame);
    }
    Ok(frames)
}
