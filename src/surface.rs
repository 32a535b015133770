//! Rendering surface: the isolated document the preview writes into and the
//! capture path reads pixels back out of.
//!
//! Writes always replace the entire document. Elements are addressed by their
//! index in document order, which is stable for a given document; visibility
//! changes made through the surface are overlays on top of the markup and are
//! dropped on the next replacement.

use crate::rendering::{self, RasterRequest};
use crate::{Error, Result, Viewport};
use image::RgbaImage;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

/// Handle to an element of the current document (document-order index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Operations the capture pipeline needs from a rendering surface.
pub trait RenderSurface {
    /// Replace the whole document; prior content and overlays are discarded.
    fn replace_document(&mut self, html: String);

    /// The current document, if one has been written.
    fn document(&self) -> Option<&str>;

    fn viewport(&self) -> Viewport;

    fn set_viewport(&mut self, viewport: Viewport);

    /// Root of the renderable content (the `<body>`).
    fn content_root(&self) -> Result<ElementId>;

    /// First element matching a CSS selector.
    fn query(&self, selector: &str) -> Result<Option<ElementId>>;

    /// Immediate element children, in document order.
    fn children(&self, id: ElementId) -> Vec<ElementId>;

    fn visibility(&self, id: ElementId) -> Visibility;

    fn set_visibility(&mut self, id: ElementId, visibility: Visibility);

    /// `src` of every embedded image, in document order, without duplicates.
    fn image_sources(&self) -> Vec<String>;

    /// Paint the current state of the document.
    fn rasterize(&self, request: &RasterRequest) -> Result<RgbaImage>;
}

/// In-memory surface backed by an HTML5 tree builder.
#[derive(Debug, Clone, Default)]
pub struct HtmlSurface {
    document: Option<String>,
    viewport: Viewport,
    overrides: HashMap<ElementId, Visibility>,
}

impl HtmlSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            document: None,
            viewport,
            overrides: HashMap::new(),
        }
    }

    fn parsed(&self) -> Result<Html> {
        match self.document.as_deref() {
            Some(doc) if !doc.trim().is_empty() => Ok(Html::parse_document(doc)),
            _ => Err(Error::ContentUnavailable),
        }
    }

    fn element_order(doc: &Html) -> Vec<ElementRef<'_>> {
        doc.root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect()
    }

    fn index_of(order: &[ElementRef<'_>], el: &ElementRef<'_>) -> Option<usize> {
        order.iter().position(|e| e.id() == el.id())
    }

    fn effective(&self, id: ElementId, el: &ElementRef<'_>) -> Visibility {
        self.overrides
            .get(&id)
            .copied()
            .unwrap_or_else(|| markup_visibility(el))
    }
}

/// Visibility as authored: `hidden` attribute or inline `display:none`.
fn markup_visibility(el: &ElementRef<'_>) -> Visibility {
    let attrs = el.value();
    if attrs.attr("hidden").is_some() {
        return Visibility::Hidden;
    }
    let display_none = attrs.attr("style").is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        compact
            .split(';')
            .any(|decl| decl == "display:none" || decl.starts_with("display:none!"))
    });
    if display_none {
        Visibility::Hidden
    } else {
        Visibility::Visible
    }
}

impl RenderSurface for HtmlSurface {
    fn replace_document(&mut self, html: String) {
        log::debug!("surface: replacing document ({} bytes)", html.len());
        self.document = Some(html);
        self.overrides.clear();
    }

    fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn content_root(&self) -> Result<ElementId> {
        let doc = self.parsed()?;
        let order = Self::element_order(&doc);
        order
            .iter()
            .position(|e| e.value().name() == "body")
            .map(ElementId)
            .ok_or(Error::ContentUnavailable)
    }

    fn query(&self, selector: &str) -> Result<Option<ElementId>> {
        let sel = Selector::parse(selector)
            .map_err(|_| Error::ConfigError(format!("invalid selector `{}`", selector)))?;
        let doc = self.parsed()?;
        let order = Self::element_order(&doc);
        Ok(doc
            .select(&sel)
            .next()
            .and_then(|el| Self::index_of(&order, &el))
            .map(ElementId))
    }

    fn children(&self, id: ElementId) -> Vec<ElementId> {
        let Ok(doc) = self.parsed() else {
            return Vec::new();
        };
        let order = Self::element_order(&doc);
        let Some(parent) = order.get(id.0) else {
            return Vec::new();
        };
        parent
            .children()
            .filter_map(ElementRef::wrap)
            .filter_map(|child| Self::index_of(&order, &child))
            .map(ElementId)
            .collect()
    }

    fn visibility(&self, id: ElementId) -> Visibility {
        if let Some(v) = self.overrides.get(&id) {
            return *v;
        }
        let Ok(doc) = self.parsed() else {
            return Visibility::Visible;
        };
        Self::element_order(&doc)
            .get(id.0)
            .map(markup_visibility)
            .unwrap_or(Visibility::Visible)
    }

    fn set_visibility(&mut self, id: ElementId, visibility: Visibility) {
        self.overrides.insert(id, visibility);
    }

    fn image_sources(&self) -> Vec<String> {
        let Ok(doc) = self.parsed() else {
            return Vec::new();
        };
        let mut sources: Vec<String> = Vec::new();
        for el in Self::element_order(&doc) {
            if el.value().name() != "img" {
                continue;
            }
            if let Some(src) = el.value().attr("src") {
                if !src.is_empty() && !sources.iter().any(|s| s == src) {
                    sources.push(src.to_string());
                }
            }
        }
        sources
    }

    fn rasterize(&self, request: &RasterRequest) -> Result<RgbaImage> {
        let doc = self.parsed()?;
        let order = Self::element_order(&doc);
        let hidden: Vec<bool> = order
            .iter()
            .enumerate()
            .map(|(i, el)| self.effective(ElementId(i), el) == Visibility::Hidden)
            .collect();
        let is_hidden = |i: usize| hidden.get(i).copied().unwrap_or(false);
        rendering::render(&doc, self.viewport, &is_hidden, request)
    }
}
