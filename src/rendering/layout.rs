/// Block layout for the preview rasterizer
///
/// Headings, text blocks and images are stacked vertically inside the
/// viewport. There is no CSS engine behind this; the only style signal that
/// is honored is element visibility.

use crate::Viewport;
use scraper::{ElementRef, Html};
use std::collections::HashMap;

/// Width of one glyph cell at scale 1
pub const CHAR_WIDTH: u32 = 8;
/// Height of one text line at scale 1
pub const LINE_HEIGHT: u32 = 8;

/// Broken or unloaded images are laid out as a square of this size.
const PLACEHOLDER_SIZE: u32 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    pub fn content_width(&self) -> u32 {
        let total = self.box_model.margin + self.box_model.border + self.box_model.padding;
        self.rect.width.saturating_sub(total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    Heading,
    Paragraph,
    /// An `<img>`; `src` is what the resource loader was asked for
    Image { src: String, loaded: bool },
}

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub lb: LayoutBox,
    pub text: String,
    pub elem_type: ElementType,
    pub scale: u32,
}

/// Inputs the layout needs from the surface besides the DOM.
pub struct LayoutContext<'a> {
    pub viewport: Viewport,
    /// Visibility of an element by its document-order index
    pub is_hidden: &'a dyn Fn(usize) -> bool,
    /// Intrinsic size of a settled, decoded image
    pub image_size: &'a dyn Fn(&str) -> Option<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Heading(u32),
    Text,
    /// Emit only the element's own text; children are laid out separately
    OwnText,
    Image,
    Skip,
}

fn classify(name: &str) -> Block {
    match name {
        "h1" | "h2" => Block::Heading(2),
        "h3" | "h4" | "h5" | "h6" => Block::Heading(1),
        "p" | "li" | "pre" | "blockquote" | "button" | "td" | "th" | "figcaption" | "label" | "a" => {
            Block::Text
        }
        "img" => Block::Image,
        "head" | "script" | "style" | "template" | "noscript" | "title" | "meta" | "link" => Block::Skip,
        _ => Block::OwnText,
    }
}

/// Compute a basic block layout for the provided document.
///
/// Elements are addressed by their index in document order (the same
/// numbering the surface uses for `ElementId`). A hidden element hides its
/// whole subtree.
pub fn layout_document(document: &Html, ctx: &LayoutContext<'_>) -> Vec<LayoutNode> {
    let order: Vec<ElementRef> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .collect();
    let index: HashMap<_, usize> = order.iter().enumerate().map(|(i, e)| (e.id(), i)).collect();

    // `suppressed[i]`: element i is hidden, skipped, or its text was already
    // consumed by an enclosing block.
    let mut suppressed = vec![false; order.len()];
    let mut nodes = Vec::new();
    let mut cursor = Cursor::new(ctx.viewport);
    let mut has_h1 = false;

    for (i, el) in order.iter().enumerate() {
        let parent_suppressed = el
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|p| index.get(&p.id()))
            .is_some_and(|&p| suppressed[p]);
        if parent_suppressed || (ctx.is_hidden)(i) {
            suppressed[i] = true;
            continue;
        }

        let name = el.value().name();
        match classify(name) {
            Block::Skip => suppressed[i] = true,
            Block::Heading(scale) => {
                has_h1 |= name == "h1";
                let text = collapse(&el.text().collect::<String>());
                if let Some(node) = cursor.text_block(text, ElementType::Heading, scale) {
                    nodes.push(node);
                }
                suppressed[i] = true;
            }
            Block::Text => {
                let text = collapse(&el.text().collect::<String>());
                if let Some(node) = cursor.text_block(text, ElementType::Paragraph, 1) {
                    nodes.push(node);
                }
                suppressed[i] = true;
            }
            Block::OwnText => {
                let own: String = el
                    .children()
                    .filter_map(|n| n.value().as_text().map(|t| t.text.to_string()))
                    .collect::<Vec<_>>()
                    .join(" ");
                if let Some(node) = cursor.text_block(collapse(&own), ElementType::Paragraph, 1) {
                    nodes.push(node);
                }
            }
            Block::Image => {
                let src = el.value().attr("src").unwrap_or_default().to_string();
                let size = (ctx.image_size)(&src);
                nodes.push(cursor.image_block(src, size));
                suppressed[i] = true;
            }
        }
        if cursor.exhausted() {
            break;
        }
    }

    // Fall back to the document title when the page has no top-level heading.
    if !has_h1 {
        let title = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "title")
            .map(|t| collapse(&t.text().collect::<String>()))
            .unwrap_or_default();
        if !title.is_empty() {
            let mut head_cursor = Cursor::new(ctx.viewport);
            if let Some(title_node) = head_cursor.text_block(title, ElementType::Heading, 2) {
                let shift = head_cursor.y as i32 - 8;
                for node in &mut nodes {
                    node.lb.rect.y += shift;
                }
                nodes.insert(0, title_node);
            }
        }
    }

    nodes
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct Cursor {
    y: u32,
    viewport: Viewport,
}

impl Cursor {
    fn new(viewport: Viewport) -> Self {
        Self { y: 8, viewport }
    }

    fn exhausted(&self) -> bool {
        self.y >= self.viewport.height
    }

    fn text_block(&mut self, text: String, elem_type: ElementType, scale: u32) -> Option<LayoutNode> {
        if text.is_empty() {
            return None;
        }
        let padding = if scale > 1 { 8 } else { 6 };
        let width = self.viewport.width.saturating_sub(16);
        let content_w = width.saturating_sub(padding * 2);
        let chars_per_line = (content_w / (CHAR_WIDTH * scale)).max(1) as usize;
        let wrapped = wrap(&text, chars_per_line);
        let lines = (wrapped.lines().count() as u32).max(1);
        let box_h = lines * LINE_HEIGHT * scale + padding * 2;

        let node = LayoutNode {
            lb: LayoutBox {
                rect: Rect {
                    x: 8,
                    y: self.y as i32,
                    width,
                    height: box_h,
                },
                box_model: BoxModel {
                    margin: padding,
                    border: 0,
                    padding,
                },
            },
            text: wrapped,
            elem_type,
            scale,
        };
        self.y += box_h + padding;
        Some(node)
    }

    fn image_block(&mut self, src: String, size: Option<(u32, u32)>) -> LayoutNode {
        let max_w = self.viewport.width.saturating_sub(16).max(1);
        let (width, height) = match size {
            Some((w, h)) if w > 0 && h > 0 => {
                if w > max_w {
                    let h = (h as u64 * max_w as u64 / w as u64).max(1) as u32;
                    (max_w, h)
                } else {
                    (w, h)
                }
            }
            _ => (PLACEHOLDER_SIZE, PLACEHOLDER_SIZE),
        };
        let node = LayoutNode {
            lb: LayoutBox {
                rect: Rect {
                    x: 8,
                    y: self.y as i32,
                    width,
                    height,
                },
                box_model: BoxModel {
                    margin: 6,
                    border: 0,
                    padding: 0,
                },
            },
            text: String::new(),
            elem_type: ElementType::Image {
                src,
                loaded: size.is_some(),
            },
            scale: 1,
        };
        self.y += height + 6;
        node
    }
}

fn wrap(text: &str, chars_per_line: usize) -> String {
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        if cur.chars().count() + word.chars().count() + 1 > chars_per_line && !cur.is_empty() {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.push_str(word);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines.join("\n")
}
