/// Paint command list produced from a layout

use super::layout::{ElementType, LayoutNode};

pub const TEXT_COLOR: [u8; 4] = [0, 0, 0, 255];
const PLACEHOLDER_COLOR: [u8; 4] = [200, 200, 200, 255];

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: [u8; 4],
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        scale: u32,
        rgba: [u8; 4],
    },
    Image {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        src: String,
    },
}

/// Turn layout nodes into paint commands, in paint order.
pub fn paint_layout(nodes: &[LayoutNode]) -> Vec<PaintCommand> {
    nodes
        .iter()
        .map(|node| {
            let rect = &node.lb.rect;
            match &node.elem_type {
                ElementType::Image { src, loaded: true } => PaintCommand::Image {
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    src: src.clone(),
                },
                ElementType::Image { loaded: false, .. } => PaintCommand::SolidRect {
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    rgba: PLACEHOLDER_COLOR,
                },
                ElementType::Heading | ElementType::Paragraph => {
                    let inset = node.lb.box_model.padding as i32;
                    PaintCommand::Text {
                        x: rect.x + inset,
                        y: rect.y + inset,
                        text: node.text.clone(),
                        scale: node.scale,
                        rgba: TEXT_COLOR,
                    }
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::{BoxModel, LayoutBox, Rect};

    #[test]
    fn text_is_inset_by_padding() {
        let node = LayoutNode {
            lb: LayoutBox {
                rect: Rect {
                    x: 8,
                    y: 10,
                    width: 100,
                    height: 20,
                },
                box_model: BoxModel {
                    margin: 6,
                    border: 0,
                    padding: 6,
                },
            },
            text: "hi".into(),
            elem_type: ElementType::Paragraph,
            scale: 1,
        };
        match &paint_layout(&[node])[0] {
            PaintCommand::Text { x, y, .. } => assert_eq!((*x, *y), (14, 16)),
            other => panic!("unexpected {:?}", other),
        }
    }
}
