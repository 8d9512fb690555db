//! Geometry map → Vello drawing commands.
//!
//! Walks the element tree in document order and paints each element's
//! background and border from its resolved box, then the selection chrome
//! on top. Element boxes use the absolute, y-down coordinate space of the
//! geometry map directly.

use crate::selection::{HandleConfig, resize_handles};
use kurbo::{Affine, Rect, Stroke as KurboStroke};
use std::collections::HashSet;
use vello::Scene;
use wb_core::{Bounds, Color, ElementTree, GeometryMap, NodeIndex, ResolvedBox};

/// Colors and widths for the selection chrome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintTheme {
    pub accent: Color,
    pub handle_fill: Color,
    pub outline_width: f32,
    pub lasso_fill: Color,
}

impl Default for PaintTheme {
    fn default() -> Self {
        Self {
            accent: Color::rgba(0.05, 0.6, 1.0, 1.0),
            handle_fill: Color::WHITE,
            outline_width: 1.0,
            lasso_fill: Color::rgba(0.05, 0.6, 1.0, 0.12),
        }
    }
}

/// Paint every element that has resolved geometry.
///
/// Call once per frame with a freshly-cleared `Scene`.
pub fn paint_geometry(scene: &mut Scene, tree: &ElementTree, geometry: &GeometryMap) {
    let mut visited = HashSet::new();
    paint_node(scene, tree, tree.root, geometry, &mut visited);
}

fn paint_node(
    scene: &mut Scene,
    tree: &ElementTree,
    idx: NodeIndex,
    geometry: &GeometryMap,
    visited: &mut HashSet<NodeIndex>,
) {
    if !visited.insert(idx) {
        return;
    }
    let element = &tree.graph[idx];
    // Hidden subtrees have no geometry.
    let Some(rb) = geometry.get(element.id) else {
        log::trace!("paint: no geometry for {}, skipping subtree", element.id);
        return;
    };

    if let Some(bg) = element.style.background {
        fill_rect(scene, &to_rect(&rb.bounds()), bg);
    }
    let border_color = element
        .style
        .border_color
        .or(element.style.text.color)
        .unwrap_or(Color::BLACK);
    for side in border_rects(rb) {
        fill_rect(scene, &side, border_color);
    }

    for child in tree.children(idx) {
        paint_node(scene, tree, child, geometry, visited);
    }
}

/// Outline the selection and draw its eight resize handles.
pub fn paint_selection(
    scene: &mut Scene,
    selection: &Bounds,
    handles: &HandleConfig,
    theme: &PaintTheme,
) {
    stroke_rect(scene, &to_rect(selection), theme.accent, theme.outline_width);
    for handle in resize_handles(selection, handles) {
        let r = to_rect(&handle.rect);
        fill_rect(scene, &r, theme.handle_fill);
        stroke_rect(scene, &r, theme.accent, theme.outline_width);
    }
}

/// Translucent drag rectangle for an in-progress lasso.
pub fn paint_lasso(scene: &mut Scene, drag: &Bounds, theme: &PaintTheme) {
    if drag.is_degenerate() {
        return;
    }
    let r = to_rect(drag);
    fill_rect(scene, &r, theme.lasso_fill);
    stroke_rect(scene, &r, theme.accent, theme.outline_width);
}

// ─── Shapes ──────────────────────────────────────────────────────────────────

fn to_rect(b: &Bounds) -> Rect {
    Rect::new(
        b.x as f64,
        b.y as f64,
        (b.x + b.width) as f64,
        (b.y + b.height) as f64,
    )
}

/// One rectangle per non-zero border side, inside the border box.
pub fn border_rects(rb: &ResolvedBox) -> Vec<Rect> {
    let outer = rb.bounds();
    let border = &rb.border;
    let mut sides = Vec::with_capacity(4);
    if border.top > 0.0 {
        sides.push(Bounds::new(outer.x, outer.y, outer.width, border.top));
    }
    if border.bottom > 0.0 {
        sides.push(Bounds::new(outer.x, outer.bottom() - border.bottom, outer.width, border.bottom));
    }
    let inner_y = outer.y + border.top;
    let inner_h = (outer.height - border.vertical()).max(0.0);
    if border.left > 0.0 {
        sides.push(Bounds::new(outer.x, inner_y, border.left, inner_h));
    }
    if border.right > 0.0 {
        sides.push(Bounds::new(outer.right() - border.right, inner_y, border.right, inner_h));
    }
    sides.iter().map(to_rect).collect()
}

// ─── Fill and stroke ─────────────────────────────────────────────────────────

fn fill_rect(scene: &mut Scene, rect: &Rect, color: Color) {
    if color.a <= 0.0 {
        return;
    }
    scene.fill(peniko::Fill::NonZero, Affine::IDENTITY, to_peniko(color), None, rect);
}

fn stroke_rect(scene: &mut Scene, rect: &Rect, color: Color, width: f32) {
    let stroke = KurboStroke {
        width: width as f64,
        ..Default::default()
    };
    scene.stroke(&stroke, Affine::IDENTITY, to_peniko(color), None, rect);
}

fn to_peniko(c: Color) -> peniko::Color {
    let [r, g, b, a] = c.to_rgba8();
    peniko::Color::from_rgba8(r, g, b, a)
}
