//! Canvas2D software renderer.
//!
//! Draws element boxes from the geometry map and the editor's selection
//! chrome to an HTML `<canvas>` via `CanvasRenderingContext2d`.

use std::collections::HashSet;
use wb_core::{Bounds, Color, ElementTree, GeometryMap, NodeIndex};
use wb_render::{HandleConfig, resize_handles};
use web_sys::CanvasRenderingContext2d;

use crate::text::css_font;

/// Theme-dependent colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub accent: &'static str,
    pub handle_fill: &'static str,
    pub lasso_fill: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: "#FFFFFF",
            accent: "#0D99FF",
            handle_fill: "#FFFFFF",
            lasso_fill: "rgba(13, 153, 255, 0.08)",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#1C1C1E",
            accent: "#0D99FF",
            handle_fill: "#1C1C1E",
            lasso_fill: "rgba(13, 153, 255, 0.12)",
        }
    }
}

/// Selection chrome to draw on top of the elements.
pub struct Chrome<'a> {
    pub selection: Option<Bounds>,
    pub lasso: Option<Bounds>,
    pub handles: &'a HandleConfig,
}

pub fn css_color(c: &Color) -> String {
    let [r, g, b, a] = c.to_rgba8();
    format!("rgba({r}, {g}, {b}, {:.3})", a as f32 / 255.0)
}

/// Render every laid-out element, then the chrome.
pub fn render_scene(
    ctx: &CanvasRenderingContext2d,
    tree: &ElementTree,
    geometry: &GeometryMap,
    canvas_width: f64,
    canvas_height: f64,
    theme: &CanvasTheme,
    chrome: &Chrome<'_>,
) {
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);

    let mut visited = HashSet::new();
    render_node(ctx, tree, tree.root, geometry, &mut visited);

    if let Some(sel) = chrome.selection {
        draw_selection(ctx, &sel, chrome.handles, theme);
    }
    if let Some(lasso) = chrome.lasso {
        draw_lasso(ctx, &lasso, theme);
    }
}

fn render_node(
    ctx: &CanvasRenderingContext2d,
    tree: &ElementTree,
    idx: NodeIndex,
    geometry: &GeometryMap,
    visited: &mut HashSet<NodeIndex>,
) {
    if !visited.insert(idx) {
        return;
    }
    let element = &tree.graph[idx];
    let Some(rb) = geometry.get(element.id) else {
        return;
    };
    let b = rb.bounds();
    let (x, y, w, h) = (b.x as f64, b.y as f64, b.width as f64, b.height as f64);

    if let Some(bg) = &element.style.background {
        ctx.set_fill_style_str(&css_color(bg));
        ctx.fill_rect(x, y, w, h);
    }

    let border = rb.border;
    if border.top > 0.0 || border.right > 0.0 || border.bottom > 0.0 || border.left > 0.0 {
        let color = element
            .style
            .border_color
            .or(element.style.text.color)
            .unwrap_or(Color::BLACK);
        ctx.set_fill_style_str(&css_color(&color));
        let (t, r, bo, l) = (
            border.top as f64,
            border.right as f64,
            border.bottom as f64,
            border.left as f64,
        );
        ctx.fill_rect(x, y, w, t);
        ctx.fill_rect(x, y + h - bo, w, bo);
        ctx.fill_rect(x, y + t, l, h - t - bo);
        ctx.fill_rect(x + w - r, y + t, r, h - t - bo);
    }

    if let Some(text) = element.text.as_deref().filter(|t| !t.is_empty()) {
        let content = rb.content_rect();
        let style = &element.style.text;
        ctx.set_font(&css_font(style));
        ctx.set_fill_style_str(&css_color(&style.color.unwrap_or(Color::BLACK)));
        let line_height = style.line_height_px() as f64;
        let baseline = (line_height + style.font_size as f64 * 0.7) / 2.0;
        for (i, line) in text.lines().enumerate() {
            let _ = ctx.fill_text(
                line,
                content.x as f64,
                content.y as f64 + baseline + i as f64 * line_height,
            );
        }
    }

    for child in tree.children(idx) {
        render_node(ctx, tree, child, geometry, visited);
    }
}

fn draw_selection(
    ctx: &CanvasRenderingContext2d,
    sel: &Bounds,
    handles: &HandleConfig,
    theme: &CanvasTheme,
) {
    ctx.save();
    ctx.set_stroke_style_str(theme.accent);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(sel.x as f64, sel.y as f64, sel.width as f64, sel.height as f64);

    ctx.set_fill_style_str(theme.handle_fill);
    for handle in resize_handles(sel, handles) {
        let r = handle.rect;
        ctx.fill_rect(r.x as f64, r.y as f64, r.width as f64, r.height as f64);
        ctx.stroke_rect(r.x as f64, r.y as f64, r.width as f64, r.height as f64);
    }
    ctx.restore();
}

fn draw_lasso(ctx: &CanvasRenderingContext2d, lasso: &Bounds, theme: &CanvasTheme) {
    if lasso.width < 1.0 && lasso.height < 1.0 {
        return;
    }
    let (x, y, w, h) = (
        lasso.x as f64,
        lasso.y as f64,
        lasso.width as f64,
        lasso.height as f64,
    );
    ctx.save();
    ctx.set_fill_style_str(theme.lasso_fill);
    ctx.fill_rect(x, y, w, h);
    ctx.set_stroke_style_str(theme.accent);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(x, y, w, h);
    ctx.restore();
}
