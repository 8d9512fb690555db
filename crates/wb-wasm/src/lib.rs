//! WASM bridge for WB: exposes the layout and selection core to the
//! browser builder.
//!
//! Compiled via `wasm-pack build --target web`. Element snapshots arrive as
//! JSON from the host store; geometry, selection, and diagnostics go back
//! as JSON strings.

mod render2d;
pub mod text;

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wb_core::css::normalize_property;
use wb_core::{
    Bounds, Element, ElementId, ElementTag, ElementTree, LayoutDiagnostic, MonospaceBackend,
    Style, TextShaper, Viewport, resolve_layout,
};
use wb_editor::{CaptureGuard, Editor, InputEvent, LayoutSession, Modifiers, PointerTarget};
use wb_render::{CursorStyle, HandlePosition, resize_handles};
use web_sys::CanvasRenderingContext2d;

use crate::text::CanvasBackend;

/// One element as the host store sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    pub id: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub order: i32,
    /// Loosely typed declarations, camelCase or kebab-case keys.
    #[serde(default)]
    pub style: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A style declaration the parser rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleWarning {
    pub id: String,
    pub message: String,
}

/// Parse the host's records into a snapshot, collecting style warnings.
pub fn elements_from_records(
    records: Vec<ElementRecord>,
) -> Result<(ElementTree, Vec<StyleWarning>), String> {
    let mut warnings = Vec::new();
    let elements: Vec<Element> = records
        .into_iter()
        .map(|record| {
            let mut decls: Vec<(String, String)> = record
                .style
                .into_iter()
                .filter_map(|(k, v)| declaration_value(&v).map(|v| (k, v)))
                .collect();
            // Shorthands before longhands: `padding` ahead of `padding-top`.
            decls.sort_by_key(|(k, _)| normalize_property(k).matches('-').count());
            let (style, errors) =
                Style::from_declarations(decls.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            warnings.extend(errors.into_iter().map(|e| StyleWarning {
                id: record.id.clone(),
                message: e.to_string(),
            }));

            let mut el = Element::new(ElementId::intern(&record.id), ElementTag::from_html(&record.tag))
                .with_style(style)
                .with_order(record.order);
            el.parent_id = record.parent_id.as_deref().map(ElementId::intern);
            el.text = record.text;
            el
        })
        .collect();
    let tree = ElementTree::from_elements(elements).map_err(|e| e.to_string())?;
    Ok((tree, warnings))
}

fn declaration_value(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_records(json: &str) -> Result<(ElementTree, Vec<StyleWarning>), String> {
    let records: Vec<ElementRecord> = serde_json::from_str(json).map_err(|e| e.to_string())?;
    elements_from_records(records)
}

/// Looks the id up without interning it, so host typos don't grow the
/// interner.
fn bounds_json(geometry: &wb_core::GeometryMap, id: &str) -> String {
    let bounds = ElementId::get(id).and_then(|id| geometry.bounds(id));
    serde_json::to_string(&bounds).unwrap_or_else(|_| "null".to_string())
}

fn error_json(message: impl std::fmt::Display) -> String {
    serde_json::json!({ "ok": false, "error": message.to_string() }).to_string()
}

const OK: &str = r#"{"ok":true}"#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HandleInfo {
    position: HandlePosition,
    x: f32,
    y: f32,
    cursor: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectionInfo {
    selected: Vec<ElementId>,
    editing_context: Option<ElementId>,
    ancestors: Vec<ElementId>,
    bounds: Option<Bounds>,
    handles: Vec<HandleInfo>,
    lasso: Option<Bounds>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiagnosticsInfo<'a> {
    layout: &'a [LayoutDiagnostic],
    style: &'a [StyleWarning],
    error: Option<String>,
}

/// The main WASM-facing canvas controller.
///
/// Holds the editor (layout session, selection, drag state). All
/// interaction from the page goes through this struct.
#[wasm_bindgen]
pub struct WbCanvas {
    editor: Editor,
    style_warnings: Vec<StyleWarning>,
    capturing: Rc<Cell<bool>>,
    width: f64,
    height: f64,
    dark_mode: bool,
}

#[wasm_bindgen]
impl WbCanvas {
    /// Create a controller measuring text through `ctx`.
    #[wasm_bindgen(constructor)]
    pub fn new(ctx: CanvasRenderingContext2d, width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();

        let viewport = Viewport {
            width: width as f32,
            height: height as f32,
        };
        let session = LayoutSession::new(
            ElementTree::new(),
            viewport,
            Box::new(TextShaper::new(CanvasBackend::new(ctx))),
        );
        let mut editor = Editor::new(session);

        let capturing = Rc::new(Cell::new(false));
        let flag = capturing.clone();
        editor.set_capture(move || {
            flag.set(true);
            let flag = flag.clone();
            CaptureGuard::new(move || flag.set(false))
        });

        Self {
            editor,
            style_warnings: Vec::new(),
            capturing,
            width,
            height,
            dark_mode: false,
        }
    }

    /// Replace the element snapshot. Returns `{"ok":true}` or
    /// `{"ok":false,"error":"..."}`; the old snapshot stays on error.
    pub fn set_elements_json(&mut self, json: &str) -> String {
        match parse_records(json) {
            Ok((tree, warnings)) => {
                self.editor.cancel_gesture();
                self.editor.session.replace_tree(tree);
                self.editor.selection.retain_existing(self.editor.session.tree());
                self.style_warnings = warnings;
                OK.to_string()
            }
            Err(e) => error_json(e),
        }
    }

    /// Run the pending preview and layout pass. Call once per animation
    /// frame. Returns `true` if the layout changed.
    pub fn frame(&mut self) -> bool {
        match self.editor.frame() {
            Ok(ran) => ran,
            Err(err) => {
                log::error!("layout failed: {err}");
                false
            }
        }
    }

    /// Resolved boxes keyed by element id, in paint order.
    pub fn layout_json(&self) -> String {
        serde_json::to_string(self.editor.session.geometry()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Border box of one element, or `null`.
    pub fn get_bounds(&self, id: &str) -> String {
        bounds_json(self.editor.session.geometry(), id)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.editor.session.set_viewport(Viewport {
            width: width as f32,
            height: height as f32,
        });
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    // ─── Pointer and keyboard ────────────────────────────────────────────

    pub fn pointer_down(&mut self, x: f32, y: f32, shift: bool) {
        self.editor.handle(&InputEvent::from_pointer_down(x, y, shift));
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, shift: bool) {
        self.editor.handle(&InputEvent::from_pointer_move(x, y, shift));
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        self.editor.handle(&InputEvent::from_pointer_up(x, y));
    }

    pub fn double_click(&mut self, x: f32, y: f32) {
        self.editor.handle(&InputEvent::DoubleClick { x, y });
    }

    pub fn key_down(&mut self, key: &str, shift: bool) {
        self.editor.handle(&InputEvent::Key {
            key: key.to_string(),
            modifiers: Modifiers {
                shift,
                ..Modifiers::NONE
            },
        });
    }

    /// Whether a gesture currently holds the pointer. The page mirrors this
    /// with `setPointerCapture` / `releasePointerCapture`.
    pub fn is_capturing(&self) -> bool {
        self.capturing.get()
    }

    /// CSS cursor for a hover at `(x, y)`.
    pub fn cursor_at(&self, x: f32, y: f32) -> String {
        match self.editor.target_at(wb_core::Point::new(x, y)) {
            PointerTarget::Handle(_, handle) => handle.cursor().as_css().to_string(),
            PointerTarget::Element(id) if self.editor.selection.is_selected(id) => {
                "move".to_string()
            }
            _ => "default".to_string(),
        }
    }

    /// Select an element directly (e.g. from a layer panel). Unknown ids
    /// are ignored.
    pub fn select(&mut self, id: &str) {
        let Some(id) = ElementId::get(id) else {
            return;
        };
        let tree = self.editor.session.tree();
        self.editor.selection.select_direct(tree, id);
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Selection, editing context, chrome geometry, and handle cursors.
    pub fn selection_json(&self) -> String {
        let selected = self.editor.selection.selected().to_vec();
        let editing_context = self.editor.selection.editing_context();
        let bounds = self.editor.selection_bounds();
        let handles = bounds
            .map(|b| {
                resize_handles(&b, &self.editor.handles)
                    .into_iter()
                    .map(|h| HandleInfo {
                        position: h.position,
                        x: h.center.x,
                        y: h.center.y,
                        cursor: CursorStyle::as_css(h.cursor),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let ancestors = editing_context
            .map(|ctx| self.editor.session.tree().ancestor_chain(ctx))
            .unwrap_or_default();
        let info = SelectionInfo {
            selected,
            editing_context,
            ancestors,
            bounds,
            handles,
            lasso: self.editor.lasso_rect(),
        };
        serde_json::to_string(&info).unwrap_or_else(|e| error_json(e))
    }

    /// Layout diagnostics, style warnings, and the last fatal layout error.
    pub fn diagnostics_json(&self) -> String {
        let info = DiagnosticsInfo {
            layout: self.editor.session.diagnostics(),
            style: &self.style_warnings,
            error: self.editor.session.last_error().map(|e| e.to_string()),
        };
        serde_json::to_string(&info).unwrap_or_else(|e| error_json(e))
    }

    /// Draw the elements and selection chrome.
    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let theme = if self.dark_mode {
            render2d::CanvasTheme::dark()
        } else {
            render2d::CanvasTheme::light()
        };
        let chrome = render2d::Chrome {
            selection: self.editor.selection_bounds(),
            lasso: self.editor.lasso_rect(),
            handles: &self.editor.handles,
        };
        render2d::render_scene(
            ctx,
            self.editor.session.tree(),
            self.editor.session.geometry(),
            self.width,
            self.height,
            &theme,
            &chrome,
        );
    }
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("WB WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// One-shot layout with the monospace approximation.
///
/// Returns `{"ok":true,"geometry":{...},"diagnostics":[...],"styleWarnings":[...]}`
/// or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn compute_layout_json(elements_json: &str, width: f32, height: f32) -> String {
    console_error_panic_hook_setup();
    let (tree, warnings) = match parse_records(elements_json) {
        Ok(parsed) => parsed,
        Err(e) => return error_json(e),
    };
    let mut shaper = TextShaper::new(MonospaceBackend::default());
    match resolve_layout(&tree, Viewport { width, height }, &mut shaper) {
        Ok(out) => serde_json::json!({
            "ok": true,
            "geometry": out.geometry,
            "diagnostics": out.diagnostics,
            "styleWarnings": warnings,
        })
        .to_string(),
        Err(e) => error_json(e),
    }
}

fn parse_geometry(json: &str) -> Result<wb_core::GeometryMap, String> {
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).map_err(|e| e.to_string())?;
    map.into_iter()
        .map(|(id, v)| {
            let b: Bounds = serde_json::from_value(v).map_err(|e| format!("{id}: {e}"))?;
            Ok((ElementId::intern(&id), wb_core::ResolvedBox::from_bounds(b)))
        })
        .collect()
}

/// Ids whose boxes strictly overlap the drag rectangle, from a
/// `layout_json` geometry map.
#[wasm_bindgen]
pub fn lasso_ids_json(geometry_json: &str, x: f32, y: f32, width: f32, height: f32) -> String {
    match parse_geometry(geometry_json) {
        Ok(geometry) => {
            let ids = wb_render::lasso_select(Bounds::new(x, y, width, height), &geometry);
            serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
        }
        Err(e) => error_json(e),
    }
}
