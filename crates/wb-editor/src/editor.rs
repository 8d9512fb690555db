//! Canvas interaction: routes input to selection, drag, and layout.
//!
//! The editor is the store-side [`GestureSink`]: committed move and resize
//! deltas become [`ElementMutation`]s on the session, a committed lasso
//! replaces the selection. Previews are kept for drawing chrome only.

use crate::drag::{CaptureGuard, DragController, GeometryDelta, GestureEvent, GestureSink};
use crate::input::{InputEvent, Modifiers};
use crate::select::SelectionState;
use crate::session::{ElementMutation, LayoutSession};
use wb_core::{Bounds, ElementId, LayoutError, Point};
use wb_render::{HandleConfig, HandlePosition, bounds_of, combined_bounds_of, handle_at, hit_test};

/// What a pointer-down at a given position would start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerTarget {
    Handle(ElementId, HandlePosition),
    Element(ElementId),
    Background,
}

pub struct Editor {
    pub session: LayoutSession,
    pub selection: SelectionState,
    pub handles: HandleConfig,
    drag: DragController,
    preview: Option<GeometryDelta>,
    capture: Option<Box<dyn Fn() -> CaptureGuard>>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("session", &self.session)
            .field("selection", &self.selection)
            .field("drag", &self.drag)
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}

impl Editor {
    pub fn new(session: LayoutSession) -> Self {
        Self {
            session,
            selection: SelectionState::new(),
            handles: HandleConfig::default(),
            drag: DragController::new(),
            preview: None,
            capture: None,
        }
    }

    /// Install the pointer-capture hook called when a gesture begins. The
    /// guard it returns is dropped when the gesture ends.
    pub fn set_capture(&mut self, capture: impl Fn() -> CaptureGuard + 'static) {
        self.capture = Some(Box::new(capture));
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// The latest uncommitted preview, if a gesture is in progress.
    pub fn preview(&self) -> Option<&GeometryDelta> {
        self.preview.as_ref()
    }

    /// Classify `point` the way a pointer-down would.
    pub fn target_at(&self, point: Point) -> PointerTarget {
        let geometry = self.session.geometry();
        if let [only] = self.selection.selected()
            && let Ok(b) = bounds_of(geometry, *only)
            && let Some(handle) = handle_at(&b, point, &self.handles)
        {
            return PointerTarget::Handle(*only, handle);
        }
        let tree = self.session.tree();
        hit_test(tree, geometry, point)
            .and_then(|hit| tree.resolve_click_target(hit, self.selection.editing_context()))
            .map_or(PointerTarget::Background, PointerTarget::Element)
    }

    pub fn handle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => {
                self.pointer_down(Point::new(*x, *y), *modifiers)
            }
            InputEvent::PointerMove { x, y, modifiers } => {
                self.drag.pointer_move(Point::new(*x, *y), *modifiers)
            }
            InputEvent::PointerUp { x, y } => {
                let mut events: Vec<GestureEvent> = Vec::new();
                self.drag.pointer_up(Point::new(*x, *y), &mut events);
                self.preview = None;
                self.dispatch(events);
            }
            InputEvent::DoubleClick { x, y } => {
                let tree = self.session.tree();
                if let Some(hit) = hit_test(tree, self.session.geometry(), Point::new(*x, *y)) {
                    self.selection.double_click(tree, hit);
                }
            }
            InputEvent::Key { .. } if event.is_escape() => self.escape(),
            InputEvent::Key { .. } => {}
        }
    }

    /// Drop an active gesture and its preview. Returns whether one was active.
    pub fn cancel_gesture(&mut self) -> bool {
        self.preview = None;
        self.drag.cancel()
    }

    /// Cancel an active gesture, or else leave one editing level.
    pub fn escape(&mut self) {
        if !self.cancel_gesture() {
            self.selection.escape(self.session.tree());
        }
    }

    /// Emit the pending preview and run the pending layout pass.
    pub fn frame(&mut self) -> Result<bool, LayoutError> {
        let mut events: Vec<GestureEvent> = Vec::new();
        self.drag.frame(&mut events);
        self.dispatch(events);
        let ran = self.session.frame()?;
        if ran {
            self.selection.retain_existing(self.session.tree());
        }
        Ok(ran)
    }

    /// Box to draw selection chrome around: the selection's combined bounds
    /// with any in-progress move or resize applied.
    pub fn selection_bounds(&self) -> Option<Bounds> {
        let geometry = self.session.geometry();
        let base = combined_bounds_of(geometry, self.selection.selected().iter().copied()).ok()?;
        match &self.preview {
            Some(GeometryDelta::Move { dx, dy, .. }) => Some(base.translate(*dx, *dy)),
            Some(GeometryDelta::Resize { bounds, .. }) => Some(*bounds),
            _ => Some(base),
        }
    }

    /// The lasso rectangle while one is being dragged.
    pub fn lasso_rect(&self) -> Option<Bounds> {
        match &self.preview {
            Some(GeometryDelta::Lasso { rect, .. }) => Some(*rect),
            _ => None,
        }
    }

    fn pointer_down(&mut self, point: Point, modifiers: Modifiers) {
        if self.drag.is_dragging() {
            return;
        }
        let guard = self.capture.as_ref().map_or_else(CaptureGuard::none, |c| c());
        match self.target_at(point) {
            PointerTarget::Handle(id, handle) => {
                if let Ok(origin) = bounds_of(self.session.geometry(), id) {
                    self.drag
                        .begin_resize(point, id, origin, handle, self.handles.min_size, guard);
                }
            }
            PointerTarget::Element(_) => {
                let tree = self.session.tree();
                let hit = hit_test(tree, self.session.geometry(), point);
                let target = self.selection.click(tree, hit, modifiers);
                if target.is_some_and(|t| self.selection.is_selected(t)) {
                    let geometry = self.session.geometry();
                    let items: Vec<_> = self
                        .selection
                        .selected()
                        .iter()
                        .filter_map(|id| geometry.bounds(*id).map(|b| (*id, b)))
                        .collect();
                    self.drag.begin_move(point, items, guard);
                }
            }
            PointerTarget::Background => {
                if !modifiers.shift {
                    self.selection.clear();
                }
                let candidates = self.lasso_candidates();
                self.drag.begin_lasso(point, candidates, guard);
            }
        }
    }

    /// Boxes of the elements a lasso may pick at the current level.
    fn lasso_candidates(&self) -> Vec<(ElementId, Bounds)> {
        let tree = self.session.tree();
        let geometry = self.session.geometry();
        let scope = self
            .selection
            .editing_context()
            .and_then(|ctx| tree.index_of(ctx))
            .unwrap_or(tree.root);
        tree.children(scope)
            .into_iter()
            .map(|idx| tree.graph[idx].id)
            .filter_map(|id| geometry.bounds(id).map(|b| (id, b)))
            .collect()
    }

    fn dispatch(&mut self, events: Vec<GestureEvent>) {
        for event in events {
            match event {
                GestureEvent::Preview(delta) => self.on_preview(&delta),
                GestureEvent::Commit(delta) => self.on_commit(delta),
            }
        }
    }
}

impl GestureSink for Editor {
    fn on_preview(&mut self, delta: &GeometryDelta) {
        self.preview = Some(delta.clone());
    }

    fn on_commit(&mut self, delta: GeometryDelta) {
        self.preview = None;
        let mutations: Vec<ElementMutation> = match delta {
            GeometryDelta::Move { ids, dx, dy } => ids
                .into_iter()
                .map(|id| ElementMutation::Move { id, dx, dy })
                .collect(),
            GeometryDelta::Resize { id, bounds, .. } => vec![ElementMutation::Resize { id, bounds }],
            GeometryDelta::Lasso { selected, .. } => {
                self.selection.set(selected);
                Vec::new()
            }
        };
        if mutations.is_empty() {
            return;
        }
        if let Err(err) = self.session.apply_all(mutations) {
            log::warn!("gesture commit rejected: {err}");
        }
    }
}
