//! Frame-coalesced layout session.
//!
//! The session owns the authoritative tree snapshot. Mutations only mark it
//! dirty; [`LayoutSession::frame`] then runs at most one full layout pass,
//! however many mutations arrived since the previous frame. Each pass is a
//! pure recompute from the latest snapshot, so skipped intermediate states
//! never matter.

use thiserror::Error;
use wb_core::{
    Bounds, BoxSizing, Dimension, ElementId, ElementTree, GeometryMap, Inset, LayoutDiagnostic,
    LayoutError, LengthPercentage, Position, Style, TextMeasure, Viewport,
    resolve_layout_with_fallback,
};

/// A change requested by the canvas or the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementMutation {
    /// Shift by a canvas-space delta, expressed as a positioning offset.
    Move { id: ElementId, dx: f32, dy: f32 },
    /// Give the element this border box.
    Resize { id: ElementId, bounds: Bounds },
    SetText { id: ElementId, text: Option<String> },
    SetStyle { id: ElementId, style: Box<Style> },
}

impl ElementMutation {
    pub fn id(&self) -> ElementId {
        match self {
            ElementMutation::Move { id, .. }
            | ElementMutation::Resize { id, .. }
            | ElementMutation::SetText { id, .. }
            | ElementMutation::SetStyle { id, .. } => *id,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("unknown element {0}")]
    UnknownElement(ElementId),
    #[error("element {0} has no geometry yet")]
    NoGeometry(ElementId),
    #[error("the root element cannot be moved or resized")]
    RootImmovable,
}

pub struct LayoutSession {
    tree: ElementTree,
    viewport: Viewport,
    measurer: Box<dyn TextMeasure>,
    geometry: GeometryMap,
    diagnostics: Vec<LayoutDiagnostic>,
    last_error: Option<LayoutError>,
    dirty: bool,
    passes: u64,
}

impl LayoutSession {
    /// New session; the first [`frame`](Self::frame) lays out `tree`.
    pub fn new(tree: ElementTree, viewport: Viewport, measurer: Box<dyn TextMeasure>) -> Self {
        Self {
            tree,
            viewport,
            measurer,
            geometry: GeometryMap::new(),
            diagnostics: Vec::new(),
            last_error: None,
            dirty: true,
            passes: 0,
        }
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn geometry(&self) -> &GeometryMap {
        &self.geometry
    }

    pub fn diagnostics(&self) -> &[LayoutDiagnostic] {
        &self.diagnostics
    }

    /// The error of the most recent pass, if it was abandoned.
    pub fn last_error(&self) -> Option<&LayoutError> {
        self.last_error.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of layout passes run so far.
    pub fn pass_count(&self) -> u64 {
        self.passes
    }

    /// Swap in a new snapshot from the store.
    pub fn replace_tree(&mut self, tree: ElementTree) {
        self.tree = tree;
        self.dirty = true;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.dirty = true;
        }
    }

    /// Check that `mutation` would apply, without touching the snapshot.
    pub fn validate(&self, mutation: &ElementMutation) -> Result<(), SessionError> {
        let id = mutation.id();
        if self.tree.get(id).is_none() {
            return Err(SessionError::UnknownElement(id));
        }
        match mutation {
            ElementMutation::Move { .. } => self.ensure_movable(id),
            ElementMutation::Resize { .. } => {
                self.ensure_movable(id)?;
                if self.geometry.get(id).is_none() {
                    return Err(SessionError::NoGeometry(id));
                }
                Ok(())
            }
            ElementMutation::SetText { .. } | ElementMutation::SetStyle { .. } => Ok(()),
        }
    }

    /// Apply one mutation to the snapshot. Layout waits for the next frame.
    pub fn apply(&mut self, mutation: ElementMutation) -> Result<(), SessionError> {
        self.validate(&mutation)?;
        self.apply_unchecked(mutation)
    }

    /// Apply a batch as one unit: if any mutation is rejected, none are
    /// applied.
    pub fn apply_all(&mut self, mutations: Vec<ElementMutation>) -> Result<(), SessionError> {
        for mutation in &mutations {
            self.validate(mutation)?;
        }
        for mutation in mutations {
            self.apply_unchecked(mutation)?;
        }
        Ok(())
    }

    fn apply_unchecked(&mut self, mutation: ElementMutation) -> Result<(), SessionError> {
        match mutation {
            ElementMutation::Move { id, dx, dy } => self.apply_move(id, dx, dy)?,
            ElementMutation::Resize { id, bounds } => self.apply_resize(id, bounds)?,
            ElementMutation::SetText { id, text } => {
                if let Some(el) = self.tree.get_mut(id) {
                    el.text = text;
                }
            }
            ElementMutation::SetStyle { id, style } => {
                if let Some(el) = self.tree.get_mut(id) {
                    el.style = *style;
                }
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Run the pending layout pass, if any. Returns whether one ran.
    ///
    /// A cyclic tree abandons the pass and keeps the previous geometry.
    pub fn frame(&mut self) -> Result<bool, LayoutError> {
        if !self.dirty {
            return Ok(false);
        }
        self.dirty = false;
        self.passes += 1;
        match resolve_layout_with_fallback(
            &self.tree,
            self.viewport,
            self.measurer.as_mut(),
            &self.geometry,
        ) {
            Ok(output) => {
                log::debug!(
                    "frame pass {}: {} boxes, {} diagnostics",
                    self.passes,
                    output.geometry.len(),
                    output.diagnostics.len()
                );
                self.geometry = output.geometry;
                self.diagnostics = output.diagnostics;
                self.last_error = None;
                Ok(true)
            }
            Err(err) => {
                log::error!("frame pass {} abandoned: {err}", self.passes);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    // ─── Geometry → style ────────────────────────────────────────────────

    fn ensure_movable(&self, id: ElementId) -> Result<(), SessionError> {
        if id == self.tree.root_id() {
            Err(SessionError::RootImmovable)
        } else {
            Ok(())
        }
    }

    /// Rect the offsets of `id` resolve against, and whether its height is
    /// definite. Relative offsets use the parent's content box, absolute
    /// ones its padding box.
    fn offset_basis(&self, id: ElementId, absolute: bool) -> (Bounds, bool) {
        let parent = self.tree.get(id).and_then(|el| el.parent_id);
        match parent.and_then(|p| self.geometry.get(p)) {
            Some(rb) if absolute => (rb.padding_rect(), true),
            Some(rb) => {
                let definite = parent
                    .and_then(|p| self.tree.get(p))
                    .is_some_and(|el| !el.style.height.is_auto());
                (rb.content_rect(), definite)
            }
            None => (
                Bounds::new(0.0, 0.0, self.viewport.width, self.viewport.height),
                absolute,
            ),
        }
    }

    fn apply_move(&mut self, id: ElementId, dx: f32, dy: f32) -> Result<(), SessionError> {
        self.ensure_movable(id)?;
        let absolute = self
            .tree
            .get(id)
            .is_some_and(|el| matches!(el.style.position, Position::Absolute(_)));
        let (cb, definite_h) = self.offset_basis(id, absolute);
        let current = self.geometry.get(id).copied();
        let Some(el) = self.tree.get_mut(id) else {
            return Err(SessionError::UnknownElement(id));
        };
        if el.style.position == Position::Static {
            el.style.position = Position::Relative(Inset::default());
        }
        match &mut el.style.position {
            Position::Static => {}
            Position::Relative(inset) => {
                let basis_h = definite_h.then_some(cb.height);
                shift_axis(&mut inset.left, &mut inset.right, dx, Some(cb.width), None);
                shift_axis(&mut inset.top, &mut inset.bottom, dy, basis_h, None);
            }
            Position::Absolute(inset) => {
                // An unanchored axis sits at its static position; pin it there.
                // Layout adds the margin on top of the inset.
                let static_x = current.map(|b| b.x - cb.x - b.margin.left);
                let static_y = current.map(|b| b.y - cb.y - b.margin.top);
                shift_axis(&mut inset.left, &mut inset.right, dx, Some(cb.width), static_x);
                shift_axis(&mut inset.top, &mut inset.bottom, dy, Some(cb.height), static_y);
            }
        }
        Ok(())
    }

    fn apply_resize(&mut self, id: ElementId, bounds: Bounds) -> Result<(), SessionError> {
        self.ensure_movable(id)?;
        let current = *self.geometry.get(id).ok_or(SessionError::NoGeometry(id))?;

        let dx = bounds.x - current.x;
        let dy = bounds.y - current.y;
        if dx != 0.0 || dy != 0.0 {
            self.apply_move(id, dx, dy)?;
        }

        let Some(el) = self.tree.get_mut(id) else {
            return Err(SessionError::UnknownElement(id));
        };
        let (width, height) = match el.style.box_sizing {
            BoxSizing::BorderBox => (bounds.width, bounds.height),
            BoxSizing::ContentBox => (
                bounds.width - current.padding.horizontal() - current.border.horizontal(),
                bounds.height - current.padding.vertical() - current.border.vertical(),
            ),
        };
        el.style.width = Dimension::Px(width.max(0.0));
        el.style.height = Dimension::Px(height.max(0.0));
        Ok(())
    }
}

/// Shift one axis of an inset by `d`. The start offset moves with the
/// pointer, the end offset against it; an axis with neither set gets a
/// start offset from `unset_origin` (or zero). Percentages against an
/// indefinite `basis` count as zero, as they do in layout.
fn shift_axis(
    start: &mut Option<LengthPercentage>,
    end: &mut Option<LengthPercentage>,
    d: f32,
    basis: Option<f32>,
    unset_origin: Option<f32>,
) {
    if start.is_none() && end.is_none() {
        *start = Some(LengthPercentage::Px(unset_origin.unwrap_or(0.0) + d));
        return;
    }
    if d == 0.0 {
        return;
    }
    if let Some(s) = start.as_mut() {
        *s = LengthPercentage::Px(s.resolve_opt(basis).unwrap_or(0.0) + d);
    }
    if let Some(e) = end.as_mut() {
        *e = LengthPercentage::Px(e.resolve_opt(basis).unwrap_or(0.0) - d);
    }
}

impl std::fmt::Debug for LayoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutSession")
            .field("elements", &self.tree.len())
            .field("viewport", &self.viewport)
            .field("boxes", &self.geometry.len())
            .field("dirty", &self.dirty)
            .field("passes", &self.passes)
            .finish()
    }
}
