//! Drag gesture state machine.
//!
//! `Idle → Dragging(move | resize | lasso) → Idle`. While dragging, pointer
//! samples only overwrite the current position; [`DragController::frame`]
//! turns the latest sample into at most one preview delta. Pointer-up
//! commits the last delta, cancel discards it. The controller never touches
//! the element tree: deltas go to a [`GestureSink`], which owns the actual
//! mutation.

use crate::input::Modifiers;
use smallvec::SmallVec;
use wb_core::{Bounds, ElementId, Point};
use wb_render::{HandlePosition, resized_bounds};

/// Listener registration held for the duration of a gesture.
///
/// The release callback runs exactly once: when the gesture commits, is
/// cancelled, or the controller is dropped mid-gesture.
pub struct CaptureGuard {
    release: Option<Box<dyn FnOnce()>>,
}

impl CaptureGuard {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A guard with nothing to release.
    pub fn none() -> Self {
        Self { release: None }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureGuard")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    Resize(HandlePosition),
    Lasso,
}

/// A proposed geometry change. Previews and commits share this shape.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryDelta {
    Move {
        ids: SmallVec<[ElementId; 4]>,
        dx: f32,
        dy: f32,
    },
    Resize {
        id: ElementId,
        handle: HandlePosition,
        bounds: Bounds,
    },
    Lasso {
        rect: Bounds,
        selected: Vec<ElementId>,
    },
}

/// Receives gesture output. Implemented by whatever owns the tree.
pub trait GestureSink {
    fn on_preview(&mut self, delta: &GeometryDelta);
    fn on_commit(&mut self, delta: GeometryDelta);
}

/// Recorded gesture output, for callers that process events after the
/// controller returns.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    Preview(GeometryDelta),
    Commit(GeometryDelta),
}

impl GestureSink for Vec<GestureEvent> {
    fn on_preview(&mut self, delta: &GeometryDelta) {
        self.push(GestureEvent::Preview(delta.clone()));
    }

    fn on_commit(&mut self, delta: GeometryDelta) {
        self.push(GestureEvent::Commit(delta));
    }
}

#[derive(Debug)]
struct DragState {
    kind: DragKind,
    start: Point,
    current: Point,
    modifiers: Modifiers,
    /// A sample arrived since the last frame.
    pending: bool,
    /// Boxes at gesture start: the moved items, the resized element, or the
    /// lasso candidates.
    origins: SmallVec<[(ElementId, Bounds); 4]>,
    min_size: f32,
    _capture: CaptureGuard,
}

impl DragState {
    fn delta(&self) -> GeometryDelta {
        let mut dx = self.current.x - self.start.x;
        let mut dy = self.current.y - self.start.y;
        match self.kind {
            DragKind::Move => {
                // Shift: constrain to dominant axis
                if self.modifiers.shift {
                    if dx.abs() > dy.abs() {
                        dy = 0.0;
                    } else {
                        dx = 0.0;
                    }
                }
                GeometryDelta::Move {
                    ids: self.origins.iter().map(|(id, _)| *id).collect(),
                    dx,
                    dy,
                }
            }
            DragKind::Resize(handle) => {
                let (id, origin) = self.origins[0];
                GeometryDelta::Resize {
                    id,
                    handle,
                    bounds: resized_bounds(&origin, handle, Point::new(dx, dy), self.min_size),
                }
            }
            DragKind::Lasso => {
                let rect = Bounds::from_corners(self.start, self.current);
                GeometryDelta::Lasso {
                    rect,
                    selected: self
                        .origins
                        .iter()
                        .filter(|(_, b)| b.intersects(&rect))
                        .map(|(id, _)| *id)
                        .collect(),
                }
            }
        }
    }

    /// Whether committing would change anything.
    fn is_effective(&self, delta: &GeometryDelta) -> bool {
        match delta {
            GeometryDelta::Move { dx, dy, .. } => *dx != 0.0 || *dy != 0.0,
            GeometryDelta::Resize { bounds, .. } => self.origins[0].1 != *bounds,
            GeometryDelta::Lasso { .. } => true,
        }
    }
}

#[derive(Debug, Default)]
enum DragPhase {
    #[default]
    Idle,
    Dragging(DragState),
}

#[derive(Debug, Default)]
pub struct DragController {
    phase: DragPhase,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging(_))
    }

    pub fn kind(&self) -> Option<DragKind> {
        match &self.phase {
            DragPhase::Idle => None,
            DragPhase::Dragging(state) => Some(state.kind),
        }
    }

    /// The delta the current pointer position would produce, without
    /// consuming the pending sample.
    pub fn current_delta(&self) -> Option<GeometryDelta> {
        match &self.phase {
            DragPhase::Idle => None,
            DragPhase::Dragging(state) => Some(state.delta()),
        }
    }

    /// Start moving `items` from `start`. An empty item list stays idle.
    pub fn begin_move(
        &mut self,
        start: Point,
        items: impl IntoIterator<Item = (ElementId, Bounds)>,
        capture: CaptureGuard,
    ) -> bool {
        let origins: SmallVec<[(ElementId, Bounds); 4]> = items.into_iter().collect();
        if origins.is_empty() {
            return false;
        }
        self.begin(DragKind::Move, start, origins, 0.0, capture)
    }

    /// Start resizing `id` from its box at gesture start.
    pub fn begin_resize(
        &mut self,
        start: Point,
        id: ElementId,
        origin: Bounds,
        handle: HandlePosition,
        min_size: f32,
        capture: CaptureGuard,
    ) -> bool {
        let mut origins = SmallVec::new();
        origins.push((id, origin));
        self.begin(DragKind::Resize(handle), start, origins, min_size, capture)
    }

    /// Start a lasso over `candidates`, the boxes at the selectable level.
    pub fn begin_lasso(
        &mut self,
        start: Point,
        candidates: impl IntoIterator<Item = (ElementId, Bounds)>,
        capture: CaptureGuard,
    ) -> bool {
        let origins = candidates.into_iter().collect();
        self.begin(DragKind::Lasso, start, origins, 0.0, capture)
    }

    fn begin(
        &mut self,
        kind: DragKind,
        start: Point,
        origins: SmallVec<[(ElementId, Bounds); 4]>,
        min_size: f32,
        capture: CaptureGuard,
    ) -> bool {
        if self.is_dragging() {
            log::warn!("drag {kind:?} requested while another gesture is active");
            return false;
        }
        log::debug!("drag {kind:?} begins at ({}, {})", start.x, start.y);
        self.phase = DragPhase::Dragging(DragState {
            kind,
            start,
            current: start,
            modifiers: Modifiers::NONE,
            pending: false,
            origins,
            min_size,
            _capture: capture,
        });
        true
    }

    /// Record the latest pointer sample. Earlier unframed samples are
    /// superseded.
    pub fn pointer_move(&mut self, point: Point, modifiers: Modifiers) {
        if let DragPhase::Dragging(state) = &mut self.phase {
            state.current = point;
            state.modifiers = modifiers;
            state.pending = true;
        }
    }

    /// Emit at most one preview for the samples received since the last
    /// frame. Returns whether a preview was emitted.
    pub fn frame(&mut self, sink: &mut dyn GestureSink) -> bool {
        let DragPhase::Dragging(state) = &mut self.phase else {
            return false;
        };
        if !state.pending {
            return false;
        }
        state.pending = false;
        sink.on_preview(&state.delta());
        true
    }

    /// Finish the gesture at `point`. Returns whether a commit was emitted.
    pub fn pointer_up(&mut self, point: Point, sink: &mut dyn GestureSink) -> bool {
        let DragPhase::Dragging(mut state) = std::mem::take(&mut self.phase) else {
            return false;
        };
        state.current = point;
        let delta = state.delta();
        let effective = state.is_effective(&delta);
        // Release listeners before the sink sees the commit.
        drop(state);
        if effective {
            log::debug!("drag commits {delta:?}");
            sink.on_commit(delta);
        }
        effective
    }

    /// Abandon the gesture without a commit. Returns whether one was active.
    pub fn cancel(&mut self) -> bool {
        match std::mem::take(&mut self.phase) {
            DragPhase::Idle => false,
            DragPhase::Dragging(state) => {
                log::debug!("drag {:?} cancelled", state.kind);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn id(s: &str) -> ElementId {
        ElementId::intern(s)
    }

    fn counting_guard() -> (CaptureGuard, Rc<Cell<u32>>) {
        let released = Rc::new(Cell::new(0));
        let r = released.clone();
        (CaptureGuard::new(move || r.set(r.get() + 1)), released)
    }

    #[test]
    fn samples_coalesce_into_one_preview_per_frame() {
        let mut drag = DragController::new();
        let mut events: Vec<GestureEvent> = Vec::new();
        drag.begin_move(
            Point::new(10.0, 10.0),
            [(id("dr_a"), Bounds::new(0.0, 0.0, 20.0, 20.0))],
            CaptureGuard::none(),
        );

        assert!(!drag.frame(&mut events), "no sample yet");
        drag.pointer_move(Point::new(12.0, 10.0), Modifiers::NONE);
        drag.pointer_move(Point::new(15.0, 11.0), Modifiers::NONE);
        drag.pointer_move(Point::new(20.0, 14.0), Modifiers::NONE);
        assert!(drag.frame(&mut events));
        assert!(!drag.frame(&mut events), "sample already consumed");

        assert_eq!(
            events,
            vec![GestureEvent::Preview(GeometryDelta::Move {
                ids: SmallVec::from_slice(&[id("dr_a")]),
                dx: 10.0,
                dy: 4.0,
            })]
        );
    }

    #[test]
    fn pointer_up_commits_once_and_releases_capture() {
        let (guard, released) = counting_guard();
        let mut drag = DragController::new();
        let mut events: Vec<GestureEvent> = Vec::new();
        drag.begin_move(
            Point::new(0.0, 0.0),
            [(id("dr_b"), Bounds::new(0.0, 0.0, 20.0, 20.0))],
            guard,
        );
        drag.pointer_move(Point::new(5.0, 5.0), Modifiers::NONE);
        assert_eq!(released.get(), 0);

        assert!(drag.pointer_up(Point::new(8.0, 6.0), &mut events));
        assert_eq!(released.get(), 1);
        assert!(!drag.is_dragging());
        assert_eq!(
            events,
            vec![GestureEvent::Commit(GeometryDelta::Move {
                ids: SmallVec::from_slice(&[id("dr_b")]),
                dx: 8.0,
                dy: 6.0,
            })]
        );

        // A second release is a no-op.
        assert!(!drag.pointer_up(Point::new(9.0, 9.0), &mut events));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn cancel_discards_and_releases() {
        let (guard, released) = counting_guard();
        let mut drag = DragController::new();
        let mut events: Vec<GestureEvent> = Vec::new();
        drag.begin_lasso(Point::new(0.0, 0.0), Vec::new(), guard);
        drag.pointer_move(Point::new(50.0, 50.0), Modifiers::NONE);

        assert!(drag.cancel());
        assert_eq!(released.get(), 1);
        assert!(!drag.frame(&mut events));
        assert!(!drag.pointer_up(Point::new(60.0, 60.0), &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn dropping_mid_gesture_releases_capture() {
        let (guard, released) = counting_guard();
        {
            let mut drag = DragController::new();
            drag.begin_lasso(Point::new(0.0, 0.0), Vec::new(), guard);
        }
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn click_without_motion_commits_nothing() {
        let mut drag = DragController::new();
        let mut events: Vec<GestureEvent> = Vec::new();
        drag.begin_move(
            Point::new(5.0, 5.0),
            [(id("dr_c"), Bounds::new(0.0, 0.0, 20.0, 20.0))],
            CaptureGuard::none(),
        );
        assert!(!drag.pointer_up(Point::new(5.0, 5.0), &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn shift_constrains_move_to_dominant_axis() {
        let mut drag = DragController::new();
        drag.begin_move(
            Point::new(0.0, 0.0),
            [(id("dr_d"), Bounds::new(0.0, 0.0, 20.0, 20.0))],
            CaptureGuard::none(),
        );
        drag.pointer_move(Point::new(30.0, 4.0), Modifiers::SHIFT);
        assert_eq!(
            drag.current_delta(),
            Some(GeometryDelta::Move {
                ids: SmallVec::from_slice(&[id("dr_d")]),
                dx: 30.0,
                dy: 0.0,
            })
        );
    }

    #[test]
    fn resize_delta_uses_handle_and_min_size() {
        let mut drag = DragController::new();
        let mut events: Vec<GestureEvent> = Vec::new();
        drag.begin_resize(
            Point::new(100.0, 100.0),
            id("dr_e"),
            Bounds::new(0.0, 0.0, 100.0, 100.0),
            HandlePosition::BottomRight,
            10.0,
            CaptureGuard::none(),
        );
        assert_eq!(drag.kind(), Some(DragKind::Resize(HandlePosition::BottomRight)));
        assert!(drag.pointer_up(Point::new(-50.0, 120.0), &mut events));
        assert_eq!(
            events,
            vec![GestureEvent::Commit(GeometryDelta::Resize {
                id: id("dr_e"),
                handle: HandlePosition::BottomRight,
                bounds: Bounds::new(0.0, 0.0, 10.0, 120.0),
            })]
        );
    }

    #[test]
    fn lasso_selects_enclosed_candidates() {
        let mut drag = DragController::new();
        let mut events: Vec<GestureEvent> = Vec::new();
        drag.begin_lasso(
            Point::new(120.0, 60.0),
            [
                (id("dr_l1"), Bounds::new(0.0, 0.0, 50.0, 50.0)),
                (id("dr_l2"), Bounds::new(60.0, 0.0, 50.0, 50.0)),
                (id("dr_l3"), Bounds::new(200.0, 0.0, 50.0, 50.0)),
            ],
            CaptureGuard::none(),
        );
        // Dragging up-left normalizes the rectangle.
        drag.pointer_up(Point::new(-5.0, -5.0), &mut events);
        assert_eq!(
            events,
            vec![GestureEvent::Commit(GeometryDelta::Lasso {
                rect: Bounds::new(-5.0, -5.0, 125.0, 65.0),
                selected: vec![id("dr_l1"), id("dr_l2")],
            })]
        );
    }

    #[test]
    fn second_gesture_is_refused_while_dragging() {
        let mut drag = DragController::new();
        assert!(drag.begin_lasso(Point::new(0.0, 0.0), Vec::new(), CaptureGuard::none()));
        assert!(!drag.begin_move(
            Point::new(0.0, 0.0),
            [(id("dr_f"), Bounds::new(0.0, 0.0, 1.0, 1.0))],
            CaptureGuard::none(),
        ));
        assert_eq!(drag.kind(), Some(DragKind::Lasso));
    }
}
