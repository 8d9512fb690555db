//! Selection geometry: combined bounds and resize handles.
//!
//! Everything here is derived from the geometry map on demand. Nothing is
//! cached between frames.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wb_core::{Bounds, ElementId, GeometryError, GeometryMap, Point, combine_bounds};

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("element {0} has no resolved geometry")]
    NotFound(ElementId),
    #[error(transparent)]
    Empty(#[from] GeometryError),
}

/// Border box of one element.
pub fn bounds_of(geometry: &GeometryMap, id: ElementId) -> Result<Bounds, SelectionError> {
    geometry.bounds(id).ok_or(SelectionError::NotFound(id))
}

/// Union of the border boxes of `ids`.
///
/// Fails with `NotFound` on the first id missing from the map, and with
/// `Empty` when `ids` is empty.
pub fn combined_bounds_of(
    geometry: &GeometryMap,
    ids: impl IntoIterator<Item = ElementId>,
) -> Result<Bounds, SelectionError> {
    let boxes = ids
        .into_iter()
        .map(|id| bounds_of(geometry, id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(combine_bounds(&boxes)?)
}

/// Selection chrome sizes, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandleConfig {
    /// Side length of the square grab area around each anchor.
    pub handle_size: f32,
    /// Smallest width/height a resize may produce.
    pub min_size: f32,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            handle_size: 8.0,
            min_size: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandlePosition {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleRight,
    BottomRight,
    BottomCenter,
    BottomLeft,
    MiddleLeft,
}

impl HandlePosition {
    /// Clockwise from the top-left corner.
    pub const ALL: [HandlePosition; 8] = [
        HandlePosition::TopLeft,
        HandlePosition::TopCenter,
        HandlePosition::TopRight,
        HandlePosition::MiddleRight,
        HandlePosition::BottomRight,
        HandlePosition::BottomCenter,
        HandlePosition::BottomLeft,
        HandlePosition::MiddleLeft,
    ];

    /// Where this handle sits on `b`.
    pub fn anchor(self, b: &Bounds) -> Point {
        let cx = b.x + b.width / 2.0;
        let cy = b.y + b.height / 2.0;
        match self {
            HandlePosition::TopLeft => Point::new(b.x, b.y),
            HandlePosition::TopCenter => Point::new(cx, b.y),
            HandlePosition::TopRight => Point::new(b.right(), b.y),
            HandlePosition::MiddleRight => Point::new(b.right(), cy),
            HandlePosition::BottomRight => Point::new(b.right(), b.bottom()),
            HandlePosition::BottomCenter => Point::new(cx, b.bottom()),
            HandlePosition::BottomLeft => Point::new(b.x, b.bottom()),
            HandlePosition::MiddleLeft => Point::new(b.x, cy),
        }
    }

    pub fn cursor(self) -> CursorStyle {
        match self {
            HandlePosition::TopLeft | HandlePosition::BottomRight => CursorStyle::NwseResize,
            HandlePosition::TopRight | HandlePosition::BottomLeft => CursorStyle::NeswResize,
            HandlePosition::TopCenter | HandlePosition::BottomCenter => CursorStyle::NsResize,
            HandlePosition::MiddleLeft | HandlePosition::MiddleRight => CursorStyle::EwResize,
        }
    }

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            HandlePosition::TopLeft
                | HandlePosition::TopRight
                | HandlePosition::BottomRight
                | HandlePosition::BottomLeft
        )
    }

    fn moves_left(self) -> bool {
        matches!(
            self,
            HandlePosition::TopLeft | HandlePosition::MiddleLeft | HandlePosition::BottomLeft
        )
    }

    fn moves_right(self) -> bool {
        matches!(
            self,
            HandlePosition::TopRight | HandlePosition::MiddleRight | HandlePosition::BottomRight
        )
    }

    fn moves_top(self) -> bool {
        matches!(
            self,
            HandlePosition::TopLeft | HandlePosition::TopCenter | HandlePosition::TopRight
        )
    }

    fn moves_bottom(self) -> bool {
        matches!(
            self,
            HandlePosition::BottomLeft | HandlePosition::BottomCenter | HandlePosition::BottomRight
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CursorStyle {
    NwseResize,
    NsResize,
    NeswResize,
    EwResize,
}

impl CursorStyle {
    /// The CSS `cursor` keyword.
    pub fn as_css(self) -> &'static str {
        match self {
            CursorStyle::NwseResize => "nwse-resize",
            CursorStyle::NsResize => "ns-resize",
            CursorStyle::NeswResize => "nesw-resize",
            CursorStyle::EwResize => "ew-resize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeHandle {
    pub position: HandlePosition,
    pub center: Point,
    /// Grab area, `handle_size` square around `center`.
    pub rect: Bounds,
    pub cursor: CursorStyle,
}

/// The eight resize handles of `bounds`, in [`HandlePosition::ALL`] order.
pub fn resize_handles(bounds: &Bounds, config: &HandleConfig) -> [ResizeHandle; 8] {
    let half = config.handle_size / 2.0;
    HandlePosition::ALL.map(|position| {
        let center = position.anchor(bounds);
        ResizeHandle {
            position,
            center,
            rect: Bounds::new(
                center.x - half,
                center.y - half,
                config.handle_size,
                config.handle_size,
            ),
            cursor: position.cursor(),
        }
    })
}

/// Which handle of `bounds` is under `point`. Corners win over edge
/// midpoints when grab areas overlap on small boxes.
pub fn handle_at(bounds: &Bounds, point: Point, config: &HandleConfig) -> Option<HandlePosition> {
    let handles = resize_handles(bounds, config);
    handles
        .iter()
        .filter(|h| h.position.is_corner())
        .chain(handles.iter().filter(|h| !h.position.is_corner()))
        .find(|h| h.rect.contains(point))
        .map(|h| h.position)
}

/// `origin` resized by dragging `handle` by `delta`.
///
/// The edge opposite each dragged edge stays put, and neither side shrinks
/// below `min_size`.
pub fn resized_bounds(origin: &Bounds, handle: HandlePosition, delta: Point, min_size: f32) -> Bounds {
    let mut left = origin.x;
    let mut top = origin.y;
    let mut right = origin.right();
    let mut bottom = origin.bottom();

    if handle.moves_left() {
        left = (left + delta.x).min(right - min_size);
    }
    if handle.moves_right() {
        right = (right + delta.x).max(left + min_size);
    }
    if handle.moves_top() {
        top = (top + delta.y).min(bottom - min_size);
    }
    if handle.moves_bottom() {
        bottom = (bottom + delta.y).max(top + min_size);
    }

    Bounds::new(left, top, right - left, bottom - top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wb_core::ResolvedBox;

    fn id(s: &str) -> ElementId {
        ElementId::intern(s)
    }

    fn geo() -> GeometryMap {
        [
            (id("sel_a"), ResolvedBox::from_bounds(Bounds::new(0.0, 0.0, 10.0, 10.0))),
            (id("sel_b"), ResolvedBox::from_bounds(Bounds::new(20.0, 30.0, 10.0, 10.0))),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn bounds_lookup() {
        let g = geo();
        assert_eq!(bounds_of(&g, id("sel_b")), Ok(Bounds::new(20.0, 30.0, 10.0, 10.0)));
        assert_eq!(
            bounds_of(&g, id("sel_nope")),
            Err(SelectionError::NotFound(id("sel_nope")))
        );
    }

    #[test]
    fn combined_bounds() {
        let g = geo();
        assert_eq!(
            combined_bounds_of(&g, [id("sel_a"), id("sel_b")]),
            Ok(Bounds::new(0.0, 0.0, 30.0, 40.0))
        );
        assert_eq!(
            combined_bounds_of(&g, Vec::new()),
            Err(SelectionError::Empty(GeometryError::EmptyInput))
        );
        assert_eq!(
            combined_bounds_of(&g, [id("sel_a"), id("sel_gone")]),
            Err(SelectionError::NotFound(id("sel_gone")))
        );
    }

    #[test]
    fn handles_sit_on_corners_and_midpoints() {
        let b = Bounds::new(100.0, 50.0, 200.0, 80.0);
        let handles = resize_handles(&b, &HandleConfig::default());
        let centers: Vec<_> = handles.iter().map(|h| (h.center.x, h.center.y)).collect();
        assert_eq!(
            centers,
            vec![
                (100.0, 50.0),
                (200.0, 50.0),
                (300.0, 50.0),
                (300.0, 90.0),
                (300.0, 130.0),
                (200.0, 130.0),
                (100.0, 130.0),
                (100.0, 90.0),
            ]
        );
        assert_eq!(handles[0].rect, Bounds::new(96.0, 46.0, 8.0, 8.0));
        let cursors: Vec<_> = handles.iter().map(|h| h.cursor.as_css()).collect();
        assert_eq!(
            cursors,
            vec![
                "nwse-resize",
                "ns-resize",
                "nesw-resize",
                "ew-resize",
                "nwse-resize",
                "ns-resize",
                "nesw-resize",
                "ew-resize",
            ]
        );
    }

    #[test]
    fn handle_hit_prefers_corners() {
        let config = HandleConfig::default();
        let b = Bounds::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(handle_at(&b, Point::new(101.0, 99.0), &config), Some(HandlePosition::BottomRight));
        assert_eq!(handle_at(&b, Point::new(50.0, -2.0), &config), Some(HandlePosition::TopCenter));
        assert_eq!(handle_at(&b, Point::new(50.0, 50.0), &config), None);

        // On a 6px box every grab area overlaps; the corner wins.
        let tiny = Bounds::new(0.0, 0.0, 6.0, 6.0);
        assert_eq!(handle_at(&tiny, Point::new(3.0, 0.0), &config), Some(HandlePosition::TopLeft));
    }

    #[test]
    fn resize_anchors_opposite_edge() {
        let b = Bounds::new(10.0, 10.0, 100.0, 50.0);
        assert_eq!(
            resized_bounds(&b, HandlePosition::BottomRight, Point::new(20.0, 10.0), 10.0),
            Bounds::new(10.0, 10.0, 120.0, 60.0)
        );
        assert_eq!(
            resized_bounds(&b, HandlePosition::TopLeft, Point::new(-10.0, 5.0), 10.0),
            Bounds::new(0.0, 15.0, 110.0, 45.0)
        );
        // Edge handles only move one axis.
        assert_eq!(
            resized_bounds(&b, HandlePosition::MiddleLeft, Point::new(30.0, 99.0), 10.0),
            Bounds::new(40.0, 10.0, 70.0, 50.0)
        );
    }

    #[test]
    fn resize_clamps_to_min_size() {
        let b = Bounds::new(10.0, 10.0, 100.0, 50.0);
        assert_eq!(
            resized_bounds(&b, HandlePosition::TopLeft, Point::new(500.0, 500.0), 10.0),
            Bounds::new(100.0, 50.0, 10.0, 10.0)
        );
        assert_eq!(
            resized_bounds(&b, HandlePosition::BottomCenter, Point::new(0.0, -200.0), 10.0),
            Bounds::new(10.0, 10.0, 100.0, 10.0)
        );
    }
}
