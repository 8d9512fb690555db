//! Hit testing: point → element lookup, and lasso selection.
//!
//! Reverse-walks the element tree (front-to-back) to find which element is
//! under a canvas position. Children later in paint order sit on top.

use std::collections::HashSet;
use wb_core::{Bounds, ElementId, ElementTree, GeometryMap, NodeIndex, Point};

/// Find the deepest element at `point`.
/// Returns `None` if nothing but the root (background) is hit.
pub fn hit_test(tree: &ElementTree, geometry: &GeometryMap, point: Point) -> Option<ElementId> {
    let mut visited = HashSet::new();
    hit_test_node(tree, tree.root, geometry, point, &mut visited)
}

fn hit_test_node(
    tree: &ElementTree,
    idx: NodeIndex,
    geometry: &GeometryMap,
    point: Point,
    visited: &mut HashSet<NodeIndex>,
) -> Option<ElementId> {
    if !visited.insert(idx) {
        return None;
    }

    // Check children in reverse (topmost first)
    for child in tree.children(idx).into_iter().rev() {
        if let Some(hit) = hit_test_node(tree, child, geometry, point, visited) {
            return Some(hit);
        }
    }

    if idx == tree.root {
        return None;
    }

    let id = tree.graph[idx].id;
    match geometry.bounds(id) {
        Some(b) if b.contains(point) => Some(id),
        _ => None,
    }
}

/// Every element whose box strictly overlaps `drag`, in document order.
///
/// Zero-area boxes (and a zero-area drag) select nothing.
pub fn lasso_select(drag: Bounds, geometry: &GeometryMap) -> Vec<ElementId> {
    geometry
        .iter()
        .filter(|(_, b)| b.bounds().intersects(&drag))
        .map(|(id, _)| id)
        .collect()
}

/// Lasso restricted to the selectable level: direct children of the
/// editing context, or of the root at top level.
pub fn lasso_select_scoped(
    tree: &ElementTree,
    geometry: &GeometryMap,
    drag: Bounds,
    editing_context: Option<ElementId>,
) -> Vec<ElementId> {
    let scope = match editing_context {
        Some(ctx) => match tree.index_of(ctx) {
            Some(idx) => idx,
            None => return Vec::new(),
        },
        None => tree.root,
    };

    tree.children(scope)
        .into_iter()
        .map(|idx| tree.graph[idx].id)
        .filter(|id| geometry.bounds(*id).is_some_and(|b| b.intersects(&drag)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wb_core::{Element, ElementTag, ResolvedBox};

    fn id(s: &str) -> ElementId {
        ElementId::intern(s)
    }

    fn rect(x: f32, y: f32, w: f32, h: f32) -> ResolvedBox {
        ResolvedBox::from_bounds(Bounds::new(x, y, w, h))
    }

    /// body → card → (label, badge); body → footer.
    /// badge overlaps label and paints after it.
    fn fixture() -> (ElementTree, GeometryMap) {
        let el = |name: &str, parent: Option<&str>, order: i32| {
            let mut e = Element::new(id(name), ElementTag::Block).with_order(order);
            e.parent_id = parent.map(id);
            e
        };
        let tree = ElementTree::from_elements([
            el("ht_body", None, 0),
            el("ht_card", Some("ht_body"), 0),
            el("ht_label", Some("ht_card"), 0),
            el("ht_badge", Some("ht_card"), 1),
            el("ht_footer", Some("ht_body"), 1),
        ])
        .unwrap();

        let geometry: GeometryMap = [
            (id("ht_body"), rect(0.0, 0.0, 400.0, 400.0)),
            (id("ht_card"), rect(10.0, 10.0, 200.0, 100.0)),
            (id("ht_label"), rect(20.0, 20.0, 100.0, 20.0)),
            (id("ht_badge"), rect(100.0, 20.0, 40.0, 40.0)),
            (id("ht_footer"), rect(0.0, 300.0, 400.0, 50.0)),
        ]
        .into_iter()
        .collect();
        (tree, geometry)
    }

    #[test]
    fn hit_returns_deepest_element() {
        let (tree, geo) = fixture();
        assert_eq!(hit_test(&tree, &geo, Point::new(30.0, 25.0)), Some(id("ht_label")));
        assert_eq!(hit_test(&tree, &geo, Point::new(150.0, 90.0)), Some(id("ht_card")));
        assert_eq!(hit_test(&tree, &geo, Point::new(10.0, 310.0)), Some(id("ht_footer")));
    }

    #[test]
    fn hit_prefers_topmost_sibling() {
        let (tree, geo) = fixture();
        // (110, 30) lies inside both label and badge.
        assert_eq!(hit_test(&tree, &geo, Point::new(110.0, 30.0)), Some(id("ht_badge")));
    }

    #[test]
    fn hit_on_background_is_none() {
        let (tree, geo) = fixture();
        assert_eq!(hit_test(&tree, &geo, Point::new(300.0, 200.0)), None);
    }

    #[test]
    fn hit_uses_half_open_edges() {
        let (tree, geo) = fixture();
        // Right edge of the card (x = 210) is outside it.
        assert_eq!(hit_test(&tree, &geo, Point::new(210.0, 50.0)), None);
        assert_eq!(hit_test(&tree, &geo, Point::new(10.0, 10.0)), Some(id("ht_card")));
    }

    #[test]
    fn lasso_selects_enclosed_siblings() {
        let geo: GeometryMap = [
            (id("ls_a"), rect(0.0, 0.0, 50.0, 50.0)),
            (id("ls_b"), rect(60.0, 0.0, 50.0, 50.0)),
            (id("ls_c"), rect(200.0, 0.0, 50.0, 50.0)),
        ]
        .into_iter()
        .collect();
        let picked = lasso_select(Bounds::new(-5.0, -5.0, 120.0, 60.0), &geo);
        assert_eq!(picked, vec![id("ls_a"), id("ls_b")]);
    }

    #[test]
    fn lasso_touching_edge_selects_nothing() {
        let geo: GeometryMap = [(id("le_a"), rect(0.0, 0.0, 50.0, 50.0))].into_iter().collect();
        assert!(lasso_select(Bounds::new(50.0, 0.0, 20.0, 20.0), &geo).is_empty());
        assert!(lasso_select(Bounds::new(10.0, 10.0, 0.0, 0.0), &geo).is_empty());
    }

    #[test]
    fn scoped_lasso_respects_editing_context() {
        let (tree, geo) = fixture();
        let drag = Bounds::new(0.0, 0.0, 150.0, 50.0);
        assert_eq!(lasso_select_scoped(&tree, &geo, drag, None), vec![id("ht_card")]);
        assert_eq!(
            lasso_select_scoped(&tree, &geo, drag, Some(id("ht_card"))),
            vec![id("ht_label"), id("ht_badge")]
        );
        assert!(lasso_select_scoped(&tree, &geo, drag, Some(id("ht_missing"))).is_empty());
    }
}
