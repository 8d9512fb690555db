//! Hierarchical click resolution.
//!
//! A raw hit is the deepest element under the pointer. What the user may
//! select depends on the editing context: at top level only children of the
//! root are selectable; inside an entered container only its direct
//! children are. Every walk here follows `parent_id` links with a visited
//! set, so a malformed snapshot ends the walk instead of looping.

use crate::id::ElementId;
use crate::model::ElementTree;
use std::collections::HashSet;

impl ElementTree {
    /// Parent id of `id`, if both exist in this snapshot.
    fn parent_id_of(&self, id: ElementId) -> Option<ElementId> {
        self.get(id)?.parent_id
    }

    /// Map the deepest hit to the element the click should select.
    ///
    /// With no editing context the walk stops at the first element whose
    /// parent is the root; with a context it stops at the first element
    /// whose parent is that context. Returns `None` when the walk leaves the
    /// tree first (the root itself is never selected this way).
    pub fn resolve_click_target(
        &self,
        hit: ElementId,
        editing_context: Option<ElementId>,
    ) -> Option<ElementId> {
        let stop_parent = editing_context.unwrap_or_else(|| self.root_id());
        let mut visited = HashSet::new();
        let mut current = hit;
        loop {
            if !visited.insert(current) {
                log::warn!("click resolution hit a parent cycle at {current}");
                return None;
            }
            let parent = self.parent_id_of(current)?;
            if parent == stop_parent {
                return Some(current);
            }
            current = parent;
        }
    }

    /// Whether double-clicking `id` can enter it as a container.
    pub fn has_selectable_children(&self, id: ElementId) -> bool {
        self.index_of(id)
            .is_some_and(|idx| !self.children(idx).is_empty())
    }

    /// `id` followed by its ancestors up to the root.
    pub fn ancestor_chain(&self, id: ElementId) -> Vec<ElementId> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if self.get(node).is_none() || !visited.insert(node) {
                break;
            }
            chain.push(node);
            current = self.parent_id_of(node);
        }
        chain
    }

    /// The editing context implied by selecting `selected` directly (for
    /// example from a tree panel): its parent, or `None` when that parent is
    /// the root.
    pub fn editing_context_for(&self, selected: ElementId) -> Option<ElementId> {
        let parent = self.parent_id_of(selected)?;
        if parent == self.root_id() || self.get(parent).is_none() {
            None
        } else {
            Some(parent)
        }
    }

    /// Whether `id` is a strict descendant of `ancestor`.
    pub fn is_descendant_of(&self, id: ElementId, ancestor: ElementId) -> bool {
        self.ancestor_chain(id)
            .into_iter()
            .skip(1)
            .any(|a| a == ancestor)
    }
}
