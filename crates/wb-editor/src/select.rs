//! Selection and editing-context state.
//!
//! Clicks resolve through [`ElementTree::resolve_click_target`], so only
//! elements at the current level are ever selected by pointer.

use crate::input::Modifiers;
use wb_core::{ElementId, ElementTree};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    /// Selected ids, in the order they were added.
    selected: Vec<ElementId>,
    /// Entered container, or `None` at top level.
    editing_context: Option<ElementId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &[ElementId] {
        &self.selected
    }

    pub fn editing_context(&self) -> Option<ElementId> {
        self.editing_context
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Handle a click whose deepest hit is `hit` (`None` for background).
    ///
    /// Shift toggles the resolved target in or out of the selection.
    /// Clicking an already-selected element keeps the selection so it can
    /// be dragged as a group. Returns the resolved target.
    pub fn click(
        &mut self,
        tree: &ElementTree,
        hit: Option<ElementId>,
        modifiers: Modifiers,
    ) -> Option<ElementId> {
        let target = hit.and_then(|h| tree.resolve_click_target(h, self.editing_context));
        match target {
            Some(t) if modifiers.shift => {
                if let Some(pos) = self.selected.iter().position(|id| *id == t) {
                    self.selected.remove(pos);
                } else {
                    self.selected.push(t);
                }
            }
            Some(t) => {
                if !self.selected.contains(&t) {
                    self.selected = vec![t];
                }
            }
            None if !modifiers.shift => self.selected.clear(),
            None => {}
        }
        target
    }

    /// Enter the container under `hit` and select the child clicked inside
    /// it. Does nothing unless the resolved target has children.
    pub fn double_click(&mut self, tree: &ElementTree, hit: ElementId) -> bool {
        let Some(container) = tree.resolve_click_target(hit, self.editing_context) else {
            return false;
        };
        if !tree.has_selectable_children(container) {
            return false;
        }
        log::debug!("entering {container}");
        self.editing_context = Some(container);
        self.selected = tree
            .resolve_click_target(hit, Some(container))
            .into_iter()
            .collect();
        true
    }

    /// Leave the current container one level, selecting it. At top level
    /// this clears the selection. Returns whether anything changed.
    pub fn escape(&mut self, tree: &ElementTree) -> bool {
        match self.editing_context {
            Some(ctx) => {
                self.selected = vec![ctx];
                self.editing_context = tree.editing_context_for(ctx);
                true
            }
            None if !self.selected.is_empty() => {
                self.selected.clear();
                true
            }
            None => false,
        }
    }

    /// Select `id` directly (e.g. from a layer panel), moving the editing
    /// context to its parent.
    pub fn select_direct(&mut self, tree: &ElementTree, id: ElementId) {
        if tree.get(id).is_none() {
            return;
        }
        self.editing_context = tree.editing_context_for(id);
        self.selected = vec![id];
    }

    /// Replace the selection with a lasso result.
    pub fn set(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.selected = ids.into_iter().collect();
    }

    /// Drop ids (and a context) that no longer exist in `tree`.
    pub fn retain_existing(&mut self, tree: &ElementTree) {
        self.selected.retain(|id| tree.get(*id).is_some());
        if self.editing_context.is_some_and(|ctx| tree.get(ctx).is_none()) {
            self.editing_context = None;
        }
    }
}
