//! Box layout resolver.
//!
//! Walks an [`ElementTree`] snapshot depth-first and produces a
//! [`GeometryMap`]: one absolute border box per laid-out element, in a single
//! y-down coordinate space. Each pass is a pure function of the snapshot;
//! nothing is carried between passes except the optional fallback map used
//! when text measurement fails.
//!
//! Supported model: block stacking (no margin collapsing), relative offsets,
//! absolute positioning against the parent's padding box, flex rows/columns
//! with justify/align/gap/wrap, box-sizing, min/max clamping, and text leaves
//! sized through a [`TextMeasure`].

use crate::geometry::{Bounds, Edges, Point};
use crate::id::ElementId;
use crate::model::*;
use crate::text::TextMeasure;
use petgraph::graph::NodeIndex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// The canvas (viewport) dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// The resolved border box of one element, plus the edges needed to derive
/// its content and margin rects.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolvedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub padding: Edges,
    pub border: Edges,
    pub margin: Edges,
}

impl ResolvedBox {
    /// A box with no padding, border, or margin.
    pub fn from_bounds(b: Bounds) -> Self {
        Self {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
            ..Self::default()
        }
    }

    /// Border box.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn padding_rect(&self) -> Bounds {
        self.bounds().inset(&self.border)
    }

    pub fn content_rect(&self) -> Bounds {
        self.padding_rect().inset(&self.padding)
    }

    pub fn margin_rect(&self) -> Bounds {
        self.bounds().outset(&self.margin)
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    fn outer_width(&self) -> f32 {
        self.width + self.margin.horizontal()
    }

    fn outer_height(&self) -> f32 {
        self.height + self.margin.vertical()
    }
}

/// Element id → resolved box, in paint order.
///
/// Equality and serialization follow insertion order, so two passes over
/// the same snapshot compare and serialize identically.
#[derive(Debug, Clone, Default)]
pub struct GeometryMap {
    entries: Vec<(ElementId, ResolvedBox)>,
    index: HashMap<ElementId, usize>,
}

impl GeometryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced entry keeps its position.
    pub fn insert(&mut self, id: ElementId, b: ResolvedBox) {
        match self.index.get(&id) {
            Some(&i) => self.entries[i].1 = b,
            None => {
                self.index.insert(id, self.entries.len());
                self.entries.push((id, b));
            }
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&ResolvedBox> {
        self.index.get(&id).map(|&i| &self.entries[i].1)
    }

    pub fn bounds(&self, id: ElementId) -> Option<Bounds> {
        self.get(id).map(ResolvedBox::bounds)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (ElementId, &ResolvedBox)> {
        self.entries.iter().map(|(id, b)| (*id, b))
    }

    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for GeometryMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl FromIterator<(ElementId, ResolvedBox)> for GeometryMap {
    fn from_iter<T: IntoIterator<Item = (ElementId, ResolvedBox)>>(iter: T) -> Self {
        let mut map = GeometryMap::new();
        for (id, b) in iter {
            map.insert(id, b);
        }
        map
    }
}

impl Serialize for GeometryMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, b) in &self.entries {
            map.serialize_entry(id, b)?;
        }
        map.end()
    }
}

/// A non-fatal problem found during a pass. The rest of the tree still
/// lays out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LayoutDiagnostic {
    /// The element's parent id names no element; its subtree was skipped.
    UnresolvableParent { id: ElementId, parent: ElementId },
    /// Text measurement failed; the box kept its previous size if one was
    /// known, otherwise a zero content size.
    MeasurementFailed {
        id: ElementId,
        error: String,
        used_previous: bool,
    },
}

impl fmt::Display for LayoutDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutDiagnostic::UnresolvableParent { id, parent } => {
                write!(f, "{id}: parent {parent} does not exist, subtree skipped")
            }
            LayoutDiagnostic::MeasurementFailed {
                id,
                error,
                used_previous,
            } => {
                let fallback = if *used_previous {
                    "previous size"
                } else {
                    "zero size"
                };
                write!(f, "{id}: text measurement failed ({error}), using {fallback}")
            }
        }
    }
}

/// Fatal layout failures. The pass is abandoned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("cyclic parent chain through element {id}")]
    CyclicTree { id: ElementId },
}

/// Geometry for every laid-out element plus the diagnostics of the pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LayoutOutput {
    pub geometry: GeometryMap,
    pub diagnostics: Vec<LayoutDiagnostic>,
}

/// Resolve the whole tree.
pub fn resolve_layout(
    tree: &ElementTree,
    viewport: Viewport,
    measurer: &mut dyn TextMeasure,
) -> Result<LayoutOutput, LayoutError> {
    run_pass(tree, viewport, measurer, None)
}

/// Like [`resolve_layout`], but text whose measurement fails keeps its box
/// size from `previous`.
pub fn resolve_layout_with_fallback(
    tree: &ElementTree,
    viewport: Viewport,
    measurer: &mut dyn TextMeasure,
    previous: &GeometryMap,
) -> Result<LayoutOutput, LayoutError> {
    run_pass(tree, viewport, measurer, Some(previous))
}

fn run_pass(
    tree: &ElementTree,
    viewport: Viewport,
    measurer: &mut dyn TextMeasure,
    previous: Option<&GeometryMap>,
) -> Result<LayoutOutput, LayoutError> {
    if let Err(cycle) = petgraph::algo::toposort(&tree.graph, None) {
        let id = tree.graph[cycle.node_id()].id;
        log::warn!("layout aborted: cyclic parent chain through {id}");
        return Err(LayoutError::CyclicTree { id });
    }

    let mut pass = LayoutPass {
        tree,
        measurer,
        previous,
        boxes: Vec::with_capacity(tree.len()),
        diagnostics: Vec::new(),
        on_stack: HashSet::new(),
        failed: HashSet::new(),
    };

    for &orphan in tree.orphans() {
        let el = &tree.graph[orphan];
        if let Some(parent) = el.parent_id {
            log::warn!("skipping {}: parent {parent} does not exist", el.id);
            pass.diagnostics.push(LayoutDiagnostic::UnresolvableParent { id: el.id, parent });
        }
    }

    let root = &tree.graph[tree.root];
    if root.style.is_hidden() {
        log::debug!("root {} has display:none, nothing to lay out", root.id);
    } else {
        pass.layout_node(
            tree.root,
            ContainingBlock {
                width: viewport.width,
                height: Some(viewport.height),
            },
            Point::default(),
            Constraints {
                available: viewport.width,
                sizing: InlineSizing::Stretch,
                width: None,
                height: None,
                fill_height: Some(viewport.height),
            },
        )?;
    }

    let geometry: GeometryMap = pass.boxes.into_iter().collect();
    log::debug!(
        "layout pass: {} boxes, {} diagnostics, viewport {}x{}",
        geometry.len(),
        pass.diagnostics.len(),
        viewport.width,
        viewport.height
    );
    Ok(LayoutOutput {
        geometry,
        diagnostics: pass.diagnostics,
    })
}

// ─── Pass internals ──────────────────────────────────────────────────────

/// Size of the box percentages resolve against.
#[derive(Debug, Clone, Copy)]
struct ContainingBlock {
    width: f32,
    /// `None` when the containing block's height depends on its content.
    height: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineSizing {
    /// Auto width fills the available width.
    Stretch,
    /// Auto width shrinks to the content, up to the available width.
    ShrinkToFit,
}

#[derive(Debug, Clone, Copy)]
struct Constraints {
    /// Width available to the margin box.
    available: f32,
    sizing: InlineSizing,
    /// Border-box sizes imposed by the parent (flex stretch, absolute fill).
    width: Option<f32>,
    height: Option<f32>,
    /// Auto height grows to at least this margin-box height.
    fill_height: Option<f32>,
}

impl Constraints {
    fn flow(available: f32, sizing: InlineSizing) -> Self {
        Self {
            available,
            sizing,
            width: None,
            height: None,
            fill_height: None,
        }
    }
}

/// Width and height of in-flow content.
#[derive(Debug, Clone, Copy, Default)]
struct Extent {
    width: f32,
    height: f32,
}

struct LayoutPass<'a> {
    tree: &'a ElementTree,
    measurer: &'a mut dyn TextMeasure,
    previous: Option<&'a GeometryMap>,
    /// Output in paint order.
    boxes: Vec<(ElementId, ResolvedBox)>,
    diagnostics: Vec<LayoutDiagnostic>,
    /// Nodes on the current recursion path.
    on_stack: HashSet<NodeIndex>,
    /// Text leaves already reported as failing (re-layouts re-measure).
    failed: HashSet<ElementId>,
}

fn to_border_box(v: f32, frame: f32, sizing: BoxSizing) -> f32 {
    match sizing {
        BoxSizing::ContentBox => v + frame,
        BoxSizing::BorderBox => v.max(frame),
    }
}

fn clamp_size(
    v: f32,
    min: Dimension,
    max: Dimension,
    basis: Option<f32>,
    frame: f32,
    sizing: BoxSizing,
) -> f32 {
    let mut v = v;
    if let Some(max) = max.resolve(basis) {
        v = v.min(to_border_box(max, frame, sizing));
    }
    if let Some(min) = min.resolve(basis) {
        v = v.max(to_border_box(min, frame, sizing));
    }
    v.max(frame).max(0.0)
}

fn translate_all(boxes: &mut [(ElementId, ResolvedBox)], dx: f32, dy: f32) {
    if dx == 0.0 && dy == 0.0 {
        return;
    }
    for (_, b) in boxes {
        b.translate(dx, dy);
    }
}

impl LayoutPass<'_> {
    /// Lay out `idx` with its margin box starting at `origin`.
    ///
    /// Pushes the node's box followed by its subtree, and returns the box as
    /// placed in flow (before any relative offset).
    fn layout_node(
        &mut self,
        idx: NodeIndex,
        cb: ContainingBlock,
        origin: Point,
        c: Constraints,
    ) -> Result<ResolvedBox, LayoutError> {
        let tree = self.tree;
        let el = &tree.graph[idx];
        if !self.on_stack.insert(idx) {
            return Err(LayoutError::CyclicTree { id: el.id });
        }
        let style = &el.style;

        let padding = style.padding.map(|v| v.resolve(cb.width).max(0.0));
        let border = style.border.map(|v| v.resolve(cb.width).max(0.0));
        let margin = style.margin.map(|v| v.resolve(cb.width));
        let frame_w = padding.horizontal() + border.horizontal();
        let frame_h = padding.vertical() + border.vertical();

        let clamp_w =
            |w: f32| clamp_size(w, style.min_width, style.max_width, Some(cb.width), frame_w, style.box_sizing);
        let clamp_h =
            |h: f32| clamp_size(h, style.min_height, style.max_height, cb.height, frame_h, style.box_sizing);

        let definite_w = c
            .width
            .or_else(|| {
                style
                    .width
                    .resolve(Some(cb.width))
                    .map(|w| to_border_box(w, frame_w, style.box_sizing))
            })
            .map(clamp_w);
        let definite_h = c
            .height
            .or_else(|| {
                style
                    .height
                    .resolve(cb.height)
                    .map(|h| to_border_box(h, frame_h, style.box_sizing))
            })
            .map(clamp_h);

        let slot = self.boxes.len();
        self.boxes.push((el.id, ResolvedBox::default()));

        let x = origin.x + margin.left;
        let y = origin.y + margin.top;
        let available_w = (c.available - margin.horizontal()).max(frame_w);
        let children = tree.children(idx);

        let text_leaf = el.text.is_some()
            && children.iter().all(|&child| tree.graph[child].style.is_hidden());
        let (width, height) = if text_leaf {
            let max_content = (definite_w.unwrap_or(available_w) - frame_w).max(0.0);
            let (text_w, text_h) = self.measure_text_leaf(el, max_content, frame_w, frame_h);
            let width = definite_w.unwrap_or_else(|| clamp_w(text_w + frame_w));
            let height = definite_h.unwrap_or_else(|| clamp_h(text_h + frame_h));
            (width, height)
        } else {
            let content_origin = Point::new(
                x + border.left + padding.left,
                y + border.top + padding.top,
            );
            let content_h = definite_h.map(|h| (h - frame_h).max(0.0));

            let (width, extent) = match definite_w {
                Some(w) => {
                    let cw = (w - frame_w).max(0.0);
                    let extent = self.layout_children(
                        idx,
                        &children,
                        content_origin,
                        cw,
                        content_h,
                        InlineSizing::Stretch,
                    )?;
                    (w, extent)
                }
                None if c.sizing == InlineSizing::Stretch => {
                    let w = clamp_w(available_w);
                    let extent = self.layout_children(
                        idx,
                        &children,
                        content_origin,
                        (w - frame_w).max(0.0),
                        content_h,
                        InlineSizing::Stretch,
                    )?;
                    (w, extent)
                }
                None => {
                    // Probe at the widest allowed size, then lay out again at
                    // the content width so stretchy children fill it.
                    let max_content = (available_w - frame_w).max(0.0);
                    let start = self.boxes.len();
                    let probe = self.layout_children(
                        idx,
                        &children,
                        content_origin,
                        max_content,
                        content_h,
                        InlineSizing::ShrinkToFit,
                    )?;
                    self.boxes.truncate(start);
                    let w = clamp_w(probe.width.min(max_content) + frame_w);
                    let extent = self.layout_children(
                        idx,
                        &children,
                        content_origin,
                        (w - frame_w).max(0.0),
                        content_h,
                        InlineSizing::Stretch,
                    )?;
                    (w, extent)
                }
            };

            let height = definite_h.unwrap_or_else(|| {
                let mut h = extent.height + frame_h;
                if let Some(fill) = c.fill_height {
                    h = h.max(fill - margin.vertical());
                }
                clamp_h(h)
            });
            (width, height)
        };

        let resolved = ResolvedBox {
            x,
            y,
            width,
            height,
            padding,
            border,
            margin,
        };
        self.boxes[slot].1 = resolved;
        log::trace!("{} → {:?}", el.id, resolved.bounds());

        let padding_box = resolved.padding_rect();
        for &child in &children {
            let child_style = &tree.graph[child].style;
            if child_style.position.is_out_of_flow() && !child_style.is_hidden() {
                self.layout_absolute(child, padding_box)?;
            }
        }

        if let Position::Relative(inset) = &style.position {
            let dx = inset
                .left
                .map(|v| v.resolve(cb.width))
                .or_else(|| inset.right.map(|v| -v.resolve(cb.width)))
                .unwrap_or(0.0);
            let dy = inset
                .top
                .and_then(|v| v.resolve_opt(cb.height))
                .or_else(|| inset.bottom.and_then(|v| v.resolve_opt(cb.height)).map(|v| -v))
                .unwrap_or(0.0);
            translate_all(&mut self.boxes[slot..], dx, dy);
        }

        self.on_stack.remove(&idx);
        Ok(resolved)
    }

    fn measure_text_leaf(
        &mut self,
        el: &Element,
        max_width: f32,
        frame_w: f32,
        frame_h: f32,
    ) -> (f32, f32) {
        let text = el.text.as_deref().unwrap_or_default();
        match self.measurer.measure(text, &el.style.text, max_width) {
            Ok(m) => (m.width, m.height),
            Err(err) => {
                let fallback = self.previous.and_then(|prev| prev.get(el.id)).map(|b| {
                    ((b.width - frame_w).max(0.0), (b.height - frame_h).max(0.0))
                });
                if self.failed.insert(el.id) {
                    log::warn!("text measurement failed for {}: {err}", el.id);
                    self.diagnostics.push(LayoutDiagnostic::MeasurementFailed {
                        id: el.id,
                        error: err.to_string(),
                        used_previous: fallback.is_some(),
                    });
                }
                fallback.unwrap_or((0.0, 0.0))
            }
        }
    }

    /// Lay out the in-flow children of `parent` inside its content box.
    fn layout_children(
        &mut self,
        parent: NodeIndex,
        children: &[NodeIndex],
        origin: Point,
        content_w: f32,
        content_h: Option<f32>,
        sizing: InlineSizing,
    ) -> Result<Extent, LayoutError> {
        let tree = self.tree;
        let flow: Vec<NodeIndex> = children
            .iter()
            .copied()
            .filter(|&c| {
                let style = &tree.graph[c].style;
                if style.is_hidden() {
                    log::trace!("{} hidden, subtree skipped", tree.graph[c].id);
                    return false;
                }
                !style.position.is_out_of_flow()
            })
            .collect();
        let cb = ContainingBlock {
            width: content_w,
            height: content_h,
        };

        match &tree.graph[parent].style.display {
            Display::Flex(flex) => self.layout_flex(&flow, flex, cb, origin),
            Display::Block | Display::FlowRoot | Display::None => {
                let mut cursor = origin.y;
                let mut width: f32 = 0.0;
                for &child in &flow {
                    let b = self.layout_node(
                        child,
                        cb,
                        Point::new(origin.x, cursor),
                        Constraints::flow(content_w, sizing),
                    )?;
                    cursor += b.outer_height();
                    width = width.max(b.outer_width());
                }
                Ok(Extent {
                    width,
                    height: cursor - origin.y,
                })
            }
        }
    }

    fn layout_flex(
        &mut self,
        flow: &[NodeIndex],
        flex: &FlexContainer,
        cb: ContainingBlock,
        origin: Point,
    ) -> Result<Extent, LayoutError> {
        let tree = self.tree;
        let row = flex.direction == FlexDirection::Row;
        let gap = flex.gap;
        let item_sizing = if !row && flex.align_items == AlignItems::Stretch {
            InlineSizing::Stretch
        } else {
            InlineSizing::ShrinkToFit
        };

        // Lay out every item at the content origin, keeping each subtree
        // aside so items can be re-laid out and moved independently.
        let base = self.boxes.len();
        let mut items = Vec::with_capacity(flow.len());
        for &child in flow {
            let b = self.layout_node(child, cb, origin, Constraints::flow(cb.width, item_sizing))?;
            items.push(FlexItem {
                idx: child,
                resolved: b,
                subtree: self.boxes.split_off(base),
            });
        }

        let main_of = |b: &ResolvedBox| if row { b.outer_width() } else { b.outer_height() };
        let cross_of = |b: &ResolvedBox| if row { b.outer_height() } else { b.outer_width() };
        let main_space = if row { Some(cb.width) } else { cb.height };
        let cross_space = if row { cb.height } else { Some(cb.width) };

        // Break into lines.
        let mut lines: Vec<std::ops::Range<usize>> = Vec::new();
        let mut start = 0;
        let mut used = 0.0;
        for (i, item) in items.iter().enumerate() {
            let m = main_of(&item.resolved);
            let limit = main_space.unwrap_or(f32::INFINITY);
            if flex.wrap == FlexWrap::Wrap && i > start && used + gap + m > limit {
                lines.push(start..i);
                start = i;
                used = m;
            } else if i > start {
                used += gap + m;
            } else {
                used = m;
            }
        }
        if !items.is_empty() {
            lines.push(start..items.len());
        }
        let single_line = lines.len() == 1;

        let mut extent = Extent::default();
        let mut line_offset = 0.0;
        for (line_no, line) in lines.iter().enumerate() {
            let content_cross = items[line.clone()]
                .iter()
                .map(|item| cross_of(&item.resolved))
                .fold(0.0, f32::max);
            let line_cross = match cross_space {
                Some(space) if single_line => space,
                _ => content_cross,
            };

            if !row && flex.align_items == AlignItems::Stretch {
                for item in &mut items[line.clone()] {
                    let style = &tree.graph[item.idx].style;
                    if !style.width.is_auto() {
                        continue;
                    }
                    let target = (line_cross - item.resolved.margin.horizontal()).max(0.0);
                    if target == item.resolved.width {
                        continue;
                    }
                    item.resolved = self.layout_node(
                        item.idx,
                        cb,
                        origin,
                        Constraints {
                            width: Some(target),
                            ..Constraints::flow(cb.width, item_sizing)
                        },
                    )?;
                    item.subtree = self.boxes.split_off(base);
                }
            }

            if row && flex.align_items == AlignItems::Stretch {
                for item in &mut items[line.clone()] {
                    let style = &tree.graph[item.idx].style;
                    if !style.height.is_auto() {
                        continue;
                    }
                    let target = (line_cross - item.resolved.margin.vertical()).max(0.0);
                    if target == item.resolved.height {
                        continue;
                    }
                    let width = item.resolved.width;
                    item.resolved = self.layout_node(
                        item.idx,
                        cb,
                        origin,
                        Constraints {
                            width: Some(width),
                            height: Some(target),
                            ..Constraints::flow(cb.width, item_sizing)
                        },
                    )?;
                    item.subtree = self.boxes.split_off(base);
                }
            }

            let n = line.len();
            let used_main: f32 = items[line.clone()]
                .iter()
                .map(|item| main_of(&item.resolved))
                .sum::<f32>()
                + gap * n.saturating_sub(1) as f32;
            let free = main_space.map_or(0.0, |space| space - used_main);
            let (lead, between) = distribute(flex.justify_content, free, n, gap);

            let mut pos = lead;
            for item in &mut items[line.clone()] {
                let cross_free = line_cross - cross_of(&item.resolved);
                let cross_off = match flex.align_items {
                    AlignItems::FlexStart | AlignItems::Stretch => 0.0,
                    AlignItems::Center => cross_free / 2.0,
                    AlignItems::FlexEnd => cross_free,
                };
                let (dx, dy) = if row {
                    (pos, line_offset + cross_off)
                } else {
                    (line_offset + cross_off, pos)
                };
                translate_all(&mut item.subtree, dx, dy);
                pos += main_of(&item.resolved) + between;
            }

            if row {
                extent.width = extent.width.max(used_main);
                extent.height += content_cross;
            } else {
                extent.height = extent.height.max(used_main);
                extent.width += content_cross;
            }
            if line_no + 1 < lines.len() {
                if row {
                    extent.height += gap;
                } else {
                    extent.width += gap;
                }
            }
            line_offset += line_cross + gap;
        }

        for item in items {
            self.boxes.extend(item.subtree);
        }
        Ok(extent)
    }

    /// Place an absolutely positioned child against `pb` (the parent's
    /// padding box).
    fn layout_absolute(&mut self, child: NodeIndex, pb: Bounds) -> Result<(), LayoutError> {
        let tree = self.tree;
        let style = &tree.graph[child].style;
        let inset = style.position.inset().copied().unwrap_or_default();
        let left = inset.left.map(|v| v.resolve(pb.width));
        let right = inset.right.map(|v| v.resolve(pb.width));
        let top = inset.top.map(|v| v.resolve(pb.height));
        let bottom = inset.bottom.map(|v| v.resolve(pb.height));
        let margin = style.margin.map(|v| v.resolve(pb.width));

        let fill_w = match (left, right) {
            (Some(l), Some(r)) if style.width.is_auto() => {
                Some((pb.width - l - r - margin.horizontal()).max(0.0))
            }
            _ => None,
        };
        let fill_h = match (top, bottom) {
            (Some(t), Some(b)) if style.height.is_auto() => {
                Some((pb.height - t - b - margin.vertical()).max(0.0))
            }
            _ => None,
        };

        let origin = Point::new(pb.x + left.unwrap_or(0.0), pb.y + top.unwrap_or(0.0));
        let available = (pb.width - left.unwrap_or(0.0) - right.unwrap_or(0.0)).max(0.0);
        let start = self.boxes.len();
        let b = self.layout_node(
            child,
            ContainingBlock {
                width: pb.width,
                height: Some(pb.height),
            },
            origin,
            Constraints {
                width: fill_w,
                height: fill_h,
                ..Constraints::flow(available, InlineSizing::ShrinkToFit)
            },
        )?;

        let dx = match (left, right) {
            (None, Some(r)) => pb.right() - r - b.outer_width() - origin.x,
            _ => 0.0,
        };
        let dy = match (top, bottom) {
            (None, Some(bt)) => pb.bottom() - bt - b.outer_height() - origin.y,
            _ => 0.0,
        };
        translate_all(&mut self.boxes[start..], dx, dy);
        Ok(())
    }
}

struct FlexItem {
    idx: NodeIndex,
    resolved: ResolvedBox,
    subtree: Vec<(ElementId, ResolvedBox)>,
}

/// Leading offset and spacing between items on one line.
///
/// With negative free space `space-between` falls back to `flex-start`, and
/// `space-around`/`space-evenly` fall back to `center`.
fn distribute(justify: JustifyContent, free: f32, n: usize, gap: f32) -> (f32, f32) {
    let count = n as f32;
    match justify {
        JustifyContent::FlexStart => (0.0, gap),
        JustifyContent::FlexEnd => (free, gap),
        JustifyContent::Center => (free / 2.0, gap),
        JustifyContent::SpaceBetween if free > 0.0 && n > 1 => {
            (0.0, gap + free / (count - 1.0))
        }
        JustifyContent::SpaceBetween => (0.0, gap),
        JustifyContent::SpaceAround if free >= 0.0 && n > 0 => {
            (free / (2.0 * count), gap + free / count)
        }
        JustifyContent::SpaceEvenly if free >= 0.0 => {
            (free / (count + 1.0), gap + free / (count + 1.0))
        }
        JustifyContent::SpaceAround | JustifyContent::SpaceEvenly => (free / 2.0, gap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribute_space_between_and_fallbacks() {
        assert_eq!(distribute(JustifyContent::SpaceBetween, 200.0, 2, 0.0), (0.0, 200.0));
        assert_eq!(distribute(JustifyContent::SpaceBetween, 200.0, 1, 0.0), (0.0, 0.0));
        assert_eq!(distribute(JustifyContent::SpaceBetween, -20.0, 3, 4.0), (0.0, 4.0));
        assert_eq!(distribute(JustifyContent::SpaceAround, -20.0, 2, 0.0), (-10.0, 0.0));
        assert_eq!(distribute(JustifyContent::SpaceEvenly, -20.0, 2, 0.0), (-10.0, 0.0));
    }

    #[test]
    fn distribute_around_and_evenly() {
        assert_eq!(distribute(JustifyContent::SpaceAround, 120.0, 3, 0.0), (20.0, 40.0));
        assert_eq!(distribute(JustifyContent::SpaceEvenly, 120.0, 3, 0.0), (30.0, 30.0));
        assert_eq!(distribute(JustifyContent::Center, 100.0, 2, 10.0), (50.0, 10.0));
        assert_eq!(distribute(JustifyContent::FlexEnd, 100.0, 2, 10.0), (100.0, 10.0));
    }

    #[test]
    fn clamp_respects_box_sizing() {
        // content-box max 100 + 20 frame → 120 border box
        let v = clamp_size(
            500.0,
            Dimension::Auto,
            Dimension::Px(100.0),
            Some(800.0),
            20.0,
            BoxSizing::ContentBox,
        );
        assert_eq!(v, 120.0);
        let v = clamp_size(
            500.0,
            Dimension::Auto,
            Dimension::Px(100.0),
            Some(800.0),
            20.0,
            BoxSizing::BorderBox,
        );
        assert_eq!(v, 100.0);
        let v = clamp_size(
            5.0,
            Dimension::Percent(10.0),
            Dimension::Auto,
            Some(800.0),
            0.0,
            BoxSizing::BorderBox,
        );
        assert_eq!(v, 80.0);
    }

    #[test]
    fn derived_rects() {
        let b = ResolvedBox {
            x: 10.0,
            y: 10.0,
            width: 100.0,
            height: 50.0,
            padding: Edges::all(5.0),
            border: Edges::all(1.0),
            margin: Edges::all(8.0),
        };
        assert_eq!(b.padding_rect(), Bounds::new(11.0, 11.0, 98.0, 48.0));
        assert_eq!(b.content_rect(), Bounds::new(16.0, 16.0, 88.0, 38.0));
        assert_eq!(b.margin_rect(), Bounds::new(2.0, 2.0, 116.0, 66.0));
    }
}
