//! Element tree and the closed style model consumed by layout.
//!
//! The element store (outside this crate) owns the authoritative tree. A
//! layout pass receives an immutable [`ElementTree`] snapshot: an arena of
//! [`Element`] values in a `StableDiGraph` whose edges go parent → child.
//! Each element also keeps its raw `parent_id` so dangling references from
//! the store survive into the snapshot and can be reported instead of
//! silently dropped.
//!
//! Styles are a closed, tagged structure. Flex properties only exist inside
//! [`Display::Flex`], offsets only inside positioned [`Position`] variants.

use crate::geometry::Sides;
use crate::id::ElementId;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color, 4 × f32 in [0.0, 1.0]. Carried for painting only; text
/// measurement ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB`, or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let digits: Vec<u8> = hex.bytes().map(hex_val).collect::<Option<_>>()?;
        let channel = |hi: u8, lo: u8| f32::from(hi << 4 | lo) / 255.0;

        match digits.as_slice() {
            [r, g, b] => Some(Self::rgba(
                channel(*r, *r),
                channel(*g, *g),
                channel(*b, *b),
                1.0,
            )),
            [r, g, b, a] => Some(Self::rgba(
                channel(*r, *r),
                channel(*g, *g),
                channel(*b, *b),
                channel(*a, *a),
            )),
            [r1, r2, g1, g2, b1, b2] => Some(Self::rgba(
                channel(*r1, *r2),
                channel(*g1, *g2),
                channel(*b1, *b2),
                1.0,
            )),
            [r1, r2, g1, g2, b1, b2, a1, a2] => Some(Self::rgba(
                channel(*r1, *r2),
                channel(*g1, *g2),
                channel(*b1, *b2),
                channel(*a1, *a2),
            )),
            _ => None,
        }
    }

    /// Channels as 8-bit values (for painting backends).
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

// ─── Lengths ─────────────────────────────────────────────────────────────

/// A length that is either absolute or a percentage of the containing
/// block (padding, margin, border, and offsets resolve against its width
/// except vertical offsets, which use its height).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LengthPercentage {
    Px(f32),
    /// Percentage in 0..=100 units.
    Percent(f32),
}

impl Default for LengthPercentage {
    fn default() -> Self {
        LengthPercentage::Px(0.0)
    }
}

impl LengthPercentage {
    pub fn resolve(self, basis: f32) -> f32 {
        match self {
            LengthPercentage::Px(px) => px,
            LengthPercentage::Percent(pct) => basis * pct / 100.0,
        }
    }

    /// Percentages against an indefinite basis resolve to `None`.
    pub fn resolve_opt(self, basis: Option<f32>) -> Option<f32> {
        match self {
            LengthPercentage::Px(px) => Some(px),
            LengthPercentage::Percent(pct) => basis.map(|b| b * pct / 100.0),
        }
    }
}

/// A size property: definite (px or %) or `auto`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Dimension {
    #[default]
    Auto,
    Px(f32),
    Percent(f32),
}

impl From<LengthPercentage> for Dimension {
    fn from(v: LengthPercentage) -> Self {
        match v {
            LengthPercentage::Px(px) => Dimension::Px(px),
            LengthPercentage::Percent(pct) => Dimension::Percent(pct),
        }
    }
}

impl Dimension {
    /// `None` for `auto`, or for a percentage against an indefinite basis.
    pub fn resolve(self, basis: Option<f32>) -> Option<f32> {
        match self {
            Dimension::Auto => None,
            Dimension::Px(px) => Some(px),
            Dimension::Percent(pct) => basis.map(|b| b * pct / 100.0),
        }
    }

    pub fn is_auto(self) -> bool {
        matches!(self, Dimension::Auto)
    }
}

// ─── Display / position ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlexDirection {
    #[default]
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JustifyContent {
    #[default]
    FlexStart,
    Center,
    FlexEnd,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlignItems {
    #[default]
    FlexStart,
    Center,
    FlexEnd,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlexWrap {
    #[default]
    NoWrap,
    Wrap,
}

/// Properties that only mean something on a flex container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlexContainer {
    pub direction: FlexDirection,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    /// Fixed spacing between adjacent items and between wrapped lines.
    pub gap: f32,
    pub wrap: FlexWrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Display {
    #[default]
    Block,
    /// Establishes a new formatting context. Margins never collapse in this
    /// model, so it lays out exactly like `Block`.
    FlowRoot,
    Flex(FlexContainer),
    /// No box; the whole subtree is excluded from layout and hit testing.
    None,
}

/// `top/right/bottom/left` offsets of a positioned element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Inset {
    pub top: Option<LengthPercentage>,
    pub right: Option<LengthPercentage>,
    pub bottom: Option<LengthPercentage>,
    pub left: Option<LengthPercentage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Static,
    /// Shifted after flow layout; siblings are placed as if the offset were zero.
    Relative(Inset),
    /// Out of flow; placed against the parent's padding box.
    Absolute(Inset),
}

impl Position {
    pub fn inset(&self) -> Option<&Inset> {
        match self {
            Position::Static => None,
            Position::Relative(inset) | Position::Absolute(inset) => Some(inset),
        }
    }

    pub fn is_out_of_flow(&self) -> bool {
        matches!(self, Position::Absolute(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoxSizing {
    #[default]
    ContentBox,
    BorderBox,
}

// ─── Text ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum LineHeight {
    /// 1.2 × font size.
    #[default]
    Normal,
    /// Unitless multiplier of the font size.
    Multiple(f32),
    Px(f32),
}

/// Text properties used when measuring and painting a text-bearing element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font families in fallback order.
    pub font_family: Vec<String>,
    pub font_size: f32,
    /// 100..=900
    pub font_weight: u16,
    pub font_style: FontStyle,
    pub line_height: LineHeight,
    pub letter_spacing: f32,
    pub word_spacing: f32,
    pub color: Option<Color>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: vec!["sans-serif".into()],
            font_size: 16.0,
            font_weight: 400,
            font_style: FontStyle::Normal,
            line_height: LineHeight::Normal,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            color: None,
        }
    }
}

impl TextStyle {
    /// Line height in pixels.
    pub fn line_height_px(&self) -> f32 {
        match self.line_height {
            LineHeight::Normal => self.font_size * 1.2,
            LineHeight::Multiple(m) => self.font_size * m,
            LineHeight::Px(px) => px,
        }
    }
}

// ─── Style ───────────────────────────────────────────────────────────────

/// The resolved style record of one element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Style {
    pub display: Display,
    pub position: Position,
    pub box_sizing: BoxSizing,

    pub width: Dimension,
    pub height: Dimension,
    /// `Auto` means "no limit" for the four constraints below.
    pub min_width: Dimension,
    pub max_width: Dimension,
    pub min_height: Dimension,
    pub max_height: Dimension,

    pub padding: Sides<LengthPercentage>,
    pub border: Sides<LengthPercentage>,
    pub margin: Sides<LengthPercentage>,

    pub text: TextStyle,

    pub background: Option<Color>,
    pub border_color: Option<Color>,
}

impl Style {
    pub fn flex(&self) -> Option<&FlexContainer> {
        match &self.display {
            Display::Flex(flex) => Some(flex),
            _ => None,
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.display, Display::None)
    }
}

// ─── Elements ────────────────────────────────────────────────────────────

/// What kind of element a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementTag {
    /// The document root.
    Body,
    /// Generic block container (`div`, ...).
    Block,
    /// Text leaf (`p`, `h1`..`h6`, `span`, `a`, `label`).
    Text,
    /// Form control (`button`, `input`, `select`, `textarea`).
    Control,
    /// Sectioning container (`section`, `nav`, `header`, ...).
    Structural,
}

impl ElementTag {
    /// Map an HTML tag name from the store to a discriminant.
    pub fn from_html(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "body" => ElementTag::Body,
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "span" | "a" | "label" | "text" => {
                ElementTag::Text
            }
            "button" | "input" | "select" | "textarea" | "checkbox" | "radio" | "switch" => {
                ElementTag::Control
            }
            "section" | "main" | "nav" | "header" | "footer" | "article" | "aside" | "form" => {
                ElementTag::Structural
            }
            _ => ElementTag::Block,
        }
    }
}

/// One node of the design tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub tag: ElementTag,
    /// Non-owning back reference; `None` only on the root.
    pub parent_id: Option<ElementId>,
    /// Sibling order as stored (ties break by snapshot insertion order).
    pub order: i32,
    pub style: Style,
    pub text: Option<String>,
}

impl Element {
    pub fn new(id: ElementId, tag: ElementTag) -> Self {
        Self {
            id,
            tag,
            parent_id: None,
            order: 0,
            style: Style::default(),
            text: None,
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_parent(mut self, parent: ElementId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

// ─── Element tree ────────────────────────────────────────────────────────

/// Snapshot construction failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("element snapshot has no root (every element has a parent)")]
    MissingRoot,
    #[error("element snapshot has two roots: {first} and {second}")]
    MultipleRoots {
        first: ElementId,
        second: ElementId,
    },
    #[error("element id {0} appears more than once")]
    DuplicateId(ElementId),
}

/// Arena snapshot of the element tree.
#[derive(Debug, Clone)]
pub struct ElementTree {
    /// Parent → child edges for every resolvable `parent_id`.
    pub graph: StableDiGraph<Element, ()>,
    pub root: NodeIndex,
    id_index: HashMap<ElementId, NodeIndex>,
    /// Elements whose `parent_id` names no element in this snapshot.
    orphans: Vec<NodeIndex>,
}

impl ElementTree {
    /// A tree holding only a `body` root with default style.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(Element::new(ElementId::intern("body"), ElementTag::Body))
    }

    #[must_use]
    pub fn with_root(mut root: Element) -> Self {
        root.parent_id = None;
        let mut graph = StableDiGraph::new();
        let id = root.id;
        let root_idx = graph.add_node(root);
        let mut id_index = HashMap::new();
        id_index.insert(id, root_idx);
        Self {
            graph,
            root: root_idx,
            id_index,
            orphans: Vec::new(),
        }
    }

    /// Build a snapshot from the store's flat element list.
    ///
    /// Exactly one element must have no parent. Elements whose parent id
    /// does not resolve are kept but unlinked; see [`ElementTree::orphans`].
    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> Result<Self, TreeError> {
        let mut graph = StableDiGraph::new();
        let mut id_index = HashMap::new();
        let mut root = None;

        for element in elements {
            let id = element.id;
            let is_root = element.parent_id.is_none();
            let idx = graph.add_node(element);
            if id_index.insert(id, idx).is_some() {
                return Err(TreeError::DuplicateId(id));
            }
            if is_root {
                match root {
                    None => root = Some(idx),
                    Some(first) => {
                        return Err(TreeError::MultipleRoots {
                            first: graph[first].id,
                            second: id,
                        });
                    }
                }
            }
        }

        let root = root.ok_or(TreeError::MissingRoot)?;
        let mut orphans = Vec::new();
        let links: Vec<(NodeIndex, Option<ElementId>)> = graph
            .node_indices()
            .map(|idx| (idx, graph[idx].parent_id))
            .collect();
        for (idx, parent_id) in links {
            let Some(parent_id) = parent_id else { continue };
            match id_index.get(&parent_id) {
                Some(&parent) => {
                    graph.add_edge(parent, idx, ());
                }
                None => orphans.push(idx),
            }
        }

        Ok(Self {
            graph,
            root,
            id_index,
            orphans,
        })
    }

    /// Append `element` as the last child of `parent`.
    pub fn add_element(&mut self, parent: NodeIndex, mut element: Element) -> NodeIndex {
        element.parent_id = Some(self.graph[parent].id);
        let id = element.id;
        let idx = self.graph.add_node(element);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        idx
    }

    pub fn root_id(&self) -> ElementId {
        self.graph[self.root].id
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: ElementId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Parent through the linked edge (absent for the root and for orphans).
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children in document order: stored `order`, then insertion order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort_by_key(|&c| (self.graph[c].order, c));
        children
    }

    /// Ids of the children of `id`, in document order.
    pub fn child_ids(&self, id: ElementId) -> Vec<ElementId> {
        self.index_of(id)
            .map(|idx| {
                self.children(idx)
                    .into_iter()
                    .map(|c| self.graph[c].id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn orphans(&self) -> &[NodeIndex] {
        &self.orphans
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.graph.node_weights()
    }
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(id: &str, parent: Option<&str>) -> Element {
        let mut e = Element::new(ElementId::intern(id), ElementTag::Block);
        e.parent_id = parent.map(ElementId::intern);
        e
    }

    #[test]
    fn add_element_links_parent() {
        let mut tree = ElementTree::new();
        let card = tree.add_element(
            tree.root,
            Element::new(ElementId::intern("card"), ElementTag::Block),
        );
        assert_eq!(tree.children(tree.root), vec![card]);
        assert_eq!(tree.parent(card), Some(tree.root));
        assert_eq!(
            tree.get(ElementId::intern("card")).unwrap().parent_id,
            Some(ElementId::intern("body"))
        );
    }

    #[test]
    fn children_follow_stored_order() {
        let tree = ElementTree::from_elements([
            el("m_root", None),
            el("m_second", Some("m_root")).with_order(2),
            el("m_first", Some("m_root")).with_order(1),
            el("m_third", Some("m_root")).with_order(2),
        ])
        .unwrap();
        assert_eq!(
            tree.child_ids(ElementId::intern("m_root")),
            vec![
                ElementId::intern("m_first"),
                ElementId::intern("m_second"),
                ElementId::intern("m_third"),
            ]
        );
    }

    #[test]
    fn child_listed_before_parent_still_links() {
        let tree = ElementTree::from_elements([
            el("late_child", Some("late_parent")),
            el("late_root", None),
            el("late_parent", Some("late_root")),
        ])
        .unwrap();
        assert!(tree.orphans().is_empty());
        assert_eq!(
            tree.child_ids(ElementId::intern("late_parent")),
            vec![ElementId::intern("late_child")]
        );
    }

    #[test]
    fn dangling_parent_becomes_orphan() {
        let tree = ElementTree::from_elements([
            el("o_root", None),
            el("o_lost", Some("o_missing")),
        ])
        .unwrap();
        assert_eq!(tree.orphans().len(), 1);
        let lost = tree.index_of(ElementId::intern("o_lost")).unwrap();
        assert_eq!(tree.orphans()[0], lost);
        assert_eq!(tree.parent(lost), None);
    }

    #[test]
    fn snapshot_root_errors() {
        assert_eq!(
            ElementTree::from_elements([el("r_a", Some("r_b")), el("r_b", Some("r_a"))])
                .unwrap_err(),
            TreeError::MissingRoot
        );
        assert!(matches!(
            ElementTree::from_elements([el("r_c", None), el("r_d", None)]),
            Err(TreeError::MultipleRoots { .. })
        ));
        assert_eq!(
            ElementTree::from_elements([el("r_e", None), el("r_e", None)]).unwrap_err(),
            TreeError::DuplicateId(ElementId::intern("r_e"))
        );
    }

    #[test]
    fn tag_mapping() {
        assert_eq!(ElementTag::from_html("BODY"), ElementTag::Body);
        assert_eq!(ElementTag::from_html("h2"), ElementTag::Text);
        assert_eq!(ElementTag::from_html("button"), ElementTag::Control);
        assert_eq!(ElementTag::from_html("nav"), ElementTag::Structural);
        assert_eq!(ElementTag::from_html("div"), ElementTag::Block);
    }

    #[test]
    fn color_hex_forms() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_rgba8(), [0x6C, 0x5C, 0xE7, 0xFF]);
        let short = Color::from_hex("f00").unwrap();
        assert_eq!(short.to_rgba8(), [255, 0, 0, 255]);
        let alpha = Color::from_hex("#FF000080").unwrap();
        assert!((alpha.a - 128.0 / 255.0).abs() < 0.01);
        assert!(Color::from_hex("#12345").is_none());
        assert!(Color::from_hex("#zzz").is_none());
    }

    #[test]
    fn line_height_resolution() {
        let mut text = TextStyle::default();
        assert!((text.line_height_px() - 19.2).abs() < 1e-4);
        text.line_height = LineHeight::Multiple(1.5);
        assert_eq!(text.line_height_px(), 24.0);
        text.line_height = LineHeight::Px(30.0);
        assert_eq!(text.line_height_px(), 30.0);
    }
}
