pub mod css;
pub mod geometry;
pub mod hierarchy;
pub mod id;
pub mod layout;
pub mod model;
pub mod text;

pub use css::ValueError;
pub use geometry::{Bounds, Edges, GeometryError, Point, Sides, combine_bounds, contains, intersects, union};
pub use id::ElementId;
pub use layout::{
    GeometryMap, LayoutDiagnostic, LayoutError, LayoutOutput, ResolvedBox, Viewport,
    resolve_layout, resolve_layout_with_fallback,
};
pub use model::*;
#[cfg(feature = "cosmic")]
pub use text::CosmicBackend;
pub use text::{
    MeasureError, MonospaceBackend, ShapingBackend, TextMeasure, TextMetrics,
    TextShaper, measure_fn, measure_text,
};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
