pub mod hit;
pub mod paint;
pub mod selection;

pub use hit::{hit_test, lasso_select, lasso_select_scoped};
pub use paint::{PaintTheme, paint_geometry, paint_lasso, paint_selection};
pub use selection::{
    CursorStyle, HandleConfig, HandlePosition, ResizeHandle, SelectionError, bounds_of,
    combined_bounds_of, handle_at, resize_handles, resized_bounds,
};
