pub mod drag;
pub mod editor;
pub mod input;
pub mod select;
pub mod session;

pub use drag::{CaptureGuard, DragController, DragKind, GeometryDelta, GestureEvent, GestureSink};
pub use editor::{Editor, PointerTarget};
pub use input::{InputEvent, Modifiers};
pub use select::SelectionState;
pub use session::{ElementMutation, LayoutSession, SessionError};
