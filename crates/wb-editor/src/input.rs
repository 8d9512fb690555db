//! Input abstraction layer.
//!
//! Normalizes browser pointer and keyboard events into a unified
//! `InputEvent` enum consumed by the editor.

use wb_core::Point;

/// Keyboard modifiers held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };
}

/// A normalized input event, in canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pen contact).
    PointerDown { x: f32, y: f32, modifiers: Modifiers },

    /// Pointer moved. Samples between frames supersede each other.
    PointerMove { x: f32, y: f32, modifiers: Modifiers },

    /// Pointer released.
    PointerUp { x: f32, y: f32 },

    /// Double click: enter the container under the pointer.
    DoubleClick { x: f32, y: f32 },

    /// Keyboard key, named as `KeyboardEvent.key` names it.
    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    /// Create a PointerDown from a web PointerEvent.
    /// (Used when bridging from JS via wasm-bindgen.)
    pub fn from_pointer_down(x: f32, y: f32, shift: bool) -> Self {
        Self::PointerDown {
            x,
            y,
            modifiers: Modifiers {
                shift,
                ..Modifiers::NONE
            },
        }
    }

    pub fn from_pointer_move(x: f32, y: f32, shift: bool) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers {
                shift,
                ..Modifiers::NONE
            },
        }
    }

    pub fn from_pointer_up(x: f32, y: f32) -> Self {
        Self::PointerUp { x, y }
    }

    pub fn key(key: impl Into<String>) -> Self {
        Self::Key {
            key: key.into(),
            modifiers: Modifiers::NONE,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y }
            | Self::DoubleClick { x, y } => Some(Point::new(*x, *y)),
            Self::Key { .. } => None,
        }
    }

    pub fn is_escape(&self) -> bool {
        matches!(self, Self::Key { key, .. } if key == "Escape")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_of_pointer_events() {
        assert_eq!(
            InputEvent::from_pointer_down(3.0, 4.0, true).position(),
            Some(Point::new(3.0, 4.0))
        );
        assert_eq!(InputEvent::key("a").position(), None);
    }

    #[test]
    fn escape_detection() {
        assert!(InputEvent::key("Escape").is_escape());
        assert!(!InputEvent::key("Enter").is_escape());
        assert!(!InputEvent::from_pointer_up(0.0, 0.0).is_escape());
    }
}
