//! Virtual-key identifiers and modifier normalization
//!
//! Mappings are stored against canonical, non-directional modifier forms,
//! so a left-Alt press and a right-Alt press resolve identically.

use serde::{Deserialize, Serialize};

/// Canonical identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VirtualKey {
    // Modifiers, directional variants first
    LeftAlt,
    RightAlt,
    Alt,
    LeftShift,
    RightShift,
    Shift,
    LeftControl,
    RightControl,
    Control,
    LeftSuper,
    RightSuper,

    // Letters
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    // Digits (top row)
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    // Editing and navigation
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

impl VirtualKey {
    /// Removes any directional component from this key if it is a modifier key.
    ///
    /// The Super keys keep their directional form; left and right carry
    /// distinct meanings in user mappings.
    pub fn normalize(self) -> Self {
        match self {
            Self::LeftAlt | Self::RightAlt => Self::Alt,
            Self::LeftShift | Self::RightShift => Self::Shift,
            Self::LeftControl | Self::RightControl => Self::Control,
            other => other,
        }
    }

    /// Whether this key is a (normalized) modifier key.
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::Alt | Self::Shift | Self::Control | Self::LeftSuper | Self::RightSuper
        )
    }
}
