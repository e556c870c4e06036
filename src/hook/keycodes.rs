//! Hardware keycode translation
//!
//! Maps macOS virtual keycodes (ANSI layout positions, as carried by
//! keyboard events) to [`VirtualKey`] identifiers. Keycodes with no
//! counterpart in the mapping domain translate to `None` and are ignored
//! by the tap.

use crate::keys::VirtualKey;

/// Translates a hardware keycode to its virtual key, if it has one.
pub fn virtual_key(keycode: u64) -> Option<VirtualKey> {
    use VirtualKey::*;

    let key = match keycode {
        0x00 => A,
        0x01 => S,
        0x02 => D,
        0x03 => F,
        0x04 => H,
        0x05 => G,
        0x06 => Z,
        0x07 => X,
        0x08 => C,
        0x09 => V,
        0x0B => B,
        0x0C => Q,
        0x0D => W,
        0x0E => E,
        0x0F => R,
        0x10 => Y,
        0x11 => T,
        0x12 => Num1,
        0x13 => Num2,
        0x14 => Num3,
        0x15 => Num4,
        0x16 => Num6,
        0x17 => Num5,
        0x19 => Num9,
        0x1A => Num7,
        0x1C => Num8,
        0x1D => Num0,
        0x1F => O,
        0x20 => U,
        0x22 => I,
        0x23 => P,
        0x25 => L,
        0x26 => J,
        0x28 => K,
        0x2D => N,
        0x2E => M,

        0x24 => Enter,
        0x30 => Tab,
        0x31 => Space,
        0x33 => Backspace,
        0x35 => Escape,
        0x75 => Delete,

        0x73 => Home,
        0x77 => End,
        0x74 => PageUp,
        0x79 => PageDown,
        0x7B => ArrowLeft,
        0x7C => ArrowRight,
        0x7D => ArrowDown,
        0x7E => ArrowUp,

        0x7A => F1,
        0x78 => F2,
        0x63 => F3,
        0x76 => F4,
        0x60 => F5,
        0x61 => F6,
        0x62 => F7,
        0x64 => F8,
        0x65 => F9,
        0x6D => F10,
        0x67 => F11,
        0x6F => F12,

        // Modifiers arrive as flags-changed events carrying these keycodes.
        0x38 => LeftShift,
        0x3C => RightShift,
        0x3B => LeftControl,
        0x3E => RightControl,
        0x3A => LeftAlt,
        0x3D => RightAlt,
        0x37 => LeftSuper,
        0x36 => RightSuper,

        _ => return None,
    };

    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_translate() {
        assert_eq!(virtual_key(0x28), Some(VirtualKey::K));
        assert_eq!(virtual_key(0x2E), Some(VirtualKey::M));
    }

    #[test]
    fn modifiers_translate_directionally() {
        assert_eq!(virtual_key(0x3A), Some(VirtualKey::LeftAlt));
        assert_eq!(virtual_key(0x3D), Some(VirtualKey::RightAlt));
        assert_eq!(virtual_key(0x38), Some(VirtualKey::LeftShift));
    }

    #[test]
    fn unknown_keycodes_are_ignored() {
        assert_eq!(virtual_key(0xFF), None);
    }
}
