//! SGR color tables
//!
//! Fixed codes map to CSS class names; the 256-color palette and 24-bit
//! triples resolve to RGB values rendered as inline styles.

use std::fmt;

/// Class names for the eight base colors, in SGR order
const BASE_COLORS: [&str; 8] = [
    "black", "red", "green", "yellow", "blue", "purple", "cyan", "gray",
];

/// An RGB color resolved from an extended SGR sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.0, self.1, self.2)
    }
}

/// Outcome of resolving a `38;5;n` / `48;5;n` index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedColor {
    /// One of the eight base colors (bright/dim distinction dropped)
    Base(u8),
    /// A concrete RGB value
    Rgb(Rgb),
}

impl ExtendedColor {
    /// Resolve a 256-color palette index
    pub fn from_index(index: u8) -> Self {
        match index {
            0..=15 => ExtendedColor::Base(index % 8),
            16..=231 => {
                let n = index - 16;
                let r = (n / 36) % 6;
                let g = (n / 6) % 6;
                let b = n % 6;
                ExtendedColor::Rgb(Rgb(r * 51, g * 51, b * 51))
            }
            232..=255 => {
                // 24 steps on a 26 point scale, excluding black and white
                let step = (index as u32 - 231) * 256 / 26;
                let v = step as u8;
                ExtendedColor::Rgb(Rgb(v, v, v))
            }
        }
    }
}

/// CSS class for a fixed SGR code, if it has one
pub(crate) fn class_for_code(code: u16) -> Option<String> {
    match code {
        1 => Some("ansibold".to_string()),
        30..=37 => Some(foreground_class((code - 30) as u8)),
        40..=47 => Some(background_class((code - 40) as u8)),
        90..=97 => Some(foreground_class((code - 90) as u8)),
        100..=107 => Some(background_class((code - 100) as u8)),
        _ => None,
    }
}

pub(crate) fn foreground_class(base: u8) -> String {
    format!("ansi{}", BASE_COLORS[(base % 8) as usize])
}

pub(crate) fn background_class(base: u8) -> String {
    format!("ansibg{}", BASE_COLORS[(base % 8) as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_codes() {
        assert_eq!(class_for_code(1).as_deref(), Some("ansibold"));
        assert_eq!(class_for_code(31).as_deref(), Some("ansired"));
        assert_eq!(class_for_code(35).as_deref(), Some("ansipurple"));
        assert_eq!(class_for_code(47).as_deref(), Some("ansibggray"));
        assert_eq!(class_for_code(92).as_deref(), Some("ansigreen"));
        assert_eq!(class_for_code(5), None);
        assert_eq!(class_for_code(38), None);
    }

    #[test]
    fn test_indexed_low_colors_fold_to_base() {
        assert_eq!(ExtendedColor::from_index(1), ExtendedColor::Base(1));
        assert_eq!(ExtendedColor::from_index(9), ExtendedColor::Base(1));
        assert_eq!(ExtendedColor::from_index(15), ExtendedColor::Base(7));
    }

    #[test]
    fn test_color_cube() {
        assert_eq!(ExtendedColor::from_index(16), ExtendedColor::Rgb(Rgb(0, 0, 0)));
        assert_eq!(
            ExtendedColor::from_index(196),
            ExtendedColor::Rgb(Rgb(255, 0, 0))
        );
        assert_eq!(
            ExtendedColor::from_index(231),
            ExtendedColor::Rgb(Rgb(255, 255, 255))
        );
        // 16 + 36*1 + 6*2 + 3
        assert_eq!(
            ExtendedColor::from_index(67),
            ExtendedColor::Rgb(Rgb(51, 102, 153))
        );
    }

    #[test]
    fn test_grayscale_ramp() {
        assert_eq!(
            ExtendedColor::from_index(232),
            ExtendedColor::Rgb(Rgb(9, 9, 9))
        );
        assert_eq!(
            ExtendedColor::from_index(255),
            ExtendedColor::Rgb(Rgb(236, 236, 236))
        );
    }

    #[test]
    fn test_rgb_display() {
        assert_eq!(Rgb(1, 2, 3).to_string(), "rgb(1,2,3)");
    }
}
