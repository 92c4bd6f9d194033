//! ANSI escape to markup transcoder
//!
//! Converts terminal text into HTML that is safe to inject: XML specials are
//! escaped first, non-color CSI sequences are stripped, and SGR color/style
//! sequences become `<span>` elements carrying CSS classes or inline styles.

mod colors;
mod transcoder;

pub use colors::{ExtendedColor, Rgb};
pub use transcoder::{escape_xml, transcode, Transcoder};
