//! SGR state machine
//!
//! The transcoder walks already-escaped text one character at a time:
//!
//! - Ground: text is copied through
//! - Escape: after ESC, waiting for `[`
//! - Csi: collecting parameters until a final byte
//!
//! A CSI ending in `m` is a Select Graphic Rendition sequence and turns into
//! span markup; every other CSI is dropped.

use tracing::debug;

use super::colors::{background_class, class_for_code, foreground_class, ExtendedColor, Rgb};

/// Escape the characters that could break out of generated markup
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

/// Transcode terminal text into safe markup with a fresh transcoder
pub fn transcode(raw: &str) -> String {
    Transcoder::new().transcode(raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    Csi,
}

/// Attributes accumulated for one span
#[derive(Debug, Default)]
struct SpanAttrs {
    classes: Vec<String>,
    styles: Vec<String>,
}

impl SpanAttrs {
    fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.styles.is_empty()
    }

    fn open_tag(&self) -> String {
        let mut tag = String::from("<span");
        if !self.classes.is_empty() {
            tag.push_str(" class=\"");
            tag.push_str(&self.classes.join(" "));
            tag.push('"');
        }
        if !self.styles.is_empty() {
            tag.push_str(" style=\"");
            tag.push_str(&self.styles.join(" "));
            tag.push('"');
        }
        tag.push('>');
        tag
    }
}

/// ANSI to markup transcoder
#[derive(Debug)]
pub struct Transcoder {
    state: State,
    /// Raw parameter characters of the CSI being collected
    params: String,
    span_open: bool,
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcoder {
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            params: String::with_capacity(16),
            span_open: false,
        }
    }

    /// Whether a span is currently open
    pub fn span_open(&self) -> bool {
        self.span_open
    }

    /// Escape `raw`, strip non-color CSI sequences and convert SGR to spans.
    ///
    /// The returned markup is always balanced: a span still open at the end
    /// of the input is closed.
    pub fn transcode(&mut self, raw: &str) -> String {
        let escaped = escape_xml(raw);
        let mut out = String::with_capacity(escaped.len() + 32);

        self.state = State::Ground;
        self.params.clear();
        self.span_open = false;

        for c in escaped.chars() {
            self.process_char(c, &mut out);
        }

        if self.state == State::Csi {
            debug!("Unterminated escape sequence dropped: {:?}", self.params);
        }
        self.state = State::Ground;

        if self.span_open {
            out.push_str("</span>");
            self.span_open = false;
        }
        out
    }

    fn process_char(&mut self, c: char, out: &mut String) {
        match self.state {
            State::Ground => {
                if c == '\x1b' {
                    self.state = State::Escape;
                } else {
                    out.push(c);
                }
            }
            State::Escape => match c {
                '[' => {
                    self.params.clear();
                    self.state = State::Csi;
                }
                '\x1b' => {}
                _ => {
                    // Stray ESC, keep what follows it
                    self.state = State::Ground;
                    out.push(c);
                }
            },
            State::Csi => match c {
                '0'..='9' | ';' | ':' | '=' | '?' => self.params.push(c),
                '\x40'..='\x7e' => {
                    self.state = State::Ground;
                    if c == 'm' && self.params.chars().all(|p| p.is_ascii_digit() || p == ';' || p == ':') {
                        self.dispatch_sgr(out);
                    }
                }
                '\x1b' => {
                    out.push('[');
                    out.push_str(&self.params);
                    self.state = State::Escape;
                }
                _ => {
                    out.push('[');
                    out.push_str(&self.params);
                    out.push(c);
                    self.state = State::Ground;
                }
            },
        }
    }

    fn dispatch_sgr(&mut self, out: &mut String) {
        let codes = parse_params(&self.params);

        if codes.iter().all(|&code| matches!(code, 0 | 22 | 39)) {
            if self.span_open {
                out.push_str("</span>");
                self.span_open = false;
            }
            return;
        }

        let mut attrs = SpanAttrs::default();
        let mut codes = codes.into_iter();
        while let Some(code) = codes.next() {
            match code {
                38 | 48 => process_extended(code, &mut codes, &mut attrs),
                _ => {
                    if let Some(class) = class_for_code(code) {
                        attrs.classes.push(class);
                    }
                }
            }
        }

        if attrs.is_empty() {
            return;
        }
        if self.span_open {
            out.push_str("</span>");
        }
        out.push_str(&attrs.open_tag());
        self.span_open = true;
    }
}

/// Split SGR parameters; an empty field counts as 0
fn parse_params(params: &str) -> Vec<u16> {
    if params.is_empty() {
        return Vec::new();
    }
    params
        .split([';', ':'])
        .map(|field| {
            if field.is_empty() {
                0
            } else {
                field.parse::<u16>().unwrap_or(u16::MAX)
            }
        })
        .collect()
}

/// Handle `38`/`48` followed by `5;n` or `2;r;g;b`
fn process_extended(code: u16, codes: &mut std::vec::IntoIter<u16>, attrs: &mut SpanAttrs) {
    let foreground = code == 38;

    if codes.as_slice().len() < 2 {
        debug!("Not enough fields for VT100 color: {:?}", codes.as_slice());
        codes.for_each(drop);
        return;
    }

    let color = match codes.next() {
        Some(5) => {
            let index = codes.next().unwrap_or_default();
            match u8::try_from(index) {
                Ok(index) => ExtendedColor::from_index(index),
                Err(_) => {
                    debug!("Color index out of range: {}", index);
                    return;
                }
            }
        }
        Some(2) => {
            if codes.as_slice().len() < 3 {
                debug!("Not enough fields for RGB: {:?}", codes.as_slice());
                codes.for_each(drop);
                return;
            }
            let mut component = || codes.next().unwrap_or_default().min(255) as u8;
            let (r, g, b) = (component(), component(), component());
            ExtendedColor::Rgb(Rgb(r, g, b))
        }
        other => {
            debug!("Unrecognized extended color mode: {:?}", other);
            codes.for_each(drop);
            return;
        }
    };

    match color {
        ExtendedColor::Base(base) => attrs.classes.push(if foreground {
            foreground_class(base)
        } else {
            background_class(base)
        }),
        ExtendedColor::Rgb(rgb) => attrs.styles.push(if foreground {
            format!("color: {};", rgb)
        } else {
            format!("background-color: {};", rgb)
        }),
    }
}
