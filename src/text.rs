//! Console text normalization
//!
//! Carriage-return flattening and URL autolinking, plus the pipeline that
//! turns raw stream/traceback text into safe markup.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::ansi;

fn crlf_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\r+\n").expect("valid crlf regex"))
}

fn overwritten_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[^\r\n]*\r+").expect("valid carriage return regex"))
}

fn csi_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]").expect("valid csi regex"))
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(^|\s)(https?|ftp)(:[^'">\s]+)"#).expect("valid url regex")
    })
}

/// Drop the parts of each line that a carriage return would overwrite.
///
/// `\r\n` becomes `\n`; any other `\r` returns to column 0, so the text
/// before it on the line is removed. Escape sequences in the removed text
/// are kept, since a carriage return does not reset attributes. Repeats
/// until nothing shrinks.
pub fn collapse_carriage_returns(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = crlf_regex().replace_all(&current, "\n");
        let next = overwritten_line_regex()
            .replace_all(&next, |caps: &Captures<'_>| {
                csi_regex()
                    .find_iter(&caps[0])
                    .map(|m| m.as_str())
                    .collect::<String>()
            })
            .into_owned();
        if next.len() >= current.len() {
            return current;
        }
        current = next;
    }
}

/// Wrap `http`, `https` and `ftp` URLs in anchors opening a new tab.
///
/// Must only be applied to text that is already escaped.
pub fn autolink_urls(text: &str) -> String {
    url_regex()
        .replace_all(text, r#"${1}<a target="_blank" href="${2}${3}">${2}${3}</a>"#)
        .into_owned()
}

/// Flatten, escape and colorize terminal output.
///
/// Carriage returns are resolved on the raw text so that an overwritten
/// line never cuts through a span.
pub fn render_console_text(text: &str, autolink: bool) -> String {
    let flat = collapse_carriage_returns(text);
    let markup = ansi::transcode(&flat);
    if autolink {
        autolink_urls(&markup)
    } else {
        markup
    }
}
