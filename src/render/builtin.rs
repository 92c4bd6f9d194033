//! Built-in renderers
//!
//! One renderer per MIME type of the fixed catalog, plus the console-text
//! family used for streams and tracebacks. Every renderer returns an
//! `output_subarea` div tagged with its output kind.

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use serde_json::Value;

use super::registry::Renderer;
use crate::core::{
    ErrorOutput, Fragment, Metadata, APPLICATION_PDF, IMAGE_JPEG, IMAGE_SVG, TEXT_HTML, TEXT_LATEX,
    TEXT_MARKDOWN, TEXT_PLAIN,
};
use crate::error::{RenderError, Result};
use crate::text::render_console_text;

/// Raw console text (a string payload)
pub const CONSOLE_TEXT: &str = "application/vnd.display-area.console-text";
/// Stream chunk (`{"name", "text"}` payload)
pub const STREAM: &str = "application/vnd.display-area.stream";
/// Error traceback (`{"ename", "evalue", "traceback"}` payload)
pub const TRACEBACK: &str = "application/vnd.display-area.traceback";

fn payload_str<'a>(mimetype: &str, payload: &'a Value) -> Result<&'a str> {
    payload.as_str().ok_or_else(|| RenderError::InvalidPayload {
        mimetype: mimetype.to_string(),
        reason: format!("expected a string, got {}", json_kind(payload)),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `div.output_subarea.<classes> > pre > markup`
fn console_fragment(classes: &str, text: &str, autolink: bool) -> Fragment {
    let pre = Fragment::new("pre").with_markup(render_console_text(text, autolink));
    Fragment::subarea(classes).with_child(pre)
}

/// Terminal text with ANSI colors
#[derive(Debug, Clone)]
pub struct ConsoleTextRenderer {
    mimetype: &'static str,
    autolink: bool,
}

impl ConsoleTextRenderer {
    /// Renderer for `text/plain`
    pub fn plain(autolink: bool) -> Self {
        Self {
            mimetype: TEXT_PLAIN,
            autolink,
        }
    }

    /// Renderer for raw console text
    pub fn console(autolink: bool) -> Self {
        Self {
            mimetype: CONSOLE_TEXT,
            autolink,
        }
    }
}

impl Renderer for ConsoleTextRenderer {
    fn mimetype(&self) -> &str {
        self.mimetype
    }

    fn render(&self, payload: &Value, _metadata: &Metadata) -> Result<Fragment> {
        let text = payload_str(self.mimetype, payload)?;
        Ok(console_fragment("output_text", text, self.autolink))
    }
}

/// One stdout/stderr stream chunk
#[derive(Debug, Clone)]
pub struct StreamRenderer {
    autolink: bool,
}

impl StreamRenderer {
    pub fn new(autolink: bool) -> Self {
        Self { autolink }
    }
}

impl Renderer for StreamRenderer {
    fn mimetype(&self) -> &str {
        STREAM
    }

    fn render(&self, payload: &Value, _metadata: &Metadata) -> Result<Fragment> {
        let name = payload.get("name").and_then(Value::as_str).unwrap_or_default();
        let text = payload
            .get("text")
            .map(|text| payload_str(STREAM, text))
            .transpose()?
            .unwrap_or_default();
        let classes = format!("output_text output_stream output_{}", name);
        Ok(console_fragment(&classes, text, self.autolink))
    }
}

/// An error traceback
#[derive(Debug, Clone)]
pub struct TracebackRenderer {
    autolink: bool,
}

impl TracebackRenderer {
    pub fn new(autolink: bool) -> Self {
        Self { autolink }
    }
}

impl Renderer for TracebackRenderer {
    fn mimetype(&self) -> &str {
        TRACEBACK
    }

    fn render(&self, payload: &Value, _metadata: &Metadata) -> Result<Fragment> {
        let output: ErrorOutput =
            serde_json::from_value(payload.clone()).map_err(|err| RenderError::InvalidPayload {
                mimetype: TRACEBACK.to_string(),
                reason: err.to_string(),
            })?;
        let text = output.traceback_text().unwrap_or_default();
        Ok(console_fragment("output_text output_error", &text, self.autolink))
    }
}

/// Trusted HTML, optionally isolated in an iframe
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn mimetype(&self) -> &str {
        TEXT_HTML
    }

    fn render(&self, payload: &Value, metadata: &Metadata) -> Result<Fragment> {
        let markup = payload_str(TEXT_HTML, payload)?;
        let subarea = Fragment::subarea("output_html rendered_html");
        if flag(metadata, "isolated") {
            let frame = Fragment::new("iframe")
                .with_class("output_isolated")
                .with_attr("srcdoc", markup)
                .with_attr("frameborder", "0")
                .with_attr("sandbox", "allow-same-origin");
            Ok(subarea.with_child(frame))
        } else {
            Ok(subarea.with_markup(markup))
        }
    }
}

/// Markdown rendered to HTML
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn mimetype(&self) -> &str {
        TEXT_MARKDOWN
    }

    fn render(&self, payload: &Value, _metadata: &Metadata) -> Result<Fragment> {
        let source = payload_str(TEXT_MARKDOWN, payload)?;
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let mut markup = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut markup, Parser::new_ext(source, options));
        Ok(Fragment::subarea("output_markdown rendered_html").with_markup(markup))
    }
}

/// LaTeX source left for the typesetter
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexRenderer;

impl Renderer for LatexRenderer {
    fn mimetype(&self) -> &str {
        TEXT_LATEX
    }

    fn render(&self, payload: &Value, _metadata: &Metadata) -> Result<Fragment> {
        let source = payload_str(TEXT_LATEX, payload)?;
        Ok(Fragment::subarea("output_latex").with_text(source))
    }
}

fn svg_root_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<svg\b[^>]*>").expect("valid svg root regex"))
}

fn svg_size_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\s(width|height)\s*=\s*["']([^"']*)["']"#).expect("valid svg size regex")
    })
}

/// Inline SVG sized by its root element
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgRenderer;

impl Renderer for SvgRenderer {
    fn mimetype(&self) -> &str {
        IMAGE_SVG
    }

    fn render(&self, payload: &Value, _metadata: &Metadata) -> Result<Fragment> {
        let svg = payload_str(IMAGE_SVG, payload)?;
        let root = svg_root_regex()
            .find(svg)
            .ok_or_else(|| RenderError::InvalidPayload {
                mimetype: IMAGE_SVG.to_string(),
                reason: "no <svg> element".to_string(),
            })?;

        let mut style = String::new();
        for caps in svg_size_regex().captures_iter(root.as_str()) {
            style.push_str(&format!("{}: {};", caps[1].to_ascii_lowercase(), &caps[2]));
        }

        let mut wrapper = Fragment::div().with_markup(svg);
        if !style.is_empty() {
            wrapper.set_attr("style", style);
        }
        Ok(Fragment::subarea("output_svg").with_child(wrapper))
    }
}

/// Base64 payload with whitespace removed, validated
fn base64_payload(mimetype: &str, payload: &Value) -> Result<String> {
    let raw = payload_str(mimetype, payload)?;
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(&cleaned)
        .map_err(|err| RenderError::InvalidPayload {
            mimetype: mimetype.to_string(),
            reason: format!("invalid base64: {}", err),
        })?;
    Ok(cleaned)
}

fn flag(metadata: &Metadata, key: &str) -> bool {
    metadata.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn dimension(metadata: &Metadata, key: &str) -> Option<String> {
    match metadata.get(key)? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// PNG or JPEG image as a data URI
#[derive(Debug, Clone)]
pub struct ImageRenderer {
    mimetype: &'static str,
    deferred: bool,
}

impl ImageRenderer {
    pub fn new(mimetype: &'static str, deferred: bool) -> Self {
        Self { mimetype, deferred }
    }

    fn kind(&self) -> &'static str {
        if self.mimetype == IMAGE_JPEG {
            "output_jpeg"
        } else {
            "output_png"
        }
    }
}

impl Renderer for ImageRenderer {
    fn mimetype(&self) -> &str {
        self.mimetype
    }

    fn render(&self, payload: &Value, metadata: &Metadata) -> Result<Fragment> {
        let data = base64_payload(self.mimetype, payload)?;
        let mut img =
            Fragment::new("img").with_attr("src", format!("data:{};base64,{}", self.mimetype, data));
        if let Some(width) = dimension(metadata, "width") {
            img.set_attr("width", width);
        }
        if let Some(height) = dimension(metadata, "height") {
            img.set_attr("height", height);
        }
        if flag(metadata, "unconfined") {
            img.add_class("unconfined");
        }
        Ok(Fragment::subarea(self.kind()).with_child(img))
    }

    fn is_deferred(&self) -> bool {
        self.deferred
    }
}

/// Link opening an embedded PDF
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl Renderer for PdfRenderer {
    fn mimetype(&self) -> &str {
        APPLICATION_PDF
    }

    fn render(&self, payload: &Value, _metadata: &Metadata) -> Result<Fragment> {
        let data = base64_payload(APPLICATION_PDF, payload)?;
        let link = Fragment::new("a")
            .with_attr("target", "_blank")
            .with_attr("href", format!("data:{};base64,{}", APPLICATION_PDF, data))
            .with_text("View PDF");
        Ok(Fragment::subarea("output_pdf").with_child(link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IMAGE_PNG;
    use serde_json::json;

    fn meta(value: Value) -> Metadata {
        match value {
            Value::Object(map) => map,
            _ => Metadata::new(),
        }
    }

    #[test]
    fn test_plain_text_is_console_markup() {
        let fragment = ConsoleTextRenderer::plain(true)
            .render(&json!("\x1b[32mok\x1b[0m <x>"), &Metadata::new())
            .unwrap();
        assert_eq!(
            fragment.to_html(),
            "<div class=\"output_subarea output_text\"><pre>\
             <span class=\"ansigreen\">ok</span> &lt;x&gt;</pre></div>"
        );
    }

    #[test]
    fn test_plain_text_rejects_structured_payload() {
        let err = ConsoleTextRenderer::plain(false)
            .render(&json!({"a": 1}), &Metadata::new())
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidPayload { .. }));
    }

    #[test]
    fn test_stream_classes() {
        let fragment = StreamRenderer::new(false)
            .render(&json!({"name": "stderr", "text": "oops\n"}), &Metadata::new())
            .unwrap();
        assert_eq!(fragment.kind(), Some("output_text"));
        assert!(fragment.has_class("output_stream"));
        assert!(fragment.has_class("output_stderr"));
        assert_eq!(fragment.text_content(), "oops\n");
    }

    #[test]
    fn test_traceback_lines() {
        let fragment = TracebackRenderer::new(false)
            .render(
                &json!({"ename": "E", "evalue": "v", "traceback": ["one", "two"]}),
                &Metadata::new(),
            )
            .unwrap();
        assert!(fragment.has_class("output_error"));
        assert_eq!(fragment.text_content(), "one\ntwo\n\n");
    }

    #[test]
    fn test_html_inline_and_isolated() {
        let inline = HtmlRenderer
            .render(&json!("<b>bold</b>"), &Metadata::new())
            .unwrap();
        assert_eq!(
            inline.to_html(),
            "<div class=\"output_subarea output_html rendered_html\"><b>bold</b></div>"
        );

        let isolated = HtmlRenderer
            .render(&json!("<b>\"x\"</b>"), &meta(json!({"isolated": true})))
            .unwrap();
        let frame = isolated.find_class("output_isolated").unwrap();
        assert_eq!(frame.tag, "iframe");
        assert_eq!(frame.attr("srcdoc"), Some("<b>\"x\"</b>"));
        assert!(isolated.to_html().contains("srcdoc=\"&lt;b&gt;&quot;x&quot;&lt;/b&gt;\""));
    }

    #[test]
    fn test_markdown_renders_html() {
        let fragment = MarkdownRenderer
            .render(&json!("# Title\n\n*em*"), &Metadata::new())
            .unwrap();
        let html = fragment.to_html();
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>em</em>"));
        assert_eq!(fragment.kind(), Some("output_markdown"));
    }

    #[test]
    fn test_latex_is_escaped_text() {
        let fragment = LatexRenderer.render(&json!("$a<b$"), &Metadata::new()).unwrap();
        assert!(fragment.to_html().contains("$a&lt;b$"));
    }

    #[test]
    fn test_svg_size_from_root() {
        let svg = "<svg width=\"10px\" height='20px'><rect width=\"5\"/></svg>";
        let fragment = SvgRenderer.render(&json!(svg), &Metadata::new()).unwrap();
        let html = fragment.to_html();
        assert!(html.contains("style=\"width: 10px;height: 20px;\""));
        assert!(html.contains(svg));

        let err = SvgRenderer.render(&json!("<rect/>"), &Metadata::new());
        assert!(err.is_err());
    }

    #[test]
    fn test_png_data_uri_and_hints() {
        let renderer = ImageRenderer::new(IMAGE_PNG, false);
        let fragment = renderer
            .render(
                &json!("aGVs\nbG8="),
                &meta(json!({"width": 40, "height": "30", "unconfined": true})),
            )
            .unwrap();
        let img = fragment.find_class("unconfined").unwrap();
        assert_eq!(img.attr("src"), Some("data:image/png;base64,aGVsbG8="));
        assert_eq!(img.attr("width"), Some("40"));
        assert_eq!(img.attr("height"), Some("30"));
        assert_eq!(fragment.kind(), Some("output_png"));
        assert!(!renderer.is_deferred());
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let err = ImageRenderer::new(IMAGE_JPEG, true)
            .render(&json!("not base64!"), &Metadata::new())
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidPayload { ref mimetype, .. } if mimetype == IMAGE_JPEG));
    }

    #[test]
    fn test_pdf_link() {
        let fragment = PdfRenderer.render(&json!("JVBERg=="), &Metadata::new()).unwrap();
        assert_eq!(
            fragment.to_html(),
            "<div class=\"output_subarea output_pdf\"><a target=\"_blank\" \
             href=\"data:application/pdf;base64,JVBERg==\">View PDF</a></div>"
        );
    }
}
