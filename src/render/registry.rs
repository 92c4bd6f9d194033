//! Renderer registry
//!
//! An ordered list of capability records. Lookup walks the list from the
//! most recently registered entry backwards, so registering a renderer for a
//! type that already has one overrides it.

use std::rc::Rc;

use serde_json::Value;

use super::builtin::{
    ConsoleTextRenderer, HtmlRenderer, ImageRenderer, LatexRenderer, MarkdownRenderer,
    PdfRenderer, StreamRenderer, SvgRenderer, TracebackRenderer,
};
use super::script::{ScriptEngine, ScriptRenderer};
use crate::app::Config;
use crate::core::{Fragment, Metadata, IMAGE_JPEG, IMAGE_PNG};
use crate::error::{RenderError, Result};

/// Converts one MIME payload into a displayable fragment
pub trait Renderer {
    /// The MIME type this renderer accepts
    fn mimetype(&self) -> &str;

    /// Render `payload` using the hints in `metadata`
    fn render(&self, payload: &Value, metadata: &Metadata) -> Result<Fragment>;

    /// Whether output should be inserted later through a reserved slot
    fn is_deferred(&self) -> bool {
        false
    }
}

/// A renderer built from a closure
pub struct FnRenderer<F> {
    mimetype: String,
    render: F,
}

impl<F> FnRenderer<F>
where
    F: Fn(&Value, &Metadata) -> Result<Fragment>,
{
    pub fn new(mimetype: impl Into<String>, render: F) -> Self {
        Self {
            mimetype: mimetype.into(),
            render,
        }
    }
}

impl<F> Renderer for FnRenderer<F>
where
    F: Fn(&Value, &Metadata) -> Result<Fragment>,
{
    fn mimetype(&self) -> &str {
        &self.mimetype
    }

    fn render(&self, payload: &Value, metadata: &Metadata) -> Result<Fragment> {
        (self.render)(payload, metadata)
    }
}

/// Ordered collection of renderers with an optional fallback
#[derive(Default)]
pub struct RendererRegistry {
    renderers: Vec<Box<dyn Renderer>>,
    fallback: Option<Box<dyn Renderer>>,
}

impl RendererRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalog.
    ///
    /// The script renderer is only included when scripts are allowed by the
    /// config and an engine is supplied.
    pub fn with_builtins(config: &Config, scripts: Option<Rc<dyn ScriptEngine>>) -> Self {
        let mut registry = Self::new();
        registry.register(ConsoleTextRenderer::plain(config.autolink_urls));
        registry.register(ConsoleTextRenderer::console(config.autolink_urls));
        registry.register(StreamRenderer::new(config.autolink_urls));
        registry.register(TracebackRenderer::new(config.autolink_urls));
        registry.register(HtmlRenderer);
        registry.register(MarkdownRenderer);
        registry.register(LatexRenderer);
        registry.register(SvgRenderer);
        registry.register(ImageRenderer::new(IMAGE_PNG, config.defer_images));
        registry.register(ImageRenderer::new(IMAGE_JPEG, config.defer_images));
        registry.register(PdfRenderer);

        match scripts {
            Some(engine) if config.allow_scripts => registry.register(ScriptRenderer::new(engine)),
            Some(_) => tracing::debug!("Script engine supplied but scripts are disabled"),
            None => {}
        }
        registry
    }

    pub fn register<R: Renderer + 'static>(&mut self, renderer: R) {
        self.renderers.push(Box::new(renderer));
    }

    pub fn register_boxed(&mut self, renderer: Box<dyn Renderer>) {
        self.renderers.push(renderer);
    }

    /// Most recently registered renderer for `mimetype`
    pub fn find(&self, mimetype: &str) -> Option<&dyn Renderer> {
        self.renderers
            .iter()
            .rev()
            .find(|renderer| renderer.mimetype() == mimetype)
            .map(|renderer| renderer.as_ref())
    }

    pub fn set_fallback<R: Renderer + 'static>(&mut self, renderer: R) {
        self.fallback = Some(Box::new(renderer));
    }

    pub fn fallback(&self) -> Option<&dyn Renderer> {
        self.fallback.as_deref()
    }

    /// Renderer for `mimetype`, else the fallback, else an error
    pub fn find_or_fallback(&self, mimetype: &str) -> Result<&dyn Renderer> {
        self.find(mimetype)
            .or_else(|| self.fallback())
            .ok_or_else(|| RenderError::NoRenderer {
                mimetypes: vec![mimetype.to_string()],
            })
    }

    /// Registered MIME types, oldest first, without duplicates
    pub fn mimetypes(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::with_capacity(self.renderers.len());
        for renderer in &self.renderers {
            if !types.contains(&renderer.mimetype()) {
                types.push(renderer.mimetype());
            }
        }
        types
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{APPLICATION_JAVASCRIPT, TEXT_HTML, TEXT_PLAIN};
    use crate::error::ScriptError;
    use serde_json::json;

    struct NoopEngine;

    impl ScriptEngine for NoopEngine {
        fn evaluate(&self, _code: &str, _element: &mut Fragment) -> std::result::Result<(), ScriptError> {
            Ok(())
        }
    }

    fn tagged(mimetype: &'static str, tag: &'static str) -> impl Renderer {
        FnRenderer::new(mimetype, move |_: &Value, _: &Metadata| Ok(Fragment::new(tag)))
    }

    #[test]
    fn test_find_prefers_latest_registration() {
        let mut registry = RendererRegistry::new();
        registry.register(tagged(TEXT_PLAIN, "first"));
        registry.register(tagged(TEXT_PLAIN, "second"));

        let renderer = registry.find(TEXT_PLAIN).unwrap();
        let fragment = renderer.render(&json!("x"), &Metadata::new()).unwrap();
        assert_eq!(fragment.tag, "second");
        assert_eq!(registry.mimetypes(), vec![TEXT_PLAIN]);
    }

    #[test]
    fn test_missing_renderer_without_fallback_is_error() {
        let registry = RendererRegistry::new();
        assert!(registry.find(TEXT_HTML).is_none());
        assert_eq!(
            registry.find_or_fallback(TEXT_HTML).err(),
            Some(RenderError::NoRenderer {
                mimetypes: vec![TEXT_HTML.to_string()]
            })
        );
    }

    #[test]
    fn test_fallback_used_when_nothing_matches() {
        let mut registry = RendererRegistry::new();
        registry.set_fallback(tagged("*", "fallback"));
        let renderer = registry.find_or_fallback("application/x-unknown").unwrap();
        assert_eq!(renderer.mimetype(), "*");
    }

    #[test]
    fn test_builtins_exclude_scripts_by_default() {
        let engine: Rc<dyn ScriptEngine> = Rc::new(NoopEngine);
        let registry = RendererRegistry::with_builtins(&Config::default(), Some(engine.clone()));
        assert!(registry.find(APPLICATION_JAVASCRIPT).is_none());
        assert!(registry.find(TEXT_PLAIN).is_some());

        let config = Config {
            allow_scripts: true,
            ..Config::default()
        };
        let registry = RendererRegistry::with_builtins(&config, Some(engine));
        assert!(registry.find(APPLICATION_JAVASCRIPT).is_some());

        let registry = RendererRegistry::with_builtins(&config, None);
        assert!(registry.find(APPLICATION_JAVASCRIPT).is_none());
    }
}
