//! Representation selection
//!
//! Walks the display order and picks the first type that the bundle carries
//! and the registry can render.

use tracing::debug;

use super::registry::{Renderer, RendererRegistry};
use crate::core::{
    Fragment, MimeBundle, APPLICATION_JAVASCRIPT, APPLICATION_PDF, IMAGE_JPEG, IMAGE_PNG,
    IMAGE_SVG, TEXT_HTML, TEXT_LATEX, TEXT_MARKDOWN, TEXT_PLAIN,
};
use crate::error::{RenderError, Result};

/// Richest representation first
pub const DEFAULT_DISPLAY_ORDER: [&str; 9] = [
    APPLICATION_JAVASCRIPT,
    TEXT_HTML,
    TEXT_MARKDOWN,
    TEXT_LATEX,
    IMAGE_SVG,
    IMAGE_PNG,
    IMAGE_JPEG,
    APPLICATION_PDF,
    TEXT_PLAIN,
];

/// Ordered MIME type priority list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOrder(Vec<String>);

impl Default for DisplayOrder {
    fn default() -> Self {
        Self(DEFAULT_DISPLAY_ORDER.iter().map(|t| t.to_string()).collect())
    }
}

impl DisplayOrder {
    pub fn new(types: Vec<String>) -> Self {
        Self(types)
    }

    pub fn contains(&self, mimetype: &str) -> bool {
        self.0.iter().any(|t| t == mimetype)
    }

    /// Move `mimetype` to the front, inserting it if absent
    pub fn prefer(&mut self, mimetype: &str) {
        self.0.retain(|t| t != mimetype);
        self.0.insert(0, mimetype.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// The chosen representation of a bundle and the renderer for it
pub struct Selection<'r> {
    pub mimetype: String,
    pub renderer: &'r dyn Renderer,
}

/// Outcome of rendering a bundle
#[derive(Debug)]
pub struct Resolved {
    pub mimetype: String,
    pub result: Result<Fragment>,
}

#[derive(Debug, Clone, Default)]
pub struct MimeBundleResolver {
    order: DisplayOrder,
}

impl MimeBundleResolver {
    pub fn new(order: DisplayOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> &DisplayOrder {
        &self.order
    }

    pub fn order_mut(&mut self) -> &mut DisplayOrder {
        &mut self.order
    }

    /// Pick the type to render without rendering it.
    ///
    /// With no specific renderer, the fallback gets the highest-priority type
    /// present, or failing that the alphabetically first type in the bundle.
    pub fn select<'r>(
        &self,
        bundle: &MimeBundle,
        registry: &'r RendererRegistry,
    ) -> Option<Selection<'r>> {
        for mimetype in self.order.iter() {
            if !bundle.contains(mimetype) {
                continue;
            }
            if let Some(renderer) = registry.find(mimetype) {
                return Some(Selection {
                    mimetype: mimetype.to_string(),
                    renderer,
                });
            }
        }

        let renderer = registry.fallback()?;
        let mimetype = self
            .order
            .iter()
            .find(|t| bundle.contains(t))
            .map(str::to_string)
            .or_else(|| bundle.data.keys().min().cloned())?;
        debug!("Rendering {} with the fallback renderer", mimetype);
        Some(Selection { mimetype, renderer })
    }

    /// Render one selected type of `bundle`, tagged as a result
    pub fn render(&self, selection: &Selection<'_>, bundle: &MimeBundle) -> Result<Fragment> {
        render_as(selection.renderer, &selection.mimetype, bundle)
    }

    /// Select and render; `None` when nothing is renderable
    pub fn resolve(&self, bundle: &MimeBundle, registry: &RendererRegistry) -> Option<Resolved> {
        let selection = self.select(bundle, registry)?;
        let result = self.render(&selection, bundle);
        Some(Resolved {
            mimetype: selection.mimetype,
            result,
        })
    }
}

/// Render `mimetype` of `bundle` with `renderer` and mark it `output_result`
pub(crate) fn render_as(
    renderer: &dyn Renderer,
    mimetype: &str,
    bundle: &MimeBundle,
) -> Result<Fragment> {
    let payload = bundle
        .payload(mimetype)
        .ok_or_else(|| RenderError::NoRenderer {
            mimetypes: bundle.mimetypes(),
        })?;
    let mut fragment = renderer.render(payload, &bundle.metadata_for(mimetype))?;
    fragment.add_class("output_result");
    Ok(fragment)
}
