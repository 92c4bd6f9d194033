//! Output area controller
//!
//! [`OutputArea`] consumes kernel messages, keeps the ordered record log and
//! drives the render target through [`SafeSink`]. It is either idle or has a
//! clear pending (`clear_output` with `wait`); the pending clear runs right
//! before the next output is appended.

use std::rc::Rc;

use serde_json::json;
use tracing::{debug, warn};

use crate::app::Config;
use crate::core::{
    DisplayTree, ErrorOutput, Fragment, KernelMessage, Metadata, MessageKind, MimeBundle,
    OutputRecord, SlotId, Snapshot, StreamOutput, UnrecognizedOutput, TYPESET_TYPES,
};
use crate::error::RenderError;
use crate::render::{
    MimeBundleResolver, Renderer, RendererRegistry, ScriptEngine, CONSOLE_TEXT, STREAM,
    TRACEBACK,
};
use crate::sink::{failure_fragment, RenderTarget, SafeSink};
use crate::text::collapse_carriage_returns;

/// Hook for math typesetting of freshly attached output
pub trait Typesetter {
    fn typeset(&mut self, slot: SlotId, mimetype: &str);
}

/// Typesetter that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTypesetter;

impl Typesetter for NoopTypesetter {
    fn typeset(&mut self, _slot: SlotId, _mimetype: &str) {}
}

/// A bundle whose renderer asked for deferred insertion.
///
/// Its slot is already reserved; pass it to [`OutputArea::complete`].
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a pending render must be completed to show its output"]
pub struct PendingRender {
    pub slot: SlotId,
    pub mimetype: String,
    pub bundle: MimeBundle,
}

/// Result of appending one record
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// A record was logged; the slot is `None` when nothing was shown
    Appended(Option<SlotId>),
    /// Stream text was merged into the previous stream record
    Merged(Option<SlotId>),
    /// A record was logged and its output will arrive later
    Pending(PendingRender),
}

/// Result of handling one kernel message
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    Output(AppendOutcome),
    Cleared,
    ClearQueued,
    Ignored,
}

/// Builder for [`OutputArea`]
pub struct OutputAreaBuilder<T: RenderTarget> {
    target: T,
    config: Config,
    typesetter: Box<dyn Typesetter>,
    script_engine: Option<Rc<dyn ScriptEngine>>,
}

impl<T: RenderTarget> OutputAreaBuilder<T> {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn typesetter(mut self, typesetter: impl Typesetter + 'static) -> Self {
        self.typesetter = Box::new(typesetter);
        self
    }

    pub fn script_engine(mut self, engine: Rc<dyn ScriptEngine>) -> Self {
        self.script_engine = Some(engine);
        self
    }

    pub fn build(self) -> OutputArea<T> {
        let registry = RendererRegistry::with_builtins(&self.config, self.script_engine);
        let resolver = MimeBundleResolver::new(self.config.display_order());
        OutputArea {
            config: self.config,
            registry,
            resolver,
            sink: SafeSink::new(self.target),
            typesetter: self.typesetter,
            outputs: Vec::new(),
            slots: Vec::new(),
            clear_pending: false,
        }
    }
}

/// Renders kernel output into a target and logs what was shown
pub struct OutputArea<T: RenderTarget = DisplayTree> {
    config: Config,
    registry: RendererRegistry,
    resolver: MimeBundleResolver,
    sink: SafeSink<T>,
    typesetter: Box<dyn Typesetter>,
    outputs: Vec<OutputRecord>,
    /// Slot shown for each record, parallel to `outputs`
    slots: Vec<Option<SlotId>>,
    clear_pending: bool,
}

impl Default for OutputArea<DisplayTree> {
    fn default() -> Self {
        Self::new(DisplayTree::new())
    }
}

impl<T: RenderTarget> OutputArea<T> {
    pub fn builder(target: T) -> OutputAreaBuilder<T> {
        OutputAreaBuilder {
            target,
            config: Config::default(),
            typesetter: Box::new(NoopTypesetter),
            script_engine: None,
        }
    }

    /// An area with the default config and no typesetting
    pub fn new(target: T) -> Self {
        Self::builder(target).build()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn target(&self) -> &T {
        self.sink.target()
    }

    pub fn registry(&self) -> &RendererRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &MimeBundleResolver {
        &self.resolver
    }

    /// Records logged so far, in arrival order
    pub fn outputs(&self) -> &[OutputRecord] {
        &self.outputs
    }

    pub fn is_clear_pending(&self) -> bool {
        self.clear_pending
    }

    /// Register a renderer that takes precedence over earlier ones.
    ///
    /// A bundle type missing from the display order is moved to its front.
    pub fn register_renderer<R: Renderer + 'static>(&mut self, renderer: R) {
        let mimetype = renderer.mimetype().to_string();
        let internal = [CONSOLE_TEXT, STREAM, TRACEBACK].contains(&mimetype.as_str());
        if !internal && !self.resolver.order().contains(&mimetype) {
            self.resolver.order_mut().prefer(&mimetype);
        }
        self.registry.register(renderer);
    }

    pub fn set_fallback_renderer<R: Renderer + 'static>(&mut self, renderer: R) {
        self.registry.set_fallback(renderer);
    }

    /// Dispatch one kernel message
    pub fn handle(&mut self, msg: &KernelMessage) -> Handled {
        match msg.classify() {
            MessageKind::Clear { wait } => {
                self.clear_output(wait);
                if wait {
                    Handled::ClearQueued
                } else {
                    Handled::Cleared
                }
            }
            MessageKind::Output(record) => Handled::Output(self.append(record)),
            MessageKind::Ignored => {
                debug!("Ignoring {} message", msg.msg_type());
                Handled::Ignored
            }
            MessageKind::Unknown(kind) => {
                warn!("Unhandled output message type: {}", kind);
                Handled::Ignored
            }
        }
    }

    /// Clear now, or before the next output when `wait` is set.
    ///
    /// A second waiting clear while one is pending clears immediately.
    pub fn clear_output(&mut self, wait: bool) {
        if wait {
            if self.clear_pending {
                self.clear_now();
            }
            self.clear_pending = true;
        } else {
            self.clear_now();
        }
    }

    fn clear_now(&mut self) {
        self.clear_pending = false;
        self.sink.clear();
        self.outputs.clear();
        self.slots.clear();
    }

    /// Render and log one record
    pub fn append(&mut self, record: OutputRecord) -> AppendOutcome {
        if self.clear_pending {
            self.clear_now();
        }

        match record {
            OutputRecord::Stream(stream) => self.append_stream(stream),
            OutputRecord::Error(error) => {
                let slot = self.append_error(&error);
                self.log(OutputRecord::Error(error), slot)
            }
            OutputRecord::Unrecognized(output) => {
                let slot = self.append_unrecognized(&output);
                self.log(OutputRecord::Unrecognized(output), slot)
            }
            record @ (OutputRecord::DisplayData(_) | OutputRecord::ExecuteResult(_)) => {
                self.append_bundle(record)
            }
        }
    }

    /// Finish a deferred render.
    ///
    /// Returns `false` when the slot was cleared in the meantime; nothing is
    /// shown in that case.
    pub fn complete(&mut self, pending: PendingRender) -> bool {
        let PendingRender {
            slot,
            mimetype,
            bundle,
        } = pending;
        if !self.sink.is_attached(slot) {
            debug!("Discarding stale {} render", mimetype);
            return false;
        }

        let registry = &self.registry;
        let fragment = self.sink.guard(|| {
            let renderer = registry.find_or_fallback(&mimetype)?;
            crate::render::render_as(renderer, &mimetype, &bundle)
        });
        let filled = self.sink.fill(slot, fragment);
        if filled {
            self.typeset(slot, &mimetype);
        }
        filled
    }

    fn append_bundle(&mut self, mut record: OutputRecord) -> AppendOutcome {
        let bundle = record.bundle().unwrap_or_default().validate();
        record.set_data(bundle.data.clone());

        let Some(selection) = self.resolver.select(&bundle, &self.registry) else {
            let err = RenderError::NoRenderer {
                mimetypes: bundle.mimetypes(),
            };
            warn!("{}", err);
            let slot = self.sink.append(failure_fragment("Error rendering output!", &err));
            return self.log(record, slot);
        };

        let mimetype = selection.mimetype.clone();
        if selection.renderer.is_deferred() {
            let slot = self.sink.reserve();
            self.outputs.push(record);
            self.slots.push(Some(slot));
            return AppendOutcome::Pending(PendingRender {
                slot,
                mimetype,
                bundle,
            });
        }

        let resolver = &self.resolver;
        let fragment = self.sink.guard(|| resolver.render(&selection, &bundle));
        let slot = self.sink.append(fragment);
        if let Some(slot) = slot {
            self.typeset(slot, &mimetype);
        }
        self.log(record, slot)
    }

    fn append_stream(&mut self, stream: StreamOutput) -> AppendOutcome {
        let merge = matches!(
            self.outputs.last(),
            Some(OutputRecord::Stream(last)) if last.name == stream.name
        );
        if !merge {
            let slot = self.render_stream(&stream, None);
            return self.log(OutputRecord::Stream(stream), slot);
        }

        let existing = self.slots.last().copied().flatten();
        let merged = match self.outputs.last_mut() {
            Some(OutputRecord::Stream(last)) => {
                last.text = collapse_carriage_returns(&format!("{}{}", last.text, stream.text));
                last.clone()
            }
            _ => stream,
        };
        let slot = self.render_stream(&merged, existing);
        if let Some(last) = self.slots.last_mut() {
            *last = slot;
        }
        AppendOutcome::Merged(slot)
    }

    /// Render a stream record, re-using `existing` when it is still attached.
    ///
    /// Text that flattens to nothing is not shown; an existing slot for it is
    /// removed.
    fn render_stream(&mut self, stream: &StreamOutput, existing: Option<SlotId>) -> Option<SlotId> {
        let existing = existing.filter(|slot| self.sink.is_attached(*slot));
        if collapse_carriage_returns(&stream.text).is_empty() {
            if let Some(slot) = existing {
                self.sink.remove(slot);
            }
            return None;
        }

        let payload = json!({ "name": stream.name, "text": stream.text });
        let registry = &self.registry;
        let fragment = self.sink.guard(|| {
            registry
                .find_or_fallback(STREAM)?
                .render(&payload, &Metadata::new())
        });
        match existing {
            Some(slot) => {
                self.sink.replace(slot, fragment);
                Some(slot)
            }
            None => self.sink.append(fragment),
        }
    }

    fn append_error(&mut self, error: &ErrorOutput) -> Option<SlotId> {
        if error.traceback.is_empty() {
            return None;
        }
        let payload = json!({
            "ename": error.ename,
            "evalue": error.evalue,
            "traceback": error.traceback,
        });
        let registry = &self.registry;
        let fragment = self.sink.guard(|| {
            registry
                .find_or_fallback(TRACEBACK)?
                .render(&payload, &Metadata::new())
        });
        self.sink.append(fragment)
    }

    fn append_unrecognized(&mut self, output: &UnrecognizedOutput) -> Option<SlotId> {
        warn!("Unrecognized output type: {}", output.output_type);
        let link = Fragment::new("a")
            .with_attr("href", "#")
            .with_text(format!("Unrecognized output: {}", output.output_type));
        let subarea = Fragment::subarea("output_unrecognized").with_child(link);
        self.sink.append(Fragment::div().with_child(subarea))
    }

    fn log(&mut self, record: OutputRecord, slot: Option<SlotId>) -> AppendOutcome {
        self.outputs.push(record);
        self.slots.push(slot);
        AppendOutcome::Appended(slot)
    }

    fn typeset(&mut self, slot: SlotId, mimetype: &str) {
        if TYPESET_TYPES.iter().any(|t| *t == mimetype) {
            self.typesetter.typeset(slot, mimetype);
        }
    }

    /// The record log
    pub fn to_json(&self) -> &[OutputRecord] {
        &self.outputs
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        OutputRecord::list_to_json(&self.outputs)
    }

    /// Replay saved records in order.
    ///
    /// Records are appended after whatever is already shown. Deferred renders
    /// are returned for the caller to complete.
    pub fn from_json(&mut self, records: Vec<OutputRecord>) -> Vec<PendingRender> {
        let mut pending = Vec::new();
        for record in records {
            if let AppendOutcome::Pending(render) = self.append(record) {
                pending.push(render);
            }
        }
        pending
    }

    pub fn from_json_str(&mut self, json: &str) -> Result<Vec<PendingRender>, serde_json::Error> {
        let records = OutputRecord::list_from_json(json)?;
        Ok(self.from_json(records))
    }
}

impl OutputArea<DisplayTree> {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_tree(self.target())
    }

    pub fn to_html(&self) -> String {
        self.target().to_html()
    }
}
