//! Safe attachment of rendered output
//!
//! Rendered content may come from arbitrary third-party renderers and
//! script engines. [`SafeSink`] is the only way the output area touches its
//! render target: failures and panics while rendering or attaching are caught
//! here and replaced with a visible error fragment, so nothing propagates to
//! the message handler.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};

use crate::core::{Fragment, SlotId};
use crate::error::{AttachError, RenderError};

/// A live visual area that fragments are attached to
pub trait RenderTarget {
    /// Append a fragment as the last child
    fn attach(&mut self, fragment: Fragment) -> Result<SlotId, AttachError>;

    /// Reserve the next child position for content that arrives later
    fn reserve(&mut self) -> SlotId;

    /// Set or replace the content of a slot
    fn fill(&mut self, slot: SlotId, fragment: Fragment) -> Result<(), AttachError>;

    /// Drop a slot and its content; later slots keep their positions
    fn remove(&mut self, slot: SlotId) -> Result<(), AttachError>;

    /// Whether a slot still belongs to the live tree
    fn is_attached(&self, slot: SlotId) -> bool;

    /// Remove every child
    fn clear(&mut self);
}

/// Visible replacement for output that failed to render or attach
pub fn failure_fragment(title: &str, err: &dyn Display) -> Fragment {
    let subarea = Fragment::subarea("output_failure")
        .with_child(Fragment::div().with_class("js-error").with_text(title))
        .with_child(Fragment::div().with_class("js-error").with_text(err.to_string()))
        .with_child(
            Fragment::div()
                .with_class("js-error")
                .with_text("See the log for more details."),
        );
    Fragment::div().with_child(subarea)
}

/// Exception-isolating wrapper around a render target
#[derive(Debug)]
pub struct SafeSink<T: RenderTarget> {
    target: T,
}

impl<T: RenderTarget> SafeSink<T> {
    pub fn new(target: T) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn into_inner(self) -> T {
        self.target
    }

    /// Run a render and wrap the result in an output container.
    ///
    /// An error or a panic becomes a failure fragment instead.
    pub fn guard<F>(&self, render: F) -> Fragment
    where
        F: FnOnce() -> Result<Fragment, RenderError>,
    {
        let outcome = panic::catch_unwind(AssertUnwindSafe(render))
            .unwrap_or_else(|payload| Err(RenderError::Panicked(panic_message(payload))));
        match outcome {
            Ok(fragment) => Fragment::div().with_child(fragment),
            Err(err) => {
                error!("Error rendering output: {}", err);
                failure_fragment("Error rendering output!", &err)
            }
        }
    }

    /// Attach a fragment; on failure attach an error fragment instead.
    ///
    /// Returns `None` only when the replacement could not be attached either.
    pub fn append(&mut self, fragment: Fragment) -> Option<SlotId> {
        match self.try_attach(fragment) {
            Ok(slot) => Some(slot),
            Err(err) => {
                error!("{}", err);
                match self.try_attach(failure_fragment("Error adding output!", &err)) {
                    Ok(slot) => Some(slot),
                    Err(err) => {
                        error!("Could not attach error output: {}", err);
                        None
                    }
                }
            }
        }
    }

    pub fn reserve(&mut self) -> SlotId {
        self.target.reserve()
    }

    /// Fill a slot if it is still attached.
    ///
    /// A slot detached by a clear is left alone and `false` returned.
    pub fn fill(&mut self, slot: SlotId, fragment: Fragment) -> bool {
        if !self.target.is_attached(slot) {
            debug!("Dropping render for detached slot {:?}", slot);
            return false;
        }
        match self.try_fill(slot, fragment) {
            Ok(()) => true,
            Err(err) => {
                error!("{}", err);
                let replacement = failure_fragment("Error adding output!", &err);
                if let Err(err) = self.try_fill(slot, replacement) {
                    error!("Could not attach error output: {}", err);
                }
                true
            }
        }
    }

    /// Re-render an attached slot in place
    pub fn replace(&mut self, slot: SlotId, fragment: Fragment) -> bool {
        self.fill(slot, fragment)
    }

    /// Remove an attached slot; `false` when it was already detached
    pub fn remove(&mut self, slot: SlotId) -> bool {
        if !self.target.is_attached(slot) {
            return false;
        }
        let target = &mut self.target;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| target.remove(slot)))
            .unwrap_or_else(|payload| Err(AttachError(panic_message(payload))));
        match outcome {
            Ok(()) => true,
            Err(err) => {
                error!("Could not remove output: {}", err);
                false
            }
        }
    }

    pub fn is_attached(&self, slot: SlotId) -> bool {
        self.target.is_attached(slot)
    }

    pub fn clear(&mut self) {
        let target = &mut self.target;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| target.clear())) {
            error!("Render target panicked while clearing: {}", panic_message(payload));
        }
    }

    fn try_attach(&mut self, fragment: Fragment) -> Result<SlotId, AttachError> {
        let target = &mut self.target;
        panic::catch_unwind(AssertUnwindSafe(|| target.attach(fragment)))
            .unwrap_or_else(|payload| Err(AttachError(panic_message(payload))))
    }

    fn try_fill(&mut self, slot: SlotId, fragment: Fragment) -> Result<(), AttachError> {
        let target = &mut self.target;
        panic::catch_unwind(AssertUnwindSafe(|| target.fill(slot, fragment)))
            .unwrap_or_else(|payload| Err(AttachError(panic_message(payload))))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
