//! Script payloads
//!
//! Script evaluation is a trust boundary. Nothing here executes code by
//! itself: a host that wants `application/javascript` outputs supplies a
//! [`ScriptEngine`] and turns on `allow_scripts`.

use std::rc::Rc;

use serde_json::Value;
use tracing::warn;

use super::registry::Renderer;
use crate::core::{Fragment, Metadata, APPLICATION_JAVASCRIPT};
use crate::error::{RenderError, Result, ScriptError};

/// Host hook that evaluates script output against its element
pub trait ScriptEngine {
    fn evaluate(&self, code: &str, element: &mut Fragment) -> std::result::Result<(), ScriptError>;
}

/// Renders `application/javascript` by handing it to a [`ScriptEngine`]
pub struct ScriptRenderer {
    engine: Rc<dyn ScriptEngine>,
}

impl ScriptRenderer {
    pub fn new(engine: Rc<dyn ScriptEngine>) -> Self {
        Self { engine }
    }
}

impl Renderer for ScriptRenderer {
    fn mimetype(&self) -> &str {
        APPLICATION_JAVASCRIPT
    }

    fn render(&self, payload: &Value, _metadata: &Metadata) -> Result<Fragment> {
        let code = payload.as_str().ok_or_else(|| RenderError::InvalidPayload {
            mimetype: APPLICATION_JAVASCRIPT.to_string(),
            reason: "expected script source".to_string(),
        })?;

        let mut element = Fragment::subarea("output_javascript");
        if let Err(err) = self.engine.evaluate(code, &mut element) {
            warn!("Error evaluating script output: {}", err);
            for line in [
                "Javascript error adding output!".to_string(),
                err.to_string(),
                "See your browser Javascript console for more details.".to_string(),
            ] {
                element.push_child(Fragment::div().with_class("js-error").with_text(line));
            }
        }
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoEngine;

    impl ScriptEngine for EchoEngine {
        fn evaluate(&self, code: &str, element: &mut Fragment) -> std::result::Result<(), ScriptError> {
            if code.contains("throw") {
                return Err(ScriptError::new("ReferenceError", "x is not defined"));
            }
            element.push_text(format!("ran {}", code));
            Ok(())
        }
    }

    #[test]
    fn test_engine_writes_into_element() {
        let renderer = ScriptRenderer::new(Rc::new(EchoEngine));
        let fragment = renderer.render(&json!("f()"), &Metadata::new()).unwrap();
        assert_eq!(fragment.kind(), Some("output_javascript"));
        assert_eq!(fragment.text_content(), "ran f()");
    }

    #[test]
    fn test_engine_error_appends_error_lines() {
        let renderer = ScriptRenderer::new(Rc::new(EchoEngine));
        let fragment = renderer.render(&json!("throw x"), &Metadata::new()).unwrap();
        let text = fragment.text_content();
        assert!(text.starts_with("Javascript error adding output!"));
        assert!(text.contains("ReferenceError: x is not defined"));
        assert!(fragment.find_class("js-error").is_some());
    }
}
