use crate::compiler::attrs::ParsedAttributes;
use crate::compiler::program::Instruction;
use crate::error::Result;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Ordered attribute map as delivered by the markup tokenizer
pub type RawAttrs = IndexMap<String, String>;

/// Value of the skip attribute that turns the skip behavior off again
pub const SKIP_DEACTIVATED: &str = "deactivated";

/// Converts a directive tag into instruction fragments.
///
/// The open handler is required; the close handler defaults to an empty
/// fragment, which still consumes the close event so nesting stays intact.
pub trait TagHandler: Send + Sync {
    fn on_open(
        &self,
        name: &str,
        attrs: &RawAttrs,
        parsed: &ParsedAttributes,
        options: &Options,
    ) -> Result<Vec<Instruction>>;

    fn on_close(&self, _name: &str, _options: &Options) -> Result<Vec<Instruction>> {
        Ok(Vec::new())
    }
}

/// Dictionary of tag handlers, keyed by tag name
pub type TagHandlers = IndexMap<String, Arc<dyn TagHandler>>;

static DEFAULT_INTERPOLATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([\s\S]+?)\}\}").expect("default interpolation pattern"));

static DEFAULT_EXPRESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([\s\S]+?)]]").expect("default expression pattern"));

/// The HTML void elements (https://html.spec.whatwg.org/#void-elements)
static SELF_CLOSING_ELEMENTS: Lazy<Vec<String>> = Lazy::new(|| {
    [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta",
        "param", "source", "track", "wbr",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
});

/// Compilation options.
///
/// `Default` yields the documented defaults; `compile` merges the built-in
/// directive registry underneath `tags` into a fresh copy per call and
/// never mutates the caller's value.
#[derive(Clone)]
pub struct Options {
    /// Separate the statements of the instruction listing with line breaks.
    pub pretty: bool,
    /// Handle discovered static attributes as dynamic attributes.
    pub ignore_static_attributes: bool,
    /// Pattern of interpolated value spans; the code is capture group 1.
    pub interpolation: Regex,
    /// Pattern of raw code spans; the code is capture group 1.
    pub expression: Regex,
    /// Name of the attribute carrying the element identity key.
    /// Useful when dealing with loops.
    pub attribute_key: String,
    /// Name of the attribute flagging a subtree as skipped.
    pub attribute_skip: String,
    /// If true, a failing span evaluation yields an empty string for that
    /// span instead of failing the whole render call.
    pub skip_exceptions: bool,
    /// If true, elements with a `-` in their name or an `is` attribute get
    /// their subtree skipped unless deactivated per element.
    pub skip_custom_elements: bool,
    /// Root identifier the render data is bound to in expressions.
    pub var_data_name: String,
    /// Identifier the helpers map is known by.
    pub var_helpers_name: String,
    /// The set of void element names.
    pub self_closing_elements: Vec<String>,
    /// Caller-supplied directives, merged over the built-ins by name.
    pub tags: TagHandlers,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            pretty: false,
            ignore_static_attributes: false,
            interpolation: DEFAULT_INTERPOLATION.clone(),
            expression: DEFAULT_EXPRESSION.clone(),
            attribute_key: "tpl-key".to_string(),
            attribute_skip: "tpl-skip".to_string(),
            skip_exceptions: true,
            skip_custom_elements: true,
            var_data_name: "data".to_string(),
            var_helpers_name: "helpers".to_string(),
            self_closing_elements: SELF_CLOSING_ELEMENTS.clone(),
            tags: TagHandlers::new(),
        }
    }
}

impl Options {
    pub fn is_self_closing(&self, name: &str) -> bool {
        self.self_closing_elements.iter().any(|e| e == name)
    }
}
