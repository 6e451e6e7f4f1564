//! The attribute classifier.
//!
//! Separates a tag's static attributes from the dynamic ones, extracts
//! the reserved key and skip attributes, and applies the force-dynamic
//! override.

use super::scanner::CompiledSpan;
use super::shield::unshield;
use crate::error::Result;
use crate::options::{Options, RawAttrs, SKIP_DEACTIVATED};
use indexmap::IndexMap;

/// Classification result for one opened tag
#[derive(Debug, Clone)]
pub struct ParsedAttributes {
    /// Attributes whose value is a literal, in source order
    pub statics: IndexMap<String, String>,
    /// Attributes whose value must be re-evaluated per render, in source order
    pub var_args: IndexMap<String, CompiledSpan>,
    /// The element identity key, if the reserved attribute was present
    pub key: Option<CompiledSpan>,
    /// Whether the subtree skip was requested
    pub skip: bool,
}

fn check_skip_attribute(attrs: &RawAttrs, options: &Options) -> bool {
    attrs
        .get(&options.attribute_skip)
        .is_some_and(|v| v != SKIP_DEACTIVATED)
}

fn check_is_attribute(attrs: &RawAttrs, options: &Options) -> bool {
    options.skip_custom_elements
        && attrs.contains_key("is")
        && attrs.get(&options.attribute_skip).map(String::as_str) != Some(SKIP_DEACTIVATED)
}

/// Whether the element is a custom element that gets its subtree skipped
/// under the default policy: hyphenated name, policy enabled, skip not
/// deactivated on the element itself.
pub fn check_custom_element(name: &str, attrs: &RawAttrs, options: &Options) -> bool {
    options.skip_custom_elements
        && attrs.get(&options.attribute_skip).map(String::as_str) != Some(SKIP_DEACTIVATED)
        && name.contains('-')
}

/// Classify a tag's attributes.
///
/// Every value is unshielded first. A value matching the interpolation
/// pattern, or any value under `ignore_static_attributes`, becomes a
/// dynamic span; the rest stay literal. The reserved key attribute is
/// pulled out of whichever map it landed in, statics taking precedence;
/// a static key value is parsed as an expression (constants are written
/// quoted: `tpl-key="'constant'"`).
pub fn classify(attrs: &RawAttrs, options: &Options) -> Result<ParsedAttributes> {
    let skip = check_skip_attribute(attrs, options) || check_is_attribute(attrs, options);

    let mut statics = IndexMap::new();
    let mut var_args = IndexMap::new();

    for (name, raw) in attrs {
        if *name == options.attribute_skip {
            continue;
        }
        let value = unshield(raw);
        if options.interpolation.is_match(&value) || options.ignore_static_attributes {
            var_args.insert(
                name.clone(),
                CompiledSpan::from_value(&value, &options.interpolation, options.skip_exceptions)?,
            );
        } else {
            statics.insert(name.clone(), value);
        }
    }

    let static_key = statics.shift_remove(&options.attribute_key);
    let dynamic_key = var_args.shift_remove(&options.attribute_key);
    let key = match static_key {
        Some(value) => Some(CompiledSpan::from_expr_source(&value, false)?),
        None => dynamic_key,
    };

    Ok(ParsedAttributes {
        statics,
        var_args,
        key,
        skip,
    })
}
