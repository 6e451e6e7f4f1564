//! The built-in directives and the registry merge.
//!
//! Each directive is a [`TagHandler`] producing instruction fragments.
//! Caller-supplied entries in `Options::tags` replace built-ins of the
//! same name wholesale.

use super::attrs::ParsedAttributes;
use super::program::Instruction;
use super::scanner::CompiledSpan;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::options::{Options, RawAttrs, TagHandler, TagHandlers};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Resolve a directive attribute that holds code: a static value is
/// parsed as a bare expression, a dynamic value is already a span.
fn expr_attr(
    parsed: &ParsedAttributes,
    name: &str,
    isolate_static: bool,
) -> Result<Option<CompiledSpan>> {
    if let Some(value) = parsed.statics.get(name) {
        return Ok(Some(CompiledSpan::from_expr_source(value, isolate_static)?));
    }
    Ok(parsed.var_args.get(name).cloned())
}

/// `tpl-each`: iterate over a sequence, binding item and index names
struct EachTag;

impl TagHandler for EachTag {
    fn on_open(
        &self,
        _name: &str,
        _attrs: &RawAttrs,
        parsed: &ParsedAttributes,
        _options: &Options,
    ) -> Result<Vec<Instruction>> {
        let items = match expr_attr(parsed, "items", false)? {
            Some(span) => span,
            None => CompiledSpan::from_expr(Expr::Variable("items".to_string()), false),
        };
        let item = parsed
            .statics
            .get("item")
            .cloned()
            .unwrap_or_else(|| "item".to_string());
        let index = parsed
            .statics
            .get("index")
            .cloned()
            .unwrap_or_else(|| "index".to_string());
        Ok(vec![Instruction::EachOpen { items, item, index }])
    }

    fn on_close(&self, _name: &str, _options: &Options) -> Result<Vec<Instruction>> {
        Ok(vec![Instruction::EachClose])
    }
}

/// `tpl-if`: open a conditional block
struct IfTag;

impl TagHandler for IfTag {
    fn on_open(
        &self,
        _name: &str,
        _attrs: &RawAttrs,
        parsed: &ParsedAttributes,
        _options: &Options,
    ) -> Result<Vec<Instruction>> {
        Ok(vec![Instruction::IfOpen {
            condition: condition_attr(parsed)?,
        }])
    }

    fn on_close(&self, _name: &str, _options: &Options) -> Result<Vec<Instruction>> {
        Ok(vec![Instruction::IfClose])
    }
}

/// `tpl-else-if`: chain an alternative condition; carries no close
struct ElseIfTag;

impl TagHandler for ElseIfTag {
    fn on_open(
        &self,
        _name: &str,
        _attrs: &RawAttrs,
        parsed: &ParsedAttributes,
        _options: &Options,
    ) -> Result<Vec<Instruction>> {
        Ok(vec![Instruction::ElseIf {
            condition: condition_attr(parsed)?,
        }])
    }
}

/// `tpl-else`: the unconditional alternative; carries no close
struct ElseTag;

impl TagHandler for ElseTag {
    fn on_open(
        &self,
        _name: &str,
        _attrs: &RawAttrs,
        _parsed: &ParsedAttributes,
        _options: &Options,
    ) -> Result<Vec<Instruction>> {
        Ok(vec![Instruction::Else])
    }
}

fn condition_attr(parsed: &ParsedAttributes) -> Result<CompiledSpan> {
    Ok(expr_attr(parsed, "expression", false)?
        .unwrap_or_else(|| CompiledSpan::from_expr(Expr::Boolean(false), false)))
}

/// `tpl-text`: emit a text node from the `value` attribute
struct TextTag;

impl TagHandler for TextTag {
    fn on_open(
        &self,
        name: &str,
        _attrs: &RawAttrs,
        parsed: &ParsedAttributes,
        options: &Options,
    ) -> Result<Vec<Instruction>> {
        let value = expr_attr(parsed, "value", options.skip_exceptions)?.ok_or_else(|| {
            Error::template(format!("<{}> requires a `value` attribute", name))
        })?;
        Ok(vec![Instruction::TextDynamic { value }])
    }
}

/// `tpl-call`: splice in the helper registered under `name`
struct CallTag;

impl TagHandler for CallTag {
    fn on_open(
        &self,
        name: &str,
        _attrs: &RawAttrs,
        parsed: &ParsedAttributes,
        _options: &Options,
    ) -> Result<Vec<Instruction>> {
        if parsed.var_args.contains_key("name") {
            return Err(Error::template(format!(
                "<{}> requires a static `name` attribute",
                name
            )));
        }
        let helper = parsed.statics.get("name").cloned().ok_or_else(|| {
            Error::template(format!("<{}> requires a `name` attribute", name))
        })?;
        Ok(vec![Instruction::CallHelper { name: helper }])
    }
}

/// `tpl-logger`: emit a leveled log message
struct LoggerTag;

impl TagHandler for LoggerTag {
    fn on_open(
        &self,
        _name: &str,
        _attrs: &RawAttrs,
        parsed: &ParsedAttributes,
        options: &Options,
    ) -> Result<Vec<Instruction>> {
        let level = parsed
            .statics
            .get("level")
            .map(|l| log_level(l))
            .unwrap_or(log::Level::Info);
        let content = expr_attr(parsed, "content", options.skip_exceptions)?
            .unwrap_or_else(|| CompiledSpan::literal(""));
        Ok(vec![Instruction::Log { level, content }])
    }
}

fn log_level(name: &str) -> log::Level {
    match name.to_ascii_lowercase().as_str() {
        "error" => log::Level::Error,
        "warn" => log::Level::Warn,
        "debug" => log::Level::Debug,
        "trace" => log::Level::Trace,
        // "log" and anything unknown land on the informational level.
        _ => log::Level::Info,
    }
}

static BUILT_IN_TAGS: Lazy<TagHandlers> = Lazy::new(|| {
    let mut tags = TagHandlers::new();
    tags.insert("tpl-each".to_string(), Arc::new(EachTag) as _);
    tags.insert("tpl-if".to_string(), Arc::new(IfTag) as _);
    tags.insert("tpl-else-if".to_string(), Arc::new(ElseIfTag) as _);
    tags.insert("tpl-else".to_string(), Arc::new(ElseTag) as _);
    tags.insert("tpl-text".to_string(), Arc::new(TextTag) as _);
    tags.insert("tpl-call".to_string(), Arc::new(CallTag) as _);
    tags.insert("tpl-logger".to_string(), Arc::new(LoggerTag) as _);
    tags
});

/// The effective registry for one compile call: built-ins overlaid by the
/// caller's entries, caller winning by name.
pub fn merge_tags(user: &TagHandlers) -> TagHandlers {
    let mut tags = BUILT_IN_TAGS.clone();
    for (name, handler) in user {
        tags.insert(name.clone(), Arc::clone(handler));
    }
    tags
}
