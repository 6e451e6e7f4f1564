//! The expression scanner.
//!
//! Splits a string into literal and code segments against a configurable
//! pattern, and builds [`CompiledSpan`]s, the parsed form evaluated at
//! render time.

use crate::error::Result;
use crate::expr::{self, Expr, Scope};
use crate::expr::parser::parse_expression;
use regex::Regex;
use serde_json::Value;
use std::fmt;

/// One segment of a scanned string, in source order
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Code(String),
}

/// Split `value` into literal and code segments in left-to-right order.
///
/// The code is capture group 1 of `pattern`. Whitespace-only code spans
/// contribute no segment; literal gaps between matches and the trailing
/// gap after the last match are kept when non-empty. A value without any
/// match yields a single literal segment.
pub fn scan(value: &str, pattern: &Regex) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last_index = 0;

    for caps in pattern.captures_iter(value) {
        let full = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let before = &value[last_index..full.start()];
        if !before.is_empty() {
            segments.push(Segment::Literal(before.to_string()));
        }
        let code = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        if !code.trim().is_empty() {
            segments.push(Segment::Code(code.to_string()));
        }
        last_index = full.end();
    }

    let after = &value[last_index..];
    if !after.is_empty() {
        segments.push(Segment::Literal(after.to_string()));
    }

    segments
}

/// One part of a compiled span
#[derive(Debug, Clone, PartialEq)]
pub enum SpanPart {
    Literal(String),
    Expr(Expr),
}

/// A parsed static-or-dynamic value.
///
/// Spans with a single expression part evaluate to the raw value, so an
/// iteration source stays an array; mixed spans concatenate the
/// stringified parts. With `isolate` set, a failing part yields an empty
/// string instead of failing the render call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSpan {
    parts: Vec<SpanPart>,
    isolate: bool,
}

impl CompiledSpan {
    /// Compile an attribute-style value: literal text with embedded code
    /// spans, joined by string concatenation.
    pub fn from_value(value: &str, pattern: &Regex, isolate: bool) -> Result<Self> {
        let mut parts = Vec::new();
        for segment in scan(value, pattern) {
            match segment {
                Segment::Literal(text) => parts.push(SpanPart::Literal(text)),
                Segment::Code(code) => parts.push(SpanPart::Expr(parse_expression(&code)?)),
            }
        }
        Ok(Self { parts, isolate })
    }

    /// Compile a bare expression source, e.g. a directive attribute whose
    /// whole value is code.
    pub fn from_expr_source(source: &str, isolate: bool) -> Result<Self> {
        Ok(Self {
            parts: vec![SpanPart::Expr(parse_expression(source)?)],
            isolate,
        })
    }

    pub fn from_expr(expr: Expr, isolate: bool) -> Self {
        Self {
            parts: vec![SpanPart::Expr(expr)],
            isolate,
        }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            parts: vec![SpanPart::Literal(text.into())],
            isolate: false,
        }
    }

    pub fn parts(&self) -> &[SpanPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Evaluate the span against the given scope.
    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<Value> {
        if self.parts.len() == 1 {
            return match &self.parts[0] {
                SpanPart::Literal(text) => Ok(Value::String(text.clone())),
                SpanPart::Expr(e) => match expr::evaluate(e, scope) {
                    Ok(value) => Ok(value),
                    Err(_) if self.isolate => Ok(Value::String(String::new())),
                    Err(err) => Err(err),
                },
            };
        }

        let mut out = String::new();
        for part in &self.parts {
            match part {
                SpanPart::Literal(text) => out.push_str(text),
                SpanPart::Expr(e) => match expr::evaluate(e, scope) {
                    Ok(value) => out.push_str(&expr::value_to_string(&value)),
                    Err(_) if self.isolate => {}
                    Err(err) => return Err(err),
                },
            }
        }
        Ok(Value::String(out))
    }
}

/// Quote/newline escaping for literals embedded in the instruction listing
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "\\'").replace('\n', "\\n")
}

impl fmt::Display for CompiledSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .parts
            .iter()
            .map(|part| match part {
                SpanPart::Literal(text) => format!("'{}'", escape_literal(text)),
                SpanPart::Expr(e) if self.isolate => format!("safe({})", e),
                SpanPart::Expr(e) => format!("({})", e),
            })
            .collect();
        write!(f, "{}", rendered.join(" + "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use serde_json::json;

    #[test]
    fn test_scan_no_match_is_single_literal() {
        let options = Options::default();
        let segments = scan("plain text", &options.interpolation);
        assert_eq!(segments, vec![Segment::Literal("plain text".to_string())]);
    }

    #[test]
    fn test_scan_splits_in_order() {
        let options = Options::default();
        let segments = scan("a {{ x }} b {{ y }}", &options.interpolation);
        assert_eq!(
            segments,
            vec![
                Segment::Literal("a ".to_string()),
                Segment::Code(" x ".to_string()),
                Segment::Literal(" b ".to_string()),
                Segment::Code(" y ".to_string()),
            ]
        );
    }

    #[test]
    fn test_scan_skips_blank_code_spans() {
        let options = Options::default();
        let segments = scan("a {{ }} b", &options.interpolation);
        assert_eq!(
            segments,
            vec![
                Segment::Literal("a ".to_string()),
                Segment::Literal(" b".to_string()),
            ]
        );
    }

    #[test]
    fn test_scan_trailing_literal_kept() {
        let options = Options::default();
        let segments = scan("{{ x }} tail", &options.interpolation);
        assert_eq!(
            segments,
            vec![
                Segment::Code(" x ".to_string()),
                Segment::Literal(" tail".to_string()),
            ]
        );
    }

    #[test]
    fn test_span_concatenates() {
        let options = Options::default();
        let span =
            CompiledSpan::from_value("foo {{ data.cls }} bar", &options.interpolation, false)
                .unwrap();
        let data = json!({"cls": "main"});
        let scope = Scope::new("data", &data);
        assert_eq!(span.evaluate(&scope).unwrap(), json!("foo main bar"));
    }

    #[test]
    fn test_single_expr_span_keeps_raw_value() {
        let options = Options::default();
        let span =
            CompiledSpan::from_value("{{ data.items }}", &options.interpolation, false).unwrap();
        let data = json!({"items": [1, 2]});
        let scope = Scope::new("data", &data);
        assert_eq!(span.evaluate(&scope).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_isolated_failure_becomes_empty() {
        let options = Options::default();
        let span =
            CompiledSpan::from_value("a {{ foo.bar }} b", &options.interpolation, true).unwrap();
        let data = json!({});
        let scope = Scope::new("data", &data);
        assert_eq!(span.evaluate(&scope).unwrap(), json!("a  b"));
    }

    #[test]
    fn test_unisolated_failure_propagates() {
        let options = Options::default();
        let span =
            CompiledSpan::from_value("a {{ foo.bar }} b", &options.interpolation, false).unwrap();
        let data = json!({});
        let scope = Scope::new("data", &data);
        assert!(span.evaluate(&scope).is_err());
    }

    #[test]
    fn test_display_shapes() {
        let options = Options::default();
        let span =
            CompiledSpan::from_value("foo {{data.cls}} bar", &options.interpolation, false)
                .unwrap();
        assert_eq!(span.to_string(), "'foo ' + (data.cls) + ' bar'");

        let safe = CompiledSpan::from_expr_source("data.value", true).unwrap();
        assert_eq!(safe.to_string(), "safe(data.value)");
    }
}
