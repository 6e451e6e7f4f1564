//! The emission buffer.
//!
//! The emitter appends [`Instruction`]s in tokenizer event order; the
//! buffer is never reordered. The listing is the pretty-conditional
//! textual form of the emitted body.

use super::scanner::{escape_literal, CompiledSpan};
use crate::expr::Expr;
use std::fmt;

/// One emitted statement of the compiled body.
///
/// Directive handlers return fragments of these; the element, text and
/// skip variants map one-to-one onto the rendering primitives, while the
/// open/close marker pairs are nested into a plan by the function factory.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Open a regular element
    ElementOpen {
        name: String,
        key: Option<CompiledSpan>,
        statics: Vec<(String, String)>,
        var_args: Vec<(String, CompiledSpan)>,
    },
    /// Emit a void element; no close follows
    ElementVoid {
        name: String,
        key: Option<CompiledSpan>,
        statics: Vec<(String, String)>,
        var_args: Vec<(String, CompiledSpan)>,
    },
    /// Close a regular element
    ElementClose { name: String },
    /// Emit a literal text node
    Text { content: String },
    /// Emit a text node from an evaluated span
    TextDynamic { value: CompiledSpan },
    /// Leave the current element's existing subtree untouched
    Skip,
    /// Evaluate an expression for its effect, discarding the result
    RawCode { code: Expr },
    /// Open an iteration over an evaluated sequence
    EachOpen {
        items: CompiledSpan,
        item: String,
        index: String,
    },
    /// Terminate the innermost iteration
    EachClose,
    /// Open a conditional block
    IfOpen { condition: CompiledSpan },
    /// Chain an alternative condition onto the innermost conditional
    ElseIf { condition: CompiledSpan },
    /// Chain the unconditional alternative onto the innermost conditional
    Else,
    /// Terminate the innermost conditional
    IfClose,
    /// Invoke a helper registered under `name` with the render data
    CallHelper { name: String },
    /// Emit a leveled log message from an evaluated span
    Log {
        level: log::Level,
        content: CompiledSpan,
    },
}

fn fmt_statics(statics: &[(String, String)]) -> String {
    if statics.is_empty() {
        return "null".to_string();
    }
    let pairs: Vec<String> = statics
        .iter()
        .map(|(name, value)| format!("'{}', '{}'", name, escape_literal(value)))
        .collect();
    format!("[{}]", pairs.join(", "))
}

fn fmt_var_args(var_args: &[(String, CompiledSpan)]) -> String {
    if var_args.is_empty() {
        return "null".to_string();
    }
    let pairs: Vec<String> = var_args
        .iter()
        .map(|(name, span)| format!("'{}', {}", name, span))
        .collect();
    pairs.join(", ")
}

fn fmt_key(key: &Option<CompiledSpan>) -> String {
    match key {
        Some(span) => span.to_string(),
        None => "null".to_string(),
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::ElementOpen {
                name,
                key,
                statics,
                var_args,
            } => write!(
                f,
                "element_open('{}', {}, {}, {});",
                name,
                fmt_key(key),
                fmt_statics(statics),
                fmt_var_args(var_args)
            ),
            Instruction::ElementVoid {
                name,
                key,
                statics,
                var_args,
            } => write!(
                f,
                "element_void('{}', {}, {}, {});",
                name,
                fmt_key(key),
                fmt_statics(statics),
                fmt_var_args(var_args)
            ),
            Instruction::ElementClose { name } => write!(f, "element_close('{}');", name),
            Instruction::Text { content } => write!(f, "text('{}');", escape_literal(content)),
            Instruction::TextDynamic { value } => write!(f, "text({});", value),
            Instruction::Skip => write!(f, "skip();"),
            Instruction::RawCode { code } => write!(f, "({});", code),
            Instruction::EachOpen { items, item, index } => {
                write!(f, "each ({}, {}) in {} {{", item, index, items)
            }
            Instruction::EachClose => write!(f, "}}"),
            Instruction::IfOpen { condition } => write!(f, "if ({}) {{", condition),
            Instruction::ElseIf { condition } => write!(f, "}} else if ({}) {{", condition),
            Instruction::Else => write!(f, "}} else {{"),
            Instruction::IfClose => write!(f, "}}"),
            Instruction::CallHelper { name } => write!(f, "call('{}');", name),
            Instruction::Log { level, content } => {
                write!(f, "log({}, {});", level.as_str().to_lowercase(), content)
            }
        }
    }
}

/// Append-only sequence of emitted instructions
#[derive(Debug, Clone, Default)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn extend(&mut self, fragment: Vec<Instruction>) {
        self.instructions.extend(fragment);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Textual form of the body; statements are newline-separated when
    /// `pretty` is set and joined bare otherwise.
    pub fn listing(&self, pretty: bool) -> String {
        let separator = if pretty { "\n" } else { "" };
        self.instructions
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(separator)
    }
}
