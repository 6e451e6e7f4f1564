//! The code emitter.
//!
//! Consumes tokenizer events in order, consults the attribute classifier
//! and the directive registry, and appends instructions to the emission
//! buffer. Exactly one branch fires per event and the buffer is never
//! reordered.

use super::attrs::{check_custom_element, classify};
use super::program::{Instruction, Program};
use super::scanner::{scan, CompiledSpan, Segment};
use crate::error::Result;
use crate::expr::parser::parse_expression;
use crate::options::{Options, RawAttrs, TagHandlers};
use crate::tokenizer::EventSink;
use log::trace;

pub struct Emitter<'a> {
    options: &'a Options,
    tags: &'a TagHandlers,
    program: Program,
}

impl<'a> Emitter<'a> {
    pub fn new(options: &'a Options, tags: &'a TagHandlers) -> Self {
        Self {
            options,
            tags,
            program: Program::new(),
        }
    }

    pub fn into_program(self) -> Program {
        self.program
    }
}

impl EventSink for Emitter<'_> {
    fn open_tag(&mut self, name: &str, attrs: &RawAttrs) -> Result<()> {
        let parsed = classify(attrs, self.options)?;

        if let Some(handler) = self.tags.get(name) {
            trace!("dispatching directive <{}>", name);
            let fragment = handler.on_open(name, attrs, &parsed, self.options)?;
            self.program.extend(fragment);
            return Ok(());
        }

        let key = parsed.key;
        let statics: Vec<(String, String)> = parsed.statics.into_iter().collect();
        let var_args: Vec<(String, CompiledSpan)> = parsed.var_args.into_iter().collect();

        let instruction = if self.options.is_self_closing(name) {
            Instruction::ElementVoid {
                name: name.to_string(),
                key,
                statics,
                var_args,
            }
        } else {
            Instruction::ElementOpen {
                name: name.to_string(),
                key,
                statics,
                var_args,
            }
        };
        self.program.push(instruction);

        if parsed.skip || check_custom_element(name, attrs, self.options) {
            self.program.push(Instruction::Skip);
        }

        Ok(())
    }

    fn close_tag(&mut self, name: &str) -> Result<()> {
        if let Some(handler) = self.tags.get(name) {
            let fragment = handler.on_close(name, self.options)?;
            self.program.extend(fragment);
        } else if !self.options.is_self_closing(name) {
            self.program.push(Instruction::ElementClose {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn text(&mut self, content: &str) -> Result<()> {
        // Raw code spans take precedence over interpolation. With the
        // default tokenizer each shielded span arrives as its own event,
        // but a custom tokenizer may deliver mixed content; the scanner
        // handles both.
        if self.options.expression.is_match(content) {
            for segment in scan(content, &self.options.expression) {
                if let Segment::Code(code) = segment {
                    self.program.push(Instruction::RawCode {
                        code: parse_expression(&code)?,
                    });
                }
            }
        } else if self.options.interpolation.is_match(content) {
            for segment in scan(content, &self.options.interpolation) {
                match segment {
                    Segment::Literal(text) => {
                        self.program.push(Instruction::Text { content: text })
                    }
                    Segment::Code(code) => self.program.push(Instruction::TextDynamic {
                        value: CompiledSpan::from_expr_source(
                            &code,
                            self.options.skip_exceptions,
                        )?,
                    }),
                }
            }
        } else if !content.is_empty() {
            self.program.push(Instruction::Text {
                content: content.to_string(),
            });
        }
        Ok(())
    }
}
