//! The template compiler: shield, tokenize, emit, link.

pub mod attrs;
pub mod directives;
pub mod emitter;
pub mod program;
pub mod scanner;
pub mod shield;

use crate::error::Result;
use crate::options::Options;
use crate::render::Factory;
use crate::tokenizer::{Tokenizer, XmlTokenizer};
use emitter::Emitter;
use log::debug;

pub use attrs::ParsedAttributes;
pub use program::{Instruction, Program};
pub use scanner::{CompiledSpan, Segment, SpanPart};

/// Compile a template into a render function factory using the built-in
/// tokenizer.
pub fn compile(template: &str, options: &Options) -> Result<Factory> {
    compile_with(template, options, &mut XmlTokenizer)
}

/// Compile a template, driving the emitter with the given tokenizer.
pub fn compile_with(
    template: &str,
    options: &Options,
    tokenizer: &mut dyn Tokenizer,
) -> Result<Factory> {
    let tags = directives::merge_tags(&options.tags);
    let shielded = shield::shield(template, options);

    let mut emitter = Emitter::new(options, &tags);
    tokenizer.run(&shielded, &mut emitter)?;
    let program = emitter.into_program();

    debug!("compiled template into {} instructions", program.len());

    Factory::link(program, options)
}
