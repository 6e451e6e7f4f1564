//! idomizer - compiles HTML-like templates into incremental-DOM style
//! render plans.
//!
//! A template is compiled once into a [`Factory`]; binding a primitive
//! set and a helpers map yields a render function that can be called
//! repeatedly with data. Every call replays the same structural call
//! sequence, so an incremental patching algorithm on the caller's side
//! only touches what changed:
//! - interpolated values (`{{ data.title }}`) and raw expression spans
//!   (`[[ data.touch ]]`) are re-evaluated per render,
//! - built-in directives cover iteration, conditional chains, text
//!   injection, delegation to named helpers and diagnostic logging,
//! - callers can override or extend the directive set per compile.
//!
//! # Example
//!
//! ```
//! use idomizer::{compile, Helpers, Options, Primitives};
//!
//! #[derive(Default)]
//! struct Calls(Vec<String>);
//!
//! impl Primitives for Calls {
//!     fn element_open(
//!         &mut self,
//!         name: &str,
//!         _key: Option<&str>,
//!         _statics: Option<&[(String, String)]>,
//!         _var_args: Option<&[(String, String)]>,
//!     ) {
//!         self.0.push(format!("<{}>", name));
//!     }
//!
//!     fn element_void(
//!         &mut self,
//!         name: &str,
//!         _key: Option<&str>,
//!         _statics: Option<&[(String, String)]>,
//!         _var_args: Option<&[(String, String)]>,
//!     ) {
//!         self.0.push(format!("<{}/>", name));
//!     }
//!
//!     fn element_close(&mut self, name: &str) {
//!         self.0.push(format!("</{}>", name));
//!     }
//!
//!     fn text(&mut self, content: &str) {
//!         self.0.push(content.to_string());
//!     }
//!
//!     fn skip(&mut self) {}
//! }
//!
//! # fn main() -> idomizer::Result<()> {
//! let factory = compile("<h1 class=\"main\">Hello</h1>", &Options::default())?;
//! let mut render = factory.bind(Calls::default(), Helpers::new());
//! render.call(None)?;
//! assert_eq!(render.primitives().0, ["<h1>", "Hello", "</h1>"]);
//! # Ok(())
//! # }
//! ```

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod compiler;
pub mod error;
pub mod expr;
pub mod options;
pub mod render;
pub mod tokenizer;

// Re-export main types for public API
pub use compiler::{compile, compile_with, CompiledSpan, Instruction, ParsedAttributes, Program};
pub use error::{Error, Result};
pub use options::{Options, RawAttrs, TagHandler, TagHandlers, SKIP_DEACTIVATED};
pub use render::{Factory, Helper, Helpers, Primitives, Render};
pub use tokenizer::{EventSink, Tokenizer, XmlTokenizer};
