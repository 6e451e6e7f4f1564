//! The escaping shield.
//!
//! Expression spans may contain characters the markup tokenizer would
//! otherwise reinterpret (`<`, quotes). Before tokenizing, every span is
//! wrapped in a CDATA envelope so the tokenizer passes it through
//! verbatim; the markers are stripped again at consumption time.

use crate::options::Options;
use once_cell::sync::Lazy;
use regex::Regex;

static CDATA_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<!\[CDATA\[").expect("cdata open"));
static CDATA_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\]\]>").expect("cdata close"));

/// Wrap every interpolation and expression span, delimiters included,
/// in a content-opaque CDATA envelope. Applied once, globally, before
/// the template reaches the tokenizer.
pub fn shield(text: &str, options: &Options) -> String {
    let wrapped = options.interpolation.replace_all(text, "<![CDATA[${0}]]>");
    options
        .expression
        .replace_all(&wrapped, "<![CDATA[${0}]]>")
        .into_owned()
}

/// Strip the envelope markers wherever they appear. Applied per attribute
/// value; text content arrives split on CDATA boundaries instead.
pub fn unshield(text: &str) -> String {
    let opened = CDATA_OPEN.replace_all(text, "");
    CDATA_CLOSE.replace_all(&opened, "").into_owned()
}
