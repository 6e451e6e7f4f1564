//! The markup tokenizer boundary.
//!
//! The compiler only needs a stream of open-tag/close-tag/text events with
//! ordered attribute maps; any conformant streaming tokenizer can drive it.
//! [`XmlTokenizer`] is the built-in implementation.

use crate::error::{Error, Result};
use crate::options::RawAttrs;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Receives tokenizer events in document order
pub trait EventSink {
    fn open_tag(&mut self, name: &str, attrs: &RawAttrs) -> Result<()>;
    fn close_tag(&mut self, name: &str) -> Result<()>;
    fn text(&mut self, content: &str) -> Result<()>;
}

/// Drives an [`EventSink`] with a single pass over the (shielded) template
pub trait Tokenizer {
    fn run(&mut self, input: &str, sink: &mut dyn EventSink) -> Result<()>;
}

/// Streaming tokenizer backed by `quick-xml`.
///
/// Self-closing elements are expanded into open+close event pairs and end
/// names are not matched against open names, since the emitter applies its
/// own void-element and nesting policy. CDATA sections are reported as
/// plain text with their content untouched, which is what carries shielded
/// expression spans through unharmed.
#[derive(Debug, Default)]
pub struct XmlTokenizer;

impl Tokenizer for XmlTokenizer {
    fn run(&mut self, input: &str, sink: &mut dyn EventSink) -> Result<()> {
        let mut reader = Reader::from_str(input);
        let config = reader.config_mut();
        config.expand_empty_elements = true;
        config.check_end_names = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let mut attrs = RawAttrs::new();
                    // HTML-style attribute parsing tolerates valueless
                    // attributes like `tpl-skip`.
                    for attr in e.html_attributes().with_checks(false) {
                        let attr = attr.map_err(|err| {
                            Error::tokenize(format!("bad attribute in <{}>: {}", name, err))
                        })?;
                        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                        let value = match attr.unescape_value() {
                            Ok(value) => value.into_owned(),
                            // Tolerate bare ampersands and non-XML entities.
                            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
                        };
                        attrs.insert(key, value);
                    }
                    sink.open_tag(&name, &attrs)?;
                }
                Ok(Event::End(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    sink.close_tag(&name)?;
                }
                Ok(Event::Text(t)) => {
                    let text = match t.unescape() {
                        Ok(text) => text.into_owned(),
                        Err(_) => String::from_utf8_lossy(t.as_ref()).into_owned(),
                    };
                    sink.text(&text)?;
                }
                Ok(Event::CData(c)) => {
                    let raw = c.into_inner();
                    sink.text(&String::from_utf8_lossy(&raw))?;
                }
                Ok(Event::Comment(_))
                | Ok(Event::Decl(_))
                | Ok(Event::PI(_))
                | Ok(Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::tokenize(format!(
                        "{} at byte {}",
                        e,
                        reader.buffer_position()
                    )))
                }
            }
        }

        Ok(())
    }
}
