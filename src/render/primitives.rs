/// The incremental-rendering primitive set the compiled function drives.
///
/// The five operations describe a DOM-like structure incrementally; a
/// patching algorithm on the caller's side consumes the call sequence.
/// `statics` and `var_args` are ordered name/value pair lists, `None`
/// when empty.
pub trait Primitives {
    /// Open an element that will later be closed with `element_close`.
    fn element_open(
        &mut self,
        name: &str,
        key: Option<&str>,
        statics: Option<&[(String, String)]>,
        var_args: Option<&[(String, String)]>,
    );

    /// Emit a void element; no matching close call follows.
    fn element_void(
        &mut self,
        name: &str,
        key: Option<&str>,
        statics: Option<&[(String, String)]>,
        var_args: Option<&[(String, String)]>,
    );

    /// Close the most recently opened element of this name.
    fn element_close(&mut self, name: &str);

    /// Emit a text node.
    fn text(&mut self, content: &str);

    /// Leave the currently open element's existing subtree untouched.
    fn skip(&mut self);
}
