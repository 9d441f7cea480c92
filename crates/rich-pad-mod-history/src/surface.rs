/// The slice of an editing surface the history workflows need.
///
/// The history crate never looks at the document tree. It only moves whole
/// markup strings in and out of whatever renders the document and flips it
/// between editable and read-only.
pub trait ContentSurface {
    /// Whether the surface has finished initializing. Until it has, every
    /// history operation touching it is a no-op.
    fn is_ready(&self) -> bool {
        true
    }

    /// Current document as markup, or `None` if nothing usable is available.
    fn content(&self) -> Option<String>;

    /// Replaces the whole document with `markup`.
    fn set_content(&mut self, markup: &str);

    fn is_editable(&self) -> bool;

    fn set_editable(&mut self, editable: bool);
}
