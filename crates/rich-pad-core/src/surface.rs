/// Full capability set of a rich-text editing surface.
///
/// Extends the history crate's `ContentSurface` with the formatting
/// operations the toolbar drives. Every mutating call returns whether the
/// surface applied it; a read-only surface applies nothing.
use crate::format::{
    ActiveFormatting, FontFamily, FontSize, HeadingLevel, HexColor, ListKind, Mark, TableCommand,
    TextAlign,
};

pub use rich_pad_mod_history::ContentSurface;

pub trait RichTextSurface: ContentSurface {
    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;
    fn undo(&mut self) -> bool;
    fn redo(&mut self) -> bool;

    fn toggle_heading(&mut self, level: HeadingLevel) -> bool;
    fn toggle_mark(&mut self, mark: Mark) -> bool;
    fn toggle_list(&mut self, kind: ListKind) -> bool;
    fn set_text_align(&mut self, align: TextAlign) -> bool;
    fn set_font_family(&mut self, family: FontFamily) -> bool;
    fn set_font_size(&mut self, size: FontSize) -> bool;
    fn set_color(&mut self, color: HexColor) -> bool;

    fn insert_table(&mut self, rows: u32, cols: u32) -> bool;
    fn table_command(&mut self, command: TableCommand) -> bool;

    /// Formatting in effect at the cursor.
    fn active_formatting(&self) -> ActiveFormatting;
}
