/// In-memory rich-text surface.
///
/// Holds the document as a list of top-level blocks with a block cursor,
/// a cell cursor for tables and the inline style new text is typed with.
/// Every applied mutation records an undo snapshot; the redo stack is
/// cleared on each new mutation.
use std::collections::BTreeSet;
use std::fmt::Write as _;

use rich_pad_config::MAX_TABLE_DIMENSION;

use crate::format::{
    ActiveFormatting, FontFamily, FontSize, HeadingLevel, HexColor, ListKind, Mark, TableCommand,
    TextAlign,
};
use crate::markup::{self, Block, BlockKind, Cell};
use crate::surface::{ContentSurface, RichTextSurface};

/// Maximum number of undo snapshots kept.
const MAX_UNDO: usize = 100;

/// Inline style applied to newly typed text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TypingStyle {
    marks: BTreeSet<Mark>,
    font_family: Option<FontFamily>,
    font_size: Option<FontSize>,
    color: Option<HexColor>,
}

impl TypingStyle {
    fn wrap(&self, text: &str) -> String {
        let mut out = markup::escape_text(text);
        for mark in self.marks.iter().rev() {
            out = format!("<{tag}>{out}</{tag}>", tag = mark.tag());
        }

        let mut style = String::new();
        if let Some(family) = self.font_family {
            let _ = write!(style, "font-family: {}; ", family.css_name());
        }
        if let Some(size) = self.font_size {
            let _ = write!(style, "font-size: {size}; ");
        }
        if let Some(color) = self.color {
            let _ = write!(style, "color: {color}; ");
        }
        if style.is_empty() {
            out
        } else {
            format!("<span style=\"{}\">{out}</span>", style.trim_end())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DocState {
    blocks: Vec<Block>,
    cursor: usize,
    /// (row, column) inside the table under the cursor.
    cell: (usize, usize),
    style: TypingStyle,
}

impl DocState {
    fn from_markup(content: &str) -> Self {
        let mut blocks = markup::parse(content);
        if blocks.is_empty() {
            blocks.push(Block::paragraph(""));
        }
        let cursor = blocks.len() - 1;
        Self {
            blocks,
            cursor,
            cell: (0, 0),
            style: TypingStyle::default(),
        }
    }

    fn block(&self) -> &Block {
        &self.blocks[self.cursor]
    }

    fn block_mut(&mut self) -> &mut Block {
        &mut self.blocks[self.cursor]
    }

    fn table_rows(&mut self) -> Option<&mut Vec<Vec<Cell>>> {
        match &mut self.blocks[self.cursor].kind {
            BlockKind::Table(rows) => Some(rows),
            _ => None,
        }
    }

    fn clamp_cell(&mut self) {
        let (row_count, col_count) = match &self.blocks[self.cursor].kind {
            BlockKind::Table(rows) => (rows.len(), rows.first().map_or(0, Vec::len)),
            _ => (0, 0),
        };
        self.cell.0 = self.cell.0.min(row_count.saturating_sub(1));
        self.cell.1 = self.cell.1.min(col_count.saturating_sub(1));
    }

    fn remove_current_block(&mut self) {
        self.blocks.remove(self.cursor);
        if self.blocks.is_empty() {
            self.blocks.push(Block::paragraph(""));
        }
        self.cursor = self.cursor.min(self.blocks.len() - 1);
        self.cell = (0, 0);
    }

    fn apply_table_command(&mut self, command: TableCommand) -> bool {
        let (row, col) = self.cell;
        let Some(rows) = self.table_rows() else {
            return false;
        };
        let width = rows.first().map_or(0, Vec::len);

        match command {
            TableCommand::AddRowBefore | TableCommand::AddRowAfter => {
                let at = if command == TableCommand::AddRowBefore {
                    row
                } else {
                    row + 1
                };
                rows.insert(at, (0..width).map(|_| Cell::empty()).collect());
                if command == TableCommand::AddRowBefore {
                    self.cell.0 += 1;
                }
            }
            TableCommand::AddColumnBefore | TableCommand::AddColumnAfter => {
                let at = if command == TableCommand::AddColumnBefore {
                    col
                } else {
                    col + 1
                };
                for cells in rows.iter_mut() {
                    let header = cells.get(col).is_some_and(|c| c.header);
                    let index = at.min(cells.len());
                    cells.insert(
                        index,
                        Cell {
                            header,
                            inner: String::new(),
                        },
                    );
                }
                if command == TableCommand::AddColumnBefore {
                    self.cell.1 += 1;
                }
            }
            TableCommand::DeleteRow => {
                if rows.len() <= 1 {
                    self.remove_current_block();
                    return true;
                }
                rows.remove(row);
            }
            TableCommand::DeleteColumn => {
                if width <= 1 {
                    self.remove_current_block();
                    return true;
                }
                for cells in rows.iter_mut() {
                    if col < cells.len() {
                        cells.remove(col);
                    }
                }
            }
            TableCommand::DeleteTable => {
                self.remove_current_block();
                return true;
            }
        }
        self.clamp_cell();
        true
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    state: DocState,
    pristine: Option<String>,
}

/// Rich-text surface backed by an in-memory block model.
///
/// Content read back is exactly what was last set until the first change
/// to the document, after which it is re-rendered from the blocks.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    state: DocState,
    pristine: Option<String>,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    editable: bool,
    ready: bool,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new("")
    }
}

impl MemorySurface {
    /// Creates a ready, read-only surface showing `content`.
    pub fn new(content: &str) -> Self {
        Self {
            state: DocState::from_markup(content),
            pristine: Some(content.to_string()),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            editable: false,
            ready: true,
        }
    }

    /// Creates a surface that has not finished initializing.
    pub fn unready() -> Self {
        Self {
            ready: false,
            ..Self::default()
        }
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn block_count(&self) -> usize {
        self.state.blocks.len()
    }

    pub fn cursor(&self) -> usize {
        self.state.cursor
    }

    /// Moves the cursor to block `index`. Returns `false` if out of range.
    pub fn select_block(&mut self, index: usize) -> bool {
        if index >= self.state.blocks.len() {
            return false;
        }
        self.state.cursor = index;
        self.state.cell = (0, 0);
        true
    }

    /// Moves the cell cursor inside the table under the cursor.
    pub fn select_cell(&mut self, row: usize, col: usize) -> bool {
        let BlockKind::Table(rows) = &self.state.block().kind else {
            return false;
        };
        if rows.get(row).is_some_and(|cells| col < cells.len()) {
            self.state.cell = (row, col);
            true
        } else {
            false
        }
    }

    /// Types `text` at the end of the current block using the typing style.
    ///
    /// Inside a table the text goes into the selected cell. On any other
    /// non-text block a new paragraph is started after it.
    pub fn type_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let styled = self.state.style.wrap(text);
        self.mutate(|doc| {
            let (row, col) = doc.cell;
            if let Some(rows) = doc.table_rows() {
                let Some(cell) = rows.get_mut(row).and_then(|cells| cells.get_mut(col)) else {
                    return false;
                };
                cell.inner.push_str(&styled);
                return true;
            }
            if doc.block().is_textual() {
                doc.block_mut().inner.push_str(&styled);
            } else {
                doc.blocks.insert(doc.cursor + 1, Block::paragraph(styled));
                doc.cursor += 1;
            }
            true
        })
    }

    /// Starts a new paragraph after the current block and moves onto it.
    pub fn new_paragraph(&mut self) -> bool {
        self.mutate(|doc| {
            doc.blocks.insert(doc.cursor + 1, Block::paragraph(""));
            doc.cursor += 1;
            doc.cell = (0, 0);
            true
        })
    }

    /// Replaces the whole document as a single undoable edit.
    pub fn replace_all(&mut self, content: &str) -> bool {
        let applied = self.mutate(|doc| {
            *doc = DocState::from_markup(content);
            true
        });
        if applied {
            self.pristine = Some(content.to_string());
        }
        applied
    }

    /// Applies `change` if the surface accepts input, recording undo state.
    fn mutate(&mut self, change: impl FnOnce(&mut DocState) -> bool) -> bool {
        if !self.ready || !self.editable {
            return false;
        }
        let before = Snapshot {
            state: self.state.clone(),
            pristine: self.pristine.clone(),
        };
        if !change(&mut self.state) {
            self.state = before.state;
            return false;
        }
        if self.state.blocks != before.state.blocks {
            self.pristine = None;
        }
        self.undo_stack.push(before);
        if self.undo_stack.len() > MAX_UNDO {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
        true
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state.clone(),
            pristine: self.pristine.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.state = snapshot.state;
        self.pristine = snapshot.pristine;
    }
}

impl ContentSurface for MemorySurface {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn content(&self) -> Option<String> {
        if !self.ready {
            return None;
        }
        Some(
            self.pristine
                .clone()
                .unwrap_or_else(|| markup::render(&self.state.blocks)),
        )
    }

    fn set_content(&mut self, content: &str) {
        self.state = DocState::from_markup(content);
        self.pristine = Some(content.to_string());
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn is_editable(&self) -> bool {
        self.editable
    }

    fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }
}

impl RichTextSurface for MemorySurface {
    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn undo(&mut self) -> bool {
        if !self.ready || !self.editable {
            return false;
        }
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.redo_stack.push(current);
        self.restore(previous);
        true
    }

    fn redo(&mut self) -> bool {
        if !self.ready || !self.editable {
            return false;
        }
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.undo_stack.push(current);
        self.restore(next);
        true
    }

    fn toggle_heading(&mut self, level: HeadingLevel) -> bool {
        self.mutate(|doc| {
            let block = doc.block_mut();
            if !block.is_textual() {
                return false;
            }
            block.kind = if block.kind == BlockKind::Heading(level) {
                BlockKind::Paragraph
            } else {
                BlockKind::Heading(level)
            };
            true
        })
    }

    fn toggle_mark(&mut self, mark: Mark) -> bool {
        self.mutate(|doc| {
            let marks = &mut doc.style.marks;
            if !marks.remove(&mark) {
                marks.insert(mark);
            }
            true
        })
    }

    fn toggle_list(&mut self, kind: ListKind) -> bool {
        self.mutate(|doc| {
            let block = doc.block_mut();
            if !block.is_textual() {
                return false;
            }
            block.kind = if block.kind == BlockKind::ListItem(kind) {
                BlockKind::Paragraph
            } else {
                BlockKind::ListItem(kind)
            };
            true
        })
    }

    fn set_text_align(&mut self, align: TextAlign) -> bool {
        self.mutate(|doc| {
            let block = doc.block_mut();
            if !block.is_textual() {
                return false;
            }
            block.align = Some(align);
            true
        })
    }

    fn set_font_family(&mut self, family: FontFamily) -> bool {
        self.mutate(|doc| {
            doc.style.font_family = Some(family);
            true
        })
    }

    fn set_font_size(&mut self, size: FontSize) -> bool {
        self.mutate(|doc| {
            doc.style.font_size = Some(size);
            true
        })
    }

    fn set_color(&mut self, color: HexColor) -> bool {
        self.mutate(|doc| {
            doc.style.color = Some(color);
            true
        })
    }

    fn insert_table(&mut self, rows: u32, cols: u32) -> bool {
        if rows == 0 || cols == 0 || rows > MAX_TABLE_DIMENSION || cols > MAX_TABLE_DIMENSION {
            return false;
        }
        self.mutate(|doc| {
            doc.blocks.insert(doc.cursor + 1, Block::table(rows, cols));
            doc.cursor += 1;
            doc.cell = (0, 0);
            true
        })
    }

    fn table_command(&mut self, command: TableCommand) -> bool {
        self.mutate(|doc| doc.apply_table_command(command))
    }

    fn active_formatting(&self) -> ActiveFormatting {
        let block = self.state.block();
        let style = &self.state.style;
        ActiveFormatting {
            marks: style.marks.clone(),
            heading: match block.kind {
                BlockKind::Heading(level) => Some(level),
                _ => None,
            },
            list: match block.kind {
                BlockKind::ListItem(kind) => Some(kind),
                _ => None,
            },
            align: block.align.unwrap_or_default(),
            font_family: style.font_family,
            font_size: style.font_size.unwrap_or_default(),
            color: style.color,
            in_table: block.is_table(),
        }
    }
}
