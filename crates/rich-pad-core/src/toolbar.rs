/// Toolbar command catalog and dispatcher.
///
/// Maps a closed set of user actions onto `RichTextSurface` capabilities.
/// Holds no state of its own: active, enabled and visible flags are all
/// derived from the surface at query time.
use std::fmt;
use std::str::FromStr;

use rich_pad_config::MAX_TABLE_DIMENSION;

use crate::format::{
    ActiveFormatting, FontFamily, FontSize, HeadingLevel, HexColor, ListKind, Mark, TableCommand,
    TextAlign,
};
use crate::surface::RichTextSurface;

/// Table shape inserted by the toolbar button.
pub const DEFAULT_TABLE_SIZE: (u32, u32) = (3, 3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarAction {
    Heading(HeadingLevel),
    ToggleMark(Mark),
    ToggleList(ListKind),
    Align(TextAlign),
    FontFamily(FontFamily),
    FontSize(FontSize),
    Color(HexColor),
    InsertTable { rows: u32, cols: u32 },
    Table(TableCommand),
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolbarError {
    #[error("editor is read-only")]
    ReadOnly,
    #[error("{0} is not available right now")]
    Unavailable(ToolbarAction),
    #[error("editor did not apply {0}")]
    Rejected(ToolbarAction),
}

impl ToolbarAction {
    /// Whether the action only makes sense with the cursor inside a table.
    pub fn needs_table(self) -> bool {
        matches!(self, ToolbarAction::Table(_))
    }
}

impl fmt::Display for ToolbarAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolbarAction::Heading(level) => write!(f, "{level}"),
            ToolbarAction::ToggleMark(mark) => write!(f, "{mark}"),
            ToolbarAction::ToggleList(ListKind::Bullet) => f.write_str("bullet-list"),
            ToolbarAction::ToggleList(ListKind::Ordered) => f.write_str("ordered-list"),
            ToolbarAction::Align(align) => write!(f, "align:{align}"),
            ToolbarAction::FontFamily(family) => write!(f, "font:{family}"),
            ToolbarAction::FontSize(size) => write!(f, "size:{size}"),
            ToolbarAction::Color(color) => write!(f, "color:{color}"),
            ToolbarAction::InsertTable { rows, cols } => write!(f, "table:{rows}x{cols}"),
            ToolbarAction::Table(command) => write!(f, "{command}"),
            ToolbarAction::Undo => f.write_str("undo"),
            ToolbarAction::Redo => f.write_str("redo"),
        }
    }
}

impl FromStr for ToolbarAction {
    type Err = String;

    /// Parses the tokens printed by `Display`, e.g. `bold`, `h2`,
    /// `align:center`, `font:Georgia`, `size:18px`, `color:#ff0000`,
    /// `table:3x3`, `add-row-after`, `undo`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((key, value)) = s.split_once(':') {
            return match key.to_ascii_lowercase().as_str() {
                "align" => value.parse().map(ToolbarAction::Align),
                "font" => value.parse().map(ToolbarAction::FontFamily),
                "size" => value.parse().map(ToolbarAction::FontSize),
                "color" => value.parse().map(ToolbarAction::Color),
                "table" => parse_table_size(value),
                _ => Err(format!("unknown toolbar action: {s}")),
            };
        }

        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "undo" => return Ok(ToolbarAction::Undo),
            "redo" => return Ok(ToolbarAction::Redo),
            "bullet-list" => return Ok(ToolbarAction::ToggleList(ListKind::Bullet)),
            "ordered-list" => return Ok(ToolbarAction::ToggleList(ListKind::Ordered)),
            "table" => {
                let (rows, cols) = DEFAULT_TABLE_SIZE;
                return Ok(ToolbarAction::InsertTable { rows, cols });
            }
            _ => {}
        }
        if lower.starts_with('h') {
            if let Ok(level) = lower.parse::<HeadingLevel>() {
                return Ok(ToolbarAction::Heading(level));
            }
        }
        if let Ok(mark) = lower.parse::<Mark>() {
            return Ok(ToolbarAction::ToggleMark(mark));
        }
        if let Ok(command) = lower.parse::<TableCommand>() {
            return Ok(ToolbarAction::Table(command));
        }
        Err(format!("unknown toolbar action: {s}"))
    }
}

fn parse_table_size(value: &str) -> Result<ToolbarAction, String> {
    let parsed = value
        .split_once(['x', 'X'])
        .and_then(|(r, c)| Some((r.trim().parse::<u32>().ok()?, c.trim().parse::<u32>().ok()?)));
    match parsed {
        Some((rows, cols))
            if (1..=MAX_TABLE_DIMENSION).contains(&rows)
                && (1..=MAX_TABLE_DIMENSION).contains(&cols) =>
        {
            Ok(ToolbarAction::InsertTable { rows, cols })
        }
        _ => Err(format!(
            "invalid table size: {value} (expected ROWSxCOLS, each 1..={MAX_TABLE_DIMENSION})"
        )),
    }
}

/// Invokes `action` on the surface.
///
/// # Errors
///
/// `ReadOnly` when the surface does not accept input, `Unavailable` when the
/// action is disabled in the current context, `Rejected` when the surface
/// declined to apply it.
pub fn dispatch<S: RichTextSurface + ?Sized>(
    surface: &mut S,
    action: ToolbarAction,
) -> Result<(), ToolbarError> {
    if !surface.is_ready() || !surface.is_editable() {
        return Err(ToolbarError::ReadOnly);
    }
    if !is_enabled(action, surface) {
        return Err(ToolbarError::Unavailable(action));
    }

    let applied = match action {
        ToolbarAction::Heading(level) => surface.toggle_heading(level),
        ToolbarAction::ToggleMark(mark) => surface.toggle_mark(mark),
        ToolbarAction::ToggleList(kind) => surface.toggle_list(kind),
        ToolbarAction::Align(align) => surface.set_text_align(align),
        ToolbarAction::FontFamily(family) => surface.set_font_family(family),
        ToolbarAction::FontSize(size) => surface.set_font_size(size),
        ToolbarAction::Color(color) => surface.set_color(color),
        ToolbarAction::InsertTable { rows, cols } => surface.insert_table(rows, cols),
        ToolbarAction::Table(command) => surface.table_command(command),
        ToolbarAction::Undo => surface.undo(),
        ToolbarAction::Redo => surface.redo(),
    };

    if applied {
        tracing::debug!(%action, "Toolbar action applied");
        Ok(())
    } else {
        Err(ToolbarError::Rejected(action))
    }
}

/// Whether the action's formatting is in effect at the cursor.
pub fn is_active(action: ToolbarAction, active: &ActiveFormatting) -> bool {
    match action {
        ToolbarAction::Heading(level) => active.heading == Some(level),
        ToolbarAction::ToggleMark(mark) => active.has_mark(mark),
        ToolbarAction::ToggleList(kind) => active.list == Some(kind),
        ToolbarAction::Align(align) => active.align == align,
        ToolbarAction::FontFamily(family) => active.font_family == Some(family),
        ToolbarAction::FontSize(size) => active.font_size == size,
        ToolbarAction::Color(color) => active.color == Some(color),
        ToolbarAction::InsertTable { .. }
        | ToolbarAction::Table(_)
        | ToolbarAction::Undo
        | ToolbarAction::Redo => false,
    }
}

/// Whether the action can be invoked right now.
pub fn is_enabled<S: RichTextSurface + ?Sized>(action: ToolbarAction, surface: &S) -> bool {
    if !surface.is_ready() || !surface.is_editable() {
        return false;
    }
    match action {
        ToolbarAction::Undo => surface.can_undo(),
        ToolbarAction::Redo => surface.can_redo(),
        ToolbarAction::Table(_) => surface.active_formatting().in_table,
        _ => true,
    }
}

/// Whether the control is shown at all.
pub fn is_visible(action: ToolbarAction, active: &ActiveFormatting) -> bool {
    !action.needs_table() || active.in_table
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarButton {
    pub action: ToolbarAction,
    pub label: String,
    pub title: String,
}

impl ToolbarButton {
    fn new(action: ToolbarAction, label: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            action,
            label: label.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarGroup {
    pub name: &'static str,
    pub buttons: Vec<ToolbarButton>,
}

/// A button together with its state against a given surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub group: &'static str,
    pub button: ToolbarButton,
    pub active: bool,
    pub enabled: bool,
}

/// The fixed toolbar, in display order.
///
/// Colors are free-form and dispatched directly, so they have no buttons.
pub fn layout() -> Vec<ToolbarGroup> {
    use ToolbarAction as A;

    let headings = HeadingLevel::all()
        .map(|level| {
            ToolbarButton::new(
                A::Heading(level),
                format!("H{}", level.get()),
                format!("Heading {}", level.get()),
            )
        })
        .collect();

    let marks = vec![
        ToolbarButton::new(A::ToggleMark(Mark::Bold), "B", "Bold"),
        ToolbarButton::new(A::ToggleMark(Mark::Italic), "I", "Italic"),
        ToolbarButton::new(A::ToggleMark(Mark::Underline), "U", "Underline"),
        ToolbarButton::new(A::ToggleMark(Mark::Strike), "S", "Strike"),
    ];

    let lists = vec![
        ToolbarButton::new(A::ToggleList(ListKind::Bullet), "•", "Bullet List"),
        ToolbarButton::new(A::ToggleList(ListKind::Ordered), "1.", "Numbered List"),
    ];

    let align = TextAlign::ALL
        .into_iter()
        .map(|a| {
            let title = match a {
                TextAlign::Left => "Align Left",
                TextAlign::Center => "Align Center",
                TextAlign::Right => "Align Right",
                TextAlign::Justify => "Justify",
            };
            ToolbarButton::new(A::Align(a), a.as_css(), title)
        })
        .collect();

    let fonts = FontFamily::ALL
        .into_iter()
        .map(|family| ToolbarButton::new(A::FontFamily(family), family.css_name(), "Font Family"))
        .collect();

    let sizes = FontSize::ALL
        .into_iter()
        .map(|size| ToolbarButton::new(A::FontSize(size), size.px().to_string(), "Font Size"))
        .collect();

    let (rows, cols) = DEFAULT_TABLE_SIZE;
    let table = vec![
        ToolbarButton::new(A::InsertTable { rows, cols }, "Table", "Insert Table"),
        ToolbarButton::new(
            A::Table(TableCommand::AddColumnBefore),
            "+Col ←",
            "Add Column Before",
        ),
        ToolbarButton::new(
            A::Table(TableCommand::AddColumnAfter),
            "+Col →",
            "Add Column After",
        ),
        ToolbarButton::new(A::Table(TableCommand::AddRowBefore), "+Row ↑", "Add Row Before"),
        ToolbarButton::new(A::Table(TableCommand::AddRowAfter), "+Row ↓", "Add Row After"),
        ToolbarButton::new(A::Table(TableCommand::DeleteTable), "Del Table", "Delete Table"),
        ToolbarButton::new(A::Table(TableCommand::DeleteColumn), "Del Col", "Delete Column"),
        ToolbarButton::new(A::Table(TableCommand::DeleteRow), "Del Row", "Delete Row"),
    ];

    let history = vec![
        ToolbarButton::new(A::Undo, "Undo", "Undo"),
        ToolbarButton::new(A::Redo, "Redo", "Redo"),
    ];

    vec![
        ToolbarGroup { name: "headings", buttons: headings },
        ToolbarGroup { name: "marks", buttons: marks },
        ToolbarGroup { name: "lists", buttons: lists },
        ToolbarGroup { name: "align", buttons: align },
        ToolbarGroup { name: "font", buttons: fonts },
        ToolbarGroup { name: "size", buttons: sizes },
        ToolbarGroup { name: "table", buttons: table },
        ToolbarGroup { name: "history", buttons: history },
    ]
}

/// Evaluates every visible button against `surface`.
pub fn button_states<S: RichTextSurface + ?Sized>(surface: &S) -> Vec<ButtonState> {
    let active = surface.active_formatting();
    layout()
        .into_iter()
        .flat_map(|group| {
            let name = group.name;
            group.buttons.into_iter().map(move |button| (name, button))
        })
        .filter(|(_, button)| is_visible(button.action, &active))
        .map(|(group, button)| ButtonState {
            group,
            active: is_active(button.action, &active),
            enabled: is_enabled(button.action, surface),
            button,
        })
        .collect()
}
