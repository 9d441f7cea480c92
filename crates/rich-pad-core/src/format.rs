/// Closed formatting vocabulary shared by the surface and the toolbar.
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub use rich_pad_config::HexColor;

/// Inline marks that can be toggled on the text at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
}

impl Mark {
    pub const ALL: [Mark; 4] = [Mark::Bold, Mark::Italic, Mark::Underline, Mark::Strike];

    pub fn name(self) -> &'static str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
            Mark::Strike => "strike",
        }
    }

    /// HTML element used when rendering the mark.
    pub fn tag(self) -> &'static str {
        match self {
            Mark::Bold => "strong",
            Mark::Italic => "em",
            Mark::Underline => "u",
            Mark::Strike => "s",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mark::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown mark: {s}"))
    }
}

/// Heading level, restricted to 1..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&level)
            .then_some(Self(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = HeadingLevel> {
        (Self::MIN..=Self::MAX).map(Self)
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

impl FromStr for HeadingLevel {
    type Err = String;

    /// Accepts `h2` or `2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix(['h', 'H']).unwrap_or(s);
        digits
            .parse::<u8>()
            .ok()
            .and_then(HeadingLevel::new)
            .ok_or_else(|| format!("invalid heading level: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub const ALL: [TextAlign; 4] = [
        TextAlign::Left,
        TextAlign::Center,
        TextAlign::Right,
        TextAlign::Justify,
    ];

    pub fn as_css(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}

impl fmt::Display for TextAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_css())
    }
}

impl FromStr for TextAlign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TextAlign::ALL
            .into_iter()
            .find(|a| a.as_css().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown alignment: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bullet,
    Ordered,
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Bullet => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ul" | "bullet" => Ok(ListKind::Bullet),
            "ol" | "ordered" => Ok(ListKind::Ordered),
            _ => Err(format!("unknown list kind: {s}")),
        }
    }
}

/// Font families offered by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFamily {
    Arial,
    TimesNewRoman,
    CourierNew,
    Georgia,
    Verdana,
}

impl FontFamily {
    pub const ALL: [FontFamily; 5] = [
        FontFamily::Arial,
        FontFamily::TimesNewRoman,
        FontFamily::CourierNew,
        FontFamily::Georgia,
        FontFamily::Verdana,
    ];

    pub fn css_name(self) -> &'static str {
        match self {
            FontFamily::Arial => "Arial",
            FontFamily::TimesNewRoman => "Times New Roman",
            FontFamily::CourierNew => "Courier New",
            FontFamily::Georgia => "Georgia",
            FontFamily::Verdana => "Verdana",
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}

impl FromStr for FontFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_matches(|c| c == '"' || c == '\'');
        FontFamily::ALL
            .into_iter()
            .find(|f| f.css_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown font family: {s}"))
    }
}

/// Font sizes offered by the toolbar, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FontSize {
    Px12,
    Px14,
    #[default]
    Px16,
    Px18,
    Px20,
    Px24,
    Px30,
    Px36,
}

impl FontSize {
    pub const ALL: [FontSize; 8] = [
        FontSize::Px12,
        FontSize::Px14,
        FontSize::Px16,
        FontSize::Px18,
        FontSize::Px20,
        FontSize::Px24,
        FontSize::Px30,
        FontSize::Px36,
    ];

    pub fn px(self) -> u32 {
        match self {
            FontSize::Px12 => 12,
            FontSize::Px14 => 14,
            FontSize::Px16 => 16,
            FontSize::Px18 => 18,
            FontSize::Px20 => 20,
            FontSize::Px24 => 24,
            FontSize::Px30 => 30,
            FontSize::Px36 => 36,
        }
    }

    pub fn from_px(px: u32) -> Option<Self> {
        FontSize::ALL.into_iter().find(|s| s.px() == px)
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.px())
    }
}

impl FromStr for FontSize {
    type Err = String;

    /// Accepts `18` or `18px`; only sizes from the fixed set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches("px");
        digits
            .parse::<u32>()
            .ok()
            .and_then(FontSize::from_px)
            .ok_or_else(|| format!("unsupported font size: {s}"))
    }
}

/// Row/column operations available while the cursor is inside a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableCommand {
    AddColumnBefore,
    AddColumnAfter,
    AddRowBefore,
    AddRowAfter,
    DeleteColumn,
    DeleteRow,
    DeleteTable,
}

impl TableCommand {
    pub const ALL: [TableCommand; 7] = [
        TableCommand::AddColumnBefore,
        TableCommand::AddColumnAfter,
        TableCommand::AddRowBefore,
        TableCommand::AddRowAfter,
        TableCommand::DeleteTable,
        TableCommand::DeleteColumn,
        TableCommand::DeleteRow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TableCommand::AddColumnBefore => "add-column-before",
            TableCommand::AddColumnAfter => "add-column-after",
            TableCommand::AddRowBefore => "add-row-before",
            TableCommand::AddRowAfter => "add-row-after",
            TableCommand::DeleteColumn => "delete-column",
            TableCommand::DeleteRow => "delete-row",
            TableCommand::DeleteTable => "delete-table",
        }
    }
}

impl fmt::Display for TableCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TableCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableCommand::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown table command: {s}"))
    }
}

/// Formatting context at the cursor, as reported by the surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActiveFormatting {
    pub marks: BTreeSet<Mark>,
    pub heading: Option<HeadingLevel>,
    pub list: Option<ListKind>,
    pub align: TextAlign,
    pub font_family: Option<FontFamily>,
    pub font_size: FontSize,
    pub color: Option<HexColor>,
    pub in_table: bool,
}

impl ActiveFormatting {
    pub fn has_mark(&self, mark: Mark) -> bool {
        self.marks.contains(&mark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_bounds() {
        assert!(HeadingLevel::new(0).is_none());
        assert!(HeadingLevel::new(5).is_none());
        assert_eq!(HeadingLevel::new(4).map(HeadingLevel::get), Some(4));
        assert_eq!(HeadingLevel::all().count(), 4);
    }

    #[test]
    fn test_heading_and_list_parsing() {
        assert_eq!("h3".parse::<HeadingLevel>().unwrap().get(), 3);
        assert_eq!("2".parse::<HeadingLevel>().unwrap().to_string(), "h2");
        assert!("h0".parse::<HeadingLevel>().is_err());
        assert_eq!("ol".parse::<ListKind>().unwrap(), ListKind::Ordered);
        assert_eq!(ListKind::Bullet.to_string(), "ul");
        assert!("dl".parse::<ListKind>().is_err());
    }

    #[test]
    fn test_font_size_parsing() {
        assert_eq!("18px".parse::<FontSize>().unwrap(), FontSize::Px18);
        assert_eq!("36".parse::<FontSize>().unwrap(), FontSize::Px36);
        assert!("17px".parse::<FontSize>().is_err());
        assert!("big".parse::<FontSize>().is_err());
        assert_eq!(FontSize::default().to_string(), "16px");
    }

    #[test]
    fn test_font_family_parsing() {
        assert_eq!(
            "times new roman".parse::<FontFamily>().unwrap(),
            FontFamily::TimesNewRoman
        );
        assert_eq!("'Georgia'".parse::<FontFamily>().unwrap(), FontFamily::Georgia);
        assert!("Comic Sans".parse::<FontFamily>().is_err());
    }

    #[test]
    fn test_align_and_mark_parsing() {
        assert_eq!("Center".parse::<TextAlign>().unwrap(), TextAlign::Center);
        assert_eq!("strike".parse::<Mark>().unwrap(), Mark::Strike);
        assert!("blink".parse::<Mark>().is_err());
    }

    #[test]
    fn test_table_command_names_round_trip() {
        for cmd in TableCommand::ALL {
            assert_eq!(cmd.name().parse::<TableCommand>().unwrap(), cmd);
        }
    }

    #[test]
    fn test_active_formatting_default() {
        let f = ActiveFormatting::default();
        assert!(!f.has_mark(Mark::Bold));
        assert_eq!(f.align, TextAlign::Left);
        assert_eq!(f.font_size, FontSize::Px16);
        assert!(!f.in_table);
    }
}
