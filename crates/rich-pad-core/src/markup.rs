/// Block-level markup model used by `MemorySurface`.
///
/// Understands the handful of top-level elements the editor produces
/// (paragraphs, headings 1-4, bullet/ordered lists and tables). Anything
/// else is kept verbatim as a raw block so it survives a parse/render pass.
use std::fmt::Write as _;

use crate::format::{HeadingLevel, ListKind, TextAlign};

/// Class put on every rendered table.
pub const TABLE_CLASS: &str = "financial-table";

const VOID_ELEMENTS: [&str; 4] = ["hr", "br", "img", "input"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub header: bool,
    /// Inner markup of the cell.
    pub inner: String,
}

impl Cell {
    pub fn empty() -> Self {
        Self {
            header: false,
            inner: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(HeadingLevel),
    ListItem(ListKind),
    Table(Vec<Vec<Cell>>),
    /// Unrecognized element or text, rendered exactly as parsed.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub align: Option<TextAlign>,
    /// Inner markup (outer markup for raw blocks, unused for tables).
    pub inner: String,
}

impl Block {
    pub fn paragraph(inner: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            align: None,
            inner: inner.into(),
        }
    }

    pub fn table(rows: u32, cols: u32) -> Self {
        let cells = (0..rows)
            .map(|_| (0..cols).map(|_| Cell::empty()).collect())
            .collect();
        Self {
            kind: BlockKind::Table(cells),
            align: None,
            inner: String::new(),
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self.kind, BlockKind::Table(_))
    }

    /// Whether the block is a text block whose kind and alignment can change.
    pub fn is_textual(&self) -> bool {
        matches!(
            self.kind,
            BlockKind::Paragraph | BlockKind::Heading(_) | BlockKind::ListItem(_)
        )
    }
}

/// Escapes text typed by the user for inclusion in markup.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

struct Element<'a> {
    name: String,
    attrs: &'a str,
    inner: &'a str,
    outer: &'a str,
}

enum Node<'a> {
    Element(Element<'a>),
    Text(&'a str),
    /// Markup whose element never closes.
    Unbalanced(&'a str),
}

/// Finds the tag closing an element named `name` whose content starts at
/// `from`. Tag names match case-insensitively and same-name elements nest.
/// Returns the byte range of the closing tag.
fn matching_close(s: &str, name: &str, from: usize) -> Option<(usize, usize)> {
    // ASCII lowercasing keeps byte offsets intact.
    let lower = s.to_ascii_lowercase();
    let open = format!("<{name}");
    let close = format!("</{name}");
    let mut depth = 1usize;
    let mut i = from;

    while let Some(offset) = lower[i..].find('<') {
        let at = i + offset;
        let rest = &lower[at..];
        if let Some(after) = rest.strip_prefix(&close) {
            if let Some(gt) = after.find('>') {
                if after[..gt].trim().is_empty() {
                    let end = at + close.len() + gt + 1;
                    depth -= 1;
                    if depth == 0 {
                        return Some((at, end));
                    }
                    i = end;
                    continue;
                }
            }
        } else if let Some(after) = rest.strip_prefix(&open) {
            if after.starts_with(|c: char| c.is_whitespace() || c == '>') {
                let gt = after.find('>')?;
                if !after[..gt].trim_end().ends_with('/') {
                    depth += 1;
                }
            }
        }
        i = at + 1;
    }
    None
}

/// Parses the element that starts at the beginning of `s`.
/// Returns the element and the number of bytes it spans.
fn element_at(s: &str) -> Option<(Element<'_>, usize)> {
    let body = s.strip_prefix('<')?;
    let name_len = body.find(|c: char| c.is_whitespace() || c == '>' || c == '/')?;
    if name_len == 0 {
        return None;
    }
    let name = body[..name_len].to_ascii_lowercase();
    let open_end = body.find('>')?;
    if open_end < name_len {
        return None;
    }
    let attrs = body[name_len..open_end].trim();
    let after_open = open_end + 2;

    if attrs.ends_with('/') || VOID_ELEMENTS.contains(&name.as_str()) {
        let outer = &s[..after_open];
        return Some((
            Element {
                name,
                attrs: attrs.trim_end_matches('/').trim(),
                inner: "",
                outer,
            },
            after_open,
        ));
    }

    let (close_at, end) = matching_close(s, &name, after_open)?;
    Some((
        Element {
            name,
            attrs,
            inner: &s[after_open..close_at],
            outer: &s[..end],
        },
        end,
    ))
}

/// Splits `s` into sibling nodes. Whitespace between elements is dropped.
fn nodes(s: &str) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut rest = s.trim_start();
    while !rest.is_empty() {
        if rest.starts_with('<') && !rest.starts_with("</") {
            if let Some((element, used)) = element_at(rest) {
                out.push(Node::Element(element));
                rest = rest[used..].trim_start();
                continue;
            }
            // Unbalanced markup: keep the remainder untouched.
            out.push(Node::Unbalanced(rest.trim_end()));
            break;
        }
        let first = rest.chars().next().map_or(1, char::len_utf8);
        let end = rest[first..].find('<').map_or(rest.len(), |i| i + first);
        let text = rest[..end].trim_end();
        if !text.is_empty() {
            out.push(Node::Text(text));
        }
        rest = rest[end..].trim_start();
    }
    out
}

fn parse_align(attrs: &str) -> Option<TextAlign> {
    let at = attrs.find("text-align:")?;
    let value = &attrs[at + "text-align:".len()..];
    let end = value.find([';', '"', '\'']).unwrap_or(value.len());
    value[..end].trim().parse().ok()
}

fn parse_table_rows(inner: &str, rows: &mut Vec<Vec<Cell>>) {
    for node in nodes(inner) {
        let Node::Element(element) = node else {
            continue;
        };
        match element.name.as_str() {
            "thead" | "tbody" | "tfoot" => parse_table_rows(element.inner, rows),
            "tr" => {
                let cells = nodes(element.inner)
                    .into_iter()
                    .filter_map(|n| match n {
                        Node::Element(c) if c.name == "td" || c.name == "th" => Some(Cell {
                            header: c.name == "th",
                            inner: c.inner.trim().to_string(),
                        }),
                        _ => None,
                    })
                    .collect();
                rows.push(cells);
            }
            _ => {}
        }
    }
}

fn raw(outer: &str) -> Block {
    Block {
        kind: BlockKind::Raw,
        align: None,
        inner: outer.to_string(),
    }
}

/// Parses markup into top-level blocks.
pub fn parse(markup: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    for node in nodes(markup) {
        let element = match node {
            Node::Text(text) => {
                blocks.push(Block::paragraph(text));
                continue;
            }
            Node::Unbalanced(rest) => {
                blocks.push(raw(rest));
                continue;
            }
            Node::Element(element) => element,
        };
        let align = parse_align(element.attrs);
        let name = element.name.as_str();
        let heading = name
            .strip_prefix('h')
            .and_then(|n| n.parse::<u8>().ok())
            .and_then(HeadingLevel::new);

        if name == "p" {
            blocks.push(Block {
                kind: BlockKind::Paragraph,
                align,
                inner: element.inner.to_string(),
            });
        } else if let Some(level) = heading {
            blocks.push(Block {
                kind: BlockKind::Heading(level),
                align,
                inner: element.inner.to_string(),
            });
        } else if name == "ul" || name == "ol" {
            let kind = if name == "ul" {
                ListKind::Bullet
            } else {
                ListKind::Ordered
            };
            for item in nodes(element.inner) {
                match item {
                    Node::Element(li) if li.name == "li" => blocks.push(Block {
                        kind: BlockKind::ListItem(kind),
                        align: parse_align(li.attrs),
                        inner: li.inner.to_string(),
                    }),
                    Node::Element(other) => blocks.push(raw(other.outer)),
                    Node::Text(text) | Node::Unbalanced(text) => blocks.push(raw(text)),
                }
            }
        } else if name == "table" {
            let mut rows = Vec::new();
            parse_table_rows(element.inner, &mut rows);
            if rows.is_empty() || rows.iter().all(Vec::is_empty) {
                blocks.push(raw(element.outer));
            } else {
                blocks.push(Block {
                    kind: BlockKind::Table(rows),
                    align: None,
                    inner: String::new(),
                });
            }
        } else {
            blocks.push(raw(element.outer));
        }
    }
    blocks
}

fn style_attr(align: Option<TextAlign>) -> String {
    match align {
        Some(a) if a != TextAlign::Left => format!(" style=\"text-align: {}\"", a.as_css()),
        _ => String::new(),
    }
}

/// Renders blocks back to markup. Adjacent list items of the same kind
/// share one list element.
pub fn render(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut open_list: Option<ListKind> = None;

    for block in blocks {
        let item_kind = match block.kind {
            BlockKind::ListItem(kind) => Some(kind),
            _ => None,
        };
        if open_list.is_some() && open_list != item_kind {
            if let Some(kind) = open_list.take() {
                let _ = write!(out, "</{}>", kind.tag());
            }
        }
        if let Some(kind) = item_kind {
            if open_list.is_none() {
                let _ = write!(out, "<{}>", kind.tag());
                open_list = Some(kind);
            }
        }

        let style = style_attr(block.align);
        match &block.kind {
            BlockKind::Paragraph => {
                let _ = write!(out, "<p{style}>{}</p>", block.inner);
            }
            BlockKind::Heading(level) => {
                let n = level.get();
                let _ = write!(out, "<h{n}{style}>{}</h{n}>", block.inner);
            }
            BlockKind::ListItem(_) => {
                let _ = write!(out, "<li{style}>{}</li>", block.inner);
            }
            BlockKind::Table(rows) => {
                let _ = write!(out, "<table class=\"{TABLE_CLASS}\"><tbody>");
                for row in rows {
                    out.push_str("<tr>");
                    for cell in row {
                        let tag = if cell.header { "th" } else { "td" };
                        let inner = if cell.inner.is_empty() {
                            "<p></p>"
                        } else {
                            cell.inner.as_str()
                        };
                        let _ = write!(out, "<{tag}>{inner}</{tag}>");
                    }
                    out.push_str("</tr>");
                }
                out.push_str("</tbody></table>");
            }
            BlockKind::Raw => out.push_str(&block.inner),
        }
    }
    if let Some(kind) = open_list {
        let _ = write!(out, "</{}>", kind.tag());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(markup: &str) -> String {
        render(&parse(markup))
    }

    #[test]
    fn test_paragraphs_and_headings_round_trip() {
        let markup = "<h1>Title</h1><p>Body <strong>bold</strong></p><h4>Small</h4>";
        assert_eq!(round_trip(markup), markup);
    }

    #[test]
    fn test_alignment_parsed_and_rendered() {
        let blocks = parse("<p style=\"text-align: center\">x</p><h2 style=\"text-align: left\">y</h2>");
        assert_eq!(blocks[0].align, Some(TextAlign::Center));
        assert_eq!(blocks[1].align, Some(TextAlign::Left));
        assert_eq!(
            render(&blocks),
            "<p style=\"text-align: center\">x</p><h2>y</h2>"
        );
    }

    #[test]
    fn test_lists_become_items_and_regroup() {
        let markup = "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol>";
        let blocks = parse(markup);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].kind, BlockKind::ListItem(ListKind::Bullet));
        assert_eq!(blocks[2].kind, BlockKind::ListItem(ListKind::Ordered));
        assert_eq!(render(&blocks), markup);
    }

    #[test]
    fn test_table_cells_survive() {
        let markup = "<table class=\"financial-table\"><tbody><tr><th>Year</th><th>Revenue</th></tr>\
                      <tr><td>2024</td><td><p>1.2M</p></td></tr></tbody></table>";
        let blocks = parse(markup);
        let BlockKind::Table(rows) = &blocks[0].kind else {
            panic!("expected table");
        };
        assert_eq!(rows.len(), 2);
        assert!(rows[0][0].header);
        assert_eq!(rows[1][1].inner, "<p>1.2M</p>");
        assert_eq!(parse(&render(&blocks)), blocks);
    }

    #[test]
    fn test_unknown_elements_kept_verbatim() {
        let markup = "<hr><blockquote><p>q</p></blockquote><h5>five</h5>";
        assert_eq!(round_trip(markup), markup);
        assert!(parse(markup).iter().all(|b| b.kind == BlockKind::Raw));
    }

    #[test]
    fn test_bare_text_becomes_paragraph() {
        assert_eq!(round_trip("hello"), "<p>hello</p>");
    }

    #[test]
    fn test_unbalanced_markup_kept() {
        let markup = "<p>ok</p><p>never closed";
        let blocks = parse(markup);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].kind, BlockKind::Raw);
        assert_eq!(blocks[1].inner, "<p>never closed");
        assert_eq!(render(&blocks), markup);
    }

    #[test]
    fn test_nested_same_name_elements() {
        let markup = "<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>";
        let blocks = parse(markup);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].inner, "a<ul><li>b</li></ul>");
        assert_eq!(blocks[1].inner, "c");
        assert_eq!(render(&blocks), markup);
    }

    #[test]
    fn test_uppercase_tags() {
        let blocks = parse("<P>Hello</P><H2 STYLE=\"text-align: right\">Big</H2>");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], Block::paragraph("Hello"));
        assert_eq!(blocks[1].kind, BlockKind::Heading(HeadingLevel::new(2).unwrap()));
        assert_eq!(blocks[1].inner, "Big");
    }

    #[test]
    fn test_similar_tag_names_do_not_match() {
        let markup = "<p>a<pre>b</pre></p>";
        let blocks = parse(markup);
        assert_eq!(blocks, vec![Block::paragraph("a<pre>b</pre>")]);
    }

    #[test]
    fn test_new_table_renders_empty_cells() {
        let html = render(&[Block::table(2, 3)]);
        assert_eq!(html.matches("<tr>").count(), 2);
        assert_eq!(html.matches("<td><p></p></td>").count(), 6);
        assert!(html.starts_with("<table class=\"financial-table\">"));
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }
}
