//! Table extraction from HTML pages.
//!
//! Tables are read the way a dataframe `read_html` reads them: header rows come
//! from `<thead>` or the leading all-`<th>` rows, body rows are every `<tr>`
//! under a `<tbody>` (nested tables included), `colspan` repeats a cell across
//! the spanned columns and `rowspan` carries it down. Elements styled
//! `display:none` are ignored.

use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("table selector"));
static THEAD_TR: Lazy<Selector> = Lazy::new(|| Selector::parse("thead tr").expect("thead selector"));
static TBODY_TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody tr").expect("tbody selector"));

/// A table read from a page. `header` is present when the table had header rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlTable {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl HtmlTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.as_ref()?.iter().position(|h| h == name)
    }

    /// Use the first row as the header and drop it from the body.
    pub fn promote_first_row(mut self) -> Self {
        if !self.rows.is_empty() {
            self.header = Some(self.rows.remove(0));
        }
        self
    }
}

/// Read every table containing a text node with `matching`, in document order.
/// `skip_rows` leading lines (header lines included) are dropped from each.
pub fn read_tables(html: &str, matching: &str, skip_rows: usize) -> Vec<HtmlTable> {
    let document = Html::parse_document(html);
    let tables: Vec<HtmlTable> = document
        .select(&TABLE)
        .filter(|table| !is_hidden(table) && has_text_node(**table, matching))
        .map(|table| read_table(table, skip_rows))
        .collect();
    debug!("Found {} tables matching {:?}", tables.len(), matching);
    tables
}

fn read_table(table: ElementRef<'_>, skip_rows: usize) -> HtmlTable {
    let mut header_rows = visible_rows(table, &THEAD_TR);
    let mut body_rows = visible_rows(table, &TBODY_TR);

    if header_rows.is_empty() {
        while body_rows.first().is_some_and(|row| row_is_all_th(*row)) {
            header_rows.push(body_rows.remove(0));
        }
    }

    let header = expand_spans(&header_rows);
    let body = expand_spans(&body_rows);
    let has_header = !header.is_empty();

    let mut lines: Vec<Vec<String>> = header.into_iter().chain(body).collect();
    let width = lines.iter().map(Vec::len).max().unwrap_or(0);
    for line in &mut lines {
        line.resize(width, String::new());
    }

    let mut lines = lines.into_iter().skip(skip_rows);
    if has_header {
        let header = lines.next();
        HtmlTable {
            header,
            rows: lines.collect(),
        }
    } else {
        HtmlTable {
            header: None,
            rows: lines.collect(),
        }
    }
}

fn visible_rows<'a>(table: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    table
        .select(selector)
        .filter(|row| !hidden_between(*row, table))
        .collect()
}

fn cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th") && !is_hidden(cell))
        .collect()
}

fn row_is_all_th(row: ElementRef<'_>) -> bool {
    let cells = cells(row);
    !cells.is_empty() && cells.iter().all(|cell| cell.value().name() == "th")
}

fn span_attr(cell: &ElementRef<'_>, name: &str) -> usize {
    cell.value()
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

/// Lay rows out on a grid, repeating spanned cells.
fn expand_spans(rows: &[ElementRef<'_>]) -> Vec<Vec<String>> {
    let mut all_texts = Vec::new();
    // (column, text, rows still to fill)
    let mut remainder: Vec<(usize, String, usize)> = Vec::new();

    for row in rows {
        let mut texts = Vec::new();
        let mut next_remainder = Vec::new();
        let mut index = 0;

        for cell in cells(*row) {
            while remainder.first().is_some_and(|(col, _, _)| *col <= index) {
                let (col, text, left) = remainder.remove(0);
                texts.push(text.clone());
                if left > 1 {
                    next_remainder.push((col, text, left - 1));
                }
                index += 1;
            }

            let text = cell_text(cell);
            let rowspan = span_attr(&cell, "rowspan");
            for _ in 0..span_attr(&cell, "colspan") {
                texts.push(text.clone());
                if rowspan > 1 {
                    next_remainder.push((index, text.clone(), rowspan - 1));
                }
                index += 1;
            }
        }

        for (col, text, left) in remainder.drain(..) {
            texts.push(text.clone());
            if left > 1 {
                next_remainder.push((col, text, left - 1));
            }
        }

        all_texts.push(texts);
        remainder = next_remainder;
    }

    // Rows that exist only because a rowspan ran past the last <tr>
    while !remainder.is_empty() {
        let mut texts = Vec::new();
        let mut next_remainder = Vec::new();
        for (col, text, left) in remainder.drain(..) {
            texts.push(text.clone());
            if left > 1 {
                next_remainder.push((col, text, left - 1));
            }
        }
        all_texts.push(texts);
        remainder = next_remainder;
    }

    all_texts
}

/// Visible text of a cell with whitespace runs collapsed.
pub fn cell_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(*element, &mut raw);
    collapse_whitespace(&raw)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    if !is_hidden(&element) {
                        collect_text(child, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn has_text_node(node: NodeRef<'_, Node>, needle: &str) -> bool {
    node.descendants().any(|n| match n.value() {
        Node::Text(text) => text.contains(needle),
        _ => false,
    })
}

fn is_hidden(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .attr("style")
        .map(|style| style.replace(char::is_whitespace, "").contains("display:none"))
        .unwrap_or(false)
}

/// Whether `element` or any ancestor below `root` is hidden.
fn hidden_between(element: ElementRef<'_>, root: ElementRef<'_>) -> bool {
    if is_hidden(&element) {
        return true;
    }
    element
        .ancestors()
        .take_while(|node| node.id() != root.id())
        .filter_map(ElementRef::wrap)
        .any(|ancestor| is_hidden(&ancestor))
}
