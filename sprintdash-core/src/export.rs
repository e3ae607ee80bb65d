//! Table export for pasting into chat or email
//!
//! Renders a header row plus data rows either as a pipe-delimited Markdown
//! table (`text/plain`) or as an inline-styled HTML table (`text/html`).
//! Cell content is escaped for the target format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

const TABLE_STYLE: &str =
    "border-collapse: collapse; width: 100%; font-family: Calibri, Arial, sans-serif;";
const HEADER_ROW_STYLE: &str = "background-color: #f5f5f5;";
const TH_STYLE: &str = "border: 1px solid #ddd; padding: 8px; text-align: left;";
const TD_STYLE: &str = "border: 1px solid #ddd; padding: 8px;";
const LINK_STYLE: &str = "color: #0366d6; text-decoration: none;";

/// Output format of an exported table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Pipe-delimited Markdown table
    Markdown,
    /// Inline-styled HTML table
    Html,
}

impl ExportFormat {
    /// MIME type the rendered string should be placed on the clipboard as
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/plain",
            ExportFormat::Html => "text/html",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "html" | "email" => Ok(ExportFormat::Html),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Markdown => write!(f, "markdown"),
            ExportFormat::Html => write!(f, "html"),
        }
    }
}

/// A single table cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Plain text
    Text(String),
    /// Text linking to `href`
    Link { text: String, href: String },
}

impl Cell {
    /// Create a link cell
    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Cell::Link {
            text: text.into(),
            href: href.into(),
        }
    }

    fn to_markdown(&self) -> String {
        match self {
            Cell::Text(text) => escape_markdown(text),
            Cell::Link { text, href } => {
                format!("[{}]({})", escape_link_text(text), markdown_destination(href))
            }
        }
    }

    fn to_html(&self) -> String {
        match self {
            Cell::Text(text) => escape_html(text),
            Cell::Link { text, href } => format!(
                "<a href=\"{}\" style=\"{}\">{}</a>",
                escape_html(href),
                LINK_STYLE,
                escape_html(text)
            ),
        }
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::Text(text)
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

/// Render plain string rows
pub fn render<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>], format: ExportFormat) -> String {
    let rows: Vec<Vec<Cell>> = rows
        .iter()
        .map(|row| row.iter().map(|c| Cell::from(c.as_str())).collect())
        .collect();
    render_cells(headers, &rows, format)
}

/// Render rows whose cells may carry links
pub fn render_cells<S: AsRef<str>>(headers: &[S], rows: &[Vec<Cell>], format: ExportFormat) -> String {
    match format {
        ExportFormat::Markdown => render_markdown(headers, rows),
        ExportFormat::Html => render_html(headers, rows),
    }
}

fn render_markdown<S: AsRef<str>>(headers: &[S], rows: &[Vec<Cell>]) -> String {
    let header: Vec<String> = headers.iter().map(|h| escape_markdown(h.as_ref())).collect();
    let separator = vec!["---"; headers.len()];

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(markdown_row(&header));
    lines.push(markdown_row(&separator));
    for row in rows {
        let cells: Vec<String> = row.iter().map(Cell::to_markdown).collect();
        lines.push(markdown_row(&cells));
    }

    lines.join("\n")
}

fn markdown_row<S: AsRef<str>>(cells: &[S]) -> String {
    let cells: Vec<&str> = cells.iter().map(|c| c.as_ref()).collect();
    format!("| {} |", cells.join(" | "))
}

fn render_html<S: AsRef<str>>(headers: &[S], rows: &[Vec<Cell>]) -> String {
    let mut out = String::new();
    out.push_str(&format!("<table style=\"{}\">\n", TABLE_STYLE));

    out.push_str("<thead>\n");
    out.push_str(&format!("<tr style=\"{}\">", HEADER_ROW_STYLE));
    for header in headers {
        out.push_str(&format!(
            "<th style=\"{}\">{}</th>",
            TH_STYLE,
            escape_html(header.as_ref())
        ));
    }
    out.push_str("</tr>\n</thead>\n");

    out.push_str("<tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str(&format!("<td style=\"{}\">{}</td>", TD_STYLE, cell.to_html()));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>");

    out
}

/// Escape a cell so it cannot break out of its Markdown table column
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '|' => out.push_str("\\|"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(' ');
            }
            '\n' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

fn escape_link_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in escape_markdown(text).chars() {
        if matches!(c, '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Link destinations with spaces, parentheses or angle brackets go in `<...>`
fn markdown_destination(href: &str) -> String {
    let href = escape_markdown(href);
    if !href
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '<' | '>'))
    {
        return href;
    }
    format!("<{}>", href.replace('<', "%3C").replace('>', "%3E"))
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_markdown_exact_output() {
        let out = render(&["A", "B"], &strings(&[&["1", "2"]]), ExportFormat::Markdown);
        assert_eq!(out, "| A | B |\n| --- | --- |\n| 1 | 2 |");
    }

    #[test]
    fn test_markdown_without_rows() {
        let out = render(&["ID", "Title"], &[], ExportFormat::Markdown);
        assert_eq!(out, "| ID | Title |\n| --- | --- |");
    }

    #[test]
    fn test_markdown_escapes_pipes_and_newlines() {
        let out = render(
            &["Title"],
            &strings(&[&["fix a|b\nparser"]]),
            ExportFormat::Markdown,
        );
        assert_eq!(out.lines().last(), Some("| fix a\\|b parser |"));
    }

    #[test]
    fn test_markdown_link_cell() {
        let rows = vec![vec![
            Cell::link("#12", "https://github.com/org/repo/issues/12"),
            Cell::from("Title"),
        ]];
        let out = render_cells(&["ID", "Title"], &rows, ExportFormat::Markdown);
        assert!(out.ends_with("| [#12](https://github.com/org/repo/issues/12) | Title |"));
    }

    #[test]
    fn test_markdown_link_cell_cannot_break_syntax() {
        let rows = vec![vec![Cell::link(
            "see [docs]",
            "https://example.com/a b)(c<d>",
        )]];
        let out = render_cells(&["Link"], &rows, ExportFormat::Markdown);
        assert_eq!(
            out.lines().last(),
            Some("| [see \\[docs\\]](<https://example.com/a b)(c%3Cd%3E>) |")
        );
    }

    #[test]
    fn test_html_row_count_and_order() {
        let out = render(
            &["A", "B"],
            &strings(&[&["1", "2"], &["3", "4"]]),
            ExportFormat::Html,
        );

        assert_eq!(out.matches("<tr").count(), 3);
        assert_eq!(out.matches("<th ").count(), 2);

        let positions: Vec<usize> = [">A<", ">B<", ">1<", ">2<", ">3<", ">4<"]
            .iter()
            .map(|needle| out.find(needle).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(out.starts_with("<table style="));
        assert!(out.ends_with("</table>"));
    }

    #[test]
    fn test_html_escapes_content() {
        let out = render(&["Title"], &strings(&[&["<b>&"]]), ExportFormat::Html);
        assert!(out.contains(">&lt;b&gt;&amp;</td>"));
        assert!(!out.contains("<b>"));
    }

    #[test]
    fn test_html_link_cell() {
        let rows = vec![vec![Cell::link("#7", "https://example.com/?a=1&b=\"2\"")]];
        let out = render_cells(&["ID"], &rows, ExportFormat::Html);
        assert!(out.contains("<a href=\"https://example.com/?a=1&amp;b=&quot;2&quot;\""));
        assert!(out.contains(">#7</a>"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("markdown".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("MD".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("email".parse::<ExportFormat>().unwrap(), ExportFormat::Html);
        assert!("csv".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(ExportFormat::Markdown.mime_type(), "text/plain");
        assert_eq!(ExportFormat::Html.mime_type(), "text/html");
    }
}
