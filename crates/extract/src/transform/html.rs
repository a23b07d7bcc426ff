//! Flattens raw HTML into plain text.
//!
//! lol_html strips every tag and leaves control-character markers at the
//! boundaries that matter (table rows and cells, `<details>` summaries). A
//! second pass over the flattened string turns those markers into
//! paragraphs.

use crate::transform::content::collapse_whitespace;
use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, doc_comments, element, rewrite_str};

const ROW_OPEN: char = '\u{1c}';
const ROW_CLOSE: char = '\u{1e}';
const CELL_OPEN: char = '\u{2}';
const CELL_CLOSE: char = '\u{3}';
const DETAILS_OPEN: char = '\u{e}';
const DETAILS_CLOSE: char = '\u{f}';
const SUMMARY_CLOSE: char = '\u{1d}';

const MARKERS: [char; 7] = [
    ROW_OPEN,
    ROW_CLOSE,
    CELL_OPEN,
    CELL_CLOSE,
    DETAILS_OPEN,
    DETAILS_CLOSE,
    SUMMARY_CLOSE,
];

/// Tags whose closing boundary ends a line of text.
const BLOCK_BOUNDARY_TAGS: &[&str] = &[
    "p", "div", "li", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "dl", "dt", "dd", "pre",
    "blockquote", "section", "article", "main", "header", "footer", "aside", "nav", "figure",
    "figcaption", "table", "thead", "tbody", "tfoot", "caption", "hr", "form", "address",
];

fn marker(value: char) -> String {
    value.to_string()
}

/// Strips tags and comments, leaving text plus boundary markers.
///
/// Entities are left encoded.
fn flatten(html: &str) -> String {
    let settings = RewriteStrSettings {
        element_content_handlers: vec![element!("*", |el| {
            let tag = el.tag_name();
            match tag.as_str() {
                "br" => {
                    el.replace("\n", ContentType::Text);
                    return Ok(());
                }
                "script" | "style" | "template" => {
                    el.remove();
                    return Ok(());
                }
                "tr" => {
                    el.before(&marker(ROW_OPEN), ContentType::Text);
                    el.after(&marker(ROW_CLOSE), ContentType::Text);
                }
                "td" | "th" => {
                    el.before(&marker(CELL_OPEN), ContentType::Text);
                    el.after(&marker(CELL_CLOSE), ContentType::Text);
                }
                "details" => {
                    el.before(&marker(DETAILS_OPEN), ContentType::Text);
                    el.after(&marker(DETAILS_CLOSE), ContentType::Text);
                }
                "summary" => el.after(&marker(SUMMARY_CLOSE), ContentType::Text),
                name if BLOCK_BOUNDARY_TAGS.contains(&name) => {
                    el.after("\n", ContentType::Text);
                }
                _ => {}
            }
            // media tags included: only their fallback text survives
            el.remove_and_keep_content();
            Ok(())
        })],
        document_content_handlers: vec![doc_comments!(|comment| {
            comment.remove();
            Ok(())
        })],
        ..RewriteStrSettings::default()
    };

    match rewrite_str(html, settings) {
        Ok(flattened) => flattened,
        Err(err) => {
            log::warn!("failed to flatten raw HTML: {err}");
            String::new()
        }
    }
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Flattens HTML in phrasing position.
///
/// Boundaries become newlines; the result is entity-decoded but otherwise
/// untrimmed.
pub fn html_to_text(html: &str) -> String {
    let flattened: String = flatten(html)
        .chars()
        .filter_map(|ch| match ch {
            CELL_CLOSE => Some(' '),
            ROW_CLOSE | SUMMARY_CLOSE | DETAILS_CLOSE => Some('\n'),
            ch if MARKERS.contains(&ch) => None,
            ch => Some(ch),
        })
        .collect();
    decode(&flattened)
}

/// Whether an inline HTML node is a single `<br>` tag.
pub fn is_line_break(html: &str) -> bool {
    let tag = html.trim();
    let Some(inner) = tag.strip_prefix('<').and_then(|t| t.strip_suffix('>')) else {
        return false;
    };
    let inner = inner.trim_end_matches('/').trim();
    inner.eq_ignore_ascii_case("br")
}

/// Whether an inline HTML node is one lone tag or comment.
///
/// markdown-rs emits start and end tags of inline HTML as separate nodes, so
/// these carry no text of their own.
pub fn is_single_tag(html: &str) -> bool {
    html.trim()
        .strip_prefix('<')
        .and_then(|tag| tag.strip_suffix('>'))
        .is_some_and(|inner| !inner.is_empty() && !inner.contains(['<', '>']))
}

/// Flattens HTML in block position into paragraph texts.
///
/// Table rows become `cell | cell` lines (rows whose cells are all blank are
/// omitted), a `<details>` block becomes its summary followed by its body,
/// and every other non-blank line becomes its own paragraph.
pub fn html_to_paragraphs(html: &str) -> Vec<String> {
    let flattened = flatten(html);
    log::debug!("flattened {} bytes of raw HTML", html.len());

    let mut out = ParagraphCollector::default();
    for ch in flattened.chars() {
        match ch {
            ROW_OPEN => {
                out.flush_line();
                out.row = Some(Vec::new());
            }
            ROW_CLOSE => out.flush_row(),
            CELL_OPEN => out.cell = Some(String::new()),
            CELL_CLOSE => {
                if let Some(cell) = out.cell.take() {
                    match out.row.as_mut() {
                        Some(cells) => cells.push(cell),
                        None => out.line.push_str(&cell),
                    }
                }
            }
            DETAILS_OPEN => {
                out.flush_line();
                out.details_depth += 1;
            }
            DETAILS_CLOSE => {
                out.flush_line();
                out.details_depth = out.details_depth.saturating_sub(1);
            }
            SUMMARY_CLOSE => out.flush_line(),
            ch => out.push(ch),
        }
    }
    out.flush_row();
    out.flush_line();
    out.paragraphs
}

#[derive(Default)]
struct ParagraphCollector {
    paragraphs: Vec<String>,
    line: String,
    row: Option<Vec<String>>,
    cell: Option<String>,
    details_depth: usize,
}

impl ParagraphCollector {
    fn push(&mut self, ch: char) {
        if let Some(cell) = self.cell.as_mut() {
            cell.push(ch);
        } else if self.row.is_some() {
            // whitespace between cells
        } else if ch == '\n' && self.details_depth == 0 {
            self.flush_line();
        } else {
            self.line.push(ch);
        }
    }

    fn flush_line(&mut self) {
        let text = collapse_whitespace(&decode(&self.line));
        self.line.clear();
        if !text.is_empty() {
            self.paragraphs.push(text);
        }
    }

    fn flush_row(&mut self) {
        if let Some(cell) = self.cell.take()
            && let Some(cells) = self.row.as_mut()
        {
            cells.push(cell);
        }
        let Some(cells) = self.row.take() else {
            return;
        };
        let cells: Vec<String> = cells
            .iter()
            .map(|cell| collapse_whitespace(&decode(cell)))
            .collect();
        if cells.iter().any(|cell| !cell.is_empty()) {
            self.paragraphs.push(cells.join(" | "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_become_paragraphs() {
        let html = "<table>\n  <tr>\n    <th>Name</th>\n    <th>Age</th>\n  </tr>\n  <tr><td></td><td> </td></tr>\n  <tr>\n    <td>Ada</td>\n    <td>36</td>\n  </tr>\n</table>";
        assert_eq!(html_to_paragraphs(html), vec!["Name | Age", "Ada | 36"]);
    }

    #[test]
    fn details_become_summary_and_body() {
        let html = "<details>\n<summary>More info</summary>\n\nHidden\ntext &amp; more\n</details>";
        assert_eq!(
            html_to_paragraphs(html),
            vec!["More info", "Hidden text & more"]
        );
    }

    #[test]
    fn block_boundaries_split_lines() {
        let html = "<div><p>First</p><p>Second<br>Third</p><!-- hidden --></div>";
        assert_eq!(html_to_paragraphs(html), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn media_tags_keep_inner_text() {
        assert_eq!(
            html_to_paragraphs("<video src=\"a.mp4\">Your browser</video>"),
            vec!["Your browser"]
        );
        assert!(html_to_paragraphs("<img src=\"a.png\">").is_empty());
    }

    #[test]
    fn phrasing_html_is_decoded_text() {
        assert_eq!(html_to_text("<kbd>"), "");
        assert_eq!(html_to_text("<b>a &lt; b</b>"), "a < b");
    }

    #[test]
    fn detects_line_breaks() {
        assert!(is_line_break("<br>"));
        assert!(is_line_break("<BR />"));
        assert!(!is_line_break("<bra>"));
        assert!(!is_line_break("br"));
    }

    #[test]
    fn detects_lone_tags() {
        assert!(is_single_tag("<span>"));
        assert!(is_single_tag("</kbd>"));
        assert!(is_single_tag("<a href=\"https://x.dev\">"));
        assert!(is_single_tag("<!-- note -->"));
        assert!(!is_single_tag("<b>bold</b>"));
        assert!(!is_single_tag("plain"));
    }
}
