//! Repairs Markdown that was cut off mid-construct.
//!
//! Streaming generators emit Markdown a few tokens at a time, so the buffer
//! rendered between chunks routinely ends inside `**bold`, a code span, a
//! math run or a half-written link. [`heal`] scans the tail of the buffer once
//! and closes what it can prove is open, or removes it when closing would
//! produce something misleading (images with a partial URL).

use serde::{Deserialize, Serialize};

/// Number of trailing bytes [`heal`] rewrites by default.
pub const DEFAULT_WINDOW_SIZE: usize = 4096;

/// Destination substituted for a link whose URL was cut off.
pub const INCOMPLETE_LINK_URL: &str = "#incomplete-link";

/// Healing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealOptions {
    /// Only the last `window_size` bytes (extended back to a line start) are scanned.
    pub window_size: usize,
}

impl Default for HealOptions {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Heals `text` with the default window.
pub fn heal_default(text: &str) -> String {
    heal(text, DEFAULT_WINDOW_SIZE)
}

/// Heals `text` with the given options.
pub fn heal_with_options(text: &str, options: &HealOptions) -> String {
    heal(text, options.window_size)
}

/// Closes or removes unterminated inline constructs at the end of `text`.
///
/// Only the suffix starting at the line that contains byte
/// `text.len() - window_size` is scanned; the prefix is copied unchanged, so a
/// construct opened before that line is never healed.
///
/// ```
/// use mdxtext_core::heal::heal;
///
/// assert_eq!(heal("**bold", 4096), "**bold**");
/// assert_eq!(heal("![alt](https://ex", 4096), "");
/// ```
pub fn heal(text: &str, window_size: usize) -> String {
    if text.len() <= window_size {
        return heal_markdown(text);
    }

    let mut start = text.len() - window_size;
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let line_start = text[..start].rfind('\n').map_or(0, |pos| pos + 1);

    let healed = heal_markdown(&text[line_start..]);
    let mut out = String::with_capacity(line_start + healed.len());
    out.push_str(&text[..line_start]);
    out.push_str(&healed);
    out
}

fn heal_markdown(text: &str) -> String {
    Scanner::new(text).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MathKind {
    /// `\(` … `\)`
    Paren,
    /// `\[` … `\]`
    Bracket,
}

impl MathKind {
    fn closer(self) -> &'static str {
        match self {
            MathKind::Paren => "\\)",
            MathKind::Bracket => "\\]",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MathOpen {
    kind: MathKind,
    index: usize,
}

#[derive(Debug, Clone, Copy)]
struct CodeSpan {
    index: usize,
    len: usize,
}

#[derive(Debug, Clone, Copy)]
struct EmphasisToken {
    marker: u8,
    len: usize,
    index: usize,
    line: usize,
}

#[derive(Debug, Clone, Copy)]
struct Bracket {
    start: usize,
    image: bool,
}

/// A link or image whose `](` has been seen but whose `)` has not.
#[derive(Debug, Clone, Copy)]
struct OpenUrl {
    start: usize,
    image: bool,
    url_start: usize,
    depth: usize,
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    /// Only spaces/tabs seen since the last newline.
    line_blank: bool,
    fence: bool,
    code_span: Option<CodeSpan>,
    block_math: Option<usize>,
    math: Vec<MathOpen>,
    dollars: Vec<usize>,
    emphasis: Vec<EmphasisToken>,
    brackets: Vec<Bracket>,
    url: Option<OpenUrl>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            line: 0,
            line_blank: true,
            fence: false,
            code_span: None,
            block_math: None,
            math: Vec::new(),
            dollars: Vec::new(),
            emphasis: Vec::new(),
            brackets: Vec::new(),
            url: None,
        }
    }

    fn run(mut self) -> String {
        while self.pos < self.bytes.len() {
            let byte = self.bytes[self.pos];

            if byte == b'\n' {
                self.newline();
                continue;
            }
            if self.fence {
                self.scan_fenced();
                continue;
            }
            if self.url.is_some() {
                self.scan_url(byte);
                continue;
            }
            if let Some(span) = self.code_span {
                if byte == b'`' {
                    let run = self.run_len(b'`');
                    if run == span.len {
                        self.code_span = None;
                    }
                    self.advance(run);
                } else {
                    self.advance(1);
                }
                continue;
            }
            if self.block_math.is_some() {
                if self.bytes[self.pos..].starts_with(b"$$") {
                    self.block_math = None;
                    self.advance(2);
                } else {
                    self.advance(1);
                }
                continue;
            }

            match byte {
                b'\\' => self.backslash(),
                b'`' => self.backticks(),
                b'$' => self.dollar(),
                b'[' => {
                    self.brackets.push(Bracket {
                        start: self.pos,
                        image: false,
                    });
                    self.advance(1);
                }
                b'!' if self.peek(1) == Some(b'[') => {
                    self.brackets.push(Bracket {
                        start: self.pos,
                        image: true,
                    });
                    self.advance(2);
                }
                b']' => self.close_bracket(),
                b'*' | b'_' | b'~' => self.emphasis_run(byte),
                _ => self.advance(1),
            }
        }

        self.finish()
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn run_len(&self, byte: u8) -> usize {
        self.bytes[self.pos..]
            .iter()
            .take_while(|b| **b == byte)
            .count()
    }

    fn advance(&mut self, n: usize) {
        let end = (self.pos + n).min(self.bytes.len());
        if self.bytes[self.pos..end]
            .iter()
            .any(|b| !matches!(b, b' ' | b'\t'))
        {
            self.line_blank = false;
        }
        self.pos = end;
    }

    fn skip_to_line_end(&mut self) {
        let rest = &self.bytes[self.pos..];
        let len = rest.iter().position(|b| *b == b'\n').unwrap_or(rest.len());
        self.advance(len);
    }

    fn newline(&mut self) {
        self.pos += 1;
        self.line += 1;
        self.line_blank = true;
        // Link destinations cannot span lines.
        self.url = None;
    }

    fn scan_fenced(&mut self) {
        if self.line_blank && self.run_len(b'`') >= 3 {
            self.fence = false;
            self.skip_to_line_end();
        } else {
            self.advance(1);
        }
    }

    fn scan_url(&mut self, byte: u8) {
        let closed = match self.url.as_mut() {
            Some(url) => {
                match byte {
                    b'(' => url.depth += 1,
                    b')' => url.depth -= 1,
                    _ => {}
                }
                url.depth == 0
            }
            None => false,
        };
        if closed {
            self.url = None;
        }
        self.advance(1);
    }

    fn backticks(&mut self) {
        let run = self.run_len(b'`');
        if self.line_blank && run >= 3 {
            self.fence = true;
            self.skip_to_line_end();
            return;
        }
        self.code_span = Some(CodeSpan {
            index: self.pos,
            len: run,
        });
        self.advance(run);
    }

    fn dollar(&mut self) {
        if self.peek(1) == Some(b'$') {
            self.block_math = Some(self.pos);
            self.advance(2);
            return;
        }
        if self.dollars.pop().is_none() {
            self.dollars.push(self.pos);
        }
        self.advance(1);
    }

    fn backslash(&mut self) {
        let kind = match self.peek(1) {
            Some(b'(' | b')') => MathKind::Paren,
            Some(b'[' | b']') => MathKind::Bracket,
            Some(b'\n') | None => {
                self.advance(1);
                return;
            }
            Some(_) => {
                self.advance(2);
                return;
            }
        };

        if matches!(self.peek(1), Some(b'(' | b'[')) {
            self.math.push(MathOpen {
                kind,
                index: self.pos,
            });
        } else if let Some(i) = self.math.iter().rposition(|open| open.kind == kind) {
            self.math.remove(i);
        }
        self.advance(2);
    }

    fn close_bracket(&mut self) {
        if let Some(open) = self.brackets.pop()
            && self.peek(1) == Some(b'(')
        {
            self.url = Some(OpenUrl {
                start: open.start,
                image: open.image,
                url_start: self.pos + 2,
                depth: 1,
            });
            self.advance(2);
            return;
        }
        self.advance(1);
    }

    fn emphasis_run(&mut self, marker: u8) {
        let run = self.run_len(marker);
        let start = self.pos;
        let prev = self.text[..start].chars().next_back();
        let next = self.text[start + run..].chars().next();
        let at_line_start = self.line_blank;
        self.advance(run);

        if marker == b'*' {
            if at_line_start && matches!(next, Some(' ' | '\t')) {
                return; // list bullet
            }
            if is_word(prev) && is_word(next) {
                return;
            }
        }

        let Some(len) = normalized_len(marker, run) else {
            return;
        };

        let left = !is_space(next) && (!is_punct(next) || is_space(prev) || is_punct(prev));
        let right = !is_space(prev) && (!is_punct(prev) || is_space(next) || is_punct(next));
        let (can_open, can_close) = if marker == b'_' {
            (left && (!right || is_punct(prev)), right && (!left || is_punct(next)))
        } else {
            (left, right)
        };

        if can_close
            && let Some(i) = self
                .emphasis
                .iter()
                .rposition(|open| open.marker == marker && open.len == len)
        {
            self.emphasis.truncate(i);
            return;
        }

        if can_open {
            self.emphasis.push(EmphasisToken {
                marker,
                len,
                index: start,
                line: self.line,
            });
        }
    }

    fn finish(self) -> String {
        let text = self.text;

        if self.fence {
            return text.to_string();
        }

        let (mut out, cutoff) = match self.url {
            Some(url) if url.image => (text[..url.start].to_string(), url.start),
            Some(url) => {
                let mut out = String::with_capacity(url.url_start + INCOMPLETE_LINK_URL.len() + 1);
                out.push_str(&text[..url.url_start]);
                out.push_str(INCOMPLETE_LINK_URL);
                out.push(')');
                (out, url.start)
            }
            None => (text.to_string(), text.len()),
        };

        let mut closers = String::new();
        if let Some(span) = self.code_span
            && span.index < cutoff
        {
            closers.push_str(&"`".repeat(span.len));
        }

        if let Some(index) = self.block_math
            && index < cutoff
        {
            closers.push_str("$$");
        }

        for open in self.math.iter().rev().filter(|open| open.index < cutoff) {
            closers.push_str(open.kind.closer());
        }

        for _ in self.dollars.iter().rev().filter(|index| **index < cutoff) {
            closers.push('$');
        }

        let eligible = || self.emphasis.iter().filter(|token| token.index < cutoff);
        if let Some(last_line) = eligible().map(|token| token.line).max() {
            for token in eligible().rev().filter(|token| token.line == last_line) {
                for _ in 0..token.len {
                    closers.push(char::from(token.marker));
                }
            }
        }

        // A closer after the gap left by a removed image would not close anything.
        if !closers.is_empty() && self.url.is_some_and(|url| url.image) {
            out.truncate(out.trim_end_matches([' ', '\t']).len());
        }
        out.push_str(&closers);
        out
    }
}

/// Normalized run length used for matching, `None` when the run is too long.
fn normalized_len(marker: u8, run: usize) -> Option<usize> {
    match marker {
        b'*' if run <= 3 => Some(run),
        b'_' if run <= 3 => Some(run.min(2)),
        b'~' if run <= 2 => Some(2),
        _ => None,
    }
}

fn is_space(ch: Option<char>) -> bool {
    ch.is_none_or(char::is_whitespace)
}

fn is_punct(ch: Option<char>) -> bool {
    ch.is_some_and(|c| c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_whitespace()))
}

fn is_word(ch: Option<char>) -> bool {
    ch.is_some_and(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(text: &str) -> String {
        heal_default(text)
    }

    #[test]
    fn closes_strong() {
        assert_eq!(h("**bold"), "**bold**");
        assert_eq!(h("Some *emphasis"), "Some *emphasis*");
        assert_eq!(h("~~gone"), "~~gone~~");
        assert_eq!(h("__under"), "__under__");
    }

    #[test]
    fn closes_nested_emphasis_in_reverse() {
        assert_eq!(h("**bold *and italic"), "**bold *and italic***");
    }

    #[test]
    fn closes_code_and_math() {
        assert_eq!(h("`code"), "`code`");
        assert_eq!(h("``co`de"), "``co`de``");
        assert_eq!(h("$$x^2"), "$$x^2$$");
        assert_eq!(h("inline $x"), "inline $x$");
        assert_eq!(h("\\(a \\[b"), "\\(a \\[b\\]\\)");
    }

    #[test]
    fn code_span_suppresses_emphasis() {
        assert_eq!(h("**bold `a*b"), "**bold `a*b`**");
    }

    #[test]
    fn leaves_complete_markdown_untouched() {
        let inputs = [
            "",
            "plain text",
            "Hello *world* and **strong** and ~~strike~~",
            "Use `code` and ``a ` b`` here",
            "Math $x$ and $$y$$ and \\(z\\) and \\[w\\]",
            "[link](https://example.com/a_(b)) and ![img](a.png)",
            "* item one\n* item two",
            "snake_case_name and 2 * 3 = 6 and a*b",
            "```rust\nlet x = *y;\n```\n\nafter",
            "Escaped \\*star and \\_underscore",
            "# Heading\n\n---\n\n> quote",
        ];
        for input in inputs {
            assert_eq!(h(input), input, "input: {input:?}");
        }
    }

    #[test]
    fn repairs_incomplete_link() {
        assert_eq!(
            h("[text](http://ex"),
            format!("[text]({})", INCOMPLETE_LINK_URL)
        );
        assert_eq!(
            h("See [docs](https://a.dev/x_(y"),
            format!("See [docs]({})", INCOMPLETE_LINK_URL)
        );
    }

    #[test]
    fn removes_incomplete_image() {
        assert_eq!(h("![alt](http://ex"), "");
        assert_eq!(h("Look: ![alt](http://ex"), "Look: ");
    }

    #[test]
    fn closers_follow_text_before_a_removed_image() {
        assert_eq!(h("**bold ![alt](http"), "**bold**");
        assert_eq!(h("Look: ![alt](http"), "Look: ");
    }

    #[test]
    fn repaired_tail_receives_no_closers() {
        assert_eq!(
            h("**bold [a *b](http"),
            format!("**bold [a *b]({})**", INCOMPLETE_LINK_URL)
        );
    }

    #[test]
    fn only_last_line_emphasis_is_closed() {
        assert_eq!(h("**a\n*b"), "**a\n*b*");
        assert_eq!(h("*a **b\n~~c"), "*a **b\n~~c~~");
    }

    #[test]
    fn open_fence_is_left_alone() {
        assert_eq!(h("*a\n```\ncode *x"), "*a\n```\ncode *x");
    }

    #[test]
    fn list_bullet_is_not_emphasis() {
        assert_eq!(h("* item"), "* item");
        assert_eq!(h("  * nested *em"), "  * nested *em*");
    }

    #[test]
    fn unfinished_bracket_without_url_is_kept() {
        assert_eq!(h("[partial"), "[partial");
        assert_eq!(h("[ref] text"), "[ref] text");
    }

    #[test]
    fn window_bounds_rewrites() {
        let line = "well formed *text* here\n";
        let text = line.repeat(10_000 / line.len() + 1);
        assert!(text.len() >= 10_000);
        assert_eq!(heal(&text, 10), text);
    }

    #[test]
    fn window_cannot_heal_constructs_before_it() {
        let text = format!("**open\n{}", "x".repeat(64));
        assert_eq!(heal(&text, 16), text);
        assert_eq!(heal(&text, 4096), format!("{}**", text));
    }

    #[test]
    fn window_extends_back_to_line_start() {
        let text = format!("{}\nhello **world", "a".repeat(100));
        assert_eq!(heal(&text, 4), format!("{}**", text));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: HealOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.window_size, DEFAULT_WINDOW_SIZE);
        let options: HealOptions = serde_json::from_str(r#"{"windowSize": 8}"#).unwrap();
        assert_eq!(heal_with_options("*a", &options), "*a*");
    }
}
