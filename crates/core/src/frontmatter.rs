use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// A document split into its frontmatter data and Markdown body.
#[derive(Debug)]
pub struct FrontmatterSplit<'a> {
    /// Parsed frontmatter mapping, `None` when the document has no frontmatter block.
    pub data: Option<Map<String, JsonValue>>,
    /// Markdown content following the frontmatter block.
    pub body: &'a str,
    /// Byte offset of `body` inside the original document.
    pub body_start: usize,
}

impl<'a> FrontmatterSplit<'a> {
    /// A split for a document without frontmatter.
    pub fn without_frontmatter(input: &'a str) -> Self {
        Self {
            data: None,
            body: input,
            body_start: 0,
        }
    }

    /// Number of lines consumed by the frontmatter block.
    ///
    /// Locations reported against `body` are shifted by this amount to point
    /// back into the original document.
    pub fn line_offset(&self, input: &str) -> usize {
        input[..self.body_start].matches('\n').count()
    }
}

/// Errors emitted while splitting frontmatter.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// Opening `---` fence without a closing one.
    #[error("Unterminated YAML frontmatter block: expected closing '---'")]
    Unterminated,
    /// YAML failed to parse.
    #[error("Frontmatter parse error: {0}")]
    Parse(String),
    /// Top-level YAML node was not a mapping.
    #[error("Frontmatter must be a YAML mapping at the top level")]
    InvalidRootType,
}

/// Splits a leading `---` fenced YAML block from the document body.
///
/// Leading blank lines and a UTF-8 BOM are allowed before the opening fence.
pub fn split_frontmatter(input: &str) -> Result<FrontmatterSplit<'_>, FrontmatterError> {
    let Some((block, body_start)) = find_yaml_block(input)? else {
        return Ok(FrontmatterSplit::without_frontmatter(input));
    };

    Ok(FrontmatterSplit {
        data: Some(parse_yaml_block(block)?),
        body: &input[body_start..],
        body_start,
    })
}

fn parse_yaml_block(block: &str) -> Result<Map<String, JsonValue>, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(Map::new());
    }

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|err| FrontmatterError::Parse(err.to_string()))?;
    match serde_json::to_value(yaml).map_err(|err| FrontmatterError::Parse(err.to_string()))? {
        JsonValue::Null => Ok(Map::new()),
        JsonValue::Object(map) => Ok(map),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}

/// Returns the YAML text between the fences and the byte offset where the body starts.
fn find_yaml_block(input: &str) -> Result<Option<(&str, usize)>, FrontmatterError> {
    let bom_len = if input.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };

    let mut lines = LineCursor::new(input, bom_len);
    let opening = loop {
        match lines.next() {
            Some((line, _)) if line.trim().is_empty() => continue,
            Some((line, end)) if is_yaml_fence(line) => break end,
            _ => return Ok(None),
        }
    };

    for (line, end) in lines.by_ref() {
        if is_yaml_fence(line) {
            let fence_start = end - line.len() - usize::from(input[..end].ends_with('\n'));
            let block = input[opening..fence_start].trim_end_matches(['\r', '\n']);
            return Ok(Some((block, end)));
        }
    }

    Err(FrontmatterError::Unterminated)
}

/// Iterates lines as `(line_without_newline, offset_after_newline)`.
struct LineCursor<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> LineCursor<'a> {
    fn new(input: &'a str, start: usize) -> Self {
        Self {
            input,
            cursor: start,
        }
    }
}

impl<'a> Iterator for LineCursor<'a> {
    type Item = (&'a str, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.input.len() {
            return None;
        }
        let rest = &self.input[self.cursor..];
        let (line, consumed) = match rest.find('\n') {
            Some(pos) => (&rest[..pos], pos + 1),
            None => (rest, rest.len()),
        };
        self.cursor += consumed;
        Some((line, self.cursor))
    }
}

fn is_yaml_fence(line: &str) -> bool {
    line.trim_end_matches('\r').trim_end() == "---"
}
