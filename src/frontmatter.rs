//! Front-matter extraction for note files.
//!
//! A note may open with a YAML metadata block delimited by `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! draft: false
//! ---
//! # Body starts here
//! ```
//!
//! The split itself is a pure text operation; parsing the block is
//! delegated to `serde_yaml`, landing in the same `serde_json` value model
//! the expression evaluator works with. A file without an opening
//! delimiter is all body with an empty mapping. An opening delimiter that
//! is never closed is an error rather than being silently treated as body
//! text.

use crate::expr::Scope;
use serde_json::Value;
use thiserror::Error;

/// Front-matter delimiter line.
pub const DELIMITER: &str = "---";

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("front matter block opened but never closed")]
    Unterminated,
    #[error("front matter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter must be a YAML mapping")]
    NotAMapping,
}

/// Split a leading front-matter block from the document body.
///
/// Returns `(raw_block, body)` where `raw_block` is the text between the
/// delimiters, without the delimiters themselves.
pub fn split(text: &str) -> Result<(Option<&str>, &str), FrontMatterError> {
    let open = format!("{DELIMITER}\n");
    let Some(rest) = text.strip_prefix(&open) else {
        return Ok((None, text));
    };

    let close = format!("\n{DELIMITER}");
    let Some(end) = rest.find(&close) else {
        return Err(FrontMatterError::Unterminated);
    };

    let block = &rest[..end];
    let body = &rest[end + close.len()..];
    let body = body.strip_prefix('\n').unwrap_or(body);
    Ok((Some(block), body))
}

/// Split and parse: returns the front-matter mapping (empty when the block
/// is absent or empty) and the body text.
pub fn parse(text: &str) -> Result<(Scope, &str), FrontMatterError> {
    let (block, body) = split(text)?;
    let Some(block) = block else {
        return Ok((Scope::new(), body));
    };

    match serde_yaml::from_str::<Value>(block)? {
        Value::Object(map) => Ok((map, body)),
        // An empty block parses as null; treat it as no metadata.
        Value::Null => Ok((Scope::new(), body)),
        _ => Err(FrontMatterError::NotAMapping),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_delimiter_is_all_body() {
        let (front, body) = parse("# Just a note\n").unwrap();
        assert!(front.is_empty());
        assert_eq!(body, "# Just a note\n");
    }

    #[test]
    fn block_is_split_from_body() {
        let (block, body) = split("---\ntitle: Hello\n---\n# Hi\nworld").unwrap();
        assert_eq!(block, Some("title: Hello"));
        assert_eq!(body, "# Hi\nworld");
    }

    #[test]
    fn parsed_mapping_reaches_the_scope() {
        let (front, body) = parse("---\ntitle: Hello\ndraft: true\ncount: 3\n---\nbody").unwrap();
        assert_eq!(front.get("title"), Some(&json!("Hello")));
        assert_eq!(front.get("draft"), Some(&json!(true)));
        assert_eq!(front.get("count"), Some(&json!(3)));
        assert_eq!(body, "body");
    }

    #[test]
    fn nested_mappings_survive() {
        let (front, _) = parse("---\nauthor:\n  name: Ada\n---\n").unwrap();
        assert_eq!(front.get("author"), Some(&json!({"name": "Ada"})));
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let err = parse("---\ntitle: Hello\nno closing line").unwrap_err();
        assert!(matches!(err, FrontMatterError::Unterminated));
    }

    #[test]
    fn empty_block_means_empty_mapping() {
        let (front, body) = parse("---\n\n---\nbody").unwrap();
        assert!(front.is_empty());
        assert_eq!(body, "body");
    }

    #[test]
    fn scalar_block_is_rejected() {
        let err = parse("---\njust a string\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::NotAMapping));
    }

    #[test]
    fn delimiter_must_open_the_file() {
        let (front, body) = parse("\n---\ntitle: x\n---\n").unwrap();
        assert!(front.is_empty());
        assert!(body.starts_with('\n'));
    }

    #[test]
    fn bad_yaml_is_an_error() {
        let err = parse("---\ntitle: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));
    }
}
