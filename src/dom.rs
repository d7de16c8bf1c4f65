//! Document-model operations shared by the expander and the compiler.
//!
//! The HTML capability behind the whole crate is [`lol_html`], a streaming
//! rewriter: a "query" is a selector handler and a "mutation" is a rewrite
//! of the input text. This module keeps the rewriter plumbing in one place
//! so the template passes and the compiler work in terms of selectors and
//! content, not rewriter settings.

use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element, rewrite_str};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("HTML rewrite error: {0}")]
    Rewrite(String),
}

/// Replace the inner markup of every element matching `selector` with
/// `content` (raw HTML).
pub fn set_inner_html(html: &str, selector: &str, content: &str) -> Result<String, DomError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(selector, |el| {
                el.set_inner_content(content, ContentType::Html);
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| DomError::Rewrite(e.to_string()))
}

/// Escape text for interpolation into markup built by the compiler
/// (listing links, note titles).
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_inner_content_by_id() {
        let html = r#"<ul id="listing"><li>stale</li></ul>"#;
        let out = set_inner_html(html, "#listing", "<li>fresh</li>").unwrap();
        assert_eq!(out, r#"<ul id="listing"><li>fresh</li></ul>"#);
    }

    #[test]
    fn replaces_every_match_by_class() {
        let html = r#"<h1 class="note-title"></h1><p class="note-title"></p>"#;
        let out = set_inner_html(html, ".note-title", "Hello").unwrap();
        assert_eq!(out, r#"<h1 class="note-title">Hello</h1><p class="note-title">Hello</p>"#);
    }

    #[test]
    fn untouched_markup_passes_through_verbatim() {
        let html = "<!DOCTYPE html><html><body><p>x</p></body></html>";
        let out = set_inner_html(html, "#nothing-matches", "y").unwrap();
        assert_eq!(out, html);
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(escape_text(r#"a < b & "c""#), "a &lt; b &amp; &quot;c&quot;");
    }
}
