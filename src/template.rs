//! Template expansion: the three-pass directive resolver.
//!
//! A template is plain HTML carrying a small closed vocabulary of
//! directives:
//!
//! - `<x-if condition="expr">...</x-if>` is a conditional block. Truthy
//!   condition: the inner markup is spliced in place of the element. Falsy
//!   or missing condition: the whole block is dropped. The element itself
//!   never reaches the output.
//! - `x-<attr>="expr"` on any element is a dynamic attribute. The
//!   expression result is bound under the unprefixed name and the `x-`
//!   attribute is removed.
//! - `<x-var name="expr"></x-var>` is a variable reference, replaced by
//!   the stringified result (`undefined` for `null`). A reference without
//!   a `name` is dropped without output.
//!
//! ## Pass order
//!
//! The passes run in a fixed order (conditionals, then dynamic
//! attributes, then variables) because later passes consume markup kept
//! by earlier ones: a dynamic attribute or variable inside a truthy
//! conditional only exists once the conditional pass has spliced it in.
//! Each pass is one full [`lol_html`] rewrite of the previous pass's
//! output.
//!
//! Successful output contains no directive markers at all, so re-expanding
//! it (with any scope) is byte-for-byte identity: the rewriter emits
//! unmatched input verbatim.
//!
//! ## Failure semantics
//!
//! Any [`EvalError`](crate::expr::EvalError) aborts the expansion; no
//! partially expanded text is ever returned. Note that handlers run for
//! content nested inside a removed conditional too, so an invalid
//! expression fails the expansion even in a branch that would have been
//! dropped.

use crate::expr::{self, Scope};
use lol_html::errors::RewritingError;
use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element, rewrite_str};
use thiserror::Error;

/// Reserved tag for conditional blocks.
pub const CONDITIONAL_TAG: &str = "x-if";
/// Reserved tag for variable references.
pub const VARIABLE_TAG: &str = "x-var";
/// Reserved prefix for dynamically computed attributes.
pub const DYNAMIC_ATTRIBUTE_PREFIX: &str = "x-";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error(transparent)]
    Eval(#[from] expr::EvalError),
    #[error("template rewrite error: {0}")]
    Rewrite(String),
}

/// Expand `template` against `scope`: resolve all directives and return the
/// serialized result.
pub fn expand(template: &str, scope: &Scope) -> Result<String, TemplateError> {
    let conditionals = apply_conditionals(template, scope)?;
    let attributes = apply_dynamic_attributes(&conditionals, scope)?;
    apply_variables(&attributes, scope)
}

/// Pass 1: resolve `<x-if>` blocks.
fn apply_conditionals(html: &str, scope: &Scope) -> Result<String, TemplateError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(CONDITIONAL_TAG, |el| {
                match el.get_attribute("condition") {
                    Some(condition) => {
                        let value = expr::evaluate(&condition, scope)?;
                        if expr::truthy(&value) {
                            el.remove_and_keep_content();
                        } else {
                            el.remove();
                        }
                    }
                    // Missing condition reads as false: drop the block,
                    // don't fail the expansion.
                    None => el.remove(),
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(pass_error)
}

/// Pass 2: resolve `x-`-prefixed attributes on every element.
fn apply_dynamic_attributes(html: &str, scope: &Scope) -> Result<String, TemplateError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", |el| {
                let dynamic: Vec<(String, String)> = el
                    .attributes()
                    .iter()
                    .filter(|a| a.name().starts_with(DYNAMIC_ATTRIBUTE_PREFIX))
                    .map(|a| (a.name(), a.value()))
                    .collect();
                for (name, expression) in dynamic {
                    let value = expr::evaluate(&expression, scope)?;
                    let base = &name[DYNAMIC_ATTRIBUTE_PREFIX.len()..];
                    el.set_attribute(base, &expr::to_text(&value))?;
                    el.remove_attribute(&name);
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(pass_error)
}

/// Pass 3: resolve `<x-var>` references.
fn apply_variables(html: &str, scope: &Scope) -> Result<String, TemplateError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(VARIABLE_TAG, |el| {
                if let Some(name) = el.get_attribute("name") {
                    let value = expr::evaluate(&name, scope)?;
                    el.before(&expr::to_text(&value), ContentType::Text);
                }
                el.remove();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(pass_error)
}

/// Recover a typed [`EvalError`] from the boxed handler error so callers
/// keep the full expression/scope diagnostics.
fn pass_error(err: RewritingError) -> TemplateError {
    match err {
        RewritingError::ContentHandlerError(source) => {
            match source.downcast::<expr::EvalError>() {
                Ok(eval) => TemplateError::Eval(*eval),
                Err(other) => TemplateError::Rewrite(other.to_string()),
            }
        }
        other => TemplateError::Rewrite(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn scope(pairs: &[(&str, Value)]) -> Scope {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn truthy_conditional_splices_content_once() {
        let s = scope(&[("show", json!(true))]);
        let out = expand("<p>a</p><x-if condition=\"show\"><b>kept</b></x-if><p>z</p>", &s).unwrap();
        assert_eq!(out, "<p>a</p><b>kept</b><p>z</p>");
    }

    #[test]
    fn falsy_conditional_drops_content() {
        let s = scope(&[("show", json!(false))]);
        let out = expand("<x-if condition=\"show\"><b>gone</b></x-if>", &s).unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn missing_condition_reads_as_false() {
        let out = expand("<x-if><b>gone</b></x-if>ok", &Scope::new()).unwrap();
        assert_eq!(out, "ok");
    }

    #[test]
    fn nested_conditionals_resolve() {
        let s = scope(&[("outer", json!(true)), ("inner", json!(false))]);
        let html = "<x-if condition=\"outer\">a<x-if condition=\"inner\">b</x-if>c</x-if>";
        assert_eq!(expand(html, &s).unwrap(), "ac");

        let s = scope(&[("outer", json!(true)), ("inner", json!(true))]);
        assert_eq!(expand(html, &s).unwrap(), "abc");
    }

    #[test]
    fn directives_inside_kept_conditionals_resolve() {
        let s = scope(&[("show", json!(true)), ("name", json!("Ada"))]);
        let html = "<x-if condition=\"show\"><x-var name=\"name\"></x-var></x-if>";
        assert_eq!(expand(html, &s).unwrap(), "Ada");
    }

    #[test]
    fn dynamic_attribute_resolves_with_empty_scope() {
        let out = expand("<a x-href=\"'a' + 'b'\">link</a>", &Scope::new()).unwrap();
        assert_eq!(out, "<a href=\"ab\">link</a>");
    }

    #[test]
    fn multiple_dynamic_attributes_resolve_independently() {
        let s = scope(&[("static_path", json!("../static"))]);
        let out = expand(
            "<link x-href=\"join(static_path, 'style.css')\" x-title=\"'main'\" rel=\"stylesheet\">",
            &s,
        )
        .unwrap();
        assert!(out.contains("href=\"../static/style.css\""));
        assert!(out.contains("title=\"main\""));
        assert!(out.contains("rel=\"stylesheet\""));
        assert!(!out.contains("x-href"));
        assert!(!out.contains("x-title"));
    }

    #[test]
    fn variable_reference_substitutes_value() {
        let s = scope(&[("x", json!(42))]);
        let out = expand("<p><x-var name=\"x\"></x-var></p>", &s).unwrap();
        assert_eq!(out, "<p>42</p>");
    }

    #[test]
    fn missing_variable_fails_expansion() {
        let err = expand("<x-var name=\"x\"></x-var>", &Scope::new()).unwrap_err();
        assert!(matches!(err, TemplateError::Eval(_)));
    }

    #[test]
    fn null_variable_renders_undefined() {
        let s = scope(&[("x", Value::Null)]);
        let out = expand("<x-var name=\"x\"></x-var>", &s).unwrap();
        assert_eq!(out, "undefined");
    }

    #[test]
    fn nameless_variable_reference_is_dropped() {
        let out = expand("a<x-var></x-var>b", &Scope::new()).unwrap();
        assert_eq!(out, "ab");
    }

    #[test]
    fn variable_text_is_escaped() {
        let s = scope(&[("x", json!("<b>"))]);
        let out = expand("<x-var name=\"x\"></x-var>", &s).unwrap();
        assert_eq!(out, "&lt;b&gt;");
    }

    #[test]
    fn expansion_is_idempotent_on_its_own_output() {
        let s = scope(&[("title", json!("Hi")), ("show", json!(true))]);
        let html = "<x-if condition=\"show\"><h1><x-var name=\"title\"></x-var></h1></x-if>\
                    <a x-href=\"'p' + '.html'\">p</a>";
        let once = expand(html, &s).unwrap();
        // Output has no directive markers, so a second expansion with a
        // completely unrelated scope must be a no-op.
        let twice = expand(&once, &Scope::new()).unwrap();
        assert_eq!(once, twice);
        assert!(!once.contains("x-if"));
        assert!(!once.contains("x-var"));
        assert!(!once.contains("x-href"));
    }

    #[test]
    fn plain_html_passes_through_unchanged() {
        let html = "<!DOCTYPE html><html><head><title>t</title></head><body><p>x</p></body></html>";
        assert_eq!(expand(html, &Scope::new()).unwrap(), html);
    }

    #[test]
    fn eval_errors_keep_expression_diagnostics() {
        let err = expand("<x-if condition=\"1 +\">x</x-if>", &Scope::new()).unwrap_err();
        match err {
            TemplateError::Eval(e) => assert_eq!(e.expression, "1 +"),
            other => panic!("expected eval error, got {other:?}"),
        }
    }
}
