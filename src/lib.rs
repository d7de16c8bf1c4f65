//! # Simple Notes
//!
//! A minimal static site generator for markdown note collections.
//! Your filesystem is the data source: directories become listing pages,
//! markdown files become note pages, and two HTML templates decide what
//! everything looks like.
//!
//! # Architecture
//!
//! One recursive pass over the notes tree produces the whole site:
//!
//! ```text
//! notes/                 templates/              public/
//! ├── hello.md      +    ├── index.html    →     ├── index.html
//! └── work/              └── note.html           ├── hello.html
//!     └── plan.md                                └── work/
//!                                                    ├── index.html
//!                                                    └── plan.html
//! ```
//!
//! Every directory gets an `index.html` (from the index template, one link
//! per child), every `.md` file becomes an `.html` page (from the note
//! template), and a static asset directory is mirrored in beside the
//! generated pages. There is no intermediate state: each run is a full
//! rebuild.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`compile`] | Recursive walk, listing construction, note compilation, path bookkeeping |
//! | [`template`] | Three-pass directive resolution over template markup |
//! | [`expr`] | The closed expression grammar behind every directive |
//! | [`frontmatter`] | Leading `---`-delimited YAML block extraction |
//! | [`dom`] | Shared HTML rewrite operations (`lol_html` plumbing) |
//! | [`assets`] | Static directory mirroring |
//!
//! # Design Decisions
//!
//! ## Runtime Templates Over Compile-Time HTML
//!
//! Templates are plain HTML files read at startup, carrying a three-part
//! directive vocabulary: `<x-if condition="...">` blocks, `x-`-prefixed
//! dynamic attributes, and `<x-var name="...">` references. Users restyle
//! their site by editing HTML, not by recompiling the binary. The price is
//! runtime failure instead of compile-time checking, which is why
//! expansion errors carry the offending expression and the full scope.
//!
//! ## A Closed Expression Grammar
//!
//! Directive expressions are evaluated by a purpose-built evaluator with a
//! fixed operator set and a whitelist of two host helpers, not by a
//! scripting engine. Templates are trusted input (they live in your repo,
//! next to your notes), but the evaluator still cannot reach anything the
//! whitelist doesn't name.
//!
//! ## Streaming Rewrites as the Document Model
//!
//! All HTML surgery goes through `lol_html`, a streaming rewriter: the
//! directive passes, the listing injection, and the title and content
//! replacement are all rewrites. Bytes the rewriter doesn't touch pass
//! through verbatim, so expanding a directive-free page is the identity
//! function and template authors' formatting survives compilation.
//!
//! ## Explicit Recursion Context
//!
//! Directory depth, the relative path back to shared static assets, and
//! the source/target pair travel down the recursion as one immutable
//! [`compile::Context`] value. The static path gains a `../` segment per
//! level; nothing is recomputed ad hoc at call sites.

pub mod assets;
pub mod compile;
pub mod dom;
pub mod expr;
pub mod frontmatter;
pub mod template;
