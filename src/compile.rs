//! Recursive site compilation.
//!
//! Walks the notes tree depth-first and mirrors it into the output
//! directory: every Markdown file becomes an `.html` page rendered through
//! the note template, and every directory gets an `index.html` rendered
//! through the index template, listing its children.
//!
//! ## Traversal
//!
//! One recursion level per directory, strictly sequential. Each level owns
//! an immutable [`Context`] (depth, relative static-asset path, and the
//! source/target directory pair) and derives its children's contexts from
//! it rather than recomputing paths at call sites. The static path gains
//! one `../` segment per level so nested pages reference the shared asset
//! directory correctly.
//!
//! Directory entries are processed in lexicographic filename order, so
//! listing pages come out identical across platforms and runs.
//!
//! ## Per-directory state machine
//!
//! 1. Ensure the output directory exists (warn if non-empty, fail the run
//!    if it is not a directory).
//! 2. Expand the index template with the listing scope
//!    (`title`, `is_top`, `static_path`).
//! 3. Process children in order: hidden entries are skipped and logged,
//!    subdirectories recurse, non-Markdown files are skipped and logged,
//!    Markdown files are compiled. Each kept child appends one link to the
//!    listing.
//! 4. Write `index.html` last, after every child has been processed.
//!
//! ## Failure semantics
//!
//! An output path colliding with a non-directory aborts the whole run.
//! Expansion and front-matter failures abort the page being produced and
//! propagate; a half-expanded page is never written. Everything else
//! (hidden entries, non-Markdown files) is skipped with a diagnostic.

use crate::dom;
use crate::expr::Scope;
use crate::frontmatter::{self, FrontMatterError};
use crate::template::{self, TemplateError};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd, html as md_html};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Selector for the index-template element that accumulates child links.
pub const LISTING_CONTAINER: &str = "#listing";
/// Selector for note-template elements receiving the derived title.
pub const TITLE_MARKER: &str = ".note-title";
/// Selector for note-template elements receiving the converted body.
pub const CONTENT_MARKER: &str = ".note-content";

const MARKDOWN_EXTENSION: &str = "md";

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("output path exists and is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Front matter error in {0}: {1}")]
    FrontMatter(PathBuf, FrontMatterError),
    #[error("Rewrite error: {0}")]
    Dom(#[from] dom::DomError),
}

/// The two template sources, read once at startup and borrowed immutably
/// by every expansion.
pub struct Templates {
    pub index: String,
    pub note: String,
}

impl Templates {
    /// Load `index.html` and `note.html` from the template directory.
    pub fn load(dir: &Path) -> Result<Self, CompileError> {
        Ok(Self {
            index: fs::read_to_string(dir.join("index.html"))?,
            note: fs::read_to_string(dir.join("note.html"))?,
        })
    }
}

/// Immutable recursion context for one directory level.
#[derive(Debug, Clone)]
pub struct Context {
    /// 0 at the notes root, +1 per directory level.
    pub depth: usize,
    /// Relative path from pages at this level back to the shared static
    /// directory, `/`-separated.
    pub static_path: String,
    /// Source directory being compiled.
    pub source: PathBuf,
    /// Output directory being written.
    pub target: PathBuf,
}

impl Context {
    pub fn root(source: &Path, target: &Path, static_path: &str) -> Self {
        Self {
            depth: 0,
            static_path: static_path.to_string(),
            source: source.to_path_buf(),
            target: target.to_path_buf(),
        }
    }

    /// Context for the child directory `name`: one level deeper, one more
    /// `../` segment on the static path.
    pub fn child(&self, name: &str) -> Self {
        Self {
            depth: self.depth + 1,
            static_path: format!("../{}", self.static_path),
            source: self.source.join(name),
            target: self.target.join(name),
        }
    }
}

/// Counters reported after a build or check run.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub notes: usize,
    pub directories: usize,
    pub skipped: usize,
}

/// Compile the whole tree rooted at `ctx`.
pub fn compile_site(templates: &Templates, ctx: &Context) -> Result<Stats, CompileError> {
    let mut stats = Stats::default();
    process_directory(templates, ctx, &mut stats)?;
    Ok(stats)
}

fn process_directory(
    templates: &Templates,
    ctx: &Context,
    stats: &mut Stats,
) -> Result<(), CompileError> {
    ensure_output_directory(&ctx.target)?;

    let skeleton = template::expand(&templates.index, &listing_scope(ctx))?;
    let mut listing: Vec<String> = Vec::new();

    for path in sorted_entries(&ctx.source)? {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        if name.starts_with('.') {
            println!("Skipping hidden entry: {name}");
            stats.skipped += 1;
            continue;
        }

        if path.is_dir() {
            // Link to the child directory; its own index.html is written
            // by the recursive call below, before our index.html is.
            let label = dom::escape_text(&name);
            listing.push(format!("<li><a href=\"{label}/\">{label}/</a></li>"));
            process_directory(templates, &ctx.child(&name), stats)?;
            stats.directories += 1;
            continue;
        }

        if !has_markdown_extension(&path) {
            println!("Skipping non-markdown file: {name}");
            stats.skipped += 1;
            continue;
        }

        println!("Compiling {} ...", path.display());
        let title = compile_note(templates, ctx, &path)?;
        let stem = path.file_stem().unwrap_or_default().to_string_lossy();
        listing.push(format!(
            "<li><a href=\"{}.html\">{}</a></li>",
            dom::escape_text(&stem),
            dom::escape_text(&title)
        ));
        stats.notes += 1;
    }

    let page = dom::set_inner_html(&skeleton, LISTING_CONTAINER, &listing.concat())?;
    fs::write(ctx.target.join("index.html"), page)?;
    Ok(())
}

/// Compile one Markdown note into an HTML page; returns the derived title
/// for the parent listing.
fn compile_note(templates: &Templates, ctx: &Context, path: &Path) -> Result<String, CompileError> {
    let raw = fs::read_to_string(path)?;
    let (front, body) = frontmatter::parse(&raw)
        .map_err(|e| CompileError::FrontMatter(path.to_path_buf(), e))?;

    let content = render_markdown(body);
    let title = derive_title(&front, body, path);

    let mut scope = front;
    scope.insert(
        "static_path".to_string(),
        Value::String(ctx.static_path.clone()),
    );

    let expanded = template::expand(&templates.note, &scope)?;
    let page = dom::set_inner_html(&expanded, TITLE_MARKER, &dom::escape_text(&title))?;
    let page = dom::set_inner_html(&page, CONTENT_MARKER, &content)?;

    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    fs::write(ctx.target.join(format!("{stem}.html")), page)?;
    Ok(title)
}

/// Scope for a directory's listing page.
fn listing_scope(ctx: &Context) -> Scope {
    let title = ctx
        .source
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let mut scope = Scope::new();
    scope.insert("title".to_string(), Value::String(title));
    scope.insert("is_top".to_string(), Value::Bool(ctx.depth == 0));
    scope.insert(
        "static_path".to_string(),
        Value::String(ctx.static_path.clone()),
    );
    scope
}

/// Title precedence: front-matter `title` string, then the body's first
/// level-1 heading, then the file stem with its first character
/// upper-cased.
fn derive_title(front: &Scope, body: &str, path: &Path) -> String {
    if let Some(Value::String(title)) = front.get("title") {
        return title.clone();
    }
    if let Some(heading) = first_heading(body) {
        return heading;
    }
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Text of the first level-1 heading in the Markdown body, if any.
fn first_heading(markdown: &str) -> Option<String> {
    let mut in_heading = false;
    let mut text = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_heading = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                return Some(trimmed.to_string());
            }
            Event::Text(t) | Event::Code(t) if in_heading => text.push_str(&t),
            _ => {}
        }
    }
    None
}

fn render_markdown(body: &str) -> String {
    let parser = Parser::new(body);
    let mut html = String::new();
    md_html::push_html(&mut html, parser);
    html
}

fn has_markdown_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(MARKDOWN_EXTENSION))
        .unwrap_or(false)
}

/// Directory entries sorted lexicographically by filename, so the listing
/// order is deterministic regardless of what the filesystem returns.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, CompileError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();
    Ok(entries)
}

/// Create the output directory, or accept an existing one with a warning
/// when it already has content. An existing non-directory is fatal.
fn ensure_output_directory(target: &Path) -> Result<(), CompileError> {
    if !target.exists() {
        fs::create_dir_all(target)?;
        return Ok(());
    }
    if !target.is_dir() {
        return Err(CompileError::NotADirectory(target.to_path_buf()));
    }
    if fs::read_dir(target)?.next().is_some() {
        eprintln!("Warning: target is not empty: {}", target.display());
    }
    Ok(())
}

/// Dry traversal for `check`: counts what a build would process without
/// writing anything.
pub fn scan_source(source: &Path) -> Result<Stats, CompileError> {
    let mut stats = Stats::default();
    scan_directory(source, &mut stats)?;
    Ok(stats)
}

fn scan_directory(dir: &Path, stats: &mut Stats) -> Result<(), CompileError> {
    for path in sorted_entries(dir)? {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        if name.starts_with('.') {
            stats.skipped += 1;
        } else if path.is_dir() {
            stats.directories += 1;
            scan_directory(&path, stats)?;
        } else if has_markdown_extension(&path) {
            stats.notes += 1;
        } else {
            stats.skipped += 1;
        }
    }
    Ok(())
}

/// Probe-expand both templates with representative scopes so `check`
/// catches template and expression errors before a build.
pub fn check_templates(templates: &Templates) -> Result<(), CompileError> {
    let probe = Context::root(Path::new("probe"), Path::new("probe"), "static");
    template::expand(&templates.index, &listing_scope(&probe))?;

    let mut note_scope = Scope::new();
    note_scope.insert("title".to_string(), Value::String("probe".to_string()));
    note_scope.insert(
        "static_path".to_string(),
        Value::String("static".to_string()),
    );
    template::expand(&templates.note, &note_scope)?;
    Ok(())
}
