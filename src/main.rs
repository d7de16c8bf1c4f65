use clap::{Parser, Subcommand};
use simple_notes::{assets, compile};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-notes")]
#[command(about = "Static site generator for markdown note collections")]
#[command(long_about = "\
Static site generator for markdown note collections

Your filesystem is the data source. Every directory becomes a listing page,
every markdown file becomes a note page, and two HTML templates decide what
the site looks like.

Layout:

  notes/                         # Source tree (--source)
  ├── hello.md                   # Note with optional YAML front matter
  ├── .scratch.md                # Hidden = never compiled or linked
  └── work/                      # Subdirectory = nested listing page
      └── plan.md
  templates/
  ├── index.html                 # Listing template (needs a #listing element)
  └── note.html                  # Note template (.note-title / .note-content)
  static/                        # Mirrored into the output as-is

Template directives:

  <x-if condition=\"expr\">...</x-if>   conditional block
  <x-var name=\"expr\"></x-var>         interpolated value
  x-href=\"expr\" (any x- attribute)    computed attribute

Expressions see the note's front matter plus static_path, and on listing
pages title / is_top / static_path. Helpers: defined(name), join(parts...).")]
#[command(version = version_string())]
struct Cli {
    /// Notes source directory
    #[arg(long, default_value = "notes", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "public", global = true)]
    output: PathBuf,

    /// Directory containing index.html and note.html
    #[arg(long, default_value = "templates", global = true)]
    templates: PathBuf,

    /// Static asset directory mirrored beside the generated pages
    #[arg(long, default_value = "static", global = true)]
    static_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile the note tree and mirror static assets
    Build,
    /// Validate templates and scan the source tree without writing output
    Check,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let static_name = cli
        .static_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "static".to_string());

    match cli.command {
        Command::Build => {
            let templates = compile::Templates::load(&cli.templates)?;
            let ctx = compile::Context::root(&cli.source, &cli.output, &static_name);

            println!(
                "==> Compiling {} -> {}",
                cli.source.display(),
                cli.output.display()
            );
            let stats = compile::compile_site(&templates, &ctx)?;

            println!("==> Copying static assets");
            let copied = assets::copy_assets(&cli.static_dir, &cli.output.join(&static_name))?;

            println!(
                "==> Done: {} notes, {} directories, {} skipped, {} assets",
                stats.notes, stats.directories, stats.skipped, copied
            );
        }
        Command::Check => {
            println!("==> Checking templates in {}", cli.templates.display());
            let templates = compile::Templates::load(&cli.templates)?;
            compile::check_templates(&templates)?;

            println!("==> Scanning {}", cli.source.display());
            let stats = compile::scan_source(&cli.source)?;
            println!(
                "==> Would compile {} notes in {} directories ({} entries skipped)",
                stats.notes, stats.directories, stats.skipped
            );
        }
    }

    Ok(())
}
