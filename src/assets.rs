//! Static asset mirroring.
//!
//! Copies the shared static directory (stylesheets, fonts, images) into
//! the output tree beside the generated pages, preserving relative
//! structure. Hidden entries are pruned and logged; existing destination
//! files are overwritten without ceremony, matching the compiler's
//! wholesale-overwrite policy.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("target path exists and is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Mirror `source` into `target`; returns the number of files copied.
pub fn copy_assets(source: &Path, target: &Path) -> Result<usize, AssetError> {
    let mut copied = 0;

    let walker = WalkDir::new(source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() > 0 && is_hidden(entry) {
                println!("Skipping hidden entry: {}", entry.path().display());
                false
            } else {
                true
            }
        });

    for entry in walker {
        let entry = entry?;
        // Paths come from a walk rooted at `source`, so the prefix strip
        // cannot fail.
        let relative = entry.path().strip_prefix(source).unwrap();
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            ensure_directory(&destination)?;
        } else {
            fs::copy(entry.path(), &destination)?;
            copied += 1;
        }
    }

    Ok(copied)
}

fn ensure_directory(path: &Path) -> Result<(), AssetError> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(AssetError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn mirrors_nested_structure() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("style.css"), "body {}").unwrap();
        fs::create_dir(src.path().join("fonts")).unwrap();
        fs::write(src.path().join("fonts/mono.woff2"), "font").unwrap();

        let dst = TempDir::new().unwrap();
        let target = dst.path().join("static");
        let copied = copy_assets(src.path(), &target).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(target.join("style.css")).unwrap(), "body {}");
        assert!(target.join("fonts/mono.woff2").exists());
    }

    #[test]
    fn hidden_entries_are_pruned() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join(".DS_Store"), "junk").unwrap();
        fs::create_dir(src.path().join(".git")).unwrap();
        fs::write(src.path().join(".git/config"), "junk").unwrap();
        fs::write(src.path().join("app.js"), "js").unwrap();

        let dst = TempDir::new().unwrap();
        let target = dst.path().join("static");
        let copied = copy_assets(src.path(), &target).unwrap();

        assert_eq!(copied, 1);
        assert!(!target.join(".DS_Store").exists());
        assert!(!target.join(".git").exists());
    }

    #[test]
    fn existing_destination_files_are_overwritten() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("style.css"), "new").unwrap();

        let dst = TempDir::new().unwrap();
        let target = dst.path().join("static");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("style.css"), "old").unwrap();

        copy_assets(src.path(), &target).unwrap();
        assert_eq!(fs::read_to_string(target.join("style.css")).unwrap(), "new");
    }

    #[test]
    fn target_colliding_with_file_is_fatal() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("style.css"), "css").unwrap();

        let dst = TempDir::new().unwrap();
        let target = dst.path().join("static");
        fs::write(&target, "a file").unwrap();

        let err = copy_assets(src.path(), &target).unwrap_err();
        assert!(matches!(err, AssetError::NotADirectory(_)));
    }
}

