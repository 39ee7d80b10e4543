//! Template file discovery.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{io_err, TemplateError};

/// Lists files under a root whose file name matches a pattern.
pub trait TemplateLister {
    /// Absolute paths of matching files, in the lister's native order.
    fn list_files(
        &self,
        root: &Path,
        pattern: &Regex,
        recursive: bool,
    ) -> Result<Vec<PathBuf>, TemplateError>;
}

/// Walks the real filesystem.
///
/// Native order: directories sorted by path text, then file names sorted
/// within each directory. The pattern is searched (not anchored) in the file
/// name only.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl TemplateLister for FsLister {
    fn list_files(
        &self,
        root: &Path,
        pattern: &Regex,
        recursive: bool,
    ) -> Result<Vec<PathBuf>, TemplateError> {
        let dirs = if recursive {
            collect_dirs(root)?
        } else {
            vec![root.to_path_buf()]
        };

        let mut out = Vec::new();
        for dir in dirs {
            let mut files = Vec::new();
            let entries = std::fs::read_dir(&dir).map_err(|e| io_err(&dir, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| io_err(&dir, e))?;
                let path = entry.path();
                if !is_file(&path) {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                if pattern.is_match(&name) {
                    files.push((name, path));
                }
            }
            files.sort_by(|a, b| a.0.cmp(&b.0));
            out.extend(files.into_iter().map(|(_, path)| path));
        }
        tracing::debug!(root = %root.display(), count = out.len(), "listed template files");
        Ok(out)
    }
}

/// Regular file, or a symlink to one. Unreadable entries are skipped.
fn is_file(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "skipping unreadable template entry");
            false
        }
    }
}

fn collect_dirs(root: &Path) -> Result<Vec<PathBuf>, TemplateError> {
    let mut dirs = vec![root.to_path_buf()];
    let mut cursor = 0;
    while cursor < dirs.len() {
        let current = dirs[cursor].clone();
        cursor += 1;
        let entries = std::fs::read_dir(&current).map_err(|e| io_err(&current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&current, e))?;
            // Symlinked directories are not descended into.
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                dirs.push(entry.path());
            }
        }
    }
    dirs.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
    dirs.dedup();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn html() -> Regex {
        Regex::new(r".*\.html$").expect("regex")
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, "<html></html>").expect("write");
    }

    #[test]
    fn recursive_listing_is_sorted_by_directory_then_name() {
        let root = TempDir::new().expect("tempdir");
        touch(root.path(), "layouts/b.html");
        touch(root.path(), "layouts/a.html");
        touch(root.path(), "base.html");
        touch(root.path(), "admin/change_form.html");
        touch(root.path(), "layouts/notes.txt");

        let files = FsLister.list_files(root.path(), &html(), true).expect("list");
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            rel,
            vec![
                "base.html",
                "admin/change_form.html",
                "layouts/a.html",
                "layouts/b.html",
            ]
        );
    }

    #[test]
    fn non_recursive_listing_skips_subdirectories() {
        let root = TempDir::new().expect("tempdir");
        touch(root.path(), "base.html");
        touch(root.path(), "layouts/a.html");

        let files = FsLister.list_files(root.path(), &html(), false).expect("list");
        assert_eq!(files, vec![root.path().join("base.html")]);
    }

    #[test]
    fn directories_named_like_templates_are_ignored() {
        let root = TempDir::new().expect("tempdir");
        fs::create_dir_all(root.path().join("odd.html")).expect("mkdir");
        let files = FsLister.list_files(root.path(), &html(), true).expect("list");
        assert!(files.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_skipped() {
        let root = TempDir::new().expect("tempdir");
        touch(root.path(), "layouts/a.html");
        std::os::unix::fs::symlink(
            root.path().join("gone/target.html"),
            root.path().join("layouts/old.html"),
        )
        .expect("symlink");

        let files = FsLister.list_files(root.path(), &html(), true).expect("list");
        assert_eq!(files, vec![root.path().join("layouts/a.html")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_a_file_is_listed() {
        let root = TempDir::new().expect("tempdir");
        touch(root.path(), "real/a.html");
        std::os::unix::fs::symlink(root.path().join("real/a.html"), root.path().join("b.html"))
            .expect("symlink");

        let files = FsLister.list_files(root.path(), &html(), false).expect("list");
        assert_eq!(files, vec![root.path().join("b.html")]);
    }
}
