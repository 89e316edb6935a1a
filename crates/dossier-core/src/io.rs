use crate::error::{Result, SiteError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
///
/// Every failure is reported as [`SiteError::Write`] so callers can treat an
/// unwritable output tree as fatal.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let wrap = |source: std::io::Error| SiteError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir).map_err(wrap)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(wrap)?;
    tmp.write_all(data).map_err(wrap)?;
    tmp.persist(path).map_err(|e| wrap(e.error))?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| SiteError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove `path` (if present) and recreate it empty.
pub fn reset_dir(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|source| SiteError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    ensure_dir(path)
}

/// Copy `src` to `dest`, creating parents.
pub fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    let data = std::fs::read(src)?;
    atomic_write(dest, &data)
}

/// Modification time, or `None` when the file does not exist.
pub fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Sorted entries of `dir` accepted by `keep`. A missing directory is empty.
pub fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if keep(&path) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Sorted `*.md` files directly inside `dir`.
pub fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    sorted_entries(dir, |p| {
        p.is_file() && p.extension().is_some_and(|e| e == "md")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c/page.html");
        atomic_write(&path, b"data").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "data");
    }

    #[test]
    fn atomic_write_into_file_parent_is_write_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let err = atomic_write(&blocker.join("page.html"), b"data").unwrap_err();
        assert!(matches!(err, SiteError::Write { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn reset_dir_clears_previous_output() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("site");
        atomic_write(&out.join("stale.html"), b"old").unwrap();
        reset_dir(&out).unwrap();
        assert!(out.is_dir());
        assert!(!out.join("stale.html").exists());
    }

    #[test]
    fn markdown_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.md"), "b").unwrap();
        std::fs::write(dir.path().join("a.md"), "a").unwrap();
        std::fs::write(dir.path().join("c.txt"), "c").unwrap();
        std::fs::create_dir(dir.path().join("d.md")).unwrap();
        let files = markdown_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }

    #[test]
    fn missing_dir_has_no_entries() {
        let dir = TempDir::new().unwrap();
        assert!(markdown_files(&dir.path().join("nope")).unwrap().is_empty());
        assert!(modified(&dir.path().join("nope.md")).is_none());
    }
}
