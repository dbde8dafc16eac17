//! Path sandbox
//!
//! Maps untrusted, `/`-separated relative paths onto absolute paths below a
//! single root directory, and maps absolute paths back to the relative form
//! returned to clients.
//!
//! Containment is checked component by component against the canonical root,
//! so `/data2/x` is never mistaken for a child of `/data`. Normalisation is
//! lexical: `.` is dropped, `..` pops one component, symlinks are not followed.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use super::FsError;

/// Characters rejected in a single entry name regardless of platform.
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '/', '\\'];

#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
    case_sensitive: bool,
}

impl Sandbox {
    /// Open a sandbox on `root`, creating the directory if it is missing.
    pub fn new(root: impl AsRef<Path>, case_sensitive: bool) -> Result<Self, FsError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let root = std::fs::canonicalize(root)?;

        Ok(Self {
            root,
            case_sensitive,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Resolve a client path to an absolute path inside the root.
    ///
    /// Empty input (or input made only of separators) is the root itself.
    /// Fails with [`FsError::AccessDenied`] if the normalised result leaves
    /// the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, FsError> {
        if relative.contains('\0') {
            return Err(FsError::InvalidInput("Path contains invalid null byte".into()));
        }

        // A leading separator must not turn the input into an absolute path.
        let trimmed = relative.trim_start_matches(is_separator);
        if trimmed.is_empty() {
            return Ok(self.root.clone());
        }

        let mut joined = self.root.clone();
        for segment in trimmed.split(is_separator).filter(|s| !s.is_empty()) {
            joined.push(segment);
        }

        let resolved = normalize(&joined);
        if !self.contains_exact(&resolved) {
            tracing::warn!(path = %relative, "rejected path outside root");
            return Err(FsError::AccessDenied(
                "Access to paths outside the root is denied.".into(),
            ));
        }
        Ok(resolved)
    }

    /// Root-relative, `/`-separated form of an absolute path. The root itself
    /// maps to the empty string. Compared in the configured case mode.
    pub fn relativize(&self, absolute: &Path) -> Result<String, FsError> {
        let rest = self.strip_root(absolute, self.case_sensitive).ok_or_else(|| {
            FsError::AccessDenied("Access to paths outside the root is denied.".into())
        })?;

        Ok(rest
            .iter()
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }

    /// Byte-exact containment. Paths built on top of `self.root` must keep its
    /// spelling; a case-folded match may name a sibling directory.
    fn contains_exact(&self, path: &Path) -> bool {
        self.strip_root(path, true).is_some()
    }

    pub fn is_root(&self, path: &Path) -> bool {
        matches!(self.strip_root(path, true), Some(rest) if rest.is_empty())
    }

    /// Fails with [`FsError::AccessDenied`] unless `path`, built from a
    /// resolved path, is still inside the root.
    pub fn ensure_contained(&self, path: &Path) -> Result<(), FsError> {
        if self.contains_exact(path) {
            Ok(())
        } else {
            tracing::warn!(path = %path.display(), "rejected path outside root");
            Err(FsError::AccessDenied(
                "Access to paths outside the root is denied.".into(),
            ))
        }
    }

    /// Components of `path` after the root, or `None` if `path` is not inside it.
    fn strip_root<'a>(&self, path: &'a Path, case_sensitive: bool) -> Option<Vec<&'a OsStr>> {
        let mut candidate = path.components();
        for root_part in self.root.components() {
            let part = candidate.next()?;
            if !same_component(root_part.as_os_str(), part.as_os_str(), case_sensitive) {
                return None;
            }
        }

        let rest: Vec<&OsStr> = candidate.map(|c| c.as_os_str()).collect();
        if rest.iter().any(|part| *part == OsStr::new("..")) {
            return None;
        }
        Some(rest)
    }
}

fn same_component(a: &OsStr, b: &OsStr, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
    }
}

/// Logical parent of a client path, for breadcrumb navigation.
///
/// `""` has no parent, a single segment has the root (`""`) as parent.
/// Pure string logic; the path need not exist.
pub fn parent_of(relative: &str) -> Option<String> {
    if relative.is_empty() {
        return None;
    }

    let parts: Vec<&str> = relative
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();

    if parts.len() <= 1 {
        return Some(String::new());
    }
    Some(parts[..parts.len() - 1].join("/"))
}

/// Check a single file or folder name supplied by a client.
pub fn validate_entry_name(name: &str) -> Result<(), FsError> {
    if name.trim().is_empty() {
        return Err(FsError::InvalidInput("Name cannot be empty".into()));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(FsError::InvalidInput("Name contains control characters".into()));
    }
    if let Some(c) = name.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(FsError::InvalidInput(format!(
            "Name contains invalid character '{}'",
            c
        )));
    }
    Ok(())
}

/// Lexically normalise `path`: drop `.`, let `..` pop one component.
/// `..` at the filesystem root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn is_separator(c: char) -> bool {
    c == '/' || c == MAIN_SEPARATOR
}
