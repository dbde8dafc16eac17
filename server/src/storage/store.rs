//! Root store
//!
//! Every operation resolves its input through the [`Sandbox`] before touching
//! the filesystem. Operations are synchronous and keep no state between
//! calls; callers on an async runtime should run them on a blocking thread.

use std::fs::{self, OpenOptions};
use std::io::{self, Read};
use std::path::Path;
use uuid::Uuid;

use super::entry::{extension_of, Deleted, DownloadedFile, OCTET_STREAM};
use super::sandbox::{normalize, validate_entry_name, Sandbox};
use super::FsError;
use crate::config::Config;

/// Upload limits, fixed at startup.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    /// Lower-cased, dot-prefixed. Empty allows every extension.
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024 * 1024,
            allowed_extensions: Vec::new(),
        }
    }
}

/// Filesystem operations confined to one root directory.
#[derive(Debug)]
pub struct RootStore {
    sandbox: Sandbox,
    policy: UploadPolicy,
}

impl RootStore {
    pub fn new(sandbox: Sandbox, policy: UploadPolicy) -> Self {
        Self { sandbox, policy }
    }

    pub fn from_config(config: &Config) -> Result<Self, FsError> {
        let sandbox = Sandbox::new(&config.root_dir, config.case_sensitive_paths)?;
        let policy = UploadPolicy {
            max_bytes: config.max_upload_bytes(),
            allowed_extensions: config.allowed_extensions.clone(),
        };
        Ok(Self::new(sandbox, policy))
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Store `content` as `file_name` inside the directory at `relative`,
    /// replacing any existing file of that name. Returns the bytes written.
    ///
    /// Data goes to a hidden temporary file first and is renamed into place,
    /// so a rejected or failed upload never leaves a partial file under the
    /// final name.
    pub fn upload<R: Read>(
        &self,
        relative: &str,
        file_name: &str,
        mut content: R,
    ) -> Result<u64, FsError> {
        let dir = self.sandbox.resolve(relative)?;
        if !dir.is_dir() {
            return Err(FsError::NotFound("Directory does not exist.".into()));
        }

        let name = upload_name(file_name)?;
        let target = dir.join(name);
        if target.parent() != Some(dir.as_path()) {
            return Err(FsError::InvalidInput("Invalid file name".into()));
        }
        self.sandbox.ensure_contained(&target)?;
        self.check_extension(name)?;

        if target.is_dir() {
            return Err(FsError::InvalidInput(format!(
                "A folder named '{}' already exists",
                name
            )));
        }

        let temp = dir.join(upload_temp_name());
        let written = match write_limited(&temp, &mut content, self.policy.max_bytes) {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&temp);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&temp, &target) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        tracing::info!(path = %target.display(), bytes = written, "stored upload");
        Ok(written)
    }

    /// Read a whole file. Directories are reported as not found.
    pub fn download(&self, relative: &str) -> Result<DownloadedFile, FsError> {
        let path = self.sandbox.resolve(relative)?;
        if !path.is_file() {
            return Err(FsError::NotFound("File not found.".into()));
        }

        let content = fs::read(&path).map_err(|e| not_found_or(e, "File not found."))?;
        // Name from the resolved path, never the client's string
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::debug!(path = %path.display(), bytes = content.len(), "read download");
        Ok(DownloadedFile {
            content,
            mime_type: OCTET_STREAM,
            file_name,
        })
    }

    /// Remove a file, or a folder together with everything below it.
    pub fn delete(&self, relative: &str) -> Result<Deleted, FsError> {
        let path = self.sandbox.resolve(relative)?;
        if self.sandbox.is_root(&path) {
            return Err(FsError::InvalidInput(
                "The root directory cannot be deleted".into(),
            ));
        }

        // Symlinks are removed themselves, not followed.
        let metadata =
            fs::symlink_metadata(&path).map_err(|e| not_found_or(e, "Item not found"))?;

        let deleted = if metadata.is_dir() {
            fs::remove_dir_all(&path).map_err(|e| not_found_or(e, "Item not found"))?;
            Deleted::Folder
        } else {
            fs::remove_file(&path).map_err(|e| not_found_or(e, "Item not found"))?;
            Deleted::File
        };

        tracing::info!(path = %path.display(), kind = ?deleted, "deleted");
        Ok(deleted)
    }

    /// Create folder `name` below `relative`. `name` may contain `/` to
    /// create several levels at once. Returns the new folder's relative path.
    pub fn mkdir(&self, relative: &str, name: &str) -> Result<String, FsError> {
        let segments: Vec<&str> = name
            .split(['/', '\\'])
            .filter(|s| !s.is_empty())
            .collect();
        if segments.is_empty() {
            return Err(FsError::InvalidInput("Folder name cannot be empty".into()));
        }

        let parent = self.sandbox.resolve(relative)?;
        if !parent.is_dir() {
            return Err(FsError::NotFound("Directory does not exist.".into()));
        }

        let mut target = parent;
        for segment in &segments {
            validate_entry_name(segment)?;
            target.push(segment);
        }
        // The name is checked again after the join: it may carry `..`.
        let target = normalize(&target);
        self.sandbox.ensure_contained(&target)?;

        if fs::symlink_metadata(&target).is_ok() {
            return Err(FsError::AlreadyExists(name.to_string()));
        }

        self.ensure_ancestors_are_folders(&target)?;
        if let Some(ancestors) = target.parent() {
            fs::create_dir_all(ancestors).map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    FsError::InvalidInput(format!("Cannot create '{}' below a file", name))
                } else {
                    FsError::Io(e)
                }
            })?;
        }
        match fs::create_dir(&target) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(FsError::AlreadyExists(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(path = %target.display(), "created folder");
        self.sandbox.relativize(&target)
    }

    /// Every existing ancestor of `target` below the root must be a folder.
    fn ensure_ancestors_are_folders(&self, target: &Path) -> Result<(), FsError> {
        for ancestor in target.ancestors().skip(1) {
            if self.sandbox.is_root(ancestor) {
                break;
            }
            if let Ok(metadata) = fs::metadata(ancestor) {
                if !metadata.is_dir() {
                    let relative = self.sandbox.relativize(ancestor)?;
                    return Err(FsError::InvalidInput(format!(
                        "'{}' is a file, not a folder",
                        relative
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_extension(&self, name: &str) -> Result<(), FsError> {
        let extension = extension_of(name);
        if extension.is_empty()
            || self.policy.allowed_extensions.is_empty()
            || self.policy.allowed_extensions.contains(&extension)
        {
            Ok(())
        } else {
            Err(FsError::DisallowedType(extension))
        }
    }
}

const UPLOAD_TEMP_SUFFIX: &str = ".upload";

/// Hidden, fixed-length temp name. Independent of the client's name so it
/// never runs into the filesystem's name length limit first.
fn upload_temp_name() -> String {
    format!(".{}{}", Uuid::new_v4().simple(), UPLOAD_TEMP_SUFFIX)
}

/// True for an in-flight upload's temp file.
pub fn is_upload_temp(name: &str) -> bool {
    name.strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(UPLOAD_TEMP_SUFFIX))
        .is_some_and(|id| id.len() == 32 && Uuid::try_parse(id).is_ok())
}

/// Base name of a client-declared upload name. Any directory part is
/// dropped; `..` anywhere in the name rejects it outright.
fn upload_name(file_name: &str) -> Result<&str, FsError> {
    let segments: Vec<&str> = file_name
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();

    if segments.iter().any(|s| *s == "..") {
        return Err(FsError::InvalidInput(
            "File name must not reference a parent directory".into(),
        ));
    }

    let name = segments
        .last()
        .copied()
        .ok_or_else(|| FsError::InvalidInput("File name cannot be empty".into()))?;
    if name == "." {
        return Err(FsError::InvalidInput("Invalid file name".into()));
    }
    validate_entry_name(name)?;
    Ok(name)
}

/// Copy at most `max + 1` bytes into a fresh file at `path`. The file handle
/// is closed before this returns.
fn write_limited<R: Read>(path: &Path, content: &mut R, max: u64) -> Result<u64, FsError> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let written = io::copy(&mut content.take(max.saturating_add(1)), &mut file)?;

    if written > max {
        return Err(FsError::TooLarge { limit: max });
    }
    if written == 0 {
        return Err(FsError::InvalidInput("No file selected.".into()));
    }

    file.sync_all()?;
    Ok(written)
}

fn not_found_or(err: io::Error, message: &str) -> FsError {
    if err.kind() == io::ErrorKind::NotFound {
        FsError::NotFound(message.to_string())
    } else {
        FsError::Io(err)
    }
}
