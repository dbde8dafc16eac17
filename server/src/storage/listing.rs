//! Directory listing and recursive name search

use std::fs::{self, Metadata};
use std::path::Path;
use walkdir::WalkDir;

use super::entry::{BrowseResult, DirectoryEntry};
use super::parent_of;
use super::store::{is_upload_temp, RootStore};
use super::FsError;

impl RootStore {
    /// List the immediate children of a directory, folders first, each group
    /// sorted by name.
    pub fn list(&self, relative: &str) -> Result<BrowseResult, FsError> {
        let dir = self.sandbox().resolve(relative)?;
        if !dir.is_dir() {
            return Err(FsError::NotFound("Directory not found.".into()));
        }

        let mut folders = Vec::new();
        let mut files = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if is_upload_temp(&entry.file_name().to_string_lossy()) {
                continue;
            }
            let path = entry.path();

            // Symlinks are described, not followed, same as in search
            let metadata = match fs::symlink_metadata(&path) {
                Ok(m) => m,
                Err(e) => {
                    // Entries removed mid-listing
                    tracing::debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            let item = self.describe(&path, &metadata)?;
            if item.is_folder {
                folders.push(item);
            } else {
                files.push(item);
            }
        }

        folders.sort_by(|a, b| a.name.cmp(&b.name));
        files.sort_by(|a, b| a.name.cmp(&b.name));
        folders.extend(files);

        Ok(BrowseResult {
            current_path: relative.to_string(),
            items: folders,
            parent: parent_of(relative),
        })
    }

    /// Case-insensitive substring search over every entry name below the
    /// root. Unreadable subtrees are skipped and symlinks are not followed.
    pub fn search(&self, term: &str) -> Result<Vec<DirectoryEntry>, FsError> {
        let needle = term.to_lowercase();
        let mut matches = Vec::new();

        let walker = WalkDir::new(self.sandbox().root())
            .min_depth(1)
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping inaccessible entry during search");
                    None
                }
            });

        for entry in walker {
            let name = entry.file_name().to_string_lossy();
            if is_upload_temp(&name) || !name.to_lowercase().contains(&needle) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping entry without metadata");
                    continue;
                }
            };
            matches.push(self.describe(entry.path(), &metadata)?);
        }

        matches.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!(term = %term, hits = matches.len(), "search complete");
        Ok(matches)
    }

    fn describe(&self, path: &Path, metadata: &Metadata) -> Result<DirectoryEntry, FsError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative = self.sandbox().relativize(path)?;

        if metadata.is_dir() {
            let count = match fs::read_dir(path) {
                Ok(children) => children
                    .filter_map(Result::ok)
                    .filter(|c| !is_upload_temp(&c.file_name().to_string_lossy()))
                    .count(),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot count folder children");
                    0
                }
            };
            Ok(DirectoryEntry::folder(name, relative, count, metadata))
        } else {
            Ok(DirectoryEntry::file(name, relative, metadata))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{RootStore, Sandbox, UploadPolicy};
    use crate::storage::FsError;
    use std::fs;
    use tempfile::tempdir;

    fn store(dir: &std::path::Path) -> RootStore {
        let sandbox = Sandbox::new(dir, true).unwrap();
        RootStore::new(sandbox, UploadPolicy::default())
    }

    #[test]
    fn test_list_empty_directory() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        let store = store(temp.path());

        let result = store.list("a/b").unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.current_path, "a/b");
        assert_eq!(result.parent.as_deref(), Some("a"));

        let root = store.list("").unwrap();
        assert_eq!(root.parent, None);
    }

    #[test]
    fn test_list_entries() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("docs/nested/deeper")).unwrap();
        fs::write(temp.path().join("docs/one.TXT"), b"12345").unwrap();
        fs::write(temp.path().join("docs/nested/two.md"), b"x").unwrap();
        fs::write(temp.path().join("zeta"), b"").unwrap();
        let store = store(temp.path());

        let root = store.list("").unwrap();
        let names: Vec<&str> = root.items.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "zeta"]);

        let docs = &root.items[0];
        assert!(docs.is_folder);
        assert_eq!(docs.path, "docs");
        // one.TXT and nested, not the grandchildren
        assert_eq!(docs.count, Some(2));
        assert_eq!(docs.size, None);

        let zeta = &root.items[1];
        assert_eq!(zeta.extension.as_deref(), Some(""));
        assert_eq!(zeta.size, Some(0));

        let listing = store.list("docs").unwrap();
        assert_eq!(listing.parent.as_deref(), Some(""));
        let file = listing.items.iter().find(|e| e.name == "one.TXT").unwrap();
        assert_eq!(file.path, "docs/one.TXT");
        assert_eq!(file.size, Some(5));
        assert_eq!(file.extension.as_deref(), Some(".txt"));
        assert_eq!(file.count, None);
    }

    #[test]
    fn test_list_missing_or_file_is_not_found() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("file.txt"), b"x").unwrap();
        let store = store(temp.path());

        assert!(matches!(store.list("missing"), Err(FsError::NotFound(_))));
        assert!(matches!(store.list("file.txt"), Err(FsError::NotFound(_))));
        assert!(matches!(store.list("../"), Err(FsError::AccessDenied(_))));
    }

    #[test]
    fn test_search_is_recursive_and_case_insensitive() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("a/Reports/old")).unwrap();
        fs::write(temp.path().join("REPORT.pdf"), b"1").unwrap();
        fs::write(temp.path().join("a/Reports/old/q1-report.txt"), b"2").unwrap();
        fs::write(temp.path().join("a/notes.txt"), b"3").unwrap();
        let store = store(temp.path());

        let hits = store.search("report").unwrap();
        let paths: Vec<&str> = hits.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["REPORT.pdf", "a/Reports", "a/Reports/old/q1-report.txt"]
        );

        let folder = hits.iter().find(|e| e.name == "Reports").unwrap();
        assert!(folder.is_folder);
        assert_eq!(folder.count, Some(1));
    }

    #[test]
    fn test_search_empty_term_matches_everything() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join("a/b/c.txt"), b"").unwrap();
        let store = store(temp.path());

        let hits = store.search("").unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|e| !e.path.is_empty()));
    }

    #[test]
    fn test_upload_temp_files_hidden() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("docs")).unwrap();
        let in_flight = format!(".{}.upload", uuid::Uuid::new_v4().simple());
        fs::write(temp.path().join(&in_flight), b"partial").unwrap();
        fs::write(temp.path().join("docs").join(&in_flight), b"partial").unwrap();
        fs::write(temp.path().join("notes.upload"), b"kept").unwrap();
        let store = store(temp.path());

        let names: Vec<String> = store.list("").unwrap().items.into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["docs", "notes.upload"]);
        assert_eq!(store.list("").unwrap().items[0].count, Some(0));
        assert!(store.list("docs").unwrap().items.is_empty());

        let hits: Vec<String> = store.search("upload").unwrap().into_iter().map(|e| e.path).collect();
        assert_eq!(hits, vec!["notes.upload"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_not_followed() {
        let temp = tempdir().unwrap();
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), b"x").unwrap();
        fs::create_dir(temp.path().join("real")).unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("linked")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("alias")).unwrap();
        let store = store(temp.path());

        let listed = store.list("").unwrap();
        let linked = listed.items.iter().find(|e| e.name == "linked").unwrap();
        assert!(!linked.is_folder);
        let alias = listed.items.iter().find(|e| e.name == "alias").unwrap();
        assert!(!alias.is_folder);

        let hits = store.search("").unwrap();
        let found = hits.iter().find(|e| e.name == "linked").unwrap();
        assert_eq!(found.is_folder, linked.is_folder);
        assert!(hits.iter().all(|e| e.name != "secret.txt"));
    }

    #[test]
    fn test_search_no_matches() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), b"").unwrap();
        let store = store(temp.path());
        assert!(store.search("zzz").unwrap().is_empty());
    }
}
