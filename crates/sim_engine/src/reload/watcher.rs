//! Polling file watcher

use super::{Change, ChangeKind, ChangeSource, ReloadError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// What a file looked like at the last scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    modified: Option<SystemTime>,
    len: u64,
}

/// Watches a directory tree by comparing modification times and sizes
///
/// The first snapshot is taken on construction, so files that already exist
/// are not reported. Change ids are paths relative to the root with `/`
/// separators, reported in sorted order.
#[derive(Debug)]
pub struct FileWatcher {
    root: PathBuf,
    extensions: Vec<String>,
    known: BTreeMap<PathBuf, Stamp>,
}

impl FileWatcher {
    /// Watch every file under `root`
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ReloadError> {
        Self::with_extensions(root, std::iter::empty::<&str>())
    }

    /// Watch only files with one of the given extensions (without the dot)
    pub fn with_extensions<S: AsRef<str>>(
        root: impl Into<PathBuf>,
        extensions: impl IntoIterator<Item = S>,
    ) -> Result<Self, ReloadError> {
        let mut watcher = Self {
            root: root.into(),
            extensions: extensions.into_iter().map(|ext| ext.as_ref().to_ascii_lowercase()).collect(),
            known: BTreeMap::new(),
        };
        watcher.known = watcher.scan()?;
        Ok(watcher)
    }

    /// Watched directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of files currently tracked
    pub fn tracked(&self) -> usize {
        self.known.len()
    }

    fn wants(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)))
    }

    fn scan(&self) -> Result<BTreeMap<PathBuf, Stamp>, ReloadError> {
        let mut found = BTreeMap::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = fs::read_dir(&dir).map_err(|source| ReloadError::Io { path: dir.clone(), source })?;
            for entry in entries {
                let entry = entry.map_err(|source| ReloadError::Io { path: dir.clone(), source })?;
                let path = entry.path();
                // Files can vanish mid-scan; they show up as removed next time
                let Ok(metadata) = entry.metadata() else {
                    continue;
                };
                if metadata.is_dir() {
                    pending.push(path);
                } else if self.wants(&path) {
                    found.insert(path, Stamp { modified: metadata.modified().ok(), len: metadata.len() });
                }
            }
        }
        Ok(found)
    }

    fn id_for(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl ChangeSource for FileWatcher {
    fn poll_changes(&mut self) -> Result<Vec<Change>, ReloadError> {
        let current = self.scan()?;
        let mut changes = Vec::new();

        for (path, stamp) in &current {
            match self.known.get(path) {
                None => changes.push(Change::new(self.id_for(path), ChangeKind::Created)),
                Some(previous) if previous != stamp => {
                    changes.push(Change::new(self.id_for(path), ChangeKind::Modified));
                }
                Some(_) => {}
            }
        }
        for path in self.known.keys() {
            if !current.contains_key(path) {
                changes.push(Change::new(self.id_for(path), ChangeKind::Removed));
            }
        }

        changes.sort_by(|a, b| a.id.cmp(&b.id));
        self.known = current;
        Ok(changes)
    }
}
