use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::Result;

/// Flat JSON map of broadcast id -> posted flag, the only persisted state in
/// the pipeline. Read fully and rewritten fully on every update; a single
/// process is assumed, there is no locking.
#[derive(Debug, Clone)]
pub struct PostedLedger {
    path: PathBuf,
    entries: BTreeMap<String, bool>,
}

impl PostedLedger {
    /// Loads the ledger; a missing or unreadable file means nothing has been
    /// posted yet.
    pub fn load(path: &Path) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(
                        "Posted-stream ledger {} is not valid JSON ({err}); treating as empty",
                        path.display()
                    );
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };

        PostedLedger {
            path: path.to_path_buf(),
            entries,
        }
    }

    pub fn contains(&self, broadcast_id: &str) -> bool {
        self.entries.get(broadcast_id).copied().unwrap_or(false)
    }

    /// Marks a broadcast as posted and rewrites the whole file.
    pub fn mark(&mut self, broadcast_id: &str) -> Result<()> {
        self.entries.insert(broadcast_id.to_string(), true);
        let raw = serde_json::to_string_pretty(&self.entries)
            .map_err(|err| std::io::Error::other(err.to_string()))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = PostedLedger::load(&dir.path().join("posted.json"));
        assert!(ledger.is_empty());
        assert!(!ledger.contains("anything"));
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posted.json");
        fs::write(&path, "{not json").unwrap();
        assert!(PostedLedger::load(&path).is_empty());
    }

    #[test]
    fn mark_persists_across_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posted.json");

        let mut ledger = PostedLedger::load(&path);
        ledger.mark("broadcast-1").unwrap();
        ledger.mark("broadcast-2").unwrap();

        let reloaded = PostedLedger::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("broadcast-1"));
        assert!(reloaded.contains("broadcast-2"));
        assert!(!reloaded.contains("broadcast-3"));
    }
}
