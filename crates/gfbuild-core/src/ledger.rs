//! Process-wide record of which sources have been through a build attempt.
//!
//! Downstream tooling only needs to know whether a file's on-disk build
//! products might be stale, so entries are monotonic: a file is marked
//! dirty after every build attempt, successful or not, and is never
//! reset for the lifetime of the process.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};

/// Shared dirty map keyed by absolute source path.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use gfbuild_core::ledger::DirtyLedger;
///
/// let ledger = DirtyLedger::default();
/// let file = Utf8Path::new("/project/HelloEng.gf");
/// assert!(!ledger.is_dirty(file));
/// ledger.mark_dirty(file);
/// assert!(ledger.is_dirty(file));
/// ```
#[derive(Debug, Default)]
pub struct DirtyLedger {
    entries: Mutex<HashMap<Utf8PathBuf, bool>>,
}

impl DirtyLedger {
    /// Marks a file dirty. Marking is idempotent and irreversible.
    pub fn mark_dirty(&self, path: &Utf8Path) {
        self.guard().insert(path.to_owned(), true);
    }

    /// Whether a file has been marked dirty. Unknown files are clean.
    #[must_use]
    pub fn is_dirty(&self, path: &Utf8Path) -> bool {
        self.guard().get(path).copied().unwrap_or(false)
    }

    /// Number of files the ledger has seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Whether no file has been marked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// An ordered copy of the current entries, for reporting.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<Utf8PathBuf, bool> {
        self.guard()
            .iter()
            .map(|(path, dirty)| (path.clone(), *dirty))
            .collect()
    }

    /// Locks the map, recovering from poisoning. The only writes are
    /// single-key inserts, so a poisoned map is still coherent.
    fn guard(&self) -> std::sync::MutexGuard<'_, HashMap<Utf8PathBuf, bool>> {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}
