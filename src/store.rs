//! Persistent string key-value store with change notification.
//!
//! One [`Store`] is the moral equivalent of a browser's localStorage for a
//! single execution context: a string → JSON-string map mirrored into one
//! JSON file on disk. Writes are last-write-wins at the file level; there is
//! no locking and no conflict resolution.
//!
//! Cross-context synchronization mirrors the storage-event protocol: every
//! local `set` emits the changed key on [`Store::change_feed`], and a host
//! that learns another context touched the file calls
//! [`Store::notify_external`], which re-reads the file and dispatches the
//! key to the observers registered for it. Observer registration is a single
//! key → instances registry with one shared dispatch path, so any number of
//! values can watch the same store without stacking duplicate listeners.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::sync::mpsc;

/// A value that watches one key of a [`Store`].
///
/// Implemented by `StoredValue`'s shared state; `reload` is invoked with the
/// raw persisted payload whenever an external change to the key is reported.
pub trait StoreObserver {
    fn key(&self) -> &str;
    fn reload(&self, raw: Option<&str>);
}

struct StoreInner {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    /// key → observers, pruned of dead entries at dispatch time.
    observers: HashMap<String, Vec<Weak<dyn StoreObserver>>>,
    /// Locally-changed keys, for pumping into other contexts.
    feeds: Vec<mpsc::Sender<String>>,
}

/// Handle to one execution context's view of the persistent store.
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Store {
    inner: Rc<RefCell<StoreInner>>,
}

impl Store {
    /// Open the store file at `path`. A missing or unreadable file yields an
    /// empty store — persistence problems degrade to defaults, they never
    /// fail the caller.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = read_entries(&path);
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                path,
                entries,
                observers: HashMap::new(),
                feeds: Vec::new(),
            })),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.inner.borrow().path.clone()
    }

    /// Raw persisted payload for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.borrow().entries.get(key).cloned()
    }

    /// Write `raw` under `key`: updates the cache, flushes the whole store
    /// file, and emits the key on every change feed. Does *not* dispatch to
    /// this context's own observers — the writer already knows.
    pub fn set(&self, key: &str, raw: String) {
        let mut inner = self.inner.borrow_mut();
        inner.entries.insert(key.to_string(), raw);
        flush(&inner.path, &inner.entries);
        let key = key.to_string();
        inner.feeds.retain(|tx| tx.send(key.clone()).is_ok());
    }

    /// Ordered stream of locally-changed keys. A host pumps these into the
    /// `notify_external` of every other context sharing the file.
    pub fn change_feed(&self) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel();
        self.inner.borrow_mut().feeds.push(tx);
        rx
    }

    /// Register an observer for its key. Held weakly; dropped observers are
    /// pruned on the next dispatch for that key.
    pub fn register_observer(&self, observer: Weak<dyn StoreObserver>) {
        let Some(strong) = observer.upgrade() else {
            return;
        };
        self.inner
            .borrow_mut()
            .observers
            .entry(strong.key().to_string())
            .or_default()
            .push(observer);
    }

    /// Another context changed the store file: re-read it and, if `key` has
    /// observers here, hand each the fresh payload.
    pub fn notify_external(&self, key: &str) {
        // Re-read outside any dispatch so observers see a consistent cache.
        let targets: Vec<Rc<dyn StoreObserver>> = {
            let mut inner = self.inner.borrow_mut();
            let inner = &mut *inner;
            inner.entries = read_entries(&inner.path);
            match inner.observers.get_mut(key) {
                Some(list) => {
                    list.retain(|w| w.strong_count() > 0);
                    list.iter().filter_map(Weak::upgrade).collect()
                }
                None => Vec::new(),
            }
        };
        // Borrow released: observers may call back into the store.
        let raw = self.get(key);
        for observer in targets {
            observer.reload(raw.as_deref());
        }
    }
}

fn read_entries(path: &Path) -> BTreeMap<String, String> {
    let Ok(text) = fs::read_to_string(path) else {
        return BTreeMap::new();
    };
    match serde_json::from_str(&text) {
        Ok(entries) => entries,
        Err(e) => {
            crate::log_warn!("Store file {} is corrupt ({}), starting empty", path.display(), e);
            BTreeMap::new()
        }
    }
}

fn flush(path: &Path, entries: &BTreeMap<String, String>) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    // Serializing a string map cannot fail; disk errors are logged and
    // swallowed (the in-memory value stays authoritative for this session).
    let text = serde_json::to_string_pretty(entries).unwrap_or_default();
    if let Err(e) = fs::write(path, text) {
        crate::log_err!("Failed to persist store {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temp_store(tag: &str) -> PathBuf {
        static N: AtomicUsize = AtomicUsize::new(0);
        std::env::temp_dir().join(format!(
            "elevator-store-{}-{}-{}.json",
            tag,
            std::process::id(),
            N.fetch_add(1, Ordering::Relaxed)
        ))
    }

    struct Probe {
        key: String,
        seen: RefCell<Vec<Option<String>>>,
    }

    impl StoreObserver for Probe {
        fn key(&self) -> &str {
            &self.key
        }
        fn reload(&self, raw: Option<&str>) {
            self.seen.borrow_mut().push(raw.map(str::to_string));
        }
    }

    #[test]
    fn test_missing_file_opens_empty() {
        let store = Store::open(temp_store("missing"));
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn test_corrupt_file_opens_empty() {
        let path = temp_store("corrupt");
        fs::write(&path, "{ not json").unwrap();
        let store = Store::open(&path);
        assert_eq!(store.get("k"), None);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_set_persists_across_open() {
        let path = temp_store("roundtrip");
        let store = Store::open(&path);
        store.set("elevator:alpha", "127".into());
        store.set("elevator:theme", "\"dark\"".into());

        let reopened = Store::open(&path);
        assert_eq!(reopened.get("elevator:alpha"), Some("127".into()));
        assert_eq!(reopened.get("elevator:theme"), Some("\"dark\"".into()));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_change_feed_reports_local_sets_in_order() {
        let store = Store::open(temp_store("feed"));
        let rx = store.change_feed();
        store.set("a", "1".into());
        store.set("b", "2".into());
        store.set("a", "3".into());
        let keys: Vec<String> = rx.try_iter().collect();
        assert_eq!(keys, vec!["a", "b", "a"]);
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_notify_external_dispatches_to_matching_key_only() {
        let path = temp_store("dispatch");
        let a = Store::open(&path);
        let b = Store::open(&path);

        let probe: Rc<Probe> = Rc::new(Probe {
            key: "watched".into(),
            seen: RefCell::new(Vec::new()),
        });
        b.register_observer(Rc::downgrade(&probe) as Weak<dyn StoreObserver>);

        a.set("watched", "42".into());
        a.set("other", "9".into());
        b.notify_external("other");
        assert!(probe.seen.borrow().is_empty());
        b.notify_external("watched");
        assert_eq!(*probe.seen.borrow(), vec![Some("42".to_string())]);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_dead_observers_are_pruned() {
        let path = temp_store("prune");
        let store = Store::open(&path);
        let probe: Rc<Probe> = Rc::new(Probe {
            key: "k".into(),
            seen: RefCell::new(Vec::new()),
        });
        store.register_observer(Rc::downgrade(&probe) as Weak<dyn StoreObserver>);
        drop(probe);
        store.set("k", "1".into());
        store.notify_external("k"); // must not panic on the dead entry
        let _ = fs::remove_file(path);
    }
}
