//! Persisted reactive values.
//!
//! A [`StoredValue<T>`] keeps an in-memory value synchronized with one key of
//! a [`Store`], both ways: every local mutation is serialized to JSON and
//! written through, and external changes reported for the key are
//! deserialized back in and announced to local subscribers. Two values
//! watching the same key in different contexts converge, last write wins.
//!
//! Dispatch is synchronous and ordered: subscribers run to completion inside
//! the mutation that triggered them, in registration order. A subscriber
//! added while a dispatch is running is kept, but first fires on the next
//! change.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::store::{Store, StoreObserver};

type Subscriber<T> = Box<dyn FnMut(&T)>;

/// Shared state: the current value plus its subscriber list. Registered with
/// the store as the observer for `key`.
struct Shared<T> {
    key: String,
    value: RefCell<Option<T>>,
    subscribers: RefCell<Vec<Subscriber<T>>>,
}

impl<T: Clone> Shared<T> {
    /// Run every subscriber against a clone of the current value. The
    /// subscriber list is detached during dispatch so callbacks can
    /// subscribe or read without re-borrowing issues.
    fn notify(&self) {
        let Some(value) = self.value.borrow().clone() else {
            return;
        };
        let mut running = std::mem::take(&mut *self.subscribers.borrow_mut());
        for subscriber in running.iter_mut() {
            subscriber(&value);
        }
        let mut slot = self.subscribers.borrow_mut();
        running.extend(slot.drain(..));
        *slot = running;
    }
}

impl<T: DeserializeOwned + Clone> StoreObserver for Shared<T> {
    fn key(&self) -> &str {
        &self.key
    }

    /// External change for our key. Undecodable payloads are discarded and
    /// the current value stands — stale-but-valid beats crashing.
    fn reload(&self, raw: Option<&str>) {
        let Some(raw) = raw else {
            return;
        };
        match serde_json::from_str::<T>(raw) {
            Ok(fresh) => {
                *self.value.borrow_mut() = Some(fresh);
                self.notify();
            }
            Err(e) => {
                crate::log_warn!("Ignoring undecodable update for '{}': {}", self.key, e);
            }
        }
    }
}

/// An observable value mirrored into a [`Store`] key.
pub struct StoredValue<T> {
    store: Store,
    shared: Rc<Shared<T>>,
}

impl<T> StoredValue<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    /// Create a value bound to `key`.
    ///
    /// Initialization order: the persisted payload if present and decodable,
    /// else `initial` (which is then written through so a fresh context sees
    /// it), else unset. Registers as the store's observer for the key.
    pub fn new(store: &Store, key: &str, initial: Option<T>) -> Self {
        let stored: Option<T> = store
            .get(key)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(v) => Some(v),
                Err(e) => {
                    crate::log_warn!("Stored '{}' is undecodable ({}), using default", key, e);
                    None
                }
            });

        let from_store = stored.is_some();
        let shared = Rc::new(Shared {
            key: key.to_string(),
            value: RefCell::new(stored.or(initial)),
            subscribers: RefCell::new(Vec::new()),
        });
        store.register_observer(Rc::downgrade(&shared) as Weak<dyn StoreObserver>);

        let value = Self {
            store: store.clone(),
            shared,
        };
        // A defaulted value is persisted immediately, like any other change.
        if !from_store {
            value.persist();
        }
        value
    }

    pub fn key(&self) -> &str {
        &self.shared.key
    }

    /// Clone of the current value, or `None` when never initialized.
    pub fn get(&self) -> Option<T> {
        self.shared.value.borrow().clone()
    }

    /// Replace the value: write through to the store, then notify local
    /// subscribers in order.
    pub fn set(&self, value: T) {
        *self.shared.value.borrow_mut() = Some(value);
        self.persist();
        self.shared.notify();
    }

    /// Read-modify-write in place. No-op when the value is unset.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut slot = self.shared.value.borrow_mut();
            match slot.as_mut() {
                Some(value) => f(value),
                None => return,
            }
        }
        self.persist();
        self.shared.notify();
    }

    /// Subscribe to every subsequent change (local or external).
    pub fn subscribe(&self, f: impl FnMut(&T) + 'static) {
        self.shared.subscribers.borrow_mut().push(Box::new(f));
    }

    fn persist(&self) {
        let slot = self.shared.value.borrow();
        let Some(value) = slot.as_ref() else {
            return;
        };
        match serde_json::to_string(value) {
            Ok(raw) => self.store.set(&self.shared.key, raw),
            Err(e) => {
                crate::log_err!("Failed to serialize '{}': {}", self.shared.key, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temp_store(tag: &str) -> PathBuf {
        static N: AtomicUsize = AtomicUsize::new(0);
        std::env::temp_dir().join(format!(
            "elevator-stored-{}-{}-{}.json",
            tag,
            std::process::id(),
            N.fetch_add(1, Ordering::Relaxed)
        ))
    }

    #[test]
    fn test_initializes_from_initial_when_store_empty() {
        let store = Store::open(temp_store("init"));
        let v: StoredValue<u8> = StoredValue::new(&store, "alpha", Some(127));
        assert_eq!(v.get(), Some(127));
        // The fallback was written through
        assert_eq!(store.get("alpha"), Some("127".to_string()));
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_unset_when_no_initial_and_no_stored() {
        let store = Store::open(temp_store("unset"));
        let v: StoredValue<u8> = StoredValue::new(&store, "alpha", None);
        assert_eq!(v.get(), None);
        v.update(|_| panic!("update on unset value must not run"));
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_persistence_round_trip() {
        let path = temp_store("roundtrip");
        {
            let store = Store::open(&path);
            let v: StoredValue<Vec<i32>> = StoredValue::new(&store, "k", None);
            v.set(vec![1, 2, 3]);
        }
        let store = Store::open(&path);
        let v: StoredValue<Vec<i32>> = StoredValue::new(&store, "k", Some(vec![]));
        assert_eq!(v.get(), Some(vec![1, 2, 3]));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_stored_value_wins_over_initial() {
        let path = temp_store("precedence");
        let store = Store::open(&path);
        store.set("k", "5".into());
        let v: StoredValue<u8> = StoredValue::new(&store, "k", Some(1));
        assert_eq!(v.get(), Some(5));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_malformed_stored_falls_back_to_initial() {
        let path = temp_store("malformed");
        let store = Store::open(&path);
        store.set("k", "definitely not a number".into());
        let v: StoredValue<u8> = StoredValue::new(&store, "k", Some(9));
        assert_eq!(v.get(), Some(9));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_subscribers_fire_in_order_on_set() {
        let store = Store::open(temp_store("subs"));
        let v: StoredValue<u8> = StoredValue::new(&store, "k", Some(0));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (seen.clone(), seen.clone());
        v.subscribe(move |x| a.borrow_mut().push(("first", *x)));
        v.subscribe(move |x| b.borrow_mut().push(("second", *x)));

        v.set(7);
        v.update(|x| *x += 1);
        assert_eq!(
            *seen.borrow(),
            vec![("first", 7), ("second", 7), ("first", 8), ("second", 8)]
        );
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_cross_context_convergence() {
        let path = temp_store("converge");
        let ctx_a = Store::open(&path);
        let ctx_b = Store::open(&path);

        let a: StoredValue<u8> = StoredValue::new(&ctx_a, "alpha", Some(127));
        let b: StoredValue<u8> = StoredValue::new(&ctx_b, "alpha", Some(127));
        let b_seen = Rc::new(RefCell::new(Vec::new()));
        let sink = b_seen.clone();
        b.subscribe(move |x| sink.borrow_mut().push(*x));

        let a_changes = ctx_a.change_feed();
        a.set(200);

        // Host pumps A's change feed into B's context
        for key in a_changes.try_iter() {
            ctx_b.notify_external(&key);
        }
        assert_eq!(b.get(), Some(200));
        assert_eq!(*b_seen.borrow(), vec![200]);
        // A keeps its own value; B's stale cache never flowed back
        assert_eq!(a.get(), Some(200));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_malformed_external_update_is_ignored() {
        let path = temp_store("bad-external");
        let ctx_a = Store::open(&path);
        let ctx_b = Store::open(&path);
        let b: StoredValue<u8> = StoredValue::new(&ctx_b, "k", Some(3));

        ctx_a.set("k", "{broken".into());
        ctx_b.notify_external("k");
        assert_eq!(b.get(), Some(3));
        let _ = fs::remove_file(path);
    }
}
