//! Persisted session settings.
//!
//! Everything the editor remembers between launches lives here, one
//! [`StoredValue`] per setting, bound to the same `elevator:*` keys the web
//! build used so an exported store file loads unchanged.

use serde::{Deserialize, Serialize};

use crate::logger;
use crate::stops::StopTable;
use crate::store::Store;
use crate::stored::StoredValue;

/// Basemap theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    #[default]
    Light,
    Black,
    White,
}

/// Saved map viewport: lon/lat center plus zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub center: [f64; 2],
    pub zoom: f64,
}

impl Default for View {
    fn default() -> Self {
        // San Francisco
        Self {
            center: [-122.436667, 37.753333],
            zoom: 10.0,
        }
    }
}

/// Default overlay opacity (0–255).
pub const DEFAULT_ALPHA: u8 = 127;

/// The editor's persisted state: stop table, overlay alpha, theme, viewport.
pub struct Session {
    pub store: Store,
    pub stops: StoredValue<StopTable>,
    pub alpha: StoredValue<u8>,
    pub theme: StoredValue<Theme>,
    pub view: StoredValue<View>,
}

impl Session {
    /// Open a session over an explicit store file.
    pub fn open(store: Store) -> Self {
        let stops = StoredValue::new(&store, "elevator:stops", Some(StopTable::default_stops()));
        let alpha = StoredValue::new(&store, "elevator:alpha", Some(DEFAULT_ALPHA));
        let theme = StoredValue::new(&store, "elevator:theme", Some(Theme::default()));
        let view = StoredValue::new(&store, "elevator:view", Some(View::default()));
        Self {
            store,
            stops,
            alpha,
            theme,
            view,
        }
    }

    /// Open the per-user session store in the platform data directory.
    pub fn open_default() -> Self {
        let path = logger::data_dir().join("Elevator").join("store.json");
        Self::open(Store::open(path))
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
            "elevator-session-{}-{}-{}.json",
            tag,
            std::process::id(),
            N.fetch_add(1, Ordering::Relaxed)
        ))
    }

    #[test]
    fn test_fresh_session_gets_defaults() {
        let session = Session::open(Store::open(temp_store("defaults")));
        assert_eq!(session.stops.get(), Some(StopTable::default_stops()));
        assert_eq!(session.alpha.get(), Some(DEFAULT_ALPHA));
        assert_eq!(session.theme.get(), Some(Theme::Light));
        assert_eq!(session.view.get(), Some(View::default()));
        let _ = fs::remove_file(session.store.path());
    }

    #[test]
    fn test_edits_survive_reopen() {
        let path = temp_store("reopen");
        {
            let session = Session::open(Store::open(&path));
            session.alpha.set(200);
            session.theme.set(Theme::Black);
            session.stops.update(|stops| {
                stops.insert_at(42.0, [1, 2, 3], [4, 5, 6]);
            });
        }
        let session = Session::open(Store::open(&path));
        assert_eq!(session.alpha.get(), Some(200));
        assert_eq!(session.theme.get(), Some(Theme::Black));
        let stops = session.stops.get().unwrap();
        assert_eq!(stops.get(0).unwrap().elevation, 42.0);
        assert_eq!(stops.len(), 3);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_theme_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        assert_eq!(
            serde_json::from_str::<Theme>("\"white\"").unwrap(),
            Theme::White
        );
    }
}
