//! Color stops keyed by elevation.
//!
//! A [`Stop`] carries the two colors used immediately below and immediately
//! above its elevation; a [`StopTable`] is the ordered list of stops the
//! colorizer and the editing surface both consult. The table is kept sorted
//! ascending by elevation as a post-condition of every mutation — a batch
//! edit may leave it temporarily unsorted and call [`StopTable::normalize`]
//! once at the end.

use serde::{Deserialize, Serialize};

// ============================================================================
// Stop
// ============================================================================

/// One elevation threshold with its below/above colors.
///
/// Serialized camelCase (`colorDown` / `colorUp`) so the persisted JSON stays
/// compatible with stop lists exported by earlier builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    /// Elevation in feet.
    pub elevation: f64,
    /// Color used just below this stop's elevation.
    pub color_down: [u8; 3],
    /// Color used just above this stop's elevation.
    pub color_up: [u8; 3],
    /// Stops seeded by the host can be locked against editing.
    #[serde(default = "default_editable")]
    pub editable: bool,
}

fn default_editable() -> bool {
    true
}

impl Stop {
    pub fn new(elevation: f64, color_down: [u8; 3], color_up: [u8; 3]) -> Self {
        Self {
            elevation,
            color_down,
            color_up,
            editable: true,
        }
    }
}

/// Which of a stop's two colors an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSide {
    Down,
    Up,
}

// ============================================================================
// Material palette — swatch colors offered for new stops
// ============================================================================

/// The 18 material-design hues used when assigning colors to freshly
/// inserted stops.
pub const PALETTE: [[u8; 3]; 18] = [
    [0xf4, 0x43, 0x36], // red
    [0xe9, 0x1e, 0x63], // pink
    [0x9c, 0x27, 0xb0], // purple
    [0x67, 0x3a, 0xb7], // deep purple
    [0x3f, 0x51, 0xb5], // indigo
    [0x21, 0x96, 0xf3], // blue
    [0x03, 0xa9, 0xf4], // light blue
    [0x00, 0xbc, 0xd4], // cyan
    [0x00, 0x96, 0x88], // teal
    [0x4c, 0xaf, 0x50], // green
    [0x8b, 0xc3, 0x4a], // light green
    [0xcd, 0xdc, 0x39], // lime
    [0xff, 0xeb, 0x3b], // yellow
    [0xff, 0xc1, 0x07], // amber
    [0xff, 0x98, 0x00], // orange
    [0xff, 0x57, 0x22], // deep orange
    [0x79, 0x55, 0x48], // brown
    [0x60, 0x7d, 0x8b], // blue grey
];

/// Deterministic color pair for the `n`-th inserted stop. Walks the palette
/// with a stride coprime to its length so consecutive inserts get visually
/// distant hues.
pub fn palette_pair(n: usize) -> ([u8; 3], [u8; 3]) {
    let down = PALETTE[(n * 7) % PALETTE.len()];
    let up = PALETTE[(n * 7 + 5) % PALETTE.len()];
    (down, up)
}

// ============================================================================
// StopTable
// ============================================================================

/// Ordered sequence of stops, sorted ascending by elevation.
///
/// Duplicate elevations are allowed; ties keep their insertion order (the
/// sort is stable).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Stop>", into = "Vec<Stop>")]
pub struct StopTable {
    stops: Vec<Stop>,
}

impl StopTable {
    pub fn new(stops: Vec<Stop>) -> Self {
        let mut table = Self { stops };
        table.normalize();
        table
    }

    /// The two stops every fresh session starts with.
    pub fn default_stops() -> Self {
        Self::new(vec![
            Stop::new(660.0, [156, 39, 176], [139, 195, 74]),
            Stop::new(1276.666666666667, [255, 87, 34], [0, 150, 136]),
        ])
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn get(&self, idx: usize) -> Option<&Stop> {
        self.stops.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stop> {
        self.stops.iter()
    }

    /// Re-establish the sort order. Mutating methods call this themselves;
    /// callers only need it after editing stops through `get_mut`-style
    /// batch access.
    pub fn normalize(&mut self) {
        self.stops
            .sort_by(|a, b| a.elevation.total_cmp(&b.elevation));
    }

    /// Index of the first stop whose elevation is strictly greater than `e`,
    /// or `len()` when `e` is at or above the highest stop.
    ///
    /// This is the bracket index: `stops[idx - 1]` and `stops[idx]` are the
    /// stops below and above a raster sample, and `idx` is also the position
    /// at which a new stop at elevation `e` would be inserted.
    pub fn next_stop_idx(&self, e: f64) -> usize {
        self.stops.partition_point(|s| s.elevation <= e)
    }

    /// Insert a new stop at elevation `e`, keeping the table sorted.
    /// Returns the index it landed at.
    pub fn insert_at(&mut self, e: f64, color_down: [u8; 3], color_up: [u8; 3]) -> usize {
        let idx = self.next_stop_idx(e);
        self.stops.insert(idx, Stop::new(e, color_down, color_up));
        idx
    }

    /// Move a stop to a new elevation and re-sort. Returns the stop's new
    /// index, or `None` for an out-of-range or non-editable stop.
    pub fn move_stop(&mut self, idx: usize, new_elevation: f64) -> Option<usize> {
        let stop = self.stops.get_mut(idx)?;
        if !stop.editable {
            return None;
        }
        stop.elevation = new_elevation;
        let moved = stop.clone();
        self.normalize();
        // Stable sort keeps ties in order, so the moved stop is findable by
        // identity of its fields.
        self.stops.iter().position(|s| *s == moved)
    }

    /// Replace one side's color of a stop.
    pub fn recolor(&mut self, idx: usize, side: StopSide, rgb: [u8; 3]) -> bool {
        match self.stops.get_mut(idx) {
            Some(stop) if stop.editable => {
                match side {
                    StopSide::Down => stop.color_down = rgb,
                    StopSide::Up => stop.color_up = rgb,
                }
                true
            }
            _ => false,
        }
    }

    /// Delete a stop. Returns it, or `None` for out-of-range / locked stops.
    pub fn remove(&mut self, idx: usize) -> Option<Stop> {
        if self.stops.get(idx)?.editable {
            Some(self.stops.remove(idx))
        } else {
            None
        }
    }
}

impl From<Vec<Stop>> for StopTable {
    fn from(stops: Vec<Stop>) -> Self {
        Self::new(stops)
    }
}

impl From<StopTable> for Vec<Stop> {
    fn from(table: StopTable) -> Self {
        table.stops
    }
}
