//! Hover-stop detection.
//!
//! To decide whether the pointer is "over" a contour line, the host samples
//! a 3×3 neighborhood of elevations around the cursor and asks where each
//! sample falls in the stop table. When the bracket indices disagree, the
//! sampled point straddles a contour and the stop below the lowest bracket
//! seen is reported as hovered (minimum index — when more than two brackets
//! appear in the window this may not be the nearest contour, but it is
//! stable). The same pass accumulates an elevation gradient, used by hosts
//! to orient a direction marker along the slope.

use crate::stops::StopTable;

/// Neighborhood sample spacing in pixels.
pub const PROBE_JUMP_PX: i32 = 4;

/// Result of probing one cursor position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverProbe {
    /// Index of the hovered stop, when the neighborhood straddles a contour.
    pub stop_idx: Option<usize>,
    /// Unnormalized elevation gradient `(Σ e·dx, Σ e·dy)` over the window.
    pub gradient: [f64; 2],
}

/// Probe the 3×3 neighborhood around the cursor.
///
/// `sample` maps a pixel offset (multiples of [`PROBE_JUMP_PX`], including
/// the center) to a decoded elevation. Off-raster offsets should return
/// whatever the host's edge policy produces; the probe treats every sample
/// alike.
pub fn probe(stops: &StopTable, mut sample: impl FnMut(i32, i32) -> f64) -> HoverProbe {
    let mut i_min = usize::MAX;
    let mut i_max = 0usize;
    let mut gradient = [0.0f64; 2];

    for dx in [-PROBE_JUMP_PX, 0, PROBE_JUMP_PX] {
        for dy in [-PROBE_JUMP_PX, 0, PROBE_JUMP_PX] {
            let e = sample(dx, dy);
            let i = stops.next_stop_idx(e);
            i_min = i_min.min(i);
            i_max = i_max.max(i);
            gradient[0] += e * dx as f64;
            gradient[1] += e * dy as f64;
        }
    }

    HoverProbe {
        // Disagreement means a contour crosses the window; i_min < i_max
        // guarantees i_min indexes a real stop.
        stop_idx: (i_max > i_min).then_some(i_min),
        gradient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stops::Stop;

    fn table(elevations: &[f64]) -> StopTable {
        StopTable::new(
            elevations
                .iter()
                .map(|&e| Stop::new(e, [0, 0, 0], [255, 255, 255]))
                .collect(),
        )
    }

    #[test]
    fn test_flat_terrain_hovers_nothing() {
        let stops = table(&[100.0, 300.0]);
        let result = probe(&stops, |_, _| 200.0);
        assert_eq!(result.stop_idx, None);
        assert_eq!(result.gradient, [0.0, 0.0]);
    }

    #[test]
    fn test_straddling_a_contour_reports_the_stop() {
        let stops = table(&[100.0, 300.0]);
        // Elevation rises with x and crosses the 300 ft stop inside the window
        let result = probe(&stops, |dx, _| 300.0 + dx as f64);
        assert_eq!(result.stop_idx, Some(1));
        // Gradient points along +x
        assert!(result.gradient[0] > 0.0);
        assert_eq!(result.gradient[1], 0.0);
    }

    #[test]
    fn test_multiple_brackets_take_minimum_index() {
        let stops = table(&[100.0, 102.0, 104.0]);
        // Steep slope crossing all three stops in one window
        let result = probe(&stops, |dx, _| 102.0 + dx as f64);
        assert_eq!(result.stop_idx, Some(0));
    }

    #[test]
    fn test_gradient_follows_slope_direction() {
        let stops = table(&[1000.0]);
        let result = probe(&stops, |dx, dy| (2 * dx - dy) as f64);
        // Σ e·dx over the window: e = 2dx - dy → Σ(2dx - dy)·dx = 2·Σdx² = 192
        assert_eq!(result.gradient[0], 192.0);
        assert_eq!(result.gradient[1], -96.0);
    }
}
