//! Elevation → RGBA colorization.
//!
//! [`color_at`] maps one elevation sample through a [`StopTable`] to an RGBA
//! color; [`colorize_tile`] applies it to every pixel of a terrarium tile.
//! The sample function carries no hidden state, so the per-pixel pass is
//! embarrassingly parallel and tiles are processed row-parallel with rayon.
//!
//! Color components are 0–255. Channel math runs in f64 and truncates toward
//! zero on output. The configured alpha is held constant while interpolating
//! between two stops (only the below-lowest-stop fade scales it).

use image::RgbaImage;
use rayon::prelude::*;

use crate::stops::StopTable;
use crate::terrain::decode_elevation;

/// Fully transparent output — below sea level, or no stops configured.
const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Color one elevation sample.
///
/// Edge policy:
/// * below sea level: fully transparent, whatever the stop table says;
/// * between sea level and the lowest stop: the lowest stop's `color_down`,
///   alpha fading linearly from 0 at sea level to `alpha` at the stop;
/// * between two stops: per-channel linear interpolation from the lower
///   stop's `color_up` to the upper stop's `color_down`, at constant `alpha`;
/// * above the highest stop: that stop's `color_up`, solid at `alpha`;
/// * empty table: fully transparent.
///
/// Non-finite elevations flow through the arithmetic untrapped; the final
/// float→u8 casts saturate, so the output stays a valid color.
pub fn color_at(stops: &StopTable, alpha: u8, e: f64) -> [u8; 4] {
    let i = stops.next_stop_idx(e);

    // At or below the lowest stop
    if i == 0 {
        if e < 0.0 {
            return TRANSPARENT;
        }
        return match stops.get(0) {
            Some(first) => {
                let t = e / first.elevation;
                let [r, g, b] = first.color_down;
                [r, g, b, (t * alpha as f64) as u8]
            }
            None => TRANSPARENT,
        };
    }

    // i > 0, so the lower bracket stop exists
    let Some(lower) = stops.get(i - 1) else {
        return TRANSPARENT;
    };

    match stops.get(i) {
        Some(upper) => {
            let t = (e - lower.elevation) / (upper.elevation - lower.elevation);
            let lo = lower.color_up;
            let hi = upper.color_down;
            [
                lerp_channel(lo[0], hi[0], t),
                lerp_channel(lo[1], hi[1], t),
                lerp_channel(lo[2], hi[2], t),
                alpha,
            ]
        }
        // Above the highest stop: solid fill, no fade-out
        None => {
            let [r, g, b] = lower.color_up;
            [r, g, b, alpha]
        }
    }
}

fn lerp_channel(lo: u8, hi: u8, t: f64) -> u8 {
    (lo as f64 * (1.0 - t) + hi as f64 * t) as u8
}

/// Colorize a whole terrarium tile into an RGBA overlay of the same size.
///
/// Rows are processed in parallel; each pixel's RGB channels are decoded to
/// an elevation and pushed through [`color_at`]. The source alpha channel is
/// ignored (terrain tiles are opaque).
pub fn colorize_tile(tile: &RgbaImage, stops: &StopTable, alpha: u8) -> RgbaImage {
    let (width, height) = tile.dimensions();
    let src = tile.as_raw();
    let row_len = width as usize * 4;

    let mut out = vec![0u8; row_len * height as usize];
    out.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src[y * row_len..(y + 1) * row_len];
            for x in 0..width as usize {
                let o = x * 4;
                let e = decode_elevation([src_row[o], src_row[o + 1], src_row[o + 2]]);
                row[o..o + 4].copy_from_slice(&color_at(stops, alpha, e));
            }
        });

    // Buffer length matches dimensions by construction
    RgbaImage::from_raw(width, height, out).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stops::Stop;
    use image::Rgba;

    fn yellow_red() -> StopTable {
        StopTable::new(vec![
            Stop::new(500.0, [255, 255, 0], [255, 255, 0]),
            Stop::new(1000.0, [255, 0, 0], [255, 0, 0]),
        ])
    }

    #[test]
    fn test_empty_table_is_transparent() {
        let t = StopTable::default();
        for e in [-100.0, 0.0, 1.0, 5000.0] {
            assert_eq!(color_at(&t, 255, e), [0, 0, 0, 0]);
        }
    }

    #[test]
    fn test_below_sea_level_is_transparent() {
        let t = yellow_red();
        assert_eq!(color_at(&t, 255, -0.001), [0, 0, 0, 0]);
        assert_eq!(color_at(&t, 255, -4000.0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_fade_in_below_lowest_stop() {
        let t = yellow_red();
        // Sea level: colorDown at alpha 0
        assert_eq!(color_at(&t, 200, 0.0), [255, 255, 0, 0]);
        // Halfway up to the first stop: half alpha
        assert_eq!(color_at(&t, 200, 250.0), [255, 255, 0, 100]);
    }

    #[test]
    fn test_midpoint_interpolation() {
        // Yellow → red at t = 0.5, constant alpha
        let t = yellow_red();
        assert_eq!(color_at(&t, 127, 750.0), [255, 127, 0, 127]);
    }

    #[test]
    fn test_exact_color_at_stop_elevations() {
        let t = StopTable::new(vec![
            Stop::new(500.0, [10, 20, 30], [40, 50, 60]),
            Stop::new(1000.0, [70, 80, 90], [100, 110, 120]),
        ]);
        // At a stop's own elevation the bracket puts it below: t = 0 from its
        // colorUp, exactly, with no interpolation drift.
        assert_eq!(color_at(&t, 255, 500.0), [40, 50, 60, 255]);
        // At the top stop there is no upper bracket: solid colorUp.
        assert_eq!(color_at(&t, 255, 1000.0), [100, 110, 120, 255]);
    }

    #[test]
    fn test_above_highest_stop_is_solid() {
        let t = yellow_red();
        assert_eq!(color_at(&t, 90, 1000.0), [255, 0, 0, 90]);
        assert_eq!(color_at(&t, 90, 25000.0), [255, 0, 0, 90]);
    }

    #[test]
    fn test_colorize_tile_matches_color_at() {
        let stops = yellow_red();
        // 2×2 tile: sea level, 750 ft, below sea, high above the top stop.
        // 750 ft = 228.588... m; encoded as 32768 + 228 = 128*256 + 228 (within a meter)
        let mut tile = RgbaImage::new(2, 2);
        tile.put_pixel(0, 0, Rgba([128, 0, 0, 255]));
        tile.put_pixel(1, 0, Rgba([128, 228, 151, 255]));
        tile.put_pixel(0, 1, Rgba([0, 0, 0, 255]));
        tile.put_pixel(1, 1, Rgba([255, 0, 0, 255]));

        let out = colorize_tile(&tile, &stops, 127);
        for (x, y, px) in tile.enumerate_pixels() {
            let e = decode_elevation([px[0], px[1], px[2]]);
            assert_eq!(out.get_pixel(x, y).0, color_at(&stops, 127, e));
        }
        assert_eq!(out.get_pixel(0, 1).0, [0, 0, 0, 0]); // background pixel
        assert_eq!(out.get_pixel(1, 1).0, [255, 0, 0, 127]); // above top stop
    }
}
