//! Terrarium elevation decoding.
//!
//! Terrain tiles encode elevation in meters across the three color channels
//! of an RGB pixel: `elevation_m = (r * 256 + g + b / 256) - 32768`. The red
//! channel carries the high byte, green the low byte, and blue a fractional
//! 1/256-meter refinement, with the whole value biased by 32768 so that
//! below-sea-level terrain still encodes as unsigned bytes.

/// Bias subtracted from the raw base-256 channel sum (meters).
pub const TERRARIUM_OFFSET_M: f64 = 32768.0;

/// Meters → feet conversion factor used throughout the elevation pipeline.
pub const METERS_TO_FEET: f64 = 3.281;

/// Decode one terrarium pixel to a physical elevation in feet.
///
/// Total over all inputs: any byte triple decodes to a finite value. Negative
/// results mean below sea level — or a background pixel that was never a
/// terrain sample, which callers treat the same way.
pub fn decode_elevation(pixel: [u8; 3]) -> f64 {
    let [r, g, b] = pixel;
    ((r as f64 * 256.0 + g as f64 + b as f64 / 256.0) - TERRARIUM_OFFSET_M) * METERS_TO_FEET
}
