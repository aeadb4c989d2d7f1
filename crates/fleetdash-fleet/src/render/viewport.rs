//! Viewport limits and the Web-Mercator fit-zoom calculation used by
//! surfaces that have no native fit-bounds.

use std::f64::consts::PI;

use fleetdash_core::{Bounds, Coordinates};

/// Fitting never zooms in further than this.
pub const MAX_ZOOM: u8 = 15;

/// Zoom used when a searched location has the focus.
pub const FOCUS_ZOOM: u8 = 14;

const TILE_SIZE_PX: f64 = 256.0;

fn mercator_lat(lat_deg: f64) -> f64 {
    let sin = (lat_deg * PI / 180.0).sin();
    let rad_x2 = ((1.0 + sin) / (1.0 - sin)).ln() / 2.0;
    rad_x2.clamp(-PI, PI) / 2.0
}

fn axis_zoom(map_px: f64, fraction: f64) -> f64 {
    if fraction <= 0.0 {
        return f64::from(MAX_ZOOM);
    }
    (map_px / TILE_SIZE_PX / fraction).log2().floor()
}

/// Largest zoom at which `bounds` fits in a `width_px` x `height_px`
/// viewport, clamped to `0..=MAX_ZOOM`. A degenerate box yields
/// [`MAX_ZOOM`].
#[must_use]
pub fn zoom_for_bounds(bounds: Bounds, width_px: u32, height_px: u32) -> u8 {
    let lat_fraction = (mercator_lat(bounds.north) - mercator_lat(bounds.south)) / PI;
    let lng_span = bounds.east - bounds.west;
    let lng_fraction = (if lng_span < 0.0 { lng_span + 360.0 } else { lng_span }) / 360.0;

    let zoom = axis_zoom(f64::from(height_px), lat_fraction)
        .min(axis_zoom(f64::from(width_px), lng_fraction))
        .clamp(0.0, f64::from(MAX_ZOOM));
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let zoom = zoom as u8;
    zoom
}

/// Web-Mercator world pixel position of `point` at `zoom`.
#[must_use]
pub fn world_px(point: Coordinates, zoom: u8) -> (f64, f64) {
    let scale = TILE_SIZE_PX * f64::from(1u32 << zoom.min(MAX_ZOOM));
    let x = (point.lng + 180.0) / 360.0;
    let y = 0.5 - mercator_lat(point.lat) / PI;
    (x * scale, y * scale)
}
