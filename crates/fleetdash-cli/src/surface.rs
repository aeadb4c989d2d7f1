//! Headless map surface that draws the fleet onto a character grid.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use fleetdash_core::{Bounds, Coordinates};
use fleetdash_fleet::render::{
    world_px, zoom_for_bounds, LineStyle, MarkerAnimation, MarkerRole, MarkerSpec, OverlayId,
    MAX_ZOOM,
};
use fleetdash_fleet::MapSurface;

/// Pixels per grid cell, horizontally and vertically.
const CELL_W_PX: f64 = 8.0;
const CELL_H_PX: f64 = 16.0;

enum Overlay {
    Marker(MarkerSpec),
    Line { path: Vec<Coordinates>, dashed: bool },
}

pub(crate) struct TextSurface {
    cols: usize,
    rows: usize,
    center: Coordinates,
    zoom: u8,
    next_id: OverlayId,
    overlays: BTreeMap<OverlayId, Overlay>,
    animated: HashSet<OverlayId>,
}

impl TextSurface {
    pub(crate) fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            center: Coordinates { lat: 0.0, lng: 0.0 },
            zoom: 2,
            next_id: 1,
            overlays: BTreeMap::new(),
            animated: HashSet::new(),
        }
    }

    fn insert(&mut self, overlay: Overlay) -> OverlayId {
        let id = self.next_id;
        self.next_id += 1;
        self.overlays.insert(id, overlay);
        id
    }

    #[allow(clippy::cast_precision_loss)]
    fn viewport_px(&self) -> (f64, f64) {
        (self.cols as f64 * CELL_W_PX, self.rows as f64 * CELL_H_PX)
    }

    /// Grid cell for a point, or `None` when it falls outside the view.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn cell(&self, point: Coordinates) -> Option<(usize, usize)> {
        let (cx, cy) = world_px(self.center, self.zoom);
        let (px, py) = world_px(point, self.zoom);
        let (w, h) = self.viewport_px();
        let x = (px - cx + w / 2.0) / CELL_W_PX;
        let y = (py - cy + h / 2.0) / CELL_H_PX;
        if x < 0.0 || y < 0.0 || x >= self.cols as f64 || y >= self.rows as f64 {
            return None;
        }
        Some((x as usize, y as usize))
    }

    /// Renders the grid followed by a legend of primary markers.
    pub(crate) fn draw(&self) -> String {
        let mut grid = vec![vec![' '; self.cols]; self.rows];

        for overlay in self.overlays.values() {
            if let Overlay::Line { path, dashed } = overlay {
                let stroke = if *dashed { '.' } else { '*' };
                for pair in path.windows(2) {
                    for point in interpolate(pair[0], pair[1], 24) {
                        if let Some((x, y)) = self.cell(point) {
                            grid[y][x] = stroke;
                        }
                    }
                }
            }
        }
        // Markers last so they sit on top of lines.
        for (id, overlay) in &self.overlays {
            if let Overlay::Marker(marker) = overlay {
                if let Some((x, y)) = self.cell(marker.position) {
                    grid[y][x] = if self.animated.contains(id) {
                        '@'
                    } else {
                        marker.style.symbol().glyph()
                    };
                }
            }
        }

        let border = format!("+{}+", "-".repeat(self.cols));
        let mut out = String::new();
        let _ = writeln!(out, "{border}");
        for row in &grid {
            let _ = writeln!(out, "|{}|", row.iter().collect::<String>());
        }
        let _ = writeln!(out, "{border}  zoom {} center {}", self.zoom, self.center);

        for (id, overlay) in &self.overlays {
            if let Overlay::Marker(marker) = overlay {
                if let MarkerRole::Vehicle { .. } = marker.role {
                    let pulse = if self.animated.contains(id) { " *" } else { "" };
                    let _ = writeln!(
                        out,
                        "  {} {}{}",
                        marker.style.symbol().glyph(),
                        marker.title,
                        pulse
                    );
                }
            }
        }
        out
    }

    pub(crate) fn marker_count(&self) -> usize {
        self.overlays
            .values()
            .filter(|o| matches!(o, Overlay::Marker(_)))
            .count()
    }
}

impl MapSurface for TextSurface {
    fn add_marker(&mut self, marker: MarkerSpec) -> OverlayId {
        self.insert(Overlay::Marker(marker))
    }

    fn add_polyline(&mut self, path: &[Coordinates], style: LineStyle) -> OverlayId {
        self.insert(Overlay::Line {
            path: path.to_vec(),
            dashed: style.dashed,
        })
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        self.overlays.remove(&id);
        self.animated.remove(&id);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn fit_bounds(&mut self, bounds: Bounds) {
        let (w, h) = self.viewport_px();
        self.center = bounds.center();
        self.zoom = zoom_for_bounds(bounds, w as u32, h as u32);
    }

    fn zoom(&self) -> u8 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.min(MAX_ZOOM);
    }

    fn pan_to(&mut self, center: Coordinates) {
        self.center = center;
    }

    fn set_animation(&mut self, marker: OverlayId, animation: Option<MarkerAnimation>) {
        if animation.is_some() {
            self.animated.insert(marker);
        } else {
            self.animated.remove(&marker);
        }
    }
}

fn interpolate(a: Coordinates, b: Coordinates, steps: u32) -> impl Iterator<Item = Coordinates> {
    (0..=steps).map(move |i| {
        let t = f64::from(i) / f64::from(steps);
        Coordinates {
            lat: a.lat + (b.lat - a.lat) * t,
            lng: a.lng + (b.lng - a.lng) * t,
        }
    })
}
