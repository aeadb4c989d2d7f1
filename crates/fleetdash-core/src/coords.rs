//! Geographic primitives shared by the normalizer and the map renderer.

use serde::{Deserialize, Serialize};

/// A WGS84 point. Both components are always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Builds a point only when both components are finite numbers.
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        (lat.is_finite() && lng.is_finite()).then_some(Self { lat, lng })
    }

    /// `"lat,lng"`, the form the directions service accepts for endpoints.
    #[must_use]
    pub fn to_query_value(self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

/// An axis-aligned lat/lng bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    #[must_use]
    pub fn from_point(p: Coordinates) -> Self {
        Self {
            south: p.lat,
            west: p.lng,
            north: p.lat,
            east: p.lng,
        }
    }

    /// Smallest box covering every point, or `None` for an empty input.
    pub fn covering<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinates>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::from_point(first), |mut acc, p| {
            acc.extend(p);
            acc
        }))
    }

    pub fn extend(&mut self, p: Coordinates) {
        self.south = self.south.min(p.lat);
        self.north = self.north.max(p.lat);
        self.west = self.west.min(p.lng);
        self.east = self.east.max(p.lng);
    }

    #[must_use]
    pub fn center(&self) -> Coordinates {
        Coordinates {
            lat: (self.south + self.north) / 2.0,
            lng: (self.west + self.east) / 2.0,
        }
    }

    #[must_use]
    pub fn contains(&self, p: Coordinates) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lng >= self.west && p.lng <= self.east
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    #[test]
    fn rejects_non_finite_components() {
        assert!(Coordinates::new(f64::NAN, 1.0).is_none());
        assert!(Coordinates::new(1.0, f64::INFINITY).is_none());
    }

    #[test]
    fn covering_spans_all_points() {
        let b = Bounds::covering([pt(10.0, 20.0), pt(-5.0, 30.0), pt(2.0, -1.0)]).unwrap();
        assert_eq!(b.south, -5.0);
        assert_eq!(b.north, 10.0);
        assert_eq!(b.west, -1.0);
        assert_eq!(b.east, 30.0);
        assert!(b.contains(pt(0.0, 0.0)));
    }

    #[test]
    fn covering_empty_is_none() {
        assert!(Bounds::covering(Vec::new()).is_none());
    }

    #[test]
    fn single_point_box_is_degenerate() {
        let b = Bounds::covering([pt(1.5, 2.5)]).unwrap();
        assert_eq!(b.center(), pt(1.5, 2.5));
    }
}
