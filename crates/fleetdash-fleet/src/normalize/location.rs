//! Ordered location sources for a raw truck record.
//!
//! The first extractor that yields two finite numbers wins. The address
//! reported alongside comes from the same source as the coordinates.

use fleetdash_core::raw::{RawCheckpoint, RawLocationData};
use fleetdash_core::{Coordinates, RawTruckRecord};

/// A resolved vehicle position and the address that came with it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Located {
    pub point: Coordinates,
    pub address: Option<String>,
}

type Extractor = fn(&RawTruckRecord) -> Option<Located>;

/// Location priority, highest first.
const LOCATION_SOURCES: &[(&str, Extractor)] = &[
    ("current_location", current_location),
    ("first_checkpoint", first_checkpoint),
    ("any_checkpoint", any_checkpoint),
    ("reservation_pickup", reservation_pickup),
    ("reservation_drop", reservation_drop),
    ("pickup_location_data", top_level_pickup),
    ("reservation_details_pickup", details_pickup),
    ("drop_location_data", top_level_drop),
    ("location_history", last_history_entry),
];

/// Walks [`LOCATION_SOURCES`] and returns the first hit with its source name.
pub(crate) fn resolve_location(record: &RawTruckRecord) -> Option<(&'static str, Located)> {
    LOCATION_SOURCES
        .iter()
        .find_map(|(name, extract)| extract(record).map(|hit| (*name, hit)))
}

fn from_location_data(data: Option<&RawLocationData>) -> Option<Located> {
    let data = data?;
    Some(Located {
        point: data.structured_point()?,
        address: data.address.clone(),
    })
}

fn current_location(record: &RawTruckRecord) -> Option<Located> {
    from_location_data(record.current_location.as_ref())
}

fn checkpoints(record: &RawTruckRecord) -> &[RawCheckpoint] {
    record
        .reservation_summary
        .as_ref()
        .map(|s| s.checkpoints.as_slice())
        .unwrap_or_default()
}

fn first_checkpoint(record: &RawTruckRecord) -> Option<Located> {
    let cp = checkpoints(record).first()?;
    Some(Located {
        point: cp.location_data_point()?,
        address: cp.display_address(),
    })
}

fn any_checkpoint(record: &RawTruckRecord) -> Option<Located> {
    checkpoints(record).iter().find_map(|cp| {
        cp.any_point().map(|point| Located {
            point,
            address: cp.display_address(),
        })
    })
}

fn reservation_pickup(record: &RawTruckRecord) -> Option<Located> {
    from_location_data(
        record
            .reservation_summary
            .as_ref()
            .and_then(|s| s.pickup_location_data.as_ref()),
    )
}

fn reservation_drop(record: &RawTruckRecord) -> Option<Located> {
    from_location_data(
        record
            .reservation_summary
            .as_ref()
            .and_then(|s| s.drop_location_data.as_ref()),
    )
}

fn top_level_pickup(record: &RawTruckRecord) -> Option<Located> {
    from_location_data(record.pickup_location_data.as_ref())
}

fn details_pickup(record: &RawTruckRecord) -> Option<Located> {
    from_location_data(
        record
            .reservation_details
            .as_ref()
            .and_then(|d| d.pickup_location_data.as_ref()),
    )
}

fn top_level_drop(record: &RawTruckRecord) -> Option<Located> {
    from_location_data(record.drop_location_data.as_ref())
}

/// History entries usually carry their coordinates inline.
fn last_history_entry(record: &RawTruckRecord) -> Option<Located> {
    let last = record.location_history.last()?;
    Some(Located {
        point: last.any_point()?,
        address: last.address.clone(),
    })
}
