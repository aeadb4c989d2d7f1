//! Route assembly: pickup, checkpoints in original order, drop.

use fleetdash_core::raw::{RawCheckpoint, RawLocationData};
use fleetdash_core::{RawTruckRecord, RouteData, RouteEndpoint, Waypoint, WaypointKind};

/// Reservation pickup: summary first, then details, then the top-level field.
fn pickup_data(record: &RawTruckRecord) -> Option<&RawLocationData> {
    record
        .reservation_summary
        .as_ref()
        .and_then(|s| s.pickup_location_data.as_ref())
        .or_else(|| {
            record
                .reservation_details
                .as_ref()
                .and_then(|d| d.pickup_location_data.as_ref())
        })
        .or(record.pickup_location_data.as_ref())
}

fn drop_data(record: &RawTruckRecord) -> Option<&RawLocationData> {
    record
        .reservation_summary
        .as_ref()
        .and_then(|s| s.drop_location_data.as_ref())
        .or_else(|| {
            record
                .reservation_details
                .as_ref()
                .and_then(|d| d.drop_location_data.as_ref())
        })
        .or(record.drop_location_data.as_ref())
}

fn endpoint(data: Option<&RawLocationData>) -> Option<RouteEndpoint> {
    let data = data?;
    let endpoint = RouteEndpoint {
        address: data.address.clone(),
        coordinates: data.structured_point(),
    };
    (!endpoint.is_empty()).then_some(endpoint)
}

fn endpoint_waypoint(endpoint: Option<&RouteEndpoint>, kind: WaypointKind) -> Option<Waypoint> {
    let endpoint = endpoint?;
    let at = endpoint.coordinates?;
    Some(Waypoint {
        lat: at.lat,
        lng: at.lng,
        address: endpoint.address.clone(),
        kind,
        checkpoint_index: None,
        details: None,
    })
}

fn checkpoint_waypoint(index: usize, cp: &RawCheckpoint) -> Option<Waypoint> {
    let at = cp.any_point()?;
    Some(Waypoint {
        lat: at.lat,
        lng: at.lng,
        address: cp.display_address(),
        kind: WaypointKind::Checkpoint,
        checkpoint_index: Some(index),
        details: cp.notes.clone().or_else(|| cp.name.clone()),
    })
}

pub(crate) fn assemble_route(record: &RawTruckRecord) -> RouteData {
    let checkpoints = record
        .reservation_summary
        .as_ref()
        .map(|s| s.checkpoints.as_slice())
        .unwrap_or_default();

    let pickup_location = endpoint(pickup_data(record));
    let drop_location = endpoint(drop_data(record));

    let waypoints: Vec<Waypoint> =
        endpoint_waypoint(pickup_location.as_ref(), WaypointKind::Pickup)
            .into_iter()
            .chain(
                checkpoints
                    .iter()
                    .enumerate()
                    .filter_map(|(i, cp)| checkpoint_waypoint(i, cp)),
            )
            .chain(endpoint_waypoint(drop_location.as_ref(), WaypointKind::Drop))
            .collect();

    RouteData {
        has_complete_route: !waypoints.is_empty(),
        checkpoint_count: checkpoints.len(),
        waypoints,
        pickup_location,
        drop_location,
    }
}

/// Display addresses for the details panel, one per checkpoint.
pub(crate) fn checkpoint_labels(record: &RawTruckRecord) -> Vec<String> {
    record
        .reservation_summary
        .iter()
        .flat_map(|s| s.checkpoints.iter())
        .enumerate()
        .map(|(i, cp)| {
            cp.display_address()
                .or_else(|| cp.name.clone())
                .unwrap_or_else(|| format!("Checkpoint {}", i + 1))
        })
        .collect()
}
