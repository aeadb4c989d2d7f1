//! Normalization of raw truck records into canonical [`Vehicle`]s.
//!
//! Every step is null-safe: a missing or malformed field degrades to a
//! default rather than failing the record. The only hard requirement is a
//! resolvable coordinate; records without one are dropped.

mod location;
mod route;

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use fleetdash_core::raw::{RawDriver, RawIndicators};
use fleetdash_core::vehicle::UNASSIGNED_DRIVER;
use fleetdash_core::{RawTruckRecord, TruckDetails, Vehicle, VehicleLocation, VehicleStatus};

use self::location::resolve_location;
use self::route::{assemble_route, checkpoint_labels};

/// Past this age the location is flagged stale.
pub const STALE_AFTER_MINUTES: i64 = 30;

/// Past this age the vehicle is considered offline regardless of its status.
pub const OFFLINE_AFTER_MINUTES: i64 = 60;

/// Fuel percentages strictly below this raise `fuel_low`.
pub const LOW_FUEL_THRESHOLD: f64 = 20.0;

pub const UNKNOWN_VEHICLE_ID: &str = "unknown";

/// Indicator flag to alert tag.
const INDICATOR_TAGS: &[(fn(&RawIndicators) -> Option<bool>, &str)] = &[
    (|i: &RawIndicators| i.has_alerts, "general_alert"),
    (|i: &RawIndicators| i.low_fuel, "fuel_low"),
    (|i: &RawIndicators| i.maintenance_due, "maintenance_due"),
    (|i: &RawIndicators| i.low_sentiment, "low_morale"),
];

/// Converts one raw record into a canonical vehicle.
///
/// Returns `None` when no location source yields two finite coordinates.
#[must_use]
pub fn normalize_truck(record: &RawTruckRecord, now: DateTime<Utc>) -> Option<Vehicle> {
    let (source, located) = resolve_location(record)?;
    let vehicle_id = vehicle_id(record);
    tracing::trace!(vehicle_id = %vehicle_id, source, "resolved vehicle location");

    let mut alerts = BTreeSet::new();
    let mut status = base_status(record, &mut alerts);

    let age = record.last_active_at.map(|at| now.signed_duration_since(at));
    let is_stale = age.is_some_and(|a| a > Duration::minutes(STALE_AFTER_MINUTES));
    if age.is_some_and(|a| a > Duration::minutes(OFFLINE_AFTER_MINUTES)) {
        status = VehicleStatus::ConnectionLost;
        alerts.insert("connection".to_string());
    }

    collect_alert_tags(record, &mut alerts);

    let route_data = assemble_route(record);
    let summary = record.reservation_summary.as_ref();
    let sentiment = record.sentiment.as_ref();
    let truck_details = TruckDetails {
        number: record.number.clone(),
        model: record.model.clone(),
        capacity: record.capacity.clone(),
        license_plate: record.license_plate.clone(),
        customer_name: summary.and_then(|s| s.customer_name.clone()),
        pickup_location: route_data
            .pickup_location
            .as_ref()
            .and_then(|e| e.address.clone()),
        drop_location: route_data
            .drop_location
            .as_ref()
            .and_then(|e| e.address.clone()),
        checkpoints: checkpoint_labels(record),
        sentiment_score: sentiment.and_then(|s| s.score),
        sentiment_label: sentiment.and_then(|s| s.label.clone()),
        priority: summary.and_then(|s| s.priority.clone()),
    };

    Some(Vehicle {
        vehicle_id,
        location: VehicleLocation {
            latitude: located.point.lat,
            longitude: located.point.lng,
            address: located.address,
            is_stale,
        },
        status,
        alerts,
        driver: record
            .driver
            .as_ref()
            .and_then(RawDriver::display_name)
            .unwrap_or_else(|| UNASSIGNED_DRIVER.to_string()),
        route_data,
        truck_details,
        last_active_at: record.last_active_at,
        fuel_level: fuel_level(record),
    })
}

/// Normalizes a batch, dropping records without a usable location.
#[must_use]
pub fn normalize_fleet(records: &[RawTruckRecord], now: DateTime<Utc>) -> Vec<Vehicle> {
    let vehicles: Vec<Vehicle> = records
        .iter()
        .filter_map(|r| normalize_truck(r, now))
        .collect();
    let dropped = records.len() - vehicles.len();
    if dropped > 0 {
        tracing::debug!(
            dropped,
            total = records.len(),
            "dropped trucks without a resolvable location"
        );
    }
    vehicles
}

fn vehicle_id(record: &RawTruckRecord) -> String {
    record
        .id
        .as_ref()
        .or(record.number.as_ref())
        .or(record.license_plate.as_ref())
        .cloned()
        .unwrap_or_else(|| UNKNOWN_VEHICLE_ID.to_string())
}

fn base_status(record: &RawTruckRecord, alerts: &mut BTreeSet<String>) -> VehicleStatus {
    let raw = record.status.as_deref().map(str::trim).unwrap_or_default();
    if raw.eq_ignore_ascii_case("in_transit")
        || raw.eq_ignore_ascii_case("reserved")
        || record.is_reserved == Some(true)
    {
        VehicleStatus::InTransit
    } else if raw.eq_ignore_ascii_case("maintenance") {
        alerts.insert("maintenance".to_string());
        VehicleStatus::Maintenance
    } else if raw.eq_ignore_ascii_case("unavailable") {
        alerts.insert("connection".to_string());
        VehicleStatus::ConnectionLost
    } else {
        VehicleStatus::Available
    }
}

fn fuel_level(record: &RawTruckRecord) -> Option<f64> {
    record.metrics.as_ref().and_then(|m| m.fuel_level)
}

fn collect_alert_tags(record: &RawTruckRecord, alerts: &mut BTreeSet<String>) {
    if let Some(indicators) = &record.indicators {
        for (flag, tag) in INDICATOR_TAGS {
            if flag(indicators) == Some(true) {
                alerts.insert((*tag).to_string());
            }
        }
    }

    alerts.extend(
        record
            .alerts
            .iter()
            .filter_map(|a| a.alert_type.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    );

    if fuel_level(record).is_some_and(|f| f < LOW_FUEL_THRESHOLD) {
        alerts.insert("fuel_low".to_string());
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
