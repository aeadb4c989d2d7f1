use chrono::TimeZone;
use fleetdash_core::{Coordinates, WaypointKind};
use serde_json::json;

use super::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
}

fn minutes_ago(m: i64) -> String {
    (now() - Duration::minutes(m)).to_rfc3339()
}

fn record(value: serde_json::Value) -> RawTruckRecord {
    serde_json::from_value(value).expect("fixture should deserialize")
}

fn tags(v: &Vehicle) -> Vec<&str> {
    v.alerts.iter().map(String::as_str).collect()
}

#[test]
fn record_without_any_coordinate_is_dropped() {
    let r = record(json!({
        "id": "T-1",
        "currentLocation": { "address": "Somewhere" },
        "reservationSummary": { "checkpoints": [ { "address": "Dock 4" } ] }
    }));
    assert!(normalize_truck(&r, now()).is_none());
}

#[test]
fn current_location_beats_first_checkpoint() {
    let r = record(json!({
        "id": "T-1",
        "currentLocation": { "coordinates": { "lat": 1.0, "lng": 2.0 }, "address": "Yard" },
        "reservationSummary": {
            "checkpoints": [ { "locationData": { "coordinates": { "lat": 10.0, "lng": 20.0 } } } ]
        }
    }));
    let v = normalize_truck(&r, now()).unwrap();
    assert_eq!(v.coordinates(), Coordinates::new(1.0, 2.0).unwrap());
    assert_eq!(v.location.address.as_deref(), Some("Yard"));
}

#[test]
fn checkpoint_scan_accepts_bare_coordinates() {
    let r = record(json!({
        "id": "T-1",
        "reservationSummary": {
            "checkpoints": [
                { "address": "no coords" },
                { "coordinates": { "latitude": "5.5", "longitude": "6.5" }, "address": "Gate B" }
            ]
        }
    }));
    let v = normalize_truck(&r, now()).unwrap();
    assert_eq!(v.coordinates(), Coordinates::new(5.5, 6.5).unwrap());
    assert_eq!(v.location.address.as_deref(), Some("Gate B"));
}

#[test]
fn reservation_pickup_is_used_before_top_level_fields() {
    let r = record(json!({
        "id": "T-1",
        "pickupLocationData": { "coordinates": { "lat": 9.0, "lng": 9.0 } },
        "reservationSummary": {
            "pickupLocationData": { "coordinates": { "lat": 3.0, "lng": 4.0 }, "address": "Pickup St" }
        }
    }));
    let v = normalize_truck(&r, now()).unwrap();
    assert_eq!(v.coordinates(), Coordinates::new(3.0, 4.0).unwrap());
}

#[test]
fn last_history_entry_is_the_final_fallback() {
    let r = record(json!({
        "id": "T-1",
        "locationHistory": [
            { "latitude": 1.0, "longitude": 1.0 },
            { "latitude": 7.25, "longitude": -3.5 }
        ]
    }));
    let v = normalize_truck(&r, now()).unwrap();
    assert_eq!(v.coordinates(), Coordinates::new(7.25, -3.5).unwrap());
}

#[test]
fn stale_only_past_thirty_minutes() {
    let base = json!({ "id": "T-1", "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } } });

    let mut fresh = base.clone();
    fresh["lastActiveAt"] = json!(minutes_ago(29));
    let mut stale = base;
    stale["lastActiveAt"] = json!(minutes_ago(31));

    let fresh = normalize_truck(&record(fresh), now()).unwrap();
    let stale = normalize_truck(&record(stale), now()).unwrap();
    assert!(!fresh.location.is_stale);
    assert!(stale.location.is_stale);
    assert_eq!(stale.status, VehicleStatus::Available);
}

#[test]
fn ninety_minutes_silent_in_transit_is_connection_lost() {
    let r = record(json!({
        "id": "T-1",
        "status": "in_transit",
        "lastActiveAt": minutes_ago(90),
        "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } }
    }));
    let v = normalize_truck(&r, now()).unwrap();
    assert_eq!(v.status, VehicleStatus::ConnectionLost);
    assert!(v.has_alert("connection"));
    assert!(v.location.is_stale);
}

#[test]
fn offline_override_needs_more_than_sixty_minutes() {
    let r = record(json!({
        "id": "T-1",
        "status": "maintenance",
        "lastActiveAt": minutes_ago(59),
        "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } }
    }));
    let v = normalize_truck(&r, now()).unwrap();
    assert_eq!(v.status, VehicleStatus::Maintenance);
    assert_eq!(tags(&v), vec!["maintenance"]);
}

#[test]
fn missing_last_active_is_neither_stale_nor_offline() {
    let r = record(json!({
        "id": "T-1",
        "status": "in_transit",
        "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } }
    }));
    let v = normalize_truck(&r, now()).unwrap();
    assert_eq!(v.status, VehicleStatus::InTransit);
    assert!(!v.location.is_stale);
}

#[test]
fn checkpoint_only_record_ten_minutes_old() {
    let r = record(json!({
        "id": "T-1",
        "lastActiveAt": minutes_ago(10),
        "reservationSummary": {
            "checkpoints": [ { "locationData": { "coordinates": { "lat": 10, "lng": 20 } } } ]
        }
    }));
    let v = normalize_truck(&r, now()).unwrap();
    assert_eq!(v.location.latitude, 10.0);
    assert_eq!(v.location.longitude, 20.0);
    assert_ne!(v.status, VehicleStatus::ConnectionLost);
    assert!(!v.location.is_stale);
}

#[test]
fn status_mapping_covers_reserved_and_unavailable() {
    let reserved = record(json!({
        "id": "a", "status": "Reserved",
        "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } }
    }));
    let flagged = record(json!({
        "id": "b", "isReserved": true,
        "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } }
    }));
    let unavailable = record(json!({
        "id": "c", "status": "unavailable",
        "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } }
    }));

    assert_eq!(normalize_truck(&reserved, now()).unwrap().status, VehicleStatus::InTransit);
    assert_eq!(normalize_truck(&flagged, now()).unwrap().status, VehicleStatus::InTransit);
    let v = normalize_truck(&unavailable, now()).unwrap();
    assert_eq!(v.status, VehicleStatus::ConnectionLost);
    assert!(v.has_alert("connection"));
}

#[test]
fn indicator_and_explicit_alerts_are_deduplicated() {
    let r = record(json!({
        "id": "T-1",
        "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } },
        "indicators": { "hasAlerts": true, "lowFuel": true },
        "alerts": [ { "type": "general_alert" }, { "type": "delay" } ],
        "metrics": { "fuelLevel": 12 }
    }));
    let v = normalize_truck(&r, now()).unwrap();
    assert_eq!(tags(&v), vec!["delay", "fuel_low", "general_alert"]);
}

#[test]
fn low_fuel_metric_alone_raises_fuel_low() {
    let low = record(json!({
        "id": "a", "metrics": { "fuelLevel": "19.9" },
        "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } }
    }));
    let ok = record(json!({
        "id": "b", "metrics": { "fuelLevel": 20 },
        "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } }
    }));
    assert!(normalize_truck(&low, now()).unwrap().has_alert("fuel_low"));
    assert!(!normalize_truck(&ok, now()).unwrap().has_alert("fuel_low"));
}

#[test]
fn waypoints_are_pickup_checkpoints_then_drop() {
    let r = record(json!({
        "id": "T-1",
        "reservationSummary": {
            "customerName": "Acme",
            "pickupLocationData": { "coordinates": { "lat": 1, "lng": 1 }, "address": "Origin" },
            "checkpoints": [
                { "locationData": { "coordinates": { "lat": 2, "lng": 2 }, "address": "CP A" } },
                { "address": "CP skipped" },
                { "coordinates": { "lat": 3, "lng": 3 }, "name": "CP C", "notes": "ring bell" }
            ],
            "dropLocationData": { "coordinates": { "lat": 4, "lng": 4 }, "address": "Dest" }
        }
    }));
    let v = normalize_truck(&r, now()).unwrap();
    let route = &v.route_data;

    let kinds: Vec<WaypointKind> = route.waypoints.iter().map(|w| w.kind).collect();
    assert_eq!(
        kinds,
        vec![
            WaypointKind::Pickup,
            WaypointKind::Checkpoint,
            WaypointKind::Checkpoint,
            WaypointKind::Drop
        ]
    );
    assert_eq!(route.waypoints[1].checkpoint_index, Some(0));
    assert_eq!(route.waypoints[2].checkpoint_index, Some(2));
    assert_eq!(route.waypoints[2].details.as_deref(), Some("ring bell"));
    assert_eq!(route.checkpoint_count, 3);
    assert!(route.has_complete_route);

    assert_eq!(v.truck_details.customer_name.as_deref(), Some("Acme"));
    assert_eq!(v.truck_details.pickup_location.as_deref(), Some("Origin"));
    assert_eq!(v.truck_details.drop_location.as_deref(), Some("Dest"));
    assert_eq!(
        v.truck_details.checkpoints,
        vec!["CP A", "CP skipped", "CP C"]
    );
}

#[test]
fn single_waypoint_counts_as_complete_route() {
    let r = record(json!({
        "id": "T-1",
        "currentLocation": { "coordinates": { "lat": 0.5, "lng": 0.5 } },
        "reservationSummary": {
            "dropLocationData": { "coordinates": { "lat": 4, "lng": 4 } }
        }
    }));
    let v = normalize_truck(&r, now()).unwrap();
    assert_eq!(v.route_data.waypoints.len(), 1);
    assert!(v.route_data.has_complete_route);
}

#[test]
fn address_only_endpoint_is_kept_for_geocoding() {
    let r = record(json!({
        "id": "T-1",
        "currentLocation": { "coordinates": { "lat": 0.5, "lng": 0.5 } },
        "reservationDetails": { "pickupLocationData": { "address": "12 Harbour Rd" } }
    }));
    let v = normalize_truck(&r, now()).unwrap();
    let pickup = v.route_data.pickup_location.unwrap();
    assert_eq!(pickup.address.as_deref(), Some("12 Harbour Rd"));
    assert!(pickup.coordinates.is_none());
    assert!(v.route_data.waypoints.is_empty());
    assert!(!v.route_data.has_complete_route);
}

#[test]
fn vehicle_id_falls_back_through_number_and_plate() {
    let by_plate = record(json!({
        "licensePlate": "ABC-123",
        "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } }
    }));
    let anonymous = record(json!({ "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } } }));
    assert_eq!(normalize_truck(&by_plate, now()).unwrap().vehicle_id, "ABC-123");
    assert_eq!(
        normalize_truck(&anonymous, now()).unwrap().vehicle_id,
        UNKNOWN_VEHICLE_ID
    );
}

#[test]
fn driver_defaults_to_unassigned() {
    let r = record(json!({ "id": "a", "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } } }));
    assert_eq!(normalize_truck(&r, now()).unwrap().driver, UNASSIGNED_DRIVER);
}

#[test]
fn fleet_drops_unlocatable_records() {
    let records = vec![
        record(json!({ "id": "a", "currentLocation": { "coordinates": { "lat": 1, "lng": 1 } } })),
        record(json!({ "id": "b" })),
        record(json!({ "id": "c", "locationHistory": [ { "lat": 2, "lng": 2 } ] })),
    ];
    let ids: Vec<String> = normalize_fleet(&records, now())
        .into_iter()
        .map(|v| v.vehicle_id)
        .collect();
    assert_eq!(ids, vec!["a", "c"]);
}
