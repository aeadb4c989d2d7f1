//! Info-window text for a vehicle's primary marker.

use fleetdash_core::Vehicle;

#[must_use]
pub fn info_window_text(vehicle: &Vehicle) -> String {
    let details = &vehicle.truck_details;
    let mut lines = Vec::with_capacity(10);

    match details.number.as_deref() {
        Some(number) if number != vehicle.vehicle_id => {
            lines.push(format!("Vehicle {} ({number})", vehicle.vehicle_id));
        }
        _ => lines.push(format!("Vehicle {}", vehicle.vehicle_id)),
    }
    lines.push(format!("Driver: {}", vehicle.driver));
    if vehicle.location.is_stale {
        lines.push(format!("Status: {} (stale)", vehicle.status));
    } else {
        lines.push(format!("Status: {}", vehicle.status));
    }
    match vehicle.location.address.as_deref() {
        Some(address) => lines.push(format!("Location: {address}")),
        None => lines.push(format!("Location: {}", vehicle.coordinates())),
    }
    if let Some(plate) = &details.license_plate {
        lines.push(format!("Plate: {plate}"));
    }
    if let Some(customer) = &details.customer_name {
        lines.push(format!("Customer: {customer}"));
    }
    if details.pickup_location.is_some() || details.drop_location.is_some() {
        lines.push(format!(
            "Route: {} -> {}",
            details.pickup_location.as_deref().unwrap_or("?"),
            details.drop_location.as_deref().unwrap_or("?"),
        ));
    }
    if vehicle.route_data.checkpoint_count > 0 {
        lines.push(format!("Checkpoints: {}", vehicle.route_data.checkpoint_count));
    }
    if let Some(fuel) = vehicle.fuel_level {
        lines.push(format!("Fuel: {fuel:.0}%"));
    }
    if let Some(label) = &details.sentiment_label {
        match details.sentiment_score {
            Some(score) => lines.push(format!("Sentiment: {label} ({score:.2})")),
            None => lines.push(format!("Sentiment: {label}")),
        }
    }
    if !vehicle.alerts.is_empty() {
        let tags: Vec<&str> = vehicle.alerts.iter().map(String::as_str).collect();
        lines.push(format!("Alerts: {}", tags.join(", ")));
    }
    if let Some(at) = vehicle.last_active_at {
        lines.push(format!("Last active: {}", at.format("%Y-%m-%d %H:%M UTC")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn includes_route_alerts_and_fuel() {
        let vehicle: Vehicle = serde_json::from_value(json!({
            "vehicleId": "T-9",
            "location": { "latitude": 1.0, "longitude": 2.0, "address": "Depot 3" },
            "status": "in_transit",
            "alerts": ["delay", "fuel_low"],
            "driver": "Ana Ruiz",
            "truckDetails": {
                "number": "TX-9",
                "customerName": "Acme",
                "pickupLocation": "Origin",
                "dropLocation": "Dest",
                "checkpoints": []
            },
            "fuelLevel": 14.6
        }))
        .unwrap();

        let text = info_window_text(&vehicle);
        assert!(text.starts_with("Vehicle T-9 (TX-9)"));
        assert!(text.contains("Driver: Ana Ruiz"));
        assert!(text.contains("Status: in_transit"));
        assert!(text.contains("Location: Depot 3"));
        assert!(text.contains("Route: Origin -> Dest"));
        assert!(text.contains("Fuel: 15%"));
        assert!(text.contains("Alerts: delay, fuel_low"));
    }

    #[test]
    fn falls_back_to_coordinates_without_address() {
        let vehicle: Vehicle = serde_json::from_value(json!({
            "vehicleId": "T-1",
            "location": { "latitude": 1.5, "longitude": -2.25, "isStale": true }
        }))
        .unwrap();
        let text = info_window_text(&vehicle);
        assert!(text.contains("Location: 1.50000, -2.25000"));
        assert!(text.contains("Status: available (stale)"));
        assert!(!text.contains("Route:"));
    }
}
