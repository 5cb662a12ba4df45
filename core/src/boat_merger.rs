use chrono::{Datelike, Duration, NaiveDate};
use tarragona_domain::{filter_relevant_real_boats, Boat, BoatStatus, ShippingRoute};

/// §4.3 Boat Merger. Produces every expected departure in the horizon by
/// filling gaps between sparse real boats with synthetic ones generated
/// from recurring route patterns, suppressing a phantom whenever a real
/// boat already covers its expected date.
pub fn merge(
    real_boats: &[Boat],
    routes: &[ShippingRoute],
    origin_port: &str,
    today: NaiveDate,
    horizon_days: i64,
) -> Vec<Boat> {
    let from = today;
    let to = today + Duration::days(horizon_days);
    let real = filter_relevant_real_boats(real_boats, origin_port, from, to);

    let mut phantoms = Vec::new();
    for route in routes.iter().filter(|r| r.active && r.origin_port == origin_port) {
        phantoms.extend(phantoms_for_route(route, &real, today, horizon_days));
    }

    let mut merged = real;
    merged.extend(phantoms);
    merged.sort_by_key(|b| b.departure_date);
    merged
}

fn phantoms_for_route(route: &ShippingRoute, real_boats: &[Boat], today: NaiveDate, horizon_days: i64) -> Vec<Boat> {
    let target_weekday = route.departure_weekday();
    let horizon_end = today + Duration::days(horizon_days);

    let mut candidate = next_occurrence_of_weekday(today + Duration::days(1), target_weekday);
    let mut out = Vec::new();

    while candidate <= horizon_end {
        let suppressed = real_boats
            .iter()
            .any(|b| (b.departure_date - candidate).num_days().abs() <= 2);

        if !suppressed {
            out.push(synthesize_phantom(route, candidate));
        }

        candidate += Duration::weeks(route.frequency_weeks);
    }

    out
}

fn next_occurrence_of_weekday(from: NaiveDate, weekday: chrono::Weekday) -> NaiveDate {
    let days_ahead = (7 + weekday.num_days_from_monday() as i64 - from.weekday().num_days_from_monday() as i64) % 7;
    from + Duration::days(days_ahead)
}

fn synthesize_phantom(route: &ShippingRoute, candidate_date: NaiveDate) -> Boat {
    Boat {
        id: Boat::phantom_id(route.id, candidate_date),
        vessel_name: format!("{} (est.)", route.name),
        origin_port: route.origin_port.clone(),
        destination_port: route.destination_port.clone(),
        departure_date: candidate_date,
        arrival_date: candidate_date + Duration::days(route.transit_days),
        status: BoatStatus::Estimated,
        shipping_line: Some(route.carrier.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarragona_domain::ShippingRouteId;

    fn route() -> ShippingRoute {
        ShippingRoute {
            id: ShippingRouteId::new(),
            name: "Asia Express".to_string(),
            origin_port: "Shanghai".to_string(),
            destination_port: "Puerto Quetzal".to_string(),
            departure_day_of_week: 0,
            transit_days: 35,
            frequency_weeks: 2,
            carrier: "Evergreen".to_string(),
            active: true,
        }
    }

    #[test]
    fn merge_is_idempotent() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let routes = vec![route()];
        let first = merge(&[], &routes, "Shanghai", today, 90);
        let second = merge(&[], &routes, "Shanghai", today, 90);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.departure_date, b.departure_date);
        }
    }

    #[test]
    fn real_boat_suppresses_nearby_phantom() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let routes = vec![route()];
        let phantom_candidate = next_occurrence_of_weekday(today + Duration::days(1), chrono::Weekday::Mon);

        let real_boat = Boat {
            id: tarragona_domain::BoatId::new(),
            vessel_name: "MV Atlantic".to_string(),
            origin_port: "Shanghai".to_string(),
            destination_port: "Puerto Quetzal".to_string(),
            departure_date: phantom_candidate + Duration::days(1),
            arrival_date: phantom_candidate + Duration::days(36),
            status: BoatStatus::Booked,
            shipping_line: None,
        };

        let merged = merge(&[real_boat.clone()], &routes, "Shanghai", today, 30);
        assert!(merged.iter().any(|b| b.id == real_boat.id));
        assert!(!merged
            .iter()
            .any(|b| b.status == BoatStatus::Estimated && b.departure_date == phantom_candidate));
    }
}
