use chrono::{Datelike, Duration, NaiveDate};
use tarragona_domain::{Factory, Milestone, MilestoneKey, MilestoneTimeline, UnitType, ORDER_DEADLINE_DAYS, WAREHOUSE_BUFFER_DAYS};

/// §4.5 Deadline & Milestone Engine. Pure given a boat×factory pair; used
/// both by the simulator (per projected boat) and standalone by the
/// planner UI for a single boat.
pub fn build(factory: &Factory, departure: NaiveDate, arrival: NaiveDate, has_scheduled_production: bool, today: NaiveDate) -> MilestoneTimeline {
    let factory_request_cutoff = departure - Duration::days(factory.production_lead_days + factory.transport_to_port_days + 5);
    let order_deadline = departure - Duration::days(factory.transport_to_port_days + 3);
    let in_warehouse_date = arrival + Duration::days(WAREHOUSE_BUFFER_DAYS);

    let piggyback_cutoff = if has_scheduled_production {
        let next_cutoff = next_occurrence_of_weekday(today + Duration::days(1), factory.cutoff_day);
        (next_cutoff < departure).then_some(next_cutoff)
    } else {
        None
    };

    let mut milestones = vec![
        Milestone {
            key: MilestoneKey::FactoryRequestCutoff,
            label: "Factory request cutoff".to_string(),
            date: factory_request_cutoff,
            passed: factory_request_cutoff < today,
        },
        Milestone {
            key: MilestoneKey::OrderDeadline,
            label: "Order deadline".to_string(),
            date: order_deadline,
            passed: order_deadline < today,
        },
        Milestone {
            key: MilestoneKey::DepartureDate,
            label: "Departure date".to_string(),
            date: departure,
            passed: departure < today,
        },
        Milestone {
            key: MilestoneKey::ArrivalDate,
            label: "Arrival date".to_string(),
            date: arrival,
            passed: arrival < today,
        },
        Milestone {
            key: MilestoneKey::InWarehouseDate,
            label: "In warehouse".to_string(),
            date: in_warehouse_date,
            passed: in_warehouse_date < today,
        },
    ];

    if let Some(cutoff) = piggyback_cutoff {
        milestones.push(Milestone {
            key: MilestoneKey::PiggybackCutoff,
            label: "Piggyback cutoff".to_string(),
            date: cutoff,
            passed: cutoff < today,
        });
    }

    if factory.unit_type == UnitType::M2 {
        let siesa_order_date = departure - Duration::days(ORDER_DEADLINE_DAYS);
        milestones.push(Milestone {
            key: MilestoneKey::SiesaOrderDate,
            label: "SIESA order date".to_string(),
            date: siesa_order_date,
            passed: siesa_order_date < today,
        });
    }

    milestones.sort_by_key(|m| m.date);

    let current_milestone = milestones.iter().find(|m| m.date >= today).map(|m| m.key);
    let days_to_next_milestone = milestones
        .iter()
        .find(|m| m.date >= today)
        .map(|m| (m.date - today).num_days());

    MilestoneTimeline {
        milestones,
        current_milestone,
        days_to_next_milestone,
    }
}

fn next_occurrence_of_weekday(from: NaiveDate, weekday: chrono::Weekday) -> NaiveDate {
    let days_ahead = (7 + weekday.num_days_from_monday() as i64 - from.weekday().num_days_from_monday() as i64) % 7;
    from + Duration::days(days_ahead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarragona_domain::{FactoryId, UnitType};

    fn factory() -> Factory {
        Factory {
            id: FactoryId::new(),
            name: "Test Factory".to_string(),
            origin_port: "Shanghai".to_string(),
            production_lead_days: 5,
            transport_to_port_days: 2,
            cutoff_day: chrono::Weekday::Wed,
            unit_type: UnitType::M2,
            active: true,
            sort_order: 0,
        }
    }

    #[test]
    fn milestones_are_chronologically_ordered() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let departure = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        let arrival = NaiveDate::from_ymd_opt(2026, 4, 5).unwrap();
        let timeline = build(&factory(), departure, arrival, true, today);
        for pair in timeline.milestones.windows(2) {
            assert!(pair[0].date <= pair[1].date);
        }
    }
}
