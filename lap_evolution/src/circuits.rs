use serde::Serialize;
use std::collections::HashMap;

use crate::types::{Circuit, CircuitId, Race};

/// Circuit names on the current season calendar.
pub const ACTIVE_CIRCUITS: [&str; 23] = [
    "Albert Park Grand Prix Circuit",
    "Bahrain International Circuit",
    "Shanghai International Circuit",
    "Suzuka Circuit",
    "Miami International Autodrome",
    "Autodromo Enzo e Dino Ferrari",
    "Circuit de Monaco",
    "Circuit de Barcelona-Catalunya",
    "Circuit Gilles Villeneuve",
    "Red Bull Ring",
    "Silverstone Circuit",
    "Circuit de Spa-Francorchamps",
    "Hungaroring",
    "Circuit Park Zandvoort",
    "Autodromo Nazionale di Monza",
    "Baku City Circuit",
    "Marina Bay Street Circuit",
    "Circuit of the Americas",
    "Autódromo Hermanos Rodríguez",
    "Autódromo José Carlos Pace",
    "Las Vegas Strip Street Circuit",
    "Losail International Circuit",
    "Yas Marina Circuit",
];

/// A circuit must have hosted strictly more races than this to qualify.
pub const MIN_RACE_COUNT: usize = 15;

pub fn is_active(name: &str) -> bool {
    ACTIVE_CIRCUITS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualifyingCircuit {
    #[serde(flatten)]
    pub circuit: Circuit,
    pub display_name: String,
    pub race_count: usize,
    pub races: Vec<Race>,
}

impl QualifyingCircuit {
    pub fn circuit_id(&self) -> &CircuitId {
        &self.circuit.circuit_id
    }

    pub fn first_race_year(&self) -> Option<i32> {
        self.races.iter().map(|r| r.year).min()
    }

    pub fn latest_race_year(&self) -> Option<i32> {
        self.races.iter().map(|r| r.year).max()
    }
}

/// Races held at `circuit_id`, in input order.
pub fn circuit_races(races: &[Race], circuit_id: &CircuitId) -> Vec<Race> {
    races
        .iter()
        .filter(|race| race.circuit_id.as_ref() == Some(circuit_id))
        .cloned()
        .collect()
}

pub fn race_counts(races: &[Race]) -> HashMap<&CircuitId, usize> {
    let mut counts = HashMap::new();
    for id in races.iter().filter_map(|race| race.circuit_id.as_ref()) {
        *counts.entry(id).or_insert(0) += 1;
    }
    counts
}

/// Circuits with more than [`MIN_RACE_COUNT`] races that are still on the calendar,
/// busiest first. Ties keep their input order.
pub fn find_qualifying_circuits(circuits: &[Circuit], races: &[Race]) -> Vec<QualifyingCircuit> {
    let counts = race_counts(races);
    tracing::debug!("race counts collected for {} circuit ids", counts.len());

    let mut qualifying: Vec<QualifyingCircuit> = circuits
        .iter()
        .filter_map(|circuit| {
            let race_count = counts.get(&circuit.circuit_id).copied().unwrap_or(0);
            let active = circuit.name.as_deref().is_some_and(is_active);
            tracing::debug!(
                "{}: {} races, active={}",
                circuit.name.as_deref().unwrap_or("<unnamed>"),
                race_count,
                active
            );
            if race_count <= MIN_RACE_COUNT || !active {
                return None;
            }
            let display_name = circuit
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .or_else(|| circuit.circuit_ref.clone())
                .unwrap_or_default();
            Some(QualifyingCircuit {
                circuit: circuit.clone(),
                display_name,
                race_count,
                races: circuit_races(races, &circuit.circuit_id),
            })
        })
        .collect();

    qualifying.sort_by(|a, b| b.race_count.cmp(&a.race_count));
    tracing::info!("{} qualifying circuits", qualifying.len());
    qualifying
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circuit(id: i64, name: &str) -> Circuit {
        Circuit {
            circuit_id: CircuitId::Id(id),
            circuit_ref: Some(format!("ref{id}")),
            name: Some(name.to_string()),
            location: None,
            country: None,
            lat: None,
            lng: None,
        }
    }

    fn races_at(circuit_id: i64, n: usize, first_race_id: i64) -> Vec<Race> {
        (0..n)
            .map(|i| Race {
                race_id: first_race_id + i as i64,
                year: 1990 + i as i32,
                circuit_id: Some(CircuitId::Id(circuit_id)),
            })
            .collect()
    }

    #[test]
    fn allow_list_has_every_calendar_entry() {
        assert_eq!(ACTIVE_CIRCUITS.len(), 23);
        assert!(is_active("Circuit de Monaco"));
        assert!(!is_active("Monaco Street Circuit"));
    }

    #[test]
    fn excludes_unlisted_name_despite_race_count() {
        let circuits = vec![circuit(6, "Monaco Street Circuit")];
        let races = races_at(6, 50, 1);
        assert!(find_qualifying_circuits(&circuits, &races).is_empty());
    }

    #[test]
    fn threshold_is_strict() {
        let circuits = vec![circuit(1, "Silverstone Circuit"), circuit(2, "Suzuka Circuit")];
        let mut races = races_at(1, 15, 1);
        races.extend(races_at(2, 16, 100));
        let out = find_qualifying_circuits(&circuits, &races);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].circuit_id(), &CircuitId::Id(2));
        assert_eq!(out[0].race_count, 16);
        assert_eq!(out[0].races.len(), 16);
    }

    #[test]
    fn circuit_without_races_is_dropped() {
        let circuits = vec![circuit(9, "Hungaroring")];
        assert!(find_qualifying_circuits(&circuits, &[]).is_empty());
    }

    #[test]
    fn sorted_by_race_count_with_stable_ties() {
        let circuits = vec![
            circuit(1, "Silverstone Circuit"),
            circuit(2, "Hungaroring"),
            circuit(3, "Circuit de Monaco"),
        ];
        let mut races = races_at(1, 20, 1);
        races.extend(races_at(2, 30, 100));
        races.extend(races_at(3, 20, 200));
        let ids: Vec<_> = find_qualifying_circuits(&circuits, &races)
            .iter()
            .map(|c| c.circuit_id().clone())
            .collect();
        assert_eq!(ids, vec![CircuitId::Id(2), CircuitId::Id(1), CircuitId::Id(3)]);
    }

    #[test]
    fn unnamed_circuit_never_qualifies() {
        let mut c = circuit(4, "Red Bull Ring");
        let races = races_at(4, 17, 1);
        let out = find_qualifying_circuits(std::slice::from_ref(&c), &races);
        assert_eq!(out[0].display_name, "Red Bull Ring");

        c.name = None;
        assert!(find_qualifying_circuits(&[c], &races).is_empty());
    }

    #[test]
    fn string_and_numeric_ids_match() {
        let circuits = vec![circuit(7, "Hungaroring")];
        let races: Vec<Race> = (0..16)
            .map(|i| Race {
                race_id: i,
                year: 2000 + i as i32,
                circuit_id: Some(CircuitId::from(if i % 2 == 0 { "7" } else { "7.0" })),
            })
            .collect();
        let out = find_qualifying_circuits(&circuits, &races);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].race_count, 16);
    }

    #[test]
    fn first_and_latest_years() {
        let circuits = vec![circuit(1, "Silverstone Circuit")];
        let races = races_at(1, 20, 1);
        let out = find_qualifying_circuits(&circuits, &races);
        assert_eq!(out[0].first_race_year(), Some(1990));
        assert_eq!(out[0].latest_race_year(), Some(2009));
    }
}
