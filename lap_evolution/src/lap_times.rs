use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::circuits::{circuit_races, QualifyingCircuit};
use crate::era::Era;
use crate::types::{CircuitId, DriverId, LapTime, Race, RaceId};

/// Fastest lap recorded at one circuit in one season.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyFastestLap {
    pub year: i32,
    pub milliseconds: i64,
    pub seconds: f64,
    pub time_string: Option<String>,
    pub era: Era,
    pub race_id: RaceId,
    pub driver_id: Option<DriverId>,
    pub lap: Option<i32>,
}

impl YearlyFastestLap {
    fn from_lap(year: i32, ms: i64, lap: &LapTime) -> Self {
        Self {
            year,
            milliseconds: ms,
            seconds: ms as f64 / 1000.0,
            time_string: lap.time.clone(),
            era: Era::classify(year),
            race_id: lap.race_id,
            driver_id: lap.driver_id,
            lap: lap.lap,
        }
    }
}

/// Per-season fastest laps at `circuit_id`, oldest season first.
///
/// Laps without a positive `milliseconds` value are ignored. When two laps in
/// the same season share the minimum, the one appearing first in `lap_times`
/// wins. A circuit with no races yields an empty vector.
pub fn circuit_lap_time_evolution(
    circuit_id: &CircuitId,
    races: &[Race],
    lap_times: &[LapTime],
) -> Vec<YearlyFastestLap> {
    let selected = circuit_races(races, circuit_id);
    if selected.is_empty() {
        tracing::debug!("no races found for circuit {circuit_id}");
        return Vec::new();
    }

    let race_years: HashMap<RaceId, i32> = selected.iter().map(|r| (r.race_id, r.year)).collect();

    // year -> (ms, winning lap); BTreeMap keeps the output ascending by year.
    let mut fastest: BTreeMap<i32, (i64, &LapTime)> = BTreeMap::new();
    let mut considered = 0usize;
    for lap in lap_times {
        let Some(&year) = race_years.get(&lap.race_id) else {
            continue;
        };
        let Some(ms) = lap.valid_milliseconds() else {
            continue;
        };
        considered += 1;
        fastest
            .entry(year)
            .and_modify(|best| {
                if ms < best.0 {
                    *best = (ms, lap);
                }
            })
            .or_insert((ms, lap));
    }
    tracing::debug!("circuit {circuit_id}: {considered} valid laps across {} seasons", fastest.len());

    fastest
        .into_iter()
        .map(|(year, (ms, lap))| YearlyFastestLap::from_lap(year, ms, lap))
        .collect()
}

/// Renders a lap time as `M:SS.mmm`, or `S.mmms` below one minute.
pub fn format_lap_time(milliseconds: i64) -> String {
    let total_seconds = milliseconds as f64 / 1000.0;
    if total_seconds < 60.0 {
        return format!("{total_seconds:.3}s");
    }
    let minutes = (total_seconds / 60.0).floor();
    let seconds = total_seconds - minutes * 60.0;
    format!("{}:{:06.3}", minutes as i64, seconds)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitSummary {
    pub circuit_id: CircuitId,
    pub display_name: String,
    pub location: Option<String>,
    pub country: Option<String>,
    pub race_count: usize,
    pub first_race_year: Option<i32>,
    pub latest_race_year: Option<i32>,
    pub years_of_data: usize,
    pub data_range: Option<(i32, i32)>,
    pub fastest_lap_ms: Option<i64>,
    pub fastest_lap: Option<String>,
    pub slowest_lap_ms: Option<i64>,
    /// Seasons raced at the circuit with no usable lap data.
    pub missing_years: Vec<i32>,
}

pub fn summarize_circuit(circuit: &QualifyingCircuit, evolution: &[YearlyFastestLap]) -> CircuitSummary {
    let data_years: HashSet<i32> = evolution.iter().map(|e| e.year).collect();
    let missing_years: Vec<i32> = circuit
        .races
        .iter()
        .map(|r| r.year)
        .filter(|year| !data_years.contains(year))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let data_range = evolution
        .iter()
        .map(|e| e.year)
        .min()
        .zip(evolution.iter().map(|e| e.year).max());
    let fastest_lap_ms = evolution.iter().map(|e| e.milliseconds).min();
    let slowest_lap_ms = evolution.iter().map(|e| e.milliseconds).max();

    CircuitSummary {
        circuit_id: circuit.circuit_id().clone(),
        display_name: circuit.display_name.clone(),
        location: circuit.circuit.location.clone(),
        country: circuit.circuit.country.clone(),
        race_count: circuit.race_count,
        first_race_year: circuit.first_race_year(),
        latest_race_year: circuit.latest_race_year(),
        years_of_data: evolution.len(),
        data_range,
        fastest_lap_ms,
        fastest_lap: fastest_lap_ms.map(format_lap_time),
        slowest_lap_ms,
        missing_years,
    }
}

/// Circuit identity plus its per-season fastest laps; input to the participation analysis.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitLapData {
    pub name: String,
    pub location: Option<String>,
    pub country: Option<String>,
    pub lap_time_data: Vec<YearlyFastestLap>,
}

/// Runs [`circuit_lap_time_evolution`] for every qualifying circuit.
pub fn collect_circuit_lap_data(
    qualifying: &[QualifyingCircuit],
    races: &[Race],
    lap_times: &[LapTime],
) -> BTreeMap<CircuitId, CircuitLapData> {
    qualifying
        .iter()
        .map(|q| {
            let data = CircuitLapData {
                name: q.circuit.name.clone().unwrap_or_else(|| q.display_name.clone()),
                location: q.circuit.location.clone(),
                country: q.circuit.country.clone(),
                lap_time_data: circuit_lap_time_evolution(q.circuit_id(), races, lap_times),
            };
            (q.circuit_id().clone(), data)
        })
        .collect()
}
