//! Cross-circuit view of which engine era each circuit's lap data comes from,
//! and which era owns each circuit's lap record.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::era::{Era, PerEra};
use crate::lap_times::{CircuitLapData, YearlyFastestLap};
use crate::types::CircuitId;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EraDetail {
    pub years: Vec<i32>,
    pub times: Vec<i64>,
    /// `None` until the era has at least one season.
    pub best_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitEraParticipation {
    pub circuit_id: CircuitId,
    pub name: String,
    pub short_name: String,
    pub record_holder: Era,
    pub record_year: i32,
    pub record_time: i64,
    pub era_participation: PerEra<u32>,
    pub era_details: PerEra<EraDetail>,
    pub total_years: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EraStats {
    pub record_count: u32,
    pub total_circuits: u32,
}

pub type GlobalEraStats = PerEra<EraStats>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationAnalysis {
    pub circuit_analysis: Vec<CircuitEraParticipation>,
    pub global_era_stats: GlobalEraStats,
}

const SHORT_NAMES: [(&str, &str); 19] = [
    ("Circuit de Spa-Francorchamps", "Spa"),
    ("Circuit de Monaco", "Monaco"),
    ("Circuit Gilles Villeneuve", "Canada"),
    ("Circuit de Nevers Magny-Cours", "Magny-Cours"),
    ("Circuit Paul Ricard", "Paul Ricard"),
    ("Autodromo Nazionale di Monza", "Monza"),
    ("Autodromo Hermanos Rodriguez", "Mexico"),
    ("Autodromo Jose Carlos Pace", "Interlagos"),
    ("Autodromo Enzo e Dino Ferrari", "Imola"),
    ("Silverstone Circuit", "Silverstone"),
    ("Suzuka Circuit", "Suzuka"),
    ("Hungaroring", "Hungary"),
    ("Red Bull Ring", "Austria"),
    ("Bahrain International Circuit", "Bahrain"),
    ("Shanghai International Circuit", "China"),
    ("Melbourne Grand Prix Circuit", "Melbourne"),
    ("Marina Bay Street Circuit", "Singapore"),
    ("Yas Marina Circuit", "Abu Dhabi"),
    ("Circuit of the Americas", "COTA"),
];

fn first_word(s: &str) -> &str {
    s.split(' ').next().unwrap_or(s)
}

/// Compact circuit label for chart axes.
pub fn short_name(full_name: &str) -> String {
    if let Some((_, short)) = SHORT_NAMES.iter().find(|(name, _)| *name == full_name) {
        return (*short).to_string();
    }

    if let Some(rest) = full_name.strip_prefix("Circuit de ") {
        let head = match rest.split_once('-') {
            Some((head, _)) => head,
            None => first_word(rest),
        };
        return head.to_string();
    }

    if let Some(rest) = full_name.strip_prefix("Autodromo ") {
        if let Some((_, after)) = rest.split_once("di ") {
            return first_word(after).to_string();
        }
        if rest.contains("Hermanos") {
            return "Mexico".to_string();
        }
        if rest.contains("Jose Carlos") {
            return "Interlagos".to_string();
        }
        return first_word(rest).to_string();
    }

    if full_name.chars().count() > 12 {
        full_name.chars().take(10).collect()
    } else {
        full_name.to_string()
    }
}

/// Earliest minimum by lap time; later entries only win when strictly faster.
fn fastest_entry(laps: &[YearlyFastestLap]) -> Option<&YearlyFastestLap> {
    laps.iter().fold(None, |best: Option<&YearlyFastestLap>, lap| match best {
        Some(b) if b.milliseconds <= lap.milliseconds => Some(b),
        _ => Some(lap),
    })
}

fn analyze_circuit(circuit_id: &CircuitId, data: &CircuitLapData) -> Option<CircuitEraParticipation> {
    let mut participation: PerEra<u32> = PerEra::default();
    let mut details: PerEra<EraDetail> = PerEra::default();

    for entry in &data.lap_time_data {
        let expected = Era::classify(entry.year);
        if entry.era != expected {
            tracing::warn!(
                "{}: season {} tagged {} but belongs to {}; not counted per era",
                data.name,
                entry.year,
                entry.era,
                expected
            );
            continue;
        }
        *participation.get_mut(entry.era) += 1;
        let detail = details.get_mut(entry.era);
        detail.years.push(entry.year);
        detail.times.push(entry.milliseconds);
        detail.best_time = Some(detail.best_time.map_or(entry.milliseconds, |b| b.min(entry.milliseconds)));
    }

    // Record spans every season; the holder era follows the year.
    let record = fastest_entry(&data.lap_time_data)?;
    Some(CircuitEraParticipation {
        circuit_id: circuit_id.clone(),
        name: data.name.clone(),
        short_name: short_name(&data.name),
        record_holder: Era::classify(record.year),
        record_year: record.year,
        record_time: record.milliseconds,
        era_participation: participation,
        era_details: details,
        total_years: data.lap_time_data.len(),
    })
}

/// Per-circuit era breakdown and global record tallies.
///
/// Circuits without lap data are left out. The result is ordered by the
/// number of seasons with data, most first; equal counts keep map order.
pub fn analyze_participation(all_circuit_data: &BTreeMap<CircuitId, CircuitLapData>) -> ParticipationAnalysis {
    let mut circuit_analysis = Vec::new();
    let mut record_counts: PerEra<u32> = PerEra::default();
    let mut circuits_seen: PerEra<HashSet<CircuitId>> = PerEra::default();

    for (circuit_id, data) in all_circuit_data {
        if data.lap_time_data.is_empty() {
            continue;
        }
        let Some(analysis) = analyze_circuit(circuit_id, data) else {
            continue;
        };
        for (era, count) in analysis.era_participation.iter() {
            if *count > 0 {
                circuits_seen.get_mut(era).insert(circuit_id.clone());
            }
        }
        *record_counts.get_mut(analysis.record_holder) += 1;
        circuit_analysis.push(analysis);
    }

    circuit_analysis.sort_by(|a, b| b.total_years.cmp(&a.total_years));

    let mut global_era_stats = GlobalEraStats::default();
    for era in Era::ALL {
        *global_era_stats.get_mut(era) = EraStats {
            record_count: *record_counts.get(era),
            total_circuits: circuits_seen.get(era).len() as u32,
        };
    }

    tracing::info!(
        "participation analysed for {} circuits (records: early={} v10={} v8={} hybrid={})",
        circuit_analysis.len(),
        global_era_stats.early.record_count,
        global_era_stats.v10.record_count,
        global_era_stats.v8.record_count,
        global_era_stats.hybrid.record_count
    );

    ParticipationAnalysis { circuit_analysis, global_era_stats }
}
