//! Lap-time evolution analytics over the historical Formula 1 tables.
//!
//! Every analysis function is pure: it borrows the input tables and returns
//! freshly built results, so callers may run them in any order or in parallel.
//! Only [`loader`] touches the filesystem.

pub mod circuits;
pub mod constructor_flow;
pub mod era;
pub mod error;
pub mod lap_times;
pub mod loader;
pub mod participation;
pub mod types;

pub use circuits::{circuit_races, find_qualifying_circuits, QualifyingCircuit, ACTIVE_CIRCUITS};
pub use constructor_flow::{analyze_constructors, build_flow, constructor_flow, ConstructorAnalysis, ConstructorFlow};
pub use era::{classify_era, Era, EraInfo, PerEra};
pub use error::{Error, Result};
pub use lap_times::{
    circuit_lap_time_evolution, collect_circuit_lap_data, format_lap_time, summarize_circuit, CircuitLapData,
    CircuitSummary, YearlyFastestLap,
};
pub use loader::{load_dataset, Dataset, TableFiles};
pub use participation::{analyze_participation, short_name, GlobalEraStats, ParticipationAnalysis};
pub use types::{Circuit, CircuitId, Constructor, ConstructorResult, LapTime, Race};
