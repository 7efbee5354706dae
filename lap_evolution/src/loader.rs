use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{Circuit, Constructor, ConstructorResult, LapTime, Race};

/// File names of the five source tables, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableFiles {
    pub races: String,
    pub circuits: String,
    pub lap_times: String,
    pub constructors: String,
    pub constructor_results: String,
}

impl Default for TableFiles {
    fn default() -> Self {
        Self {
            races: "races.csv".into(),
            circuits: "circuit.csv".into(),
            lap_times: "lap_times.csv".into(),
            constructors: "constructors.csv".into(),
            constructor_results: "constructor_results.csv".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub races: Vec<Race>,
    pub circuits: Vec<Circuit>,
    pub lap_times: Vec<LapTime>,
    pub constructors: Vec<Constructor>,
    pub constructor_results: Vec<ConstructorResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetCounts {
    pub races: usize,
    pub circuits: usize,
    pub lap_times: usize,
    pub constructors: usize,
    pub constructor_results: usize,
}

impl Dataset {
    pub fn counts(&self) -> DatasetCounts {
        DatasetCounts {
            races: self.races.len(),
            circuits: self.circuits.len(),
            lap_times: self.lap_times.len(),
            constructors: self.constructors.len(),
            constructor_results: self.constructor_results.len(),
        }
    }
}

/// Reads one headered CSV table.
///
/// Rows that do not match `T` are skipped and counted; an unreadable file is an error.
pub fn read_table<T: DeserializeOwned>(table: &'static str, path: &Path) -> Result<Vec<T>> {
    let table_err = |source: csv::Error| Error::Table { table, path: path.to_path_buf(), source };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(table_err)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in reader.deserialize::<T>() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(table_err(e)),
            Err(e) => {
                skipped += 1;
                tracing::trace!("{table}: skipping row: {e}");
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("{table}: skipped {skipped} malformed rows in {}", path.display());
    }
    tracing::info!("{table}: loaded {} rows", rows.len());
    Ok(rows)
}

async fn spawn_table<T>(table: &'static str, path: PathBuf) -> Result<Vec<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    tokio::task::spawn_blocking(move || read_table(table, &path)).await?
}

/// Loads all five tables concurrently. Any table failing fails the whole load.
pub async fn load_dataset(data_dir: &Path, files: &TableFiles) -> Result<Dataset> {
    let (races, circuits, lap_times, constructors, constructor_results) = tokio::try_join!(
        spawn_table::<Race>("races", data_dir.join(&files.races)),
        spawn_table::<Circuit>("circuits", data_dir.join(&files.circuits)),
        spawn_table::<LapTime>("lap_times", data_dir.join(&files.lap_times)),
        spawn_table::<Constructor>("constructors", data_dir.join(&files.constructors)),
        spawn_table::<ConstructorResult>("constructor_results", data_dir.join(&files.constructor_results)),
    )?;

    Ok(Dataset { races, circuits, lap_times, constructors, constructor_results })
}
