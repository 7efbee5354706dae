use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures at the table-loading boundary. The pipeline itself never fails.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {table} table from {}: {source}", path.display())]
    Table {
        table: &'static str,
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("table loader task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
