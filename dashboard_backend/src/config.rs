use anyhow::{Context, Result};
use lap_evolution::TableFiles;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub bind_addr: String,
    pub tables: TableFiles,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            bind_addr: "0.0.0.0:8080".to_string(),
            tables: TableFiles::default(),
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config JSON in {}", path.display()))
    }

    /// Config file if one is found, defaults otherwise; `DATA_DIR` / `BIND_ADDR` win over both.
    pub fn resolve() -> Result<Self> {
        let mut cfg = match resolve_config_path(std::env::var_os("DASHBOARD_CONFIG").map(PathBuf::from)) {
            Some(path) => {
                tracing::info!("using config {}", path.display());
                Self::load(&path)?
            }
            None => {
                tracing::info!("no config file found; using defaults");
                Self::default()
            }
        };
        cfg.apply_overrides(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(addr) = var("BIND_ADDR") {
            self.bind_addr = addr;
        }
    }
}

fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    // An explicit path is returned even if missing so that load() reports it.
    if explicit.is_some() {
        return explicit;
    }

    let mut candidates = vec![
        PathBuf::from("dashboard.json"),
        PathBuf::from("config/dashboard.json"),
        PathBuf::from("dashboard_backend/dashboard.json"),
    ];
    if let Ok(mut exe) = std::env::current_exe() {
        exe.pop();
        exe.push("dashboard.json");
        candidates.push(exe);
    }

    candidates.into_iter().find(|c| c.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        fs::write(&path, r#"{ "data_dir": "/srv/f1", "tables": { "circuits": "circuits.csv" } }"#).unwrap();

        let cfg = DashboardConfig::load(&path).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/f1"));
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.tables.circuits, "circuits.csv");
        assert_eq!(cfg.tables.races, "races.csv");
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        fs::write(&path, "{ not json").unwrap();
        let err = DashboardConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid config JSON"));
    }

    #[test]
    fn env_overrides_win() {
        let mut cfg = DashboardConfig::default();
        cfg.apply_overrides(|key| match key {
            "DATA_DIR" => Some("/tmp/f1".to_string()),
            "BIND_ADDR" => Some("127.0.0.1:9000".to_string()),
            _ => None,
        });
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/f1"));
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
    }

    #[test]
    fn explicit_path_is_used_even_if_missing() {
        let missing = PathBuf::from("/nonexistent/dashboard.json");
        assert_eq!(resolve_config_path(Some(missing.clone())), Some(missing));
    }
}
