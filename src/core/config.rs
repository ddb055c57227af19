//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fixed factors used by the cost formulas
///
/// These are constants in day-to-day use but can be tuned per site without
/// touching the formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConstants {
    /// Labor burden multiplier applied to labor and batch setup cost
    pub labor_burden: f64,

    /// Batches per year; batch quantity is annual volume divided by this
    pub months_per_year: f64,

    /// Solder paste specific gravity (g/cc)
    pub paste_specific_gravity: f64,

    /// Cost of solder bar ($/g)
    pub solder_bar_cost_per_gram: f64,

    /// Wave solder flux cost ($/ml)
    pub flux_cost_per_ml: f64,

    /// Flux spread per 100 mm² of board area
    pub flux_spread_factor: f64,
}

impl Default for CostConstants {
    fn default() -> Self {
        Self {
            labor_burden: 1.15,
            months_per_year: 12.0,
            paste_specific_gravity: 7.31,
            solder_bar_cost_per_gram: 0.065,
            flux_cost_per_ml: 0.0055,
            flux_spread_factor: 0.1,
        }
    }
}

/// Partially specified constants, as read from one config layer
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConstantsLayer {
    labor_burden: Option<f64>,
    months_per_year: Option<f64>,
    paste_specific_gravity: Option<f64>,
    solder_bar_cost_per_gram: Option<f64>,
    flux_cost_per_ml: Option<f64>,
    flux_spread_factor: Option<f64>,
}

/// One config file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    default_format: Option<String>,
    constants: ConstantsLayer,
}

/// Estimator configuration with layered hierarchy
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Default output format
    pub default_format: Option<String>,

    /// Formula constants
    pub constants: CostConstants,
}

/// Name of the per-directory config file
pub const LOCAL_CONFIG_FILE: &str = "pcbcost.yaml";

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/pcbcost/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            config.merge_file(&global_path);
        }

        // 3. Working directory config (./pcbcost.yaml)
        if let Ok(cwd) = std::env::current_dir() {
            config.merge_file(&cwd.join(LOCAL_CONFIG_FILE));
        }

        // 4. Environment variables
        if let Ok(format) = std::env::var("PCBCOST_FORMAT") {
            config.default_format = Some(format);
        }
        if let Some(burden) = std::env::var("PCBCOST_LABOR_BURDEN")
            .ok()
            .and_then(|v| v.trim().parse::<f64>().ok())
        {
            config.constants.labor_burden = burden;
        }

        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "pcbcost")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge a config file if it exists and parses; unreadable files are skipped
    fn merge_file(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|c| serde_yml::from_str::<ConfigLayer>(&c).map_err(|e| e.to_string()))
        {
            Ok(layer) => self.merge(layer),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "ignoring config file"),
        }
    }

    /// Merge another layer into this one (other takes precedence)
    fn merge(&mut self, other: ConfigLayer) {
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }

        let c = &mut self.constants;
        let o = other.constants;
        if let Some(v) = o.labor_burden {
            c.labor_burden = v;
        }
        if let Some(v) = o.months_per_year {
            c.months_per_year = v;
        }
        if let Some(v) = o.paste_specific_gravity {
            c.paste_specific_gravity = v;
        }
        if let Some(v) = o.solder_bar_cost_per_gram {
            c.solder_bar_cost_per_gram = v;
        }
        if let Some(v) = o.flux_cost_per_ml {
            c.flux_cost_per_ml = v;
        }
        if let Some(v) = o.flux_spread_factor {
            c.flux_spread_factor = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_constants() {
        let c = CostConstants::default();
        assert_eq!(c.labor_burden, 1.15);
        assert_eq!(c.months_per_year, 12.0);
        assert_eq!(c.paste_specific_gravity, 7.31);
        assert_eq!(c.solder_bar_cost_per_gram, 0.065);
        assert_eq!(c.flux_cost_per_ml, 0.0055);
    }

    #[test]
    fn test_merge_file_overrides_only_given_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCAL_CONFIG_FILE);
        std::fs::write(
            &path,
            "default_format: json\nconstants:\n  labor_burden: 1.2\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.merge_file(&path);
        assert_eq!(config.default_format.as_deref(), Some("json"));
        assert_eq!(config.constants.labor_burden, 1.2);
        assert_eq!(config.constants.months_per_year, 12.0);
    }

    #[test]
    fn test_malformed_file_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCAL_CONFIG_FILE);
        std::fs::write(&path, "constants: [not, a, map]\n").unwrap();

        let mut config = Config::default();
        config.merge_file(&path);
        assert_eq!(config.constants, CostConstants::default());
    }
}
