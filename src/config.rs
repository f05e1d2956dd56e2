//! Runtime configuration.
//!
//! Settings come from the environment (after loading `.env`); reference data
//! (estimation tables and extra synonyms) comes from an optional JSON file.
//! Both are read once at startup and never change afterwards.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::estimation::{EstimationTables, Estimator, StrategyKind};
use crate::features::{FeatureNormalizer, SynonymOverrides, SynonymTable};
use crate::prediction::Predictor;

const DEFAULT_DATA_DIR: &str = "./data";
const USERS_FILE: &str = "users.jsonl";
const ORDERS_FILE: &str = "orders.jsonl";

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the credential and order files.
    pub data_dir: PathBuf,
    /// Reference data file; built-in tables are used when unset.
    pub tables_path: Option<PathBuf>,
    /// Which built-in strategy to start with.
    pub strategy: StrategyKind,
    /// Emit logs as JSON.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            tables_path: None,
            strategy: StrategyKind::default(),
            log_json: false,
        }
    }
}

impl Config {
    /// Build from `TIMELYTICS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = std::env::var("TIMELYTICS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let tables_path = std::env::var("TIMELYTICS_TABLES")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let strategy = match std::env::var("TIMELYTICS_STRATEGY") {
            Ok(value) => value
                .parse::<StrategyKind>()
                .map_err(|reason| ConfigError::InvalidValue {
                    key: "TIMELYTICS_STRATEGY".to_string(),
                    reason,
                })?,
            Err(_) => StrategyKind::default(),
        };

        let log_json = std::env::var("TIMELYTICS_LOG_JSON")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            data_dir,
            tables_path,
            strategy,
            log_json,
        })
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }

    pub fn orders_path(&self) -> PathBuf {
        self.data_dir.join(ORDERS_FILE)
    }

    /// Load reference data from `tables_path`, or the built-in defaults.
    pub fn load_reference_data(&self) -> Result<ReferenceData, ConfigError> {
        match &self.tables_path {
            Some(path) => ReferenceData::load(path),
            None => Ok(ReferenceData::default()),
        }
    }

    /// Build the predictor described by this configuration.
    pub fn build_predictor(&self) -> Result<Predictor, ConfigError> {
        let data = self.load_reference_data()?;
        let tables = Arc::new(data.estimation);
        let strategy = self.strategy.build(Arc::clone(&tables));
        let synonyms = SynonymTable::builtin().with_overrides(&data.synonyms);

        tracing::info!(
            version = %data.version,
            strategy = strategy.id(),
            "Estimation engine ready"
        );

        Ok(Predictor::new(
            FeatureNormalizer::new(Arc::new(synonyms)),
            Arc::new(Estimator::new(strategy)),
        ))
    }
}

/// Versioned reference data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    pub version: String,
    pub estimation: EstimationTables,
    pub synonyms: SynonymOverrides,
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self {
            version: "builtin".to_string(),
            estimation: EstimationTables::default(),
            synonyms: SynonymOverrides::default(),
        }
    }
}

impl ReferenceData {
    /// Read and validate a reference data file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let data = Self::from_json(&content).map_err(|e| match e {
            ConfigError::Json(source) => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        tracing::info!(path = %path.display(), version = %data.version, "Loaded reference data");
        Ok(data)
    }

    /// Parse and validate reference data from JSON.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let data: ReferenceData = serde_json::from_str(content).map_err(ConfigError::Json)?;
        data.estimation.validate()?;

        if let Some((field, synonym)) = data.synonyms.canonical_conflicts().into_iter().next() {
            return Err(ConfigError::InvalidValue {
                key: format!("synonyms.{field}.{synonym}"),
                reason: "a synonym cannot remap another value's canonical name".to_string(),
            });
        }

        let missing = data.estimation.missing_rows();
        if !missing.is_empty() {
            tracing::warn!(
                missing = ?missing,
                "Reference data has gaps; affected estimates will be marked Fallback"
            );
        }
        Ok(data)
    }
}
