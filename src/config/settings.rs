//! Configuration settings for the MONAD solver

use crate::monad::{CoefficientTable, Program};
use crate::sat::CADICAL_CONFIGS;
use crate::search::OptimizerOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub solver: SolverConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Per-run wall-clock limit; `None` waits indefinitely
    pub timeout_seconds: Option<u64>,
    pub cadical_config: String,
    pub parallel: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// ALU program to extract coefficients from; the built-in table otherwise
    pub program_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            solver: SolverConfig {
                timeout_seconds: Some(300),
                cadical_config: "default".to_string(),
                parallel: false,
            },
            input: InputConfig { program_file: None },
            output: OutputConfig {
                format: OutputFormat::Text,
            },
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings.validate()?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Load `path` when it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            debug!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save settings to a YAML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        match self.solver.timeout_seconds {
            Some(0) => anyhow::bail!("Timeout must be positive"),
            Some(seconds) if seconds > 24 * 60 * 60 => {
                warn!(seconds, "timeout exceeds one day");
            }
            _ => {}
        }

        if !CADICAL_CONFIGS.contains(&self.solver.cadical_config.as_str()) {
            anyhow::bail!(
                "Unknown CaDiCaL configuration {:?} (expected one of {})",
                self.solver.cadical_config,
                CADICAL_CONFIGS.join(", ")
            );
        }

        if let Some(program_file) = &self.input.program_file {
            if !program_file.exists() {
                anyhow::bail!("Program file does not exist: {}", program_file.display());
            }
        }

        Ok(())
    }

    /// Merge settings with command line overrides
    pub fn merge_with_cli(&mut self, cli_overrides: &CliOverrides) {
        if let Some(timeout) = cli_overrides.timeout_seconds {
            self.solver.timeout_seconds = Some(timeout);
        }
        if cli_overrides.parallel {
            self.solver.parallel = true;
        }
        if let Some(ref program_file) = cli_overrides.program_file {
            self.input.program_file = Some(program_file.clone());
        }
        if cli_overrides.json {
            self.output.format = OutputFormat::Json;
        }
    }

    /// Coefficients from the configured program, or the built-in table
    pub fn coefficient_table(&self) -> Result<CoefficientTable> {
        match &self.input.program_file {
            Some(path) => load_program(path)?
                .extract_coefficients()
                .with_context(|| format!("Failed to extract coefficients from {}", path.display())),
            None => Ok(CoefficientTable::puzzle()),
        }
    }

    pub fn optimizer_options(&self) -> OptimizerOptions {
        OptimizerOptions {
            timeout: self.solver.timeout_seconds.map(Duration::from_secs),
            cadical_config: self.solver.cadical_config.clone(),
            parallel: self.solver.parallel,
        }
    }
}

/// Read and parse an ALU program file
pub fn load_program(path: &Path) -> Result<Program> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read program file: {}", path.display()))?;
    Program::parse(&text).with_context(|| format!("Failed to parse program file: {}", path.display()))
}

/// Command line overrides for settings
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub timeout_seconds: Option<u64>,
    pub parallel: bool,
    pub program_file: Option<PathBuf>,
    pub json: bool,
}
