//! Compiler configuration types.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for a compilation (kiln.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Whether the constant folding pass runs (default: true).
    #[serde(default = "default_true")]
    pub fold_constants: bool,
    /// Dump the typed IR tree to stderr after checking.
    #[serde(default)]
    pub dump_ir: bool,
    /// Dump the emitted instruction streams to stderr.
    #[serde(default)]
    pub dump_code: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            fold_constants: true,
            dump_ir: false,
            dump_code: false,
        }
    }
}

impl CompilerConfig {
    /// Load configuration from a directory containing kiln.toml.
    /// A missing file yields the defaults.
    pub fn load(dir: &Path) -> Result<Self, String> {
        let config_path = dir.join("kiln.toml");
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&config_path)
            .map_err(|e| format!("failed to read kiln.toml: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse kiln.toml: {}", e))
    }

    /// Save configuration to a directory as kiln.toml.
    pub fn save(&self, dir: &Path) -> Result<(), String> {
        let config_path = dir.join("kiln.toml");
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("failed to serialize kiln.toml: {}", e))?;
        fs::write(&config_path, content).map_err(|e| format!("failed to write kiln.toml: {}", e))
    }
}
