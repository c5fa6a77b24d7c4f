//! Run configuration
use std::{fs, path::Path};

use chip8_vm::{Chip8Conf, KeyCode, Quirks};
use serde::Deserialize;

use crate::error::AppError;

/// Step budget when neither the command line nor the configuration sets one.
pub const DEFAULT_MAX_STEPS: usize = 100_000;

/// Settings for a headless run, loaded from YAML.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub seed: Option<u64>,
    pub max_steps: Option<usize>,
    pub quirks: Quirks,
    /// Scripted keypad input.
    pub keys: Vec<ScriptedKey>,
}

/// A key held down from step `at` until step `release`.
///
/// Without a release step the key stays down until the run ends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedKey {
    pub key: KeyCode,
    pub at: usize,
    #[serde(default)]
    pub release: Option<usize>,
}

impl ScriptedKey {
    pub fn is_held(&self, step: usize) -> bool {
        step >= self.at && self.release.map_or(true, |release| step < release)
    }
}

impl RunConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let source = fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml(&source)?;
        log::debug!("loaded run configuration from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    pub fn vm_conf(&self) -> Chip8Conf {
        Chip8Conf {
            quirks: self.quirks,
            seed: self.seed,
        }
    }
}
