//! Hot-reloadable parameter holder.
//!
//! Readers take an `Arc<Parameters>` snapshot and keep using it for the rest of
//! their call; writers validate a complete replacement first and then swap it
//! in under a short write lock. A failed update leaves the current snapshot
//! untouched.

use crate::{ConfigError, ConfigResult, Parameters};
use parking_lot::RwLock;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug)]
pub struct ClientParameters {
    current: RwLock<Arc<Parameters>>,
}

impl Default for ClientParameters {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(Parameters::default())),
        }
    }
}

impl ClientParameters {
    /// Create a holder from defaults plus optional JSON overrides.
    pub fn new(overrides: Option<&Value>) -> ConfigResult<Self> {
        let params = Parameters::from_overrides(overrides)?;
        Ok(Self {
            current: RwLock::new(Arc::new(params)),
        })
    }

    /// Create a holder from a JSON or YAML file of overrides.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let overrides = read_overrides(path.as_ref())?;
        Self::new(Some(&overrides))
    }

    /// Current snapshot.
    pub fn get(&self) -> Arc<Parameters> {
        Arc::clone(&self.current.read())
    }

    /// Replace the snapshot with defaults plus `overrides`.
    pub fn set(&self, overrides: Option<&Value>) -> ConfigResult<()> {
        let next = Arc::new(Parameters::from_overrides(overrides)?);
        *self.current.write() = next;
        tracing::debug!("parameters updated");
        Ok(())
    }

    /// Re-read overrides from a file and swap them in.
    pub fn reload_from_file(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let overrides = read_overrides(path)?;
        self.set(Some(&overrides))?;
        tracing::info!(path = %path.display(), "parameters reloaded");
        Ok(())
    }
}

fn read_overrides(path: &Path) -> ConfigResult<Value> {
    let text = std::fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str::<Value>(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    } else {
        serde_json::from_str::<Value>(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
