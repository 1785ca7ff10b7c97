//! Parameter table, values and immutable snapshots.

use crate::{names, ConfigError, ConfigResult, ParameterSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Float(f64),
    Bool(bool),
    Strings(Vec<String>),
}

impl ParameterValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "a number",
            Self::Bool(_) => "a boolean",
            Self::Strings(_) => "a list of strings",
        }
    }
}

/// Default for [`names::SELECT_RANDOMIZED_TLS_PROFILE_PROBABILITY`].
pub const DEFAULT_RANDOMIZED_TLS_PROFILE_PROBABILITY: f64 = 0.25;

/// Definition of a known parameter: default value and accepted range.
struct Definition {
    name: &'static str,
    default: ParameterValue,
    range: Option<(f64, f64)>,
}

fn definitions() -> [Definition; 3] {
    [
        Definition {
            name: names::SELECT_RANDOMIZED_TLS_PROFILE_PROBABILITY,
            default: ParameterValue::Float(DEFAULT_RANDOMIZED_TLS_PROFILE_PROBABILITY),
            range: Some((0.0, 1.0)),
        },
        Definition {
            name: names::LIMIT_TLS_PROFILES,
            default: ParameterValue::Strings(Vec::new()),
            range: None,
        },
        Definition {
            name: names::TLS_HANDSHAKE_TIMEOUT,
            default: ParameterValue::Float(20.0),
            range: Some((0.001, 3600.0)),
        },
    ]
}

/// Immutable parameter snapshot.
///
/// Every known parameter is present; values not overridden carry their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameters {
    values: BTreeMap<String, ParameterValue>,
}

impl Default for Parameters {
    fn default() -> Self {
        let values = definitions()
            .into_iter()
            .map(|d| (d.name.to_string(), d.default))
            .collect();
        Self { values }
    }
}

impl Parameters {
    /// Build a snapshot from defaults plus a JSON object of overrides.
    ///
    /// `None` and `null` yield the defaults. Unknown names, type mismatches and
    /// out-of-range numbers are rejected.
    pub fn from_overrides(overrides: Option<&Value>) -> ConfigResult<Self> {
        let mut params = Self::default();
        let Some(overrides) = overrides else {
            return Ok(params);
        };
        let map = match overrides {
            Value::Null => return Ok(params),
            Value::Object(map) => map,
            _ => return Err(ConfigError::NotAnObject),
        };

        let defs = definitions();
        for (name, raw) in map {
            let def = defs
                .iter()
                .find(|d| d.name == name)
                .ok_or_else(|| ConfigError::UnknownParameter(name.clone()))?;
            let value = coerce(def, raw)?;
            params.values.insert(name.clone(), value);
        }
        Ok(params)
    }

    /// Raw access to a parameter value.
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    /// Iterate over all parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn coerce(def: &Definition, raw: &Value) -> ConfigResult<ParameterValue> {
    let wrong_type = || ConfigError::WrongType {
        name: def.name.to_string(),
        expected: def.default.kind(),
    };

    match &def.default {
        ParameterValue::Float(_) => {
            let v = raw.as_f64().ok_or_else(wrong_type)?;
            if let Some((min, max)) = def.range {
                if !(min..=max).contains(&v) {
                    return Err(ConfigError::OutOfRange {
                        name: def.name.to_string(),
                        value: v,
                        min,
                        max,
                    });
                }
            }
            Ok(ParameterValue::Float(v))
        }
        ParameterValue::Bool(_) => raw.as_bool().map(ParameterValue::Bool).ok_or_else(wrong_type),
        ParameterValue::Strings(_) => {
            let items = raw.as_array().ok_or_else(wrong_type)?;
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(wrong_type))
                .collect::<ConfigResult<Vec<_>>>()
                .map(ParameterValue::Strings)
        }
    }
}

impl ParameterSource for Parameters {
    fn float(&self, name: &str) -> Option<f64> {
        match self.values.get(name)? {
            ParameterValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn strings(&self, name: &str) -> Option<Vec<String>> {
        match self.values.get(name)? {
            ParameterValue::Strings(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name)? {
            ParameterValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}
