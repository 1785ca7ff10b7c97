//! # hs-config: runtime parameters for helloshape
//!
//! This crate is the read side of the dynamic parameter subsystem consumed by the
//! TLS profile selector and the dial engine:
//! - [`ParameterSource`]: read-only, named accessor used by consumers
//! - [`Parameters`]: an immutable, fully-defaulted snapshot
//! - [`ClientParameters`]: hot-reloadable holder that swaps snapshots atomically
//!
//! ## Workflow
//! `overrides (JSON/YAML)` -> `validate against the known table` -> `snapshot` -> `Arc` swap
//!
//! Consumers never read ambient state: they are handed a snapshot (or any other
//! `ParameterSource`) explicitly and read it for the duration of one call.

use thiserror::Error;

pub mod client;
pub mod params;

pub use client::ClientParameters;
pub use params::{ParameterValue, Parameters, DEFAULT_RANDOMIZED_TLS_PROFILE_PROBABILITY};

/// Parameter names understood by helloshape.
pub mod names {
    /// Probability, in [0, 1], that the selector picks the randomized TLS profile.
    pub const SELECT_RANDOMIZED_TLS_PROFILE_PROBABILITY: &str =
        "SelectRandomizedTLSProfileProbability";

    /// When non-empty, restricts profile selection to the listed profile ids.
    pub const LIMIT_TLS_PROFILES: &str = "LimitTLSProfiles";

    /// Seconds a caller should allow for transport connect plus TLS handshake.
    pub const TLS_HANDSHAKE_TIMEOUT: &str = "TLSHandshakeTimeout";
}

/// Read-only accessor for named parameters.
///
/// Implementations must return consistent values for the lifetime of the
/// borrowed value; hot reload happens by handing out a new source, never by
/// mutating one in place.
pub trait ParameterSource: Send + Sync {
    /// Floating point parameter, `None` when unknown or of another type.
    fn float(&self, name: &str) -> Option<f64>;

    /// String-list parameter, `None` when unknown or of another type.
    fn strings(&self, name: &str) -> Option<Vec<String>>;

    /// Boolean parameter, `None` when unknown or of another type.
    fn bool(&self, name: &str) -> Option<bool> {
        let _ = name;
        None
    }
}

impl<T: ParameterSource + ?Sized> ParameterSource for std::sync::Arc<T> {
    fn float(&self, name: &str) -> Option<f64> {
        (**self).float(name)
    }

    fn strings(&self, name: &str) -> Option<Vec<String>> {
        (**self).strings(name)
    }

    fn bool(&self, name: &str) -> Option<bool> {
        (**self).bool(name)
    }
}

/// Errors raised while building or loading parameter snapshots.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("parameter {name}: expected {expected}")]
    WrongType { name: String, expected: &'static str },

    #[error("parameter {name}: value {value} outside [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("parameters must be an object")]
    NotAnObject,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
