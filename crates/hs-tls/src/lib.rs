//! # hs-tls: ClientHello fingerprint shaping
//!
//! This crate owns everything between "which client do we look like" and
//! "a TLS engine configured to look like it":
//! - [`TlsProfile`] / [`ProfileRegistry`]: the emulable fingerprints
//! - [`ClientHelloSpec`]: ordered handshake shape
//! - [`FingerprintBuilder`]: profile -> spec, including per-connection
//!   randomized synthesis
//! - [`select_profile`]: probabilistic per-connection profile choice
//! - [`TlsEngine`] / [`RustlsEngine`]: the handshake seam and its rustls
//!   implementation

use std::io;
use tokio::io::{AsyncRead, AsyncWrite};

pub mod builder;
pub mod consts;
mod danger;
pub mod engine;
mod fingerprints;
pub mod profile;
pub mod randomized;
pub mod rustls_engine;
pub mod selector;
pub mod spec;

pub use builder::{BuiltSpec, FingerprintBuilder};
pub use engine::{HandshakeOutcome, HandshakeRequest, TlsEngine};
pub use profile::{ProfileRegistry, TlsProfile};
pub use randomized::RandomizedSeed;
pub use rustls_engine::RustlsEngine;
pub use selector::{select_profile, select_profile_with};
pub use spec::{ClientHelloSpec, Extension};

/// Combined `AsyncRead` + `AsyncWrite` trait
///
/// Implemented for any type that is `AsyncRead + AsyncWrite + Unpin + Send`.
pub trait AsyncReadWrite: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> AsyncReadWrite for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Boxed byte stream, plain transport or TLS.
pub type IoStream = Box<dyn AsyncReadWrite + 'static>;

/// TLS error types
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("unknown TLS profile: {0}")]
    UnknownProfile(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("invalid ClientHello spec: {0}")]
    InvalidSpec(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TLS handshake error: {0}")]
    Handshake(String),

    #[error("Certificate error: {0}")]
    Certificate(String),
}

pub type TlsResult<T> = Result<T, TlsError>;
