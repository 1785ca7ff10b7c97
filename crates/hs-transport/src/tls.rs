//! # 指纹化 TLS 拨号 / Fingerprint-shaped TLS dial
//!
//! [`dial`] runs one connection attempt as a linear pipeline:
//!
//! `Idle -> Resolving -> Connecting -> Handshaking -> Established | Failed`
//!
//! 1. resolve the profile (explicit, or [`select_profile`]);
//! 2. build its ClientHello spec (unknown profiles fail here, before any I/O);
//! 3. open the transport through the injected [`Dialer`];
//! 4. hand transport and spec to the [`TlsEngine`].
//!
//! Every step after 3 owns the transport, so any failure or cancellation
//! drops (closes) it before the error is returned. Nothing is retried.

use crate::context::{CancelReason, DialContext};
use crate::dialer::{split_host_port, DialError, Dialer, IoStream};
use hs_config::ParameterSource;
use hs_tls::{
    select_profile, ClientHelloSpec, FingerprintBuilder, HandshakeRequest, ProfileRegistry,
    RandomizedSeed, RustlsEngine, TlsEngine, TlsError, TlsProfile,
};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::debug;

/// Pipeline phase an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialPhase {
    Select,
    Connect,
    Handshake,
}

impl fmt::Display for DialPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Select => "select",
            Self::Connect => "connect",
            Self::Handshake => "handshake",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialState {
    Idle,
    Resolving,
    Connecting,
    Handshaking,
    Established,
    Failed,
}

#[derive(Debug, Error)]
pub enum TlsDialError {
    /// The requested profile id is not in the registry. No I/O was attempted.
    #[error("select: unknown TLS profile {0:?}")]
    UnknownProfile(String),

    #[error("{phase}: configuration error: {message}")]
    Config {
        phase: DialPhase,
        profile: Option<TlsProfile>,
        message: String,
    },

    #[error("connect with profile {profile}: {source}")]
    Connect {
        profile: TlsProfile,
        #[source]
        source: DialError,
    },

    #[error("handshake with profile {profile}: {source}")]
    Handshake {
        profile: TlsProfile,
        #[source]
        source: TlsError,
    },

    /// The caller's context ended first; distinct from any peer-side failure.
    #[error("{phase}: {reason}")]
    Cancelled {
        phase: DialPhase,
        profile: Option<TlsProfile>,
        reason: CancelReason,
    },
}

impl TlsDialError {
    pub fn phase(&self) -> DialPhase {
        match self {
            Self::UnknownProfile(_) => DialPhase::Select,
            Self::Config { phase, .. } | Self::Cancelled { phase, .. } => *phase,
            Self::Connect { .. } => DialPhase::Connect,
            Self::Handshake { .. } => DialPhase::Handshake,
        }
    }

    /// Profile in effect when the error was raised.
    pub fn profile(&self) -> Option<TlsProfile> {
        match self {
            Self::UnknownProfile(_) => None,
            Self::Config { profile, .. } | Self::Cancelled { profile, .. } => *profile,
            Self::Connect { profile, .. } | Self::Handshake { profile, .. } => Some(*profile),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The peer's certificate was rejected.
    pub fn is_certificate_error(&self) -> bool {
        matches!(
            self,
            Self::Handshake {
                source: TlsError::Certificate(_),
                ..
            }
        )
    }
}

/// Per-call dial parameters.
#[derive(Clone)]
pub struct DialConfig {
    /// Explicit profile id; `None` selects one per call.
    pub profile: Option<String>,
    pub dialer: Arc<dyn Dialer>,
    /// Take the server name from the dial address instead of `sni_server_name`.
    pub use_dial_addr_sni: bool,
    pub sni_server_name: Option<String>,
    pub skip_verify: bool,
    pub parameters: Arc<dyn ParameterSource>,
    /// Replay a randomized hello; ignored for fixed profiles.
    pub randomized_seed: Option<RandomizedSeed>,
    pub trusted_ca_files: Vec<PathBuf>,
    /// Defaults to [`RustlsEngine`].
    pub engine: Option<Arc<dyn TlsEngine>>,
}

impl DialConfig {
    pub fn new(dialer: Arc<dyn Dialer>, parameters: Arc<dyn ParameterSource>) -> Self {
        Self {
            profile: None,
            dialer,
            use_dial_addr_sni: true,
            sni_server_name: None,
            skip_verify: false,
            parameters,
            randomized_seed: None,
            trusted_ca_files: Vec::new(),
            engine: None,
        }
    }

    pub fn with_profile(mut self, id: impl Into<String>) -> Self {
        self.profile = Some(id.into());
        self
    }

    /// Use an explicit server name; turns off dial-address SNI.
    pub fn with_sni_server_name(mut self, name: impl Into<String>) -> Self {
        self.sni_server_name = Some(name.into());
        self.use_dial_addr_sni = false;
        self
    }

    pub fn with_use_dial_addr_sni(mut self, enabled: bool) -> Self {
        self.use_dial_addr_sni = enabled;
        self
    }

    pub fn with_skip_verify(mut self, skip: bool) -> Self {
        self.skip_verify = skip;
        self
    }

    pub fn with_randomized_seed(mut self, seed: RandomizedSeed) -> Self {
        self.randomized_seed = Some(seed);
        self
    }

    pub fn with_trusted_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.trusted_ca_files.push(path.into());
        self
    }

    pub fn with_engine(mut self, engine: Arc<dyn TlsEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    fn server_name<'a>(&'a self, address: &'a str) -> Result<&'a str, String> {
        if self.use_dial_addr_sni {
            return split_host_port(address)
                .map(|(host, _)| host)
                .map_err(|e| e.to_string());
        }
        match self.sni_server_name.as_deref() {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err("no server name: set sni_server_name or use_dial_addr_sni".into()),
        }
    }
}

impl fmt::Debug for DialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialConfig")
            .field("profile", &self.profile)
            .field("use_dial_addr_sni", &self.use_dial_addr_sni)
            .field("sni_server_name", &self.sni_server_name)
            .field("skip_verify", &self.skip_verify)
            .field("randomized_seed", &self.randomized_seed)
            .field("trusted_ca_files", &self.trusted_ca_files)
            .field("engine", &self.engine.as_ref().map(|e| e.name()))
            .finish_non_exhaustive()
    }
}

/// Established fingerprinted TLS connection plus what shaped it.
pub struct TlsConnection {
    stream: IoStream,
    profile: TlsProfile,
    seed: Option<RandomizedSeed>,
    spec: ClientHelloSpec,
    ja3: String,
    server_name: String,
    alpn_protocol: Option<Vec<u8>>,
    protocol_version: Option<u16>,
}

impl TlsConnection {
    pub fn profile(&self) -> TlsProfile {
        self.profile
    }

    /// Seed of the randomized hello, if the randomized profile was used.
    pub fn randomized_seed(&self) -> Option<RandomizedSeed> {
        self.seed
    }

    pub fn spec(&self) -> &ClientHelloSpec {
        &self.spec
    }

    /// JA3 hash of the spec that shaped this connection.
    pub fn ja3(&self) -> &str {
        &self.ja3
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn alpn_protocol(&self) -> Option<&[u8]> {
        self.alpn_protocol.as_deref()
    }

    pub fn protocol_version(&self) -> Option<u16> {
        self.protocol_version
    }

    pub fn into_inner(self) -> IoStream {
        self.stream
    }
}

impl fmt::Debug for TlsConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConnection")
            .field("profile", &self.profile)
            .field("seed", &self.seed)
            .field("ja3", &self.ja3)
            .field("server_name", &self.server_name)
            .field("protocol_version", &self.protocol_version)
            .finish_non_exhaustive()
    }
}

impl AsyncRead for TlsConnection {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for TlsConnection {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

/// Logs state transitions of one dial attempt.
struct Transitions<'a> {
    address: &'a str,
    state: DialState,
}

impl<'a> Transitions<'a> {
    fn new(address: &'a str) -> Self {
        Self {
            address,
            state: DialState::Idle,
        }
    }

    fn to(&mut self, next: DialState) {
        debug!(address = self.address, from = ?self.state, to = ?next, "tls dial");
        self.state = next;
    }
}

/// Connect to `address` over `network` and complete a fingerprinted TLS handshake.
pub async fn dial(
    ctx: &DialContext,
    network: &str,
    address: &str,
    config: &DialConfig,
) -> Result<TlsConnection, TlsDialError> {
    let mut states = Transitions::new(address);
    let result = dial_inner(ctx, network, address, config, &mut states).await;
    match &result {
        Ok(conn) => {
            states.to(DialState::Established);
            debug!(profile = %conn.profile, ja3 = %conn.ja3, "tls dial established");
        }
        Err(e) => {
            states.to(DialState::Failed);
            debug!(error = %e, phase = %e.phase(), "tls dial failed");
        }
    }
    result
}

async fn dial_inner(
    ctx: &DialContext,
    network: &str,
    address: &str,
    config: &DialConfig,
    states: &mut Transitions<'_>,
) -> Result<TlsConnection, TlsDialError> {
    states.to(DialState::Resolving);
    let engine: Arc<dyn TlsEngine> = config
        .engine
        .clone()
        .unwrap_or_else(|| Arc::new(RustlsEngine::new()) as Arc<dyn TlsEngine>);
    let registry = ProfileRegistry::global();

    let profile = match config.profile.as_deref() {
        Some(id) => registry
            .lookup(id)
            .map_err(|_| TlsDialError::UnknownProfile(id.to_string()))?,
        None => select_profile(config.parameters.as_ref()),
    };

    let builder = FingerprintBuilder::new(registry, engine.as_ref());
    let built = match config.randomized_seed {
        Some(seed) => builder.build_spec_with_seed(profile, seed),
        None => builder.build_spec(profile),
    }
    .map_err(|e| match e {
        TlsError::UnknownProfile(id) => TlsDialError::UnknownProfile(id),
        other => TlsDialError::Config {
            phase: DialPhase::Select,
            profile: Some(profile),
            message: other.to_string(),
        },
    })?;

    let server_name = config
        .server_name(address)
        .map_err(|message| TlsDialError::Config {
            phase: DialPhase::Select,
            profile: Some(profile),
            message,
        })?
        .to_string();
    debug!(%profile, seed = ?built.seed, server_name = %server_name, "tls profile resolved");

    if let Some(reason) = ctx.err() {
        return Err(TlsDialError::Cancelled {
            phase: DialPhase::Select,
            profile: Some(profile),
            reason,
        });
    }

    states.to(DialState::Connecting);
    let cancelled = |phase: DialPhase, reason: CancelReason| TlsDialError::Cancelled {
        phase,
        profile: Some(profile),
        reason,
    };
    let stream = match ctx.run(config.dialer.dial(ctx, network, address)).await {
        Err(reason) | Ok(Err(DialError::Cancelled(reason))) => {
            return Err(cancelled(DialPhase::Connect, reason))
        }
        Ok(Err(source)) => return Err(TlsDialError::Connect { profile, source }),
        Ok(Ok(stream)) => stream,
    };

    states.to(DialState::Handshaking);
    let request = HandshakeRequest {
        spec: &built.spec,
        server_name: &server_name,
        skip_verify: config.skip_verify,
        extra_ca_files: &config.trusted_ca_files,
    };
    // `stream` moves into the handshake future; dropping the future closes it.
    let outcome = match ctx.run(engine.handshake(stream, &request)).await {
        Err(reason) => return Err(cancelled(DialPhase::Handshake, reason)),
        Ok(Err(TlsError::Config(message))) => {
            return Err(TlsDialError::Config {
                phase: DialPhase::Handshake,
                profile: Some(profile),
                message,
            })
        }
        Ok(Err(source)) => return Err(TlsDialError::Handshake { profile, source }),
        Ok(Ok(outcome)) => outcome,
    };

    Ok(TlsConnection {
        stream: outcome.stream,
        profile,
        seed: built.seed,
        ja3: built.spec.ja3_hash(),
        spec: built.spec,
        server_name,
        alpn_protocol: outcome.alpn_protocol,
        protocol_version: outcome.protocol_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialer::{DialFuture, FnDialer};
    use hs_config::Parameters;

    fn refusing_config() -> DialConfig {
        let dialer = FnDialer::new(|_ctx, _network, _address| {
            Box::pin(async { Err(DialError::Other("refused".into())) }) as DialFuture
        });
        DialConfig::new(Arc::new(dialer), Arc::new(Parameters::default()))
    }

    #[test]
    fn server_name_sources() {
        let cfg = refusing_config();
        assert_eq!(cfg.server_name("example.com:443").unwrap(), "example.com");
        assert_eq!(cfg.server_name("[::1]:443").unwrap(), "::1");

        let cfg = refusing_config().with_sni_server_name("front.example");
        assert_eq!(cfg.server_name("10.0.0.1:443").unwrap(), "front.example");

        let cfg = refusing_config().with_use_dial_addr_sni(false);
        assert!(cfg.server_name("example.com:443").is_err());
    }

    #[tokio::test]
    async fn connect_errors_carry_phase_and_profile() {
        let cfg = refusing_config().with_profile("Chrome-70");
        let err = dial(&DialContext::background(), "tcp", "example.com:443", &cfg)
            .await
            .unwrap_err();
        assert_eq!(err.phase(), DialPhase::Connect);
        assert_eq!(err.profile(), Some(TlsProfile::Chrome70));
        assert!(!err.is_cancelled());
    }

    #[tokio::test]
    async fn missing_server_name_fails_before_connect() {
        let cfg = refusing_config()
            .with_profile("Firefox-65")
            .with_use_dial_addr_sni(false);
        let err = dial(&DialContext::background(), "tcp", "example.com:443", &cfg)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TlsDialError::Config {
                phase: DialPhase::Select,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn cancelled_context_fails_in_select() {
        let ctx = DialContext::background();
        ctx.cancel();
        let err = dial(&ctx, "tcp", "example.com:443", &refusing_config())
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.phase(), DialPhase::Select);
    }
}
