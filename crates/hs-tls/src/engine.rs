//! The TLS engine seam.
//!
//! An engine takes an open transport and a [`ClientHelloSpec`] and runs the
//! client handshake with a hello shaped by that spec. The protocol state
//! machine and record layer live entirely behind this trait.

use crate::spec::ClientHelloSpec;
use crate::{IoStream, TlsResult};
use async_trait::async_trait;
use std::path::PathBuf;

/// Per-handshake input.
#[derive(Debug, Clone)]
pub struct HandshakeRequest<'a> {
    pub spec: &'a ClientHelloSpec,
    /// Name for SNI and certificate verification.
    pub server_name: &'a str,
    pub skip_verify: bool,
    /// PEM files whose certificates are trusted in addition to the built-in roots.
    pub extra_ca_files: &'a [PathBuf],
}

/// Established TLS session.
pub struct HandshakeOutcome {
    pub stream: IoStream,
    pub alpn_protocol: Option<Vec<u8>>,
    /// Negotiated version as its wire code point (`0x0303`, `0x0304`).
    pub protocol_version: Option<u16>,
}

impl std::fmt::Debug for HandshakeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeOutcome")
            .field("alpn_protocol", &self.alpn_protocol)
            .field("protocol_version", &self.protocol_version)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait TlsEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// The hello this engine sends when left unconfigured, if it can say.
    ///
    /// Fingerprint builders refuse to hand out a spec equal to this. The
    /// value may be approximate; membership in the profile table, checked by
    /// [`ProfileRegistry::has_custom_spec`](crate::ProfileRegistry::has_custom_spec),
    /// is what makes a profile resolvable.
    fn library_default_spec(&self) -> Option<ClientHelloSpec> {
        None
    }

    /// Run the client handshake over `stream`.
    ///
    /// On error the stream has been dropped. Dropping the returned future
    /// also drops the stream.
    async fn handshake(
        &self,
        stream: IoStream,
        request: &HandshakeRequest<'_>,
    ) -> TlsResult<HandshakeOutcome>;
}
