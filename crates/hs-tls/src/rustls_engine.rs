//! rustls-backed [`TlsEngine`].
//!
//! rustls exposes a fixed hello layout, so the engine applies the parts of a
//! [`ClientHelloSpec`] it can express:
//! - cipher-suite order (custom `CryptoProvider`)
//! - named-group order, which also picks the key share
//! - signature-algorithm order (via the certificate verifier)
//! - version range, ALPN, SNI, session-ticket presence
//!
//! GREASE, extension order and the remaining extensions stay in the spec for
//! fingerprint bookkeeping. A spec with nothing expressible in one of the
//! categories above is rejected rather than padded with library defaults.

use crate::consts::{ext, group, sigalg, suite, version};
use crate::danger::{signature_scheme, NoVerify, OrderedSchemes};
use crate::engine::{HandshakeOutcome, HandshakeRequest, TlsEngine};
use crate::spec::{ClientHelloSpec, Extension};
use crate::{IoStream, TlsError, TlsResult};
use async_trait::async_trait;
use rustls::client::danger::ServerCertVerifier;
use rustls::client::{Resumption, WebPkiServerVerifier};
use rustls::crypto::{ring, CryptoProvider, SupportedKxGroup};
use rustls::{ClientConfig, ProtocolVersion, RootCertStore, SupportedCipherSuite};
use rustls::{SupportedProtocolVersion, SignatureScheme};
use rustls_pki_types::ServerName;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_rustls::TlsConnector;
use tracing::debug;

/// Production TLS engine on rustls + ring.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustlsEngine;

impl RustlsEngine {
    pub const fn new() -> Self {
        Self
    }

    /// Build the per-connection client config for `request`.
    pub fn client_config(&self, request: &HandshakeRequest<'_>) -> TlsResult<ClientConfig> {
        let spec = request.spec;

        let cipher_suites: Vec<SupportedCipherSuite> = spec
            .cipher_suites
            .iter()
            .filter_map(|id| cipher_suite(*id))
            .collect();
        if cipher_suites.is_empty() {
            return Err(TlsError::Config(
                "no cipher suite in the spec is supported by rustls".into(),
            ));
        }

        let kx_groups: Vec<&'static dyn SupportedKxGroup> = spec
            .supported_groups()
            .iter()
            .filter_map(|id| kx_group(*id))
            .collect();
        if kx_groups.is_empty() {
            return Err(TlsError::Config(
                "no named group in the spec is supported by rustls".into(),
            ));
        }

        let versions = protocol_versions(spec);
        if versions.is_empty() {
            return Err(TlsError::Config(
                "spec enables neither TLS 1.2 nor TLS 1.3".into(),
            ));
        }

        let schemes: Vec<SignatureScheme> = spec
            .signature_algorithms()
            .iter()
            .filter_map(|id| signature_scheme(*id))
            .collect();

        let provider = Arc::new(CryptoProvider {
            cipher_suites,
            kx_groups,
            ..ring::default_provider()
        });

        let verifier: Arc<dyn ServerCertVerifier> = if request.skip_verify {
            if schemes.is_empty() {
                return Err(TlsError::Config(
                    "no signature algorithm in the spec is supported by rustls".into(),
                ));
            }
            Arc::new(NoVerify::new(schemes))
        } else {
            let roots = root_store(request.extra_ca_files)?;
            let inner = WebPkiServerVerifier::builder_with_provider(
                Arc::new(roots),
                Arc::clone(&provider),
            )
            .build()
            .map_err(|e| TlsError::Config(e.to_string()))?;
            let ordered = OrderedSchemes::new(inner, &schemes);
            if ordered.is_empty() {
                return Err(TlsError::Config(
                    "no signature algorithm in the spec can be verified".into(),
                ));
            }
            Arc::new(ordered)
        };

        let mut config = ClientConfig::builder_with_provider(provider)
            .with_protocol_versions(&versions)
            .map_err(|e| TlsError::Config(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_no_client_auth();

        config.alpn_protocols = spec.alpn().iter().map(|p| p.as_bytes().to_vec()).collect();
        config.enable_sni = spec.has_extension(ext::SERVER_NAME);
        if !spec.has_extension(ext::SESSION_TICKET) {
            config.resumption = Resumption::disabled();
        }

        Ok(config)
    }
}

#[async_trait]
impl TlsEngine for RustlsEngine {
    fn name(&self) -> &'static str {
        "rustls"
    }

    /// Hand-written approximation of the hello an unmodified rustls 0.23/ring
    /// client sends; not read back from rustls.
    ///
    /// Only a best-effort collision check for the builder. Whether a profile
    /// has a deliberate hello is decided by
    /// [`ProfileRegistry::has_custom_spec`](crate::ProfileRegistry::has_custom_spec).
    fn library_default_spec(&self) -> Option<ClientHelloSpec> {
        Some(ClientHelloSpec {
            tls_version_min: version::TLS12,
            tls_version_max: version::TLS13,
            cipher_suites: vec![
                suite::TLS13_AES_256_GCM_SHA384,
                suite::TLS13_AES_128_GCM_SHA256,
                suite::TLS13_CHACHA20_POLY1305_SHA256,
                suite::ECDHE_ECDSA_AES256_GCM_SHA384,
                suite::ECDHE_ECDSA_AES128_GCM_SHA256,
                suite::ECDHE_ECDSA_CHACHA20_POLY1305,
                suite::ECDHE_RSA_AES256_GCM_SHA384,
                suite::ECDHE_RSA_AES128_GCM_SHA256,
                suite::ECDHE_RSA_CHACHA20_POLY1305,
            ],
            compression_methods: vec![0],
            extensions: vec![
                Extension::SupportedVersions {
                    versions: vec![version::TLS13, version::TLS12],
                },
                Extension::EcPointFormats { formats: vec![0] },
                Extension::ServerName,
                Extension::SupportedGroups {
                    groups: vec![group::X25519, group::SECP256R1, group::SECP384R1],
                },
                Extension::SignatureAlgorithms {
                    schemes: vec![
                        sigalg::ECDSA_SECP384R1_SHA384,
                        sigalg::ECDSA_SECP256R1_SHA256,
                        sigalg::ED25519,
                        sigalg::RSA_PSS_RSAE_SHA512,
                        sigalg::RSA_PSS_RSAE_SHA384,
                        sigalg::RSA_PSS_RSAE_SHA256,
                        sigalg::RSA_PKCS1_SHA512,
                        sigalg::RSA_PKCS1_SHA384,
                        sigalg::RSA_PKCS1_SHA256,
                    ],
                },
                Extension::ExtendedMasterSecret,
                Extension::StatusRequest,
                Extension::KeyShare {
                    groups: vec![group::X25519],
                },
                Extension::PskKeyExchangeModes { modes: vec![1] },
                Extension::SessionTicket,
            ],
        })
    }

    async fn handshake(
        &self,
        stream: IoStream,
        request: &HandshakeRequest<'_>,
    ) -> TlsResult<HandshakeOutcome> {
        let config = self.client_config(request)?;
        let server_name = ServerName::try_from(request.server_name.to_string()).map_err(|e| {
            TlsError::Config(format!("invalid server name {:?}: {e}", request.server_name))
        })?;

        let connector = TlsConnector::from(Arc::new(config));
        let tls = connector
            .connect(server_name, stream)
            .await
            .map_err(map_handshake_error)?;

        let (_, session) = tls.get_ref();
        let alpn_protocol = session.alpn_protocol().map(<[u8]>::to_vec);
        let protocol_version = session.protocol_version().and_then(wire_version);
        debug!(
            server_name = request.server_name,
            ?protocol_version,
            alpn = ?alpn_protocol.as_deref().map(String::from_utf8_lossy),
            "rustls handshake complete"
        );

        Ok(HandshakeOutcome {
            stream: Box::new(tls),
            alpn_protocol,
            protocol_version,
        })
    }
}

/// Map fingerprint cipher suite IDs to rustls suites; unsupported IDs yield `None`.
fn cipher_suite(id: u16) -> Option<SupportedCipherSuite> {
    use rustls::crypto::ring::cipher_suite as cs;

    Some(match id {
        suite::TLS13_AES_128_GCM_SHA256 => cs::TLS13_AES_128_GCM_SHA256,
        suite::TLS13_AES_256_GCM_SHA384 => cs::TLS13_AES_256_GCM_SHA384,
        suite::TLS13_CHACHA20_POLY1305_SHA256 => cs::TLS13_CHACHA20_POLY1305_SHA256,
        suite::ECDHE_ECDSA_AES128_GCM_SHA256 => cs::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
        suite::ECDHE_ECDSA_AES256_GCM_SHA384 => cs::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
        suite::ECDHE_ECDSA_CHACHA20_POLY1305 => {
            cs::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256
        }
        suite::ECDHE_RSA_AES128_GCM_SHA256 => cs::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        suite::ECDHE_RSA_AES256_GCM_SHA384 => cs::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
        suite::ECDHE_RSA_CHACHA20_POLY1305 => cs::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
        _ => return None,
    })
}

fn kx_group(id: u16) -> Option<&'static dyn SupportedKxGroup> {
    match id {
        group::X25519 => Some(ring::kx_group::X25519),
        group::SECP256R1 => Some(ring::kx_group::SECP256R1),
        group::SECP384R1 => Some(ring::kx_group::SECP384R1),
        _ => None,
    }
}

/// Versions inside the spec's range, highest first.
fn protocol_versions(spec: &ClientHelloSpec) -> Vec<&'static SupportedProtocolVersion> {
    let range = spec.tls_version_min..=spec.tls_version_max;
    let mut out = Vec::with_capacity(2);
    if range.contains(&version::TLS13) {
        out.push(&rustls::version::TLS13);
    }
    if range.contains(&version::TLS12) {
        out.push(&rustls::version::TLS12);
    }
    out
}

fn wire_version(v: ProtocolVersion) -> Option<u16> {
    match v {
        ProtocolVersion::TLSv1_2 => Some(version::TLS12),
        ProtocolVersion::TLSv1_3 => Some(version::TLS13),
        _ => None,
    }
}

/// webpki roots plus the certificates found in `extra` PEM files.
fn root_store(extra: &[PathBuf]) -> TlsResult<RootCertStore> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    for path in extra {
        let bytes = std::fs::read(path)
            .map_err(|e| TlsError::Config(format!("read CA file {}: {e}", path.display())))?;
        let mut rd = BufReader::new(&bytes[..]);
        let mut added = 0usize;
        for der in rustls_pemfile::certs(&mut rd) {
            let der = der.map_err(|e| {
                TlsError::Certificate(format!("parse CA file {}: {e}", path.display()))
            })?;
            roots
                .add(der)
                .map_err(|e| TlsError::Certificate(format!("{}: {e}", path.display())))?;
            added += 1;
        }
        if added == 0 {
            return Err(TlsError::Config(format!(
                "no certificates in CA file {}",
                path.display()
            )));
        }
        debug!(path = %path.display(), added, "loaded extra trust anchors");
    }

    Ok(roots)
}

/// tokio-rustls reports rustls failures as `io::Error` wrapping `rustls::Error`.
fn map_handshake_error(err: std::io::Error) -> TlsError {
    match err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    {
        Some(rustls::Error::InvalidCertificate(reason)) => {
            TlsError::Certificate(format!("{reason:?}"))
        }
        Some(other) => TlsError::Handshake(other.to_string()),
        None => TlsError::Io(err),
    }
}
