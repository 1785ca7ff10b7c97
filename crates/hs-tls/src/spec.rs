//! ClientHello shape model.
//!
//! A [`ClientHelloSpec`] is the handshake-shaping input handed to a TLS engine:
//! version range, ordered cipher suites and an ordered list of extensions with
//! their parameters. GREASE positions are recorded with
//! [`GREASE_PLACEHOLDER`](crate::consts::GREASE_PLACEHOLDER).

use crate::consts::{ext, group, is_grease, psk_mode, suite, version, GREASE_PLACEHOLDER};
use crate::{TlsError, TlsResult};
use serde::Serialize;
use std::collections::HashSet;

/// One ClientHello extension together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Extension {
    Grease,
    ServerName,
    ExtendedMasterSecret,
    RenegotiationInfo,
    SupportedGroups { groups: Vec<u16> },
    EcPointFormats { formats: Vec<u8> },
    SessionTicket,
    Alpn { protocols: Vec<String> },
    StatusRequest,
    SignatureAlgorithms { schemes: Vec<u16> },
    SignedCertificateTimestamp,
    KeyShare { groups: Vec<u16> },
    PskKeyExchangeModes { modes: Vec<u8> },
    SupportedVersions { versions: Vec<u16> },
    CompressCertificate { algorithms: Vec<u16> },
    RecordSizeLimit { limit: u16 },
    ChannelId,
    Padding,
}

impl Extension {
    /// IANA extension type.
    pub fn id(&self) -> u16 {
        match self {
            Self::Grease => GREASE_PLACEHOLDER,
            Self::ServerName => ext::SERVER_NAME,
            Self::ExtendedMasterSecret => ext::EXTENDED_MASTER_SECRET,
            Self::RenegotiationInfo => ext::RENEGOTIATION_INFO,
            Self::SupportedGroups { .. } => ext::SUPPORTED_GROUPS,
            Self::EcPointFormats { .. } => ext::EC_POINT_FORMATS,
            Self::SessionTicket => ext::SESSION_TICKET,
            Self::Alpn { .. } => ext::ALPN,
            Self::StatusRequest => ext::STATUS_REQUEST,
            Self::SignatureAlgorithms { .. } => ext::SIGNATURE_ALGORITHMS,
            Self::SignedCertificateTimestamp => ext::SIGNED_CERTIFICATE_TIMESTAMP,
            Self::KeyShare { .. } => ext::KEY_SHARE,
            Self::PskKeyExchangeModes { .. } => ext::PSK_KEY_EXCHANGE_MODES,
            Self::SupportedVersions { .. } => ext::SUPPORTED_VERSIONS,
            Self::CompressCertificate { .. } => ext::COMPRESS_CERTIFICATE,
            Self::RecordSizeLimit { .. } => ext::RECORD_SIZE_LIMIT,
            Self::ChannelId => ext::CHANNEL_ID,
            Self::Padding => ext::PADDING,
        }
    }
}

/// Handshake shape for one connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClientHelloSpec {
    pub tls_version_min: u16,
    pub tls_version_max: u16,
    pub cipher_suites: Vec<u16>,
    pub compression_methods: Vec<u8>,
    pub extensions: Vec<Extension>,
}

impl ClientHelloSpec {
    pub fn has_extension(&self, id: u16) -> bool {
        self.extensions.iter().any(|e| e.id() == id)
    }

    pub fn supports_tls13(&self) -> bool {
        self.tls_version_max >= version::TLS13
    }

    /// Supported groups in order, GREASE included.
    pub fn supported_groups(&self) -> &[u16] {
        self.extensions
            .iter()
            .find_map(|e| match e {
                Extension::SupportedGroups { groups } => Some(groups.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn signature_algorithms(&self) -> &[u16] {
        self.extensions
            .iter()
            .find_map(|e| match e {
                Extension::SignatureAlgorithms { schemes } => Some(schemes.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn key_share_groups(&self) -> &[u16] {
        self.extensions
            .iter()
            .find_map(|e| match e {
                Extension::KeyShare { groups } => Some(groups.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn alpn(&self) -> &[String] {
        self.extensions
            .iter()
            .find_map(|e| match e {
                Extension::Alpn { protocols } => Some(protocols.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    fn point_formats(&self) -> &[u8] {
        self.extensions
            .iter()
            .find_map(|e| match e {
                Extension::EcPointFormats { formats } => Some(formats.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Check the structural interoperability invariant.
    ///
    /// A spec that passes is accepted by any standards-compliant TLS 1.2/1.3
    /// server holding either an ECDSA or an RSA certificate.
    pub fn validate(&self) -> TlsResult<()> {
        let invalid = |msg: String| Err(TlsError::InvalidSpec(msg));

        let valid_versions = version::TLS10..=version::TLS13;
        if !valid_versions.contains(&self.tls_version_min)
            || !valid_versions.contains(&self.tls_version_max)
            || self.tls_version_min > self.tls_version_max
        {
            return invalid(format!(
                "bad version range {:#06x}..={:#06x}",
                self.tls_version_min, self.tls_version_max
            ));
        }
        if self.tls_version_max < version::TLS12 {
            return invalid("TLS 1.2 or later must be offered".into());
        }

        if self.cipher_suites.is_empty() {
            return invalid("no cipher suites".into());
        }
        if self.tls_version_min <= version::TLS12 {
            let has = |ids: &[u16]| ids.iter().any(|id| self.cipher_suites.contains(id));
            if !has(&[
                suite::ECDHE_ECDSA_AES128_GCM_SHA256,
                suite::ECDHE_ECDSA_AES256_GCM_SHA384,
                suite::ECDHE_ECDSA_CHACHA20_POLY1305,
            ]) || !has(&[
                suite::ECDHE_RSA_AES128_GCM_SHA256,
                suite::ECDHE_RSA_AES256_GCM_SHA384,
                suite::ECDHE_RSA_CHACHA20_POLY1305,
            ]) {
                return invalid("TLS 1.2 needs ECDHE AEAD suites for ECDSA and RSA".into());
            }
        }
        if !self.compression_methods.contains(&0) {
            return invalid("null compression missing".into());
        }

        let mut seen = HashSet::new();
        for e in &self.extensions {
            let id = e.id();
            if !is_grease(id) && !seen.insert(id) {
                return invalid(format!("duplicate extension {id:#06x}"));
            }
        }
        if !self.has_extension(ext::SERVER_NAME) {
            return invalid("server_name extension missing".into());
        }
        if let Some(pos) = self
            .extensions
            .iter()
            .position(|e| matches!(e, Extension::Padding))
        {
            if pos + 1 != self.extensions.len() {
                return invalid("padding must be the last extension".into());
            }
        }

        let groups: Vec<u16> = self
            .supported_groups()
            .iter()
            .copied()
            .filter(|g| !is_grease(*g))
            .collect();
        if !groups.contains(&group::X25519) && !groups.contains(&group::SECP256R1) {
            return invalid("supported groups need x25519 or secp256r1".into());
        }
        if self.signature_algorithms().is_empty() {
            return invalid("no signature algorithms".into());
        }
        if self.has_extension(ext::ALPN)
            && (self.alpn().is_empty()
                || self.alpn().iter().any(|p| p.is_empty() || p.len() > 255))
        {
            return invalid("bad ALPN protocol list".into());
        }

        if self.supports_tls13() {
            if !self
                .cipher_suites
                .contains(&suite::TLS13_AES_128_GCM_SHA256)
            {
                return invalid("TLS 1.3 requires TLS_AES_128_GCM_SHA256".into());
            }
            let versions_ok = self.extensions.iter().any(|e| {
                matches!(e, Extension::SupportedVersions { versions } if versions.contains(&version::TLS13))
            });
            if !versions_ok {
                return invalid("supported_versions must list TLS 1.3".into());
            }
            let shares: Vec<u16> = self
                .key_share_groups()
                .iter()
                .copied()
                .filter(|g| !is_grease(*g))
                .collect();
            if shares.is_empty() {
                return invalid("TLS 1.3 needs a key share".into());
            }
            if let Some(g) = shares.iter().find(|g| !groups.contains(g)) {
                return invalid(format!("key share {g:#06x} not in supported groups"));
            }
            let psk_ok = self.extensions.iter().any(|e| {
                matches!(e, Extension::PskKeyExchangeModes { modes } if modes.contains(&psk_mode::PSK_DHE_KE))
            });
            if !psk_ok {
                return invalid("TLS 1.3 needs psk_dhe_ke".into());
            }
        }

        Ok(())
    }

    /// JA3 string: `version,ciphers,extensions,groups,point_formats`, GREASE removed.
    pub fn ja3_string(&self) -> String {
        fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
            items.map(|i| i.to_string()).collect::<Vec<_>>().join("-")
        }

        // TLS 1.3 hellos carry legacy_version 1.2 on the wire.
        let legacy = self.tls_version_max.min(version::TLS12);
        let ciphers = join(self.cipher_suites.iter().filter(|c| !is_grease(**c)));
        let exts = join(
            self.extensions
                .iter()
                .map(Extension::id)
                .filter(|id| !is_grease(*id)),
        );
        let groups = join(self.supported_groups().iter().filter(|g| !is_grease(**g)));
        let formats = join(self.point_formats().iter());

        format!("{legacy},{ciphers},{exts},{groups},{formats}")
    }

    /// MD5 of [`ja3_string`](Self::ja3_string), lower-case hex.
    pub fn ja3_hash(&self) -> String {
        format!("{:x}", md5::compute(self.ja3_string().as_bytes()))
    }
}
