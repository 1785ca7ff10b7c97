//! Certificate verifiers that also pin the advertised signature schemes.
//!
//! rustls builds the `signature_algorithms` extension from the verifier's
//! `supported_verify_schemes`, so these wrappers are how a spec's sig-alg
//! order reaches the wire.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, Error, SignatureScheme};
use std::sync::Arc;

/// Map an IANA signature scheme code point.
pub(crate) fn signature_scheme(id: u16) -> Option<SignatureScheme> {
    Some(match id {
        0x0201 => SignatureScheme::RSA_PKCS1_SHA1,
        0x0203 => SignatureScheme::ECDSA_SHA1_Legacy,
        0x0401 => SignatureScheme::RSA_PKCS1_SHA256,
        0x0403 => SignatureScheme::ECDSA_NISTP256_SHA256,
        0x0501 => SignatureScheme::RSA_PKCS1_SHA384,
        0x0503 => SignatureScheme::ECDSA_NISTP384_SHA384,
        0x0601 => SignatureScheme::RSA_PKCS1_SHA512,
        0x0603 => SignatureScheme::ECDSA_NISTP521_SHA512,
        0x0804 => SignatureScheme::RSA_PSS_SHA256,
        0x0805 => SignatureScheme::RSA_PSS_SHA384,
        0x0806 => SignatureScheme::RSA_PSS_SHA512,
        0x0807 => SignatureScheme::ED25519,
        0x0808 => SignatureScheme::ED448,
        _ => return None,
    })
}

/// Certificate verifier that skips all verification.
///
/// Only installed when the caller explicitly asks to skip verification.
#[derive(Debug)]
pub(crate) struct NoVerify {
    schemes: Vec<SignatureScheme>,
}

impl NoVerify {
    pub(crate) fn new(schemes: Vec<SignatureScheme>) -> Self {
        Self { schemes }
    }
}

impl ServerCertVerifier for NoVerify {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.schemes.clone()
    }
}

/// WebPKI verification, advertising schemes in a fixed order.
///
/// `schemes` must be a subset of what the inner verifier can check.
#[derive(Debug)]
pub(crate) struct OrderedSchemes {
    inner: Arc<WebPkiServerVerifier>,
    schemes: Vec<SignatureScheme>,
}

impl OrderedSchemes {
    /// Keep the entries of `wanted` that `inner` can verify, in `wanted` order.
    pub(crate) fn new(inner: Arc<WebPkiServerVerifier>, wanted: &[SignatureScheme]) -> Self {
        let supported = inner.supported_verify_schemes();
        let schemes = wanted
            .iter()
            .copied()
            .filter(|s| supported.contains(s))
            .collect();
        Self { inner, schemes }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

impl ServerCertVerifier for OrderedSchemes {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, Error> {
        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp, now)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.schemes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_schemes_only() {
        assert_eq!(
            signature_scheme(0x0403),
            Some(SignatureScheme::ECDSA_NISTP256_SHA256)
        );
        assert_eq!(signature_scheme(0x0a0a), None);
    }

    #[test]
    fn ordered_schemes_keep_requested_order() {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let inner = WebPkiServerVerifier::builder_with_provider(
            Arc::new(roots),
            Arc::new(rustls::crypto::ring::default_provider()),
        )
        .build()
        .unwrap();

        let wanted = [
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA1,
            SignatureScheme::ECDSA_NISTP256_SHA256,
        ];
        let v = OrderedSchemes::new(inner, &wanted);
        assert_eq!(
            v.supported_verify_schemes(),
            vec![
                SignatureScheme::RSA_PKCS1_SHA256,
                SignatureScheme::ECDSA_NISTP256_SHA256
            ]
        );
    }
}
