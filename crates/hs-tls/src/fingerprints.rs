//! Canonical ClientHello specs for the fixed profiles.
//!
//! Each entry reproduces the cipher-suite order, extension order, named groups
//! and signature algorithms observed from the reference client. The table is
//! built once and indexed by [`TlsProfile`]; the randomized profile has no
//! entry here and is served by [`crate::randomized`].

use crate::consts::{
    cert_compression, group, psk_mode, sigalg, suite, version, GREASE_PLACEHOLDER as GREASE,
};
use crate::spec::{ClientHelloSpec, Extension};
use crate::TlsProfile;
use once_cell::sync::Lazy;

static TABLE: Lazy<Vec<(TlsProfile, ClientHelloSpec)>> = Lazy::new(|| {
    vec![
        (TlsProfile::Chrome58, chrome_58()),
        // Chrome 62 kept the Chrome 58 hello.
        (TlsProfile::Chrome62, chrome_58()),
        (TlsProfile::Chrome70, chrome_70()),
        (TlsProfile::Chrome72, chrome_72()),
        (TlsProfile::Firefox55, firefox_55()),
        // Firefox 56 kept the Firefox 55 hello.
        (TlsProfile::Firefox56, firefox_55()),
        (TlsProfile::Firefox65, firefox_65()),
        (TlsProfile::IosSafari11_3_1, ios_safari_11_3_1()),
    ]
});

/// Canonical spec for a fixed profile; `None` for the randomized profile.
pub fn canonical(profile: TlsProfile) -> Option<&'static ClientHelloSpec> {
    TABLE.iter().find(|(p, _)| *p == profile).map(|(_, s)| s)
}

fn alpn(protocols: &[&str]) -> Extension {
    Extension::Alpn {
        protocols: protocols.iter().map(|p| p.to_string()).collect(),
    }
}

const CHROME_SIGALGS: [u16; 9] = [
    sigalg::ECDSA_SECP256R1_SHA256,
    sigalg::RSA_PSS_RSAE_SHA256,
    sigalg::RSA_PKCS1_SHA256,
    sigalg::ECDSA_SECP384R1_SHA384,
    sigalg::RSA_PSS_RSAE_SHA384,
    sigalg::RSA_PKCS1_SHA384,
    sigalg::RSA_PSS_RSAE_SHA512,
    sigalg::RSA_PKCS1_SHA512,
    sigalg::RSA_PKCS1_SHA1,
];

const FIREFOX_SIGALGS: [u16; 11] = [
    sigalg::ECDSA_SECP256R1_SHA256,
    sigalg::ECDSA_SECP384R1_SHA384,
    sigalg::ECDSA_SECP521R1_SHA512,
    sigalg::RSA_PSS_RSAE_SHA256,
    sigalg::RSA_PSS_RSAE_SHA384,
    sigalg::RSA_PSS_RSAE_SHA512,
    sigalg::RSA_PKCS1_SHA256,
    sigalg::RSA_PKCS1_SHA384,
    sigalg::RSA_PKCS1_SHA512,
    sigalg::ECDSA_SHA1,
    sigalg::RSA_PKCS1_SHA1,
];

const CHROME_TLS12_SUITES: [u16; 13] = [
    suite::ECDHE_ECDSA_AES128_GCM_SHA256,
    suite::ECDHE_RSA_AES128_GCM_SHA256,
    suite::ECDHE_ECDSA_AES256_GCM_SHA384,
    suite::ECDHE_RSA_AES256_GCM_SHA384,
    suite::ECDHE_ECDSA_CHACHA20_POLY1305,
    suite::ECDHE_RSA_CHACHA20_POLY1305,
    suite::ECDHE_RSA_AES128_CBC_SHA,
    suite::ECDHE_RSA_AES256_CBC_SHA,
    suite::RSA_AES128_GCM_SHA256,
    suite::RSA_AES256_GCM_SHA384,
    suite::RSA_AES128_CBC_SHA,
    suite::RSA_AES256_CBC_SHA,
    suite::RSA_3DES_EDE_CBC_SHA,
];

fn chrome_58() -> ClientHelloSpec {
    let mut cipher_suites = vec![GREASE];
    cipher_suites.extend(CHROME_TLS12_SUITES);

    ClientHelloSpec {
        tls_version_min: version::TLS10,
        tls_version_max: version::TLS12,
        cipher_suites,
        compression_methods: vec![0],
        extensions: vec![
            Extension::Grease,
            Extension::RenegotiationInfo,
            Extension::ServerName,
            Extension::ExtendedMasterSecret,
            Extension::SessionTicket,
            Extension::SignatureAlgorithms {
                schemes: CHROME_SIGALGS.to_vec(),
            },
            Extension::StatusRequest,
            Extension::SignedCertificateTimestamp,
            alpn(&["h2", "http/1.1"]),
            Extension::ChannelId,
            Extension::EcPointFormats { formats: vec![0] },
            Extension::SupportedGroups {
                groups: vec![GREASE, group::X25519, group::SECP256R1, group::SECP384R1],
            },
            Extension::Grease,
            Extension::Padding,
        ],
    }
}

fn chrome_tls13(sigalgs: &[u16]) -> ClientHelloSpec {
    let mut cipher_suites = vec![
        GREASE,
        suite::TLS13_AES_128_GCM_SHA256,
        suite::TLS13_AES_256_GCM_SHA384,
        suite::TLS13_CHACHA20_POLY1305_SHA256,
    ];
    cipher_suites.extend(CHROME_TLS12_SUITES);

    ClientHelloSpec {
        tls_version_min: version::TLS10,
        tls_version_max: version::TLS13,
        cipher_suites,
        compression_methods: vec![0],
        extensions: vec![
            Extension::Grease,
            Extension::ServerName,
            Extension::ExtendedMasterSecret,
            Extension::RenegotiationInfo,
            Extension::SupportedGroups {
                groups: vec![GREASE, group::X25519, group::SECP256R1, group::SECP384R1],
            },
            Extension::EcPointFormats { formats: vec![0] },
            Extension::SessionTicket,
            alpn(&["h2", "http/1.1"]),
            Extension::StatusRequest,
            Extension::SignatureAlgorithms {
                schemes: sigalgs.to_vec(),
            },
            Extension::SignedCertificateTimestamp,
            Extension::KeyShare {
                groups: vec![GREASE, group::X25519],
            },
            Extension::PskKeyExchangeModes {
                modes: vec![psk_mode::PSK_DHE_KE],
            },
            Extension::SupportedVersions {
                versions: vec![
                    GREASE,
                    version::TLS13,
                    version::TLS12,
                    version::TLS11,
                    version::TLS10,
                ],
            },
            Extension::CompressCertificate {
                algorithms: vec![cert_compression::BROTLI],
            },
            Extension::Grease,
            Extension::Padding,
        ],
    }
}

fn chrome_70() -> ClientHelloSpec {
    chrome_tls13(&CHROME_SIGALGS)
}

fn chrome_72() -> ClientHelloSpec {
    // Chrome 72 stopped advertising rsa_pkcs1_sha1.
    chrome_tls13(&CHROME_SIGALGS[..CHROME_SIGALGS.len() - 1])
}

const FIREFOX_TLS12_SUITES: [u16; 15] = [
    suite::ECDHE_ECDSA_AES128_GCM_SHA256,
    suite::ECDHE_RSA_AES128_GCM_SHA256,
    suite::ECDHE_ECDSA_CHACHA20_POLY1305,
    suite::ECDHE_RSA_CHACHA20_POLY1305,
    suite::ECDHE_ECDSA_AES256_GCM_SHA384,
    suite::ECDHE_RSA_AES256_GCM_SHA384,
    suite::ECDHE_ECDSA_AES256_CBC_SHA,
    suite::ECDHE_ECDSA_AES128_CBC_SHA,
    suite::ECDHE_RSA_AES128_CBC_SHA,
    suite::ECDHE_RSA_AES256_CBC_SHA,
    suite::DHE_RSA_AES128_CBC_SHA,
    suite::DHE_RSA_AES256_CBC_SHA,
    suite::RSA_AES128_CBC_SHA,
    suite::RSA_AES256_CBC_SHA,
    suite::RSA_3DES_EDE_CBC_SHA,
];

fn firefox_55() -> ClientHelloSpec {
    ClientHelloSpec {
        tls_version_min: version::TLS10,
        tls_version_max: version::TLS12,
        cipher_suites: FIREFOX_TLS12_SUITES.to_vec(),
        compression_methods: vec![0],
        extensions: vec![
            Extension::ServerName,
            Extension::ExtendedMasterSecret,
            Extension::RenegotiationInfo,
            Extension::SupportedGroups {
                groups: vec![
                    group::X25519,
                    group::SECP256R1,
                    group::SECP384R1,
                    group::SECP521R1,
                ],
            },
            Extension::EcPointFormats { formats: vec![0] },
            Extension::SessionTicket,
            alpn(&["h2", "http/1.1"]),
            Extension::StatusRequest,
            Extension::SignatureAlgorithms {
                schemes: FIREFOX_SIGALGS.to_vec(),
            },
            Extension::Padding,
        ],
    }
}

fn firefox_65() -> ClientHelloSpec {
    let mut cipher_suites = vec![
        suite::TLS13_AES_128_GCM_SHA256,
        suite::TLS13_CHACHA20_POLY1305_SHA256,
        suite::TLS13_AES_256_GCM_SHA384,
    ];
    cipher_suites.extend(FIREFOX_TLS12_SUITES);

    ClientHelloSpec {
        tls_version_min: version::TLS10,
        tls_version_max: version::TLS13,
        cipher_suites,
        compression_methods: vec![0],
        extensions: vec![
            Extension::ServerName,
            Extension::ExtendedMasterSecret,
            Extension::RenegotiationInfo,
            Extension::SupportedGroups {
                groups: vec![
                    group::X25519,
                    group::SECP256R1,
                    group::SECP384R1,
                    group::SECP521R1,
                    group::FFDHE2048,
                    group::FFDHE3072,
                ],
            },
            Extension::EcPointFormats { formats: vec![0] },
            Extension::SessionTicket,
            alpn(&["h2", "http/1.1"]),
            Extension::StatusRequest,
            Extension::KeyShare {
                groups: vec![group::X25519, group::SECP256R1],
            },
            Extension::SupportedVersions {
                versions: vec![
                    version::TLS13,
                    version::TLS12,
                    version::TLS11,
                    version::TLS10,
                ],
            },
            Extension::SignatureAlgorithms {
                schemes: FIREFOX_SIGALGS.to_vec(),
            },
            Extension::PskKeyExchangeModes {
                modes: vec![psk_mode::PSK_DHE_KE],
            },
            Extension::RecordSizeLimit { limit: 0x4001 },
            Extension::Padding,
        ],
    }
}

fn ios_safari_11_3_1() -> ClientHelloSpec {
    ClientHelloSpec {
        tls_version_min: version::TLS10,
        tls_version_max: version::TLS12,
        cipher_suites: vec![
            suite::ECDHE_ECDSA_AES256_GCM_SHA384,
            suite::ECDHE_ECDSA_AES128_GCM_SHA256,
            suite::ECDHE_ECDSA_AES256_CBC_SHA384,
            suite::ECDHE_ECDSA_AES128_CBC_SHA256,
            suite::ECDHE_ECDSA_AES256_CBC_SHA,
            suite::ECDHE_ECDSA_AES128_CBC_SHA,
            suite::ECDHE_ECDSA_CHACHA20_POLY1305,
            suite::ECDHE_RSA_AES256_GCM_SHA384,
            suite::ECDHE_RSA_AES128_GCM_SHA256,
            suite::ECDHE_RSA_AES256_CBC_SHA384,
            suite::ECDHE_RSA_AES128_CBC_SHA256,
            suite::ECDHE_RSA_AES256_CBC_SHA,
            suite::ECDHE_RSA_AES128_CBC_SHA,
            suite::ECDHE_RSA_CHACHA20_POLY1305,
            suite::RSA_AES256_GCM_SHA384,
            suite::RSA_AES128_GCM_SHA256,
            suite::RSA_AES256_CBC_SHA256,
            suite::RSA_AES128_CBC_SHA256,
            suite::RSA_AES256_CBC_SHA,
            suite::RSA_AES128_CBC_SHA,
            suite::ECDHE_ECDSA_3DES_EDE_CBC_SHA,
            suite::ECDHE_RSA_3DES_EDE_CBC_SHA,
            suite::RSA_3DES_EDE_CBC_SHA,
        ],
        compression_methods: vec![0],
        extensions: vec![
            Extension::RenegotiationInfo,
            Extension::ServerName,
            Extension::ExtendedMasterSecret,
            Extension::SignatureAlgorithms {
                schemes: vec![
                    sigalg::ECDSA_SECP256R1_SHA256,
                    sigalg::RSA_PSS_RSAE_SHA256,
                    sigalg::RSA_PKCS1_SHA256,
                    sigalg::ECDSA_SECP384R1_SHA384,
                    sigalg::ECDSA_SHA1,
                    sigalg::RSA_PSS_RSAE_SHA384,
                    sigalg::RSA_PKCS1_SHA384,
                    sigalg::RSA_PSS_RSAE_SHA512,
                    sigalg::RSA_PKCS1_SHA512,
                    sigalg::RSA_PKCS1_SHA1,
                ],
            },
            Extension::StatusRequest,
            Extension::SignedCertificateTimestamp,
            alpn(&["h2", "h2-16", "h2-15", "h2-14", "spdy/3.1", "spdy/3", "http/1.1"]),
            Extension::EcPointFormats { formats: vec![0] },
            Extension::SupportedGroups {
                groups: vec![
                    group::X25519,
                    group::SECP256R1,
                    group::SECP384R1,
                    group::SECP521R1,
                ],
            },
        ],
    }
}
