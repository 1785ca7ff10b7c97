//! TLS registry code points used by the fingerprint tables.
//!
//! Only the values that appear in emulated ClientHellos are listed.

/// Protocol versions.
pub mod version {
    pub const TLS10: u16 = 0x0301;
    pub const TLS11: u16 = 0x0302;
    pub const TLS12: u16 = 0x0303;
    pub const TLS13: u16 = 0x0304;
}

/// Cipher suites.
pub mod suite {
    // TLS 1.3
    pub const TLS13_AES_128_GCM_SHA256: u16 = 0x1301;
    pub const TLS13_AES_256_GCM_SHA384: u16 = 0x1302;
    pub const TLS13_CHACHA20_POLY1305_SHA256: u16 = 0x1303;

    // TLS 1.2 ECDHE AEAD
    pub const ECDHE_ECDSA_AES128_GCM_SHA256: u16 = 0xc02b;
    pub const ECDHE_ECDSA_AES256_GCM_SHA384: u16 = 0xc02c;
    pub const ECDHE_RSA_AES128_GCM_SHA256: u16 = 0xc02f;
    pub const ECDHE_RSA_AES256_GCM_SHA384: u16 = 0xc030;
    pub const ECDHE_RSA_CHACHA20_POLY1305: u16 = 0xcca8;
    pub const ECDHE_ECDSA_CHACHA20_POLY1305: u16 = 0xcca9;

    // Legacy CBC
    pub const ECDHE_ECDSA_3DES_EDE_CBC_SHA: u16 = 0xc008;
    pub const ECDHE_ECDSA_AES128_CBC_SHA: u16 = 0xc009;
    pub const ECDHE_ECDSA_AES256_CBC_SHA: u16 = 0xc00a;
    pub const ECDHE_RSA_3DES_EDE_CBC_SHA: u16 = 0xc012;
    pub const ECDHE_RSA_AES128_CBC_SHA: u16 = 0xc013;
    pub const ECDHE_RSA_AES256_CBC_SHA: u16 = 0xc014;
    pub const ECDHE_ECDSA_AES128_CBC_SHA256: u16 = 0xc023;
    pub const ECDHE_ECDSA_AES256_CBC_SHA384: u16 = 0xc024;
    pub const ECDHE_RSA_AES128_CBC_SHA256: u16 = 0xc027;
    pub const ECDHE_RSA_AES256_CBC_SHA384: u16 = 0xc028;
    pub const DHE_RSA_AES128_CBC_SHA: u16 = 0x0033;
    pub const DHE_RSA_AES256_CBC_SHA: u16 = 0x0039;
    pub const RSA_AES128_GCM_SHA256: u16 = 0x009c;
    pub const RSA_AES256_GCM_SHA384: u16 = 0x009d;
    pub const RSA_AES128_CBC_SHA: u16 = 0x002f;
    pub const RSA_AES256_CBC_SHA: u16 = 0x0035;
    pub const RSA_AES128_CBC_SHA256: u16 = 0x003c;
    pub const RSA_AES256_CBC_SHA256: u16 = 0x003d;
    pub const RSA_3DES_EDE_CBC_SHA: u16 = 0x000a;
}

/// Extension types.
pub mod ext {
    pub const SERVER_NAME: u16 = 0x0000;
    pub const STATUS_REQUEST: u16 = 0x0005;
    pub const SUPPORTED_GROUPS: u16 = 0x000a;
    pub const EC_POINT_FORMATS: u16 = 0x000b;
    pub const SIGNATURE_ALGORITHMS: u16 = 0x000d;
    pub const ALPN: u16 = 0x0010;
    pub const SIGNED_CERTIFICATE_TIMESTAMP: u16 = 0x0012;
    pub const PADDING: u16 = 0x0015;
    pub const EXTENDED_MASTER_SECRET: u16 = 0x0017;
    pub const COMPRESS_CERTIFICATE: u16 = 0x001b;
    pub const RECORD_SIZE_LIMIT: u16 = 0x001c;
    pub const SESSION_TICKET: u16 = 0x0023;
    pub const SUPPORTED_VERSIONS: u16 = 0x002b;
    pub const PSK_KEY_EXCHANGE_MODES: u16 = 0x002d;
    pub const KEY_SHARE: u16 = 0x0033;
    pub const CHANNEL_ID: u16 = 0x7550;
    pub const RENEGOTIATION_INFO: u16 = 0xff01;
}

/// Named groups.
pub mod group {
    pub const SECP256R1: u16 = 0x0017;
    pub const SECP384R1: u16 = 0x0018;
    pub const SECP521R1: u16 = 0x0019;
    pub const X25519: u16 = 0x001d;
    pub const FFDHE2048: u16 = 0x0100;
    pub const FFDHE3072: u16 = 0x0101;
}

/// Signature schemes.
pub mod sigalg {
    pub const RSA_PKCS1_SHA1: u16 = 0x0201;
    pub const ECDSA_SHA1: u16 = 0x0203;
    pub const RSA_PKCS1_SHA256: u16 = 0x0401;
    pub const ECDSA_SECP256R1_SHA256: u16 = 0x0403;
    pub const RSA_PKCS1_SHA384: u16 = 0x0501;
    pub const ECDSA_SECP384R1_SHA384: u16 = 0x0503;
    pub const RSA_PKCS1_SHA512: u16 = 0x0601;
    pub const ECDSA_SECP521R1_SHA512: u16 = 0x0603;
    pub const RSA_PSS_RSAE_SHA256: u16 = 0x0804;
    pub const RSA_PSS_RSAE_SHA384: u16 = 0x0805;
    pub const RSA_PSS_RSAE_SHA512: u16 = 0x0806;
    pub const ED25519: u16 = 0x0807;
}

/// PSK key exchange modes.
pub mod psk_mode {
    pub const PSK_DHE_KE: u8 = 1;
}

/// Certificate compression algorithms.
pub mod cert_compression {
    pub const BROTLI: u16 = 2;
}

/// GREASE placeholder (RFC 8701).
///
/// Specs store this single marker wherever a GREASE value goes; the wire
/// value is chosen per connection from [`GREASE_VALUES`].
pub const GREASE_PLACEHOLDER: u16 = 0x0a0a;

/// Reserved GREASE values, all of the form `0x?a?a`.
pub const GREASE_VALUES: [u16; 16] = [
    0x0a0a, 0x1a1a, 0x2a2a, 0x3a3a, 0x4a4a, 0x5a5a, 0x6a6a, 0x7a7a, 0x8a8a, 0x9a9a, 0xaaaa, 0xbaba,
    0xcaca, 0xdada, 0xeaea, 0xfafa,
];

/// Whether `value` is a GREASE code point.
pub fn is_grease(value: u16) -> bool {
    value & 0x0f0f == 0x0a0a && (value >> 8) == (value & 0xff)
}
