//! Per-connection randomized ClientHello synthesis.
//!
//! A [`RandomizedSeed`] fully determines the synthesized spec, so a hello
//! observed in the field can be replayed from its logged seed. Production
//! seeds come from the OS CSPRNG; each draw is independent of every other
//! connection.

use crate::consts::{
    group, psk_mode, sigalg, suite, version, GREASE_PLACEHOLDER as GREASE,
};
use crate::spec::{ClientHelloSpec, Extension};
use crate::TlsError;
use rand::rngs::{OsRng, StdRng};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 32-byte seed for randomized hello synthesis.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RandomizedSeed([u8; 32]);

impl RandomizedSeed {
    /// Fresh seed from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for RandomizedSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for RandomizedSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RandomizedSeed({self})")
    }
}

impl FromStr for RandomizedSeed {
    type Err = TlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim(), &mut bytes)
            .map_err(|e| TlsError::Config(format!("bad randomized seed: {e}")))?;
        Ok(Self(bytes))
    }
}

impl Serialize for RandomizedSeed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RandomizedSeed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// Suites every synthesized hello keeps, so both ECDSA and RSA servers accept it.
const MANDATORY_TLS12: [u16; 2] = [
    suite::ECDHE_ECDSA_AES128_GCM_SHA256,
    suite::ECDHE_RSA_AES128_GCM_SHA256,
];

const OPTIONAL_TLS12_AEAD: [u16; 4] = [
    suite::ECDHE_ECDSA_AES256_GCM_SHA384,
    suite::ECDHE_RSA_AES256_GCM_SHA384,
    suite::ECDHE_ECDSA_CHACHA20_POLY1305,
    suite::ECDHE_RSA_CHACHA20_POLY1305,
];

const OPTIONAL_TLS12_LEGACY: [u16; 8] = [
    suite::ECDHE_ECDSA_AES128_CBC_SHA,
    suite::ECDHE_ECDSA_AES256_CBC_SHA,
    suite::ECDHE_RSA_AES128_CBC_SHA,
    suite::ECDHE_RSA_AES256_CBC_SHA,
    suite::RSA_AES128_GCM_SHA256,
    suite::RSA_AES256_GCM_SHA384,
    suite::RSA_AES128_CBC_SHA,
    suite::RSA_AES256_CBC_SHA,
];

const OPTIONAL_TLS13: [u16; 2] = [
    suite::TLS13_AES_256_GCM_SHA384,
    suite::TLS13_CHACHA20_POLY1305_SHA256,
];

const MANDATORY_SIGALGS: [u16; 3] = [
    sigalg::ECDSA_SECP256R1_SHA256,
    sigalg::RSA_PSS_RSAE_SHA256,
    sigalg::RSA_PKCS1_SHA256,
];

const OPTIONAL_SIGALGS: [u16; 8] = [
    sigalg::ECDSA_SECP384R1_SHA384,
    sigalg::RSA_PSS_RSAE_SHA384,
    sigalg::RSA_PKCS1_SHA384,
    sigalg::RSA_PSS_RSAE_SHA512,
    sigalg::RSA_PKCS1_SHA512,
    sigalg::ECDSA_SECP521R1_SHA512,
    sigalg::ECDSA_SHA1,
    sigalg::RSA_PKCS1_SHA1,
];

/// Keep every mandatory item, each optional one with probability `p`, then shuffle.
fn pick<R: Rng>(rng: &mut R, mandatory: &[u16], optional: &[u16], p: f64) -> Vec<u16> {
    let mut out = mandatory.to_vec();
    out.extend(optional.iter().copied().filter(|_| rng.gen_bool(p)));
    out.shuffle(rng);
    out
}

/// Synthesize the hello determined by `seed`.
///
/// The result always passes [`ClientHelloSpec::validate`].
pub fn synthesize(seed: &RandomizedSeed) -> ClientHelloSpec {
    let mut rng = StdRng::from_seed(seed.0);
    let tls13 = rng.gen_bool(0.5);
    let grease = rng.gen_bool(0.5);

    let mut cipher_suites = Vec::new();
    if grease {
        cipher_suites.push(GREASE);
    }
    if tls13 {
        cipher_suites.extend(pick(
            &mut rng,
            &[suite::TLS13_AES_128_GCM_SHA256],
            &OPTIONAL_TLS13,
            0.7,
        ));
    }
    cipher_suites.extend(pick(&mut rng, &MANDATORY_TLS12, &OPTIONAL_TLS12_AEAD, 0.6));
    cipher_suites.extend(pick(&mut rng, &[], &OPTIONAL_TLS12_LEGACY, 0.4));

    let mut groups = pick(
        &mut rng,
        &[group::X25519, group::SECP256R1],
        &[group::SECP384R1, group::SECP521R1],
        0.5,
    );
    let mut extensions = vec![
        Extension::ServerName,
        Extension::EcPointFormats { formats: vec![0] },
        Extension::SignatureAlgorithms {
            schemes: pick(&mut rng, &MANDATORY_SIGALGS, &OPTIONAL_SIGALGS, 0.5),
        },
    ];

    if tls13 {
        // One share for the first modern group, sometimes a second.
        let mut shares: Vec<u16> = groups
            .iter()
            .copied()
            .filter(|g| *g == group::X25519 || *g == group::SECP256R1)
            .collect();
        if rng.gen_bool(0.7) {
            shares.truncate(1);
        }
        let mut versions = vec![version::TLS13, version::TLS12];
        if rng.gen_bool(0.5) {
            versions.extend([version::TLS11, version::TLS10]);
        }
        if grease {
            shares.insert(0, GREASE);
            versions.insert(0, GREASE);
        }
        extensions.push(Extension::KeyShare { groups: shares });
        extensions.push(Extension::SupportedVersions { versions });
        extensions.push(Extension::PskKeyExchangeModes {
            modes: vec![psk_mode::PSK_DHE_KE],
        });
    }
    if grease {
        groups.insert(0, GREASE);
    }
    extensions.push(Extension::SupportedGroups { groups });

    if rng.gen_bool(0.8) {
        extensions.push(Extension::ExtendedMasterSecret);
    }
    if rng.gen_bool(0.8) {
        extensions.push(Extension::RenegotiationInfo);
    }
    if rng.gen_bool(0.6) {
        extensions.push(Extension::SessionTicket);
    }
    if rng.gen_bool(0.7) {
        let protocols = if rng.gen_bool(0.6) {
            vec!["h2".to_string(), "http/1.1".to_string()]
        } else {
            vec!["http/1.1".to_string()]
        };
        extensions.push(Extension::Alpn { protocols });
    }
    if rng.gen_bool(0.6) {
        extensions.push(Extension::StatusRequest);
    }
    if rng.gen_bool(0.4) {
        extensions.push(Extension::SignedCertificateTimestamp);
    }
    extensions.shuffle(&mut rng);

    if grease {
        extensions.insert(0, Extension::Grease);
        extensions.push(Extension::Grease);
    }
    if rng.gen_bool(0.5) {
        extensions.push(Extension::Padding);
    }

    ClientHelloSpec {
        tls_version_min: version::TLS10,
        tls_version_max: if tls13 { version::TLS13 } else { version::TLS12 },
        cipher_suites,
        compression_methods: vec![0],
        extensions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_seed_same_spec() {
        let seed = RandomizedSeed::generate();
        assert_eq!(synthesize(&seed), synthesize(&seed));
    }

    #[test]
    fn fresh_seeds_vary() {
        let specs: std::collections::HashSet<_> = (0..32)
            .map(|_| synthesize(&RandomizedSeed::generate()).ja3_hash())
            .collect();
        assert!(specs.len() > 1);
    }

    #[test]
    fn seed_hex_round_trip() {
        let seed = RandomizedSeed::from_bytes([0xab; 32]);
        let text = seed.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text.parse::<RandomizedSeed>().unwrap(), seed);
        assert!("abcd".parse::<RandomizedSeed>().is_err());

        let json = serde_json::to_string(&seed).unwrap();
        assert_eq!(serde_json::from_str::<RandomizedSeed>(&json).unwrap(), seed);
    }

    proptest! {
        #[test]
        fn every_seed_yields_a_valid_spec(bytes in any::<[u8; 32]>()) {
            let spec = synthesize(&RandomizedSeed::from_bytes(bytes));
            prop_assert!(spec.validate().is_ok(), "{:?}", spec.validate());
        }
    }
}
