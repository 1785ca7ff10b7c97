//! Profile -> ClientHello spec resolution.

use crate::engine::TlsEngine;
use crate::fingerprints;
use crate::randomized::{synthesize, RandomizedSeed};
use crate::spec::ClientHelloSpec;
use crate::{ProfileRegistry, RustlsEngine, TlsError, TlsProfile, TlsResult};
use serde::Serialize;
use tracing::debug;

// Re-draws allowed when a synthesized spec collides with the engine default.
const MAX_REDRAWS: usize = 8;

/// A resolved spec and how it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltSpec {
    pub profile: TlsProfile,
    pub spec: ClientHelloSpec,
    /// Set for the randomized profile; replays the same hello.
    pub seed: Option<RandomizedSeed>,
}

/// Maps registry profiles to concrete [`ClientHelloSpec`]s.
///
/// Only profiles for which [`ProfileRegistry::has_custom_spec`] holds are
/// resolved. As a second check, a spec equal to the engine's reported default
/// hello is refused.
#[derive(Debug, Clone)]
pub struct FingerprintBuilder {
    registry: &'static ProfileRegistry,
    engine_default: Option<ClientHelloSpec>,
}

impl Default for FingerprintBuilder {
    /// Global registry, checked against the rustls default hello.
    fn default() -> Self {
        Self::new(ProfileRegistry::global(), &RustlsEngine)
    }
}

impl FingerprintBuilder {
    pub fn new(registry: &'static ProfileRegistry, engine: &dyn TlsEngine) -> Self {
        Self {
            registry,
            engine_default: engine.library_default_spec(),
        }
    }

    pub fn registry(&self) -> &'static ProfileRegistry {
        self.registry
    }

    /// Resolve by profile id.
    pub fn build_spec_by_id(&self, id: &str) -> TlsResult<BuiltSpec> {
        let profile = self.registry.lookup(id)?;
        self.build_spec(profile)
    }

    /// Resolve `profile`; the randomized profile draws a fresh OS seed.
    pub fn build_spec(&self, profile: TlsProfile) -> TlsResult<BuiltSpec> {
        self.ensure_member(profile)?;
        if !profile.is_randomized() {
            return self.fixed(profile);
        }

        for _ in 0..MAX_REDRAWS {
            let seed = RandomizedSeed::generate();
            let spec = synthesize(&seed);
            if self.is_engine_default(&spec) {
                debug!(%seed, "randomized hello matched the engine default, redrawing");
                continue;
            }
            return Ok(BuiltSpec {
                profile,
                spec,
                seed: Some(seed),
            });
        }
        Err(TlsError::InvalidSpec(
            "randomized synthesis kept producing the engine default hello".into(),
        ))
    }

    /// Resolve `profile`, using `seed` if it is the randomized profile.
    ///
    /// The seed is ignored for fixed profiles.
    pub fn build_spec_with_seed(
        &self,
        profile: TlsProfile,
        seed: RandomizedSeed,
    ) -> TlsResult<BuiltSpec> {
        self.ensure_member(profile)?;
        if !profile.is_randomized() {
            return self.fixed(profile);
        }

        let spec = synthesize(&seed);
        if self.is_engine_default(&spec) {
            return Err(TlsError::InvalidSpec(format!(
                "seed {seed} synthesizes the engine default hello"
            )));
        }
        Ok(BuiltSpec {
            profile,
            spec,
            seed: Some(seed),
        })
    }

    fn ensure_member(&self, profile: TlsProfile) -> TlsResult<()> {
        if self.registry.has_custom_spec(profile) {
            Ok(())
        } else {
            Err(TlsError::UnknownProfile(profile.id().to_string()))
        }
    }

    fn fixed(&self, profile: TlsProfile) -> TlsResult<BuiltSpec> {
        let spec = fingerprints::canonical(profile)
            .ok_or_else(|| TlsError::UnknownProfile(profile.id().to_string()))?;
        if self.is_engine_default(spec) {
            return Err(TlsError::InvalidSpec(format!(
                "{profile} resolves to the engine default hello"
            )));
        }
        Ok(BuiltSpec {
            profile,
            spec: spec.clone(),
            seed: None,
        })
    }

    fn is_engine_default(&self, spec: &ClientHelloSpec) -> bool {
        self.engine_default.as_ref() == Some(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{HandshakeOutcome, HandshakeRequest};
    use crate::IoStream;
    use async_trait::async_trait;
    use once_cell::sync::Lazy;

    /// Engine whose default hello is the Chrome 72 table entry.
    struct ChromeDefaultEngine;

    #[async_trait]
    impl TlsEngine for ChromeDefaultEngine {
        fn name(&self) -> &'static str {
            "chrome-default"
        }

        fn library_default_spec(&self) -> Option<ClientHelloSpec> {
            fingerprints::canonical(TlsProfile::Chrome72).cloned()
        }

        async fn handshake(
            &self,
            _stream: IoStream,
            _request: &HandshakeRequest<'_>,
        ) -> TlsResult<HandshakeOutcome> {
            Err(TlsError::Handshake("unused".into()))
        }
    }

    /// Engine that reports no default hello.
    struct OpaqueEngine;

    #[async_trait]
    impl TlsEngine for OpaqueEngine {
        fn name(&self) -> &'static str {
            "opaque"
        }

        async fn handshake(
            &self,
            _stream: IoStream,
            _request: &HandshakeRequest<'_>,
        ) -> TlsResult<HandshakeOutcome> {
            Err(TlsError::Handshake("unused".into()))
        }
    }

    static SMALL: Lazy<ProfileRegistry> = Lazy::new(|| {
        ProfileRegistry::new(vec![TlsProfile::Chrome70, TlsProfile::Randomized]).unwrap()
    });

    #[test]
    fn every_profile_resolves_to_a_non_default_spec() {
        let builder = FingerprintBuilder::default();
        let default = RustlsEngine.library_default_spec().unwrap();
        for p in TlsProfile::ALL {
            let built = builder.build_spec(p).unwrap();
            assert_eq!(built.profile, p);
            assert_ne!(built.spec, default, "{p}");
            assert_eq!(built.seed.is_some(), p.is_randomized());
            built.spec.validate().unwrap();
        }
    }

    #[test]
    fn lookup_by_id_and_unknown_ids() {
        let builder = FingerprintBuilder::default();
        assert_eq!(
            builder.build_spec_by_id("iOS-Safari-11.3.1").unwrap().profile,
            TlsProfile::IosSafari11_3_1
        );
        assert!(matches!(
            builder.build_spec_by_id("HelloGolang"),
            Err(TlsError::UnknownProfile(_))
        ));
    }

    #[test]
    fn profiles_outside_the_registry_are_unknown() {
        let builder = FingerprintBuilder::new(&SMALL, &RustlsEngine);
        assert!(builder.build_spec(TlsProfile::Chrome70).is_ok());
        assert!(matches!(
            builder.build_spec(TlsProfile::Firefox65),
            Err(TlsError::UnknownProfile(_))
        ));
    }

    #[test]
    fn seeded_builds_replay() {
        let builder = FingerprintBuilder::default();
        let seed = RandomizedSeed::from_bytes([7; 32]);
        let a = builder
            .build_spec_with_seed(TlsProfile::Randomized, seed)
            .unwrap();
        let b = builder
            .build_spec_with_seed(TlsProfile::Randomized, seed)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.seed, Some(seed));
    }

    #[test]
    fn refuses_to_return_the_engine_default() {
        let builder = FingerprintBuilder::new(ProfileRegistry::global(), &ChromeDefaultEngine);
        assert!(matches!(
            builder.build_spec(TlsProfile::Chrome72),
            Err(TlsError::InvalidSpec(_))
        ));
        assert!(builder.build_spec(TlsProfile::Chrome70).is_ok());
    }

    #[test]
    fn table_membership_guards_without_an_engine_default() {
        let builder = FingerprintBuilder::new(&SMALL, &OpaqueEngine);
        assert!(builder.build_spec(TlsProfile::Chrome70).is_ok());
        assert!(builder.build_spec(TlsProfile::Randomized).is_ok());
        assert!(matches!(
            builder.build_spec(TlsProfile::Firefox65),
            Err(TlsError::UnknownProfile(_))
        ));
    }
}
