//! TLS profile identifiers and the process-wide profile registry.

use crate::{TlsError, TlsResult};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// A ClientHello fingerprint that can be emulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TlsProfile {
    Chrome58,
    Chrome62,
    Chrome70,
    Chrome72,
    Firefox55,
    Firefox56,
    Firefox65,
    IosSafari11_3_1,
    /// Synthesizes a fresh, per-connection ClientHello.
    Randomized,
}

impl TlsProfile {
    /// Every profile variant, in registry order.
    pub const ALL: [TlsProfile; 9] = [
        Self::Chrome58,
        Self::Chrome62,
        Self::Chrome70,
        Self::Chrome72,
        Self::Firefox55,
        Self::Firefox56,
        Self::Firefox65,
        Self::IosSafari11_3_1,
        Self::Randomized,
    ];

    /// Stable string id.
    pub const fn id(self) -> &'static str {
        match self {
            Self::Chrome58 => "Chrome-58",
            Self::Chrome62 => "Chrome-62",
            Self::Chrome70 => "Chrome-70",
            Self::Chrome72 => "Chrome-72",
            Self::Firefox55 => "Firefox-55",
            Self::Firefox56 => "Firefox-56",
            Self::Firefox65 => "Firefox-65",
            Self::IosSafari11_3_1 => "iOS-Safari-11.3.1",
            Self::Randomized => "Randomized-v2",
        }
    }

    pub const fn is_randomized(self) -> bool {
        matches!(self, Self::Randomized)
    }
}

impl std::str::FromStr for TlsProfile {
    type Err = TlsError;

    /// Exact match on the profile id; there is no fallback profile.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| TlsError::UnknownProfile(s.to_string()))
    }
}

impl fmt::Display for TlsProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

static GLOBAL: Lazy<ProfileRegistry> = Lazy::new(|| {
    // A broken built-in table is a build defect, not a runtime condition.
    #[allow(clippy::expect_used)]
    ProfileRegistry::new(TlsProfile::ALL.to_vec()).expect("built-in TLS profile table is valid")
});

/// Ordered, immutable set of emulable profiles.
///
/// Exactly one member is the randomized profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRegistry {
    profiles: Vec<TlsProfile>,
}

impl ProfileRegistry {
    /// Build a registry.
    ///
    /// Fails when `profiles` is empty, contains duplicates, or does not
    /// contain exactly one randomized profile.
    pub fn new(profiles: Vec<TlsProfile>) -> TlsResult<Self> {
        if profiles.is_empty() {
            return Err(TlsError::Config("profile registry is empty".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = profiles.iter().find(|p| !seen.insert(**p)) {
            return Err(TlsError::Config(format!("duplicate profile {dup}")));
        }
        let randomized = profiles.iter().filter(|p| p.is_randomized()).count();
        if randomized != 1 {
            return Err(TlsError::Config(format!(
                "registry needs exactly one randomized profile, found {randomized}"
            )));
        }
        Ok(Self { profiles })
    }

    /// The process-wide registry of every supported profile.
    pub fn global() -> &'static ProfileRegistry {
        &GLOBAL
    }

    /// All profiles, in stable order.
    pub fn supported(&self) -> &[TlsProfile] {
        &self.profiles
    }

    pub fn contains(&self, profile: TlsProfile) -> bool {
        self.profiles.contains(&profile)
    }

    pub fn is_randomized(&self, profile: TlsProfile) -> bool {
        self.contains(profile) && profile.is_randomized()
    }

    /// Whether `profile` resolves to a deliberately defined ClientHello.
    ///
    /// True for every registry member: fixed profiles map to a canonical
    /// table entry and the randomized profile to the synthesizer.
    pub fn has_custom_spec(&self, profile: TlsProfile) -> bool {
        self.contains(profile)
            && (profile.is_randomized() || crate::fingerprints::canonical(profile).is_some())
    }

    /// Resolve a profile id, restricted to this registry.
    pub fn lookup(&self, id: &str) -> TlsResult<TlsProfile> {
        let profile: TlsProfile = id.parse()?;
        if self.contains(profile) {
            Ok(profile)
        } else {
            Err(TlsError::UnknownProfile(id.to_string()))
        }
    }

    pub fn randomized(&self) -> TlsProfile {
        self.profiles
            .iter()
            .copied()
            .find(|p| p.is_randomized())
            .unwrap_or(TlsProfile::Randomized)
    }

    /// Fixed (non-randomized) profiles, in registry order.
    pub fn fixed(&self) -> impl Iterator<Item = TlsProfile> + '_ {
        self.profiles.iter().copied().filter(|p| !p.is_randomized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_from_str() {
        for p in TlsProfile::ALL {
            assert_eq!(p.id().parse::<TlsProfile>().unwrap(), p);
        }
        assert!(matches!(
            "chrome".parse::<TlsProfile>(),
            Err(TlsError::UnknownProfile(_))
        ));
    }

    #[test]
    fn global_registry_shape() {
        let reg = ProfileRegistry::global();
        assert_eq!(reg.supported().len(), TlsProfile::ALL.len());
        assert_eq!(reg.randomized(), TlsProfile::Randomized);
        assert_eq!(reg.fixed().count(), TlsProfile::ALL.len() - 1);
        assert!(reg.supported().iter().all(|p| reg.has_custom_spec(*p)));
    }

    #[test]
    fn registry_construction_rules() {
        assert!(ProfileRegistry::new(vec![]).is_err());
        assert!(ProfileRegistry::new(vec![TlsProfile::Chrome72]).is_err());
        assert!(ProfileRegistry::new(vec![
            TlsProfile::Chrome72,
            TlsProfile::Chrome72,
            TlsProfile::Randomized
        ])
        .is_err());
        let reg =
            ProfileRegistry::new(vec![TlsProfile::Firefox65, TlsProfile::Randomized]).unwrap();
        assert!(reg.lookup("Firefox-65").is_ok());
        assert!(matches!(
            reg.lookup("Chrome-72"),
            Err(TlsError::UnknownProfile(_))
        ));
        assert!(!reg.has_custom_spec(TlsProfile::Chrome72));
    }
}
