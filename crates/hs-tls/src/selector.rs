//! Per-connection profile selection.

use crate::{ProfileRegistry, TlsProfile};
use hs_config::{names, ParameterSource, DEFAULT_RANDOMIZED_TLS_PROFILE_PROBABILITY};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

/// Pick a profile from the global registry using the thread-local CSPRNG.
pub fn select_profile(params: &dyn ParameterSource) -> TlsProfile {
    select_profile_with(ProfileRegistry::global(), params, &mut rand::thread_rng())
}

/// Pick a profile for one connection attempt.
///
/// With probability `SelectRandomizedTLSProfileProbability` (clamped to
/// [0,1]) the randomized profile is returned, otherwise a fixed profile drawn
/// uniformly. `LimitTLSProfiles`, when it names registry members, restricts
/// the candidates.
pub fn select_profile_with<R: Rng + ?Sized>(
    registry: &ProfileRegistry,
    params: &dyn ParameterSource,
    rng: &mut R,
) -> TlsProfile {
    let probability = params
        .float(names::SELECT_RANDOMIZED_TLS_PROFILE_PROBABILITY)
        .unwrap_or(DEFAULT_RANDOMIZED_TLS_PROFILE_PROBABILITY);
    let probability = if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 1.0)
    };

    let candidates = candidates(registry, params);
    let randomized = candidates.iter().copied().find(|p| p.is_randomized());
    let fixed: Vec<TlsProfile> = candidates
        .iter()
        .copied()
        .filter(|p| !p.is_randomized())
        .collect();

    match (randomized, fixed.choose(rng)) {
        (Some(r), Some(f)) => {
            if rng.gen::<f64>() < probability {
                r
            } else {
                *f
            }
        }
        (Some(r), None) => r,
        (None, Some(f)) => *f,
        // candidates() never returns an empty list
        (None, None) => registry.randomized(),
    }
}

fn candidates(registry: &ProfileRegistry, params: &dyn ParameterSource) -> Vec<TlsProfile> {
    let limit = params.strings(names::LIMIT_TLS_PROFILES).unwrap_or_default();
    if limit.is_empty() {
        return registry.supported().to_vec();
    }

    let limited: Vec<TlsProfile> = registry
        .supported()
        .iter()
        .copied()
        .filter(|p| limit.iter().any(|id| id == p.id()))
        .collect();
    if limited.is_empty() {
        warn!(?limit, "LimitTLSProfiles names no supported profile, ignoring it");
        return registry.supported().to_vec();
    }
    limited
}
