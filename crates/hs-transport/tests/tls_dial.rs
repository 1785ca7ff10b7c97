//! End-to-end fingerprinted dials against a local rustls server.

mod support;

use hs_config::{ClientParameters, Parameters};
use hs_tls::{ProfileRegistry, RandomizedSeed, TlsProfile};
use hs_transport::{dial, DialConfig, DialContext, DialPhase, TcpDialer};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use support::{ping, server_config, spawn_tls_server, TestPki};

fn base_config(pki: &TestPki) -> DialConfig {
    DialConfig::new(Arc::new(TcpDialer), Arc::new(Parameters::default()))
        .with_sni_server_name("localhost")
        .with_trusted_ca_file(pki.ca_file.path())
}

#[tokio::test]
async fn every_fixed_profile_completes_a_verified_handshake() -> anyhow::Result<()> {
    let pki = TestPki::new()?;
    let addr = spawn_tls_server(server_config(pki.chain.clone(), pki.key_der.clone())?).await?;
    let ctx = DialContext::background().with_timeout(Duration::from_secs(30));

    for profile in ProfileRegistry::global().fixed() {
        let cfg = base_config(&pki).with_profile(profile.id());
        let mut conn = dial(&ctx, "tcp", &addr.to_string(), &cfg)
            .await
            .map_err(|e| anyhow::anyhow!("{profile}: {e}"))?;

        assert_eq!(conn.profile(), profile);
        assert_eq!(conn.randomized_seed(), None);
        assert_eq!(conn.server_name(), "localhost");
        assert!(conn.protocol_version().is_some());
        assert_eq!(conn.ja3(), conn.spec().ja3_hash());
        ping(&mut conn).await?;
    }
    Ok(())
}

#[tokio::test]
async fn tls13_profiles_negotiate_tls13_and_legacy_ones_tls12() -> anyhow::Result<()> {
    let pki = TestPki::new()?;
    let addr = spawn_tls_server(server_config(pki.chain.clone(), pki.key_der.clone())?).await?;
    let ctx = DialContext::background();

    for (profile, expected) in [
        (TlsProfile::Chrome72, 0x0304),
        (TlsProfile::Firefox65, 0x0304),
        (TlsProfile::Chrome58, 0x0303),
        (TlsProfile::IosSafari11_3_1, 0x0303),
    ] {
        let cfg = base_config(&pki).with_profile(profile.id());
        let conn = dial(&ctx, "tcp", &addr.to_string(), &cfg).await?;
        assert_eq!(conn.protocol_version(), Some(expected), "{profile}");
    }
    Ok(())
}

#[tokio::test]
async fn randomized_profile_succeeds_on_every_draw() -> anyhow::Result<()> {
    let pki = TestPki::new()?;
    let addr = spawn_tls_server(server_config(pki.chain.clone(), pki.key_der.clone())?).await?;
    let ctx = DialContext::background().with_timeout(Duration::from_secs(60));
    let cfg = base_config(&pki).with_profile("Randomized-v2");

    let mut seeds = HashSet::new();
    for attempt in 0..20 {
        let mut conn = dial(&ctx, "tcp", &addr.to_string(), &cfg)
            .await
            .map_err(|e| anyhow::anyhow!("attempt {attempt}: {e}"))?;
        assert_eq!(conn.profile(), TlsProfile::Randomized);
        let seed = conn.randomized_seed().expect("randomized dials report a seed");
        seeds.insert(seed);
        ping(&mut conn).await?;
    }
    assert_eq!(seeds.len(), 20, "seeds must not repeat");
    Ok(())
}

#[tokio::test]
async fn seeded_randomized_dial_replays_the_same_hello() -> anyhow::Result<()> {
    let pki = TestPki::new()?;
    let addr = spawn_tls_server(server_config(pki.chain.clone(), pki.key_der.clone())?).await?;
    let seed: RandomizedSeed = "11".repeat(32).parse()?;
    let cfg = base_config(&pki)
        .with_profile("Randomized-v2")
        .with_randomized_seed(seed);

    let a = dial(&DialContext::background(), "tcp", &addr.to_string(), &cfg).await?;
    let b = dial(&DialContext::background(), "tcp", &addr.to_string(), &cfg).await?;
    assert_eq!(a.randomized_seed(), Some(seed));
    assert_eq!(a.spec(), b.spec());
    assert_eq!(a.ja3(), b.ja3());
    Ok(())
}

#[tokio::test]
async fn selection_follows_live_parameters() -> anyhow::Result<()> {
    let pki = TestPki::new()?;
    let addr = spawn_tls_server(server_config(pki.chain.clone(), pki.key_der.clone())?).await?;
    let holder = ClientParameters::default();

    holder.set(Some(&serde_json::json!({ "SelectRandomizedTLSProfileProbability": 1.0 })))?;
    let cfg = base_config(&pki);
    let cfg = DialConfig {
        parameters: holder.get(),
        ..cfg
    };
    let conn = dial(&DialContext::background(), "tcp", &addr.to_string(), &cfg).await?;
    assert_eq!(conn.profile(), TlsProfile::Randomized);

    holder.set(Some(&serde_json::json!({
        "SelectRandomizedTLSProfileProbability": 0.0,
        "LimitTLSProfiles": ["Firefox-56"],
    })))?;
    let cfg = DialConfig {
        parameters: holder.get(),
        ..cfg
    };
    let conn = dial(&DialContext::background(), "tcp", &addr.to_string(), &cfg).await?;
    assert_eq!(conn.profile(), TlsProfile::Firefox56);
    Ok(())
}

#[tokio::test]
async fn server_name_from_dial_address() -> anyhow::Result<()> {
    let pki = TestPki::new()?;
    let addr = spawn_tls_server(server_config(pki.chain.clone(), pki.key_der.clone())?).await?;
    let cfg = DialConfig::new(Arc::new(TcpDialer), Arc::new(Parameters::default()))
        .with_profile("Chrome-70")
        .with_trusted_ca_file(pki.ca_file.path());

    let conn = dial(
        &DialContext::background(),
        "tcp4",
        &format!("localhost:{}", addr.port()),
        &cfg,
    )
    .await?;
    assert_eq!(conn.server_name(), "localhost");
    Ok(())
}

#[tokio::test]
async fn wrong_server_name_is_a_certificate_error() -> anyhow::Result<()> {
    let pki = TestPki::new()?;
    let addr = spawn_tls_server(server_config(pki.chain.clone(), pki.key_der.clone())?).await?;
    let cfg = base_config(&pki)
        .with_profile("Firefox-65")
        .with_sni_server_name("not-localhost.example");

    let err = dial(&DialContext::background(), "tcp", &addr.to_string(), &cfg)
        .await
        .unwrap_err();
    assert!(err.is_certificate_error(), "{err}");
    assert_eq!(err.phase(), DialPhase::Handshake);
    Ok(())
}

#[tokio::test]
async fn rsa_server_accepts_every_fixed_profile_and_randomized_draws() -> anyhow::Result<()> {
    let pki = TestPki::rsa()?;
    let addr = spawn_tls_server(server_config(pki.chain.clone(), pki.key_der.clone())?).await?;
    let ctx = DialContext::background().with_timeout(Duration::from_secs(60));

    for profile in ProfileRegistry::global().fixed() {
        let cfg = base_config(&pki).with_profile(profile.id());
        let mut conn = dial(&ctx, "tcp", &addr.to_string(), &cfg)
            .await
            .map_err(|e| anyhow::anyhow!("{profile}: {e}"))?;
        ping(&mut conn).await?;
    }

    let cfg = base_config(&pki).with_profile("Randomized-v2");
    for attempt in 0..20 {
        let mut conn = dial(&ctx, "tcp", &addr.to_string(), &cfg)
            .await
            .map_err(|e| anyhow::anyhow!("attempt {attempt}: {e}"))?;
        ping(&mut conn).await?;
    }
    Ok(())
}
