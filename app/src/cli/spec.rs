use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use hs_tls::{BuiltSpec, Extension, FingerprintBuilder, RandomizedSeed};

#[derive(ClapArgs, Debug)]
pub struct SpecArgs {
    /// Profile id, e.g. Chrome-72 or Randomized-v2
    pub profile: String,
    /// 64 hex digit seed that replays a randomized hello
    #[arg(long)]
    pub seed: Option<RandomizedSeed>,
    /// Print the full spec as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &SpecArgs) -> Result<()> {
    let builder = FingerprintBuilder::default();
    let profile = builder.registry().lookup(&args.profile)?;
    let built = match args.seed {
        Some(seed) => builder.build_spec_with_seed(profile, seed)?,
        None => builder.build_spec(profile)?,
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&built).context("serializing spec")?
        );
    } else {
        print!("{}", render(&built));
    }
    Ok(())
}

fn render(built: &BuiltSpec) -> String {
    let spec = &built.spec;
    let mut out = String::new();
    out.push_str(&format!("profile:   {}\n", built.profile));
    if let Some(seed) = &built.seed {
        out.push_str(&format!("seed:      {seed}\n"));
    }
    out.push_str(&format!(
        "versions:  {:#06x}..={:#06x}\n",
        spec.tls_version_min, spec.tls_version_max
    ));
    out.push_str(&format!("ciphers:   {}\n", hex_list(&spec.cipher_suites)));
    out.push_str("extensions:\n");
    for ext in &spec.extensions {
        out.push_str(&format!("  {:04x}  {}\n", ext.id(), describe(ext)));
    }
    out.push_str(&format!("ja3:       {}\n", spec.ja3_string()));
    out.push_str(&format!("ja3 hash:  {}\n", spec.ja3_hash()));
    out
}

fn describe(ext: &Extension) -> String {
    match ext {
        Extension::SupportedGroups { groups } => format!("supported_groups {}", hex_list(groups)),
        Extension::SignatureAlgorithms { schemes } => {
            format!("signature_algorithms {}", hex_list(schemes))
        }
        Extension::KeyShare { groups } => format!("key_share {}", hex_list(groups)),
        Extension::SupportedVersions { versions } => {
            format!("supported_versions {}", hex_list(versions))
        }
        Extension::Alpn { protocols } => format!("alpn {}", protocols.join(",")),
        other => format!("{other:?}"),
    }
}

fn hex_list(values: &[u16]) -> String {
    values
        .iter()
        .map(|v| format!("{v:04x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_tls::TlsProfile;

    #[test]
    fn renders_fixed_profile_without_seed() {
        let built = FingerprintBuilder::default()
            .build_spec(TlsProfile::Chrome72)
            .unwrap();
        let text = render(&built);
        assert!(text.starts_with("profile:   Chrome-72\n"));
        assert!(!text.contains("seed:"));
        assert!(text.contains(&built.spec.ja3_hash()));
    }

    #[test]
    fn renders_seed_for_randomized() {
        let seed: RandomizedSeed = "ab".repeat(32).parse().unwrap();
        let built = FingerprintBuilder::default()
            .build_spec_with_seed(TlsProfile::Randomized, seed)
            .unwrap();
        assert!(render(&built).contains(&format!("seed:      {seed}")));
    }
}
