use anyhow::Result;
use clap::Args as ClapArgs;
use hs_tls::{FingerprintBuilder, ProfileRegistry};
use serde_json::json;

#[derive(ClapArgs, Debug)]
pub struct ProfilesArgs {
    /// Emit one JSON array instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &ProfilesArgs) -> Result<()> {
    let builder = FingerprintBuilder::default();
    let registry = ProfileRegistry::global();

    let mut rows = Vec::new();
    for &profile in registry.supported() {
        // Randomized specs differ per draw, so there is no stable JA3 to show.
        let ja3 = if registry.is_randomized(profile) {
            None
        } else {
            Some(builder.build_spec(profile)?.spec.ja3_hash())
        };
        rows.push((profile, ja3));
    }

    if args.json {
        let out: Vec<_> = rows
            .iter()
            .map(|(profile, ja3)| {
                json!({
                    "id": profile.id(),
                    "randomized": registry.is_randomized(*profile),
                    "ja3": ja3,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{:<20} {:<10} JA3", "PROFILE", "RANDOMIZED");
    for (profile, ja3) in rows {
        println!(
            "{:<20} {:<10} {}",
            profile.id(),
            registry.is_randomized(profile),
            ja3.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
