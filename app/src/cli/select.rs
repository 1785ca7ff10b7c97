use anyhow::{ensure, Result};
use clap::Args as ClapArgs;
use hs_config::ParameterSource;
use hs_tls::{select_profile_with, ProfileRegistry, TlsProfile};
use rand::Rng;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(ClapArgs, Debug)]
pub struct SelectArgs {
    /// Number of selections to draw
    #[arg(long, default_value_t = 10_000)]
    pub count: u32,
    /// JSON or YAML parameter overrides
    #[arg(long)]
    pub params: Option<PathBuf>,
}

pub fn run(args: &SelectArgs) -> Result<()> {
    ensure!(args.count > 0, "--count must be positive");
    let params = super::load_parameters(args.params.as_deref())?;
    let histogram = histogram(
        ProfileRegistry::global(),
        params.as_ref(),
        args.count,
        &mut rand::thread_rng(),
    );

    for (profile, hits) in &histogram {
        let share = f64::from(*hits) / f64::from(args.count);
        println!("{:<20} {:>8} {:>7.2}%", profile.id(), hits, share * 100.0);
    }
    Ok(())
}

fn histogram<R: Rng + ?Sized>(
    registry: &ProfileRegistry,
    params: &dyn ParameterSource,
    count: u32,
    rng: &mut R,
) -> BTreeMap<TlsProfile, u32> {
    let mut out = BTreeMap::new();
    for _ in 0..count {
        *out.entry(select_profile_with(registry, params, rng)).or_insert(0) += 1;
    }
    out
}
