pub mod dial;
pub mod profiles;
pub mod select;
pub mod spec;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hs_config::{ClientParameters, Parameters};
use std::path::Path;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "helloshape")]
#[command(about = "TLS ClientHello fingerprint profiles and fingerprinted dials", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered profiles with their JA3 fingerprints
    Profiles(profiles::ProfilesArgs),
    /// Print the ClientHello spec a profile produces
    Spec(spec::SpecArgs),
    /// Run the profile selector repeatedly and print a histogram
    Select(select::SelectArgs),
    /// Dial an address with a fingerprinted TLS handshake
    Dial(dial::DialArgs),
}

/// Parameter snapshot from an optional JSON/YAML overrides file.
pub(crate) fn load_parameters(path: Option<&Path>) -> Result<Arc<Parameters>> {
    match path {
        Some(path) => {
            let holder = ClientParameters::from_file(path)
                .with_context(|| format!("loading parameters from {}", path.display()))?;
            Ok(holder.get())
        }
        None => Ok(Arc::new(Parameters::default())),
    }
}
