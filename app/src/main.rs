//! helloshape: inspect TLS ClientHello fingerprint profiles and dial with them.

mod cli;
mod logging;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    logging::init_logging()?;

    match args.command {
        cli::Commands::Profiles(a) => cli::profiles::run(&a),
        cli::Commands::Spec(a) => cli::spec::run(&a),
        cli::Commands::Select(a) => cli::select::run(&a),
        cli::Commands::Dial(a) => cli::dial::run(&a).await,
    }
}
