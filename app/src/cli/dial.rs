use anyhow::{ensure, Result};
use clap::Args as ClapArgs;
use hs_config::{names, ParameterSource};
use hs_tls::RandomizedSeed;
use hs_transport::{dial, DialConfig, DialContext, TcpDialer, TlsConnection};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const FALLBACK_TIMEOUT_SECS: f64 = 20.0;

#[derive(ClapArgs, Debug)]
pub struct DialArgs {
    /// host:port to connect to
    pub address: String,
    /// Profile id; selected from parameters when omitted
    #[arg(long)]
    pub profile: Option<String>,
    /// Server name to send instead of the host in the address
    #[arg(long)]
    pub sni: Option<String>,
    /// Skip server certificate verification
    #[arg(long)]
    pub insecure: bool,
    /// Extra PEM file of trusted CA certificates (repeatable)
    #[arg(long = "ca-file")]
    pub ca_files: Vec<PathBuf>,
    /// Replay a randomized hello
    #[arg(long)]
    pub seed: Option<RandomizedSeed>,
    /// JSON or YAML parameter overrides
    #[arg(long)]
    pub params: Option<PathBuf>,
    /// Overall connect plus handshake budget; defaults to TLSHandshakeTimeout
    #[arg(long)]
    pub timeout_secs: Option<f64>,
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: &DialArgs) -> Result<()> {
    let params = super::load_parameters(args.params.as_deref())?;
    let timeout = timeout(args.timeout_secs, params.as_ref())?;

    let mut config = DialConfig::new(Arc::new(TcpDialer), params).with_skip_verify(args.insecure);
    if let Some(profile) = &args.profile {
        config = config.with_profile(profile.clone());
    }
    if let Some(sni) = &args.sni {
        config = config.with_sni_server_name(sni.clone());
    }
    if let Some(seed) = args.seed {
        config = config.with_randomized_seed(seed);
    }
    for path in &args.ca_files {
        config = config.with_trusted_ca_file(path.clone());
    }

    let ctx = DialContext::background().with_timeout(timeout);
    let conn = dial(&ctx, "tcp", &args.address, &config).await?;
    info!(address = %args.address, profile = %conn.profile(), "dial succeeded");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report(&conn))?);
    } else {
        print_report(&conn);
    }
    Ok(())
}

fn timeout(flag: Option<f64>, params: &dyn ParameterSource) -> Result<Duration> {
    let secs = flag
        .or_else(|| params.float(names::TLS_HANDSHAKE_TIMEOUT))
        .unwrap_or(FALLBACK_TIMEOUT_SECS);
    ensure!(
        secs.is_finite() && secs > 0.0,
        "timeout must be a positive number of seconds, got {secs}"
    );
    Ok(Duration::from_secs_f64(secs))
}

fn report(conn: &TlsConnection) -> serde_json::Value {
    json!({
        "profile": conn.profile().id(),
        "seed": conn.randomized_seed().map(|s| s.to_string()),
        "server_name": conn.server_name(),
        "alpn": conn.alpn_protocol().map(|p| String::from_utf8_lossy(p).into_owned()),
        "protocol_version": conn.protocol_version().map(version_name),
        "ja3": conn.ja3(),
    })
}

fn print_report(conn: &TlsConnection) {
    println!("profile:          {}", conn.profile());
    if let Some(seed) = conn.randomized_seed() {
        println!("seed:             {seed}");
    }
    println!("server name:      {}", conn.server_name());
    println!(
        "alpn:             {}",
        conn.alpn_protocol()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .unwrap_or_else(|| "-".into())
    );
    println!(
        "protocol version: {}",
        conn.protocol_version()
            .map(version_name)
            .unwrap_or_else(|| "-".into())
    );
    println!("ja3:              {}", conn.ja3());
}

fn version_name(v: u16) -> String {
    match v {
        0x0304 => "TLS 1.3".into(),
        0x0303 => "TLS 1.2".into(),
        0x0302 => "TLS 1.1".into(),
        0x0301 => "TLS 1.0".into(),
        other => format!("{other:#06x}"),
    }
}
