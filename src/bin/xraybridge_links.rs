//! CLI tool for generating subscription links offline
//!
//! Usage:
//!   xraybridge-links --inbounds config.json --profiles subs.jsonc --uuid <ids>
//!   xraybridge-links --inbounds config.json --profiles subs.jsonc --uuid <superkey> --superkey <superkey> --format base64

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use xraybridge::inbound::{inbounds_from_config, normalize_inbounds};
use xraybridge::profile::{load_profiles, strip_comments};
use xraybridge::subscription::{generate_links, render_base64, render_plain, SubscriptionFormat};

/// Generate subscription links from an Xray config and a profile file
#[derive(Parser, Debug)]
#[command(name = "xraybridge-links")]
#[command(author = "XrayBridge Contributors")]
#[command(version)]
#[command(about = "Generate subscription share links without running the bridge")]
struct Args {
    /// Xray config file (or a bare inbound array)
    #[arg(short = 'i', long, env = "XRAY_API_BRIDGE_INBOUNDS")]
    inbounds: PathBuf,

    /// Subscription profile file
    #[arg(short = 'p', long, env = "XRAY_API_BRIDGE_SUBS_CONFIG")]
    profiles: PathBuf,

    /// Comma separated client ids, or the superkey
    #[arg(short = 'u', long)]
    uuid: String,

    /// Query token that selects every client
    #[arg(long, env = "XRAY_API_BRIDGE_SUBS_SUPERKEY", hide_env_values = true)]
    superkey: Option<String>,

    /// Output format: plain, json or base64
    #[arg(short = 'f', long, default_value = "plain")]
    format: SubscriptionFormat,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.uuid.trim().is_empty() {
        bail!("--uuid must not be empty");
    }

    let text = std::fs::read_to_string(&args.inbounds)
        .with_context(|| format!("could not read {}", args.inbounds.display()))?;
    let config: serde_json::Value = serde_json::from_str(&strip_comments(&text))
        .with_context(|| format!("could not decode {}", args.inbounds.display()))?;
    let inbounds = normalize_inbounds(&inbounds_from_config(&config)?);

    let profiles = load_profiles(&args.profiles)?;
    let links = generate_links(&inbounds, &profiles, &args.uuid, args.superkey.as_deref())?;

    if links.is_empty() {
        eprintln!("No links generated");
        return Ok(());
    }

    match args.format {
        SubscriptionFormat::Plain => print!("{}", render_plain(&links)),
        SubscriptionFormat::Base64 => println!("{}", render_base64(&links)),
        SubscriptionFormat::Json => println!("{}", serde_json::to_string_pretty(&links)?),
    }

    Ok(())
}
