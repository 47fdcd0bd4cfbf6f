//! snq - load a Sonos zone's queue from the command line.
//!
//! Discovers ZonePlayers over SSDP, resolves the requested room name to
//! a device, then clears (unless appending) and fills its queue via
//! AVTransport.

use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use snqcontrol::{
    AvTransportClient, DescriptionSource, HttpDescriptionSource, load_queue, resolve_device,
};
use snqupnp::ssdp::{SearchResponse, SsdpClient};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Sonos ZonePlayers answer SSDP searches for this device type.
const ZONE_PLAYER_ST: &str = "urn:schemas-upnp-org:device:ZonePlayer:1";

const DESCRIPTION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "snq")]
#[command(about = "Queue tracks on a Sonos zone from the command line.")]
struct Cli {
    /// Sonos room name to target
    #[arg(short = 'd', long = "device", required_unless_present = "list")]
    device: Option<String>,

    /// Append to the zone's queue instead of clearing it first
    #[arg(short = 'a', long = "append")]
    append: bool,

    /// List the zones that answered discovery and exit
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Seconds to wait for discovery responses
    #[arg(long = "timeout", default_value_t = 2)]
    timeout: u64,

    /// Track URLs to enqueue
    items: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    run(Cli::parse())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let client = SsdpClient::new().context("SSDP socket setup")?;
    let found = client
        .search(ZONE_PLAYER_ST, Duration::from_secs(cli.timeout))
        .context("SSDP search")?;

    let source = HttpDescriptionSource::new(DESCRIPTION_TIMEOUT);

    if cli.list {
        return list_zones(&source, &found);
    }

    if found.is_empty() {
        bail!("No Sonos devices found");
    }

    let room = cli.device.expect("clap requires --device unless --list");

    let device_url = resolve_device(&source, &found, &room)?;
    info!("Resolved '{}' to {}", room, device_url);

    let renderer = AvTransportClient::new(device_url);
    let report = load_queue(&renderer, &cli.items, cli.append)
        .with_context(|| format!("loading queue on '{}'", room))?;

    info!(
        "✅ {} track(s) enqueued, {} skipped",
        report.enqueued, report.skipped
    );
    Ok(())
}

fn list_zones(source: &impl DescriptionSource, found: &[SearchResponse]) -> anyhow::Result<()> {
    if found.is_empty() {
        bail!("No Sonos devices found");
    }

    for candidate in found {
        let Some(location) = candidate.location() else {
            continue;
        };
        let url = match Url::parse(location) {
            Ok(url) => url,
            Err(err) => {
                warn!("Parsing {}: {}", location, err);
                continue;
            }
        };
        match source.fetch(&url) {
            Ok(description) => {
                println!(
                    "{}\t{}\t{}",
                    description.room_name.as_deref().unwrap_or("?"),
                    description.model_name.as_deref().unwrap_or("?"),
                    url
                );
            }
            Err(err) => warn!("Fetching {}: {}", url, err),
        }
    }

    Ok(())
}
