//! Pinpoint CLI
//!
//! Command-line front end for the listing location resolver: drive a resolver
//! session from map events on stdin, or run one-off lookups.

#![allow(clippy::print_stdout)]

mod session;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use application::{ChannelLocationSink, GeocodingPort, LocationResolver, PositionPort};
use clap::{Parser, Subcommand};
use domain::{GeoLocation, Location};
use infrastructure::{
    AppConfig, LogFormat, geocoding_port_from_config, init_logging, position_port_from_config,
};
use tracing::info;

use crate::session::SessionOptions;

/// Pinpoint CLI
#[derive(Parser)]
#[command(name = "pinpoint-cli")]
#[command(author, version, about = "Pinpoint listing location resolver", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (defaults to ./pinpoint.toml when present)
    #[arg(short, long, env = "PINPOINT_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format (overrides the configuration)
    #[arg(long)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive resolver session
    ///
    /// Reads map events from stdin, one per line: `ready`, `click <lat> <lng>`,
    /// `show`, `settle`, `quit`. Every location update is printed as a JSON line.
    ///
    /// Example: printf 'ready\nclick 12.97 77.59\n' | pinpoint-cli resolve
    Resolve {
        /// Initial location (`"lat, lng"`) the listing already has
        #[arg(long, allow_hyphen_values = true)]
        at: Option<GeoLocation>,

        /// Address stored with the initial location
        #[arg(long)]
        address: Option<String>,

        /// Report coordinates only, without reverse geocoding
        #[arg(long)]
        no_geocode: bool,

        /// Seconds to wait for outstanding lookups on `settle` and end of input
        #[arg(long, default_value = "10")]
        settle_timeout: u64,
    },

    /// Look up the address of a point
    ///
    /// Example: pinpoint-cli reverse "12.9716, 77.5946"
    Reverse {
        /// Coordinates as `"lat, lng"`
        #[arg(allow_hyphen_values = true)]
        coordinates: GeoLocation,
    },

    /// Look up the coordinates of an address
    Geocode {
        /// Free-form address
        #[arg(required = true, num_args = 1..)]
        address: Vec<String>,
    },

    /// Show the device position from the configured source
    Locate,

    /// Print the effective configuration as TOML
    Config,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initial location for a resolve session
fn initial_location(at: Option<GeoLocation>, address: Option<String>) -> Option<Location> {
    match (at, address) {
        (None, None) => None,
        (at, address) => Some(Location::new(at.unwrap_or_default(), address)),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;

    let log_format = cli.log_format.unwrap_or(config.log_format);
    init_logging(log_format, log_filter_from_verbosity(cli.verbose))?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    match cli.command {
        Commands::Resolve {
            at,
            address,
            no_geocode,
            settle_timeout,
        } => {
            let position = position_port_from_config(&config.position)?;
            let (sink, updates) = ChannelLocationSink::channel();

            let mut resolver = LocationResolver::new(position, Arc::new(sink))
                .with_config(config.resolver.resolver_config());
            if config.resolver.reverse_geocode && !no_geocode {
                resolver = resolver.with_geocoder(geocoding_port_from_config(&config.geocoding)?);
            }

            let handle = resolver.spawn(initial_location(at, address));
            info!("Resolver session started");

            let options = SessionOptions {
                default_center: config.resolver.default_center,
                settle_timeout: Duration::from_secs(settle_timeout),
            };
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            session::run(handle, updates, stdin, options).await?;
        },

        Commands::Reverse { coordinates } => {
            let geocoder = geocoding_port_from_config(&config.geocoding)?;
            let result = geocoder
                .reverse_geocode(coordinates)
                .await
                .with_context(|| format!("No address for {coordinates}"))?;
            print_json(&Location::new(coordinates, Some(result.formatted_address)))?;
        },

        Commands::Geocode { address } => {
            let address = address.join(" ");
            let geocoder = geocoding_port_from_config(&config.geocoding)?;
            let coordinates = geocoder
                .geocode(&address)
                .await
                .with_context(|| format!("No coordinates for '{address}'"))?;
            print_json(&Location::new(coordinates, Some(address)))?;
        },

        Commands::Locate => {
            let position = position_port_from_config(&config.position)?;
            let coordinates = position
                .current_position()
                .await
                .context("Device position unavailable")?;
            print_json(&coordinates)?;
        },

        Commands::Config => {
            print!("{}", config.to_toml()?);
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_filter_verbosity_zero() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
    }

    #[test]
    fn log_filter_verbosity_one() {
        assert_eq!(log_filter_from_verbosity(1), "info");
    }

    #[test]
    fn log_filter_verbosity_two() {
        assert_eq!(log_filter_from_verbosity(2), "debug");
    }

    #[test]
    fn log_filter_verbosity_three_or_more() {
        assert_eq!(log_filter_from_verbosity(3), "trace");
        assert_eq!(log_filter_from_verbosity(10), "trace");
    }

    #[test]
    fn resolve_parses_initial_location() {
        let cli = Cli::try_parse_from([
            "pinpoint-cli",
            "resolve",
            "--at",
            "12.9716, 77.5946",
            "--address",
            "MG Road",
        ])
        .unwrap();
        let Commands::Resolve { at, address, .. } = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(at, Some(GeoLocation::bengaluru()));
        assert_eq!(address.as_deref(), Some("MG Road"));
    }

    #[test]
    fn reverse_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["pinpoint-cli", "reverse", "-33.8688, 151.2093"]).unwrap();
        let Commands::Reverse { coordinates } = cli.command else {
            panic!("expected reverse");
        };
        assert_eq!(coordinates, GeoLocation::new_unchecked(-33.8688, 151.2093));
    }

    #[test]
    fn reverse_rejects_out_of_range() {
        assert!(Cli::try_parse_from(["pinpoint-cli", "reverse", "95, 10"]).is_err());
    }

    #[test]
    fn log_format_flag() {
        let cli = Cli::try_parse_from(["pinpoint-cli", "--log-format", "json", "locate"]).unwrap();
        assert_eq!(cli.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn initial_location_combinations() {
        assert!(initial_location(None, None).is_none());

        let location = initial_location(Some(GeoLocation::bengaluru()), None).unwrap();
        assert!(location.is_set());

        let location = initial_location(None, Some("Somewhere".to_string())).unwrap();
        assert!(!location.is_set());
        assert_eq!(location.address(), Some("Somewhere"));
    }
}
