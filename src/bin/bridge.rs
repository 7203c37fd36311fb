//! E-LIP Bridge Binary
//!
//! Runs a session against an E-LIP controller, optionally queueing one
//! manual registration.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use elip_bridge::protocol::{Attribution, DoorOpening, Floor, ManualRegistrationRequest};
use elip_bridge::{Config, Session};
use tracing_subscriber::{fmt, EnvFilter};

/// E-LIP Bridge
#[derive(Parser, Debug)]
#[command(name = "elip-bridge")]
#[command(about = "Persistent client for E-LIP elevator access-control controllers")]
#[command(version)]
struct Args {
    /// Controller host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Controller TCP port
    #[arg(short, long, default_value = "60173")]
    port: u16,

    /// Seconds between health checks
    #[arg(long, default_value = "60")]
    health_check_secs: u64,

    /// Milliseconds to idle between session cycles
    #[arg(long, default_value = "100")]
    idle_ms: u64,

    /// Seconds to wait after a transport failure
    #[arg(long, default_value = "5")]
    retry_cooldown_secs: u64,

    /// Seconds to run before shutting down
    #[arg(long, default_value = "120")]
    run_secs: u64,

    /// Card reader number for a manual registration
    #[arg(long)]
    card_reader: Option<u32>,

    /// Accessible floor as NUMBER:OPENING (opening: none, front, rear, both)
    #[arg(long = "floor", value_parser = parse_floor)]
    floors: Vec<Floor>,

    /// Attribution of the registration
    #[arg(long, value_enum, default_value = "general")]
    attribution: AttributionArg,

    /// Sequence number of the registration
    #[arg(long, default_value = "0")]
    sequence: u32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AttributionArg {
    General,
    Handicapped,
    Vip,
}

impl From<AttributionArg> for Attribution {
    fn from(arg: AttributionArg) -> Self {
        match arg {
            AttributionArg::General => Attribution::General,
            AttributionArg::Handicapped => Attribution::Handicapped,
            AttributionArg::Vip => Attribution::Vip,
        }
    }
}

fn parse_floor(value: &str) -> Result<Floor, String> {
    let (number, opening) = value
        .split_once(':')
        .ok_or_else(|| format!("expected NUMBER:OPENING, got '{}'", value))?;

    let number: u32 = number
        .parse()
        .map_err(|e| format!("invalid floor number '{}': {}", number, e))?;

    let opening = match opening.to_ascii_lowercase().as_str() {
        "none" => DoorOpening::None,
        "front" => DoorOpening::Front,
        "rear" => DoorOpening::Rear,
        "both" => DoorOpening::Both,
        other => return Err(format!("unknown door opening '{}'", other)),
    };

    Floor::new(number, opening).map_err(|e| e.to_string())
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,elip_bridge=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("E-LIP Bridge v{}", elip_bridge::VERSION);
    tracing::info!("Controller address: {}:{}", args.host, args.port);

    // Build config from args
    let config = Config::builder()
        .host(&args.host)
        .port(args.port)
        .health_check_period(Duration::from_secs(args.health_check_secs))
        .idle_interval(Duration::from_millis(args.idle_ms))
        .retry_cooldown(Duration::from_secs(args.retry_cooldown_secs))
        .build();

    let registration = match args.card_reader {
        Some(card_reader) => match ManualRegistrationRequest::new(
            card_reader,
            args.floors.clone(),
            args.attribution.into(),
            args.sequence,
        ) {
            Ok(request) => Some(request),
            Err(e) => {
                tracing::error!("Invalid registration: {}", e);
                std::process::exit(1);
            }
        },
        None => None,
    };

    let session = match Session::tcp(config) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to create session: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(request) = registration {
        session.send(request);
    }

    if let Err(e) = session.start() {
        tracing::error!("Failed to start session: {}", e);
        std::process::exit(1);
    }

    std::thread::sleep(Duration::from_secs(args.run_secs));

    session.stop();
    tracing::info!("Bridge stopped");
}
