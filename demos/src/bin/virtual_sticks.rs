// Streams one virtual stick pattern to a Crazyflie for a given time.
//
// Run with RUST_LOG=virtual_sticks=trace to see every frame sent.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crazyflie_link::LinkContext;
use tokio::time::sleep;
use virtual_sticks::transport::crtp::{CrtpTransport, DEFAULT_MAX_YAW_RATE};
use virtual_sticks::{Pattern, Session, StreamConfig, StreamState};

#[derive(Parser, Debug)]
#[command(about = "Fly a virtual stick pattern on a Crazyflie")]
struct Args {
    /// Link URI of the Crazyflie
    #[arg(long, default_value = "radio://0/80/2M/E7E7E7E7E7")]
    uri: String,

    /// Pattern to stream (roll-left-right, pitch-forward-back, throttle-up-down,
    /// horizontal-orbit, vertical-orbit, vertical-sine-wave, horizontal-sine-wave)
    #[arg(long, default_value = "horizontal-orbit")]
    pattern: Pattern,

    /// Streaming duration in seconds
    #[arg(long, default_value_t = 10)]
    seconds: u64,

    /// Command rate, between 5 and 25 Hz. Defaults to the pattern rate
    #[arg(long)]
    rate_hz: Option<u32>,

    /// Velocity at full stick deflection (m/s)
    #[arg(long, default_value_t = 0.3)]
    max_velocity: f32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = StreamConfig::default();
    if let Some(rate_hz) = args.rate_hz {
        config = config.with_tick_interval(Duration::from_micros(1_000_000 / rate_hz.max(1) as u64));
    }

    let context = LinkContext::new();
    let transport = Arc::new(
        CrtpTransport::connect_from_uri(&context, &args.uri)
            .await?
            .with_scale(args.max_velocity, DEFAULT_MAX_YAW_RATE),
    );
    let session = Session::with_config(transport.clone(), config)?;

    session.enable().await?;
    println!("Virtual sticks enabled, streaming {} for {}s", args.pattern, args.seconds);
    session.arm(args.pattern)?;

    for _ in 0..args.seconds * 10 {
        sleep(Duration::from_millis(100)).await;
        if session.state() == StreamState::Idle {
            break;
        }
    }

    if let Some(error) = session.last_error() {
        log::warn!("Stream stopped early: {}", error);
    }

    session.disable().await?;
    transport.disconnect().await;
    println!("Done.");
    Ok(())
}
