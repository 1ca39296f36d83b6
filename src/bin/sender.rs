//! Test Tone Sender
//!
//! Streams a sine tone to a receiver as raw PCM datagrams.
//!
//! Usage: `sender [target_addr] [frequency_hz] [payload_bytes]`

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lan_pcm_bridge::{
    config::AppConfig,
    constants::*,
    network::{PcmSender, ToneGenerator},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LAN PCM test sender");

    let config = AppConfig::load(None).context("Failed to load configuration")?;
    let mut args = std::env::args().skip(1);

    let target_addr: SocketAddr = args
        .next()
        .unwrap_or_else(|| format!("127.0.0.1:{}", DEFAULT_UDP_PORT))
        .parse()
        .context("Invalid target address")?;

    let frequency: f64 = match args.next() {
        Some(arg) => arg.parse().context("Invalid frequency")?,
        None => 440.0,
    };

    let payload_size: usize = match args.next() {
        Some(arg) => arg.parse().context("Invalid payload size")?,
        None => DEFAULT_PAYLOAD_SIZE,
    };
    let payload_size = payload_size.min(MAX_DATAGRAM_SIZE);
    if payload_size > MAX_PACKET_SIZE {
        tracing::warn!(
            "Payload of {} bytes exceeds one Ethernet frame and will be fragmented",
            payload_size
        );
    }

    let mut sender = PcmSender::connect(target_addr, config.format, payload_size).await?;
    let mut generator = ToneGenerator::new(config.format, frequency);

    tracing::info!(
        "Sending {:.0} Hz tone to {} as {} ({} bytes every {:.2} ms) - press Ctrl+C to stop",
        frequency,
        target_addr,
        config.format,
        sender.payload_size(),
        sender.packet_interval().as_secs_f64() * 1000.0
    );

    tokio::select! {
        result = sender.stream_tone(&mut generator, None) => result?,
        _ = tokio::signal::ctrl_c() => {}
    }

    let stats = sender.stats();
    tracing::info!(
        "Sent {} packets, {:.1} KB",
        stats.packets_sent,
        stats.bytes_sent as f64 / 1024.0
    );
    Ok(())
}
