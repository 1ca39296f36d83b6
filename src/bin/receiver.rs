//! PCM Bridge Receiver
//!
//! Receives raw PCM datagrams and plays them on an output device.
//!
//! Usage: `receiver [config.toml] [--null-sink]`

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lan_pcm_bridge::{
    audio::{create_shared_buffer, list_devices, AudioSink, CpalSink, NullSink, PlaybackDrain},
    config::AppConfig,
    monitor::{fail_stop, IntervalCounters, LogIndicator, StatsMonitor},
    network::{AudioReceiver, NetworkIngest},
    player::spawn_player,
    ui::{AppState, WebServer},
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

    tracing::info!("Starting LAN PCM Bridge receiver");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let null_sink = args.iter().any(|a| a == "--null-sink");
    let config_path = args.iter().find(|a| !a.starts_with("--")).map(PathBuf::from);

    let config = AppConfig::load(config_path.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    let format = config.format;

    // List available output devices
    println!("\n=== Available Output Devices ===");
    for device in list_devices() {
        let default_marker = if device.is_default { " [DEFAULT]" } else { "" };
        println!("  {}{}:", device.name, default_marker);
        println!("    Sample rates: {:?}", device.sample_rates);
        println!("    Channels: {:?}", device.channels);
    }
    println!();

    let buffer = create_shared_buffer(
        config.buffer.preferred_capacity,
        config.buffer.fallback_capacity,
    );
    tracing::info!(
        "Ring buffer: {} bytes ({:?}), {} ms of {} audio",
        buffer.capacity(),
        buffer.allocation(),
        format.duration_of(buffer.capacity()).as_millis(),
        format
    );

    let counters = Arc::new(IntervalCounters::new());
    let drain = PlaybackDrain::new(
        buffer.clone(),
        counters.clone(),
        config.buffer.chunk_size,
        config.buffer.start_threshold,
    )?;
    let monitor = StatsMonitor::new(
        buffer.clone(),
        counters.clone(),
        format,
        config.stats.report_interval(),
        Box::new(LogIndicator::new()),
    );
    let latest = monitor.latest();

    let device = config.playback.output_device.clone();
    let queue_depth = config.playback.sink_queue_depth;
    let started = if null_sink {
        tracing::info!("Using paced null sink, audio is discarded");
        spawn_player(
            move || Ok(Box::new(NullSink::paced(format)) as Box<dyn AudioSink>),
            drain,
            monitor,
            config.playback.idle_sleep(),
        )
    } else {
        spawn_player(
            move || {
                CpalSink::open(device.as_deref(), format, queue_depth)
                    .map(|sink| Box::new(sink) as Box<dyn AudioSink>)
            },
            drain,
            monitor,
            config.playback.idle_sleep(),
        )
    };

    if let Err(e) = started {
        // A half-initialized output must not play anything
        fail_stop(&mut LogIndicator::new(), &e);
    }

    let ingest = NetworkIngest::new(buffer.clone(), counters.clone());
    let receiver = AudioReceiver::start(&config.network, ingest)
        .await
        .context("Failed to start network receiver")?;

    if config.ui.enabled {
        let web_server = WebServer::new(
            config.ui.clone(),
            AppState {
                buffer: buffer.clone(),
                counters: counters.clone(),
                latest,
                format,
                started: Instant::now(),
            },
        );
        let _web_handle = web_server.start_background();
    }

    tracing::info!(
        "Waiting for audio on {} (prefill {} bytes, chunk {} bytes)",
        receiver.local_addr(),
        config.buffer.start_threshold,
        config.buffer.chunk_size
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    Ok(())
}
