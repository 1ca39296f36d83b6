//! Playback loop
//!
//! One dedicated thread runs the drain and the stats monitor one after the
//! other, forever. Each drain step forwards a bounded number of chunks, so
//! reports stay on schedule while the buffer never runs dry. The output sink
//! is opened on that thread because device streams are not always `Send`.

use crossbeam_channel::bounded;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::audio::drain::{DrainStep, PlaybackDrain};
use crate::audio::sink::{idle, AudioSink};
use crate::error::AudioError;
use crate::monitor::stats::StatsMonitor;

pub struct Player<S: AudioSink> {
    drain: PlaybackDrain,
    monitor: StatsMonitor,
    sink: S,
    idle_sleep: Duration,
}

impl<S: AudioSink> Player<S> {
    pub fn new(drain: PlaybackDrain, monitor: StatsMonitor, sink: S, idle_sleep: Duration) -> Self {
        Self {
            drain,
            monitor,
            sink,
            idle_sleep,
        }
    }

    /// One loop iteration: drain, report if due, pause if starved
    pub fn tick(&mut self) -> DrainStep {
        let step = self.drain.step(&mut self.sink);
        self.monitor.poll(Instant::now());
        if step.should_idle() {
            idle(self.idle_sleep);
        }
        step
    }

    pub fn run(mut self) -> ! {
        tracing::info!(
            "Playback loop running: chunk {} bytes, prefill {} bytes",
            self.drain.chunk_size(),
            self.drain.start_threshold()
        );
        loop {
            self.tick();
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// Start the playback thread
///
/// `open_sink` runs on the new thread. Its failure is reported back here
/// and the thread exits without playing anything.
pub fn spawn_player<S, F>(
    open_sink: F,
    drain: PlaybackDrain,
    monitor: StatsMonitor,
    idle_sleep: Duration,
) -> Result<JoinHandle<()>, AudioError>
where
    S: AudioSink + 'static,
    F: FnOnce() -> Result<S, AudioError> + Send + 'static,
{
    let (init_tx, init_rx) = bounded::<Result<(), AudioError>>(1);

    let handle = thread::Builder::new()
        .name("playback".to_string())
        .spawn(move || match open_sink() {
            Ok(sink) => {
                let _ = init_tx.send(Ok(()));
                Player::new(drain, monitor, sink, idle_sleep).run()
            }
            Err(e) => {
                let _ = init_tx.send(Err(e));
            }
        })
        .map_err(|e| AudioError::StreamError(e.to_string()))?;

    match init_rx.recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(AudioError::SinkClosed),
    }
}
