//! Process-wide engine instance and the frame loop that gives it safe points.
//!
//! The engine is installed once at startup and read from anywhere after
//! that. Reload replaces its rule set, never the engine itself.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use reactor_engine::Engine;

use crate::producer::Producer;
use crate::sim::SimHost;

static ENGINE: OnceLock<Arc<Engine<SimHost>>> = OnceLock::new();

/// Frames between tracking sweeps.
const MAINTAIN_EVERY: u64 = 60;

/// Install the process-wide engine. Fails if one is already installed.
pub fn install(engine: Arc<Engine<SimHost>>) -> Result<&'static Arc<Engine<SimHost>>> {
    if ENGINE.set(engine).is_err() {
        bail!("engine already installed");
    }
    match ENGINE.get() {
        Some(engine) => Ok(engine),
        None => bail!("engine vanished during install"),
    }
}

/// The installed engine, if startup got that far.
pub fn engine() -> Option<&'static Arc<Engine<SimHost>>> {
    ENGINE.get()
}

/// One frame: run deferred effects and timed tasks, and every
/// [`MAINTAIN_EVERY`] frames sweep the tracking state.
pub fn frame(engine: &Engine<SimHost>, producer: &Producer, frame_no: u64) {
    let report = engine.safe_point();
    if report.failed > 0 {
        tracing::warn!("Frame {}: {} effects failed", frame_no, report.failed);
    }

    if frame_no % MAINTAIN_EVERY == 0 {
        let now = Instant::now();
        engine.maintain(now);
        let expired = producer.release_window().sweep(now);
        if expired > 0 {
            tracing::debug!("Frame {}: {} release windows expired", frame_no, expired);
        }
    }
}

/// Spawn the frame loop on the current tokio runtime.
pub fn start(engine: Arc<Engine<SimHost>>, producer: Arc<Producer>, frame_time: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(frame_time);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tracing::info!("Frame loop started ({:?} per frame)", frame_time);

        let mut frame_no = 0u64;
        loop {
            interval.tick().await;
            frame_no += 1;
            frame(&engine, &producer, frame_no);
        }
    });
}
