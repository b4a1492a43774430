// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated dashboard for `ipip_dashboard`.
//!
//! A producer thread publishes `sin`, `cos`, `tan` and a two-channel `heat`
//! stream; the main loop drains and renders for a number of frames, then
//! writes the last frame as SVG.

mod svg;

use std::fs;
use std::io::{self, Write as _};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::Parser;
use ipip_dashboard::{Dashboard, Producer, Settings, ingest_channel};
use kurbo::Rect;
use serde_json::{Value, json};

/// Height of one figure in the snapshot, gaps included.
const FIGURE_PITCH: f64 = 280.0;

#[derive(Debug, Parser)]
#[command(name = "ipip_demo", version, about = "Simulated ipip dashboard rendered to SVG")]
struct Args {
    /// Write the SVG here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Frames to run before the snapshot.
    #[arg(long, default_value_t = 180)]
    frames: u32,
    /// Milliseconds between frames.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Milliseconds between published samples.
    #[arg(long, default_value_t = 10)]
    sample_ms: u64,
    /// Settings file; a missing file means defaults.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Save the effective settings back to `--settings` on exit.
    #[arg(long)]
    save_settings: bool,
}

fn demo_payload(t: f64) -> Value {
    json!({
        "fig1": {
            "sin": { "time": t, "value": t.sin() },
            "cos": { "time": t, "value": t.cos() }
        },
        "fig2": {
            "tan": { "time": t, "value": t.tan() },
            "heat": { "time": t, "value": [t.sin(), t.cos()] }
        }
    })
}

fn spawn_producer(producer: Producer, period: Duration) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        log::info!("producer started");
        let start = Instant::now();
        while producer
            .push(demo_payload(start.elapsed().as_secs_f64()))
            .is_ok()
        {
            thread::sleep(period);
        }
        log::info!("producer stopped");
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let mut dashboard = Dashboard::new(settings);

    let (producer, consumer) = ingest_channel();
    let worker = spawn_producer(producer, Duration::from_millis(args.sample_ms));

    let plot = Rect::new(60.0, 30.0, 700.0, 250.0);
    let mut frames = Vec::new();
    for _ in 0..args.frames {
        frames = dashboard.frame(&consumer, plot);
        thread::sleep(Duration::from_millis(args.frame_ms));
    }
    drop(consumer);
    if worker.join().is_err() {
        log::error!("producer thread panicked");
    }

    let mut scene = svg::SvgScene::default();
    let mut offset_y = 0.0;
    for frame in &frames {
        log::debug!(
            "{}: {} lines, {} cells drawn, {} culled",
            frame.figure,
            frame.lines.len(),
            frame.stats.drawn,
            frame.stats.culled
        );
        scene.push_frame(frame, offset_y);
        offset_y += FIGURE_PITCH;
    }
    let svg = scene.to_svg_string();

    match &args.out {
        Some(path) => {
            fs::write(path, svg).with_context(|| format!("writing {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        None => io::stdout().write_all(svg.as_bytes())?,
    }

    if args.save_settings {
        let path = args
            .settings
            .as_ref()
            .context("--save-settings needs --settings")?;
        dashboard.settings().save(path)?;
    }
    Ok(())
}
