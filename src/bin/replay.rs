use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::json;

use skate_sim_rs::rink::{FlatRink, SimHost};
use skate_sim_rs::skating::SkateEvent;
use skate_sim_rs::status::SessionRecord;
use skate_sim_rs::surface::SurfaceTracker;

#[derive(Parser, Debug)]
struct Args {
    /// Path to session_*.json[.gz] recording
    #[arg(long, conflicts_with = "session_dir")]
    session: Option<PathBuf>,

    /// Directory of recordings to batch replay (processes session_*.json[.gz])
    #[arg(long)]
    session_dir: Option<PathBuf>,

    /// Rink half-extent in meters
    #[arg(long, default_value = "40.0")]
    extent: f64,

    /// Override gliding drag (A/B tuning)
    #[arg(long)]
    drag_moving: Option<f64>,

    /// Override braking drag (A/B tuning)
    #[arg(long)]
    drag_stopping: Option<f64>,

    /// Override pump/input gain (A/B tuning)
    #[arg(long)]
    accel_scale: Option<f64>,

    /// Override stopping-drift hardness (A/B tuning)
    #[arg(long)]
    surface_hardness: Option<f64>,
}

fn run_once(path: &Path, args: &Args) -> anyhow::Result<serde_json::Value> {
    let record = SessionRecord::load(path)?;

    let mut config = record.config.clone();
    if let Some(v) = args.drag_moving {
        config.drag_moving = v;
    }
    if let Some(v) = args.drag_stopping {
        config.drag_stopping = v;
    }
    if let Some(v) = args.accel_scale {
        config.accel_scale = v;
    }
    if let Some(v) = args.surface_hardness {
        config.surface_hardness = v;
    }

    let rink = FlatRink::new(&config.surface_id, args.extent);
    let mut host = SimHost::default();
    let mut tracker = SurfaceTracker::new(config);

    let mut distance = 0.0;
    let mut peak_momentum: f64 = 0.0;
    let mut foot_impulses = 0u64;
    let mut inflections = 0u64;
    let mut stops = 0u64;
    let mut obstacle_contacts = 0u64;
    let mut state_changes = 0u64;

    for tick in &record.ticks {
        let out = tracker.frame(&tick.sample, &tick.input, &rink, &mut host, tick.now, tick.dt);
        distance += out.displacement.norm();
        peak_momentum = peak_momentum.max(tracker.engine().momentum().abs());
        for event in &out.events {
            match event {
                SkateEvent::FootImpulse { .. } => foot_impulses += 1,
                SkateEvent::InflectionStarted => inflections += 1,
                SkateEvent::EffectiveStop => stops += 1,
                SkateEvent::ObstacleContact { .. } => obstacle_contacts += 1,
                SkateEvent::MoveStateChanged { .. } => state_changes += 1,
                _ => {}
            }
        }
    }

    tracker.reset(&mut host);
    let snapshot = tracker.snapshot();

    Ok(json!({
        "session": path.display().to_string(),
        "ticks": record.ticks.len(),
        "distance": distance,
        "peak_momentum": peak_momentum,
        "final_momentum": snapshot.momentum,
        "height_calibration": snapshot.height_calibration,
        "foot_impulses": foot_impulses,
        "inflections": inflections,
        "effective_stops": stops,
        "obstacle_contacts": obstacle_contacts,
        "state_changes": state_changes,
    }))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut results = Vec::new();

    if let Some(dir) = args.session_dir.as_ref() {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !(name.starts_with("session_")
                && (name.ends_with(".json") || name.ends_with(".json.gz")))
            {
                continue;
            }
            match run_once(&path, &args) {
                Ok(res) => results.push(res),
                Err(e) => eprintln!("Failed {}: {}", path.display(), e),
            }
        }
    } else if let Some(session) = args.session.as_ref() {
        results.push(run_once(session, &args)?);
    } else {
        anyhow::bail!("Provide --session or --session-dir");
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
