use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tokio::time::{interval, Duration};

use skate_sim_rs::effects::EffectsDispatcher;
use skate_sim_rs::rink::{FlatRink, SimHost, SkaterSim};
use skate_sim_rs::skating::{SkateConfig, SkateEvent};
use skate_sim_rs::status::{SessionRecord, SkateStatus};
use skate_sim_rs::surface::SurfaceTracker;
use skate_sim_rs::types::InputSample;

#[derive(Parser, Debug)]
#[command(name = "skate_sim")]
#[command(about = "Ice skating locomotion simulation - synthetic rider demo", long_about = None)]
struct Args {
    /// Duration in seconds
    #[arg(value_name = "SECONDS", default_value = "30")]
    duration: f64,

    /// Tick rate in Hz
    #[arg(long, default_value = "72")]
    hz: f64,

    /// Simulate a desktop (non-VR) rider with analog input only
    #[arg(long)]
    screen: bool,

    /// Disable full-body tracking (no foot pumping)
    #[arg(long)]
    no_fbt: bool,

    /// Rider turn rate in degrees per second
    #[arg(long, default_value = "6.0")]
    turn_rate: f64,

    /// Foot pump frequency in Hz
    #[arg(long, default_value = "1.2")]
    pump_hz: f64,

    /// Rink half-extent in meters
    #[arg(long, default_value = "40.0")]
    extent: f64,

    /// Output directory
    #[arg(long, default_value = "skate_sessions")]
    output_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("[{}] Skate Sim Starting", ts_now());
    println!("  Duration: {} seconds", args.duration);
    println!("  Tick Rate: {} Hz", args.hz);
    println!("  Mode: {}", if args.screen { "screen" } else { "vr" });
    println!("  Rink Extent: {} m", args.extent);
    println!("  Output Dir: {}", args.output_dir);

    std::fs::create_dir_all(&args.output_dir)?;

    let mut config = SkateConfig::default();
    config.full_body_tracking = !args.no_fbt;

    let rink = FlatRink::new(&config.surface_id, args.extent);
    let mut host = SimHost::default();
    let mut rider = SkaterSim::new();
    rider.turn_rate_deg = args.turn_rate;
    rider.pump_hz = args.pump_hz;
    rider.is_vr = !args.screen;

    let mut tracker = SurfaceTracker::new(config.clone());
    let mut fx = EffectsDispatcher::new(&config);
    let mut status = SkateStatus::new();
    let mut record = SessionRecord::new(config);

    let dt = 1.0 / args.hz;
    let mut t = 0.0;
    let mut ticker = interval(Duration::from_secs_f64(dt));
    let start = Utc::now();
    let mut last_status_save = Utc::now();

    println!("[{}] Starting simulation loop...", ts_now());

    while t < args.duration {
        ticker.tick().await;
        rider.advance(dt);
        t += dt;

        let sample = rider.sample(t);
        // Desktop riders hold the stick forward; VR riders pump.
        let input = if args.screen {
            InputSample { forward: 1.0, jump: false }
        } else {
            InputSample::default()
        };

        record.push(t, dt, &sample, &input);
        let out = tracker.frame(&sample, &input, &rink, &mut host, t, dt);
        rider.apply_displacement(out.displacement);

        for event in &out.events {
            match event {
                SkateEvent::SurfaceEntered { momentum } => {
                    println!("[{}] Entered surface, momentum {:.2}", ts_now(), momentum);
                }
                SkateEvent::SurfaceExited { exit_speed } => {
                    println!("[{}] Left surface at {:.2} m/s", ts_now(), exit_speed);
                }
                SkateEvent::MoveStateChanged { state } => {
                    println!("[{}] Move state -> {:?}", ts_now(), state);
                }
                SkateEvent::ObstacleContact { clamped_from } => {
                    println!("[{}] Obstacle contact, absorbed {:.2} m/s", ts_now(), clamped_from);
                }
                _ => {}
            }
        }

        let snapshot = tracker.snapshot();
        for cue in fx.frame(&out.events, &snapshot, t, dt) {
            log::debug!("effect cue: {:?}", cue);
        }
        // The glide loop is continuous, resampled every frame like the cues.
        let levels = fx.glide_levels(&snapshot);
        log::trace!("glide loop volume {:.2} pitch {:.2}", levels.volume, levels.pitch);
        status.record(&snapshot, &out.events, out.displacement.norm());

        let now = Utc::now();
        if (now.signed_duration_since(last_status_save).num_seconds()) >= 2 {
            status.uptime_seconds = now.signed_duration_since(start).num_seconds() as f64;
            let status_path = format!("{}/skate_status.json", args.output_dir);
            let _ = status.save(&status_path);
            last_status_save = now;
        }
    }

    // A teleport back to spawn would look like this: make sure the host is
    // never left immobilized.
    let exit_events = tracker.reset(&mut host);
    status.record(&tracker.snapshot(), &exit_events, 0.0);

    let session_path =
        std::path::PathBuf::from(&args.output_dir).join(format!("session_{}.json.gz", ts_now_clean()));
    record.save(&session_path)?;
    println!(
        "[{}] Saved {} ticks to {}",
        ts_now(),
        record.ticks.len(),
        session_path.display()
    );

    status.uptime_seconds = Utc::now().signed_duration_since(start).num_seconds() as f64;
    let status_path = format!("{}/skate_status_final.json", args.output_dir);
    status.save(&status_path)?;

    println!("\n=== Final Stats ===");
    println!("Ticks: {}", status.ticks);
    println!("Distance traveled: {:.2} m", status.distance_traveled);
    println!("Peak momentum: {:.2} m/s", status.peak_momentum);
    println!("Foot impulses: {}", status.foot_impulses);
    println!("Inflections: {}", status.inflections);
    let pos = rider.position();
    println!("Final position: ({:.2}, {:.2})", pos.x, pos.z);

    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

fn ts_now_clean() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}
