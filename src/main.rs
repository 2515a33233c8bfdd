//! Scene transform demo entry point.
//!
//! Runs a headless simulation of a small 2D scene built on the transform
//! hierarchy:
//! - **bevy_ecs** for entities, observers and the per-frame schedule
//! - a render thread fed through a bounded **crossbeam-channel** handoff
//! - **configparser** INI settings, overridable from the command line
//!
//! # Main Loop
//!
//! 1. Load `scene.ini` (or `--config PATH`) and initialize logging
//! 2. Build the ECS world, register observers and spawn the demo scene
//! 3. For every frame:
//!    - advance [`WorldTime`]
//!    - oscillate the platform, sweep the cursor, refresh world transforms
//!    - pick entities under the cursor and publish the frame's model matrices
//! 4. Halfway through, the rider jumps off the platform keeping its world
//!    pose; at three quarters the platform is despawned and its children are
//!    handled by the configured orphan policy
//! 5. Close the handoff channel, join the render thread and log the sampled
//!    update and present timings
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --frames 240 --composition affine --json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Instant;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use clap::Parser;
use log::{debug, error, info};

use scenetransform::components::globaltransform2d::GlobalTransform2D;
use scenetransform::components::label::Label;
use scenetransform::events::reparent::{ReparentEvent, reparent_observer};
use scenetransform::game::{self, sweep_cursor_system};
use scenetransform::resources::framestats::FrameStats;
use scenetransform::resources::picking::{CursorPosition, PickedEntities};
use scenetransform::resources::renderbridge::{
    FrameSnapshot, setup_render_bridge, shutdown_render_bridge,
};
use scenetransform::resources::sceneconfig::SceneConfig;
use scenetransform::resources::transformtree::{CompositionMode, TransformTree};
use scenetransform::resources::worldtime::WorldTime;
use scenetransform::systems::movement::oscillate_system;
use scenetransform::systems::picking::cursor_pick_system;
use scenetransform::systems::propagate_transforms::propagate_transforms;
use scenetransform::systems::renderbridge::{publish_frame_snapshot, render_thread};
use scenetransform::systems::time::update_world_time;
use scenetransform::systems::transformlifecycle::release_transform_on_replace;

/// Hierarchical 2D transform demo
#[derive(Parser)]
#[command(version, about = "Simulates a small 2D scene graph and streams its model matrices.")]
struct Cli {
    /// INI configuration file (default: ./scene.ini, optional).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long, value_name = "N")]
    frames: Option<u32>,

    /// Composition mode: legacy or affine.
    #[arg(long, value_name = "MODE")]
    composition: Option<CompositionMode>,

    /// Seed for the debris layout.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Print every presented frame as a JSON line.
    #[arg(long)]
    json: bool,
}

fn load_config(cli: &Cli) -> Result<(SceneConfig, Option<String>), String> {
    let mut config = match &cli.config {
        Some(path) => SceneConfig::with_path(path),
        None => SceneConfig::new(),
    };
    let note = match config.load_from_file() {
        Ok(()) => None,
        // An explicit path must exist; the default one is optional.
        Err(e) if cli.config.is_some() => return Err(e),
        Err(e) => Some(format!("{}; using defaults", e)),
    };

    if let Some(frames) = cli.frames {
        config.frames = frames;
    }
    if let Some(mode) = cli.composition {
        config.composition = mode;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    Ok((config, note))
}

fn present_frame(snapshot: &FrameSnapshot, json: bool) {
    if json {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("Cannot serialize frame {}: {}", snapshot.frame, e),
        }
    } else {
        debug!(
            "Presented frame {} with {} models",
            snapshot.frame,
            snapshot.models.len()
        );
    }
}

fn log_stats(what: &str, stats: &FrameStats) {
    match (stats.average(), stats.max(), stats.per_second()) {
        (Some(avg), Some(max), rate) => info!(
            "{} timings over the last {} of {} samples: avg {:.3} ms, max {:.3} ms, {:.1}/s",
            what,
            stats.len(),
            stats.total(),
            avg.as_secs_f64() * 1000.0,
            max.as_secs_f64() * 1000.0,
            rate.unwrap_or(0.0)
        ),
        _ => info!("{} timings: no samples", what),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, note) = match load_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.to_string()),
    )
    .init();

    if let Some(note) = note {
        info!("{}", note);
    }
    info!(
        "Simulating {} frames: composition={}, orphan_policy={}, handoff={}",
        config.frames, config.composition, config.orphan_policy, config.handoff_capacity
    );

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    let mut tree = TransformTree::new();
    config.apply_to_tree(&mut tree);
    world.insert_resource(tree);
    world.insert_resource(WorldTime::default());
    world.insert_resource(CursorPosition::default());
    world.insert_resource(PickedEntities::default());
    world.insert_resource(FrameStats::new());
    world.insert_resource(config.clone());

    world.spawn(Observer::new(reparent_observer));
    world.spawn(Observer::new(release_transform_on_replace));
    // Observers must be registered before the scene triggers any event.
    world.flush();

    // --------------- Render thread ---------------
    let rx_frame = setup_render_bridge(&mut world, config.handoff_capacity);
    let json = cli.json;
    let render_handle = match thread::Builder::new()
        .name("render".into())
        .spawn(move || {
            let mut stats = FrameStats::new();
            let presented = render_thread(rx_frame, |snapshot| {
                stats.tick();
                present_frame(snapshot, json);
            });
            (presented, stats)
        })
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to spawn render thread: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let scene = game::setup_scene(&mut world, &config);

    let mut update = Schedule::default();
    update.add_systems(
        (
            oscillate_system,
            sweep_cursor_system,
            propagate_transforms,
            cursor_pick_system,
            publish_frame_snapshot,
        )
            .chain(),
    );

    // --------------- Main loop ---------------
    let (jump_frame, collapse_frame) = game::scripted_frames(config.frames);
    let mut frames_with_hits = 0u32;
    for frame in 1..=config.frames {
        update_world_time(&mut world, config.delta);

        if frame == jump_frame {
            info!("Frame {}: rider jumps off the platform", frame);
            world.trigger(ReparentEvent::detach(scene.rider).keeping_world());
        }
        if frame == collapse_frame {
            info!(
                "Frame {}: platform despawned, orphan policy '{}'",
                frame, config.orphan_policy
            );
            world.despawn(scene.platform);
        }

        let started = Instant::now();
        update.run(&mut world);
        world.resource_mut::<FrameStats>().record(started.elapsed());

        if !world.resource::<PickedEntities>().is_empty() {
            frames_with_hits += 1;
        }
        world.clear_trackers();
    }

    // --------------- Teardown ---------------
    let dropped = shutdown_render_bridge(&mut world);
    let (presented, present_stats) = match render_handle.join() {
        Ok(result) => result,
        Err(_) => {
            error!("Render thread panicked");
            return ExitCode::FAILURE;
        }
    };

    let mut finals = world.query::<(&Label, &GlobalTransform2D)>();
    let mut lines: Vec<_> = finals
        .iter(&world)
        .map(|(label, global)| {
            format!(
                "{:<10} pos=({:8.2}, {:8.2}) rot={:8.2} scale=({:.2}, {:.2})",
                label.as_str(),
                global.position.x,
                global.position.y,
                global.rotation_degrees,
                global.scale.x,
                global.scale.y
            )
        })
        .collect();
    lines.sort();
    for line in &lines {
        info!("{}", line);
    }

    log_stats("Update", world.resource::<FrameStats>());
    log_stats("Present", &present_stats);

    let tree = world.resource::<TransformTree>();
    if let Err(e) = tree.validate() {
        error!("Transform tree corrupted at shutdown: {}", e);
        return ExitCode::FAILURE;
    }
    info!(
        "Done: {} frames simulated, {} presented, {} dropped, {} with cursor hits, {} transforms alive",
        config.frames,
        presented,
        dropped,
        frames_with_hits,
        tree.len()
    );
    ExitCode::SUCCESS
}
