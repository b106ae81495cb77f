//! # Voxel Chunk Builder Demo
//!
//! Headless main loop: streams chunks around a player walking along the x
//! axis and logs what the builder does each tick.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [settings.json]
//! ```

use std::{env, process::ExitCode, thread, time::Duration};

use log::{error, info};
use voxel_chunk_builder::{
    config::WorldSettings,
    engine_state::{chunk_center, voxels::chunk::ChunkPos, EngineState, LOAD_DISTANCE},
};
use web_time::Instant;

const TICK: Duration = Duration::from_millis(16);
const TICKS_PER_CHUNK: usize = 30;
const WALK_CHUNKS: i32 = 6;

fn main() -> ExitCode {
    voxel_chunk_builder::init_logging();

    let settings = match env::args().nth(1) {
        Some(path) => match WorldSettings::load(&path) {
            Ok(settings) => settings,
            Err(err) => {
                error!("Could not load settings from {}: {}", path, err);
                return ExitCode::FAILURE;
            }
        },
        None => WorldSettings::default(),
    };
    let spawn_y = settings.player_position[1];

    let mut engine = match EngineState::new(settings, LOAD_DISTANCE) {
        Ok(engine) => engine,
        Err(err) => {
            error!("Could not start the chunk builder: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let started = Instant::now();
    for step in 0..=WALK_CHUNKS {
        engine.move_player(chunk_center(ChunkPos::new(step, 0), spawn_y));
        for _ in 0..TICKS_PER_CHUNK {
            engine.tick();
            thread::sleep(TICK);
        }

        let builder = engine.chunk_builder();
        info!(
            "Step {}: {} loaded, {} in flight, {} built, {} failed, {} pooled, {} allocated",
            step,
            engine.world().chunk_count(),
            engine.in_flight_count(),
            builder.built_count(),
            builder.failed_count(),
            builder.pooled_count(),
            builder.allocated_count()
        );
    }

    let abandoned = engine.shutdown();
    info!(
        "Finished in {:.2} s, {} request(s) abandoned",
        started.elapsed().as_secs_f64(),
        abandoned.len()
    );
    ExitCode::SUCCESS
}
