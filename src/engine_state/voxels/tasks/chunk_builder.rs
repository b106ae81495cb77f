//! # Chunk Builder
//!
//! This module defines the `ChunkBuilder`, which produces generated and lit
//! chunks on a background worker, always building the pending position
//! closest to the player first.
//!
//! ## Main Loop Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use voxel_chunk_builder::config::WorldSettings;
//! use voxel_chunk_builder::engine_state::voxels::{
//!     chunk::{Chunk, ChunkPos},
//!     tasks::chunk_builder::ChunkBuilder,
//!     world::{VoxelWorld, World},
//! };
//!
//! let settings = WorldSettings::default();
//! let world = Arc::new(VoxelWorld::new(settings.clone()));
//! let mut builder = ChunkBuilder::new(&settings.builder);
//! builder.initialize(world.clone()).unwrap();
//!
//! builder.build_chunk(ChunkPos::new(0, 0));
//!
//! // Once per tick:
//! builder.update();
//! builder.get_built_chunks(Some(|chunk: Chunk| {
//!     world.insert_chunk(chunk);
//! }));
//! ```
//!
//! ## Caller Responsibilities
//! - Requests are not deduplicated: asking for the same position twice builds it twice
//! - A chunk handed to the callback belongs to the caller until `recycle_chunk`
//! - A recycled chunk must not be used again by the caller

use std::{
    cmp::Ordering,
    sync::{
        mpsc::{channel, Receiver, Sender},
        Arc, OnceLock,
    },
};

use cgmath::{Point3, Vector2};
use log::{debug, info, trace, warn};
use web_time::Instant;

use crate::{
    config::ChunkBuilderConfig,
    core::AtomicXz,
    engine_state::{
        task_management::{
            task::{MainThreadQueue, WorkHandler},
            WorkScheduler,
        },
        voxels::{
            chunk::{Chunk, ChunkPool, ChunkPos, CHUNK_WIDTH},
            lighting,
            world::World,
        },
    },
    error::{BuildError, SchedulerError},
};

/// The work handler behind a [`ChunkBuilder`].
///
/// Owns everything the worker thread touches: the bound world, the pool, the
/// sending halves of the built-chunk and failed-position queues, and the
/// published player position.
pub struct ChunkBuildHandler {
    world: OnceLock<Arc<dyn World>>,
    pool: Arc<ChunkPool>,
    built_chunks: Sender<Chunk>,
    failed_positions: Sender<ChunkPos>,
    /// Player position in chunk units.
    player_xz: AtomicXz,
    prewarm_chunks: usize,
}

impl ChunkBuildHandler {
    fn new(
        pool: Arc<ChunkPool>,
        built_chunks: Sender<Chunk>,
        failed_positions: Sender<ChunkPos>,
        prewarm_chunks: usize,
    ) -> Self {
        ChunkBuildHandler {
            world: OnceLock::new(),
            pool,
            built_chunks,
            failed_positions,
            player_xz: AtomicXz::default(),
            prewarm_chunks,
        }
    }

    /// Takes a pooled chunk (or allocates one), generates and lights it.
    ///
    /// On generation failure the chunk goes straight back to the pool.
    fn build(&self, world: &Arc<dyn World>, position: ChunkPos) -> Result<Chunk, BuildError> {
        let mut chunk = self.pool.take_or_allocate();
        chunk.initialize(position, world);

        if let Err(err) = world.terrain_generator().generate_chunk(&mut chunk) {
            self.pool.recycle(chunk);
            return Err(err);
        }

        lighting::light_chunk(world.block_table(), &mut chunk);
        chunk.mark_built();
        Ok(chunk)
    }
}

/// Reports a position as failed when dropped before the build finished,
/// including while unwinding from a panic.
struct FailureReport<'a> {
    failed_positions: &'a Sender<ChunkPos>,
    position: ChunkPos,
    finished: bool,
}

impl Drop for FailureReport<'_> {
    fn drop(&mut self) {
        if !self.finished && self.failed_positions.send(self.position).is_err() {
            warn!("Chunk {} failed after its builder was dropped", self.position);
        }
    }
}

impl WorkHandler for ChunkBuildHandler {
    type MainThreadWork = ();
    type AsyncWork = ChunkPos;
    type Error = BuildError;

    fn initialize(&mut self) {
        if self.prewarm_chunks > 0 {
            self.pool.prewarm(self.prewarm_chunks);
        }
    }

    fn do_async_work(
        &self,
        position: ChunkPos,
        _main_thread: &MainThreadQueue<()>,
    ) -> Result<(), BuildError> {
        let mut report = FailureReport {
            failed_positions: &self.failed_positions,
            position,
            finished: false,
        };
        let world = self.world.get().ok_or(BuildError::WorldNotBound)?;

        let started = Instant::now();
        let chunk = self.build(world, position)?;
        report.finished = true;
        debug!(
            "Built chunk {} in {:.2} ms",
            position,
            started.elapsed().as_secs_f64() * 1000.0
        );

        if self.built_chunks.send(chunk).is_err() {
            warn!("Chunk {} finished after its builder was dropped", position);
        }
        Ok(())
    }

    fn compare_async_work(&self, x: &ChunkPos, y: &ChunkPos) -> Ordering {
        let player = self.player_xz.load();
        x.squared_distance_to(player)
            .total_cmp(&y.squared_distance_to(player))
    }

    fn do_main_thread_works(&self, _works: Vec<()>) {}
}

/// Builds chunks in the background, nearest to the player first, and hands
/// them back to the main loop in batches.
pub struct ChunkBuilder {
    scheduler: WorkScheduler<ChunkBuildHandler>,
    built_chunks: Receiver<Chunk>,
    failed_positions: Receiver<ChunkPos>,
    pool: Arc<ChunkPool>,
}

impl ChunkBuilder {
    /// Creates an unbound builder. Nothing is built until
    /// [`initialize`](Self::initialize) binds a world.
    pub fn new(config: &ChunkBuilderConfig) -> Self {
        let pool = Arc::new(ChunkPool::new(config.pool_capacity));
        let (built_sender, built_receiver) = channel();
        let (failed_sender, failed_receiver) = channel();
        let handler = ChunkBuildHandler::new(
            pool.clone(),
            built_sender,
            failed_sender,
            config.prewarm_chunks,
        );

        ChunkBuilder {
            scheduler: WorkScheduler::new(handler, config.worker_thread_name.clone()),
            built_chunks: built_receiver,
            failed_positions: failed_receiver,
            pool,
        }
    }

    /// Binds the world, publishes the player's position and starts the worker.
    ///
    /// # Errors
    /// - `BuildError::AlreadyInitialized` if a world is already bound
    /// - `BuildError::Scheduler` if the builder was shut down (the world is
    ///   not bound) or the worker could not be started
    pub fn initialize(&mut self, world: Arc<dyn World>) -> Result<(), BuildError> {
        if self.scheduler.is_shut_down() {
            return Err(SchedulerError::ShutDown.into());
        }

        self.scheduler
            .handler()
            .world
            .set(world)
            .map_err(|_| BuildError::AlreadyInitialized)?;

        self.update();
        self.scheduler.start_worker_thread()?;
        info!(
            "Chunk builder initialized with {} pending request(s)",
            self.pending_count()
        );
        Ok(())
    }

    /// Requests a chunk. Returns immediately.
    ///
    /// # Returns
    /// `false` if the builder was shut down and the request was dropped.
    pub fn build_chunk(&self, position: ChunkPos) -> bool {
        self.scheduler.add_work(position)
    }

    /// Wipes a chunk the caller is done with and returns it to the pool.
    pub fn recycle_chunk(&self, chunk: Chunk) {
        let position = chunk.position();
        if !self.pool.recycle(chunk) {
            trace!("Chunk pool full, dropped recycled chunk {}", position);
        }
    }

    /// Hands every finished chunk to `callback`, in completion order.
    ///
    /// Each chunk is released for access before the callback sees it. With no
    /// callback nothing is dequeued and the chunks wait for a later call.
    ///
    /// # Returns
    /// The number of chunks handed out.
    ///
    /// # Example
    /// ```rust,ignore
    /// builder.get_built_chunks(Some(|chunk: Chunk| world.insert_chunk(chunk)));
    /// builder.get_built_chunks(None::<fn(Chunk)>); // no-op
    /// ```
    pub fn get_built_chunks<F: FnMut(Chunk)>(&self, callback: Option<F>) -> usize {
        let Some(mut callback) = callback else {
            return 0;
        };

        let mut count = 0;
        while let Ok(mut chunk) = self.built_chunks.try_recv() {
            chunk.allow_accessing();
            callback(chunk);
            count += 1;
        }
        count
    }

    /// Drains the positions whose build failed or panicked since the last call.
    ///
    /// Failed builds are never retried by the builder; the caller decides
    /// whether to request them again.
    pub fn take_failed_positions(&self) -> Vec<ChunkPos> {
        self.failed_positions.try_iter().collect()
    }

    /// Per-tick update: publishes the bound world's player position.
    ///
    /// Does nothing while no world is bound.
    pub fn update(&self) {
        if let Some(world) = self.world() {
            self.set_player_position(world.player_position());
        }
    }

    /// Publishes a world-space player position for build prioritization.
    pub fn set_player_position(&self, position: Point3<f32>) {
        let width = CHUNK_WIDTH as f32;
        self.scheduler
            .handler()
            .player_xz
            .store(position.x / width, position.z / width);
    }

    /// The last published player position, in chunk units.
    pub fn player_chunk_xz(&self) -> Vector2<f32> {
        self.scheduler.handler().player_xz.load()
    }

    /// The bound world, if any.
    pub fn world(&self) -> Option<&Arc<dyn World>> {
        self.scheduler.handler().world.get()
    }

    /// Requests not yet picked up by the worker.
    pub fn pending_count(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Idle chunks in the pool.
    pub fn pooled_count(&self) -> usize {
        self.pool.len()
    }

    /// Chunks ever allocated by the pool.
    pub fn allocated_count(&self) -> usize {
        self.pool.allocated_count()
    }

    /// Chunks built successfully so far.
    pub fn built_count(&self) -> usize {
        self.scheduler.completed_count()
    }

    /// Builds that failed and were dropped.
    pub fn failed_count(&self) -> usize {
        self.scheduler.failed_count()
    }

    /// Whether the worker is running.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Stops the worker, abandoning pending requests.
    ///
    /// A chunk being built when this is called is finished and can still be
    /// collected with [`get_built_chunks`](Self::get_built_chunks).
    ///
    /// # Returns
    /// The positions that were requested but never started.
    pub fn shutdown(&mut self) -> Vec<ChunkPos> {
        self.scheduler.shutdown()
    }
}
