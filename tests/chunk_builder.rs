use std::{
    sync::{mpsc, Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use cgmath::Point3;
use voxel_chunk_builder::{
    config::ChunkBuilderConfig,
    engine_state::voxels::{
        block::{block_type::BlockType, Block, BlockTable, DefaultBlockTable},
        chunk::{block_index, Chunk, ChunkPos, ChunkState, CHUNK_HEIGHT, CHUNK_WIDTH, MAX_SKY_LIGHT},
        generation::{FlatTerrainGenerator, TerrainGenerator},
        tasks::chunk_builder::ChunkBuilder,
        world::World,
    },
    error::{BuildError, ChunkAccessError},
};

/// A host world whose player can be moved from the test thread.
struct TestWorld {
    player: Mutex<Point3<f32>>,
    generator: Box<dyn TerrainGenerator>,
}

impl TestWorld {
    fn new(generator: impl TerrainGenerator + 'static) -> Arc<Self> {
        Arc::new(TestWorld {
            player: Mutex::new(Point3::new(0.0, 64.0, 0.0)),
            generator: Box::new(generator),
        })
    }

    fn move_player(&self, x: f32, z: f32) {
        *self.player.lock().unwrap() = Point3::new(x, 64.0, z);
    }
}

impl World for TestWorld {
    fn player_position(&self) -> Point3<f32> {
        *self.player.lock().unwrap()
    }

    fn block_table(&self) -> &dyn BlockTable {
        &DefaultBlockTable
    }

    fn terrain_generator(&self) -> &dyn TerrainGenerator {
        self.generator.as_ref()
    }
}

/// Stone pillar in column (0, 0) whose height encodes the chunk position.
struct PillarGenerator;

impl PillarGenerator {
    fn height(position: ChunkPos) -> usize {
        (position.x().unsigned_abs() as usize * 7 + position.z().unsigned_abs() as usize * 3)
            % (CHUNK_HEIGHT - 1)
    }
}

impl TerrainGenerator for PillarGenerator {
    fn generate_chunk(&self, chunk: &mut Chunk) -> Result<(), BuildError> {
        let height = Self::height(chunk.position());
        let blocks = chunk.raw_data_mut().blocks;
        for y in 0..=height {
            blocks[block_index(0, y, 0)] = BlockType::STONE.into();
        }
        Ok(())
    }
}

/// Blocks on the first chunk until the test releases it.
struct GatedGenerator {
    started: Mutex<Option<mpsc::Sender<ChunkPos>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl TerrainGenerator for GatedGenerator {
    fn generate_chunk(&self, chunk: &mut Chunk) -> Result<(), BuildError> {
        if let Some(started) = self.started.lock().unwrap().take() {
            started.send(chunk.position()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
        }
        Ok(())
    }
}

fn gated_world() -> (Arc<TestWorld>, mpsc::Receiver<ChunkPos>, mpsc::Sender<()>) {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let world = TestWorld::new(GatedGenerator {
        started: Mutex::new(Some(started_tx)),
        release: Mutex::new(release_rx),
    });
    (world, started_rx, release_tx)
}

fn wait_until(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for condition");
        thread::sleep(Duration::from_millis(1));
    }
}

fn collect_positions(builder: &ChunkBuilder, expected: usize) -> Vec<ChunkPos> {
    wait_until(|| builder.built_count() + builder.failed_count() >= expected);
    let mut positions = Vec::new();
    builder.get_built_chunks(Some(|chunk: Chunk| positions.push(chunk.position())));
    positions
}

fn started_builder(world: Arc<dyn World>) -> ChunkBuilder {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut builder = ChunkBuilder::new(&ChunkBuilderConfig::default());
    builder.initialize(world).unwrap();
    builder
}

#[test]
fn stationary_player_gets_chunks_in_distance_order() {
    let _ = env_logger::builder().is_test(true).try_init();
    let world = TestWorld::new(FlatTerrainGenerator::new(vec![BlockType::DIRT]));
    world.move_player(3.5 * CHUNK_WIDTH as f32, -2.25 * CHUNK_WIDTH as f32);

    let mut rng = fastrand::Rng::with_seed(99);
    let requests: Vec<ChunkPos> = (0..40)
        .map(|_| ChunkPos::new(rng.i32(-10..10), rng.i32(-10..10)))
        .collect();

    let mut builder = ChunkBuilder::new(&ChunkBuilderConfig::default());
    for &position in &requests {
        builder.build_chunk(position);
    }
    builder.initialize(world).unwrap();

    let built = collect_positions(&builder, requests.len());
    assert_eq!(built.len(), requests.len());

    let player = builder.player_chunk_xz();
    let distances: Vec<f32> = built.iter().map(|p| p.squared_distance_to(player)).collect();
    assert!(
        distances.windows(2).all(|pair| pair[0] <= pair[1]),
        "out of order: {distances:?}"
    );
}

#[test]
fn nearest_of_three_requests_is_built_first() {
    let world = TestWorld::new(FlatTerrainGenerator::new(vec![BlockType::STONE]));
    let mut builder = ChunkBuilder::new(&ChunkBuilderConfig::default());
    builder.build_chunk(ChunkPos::new(0, 5));
    builder.build_chunk(ChunkPos::new(1, 0));
    builder.build_chunk(ChunkPos::new(0, 0));
    builder.initialize(world).unwrap();

    assert_eq!(
        collect_positions(&builder, 3),
        vec![ChunkPos::new(0, 0), ChunkPos::new(1, 0), ChunkPos::new(0, 5)]
    );
}

#[test]
fn moving_the_player_reprioritizes_pending_work() {
    let (world, started, release) = gated_world();
    let builder = started_builder(world.clone());

    builder.build_chunk(ChunkPos::new(0, 0));
    assert_eq!(
        started.recv_timeout(Duration::from_secs(10)).unwrap(),
        ChunkPos::new(0, 0)
    );

    for x in [1, 2, 8, 9] {
        builder.build_chunk(ChunkPos::new(x, 0));
    }
    world.move_player(10.0 * CHUNK_WIDTH as f32, 0.0);
    builder.update();
    release.send(()).unwrap();

    assert_eq!(
        collect_positions(&builder, 5),
        vec![
            ChunkPos::new(0, 0),
            ChunkPos::new(9, 0),
            ChunkPos::new(8, 0),
            ChunkPos::new(2, 0),
            ChunkPos::new(1, 0),
        ]
    );
}

#[test]
fn received_chunks_are_active_and_lit() {
    let builder = started_builder(TestWorld::new(FlatTerrainGenerator::new(vec![
        BlockType::STONE,
        BlockType::WATER,
        BlockType::WATER,
    ])));
    builder.build_chunk(ChunkPos::new(-3, 4));
    wait_until(|| builder.built_count() == 1);

    let mut chunks = Vec::new();
    assert_eq!(builder.get_built_chunks(Some(|chunk: Chunk| chunks.push(chunk))), 1);
    let chunk = &chunks[0];

    assert_eq!(chunk.state(), ChunkState::Active);
    assert!(chunk.world().is_some());
    assert_eq!(chunk.height_at(15, 15), Ok(2));
    assert_eq!(chunk.sky_light_at(15, 2, 15), Ok(MAX_SKY_LIGHT));
    assert_eq!(chunk.sky_light_at(15, 1, 15), Ok(MAX_SKY_LIGHT - 2));
    assert_eq!(chunk.sky_light_at(15, 0, 15), Ok(MAX_SKY_LIGHT - 4));
    assert_eq!(
        chunk.block_at(CHUNK_WIDTH, 0, 0),
        Err(ChunkAccessError::OutOfBounds { x: CHUNK_WIDTH, y: 0, z: 0 })
    );
}

#[test]
fn bottom_layer_only_chunk_has_height_zero_and_full_light() {
    let builder = started_builder(TestWorld::new(FlatTerrainGenerator::new(vec![
        BlockType::STONE,
    ])));
    builder.build_chunk(ChunkPos::new(0, 0));
    wait_until(|| builder.built_count() == 1);

    let mut chunks = Vec::new();
    builder.get_built_chunks(Some(|chunk: Chunk| chunks.push(chunk)));
    let raw = chunks[0].raw_data();

    assert!(raw.height_map.iter().all(|&height| height == 0));
    for x in 0..CHUNK_WIDTH {
        for z in 0..CHUNK_WIDTH {
            for y in 0..CHUNK_HEIGHT {
                assert_eq!(raw.sky_lights.get(block_index(x, y, z)), MAX_SKY_LIGHT);
            }
        }
    }
}

#[test]
fn recycled_chunks_leak_nothing_into_the_next_build() {
    let builder = started_builder(TestWorld::new(PillarGenerator));

    let tall = ChunkPos::new(30, 10);
    builder.build_chunk(tall);
    wait_until(|| builder.built_count() == 1);
    let mut chunks = Vec::new();
    builder.get_built_chunks(Some(|chunk: Chunk| chunks.push(chunk)));
    let tall_height = PillarGenerator::height(tall);
    assert_eq!(chunks[0].height_at(0, 0), Ok(tall_height as u8));

    for chunk in chunks.drain(..) {
        builder.recycle_chunk(chunk);
    }
    assert_eq!(builder.pooled_count(), 1);

    let short = ChunkPos::new(1, 0);
    builder.build_chunk(short);
    wait_until(|| builder.built_count() == 2);
    builder.get_built_chunks(Some(|chunk: Chunk| chunks.push(chunk)));

    let chunk = &chunks[0];
    let short_height = PillarGenerator::height(short);
    assert!(short_height < tall_height);
    assert_eq!(builder.allocated_count(), 1);
    assert_eq!(chunk.position(), short);
    assert_eq!(chunk.height_at(0, 0), Ok(short_height as u8));
    for y in short_height + 1..=tall_height {
        assert_eq!(chunk.block_at(0, y, 0), Ok(Block::AIR));
        assert_eq!(chunk.sky_light_at(0, y, 0), Ok(MAX_SKY_LIGHT));
    }
    assert_eq!(chunk.sky_light_at(0, short_height - 1, 0), Ok(0));
}

#[test]
fn empty_output_queue_invokes_no_callback() {
    let builder = started_builder(TestWorld::new(PillarGenerator));
    let mut calls = 0;
    assert_eq!(builder.get_built_chunks(Some(|_: Chunk| calls += 1)), 0);
    assert_eq!(calls, 0);
}

#[test]
fn absent_callback_keeps_chunks_queued() {
    let builder = started_builder(TestWorld::new(PillarGenerator));
    builder.build_chunk(ChunkPos::new(4, 4));
    builder.build_chunk(ChunkPos::new(5, 5));
    wait_until(|| builder.built_count() == 2);

    assert_eq!(builder.get_built_chunks(None::<fn(Chunk)>), 0);
    assert_eq!(collect_positions(&builder, 2).len(), 2);
}

#[test]
fn duplicate_requests_each_produce_a_chunk() {
    let builder = started_builder(TestWorld::new(PillarGenerator));
    for _ in 0..3 {
        builder.build_chunk(ChunkPos::new(2, -2));
    }
    assert_eq!(collect_positions(&builder, 3), vec![ChunkPos::new(2, -2); 3]);
}

#[test]
fn failed_generation_is_dropped_and_the_rest_still_builds() {
    let builder = started_builder(TestWorld::new(FlatTerrainGenerator::new(vec![
        BlockType::STONE;
        CHUNK_HEIGHT + 1
    ])));
    builder.build_chunk(ChunkPos::new(0, 0));
    builder.build_chunk(ChunkPos::new(1, 1));
    wait_until(|| builder.failed_count() == 2);

    assert_eq!(builder.built_count(), 0);
    assert_eq!(builder.pending_count(), 0);
    assert!(builder.is_running());
    assert_eq!(builder.allocated_count(), 1);
    assert_eq!(builder.pooled_count(), 1);
    assert_eq!(builder.get_built_chunks(Some(|_: Chunk| panic!("nothing was built"))), 0);
    assert_eq!(
        builder.take_failed_positions(),
        vec![ChunkPos::new(0, 0), ChunkPos::new(1, 1)]
    );
}

#[test]
fn build_before_initialize_waits_for_a_world() {
    let mut builder = ChunkBuilder::new(&ChunkBuilderConfig::default());
    builder.build_chunk(ChunkPos::new(0, 0));
    builder.update();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(builder.pending_count(), 1);
    assert_eq!(builder.built_count(), 0);

    builder.initialize(TestWorld::new(PillarGenerator)).unwrap();
    assert_eq!(collect_positions(&builder, 1), vec![ChunkPos::new(0, 0)]);
}

#[test]
fn shutdown_keeps_the_in_flight_chunk_and_abandons_the_rest() {
    let (world, started, release) = gated_world();
    let mut builder = started_builder(world);

    builder.build_chunk(ChunkPos::new(0, 0));
    assert_eq!(
        started.recv_timeout(Duration::from_secs(10)).unwrap(),
        ChunkPos::new(0, 0)
    );
    builder.build_chunk(ChunkPos::new(3, 0));
    builder.build_chunk(ChunkPos::new(1, 0));

    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        release.send(()).unwrap();
    });
    let abandoned = builder.shutdown();
    releaser.join().unwrap();

    assert_eq!(abandoned, vec![ChunkPos::new(3, 0), ChunkPos::new(1, 0)]);
    assert!(!builder.is_running());
    assert_eq!(builder.built_count(), 1);

    let mut received = Vec::new();
    builder.get_built_chunks(Some(|chunk: Chunk| received.push(chunk.position())));
    assert_eq!(received, vec![ChunkPos::new(0, 0)]);

    assert!(!builder.build_chunk(ChunkPos::new(7, 7)));
    assert_eq!(builder.pending_count(), 0);
}
