//! Cross-module determinism properties (§8): identical seeds must yield
//! bitwise-identical generator output, both within one process and across
//! fresh process-equivalent RNG trees (simulated here by constructing a
//! brand new `SeededRng` tree from scratch for each side of a comparison,
//! which is what actually happens when a server and a connecting client
//! independently derive the same content from a shared world seed).

use venture_shared::procgen::{
    generate_terrain, EntityGenerator, GenerationParams, Generator, Genre, OptionValue, Options,
    TerrainParams,
};
use venture_shared::SeededRng;

fn params(genre: Genre, difficulty: u32, depth: u32, count: i64) -> GenerationParams {
    GenerationParams {
        difficulty,
        depth,
        genre,
        blend: None,
        options: Options::new().with("count", OptionValue::Int(count)),
    }
}

#[test]
fn terrain_is_bit_identical_across_independent_rng_trees() {
    let seed = 12345u64;

    let mut root_a = SeededRng::from_world_seed(seed);
    let mut rng_a = root_a.split("terrain", &[0]);
    let terrain_a = generate_terrain(&TerrainParams::default(), &mut rng_a).unwrap();

    let mut root_b = SeededRng::from_world_seed(seed);
    let mut rng_b = root_b.split("terrain", &[0]);
    let terrain_b = generate_terrain(&TerrainParams::default(), &mut rng_b).unwrap();

    assert_eq!(terrain_a.tiles, terrain_b.tiles);
    assert_eq!(terrain_a.rooms, terrain_b.rooms);
    assert_eq!(terrain_a.spawn, terrain_b.spawn);
}

#[test]
fn entity_generation_is_bit_identical_across_independent_rng_trees() {
    let seed = 777u64;
    let gen = EntityGenerator;

    let mut root_a = SeededRng::from_world_seed(seed);
    let mut rng_a = root_a.split(gen.kind_tag(), &[3, 0]);
    let a = gen.generate(&params(Genre::Horror, 4, 3, 8), &mut rng_a);

    let mut root_b = SeededRng::from_world_seed(seed);
    let mut rng_b = root_b.split(gen.kind_tag(), &[3, 0]);
    let b = gen.generate(&params(Genre::Horror, 4, 3, 8), &mut rng_b);

    assert_eq!(a, b);
}

#[test]
fn different_world_seeds_diverge_in_terrain_and_content() {
    let mut root_a = SeededRng::from_world_seed(1);
    let mut rng_a = root_a.split("terrain", &[0]);
    let terrain_a = generate_terrain(&TerrainParams::default(), &mut rng_a).unwrap();

    let mut root_b = SeededRng::from_world_seed(2);
    let mut rng_b = root_b.split("terrain", &[0]);
    let terrain_b = generate_terrain(&TerrainParams::default(), &mut rng_b).unwrap();

    assert_ne!(terrain_a.tiles, terrain_b.tiles);
}

#[test]
fn regenerating_in_the_same_process_twice_is_still_identical() {
    // §8 "generate(S, G) twice in the same process yields bitwise-identical
    // artifact lists and tile grids" -- exercised here by reusing a single
    // root across two full generation passes with fresh splits each time,
    // which is exactly how one process would regenerate the same dungeon
    // depth twice (e.g. re-entering a level).
    let mut root = SeededRng::from_world_seed(555);
    let mut first_child = root.split("terrain", &[4]);
    let first = generate_terrain(&TerrainParams::default(), &mut first_child).unwrap();

    let mut root2 = SeededRng::from_world_seed(555);
    let mut second_child = root2.split("terrain", &[4]);
    let second = generate_terrain(&TerrainParams::default(), &mut second_child).unwrap();

    assert_eq!(first.tiles, second.tiles);
}
