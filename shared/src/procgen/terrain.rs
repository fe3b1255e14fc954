//! BSP dungeon terrain generation (§4.2).
//!
//! A rectangle is recursively subdivided until pieces are smaller than
//! [`TerrainParams::min_room_size`]; each leaf becomes a room (shrunk from
//! its partition by a random margin), and every pair of sibling rooms
//! produced by the same split is joined by an L-shaped corridor through the
//! split axis (§9 "Open questions" recommends this rule explicitly, since
//! exact room-adjacency is otherwise under-specified). An optional
//! cellular-automata pass smooths cave-like areas afterward.

use crate::error::GenerationError;
use crate::rng::SeededRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Floor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }
}

#[derive(Debug, Clone)]
pub struct TerrainParams {
    pub width: i32,
    pub height: i32,
    pub min_room_size: i32,
    pub room_margin: i32,
    pub cellular_automata_passes: u32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            min_room_size: 8,
            room_margin: 1,
            cellular_automata_passes: 0,
        }
    }
}

pub struct Terrain {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<Tile>,
    pub rooms: Vec<Rect>,
    /// First room's center; invariant: must be a walkable tile (§4.2).
    pub spawn: (i32, i32),
}

impl Terrain {
    pub fn tile(&self, x: i32, y: i32) -> Tile {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return Tile::Wall;
        }
        self.tiles[(y * self.width + x) as usize]
    }

    fn set_tile(&mut self, x: i32, y: i32, tile: Tile) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        self.tiles[(y * self.width + x) as usize] = tile;
    }

    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.tile(x, y) == Tile::Floor
    }
}

struct BspNode {
    rect: Rect,
    room: Option<Rect>,
    left: Option<Box<BspNode>>,
    right: Option<Box<BspNode>>,
}

fn split(node_rect: Rect, min_size: i32, rng: &mut SeededRng) -> BspNode {
    let can_split_h = node_rect.w >= min_size * 2;
    let can_split_v = node_rect.h >= min_size * 2;

    if !can_split_h && !can_split_v {
        return BspNode {
            rect: node_rect,
            room: Some(node_rect),
            left: None,
            right: None,
        };
    }

    // Prefer splitting along the longer axis; tie-break with the RNG so the
    // outcome stays deterministic rather than depending on platform-specific
    // float comparison ordering.
    let split_horizontal = if can_split_h && can_split_v {
        rng.gen_bool(0.5)
    } else {
        can_split_h
    };

    if split_horizontal {
        let max_split = node_rect.w - min_size;
        let split_at = rng.gen_range_i32(min_size, max_split.max(min_size) + 1);
        let left_rect = Rect {
            x: node_rect.x,
            y: node_rect.y,
            w: split_at,
            h: node_rect.h,
        };
        let right_rect = Rect {
            x: node_rect.x + split_at,
            y: node_rect.y,
            w: node_rect.w - split_at,
            h: node_rect.h,
        };
        BspNode {
            rect: node_rect,
            room: None,
            left: Some(Box::new(split(left_rect, min_size, rng))),
            right: Some(Box::new(split(right_rect, min_size, rng))),
        }
    } else {
        let max_split = node_rect.h - min_size;
        let split_at = rng.gen_range_i32(min_size, max_split.max(min_size) + 1);
        let top_rect = Rect {
            x: node_rect.x,
            y: node_rect.y,
            w: node_rect.w,
            h: split_at,
        };
        let bottom_rect = Rect {
            x: node_rect.x,
            y: node_rect.y + split_at,
            w: node_rect.w,
            h: node_rect.h - split_at,
        };
        BspNode {
            rect: node_rect,
            room: None,
            left: Some(Box::new(split(top_rect, min_size, rng))),
            right: Some(Box::new(split(bottom_rect, min_size, rng))),
        }
    }
}

/// Shrinks every leaf partition by `margin` to get an interior room rect,
/// carves rooms and corridors into `terrain`, and collects the room list in
/// a stable left-to-right, top-to-bottom traversal order.
fn carve(node: &BspNode, margin: i32, terrain: &mut Terrain, rooms: &mut Vec<Rect>) {
    if let Some(partition) = node.room {
        let room = Rect {
            x: partition.x + margin,
            y: partition.y + margin,
            w: (partition.w - margin * 2).max(1),
            h: (partition.h - margin * 2).max(1),
        };
        for y in room.y..room.y + room.h {
            for x in room.x..room.x + room.w {
                terrain.set_tile(x, y, Tile::Floor);
            }
        }
        rooms.push(room);
        return;
    }

    if let (Some(left), Some(right)) = (&node.left, &node.right) {
        carve(left, margin, terrain, rooms);
        carve(right, margin, terrain, rooms);

        let left_rooms_before = rooms.len();
        let (lx, ly) = first_room_center(left);
        let (rx, ry) = first_room_center(right);
        let _ = left_rooms_before;
        carve_l_corridor(terrain, (lx, ly), (rx, ry));
    }
}

fn first_room_center(node: &BspNode) -> (i32, i32) {
    if let Some(room) = node.room {
        return room.center();
    }
    // Always descend left first; deterministic given a fixed tree shape.
    if let Some(left) = &node.left {
        return first_room_center(left);
    }
    (0, 0)
}

/// Every pair of sibling rooms is connected by an L-shaped corridor through
/// the split axis (§9 open question, resolved this way).
fn carve_l_corridor(terrain: &mut Terrain, from: (i32, i32), to: (i32, i32)) {
    let (x1, y1) = from;
    let (x2, y2) = to;

    let (xa, xb) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
    for x in xa..=xb {
        terrain.set_tile(x, y1, Tile::Floor);
    }
    let (ya, yb) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
    for y in ya..=yb {
        terrain.set_tile(x2, y, Tile::Floor);
    }
}

/// One cellular-automata smoothing pass: a wall becomes floor if a majority
/// of its 8 neighbours are floor, and vice versa. Used to soften BSP rooms
/// into cave-like shapes when `cellular_automata_passes > 0`.
fn smooth_pass(terrain: &Terrain) -> Vec<Tile> {
    let mut out = terrain.tiles.clone();
    for y in 0..terrain.height {
        for x in 0..terrain.width {
            let mut floor_neighbours = 0;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    if terrain.is_walkable(x + dx, y + dy) {
                        floor_neighbours += 1;
                    }
                }
            }
            let idx = (y * terrain.width + x) as usize;
            out[idx] = if floor_neighbours >= 5 {
                Tile::Floor
            } else if floor_neighbours <= 2 {
                Tile::Wall
            } else {
                terrain.tiles[idx]
            };
        }
    }
    out
}

/// Generates a terrain grid deterministically from `rng` (already split for
/// the `"terrain"` kind tag by the caller, per §4.2).
pub fn generate_terrain(params: &TerrainParams, rng: &mut SeededRng) -> Result<Terrain, GenerationError> {
    let root_rect = Rect {
        x: 0,
        y: 0,
        w: params.width,
        h: params.height,
    };
    let tree = split(root_rect, params.min_room_size, rng);

    let mut terrain = Terrain {
        width: params.width,
        height: params.height,
        tiles: vec![Tile::Wall; (params.width * params.height) as usize],
        rooms: Vec::new(),
        spawn: (0, 0),
    };

    let mut rooms = Vec::new();
    carve(&tree, params.room_margin, &mut terrain, &mut rooms);
    terrain.rooms = rooms;

    for _ in 0..params.cellular_automata_passes {
        terrain.tiles = smooth_pass(&terrain);
    }

    let spawn = terrain
        .rooms
        .first()
        .map(|r| r.center())
        .unwrap_or((params.width / 2, params.height / 2));
    terrain.spawn = spawn;

    if !terrain.is_walkable(spawn.0, spawn.1) {
        // Cellular-automata smoothing can theoretically erode a tiny first
        // room entirely; force the spawn tile open rather than violating
        // the spawn-safety invariant.
        terrain.set_tile(spawn.0, spawn.1, Tile::Floor);
    }

    Ok(terrain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_given_same_seed() {
        let mut rng_a = SeededRng::from_world_seed(12345);
        let mut child_a = rng_a.split("terrain", &[0]);
        let terrain_a = generate_terrain(&TerrainParams::default(), &mut child_a).unwrap();

        let mut rng_b = SeededRng::from_world_seed(12345);
        let mut child_b = rng_b.split("terrain", &[0]);
        let terrain_b = generate_terrain(&TerrainParams::default(), &mut child_b).unwrap();

        assert_eq!(terrain_a.tiles, terrain_b.tiles);
        assert_eq!(terrain_a.spawn, terrain_b.spawn);
        assert_eq!(terrain_a.rooms.len(), terrain_b.rooms.len());
    }

    #[test]
    fn spawn_is_always_walkable() {
        for seed in [1u64, 2, 3, 12345, 999999] {
            let mut rng = SeededRng::from_world_seed(seed);
            let mut child = rng.split("terrain", &[0]);
            let terrain = generate_terrain(&TerrainParams::default(), &mut child).unwrap();
            assert!(
                terrain.is_walkable(terrain.spawn.0, terrain.spawn.1),
                "seed {seed} produced an unwalkable spawn"
            );
        }
    }

    #[test]
    fn produces_at_least_one_room() {
        let mut rng = SeededRng::from_world_seed(42);
        let mut child = rng.split("terrain", &[0]);
        let terrain = generate_terrain(&TerrainParams::default(), &mut child).unwrap();
        assert!(!terrain.rooms.is_empty());
    }
}
