//! Wall module - the shuffled draw pile
//!
//! A fresh wall holds all 136 tiles (34 faces x 4 copies) shuffled with a
//! seeded `StdRng`, so the same seed always deals the same hand. Tiles are
//! drawn front to back and never returned; there is no dead wall, kong
//! replacements come off the same front.

use std::collections::VecDeque;

use rand::prelude::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};

use crate::types::{Tile, COPIES_PER_TILE, WALL_SIZE};

#[derive(Debug, Clone)]
pub struct Wall {
    tiles: VecDeque<Tile>,
}

impl Wall {
    /// Full 136-tile wall shuffled deterministically from `seed`
    pub fn shuffled(seed: u64) -> Self {
        let mut tiles: Vec<Tile> = Vec::with_capacity(WALL_SIZE);
        for tile in Tile::all() {
            for _ in 0..COPIES_PER_TILE {
                tiles.push(tile);
            }
        }
        let mut rng = StdRng::seed_from_u64(seed);
        tiles.shuffle(&mut rng);
        Self {
            tiles: tiles.into(),
        }
    }

    /// Wall in an explicit draw order (first element is drawn first)
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Self {
            tiles: tiles.into(),
        }
    }

    /// Draw the next tile; `None` once the wall is exhausted
    pub fn draw(&mut self) -> Option<Tile> {
        self.tiles.pop_front()
    }

    pub fn remaining(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Upcoming tiles in draw order
    pub fn peek_all(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TILE_KINDS;

    #[test]
    fn test_wall_has_four_of_each_face() {
        let wall = Wall::shuffled(7);
        assert_eq!(wall.remaining(), 136);
        let mut counts = [0u8; TILE_KINDS];
        for tile in wall.peek_all() {
            counts[tile.index()] += 1;
        }
        assert!(counts.iter().all(|&c| c == 4));
    }

    #[test]
    fn test_same_seed_same_order() {
        let a: Vec<Tile> = Wall::shuffled(42).peek_all().copied().collect();
        let b: Vec<Tile> = Wall::shuffled(42).peek_all().copied().collect();
        let c: Vec<Tile> = Wall::shuffled(43).peek_all().copied().collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_draw_is_fifo_until_empty() {
        let m1 = Tile::from_name("M1").unwrap();
        let red = Tile::from_name("RED").unwrap();
        let mut wall = Wall::from_tiles(vec![m1, red]);
        assert_eq!(wall.draw(), Some(m1));
        assert_eq!(wall.draw(), Some(red));
        assert!(wall.is_empty());
        assert_eq!(wall.draw(), None);
        assert_eq!(wall.remaining(), 0);
    }
}
