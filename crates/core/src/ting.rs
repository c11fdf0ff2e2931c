//! Ting detection - which faces would complete a hand
//!
//! Each of the 34 faces is inserted into a clone of the
//! hand and handed to the win engine. The hand itself is never touched.

use arrayvec::ArrayVec;

use crate::hand::Hand;
use crate::types::{Tile, TILE_KINDS};
use crate::win::winning_shape;

/// Waiting faces of a hand, in canonical order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TingResult {
    waits: ArrayVec<Tile, TILE_KINDS>,
}

impl TingResult {
    pub fn is_ting(&self) -> bool {
        !self.waits.is_empty()
    }

    pub fn waiting_tiles(&self) -> &[Tile] {
        &self.waits
    }

    pub fn waits_on(&self, tile: Tile) -> bool {
        self.waits.contains(&tile)
    }
}

fn is_ting_size(committed: usize) -> bool {
    matches!(committed, 13 | 14 | 16)
}

/// Enumerate the faces that complete `hand`.
///
/// Only 13, 14 and 16 committed tiles are decision points worth checking;
/// other sizes report no waits. A face the hand already holds four of is
/// never a wait.
pub fn detect_ting(hand: &Hand) -> TingResult {
    let mut result = TingResult::default();
    if !is_ting_size(hand.committed_count()) {
        return result;
    }
    for tile in Tile::all() {
        if can_win_with_tile(hand, tile) {
            result.waits.push(tile);
        }
    }
    result
}

/// Would `tile` complete `hand`?
pub fn can_win_with_tile(hand: &Hand, tile: Tile) -> bool {
    hand.with_tile(tile)
        .map(|candidate| winning_shape(&candidate).is_some())
        .unwrap_or(false)
}
