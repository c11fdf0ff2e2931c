//! Win detection - decides whether a tile multiset is a complete hand
//!
//! All functions here are pure: they read a [`Hand`] or a tile slice and
//! never mutate it, so they can be called from any thread without locking.
//!
//! # Standard shape
//!
//! The concealed tiles are folded into a 34-slot frequency table. Every face
//! with at least two copies is tried as the pair; the remainder must then
//! split into sets by backtracking:
//!
//! 1. take the lowest face with a nonzero count
//! 2. try a triplet of it first
//! 3. then, for numeric faces of rank 7 or lower, try `rank, rank+1, rank+2`
//!
//! Because sequences start at the lowest remaining face and never start above
//! rank 7, a sequence can never leave its suit.
//!
//! # Special shapes
//!
//! Seven pairs and thirteen orphans only apply to hands with no melds.
//!
//! ```
//! use tw_mahjong_core::hand::Hand;
//! use tw_mahjong_core::types::Tile;
//! use tw_mahjong_core::win;
//!
//! let tiles: Vec<Tile> = "M1 M2 M3 P4 P5 P6 S7 S8 S9 EAST EAST EAST RED RED"
//!     .split_whitespace()
//!     .filter_map(Tile::from_name)
//!     .collect();
//! assert!(win::is_winning_tiles(&tiles));
//!
//! let hand = Hand::from_tiles(&tiles).unwrap();
//! assert!(win::is_winning_hand(&hand));
//! ```

use crate::hand::Hand;
use crate::types::{Tile, WinShape, ORPHANS, TILE_KINDS};

const HONOR_START: usize = 27;

/// Frequency table indexed by tile ordinal
pub fn tile_counts(tiles: &[Tile]) -> [u8; TILE_KINDS] {
    let mut counts = [0u8; TILE_KINDS];
    for tile in tiles {
        counts[tile.index()] += 1;
    }
    counts
}

/// Standard-shape check on a bare multiset.
///
/// Any size `n` with `n >= 2` and `(n - 2) % 3 == 0` is searched; other sizes
/// return false.
pub fn is_winning_tiles(tiles: &[Tile]) -> bool {
    let n = tiles.len();
    if n < 2 || (n - 2) % 3 != 0 {
        return false;
    }
    let mut counts = tile_counts(tiles);
    is_winning_counts(&mut counts)
}

/// Standard-shape check on a frequency table. The table is restored before returning.
pub fn is_winning_counts(counts: &mut [u8; TILE_KINDS]) -> bool {
    let total: usize = counts.iter().map(|&c| c as usize).sum();
    if total < 2 || (total - 2) % 3 != 0 {
        return false;
    }
    for pair in 0..TILE_KINDS {
        if counts[pair] < 2 {
            continue;
        }
        counts[pair] -= 2;
        let found = decompose(counts, 0);
        counts[pair] += 2;
        if found {
            return true;
        }
    }
    false
}

fn decompose(counts: &mut [u8; TILE_KINDS], from: usize) -> bool {
    let Some(i) = (from..TILE_KINDS).find(|&i| counts[i] > 0) else {
        return true;
    };

    if counts[i] >= 3 {
        counts[i] -= 3;
        let found = decompose(counts, i);
        counts[i] += 3;
        if found {
            return true;
        }
    }

    if i < HONOR_START && i % 9 <= 6 && counts[i + 1] > 0 && counts[i + 2] > 0 {
        counts[i] -= 1;
        counts[i + 1] -= 1;
        counts[i + 2] -= 1;
        let found = decompose(counts, i);
        counts[i] += 1;
        counts[i + 1] += 1;
        counts[i + 2] += 1;
        if found {
            return true;
        }
    }

    false
}

fn is_decision_size(committed: usize) -> bool {
    committed == 14 || committed == 17
}

/// Standard shape for a full hand: 14 or 17 committed tiles, melds already set aside
pub fn is_winning_hand(hand: &Hand) -> bool {
    is_decision_size(hand.committed_count()) && is_winning_tiles(hand.concealed())
}

/// Seven pairs: no melds, 14 concealed tiles, every face held 0, 2 or 4 times.
///
/// A face held four times counts as two pairs. 17-tile hands never qualify.
pub fn is_seven_pairs(hand: &Hand) -> bool {
    if !hand.melds().is_empty() || !is_decision_size(hand.concealed_count()) {
        return false;
    }
    let mut pairs = 0;
    for &count in hand.counts().iter() {
        match count {
            0 => {}
            2 => pairs += 1,
            4 => pairs += 2,
            _ => return false,
        }
    }
    pairs * 2 == hand.concealed_count()
}

/// Thirteen orphans: every terminal and honor face once, one of them twice
pub fn is_thirteen_orphans(hand: &Hand) -> bool {
    if !hand.melds().is_empty() || hand.concealed_count() != 14 {
        return false;
    }
    if hand.concealed().iter().any(|t| !t.is_orphan()) {
        return false;
    }
    let counts = hand.counts();
    let mut pairs = 0;
    for orphan in ORPHANS.iter() {
        match counts[orphan.index()] {
            1 => {}
            2 => pairs += 1,
            _ => return false,
        }
    }
    pairs == 1
}

/// The shape a hand wins with, standard shape preferred
pub fn winning_shape(hand: &Hand) -> Option<WinShape> {
    if is_winning_hand(hand) {
        Some(WinShape::Standard)
    } else if is_seven_pairs(hand) {
        Some(WinShape::SevenPairs)
    } else if is_thirteen_orphans(hand) {
        Some(WinShape::ThirteenOrphans)
    } else {
        None
    }
}
