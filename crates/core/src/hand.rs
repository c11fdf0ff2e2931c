//! Hand module - one seat's concealed tiles and exposed melds
//!
//! The concealed tiles are kept sorted by `(suit, rank)` at all times. Every
//! mutation checks its preconditions before touching anything, so a failed
//! call leaves the hand exactly as it was.
//!
//! A hand can never hold a fifth copy of a face: `add_tile` counts concealed
//! tiles and meld tiles together and refuses the insert.

use arrayvec::ArrayVec;

use crate::error::HandError;
use crate::types::{KongKind, Meld, MeldKind, Tile, COPIES_PER_TILE, TILE_KINDS};

/// Upper bound on declared melds (16-tile hands hold five sets and a pair)
pub const MAX_MELDS: usize = 5;

/// A seat's tiles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    concealed: Vec<Tile>,
    melds: ArrayVec<Meld, MAX_MELDS>,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hand from concealed tiles only
    pub fn from_tiles(tiles: &[Tile]) -> Result<Self, HandError> {
        Self::with_melds(tiles, &[])
    }

    /// Build a hand with pre-declared melds (scripted deals, tests)
    pub fn with_melds(tiles: &[Tile], melds: &[Meld]) -> Result<Self, HandError> {
        let mut hand = Self::new();
        for meld in melds {
            for tile in meld.tiles() {
                let in_meld = meld.tiles().filter(|&t| t == tile).count();
                if hand.total_copies(tile) + in_meld > COPIES_PER_TILE as usize {
                    return Err(HandError::TooManyCopies(tile));
                }
            }
            hand.melds.try_push(*meld).map_err(|_| HandError::TooManyMelds)?;
        }
        for &tile in tiles {
            hand.add_tile(tile)?;
        }
        Ok(hand)
    }

    /// Concealed tiles in canonical order
    pub fn concealed(&self) -> &[Tile] {
        &self.concealed
    }

    pub fn melds(&self) -> &[Meld] {
        &self.melds
    }

    pub fn concealed_count(&self) -> usize {
        self.concealed.len()
    }

    /// Tiles committed to the hand's shape: concealed tiles plus three per set.
    ///
    /// A quad counts as one set, so kongs do not inflate the count.
    pub fn committed_count(&self) -> usize {
        let meld_tiles: usize = self
            .melds
            .iter()
            .map(|m| match m.kind() {
                MeldKind::Pair => 2,
                _ => 3,
            })
            .sum();
        self.concealed.len() + meld_tiles
    }

    /// Tiles physically held (quads count four)
    pub fn physical_count(&self) -> usize {
        self.concealed.len() + self.melds.iter().map(|m| m.tile_count()).sum::<usize>()
    }

    /// Concealed copies of `tile`
    pub fn count_of(&self, tile: Tile) -> usize {
        self.concealed.iter().filter(|&&t| t == tile).count()
    }

    /// Copies of `tile` held anywhere in the hand
    pub fn total_copies(&self, tile: Tile) -> usize {
        let in_melds: usize = self
            .melds
            .iter()
            .map(|m| m.tiles().filter(|&t| t == tile).count())
            .sum();
        self.count_of(tile) + in_melds
    }

    pub fn contains(&self, tile: Tile) -> bool {
        self.concealed.binary_search(&tile).is_ok()
    }

    /// 34-slot frequency table of the concealed tiles
    pub fn counts(&self) -> [u8; TILE_KINDS] {
        let mut counts = [0u8; TILE_KINDS];
        for tile in &self.concealed {
            counts[tile.index()] += 1;
        }
        counts
    }

    /// Insert a tile, keeping the concealed tiles sorted
    pub fn add_tile(&mut self, tile: Tile) -> Result<(), HandError> {
        if self.total_copies(tile) >= COPIES_PER_TILE as usize {
            return Err(HandError::TooManyCopies(tile));
        }
        let pos = self.concealed.partition_point(|&t| t <= tile);
        self.concealed.insert(pos, tile);
        Ok(())
    }

    pub fn remove_tile(&mut self, tile: Tile) -> Result<(), HandError> {
        match self.concealed.binary_search(&tile) {
            Ok(pos) => {
                self.concealed.remove(pos);
                Ok(())
            }
            Err(_) => Err(HandError::TileMissing(tile)),
        }
    }

    /// Clone of this hand with `tile` inserted; `None` if that would be a fifth copy
    pub fn with_tile(&self, tile: Tile) -> Option<Hand> {
        let mut hand = self.clone();
        hand.add_tile(tile).ok()?;
        Some(hand)
    }

    /// Claim a discard into an exposed triplet
    pub fn pong(&mut self, claimed: Tile) -> Result<Meld, HandError> {
        self.ensure_meld_slot()?;
        self.ensure_copies(claimed, 2)?;
        self.take_copies(claimed, 2);
        let meld = Meld::triplet(claimed);
        self.melds.push(meld);
        Ok(meld)
    }

    /// Claim a discard into an exposed quad
    pub fn exposed_kong(&mut self, claimed: Tile) -> Result<Meld, HandError> {
        self.ensure_meld_slot()?;
        self.ensure_copies(claimed, 3)?;
        self.take_copies(claimed, 3);
        let meld = Meld::quad(claimed, KongKind::Exposed);
        self.melds.push(meld);
        Ok(meld)
    }

    /// Declare four concealed copies as a quad
    pub fn concealed_kong(&mut self, tile: Tile) -> Result<Meld, HandError> {
        self.ensure_meld_slot()?;
        self.ensure_copies(tile, 4)?;
        self.take_copies(tile, 4);
        let meld = Meld::quad(tile, KongKind::Concealed);
        self.melds.push(meld);
        Ok(meld)
    }

    /// Promote an exposed triplet with the concealed fourth copy
    pub fn added_kong(&mut self, tile: Tile) -> Result<Meld, HandError> {
        let slot = self
            .melds
            .iter()
            .position(|m| m.kind() == MeldKind::Triplet && m.first() == tile)
            .ok_or(HandError::NoTripletToPromote(tile))?;
        self.ensure_copies(tile, 1)?;
        self.take_copies(tile, 1);
        let meld = Meld::quad(tile, KongKind::Added);
        self.melds[slot] = meld;
        Ok(meld)
    }

    /// Claim a discard into a sequence with two concealed tiles `a` and `b`
    pub fn chow(&mut self, claimed: Tile, a: Tile, b: Tile) -> Result<Meld, HandError> {
        self.ensure_meld_slot()?;
        let mut tiles = [claimed, a, b];
        tiles.sort();
        let meld = Meld::sequence(tiles[0]).ok_or(HandError::InvalidSequence(claimed))?;
        if !meld.tiles().eq(tiles.iter().copied()) {
            return Err(HandError::InvalidSequence(claimed));
        }
        self.ensure_copies(a, 1)?;
        self.ensure_copies(b, 1)?;
        self.take_copies(a, 1);
        self.take_copies(b, 1);
        self.melds.push(meld);
        Ok(meld)
    }

    fn ensure_meld_slot(&self) -> Result<(), HandError> {
        if self.melds.is_full() {
            Err(HandError::TooManyMelds)
        } else {
            Ok(())
        }
    }

    fn ensure_copies(&self, tile: Tile, needed: usize) -> Result<(), HandError> {
        let held = self.count_of(tile);
        if held < needed {
            return Err(HandError::NotEnoughCopies { tile, needed, held });
        }
        Ok(())
    }

    // Caller has checked availability.
    fn take_copies(&mut self, tile: Tile, n: usize) {
        for _ in 0..n {
            if let Ok(pos) = self.concealed.binary_search(&tile) {
                self.concealed.remove(pos);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(name: &str) -> Tile {
        Tile::from_name(name).unwrap()
    }

    fn tiles(names: &str) -> Vec<Tile> {
        names.split_whitespace().map(t).collect()
    }

    #[test]
    fn test_add_tile_keeps_canonical_order() {
        let mut hand = Hand::from_tiles(&tiles("RED S1 M9 P5 EAST M1")).unwrap();
        hand.add_tile(t("P1")).unwrap();
        let names: Vec<&str> = hand.concealed().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["M1", "M9", "P1", "P5", "S1", "EAST", "RED"]);
    }

    #[test]
    fn test_fifth_copy_is_refused() {
        let mut hand = Hand::from_tiles(&tiles("M1 M1 M1 M1")).unwrap();
        assert_eq!(hand.add_tile(t("M1")), Err(HandError::TooManyCopies(t("M1"))));
        assert_eq!(hand.concealed_count(), 4);
        assert!(hand.with_tile(t("M1")).is_none());
    }

    #[test]
    fn test_fifth_copy_counts_meld_tiles() {
        let mut hand = Hand::with_melds(&tiles("M1"), &[Meld::triplet(t("M1"))]).unwrap();
        assert_eq!(hand.total_copies(t("M1")), 4);
        assert!(hand.add_tile(t("M1")).is_err());
    }

    #[test]
    fn test_remove_missing_tile_is_an_error() {
        let mut hand = Hand::from_tiles(&tiles("M1 M2")).unwrap();
        assert_eq!(hand.remove_tile(t("M3")), Err(HandError::TileMissing(t("M3"))));
        assert_eq!(hand.concealed_count(), 2);
    }

    #[test]
    fn test_pong_moves_two_concealed_copies() {
        let mut hand = Hand::from_tiles(&tiles("P3 P3 S7")).unwrap();
        let meld = hand.pong(t("P3")).unwrap();
        assert_eq!(meld, Meld::triplet(t("P3")));
        assert_eq!(hand.concealed(), &tiles("S7")[..]);
        assert_eq!(hand.committed_count(), 4);
    }

    #[test]
    fn test_failed_pong_leaves_hand_untouched() {
        let mut hand = Hand::from_tiles(&tiles("P3 S7")).unwrap();
        let before = hand.clone();
        assert!(matches!(
            hand.pong(t("P3")),
            Err(HandError::NotEnoughCopies { needed: 2, held: 1, .. })
        ));
        assert_eq!(hand, before);
    }

    #[test]
    fn test_quads_count_as_one_set() {
        let mut hand = Hand::from_tiles(&tiles("EAST EAST EAST EAST M1")).unwrap();
        hand.concealed_kong(t("EAST")).unwrap();
        assert_eq!(hand.committed_count(), 4);
        assert_eq!(hand.physical_count(), 5);
        assert!(hand.melds()[0].is_concealed());
    }

    #[test]
    fn test_added_kong_promotes_triplet() {
        let mut hand = Hand::with_melds(&tiles("S5 M2"), &[Meld::triplet(t("S5"))]).unwrap();
        let meld = hand.added_kong(t("S5")).unwrap();
        assert_eq!(meld.kind(), MeldKind::Quad(KongKind::Added));
        assert_eq!(hand.melds().len(), 1);
        assert_eq!(hand.concealed(), &tiles("M2")[..]);

        assert_eq!(
            hand.added_kong(t("M2")),
            Err(HandError::NoTripletToPromote(t("M2")))
        );
    }

    #[test]
    fn test_chow_validates_sequence() {
        let mut hand = Hand::from_tiles(&tiles("M2 M3 M5 P4")).unwrap();
        assert_eq!(
            hand.chow(t("M4"), t("M3"), t("P4")),
            Err(HandError::InvalidSequence(t("M4")))
        );
        assert_eq!(
            hand.chow(t("M4"), t("M2"), t("M5")),
            Err(HandError::InvalidSequence(t("M4")))
        );
        let meld = hand.chow(t("M4"), t("M2"), t("M3")).unwrap();
        assert_eq!(meld, Meld::sequence(t("M2")).unwrap());
        assert_eq!(hand.concealed(), &tiles("M5 P4")[..]);
    }

    #[test]
    fn test_counts_table() {
        let hand = Hand::from_tiles(&tiles("M1 M1 WHITE")).unwrap();
        let counts = hand.counts();
        assert_eq!(counts[0], 2);
        assert_eq!(counts[33], 1);
        assert_eq!(counts.iter().map(|&c| c as usize).sum::<usize>(), 3);
    }
}
