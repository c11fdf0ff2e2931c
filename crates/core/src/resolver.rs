//! Legal-action resolver - what each seat may do with a tile
//!
//! Pure and non-mutating. [`legal_reactions`] answers "who can claim this
//! discard and how"; [`self_draw_options`] answers "what may the seat in turn
//! declare instead of discarding".
//!
//! Reactions are returned sorted by priority (win, then kong/pong, then chow).
//! Kong and pong share a priority; the responder picks between them.

use arrayvec::ArrayVec;

use crate::hand::{Hand, MAX_MELDS};
use crate::ting::can_win_with_tile;
use crate::types::{ActionChoice, ActionKind, MeldKind, Seat, Tile, SEATS};
use crate::win::winning_shape;

/// One seat's legal reaction to a discard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reaction {
    pub seat: Seat,
    pub choice: ActionChoice,
}

impl Reaction {
    pub fn kind(&self) -> ActionKind {
        match self.choice {
            ActionChoice::Win => ActionKind::Win,
            ActionChoice::Pong => ActionKind::Pong,
            ActionChoice::Chow(..) => ActionKind::Chow,
            _ => ActionKind::Kong,
        }
    }

    pub fn priority(&self) -> u8 {
        self.kind().priority()
    }

    /// Concealed tiles the reaction consumes alongside the discard
    pub fn tiles(&self, discard: Tile) -> ArrayVec<Tile, 3> {
        let mut out = ArrayVec::new();
        match self.choice {
            ActionChoice::Kong => out.extend([discard; 3]),
            ActionChoice::Pong => out.extend([discard; 2]),
            ActionChoice::Chow(a, b) => out.extend([a, b]),
            _ => {}
        }
        out
    }
}

/// Every legal reaction to `discard`, sorted by ascending priority.
///
/// The discarder never reacts. Only `chow_seat` (the seat after the discarder)
/// is offered chows. Within one priority, reactions keep seat order.
pub fn legal_reactions(
    hands: &[Hand; SEATS],
    discard: Tile,
    discarder: Seat,
    chow_seat: Seat,
) -> Vec<Reaction> {
    let mut out = Vec::new();
    for (seat, hand) in hands.iter().enumerate() {
        if seat == discarder {
            continue;
        }
        if can_win_with_tile(hand, discard) {
            out.push(Reaction {
                seat,
                choice: ActionChoice::Win,
            });
        }
        let held = hand.count_of(discard);
        let has_slot = hand.melds().len() < MAX_MELDS;
        if held >= 3 && has_slot {
            out.push(Reaction {
                seat,
                choice: ActionChoice::Kong,
            });
        }
        if held >= 2 && has_slot {
            out.push(Reaction {
                seat,
                choice: ActionChoice::Pong,
            });
        }
        if seat == chow_seat && has_slot {
            for (a, b) in chow_options(hand, discard) {
                out.push(Reaction {
                    seat,
                    choice: ActionChoice::chow(a, b),
                });
            }
        }
    }
    out.sort_by_key(|r| r.priority());
    out
}

/// Concealed tile pairs that complete a sequence with `discard`.
///
/// Candidates are `(r-2, r-1)`, `(r-1, r+1)` and `(r+1, r+2)`, each kept only
/// if both tiles stay in the suit and are held.
pub fn chow_options(hand: &Hand, discard: Tile) -> ArrayVec<(Tile, Tile), 3> {
    let mut out = ArrayVec::new();
    for (da, db) in [(-2, -1), (-1, 1), (1, 2)] {
        let (Some(a), Some(b)) = (discard.offset(da), discard.offset(db)) else {
            continue;
        };
        if hand.contains(a) && hand.contains(b) {
            out.push((a, b));
        }
    }
    out
}

/// Faces with four concealed copies
pub fn concealed_kong_options(hand: &Hand) -> ArrayVec<Tile, 4> {
    let mut out = ArrayVec::new();
    if hand.melds().len() >= MAX_MELDS {
        return out;
    }
    let counts = hand.counts();
    for tile in Tile::all() {
        if counts[tile.index()] == 4 && !out.is_full() {
            out.push(tile);
        }
    }
    out
}

/// Exposed triplets whose fourth copy is concealed
pub fn added_kong_options(hand: &Hand) -> ArrayVec<Tile, MAX_MELDS> {
    hand.melds()
        .iter()
        .filter(|m| m.kind() == MeldKind::Triplet && hand.contains(m.first()))
        .map(|m| m.first())
        .collect()
}

/// Declarations open to the seat in turn right after a draw (pass excluded)
pub fn self_draw_options(hand: &Hand) -> Vec<ActionChoice> {
    let mut out = Vec::new();
    if winning_shape(hand).is_some() {
        out.push(ActionChoice::Win);
    }
    out.extend(
        concealed_kong_options(hand)
            .into_iter()
            .map(ActionChoice::ConcealedKong),
    );
    out.extend(
        added_kong_options(hand)
            .into_iter()
            .map(ActionChoice::AddedKong),
    );
    out
}
