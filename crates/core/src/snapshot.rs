use crate::types::{Meld, Seat, Tile, SEATS};

/// Coarse state of a session, for inspection and views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    NotStarted,
    SelfDrawDecision,
    AwaitingDiscard,
    ReactionWindow,
    HandComplete,
    WallExhausted,
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::NotStarted => "not_started",
            PhaseKind::SelfDrawDecision => "self_draw_decision",
            PhaseKind::AwaitingDiscard => "awaiting_discard",
            PhaseKind::ReactionWindow => "reaction_window",
            PhaseKind::HandComplete => "hand_complete",
            PhaseKind::WallExhausted => "wall_exhausted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PhaseKind::HandComplete | PhaseKind::WallExhausted)
    }
}

/// What one seat is allowed to see.
///
/// Own concealed tiles are listed; other seats only show a count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatView {
    pub seat: Seat,
    pub turn: Seat,
    pub phase: PhaseKind,
    pub concealed: Vec<Tile>,
    pub melds: [Vec<Meld>; SEATS],
    pub concealed_counts: [usize; SEATS],
    pub sea: Vec<Tile>,
    pub wall_remaining: usize,
    pub pending_discard: Option<Tile>,
}

impl SeatView {
    pub fn is_my_turn(&self) -> bool {
        self.seat == self.turn
    }

    /// Tiles visible to this seat plus the hidden counts, for conservation checks
    pub fn accounted_tiles(&self) -> usize {
        let meld_tiles: usize = self
            .melds
            .iter()
            .flat_map(|m| m.iter())
            .map(|m| m.tile_count())
            .sum();
        self.concealed_counts.iter().sum::<usize>() + meld_tiles + self.sea.len() + self.wall_remaining
    }
}
