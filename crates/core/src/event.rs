//! Seat input and outbound notifications.
//!
//! The session never serializes anything; these are the structured values it
//! exchanges with whatever transport drives it.

use crate::snapshot::SeatView;
use crate::types::{ActionChoice, HandOutcome, Meld, Seat, Tier, Tile};

/// What a seat asks the session to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatCommand {
    Discard(Tile),
    Respond(ActionChoice),
}

/// A command tagged with its originating seat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatEvent {
    pub seat: Seat,
    pub command: SeatCommand,
}

impl SeatEvent {
    pub fn discard(seat: Seat, tile: Tile) -> Self {
        Self {
            seat,
            command: SeatCommand::Discard(tile),
        }
    }

    pub fn respond(seat: Seat, choice: ActionChoice) -> Self {
        Self {
            seat,
            command: SeatCommand::Respond(choice),
        }
    }

    pub fn pass(seat: Seat) -> Self {
        Self::respond(seat, ActionChoice::Pass)
    }
}

/// Who a notification is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Seat(Seat),
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    HandStarted {
        dealer: Seat,
        wall_remaining: usize,
    },
    /// Per-seat view of the table
    StateSnapshot(SeatView),
    TileDrawn {
        seat: Seat,
        tile: Tile,
        replacement: bool,
    },
    DiscardPrompt {
        seat: Seat,
    },
    ActionOffer {
        seat: Seat,
        tier: Tier,
        choices: Vec<ActionChoice>,
        tile: Tile,
    },
    Discarded {
        seat: Seat,
        tile: Tile,
    },
    /// A claim or kong was committed
    ActionTaken {
        seat: Seat,
        choice: ActionChoice,
        meld: Meld,
    },
    HandEnded {
        outcome: HandOutcome,
    },
}

impl Notification {
    pub fn recipient(&self) -> Recipient {
        match self {
            Notification::StateSnapshot(view) => Recipient::Seat(view.seat),
            Notification::TileDrawn { seat, .. }
            | Notification::DiscardPrompt { seat }
            | Notification::ActionOffer { seat, .. } => Recipient::Seat(*seat),
            Notification::HandStarted { .. }
            | Notification::Discarded { .. }
            | Notification::ActionTaken { .. }
            | Notification::HandEnded { .. } => Recipient::All,
        }
    }

    /// Short tag for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::HandStarted { .. } => "hand_started",
            Notification::StateSnapshot(_) => "state",
            Notification::TileDrawn { .. } => "tile_drawn",
            Notification::DiscardPrompt { .. } => "discard_prompt",
            Notification::ActionOffer { .. } => "action_offer",
            Notification::Discarded { .. } => "discarded",
            Notification::ActionTaken { .. } => "action_taken",
            Notification::HandEnded { .. } => "hand_ended",
        }
    }
}
