//! Error types for hand bookkeeping and seat input.

use thiserror::Error;

use crate::types::{ActionChoice, Seat, Tile};

/// Hand mutation failures.
///
/// Every `Hand` mutation validates first and mutates second, so an `Err`
/// always leaves the hand untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandError {
    #[error("{0} is not in the concealed hand")]
    TileMissing(Tile),
    #[error("a fifth copy of {0} is not representable")]
    TooManyCopies(Tile),
    #[error("need {needed} concealed copies of {tile}, holding {held}")]
    NotEnoughCopies { tile: Tile, needed: usize, held: usize },
    #[error("no exposed triplet of {0} to promote")]
    NoTripletToPromote(Tile),
    #[error("{0} cannot complete a sequence with the chosen tiles")]
    InvalidSequence(Tile),
    #[error("hand already holds the maximum number of melds")]
    TooManyMelds,
}

/// Rejected seat events.
///
/// All variants except [`ActionError::Stale`] leave the session unchanged.
/// `Stale` means the offer could not be honoured any more; the session has
/// already dropped that tier and moved on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("hand has not started")]
    NotStarted,
    #[error("hand is over")]
    HandOver,
    #[error("seat {0} does not exist")]
    InvalidSeat(Seat),
    #[error("seat {0} does not owe a discard")]
    NotYourTurn(Seat),
    #[error("a reaction window is open")]
    ReactionPending,
    #[error("seat {0} has no pending offer")]
    NotEligible(Seat),
    #[error("{choice} was not offered to seat {seat}")]
    NotOffered { seat: Seat, choice: ActionChoice },
    #[error("seat {seat} does not hold {tile}")]
    TileNotHeld { seat: Seat, tile: Tile },
    #[error("{choice} from seat {seat} is no longer legal")]
    Stale { seat: Seat, choice: ActionChoice },
}

/// Invalid scripted deals passed to `GameSession::from_layout`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("dealer seat {0} is out of range")]
    InvalidDealer(Seat),
    #[error("seat {seat} commits {count} tiles, expected 13 or 16")]
    HandSize { seat: Seat, count: usize },
    #[error("{tile} appears {count} times, at most four allowed")]
    TooManyCopies { tile: Tile, count: usize },
    #[error("seat {seat}: {source}")]
    Hand {
        seat: Seat,
        #[source]
        source: HandError,
    },
}
