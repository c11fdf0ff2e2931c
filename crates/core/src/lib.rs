//! Core rule engine - pure, deterministic, and testable
//!
//! This crate contains the Taiwan Mahjong rules and the turn/reaction state
//! machine for one hand. It has **no dependencies** on networking or async
//! runtimes, making it:
//!
//! - **Deterministic**: Same seed (or same scripted layout) plays out identically
//! - **Testable**: Every rule is checked with plain unit tests
//! - **Shareable**: Win detection and the resolver are pure functions, safe to
//!   call from any thread
//!
//! # Module Structure
//!
//! - [`hand`]: Concealed tiles plus exposed melds, with validated mutation
//! - [`wall`]: Seeded 136-tile draw pile
//! - [`win`]: Standard shape backtracking, seven pairs, thirteen orphans
//! - [`ting`]: Waiting-tile enumeration by trial insertion
//! - [`resolver`]: Legal reactions to a discard, self-draw declarations
//! - [`action_group`]: One negotiation tier and its pending seats
//! - [`session`]: The [`GameSession`] state machine
//! - [`event`] / [`snapshot`]: Values exchanged with the transport
//!
//! # Rules Modelled
//!
//! - 16-tile hands, dealer opens with 17
//! - Chow only from the seat before you
//! - Win beats pong/kong beats chow; the first valid claim in a tier wins
//! - Kongs (exposed, concealed, added) draw a replacement from the wall
//! - No flowers, no dead wall, no scoring
//!
//! # Example
//!
//! ```
//! use tw_mahjong_core::{GameSession, Notification, SeatEvent, SessionConfig};
//! use tw_mahjong_core::types::ActionChoice;
//!
//! let mut session = GameSession::new(SessionConfig::new(2024));
//! session.start();
//!
//! // Settle any self-draw offer, then discard the first concealed tile
//! let dealer = session.turn();
//! if !session.pending_seats().is_empty() {
//!     session.handle(SeatEvent::respond(dealer, ActionChoice::Pass)).unwrap();
//! }
//! let tile = session.hand(dealer).unwrap().concealed()[0];
//! session.handle(SeatEvent::discard(dealer, tile)).unwrap();
//!
//! let notes = session.drain_notifications();
//! assert!(notes.iter().any(|n| matches!(n, Notification::Discarded { .. })));
//! assert_eq!(session.tiles_in_play(), 136);
//! ```

pub mod action_group;
pub mod error;
pub mod event;
pub mod hand;
pub mod resolver;
pub mod session;
pub mod snapshot;
pub mod ting;
pub mod wall;
pub mod win;

pub use tw_mahjong_types as types;

// Re-export commonly used types for convenience
pub use action_group::ActionGroup;
pub use error::{ActionError, HandError, LayoutError};
pub use event::{Notification, Recipient, SeatCommand, SeatEvent};
pub use hand::Hand;
pub use resolver::{legal_reactions, Reaction};
pub use session::{GameSession, SessionConfig, TableLayout};
pub use snapshot::{PhaseKind, SeatView};
pub use ting::{detect_ting, TingResult};
pub use wall::Wall;
pub use win::{is_winning_hand, is_winning_tiles, winning_shape};
