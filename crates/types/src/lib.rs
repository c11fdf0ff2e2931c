//! Core types module - shared tile, meld and action vocabulary
//!
//! This module defines the fundamental value types used throughout the workspace.
//! All types are plain data with no external dependencies, so they can be used
//! by the rule engine, the session state machine and the wire protocol alike.
//!
//! # Tile Catalog
//!
//! Taiwan rules play with 34 distinct faces, 4 physical copies each (136 tiles,
//! flowers are not modelled):
//!
//! | Suit | Ranks | Ordinals | Wire names |
//! |------|-------|----------|------------|
//! | `Man` (characters) | 1-9 | 0-8 | `M1`..`M9` |
//! | `Pin` (dots) | 1-9 | 9-17 | `P1`..`P9` |
//! | `Sou` (bamboo) | 1-9 | 18-26 | `S1`..`S9` |
//! | `Wind` | 1-4 | 27-30 | `EAST`, `SOUTH`, `WEST`, `NORTH` |
//! | `Dragon` | 1-3 | 31-33 | `RED`, `GREEN`, `WHITE` |
//!
//! The ordinal is also the canonical sort order, so ordering tiles by ordinal is
//! the same as ordering by `(suit, rank)`.
//!
//! # Action Priorities
//!
//! | Tier | Priority | Actions |
//! |------|----------|---------|
//! | `SelfDraw` | 0 | win on own draw, concealed/added kong |
//! | `Win` | 1 | win on a discard |
//! | `Claim` | 2 | pong, kong |
//! | `Chow` | 3 | chow (next seat only) |
//!
//! # Examples
//!
//! ```
//! use tw_mahjong_types::{ActionChoice, Meld, Suit, Tile};
//!
//! // Build and name tiles
//! let tile = Tile::new(Suit::Pin, 5).unwrap();
//! assert_eq!(tile.name(), "P5");
//! assert_eq!(Tile::from_name("p5"), Some(tile));
//!
//! // Sequences never leave their suit
//! assert!(Meld::sequence(Tile::new(Suit::Man, 7).unwrap()).is_some());
//! assert!(Meld::sequence(Tile::new(Suit::Man, 8).unwrap()).is_none());
//!
//! // Parse action labels
//! let chow = ActionChoice::parse("CHOW M2,M3").unwrap();
//! assert_eq!(chow.label(), "CHOW M2,M3");
//! ```

use std::fmt;

/// Number of seats at the table
pub const SEATS: usize = 4;

/// Number of distinct tile faces
pub const TILE_KINDS: usize = 34;

/// Physical copies of every face
pub const COPIES_PER_TILE: u8 = 4;

/// Total tiles in a fresh wall (34 faces x 4 copies)
pub const WALL_SIZE: usize = TILE_KINDS * COPIES_PER_TILE as usize;

/// Concealed tiles dealt to each seat (Taiwan 16-tile hands)
pub const HAND_SIZE: usize = 16;

/// Seat index, 0 = East (dealer by default), 1 = South, 2 = West, 3 = North
pub type Seat = usize;

/// The seat that plays after `seat`.
///
/// ```
/// use tw_mahjong_types::next_seat;
///
/// assert_eq!(next_seat(0), 1);
/// assert_eq!(next_seat(3), 0);
/// ```
pub fn next_seat(seat: Seat) -> Seat {
    (seat + 1) % SEATS
}

/// Tile suits, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    Man,
    Pin,
    Sou,
    Wind,
    Dragon,
}

impl Suit {
    /// Numeric suits can form sequences
    pub fn is_numeric(&self) -> bool {
        matches!(self, Suit::Man | Suit::Pin | Suit::Sou)
    }

    /// Highest rank in this suit
    pub fn max_rank(&self) -> u8 {
        match self {
            Suit::Man | Suit::Pin | Suit::Sou => 9,
            Suit::Wind => 4,
            Suit::Dragon => 3,
        }
    }

    fn base_index(&self) -> u8 {
        match self {
            Suit::Man => 0,
            Suit::Pin => 9,
            Suit::Sou => 18,
            Suit::Wind => 27,
            Suit::Dragon => 31,
        }
    }

    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            Suit::Man => "man",
            Suit::Pin => "pin",
            Suit::Sou => "sou",
            Suit::Wind => "wind",
            Suit::Dragon => "dragon",
        }
    }
}

const TILE_NAMES: [&str; TILE_KINDS] = [
    "M1", "M2", "M3", "M4", "M5", "M6", "M7", "M8", "M9", //
    "P1", "P2", "P3", "P4", "P5", "P6", "P7", "P8", "P9", //
    "S1", "S2", "S3", "S4", "S5", "S6", "S7", "S8", "S9", //
    "EAST", "SOUTH", "WEST", "NORTH", //
    "RED", "GREEN", "WHITE",
];

/// A playing tile face.
///
/// Stored as its canonical ordinal (0-33). Equality, hashing and ordering all
/// follow `(suit, rank)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    index: u8,
}

/// The 13 terminal and honor faces used by thirteen orphans
pub const ORPHANS: [Tile; 13] = [
    Tile { index: 0 },
    Tile { index: 8 },
    Tile { index: 9 },
    Tile { index: 17 },
    Tile { index: 18 },
    Tile { index: 26 },
    Tile { index: 27 },
    Tile { index: 28 },
    Tile { index: 29 },
    Tile { index: 30 },
    Tile { index: 31 },
    Tile { index: 32 },
    Tile { index: 33 },
];

impl Tile {
    /// Build a tile from suit and rank; `None` when the rank is out of range
    pub fn new(suit: Suit, rank: u8) -> Option<Self> {
        if rank == 0 || rank > suit.max_rank() {
            return None;
        }
        Some(Self {
            index: suit.base_index() + rank - 1,
        })
    }

    /// Build a tile from its canonical ordinal (0-33)
    pub fn from_index(index: usize) -> Option<Self> {
        if index < TILE_KINDS {
            Some(Self { index: index as u8 })
        } else {
            None
        }
    }

    /// Canonical ordinal (0-33)
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn suit(&self) -> Suit {
        match self.index {
            0..=8 => Suit::Man,
            9..=17 => Suit::Pin,
            18..=26 => Suit::Sou,
            27..=30 => Suit::Wind,
            _ => Suit::Dragon,
        }
    }

    pub fn rank(&self) -> u8 {
        self.index - self.suit().base_index() + 1
    }

    pub fn is_numeric(&self) -> bool {
        self.suit().is_numeric()
    }

    pub fn is_honor(&self) -> bool {
        !self.is_numeric()
    }

    /// Rank 1 or 9 of a numeric suit
    pub fn is_terminal(&self) -> bool {
        self.is_numeric() && (self.rank() == 1 || self.rank() == 9)
    }

    /// Terminal or honor (member of the thirteen orphans set)
    pub fn is_orphan(&self) -> bool {
        self.is_terminal() || self.is_honor()
    }

    /// The tile `delta` ranks away in the same numeric suit.
    ///
    /// Returns `None` for honors or when the result would leave ranks 1-9,
    /// so callers can never build a sequence across a suit boundary.
    ///
    /// ```
    /// use tw_mahjong_types::{Suit, Tile};
    ///
    /// let m8 = Tile::new(Suit::Man, 8).unwrap();
    /// assert_eq!(m8.offset(1), Tile::new(Suit::Man, 9));
    /// assert_eq!(m8.offset(2), None);
    /// assert_eq!(Tile::from_name("EAST").unwrap().offset(1), None);
    /// ```
    pub fn offset(&self, delta: i8) -> Option<Tile> {
        if !self.is_numeric() {
            return None;
        }
        let rank = self.rank() as i8 + delta;
        if !(1..=9).contains(&rank) {
            return None;
        }
        Tile::new(self.suit(), rank as u8)
    }

    /// Iterate over all 34 faces in canonical order
    pub fn all() -> impl Iterator<Item = Tile> {
        (0..TILE_KINDS as u8).map(|index| Tile { index })
    }

    /// Parse a wire name (case-insensitive), e.g. `"M1"`, `"p9"`, `"East"`
    pub fn from_name(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase();
        TILE_NAMES
            .iter()
            .position(|name| *name == upper)
            .map(|index| Tile { index: index as u8 })
    }

    /// Wire name of this face
    pub fn name(&self) -> &'static str {
        TILE_NAMES[self.index as usize]
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a quad came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KongKind {
    /// Three concealed copies plus a claimed discard
    Exposed,
    /// Four concealed copies declared on the seat's own turn
    Concealed,
    /// An exposed triplet promoted with the fourth copy
    Added,
}

/// Meld shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeldKind {
    /// Three consecutive ranks of one numeric suit
    Sequence,
    /// Three identical tiles
    Triplet,
    /// Four identical tiles
    Quad(KongKind),
    /// Two identical tiles (the eyes of a hand)
    Pair,
}

impl MeldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeldKind::Sequence => "sequence",
            MeldKind::Triplet => "triplet",
            MeldKind::Quad(KongKind::Exposed) => "exposed_quad",
            MeldKind::Quad(KongKind::Concealed) => "concealed_quad",
            MeldKind::Quad(KongKind::Added) => "added_quad",
            MeldKind::Pair => "pair",
        }
    }
}

/// A committed set of tiles.
///
/// Melds are immutable and can only be built through constructors that check
/// their shape, so an invalid sequence (e.g. `M8 M9 P1`) is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Meld {
    kind: MeldKind,
    first: Tile,
}

impl Meld {
    /// Sequence starting at `first`; `None` for honors or ranks above 7
    pub fn sequence(first: Tile) -> Option<Self> {
        first.offset(2)?;
        Some(Self {
            kind: MeldKind::Sequence,
            first,
        })
    }

    pub fn triplet(tile: Tile) -> Self {
        Self {
            kind: MeldKind::Triplet,
            first: tile,
        }
    }

    pub fn quad(tile: Tile, kong: KongKind) -> Self {
        Self {
            kind: MeldKind::Quad(kong),
            first: tile,
        }
    }

    pub fn pair(tile: Tile) -> Self {
        Self {
            kind: MeldKind::Pair,
            first: tile,
        }
    }

    pub fn kind(&self) -> MeldKind {
        self.kind
    }

    /// Lowest tile of the meld (the only tile for identical sets)
    pub fn first(&self) -> Tile {
        self.first
    }

    pub fn tile_count(&self) -> usize {
        match self.kind {
            MeldKind::Sequence | MeldKind::Triplet => 3,
            MeldKind::Quad(_) => 4,
            MeldKind::Pair => 2,
        }
    }

    /// Tiles of the meld in ascending order
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (0..self.tile_count()).map(move |i| match self.kind {
            MeldKind::Sequence => self.first.offset(i as i8).unwrap_or(self.first),
            _ => self.first,
        })
    }

    pub fn contains(&self, tile: Tile) -> bool {
        self.tiles().any(|t| t == tile)
    }

    pub fn is_quad(&self) -> bool {
        matches!(self.kind, MeldKind::Quad(_))
    }

    /// Quad promoted from four concealed tiles. It is still shown to every seat.
    pub fn is_concealed(&self) -> bool {
        matches!(self.kind, MeldKind::Quad(KongKind::Concealed))
    }
}

impl fmt::Display for Meld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.kind.as_str())?;
        for (i, tile) in self.tiles().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(tile.name())?;
        }
        Ok(())
    }
}

/// Reactions a seat may take on a discard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Win,
    Kong,
    Pong,
    Chow,
}

impl ActionKind {
    /// Lower value wins; kong and pong share a priority
    pub fn priority(&self) -> u8 {
        match self {
            ActionKind::Win => 1,
            ActionKind::Kong | ActionKind::Pong => 2,
            ActionKind::Chow => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Win => "win",
            ActionKind::Kong => "kong",
            ActionKind::Pong => "pong",
            ActionKind::Chow => "chow",
        }
    }
}

/// Negotiation tiers, resolved highest priority (lowest value) first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    SelfDraw,
    Win,
    Claim,
    Chow,
}

impl Tier {
    pub fn priority(&self) -> u8 {
        match self {
            Tier::SelfDraw => 0,
            Tier::Win => 1,
            Tier::Claim => 2,
            Tier::Chow => 3,
        }
    }

    /// Tier a discard reaction belongs to
    pub fn for_action(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Win => Tier::Win,
            ActionKind::Kong | ActionKind::Pong => Tier::Claim,
            ActionKind::Chow => Tier::Chow,
        }
    }
}

/// A concrete choice offered to (and answered by) a seat.
///
/// Chow carries the two concealed tiles that complete the sequence; the
/// claimed discard is implied by the pending reaction window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionChoice {
    Win,
    Kong,
    Pong,
    Chow(Tile, Tile),
    ConcealedKong(Tile),
    AddedKong(Tile),
    Pass,
}

impl ActionChoice {
    /// Chow with its two concealed tiles in canonical order
    pub fn chow(a: Tile, b: Tile) -> Self {
        if b < a {
            ActionChoice::Chow(b, a)
        } else {
            ActionChoice::Chow(a, b)
        }
    }

    /// Parse a wire label.
    ///
    /// Accepted forms: `HU`, `PONG`, `KONG`, `CHOW M2,M3`, `CONCEALED_KONG M1`,
    /// `ADDED_KONG M1`, `PASS` (or `SKIP`). Matching is case-insensitive and
    /// the two chow tiles may come in either order.
    ///
    /// ```
    /// use tw_mahjong_types::{ActionChoice, Tile};
    ///
    /// assert_eq!(ActionChoice::parse("hu"), Some(ActionChoice::Win));
    /// assert_eq!(ActionChoice::parse("SKIP"), Some(ActionChoice::Pass));
    /// assert_eq!(
    ///     ActionChoice::parse("CONCEALED_KONG RED"),
    ///     Some(ActionChoice::ConcealedKong(Tile::from_name("RED").unwrap()))
    /// );
    /// assert_eq!(ActionChoice::parse("CHOW M2"), None);
    /// assert_eq!(ActionChoice::parse("DANCE"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (head, rest) = match s.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, Some(rest.trim())),
            None => (s, None),
        };

        match (head.to_ascii_uppercase().as_str(), rest) {
            ("HU" | "WIN", None) => Some(ActionChoice::Win),
            ("KONG", None) => Some(ActionChoice::Kong),
            ("PONG", None) => Some(ActionChoice::Pong),
            ("PASS" | "SKIP", None) => Some(ActionChoice::Pass),
            ("CHOW", Some(rest)) => {
                let (a, b) = rest.split_once(',')?;
                Some(ActionChoice::chow(Tile::from_name(a)?, Tile::from_name(b)?))
            }
            ("CONCEALED_KONG", Some(rest)) => Tile::from_name(rest).map(ActionChoice::ConcealedKong),
            ("ADDED_KONG", Some(rest)) => Tile::from_name(rest).map(ActionChoice::AddedKong),
            _ => None,
        }
    }

    /// Canonical wire label
    pub fn label(&self) -> String {
        match self {
            ActionChoice::Win => "HU".to_string(),
            ActionChoice::Kong => "KONG".to_string(),
            ActionChoice::Pong => "PONG".to_string(),
            ActionChoice::Chow(a, b) => format!("CHOW {},{}", a, b),
            ActionChoice::ConcealedKong(t) => format!("CONCEALED_KONG {}", t),
            ActionChoice::AddedKong(t) => format!("ADDED_KONG {}", t),
            ActionChoice::Pass => "PASS".to_string(),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, ActionChoice::Pass)
    }

    /// Reaction kind behind this choice (`None` for pass)
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            ActionChoice::Win => Some(ActionKind::Win),
            ActionChoice::Kong | ActionChoice::ConcealedKong(_) | ActionChoice::AddedKong(_) => {
                Some(ActionKind::Kong)
            }
            ActionChoice::Pong => Some(ActionKind::Pong),
            ActionChoice::Chow(..) => Some(ActionKind::Chow),
            ActionChoice::Pass => None,
        }
    }
}

impl fmt::Display for ActionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Shapes the win engine recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinShape {
    /// Sets plus one pair
    Standard,
    SevenPairs,
    ThirteenOrphans,
}

impl WinShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            WinShape::Standard => "standard",
            WinShape::SevenPairs => "seven_pairs",
            WinShape::ThirteenOrphans => "thirteen_orphans",
        }
    }
}

/// Where the winning tile came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinSource {
    SelfDraw,
    Discard { from: Seat },
}

/// Terminal result of a hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandOutcome {
    Win {
        winner: Seat,
        source: WinSource,
        shape: WinShape,
    },
    WallExhausted,
}

impl HandOutcome {
    pub fn winner(&self) -> Option<Seat> {
        match self {
            HandOutcome::Win { winner, .. } => Some(*winner),
            HandOutcome::WallExhausted => None,
        }
    }

    /// Short reason string for the `hand_ended` notification
    pub fn reason(&self) -> &'static str {
        match self {
            HandOutcome::Win {
                source: WinSource::SelfDraw,
                ..
            } => "self_draw",
            HandOutcome::Win {
                source: WinSource::Discard { .. },
                ..
            } => "win_on_discard",
            HandOutcome::WallExhausted => "wall_exhausted",
        }
    }
}
