//! Game session - the turn and reaction state machine for one hand
//!
//! A [`GameSession`] owns the wall, all four hands and the sea. It is driven
//! by [`SeatEvent`]s through [`GameSession::handle`] and reports what happened
//! through an outbox of [`Notification`]s drained with
//! [`GameSession::drain_notifications`].
//!
//! # Lifecycle
//!
//! ```text
//! draw -> self-draw decision (optional) -> awaiting discard
//!      -> reaction window (win, then pong/kong, then chow)
//!      -> claim or next seat draws ...
//! ```
//!
//! The hand ends on a win (`HandComplete`) or when a draw finds the wall empty
//! (`WallExhausted`). Drawing happens inside the transition that needs it, so
//! there is no observable "awaiting draw" phase.
//!
//! # Rejections
//!
//! Every rejected event returns an [`ActionError`] and leaves the session
//! untouched, except [`ActionError::Stale`]: the responder's offer could no
//! longer be honoured, the tier was dropped and play already moved on.
//!
//! # Example
//!
//! ```
//! use tw_mahjong_core::{GameSession, PhaseKind, SessionConfig};
//!
//! let mut session = GameSession::new(SessionConfig::new(7));
//! session.start();
//!
//! // dealer holds 17 tiles and owes a discard (or a self-draw decision)
//! assert_eq!(session.turn(), 0);
//! assert_eq!(session.hand(0).unwrap().committed_count(), 17);
//! assert!(matches!(
//!     session.phase_kind(),
//!     PhaseKind::AwaitingDiscard | PhaseKind::SelfDrawDecision
//! ));
//! assert_eq!(session.wall_remaining(), 136 - 4 * 16 - 1);
//! ```

use std::collections::VecDeque;
use std::mem;

use log::{debug, error, info, warn};

use crate::action_group::{partition_reactions, ActionGroup};
use crate::error::{ActionError, HandError, LayoutError};
use crate::event::{Notification, SeatCommand, SeatEvent};
use crate::hand::Hand;
use crate::resolver::{legal_reactions, self_draw_options};
use crate::snapshot::{PhaseKind, SeatView};
use crate::ting::detect_ting;
use crate::types::{
    next_seat, ActionChoice, HandOutcome, Meld, Seat, Tier, Tile, WinSource, COPIES_PER_TILE,
    HAND_SIZE, SEATS, TILE_KINDS,
};
use crate::wall::Wall;
use crate::win::winning_shape;

/// Per-hand configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    /// Wall shuffle seed
    pub seed: u64,
    /// Seat that draws first
    pub dealer: Seat,
}

impl SessionConfig {
    pub fn new(seed: u64) -> Self {
        Self { seed, dealer: 0 }
    }

    pub fn with_dealer(mut self, dealer: Seat) -> Self {
        self.dealer = dealer;
        self
    }
}

/// Explicit deal for scripted hands and tests.
///
/// Each seat commits 13 or 16 tiles (melds count three per set); the wall is
/// drawn front first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableLayout {
    pub hands: [Vec<Tile>; SEATS],
    pub melds: [Vec<Meld>; SEATS],
    pub wall: Vec<Tile>,
}

impl TableLayout {
    pub fn new(hands: [Vec<Tile>; SEATS], wall: Vec<Tile>) -> Self {
        Self {
            hands,
            melds: Default::default(),
            wall,
        }
    }

    pub fn with_melds(mut self, seat: Seat, melds: Vec<Meld>) -> Self {
        if let Some(slot) = self.melds.get_mut(seat) {
            *slot = melds;
        }
        self
    }
}

#[derive(Debug, Clone)]
struct ReactionWindow {
    discard: Tile,
    discarder: Seat,
    current: ActionGroup,
    queue: VecDeque<ActionGroup>,
}

#[derive(Debug, Clone)]
enum Phase {
    NotStarted,
    SelfDrawDecision { group: ActionGroup, drawn: Tile },
    AwaitingDiscard,
    ReactionWindow(ReactionWindow),
    Finished(HandOutcome),
}

/// One hand of play
#[derive(Debug, Clone)]
pub struct GameSession {
    config: SessionConfig,
    hands: [Hand; SEATS],
    wall: Wall,
    sea: Vec<Tile>,
    turn: Seat,
    phase: Phase,
    /// Hands already hold their starting tiles (scripted layouts)
    dealt: bool,
    outbox: Vec<Notification>,
}

impl GameSession {
    /// Fresh hand with a shuffled 136-tile wall
    pub fn new(config: SessionConfig) -> Self {
        let config = SessionConfig {
            dealer: config.dealer % SEATS,
            ..config
        };
        Self {
            config,
            hands: Default::default(),
            wall: Wall::shuffled(config.seed),
            sea: Vec::new(),
            turn: config.dealer,
            phase: Phase::NotStarted,
            dealt: false,
            outbox: Vec::new(),
        }
    }

    /// Hand with an explicit deal; `start()` skips dealing
    pub fn from_layout(config: SessionConfig, layout: TableLayout) -> Result<Self, LayoutError> {
        if config.dealer >= SEATS {
            return Err(LayoutError::InvalidDealer(config.dealer));
        }

        let mut counts = [0usize; TILE_KINDS];
        let mut hands: [Hand; SEATS] = Default::default();
        for seat in 0..SEATS {
            let hand = Hand::with_melds(&layout.hands[seat], &layout.melds[seat])
                .map_err(|source| LayoutError::Hand { seat, source })?;
            let committed = hand.committed_count();
            if committed != 13 && committed != HAND_SIZE {
                return Err(LayoutError::HandSize {
                    seat,
                    count: committed,
                });
            }
            for tile in hand.concealed() {
                counts[tile.index()] += 1;
            }
            for meld in hand.melds() {
                for tile in meld.tiles() {
                    counts[tile.index()] += 1;
                }
            }
            hands[seat] = hand;
        }
        for tile in &layout.wall {
            counts[tile.index()] += 1;
        }
        if let Some(tile) = Tile::all().find(|t| counts[t.index()] > COPIES_PER_TILE as usize) {
            return Err(LayoutError::TooManyCopies {
                tile,
                count: counts[tile.index()],
            });
        }

        Ok(Self {
            config,
            hands,
            wall: Wall::from_tiles(layout.wall),
            sea: Vec::new(),
            turn: config.dealer,
            phase: Phase::NotStarted,
            dealt: true,
            outbox: Vec::new(),
        })
    }

    /// Deal (unless scripted) and let the dealer draw
    pub fn start(&mut self) {
        if !matches!(self.phase, Phase::NotStarted) {
            warn!("start ignored: hand already running");
            return;
        }
        if !self.dealt {
            self.deal();
        }
        info!(
            "hand started, dealer seat {}, {} tiles in wall",
            self.config.dealer,
            self.wall.remaining()
        );
        self.emit(Notification::HandStarted {
            dealer: self.config.dealer,
            wall_remaining: self.wall.remaining(),
        });
        self.draw_for(self.config.dealer, false);
    }

    fn deal(&mut self) {
        for _ in 0..HAND_SIZE {
            for offset in 0..SEATS {
                let seat = (self.config.dealer + offset) % SEATS;
                let Some(tile) = self.wall.draw() else {
                    error!("wall ran out while dealing");
                    return;
                };
                if let Err(e) = self.hands[seat].add_tile(tile) {
                    error!("deal to seat {} failed: {}", seat, e);
                }
            }
        }
        self.dealt = true;
    }

    /// Apply one seat event
    pub fn handle(&mut self, event: SeatEvent) -> Result<(), ActionError> {
        let seat = event.seat;
        if seat >= SEATS {
            return Err(ActionError::InvalidSeat(seat));
        }
        match self.phase {
            Phase::NotStarted => return Err(ActionError::NotStarted),
            Phase::Finished(_) => return Err(ActionError::HandOver),
            _ => {}
        }
        match event.command {
            SeatCommand::Discard(tile) => self.discard(seat, tile),
            SeatCommand::Respond(choice) => self.respond(seat, choice),
        }
    }

    fn discard(&mut self, seat: Seat, tile: Tile) -> Result<(), ActionError> {
        match &self.phase {
            Phase::ReactionWindow(_) => return Err(ActionError::ReactionPending),
            Phase::AwaitingDiscard | Phase::SelfDrawDecision { .. } if seat == self.turn => {}
            _ => return Err(ActionError::NotYourTurn(seat)),
        }
        if let Phase::SelfDrawDecision { .. } = self.phase {
            debug!("seat {} discards instead of declaring", seat);
        }
        self.hands[seat]
            .remove_tile(tile)
            .map_err(|_| ActionError::TileNotHeld { seat, tile })?;

        self.sea.push(tile);
        info!("seat {} discards {}", seat, tile);
        self.emit(Notification::Discarded { seat, tile });
        self.log_ting(seat);

        let reactions = legal_reactions(&self.hands, tile, seat, next_seat(seat));
        let mut queue = partition_reactions(&reactions);
        match queue.pop_front() {
            Some(current) => {
                debug!(
                    "{} draws {} reaction(s) across {} tier(s)",
                    tile,
                    reactions.len(),
                    queue.len() + 1
                );
                self.phase = Phase::ReactionWindow(ReactionWindow {
                    discard: tile,
                    discarder: seat,
                    current,
                    queue,
                });
                self.broadcast_state();
                self.send_offers();
            }
            None => self.advance_turn(seat),
        }
        Ok(())
    }

    fn respond(&mut self, seat: Seat, choice: ActionChoice) -> Result<(), ActionError> {
        match &mut self.phase {
            Phase::SelfDrawDecision { group, .. } => {
                if seat != self.turn || !group.is_pending(seat) {
                    return Err(ActionError::NotEligible(seat));
                }
                if !group.allows(seat, choice) {
                    return Err(ActionError::NotOffered { seat, choice });
                }
                self.resolve_self_draw(seat, choice)
            }
            Phase::ReactionWindow(window) => {
                if !window.current.is_pending(seat) {
                    return Err(ActionError::NotEligible(seat));
                }
                if !window.current.allows(seat, choice) {
                    return Err(ActionError::NotOffered { seat, choice });
                }
                if choice.is_pass() {
                    window.current.mark_passed(seat);
                    debug!("seat {} passes on {}", seat, window.discard);
                    if window.current.is_settled() {
                        self.next_tier();
                    }
                    return Ok(());
                }
                let discard = window.discard;
                let discarder = window.discarder;
                self.commit_claim(seat, choice, discard, discarder)
            }
            _ => Err(ActionError::NotEligible(seat)),
        }
    }

    fn resolve_self_draw(&mut self, seat: Seat, choice: ActionChoice) -> Result<(), ActionError> {
        match choice {
            ActionChoice::Pass => {
                debug!("seat {} passes on its self-draw options", seat);
                self.await_discard(seat);
                Ok(())
            }
            ActionChoice::Win => match winning_shape(&self.hands[seat]) {
                Some(shape) => {
                    self.finish(HandOutcome::Win {
                        winner: seat,
                        source: WinSource::SelfDraw,
                        shape,
                    });
                    Ok(())
                }
                None => {
                    warn!("seat {} declared a self-draw win it no longer holds", seat);
                    self.await_discard(seat);
                    Err(ActionError::Stale { seat, choice })
                }
            },
            ActionChoice::ConcealedKong(tile) => {
                let result = self.hands[seat].concealed_kong(tile);
                self.commit_self_kong(seat, choice, result)
            }
            ActionChoice::AddedKong(tile) => {
                let result = self.hands[seat].added_kong(tile);
                self.commit_self_kong(seat, choice, result)
            }
            _ => Err(ActionError::NotOffered { seat, choice }),
        }
    }

    fn commit_self_kong(
        &mut self,
        seat: Seat,
        choice: ActionChoice,
        result: Result<Meld, HandError>,
    ) -> Result<(), ActionError> {
        match result {
            Ok(meld) => {
                info!("seat {} declares {}", seat, choice);
                self.emit(Notification::ActionTaken { seat, choice, meld });
                self.draw_for(seat, true);
                Ok(())
            }
            Err(e) => {
                warn!("seat {} cannot declare {}: {}", seat, choice, e);
                self.await_discard(seat);
                Err(ActionError::Stale { seat, choice })
            }
        }
    }

    fn commit_claim(
        &mut self,
        seat: Seat,
        choice: ActionChoice,
        discard: Tile,
        discarder: Seat,
    ) -> Result<(), ActionError> {
        match choice {
            ActionChoice::Win => {
                let shape = self.hands[seat]
                    .with_tile(discard)
                    .and_then(|hand| winning_shape(&hand));
                let Some(shape) = shape else {
                    warn!("seat {} can no longer win on {}", seat, discard);
                    return self.abandon_tier(seat, choice);
                };
                self.take_from_sea(discard);
                if let Err(e) = self.hands[seat].add_tile(discard) {
                    error!("seat {} cannot take winning {}: {}", seat, discard, e);
                }
                self.finish(HandOutcome::Win {
                    winner: seat,
                    source: WinSource::Discard { from: discarder },
                    shape,
                });
                Ok(())
            }
            ActionChoice::Pong => {
                let result = self.hands[seat].pong(discard);
                self.commit_meld(seat, choice, discard, result)
            }
            ActionChoice::Kong => {
                let result = self.hands[seat].exposed_kong(discard);
                self.commit_meld(seat, choice, discard, result)
            }
            ActionChoice::Chow(a, b) => {
                let result = self.hands[seat].chow(discard, a, b);
                self.commit_meld(seat, choice, discard, result)
            }
            _ => Err(ActionError::NotOffered { seat, choice }),
        }
    }

    fn commit_meld(
        &mut self,
        seat: Seat,
        choice: ActionChoice,
        discard: Tile,
        result: Result<Meld, HandError>,
    ) -> Result<(), ActionError> {
        let meld = match result {
            Ok(meld) => meld,
            Err(e) => {
                warn!("seat {} cannot {} on {}: {}", seat, choice, discard, e);
                return self.abandon_tier(seat, choice);
            }
        };

        self.take_from_sea(discard);
        info!("seat {} claims {} with {}", seat, discard, choice);
        self.emit(Notification::ActionTaken { seat, choice, meld });
        if meld.is_quad() {
            self.draw_for(seat, true);
        } else {
            self.await_discard(seat);
        }
        Ok(())
    }

    /// Drop the current tier after a failed commit and keep play moving
    fn abandon_tier(&mut self, seat: Seat, choice: ActionChoice) -> Result<(), ActionError> {
        self.next_tier();
        Err(ActionError::Stale { seat, choice })
    }

    fn next_tier(&mut self) {
        let Phase::ReactionWindow(window) = &mut self.phase else {
            return;
        };
        match window.queue.pop_front() {
            Some(group) => {
                debug!("opening {:?} tier on {}", group.tier(), window.discard);
                window.current = group;
                self.send_offers();
            }
            None => {
                let discarder = window.discarder;
                debug!("nobody claims {}", window.discard);
                self.advance_turn(discarder);
            }
        }
    }

    fn advance_turn(&mut self, from: Seat) {
        self.draw_for(next_seat(from), false);
    }

    fn draw_for(&mut self, seat: Seat, replacement: bool) {
        self.turn = seat;
        let Some(tile) = self.wall.draw() else {
            info!("wall exhausted before seat {} could draw", seat);
            self.finish(HandOutcome::WallExhausted);
            return;
        };
        if let Err(e) = self.hands[seat].add_tile(tile) {
            error!("seat {} cannot take drawn {}: {}", seat, tile, e);
        }
        debug!(
            "seat {} draws {}{} ({} left)",
            seat,
            tile,
            if replacement { " as replacement" } else { "" },
            self.wall.remaining()
        );
        self.emit(Notification::TileDrawn {
            seat,
            tile,
            replacement,
        });

        let choices = self_draw_options(&self.hands[seat]);
        if choices.is_empty() {
            self.await_discard(seat);
            return;
        }
        let group = ActionGroup::self_draw(seat, &choices);
        debug!("seat {} may declare {:?}", seat, group.labels_for(seat));
        self.phase = Phase::SelfDrawDecision { group, drawn: tile };
        self.broadcast_state();
        self.send_offers();
    }

    fn await_discard(&mut self, seat: Seat) {
        self.turn = seat;
        self.phase = Phase::AwaitingDiscard;
        self.broadcast_state();
        self.emit(Notification::DiscardPrompt { seat });
    }

    fn finish(&mut self, outcome: HandOutcome) {
        match outcome {
            HandOutcome::Win {
                winner,
                source,
                shape,
            } => info!(
                "seat {} wins ({:?}, {})",
                winner,
                source,
                shape.as_str()
            ),
            HandOutcome::WallExhausted => info!("hand drawn: wall exhausted"),
        }
        self.phase = Phase::Finished(outcome);
        self.broadcast_state();
        self.emit(Notification::HandEnded { outcome });
    }

    fn take_from_sea(&mut self, tile: Tile) {
        match self.sea.last() {
            Some(&last) if last == tile => {
                self.sea.pop();
            }
            _ => error!("claimed {} is not the latest discard", tile),
        }
    }

    fn log_ting(&self, seat: Seat) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        let ting = detect_ting(&self.hands[seat]);
        if ting.is_ting() {
            let waits: Vec<&str> = ting.waiting_tiles().iter().map(|t| t.name()).collect();
            debug!("seat {} is ting, waiting on {:?}", seat, waits);
        }
    }

    fn send_offers(&mut self) {
        let (group, tile) = match &self.phase {
            Phase::SelfDrawDecision { group, drawn } => (group, *drawn),
            Phase::ReactionWindow(window) => (&window.current, window.discard),
            _ => return,
        };
        let offers: Vec<Notification> = group
            .seats()
            .map(|seat| Notification::ActionOffer {
                seat,
                tier: group.tier(),
                choices: group.choices_for(seat).to_vec(),
                tile,
            })
            .collect();
        self.outbox.extend(offers);
    }

    fn broadcast_state(&mut self) {
        for seat in 0..SEATS {
            if let Some(view) = self.snapshot_for(seat) {
                self.emit(Notification::StateSnapshot(view));
            }
        }
    }

    fn emit(&mut self, notification: Notification) {
        self.outbox.push(notification);
    }

    /// Take every notification produced since the last call, in order
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        mem::take(&mut self.outbox)
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn phase_kind(&self) -> PhaseKind {
        match &self.phase {
            Phase::NotStarted => PhaseKind::NotStarted,
            Phase::SelfDrawDecision { .. } => PhaseKind::SelfDrawDecision,
            Phase::AwaitingDiscard => PhaseKind::AwaitingDiscard,
            Phase::ReactionWindow(_) => PhaseKind::ReactionWindow,
            Phase::Finished(HandOutcome::WallExhausted) => PhaseKind::WallExhausted,
            Phase::Finished(_) => PhaseKind::HandComplete,
        }
    }

    /// Seat in turn (the discarder while a reaction window is open)
    pub fn turn(&self) -> Seat {
        self.turn
    }

    pub fn hand(&self, seat: Seat) -> Option<&Hand> {
        self.hands.get(seat)
    }

    pub fn sea(&self) -> &[Tile] {
        &self.sea
    }

    pub fn wall_remaining(&self) -> usize {
        self.wall.remaining()
    }

    /// Tile open for reactions and who discarded it
    pub fn pending_discard(&self) -> Option<(Tile, Seat)> {
        match &self.phase {
            Phase::ReactionWindow(window) => Some((window.discard, window.discarder)),
            _ => None,
        }
    }

    /// Group currently being negotiated (self-draw or reaction tier)
    pub fn current_offer(&self) -> Option<&ActionGroup> {
        match &self.phase {
            Phase::SelfDrawDecision { group, .. } => Some(group),
            Phase::ReactionWindow(window) => Some(&window.current),
            _ => None,
        }
    }

    /// Seats that still owe an answer to the current offer
    pub fn pending_seats(&self) -> Vec<Seat> {
        self.current_offer()
            .map(|group| group.pending_seats().to_vec())
            .unwrap_or_default()
    }

    /// Tiers queued behind the current reaction tier
    pub fn queued_tiers(&self) -> Vec<Tier> {
        match &self.phase {
            Phase::ReactionWindow(window) => window.queue.iter().map(|g| g.tier()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn outcome(&self) -> Option<HandOutcome> {
        match self.phase {
            Phase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }

    /// Physical tiles across hands, melds, sea and wall
    pub fn tiles_in_play(&self) -> usize {
        self.hands.iter().map(|h| h.physical_count()).sum::<usize>()
            + self.sea.len()
            + self.wall.remaining()
    }

    /// What `seat` may see right now
    pub fn snapshot_for(&self, seat: Seat) -> Option<SeatView> {
        let own = self.hands.get(seat)?;
        Some(SeatView {
            seat,
            turn: self.turn,
            phase: self.phase_kind(),
            concealed: own.concealed().to_vec(),
            melds: std::array::from_fn(|s| self.hands[s].melds().to_vec()),
            concealed_counts: std::array::from_fn(|s| self.hands[s].concealed_count()),
            sea: self.sea.clone(),
            wall_remaining: self.wall.remaining(),
            pending_discard: self.pending_discard().map(|(tile, _)| tile),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiles(names: &str) -> Vec<Tile> {
        names
            .split_whitespace()
            .map(|n| Tile::from_name(n).unwrap())
            .collect()
    }

    fn t(name: &str) -> Tile {
        Tile::from_name(name).unwrap()
    }

    // seat 3 wins on P5, seat 2 pongs it, seat 1 chows it
    fn contested_layout() -> TableLayout {
        TableLayout::new(
            [
                tiles("M1 M4 M7 P1 P4 P7 S1 S4 S7 EAST SOUTH WEST NORTH"),
                tiles("M2 M5 M8 P3 P4 P8 S2 S5 S8 RED GREEN WHITE EAST"),
                tiles("M3 M6 M9 P5 P5 P9 S3 S6 S9 RED GREEN WHITE SOUTH"),
                tiles("M1 M2 M3 S4 S5 S6 WEST WEST WEST P5 S7 S8 S9"),
            ],
            tiles("P5 M9 M9 P9"),
        )
    }

    fn started(layout: TableLayout) -> GameSession {
        let mut session = GameSession::from_layout(SessionConfig::default(), layout).unwrap();
        session.start();
        session
    }

    #[test]
    fn test_not_started_rejects_everything() {
        let mut session = GameSession::new(SessionConfig::new(1));
        assert_eq!(session.phase_kind(), PhaseKind::NotStarted);
        assert_eq!(
            session.handle(SeatEvent::discard(0, t("M1"))),
            Err(ActionError::NotStarted)
        );
    }

    #[test]
    fn test_start_deals_sixteen_and_dealer_draws() {
        let mut session = GameSession::new(SessionConfig::new(99).with_dealer(2));
        session.start();
        assert_eq!(session.turn(), 2);
        for seat in 0..SEATS {
            let expected = if seat == 2 { 17 } else { 16 };
            assert_eq!(session.hand(seat).unwrap().physical_count(), expected);
        }
        assert_eq!(session.tiles_in_play(), 136);

        let notes = session.drain_notifications();
        assert!(matches!(notes[0], Notification::HandStarted { dealer: 2, .. }));
        assert!(notes
            .iter()
            .any(|n| matches!(n, Notification::TileDrawn { seat: 2, replacement: false, .. })));
        assert!(session.drain_notifications().is_empty());
    }

    #[test]
    fn test_start_twice_is_ignored() {
        let mut session = started(contested_layout());
        let wall = session.wall_remaining();
        session.start();
        assert_eq!(session.wall_remaining(), wall);
    }

    #[test]
    fn test_stale_claim_falls_through_to_next_tier() {
        let mut session = started(contested_layout());
        session.handle(SeatEvent::discard(0, t("P5"))).unwrap();
        session.handle(SeatEvent::pass(3)).unwrap();
        assert_eq!(session.current_offer().map(|g| g.tier()), Some(Tier::Claim));

        // seat 2 loses a P5 between offer and response
        session.hands[2].remove_tile(t("P5")).unwrap();
        assert_eq!(
            session.handle(SeatEvent::respond(2, ActionChoice::Pong)),
            Err(ActionError::Stale {
                seat: 2,
                choice: ActionChoice::Pong
            })
        );
        assert_eq!(session.phase_kind(), PhaseKind::ReactionWindow);
        assert_eq!(session.current_offer().map(|g| g.tier()), Some(Tier::Chow));
        assert_eq!(session.pending_seats(), vec![1]);
        assert_eq!(session.sea(), &[t("P5")]);
    }

    #[test]
    fn test_stale_last_tier_advances_turn() {
        let mut session = started(contested_layout());
        session.handle(SeatEvent::discard(0, t("P5"))).unwrap();
        session.handle(SeatEvent::pass(3)).unwrap();
        session.handle(SeatEvent::pass(2)).unwrap();

        session.hands[1].remove_tile(t("P3")).unwrap();
        let choice = ActionChoice::Chow(t("P3"), t("P4"));
        assert!(matches!(
            session.handle(SeatEvent::respond(1, choice)),
            Err(ActionError::Stale { seat: 1, .. })
        ));
        assert_eq!(session.turn(), 1);
        assert_eq!(session.wall_remaining(), 2);
        assert_eq!(session.pending_discard(), None);
    }

    #[test]
    fn test_layout_rejects_fifth_copy() {
        let mut layout = contested_layout();
        layout.wall = tiles("WEST");
        assert_eq!(
            GameSession::from_layout(SessionConfig::default(), layout).err(),
            Some(LayoutError::TooManyCopies {
                tile: t("WEST"),
                count: 5
            })
        );
    }

    #[test]
    fn test_layout_rejects_bad_hand_size() {
        let mut layout = contested_layout();
        layout.hands[1].pop();
        assert_eq!(
            GameSession::from_layout(SessionConfig::default(), layout).err(),
            Some(LayoutError::HandSize { seat: 1, count: 12 })
        );
    }

    #[test]
    fn test_layout_rejects_bad_dealer() {
        let config = SessionConfig::default().with_dealer(4);
        assert_eq!(
            GameSession::from_layout(config, contested_layout()).err(),
            Some(LayoutError::InvalidDealer(4))
        );
    }
}
