//! Action groups - one tier of multi-seat negotiation
//!
//! An [`ActionGroup`] maps each implicated seat to the choices it may pick
//! (always including `Pass`) and tracks which seats still owe an answer.

use std::collections::VecDeque;

use arrayvec::ArrayVec;

use crate::resolver::Reaction;
use crate::types::{ActionChoice, Seat, Tier, SEATS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionGroup {
    tier: Tier,
    offers: [Vec<ActionChoice>; SEATS],
    pending: [bool; SEATS],
}

impl ActionGroup {
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            offers: Default::default(),
            pending: [false; SEATS],
        }
    }

    /// Priority-0 offer for the seat in turn after its draw
    pub fn self_draw(seat: Seat, choices: &[ActionChoice]) -> Self {
        let mut group = Self::new(Tier::SelfDraw);
        for &choice in choices {
            group.offer(seat, choice);
        }
        group.offer(seat, ActionChoice::Pass);
        group
    }

    /// Add a choice for `seat`; duplicates are ignored
    pub fn offer(&mut self, seat: Seat, choice: ActionChoice) {
        if seat >= SEATS {
            return;
        }
        let choices = &mut self.offers[seat];
        if !choices.contains(&choice) {
            choices.push(choice);
        }
        self.pending[seat] = true;
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn priority(&self) -> u8 {
        self.tier.priority()
    }

    /// Seats with an offer in this group, in seat order
    pub fn seats(&self) -> impl Iterator<Item = Seat> + '_ {
        (0..SEATS).filter(move |&s| !self.offers[s].is_empty())
    }

    pub fn choices_for(&self, seat: Seat) -> &[ActionChoice] {
        self.offers.get(seat).map(|c| c.as_slice()).unwrap_or(&[])
    }

    pub fn labels_for(&self, seat: Seat) -> Vec<String> {
        self.choices_for(seat).iter().map(|c| c.label()).collect()
    }

    pub fn allows(&self, seat: Seat, choice: ActionChoice) -> bool {
        self.choices_for(seat).contains(&choice)
    }

    pub fn is_pending(&self, seat: Seat) -> bool {
        self.pending.get(seat).copied().unwrap_or(false)
    }

    pub fn pending_seats(&self) -> ArrayVec<Seat, SEATS> {
        (0..SEATS).filter(|&s| self.pending[s]).collect()
    }

    pub fn mark_passed(&mut self, seat: Seat) {
        if let Some(p) = self.pending.get_mut(seat) {
            *p = false;
        }
    }

    /// Every implicated seat has passed
    pub fn is_settled(&self) -> bool {
        self.pending.iter().all(|p| !p)
    }

    pub fn is_empty(&self) -> bool {
        self.offers.iter().all(|c| c.is_empty())
    }
}

/// Split sorted reactions into non-empty tiers, highest priority first.
///
/// Every implicated seat also gets `Pass`.
pub fn partition_reactions(reactions: &[Reaction]) -> VecDeque<ActionGroup> {
    let mut groups: VecDeque<ActionGroup> = VecDeque::new();
    for reaction in reactions {
        let tier = Tier::for_action(reaction.kind());
        let needs_new = groups.back().map(|g| g.tier() != tier).unwrap_or(true);
        if needs_new {
            groups.push_back(ActionGroup::new(tier));
        }
        if let Some(group) = groups.back_mut() {
            group.offer(reaction.seat, reaction.choice);
        }
    }
    for group in groups.iter_mut() {
        let seats: ArrayVec<Seat, SEATS> = group.seats().collect();
        for seat in seats {
            group.offer(seat, ActionChoice::Pass);
        }
    }
    groups.make_contiguous().sort_by_key(|g| g.priority());
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tile;

    fn reaction(seat: Seat, choice: ActionChoice) -> Reaction {
        Reaction { seat, choice }
    }

    #[test]
    fn test_self_draw_group_always_has_pass() {
        let group = ActionGroup::self_draw(2, &[ActionChoice::Win]);
        assert_eq!(group.tier(), Tier::SelfDraw);
        assert_eq!(group.labels_for(2), vec!["HU".to_string(), "PASS".to_string()]);
        assert!(group.is_pending(2));
        assert!(!group.is_pending(0));
    }

    #[test]
    fn test_partition_keeps_tiers_ordered() {
        let m2 = Tile::from_name("M2").unwrap();
        let m3 = Tile::from_name("M3").unwrap();
        let reactions = [
            reaction(3, ActionChoice::Win),
            reaction(2, ActionChoice::Kong),
            reaction(2, ActionChoice::Pong),
            reaction(1, ActionChoice::Chow(m2, m3)),
        ];
        let groups = partition_reactions(&reactions);
        let tiers: Vec<Tier> = groups.iter().map(|g| g.tier()).collect();
        assert_eq!(tiers, vec![Tier::Win, Tier::Claim, Tier::Chow]);
        assert_eq!(
            groups[1].choices_for(2),
            &[ActionChoice::Kong, ActionChoice::Pong, ActionChoice::Pass]
        );
        assert_eq!(groups[2].pending_seats().as_slice(), &[1]);
    }

    #[test]
    fn test_two_seats_in_one_tier() {
        let reactions = [reaction(1, ActionChoice::Win), reaction(3, ActionChoice::Win)];
        let mut groups = partition_reactions(&reactions);
        assert_eq!(groups.len(), 1);
        let mut group = groups.pop_front().unwrap();
        assert_eq!(group.pending_seats().as_slice(), &[1, 3]);
        group.mark_passed(1);
        assert!(!group.is_settled());
        group.mark_passed(3);
        assert!(group.is_settled());
        // offers survive passing
        assert!(group.allows(3, ActionChoice::Win));
    }

    #[test]
    fn test_empty_reactions_make_no_groups() {
        assert!(partition_reactions(&[]).is_empty());
        assert!(ActionGroup::new(Tier::Chow).is_empty());
    }
}
