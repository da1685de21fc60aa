//! Player state and resource hands.
//!
//! This module contains:
//! - `ResourceHand`, a fixed five-slot resource count
//! - Development card types and the standard deck
//! - Building costs
//! - `Player`, one seat's pieces, cards and score

use crate::board::{PlayerId, Resource};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Starting pieces per player
pub const SETTLEMENT_PIECES: u32 = 5;
pub const CITY_PIECES: u32 = 4;
pub const ROAD_PIECES: u32 = 15;

/// Development card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DevelopmentCard {
    /// Move the robber; counts toward Largest Army
    Knight,
    /// Hidden point, never played
    VictoryPoint,
    /// Two free roads
    RoadBuilding,
    /// Two resources from the bank
    YearOfPlenty,
    /// Every opponent hands over one resource kind
    Monopoly,
}

impl DevelopmentCard {
    /// The 25-card deck, unshuffled
    pub fn standard_deck() -> Vec<DevelopmentCard> {
        let counts = [
            (DevelopmentCard::Knight, 14),
            (DevelopmentCard::VictoryPoint, 5),
            (DevelopmentCard::RoadBuilding, 2),
            (DevelopmentCard::YearOfPlenty, 2),
            (DevelopmentCard::Monopoly, 2),
        ];
        counts
            .into_iter()
            .flat_map(|(card, n)| std::iter::repeat(card).take(n))
            .collect()
    }

    pub fn shuffled_deck<R: Rng>(rng: &mut R) -> Vec<DevelopmentCard> {
        let mut deck = Self::standard_deck();
        deck.shuffle(rng);
        deck
    }

    /// Victory point cards are never played
    pub fn is_playable(&self) -> bool {
        !matches!(self, DevelopmentCard::VictoryPoint)
    }
}

/// A count per resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHand {
    pub brick: u32,
    pub lumber: u32,
    pub ore: u32,
    pub grain: u32,
    pub wool: u32,
}

impl ResourceHand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amounts(brick: u32, lumber: u32, ore: u32, grain: u32, wool: u32) -> Self {
        Self {
            brick,
            lumber,
            ore,
            grain,
            wool,
        }
    }

    /// The same amount of every resource
    pub fn uniform(amount: u32) -> Self {
        Self::with_amounts(amount, amount, amount, amount, amount)
    }

    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    pub fn total(&self) -> u32 {
        self.brick + self.lumber + self.ore + self.grain + self.wool
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Brick => self.brick,
            Resource::Lumber => self.lumber,
            Resource::Ore => self.ore,
            Resource::Grain => self.grain,
            Resource::Wool => self.wool,
        }
    }

    fn slot(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Brick => &mut self.brick,
            Resource::Lumber => &mut self.lumber,
            Resource::Ore => &mut self.ore,
            Resource::Grain => &mut self.grain,
            Resource::Wool => &mut self.wool,
        }
    }

    pub fn set(&mut self, resource: Resource, count: u32) {
        *self.slot(resource) = count;
    }

    pub fn add(&mut self, resource: Resource, amount: u32) {
        *self.slot(resource) += amount;
    }

    /// Remove up to `amount`, stopping at zero. Returns how many were removed.
    pub fn take(&mut self, resource: Resource, amount: u32) -> u32 {
        let slot = self.slot(resource);
        let taken = amount.min(*slot);
        *slot -= taken;
        taken
    }

    pub fn add_hand(&mut self, other: &ResourceHand) {
        for r in Resource::ALL {
            self.add(r, other.get(r));
        }
    }

    /// Subtract `other`, clamping every slot at zero
    pub fn saturating_sub_hand(&mut self, other: &ResourceHand) {
        for r in Resource::ALL {
            self.take(r, other.get(r));
        }
    }

    /// Holds at least `cost` of every resource
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        Resource::ALL.iter().all(|&r| self.get(r) >= cost.get(r))
    }

    /// Non-zero entries in `Resource::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .filter(|(_, n)| *n > 0)
    }

    /// Pick one card uniformly at random, without removing it
    pub fn random_card<R: Rng>(&self, rng: &mut R) -> Option<Resource> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let mut pick = rng.gen_range(0..total);
        for (resource, count) in self.iter() {
            if pick < count {
                return Some(resource);
            }
            pick -= count;
        }
        None
    }
}

/// Building costs
pub mod costs {
    use super::ResourceHand;

    /// 1 brick, 1 lumber
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// 1 brick, 1 lumber, 1 grain, 1 wool
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 1, 1)
    }

    /// 3 ore, 2 grain
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 3, 2, 0)
    }

    /// 1 ore, 1 grain, 1 wool
    pub fn development_card() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 1, 1, 1)
    }
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub resources: ResourceHand,
    /// Cards that may be played this turn
    pub dev_cards: Vec<DevelopmentCard>,
    /// Bought this turn; playable from the next turn
    pub dev_cards_bought_this_turn: Vec<DevelopmentCard>,
    /// At most one card per turn
    pub dev_card_played_this_turn: Option<DevelopmentCard>,
    pub knights_played: u32,
    /// Public points: buildings plus Longest Road / Largest Army bonuses
    pub victory_points: u32,
    /// Last computed longest road
    pub longest_road_length: u32,
    pub settlements_remaining: u32,
    pub cities_remaining: u32,
    pub roads_remaining: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            resources: ResourceHand::new(),
            dev_cards: Vec::new(),
            dev_cards_bought_this_turn: Vec::new(),
            dev_card_played_this_turn: None,
            knights_played: 0,
            victory_points: 0,
            longest_road_length: 0,
            settlements_remaining: SETTLEMENT_PIECES,
            cities_remaining: CITY_PIECES,
            roads_remaining: ROAD_PIECES,
        }
    }

    /// Victory point cards held, bought this turn included
    pub fn hidden_victory_points(&self) -> u32 {
        self.dev_cards
            .iter()
            .chain(&self.dev_cards_bought_this_turn)
            .filter(|c| matches!(c, DevelopmentCard::VictoryPoint))
            .count() as u32
    }

    /// Public points plus hidden cards
    pub fn total_victory_points(&self) -> u32 {
        self.victory_points + self.hidden_victory_points()
    }

    pub fn has_playable_dev_card(&self, card: DevelopmentCard) -> bool {
        self.dev_cards.contains(&card)
    }

    /// Remove one copy of `card` from the playable hand
    pub fn remove_dev_card(&mut self, card: DevelopmentCard) -> bool {
        match self.dev_cards.iter().position(|c| *c == card) {
            Some(pos) => {
                self.dev_cards.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Called when this player's turn ends
    pub fn end_turn(&mut self) {
        self.dev_cards.append(&mut self.dev_cards_bought_this_turn);
        self.dev_card_played_this_turn = None;
    }
}
