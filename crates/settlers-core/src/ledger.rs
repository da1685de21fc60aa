//! Resource economy: the bank, transfers, production and trade ratios.
//!
//! Pure entry points (`transfer`, `bank_trade`) take snapshots and return new
//! ones. The `apply_*` and `distribute_*` variants write into values the
//! caller already owns, which is how the engine updates its draft state.

use crate::board::{Board, PlayerId, Port, Resource};
use crate::graph::BoardGraph;
use crate::player::{DevelopmentCard, Player, ResourceHand};
use crate::topology::VertexId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Cards of each resource in the bank, also its cap
pub const BANK_LIMIT: u32 = 19;

/// Bank trade rate without a port
pub const DEFAULT_TRADE_RATIO: u32 = 4;

/// Per-player resource amounts, ordered by seat
pub type Distribution = BTreeMap<PlayerId, ResourceHand>;

/// Resource supply and development card pile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub resources: ResourceHand,
    /// Drawn from the back
    pub development_cards: Vec<DevelopmentCard>,
}

impl Bank {
    /// A full bank over the given (already shuffled) deck
    pub fn new(development_cards: Vec<DevelopmentCard>) -> Self {
        Self {
            resources: ResourceHand::uniform(BANK_LIMIT),
            development_cards,
        }
    }

    pub fn supply(&self, resource: Resource) -> u32 {
        self.resources.get(resource)
    }

    pub fn draw_development_card(&mut self) -> Option<DevelopmentCard> {
        self.development_cards.pop()
    }

    fn deposit(&mut self, resource: Resource, amount: u32) {
        let held = self.resources.get(resource);
        self.resources
            .set(resource, (held + amount).min(BANK_LIMIT));
    }
}

/// One side of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Party {
    Bank,
    Player(PlayerId),
}

pub fn can_afford(hand: &ResourceHand, cost: &ResourceHand) -> bool {
    hand.can_afford(cost)
}

/// Move `amounts` from one party to another, returning new snapshots.
///
/// The giver is clamped at zero instead of failing and the bank never holds
/// more than [`BANK_LIMIT`], so callers check affordability first.
///
/// # Panics
/// Panics if a `Party::Player` id has no seat.
pub fn transfer(
    players: &[Player],
    bank: &Bank,
    from: Party,
    to: Party,
    amounts: &ResourceHand,
) -> (Vec<Player>, Bank) {
    let mut players = players.to_vec();
    let mut bank = bank.clone();
    apply_transfer(&mut players, &mut bank, from, to, amounts);
    (players, bank)
}

/// In-place form of [`transfer`].
pub fn apply_transfer(
    players: &mut [Player],
    bank: &mut Bank,
    from: Party,
    to: Party,
    amounts: &ResourceHand,
) {
    for (resource, amount) in amounts.iter() {
        match from {
            Party::Bank => {
                bank.resources.take(resource, amount);
            }
            Party::Player(id) => {
                players[id as usize].resources.take(resource, amount);
            }
        }
        match to {
            Party::Bank => bank.deposit(resource, amount),
            Party::Player(id) => players[id as usize].resources.add(resource, amount),
        }
    }
}

/// What each player is owed for a (non-seven) dice total.
///
/// Tiles with the robber or without a resource never produce. Cities count
/// double. Players owed nothing are absent from the map.
pub fn production_for_roll(graph: &BoardGraph, board: &Board, roll: u8) -> Distribution {
    let mut owed = Distribution::new();
    for tile in &board.tiles {
        if tile.number != Some(roll) || !tile.is_productive() {
            continue;
        }
        let Some(resource) = tile.resource() else {
            continue;
        };
        for &vertex in graph.tile_vertices(tile.id) {
            let building = board.vertex(vertex).building;
            if let Some(owner) = building.owner() {
                owed.entry(owner)
                    .or_default()
                    .add(resource, building.resource_multiplier());
            }
        }
    }
    owed
}

/// Pay `owed` out of the bank and return what was actually paid.
///
/// When the bank cannot cover everyone's claim on a resource, that resource
/// is paid only if a single player claims it (they get what is left);
/// otherwise nobody receives it.
pub fn distribute_production(
    players: &mut [Player],
    bank: &mut Bank,
    owed: &Distribution,
) -> Distribution {
    let mut paid = Distribution::new();
    for resource in Resource::ALL {
        let claims: Vec<(PlayerId, u32)> = owed
            .iter()
            .map(|(&p, hand)| (p, hand.get(resource)))
            .filter(|(_, n)| *n > 0)
            .collect();
        let demand: u32 = claims.iter().map(|(_, n)| n).sum();
        if demand == 0 {
            continue;
        }

        let supply = bank.supply(resource);
        let payouts: Vec<(PlayerId, u32)> = if demand <= supply {
            claims
        } else if claims.len() == 1 {
            vec![(claims[0].0, supply)]
        } else {
            debug!(?resource, demand, supply, "bank short, production withheld");
            Vec::new()
        };

        for (player, amount) in payouts {
            if amount == 0 {
                continue;
            }
            let hand = ResourceHand::single(resource, amount);
            apply_transfer(players, bank, Party::Bank, Party::Player(player), &hand);
            paid.entry(player).or_default().add(resource, amount);
        }
    }
    paid
}

/// Cards `player` must give the bank for one `resource`.
///
/// 2 with a port for that resource, 3 with any generic port, else 4.
pub fn trade_ratio(board: &Board, player: PlayerId, resource: Resource) -> u32 {
    let ports = board.ports_of(player);
    if ports.contains(&Port::Specific(resource)) {
        Port::Specific(resource).rate()
    } else if ports.contains(&Port::Generic) {
        Port::Generic.rate()
    } else {
        DEFAULT_TRADE_RATIO
    }
}

/// Trade `ratio` of `give` for one `receive`.
///
/// `None` when the player cannot pay, the bank has no `receive` left, or
/// both sides name the same resource.
pub fn bank_trade(
    player: &Player,
    bank: &Bank,
    give: Resource,
    receive: Resource,
    ratio: u32,
) -> Option<(Player, Bank)> {
    if give == receive || player.resources.get(give) < ratio || bank.supply(receive) == 0 {
        return None;
    }
    let mut player = player.clone();
    let mut bank = bank.clone();
    player.resources.take(give, ratio);
    bank.deposit(give, ratio);
    bank.resources.take(receive, 1);
    player.resources.add(receive, 1);
    Some((player, bank))
}

/// Second-round setup handout: one card per productive tile around `vertex`,
/// paid to `player` while the bank has it.
pub fn initial_handout(
    graph: &BoardGraph,
    board: &Board,
    players: &mut [Player],
    bank: &mut Bank,
    player: PlayerId,
    vertex: VertexId,
) -> ResourceHand {
    let mut given = ResourceHand::new();
    for &tile in graph.vertex_tiles(vertex) {
        let tile = board.tile(tile);
        let Some(resource) = tile.resource().filter(|_| tile.is_productive()) else {
            continue;
        };
        if given.get(resource) >= bank.supply(resource) {
            continue;
        }
        given.add(resource, 1);
    }
    apply_transfer(players, bank, Party::Bank, Party::Player(player), &given);
    given
}
