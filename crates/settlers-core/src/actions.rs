//! Actions players submit to the engine.

use crate::board::{PlayerId, Resource};
use crate::player::ResourceHand;
use crate::topology::{EdgeId, TileId, VertexId};
use serde::{Deserialize, Serialize};

/// Everything a player can ask the engine to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ==================== Setup Phase ====================
    /// Settlement plus the road leading away from it
    PlaceInitialSettlementAndRoad { vertex: VertexId, edge: EdgeId },

    // ==================== Turn Actions ====================
    RollDice,

    /// After a seven, by each player holding too many cards
    DiscardCards(ResourceHand),

    /// After a seven or a knight. The victim, if named, must have a building
    /// on the new tile.
    MoveRobber {
        tile: TileId,
        steal_from: Option<PlayerId>,
    },

    // ==================== Building ====================
    BuildRoad(EdgeId),
    BuildSettlement(VertexId),
    /// Upgrade one of your settlements
    BuildCity(VertexId),
    BuyDevelopmentCard,

    // ==================== Development Cards ====================
    PlayKnight,
    /// Two free roads, placed in order
    PlayRoadBuilding(EdgeId, EdgeId),
    PlayYearOfPlenty(Resource, Resource),
    PlayMonopoly(Resource),

    // ==================== Trading ====================
    /// Trade with the bank at the player's best port rate
    BankTrade { give: Resource, receive: Resource },
    ProposeTrade(TradeOffer),
    AcceptTrade,
    CancelTrade,

    // ==================== Turn Management ====================
    EndTurn,
}

/// A trade offer between players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOffer {
    pub from: PlayerId,
    /// Specific player to trade with, or None for an open offer
    pub to: Option<PlayerId>,
    pub offering: ResourceHand,
    pub requesting: ResourceHand,
}

impl TradeOffer {
    pub fn new(
        from: PlayerId,
        to: Option<PlayerId>,
        offering: ResourceHand,
        requesting: ResourceHand,
    ) -> Self {
        Self {
            from,
            to,
            offering,
            requesting,
        }
    }

    /// Both sides non-empty and not addressed to the proposer
    pub fn is_valid(&self) -> bool {
        !self.offering.is_empty() && !self.requesting.is_empty() && self.to != Some(self.from)
    }

    /// Whether `player` may accept
    pub fn is_open_to(&self, player: PlayerId) -> bool {
        player != self.from && self.to.map_or(true, |to| to == player)
    }
}
