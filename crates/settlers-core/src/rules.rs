//! Stateless legality checks.
//!
//! Each check returns `Ok(())` or the [`RuleViolation`] that blocks the move.
//! Turn order, phase and cost are the engine's concern, not these checks'.

use crate::board::{Board, PlayerId, VertexBuilding};
use crate::graph::BoardGraph;
use crate::player::{DevelopmentCard, Player, ResourceHand};
use crate::topology::{EdgeId, TileId, VertexId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a move is illegal
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RuleViolation {
    #[error("Vertex {0} is already occupied")]
    VertexOccupied(VertexId),

    #[error("Vertex {0} is next to another building")]
    TooCloseToBuilding(VertexId),

    #[error("Vertex {0} is not reached by your roads")]
    VertexNotConnected(VertexId),

    #[error("Vertex {0} has no building")]
    VertexUnoccupied(VertexId),

    #[error("Edge {0} already has a road")]
    EdgeOccupied(EdgeId),

    #[error("Edge {0} does not connect to your roads or buildings")]
    EdgeNotConnected(EdgeId),

    #[error("Edge {edge} does not touch vertex {vertex}")]
    EdgeNotAtVertex { edge: EdgeId, vertex: VertexId },

    #[error("Vertex {0} is not your settlement")]
    NotYourSettlement(VertexId),

    #[error("Vertex {0} is already a city")]
    AlreadyCity(VertexId),

    #[error("No playable {0:?} card in hand")]
    CardNotHeld(DevelopmentCard),

    #[error("Victory point cards cannot be played")]
    CardNotPlayable,

    #[error("A development card was already played this turn")]
    CardAlreadyPlayed,

    #[error("No discard is required")]
    DiscardNotRequired,

    #[error("Must discard exactly {required} cards, got {given}")]
    WrongDiscardCount { required: u32, given: u32 },

    #[error("Cannot discard cards you do not hold")]
    DiscardNotHeld,

    #[error("The robber is already on tile {0}")]
    RobberNotMoved(TileId),

    #[error("Player {victim} has nothing to lose on tile {tile}")]
    InvalidVictim { victim: PlayerId, tile: TileId },
}

/// Legality predicates over a board graph
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator {
    graph: BoardGraph,
}

impl RuleValidator {
    pub fn new(graph: BoardGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &BoardGraph {
        &self.graph
    }

    // ==================== Placement ====================

    /// Empty vertex, distance rule, and (during setup) nothing else or
    /// (afterwards) one of the player's roads ending there.
    pub fn check_settlement(
        &self,
        board: &Board,
        player: PlayerId,
        vertex: VertexId,
        setup: bool,
    ) -> Result<(), RuleViolation> {
        if board.vertex_owner(vertex).is_some() {
            return Err(RuleViolation::VertexOccupied(vertex));
        }
        if !self.graph.satisfies_distance_rule(board, vertex) {
            return Err(RuleViolation::TooCloseToBuilding(vertex));
        }
        if !setup && !self.graph.has_road_at(board, player, vertex) {
            return Err(RuleViolation::VertexNotConnected(vertex));
        }
        Ok(())
    }

    /// Empty edge with an endpoint the player owns or reaches by road
    pub fn check_road(
        &self,
        board: &Board,
        player: PlayerId,
        edge: EdgeId,
    ) -> Result<(), RuleViolation> {
        if board.edge_owner(edge).is_some() {
            return Err(RuleViolation::EdgeOccupied(edge));
        }
        let connected = self.graph.edge_vertices(edge).iter().any(|&v| {
            board.vertex_owner(v) == Some(player) || self.graph.has_road_at(board, player, v)
        });
        if !connected {
            return Err(RuleViolation::EdgeNotConnected(edge));
        }
        Ok(())
    }

    /// Setup road: empty and touching the settlement just placed
    pub fn check_setup_road(
        &self,
        board: &Board,
        vertex: VertexId,
        edge: EdgeId,
    ) -> Result<(), RuleViolation> {
        if !self.graph.edge_touches_vertex(edge, vertex) {
            return Err(RuleViolation::EdgeNotAtVertex { edge, vertex });
        }
        if board.edge_owner(edge).is_some() {
            return Err(RuleViolation::EdgeOccupied(edge));
        }
        Ok(())
    }

    /// The player's own settlement
    pub fn check_city(
        &self,
        board: &Board,
        player: PlayerId,
        vertex: VertexId,
    ) -> Result<(), RuleViolation> {
        match board.vertex(vertex).building {
            VertexBuilding::Settlement(owner) if owner == player => Ok(()),
            VertexBuilding::City(owner) if owner == player => {
                Err(RuleViolation::AlreadyCity(vertex))
            }
            _ => Err(RuleViolation::NotYourSettlement(vertex)),
        }
    }

    // ==================== Cards ====================

    /// In the playable hand, not a victory point, nothing played yet this turn
    pub fn check_development_card(
        &self,
        player: &Player,
        card: DevelopmentCard,
    ) -> Result<(), RuleViolation> {
        if !card.is_playable() {
            return Err(RuleViolation::CardNotPlayable);
        }
        if player.dev_card_played_this_turn.is_some() {
            return Err(RuleViolation::CardAlreadyPlayed);
        }
        if !player.has_playable_dev_card(card) {
            return Err(RuleViolation::CardNotHeld(card));
        }
        Ok(())
    }

    // ==================== Discards ====================

    /// A hand larger than `limit` must discard
    pub fn must_discard(&self, hand: &ResourceHand, limit: u32) -> bool {
        hand.total() > limit
    }

    /// Half the hand, rounded down
    pub fn required_discard(&self, hand: &ResourceHand) -> u32 {
        hand.total() / 2
    }

    pub fn check_discard(
        &self,
        hand: &ResourceHand,
        discard: &ResourceHand,
        limit: u32,
    ) -> Result<(), RuleViolation> {
        if !self.must_discard(hand, limit) {
            return Err(RuleViolation::DiscardNotRequired);
        }
        let required = self.required_discard(hand);
        if discard.total() != required {
            return Err(RuleViolation::WrongDiscardCount {
                required,
                given: discard.total(),
            });
        }
        if !hand.can_afford(discard) {
            return Err(RuleViolation::DiscardNotHeld);
        }
        Ok(())
    }

    // ==================== Robber ====================

    pub fn check_robber_move(&self, board: &Board, tile: TileId) -> Result<(), RuleViolation> {
        if board.robber == tile {
            return Err(RuleViolation::RobberNotMoved(tile));
        }
        Ok(())
    }

    /// The victim must be someone else with a building on the tile
    pub fn check_robber_victim(
        &self,
        board: &Board,
        thief: PlayerId,
        victim: PlayerId,
        tile: TileId,
    ) -> Result<(), RuleViolation> {
        if victim == thief || !self.graph.players_on_tile(board, tile).contains(&victim) {
            return Err(RuleViolation::InvalidVictim { victim, tile });
        }
        Ok(())
    }
}
