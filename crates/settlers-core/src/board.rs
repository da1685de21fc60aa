//! Board entities and their mutable ownership overlay.
//!
//! This module contains:
//! - Resource, tile kind and port types
//! - `Tile`, `Vertex` and `Edge` as stored in a game snapshot
//! - `Board`, the per-game overlay indexed by topology ids
//!
//! Adjacency is never stored here; it lives in the shared
//! [`BoardTopology`](crate::topology::BoardTopology) and is queried through
//! [`BoardGraph`](crate::graph::BoardGraph).

use crate::topology::{EdgeId, TileId, VertexId};
use serde::{Deserialize, Serialize};

/// Seat index of a player (0-3)
pub type PlayerId = u8;

/// The five producible resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    Brick,
    Lumber,
    Ore,
    Grain,
    Wool,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Brick,
        Resource::Lumber,
        Resource::Ore,
        Resource::Grain,
        Resource::Wool,
    ];
}

/// What a tile is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Resource(Resource),
    Desert,
}

/// Maritime trade bonus attached to a pair of coastal vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Port {
    /// 3:1 any resource
    Generic,
    /// 2:1 for one resource
    Specific(Resource),
}

impl Port {
    /// How many cards must be given for one
    pub fn rate(&self) -> u32 {
        match self {
            Port::Generic => 3,
            Port::Specific(_) => 2,
        }
    }
}

/// Pip count of a production number: how many of the 36 dice outcomes hit it.
pub fn production_weight(number: u8) -> u8 {
    match number {
        2 | 12 => 1,
        3 | 11 => 2,
        4 | 10 => 3,
        5 | 9 => 4,
        6 | 8 => 5,
        _ => 0,
    }
}

/// A hex tile in a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileKind,
    /// Dice total that triggers production; always `None` on the desert
    pub number: Option<u8>,
    /// Pips for `number`, 0 on the desert
    pub weight: u8,
    pub has_robber: bool,
}

impl Tile {
    pub fn resource(&self) -> Option<Resource> {
        match self.kind {
            TileKind::Resource(r) => Some(r),
            TileKind::Desert => None,
        }
    }

    /// Produces on its number (not desert, not blocked by the robber)
    pub fn is_productive(&self) -> bool {
        self.resource().is_some() && !self.has_robber
    }
}

/// What stands on a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VertexBuilding {
    #[default]
    Empty,
    Settlement(PlayerId),
    City(PlayerId),
}

impl VertexBuilding {
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            VertexBuilding::Empty => None,
            VertexBuilding::Settlement(p) | VertexBuilding::City(p) => Some(*p),
        }
    }

    /// Resources per production (1 settlement, 2 city)
    pub fn resource_multiplier(&self) -> u32 {
        match self {
            VertexBuilding::Empty => 0,
            VertexBuilding::Settlement(_) => 1,
            VertexBuilding::City(_) => 2,
        }
    }
}

/// A building site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub building: VertexBuilding,
    pub port: Option<Port>,
}

impl Vertex {
    pub fn owner(&self) -> Option<PlayerId> {
        self.building.owner()
    }
}

/// A road site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub owner: Option<PlayerId>,
}

/// Generated tiles plus the ownership overlay of one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub tiles: Vec<Tile>,
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    /// Tile currently holding the robber
    pub robber: TileId,
    /// False when number placement had to put 6/8 next to 6/8
    pub balanced: bool,
}

impl Board {
    // ==================== Queries ====================

    /// # Panics
    /// Panics if `id` is not a tile of the board.
    pub fn tile(&self, id: TileId) -> &Tile {
        &self.tiles[id as usize]
    }

    /// # Panics
    /// Panics if `id` is not a vertex of the board.
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id as usize]
    }

    /// # Panics
    /// Panics if `id` is not an edge of the board.
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id as usize]
    }

    pub fn vertex_owner(&self, id: VertexId) -> Option<PlayerId> {
        self.vertex(id).owner()
    }

    pub fn edge_owner(&self, id: EdgeId) -> Option<PlayerId> {
        self.edge(id).owner
    }

    /// Ids of every edge owned by `player`
    pub fn roads_of(&self, player: PlayerId) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.owner == Some(player))
            .map(|e| e.id)
    }

    /// Ids of every settlement still owned as a settlement by `player`
    pub fn settlements_of(&self, player: PlayerId) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .filter(move |v| v.building == VertexBuilding::Settlement(player))
            .map(|v| v.id)
    }

    /// Ports reachable from `player`'s buildings
    pub fn ports_of(&self, player: PlayerId) -> Vec<Port> {
        self.vertices
            .iter()
            .filter(|v| v.owner() == Some(player))
            .filter_map(|v| v.port)
            .collect()
    }

    pub fn desert(&self) -> Option<TileId> {
        self.tiles
            .iter()
            .find(|t| t.kind == TileKind::Desert)
            .map(|t| t.id)
    }

    // ==================== Mutation ====================
    // Callers validate first; these only write the overlay.

    pub fn place_settlement(&mut self, vertex: VertexId, player: PlayerId) {
        self.vertices[vertex as usize].building = VertexBuilding::Settlement(player);
    }

    pub fn upgrade_to_city(&mut self, vertex: VertexId, player: PlayerId) {
        self.vertices[vertex as usize].building = VertexBuilding::City(player);
    }

    pub fn place_road(&mut self, edge: EdgeId, player: PlayerId) {
        self.edges[edge as usize].owner = Some(player);
    }

    pub fn move_robber(&mut self, tile: TileId) {
        let previous = self.robber as usize;
        self.tiles[previous].has_robber = false;
        self.tiles[tile as usize].has_robber = true;
        self.robber = tile;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_board() -> Board {
        Board {
            tiles: vec![
                Tile {
                    id: 0,
                    kind: TileKind::Desert,
                    number: None,
                    weight: 0,
                    has_robber: true,
                },
                Tile {
                    id: 1,
                    kind: TileKind::Resource(Resource::Ore),
                    number: Some(6),
                    weight: production_weight(6),
                    has_robber: false,
                },
            ],
            vertices: (0..3)
                .map(|id| Vertex {
                    id,
                    building: VertexBuilding::Empty,
                    port: (id == 2).then_some(Port::Specific(Resource::Ore)),
                })
                .collect(),
            edges: (0..2).map(|id| Edge { id, owner: None }).collect(),
            robber: 0,
            balanced: true,
        }
    }

    #[test]
    fn test_production_weights_match_dice_odds() {
        let pips: u32 = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12]
            .iter()
            .map(|&n| production_weight(n) as u32)
            .sum();
        assert_eq!(pips, 58);
        assert_eq!(production_weight(7), 0);
    }

    #[test]
    fn test_move_robber_keeps_single_robber() {
        let mut board = tiny_board();
        board.move_robber(1);
        assert_eq!(board.robber, 1);
        assert!(!board.tile(0).has_robber);
        assert!(board.tile(1).has_robber);
        assert!(!board.tile(1).is_productive());
        assert_eq!(board.tiles.iter().filter(|t| t.has_robber).count(), 1);
    }

    #[test]
    fn test_city_upgrade_keeps_owner() {
        let mut board = tiny_board();
        board.place_settlement(1, 3);
        assert_eq!(board.settlements_of(3).collect::<Vec<_>>(), vec![1]);
        board.upgrade_to_city(1, 3);
        assert_eq!(board.vertex_owner(1), Some(3));
        assert_eq!(board.vertex(1).building.resource_multiplier(), 2);
        assert_eq!(board.settlements_of(3).count(), 0);
    }

    #[test]
    fn test_ports_of_player() {
        let mut board = tiny_board();
        assert!(board.ports_of(0).is_empty());
        board.place_settlement(2, 0);
        assert_eq!(board.ports_of(0), vec![Port::Specific(Resource::Ore)]);
        assert!(board.ports_of(1).is_empty());
    }

    #[test]
    fn test_roads_of_filters_owner() {
        let mut board = tiny_board();
        board.place_road(0, 1);
        board.place_road(1, 2);
        assert_eq!(board.roads_of(1).collect::<Vec<_>>(), vec![0]);
        assert_eq!(board.edge_owner(1), Some(2));
    }
}
