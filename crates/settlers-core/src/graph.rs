//! Query surface over the static topology plus the ownership overlay.
//!
//! - neighbour lookups between tiles, vertices and edges
//! - the distance rule
//! - longest road over a player's edges

use crate::board::{Board, PlayerId};
use crate::topology::{BoardTopology, EdgeId, TileId, VertexId, EDGE_COUNT};

// Edge sets are carried as bitmasks during the road search.
const _: () = assert!(EDGE_COUNT <= 128);

/// Read-only view of the board graph. Cheap to copy.
#[derive(Debug, Clone, Copy)]
pub struct BoardGraph {
    topology: &'static BoardTopology,
}

impl Default for BoardGraph {
    fn default() -> Self {
        Self::standard()
    }
}

/// One pending step of the road search
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Vertex the trail currently ends at
    at: VertexId,
    /// Edges already used by this branch
    used: u128,
    length: u32,
}

impl BoardGraph {
    pub fn new(topology: &'static BoardTopology) -> Self {
        Self { topology }
    }

    /// Graph over [`BoardTopology::standard`]
    pub fn standard() -> Self {
        Self::new(BoardTopology::standard())
    }

    pub fn topology(&self) -> &'static BoardTopology {
        self.topology
    }

    // ==================== Neighbour Lookups ====================
    // All lookups panic on ids outside the topology.

    pub fn tile_vertices(&self, tile: TileId) -> &'static [VertexId] {
        &self.topology.tile(tile).vertices
    }

    pub fn tile_edges(&self, tile: TileId) -> &'static [EdgeId] {
        &self.topology.tile(tile).edges
    }

    pub fn tile_neighbors(&self, tile: TileId) -> &'static [TileId] {
        &self.topology.tile(tile).neighbors
    }

    pub fn vertex_tiles(&self, vertex: VertexId) -> &'static [TileId] {
        &self.topology.vertex(vertex).tiles
    }

    pub fn vertex_edges(&self, vertex: VertexId) -> &'static [EdgeId] {
        &self.topology.vertex(vertex).edges
    }

    pub fn vertex_neighbors(&self, vertex: VertexId) -> &'static [VertexId] {
        &self.topology.vertex(vertex).vertices
    }

    pub fn edge_vertices(&self, edge: EdgeId) -> [VertexId; 2] {
        self.topology.edge(edge).vertices
    }

    pub fn edge_tiles(&self, edge: EdgeId) -> &'static [TileId] {
        &self.topology.edge(edge).tiles
    }

    pub fn edge_neighbors(&self, edge: EdgeId) -> &'static [EdgeId] {
        &self.topology.edge(edge).edges
    }

    /// The endpoint of `edge` that is not `vertex`
    pub fn other_endpoint(&self, edge: EdgeId, vertex: VertexId) -> VertexId {
        let [a, b] = self.edge_vertices(edge);
        if a == vertex {
            b
        } else {
            a
        }
    }

    pub fn edge_touches_vertex(&self, edge: EdgeId, vertex: VertexId) -> bool {
        self.edge_vertices(edge).contains(&vertex)
    }

    // ==================== Ownership Queries ====================

    /// True iff no neighbour of `vertex` is built on
    pub fn satisfies_distance_rule(&self, board: &Board, vertex: VertexId) -> bool {
        self.vertex_neighbors(vertex)
            .iter()
            .all(|&n| board.vertex_owner(n).is_none())
    }

    /// Whether `player` owns a road ending at `vertex`
    pub fn has_road_at(&self, board: &Board, player: PlayerId, vertex: VertexId) -> bool {
        self.vertex_edges(vertex)
            .iter()
            .any(|&e| board.edge_owner(e) == Some(player))
    }

    /// Players with a building on one of the tile's corners, in seat order
    pub fn players_on_tile(&self, board: &Board, tile: TileId) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self
            .tile_vertices(tile)
            .iter()
            .filter_map(|&v| board.vertex_owner(v))
            .collect();
        players.sort_unstable();
        players.dedup();
        players
    }

    // ==================== Longest Road ====================

    /// Length of the longest trail through the roads `player` owns.
    pub fn longest_road(&self, board: &Board, player: PlayerId) -> u32 {
        self.longest_trail(board.roads_of(player))
    }

    /// Length of the longest trail (no edge used twice) through `edges`.
    ///
    /// Every edge is tried as the first step in both directions. Each stack
    /// frame owns its own used-edge mask, so sibling branches at a junction
    /// never see each other's edges. A closed loop counts every edge once.
    pub fn longest_trail<I>(&self, edges: I) -> u32
    where
        I: IntoIterator<Item = EdgeId>,
    {
        let owned = edges.into_iter().fold(0u128, |mask, e| mask | (1u128 << e));
        if owned == 0 {
            return 0;
        }

        let mut stack: Vec<Frame> = Vec::new();
        for edge in 0..EDGE_COUNT as EdgeId {
            if owned & (1u128 << edge) == 0 {
                continue;
            }
            for at in self.edge_vertices(edge) {
                stack.push(Frame {
                    at,
                    used: 1u128 << edge,
                    length: 1,
                });
            }
        }

        let mut best = 0;
        while let Some(frame) = stack.pop() {
            best = best.max(frame.length);
            for &next in self.vertex_edges(frame.at) {
                let bit = 1u128 << next;
                if owned & bit == 0 || frame.used & bit != 0 {
                    continue;
                }
                stack.push(Frame {
                    at: self.other_endpoint(next, frame.at),
                    used: frame.used | bit,
                    length: frame.length + 1,
                });
            }
        }
        best
    }
}
