//! Static board topology: ids and adjacency of the standard 19-tile board.
//!
//! The topology is derived once from hex geometry and shared by every game
//! through [`BoardTopology::standard`]. Ids are dense and stable:
//! - tiles 0..19 in spiral order (centre, inner ring, outer ring)
//! - vertices 0..54 and edges 0..72 in first-seen order while walking the
//!   tiles' corners and sides clockwise
//!
//! Coastal corners touch a single tile, so vertex tile lists hold 1 to 3
//! entries.

use crate::board::{Port, Resource};
use crate::hex::{EdgeCoord, HexCoord, VertexCoord};
use once_cell::sync::Lazy;
use smallvec::SmallVec;
use std::collections::HashMap;

pub type TileId = u8;
pub type VertexId = u8;
pub type EdgeId = u8;

pub const TILE_COUNT: usize = 19;
pub const VERTEX_COUNT: usize = 54;
pub const EDGE_COUNT: usize = 72;

/// Port kinds of the standard board, in clockwise order of their sites
pub const STANDARD_PORTS: [Port; 9] = [
    Port::Generic,
    Port::Specific(Resource::Grain),
    Port::Specific(Resource::Ore),
    Port::Generic,
    Port::Specific(Resource::Wool),
    Port::Generic,
    Port::Generic,
    Port::Specific(Resource::Brick),
    Port::Specific(Resource::Lumber),
];

/// Board radius in rings around the centre tile
const BOARD_RADIUS: u32 = 2;

#[derive(Debug, Clone)]
pub struct TileNode {
    pub coord: HexCoord,
    /// Corners clockwise from North
    pub vertices: [VertexId; 6],
    /// Sides clockwise from NorthEast
    pub edges: [EdgeId; 6],
    /// Land tiles sharing a side
    pub neighbors: SmallVec<[TileId; 6]>,
}

#[derive(Debug, Clone)]
pub struct VertexNode {
    pub coord: VertexCoord,
    pub tiles: SmallVec<[TileId; 3]>,
    pub edges: SmallVec<[EdgeId; 3]>,
    pub vertices: SmallVec<[VertexId; 3]>,
}

#[derive(Debug, Clone)]
pub struct EdgeNode {
    pub coord: EdgeCoord,
    pub vertices: [VertexId; 2],
    pub tiles: SmallVec<[TileId; 2]>,
    /// Edges sharing an endpoint
    pub edges: SmallVec<[EdgeId; 4]>,
}

/// A port location: one coastal edge, usable from either of its vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSite {
    pub kind: Port,
    pub edge: EdgeId,
    pub vertices: [VertexId; 2],
}

/// Immutable adjacency tables for the standard board
#[derive(Debug)]
pub struct BoardTopology {
    tiles: Vec<TileNode>,
    vertices: Vec<VertexNode>,
    edges: Vec<EdgeNode>,
    ports: Vec<PortSite>,
}

static STANDARD: Lazy<BoardTopology> = Lazy::new(BoardTopology::build);

impl BoardTopology {
    /// The shared standard topology
    pub fn standard() -> &'static BoardTopology {
        &STANDARD
    }

    fn build() -> Self {
        let land = HexCoord::spiral(BOARD_RADIUS);
        let tile_ids: HashMap<HexCoord, TileId> = land
            .iter()
            .enumerate()
            .map(|(i, hex)| (*hex, i as TileId))
            .collect();

        let mut vertex_coords: Vec<VertexCoord> = Vec::with_capacity(VERTEX_COUNT);
        let mut vertex_ids: HashMap<VertexCoord, VertexId> = HashMap::new();
        let mut edge_coords: Vec<EdgeCoord> = Vec::with_capacity(EDGE_COUNT);
        let mut edge_ids: HashMap<EdgeCoord, EdgeId> = HashMap::new();

        for hex in &land {
            for vertex in hex.vertices() {
                vertex_ids.entry(vertex).or_insert_with(|| {
                    vertex_coords.push(vertex);
                    (vertex_coords.len() - 1) as VertexId
                });
            }
            for edge in hex.edges() {
                edge_ids.entry(edge).or_insert_with(|| {
                    edge_coords.push(edge);
                    (edge_coords.len() - 1) as EdgeId
                });
            }
        }

        let endpoints_of = |edge: &EdgeCoord| edge.endpoints().map(|v| vertex_ids[&v]);

        let vertices: Vec<VertexNode> = vertex_coords
            .iter()
            .enumerate()
            .map(|(id, coord)| {
                let edges: SmallVec<[EdgeId; 3]> = coord
                    .touching_edges()
                    .iter()
                    .filter_map(|e| edge_ids.get(e).copied())
                    .collect();
                let neighbours = edges
                    .iter()
                    .map(|&e| {
                        let [a, b] = endpoints_of(&edge_coords[e as usize]);
                        if a as usize == id {
                            b
                        } else {
                            a
                        }
                    })
                    .collect();
                VertexNode {
                    coord: *coord,
                    tiles: coord
                        .touching_hexes()
                        .iter()
                        .filter_map(|h| tile_ids.get(h).copied())
                        .collect(),
                    edges,
                    vertices: neighbours,
                }
            })
            .collect();

        let edges: Vec<EdgeNode> = edge_coords
            .iter()
            .enumerate()
            .map(|(id, coord)| {
                let ends = endpoints_of(coord);
                let mut touching: SmallVec<[EdgeId; 4]> = SmallVec::new();
                for v in ends {
                    for &e in &vertices[v as usize].edges {
                        if e as usize != id && !touching.contains(&e) {
                            touching.push(e);
                        }
                    }
                }
                EdgeNode {
                    coord: *coord,
                    vertices: ends,
                    tiles: coord
                        .touching_hexes()
                        .iter()
                        .filter_map(|h| tile_ids.get(h).copied())
                        .collect(),
                    edges: touching,
                }
            })
            .collect();

        let tiles: Vec<TileNode> = land
            .iter()
            .map(|hex| TileNode {
                coord: *hex,
                vertices: hex.vertices().map(|v| vertex_ids[&v]),
                edges: hex.edges().map(|e| edge_ids[&e]),
                neighbors: hex
                    .neighbors()
                    .iter()
                    .filter_map(|h| tile_ids.get(h).copied())
                    .collect(),
            })
            .collect();

        let ports = Self::port_sites(&edges);

        Self {
            tiles,
            vertices,
            edges,
            ports,
        }
    }

    /// Spreads the nine standard ports over the coastline.
    ///
    /// Coastal edges are ordered by angle around the board centre and roughly
    /// every third one is taken, so no two ports share a vertex.
    fn port_sites(edges: &[EdgeNode]) -> Vec<PortSite> {
        let mut coastal: Vec<(f64, EdgeId)> = edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.tiles.len() == 1)
            .map(|(id, e)| {
                let (x, y) = e.coord.to_pixel();
                (y.atan2(x), id as EdgeId)
            })
            .collect();
        coastal.sort_by(|a, b| a.0.total_cmp(&b.0));

        let slots = STANDARD_PORTS.len();
        STANDARD_PORTS
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let edge = coastal[i * coastal.len() / slots].1;
                PortSite {
                    kind: *kind,
                    edge,
                    vertices: edges[edge as usize].vertices,
                }
            })
            .collect()
    }

    // ==================== Lookups ====================

    pub fn tiles(&self) -> &[TileNode] {
        &self.tiles
    }

    pub fn vertices(&self) -> &[VertexNode] {
        &self.vertices
    }

    pub fn edges(&self) -> &[EdgeNode] {
        &self.edges
    }

    pub fn ports(&self) -> &[PortSite] {
        &self.ports
    }

    /// # Panics
    /// Panics on an id outside `0..TILE_COUNT`.
    pub fn tile(&self, id: TileId) -> &TileNode {
        &self.tiles[id as usize]
    }

    /// # Panics
    /// Panics on an id outside `0..VERTEX_COUNT`.
    pub fn vertex(&self, id: VertexId) -> &VertexNode {
        &self.vertices[id as usize]
    }

    /// # Panics
    /// Panics on an id outside `0..EDGE_COUNT`.
    pub fn edge(&self, id: EdgeId) -> &EdgeNode {
        &self.edges[id as usize]
    }

    pub fn tile_at(&self, coord: HexCoord) -> Option<TileId> {
        self.tiles
            .iter()
            .position(|t| t.coord == coord)
            .map(|i| i as TileId)
    }

    pub fn vertex_at(&self, coord: VertexCoord) -> Option<VertexId> {
        self.vertices
            .iter()
            .position(|v| v.coord == coord)
            .map(|i| i as VertexId)
    }

    pub fn edge_at(&self, coord: EdgeCoord) -> Option<EdgeId> {
        self.edges
            .iter()
            .position(|e| e.coord == coord)
            .map(|i| i as EdgeId)
    }

    /// Edge joining two vertices, if they are neighbours
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.vertex(a)
            .edges
            .iter()
            .copied()
            .find(|&e| self.edge(e).vertices.contains(&b))
    }

    /// Port attached to a vertex, if any
    pub fn port_at(&self, vertex: VertexId) -> Option<Port> {
        self.ports
            .iter()
            .find(|site| site.vertices.contains(&vertex))
            .map(|site| site.kind)
    }
}
