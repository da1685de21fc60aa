//! Randomised board and initial game state.
//!
//! Tile kinds and numbers are shuffled, then numbers are dealt tile by tile
//! so that 6s and 8s stay apart where the remaining pool allows it. When it
//! does not, the board is still produced and marked unbalanced.

use crate::board::{
    production_weight, Board, Edge, PlayerId, Resource, Tile, TileKind, Vertex, VertexBuilding,
};
use crate::config::GameConfig;
use crate::game::{GameError, GameState};
use crate::graph::BoardGraph;
use crate::ledger::Bank;
use crate::player::{DevelopmentCard, Player};
use crate::topology::{EdgeId, TileId, VertexId};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 4;

/// Tile kinds of the standard board and how many of each
pub const TILE_KINDS: [(TileKind, usize); 6] = [
    (TileKind::Resource(Resource::Lumber), 4),
    (TileKind::Resource(Resource::Grain), 4),
    (TileKind::Resource(Resource::Wool), 4),
    (TileKind::Resource(Resource::Brick), 3),
    (TileKind::Resource(Resource::Ore), 3),
    (TileKind::Desert, 1),
];

/// Production numbers, one per non-desert tile
pub const NUMBER_POOL: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

fn is_hot(number: u8) -> bool {
    number == 6 || number == 8
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoardGenerator {
    graph: BoardGraph,
}

impl BoardGenerator {
    pub fn new(graph: BoardGraph) -> Self {
        Self { graph }
    }

    /// A fresh board: shuffled tiles and numbers, robber on the desert,
    /// nothing built.
    pub fn generate_board<R: Rng>(&self, rng: &mut R, shuffle_ports: bool) -> Board {
        let topology = self.graph.topology();

        let mut kinds: Vec<TileKind> = TILE_KINDS
            .iter()
            .flat_map(|&(kind, count)| std::iter::repeat(kind).take(count))
            .collect();
        kinds.shuffle(rng);

        let mut pool = NUMBER_POOL.to_vec();
        pool.shuffle(rng);
        let (numbers, balanced) = self.deal_numbers(&kinds, pool);

        let tiles: Vec<Tile> = kinds
            .iter()
            .zip(numbers)
            .enumerate()
            .map(|(id, (&kind, number))| Tile {
                id: id as TileId,
                kind,
                number,
                weight: number.map_or(0, production_weight),
                has_robber: kind == TileKind::Desert,
            })
            .collect();
        // TILE_KINDS holds exactly one desert.
        let robber = tiles
            .iter()
            .position(|t| t.has_robber)
            .unwrap_or_default() as TileId;

        let mut port_kinds: Vec<_> = topology.ports().iter().map(|site| site.kind).collect();
        if shuffle_ports {
            port_kinds.shuffle(rng);
        }
        let mut vertices: Vec<Vertex> = (0..topology.vertices().len())
            .map(|id| Vertex {
                id: id as VertexId,
                building: VertexBuilding::Empty,
                port: None,
            })
            .collect();
        for (site, kind) in topology.ports().iter().zip(port_kinds) {
            for v in site.vertices {
                vertices[v as usize].port = Some(kind);
            }
        }

        let edges = (0..topology.edges().len())
            .map(|id| Edge {
                id: id as EdgeId,
                owner: None,
            })
            .collect();

        Board {
            tiles,
            vertices,
            edges,
            robber,
            balanced,
        }
    }

    /// Deal `pool` onto the non-desert tiles in id order.
    ///
    /// A tile next to an already numbered 6 or 8 takes the first number in
    /// the pool that is neither; if only 6s and 8s remain it takes the first
    /// one anyway and the deal is reported as unbalanced.
    fn deal_numbers(&self, kinds: &[TileKind], mut pool: Vec<u8>) -> (Vec<Option<u8>>, bool) {
        let mut numbers: Vec<Option<u8>> = vec![None; kinds.len()];
        let mut balanced = true;

        for (tile, kind) in kinds.iter().enumerate() {
            if *kind == TileKind::Desert {
                continue;
            }
            let near_hot = self
                .graph
                .tile_neighbors(tile as TileId)
                .iter()
                .any(|&n| numbers[n as usize].map_or(false, is_hot));
            let pick = match pool.iter().position(|&n| !(near_hot && is_hot(n))) {
                Some(i) => i,
                None => {
                    warn!(tile, "no number keeps 6 and 8 apart, placing anyway");
                    balanced = false;
                    0
                }
            };
            numbers[tile] = Some(pool.remove(pick));
        }
        (numbers, balanced)
    }

    /// Complete initial state for 3-4 players, seated in the order given.
    pub fn generate<R: Rng>(
        &self,
        names: Vec<String>,
        config: GameConfig,
        rng: &mut R,
    ) -> Result<GameState, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&names.len()) {
            return Err(GameError::InvalidPlayerCount(names.len()));
        }

        let board = self.generate_board(rng, config.shuffle_ports);
        let players: Vec<Player> = names
            .into_iter()
            .enumerate()
            .map(|(seat, name)| Player::new(seat as PlayerId, name))
            .collect();
        let bank = Bank::new(DevelopmentCard::shuffled_deck(rng));

        debug!(
            players = players.len(),
            balanced = board.balanced,
            robber = board.robber,
            "board generated"
        );
        Ok(GameState::new(board, players, bank, config, rng.gen()))
    }
}
