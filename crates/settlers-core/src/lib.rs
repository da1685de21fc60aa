//! Settlers - a rules engine for a hex-board settlement and trading game
//!
//! This crate provides the core game logic, including:
//! - A fixed 19-tile board topology derived from hex coordinates
//! - Randomised board generation that keeps 6s and 8s apart
//! - The resource economy: bank, production, ports and trades
//! - Game state machine with full rule enforcement
//!
//! # Architecture
//!
//! The engine is a pure function over snapshots. [`GameEngine::handle_action`]
//! takes a `&GameState` and returns a new `GameState`, so callers can keep
//! history, replay games from a seed, or discard a rejected move for free.
//! Static adjacency lives in one shared [`BoardTopology`]; snapshots carry
//! only what changes during a game.
//!
//! ```
//! use settlers_core::{GameAction, GameConfig, GameEngine, GamePhase};
//!
//! let engine = GameEngine::default();
//! let mut state = engine
//!     .start_game_with_config(["Ann", "Bo", "Cy"], GameConfig::default().with_seed(7))
//!     .unwrap();
//!
//! while state.phase == GamePhase::Setup {
//!     let player = state.current_player;
//!     let action = engine.valid_actions(&state, player).remove(0);
//!     state = engine.handle_action(&state, player, action).unwrap();
//! }
//! let rolled = engine.handle_action(&state, 0, GameAction::RollDice).unwrap();
//! assert!(rolled.last_roll.is_some());
//! ```
//!
//! # Modules
//!
//! - [`hex`]: Coordinate system for hex tiles, vertices, and edges
//! - [`topology`]: Static ids and adjacency of the standard board
//! - [`graph`]: Adjacency queries and longest road
//! - [`board`]: Tiles and the ownership overlay
//! - [`player`]: Player state, hands and development cards
//! - [`ledger`]: Bank, production, transfers and trade ratios
//! - [`generator`]: Random board and initial state
//! - [`rules`]: Legality checks
//! - [`game`]: Game state machine

pub mod actions;
pub mod board;
pub mod config;
pub mod game;
pub mod generator;
pub mod graph;
pub mod hex;
pub mod ledger;
pub mod player;
pub mod rules;
pub mod topology;

// Re-export commonly used types
pub use actions::{GameAction, TradeOffer};
pub use board::{Board, Edge, PlayerId, Port, Resource, Tile, TileKind, Vertex, VertexBuilding};
pub use config::GameConfig;
pub use game::{GameEngine, GameError, GamePhase, GameState, SetupDirection, TurnPhase};
pub use generator::BoardGenerator;
pub use graph::BoardGraph;
pub use hex::{EdgeCoord, EdgeDirection, HexCoord, VertexCoord, VertexDirection};
pub use ledger::{Bank, Party};
pub use player::{costs, DevelopmentCard, Player, ResourceHand};
pub use rules::{RuleValidator, RuleViolation};
pub use topology::{BoardTopology, EdgeId, TileId, VertexId};
